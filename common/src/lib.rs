pub mod constants;
pub mod env_file;
pub mod models;
pub mod secrets;

pub use env_file::EnvFile;
pub use secrets::Secret;
