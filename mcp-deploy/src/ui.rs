use crossterm::style::Stylize;

/// Progress lines for the operator. Everything goes to stderr so stdout only carries results.
#[derive(Default)]
pub struct Ui;

impl Ui {
    pub fn header(&self, title: &str) {
        eprintln!();
        eprintln!("{} {}", "🔵 mcp-deploy".blue().bold(), format!("• {title}").bold());
    }

    pub fn step<M: AsRef<str>>(&self, emoji: &str, message: M) {
        eprintln!("  {} {}", emoji, message.as_ref());
    }

    pub fn info<M: AsRef<str>>(&self, message: M) {
        eprintln!("   ℹ️  {}", message.as_ref());
    }

    pub fn success<M: AsRef<str>>(&self, message: M) {
        eprintln!("   {}", message.as_ref().green());
    }

    pub fn warn<M: AsRef<str>>(&self, message: M) {
        eprintln!("   ⚠️  {}", message.as_ref().yellow());
    }
}
