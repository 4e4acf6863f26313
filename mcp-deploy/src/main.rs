use std::process::exit;

use anyhow::Result;
use clap::Parser;
use mcp_deploy::{gcloud::GcloudCli, setup_tracing, DeployArgs, McpDeploy};

#[tokio::main]
async fn main() -> Result<()> {
    let args = match DeployArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // `--help` and `--version` also end up here, with exit code 0
            let code = if e.exit_code() == 0 { 0 } else { 1 };
            let _ = e.print();
            exit(code);
        }
    };

    setup_tracing(args.debug);

    McpDeploy::with_gcloud(GcloudCli::new(args.gcloud.clone()))
        .run(args)
        .await
        .map(|_| ())
}
