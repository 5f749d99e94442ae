use anyhow::Result;
use clap::Parser;
use punch_console::cli;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // The TUI owns the terminal; log lines would tear the screen.
    if !args.is_interactive() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    cli::run(args).await
}
