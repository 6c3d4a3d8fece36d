use archipel_installer::updater::InstallerOptions;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "archipel-installer")]
#[command(about = "Install or update the Archipel patch bundle for Epsilon")]
#[command(version)]
struct Cli {
    /// Headless mode: no prompts, outcome through the log file and exit code
    #[arg(long)]
    silent: bool,
    /// Compare with the published bundle without changing anything
    #[arg(long)]
    dry_run: bool,
    /// Wait for Enter after a successful run
    #[arg(long)]
    no_close: bool,
    /// Epsilon_retail_ folder to use instead of detecting it
    #[arg(long, value_name = "DIR")]
    path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = InstallerOptions {
        silent: cli.silent,
        dry_run: cli.dry_run,
        no_close: cli.no_close,
        forced_path: cli.path,
    };

    cli::run::run(options).await.into()
}
