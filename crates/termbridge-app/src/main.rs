use anyhow::Result;
use clap::Parser;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use termbridge::{run_loop, Bridge};
use termbridge_driver::{DriverKind, TerminalDriver, TmuxDriver};
use termbridge_types::Response;

#[derive(Parser, Debug)]
#[command(
    name = "termbridge",
    version,
    about = "JSON-over-stdio bridge to terminal multiplexer sessions"
)]
struct Cli {
    /// Run without a terminal driver; only ping and detect_text are served
    #[arg(long)]
    standalone: bool,

    /// Terminal driver to connect to
    #[arg(long, default_value = "tmux")]
    driver: String,
}

fn build_driver(kind: DriverKind) -> Result<Box<dyn TerminalDriver>> {
    match kind {
        DriverKind::Tmux => Ok(Box::new(TmuxDriver::new()?)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the wire protocol, so all logging goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let bridge = if cli.standalone {
        info!("starting in standalone mode");
        Bridge::standalone()
    } else {
        let kind: DriverKind = cli.driver.parse()?;
        match build_driver(kind) {
            Ok(driver) => {
                info!(driver = %kind, "terminal driver connected");
                Bridge::new(driver)
            }
            Err(e) => {
                // Fatal startup error: one diagnostic line, then exit.
                let diagnostic =
                    Response::startup_failure(format!("Failed to connect to {}: {}", kind, e));
                println!("{}", serde_json::to_string(&diagnostic)?);
                std::process::exit(1);
            }
        }
    };

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    run_loop(stdin, stdout, bridge).await
}
