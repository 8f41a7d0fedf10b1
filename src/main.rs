// Entrypoint for the CLI application.
// - Sets up logging on stderr so stdout only carries the client's output.
// - Builds the API client from the environment and hands it to the UI.

use excel_gen_cli::{api::ApiClient, ui};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // `RUST_LOG` overrides the default; keep it quiet while the spinner runs.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Endpoint and wait limit come from `EXCEL_SERVICE_URL` and
    // `EXCEL_SERVICE_TIMEOUT_SECS`. See `config::ServiceConfig::from_env`.
    let api = ApiClient::from_env()?;

    ui::run(&api)?;
    Ok(())
}
