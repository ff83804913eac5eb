//! LG Language Server
//!
//! Speaks the Language Server Protocol over stdio. Logs go to stderr and are
//! controlled with `RUST_LOG`.

use clap::Parser;
use tower_lsp::{LspService, Server};

use lg_language_server::backend::{Backend, LgServerConfig, ValidationConfig};
use lg_language_server::scheduler::DEFAULT_DEBOUNCE_MS;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Communicate over stdin/stdout (the only supported transport).
    #[arg(long)]
    stdio: bool,

    /// Quiet period in milliseconds before an edited document is re-validated.
    #[arg(long, default_value_t = DEFAULT_DEBOUNCE_MS)]
    debounce_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    log::info!(
        "Starting LG language server (debounce {} ms)",
        args.debounce_ms
    );

    if !args.stdio {
        log::debug!("No transport flag given, defaulting to stdio");
    }

    let config = LgServerConfig {
        validation: ValidationConfig {
            debounce_ms: args.debounce_ms,
        },
    };

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| Backend::with_config(client, config));
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
