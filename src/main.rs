use clap::{Parser, Subcommand};
use duspay::config::GatewayConfig;
use duspay::gateway::signer::{NONCE_HEADER, RequestSigner, random_nonce};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the signed gateway headers for a request, for integration
    /// debugging. Credentials come from IYZICO_API_KEY / IYZICO_SECRET_KEY.
    Sign {
        /// Target path on the gateway (path component only, no host)
        #[arg(long)]
        path: String,

        /// JSON request body, exactly as it will be transmitted
        #[arg(long, conflicts_with = "body_file", default_value = "{}")]
        body: String,

        /// Read the request body bytes from a file instead; avoids the
        /// shell mangling a quoted payload
        #[arg(long, value_name = "FILE")]
        body_file: Option<PathBuf>,

        /// Fixed nonce instead of a random one (for reproducing a signature)
        #[arg(long)]
        nonce: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Sign {
            path,
            body,
            body_file,
            nonce,
        } => {
            let config = GatewayConfig::from_env().into_diagnostic()?;
            let signer =
                RequestSigner::new(&config.api_key, &config.secret_key).into_diagnostic()?;
            let body_bytes = match body_file {
                Some(file) => std::fs::read(&file).into_diagnostic()?,
                None => body.into_bytes(),
            };
            let nonce = nonce.unwrap_or_else(random_nonce);
            let headers = signer.sign(&nonce, &path, &body_bytes);

            println!("Authorization: {}", headers.authorization);
            println!("{}: {}", NONCE_HEADER, headers.random_key);
        }
    }

    Ok(())
}
