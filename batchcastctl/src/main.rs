use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = batchcastctl::Cli::parse();
    if let Err(err) = batchcastctl::run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
