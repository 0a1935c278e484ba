use std::sync::Arc;

use clap::Parser;
use radar_common::Config;
use radar_llm::{LlmClient, LlmConfig};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "LLM_CONFIG_PATH", default_value = "config/llm.yaml")]
    llm_config: std::path::PathBuf,

    #[arg(long, env = "MIGRATIONS_DIR", default_value = "modules/radar-store/migrations")]
    migrations_dir: std::path::PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let args = Args::parse();
    let config = Arc::new(Config::from_env());
    config.log_redacted();

    tracing::info!("AI Constraints Radar pipeline starting");

    let pool = radar_store::connect(&config.database_url, &args.migrations_dir).await?;

    let llm_config = LlmConfig::load(&args.llm_config)?;
    let llm = Arc::new(LlmClient::new(config.openrouter_api_key.clone(), llm_config, config.llm_concurrency));

    radar_pipeline::orchestrator::run_forever(pool, llm, config).await
}

/// Dual logging: human-readable to stdout, JSON lines to a rotating
/// file, with the noisiest third-party crates turned down a level so
/// the pipeline's own spans aren't drowned out.
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,reqwest=warn,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}
