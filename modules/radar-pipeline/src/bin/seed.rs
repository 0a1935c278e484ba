use clap::Parser;
use radar_common::Config;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "SEED_SOURCES_PATH", default_value = "config/seed_sources.yaml")]
    sources: std::path::PathBuf,

    #[arg(long, env = "SEED_ENTITIES_PATH", default_value = "config/seed_entities.yaml")]
    entities: std::path::PathBuf,

    #[arg(long, env = "MIGRATIONS_DIR", default_value = "modules/radar-store/migrations")]
    migrations_dir: std::path::PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = Config::from_env();
    let pool = radar_store::connect(&config.database_url, &args.migrations_dir).await?;

    let sources_written = radar_pipeline::seed::seed_sources(&pool, &args.sources).await?;
    tracing::info!(count = sources_written, "seed sources loaded");

    let entities_written = radar_pipeline::seed::seed_entities(&pool, &args.entities).await?;
    tracing::info!(count = entities_written, "seed entities loaded");

    Ok(())
}
