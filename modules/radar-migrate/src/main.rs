use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(about = "Applies pending radar-store migrations against DATABASE_URL")]
struct Args {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(long, default_value = "modules/radar-store/migrations")]
    migrations_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    radar_store::connect(&args.database_url, &args.migrations_dir).await?;

    tracing::info!("migrations applied");
    Ok(())
}
