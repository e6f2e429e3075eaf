use anyhow::Result;
use clap::Parser;
use mediashelf_cli::bootstrap;

#[derive(Parser, Debug)]
#[command(name = "migrate")]
#[command(about = "Apply the database schema and seed the built-in tags")]
struct Args {
    /// Apply migrations without seeding the built-in tags
    #[arg(long)]
    skip_seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (_config, pool) = bootstrap().await?;

    mediashelf_db::run_migrations(&pool).await?;

    if args.skip_seed {
        tracing::info!("Skipping built-in tag seeding");
    } else {
        mediashelf_db::seed_initial_tags(&pool).await?;
    }

    pool.close().await;
    println!("Database is up to date");
    Ok(())
}
