use {clap::Subcommand, storefront_config::StorefrontConfig, tracing::info};

#[derive(Subcommand)]
pub enum DbAction {
    /// Run all pending database migrations.
    Migrate,
    /// Insert demo users, posts and products into an empty database.
    Seed,
}

pub async fn handle_db(
    action: DbAction,
    config: &StorefrontConfig,
    in_memory: bool,
) -> anyhow::Result<()> {
    match action {
        DbAction::Migrate => run_migrations(config).await,
        DbAction::Seed => seed_database(config, in_memory).await,
    }
}

/// Opening the SQLite data source applies any pending migrations.
async fn run_migrations(config: &StorefrontConfig) -> anyhow::Result<()> {
    storefront_gateway::open_data_source(config, false).await?;
    println!("Migrations applied.");
    Ok(())
}

async fn seed_database(config: &StorefrontConfig, in_memory: bool) -> anyhow::Result<()> {
    let data = storefront_gateway::open_data_source(config, in_memory).await?;
    let report = storefront_store::seed::seed(data.as_ref()).await?;
    info!(
        users = report.users,
        posts = report.posts,
        products = report.products,
        "seed finished"
    );
    println!(
        "Seeded {} users, {} posts, {} products.",
        report.users, report.posts, report.products
    );
    Ok(())
}
