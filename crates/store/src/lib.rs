//! Data source adapter for the storefront entities.
//!
//! The GraphQL layer never talks to storage directly: every lookup, listing,
//! insert and update goes through the [`DataSource`] trait. Two backends ship
//! with the crate: [`SqliteDataSource`] for real deployments and
//! [`MemoryDataSource`] for tests and throwaway runs.

pub mod error;
pub mod memory;
pub mod seed;
pub mod sqlite;
pub mod store;
pub mod types;

pub use {
    error::{Error, Result},
    memory::MemoryDataSource,
    sqlite::SqliteDataSource,
    store::DataSource,
    types::{
        EntityKind, NewPost, NewProduct, NewUser, Page, Post, PostQuery, Product, ProductQuery,
        User,
    },
};

/// Run database migrations for the storefront tables.
///
/// Creates the `users`, `posts` and `products` tables and their indexes.
/// [`SqliteDataSource::connect`] runs this on every open.
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
