//! Configuration loading for the storefront server.
//!
//! Config files: `storefront.toml`, `storefront.yaml`, `storefront.yml` or
//! `storefront.json`, searched in `./` then the user config directory.
//!
//! `${ENV_VAR}` placeholders are substituted before parsing, and
//! `STOREFRONT_*` environment variables override file values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, data_dir, discover_and_load, load_config},
    schema::{DatabaseConfig, GraphqlConfig, ServerConfig, StorefrontConfig},
};
