use {
    serde::{Deserialize, Serialize},
    std::path::Path,
};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub graphql: GraphqlConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 4000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL. Defaults to `storefront.db` in the data directory.
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    /// The configured URL, or a file URL under `data_dir` when unset.
    pub fn url_or_default(&self, data_dir: &Path) -> String {
        match self.url {
            Some(ref url) => url.clone(),
            None => format!(
                "sqlite:{}?mode=rwc",
                data_dir.join("storefront.db").display()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphqlConfig {
    /// Serve `/graphql` at all. When false the endpoint answers 503.
    pub enabled: bool,
    /// Serve the GraphiQL IDE on plain GET requests.
    pub graphiql: bool,
    /// Events buffered per subscriber before new ones are dropped for it.
    pub subscriber_queue: usize,
}

impl Default for GraphqlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            graphiql: true,
            subscriber_queue: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::path::PathBuf};

    #[test]
    fn default_database_url_lives_in_data_dir() {
        let cfg = DatabaseConfig::default();
        let url = cfg.url_or_default(&PathBuf::from("/var/lib/storefront"));
        assert_eq!(url, "sqlite:/var/lib/storefront/storefront.db?mode=rwc");

        let cfg = DatabaseConfig {
            url: Some("sqlite::memory:".into()),
            ..Default::default()
        };
        assert_eq!(cfg.url_or_default(Path::new("/ignored")), "sqlite::memory:");
    }
}
