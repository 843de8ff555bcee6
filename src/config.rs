use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub identifiers: IdentifierConfig,
    pub query: QueryConfig,
    pub writes: WriteConfig,
    pub validation: ValidationConfig,
    pub query_log: QueryLogConfig,
    pub collections: CollectionConfig,
    pub records: RecordConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierConfig {
    pub base_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Bound of every fan-out sub-query
    pub page_size_max: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WriteConfig {
    pub atomic_batches: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub require_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLogConfig {
    pub enabled: bool,
    pub collection: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub annotations: String,
    pub images: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    pub table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub connection_string: Option<String>,
    pub max_connections: Option<u32>,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            base_uri: "http://www.phenome-fppn.fr/phenolink/".to_string(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            page_size_max: 5000,
        }
    }
}

impl Default for QueryLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            collection: "query_log".to_string(),
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            annotations: "annotations".to_string(),
            images: "images".to_string(),
        }
    }
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            table: "entity_records".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            max_connections: Some(20),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and config file
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Add default configuration
        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        // Add config file if it exists
        config = config.add_source(config::File::with_name("phenolink").required(false));

        // Environment variables with prefix "PHENOLINK_", e.g. PHENOLINK_QUERY_LOG__ENABLED
        config = config.add_source(
            config::Environment::with_prefix("PHENOLINK")
                .prefix_separator("_")
                .separator("__"),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// PostgreSQL URL for the relational store, if one is configured
    pub fn database_url(&self) -> Option<String> {
        self.database
            .connection_string
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
    }
}
