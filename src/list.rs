use crate::config::{Config, ProviderSettings};
use crate::errors::RestoreServiceError;
use serde::Serialize;
use tracing::info;

/// Configured provider as shown by `providers`; credentials are left out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderSummary {
    pub name: String,
    pub driver: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderListing {
    pub storage: Vec<ProviderSummary>,
    pub databases: Vec<ProviderSummary>,
}

impl ProviderListing {
    pub fn from_config(config: &Config) -> Self {
        Self {
            storage: config
                .storage_providers
                .iter()
                .map(|p| summarize(p, "root"))
                .collect(),
            databases: config
                .database_providers
                .iter()
                .map(|p| summarize(p, "host"))
                .collect(),
        }
    }
}

fn summarize(provider: &ProviderSettings, location_key: &str) -> ProviderSummary {
    ProviderSummary {
        name: provider.name.clone(),
        driver: provider.get("driver").map(str::to_string),
        location: provider.get(location_key).map(str::to_string),
    }
}

/// List configured storage and database providers
pub async fn list_providers(config: Config, json_output: bool) -> Result<(), RestoreServiceError> {
    let listing = ProviderListing::from_config(&config);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    info!(count = listing.storage.len(), "Storage providers");
    for provider in &listing.storage {
        info!(
            name = %provider.name,
            driver = %provider.driver.as_deref().unwrap_or("-"),
            root = %provider.location.as_deref().unwrap_or("-"),
            "  storage"
        );
    }

    info!(count = listing.databases.len(), "Database providers");
    for provider in &listing.databases {
        info!(
            name = %provider.name,
            driver = %provider.driver.as_deref().unwrap_or("-"),
            host = %provider.location.as_deref().unwrap_or("-"),
            "  database"
        );
    }

    Ok(())
}
