use crate::errors::RestoreServiceError;
use std::collections::{BTreeMap, HashMap};
use std::env;

pub const STORAGE_PROVIDERS_VAR: &str = "STORAGE_PROVIDERS";
pub const DATABASE_PROVIDERS_VAR: &str = "DATABASE_PROVIDERS";

/// Settings of one named storage or database provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub name: String,
    pub settings: BTreeMap<String, String>,
}

impl ProviderSettings {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    /// Look up a setting that must be present
    pub fn require(&self, key: &str) -> Result<&str, RestoreServiceError> {
        self.get(key)
            .ok_or_else(|| RestoreServiceError::MissingProviderSetting {
                provider: self.name.clone(),
                key: key.to_string(),
            })
    }

    pub fn driver(&self) -> Result<&str, RestoreServiceError> {
        self.require("driver")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_providers: Vec<ProviderSettings>,
    pub database_providers: Vec<ProviderSettings>,
}

impl Config {
    pub fn load() -> Result<Self, RestoreServiceError> {
        dotenv::dotenv().ok();
        Self::from_vars(env::vars())
    }

    /// Build the configuration from `KEY=value` pairs
    pub fn from_vars<I>(vars: I) -> Result<Self, RestoreServiceError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();

        let storage_providers = collect_providers(&vars, STORAGE_PROVIDERS_VAR, "STORAGE")?;
        let database_providers = collect_providers(&vars, DATABASE_PROVIDERS_VAR, "DATABASE")?;

        Ok(Config {
            storage_providers,
            database_providers,
        })
    }
}

/// Turn a provider name into its environment variable prefix
pub fn env_prefix(kind: &str, name: &str) -> String {
    format!("{}_{}_", kind, name.to_uppercase().replace(['-', '.', ' '], "_"))
}

fn collect_providers(
    vars: &HashMap<String, String>,
    list_var: &str,
    kind: &str,
) -> Result<Vec<ProviderSettings>, RestoreServiceError> {
    let names = vars.get(list_var).ok_or_else(|| {
        RestoreServiceError::ConfigurationError(format!("{} is not set", list_var))
    })?;

    let mut providers: Vec<ProviderSettings> = Vec::new();
    for name in names.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if providers.iter().any(|p| p.name == name) {
            return Err(RestoreServiceError::ConfigurationError(format!(
                "Provider '{}' is listed twice in {}",
                name, list_var
            )));
        }

        let prefix = env_prefix(kind, name);
        let settings = vars
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix)
                    .filter(|setting| !setting.is_empty())
                    .map(|setting| (setting.to_lowercase(), value.clone()))
            })
            .collect();

        providers.push(ProviderSettings {
            name: name.to_string(),
            settings,
        });
    }

    Ok(providers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn create_test_config() -> Result<Config, RestoreServiceError> {
        Config::from_vars(vars(&[
            ("STORAGE_PROVIDERS", "s3, local"),
            ("STORAGE_S3_DRIVER", "s3"),
            ("STORAGE_S3_BUCKET", "backups"),
            ("STORAGE_S3_ROOT", "/dumps"),
            ("STORAGE_LOCAL_DRIVER", "local"),
            ("STORAGE_LOCAL_ROOT", "/var/backups"),
            ("DATABASE_PROVIDERS", "prod,staging-eu"),
            ("DATABASE_PROD_DRIVER", "postgresql"),
            ("DATABASE_PROD_HOST", "db.internal"),
            ("DATABASE_STAGING_EU_DRIVER", "mysql"),
            ("PATH", "/usr/bin"),
        ]))
    }

    #[test]
    fn test_provider_order_follows_list() -> Result<(), RestoreServiceError> {
        let config = create_test_config()?;

        let storage: Vec<&str> = config
            .storage_providers
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(storage, vec!["s3", "local"]);

        let databases: Vec<&str> = config
            .database_providers
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(databases, vec!["prod", "staging-eu"]);
        Ok(())
    }

    #[test]
    fn test_settings_are_scoped_to_provider() -> Result<(), RestoreServiceError> {
        let config = create_test_config()?;
        let s3 = &config.storage_providers[0];

        assert_eq!(s3.get("driver"), Some("s3"));
        assert_eq!(s3.get("bucket"), Some("backups"));
        assert_eq!(s3.get("root"), Some("/dumps"));
        assert_eq!(s3.settings.len(), 3);

        let staging = &config.database_providers[1];
        assert_eq!(staging.driver()?, "mysql");
        Ok(())
    }

    #[test]
    fn test_missing_setting_is_reported() -> Result<(), RestoreServiceError> {
        let config = create_test_config()?;
        let staging = &config.database_providers[1];

        assert!(matches!(
            staging.require("host"),
            Err(RestoreServiceError::MissingProviderSetting { provider, key })
                if provider == "staging-eu" && key == "host"
        ));
        Ok(())
    }

    #[test]
    fn test_missing_provider_list_is_an_error() {
        let result = Config::from_vars(vars(&[("STORAGE_PROVIDERS", "local")]));
        assert!(matches!(
            result,
            Err(RestoreServiceError::ConfigurationError(message)) if message.contains("DATABASE_PROVIDERS")
        ));
    }

    #[test]
    fn test_duplicate_provider_is_an_error() {
        let result = Config::from_vars(vars(&[
            ("STORAGE_PROVIDERS", "local,local"),
            ("DATABASE_PROVIDERS", "prod"),
        ]));
        assert!(matches!(result, Err(RestoreServiceError::ConfigurationError(_))));
    }

    #[test]
    fn test_env_prefix_normalisation() {
        assert_eq!(env_prefix("DATABASE", "staging-eu"), "DATABASE_STAGING_EU_");
        assert_eq!(env_prefix("STORAGE", "s3"), "STORAGE_S3_");
    }
}
