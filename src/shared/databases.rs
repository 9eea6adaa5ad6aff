use crate::config::{Config, ProviderSettings};
use crate::errors::RestoreServiceError;
use crate::shared::commands::ClientInvocation;

/// Catalog of named database connections
pub trait DatabaseProvider {
    fn list_available_providers(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseDriver {
    Mysql,
    Postgresql,
}

impl DatabaseDriver {
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, RestoreServiceError> {
        match settings.driver()? {
            "mysql" | "mariadb" => Ok(DatabaseDriver::Mysql),
            "postgresql" | "postgres" | "pgsql" => Ok(DatabaseDriver::Postgresql),
            other => Err(RestoreServiceError::UnsupportedDriver {
                provider: settings.name.clone(),
                driver: other.to_string(),
            }),
        }
    }

    fn default_port(&self) -> &'static str {
        match self {
            DatabaseDriver::Mysql => "3306",
            DatabaseDriver::Postgresql => "5432",
        }
    }
}

/// Build the client call that imports a plain SQL dump into the database
pub fn import_invocation(settings: &ProviderSettings) -> Result<ClientInvocation, RestoreServiceError> {
    let driver = DatabaseDriver::from_settings(settings)?;
    let host = settings.get("host").unwrap_or("localhost");
    let port = settings.get("port").unwrap_or(driver.default_port());
    let user = settings.require("user")?;
    let database = settings.require("database")?;
    let password = settings.get("password");

    let invocation = match driver {
        DatabaseDriver::Mysql => ClientInvocation {
            program: "mysql".to_string(),
            args: vec![
                format!("--host={}", host),
                format!("--port={}", port),
                format!("--user={}", user),
                database.to_string(),
            ],
            envs: password
                .map(|p| vec![("MYSQL_PWD".to_string(), p.to_string())])
                .unwrap_or_default(),
        },
        DatabaseDriver::Postgresql => ClientInvocation {
            program: "psql".to_string(),
            args: vec![
                format!("--host={}", host),
                format!("--port={}", port),
                format!("--username={}", user),
                format!("--dbname={}", database),
                "--quiet".to_string(),
                "--set=ON_ERROR_STOP=1".to_string(),
            ],
            envs: password
                .map(|p| vec![("PGPASSWORD".to_string(), p.to_string())])
                .unwrap_or_default(),
        },
    };

    Ok(invocation)
}

/// Database catalog backed by the configured providers
#[derive(Debug, Clone)]
pub struct DatabaseManager {
    providers: Vec<ProviderSettings>,
}

impl DatabaseManager {
    pub fn new(config: &Config) -> Self {
        Self {
            providers: config.database_providers.clone(),
        }
    }

    pub fn settings(&self, provider: &str) -> Result<&ProviderSettings, RestoreServiceError> {
        self.providers
            .iter()
            .find(|p| p.name == provider)
            .ok_or_else(|| RestoreServiceError::UnknownDatabaseProvider(provider.to_string()))
    }
}

impl DatabaseProvider for DatabaseManager {
    fn list_available_providers(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name.clone()).collect()
    }
}
