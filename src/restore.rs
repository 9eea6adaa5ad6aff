use crate::config::Config;
use crate::errors::RestoreServiceError;
use crate::parameters::ParameterSet;
use crate::shared::databases::DatabaseManager;
use crate::shared::engine::CommandRestoreEngine;
use crate::shared::restore_workflow::RestoreWorkflow;
use crate::shared::storage::StorageManager;
use crate::shared::ui::TerminalPrompter;
use tracing::{debug, info};

/// Resolve missing parameters interactively and restore the chosen backup
pub async fn restore_interactive(
    config: Config,
    parameters: ParameterSet,
) -> Result<(), RestoreServiceError> {
    info!("Database Restore Tool");

    let storage = StorageManager::new(&config);
    let databases = DatabaseManager::new(&config);
    let engine = CommandRestoreEngine::new(storage.clone(), databases.clone());

    let mut workflow = RestoreWorkflow::new(
        storage,
        databases,
        engine,
        TerminalPrompter::new(),
        parameters,
    );
    let report = workflow.execute().await?;
    debug!(
        source = %report.parameters.source,
        location = %report.location,
        database = %report.parameters.database,
        message = %report.message,
        "Restore workflow finished"
    );

    Ok(())
}
