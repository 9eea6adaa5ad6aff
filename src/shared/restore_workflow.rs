use crate::errors::RestoreServiceError;
use crate::parameters::{Compression, Parameter, ParameterSet, ResolvedParameters};
use crate::shared::databases::DatabaseProvider;
use crate::shared::display::DisplayFormatter;
use crate::shared::engine::RestoreEngine;
use crate::shared::storage::{absolute_location, FileEntry, StorageProvider};
use crate::shared::ui::Prompter;
use crate::utils::join_path;
use tracing::{debug, info};

pub const SOURCE_PROMPT: &str = "From which storage provider do you want to restore?";
pub const PATH_PROMPT: &str = "From which path do you want to select the backup file?";
pub const FILE_PROMPT: &str = "Which backup file do you want to restore?";
pub const DATABASE_PROMPT: &str = "Into which database do you want to restore?";
pub const COMPRESSION_PROMPT: &str = "Which compression was used for the backup?";
pub const CONFIRM_PROMPT: &str = "Are these correct?";

/// Outcome of a successful restore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub parameters: ResolvedParameters,
    pub location: String,
    pub message: String,
}

/// Resolves missing parameters with the operator, then runs the restore
pub struct RestoreWorkflow<S, D, E, P> {
    storage: S,
    databases: D,
    engine: E,
    prompter: P,
    parameters: ParameterSet,
}

impl<S, D, E, P> RestoreWorkflow<S, D, E, P>
where
    S: StorageProvider,
    D: DatabaseProvider,
    E: RestoreEngine,
    P: Prompter,
{
    pub fn new(storage: S, databases: D, engine: E, prompter: P, parameters: ParameterSet) -> Self {
        Self {
            storage,
            databases,
            engine,
            prompter,
            parameters,
        }
    }

    /// Execute the complete restore workflow
    pub async fn execute(&mut self) -> Result<RestoreReport, RestoreServiceError> {
        let resolved = self.resolve_parameters()?;
        self.execute_restore(&resolved).await
    }

    /// Prompt for every missing parameter until the operator confirms.
    ///
    /// The missing list is computed once; a rejected review re-asks that same
    /// list even though its parameters now hold provisional values.
    pub fn resolve_parameters(&mut self) -> Result<ResolvedParameters, RestoreServiceError> {
        let missing = self.parameters.missing();
        if missing.is_empty() {
            debug!("All parameters supplied, skipping prompts");
            return self.parameters.resolved();
        }

        let names = missing
            .iter()
            .map(Parameter::name)
            .collect::<Vec<_>>()
            .join(", ");
        debug!(missing = %names, "Resolving missing parameters");
        self.prompter.info(&format!("Missing parameters: {}", names));

        loop {
            for parameter in &missing {
                self.prompt_for(*parameter)?;
            }

            let resolved = self.parameters.resolved()?;
            self.prompter.line("");
            self.prompter.info("Please review the restore parameters:");
            for line in DisplayFormatter::summary(&resolved) {
                self.prompter.line(&line);
            }

            if self.prompter.confirm(CONFIRM_PROMPT, true)? {
                return Ok(resolved);
            }
            debug!(missing = %names, "Parameters rejected, asking again");
        }
    }

    fn prompt_for(&mut self, parameter: Parameter) -> Result<(), RestoreServiceError> {
        match parameter {
            Parameter::Source => {
                let providers = self.storage.list_available_providers();
                let source = self.select("storage provider", SOURCE_PROMPT, &providers)?;
                self.parameters.source = Some(source);
            }
            Parameter::SourcePath => {
                let source_path = self.prompt_source_path()?;
                self.parameters.source_path = Some(source_path);
            }
            Parameter::Database => {
                let providers = self.databases.list_available_providers();
                let database = self.select("database provider", DATABASE_PROMPT, &providers)?;
                self.parameters.database = Some(database);
            }
            Parameter::Compression => {
                let candidates: Vec<String> =
                    Compression::ALL.iter().map(|c| c.to_string()).collect();
                let compression = self.select("compression type", COMPRESSION_PROMPT, &candidates)?;
                self.parameters.compression = Some(compression.parse()?);
            }
        }
        Ok(())
    }

    /// Ask until the answer is one of `candidates`
    fn select(
        &mut self,
        label: &str,
        prompt: &str,
        candidates: &[String],
    ) -> Result<String, RestoreServiceError> {
        if candidates.is_empty() {
            return Err(RestoreServiceError::ConfigurationError(format!(
                "No {} configured",
                label
            )));
        }

        self.prompter
            .info(&format!("Available {}s: {}", label, candidates.join(", ")));
        loop {
            let answer = self.prompter.autocomplete(prompt, candidates)?;
            if candidates.contains(&answer) {
                return Ok(answer);
            }
            self.prompter
                .error(&format!("'{}' is not an available {}", answer, label));
        }
    }

    /// Pick a directory, then a backup file inside it.
    ///
    /// A directory without files sends the operator back to the path question,
    /// so this never returns without a value.
    fn prompt_source_path(&mut self) -> Result<String, RestoreServiceError> {
        let source = self
            .parameters
            .source
            .clone()
            .ok_or_else(|| RestoreServiceError::UnresolvedParameters(vec!["source".to_string()]))?;
        let root = self.storage_root(&source)?;

        loop {
            let path = self.prompter.ask(PATH_PROMPT, Some(root.as_str()))?;
            let files: Vec<FileEntry> = self
                .storage
                .list_contents(&source, &path)?
                .into_iter()
                .filter(|entry| !entry.is_dir())
                .collect();

            if files.is_empty() {
                debug!(source = %source, path = %path, "No backup files at path");
                self.prompter
                    .info(&format!("No backup files found in {}, choose another path", path));
                continue;
            }

            for line in DisplayFormatter::file_table(&files) {
                self.prompter.line(&line);
            }

            let names: Vec<String> = files.iter().map(|f| f.basename.clone()).collect();
            let filename = loop {
                let answer = self.prompter.autocomplete(FILE_PROMPT, &names)?;
                if !answer.is_empty() {
                    break answer;
                }
                self.prompter.error("A backup file name is required");
            };

            return Ok(join_path(&path, &filename));
        }
    }

    /// Configured root of a storage provider; providers without one are rooted at ""
    fn storage_root(&self, source: &str) -> Result<String, RestoreServiceError> {
        match self.storage.config(source, "root") {
            Ok(root) => Ok(root),
            Err(RestoreServiceError::MissingProviderSetting { .. }) => Ok(String::new()),
            Err(e) => Err(e),
        }
    }

    async fn execute_restore(
        &mut self,
        parameters: &ResolvedParameters,
    ) -> Result<RestoreReport, RestoreServiceError> {
        self.engine
            .run(
                &parameters.source,
                &parameters.source_path,
                &parameters.database,
                parameters.compression,
            )
            .await?;

        let root = self.storage_root(&parameters.source)?;
        let location = absolute_location(&root, &parameters.source_path);
        let message = format!(
            "Successfully restored {} from {} to database {}.",
            location, parameters.source, parameters.database
        );
        info!(
            source = %parameters.source,
            location = %location,
            database = %parameters.database,
            "Restore completed"
        );
        self.prompter.info(&message);

        Ok(RestoreReport {
            parameters: parameters.clone(),
            location,
            message,
        })
    }
}
