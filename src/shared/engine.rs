use crate::errors::RestoreServiceError;
use crate::parameters::Compression;
use crate::shared::databases::{import_invocation, DatabaseManager};
use crate::shared::storage::StorageManager;
use crate::shared::ui::create_spinner;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Performs the actual restore once every parameter is known
pub trait RestoreEngine {
    async fn run(
        &self,
        source: &str,
        source_path: &str,
        database: &str,
        compression: Compression,
    ) -> Result<(), RestoreServiceError>;
}

/// Restore engine driving aws, gzip and the database client binaries
pub struct CommandRestoreEngine {
    storage: StorageManager,
    databases: DatabaseManager,
}

impl CommandRestoreEngine {
    pub fn new(storage: StorageManager, databases: DatabaseManager) -> Self {
        Self { storage, databases }
    }

    fn prepare_dump(
        &self,
        fetched: PathBuf,
        compression: Compression,
        workdir: &Path,
    ) -> Result<PathBuf, RestoreServiceError> {
        match compression {
            Compression::None => Ok(fetched),
            Compression::Gzip => {
                let name = fetched
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_else(|| "backup".to_string());
                let target = workdir.join(format!("{}.decompressed", name));
                self.storage.executor().decompress_gzip(&fetched, &target)?;
                Ok(target)
            }
        }
    }

    fn restore(
        &self,
        source: &str,
        source_path: &str,
        database: &str,
        compression: Compression,
    ) -> Result<(), RestoreServiceError> {
        let disk = self.storage.disk(source)?;
        let invocation = import_invocation(self.databases.settings(database)?)?;
        let workdir = tempfile::tempdir()?;

        let fetched = disk.fetch(source_path, workdir.path(), self.storage.executor())?;
        debug!(file = %fetched.display(), "Backup file available locally");

        let dump = self.prepare_dump(fetched, compression, workdir.path())?;
        self.storage
            .executor()
            .import_dump(&invocation, &dump, database)?;
        Ok(())
    }
}

impl RestoreEngine for CommandRestoreEngine {
    async fn run(
        &self,
        source: &str,
        source_path: &str,
        database: &str,
        compression: Compression,
    ) -> Result<(), RestoreServiceError> {
        info!(
            source = %source,
            source_path = %source_path,
            database = %database,
            compression = %compression,
            "Starting restore"
        );

        let spinner = create_spinner(&format!("Restoring {} into {}", source_path, database))?;
        let result = self.restore(source, source_path, database, compression);
        spinner.finish_and_clear();

        result.map_err(|e| e.with_restore_context(database))
    }
}
