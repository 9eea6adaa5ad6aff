use crate::config::{Config, ProviderSettings};
use crate::errors::RestoreServiceError;
use crate::shared::commands::CommandExecutor;
use crate::utils::join_path;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// One entry of a storage listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub basename: String,
    pub extension: String,
    pub size: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: EntryKind,
}

impl FileEntry {
    pub fn new(dir: &str, basename: &str, size: u64, timestamp: DateTime<Utc>, kind: EntryKind) -> Self {
        let extension = match kind {
            EntryKind::File => Path::new(basename)
                .extension()
                .map(|ext| ext.to_string_lossy().to_string())
                .unwrap_or_default(),
            EntryKind::Dir => String::new(),
        };

        Self {
            path: join_path(dir, basename),
            basename: basename.to_string(),
            extension,
            size,
            timestamp,
            kind,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// Catalog of named storage locations and their file listings
pub trait StorageProvider {
    fn list_available_providers(&self) -> Vec<String>;

    fn config(&self, provider: &str, key: &str) -> Result<String, RestoreServiceError>;

    fn list_contents(&self, provider: &str, path: &str) -> Result<Vec<FileEntry>, RestoreServiceError>;
}

/// Strip the configured root off `path` when present so it can be re-rooted
pub fn relative_to_root<'a>(root: &str, path: &'a str) -> &'a str {
    let root = root.trim_end_matches('/');
    let stripped = if !root.is_empty() && (path == root || path.starts_with(&format!("{}/", root))) {
        &path[root.len()..]
    } else {
        path
    };
    stripped.trim_matches('/')
}

/// Human-facing location of a backup, re-rooted the same way the disks resolve it
pub fn absolute_location(root: &str, source_path: &str) -> String {
    if root.is_empty() {
        return source_path.to_string();
    }
    match relative_to_root(root, source_path) {
        "" => root.to_string(),
        relative => join_path(root, relative),
    }
}

/// A storage location resolved from its driver setting
#[derive(Debug, Clone)]
pub enum StorageDisk {
    Local(LocalDisk),
    S3(S3Disk),
}

impl StorageDisk {
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, RestoreServiceError> {
        match settings.driver()? {
            "local" => Ok(StorageDisk::Local(LocalDisk::new(
                settings.get("root").unwrap_or("/"),
            ))),
            "s3" => Ok(StorageDisk::S3(S3Disk {
                bucket: settings.require("bucket")?.to_string(),
                root: settings.get("root").unwrap_or_default().to_string(),
                settings: settings.clone(),
            })),
            other => Err(RestoreServiceError::UnsupportedDriver {
                provider: settings.name.clone(),
                driver: other.to_string(),
            }),
        }
    }

    pub fn list_contents(
        &self,
        path: &str,
        executor: &CommandExecutor,
    ) -> Result<Vec<FileEntry>, RestoreServiceError> {
        match self {
            StorageDisk::Local(disk) => disk.list_contents(path),
            StorageDisk::S3(disk) => disk.list_contents(path, executor),
        }
    }

    /// Make the backup available as a local file, downloading into `workdir` if needed
    pub fn fetch(
        &self,
        path: &str,
        workdir: &Path,
        executor: &CommandExecutor,
    ) -> Result<PathBuf, RestoreServiceError> {
        match self {
            StorageDisk::Local(disk) => {
                let local = disk.resolve(path);
                if !local.is_file() {
                    return Err(RestoreServiceError::BackupNotFound(local.display().to_string()));
                }
                Ok(local)
            }
            StorageDisk::S3(disk) => disk.download(path, workdir, executor),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalDisk {
    root: PathBuf,
}

impl LocalDisk {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        let relative = relative_to_root(&self.root.to_string_lossy(), path);
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }

    pub fn list_contents(&self, path: &str) -> Result<Vec<FileEntry>, RestoreServiceError> {
        let dir = self.resolve(path);
        debug!(dir = %dir.display(), "Listing local directory");

        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            let kind = if metadata.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            let timestamp: DateTime<Utc> = metadata.modified()?.into();

            entries.push(FileEntry::new(
                path,
                &entry.file_name().to_string_lossy(),
                metadata.len(),
                timestamp,
                kind,
            ));
        }

        entries.sort_by(|a, b| a.basename.cmp(&b.basename));
        Ok(entries)
    }
}

#[derive(Debug, Clone)]
pub struct S3Disk {
    bucket: String,
    root: String,
    settings: ProviderSettings,
}

impl S3Disk {
    /// Object key of `path` inside the bucket
    pub fn key(&self, path: &str) -> String {
        let root = self.root.trim_matches('/');
        let relative = relative_to_root(&self.root, path);
        match (root.is_empty(), relative.is_empty()) {
            (true, _) => relative.to_string(),
            (false, true) => root.to_string(),
            (false, false) => format!("{}/{}", root, relative),
        }
    }

    pub fn list_contents(
        &self,
        path: &str,
        executor: &CommandExecutor,
    ) -> Result<Vec<FileEntry>, RestoreServiceError> {
        let key = self.key(path);
        let url = if key.is_empty() {
            format!("s3://{}/", self.bucket)
        } else {
            format!("s3://{}/{}/", self.bucket, key)
        };

        let output = executor.execute_aws_command(&self.settings, &["s3", "ls", &url], &url)?;
        Ok(parse_s3_listing(&output, path))
    }

    pub fn download(
        &self,
        path: &str,
        workdir: &Path,
        executor: &CommandExecutor,
    ) -> Result<PathBuf, RestoreServiceError> {
        let key = self.key(path);
        let url = format!("s3://{}/{}", self.bucket, key);
        let file_name = Path::new(&key)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "backup".to_string());
        let target = workdir.join(file_name);

        executor.execute_aws_command(
            &self.settings,
            &["s3", "cp", "--only-show-errors", &url, &target.to_string_lossy()],
            &url,
        )?;
        Ok(target)
    }
}

/// Parse `aws s3 ls` output; `PRE` lines are directories
pub fn parse_s3_listing(output: &str, dir: &str) -> Vec<FileEntry> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim_end_matches('\r');
            if let Some(prefix) = line.trim_start().strip_prefix("PRE ") {
                let name = prefix.trim_start().trim_end_matches('/');
                if name.is_empty() {
                    return None;
                }
                return Some(FileEntry::new(
                    dir,
                    name,
                    0,
                    DateTime::<Utc>::UNIX_EPOCH,
                    EntryKind::Dir,
                ));
            }

            let (date, rest) = take_token(line)?;
            let (time, rest) = take_token(rest)?;
            let (size, rest) = take_token(rest)?;
            // Keep spaces inside the object name
            let name = rest.trim_start();
            if name.is_empty() {
                return None;
            }

            let timestamp =
                NaiveDateTime::parse_from_str(&format!("{} {}", date, time), "%Y-%m-%d %H:%M:%S")
                    .ok()?
                    .and_utc();
            let size = size.parse::<u64>().ok()?;

            Some(FileEntry::new(dir, name, size, timestamp, EntryKind::File))
        })
        .collect()
}

fn take_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    let end = s.find(char::is_whitespace)?;
    Some((&s[..end], &s[end..]))
}

/// Storage catalog backed by the configured providers
#[derive(Debug, Clone)]
pub struct StorageManager {
    providers: Vec<ProviderSettings>,
    executor: CommandExecutor,
}

impl StorageManager {
    pub fn new(config: &Config) -> Self {
        Self {
            providers: config.storage_providers.clone(),
            executor: CommandExecutor::new(),
        }
    }

    pub fn settings(&self, provider: &str) -> Result<&ProviderSettings, RestoreServiceError> {
        self.providers
            .iter()
            .find(|p| p.name == provider)
            .ok_or_else(|| RestoreServiceError::UnknownStorageProvider(provider.to_string()))
    }

    pub fn disk(&self, provider: &str) -> Result<StorageDisk, RestoreServiceError> {
        StorageDisk::from_settings(self.settings(provider)?)
    }

    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }
}

impl StorageProvider for StorageManager {
    fn list_available_providers(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name.clone()).collect()
    }

    fn config(&self, provider: &str, key: &str) -> Result<String, RestoreServiceError> {
        self.settings(provider)?.require(key).map(str::to_string)
    }

    fn list_contents(&self, provider: &str, path: &str) -> Result<Vec<FileEntry>, RestoreServiceError> {
        self.disk(provider)?.list_contents(path, &self.executor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn provider(name: &str, pairs: &[(&str, &str)]) -> ProviderSettings {
        ProviderSettings {
            name: name.to_string(),
            settings: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_relative_to_root() {
        assert_eq!(relative_to_root("/var/backups", "/var/backups"), "");
        assert_eq!(relative_to_root("/var/backups", "/var/backups/db"), "db");
        assert_eq!(relative_to_root("/var/backups/", "/var/backups/db/a.sql"), "db/a.sql");
        assert_eq!(relative_to_root("/var/backups", "/dumps/a.sql.gz"), "dumps/a.sql.gz");
        // Sibling directory sharing a name prefix is not inside the root
        assert_eq!(relative_to_root("/var/backups", "/var/backups2/a.sql"), "var/backups2/a.sql");
        assert_eq!(relative_to_root("", "/a.sql"), "a.sql");
    }

    #[test]
    fn test_absolute_location() {
        assert_eq!(absolute_location("/srv/s3", "/dumps/a.sql.gz"), "/srv/s3/dumps/a.sql.gz");
        assert_eq!(absolute_location("/srv/s3", "/srv/s3/backup.sql"), "/srv/s3/backup.sql");
        assert_eq!(absolute_location("", "/dumps/a.sql"), "/dumps/a.sql");
        assert_eq!(absolute_location("/", "/a.sql"), "/a.sql");
    }

    #[test]
    fn test_absolute_location_matches_restored_file() -> Result<(), RestoreServiceError> {
        // Sibling directory sharing the root as a name prefix
        assert_eq!(
            absolute_location("/var/backups", "/var/backups2/a.sql"),
            "/var/backups/var/backups2/a.sql"
        );
        let disk = LocalDisk::new("/var/backups");
        assert_eq!(
            disk.resolve("/var/backups2/a.sql").to_string_lossy(),
            absolute_location("/var/backups", "/var/backups2/a.sql")
        );

        // Relative path below the root
        assert_eq!(
            absolute_location("/srv/s3-root", "nightly/a.sql"),
            "/srv/s3-root/nightly/a.sql"
        );
        let settings = provider("s3", &[("driver", "s3"), ("bucket", "b"), ("root", "/srv/s3-root")]);
        let disk = match StorageDisk::from_settings(&settings)? {
            StorageDisk::S3(disk) => disk,
            other => panic!("unexpected disk: {other:?}"),
        };
        assert_eq!(
            format!("/{}", disk.key("nightly/a.sql")),
            absolute_location("/srv/s3-root", "nightly/a.sql")
        );
        Ok(())
    }

    #[test]
    fn test_file_entry_extension() {
        let ts = DateTime::<Utc>::UNIX_EPOCH;
        let entry = FileEntry::new("/dumps", "a.sql.gz", 10, ts, EntryKind::File);
        assert_eq!(entry.extension, "gz");
        assert_eq!(entry.path, "/dumps/a.sql.gz");

        let entry = FileEntry::new("/dumps", "README", 10, ts, EntryKind::File);
        assert_eq!(entry.extension, "");

        let entry = FileEntry::new("/dumps", "archive.old", 0, ts, EntryKind::Dir);
        assert_eq!(entry.extension, "");
        assert!(entry.is_dir());
    }

    #[test]
    fn test_parse_s3_listing() {
        let output = "                           PRE archive/\n\
                      2024-05-01 10:15:00    1048576 prod.sql.gz\n\
                      2024-05-02 11:00:30        512 my dump.sql\n\
                      2024-05-03 09:00:00       2048 nightly PRE release.sql\n";
        let entries = parse_s3_listing(output, "dumps");

        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].basename, "archive");
        assert!(entries[0].is_dir());

        assert_eq!(entries[1].basename, "prod.sql.gz");
        assert_eq!(entries[1].size, 1048576);
        assert_eq!(entries[1].extension, "gz");
        assert_eq!(entries[1].path, "dumps/prod.sql.gz");
        assert_eq!(
            entries[1].timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2024-05-01 10:15:00"
        );

        assert_eq!(entries[2].basename, "my dump.sql");
        assert_eq!(entries[2].size, 512);

        // "PRE " inside an object name is not a directory marker
        assert_eq!(entries[3].basename, "nightly PRE release.sql");
        assert!(!entries[3].is_dir());
        assert_eq!(entries[3].size, 2048);
    }

    #[test]
    fn test_parse_s3_listing_skips_garbage() {
        let output = "\n   \nnot a listing line\n2024-05-01 10:15:00 abc broken.sql\n";
        assert!(parse_s3_listing(output, "").is_empty());
    }

    #[test]
    fn test_s3_key_construction() -> Result<(), RestoreServiceError> {
        let settings = provider("s3", &[("driver", "s3"), ("bucket", "backups"), ("root", "/dumps/")]);
        let disk = match StorageDisk::from_settings(&settings)? {
            StorageDisk::S3(disk) => disk,
            other => panic!("unexpected disk: {other:?}"),
        };

        assert_eq!(disk.key("/dumps/"), "dumps");
        assert_eq!(disk.key("/dumps/prod.sql.gz"), "dumps/prod.sql.gz");
        assert_eq!(disk.key("nightly/prod.sql.gz"), "dumps/nightly/prod.sql.gz");
        Ok(())
    }

    #[test]
    fn test_disk_from_settings_errors() {
        let settings = provider("ftp", &[("driver", "ftp")]);
        assert!(matches!(
            StorageDisk::from_settings(&settings),
            Err(RestoreServiceError::UnsupportedDriver { driver, .. }) if driver == "ftp"
        ));

        let settings = provider("s3", &[("driver", "s3")]);
        assert!(matches!(
            StorageDisk::from_settings(&settings),
            Err(RestoreServiceError::MissingProviderSetting { key, .. }) if key == "bucket"
        ));

        let settings = provider("nodriver", &[("root", "/tmp")]);
        assert!(StorageDisk::from_settings(&settings).is_err());
    }

    #[test]
    fn test_local_listing_marks_directories() -> Result<(), RestoreServiceError> {
        let root = tempfile::tempdir()?;
        fs::write(root.path().join("b.sql"), b"select 1;")?;
        fs::write(root.path().join("a.sql.gz"), b"")?;
        fs::create_dir(root.path().join("old"))?;

        let root_str = root.path().to_string_lossy().to_string();
        let disk = LocalDisk::new(root.path());
        let entries = disk.list_contents(&root_str)?;

        let names: Vec<&str> = entries.iter().map(|e| e.basename.as_str()).collect();
        assert_eq!(names, vec!["a.sql.gz", "b.sql", "old"]);
        assert!(entries[2].is_dir());
        assert_eq!(entries[1].size, 9);
        assert_eq!(entries[1].path, format!("{}/b.sql", root_str));
        Ok(())
    }

    #[test]
    fn test_local_fetch_requires_file() -> Result<(), RestoreServiceError> {
        let root = tempfile::tempdir()?;
        fs::write(root.path().join("prod.sql"), b"")?;
        let disk = StorageDisk::Local(LocalDisk::new(root.path()));
        let executor = CommandExecutor::new();

        let fetched = disk.fetch("/prod.sql", root.path(), &executor)?;
        assert_eq!(fetched, root.path().join("prod.sql"));

        assert!(matches!(
            disk.fetch("/missing.sql", root.path(), &executor),
            Err(RestoreServiceError::BackupNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_manager_catalog() -> Result<(), RestoreServiceError> {
        let config = Config {
            storage_providers: vec![
                provider("s3", &[("driver", "s3"), ("bucket", "b"), ("root", "/srv/s3")]),
                provider("local", &[("driver", "local"), ("root", "/var/backups")]),
            ],
            database_providers: vec![],
        };
        let manager = StorageManager::new(&config);

        assert_eq!(manager.list_available_providers(), vec!["s3", "local"]);
        assert_eq!(manager.config("local", "root")?, "/var/backups");
        assert!(matches!(
            manager.config("nope", "root"),
            Err(RestoreServiceError::UnknownStorageProvider(_))
        ));
        assert!(matches!(
            manager.config("local", "bucket"),
            Err(RestoreServiceError::MissingProviderSetting { .. })
        ));
        Ok(())
    }
}
