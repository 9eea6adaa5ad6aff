use crate::config::ProviderSettings;
use crate::errors::RestoreServiceError;
use std::fs::File;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tracing::debug;

/// Runs the external tools a restore relies on: aws, gzip and the database clients
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor;

impl CommandExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Build an `aws` command carrying the provider's credentials
    fn aws_command(&self, storage: &ProviderSettings) -> Command {
        let mut command = Command::new("aws");
        if let Some(key) = storage.get("key") {
            command.env("AWS_ACCESS_KEY_ID", key);
        }
        if let Some(secret) = storage.get("secret") {
            command.env("AWS_SECRET_ACCESS_KEY", secret);
        }
        if let Some(region) = storage.get("region") {
            command.env("AWS_DEFAULT_REGION", region);
        }
        command
    }

    /// Execute AWS command with proper credentials and error handling
    pub fn execute_aws_command(
        &self,
        storage: &ProviderSettings,
        args: &[&str],
        context: &str,
    ) -> Result<String, RestoreServiceError> {
        let mut full_args: Vec<&str> = args.to_vec();
        if let Some(endpoint) = storage.get("endpoint") {
            full_args.extend(["--endpoint-url", endpoint]);
        }
        debug!(args = ?full_args, context = %context, "Executing AWS command");

        let output = self
            .aws_command(storage)
            .args(&full_args)
            .output()
            .map_err(|_| RestoreServiceError::CommandNotFound("Failed to execute aws".to_string()))?;

        check_output(output, context)
    }

    /// Decompress a gzip file into `target` using the gzip binary
    pub fn decompress_gzip(&self, archive: &Path, target: &Path) -> Result<(), RestoreServiceError> {
        debug!(archive = %archive.display(), target = %target.display(), "Decompressing gzip archive");

        let output = Command::new("gzip")
            .arg("-dc")
            .arg(archive)
            .stdout(Stdio::from(File::create(target)?))
            .stderr(Stdio::piped())
            .output()
            .map_err(|_| RestoreServiceError::CommandNotFound("Failed to execute gzip".to_string()))?;

        check_output(output, &archive.to_string_lossy()).map(|_| ())
    }

    /// Feed a dump file on stdin to a database client
    pub fn import_dump(
        &self,
        client: &ClientInvocation,
        dump: &Path,
        context: &str,
    ) -> Result<(), RestoreServiceError> {
        debug!(program = %client.program, args = ?client.args, context = %context, "Importing dump");

        let mut command = Command::new(&client.program);
        command.args(&client.args);
        for (key, value) in &client.envs {
            command.env(key, value);
        }

        let output = command
            .stdin(Stdio::from(File::open(dump)?))
            .output()
            .map_err(|_| {
                RestoreServiceError::CommandNotFound(format!("Failed to execute {}", client.program))
            })?;

        check_output(output, context).map(|_| ())
    }
}

/// Program, arguments and environment of a database client call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
}

fn check_output(output: Output, context: &str) -> Result<String, RestoreServiceError> {
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(RestoreServiceError::from_stderr(&stderr, context))
    }
}
