use clap::{Parser, Subcommand};
use tracing::{info, warn};

mod config;
mod errors;
mod list;
mod parameters;
mod restore;
mod shared;
mod utils;

use parameters::{Compression, ParameterSet};

#[derive(Parser)]
#[command(name = "db-restore")]
#[command(about = "Restore a database from a stored backup file", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Restore a backup; omitted options are asked interactively
    Restore {
        /// Storage provider holding the backup
        #[arg(short, long)]
        source: Option<String>,
        /// Path of the backup file on the storage provider
        #[arg(short = 'p', long, alias = "sourcePath")]
        source_path: Option<String>,
        /// Database provider to restore into
        #[arg(short, long)]
        database: Option<String>,
        /// Compression of the backup file
        #[arg(short, long, value_enum)]
        compression: Option<Compression>,
    },
    /// List configured storage and database providers
    Providers {
        /// Return data as JSON (for scripting)
        #[arg(short, long)]
        json: bool,
    },
    /// Generate sample .env file
    Init,
}

fn init_logging() -> Result<(), crate::errors::RestoreServiceError> {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt::writer::MakeWriterExt, EnvFilter};

    std::fs::create_dir_all("./logs")?;

    let file_appender = rolling::daily("./logs", "db-restore.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_writer(std::io::stdout.and(non_blocking))
        .with_env_filter(env_filter)
        .init();

    // Flushes on drop, so it has to outlive main
    std::mem::forget(guard);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Restore {
            source,
            source_path,
            database,
            compression,
        } => {
            let config = config::Config::load()?;
            let parameters = ParameterSet::new(source, source_path, database, compression);
            restore::restore_interactive(config, parameters).await?;
        }
        Commands::Providers { json } => {
            let config = config::Config::load()?;
            list::list_providers(config, json).await?;
        }
        Commands::Init => {
            init_env_file()?;
        }
    }

    Ok(())
}

fn init_env_file() -> Result<(), crate::errors::RestoreServiceError> {
    use std::fs;
    use std::path::Path;

    let env_file = ".env";
    if Path::new(env_file).exists() {
        warn!(file = %env_file, ".env file already exists, not overwriting");
        return Ok(());
    }

    let content = r#"# Database Restore Configuration
# Fill in your actual values below

# Storage providers, in the order they are offered (comma-separated)
STORAGE_PROVIDERS=local,s3

# Local directory
STORAGE_LOCAL_DRIVER=local
STORAGE_LOCAL_ROOT=/var/backups

# S3 bucket (accessed through the aws CLI)
STORAGE_S3_DRIVER=s3
STORAGE_S3_BUCKET=your-bucket
STORAGE_S3_ROOT=/database-dumps
STORAGE_S3_KEY=your_access_key_here
STORAGE_S3_SECRET=your_secret_key_here
STORAGE_S3_REGION=auto
# STORAGE_S3_ENDPOINT=https://your-account.r2.cloudflarestorage.com

# Database providers, in the order they are offered (comma-separated)
DATABASE_PROVIDERS=production

# Driver is mysql or postgresql
DATABASE_PRODUCTION_DRIVER=postgresql
DATABASE_PRODUCTION_HOST=localhost
DATABASE_PRODUCTION_PORT=5432
DATABASE_PRODUCTION_USER=postgres
DATABASE_PRODUCTION_PASSWORD=your_password_here
DATABASE_PRODUCTION_DATABASE=app
"#;

    fs::write(env_file, content)?;
    info!(file = %env_file, "Created sample .env file, please edit with your actual settings");

    Ok(())
}
