use crate::errors::RestoreServiceError;
use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;

/// Encoding applied to a backup file
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Compression {
    None,
    Gzip,
}

impl Compression {
    pub const ALL: [Compression; 2] = [Compression::None, Compression::Gzip];

    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compression {
    type Err = RestoreServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Compression::None),
            "gzip" => Ok(Compression::Gzip),
            other => Err(RestoreServiceError::InvalidCompression(other.to_string())),
        }
    }
}

/// The four parameters a restore needs, in prompting order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    Source,
    SourcePath,
    Database,
    Compression,
}

impl Parameter {
    pub const ORDER: [Parameter; 4] = [
        Parameter::Source,
        Parameter::SourcePath,
        Parameter::Database,
        Parameter::Compression,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Parameter::Source => "source",
            Parameter::SourcePath => "sourcePath",
            Parameter::Database => "database",
            Parameter::Compression => "compression",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters of a single restore run, each possibly unset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    pub source: Option<String>,
    pub source_path: Option<String>,
    pub database: Option<String>,
    pub compression: Option<Compression>,
}

impl ParameterSet {
    /// Build from externally supplied values; blank strings count as unset
    pub fn new(
        source: Option<String>,
        source_path: Option<String>,
        database: Option<String>,
        compression: Option<Compression>,
    ) -> Self {
        Self {
            source: non_blank(source),
            source_path: non_blank(source_path),
            database: non_blank(database),
            compression,
        }
    }

    pub fn is_set(&self, parameter: Parameter) -> bool {
        match parameter {
            Parameter::Source => self.source.is_some(),
            Parameter::SourcePath => self.source_path.is_some(),
            Parameter::Database => self.database.is_some(),
            Parameter::Compression => self.compression.is_some(),
        }
    }

    /// Unset parameters in prompting order
    pub fn missing(&self) -> Vec<Parameter> {
        Parameter::ORDER
            .into_iter()
            .filter(|parameter| !self.is_set(*parameter))
            .collect()
    }

    pub fn resolved(&self) -> Result<ResolvedParameters, RestoreServiceError> {
        match (
            &self.source,
            &self.source_path,
            &self.database,
            self.compression,
        ) {
            (Some(source), Some(source_path), Some(database), Some(compression)) => {
                Ok(ResolvedParameters {
                    source: source.clone(),
                    source_path: source_path.clone(),
                    database: database.clone(),
                    compression,
                })
            }
            _ => Err(RestoreServiceError::UnresolvedParameters(
                self.missing()
                    .iter()
                    .map(|parameter| parameter.name().to_string())
                    .collect(),
            )),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Fully resolved parameters, ready to hand to the restore engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParameters {
    pub source: String,
    pub source_path: String,
    pub database: String,
    pub compression: Compression,
}
