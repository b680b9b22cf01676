//! # CLI Configuration
//!
//! Optional YAML file naming the schemas to load, the validation policy, and
//! codec options. Every section has a default, so an empty file (or none at
//! all) is a valid configuration. Command-line flags are applied on top.
//!
//! ```yaml
//! schema_dirs: [schemas/iso20022]
//! schema_files: [extra/head.001.001.02.xsd]
//! pattern: "*.xsd"
//! recursive: false
//! bundled: true
//! policy:
//!   accept_with_errors: false
//!   accept_with_warnings: true
//! codec:
//!   markup:
//!     include_namespace: true
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use iso20022_codec::CodecOptions;
use iso20022_message::BUNDLED_SCHEMAS;
use iso20022_schema::{SchemaAggregator, ValidationPolicy, DEFAULT_PATTERN};

/// Contents of the YAML configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Directories scanned for schema definitions.
    pub schema_dirs: Vec<PathBuf>,
    /// Individual schema definition files.
    pub schema_files: Vec<PathBuf>,
    /// File-name pattern applied inside `schema_dirs`.
    pub pattern: String,
    /// Descend into subdirectories of `schema_dirs`.
    pub recursive: bool,
    /// Load the schemas compiled into the binary.
    pub bundled: bool,
    pub policy: ValidationPolicy,
    pub codec: CodecOptions,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            schema_dirs: Vec::new(),
            schema_files: Vec::new(),
            pattern: DEFAULT_PATTERN.to_string(),
            recursive: false,
            bundled: true,
            policy: ValidationPolicy::default(),
            codec: CodecOptions::default(),
        }
    }
}

impl CliConfig {
    /// Read the file at `path`, or the defaults when there is none.
    ///
    /// Relative schema paths in the file are taken relative to the file's
    /// own directory.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&text)
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        };

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for dir in &mut config.schema_dirs {
            *dir = crate::resolve_path(dir, base);
        }
        for file in &mut config.schema_files {
            *file = crate::resolve_path(file, base);
        }
        tracing::debug!(config = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Build the schema aggregate this configuration describes.
    ///
    /// Returns the aggregate and whether every source loaded. Sources that
    /// fail are logged and skipped.
    pub fn aggregator(&self) -> (SchemaAggregator, bool) {
        let mut aggregator = SchemaAggregator::with_policy(self.policy);
        let mut all_loaded = true;
        if self.bundled {
            all_loaded &= aggregator.add_resources(BUNDLED_SCHEMAS, &[]);
        }
        for dir in &self.schema_dirs {
            all_loaded &= aggregator.add_directory(dir, &self.pattern, self.recursive);
        }
        all_loaded &= aggregator.add_definitions(self.schema_files.iter().cloned());

        tracing::info!(
            definitions = aggregator.definitions().len(),
            all_loaded,
            "schema aggregate ready"
        );
        (aggregator, all_loaded)
    }
}

/// Flags shared by every subcommand that loads schemas.
#[derive(Args, Debug, Clone, Default)]
pub struct SchemaArgs {
    /// Directory of schema definitions to load (repeatable).
    #[arg(long = "schema-dir", value_name = "DIR")]
    pub schema_dirs: Vec<PathBuf>,

    /// Schema definition file to load (repeatable).
    #[arg(long = "schema", value_name = "FILE")]
    pub schema_files: Vec<PathBuf>,

    /// File-name pattern for schema directories.
    #[arg(long)]
    pub pattern: Option<String>,

    /// Descend into subdirectories of schema directories.
    #[arg(long)]
    pub recursive: bool,

    /// Skip the schemas compiled into the binary.
    #[arg(long)]
    pub no_bundled: bool,

    /// Accept documents with validation errors.
    #[arg(long)]
    pub accept_errors: bool,

    /// Reject documents with validation warnings.
    #[arg(long)]
    pub reject_warnings: bool,
}

impl SchemaArgs {
    /// Overlay these flags on `config`. Lists extend the file's lists;
    /// switches only ever move away from the defaults.
    pub fn apply(&self, config: &mut CliConfig) {
        config.schema_dirs.extend(self.schema_dirs.iter().cloned());
        config.schema_files.extend(self.schema_files.iter().cloned());
        if let Some(pattern) = &self.pattern {
            config.pattern = pattern.clone();
        }
        config.recursive |= self.recursive;
        if self.no_bundled {
            config.bundled = false;
        }
        if self.accept_errors {
            config.policy.accept_with_errors = true;
        }
        if self.reject_warnings {
            config.policy.accept_with_warnings = false;
        }
    }
}
