//! # Schema Aggregator
//!
//! A set of schema definitions loaded from many sources and treated as one
//! aggregate, plus the log of every validation event raised against it.
//!
//! ## Loading
//!
//! Every source is read, parsed and checked completely before it joins the
//! aggregate. A failing source is logged and leaves the aggregate exactly
//! as it was. Bulk loaders (`add_definitions`, `add_directory`,
//! `add_resources`) keep going after a failure and report `false` if any
//! source failed.
//!
//! Reloading a source with byte-identical content is a no-op. A different
//! source that redeclares a global component in the same namespace is
//! rejected.
//!
//! ## Event Log
//!
//! Events accumulate across `validate` calls until `reset`, which returns
//! the aggregator to its initial empty state: no definitions, no events.
//! `clear_events` drops only the log.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use iso20022_core::parse_document;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{SchemaError, ValidationFailure};
use crate::event::ValidationEvent;
use crate::model::SchemaDefinition;
use crate::parse::parse_definition;
use crate::validate::validate_document;

/// File name pattern used when loading a directory without one.
pub const DEFAULT_PATTERN: &str = "*.xsd";

/// Where a schema definition comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// A file on disk.
    Path(PathBuf),
    /// Text already in memory, with a name for diagnostics.
    Text {
        /// Name reported in logs and errors.
        name: String,
        /// The schema document.
        content: String,
    },
}

impl SchemaSource {
    /// A file source.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// An in-memory source.
    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Drain a reader into an in-memory source. The reader is dropped
    /// before this returns.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Io` if reading fails or the bytes are not
    /// UTF-8.
    pub fn from_reader(name: impl Into<String>, mut reader: impl Read) -> Result<Self, SchemaError> {
        let name = name.into();
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|error| SchemaError::Io {
                source_name: name.clone(),
                error,
            })?;
        Ok(Self::Text { name, content })
    }

    /// Name used in diagnostics.
    pub fn name(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Text { name, .. } => name.clone(),
        }
    }

    fn into_text(self) -> Result<(String, String), SchemaError> {
        match self {
            Self::Path(path) => {
                let name = path.display().to_string();
                let content = std::fs::read_to_string(&path).map_err(|error| SchemaError::Io {
                    source_name: name.clone(),
                    error,
                })?;
                Ok((name, content))
            }
            Self::Text { name, content } => Ok((name, content)),
        }
    }
}

impl From<PathBuf> for SchemaSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for SchemaSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

/// Named schema resources bundled with an application, such as files
/// embedded with `include_str!`.
pub trait ResourceProvider {
    /// Every resource name the provider offers.
    fn resource_names(&self) -> Vec<String>;

    /// Contents of one resource, if present.
    fn resource(&self, name: &str) -> Option<String>;
}

impl ResourceProvider for [(&str, &str)] {
    fn resource_names(&self) -> Vec<String> {
        self.iter().map(|(name, _)| (*name).to_string()).collect()
    }

    fn resource(&self, name: &str) -> Option<String> {
        self.iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, content)| (*content).to_string())
    }
}

impl ResourceProvider for BTreeMap<String, String> {
    fn resource_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }

    fn resource(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Which validation outcomes still yield a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Accept documents that raised errors.
    pub accept_with_errors: bool,
    /// Accept documents that raised warnings.
    pub accept_with_warnings: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            accept_with_errors: false,
            accept_with_warnings: true,
        }
    }
}

impl ValidationPolicy {
    /// Reject on any event.
    pub fn strict() -> Self {
        Self {
            accept_with_errors: false,
            accept_with_warnings: false,
        }
    }

    /// Accept regardless of events.
    pub fn permissive() -> Self {
        Self {
            accept_with_errors: true,
            accept_with_warnings: true,
        }
    }

    /// True if a document with these counts is accepted.
    pub fn accepts(&self, errors: usize, warnings: usize) -> bool {
        (errors == 0 || self.accept_with_errors) && (warnings == 0 || self.accept_with_warnings)
    }
}

/// Result of loading one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The definition joined the aggregate.
    Added,
    /// Identical content was already loaded; nothing changed.
    Unchanged,
}

/// Schema definitions aggregated from many sources, with the event log of
/// every document validated against them.
#[derive(Debug, Default)]
pub struct SchemaAggregator {
    definitions: Vec<SchemaDefinition>,
    events: Vec<ValidationEvent>,
    policy: ValidationPolicy,
}

impl SchemaAggregator {
    /// An empty aggregate with the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty aggregate with the given policy.
    pub fn with_policy(policy: ValidationPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ValidationPolicy) {
        self.policy = policy;
    }

    /// Loaded definitions, in load order.
    pub fn definitions(&self) -> &[SchemaDefinition] {
        &self.definitions
    }

    /// True if no definition is loaded.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Distinct target namespaces across loaded definitions.
    pub fn target_namespaces(&self) -> BTreeSet<Option<&str>> {
        self.definitions
            .iter()
            .map(|d| d.target_namespace.as_deref())
            .collect()
    }

    /// Load one source into the aggregate.
    ///
    /// # Errors
    ///
    /// Returns a `SchemaError` when the source cannot be read, is not
    /// well-formed, is not a usable schema, or redeclares a component
    /// another definition already declares. The aggregate is unchanged.
    pub fn load_definition(&mut self, source: impl Into<SchemaSource>) -> Result<LoadOutcome, SchemaError> {
        let (name, content) = source.into().into_text()?;
        let digest = hex::encode(Sha256::digest(content.as_bytes()));
        if self.definitions.iter().any(|d| d.digest == digest) {
            tracing::debug!(source = %name, "schema definition already loaded");
            return Ok(LoadOutcome::Unchanged);
        }

        let root = parse_document(&content).map_err(|error| SchemaError::Malformed {
            source_name: name.clone(),
            error,
        })?;
        let definition = parse_definition(&name, digest, &root)?;
        self.check_conflicts(&definition)?;

        tracing::debug!(
            source = %name,
            namespace = definition.target_namespace.as_deref().unwrap_or(""),
            components = definition.component_count(),
            "schema definition loaded"
        );
        self.definitions.push(definition);
        Ok(LoadOutcome::Added)
    }

    fn check_conflicts(&self, candidate: &SchemaDefinition) -> Result<(), SchemaError> {
        for existing in self
            .definitions
            .iter()
            .filter(|d| d.target_namespace == candidate.target_namespace)
        {
            let declared: BTreeSet<_> = existing.global_components().collect();
            if let Some((kind, name)) = candidate
                .global_components()
                .find(|component| declared.contains(component))
            {
                return Err(SchemaError::Duplicate {
                    source_name: candidate.source_name.clone(),
                    kind,
                    name: name.to_string(),
                    existing: existing.source_name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Load one source, logging any failure.
    ///
    /// Returns `true` if the definition is now part of the aggregate.
    pub fn add_definition(&mut self, source: impl Into<SchemaSource>) -> bool {
        match self.load_definition(source) {
            Ok(_) => true,
            Err(error) => {
                tracing::error!(source = %error.source_name(), %error, "schema definition rejected");
                false
            }
        }
    }

    /// Load a definition from a reader. The reader is consumed and dropped
    /// before this returns, whatever the outcome.
    pub fn add_definition_reader(&mut self, name: &str, reader: impl Read) -> bool {
        match SchemaSource::from_reader(name, reader) {
            Ok(source) => self.add_definition(source),
            Err(error) => {
                tracing::error!(source = %name, %error, "schema definition rejected");
                false
            }
        }
    }

    /// Load every source. Failures do not stop the remaining sources.
    ///
    /// Returns `true` only if every source loaded.
    pub fn add_definitions<I, S>(&mut self, sources: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<SchemaSource>,
    {
        sources
            .into_iter()
            .fold(true, |all_ok, source| self.add_definition(source) && all_ok)
    }

    /// Load every file in `dir` whose name matches `pattern`, descending
    /// into subdirectories when `recursive` is set. Files load in sorted
    /// path order.
    ///
    /// Returns `false` if the directory cannot be read, the pattern is
    /// invalid, or any matching file fails to load.
    pub fn add_directory(&mut self, dir: impl AsRef<Path>, pattern: &str, recursive: bool) -> bool {
        let dir = dir.as_ref();
        let matcher = match glob::Pattern::new(pattern) {
            Ok(matcher) => matcher,
            Err(error) => {
                tracing::error!(%pattern, %error, "invalid schema file pattern");
                return false;
            }
        };
        let mut files = Vec::new();
        if let Err(error) = collect_files(dir, &matcher, recursive, &mut files) {
            tracing::error!(dir = %dir.display(), %error, "cannot read schema directory");
            return false;
        }
        tracing::debug!(dir = %dir.display(), files = files.len(), "loading schema directory");
        self.add_definitions(files)
    }

    /// Load named resources from a provider. An empty `names` list loads
    /// every resource the provider lists.
    ///
    /// Returns `false` if the provider has nothing to load or any resource
    /// is missing or fails to load.
    pub fn add_resources<P>(&mut self, provider: &P, names: &[&str]) -> bool
    where
        P: ResourceProvider + ?Sized,
    {
        let names: Vec<String> = if names.is_empty() {
            provider.resource_names()
        } else {
            names.iter().map(|n| (*n).to_string()).collect()
        };
        if names.is_empty() {
            tracing::error!("resource provider offers no schema resources");
            return false;
        }
        names.into_iter().fold(true, |all_ok, name| {
            let loaded = match provider.resource(&name) {
                Some(content) => self.add_definition(SchemaSource::Text { name, content }),
                None => {
                    let error = SchemaError::MissingResource { name };
                    tracing::error!(source = %error.source_name(), %error, "schema definition rejected");
                    false
                }
            };
            loaded && all_ok
        })
    }

    /// Drop every definition and every event. The policy is kept.
    pub fn reset(&mut self) {
        self.definitions.clear();
        self.events.clear();
    }

    /// Drop the event log but keep loaded definitions.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Validate a document and return its canonical markup if the policy
    /// accepts it.
    ///
    /// # Errors
    ///
    /// `ValidationFailure::Malformed` if the text does not parse;
    /// `ValidationFailure::Rejected` if the policy refuses the events the
    /// document raised. Either way the events are in the log.
    pub fn try_validate(&mut self, document: &str) -> Result<String, ValidationFailure> {
        let root = match parse_document(document) {
            Ok(root) => root,
            Err(error) => {
                self.events
                    .push(ValidationEvent::error(error.to_string(), error.location()));
                return Err(error.into());
            }
        };
        let found = validate_document(&self.definitions, &root);
        let errors = found.iter().filter(|e| e.is_error()).count();
        let warnings = found.len() - errors;
        self.events.extend(found);

        if self.policy.accepts(errors, warnings) {
            Ok(root.to_xml_string())
        } else {
            Err(ValidationFailure::Rejected { errors, warnings })
        }
    }

    /// Validate a document and return its canonical markup, or `None`
    /// when it is malformed or the policy rejects it.
    ///
    /// Comments, processing instructions and insignificant whitespace are
    /// dropped; validating the result again yields the same text.
    pub fn validate(&mut self, document: &str) -> Option<String> {
        match self.try_validate(document) {
            Ok(canonical) => Some(canonical),
            Err(error) => {
                tracing::warn!(%error, "document failed validation");
                None
            }
        }
    }

    /// Every event since the last reset, in order.
    pub fn events(&self) -> &[ValidationEvent] {
        &self.events
    }

    /// Error events since the last reset.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationEvent> {
        self.events.iter().filter(|e| e.is_error())
    }

    /// Warning events since the last reset.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationEvent> {
        self.events.iter().filter(|e| e.is_warning())
    }

    /// True if any error was logged since the last reset.
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

fn collect_files(
    dir: &Path,
    pattern: &glob::Pattern,
    recursive: bool,
    out: &mut Vec<PathBuf>,
) -> std::io::Result<()> {
    let mut entries = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();
    for path in entries {
        if path.is_dir() {
            if recursive {
                collect_files(&path, pattern, recursive, out)?;
            }
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| pattern.matches(n))
        {
            out.push(path);
        }
    }
    Ok(())
}
