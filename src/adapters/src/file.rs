//! JSON and YAML file storage
//!
//! The file holds a [`PolicyDocument`]. Conditions are decoded through the
//! adapter's [`ConditionRegistry`], so custom condition types must be
//! registered there before the policy is loaded.

use crate::error::{AdapterError, Result as AdapterResult};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};
use warden_authz::{ConditionRegistry, PolicyDefinition, PolicyDocument, StorageAdapter};

/// Default JSON indentation
pub const DEFAULT_JSON_INDENT: &str = "\t";

/// Default permission mode for written policy files
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Encoding of a policy file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// `.json`
    Json,
    /// `.yaml` or `.yml`
    Yaml,
}

impl FileType {
    /// Infer the file type from a path's extension
    pub fn from_path(path: &Path) -> AdapterResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        extension.parse()
    }
}

impl FromStr for FileType {
    type Err = AdapterError;

    fn from_str(s: &str) -> AdapterResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(AdapterError::UnsupportedFileType(other.to_string())),
        }
    }
}

/// Stores the policy in a JSON or YAML file
#[derive(Debug, Clone)]
pub struct FileAdapter {
    path: PathBuf,
    file_type: FileType,
    registry: Arc<ConditionRegistry>,
    json_indent: String,
    #[cfg_attr(not(unix), allow(dead_code))]
    file_mode: u32,
}

impl FileAdapter {
    /// Create an adapter for a file of the given type, decoding conditions
    /// with the built-in condition types.
    pub fn new(path: impl Into<PathBuf>, file_type: FileType) -> Self {
        Self {
            path: path.into(),
            file_type,
            registry: Arc::new(ConditionRegistry::with_builtins()),
            json_indent: DEFAULT_JSON_INDENT.to_string(),
            file_mode: DEFAULT_FILE_MODE,
        }
    }

    /// Create an adapter, inferring the file type from the extension
    pub fn from_path(path: impl Into<PathBuf>) -> AdapterResult<Self> {
        let path = path.into();
        let file_type = FileType::from_path(&path)?;
        Ok(Self::new(path, file_type))
    }

    /// Decode conditions with the given registry
    pub fn with_registry(mut self, registry: Arc<ConditionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Indentation used when writing JSON
    pub fn with_json_indent(mut self, indent: impl Into<String>) -> Self {
        self.json_indent = indent.into();
        self
    }

    /// Permission mode used when creating the file (Unix only)
    pub fn with_file_mode(mut self, mode: u32) -> Self {
        self.file_mode = mode;
        self
    }

    /// Path of the policy file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encoding of the policy file
    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    fn read_document(&self) -> AdapterResult<PolicyDocument> {
        let content = fs::read_to_string(&self.path).map_err(|e| AdapterError::io(&self.path, e))?;

        let document = match self.file_type {
            FileType::Json => serde_json::from_str(&content)?,
            FileType::Yaml => serde_yaml::from_str(&content)?,
        };

        Ok(document)
    }

    fn encode(&self, document: &PolicyDocument) -> AdapterResult<Vec<u8>> {
        match self.file_type {
            FileType::Json => {
                let formatter = serde_json::ser::PrettyFormatter::with_indent(self.json_indent.as_bytes());
                let mut buffer = Vec::new();
                let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
                document.serialize(&mut serializer)?;
                Ok(buffer)
            }
            FileType::Yaml => Ok(serde_yaml::to_string(document)?.into_bytes()),
        }
    }

    fn write_file(&self, content: &[u8]) -> AdapterResult<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(self.file_mode);
        }

        let mut file = options
            .open(&self.path)
            .map_err(|e| AdapterError::io(&self.path, e))?;
        file.write_all(content)
            .map_err(|e| AdapterError::io(&self.path, e))?;

        Ok(())
    }
}

impl StorageAdapter for FileAdapter {
    fn load_policy(&self) -> warden_authz::Result<PolicyDefinition> {
        debug!(path = %self.path.display(), file_type = ?self.file_type, "Loading policy file");

        let document = self.read_document()?;
        let policy = PolicyDefinition::from_document(document, &self.registry)?;

        info!(
            path = %self.path.display(),
            roles = policy.roles.len(),
            presets = policy.permission_presets.len(),
            "Policy file loaded"
        );
        Ok(policy)
    }

    fn save_policy(&self, policy: &PolicyDefinition) -> warden_authz::Result<()> {
        let document = policy.to_document()?;
        let content = self.encode(&document)?;
        self.write_file(&content)?;

        info!(path = %self.path.display(), "Policy file saved");
        Ok(())
    }
}
