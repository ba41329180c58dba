// src/manifest/mutator.rs

//! Deferred manifest edits
//!
//! Edits requested on the command line are recorded here and only replayed
//! once the manifest stage has read the archive's own manifest.

use super::ManifestFile;

/// A single recorded edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestOperation {
    Put { key: String, value: String },
    Remove { key: String },
}

impl ManifestOperation {
    pub fn key(&self) -> &str {
        match self {
            Self::Put { key, .. } | Self::Remove { key } => key,
        }
    }

    fn apply(&self, file: &mut ManifestFile) {
        match self {
            Self::Put { key, value } => file.put(key.clone(), value.clone()),
            Self::Remove { key } => file.remove(key),
        }
    }
}

/// Append-only log of manifest edits, replayed in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestMutator {
    operations: Vec<ManifestOperation>,
}

impl ManifestMutator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.operations.push(ManifestOperation::Put {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn remove(&mut self, key: impl Into<String>) -> &mut Self {
        self.operations
            .push(ManifestOperation::Remove { key: key.into() });
        self
    }

    /// Replay every recorded operation against `file`
    pub fn apply(&self, file: &mut ManifestFile) {
        for op in &self.operations {
            op.apply(file);
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestOperation> {
        self.operations.iter()
    }
}
