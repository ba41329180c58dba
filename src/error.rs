// src/error.rs

//! Error types for the packager
//!
//! Three families of failure exist:
//! - [`ConfigError`]: a setter rejected a value. Raised synchronously, never by a stage.
//! - [`ManifestError`]: a manifest could not be parsed.
//! - [`Error`]: a stage failed. The pipeline halts and the error reaches the caller.

use std::io;
use thiserror::Error;

/// Result alias used by stages and the archive/bytecode helpers
pub type Result<T> = std::result::Result<T, Error>;

/// A rejected configuration value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Java version {0} out of bounds (expected 5 - 21)")]
    VersionOutOfBounds(u32),

    #[error("Starting escape '%' may not be last char in string")]
    PromptTrailingEscape,

    #[error("Escape char '%' must be followed by '%' or 'd' (found '{0}')")]
    PromptInvalidEscape(char),

    #[error("String may only have up to 1 \"%d\" template symbol")]
    PromptMultipleTemplates,

    #[error("Unknown architecture: {0} (expected x86_64 or x86)")]
    InvalidArch(String),

    #[error("Invalid manifest entry \"{0}\" (expected KEY=VALUE)")]
    InvalidManifestEntry(String),
}

/// A manifest that could not be read
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Invalid entry @ line #{line} of manifest")]
    InvalidEntry { line: usize },

    #[error("Failed to read manifest: {0}")]
    Io(#[from] io::Error),
}

/// A stage failure
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O operation failed
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// An archive could not be read or written
    #[error("{context}: {source}")]
    Archive {
        context: String,
        #[source]
        source: zip::result::ZipError,
    },

    /// Waiting on a subprocess was interrupted
    #[error("{context}")]
    Interrupted {
        context: String,
        #[source]
        source: io::Error,
    },

    /// A network fetch failed
    #[error("{context}: {source}")]
    Download {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Domain failure (bad archive contents, tool exit codes, missing outputs)
    #[error("{0}")]
    Failed(String),
}

impl Error {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn archive(context: impl Into<String>, source: zip::result::ZipError) -> Self {
        Self::Archive {
            context: context.into(),
            source,
        }
    }

    pub fn interrupted(context: impl Into<String>, source: io::Error) -> Self {
        Self::Interrupted {
            context: context.into(),
            source,
        }
    }

    pub fn download(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Download {
            context: context.into(),
            source,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Wrap an I/O error from subprocess handling, keeping interruptions distinct
    pub fn process(context: impl Into<String>, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::Interrupted {
            Self::interrupted("Packager interrupted while waiting on subprocess", source)
        } else {
            Self::io(context, source)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_error_kinds() {
        let err = Error::process("cmake", io::Error::new(io::ErrorKind::Interrupted, "signal"));
        assert!(matches!(err, Error::Interrupted { .. }));

        let err = Error::process("cmake", io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().starts_with("cmake: "));
    }

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::VersionOutOfBounds(22).to_string(),
            "Java version 22 out of bounds (expected 5 - 21)"
        );
        assert_eq!(
            ManifestError::InvalidEntry { line: 3 }.to_string(),
            "Invalid entry @ line #3 of manifest"
        );
    }
}
