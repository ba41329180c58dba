// src/packager/config.rs

//! Packager configuration types
//!
//! [`Settings`] is the live configuration guarded by the packager's
//! reader/writer lock. [`PackagerConfig`] is the on-disk TOML form; it is
//! applied through the packager's validating setters so a file can never
//! carry a value a setter would reject.

use super::Packager;
use crate::asset::AssetSource;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Application name used when none is configured
pub const DEFAULT_APP_NAME: &str = "JARNative";

/// Output name used when neither an output name nor an app name is set
pub const DEFAULT_OUTPUT_NAME: &str = "jarnative";

pub const DEFAULT_INSTALL_PROMPT: &str = "This application requires Java %d or greater, which could not be found. Install now? The download may take a few moments.";

pub const DEFAULT_MIN_JAVA_VERSION: u32 = 8;
pub const DEFAULT_PREFERRED_JAVA_VERSION: u32 = 21;

/// Inclusive bounds accepted for Java versions
pub const JAVA_VERSION_BOUNDS: (u32, u32) = (5, 21);

/// Target architecture of the generated executable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PackagerArch {
    /// x86_64 / AMD64
    #[default]
    X86_64,
    /// 32-bit x86
    X86,
}

impl PackagerArch {
    pub fn is_64bit(&self) -> bool {
        matches!(self, Self::X86_64)
    }

    /// MinGW target triple prefix for this architecture
    pub fn mingw_prefix(&self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::X86 => "i686",
        }
    }
}

impl FromStr for PackagerArch {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Ok(Self::X86_64),
            "x86" | "i686" | "i386" => Ok(Self::X86),
            _ => Err(ConfigError::InvalidArch(s.to_string())),
        }
    }
}

impl std::fmt::Display for PackagerArch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X86_64 => write!(f, "x86_64"),
            Self::X86 => write!(f, "x86"),
        }
    }
}

/// Live packager configuration
///
/// Unset optional fields fall back to derived defaults in the packager's
/// getters.
#[derive(Debug, Clone)]
pub struct Settings {
    pub arch: PackagerArch,
    pub release: bool,
    pub app_name: Option<String>,
    pub min_java_version: u32,
    pub preferred_java_version: u32,
    pub launch_flags: String,
    pub install_prompt: String,
    pub source: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub output_name: Option<String>,
    pub auto_install: bool,
    pub attribution: bool,
    /// Template tree override; bundled assets are discovered when unset
    pub assets: Option<Arc<dyn AssetSource>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            arch: PackagerArch::default(),
            release: false,
            app_name: None,
            min_java_version: DEFAULT_MIN_JAVA_VERSION,
            preferred_java_version: DEFAULT_PREFERRED_JAVA_VERSION,
            launch_flags: String::new(),
            install_prompt: DEFAULT_INSTALL_PROMPT.to_string(),
            source: None,
            output_dir: None,
            output_name: None,
            auto_install: false,
            attribution: true,
            assets: None,
        }
    }
}

impl Settings {
    pub fn app_name(&self) -> &str {
        self.app_name.as_deref().unwrap_or(DEFAULT_APP_NAME)
    }

    /// Explicit output name, or one derived from the app name
    pub fn output_name(&self) -> String {
        if let Some(name) = &self.output_name {
            return name.clone();
        }
        match &self.app_name {
            Some(app) => derive_output_name(app),
            None => DEFAULT_OUTPUT_NAME.to_string(),
        }
    }
}

/// Lowercase, with each whitespace character replaced by `_`
pub fn derive_output_name(app_name: &str) -> String {
    app_name
        .chars()
        .map(|c| {
            if c.is_whitespace() {
                "_".to_string()
            } else {
                c.to_lowercase().collect()
            }
        })
        .collect()
}

pub fn check_java_version(version: u32) -> Result<u32, ConfigError> {
    let (low, high) = JAVA_VERSION_BOUNDS;
    if version < low || version > high {
        return Err(ConfigError::VersionOutOfBounds(version));
    }
    Ok(version)
}

/// Validate an install prompt template.
///
/// `%%` is a literal percent and at most one `%d` may appear. Any other
/// escape, or a `%` at the very end, is rejected.
pub fn validate_install_prompt(prompt: &str) -> Result<(), ConfigError> {
    let mut chars = prompt.chars();
    let mut templates = 0;
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        match chars.next() {
            None => return Err(ConfigError::PromptTrailingEscape),
            Some('%') => {}
            Some('d') => {
                templates += 1;
                if templates > 1 {
                    return Err(ConfigError::PromptMultipleTemplates);
                }
            }
            Some(other) => return Err(ConfigError::PromptInvalidEscape(other)),
        }
    }
    Ok(())
}

/// Split a `KEY=VALUE` manifest override
pub fn parse_manifest_entry(entry: &str) -> Result<(String, String), ConfigError> {
    match entry.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigError::InvalidManifestEntry(entry.to_string())),
    }
}

/// Manifest edits from a configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Entries to set
    pub put: BTreeMap<String, String>,
    /// Keys to remove, applied after `put`
    pub remove: Vec<String>,
}

/// Packager configuration file
///
/// ```toml
/// app_name = "My App"
/// arch = "x86_64"
/// min_java_version = 11
///
/// [manifest.put]
/// Main-Class = "com.example.Main"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagerConfig {
    pub arch: Option<PackagerArch>,
    pub release: Option<bool>,
    pub app_name: Option<String>,
    pub min_java_version: Option<u32>,
    pub preferred_java_version: Option<u32>,
    pub launch_flags: Option<String>,
    pub install_prompt: Option<String>,
    pub source: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub output_name: Option<String>,
    pub auto_install: Option<bool>,
    pub attribution: Option<bool>,
    pub manifest: ManifestConfig,
}

impl PackagerConfig {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply every field that is set through the packager's setters.
    ///
    /// Java versions are applied preferred-first so a file raising both
    /// bounds is not judged against the old preferred version.
    pub fn apply(&self, packager: &Packager) -> Result<(), ConfigError> {
        if let Some(arch) = self.arch {
            packager.set_arch(arch);
        }
        if let Some(release) = self.release {
            packager.set_release(release);
        }
        if let Some(name) = &self.app_name {
            packager.set_app_name(Some(name.clone()));
        }
        if let Some(version) = self.preferred_java_version {
            packager.set_preferred_java_version(version)?;
        }
        if let Some(version) = self.min_java_version {
            packager.set_min_java_version(version)?;
        }
        if let Some(flags) = &self.launch_flags {
            packager.set_launch_flags(flags.clone());
        }
        if let Some(prompt) = &self.install_prompt {
            packager.set_install_prompt(Some(prompt))?;
        }
        if let Some(source) = &self.source {
            packager.set_source(Some(source.clone()));
        }
        if let Some(dir) = &self.output_dir {
            packager.set_output_dir(Some(dir.clone()));
        }
        if let Some(name) = &self.output_name {
            packager.set_output_name(Some(name.clone()));
        }
        if let Some(auto) = self.auto_install {
            packager.set_auto_install(auto);
        }
        if let Some(attribution) = self.attribution {
            packager.set_attribution_enabled(attribution);
        }

        let mut mutator = packager.manifest();
        for (key, value) in &self.manifest.put {
            mutator.put(key.clone(), value.clone());
        }
        for key in &self.manifest.remove {
            mutator.remove(key.clone());
        }
        Ok(())
    }
}
