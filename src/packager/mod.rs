// src/packager/mod.rs

//! The packaging pipeline
//!
//! A [`Packager`] owns a working directory and a queue of stages. Stages run
//! one at a time against the packager's configuration and a shared
//! [`PackagerState`].
//!
//! # Locking
//!
//! - The state mutex is held for the whole of a stage body, so at most one
//!   stage runs at a time no matter how many threads call
//!   [`execute_stage`](Packager::execute_stage).
//! - Configuration lives behind its own reader/writer lock. Getters and
//!   setters never wait on a running stage.
//! - The stage queue has a third lock. Peeking takes a read lock; the head
//!   is dequeued under a write lock only after it succeeded.

mod config;
mod process;
mod state;
pub mod stages;

pub use config::{
    DEFAULT_APP_NAME, DEFAULT_INSTALL_PROMPT, DEFAULT_MIN_JAVA_VERSION,
    DEFAULT_PREFERRED_JAVA_VERSION, JAVA_VERSION_BOUNDS, ManifestConfig, PackagerArch,
    PackagerConfig, Settings, check_java_version, derive_output_name, parse_manifest_entry,
    validate_install_prompt,
};
pub use process::{download, run_logged};
pub use stages::{PackagerStage, default_stages};
pub use state::PackagerState;

use crate::asset::{self, AssetSource};
use crate::bytecode;
use crate::error::{ConfigError, Error, Result};
use crate::manifest::ManifestMutator;
use crate::template::TemplateValues;
use parking_lot::{Mutex, MutexGuard, RwLock, RwLockUpgradableReadGuard};
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

/// Suffix of the generated executable on this host
pub const EXTENSION: &str = if cfg!(windows) { ".exe" } else { "" };

/// Turns a JAR into a native launcher
pub struct Packager {
    work_dir: PathBuf,
    stages: RwLock<VecDeque<Box<dyn PackagerStage>>>,
    state: Mutex<PackagerState>,
    settings: RwLock<Settings>,
    manifest: Mutex<ManifestMutator>,
}

impl Packager {
    /// Create a packager with the default stages for this host
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self::with_stages(work_dir, default_stages())
    }

    /// Create a packager that runs `stages` in order
    pub fn with_stages(work_dir: impl Into<PathBuf>, stages: Vec<Box<dyn PackagerStage>>) -> Self {
        Self {
            work_dir: work_dir.into(),
            stages: RwLock::new(stages.into()),
            state: Mutex::new(PackagerState::default()),
            settings: RwLock::new(Settings::default()),
            manifest: Mutex::new(ManifestMutator::new()),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// `<output dir>/<output name><extension>`
    pub fn output_file(&self) -> PathBuf {
        let (dir, name) = {
            let settings = self.settings.read();
            (settings.output_dir.clone(), settings.output_name())
        };
        let dir = dir.unwrap_or_else(current_dir);
        dir.join(format!("{}{}", name, EXTENSION))
    }

    pub fn extension(&self) -> &'static str {
        EXTENSION
    }

    pub fn arch(&self) -> PackagerArch {
        self.settings.read().arch
    }

    pub fn set_arch(&self, arch: PackagerArch) {
        self.settings.write().arch = arch;
    }

    pub fn is_release(&self) -> bool {
        self.settings.read().release
    }

    pub fn set_release(&self, release: bool) {
        self.settings.write().release = release;
    }

    /// The configured app name, or [`DEFAULT_APP_NAME`]
    pub fn app_name(&self) -> String {
        self.settings.read().app_name().to_string()
    }

    pub fn set_app_name(&self, name: Option<String>) {
        self.settings.write().app_name = name;
    }

    pub fn min_java_version(&self) -> u32 {
        self.settings.read().min_java_version
    }

    pub fn set_min_java_version(&self, version: u32) -> std::result::Result<(), ConfigError> {
        let version = check_java_version(version)?;
        self.settings.write().min_java_version = version;
        Ok(())
    }

    /// Raise the minimum Java version to `required` if it is lower.
    ///
    /// The comparison against the preferred version and the write happen
    /// under one lock. Returns the new minimum when it changed.
    pub fn raise_min_java_version(&self, required: u32) -> Result<Option<u32>> {
        let mut settings = self.settings.write();
        let raised = bytecode::raise_minimum(
            required,
            settings.min_java_version,
            settings.preferred_java_version,
        )?;
        if let Some(version) = raised {
            settings.min_java_version =
                check_java_version(version).map_err(|e| Error::failed(e.to_string()))?;
        }
        Ok(raised)
    }

    pub fn preferred_java_version(&self) -> u32 {
        self.settings.read().preferred_java_version
    }

    pub fn set_preferred_java_version(&self, version: u32) -> std::result::Result<(), ConfigError> {
        let version = check_java_version(version)?;
        self.settings.write().preferred_java_version = version;
        Ok(())
    }

    pub fn launch_flags(&self) -> String {
        self.settings.read().launch_flags.clone()
    }

    pub fn set_launch_flags(&self, flags: impl Into<String>) {
        self.settings.write().launch_flags = flags.into();
    }

    pub fn install_prompt(&self) -> String {
        self.settings.read().install_prompt.clone()
    }

    /// Set the install prompt shown when no suitable Java is found.
    ///
    /// `None` stores an empty prompt. The template is validated before the
    /// configuration is touched.
    pub fn set_install_prompt(&self, prompt: Option<&str>) -> std::result::Result<(), ConfigError> {
        let prompt = prompt.unwrap_or_default();
        validate_install_prompt(prompt)?;
        self.settings.write().install_prompt = prompt.to_string();
        Ok(())
    }

    /// The source archive, defaulting to `<workdir>/archive/sample.jar`
    pub fn source(&self) -> PathBuf {
        self.settings
            .read()
            .source
            .clone()
            .unwrap_or_else(|| self.work_dir.join("archive").join("sample.jar"))
    }

    pub fn set_source(&self, source: Option<PathBuf>) {
        self.settings.write().source = source;
    }

    /// The output directory, defaulting to the current directory
    pub fn output_dir(&self) -> PathBuf {
        self.settings
            .read()
            .output_dir
            .clone()
            .unwrap_or_else(current_dir)
    }

    pub fn set_output_dir(&self, dir: Option<PathBuf>) {
        self.settings.write().output_dir = dir;
    }

    /// The output name, derived from the app name when unset
    pub fn output_name(&self) -> String {
        self.settings.read().output_name()
    }

    pub fn set_output_name(&self, name: Option<String>) {
        self.settings.write().output_name = name;
    }

    pub fn is_auto_install(&self) -> bool {
        self.settings.read().auto_install
    }

    pub fn set_auto_install(&self, auto_install: bool) {
        self.settings.write().auto_install = auto_install;
    }

    pub fn is_attribution_enabled(&self) -> bool {
        self.settings.read().attribution
    }

    pub fn set_attribution_enabled(&self, enabled: bool) {
        self.settings.write().attribution = enabled;
    }

    /// Use `assets` as the template tree root instead of the bundled assets
    pub fn set_assets(&self, assets: Option<Arc<dyn AssetSource>>) {
        self.settings.write().assets = assets;
    }

    /// The template tree root
    pub fn assets(&self) -> io::Result<Arc<dyn AssetSource>> {
        if let Some(assets) = self.settings.read().assets.clone() {
            return Ok(assets);
        }
        asset::resources().map(Arc::from)
    }

    /// Pending manifest edits, applied by the `manifest` stage
    pub fn manifest(&self) -> MutexGuard<'_, ManifestMutator> {
        self.manifest.lock()
    }

    /// A consistent snapshot of the values written into `main.c`
    pub fn template_values(&self) -> TemplateValues {
        let settings = self.settings.read();
        TemplateValues {
            app_name: settings.app_name().to_string(),
            min_java_version: settings.min_java_version,
            preferred_java_version: settings.preferred_java_version,
            install_prompt: settings.install_prompt.clone(),
            launch_flags: settings.launch_flags.clone(),
            attribution: settings.attribution,
        }
    }

    /// Run every remaining stage, stopping at the first failure
    pub fn execute(&self) -> Result<()> {
        while self.execute_stage()? {}
        Ok(())
    }

    /// Run the head stage and dequeue it.
    ///
    /// Returns `false` when no stages remain. A failed stage stays at the
    /// head of the queue.
    pub fn execute_stage(&self) -> Result<bool> {
        let mut state = self.state.lock();
        let queue = self.stages.upgradable_read();
        let Some(stage) = queue.front() else {
            return Ok(false);
        };

        debug!("executing stage: {}", stage.id());
        stage.execute(self, &mut state)?;

        let mut queue = RwLockUpgradableReadGuard::upgrade(queue);
        queue.pop_front();
        Ok(true)
    }

    /// Identifier of the next stage, or `None` when all stages have run
    pub fn next_stage(&self) -> Option<&'static str> {
        self.stages.read().front().map(|stage| stage.id())
    }

    /// Number of stages still queued
    pub fn remaining_stages(&self) -> usize {
        self.stages.read().len()
    }

    /// Delete the working directory, children before parents.
    ///
    /// A missing directory is not an error. The first failure aborts the walk.
    pub fn close(&self) -> Result<()> {
        if fs::symlink_metadata(&self.work_dir).is_err() {
            return Ok(());
        }

        for entry in WalkDir::new(&self.work_dir).contents_first(true) {
            let entry = entry
                .map_err(|e| Error::io("Failed to delete working directory", io::Error::from(e)))?;
            let path = entry.path();
            let removed = if entry.file_type().is_dir() {
                fs::remove_dir(path)
            } else {
                fs::remove_file(path)
            };
            removed.map_err(|e| {
                Error::io(
                    format!("Failed to delete working directory ({})", path.display()),
                    e,
                )
            })?;
        }
        debug!("Deleted {}", self.work_dir.display());
        Ok(())
    }
}

impl std::fmt::Debug for Packager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Packager")
            .field("work_dir", &self.work_dir)
            .field("next_stage", &self.next_stage())
            .finish_non_exhaustive()
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
