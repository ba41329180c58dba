// src/packager/stages/mod.rs

//! Pipeline stages
//!
//! Each stage does one job and runs at most once per packager. The default
//! order is `init`, `inject`, `manifest`, `vars`, then `mingw` on Windows
//! hosts, `cmake`, `make` and `export`.

mod cmake;
mod export;
mod init;
mod inject;
mod make;
mod manifest;
mod mingw;
mod vars;

pub use cmake::CmakeStage;
pub use export::ExportStage;
pub use init::InitStage;
pub use inject::InjectStage;
pub use make::MakeStage;
pub use manifest::ManifestStage;
pub use mingw::MingwStage;
pub use vars::VarsStage;

use super::{Packager, PackagerState};
use crate::error::Result;
use std::path::PathBuf;

/// One unit of pipeline work
pub trait PackagerStage: Send + Sync {
    /// Stable identifier used for progress reporting
    fn id(&self) -> &'static str;

    /// Run the stage against the packager's configuration and shared state
    fn execute(&self, packager: &Packager, state: &mut PackagerState) -> Result<()>;
}

/// The stage list for the current host
pub fn default_stages() -> Vec<Box<dyn PackagerStage>> {
    let mut stages: Vec<Box<dyn PackagerStage>> = vec![
        Box::new(InitStage),
        Box::new(InjectStage),
        Box::new(ManifestStage),
        Box::new(VarsStage),
    ];
    if cfg!(windows) {
        stages.push(Box::new(MingwStage));
    }
    stages.push(Box::new(CmakeStage));
    stages.push(Box::new(MakeStage));
    stages.push(Box::new(ExportStage));
    stages
}

/// `<workdir>/archive/archive.jar`, the packager's private copy of the source
pub fn working_archive(packager: &Packager) -> PathBuf {
    packager.work_dir().join("archive").join("archive.jar")
}
