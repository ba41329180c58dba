// src/packager/stages/manifest.rs

//! `manifest`: apply manifest edits and infer the minimum Java version
//!
//! The archive is only rewritten when the edits changed the manifest's
//! fingerprint. Version inference runs on the edited manifest, so an entry
//! class supplied through the packager's options is honoured.

use super::{PackagerStage, working_archive};
use crate::archive::{self, ManifestEdit};
use crate::bytecode;
use crate::error::{Error, Result};
use crate::packager::{Packager, PackagerState};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestStage;

impl PackagerStage for ManifestStage {
    fn id(&self) -> &'static str {
        "manifest"
    }

    fn execute(&self, packager: &Packager, _state: &mut PackagerState) -> Result<()> {
        let file = working_archive(packager);

        let mut edit = ManifestEdit::load(&file)?;
        edit.apply(&packager.manifest());

        let main_class = bytecode::resolve_entry_class(edit.manifest())
            .ok_or_else(|| {
                Error::failed(
                    "Main class is not in JAR manifest and was not specified in packager options",
                )
            })?
            .to_string();

        let major = {
            let mut jar = archive::open(&file)?;
            bytecode::read_class_major(&mut jar, &main_class)?
        };
        let required = bytecode::min_runtime_version(major)?;
        debug!(
            "Main class {} has major version {} (Java {})",
            main_class, major, required
        );

        if let Some(version) = packager.raise_min_java_version(required)? {
            info!("Raised minimum Java version to {}", version);
        }

        if edit.commit(&file)? {
            debug!("Updated manifest of {}", file.display());
        }
        Ok(())
    }
}
