// src/packager/stages/export.rs

//! `export`: copy the built launcher to the output file

use super::PackagerStage;
use crate::error::{Error, Result};
use crate::packager::{Packager, PackagerState};
use std::fs;
use tracing::info;

/// Executable name produced by the template's CMake project
pub const TARGET_NAME: &str = "bootstrap";

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportStage;

impl PackagerStage for ExportStage {
    fn id(&self) -> &'static str {
        "export"
    }

    fn execute(&self, packager: &Packager, state: &mut PackagerState) -> Result<()> {
        let build_dir = state
            .build_dir
            .as_ref()
            .ok_or_else(|| Error::failed("Build directory not configured (cmake has not run)"))?;
        let src = build_dir.join(format!("{}{}", TARGET_NAME, packager.extension()));
        let dest = packager.output_file();

        if !src.is_file() {
            return Err(Error::failed(format!(
                "Output file \"{}\" not found",
                src.display()
            )));
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::io(format!("Failed to create {}", parent.display()), e))?;
        }

        fs::copy(&src, &dest).map_err(|e| Error::io("Failed to export output file", e))?;
        info!("Wrote {}", dest.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_copies_build_output() {
        let temp = tempfile::tempdir().unwrap();
        let build = temp.path().join("work/cmake");
        fs::create_dir_all(&build).unwrap();

        let packager = Packager::with_stages(temp.path().join("work"), Vec::new());
        let src = build.join(format!("{}{}", TARGET_NAME, packager.extension()));
        fs::write(&src, b"\x7fELF").unwrap();
        packager.set_output_dir(Some(temp.path().join("out")));
        packager.set_app_name(Some("Demo App".to_string()));

        let mut state = PackagerState {
            build_dir: Some(build),
            ..Default::default()
        };
        ExportStage.execute(&packager, &mut state).unwrap();

        let expected = temp
            .path()
            .join("out")
            .join(format!("demo_app{}", packager.extension()));
        assert_eq!(packager.output_file(), expected);
        assert_eq!(fs::read(expected).unwrap(), b"\x7fELF");
    }

    #[test]
    fn test_export_missing_output() {
        let temp = tempfile::tempdir().unwrap();
        let packager = Packager::with_stages(temp.path().join("work"), Vec::new());
        let mut state = PackagerState {
            build_dir: Some(temp.path().join("nothing")),
            ..Default::default()
        };
        let err = ExportStage.execute(&packager, &mut state).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
