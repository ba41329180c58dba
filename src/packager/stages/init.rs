// src/packager/stages/init.rs

//! `init`: extract the launcher template tree into the working directory

use super::PackagerStage;
use crate::asset::AssetSource;
use crate::error::{Error, Result};
use crate::packager::{Packager, PackagerState};
use crate::stream;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct InitStage;

impl PackagerStage for InitStage {
    fn id(&self) -> &'static str {
        "init"
    }

    fn execute(&self, packager: &Packager, _state: &mut PackagerState) -> Result<()> {
        let assets = packager
            .assets()
            .map_err(|e| Error::io("Failed to locate bundled assets", e))?;
        let tool = assets.sub_str("tool");
        copy_tree(tool.as_ref(), packager.work_dir())
            .map_err(|e| Error::io("Failed to extract tool to working directory", e))
    }
}

/// Recursively copy everything under `source` into `dest`
fn copy_tree(source: &dyn AssetSource, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!(
                "Path \"{}\" is not a directory and could not be created: {}",
                dest.display(),
                e
            ),
        )
    })?;

    for entity in source.list()? {
        let target = dest.join(entity.name());
        if entity.is_directory() {
            copy_tree(source.sub_str(entity.name()).as_ref(), &target)?;
        } else {
            let mut input = source.read_str(entity.name())?;
            let mut output = File::create(&target)?;
            let copied = stream::pipe(&mut input, &mut output)?;
            debug!("Extracted {} ({} bytes)", target.display(), copied);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::DirectoryAssetSource;

    #[test]
    fn test_copy_tree_nested() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("tool/include/sub")).unwrap();
        fs::write(src.join("tool/main.c"), "int main(void);").unwrap();
        fs::write(src.join("tool/include/sub/a.h"), "#define A 1").unwrap();

        let dest = temp.path().join("work");
        let source = DirectoryAssetSource::new(&src).sub_str("tool");
        copy_tree(source.as_ref(), &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("main.c")).unwrap(), "int main(void);");
        assert_eq!(
            fs::read_to_string(dest.join("include/sub/a.h")).unwrap(),
            "#define A 1"
        );
    }
}
