// src/packager/stages/vars.rs

//! `vars`: write the packager configuration into `main.c`

use super::PackagerStage;
use crate::error::{Error, Result};
use crate::packager::{Packager, PackagerState};
use crate::template;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct VarsStage;

impl PackagerStage for VarsStage {
    fn id(&self) -> &'static str {
        "vars"
    }

    fn execute(&self, packager: &Packager, _state: &mut PackagerState) -> Result<()> {
        let main = packager.work_dir().join("main.c");
        let backup = packager.work_dir().join("main.c.bak");

        fs::rename(&main, &backup).map_err(|e| Error::io("Failed to move main.c", e))?;
        inject(packager, &backup, &main)
            .map_err(|e| Error::io("Failed to inject variables into main.c", e))?;
        fs::remove_file(&backup).map_err(|e| Error::io("Failed to clean main.c.bak", e))
    }
}

fn inject(packager: &Packager, src: &Path, dest: &Path) -> std::io::Result<()> {
    let values = packager.template_values();
    let mut reader = BufReader::new(File::open(src)?);
    let mut writer = BufWriter::new(File::create(dest)?);
    template::inject(&values, &mut reader, &mut writer)
}
