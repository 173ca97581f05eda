use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::SimError;
use crate::types::FrameSnapshot;

pub fn ensure_dir(dir: &Path) -> Result<(), SimError> {
    fs::create_dir_all(dir).map_err(|error| SimError::io(dir, error))
}

pub fn write_csv<T: Serialize>(dir: &Path, file_name: &str, rows: &[T]) -> Result<PathBuf, SimError> {
    let path = dir.join(file_name);
    let file = File::create(&path).map_err(|error| SimError::io(&path, error))?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|error| SimError::io(&path, error))?;
    Ok(path)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SimError> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).map_err(|error| SimError::io(path, error))
}

pub struct FrameWriter {
    path: PathBuf,
    out: BufWriter<File>,
    written: usize,
}

impl FrameWriter {
    pub fn create(path: &Path) -> Result<Self, SimError> {
        let file = File::create(path).map_err(|error| SimError::io(path, error))?;
        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn push(&mut self, snapshot: &FrameSnapshot) -> Result<(), SimError> {
        serde_json::to_writer(&mut self.out, snapshot)?;
        self.out
            .write_all(b"\n")
            .map_err(|error| SimError::io(&self.path, error))?;
        self.written += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<usize, SimError> {
        self.out
            .flush()
            .map_err(|error| SimError::io(&self.path, error))?;
        Ok(self.written)
    }
}
