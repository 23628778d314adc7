//! Streaming CSV output for generated credentials

use crate::error::{CliError, CliResult};
use csv::Writer;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Writes `id,username,password` rows, flushing after each one so a crash
/// mid-batch loses nothing already provisioned
pub struct CredentialsWriter {
    path: PathBuf,
    writer: Writer<File>,
    rows: usize,
}

impl CredentialsWriter {
    pub fn create(path: &Path) -> CliResult<Self> {
        let mut writer = Writer::from_path(path).map_err(|e| CliError::file(path, e))?;
        writer
            .write_record(["id", "username", "password"])
            .and_then(|_| writer.flush().map_err(csv::Error::from))
            .map_err(|e| CliError::file(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows: 0,
        })
    }

    pub fn write(&mut self, id: &str, username: &str, password: &str) -> CliResult<()> {
        self.writer
            .write_record([id, username, password])
            .and_then(|_| self.writer.flush().map_err(csv::Error::from))
            .map_err(|e| CliError::file(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
