//! The `<dir>/<job_id>.exit` file that workflow engines poll.
//!
//! One ASCII exit status per line, newline-terminated. Each wrapper run adds
//! a line, so a job retried by the scheduler keeps the history of every
//! attempt. Existence of the file means "finished"; the last line is the
//! final status.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use crate::error::{Result, WrapError};
use crate::job::JobId;

const NEW_FILE_MODE: u32 = 0o644;

pub struct StatusFile {
    dir: PathBuf,
    job_id: JobId,
    atomic: bool,
}

impl StatusFile {
    pub fn new(dir: impl Into<PathBuf>, job_id: JobId) -> Self {
        Self {
            dir: dir.into(),
            job_id,
            atomic: true,
        }
    }

    /// Switches between temp-file-and-rename writes and plain `O_APPEND` writes.
    pub fn atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.exit", self.job_id))
    }

    /// Records one exit status, creating the directory tree if needed.
    pub fn append(&self, exit_status: i32) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let line = format!("{exit_status}\n");
        if self.atomic {
            self.append_atomic(&line)
        } else {
            self.append_in_place(&line)
        }
    }

    fn append_in_place(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path())?;
        file.write_all(line.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    // Readers see either the old file or the old file plus the new line,
    // never a torn write. The rename keeps both on the same filesystem.
    fn append_atomic(&self, line: &str) -> Result<()> {
        let path = self.path();
        let mut contents = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        // The rename replaces the inode, so carry the old mode over. New files
        // get the usual 0644 instead of the temp file's 0600.
        let permissions = match fs::metadata(&path) {
            Ok(meta) => meta.permissions(),
            Err(e) if e.kind() == ErrorKind::NotFound => fs::Permissions::from_mode(NEW_FILE_MODE),
            Err(e) => return Err(e.into()),
        };
        if !contents.is_empty() && !contents.ends_with('\n') {
            contents.push('\n');
        }
        contents.push_str(line);

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().set_permissions(permissions)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| WrapError::Io(e.error))?;
        Ok(())
    }

    /// Every recorded status, oldest first. A missing file is an empty history.
    pub fn history(&self) -> Result<Vec<i32>> {
        let path = self.path();
        let contents = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| {
                l.parse::<i32>().map_err(|_| WrapError::CorruptStatusFile {
                    path: path.clone(),
                    line: l.to_string(),
                })
            })
            .collect()
    }

    pub fn last(&self) -> Result<Option<i32>> {
        Ok(self.history()?.last().copied())
    }
}
