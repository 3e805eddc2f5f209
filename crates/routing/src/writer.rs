//! Backup-then-overwrite file writer.
//!
//! If a target exists its bytes are first copied to
//! `{backup_dir}/{stem}_{YYYYMMDD_HHMMSS}.{ext}`; only after that succeeds is
//! the new content written through a temp file and renamed into place.
//! Several files can be written as one set: every backup and temp file is
//! in place before the first rename, so a failure while preparing leaves all
//! targets as they were. Writes to the same path are serialized.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use ul_domain::error::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct WriteReport {
    pub path: PathBuf,
    /// Where the previous content went, if there was any.
    pub backup: Option<PathBuf>,
}

pub struct ConfigWriter {
    backup_dir: PathBuf,
    locks: parking_lot::Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl ConfigWriter {
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub async fn write(&self, path: &Path, contents: Vec<u8>) -> Result<WriteReport> {
        let mut reports = self.write_set(vec![(path.to_path_buf(), contents)]).await?;
        reports
            .pop()
            .ok_or_else(|| Error::Other("config writer returned no report".into()))
    }

    /// Write several files together. Reports come back in input order.
    pub async fn write_set(&self, files: Vec<(PathBuf, Vec<u8>)>) -> Result<Vec<WriteReport>> {
        // Fixed lock order so two overlapping sets cannot deadlock.
        let mut paths: Vec<PathBuf> = files.iter().map(|(p, _)| p.clone()).collect();
        paths.sort();
        paths.dedup();
        if paths.len() != files.len() {
            return Err(Error::Config("the same path appears twice in one write".into()));
        }
        let locks: Vec<_> = paths.iter().map(|p| self.lock_for(p)).collect();
        let mut _guards = Vec::with_capacity(locks.len());
        for lock in &locks {
            _guards.push(lock.lock().await);
        }

        let backup_dir = self.backup_dir.clone();
        let reports = tokio::task::spawn_blocking(move || write_with_backups(&files, &backup_dir))
            .await
            .map_err(|e| Error::Other(format!("config writer panicked: {e}")))??;

        for report in &reports {
            match &report.backup {
                Some(b) => tracing::info!(
                    path = %report.path.display(),
                    backup = %b.display(),
                    "config written, previous version backed up"
                ),
                None => tracing::info!(path = %report.path.display(), "config written"),
            }
        }
        Ok(reports)
    }

    fn lock_for(&self, path: &Path) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

/// Files created while preparing a set. Removed unless the set commits.
#[derive(Default)]
struct Staged {
    backups: Vec<PathBuf>,
    temps: Vec<PathBuf>,
}

impl Staged {
    fn discard(self) {
        for path in self.temps.iter().chain(&self.backups) {
            let _ = std::fs::remove_file(path);
        }
    }
}

fn write_with_backups(files: &[(PathBuf, Vec<u8>)], backup_dir: &Path) -> Result<Vec<WriteReport>> {
    let mut staged = Staged::default();
    match prepare(files, backup_dir, &mut staged) {
        Ok(reports) => commit(files, reports, staged.temps),
        Err(e) => {
            tracing::error!(error = %e, "config write aborted, no file replaced");
            staged.discard();
            Err(e)
        }
    }
}

/// Back up every existing target and write every temp file.
fn prepare(
    files: &[(PathBuf, Vec<u8>)],
    backup_dir: &Path,
    staged: &mut Staged,
) -> Result<Vec<WriteReport>> {
    std::fs::create_dir_all(backup_dir)?;
    let mut reports = Vec::with_capacity(files.len());
    for (path, _) in files {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let backup = match std::fs::read(path) {
            Ok(previous) => {
                let b = backup_previous(path, backup_dir, &previous)?;
                staged.backups.push(b.clone());
                Some(b)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        reports.push(WriteReport {
            path: path.clone(),
            backup,
        });
    }
    for (path, contents) in files {
        let tmp = temp_path(path)?;
        std::fs::write(&tmp, contents)?;
        staged.temps.push(tmp);
    }
    Ok(reports)
}

fn commit(
    files: &[(PathBuf, Vec<u8>)],
    reports: Vec<WriteReport>,
    temps: Vec<PathBuf>,
) -> Result<Vec<WriteReport>> {
    for (i, ((path, _), tmp)) in files.iter().zip(&temps).enumerate() {
        if let Err(e) = std::fs::rename(tmp, path) {
            for left in &temps[i..] {
                let _ = std::fs::remove_file(left);
            }
            let replaced: Vec<String> =
                files[..i].iter().map(|(p, _)| p.display().to_string()).collect();
            tracing::error!(
                path = %path.display(),
                already_replaced = ?replaced,
                error = %e,
                "config rename failed"
            );
            return Err(Error::Config(format!(
                "could not replace {} ({e}); already replaced: [{}]",
                path.display(),
                replaced.join(", ")
            )));
        }
    }
    Ok(reports)
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::Config(format!("not a file path: {}", path.display())))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}

/// Copy `previous` into a fresh, never-overwritten backup file.
fn backup_previous(path: &Path, backup_dir: &Path, previous: &[u8]) -> Result<PathBuf> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config".into());
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");

    let mut n = 0u32;
    loop {
        let name = if n == 0 {
            format!("{stem}_{stamp}{ext}")
        } else {
            format!("{stem}_{stamp}_{n}{ext}")
        };
        let candidate = backup_dir.join(name);
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => {
                fill_or_discard(&candidate, file, previous)?;
                return Ok(candidate);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// A writer whose contents can be forced to stable storage.
trait Durable: Write {
    fn sync(&mut self) -> std::io::Result<()>;
}

impl Durable for std::fs::File {
    fn sync(&mut self) -> std::io::Result<()> {
        self.sync_all()
    }
}

/// Write `bytes` to a freshly created file, removing it if that fails so no
/// truncated backup is left behind.
fn fill_or_discard(path: &Path, mut out: impl Durable, bytes: &[u8]) -> Result<()> {
    let filled = out.write_all(bytes).and_then(|()| out.sync());
    drop(out);
    if let Err(e) = filled {
        if let Err(rm) = std::fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %rm, "could not remove partial backup");
        }
        return Err(e.into());
    }
    Ok(())
}
