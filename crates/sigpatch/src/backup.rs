//! `<target>.bak` handling
//!
//! The first backup of a target wins: an existing backup is never replaced,
//! so repeated runs cannot back up an already patched image.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

const BACKUP_EXTENSION: &str = ".bak";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "path", rename_all = "lowercase")]
pub enum BackupOutcome {
    Created(PathBuf),
    Existing(PathBuf),
}

impl BackupOutcome {
    pub fn path(&self) -> &Path {
        match self {
            BackupOutcome::Created(path) | BackupOutcome::Existing(path) => path,
        }
    }
}

/// `game.exe` -> `game.exe.bak`
pub fn backup_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut name = OsString::from(path.as_ref().as_os_str());
    name.push(BACKUP_EXTENSION);
    PathBuf::from(name)
}

/// Copy `path` to its backup location unless a backup already exists.
pub fn ensure_backup<P: AsRef<Path>>(path: P) -> Result<BackupOutcome> {
    let path = path.as_ref();
    let backup = backup_path(path);

    let mut source = File::open(path)?;
    let mut destination = match OpenOptions::new().write(true).create_new(true).open(&backup) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            debug!("Backup already exists at {}", backup.display());
            return Ok(BackupOutcome::Existing(backup));
        }
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = io::copy(&mut source, &mut destination) {
        // a partial backup would be kept forever by the first-wins rule
        drop(destination);
        let _ = fs::remove_file(&backup);
        return Err(e.into());
    }
    destination.sync_all()?;

    info!("Created backup at {}", backup.display());
    Ok(BackupOutcome::Created(backup))
}

/// Overwrite `path` with the contents of its backup. The backup is kept.
pub fn restore_from_backup<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    let backup = backup_path(path);

    let data = match fs::read(&backup) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::BackupNotFound(backup));
        }
        Err(e) => return Err(e.into()),
    };

    fs::write(path, data)?;
    info!("Restored {} from {}", path.display(), backup.display());
    Ok(backup)
}
