//! Restore command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use sigpatch::{Architecture, SignatureSet};

use super::select_patcher;
use crate::render;

pub fn run(
    path: &Path,
    signatures: &SignatureSet,
    arch: Option<Architecture>,
    from_backup: bool,
    json: bool,
) -> Result<()> {
    if from_backup {
        let backup = sigpatch::restore_from_backup(path)
            .with_context(|| format!("Failed to restore {}", path.display()))?;
        if json {
            println!("{}", serde_json::json!({ "restored": path, "backup": backup }));
        } else {
            println!("Restored {} from {}", path.display(), backup.display());
        }
        return Ok(());
    }

    let patcher = select_patcher(signatures, path, arch)?;
    let report = patcher
        .restore_file(path)
        .with_context(|| format!("Failed to restore {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render::patch_report(path, &report);
    }
    Ok(())
}
