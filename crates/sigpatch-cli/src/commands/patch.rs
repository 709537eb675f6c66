//! Patch command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use sigpatch::{Architecture, PatchOptions, SignatureSet};

use super::select_patcher;
use crate::render;

pub fn run(
    path: &Path,
    signatures: &SignatureSet,
    arch: Option<Architecture>,
    backup: bool,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let patcher = select_patcher(signatures, path, arch)?;
    let report = patcher
        .patch_file(path, PatchOptions { backup, dry_run })
        .with_context(|| format!("Failed to patch {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render::patch_report(path, &report);
    }
    Ok(())
}
