//! Scan command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use sigpatch::{Architecture, SignatureSet};

use super::select_patcher;
use crate::render;

pub fn run(
    path: &Path,
    signatures: &SignatureSet,
    arch: Option<Architecture>,
    json: bool,
) -> Result<()> {
    let patcher = select_patcher(signatures, path, arch)?;
    let report = patcher
        .scan_file(path)
        .with_context(|| format!("Failed to scan {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render::scan_report(path, &report);
    }
    Ok(())
}
