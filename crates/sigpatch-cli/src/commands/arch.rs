//! Arch command implementation.

use std::path::Path;

use anyhow::{Context, Result};

pub fn run(path: &Path, json: bool) -> Result<()> {
    let arch = sigpatch::detect_architecture(path)
        .with_context(|| format!("Failed to detect architecture of {}", path.display()))?;

    if json {
        println!("{}", serde_json::json!({ "path": path, "architecture": arch }));
    } else {
        println!("{}: {}", path.display(), arch);
    }
    Ok(())
}
