//! Signatures command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use sigpatch::{SignatureSet, save_signatures};

pub fn run(signatures: &SignatureSet, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            save_signatures(path, signatures)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Signatures saved to: {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(signatures)?),
    }
    Ok(())
}
