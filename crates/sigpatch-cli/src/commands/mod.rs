//! CLI command implementations.

pub mod arch;
pub mod patch;
pub mod restore;
pub mod scan;
pub mod signatures;

use std::path::Path;

use anyhow::{Context, Result};
use sigpatch::{Architecture, Patcher, SignatureSet};
use tracing::info;

/// Pick the signatures for `path`, detecting its architecture unless overridden.
pub(crate) fn select_patcher<'a>(
    set: &'a SignatureSet,
    path: &Path,
    arch: Option<Architecture>,
) -> Result<Patcher<'a>> {
    let arch = match arch {
        Some(arch) => {
            info!("Using architecture override: {}", arch);
            arch
        }
        None => {
            let arch = sigpatch::detect_architecture(path)
                .with_context(|| format!("Failed to detect architecture of {}", path.display()))?;
            info!("Detected binary architecture: {}", arch);
            arch
        }
    };

    Ok(Patcher::for_architecture(set, arch)?)
}
