//! # sigpatch
//!
//! Masked byte-pattern scanner and in-place binary patcher.
//!
//! This crate provides:
//! - Pattern compilation with byte, nibble and bit wildcards
//! - Multi-occurrence scanning
//! - Wildcard-aware replacement composition
//! - Patch / restore of a target image using architecture-keyed signatures
//! - First-patch-wins backups
//!
//! ## Example
//!
//! ```
//! use sigpatch::{Patcher, Signature};
//!
//! let signatures = vec![Signature::compile("flag", "B0 01", "B0 00").unwrap()];
//! let patcher = Patcher::new(&signatures);
//!
//! let mut image = vec![0x90, 0xB0, 0x01, 0xC3];
//! let report = patcher.patch_buffer(&mut image);
//! assert_eq!(report.total(), 1);
//! assert_eq!(image, [0x90, 0xB0, 0x00, 0xC3]);
//!
//! patcher.restore_buffer(&mut image);
//! assert_eq!(image, [0x90, 0xB0, 0x01, 0xC3]);
//! ```

pub mod arch;
pub mod backup;
pub mod error;
pub mod pattern;
pub mod patcher;
pub mod prelude;
pub mod signature;

pub use arch::{detect_architecture, detect_architecture_from_bytes};
pub use backup::{BackupOutcome, backup_path, ensure_backup, restore_from_backup};
pub use error::{Error, Result};
pub use pattern::{Matches, Occurrence, Pattern, compile, compose, find_all, format};
pub use patcher::{
    Direction, PatchOptions, PatchReport, Patcher, RestoreReport, ScanReport, SignatureReport,
    SignatureStatus, SiteState, SkipReason, SkippedOccurrence, patch, restore,
};
pub use signature::{
    Architecture, DEFAULT_TARGET, Signature, SignatureSet, builtin_signatures, load_signatures,
    save_signatures,
};
