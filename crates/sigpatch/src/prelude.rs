//! Prelude module for convenient imports
//!
//! ```ignore
//! use sigpatch::prelude::*;
//! ```
//!
//! This brings the following into scope:
//!
//! - Signatures: `Signature`, `SignatureSet`, `Architecture`, `Pattern`
//! - Engine: `Patcher`, `PatchOptions`, `PatchReport`, `ScanReport`
//! - Error handling: `Error`, `Result`

// Error handling
pub use crate::error::{Error, Result};

// Signature data
pub use crate::pattern::{Occurrence, Pattern};
pub use crate::signature::{Architecture, Signature, SignatureSet, builtin_signatures};

// Engine
pub use crate::patcher::{PatchOptions, PatchReport, Patcher, RestoreReport, ScanReport};
