//! Patch and restore engine
//!
//! Both directions share one pass over the signatures:
//!
//! - **patch** searches each signature's `find` pattern and composes `replace`
//! - **restore** searches `replace` and composes `find`
//!
//! The target is loaded whole, mutated in memory, and written back only when
//! at least one occurrence was rewritten. Every rewritten range is claimed for
//! the rest of the pass; an occurrence overlapping a claimed range is skipped.

use std::fs;
use std::path::Path;

use serde::Serialize;
use strum::Display;
use tracing::{debug, info, warn};

use crate::arch::detect_architecture;
use crate::backup::{BackupOutcome, ensure_backup};
use crate::error::{Error, Result};
use crate::pattern::{Occurrence, Pattern, compose, find_all};
use crate::signature::{Architecture, Signature, SignatureSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Patch,
    Restore,
}

impl Direction {
    /// (pattern to search, pattern to write)
    fn patterns(self, signature: &Signature) -> (&Pattern, &Pattern) {
        match self {
            Direction::Patch => (signature.find(), signature.replace()),
            Direction::Restore => (signature.replace(), signature.find()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// Overlaps a range already rewritten in this pass
    Overlap,
    /// Composed bytes disagree with the occurrence length
    LengthMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkippedOccurrence {
    pub occurrence: Occurrence,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureReport {
    pub name: String,
    pub occurrences: Vec<Occurrence>,
    pub skipped: Vec<SkippedOccurrence>,
}

impl SignatureReport {
    pub fn count(&self) -> usize {
        self.occurrences.len()
    }
}

/// Outcome of a patch or restore pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    pub direction: Direction,
    pub signatures: Vec<SignatureReport>,
    pub written: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupOutcome>,
}

pub type RestoreReport = PatchReport;

impl PatchReport {
    pub fn total(&self) -> usize {
        self.signatures.iter().map(SignatureReport::count).sum()
    }

    /// Nothing matched anywhere.
    pub fn is_noop(&self) -> bool {
        self.total() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SiteState {
    Unpatched,
    Patched,
    Partial,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureStatus {
    pub name: String,
    pub unpatched: Vec<Occurrence>,
    pub patched: Vec<Occurrence>,
}

impl SignatureStatus {
    pub fn state(&self) -> SiteState {
        match (self.unpatched.is_empty(), self.patched.is_empty()) {
            (true, true) => SiteState::Missing,
            (false, true) => SiteState::Unpatched,
            (true, false) => SiteState::Patched,
            (false, false) => SiteState::Partial,
        }
    }
}

/// Read-only status of every signature in an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub signatures: Vec<SignatureStatus>,
}

impl ScanReport {
    pub fn is_fully_patched(&self) -> bool {
        !self.signatures.is_empty()
            && self
                .signatures
                .iter()
                .all(|s| s.state() == SiteState::Patched)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchOptions {
    /// Ensure `<target>.bak` exists before touching the target
    pub backup: bool,
    /// Compute the report without writing anything
    pub dry_run: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            backup: true,
            dry_run: false,
        }
    }
}

pub struct Patcher<'a> {
    signatures: &'a [Signature],
}

impl<'a> Patcher<'a> {
    pub fn new(signatures: &'a [Signature]) -> Self {
        Self { signatures }
    }

    pub fn for_architecture(set: &'a SignatureSet, arch: Architecture) -> Result<Self> {
        Ok(Self::new(set.resolve(arch)?))
    }

    /// Detect the architecture of `path` and pick its signatures.
    pub fn for_image<P: AsRef<Path>>(set: &'a SignatureSet, path: P) -> Result<Self> {
        let arch = detect_architecture(path)?;
        info!("Detected binary architecture: {}", arch);
        Self::for_architecture(set, arch)
    }

    pub fn signatures(&self) -> &[Signature] {
        self.signatures
    }

    pub fn patch_buffer(&self, buffer: &mut [u8]) -> PatchReport {
        self.apply(Direction::Patch, buffer)
    }

    pub fn restore_buffer(&self, buffer: &mut [u8]) -> RestoreReport {
        self.apply(Direction::Restore, buffer)
    }

    pub fn scan(&self, buffer: &[u8]) -> ScanReport {
        let signatures = self
            .signatures
            .iter()
            .map(|signature| SignatureStatus {
                name: signature.label(),
                unpatched: find_all(buffer, signature.find()),
                patched: find_all(buffer, signature.replace()),
            })
            .collect();
        ScanReport { signatures }
    }

    pub fn patch_file<P: AsRef<Path>>(&self, path: P, options: PatchOptions) -> Result<PatchReport> {
        let path = path.as_ref();

        let backup = if options.backup && !options.dry_run {
            Some(ensure_backup(path)?)
        } else {
            None
        };

        let mut buffer = fs::read(path)?;
        let mut report = self.patch_buffer(&mut buffer);
        report.backup = backup;

        if report.is_noop() {
            warn!(
                "Could not find any of the signatures to patch in {}",
                path.display()
            );
            return Ok(report);
        }

        if options.dry_run {
            info!("Dry run: {} occurrence(s) would be patched", report.total());
            return Ok(report);
        }

        fs::write(path, &buffer)?;
        report.written = true;
        info!("Patched {} occurrence(s) in {}", report.total(), path.display());
        Ok(report)
    }

    pub fn restore_file<P: AsRef<Path>>(&self, path: P) -> Result<RestoreReport> {
        let path = path.as_ref();
        let mut buffer = fs::read(path)?;
        let mut report = self.restore_buffer(&mut buffer);

        if report.is_noop() {
            info!("Nothing to restore in {}", path.display());
            return Ok(report);
        }

        fs::write(path, &buffer)?;
        report.written = true;
        info!("Restored {} occurrence(s) in {}", report.total(), path.display());
        Ok(report)
    }

    pub fn scan_file<P: AsRef<Path>>(&self, path: P) -> Result<ScanReport> {
        let buffer = fs::read(path)?;
        Ok(self.scan(&buffer))
    }

    fn apply(&self, direction: Direction, buffer: &mut [u8]) -> PatchReport {
        let mut claimed: Vec<Occurrence> = Vec::new();
        let mut signatures = Vec::with_capacity(self.signatures.len());

        for signature in self.signatures {
            let (search, write) = direction.patterns(signature);
            let mut report = SignatureReport {
                name: signature.label(),
                occurrences: Vec::new(),
                skipped: Vec::new(),
            };

            for occurrence in find_all(buffer, search) {
                debug!("[{}] Found pattern at offset 0x{:X}", report.name, occurrence.start);

                if claimed.iter().any(|c| c.overlaps(&occurrence)) {
                    warn!(
                        "[{}] Skipping 0x{:X}..0x{:X}: overlaps a range already rewritten",
                        report.name, occurrence.start, occurrence.end
                    );
                    report.skipped.push(SkippedOccurrence {
                        occurrence,
                        reason: SkipReason::Overlap,
                    });
                    continue;
                }

                let slice = &mut buffer[occurrence.range()];
                match compose(write, slice) {
                    Ok(bytes) if bytes.len() == slice.len() => slice.copy_from_slice(&bytes),
                    result => {
                        let actual = match result {
                            Ok(bytes) => bytes.len(),
                            Err(Error::LengthMismatch { actual, .. }) => actual,
                            Err(_) => slice.len(),
                        };
                        warn!(
                            "[{}] Skipping 0x{:X}: composed {} bytes for a {} byte occurrence",
                            report.name,
                            occurrence.start,
                            actual,
                            slice.len()
                        );
                        report.skipped.push(SkippedOccurrence {
                            occurrence,
                            reason: SkipReason::LengthMismatch,
                        });
                        continue;
                    }
                }

                claimed.push(occurrence);
                report.occurrences.push(occurrence);
            }

            if report.occurrences.is_empty() {
                // restore treats absent sites as the normal case
                debug!("[{}] No occurrences to {}", report.name, direction);
            } else {
                debug!(
                    "[{}] {} {} occurrence(s)",
                    report.name,
                    direction,
                    report.occurrences.len()
                );
            }
            signatures.push(report);
        }

        PatchReport {
            direction,
            signatures,
            written: false,
            backup: None,
        }
    }
}

/// Detect the architecture of `path`, then patch it with the matching signatures.
pub fn patch<P: AsRef<Path>>(path: P, set: &SignatureSet, make_backup: bool) -> Result<PatchReport> {
    let path = path.as_ref();
    Patcher::for_image(set, path)?.patch_file(
        path,
        PatchOptions {
            backup: make_backup,
            dry_run: false,
        },
    )
}

/// Detect the architecture of `path`, then undo the matching signatures.
pub fn restore<P: AsRef<Path>>(path: P, set: &SignatureSet) -> Result<RestoreReport> {
    let path = path.as_ref();
    Patcher::for_image(set, path)?.restore_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::tests::fake_pe;
    use crate::backup::backup_path;
    use crate::signature::builtin_signatures;

    fn signature(find: &str, replace: &str) -> Signature {
        Signature::compile("", find, replace).unwrap()
    }

    fn x64_image(payload: &[u8]) -> Vec<u8> {
        let mut image = fake_pe(0x8664);
        image.extend_from_slice(payload);
        image
    }

    #[test]
    fn test_patch_and_restore_scenario() {
        let signatures = vec![signature("B0 01", "B0 00")];
        let patcher = Patcher::new(&signatures);
        let original = vec![0x90, 0xB0, 0x01, 0xC3];

        let mut buffer = original.clone();
        let report = patcher.patch_buffer(&mut buffer);
        assert_eq!(buffer, vec![0x90, 0xB0, 0x00, 0xC3]);
        assert_eq!(report.total(), 1);
        assert_eq!(report.signatures[0].occurrences, vec![Occurrence { start: 1, end: 3 }]);

        let report = patcher.restore_buffer(&mut buffer);
        assert_eq!(report.direction, Direction::Restore);
        assert_eq!(report.total(), 1);
        assert_eq!(buffer, original);
    }

    #[test]
    fn test_patch_preserves_wildcard_bytes_round_trip() {
        let signatures = vec![signature("48 ?? B0 01 ?F", "48 ?? B0 00 ?F")];
        let patcher = Patcher::new(&signatures);
        let original = vec![0x48, 0x11, 0xB0, 0x01, 0x3F, 0x00, 0x48, 0x22, 0xB0, 0x01, 0xAF];

        let mut buffer = original.clone();
        let report = patcher.patch_buffer(&mut buffer);
        assert_eq!(report.total(), 2);
        assert_eq!(
            buffer,
            vec![0x48, 0x11, 0xB0, 0x00, 0x3F, 0x00, 0x48, 0x22, 0xB0, 0x00, 0xAF]
        );

        patcher.restore_buffer(&mut buffer);
        assert_eq!(buffer, original);
    }

    #[test]
    fn test_partial_application_is_reported_per_signature() {
        let signatures = vec![signature("B0 01", "B0 00"), signature("EB FE", "90 90")];
        let patcher = Patcher::new(&signatures);
        let mut buffer = vec![0xB0, 0x01, 0xB0, 0x01];

        let report = patcher.patch_buffer(&mut buffer);
        assert_eq!(report.signatures[0].count(), 2);
        assert_eq!(report.signatures[1].count(), 0);
        assert_eq!(report.total(), 2);
        assert!(!report.is_noop());
    }

    #[test]
    fn test_overlapping_occurrences_are_skipped() {
        let signatures = vec![signature("AA AA", "BB BB"), signature("BB AA CC", "00 00 00")];
        let patcher = Patcher::new(&signatures);
        let mut buffer = vec![0xAA, 0xAA, 0xAA, 0xCC];

        let report = patcher.patch_buffer(&mut buffer);
        assert_eq!(report.signatures[0].occurrences, vec![Occurrence { start: 0, end: 2 }]);
        assert_eq!(
            report.signatures[0].skipped,
            vec![SkippedOccurrence {
                occurrence: Occurrence { start: 1, end: 3 },
                reason: SkipReason::Overlap,
            }]
        );
        // "BB AA CC" now matches at 1 but overlaps the first rewrite
        assert_eq!(report.signatures[1].count(), 0);
        assert_eq!(report.signatures[1].skipped.len(), 1);
        assert_eq!(buffer, vec![0xBB, 0xBB, 0xAA, 0xCC]);
    }

    #[test]
    fn test_scan_states() {
        let signatures = vec![
            signature("B0 01", "B0 00"),
            signature("74 05", "EB 05"),
            signature("0F 84", "90 E9"),
        ];
        let patcher = Patcher::new(&signatures);
        let buffer = [0xB0, 0x00, 0x74, 0x05, 0xEB, 0x05];

        let report = patcher.scan(&buffer);
        let states: Vec<SiteState> = report.signatures.iter().map(SignatureStatus::state).collect();
        assert_eq!(
            states,
            vec![SiteState::Patched, SiteState::Partial, SiteState::Missing]
        );
        assert!(!report.is_fully_patched());

        let patched_only = Patcher::new(&signatures[..1]).scan(&buffer);
        assert!(patched_only.is_fully_patched());
    }

    #[test]
    fn test_patch_file_writes_and_backs_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.exe");
        fs::write(&path, [0x00, 0xB0, 0x01, 0x00]).unwrap();

        let signatures = vec![signature("B0 01", "B0 00")];
        let report = Patcher::new(&signatures)
            .patch_file(&path, PatchOptions::default())
            .unwrap();

        assert!(report.written);
        assert!(matches!(report.backup, Some(BackupOutcome::Created(_))));
        assert_eq!(fs::read(&path).unwrap(), vec![0x00, 0xB0, 0x00, 0x00]);
        assert_eq!(fs::read(backup_path(&path)).unwrap(), vec![0x00, 0xB0, 0x01, 0x00]);
    }

    #[test]
    fn test_patch_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.exe");
        fs::write(&path, [0xB0, 0x01, 0x33, 0xB0, 0x01]).unwrap();

        let signatures = vec![signature("B0 01", "B0 00")];
        let patcher = Patcher::new(&signatures);
        let options = PatchOptions {
            backup: false,
            dry_run: false,
        };

        let first = patcher.patch_file(&path, options).unwrap();
        assert_eq!(first.total(), 2);
        let once = fs::read(&path).unwrap();

        let second = patcher.patch_file(&path, options).unwrap();
        assert!(second.is_noop());
        assert!(!second.written);
        assert_eq!(fs::read(&path).unwrap(), once);
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_patch_file_dry_run_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.exe");
        fs::write(&path, [0xB0, 0x01]).unwrap();

        let signatures = vec![signature("B0 01", "B0 00")];
        let report = Patcher::new(&signatures)
            .patch_file(
                &path,
                PatchOptions {
                    backup: true,
                    dry_run: true,
                },
            )
            .unwrap();

        assert_eq!(report.total(), 1);
        assert!(!report.written);
        assert!(report.backup.is_none());
        assert_eq!(fs::read(&path).unwrap(), vec![0xB0, 0x01]);
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_restore_file_without_patched_sites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.exe");
        fs::write(&path, [0xB0, 0x01]).unwrap();

        let signatures = vec![signature("B0 01", "B0 00")];
        let report = Patcher::new(&signatures).restore_file(&path).unwrap();
        assert!(report.is_noop());
        assert!(!report.written);
        assert_eq!(fs::read(&path).unwrap(), vec![0xB0, 0x01]);
    }

    #[test]
    fn test_patch_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let signatures = vec![signature("B0 01", "B0 00")];
        let err = Patcher::new(&signatures)
            .patch_file(dir.path().join("missing.exe"), PatchOptions::default())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_patch_and_restore_detected_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Minecraft.Windows.exe");
        let payload = [
            0xCC, 0x84, 0xC0, 0x74, 0x23, 0x48, 0x83, 0xC3, 0x10, 0x48, 0x3B, 0xDF, 0x75, 0xE3,
            0xB0, 0x01, 0x48, 0xCC,
        ];
        let original = x64_image(&payload);
        fs::write(&path, &original).unwrap();
        let set = builtin_signatures().unwrap();

        let report = patch(&path, &set, true).unwrap();
        assert_eq!(report.total(), 1);
        assert_eq!(report.signatures[0].count(), 0);
        assert_eq!(report.signatures[1].count(), 1);
        let patched = fs::read(&path).unwrap();
        assert_ne!(patched, original);
        assert_eq!(patched[patched.len() - 3], 0x00);

        let report = restore(&path, &set).unwrap();
        assert_eq!(report.total(), 1);
        assert_eq!(fs::read(&path).unwrap(), original);
        assert_eq!(fs::read(backup_path(&path)).unwrap(), original);
    }

    #[test]
    fn test_patch_unregistered_architecture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game32.exe");
        fs::write(&path, fake_pe(0x014C)).unwrap();
        let set = builtin_signatures().unwrap();

        let err = patch(&path, &set, true).unwrap_err();
        assert!(matches!(err, Error::NoSignatures(Architecture::X86)));
        assert!(!backup_path(&path).exists());
    }
}
