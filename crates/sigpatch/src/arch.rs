//! Target architecture detection from the PE COFF header

use std::fs;
use std::path::Path;

use goblin::pe::header::{COFF_MACHINE_X86, COFF_MACHINE_X86_64, Header};
use tracing::debug;

use crate::error::{Error, Result};
use crate::signature::Architecture;

/// Read the machine type of the executable at `path`.
pub fn detect_architecture<P: AsRef<Path>>(path: P) -> Result<Architecture> {
    let bytes = fs::read(&path)?;
    let arch = detect_architecture_from_bytes(&bytes)?;
    debug!("Detected {} for {}", arch, path.as_ref().display());
    Ok(arch)
}

pub fn detect_architecture_from_bytes(bytes: &[u8]) -> Result<Architecture> {
    let header = Header::parse(bytes).map_err(|e| Error::InvalidImage(e.to_string()))?;

    Ok(match header.coff_header.machine {
        COFF_MACHINE_X86_64 => Architecture::X64,
        COFF_MACHINE_X86 => Architecture::X86,
        _ => Architecture::Unknown,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const PE_OFFSET: usize = 0x80;

    /// Minimal PE image: DOS header, PE signature, COFF header, no optional header.
    pub(crate) fn fake_pe(machine: u16) -> Vec<u8> {
        let mut bytes = vec![0u8; 0x200];
        bytes[0..2].copy_from_slice(b"MZ");
        bytes[0x3C..0x40].copy_from_slice(&(PE_OFFSET as u32).to_le_bytes());
        bytes[PE_OFFSET..PE_OFFSET + 4].copy_from_slice(b"PE\0\0");
        bytes[PE_OFFSET + 4..PE_OFFSET + 6].copy_from_slice(&machine.to_le_bytes());
        bytes
    }

    #[test]
    fn test_detect_machine_types() {
        assert_eq!(
            detect_architecture_from_bytes(&fake_pe(0x8664)).unwrap(),
            Architecture::X64
        );
        assert_eq!(
            detect_architecture_from_bytes(&fake_pe(0x014C)).unwrap(),
            Architecture::X86
        );
        assert_eq!(
            detect_architecture_from_bytes(&fake_pe(0xAA64)).unwrap(),
            Architecture::Unknown
        );
    }

    #[test]
    fn test_detect_rejects_non_pe() {
        let err = detect_architecture_from_bytes(b"\x7fELF not a pe image").unwrap_err();
        assert!(matches!(err, Error::InvalidImage(_)));
    }

    #[test]
    fn test_detect_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.exe");
        fs::write(&path, fake_pe(0x8664)).unwrap();
        assert_eq!(detect_architecture(&path).unwrap(), Architecture::X64);

        let missing = detect_architecture(dir.path().join("missing.exe")).unwrap_err();
        assert!(missing.is_not_found());
    }
}
