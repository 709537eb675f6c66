use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::{Error, Result};
use crate::pattern::{Pattern, compile};

/// Machine type of a target image.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Architecture {
    X64,
    X86,
    Unknown,
}

/// A find/replace pair of equal-length patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSignature")]
pub struct Signature {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    find: Pattern,
    replace: Pattern,
}

#[derive(Deserialize)]
struct RawSignature {
    #[serde(default)]
    name: String,
    find: Pattern,
    replace: Pattern,
}

impl TryFrom<RawSignature> for Signature {
    type Error = Error;

    fn try_from(raw: RawSignature) -> Result<Self> {
        Signature::new(raw.name, raw.find, raw.replace)
    }
}

impl Signature {
    pub fn new(name: impl Into<String>, find: Pattern, replace: Pattern) -> Result<Self> {
        if find.is_empty() {
            return Err(Error::compile("", 0, "signature pattern is empty"));
        }
        if find.len() != replace.len() {
            return Err(Error::LengthMismatch {
                expected: find.len(),
                actual: replace.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            find,
            replace,
        })
    }

    /// Compile a signature from separate find and replace texts.
    pub fn compile(name: impl Into<String>, find: &str, replace: &str) -> Result<Self> {
        Self::new(name, compile(find)?, compile(replace)?)
    }

    /// Parse the single-line `"<find> | <replace>"` form.
    pub fn parse(line: &str) -> Result<Self> {
        let (find, replace) = line
            .split_once('|')
            .ok_or_else(|| Error::compile(line.trim(), 0, "expected '<find> | <replace>'"))?;
        Self::compile("", find, replace)
    }

    pub fn find(&self) -> &Pattern {
        &self.find
    }

    pub fn replace(&self) -> &Pattern {
        &self.replace
    }

    pub fn len(&self) -> usize {
        self.find.len()
    }

    pub fn is_empty(&self) -> bool {
        self.find.is_empty()
    }

    /// Name for reports, falling back to the find pattern.
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            self.find.to_string()
        } else {
            self.name.clone()
        }
    }
}

/// Signatures keyed by architecture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureSet {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target: String,
    pub architectures: BTreeMap<Architecture, Vec<Signature>>,
}

impl SignatureSet {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            architectures: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, arch: Architecture, signature: Signature) {
        self.architectures.entry(arch).or_default().push(signature);
    }

    /// Signatures registered for `arch`; fails when there are none.
    pub fn resolve(&self, arch: Architecture) -> Result<&[Signature]> {
        match self.architectures.get(&arch) {
            Some(signatures) if !signatures.is_empty() => Ok(signatures),
            _ => Err(Error::NoSignatures(arch)),
        }
    }
}

/// Default target file name the builtin signatures were written for.
pub const DEFAULT_TARGET: &str = "Minecraft.Windows.exe";

/// (architecture, name, find, replace)
const BUILTIN_SIGNATURES: &[(Architecture, &str, &str, &str)] = &[
    (
        Architecture::X64,
        "trial-check",
        "10 84 ?? ?? 15 B0 01 48 8B 4C ?? ?? 48 33 ?? ?? ?? ?? ?? ?? 48 83 C4 40 5B C3 48 8B ?? ?? ?? ?? 48 89",
        "10 84 ?? ?? 15 B0 00 48 8B 4C ?? ?? 48 33 ?? ?? ?? ?? ?? ?? 48 83 C4 40 5B C3 48 8B ?? ?? ?? ?? 48 89",
    ),
    (
        Architecture::X64,
        "trial-loop",
        "84 C0 74 23 48 83 C3 10 48 3B DF 75 E3 B0 01 48",
        "84 C0 74 23 48 83 C3 10 48 3B DF 75 E3 B0 00 48",
    ),
];

pub fn builtin_signatures() -> Result<SignatureSet> {
    let mut set = SignatureSet::new(DEFAULT_TARGET);
    for &(arch, name, find, replace) in BUILTIN_SIGNATURES {
        set.insert(arch, Signature::compile(name, find, replace)?);
    }
    Ok(set)
}

pub fn load_signatures<P: AsRef<Path>>(path: P) -> Result<SignatureSet> {
    let content = fs::read_to_string(&path)?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

pub fn save_signatures<P: AsRef<Path>>(path: P, signatures: &SignatureSet) -> Result<()> {
    let content = serde_json::to_string_pretty(signatures)?;
    fs::write(path, content)?;
    Ok(())
}
