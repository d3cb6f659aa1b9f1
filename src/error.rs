// Error types for decoding store columns and reporting lookups

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::index::ident::{ModuleName, OccName, UnitId};
use crate::index::schema::ModuleInfo;
use crate::index::symbol::Symbol;

/// Structural failure while turning stored text back into an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("OccName encoding invalid: {encoded:?}")]
    InvalidOccName { encoded: String },

    #[error("Expected a SQL string representing {what}")]
    ExpectedText { what: &'static str },

    #[error("Fingerprint encoding invalid: {text:?} ({reason})")]
    InvalidFingerprint { text: String, reason: String },

    #[error("Symbol key invalid: {key:?} ({reason})")]
    InvalidSymbol { key: String, reason: &'static str },
}

/// A value that cannot be written to its store column without loss.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("Path is not valid UTF-8: {}", .path.display())]
    NonUtf8Path { path: PathBuf },
}

/// Candidate modules for an ambiguous unit lookup. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitCandidates(Vec<ModuleInfo>);

impl UnitCandidates {
    pub fn new(candidates: Vec<ModuleInfo>) -> Option<Self> {
        if candidates.is_empty() {
            None
        } else {
            Some(Self(candidates))
        }
    }

    pub fn first(&self) -> &ModuleInfo {
        &self.0[0]
    }

    pub fn as_slice(&self) -> &[ModuleInfo] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<ModuleInfo> {
        self.0
    }
}

impl fmt::Display for UnitCandidates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, info) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", info.unit)?;
        }
        Ok(())
    }
}

fn unit_suffix(unit: &Option<UnitId>) -> String {
    unit.as_ref().map(|u| format!(" ({})", u)).unwrap_or_default()
}

fn module_suffix(module: &Option<ModuleName>, unit: &Option<UnitId>) -> String {
    match module {
        Some(m) => format!(" from module {}{}", m, unit_suffix(unit)),
        None => String::new(),
    }
}

fn candidate_module(candidates: &UnitCandidates) -> &ModuleName {
    &candidates.first().name
}

/// Domain-level lookup failures reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HieDbErr {
    #[error("Module {0}{} not indexed", unit_suffix(.1))]
    NotIndexed(ModuleName, Option<UnitId>),

    #[error("Unit could not be inferred for module {}; pick one of: {0}", candidate_module(.0))]
    AmbiguousUnitId(UnitCandidates),

    #[error("Couldn't find name: {0}{}", module_suffix(.1, .2))]
    NameNotFound(OccName, Option<ModuleName>, Option<UnitId>),

    #[error("Got no helpful span for: {0}: {1}")]
    NameUnhelpfulSpan(Symbol, String),
}

impl HieDbErr {
    /// `None` when there is nothing to choose between.
    pub fn ambiguous_unit_id(candidates: Vec<ModuleInfo>) -> Option<Self> {
        UnitCandidates::new(candidates).map(HieDbErr::AmbiguousUnitId)
    }
}

/// Failures while checking the store itself.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Incompatible schema version: expected {expected}, got {got}")]
    IncompatibleSchemaVersion { expected: i32, got: i32 },

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}
