// Compiler identifiers and their single-column store encodings

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::trace;

use crate::error::DecodeError;

/// Syntactic category of an occurrence name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameSpace {
    Value,
    Constructor,
    TypeOrClass,
    TypeVariable,
}

impl NameSpace {
    pub const ALL: [NameSpace; 4] = [
        NameSpace::Value,
        NameSpace::Constructor,
        NameSpace::TypeOrClass,
        NameSpace::TypeVariable,
    ];

    /// The single tag character written in front of an encoded name.
    pub fn as_char(&self) -> char {
        match self {
            NameSpace::Value => 'v',
            NameSpace::Constructor => 'c',
            NameSpace::TypeOrClass => 't',
            NameSpace::TypeVariable => 'z',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'v' => Some(NameSpace::Value),
            'c' => Some(NameSpace::Constructor),
            't' => Some(NameSpace::TypeOrClass),
            'z' => Some(NameSpace::TypeVariable),
            _ => None,
        }
    }
}

/// A name together with the namespace it occurs in
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OccName {
    namespace: NameSpace,
    name: String,
}

impl OccName {
    pub fn new(namespace: NameSpace, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }

    pub fn value(name: impl Into<String>) -> Self {
        Self::new(NameSpace::Value, name)
    }

    pub fn constructor(name: impl Into<String>) -> Self {
        Self::new(NameSpace::Constructor, name)
    }

    pub fn type_or_class(name: impl Into<String>) -> Self {
        Self::new(NameSpace::TypeOrClass, name)
    }

    pub fn type_variable(name: impl Into<String>) -> Self {
        Self::new(NameSpace::TypeVariable, name)
    }

    pub fn namespace(&self) -> NameSpace {
        self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store encoding: namespace tag followed by the raw name, e.g. `vfoo`.
    pub fn encode(&self) -> String {
        let mut encoded = String::with_capacity(self.name.len() + 1);
        encoded.push(self.namespace.as_char());
        encoded.push_str(&self.name);
        encoded
    }

    /// Inverse of [`OccName::encode`]. The remainder after the tag may be empty.
    pub fn decode(encoded: &str) -> Result<Self, DecodeError> {
        let mut chars = encoded.chars();
        let namespace = chars
            .next()
            .and_then(NameSpace::from_char)
            .ok_or_else(|| DecodeError::InvalidOccName {
                encoded: encoded.to_string(),
            })?;

        Ok(Self::new(namespace, chars.as_str()))
    }
}

impl fmt::Display for OccName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for OccName {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

/// Name of a compilation module, e.g. `Data.List`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ModuleName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Identifier of the unit (package) that owns a module
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UnitId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A module fully identified by its name and owning unit
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Module {
    pub name: ModuleName,
    pub unit: UnitId,
}

impl Module {
    pub fn new(name: impl Into<ModuleName>, unit: impl Into<UnitId>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.unit, self.name)
    }
}

/// 128-bit content hash of a compiled artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Fingerprint(u128);

impl Fingerprint {
    /// Width of the canonical hexadecimal form.
    pub const HEX_WIDTH: usize = 32;

    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    pub const fn from_words(hi: u64, lo: u64) -> Self {
        Self(((hi as u128) << 64) | lo as u128)
    }

    pub fn value(&self) -> u128 {
        self.0
    }

    pub fn words(&self) -> (u64, u64) {
        ((self.0 >> 64) as u64, self.0 as u64)
    }

    /// Fingerprint of arbitrary content: the leading 16 bytes of its BLAKE3 digest.
    pub fn of_bytes(content: &[u8]) -> Self {
        let digest = blake3::hash(content);
        let mut head = [0u8; 16];
        head.copy_from_slice(&digest.as_bytes()[..16]);
        Self(u128::from_be_bytes(head))
    }

    pub fn of_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let content = std::fs::read(path.as_ref())?;
        Ok(Self::of_bytes(&content))
    }

    /// Canonical lowercase hexadecimal form, zero padded to [`Self::HEX_WIDTH`].
    pub fn encode(&self) -> String {
        format!("{:032x}", self.0)
    }

    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let invalid = |reason: &str| DecodeError::InvalidFingerprint {
            text: text.to_string(),
            reason: reason.to_string(),
        };

        if text.len() != Self::HEX_WIDTH {
            return Err(invalid("expected 32 hexadecimal digits"));
        }
        // from_str_radix tolerates a leading sign, the stored form never has one
        if !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid("non-hexadecimal character"));
        }

        u128::from_str_radix(text, 16)
            .map(Self)
            .map_err(|e| invalid(&e.to_string()))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.encode()
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = DecodeError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::decode(&text)
    }
}

impl FromStr for Fingerprint {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

/// Borrow the text of a column, rejecting every other storage class.
fn column_text<'a>(value: ValueRef<'a>, what: &'static str) -> FromSqlResult<&'a str> {
    match value {
        ValueRef::Text(bytes) => {
            std::str::from_utf8(bytes).map_err(|e| FromSqlError::Other(Box::new(e)))
        }
        other => {
            trace!("Rejecting {:?} column where {} was expected", other.data_type(), what);
            Err(FromSqlError::Other(Box::new(DecodeError::ExpectedText { what })))
        }
    }
}

impl ToSql for OccName {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.encode()))
    }
}

impl FromSql for OccName {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = column_text(value, "an OccName")?;
        OccName::decode(text).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for ModuleName {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for ModuleName {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        column_text(value, "a ModuleName").map(ModuleName::new)
    }
}

impl ToSql for UnitId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for UnitId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        column_text(value, "a UnitId").map(UnitId::new)
    }
}

impl ToSql for Fingerprint {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.encode()))
    }
}

impl FromSql for Fingerprint {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = column_text(value, "a Fingerprint")?;
        Fingerprint::decode(text).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
