// Canonical textual key for a fully qualified symbol

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::ident::{Module, ModuleName, NameSpace, OccName, UnitId};
use crate::error::DecodeError;

/// A name qualified by the module (and unit) that defines it.
///
/// The textual form is `N:NAME:MODULE:UNIT` with `N` one of `v`, `c`, `t`, `z`.
/// Fields are split on `:`, so names, modules or units containing a colon
/// cannot be written as a key and read back.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Symbol {
    pub name: OccName,
    pub module: Module,
}

impl Symbol {
    pub fn new(name: OccName, module: Module) -> Self {
        Self { name, module }
    }

    pub fn from_parts(
        namespace: NameSpace,
        name: impl Into<String>,
        module: impl Into<ModuleName>,
        unit: impl Into<UnitId>,
    ) -> Self {
        Self::new(OccName::new(namespace, name), Module::new(module, unit))
    }

    pub fn parse(key: &str) -> Result<Self, DecodeError> {
        let invalid = |reason: &'static str| {
            debug!("Rejecting symbol key {:?}: {}", key, reason);
            DecodeError::InvalidSymbol {
                key: key.to_string(),
                reason,
            }
        };

        let mut fields = key.split(':');
        let (Some(tag), Some(name), Some(module), Some(unit)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(invalid("expected four colon separated fields"));
        };
        if fields.next().is_some() {
            return Err(invalid("trailing input after the unit field"));
        }

        let mut tag_chars = tag.chars();
        let namespace = match (tag_chars.next(), tag_chars.next()) {
            (Some(c), None) => NameSpace::from_char(c).ok_or_else(|| invalid("unknown namespace"))?,
            _ => return Err(invalid("namespace must be a single character")),
        };

        if name.is_empty() {
            return Err(invalid("empty name"));
        }
        if module.is_empty() {
            return Err(invalid("empty module"));
        }
        if unit.is_empty() {
            return Err(invalid("empty unit"));
        }

        Ok(Self::from_parts(namespace, name, module, unit))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.name.namespace().as_char(),
            self.name.name(),
            self.module.name,
            self.module.unit
        )
    }
}

impl FromStr for Symbol {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.to_string()
    }
}

impl TryFrom<String> for Symbol {
    type Error = DecodeError;

    fn try_from(key: String) -> Result<Self, Self::Error> {
        Self::parse(&key)
    }
}
