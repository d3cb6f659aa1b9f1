// Index data model: identifiers, symbol keys and row shapes

pub mod ident;
pub mod schema;
pub mod symbol;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use ident::{Fingerprint, Module, ModuleName, NameSpace, OccName, UnitId};
pub use schema::{
    DeclRow, DefRow, ExportRow, FromRow, ModuleInfo, ModuleRow, RefRow, ToRow, TypeName,
    TypeRef, WithModuleInfo, SCHEMA_VERSION,
};
pub use symbol::Symbol;

/// Which indexed entity a query is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HieTarget {
    /// An artifact by path
    File(PathBuf),
    /// A module by name, optionally pinned to a unit
    Module(ModuleName, Option<UnitId>),
}

impl HieTarget {
    pub fn module(name: impl Into<ModuleName>) -> Self {
        HieTarget::Module(name.into(), None)
    }

    pub fn in_unit(name: impl Into<ModuleName>, unit: impl Into<UnitId>) -> Self {
        HieTarget::Module(name.into(), Some(unit.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_constructors() {
        assert_eq!(
            HieTarget::module("Main"),
            HieTarget::Module(ModuleName::new("Main"), None)
        );
        assert_eq!(
            HieTarget::in_unit("Data.List", "base"),
            HieTarget::Module(ModuleName::new("Data.List"), Some(UnitId::new("base")))
        );
        assert_ne!(
            HieTarget::File(PathBuf::from("Main.hie")),
            HieTarget::module("Main")
        );
    }
}
