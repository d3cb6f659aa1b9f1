//! Relational schema and symbol encoding for cross-referencing compiler
//! interface artifacts.
//!
//! Identifiers extracted from per-module analysis artifacts are stored as
//! single text columns ([`index::ident`]), grouped into fixed row shapes
//! ([`index::schema`]) and presented externally as `N:NAME:MODULE:UNIT`
//! keys ([`index::symbol`]). Decoding that needs the process name cache
//! goes through [`names::NameCacheScope`].

pub mod config;
pub mod error;
pub mod index;
pub mod logging;
pub mod names;

pub use error::{DecodeError, EncodeError, HieDbErr, SchemaError, UnitCandidates};
pub use index::{
    Fingerprint, HieTarget, Module, ModuleInfo, ModuleName, NameSpace, OccName, Symbol, UnitId,
};
pub use names::{HasNameCache, Name, NameCache, NameCacheScope, NameCacheUpdater, SharedNameCache};
