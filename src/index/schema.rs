// Row shapes persisted for each indexed artifact

use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::ident::{Fingerprint, ModuleName, OccName, UnitId};
use crate::error::{EncodeError, SchemaError};

/// Store schema version, kept in `PRAGMA user_version`
pub const SCHEMA_VERSION: i32 = 1;

/// Decode a record from consecutive columns of a result row.
pub trait FromRow: Sized {
    /// Number of columns consumed
    const WIDTH: usize;

    fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self>;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Self::from_row_at(row, 0)
    }
}

/// Encode a record as positional column values, for `params_from_iter`.
pub trait ToRow {
    const COLUMNS: &'static [&'static str];

    /// Fails on values the store cannot hold without loss, such as non-UTF-8 paths.
    fn to_row(&self) -> rusqlite::Result<Vec<Value>>;
}

fn path_value(path: &Path) -> rusqlite::Result<Value> {
    match path.to_str() {
        Some(text) => Ok(Value::Text(text.to_string())),
        None => Err(rusqlite::Error::ToSqlConversionFailure(Box::new(
            EncodeError::NonUtf8Path {
                path: path.to_path_buf(),
            },
        ))),
    }
}

fn get_path(row: &Row<'_>, idx: usize) -> rusqlite::Result<PathBuf> {
    row.get::<_, String>(idx).map(PathBuf::from)
}

fn get_opt_path(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<PathBuf>> {
    Ok(row.get::<_, Option<String>>(idx)?.map(PathBuf::from))
}

/// One indexed version of a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub name: ModuleName,
    pub unit: UnitId,
    pub is_boot: bool,
    pub src_file: Option<PathBuf>,
    pub is_real: bool,
    pub hash: Fingerprint,
}

impl FromRow for ModuleInfo {
    const WIDTH: usize = 6;

    fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(offset)?,
            unit: row.get(offset + 1)?,
            is_boot: row.get(offset + 2)?,
            src_file: get_opt_path(row, offset + 3)?,
            is_real: row.get(offset + 4)?,
            hash: row.get(offset + 5)?,
        })
    }
}

impl ToRow for ModuleInfo {
    const COLUMNS: &'static [&'static str] =
        &["mod", "unit", "is_boot", "hs_src", "is_real", "hash"];

    fn to_row(&self) -> rusqlite::Result<Vec<Value>> {
        Ok(vec![
            Value::Text(self.name.as_str().to_string()),
            Value::Text(self.unit.as_str().to_string()),
            Value::from(self.is_boot),
            self.src_file.as_deref().map_or(Ok(Value::Null), path_value)?,
            Value::from(self.is_real),
            Value::Text(self.hash.encode()),
        ])
    }
}

/// An indexed artifact and the module it describes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRow {
    pub hie_file: PathBuf,
    pub info: ModuleInfo,
}

impl FromRow for ModuleRow {
    const WIDTH: usize = 1 + ModuleInfo::WIDTH;

    fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            hie_file: get_path(row, offset)?,
            info: ModuleInfo::from_row_at(row, offset + 1)?,
        })
    }
}

impl ToRow for ModuleRow {
    const COLUMNS: &'static [&'static str] =
        &["hieFile", "mod", "unit", "is_boot", "hs_src", "is_real", "hash"];

    fn to_row(&self) -> rusqlite::Result<Vec<Value>> {
        let mut values = vec![path_value(&self.hie_file)?];
        values.extend(self.info.to_row()?);
        Ok(values)
    }
}

/// A use site of a name defined in `module`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefRow {
    pub src: PathBuf,
    pub name: OccName,
    pub module: ModuleName,
    pub unit: UnitId,
    pub start_line: i32,
    pub start_col: i32,
    pub end_line: i32,
    pub end_col: i32,
}

impl FromRow for RefRow {
    const WIDTH: usize = 8;

    fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            src: get_path(row, offset)?,
            name: row.get(offset + 1)?,
            module: row.get(offset + 2)?,
            unit: row.get(offset + 3)?,
            start_line: row.get(offset + 4)?,
            start_col: row.get(offset + 5)?,
            end_line: row.get(offset + 6)?,
            end_col: row.get(offset + 7)?,
        })
    }
}

impl ToRow for RefRow {
    const COLUMNS: &'static [&'static str] =
        &["hieFile", "occ", "mod", "unit", "sl", "sc", "el", "ec"];

    fn to_row(&self) -> rusqlite::Result<Vec<Value>> {
        Ok(vec![
            path_value(&self.src)?,
            Value::Text(self.name.encode()),
            Value::Text(self.module.as_str().to_string()),
            Value::Text(self.unit.as_str().to_string()),
            Value::from(self.start_line),
            Value::from(self.start_col),
            Value::from(self.end_line),
            Value::from(self.end_col),
        ])
    }
}

/// A declaration site; `is_root` marks top-level declarations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclRow {
    pub src: PathBuf,
    pub name: OccName,
    pub start_line: i32,
    pub start_col: i32,
    pub end_line: i32,
    pub end_col: i32,
    pub is_root: bool,
}

impl FromRow for DeclRow {
    const WIDTH: usize = 7;

    fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            src: get_path(row, offset)?,
            name: row.get(offset + 1)?,
            start_line: row.get(offset + 2)?,
            start_col: row.get(offset + 3)?,
            end_line: row.get(offset + 4)?,
            end_col: row.get(offset + 5)?,
            is_root: row.get(offset + 6)?,
        })
    }
}

impl ToRow for DeclRow {
    const COLUMNS: &'static [&'static str] =
        &["hieFile", "occ", "sl", "sc", "el", "ec", "is_root"];

    fn to_row(&self) -> rusqlite::Result<Vec<Value>> {
        Ok(vec![
            path_value(&self.src)?,
            Value::Text(self.name.encode()),
            Value::from(self.start_line),
            Value::from(self.start_col),
            Value::from(self.end_line),
            Value::from(self.end_col),
            Value::from(self.is_root),
        ])
    }
}

/// The binding site of a name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefRow {
    pub src: PathBuf,
    pub name: OccName,
    pub start_line: i32,
    pub start_col: i32,
    pub end_line: i32,
    pub end_col: i32,
}

impl FromRow for DefRow {
    const WIDTH: usize = 6;

    fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            src: get_path(row, offset)?,
            name: row.get(offset + 1)?,
            start_line: row.get(offset + 2)?,
            start_col: row.get(offset + 3)?,
            end_line: row.get(offset + 4)?,
            end_col: row.get(offset + 5)?,
        })
    }
}

impl ToRow for DefRow {
    const COLUMNS: &'static [&'static str] = &["hieFile", "occ", "sl", "sc", "el", "ec"];

    fn to_row(&self) -> rusqlite::Result<Vec<Value>> {
        Ok(vec![
            path_value(&self.src)?,
            Value::Text(self.name.encode()),
            Value::from(self.start_line),
            Value::from(self.start_col),
            Value::from(self.end_line),
            Value::from(self.end_col),
        ])
    }
}

/// A type symbol that type references point at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeName {
    pub name: OccName,
    pub module: ModuleName,
    pub unit: UnitId,
}

impl FromRow for TypeName {
    const WIDTH: usize = 3;

    fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(offset)?,
            module: row.get(offset + 1)?,
            unit: row.get(offset + 2)?,
        })
    }
}

impl ToRow for TypeName {
    const COLUMNS: &'static [&'static str] = &["name", "mod", "unit"];

    fn to_row(&self) -> rusqlite::Result<Vec<Value>> {
        Ok(vec![
            Value::Text(self.name.encode()),
            Value::Text(self.module.as_str().to_string()),
            Value::Text(self.unit.as_str().to_string()),
        ])
    }
}

/// One occurrence of a type, linked to its [`TypeName`] by rowid.
///
/// `depth` is the nesting level inside an applied type, 0 for the outermost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    pub type_id: i64,
    pub hie_file: PathBuf,
    pub depth: i32,
    pub start_line: i32,
    pub start_col: i32,
    pub end_line: i32,
    pub end_col: i32,
}

impl FromRow for TypeRef {
    const WIDTH: usize = 7;

    fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            type_id: row.get(offset)?,
            hie_file: get_path(row, offset + 1)?,
            depth: row.get(offset + 2)?,
            start_line: row.get(offset + 3)?,
            start_col: row.get(offset + 4)?,
            end_line: row.get(offset + 5)?,
            end_col: row.get(offset + 6)?,
        })
    }
}

impl ToRow for TypeRef {
    const COLUMNS: &'static [&'static str] =
        &["id", "hieFile", "depth", "sl", "sc", "el", "ec"];

    fn to_row(&self) -> rusqlite::Result<Vec<Value>> {
        Ok(vec![
            Value::Integer(self.type_id),
            path_value(&self.hie_file)?,
            Value::from(self.depth),
            Value::from(self.start_line),
            Value::from(self.start_col),
            Value::from(self.end_line),
            Value::from(self.end_col),
        ])
    }
}

/// A name exported from an indexed module, with its parent if it has one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    pub hie_file: PathBuf,
    pub name: OccName,
    pub module: ModuleName,
    pub unit: UnitId,
    pub parent: Option<OccName>,
    pub parent_module: Option<ModuleName>,
    pub parent_unit: Option<UnitId>,
    pub is_datacon: bool,
}

impl FromRow for ExportRow {
    const WIDTH: usize = 8;

    fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            hie_file: get_path(row, offset)?,
            name: row.get(offset + 1)?,
            module: row.get(offset + 2)?,
            unit: row.get(offset + 3)?,
            parent: row.get(offset + 4)?,
            parent_module: row.get(offset + 5)?,
            parent_unit: row.get(offset + 6)?,
            is_datacon: row.get(offset + 7)?,
        })
    }
}

impl ToRow for ExportRow {
    const COLUMNS: &'static [&'static str] = &[
        "hieFile",
        "occ",
        "mod",
        "unit",
        "parent",
        "parentMod",
        "parentUnit",
        "is_datacon",
    ];

    fn to_row(&self) -> rusqlite::Result<Vec<Value>> {
        Ok(vec![
            path_value(&self.hie_file)?,
            Value::Text(self.name.encode()),
            Value::Text(self.module.as_str().to_string()),
            Value::Text(self.unit.as_str().to_string()),
            self.parent.as_ref().map_or(Value::Null, |p| Value::Text(p.encode())),
            self.parent_module
                .as_ref()
                .map_or(Value::Null, |m| Value::Text(m.as_str().to_string())),
            self.parent_unit
                .as_ref()
                .map_or(Value::Null, |u| Value::Text(u.as_str().to_string())),
            Value::from(self.is_datacon),
        ])
    }
}

/// A query result whose entity columns are followed by its module's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithModuleInfo<T> {
    pub entity: T,
    pub info: ModuleInfo,
}

impl<T: FromRow> FromRow for WithModuleInfo<T> {
    const WIDTH: usize = T::WIDTH + ModuleInfo::WIDTH;

    fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        let entity = T::from_row_at(row, offset)?;
        let info = ModuleInfo::from_row_at(row, offset + T::WIDTH)?;
        Ok(Self { entity, info })
    }
}

/// Stamp a fresh store with [`SCHEMA_VERSION`].
pub fn set_schema_version(conn: &Connection) -> Result<(), SchemaError> {
    info!("Setting store schema version to v{}", SCHEMA_VERSION);
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

/// Fail unless the store was written with this [`SCHEMA_VERSION`].
pub fn check_schema_version(conn: &Connection) -> Result<(), SchemaError> {
    let got: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    debug!("Store schema version: {}", got);

    if got != SCHEMA_VERSION {
        warn!("Store schema v{} does not match v{}", got, SCHEMA_VERSION);
        return Err(SchemaError::IncompatibleSchemaVersion {
            expected: SCHEMA_VERSION,
            got,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params_from_iter;

    fn module_info() -> ModuleInfo {
        ModuleInfo {
            name: ModuleName::new("Data.List"),
            unit: UnitId::new("base"),
            is_boot: false,
            src_file: Some(PathBuf::from("libraries/base/Data/List.hs")),
            is_real: true,
            hash: Fingerprint::from_words(0xabc, 0xdef),
        }
    }

    fn ref_row() -> RefRow {
        RefRow {
            src: PathBuf::from(".hiefiles/Main.hie"),
            name: OccName::value("foldr"),
            module: ModuleName::new("Data.List"),
            unit: UnitId::new("base"),
            start_line: 3,
            start_col: 9,
            end_line: 3,
            end_col: 14,
        }
    }

    /// Select `values` back as a single row and decode it as `T`.
    fn select_as<T: FromRow>(values: Vec<Value>) -> rusqlite::Result<T> {
        let conn = Connection::open_in_memory().unwrap();
        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!("SELECT {}", placeholders.join(", "));
        conn.query_row(&sql, params_from_iter(values), |row| T::from_row(row))
    }

    #[test]
    fn test_widths_match_columns() {
        assert_eq!(ModuleInfo::WIDTH, ModuleInfo::COLUMNS.len());
        assert_eq!(ModuleRow::WIDTH, ModuleRow::COLUMNS.len());
        assert_eq!(RefRow::WIDTH, RefRow::COLUMNS.len());
        assert_eq!(DeclRow::WIDTH, DeclRow::COLUMNS.len());
        assert_eq!(DefRow::WIDTH, DefRow::COLUMNS.len());
        assert_eq!(TypeName::WIDTH, TypeName::COLUMNS.len());
        assert_eq!(TypeRef::WIDTH, TypeRef::COLUMNS.len());
        assert_eq!(ExportRow::WIDTH, ExportRow::COLUMNS.len());
        assert_eq!(WithModuleInfo::<DefRow>::WIDTH, DefRow::WIDTH + 6);
    }

    #[test]
    fn test_module_row_through_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE mods (
                hieFile TEXT NOT NULL PRIMARY KEY,
                mod TEXT NOT NULL,
                unit TEXT NOT NULL,
                is_boot BOOL NOT NULL,
                hs_src TEXT,
                is_real BOOL NOT NULL,
                hash TEXT NOT NULL
            )",
            [],
        )
        .unwrap();

        let row = ModuleRow {
            hie_file: PathBuf::from("/tmp/hie/Data/List.hie"),
            info: module_info(),
        };
        let synthetic = ModuleRow {
            hie_file: PathBuf::from("/tmp/hie/Paths_pkg.hie"),
            info: ModuleInfo {
                src_file: None,
                is_real: false,
                ..module_info()
            },
        };

        for r in [&row, &synthetic] {
            conn.execute(
                "INSERT INTO mods VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params_from_iter(r.to_row().unwrap()),
            )
            .unwrap();
        }

        let sql = format!(
            "SELECT {} FROM mods ORDER BY hieFile",
            ModuleRow::COLUMNS.join(", ")
        );
        let mut stmt = conn.prepare(&sql).unwrap();
        let rows = stmt
            .query_map([], |r| ModuleRow::from_row(r))
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap();

        assert_eq!(rows, vec![row, synthetic]);
    }

    #[test]
    fn test_occname_column_is_tagged() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE refs (hieFile TEXT, occ TEXT, mod TEXT, unit TEXT,
                                sl INTEGER, sc INTEGER, el INTEGER, ec INTEGER)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO refs VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params_from_iter(ref_row().to_row().unwrap()),
        )
        .unwrap();

        let stored: String = conn
            .query_row("SELECT occ FROM refs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(stored, "vfoldr");

        let back = conn
            .query_row("SELECT * FROM refs", [], |r| RefRow::from_row(r))
            .unwrap();
        assert_eq!(back, ref_row());
    }

    #[test]
    fn test_decl_and_def_rows() {
        let decl = DeclRow {
            src: PathBuf::from("Main.hie"),
            name: OccName::type_or_class("Tree"),
            start_line: 1,
            start_col: 1,
            end_line: 4,
            end_col: 20,
            is_root: true,
        };
        assert_eq!(select_as::<DeclRow>(decl.to_row().unwrap()).unwrap(), decl);

        let def = DefRow {
            src: PathBuf::from("Main.hie"),
            name: OccName::constructor("Leaf"),
            start_line: 2,
            start_col: 5,
            end_line: 2,
            end_col: 9,
        };
        assert_eq!(select_as::<DefRow>(def.to_row().unwrap()).unwrap(), def);
    }

    #[test]
    fn test_type_rows() {
        let name = TypeName {
            name: OccName::type_or_class("Maybe"),
            module: ModuleName::new("GHC.Maybe"),
            unit: UnitId::new("base"),
        };
        assert_eq!(select_as::<TypeName>(name.to_row().unwrap()).unwrap(), name);

        let type_ref = TypeRef {
            type_id: 17,
            hie_file: PathBuf::from("Main.hie"),
            depth: 1,
            start_line: 8,
            start_col: 12,
            end_line: 8,
            end_col: 17,
        };
        assert_eq!(select_as::<TypeRef>(type_ref.to_row().unwrap()).unwrap(), type_ref);
    }

    #[test]
    fn test_export_row_with_and_without_parent() {
        let plain = ExportRow {
            hie_file: PathBuf::from("Main.hie"),
            name: OccName::value("main"),
            module: ModuleName::new("Main"),
            unit: UnitId::new("main"),
            parent: None,
            parent_module: None,
            parent_unit: None,
            is_datacon: false,
        };
        assert_eq!(select_as::<ExportRow>(plain.to_row().unwrap()).unwrap(), plain);

        let child = ExportRow {
            name: OccName::constructor("Just"),
            parent: Some(OccName::type_or_class("Maybe")),
            parent_module: Some(ModuleName::new("GHC.Maybe")),
            parent_unit: Some(UnitId::new("base")),
            is_datacon: true,
            ..plain
        };
        assert_eq!(select_as::<ExportRow>(child.to_row().unwrap()).unwrap(), child);
    }

    #[test]
    fn test_with_module_info_decodes_both_halves() {
        let mut values = ref_row().to_row().unwrap();
        values.extend(module_info().to_row().unwrap());

        let res = select_as::<WithModuleInfo<RefRow>>(values).unwrap();
        assert_eq!(res.entity, ref_row());
        assert_eq!(res.info, module_info());
    }

    #[test]
    fn test_with_module_info_short_trailer_fails() {
        let mut values = ref_row().to_row().unwrap();
        values.extend(module_info().to_row().unwrap().into_iter().take(3));

        let err = select_as::<WithModuleInfo<RefRow>>(values).unwrap_err();
        assert!(
            matches!(err, rusqlite::Error::InvalidColumnIndex(_)),
            "unexpected error: {:?}",
            err
        );
    }

    #[test]
    fn test_with_module_info_missing_trailer_fails() {
        let err = select_as::<WithModuleInfo<DefRow>>(
            DefRow {
                src: PathBuf::from("A.hie"),
                name: OccName::value("x"),
                start_line: 1,
                start_col: 1,
                end_line: 1,
                end_col: 2,
            }
            .to_row().unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, rusqlite::Error::InvalidColumnIndex(6)));
    }

    #[test]
    fn test_bad_occname_fails_whole_row() {
        let mut values = ref_row().to_row().unwrap();
        values[1] = Value::Text("!foldr".to_string());

        let err = select_as::<RefRow>(values).unwrap_err();
        match err {
            rusqlite::Error::FromSqlConversionFailure(idx, _, inner) => {
                assert_eq!(idx, 1);
                assert!(inner.to_string().contains("OccName encoding invalid"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_is_rejected_on_encode() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let def = DefRow {
            src: PathBuf::from(OsStr::from_bytes(b"Ma\xffin.hie")),
            name: OccName::value("main"),
            start_line: 1,
            start_col: 1,
            end_line: 1,
            end_col: 5,
        };
        match def.to_row() {
            Err(rusqlite::Error::ToSqlConversionFailure(inner)) => {
                assert!(inner.to_string().contains("not valid UTF-8"));
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let info = ModuleInfo {
            src_file: Some(PathBuf::from(OsStr::from_bytes(b"src/\xfe.hs"))),
            ..module_info()
        };
        assert!(info.to_row().is_err());
        let row = ModuleRow {
            hie_file: PathBuf::from("Main.hie"),
            info,
        };
        assert!(row.to_row().is_err());
    }

    #[test]
    fn test_bad_hash_fails_module_info() {
        let mut values = module_info().to_row().unwrap();
        values[5] = Value::Text("not-a-hash".to_string());
        assert!(select_as::<ModuleInfo>(values).is_err());
    }

    #[test]
    fn test_schema_version_check() {
        let conn = Connection::open_in_memory().unwrap();

        match check_schema_version(&conn) {
            Err(SchemaError::IncompatibleSchemaVersion { expected, got }) => {
                assert_eq!(expected, SCHEMA_VERSION);
                assert_eq!(got, 0);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        set_schema_version(&conn).unwrap();
        check_schema_version(&conn).unwrap();
    }
}
