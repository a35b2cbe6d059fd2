//! Persistence adapter: translates the in-memory store to and from the
//! normalized SQLite representation, and performs the crash-atomic save.
//!
//! Layout: `invariant_resource` holds one row per distinct invariant key,
//! `localized_resource` one row per (key, language), `resource_location` one
//! row per (file, entry) with a 1-based sort index so entry order round-trips
//! exactly, and `resx_file` the residual scaffolding per file.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};

use rusqlite::{Connection, OpenFlags, params};

use crate::{
    diagnostics::{Diagnostic, DiagnosticSink},
    error::Error,
    file::ResourceFile,
    store::ResourceStore,
    types::{InvariantKey, ResourceEntry},
};

const SCHEMA: &str = "
CREATE TABLE invariant_resource (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    file TEXT,
    type TEXT,
    value TEXT NOT NULL,
    comment TEXT
);
CREATE TABLE localized_resource (
    id INTEGER PRIMARY KEY,
    invariant_id INTEGER NOT NULL REFERENCES invariant_resource(id),
    language TEXT NOT NULL,
    value TEXT NOT NULL
);
CREATE TABLE resource_location (
    id INTEGER PRIMARY KEY,
    file_path TEXT NOT NULL,
    invariant_id INTEGER NOT NULL REFERENCES invariant_resource(id),
    name TEXT NOT NULL,
    sort_index INTEGER NOT NULL,
    mime_type TEXT,
    xml_space TEXT
);
CREATE TABLE resx_file (
    file_path TEXT PRIMARY KEY,
    xml_content TEXT NOT NULL
);
";

/// Writes a complete new database at `target`, replacing whatever was there.
/// Not crash-atomic on its own; [`save_atomic`] wraps it with the temp-file
/// and rename dance.
pub fn save(
    store: &ResourceStore,
    target: &Path,
    sink: &mut dyn DiagnosticSink,
) -> Result<(), Error> {
    if target.exists() {
        fs::remove_file(target)?;
    }
    let mut connection = Connection::open(target)?;
    let tx = connection.transaction()?;
    tx.execute_batch(SCHEMA)?;

    let ids = save_invariant_resources(&tx, store)?;
    save_localized_resources(&tx, store, &ids, sink)?;
    save_locations(&tx, store, &ids)?;
    save_residuals(&tx, store)?;

    tx.commit()?;
    Ok(())
}

/// Saves through a sibling temporary file and a single `fs::rename`, so the
/// target is either fully replaced or left untouched if the process dies
/// mid-write.
pub fn save_atomic(
    store: &ResourceStore,
    target: &Path,
    sink: &mut dyn DiagnosticSink,
) -> Result<(), Error> {
    let file_name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::invalid_resource("save target has no file name"))?;
    let temp_path = target.with_file_name(format!("{}.tmp", file_name));

    if let Err(error) = save(store, &temp_path, sink) {
        let _ = fs::remove_file(&temp_path);
        return Err(error);
    }
    fs::rename(&temp_path, target)?;
    Ok(())
}

/// Reconstructs a store from a database written by [`save`]. Entry order
/// within each file follows the persisted sort index.
pub fn read(path: &Path) -> Result<ResourceStore, Error> {
    let connection = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

    let invariants = read_invariant_resources(&connection)?;
    let localized = read_localized_resources(&connection)?;
    let residuals = read_residuals(&connection)?;

    let mut store = ResourceStore::new();
    let mut statement = connection.prepare(
        "SELECT file_path, invariant_id, name, mime_type, xml_space
         FROM resource_location ORDER BY file_path, sort_index",
    )?;
    let rows = statement.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
        ))
    })?;

    let mut current: Option<ResourceFile> = None;
    for row in rows {
        let (file_path, invariant_id, name, mime_type, xml_space) = row?;
        if current.as_ref().is_none_or(|f| f.relative_path != file_path) {
            if let Some(finished) = current.take() {
                store.insert(finished);
            }
            let mut file = ResourceFile::new(file_path.clone());
            if let Some(residual) = residuals.get(&file_path) {
                file.residual_xml = residual.clone();
            }
            current = Some(file);
        }
        let Some(file) = current.as_mut() else {
            continue;
        };

        let key = invariants.get(&invariant_id).ok_or_else(|| {
            Error::DataMismatch(format!("unknown invariant resource id {}", invariant_id))
        })?;
        let mut entry = ResourceEntry::new(name, key.clone());
        entry.mime_type = mime_type;
        entry.xml_space = xml_space;
        if let Some(values) = localized.get(&invariant_id) {
            for (language, value) in values {
                entry
                    .localized_values
                    .insert(language.clone(), value.clone());
            }
        }
        file.entries.push(entry);
    }
    if let Some(finished) = current.take() {
        store.insert(finished);
    }
    Ok(store)
}

fn save_invariant_resources(
    tx: &rusqlite::Transaction<'_>,
    store: &ResourceStore,
) -> Result<HashMap<InvariantKey, i64>, Error> {
    let mut ids = HashMap::new();
    let mut statement = tx.prepare(
        "INSERT INTO invariant_resource (name, file, type, value, comment)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for key in store.all_keys() {
        statement.execute(params![
            key.name,
            key.file,
            key.resource_type,
            key.value,
            key.comment,
        ])?;
        ids.insert(key, tx.last_insert_rowid());
    }
    Ok(ids)
}

// Flatten localized values across all entries sharing one invariant key.
// Distinct conflicting translations for one (key, language) pair are
// reported, then the first value in store iteration order is persisted.
fn save_localized_resources(
    tx: &rusqlite::Transaction<'_>,
    store: &ResourceStore,
    ids: &HashMap<InvariantKey, i64>,
    sink: &mut dyn DiagnosticSink,
) -> Result<(), Error> {
    let mut translations: HashMap<&InvariantKey, BTreeMap<&str, Vec<&str>>> = HashMap::new();
    for file in store.files() {
        for entry in &file.entries {
            let languages = translations.entry(&entry.invariant).or_default();
            for (language, value) in &entry.localized_values {
                let values = languages.entry(language).or_default();
                if !values.contains(&value.as_str()) {
                    values.push(value);
                }
            }
        }
    }

    let mut statement = tx.prepare(
        "INSERT INTO localized_resource (invariant_id, language, value)
         VALUES (?1, ?2, ?3)",
    )?;
    for key in store.all_keys() {
        let Some(languages) = translations.get(&key) else {
            continue;
        };
        let invariant_id = ids[&key];
        for (language, values) in languages {
            if values.len() > 1 {
                sink.report(Diagnostic::TranslationConflict {
                    key: key.clone(),
                    language: language.to_string(),
                    values: values.iter().map(|v| v.to_string()).collect(),
                });
            }
            statement.execute(params![invariant_id, language, values[0]])?;
        }
    }
    Ok(())
}

fn save_locations(
    tx: &rusqlite::Transaction<'_>,
    store: &ResourceStore,
    ids: &HashMap<InvariantKey, i64>,
) -> Result<(), Error> {
    let mut statement = tx.prepare(
        "INSERT INTO resource_location (file_path, invariant_id, name, sort_index, mime_type, xml_space)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for file in store.files() {
        for (index, entry) in file.entries.iter().enumerate() {
            statement.execute(params![
                file.relative_path,
                ids[&entry.invariant],
                entry.name,
                (index + 1) as i64,
                entry.mime_type,
                entry.xml_space,
            ])?;
        }
    }
    Ok(())
}

fn save_residuals(tx: &rusqlite::Transaction<'_>, store: &ResourceStore) -> Result<(), Error> {
    let mut statement =
        tx.prepare("INSERT INTO resx_file (file_path, xml_content) VALUES (?1, ?2)")?;
    for file in store.files() {
        statement.execute(params![file.relative_path, file.residual_xml])?;
    }
    Ok(())
}

fn read_invariant_resources(
    connection: &Connection,
) -> Result<HashMap<i64, InvariantKey>, Error> {
    let mut statement = connection
        .prepare("SELECT id, name, file, type, value, comment FROM invariant_resource")?;
    let rows = statement.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            InvariantKey {
                name: row.get(1)?,
                file: row.get(2)?,
                resource_type: row.get(3)?,
                value: row.get(4)?,
                comment: row.get(5)?,
            },
        ))
    })?;
    let mut invariants = HashMap::new();
    for row in rows {
        let (id, key) = row?;
        invariants.insert(id, key);
    }
    Ok(invariants)
}

fn read_localized_resources(
    connection: &Connection,
) -> Result<HashMap<i64, Vec<(String, String)>>, Error> {
    let mut statement = connection.prepare(
        "SELECT invariant_id, language, value FROM localized_resource ORDER BY language",
    )?;
    let rows = statement.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;
    let mut localized: HashMap<i64, Vec<(String, String)>> = HashMap::new();
    for row in rows {
        let (invariant_id, language, value) = row?;
        localized
            .entry(invariant_id)
            .or_default()
            .push((language, value));
    }
    Ok(localized)
}

fn read_residuals(connection: &Connection) -> Result<HashMap<String, String>, Error> {
    let mut statement = connection.prepare("SELECT file_path, xml_content FROM resx_file")?;
    let rows = statement.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    let mut residuals = HashMap::new();
    for row in rows {
        let (file_path, xml_content) = row?;
        residuals.insert(file_path, xml_content);
    }
    Ok(residuals)
}
