//! The per-file resource collection: an ordered list of entries parsed from
//! one resx file, with set algebra against other collections and export back
//! to the resx format.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    ffi::OsStr,
    fs,
    io::Write,
    path::Path,
};

use serde::Serialize;

use crate::{
    diagnostics::{Diagnostic, DiagnosticSink},
    error::Error,
    resx::{self, DataElement, Document},
    types::{InvariantKey, ResourceEntry},
};

// Files whose base name ends with this are shared resource files: their keys
// carry no file scope, so identical content deduplicates across files.
const SHARED_STEM_SUFFIX: &str = "resources";

/// The ordered set of resource entries originating from one source file,
/// plus the residual document needed to regenerate the non-resource XML
/// scaffolding on export.
///
/// Entry names are unique within one file; a duplicate at parse time keeps
/// the first occurrence and reports a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceFile {
    /// Path identity of the originating file, relative to the scan root,
    /// with forward slashes. The map key in the store.
    pub relative_path: String,

    /// Ordered entries, in source-document order.
    pub entries: Vec<ResourceEntry>,

    /// The source document with every `<data>` subtree removed.
    pub residual_xml: String,
}

impl ResourceFile {
    /// An empty collection with a default resx skeleton, used when decoding
    /// a store persisted without scaffolding.
    pub fn new(relative_path: impl Into<String>) -> Self {
        ResourceFile {
            relative_path: relative_path.into(),
            entries: Vec::new(),
            residual_xml: default_residual(),
        }
    }

    /// Parse one resx file plus any sibling language variants
    /// (`<base>.<lang>.resx` in the same directory, visited in sorted order).
    ///
    /// The key scope is `None` for shared resource files (base name ending in
    /// `Resources`), otherwise the relative path, so that equal content in
    /// unrelated files stays distinct.
    pub fn read(
        path: &Path,
        relative_path: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Self, Error> {
        let document = Document::read_from(path)?;
        let file_key = file_scope(relative_path);

        let mut entries: Vec<ResourceEntry> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for element in document.data {
            if index.contains_key(&element.name) {
                sink.report(Diagnostic::DuplicateName {
                    name: element.name,
                    file: relative_path.to_string(),
                });
                continue;
            }
            let key = InvariantKey {
                name: element.name.clone(),
                file: file_key.clone(),
                resource_type: element.resource_type,
                value: element.value,
                comment: element.comment,
            };
            let mut entry = ResourceEntry::new(element.name, key);
            entry.mime_type = element.mime_type;
            entry.xml_space = element.xml_space;
            index.insert(entry.name.clone(), entries.len());
            entries.push(entry);
        }

        apply_language_variants(path, &mut entries, &index)?;

        Ok(ResourceFile {
            relative_path: relative_path.to_string(),
            entries,
            residual_xml: document.residual_xml,
        })
    }

    /// Builds a collection from pre-parsed entries. Used by the persistence
    /// layer and by tests.
    pub fn from_entries(relative_path: impl Into<String>, entries: Vec<ResourceEntry>) -> Self {
        ResourceFile {
            relative_path: relative_path.into(),
            entries,
            residual_xml: default_residual(),
        }
    }

    /// Merges `other` into a new collection.
    ///
    /// Unknown names are appended. A known name with a *different* invariant
    /// key is an unrelated resource that happens to share a display name; the
    /// incoming entry is silently discarded, never merged. A known name with
    /// the same key contributes only languages not already present, so the
    /// first value seen for a language wins across repeated calls.
    #[must_use]
    pub fn add(&self, other: &ResourceFile) -> ResourceFile {
        let mut entries = self.entries.clone();
        let mut index: HashMap<String, usize> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.name.clone(), i))
            .collect();

        for incoming in &other.entries {
            let Some(&at) = index.get(&incoming.name) else {
                index.insert(incoming.name.clone(), entries.len());
                entries.push(incoming.clone());
                continue;
            };
            if entries[at].invariant != incoming.invariant {
                continue;
            }
            let mut merged = entries[at].clone();
            for (language, value) in &incoming.localized_values {
                if !merged.localized_values.contains_key(language) {
                    merged = merged.with_localized_value(language.clone(), value.clone());
                }
            }
            entries[at] = merged;
        }

        ResourceFile {
            relative_path: self.relative_path.clone(),
            entries,
            residual_xml: self.residual_xml.clone(),
        }
    }

    /// Removes every entry whose invariant key is in `keys`.
    #[must_use]
    pub fn subtract(&self, keys: &HashSet<InvariantKey>) -> ResourceFile {
        self.retain(|entry| !keys.contains(&entry.invariant))
    }

    /// Keeps only entries whose invariant key is in `keys`.
    #[must_use]
    pub fn intersect(&self, keys: &HashSet<InvariantKey>) -> ResourceFile {
        self.retain(|entry| keys.contains(&entry.invariant))
    }

    fn retain(&self, keep: impl Fn(&ResourceEntry) -> bool) -> ResourceFile {
        ResourceFile {
            relative_path: self.relative_path.clone(),
            entries: self.entries.iter().filter(|e| keep(e)).cloned().collect(),
            residual_xml: self.residual_xml.clone(),
        }
    }

    /// Reconstructs the resx document.
    ///
    /// Without a language every entry is written with its invariant value.
    /// With a language only entries carrying that translation are written,
    /// using the translated value. Comments, mime type, and `xml:space` are
    /// carried through; the residual scaffolding is reproduced verbatim.
    pub fn export_resx<W: Write>(&self, language: Option<&str>, writer: W) -> Result<(), Error> {
        let mut data = Vec::new();
        for entry in &self.entries {
            let value = match language {
                None => entry.invariant.value.clone(),
                Some(language) => match entry.translation(language) {
                    Some(value) => value.to_string(),
                    None => continue,
                },
            };
            data.push(DataElement {
                name: entry.name.clone(),
                resource_type: entry.invariant.resource_type.clone(),
                mime_type: entry.mime_type.clone(),
                xml_space: entry.xml_space.clone(),
                value,
                comment: entry.invariant.comment.clone(),
            });
        }
        resx::write_document(&self.residual_xml, &data, writer)
    }

    /// All language tags that appear anywhere in this file's entries.
    pub fn languages(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .flat_map(|entry| entry.localized_values.keys().cloned())
            .collect()
    }

    /// The set of invariant keys in this collection.
    pub fn key_set(&self) -> HashSet<InvariantKey> {
        self.entries
            .iter()
            .map(|entry| entry.invariant.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// Shared resource files drop the file scope from their keys.
fn file_scope(relative_path: &str) -> Option<String> {
    let stem = Path::new(relative_path)
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or_default();
    if stem.to_lowercase().ends_with(SHARED_STEM_SUFFIX) {
        None
    } else {
        Some(relative_path.to_string())
    }
}

// Fold translations from sibling language files into the parsed entries.
// Names that the base file does not know are ignored.
fn apply_language_variants(
    path: &Path,
    entries: &mut [ResourceEntry],
    index: &HashMap<String, usize>,
) -> Result<(), Error> {
    let Some(directory) = path.parent() else {
        return Ok(());
    };
    let Some(base_stem) = path.file_stem().and_then(OsStr::to_str) else {
        return Ok(());
    };

    let mut siblings: Vec<_> = fs::read_dir(directory)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .collect();
    siblings.sort();

    for sibling in siblings {
        let Some(language) = resx::language_variant_tag(&sibling, base_stem) else {
            continue;
        };
        let document = Document::read_from(&sibling)?;
        for element in document.data {
            if let Some(&at) = index.get(&element.name) {
                entries[at]
                    .localized_values
                    .insert(language.clone(), element.value);
            }
        }
    }
    Ok(())
}

fn default_residual() -> String {
    "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<root></root>".to_string()
}
