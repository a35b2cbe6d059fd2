//! Core types for resorg: the content-derived resource identity and the
//! per-occurrence entry. The resx codec decodes into these; the store and the
//! persistence layer operate on them.

use std::{cmp::Ordering, collections::BTreeMap, fmt::Display};

use serde::{Deserialize, Serialize};

/// The content-derived identity of a resource, independent of translation
/// language. Two keys denote the same resource iff all five fields match;
/// this is the deduplication unit of the whole store.
///
/// Keys are constructed once (from a parsed `<data>` element or a database
/// row) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvariantKey {
    /// The resource name, from the `name` attribute.
    pub name: String,

    /// The owning file scope. `None` means the resource is shared across all
    /// files that use this name.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub file: Option<String>,

    /// Optional type tag, from the `type` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub resource_type: Option<String>,

    /// The untranslated/default text. Never null; defaults to empty.
    pub value: String,

    /// Optional translator comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub comment: Option<String>,
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn cmp_opt_ignore_case(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => cmp_ignore_case(a, b),
    }
}

impl Ord for InvariantKey {
    /// Case-insensitive ordering over name, comment, file, value, type.
    ///
    /// Total only up to case-insensitive collisions; ties are stable within a
    /// single sort call, which is all the persistence layer needs.
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_ignore_case(&self.name, &other.name)
            .then_with(|| cmp_opt_ignore_case(self.comment.as_deref(), other.comment.as_deref()))
            .then_with(|| cmp_opt_ignore_case(self.file.as_deref(), other.file.as_deref()))
            .then_with(|| cmp_ignore_case(&self.value, &other.value))
            .then_with(|| {
                cmp_opt_ignore_case(self.resource_type.as_deref(), other.resource_type.as_deref())
            })
    }
}

impl PartialOrd for InvariantKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for InvariantKey {
    /// Stable diagnostic rendering: present fields in the order name, type,
    /// comment, file, then the invariant value quoted.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = vec![format!("Name:{}", self.name)];
        if let Some(resource_type) = &self.resource_type {
            parts.push(format!("Type:{}", resource_type));
        }
        if let Some(comment) = &self.comment {
            parts.push(format!("Comment:{}", comment));
        }
        if let Some(file) = &self.file {
            parts.push(format!("File:{}", file));
        }
        parts.push(format!("\"{}\"", self.value));
        write!(f, "{}", parts.join(", "))
    }
}

impl InvariantKey {
    /// A key with only a name and an invariant value, shared across files.
    /// Mostly a test convenience.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        InvariantKey {
            name: name.into(),
            file: None,
            resource_type: None,
            value: value.into(),
            comment: None,
        }
    }
}

/// One localized resource occurrence: the display name used within its owning
/// file, the invariant key it denotes, and the translations recorded for it.
///
/// `localized_values` never contains the invariant/default language; that
/// value lives in `invariant.value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    /// The display/lookup name within the owning file. Distinct from
    /// `invariant.name` only in edge cases.
    pub name: String,

    /// The identity of this resource.
    pub invariant: InvariantKey,

    /// Optional `mimetype` attribute carried through for export.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub mime_type: Option<String>,

    /// Optional `xml:space` attribute carried through for export.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub xml_space: Option<String>,

    /// Language tag → translated value.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    #[serde(default)]
    pub localized_values: BTreeMap<String, String>,
}

impl ResourceEntry {
    pub fn new(name: impl Into<String>, invariant: InvariantKey) -> Self {
        ResourceEntry {
            name: name.into(),
            invariant,
            mime_type: None,
            xml_space: None,
            localized_values: BTreeMap::new(),
        }
    }

    /// Returns an entry with the mapping extended/overwritten for `language`.
    ///
    /// Pure: the original is consumed, never shared-and-mutated, so two
    /// collections holding findings from a merge can never silently diverge.
    #[must_use]
    pub fn with_localized_value(
        mut self,
        language: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.localized_values.insert(language.into(), value.into());
        self
    }

    /// The translation recorded for `language`, if any.
    pub fn translation(&self, language: &str) -> Option<&str> {
        self.localized_values.get(language).map(String::as_str)
    }
}

impl Display for ResourceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Entry {{ name: {}, invariant: {}, languages: {} }}",
            self.name,
            self.invariant,
            self.localized_values
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(",")
        )
    }
}
