//! Renders a store into a zip archive: one entry per source file with the
//! invariant rendering, plus one entry per language present in that file,
//! named by inserting the language tag before the extension.

use std::{fs::File, io::Write, path::Path};

use zip::{ZipWriter, write::SimpleFileOptions};

use crate::{error::Error, store::ResourceStore};

/// Writes the archive at `target`, replacing any existing file.
pub fn export(store: &ResourceStore, target: &Path) -> Result<(), Error> {
    let file = File::create(target)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    for resource_file in store.files() {
        writer.start_file(resource_file.relative_path.clone(), options)?;
        write_rendering(&mut writer, resource_file, None)?;

        for language in resource_file.languages() {
            let entry_name = localized_entry_name(&resource_file.relative_path, &language);
            writer.start_file(entry_name, options)?;
            write_rendering(&mut writer, resource_file, Some(&language))?;
        }
    }

    writer.finish()?;
    Ok(())
}

fn write_rendering<W: Write + std::io::Seek>(
    writer: &mut ZipWriter<W>,
    resource_file: &crate::file::ResourceFile,
    language: Option<&str>,
) -> Result<(), Error> {
    let mut rendered = Vec::new();
    resource_file.export_resx(language, &mut rendered)?;
    writer.write_all(&rendered)?;
    Ok(())
}

/// `a/x.resx` with language `fr` becomes `a/x.fr.resx`. Only the final path
/// segment is split, so dots in directory names stay untouched.
fn localized_entry_name(relative_path: &str, language: &str) -> String {
    let (directory, file_name) = match relative_path.rsplit_once('/') {
        Some((directory, file_name)) => (Some(directory), file_name),
        None => (None, relative_path),
    };
    let tagged = match file_name.rsplit_once('.') {
        Some((stem, extension)) => format!("{}.{}.{}", stem, language, extension),
        None => format!("{}.{}", file_name, language),
    };
    match directory {
        Some(directory) => format!("{}/{}", directory, tagged),
        None => tagged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::ResourceFile;
    use crate::types::{InvariantKey, ResourceEntry};
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    #[test]
    fn test_localized_entry_name() {
        assert_eq!(localized_entry_name("a/x.resx", "fr"), "a/x.fr.resx");
        assert_eq!(localized_entry_name("noext", "fr"), "noext.fr");
        // A dotted directory never absorbs the tag.
        assert_eq!(localized_entry_name("a.b/noext", "fr"), "a.b/noext.fr");
        assert_eq!(localized_entry_name("a.b/x.resx", "de"), "a.b/x.de.resx");
    }

    #[test]
    fn test_export_writes_base_and_language_entries() {
        let mut store = ResourceStore::new();
        store.insert(ResourceFile::from_entries(
            "Forms/Main.resx",
            vec![
                ResourceEntry::new("Hello", InvariantKey::new("Hello", "Hello"))
                    .with_localized_value("fr", "Bonjour"),
                ResourceEntry::new("Plain", InvariantKey::new("Plain", "Plain")),
            ],
        ));

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("export.zip");
        export(&store, &target).unwrap();

        let mut archive = ZipArchive::new(std::fs::File::open(&target).unwrap()).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["Forms/Main.resx", "Forms/Main.fr.resx"]);

        let mut base = String::new();
        archive
            .by_name("Forms/Main.resx")
            .unwrap()
            .read_to_string(&mut base)
            .unwrap();
        assert!(base.contains("Hello"));
        assert!(base.contains("Plain"));

        let mut french = String::new();
        archive
            .by_name("Forms/Main.fr.resx")
            .unwrap()
            .read_to_string(&mut french)
            .unwrap();
        assert!(french.contains("Bonjour"));
        assert!(!french.contains("Plain"));
    }

    #[test]
    fn test_export_skips_languages_absent_from_file() {
        let mut store = ResourceStore::new();
        store.insert(ResourceFile::from_entries(
            "a.resx",
            vec![ResourceEntry::new("K", InvariantKey::new("K", "v"))],
        ));
        store.insert(ResourceFile::from_entries(
            "b.resx",
            vec![
                ResourceEntry::new("L", InvariantKey::new("L", "w"))
                    .with_localized_value("de", "x"),
            ],
        ));

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("export.zip");
        export(&store, &target).unwrap();

        let archive = ZipArchive::new(std::fs::File::open(&target).unwrap()).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"a.resx"));
        assert!(!names.iter().any(|n| n.starts_with("a.") && n.contains(".de.")));
        assert!(names.contains(&"b.de.resx"));
    }
}
