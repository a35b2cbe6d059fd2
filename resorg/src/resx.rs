//! Support for the `.resx` XML resource format.
//!
//! Parses the `<data>` elements of a resx document into raw tuples and keeps
//! everything else (headers, schema, comments, whitespace) as a residual
//! document so export can reproduce the non-resource scaffolding verbatim.

use std::{
    ffi::OsStr,
    fs::File,
    io::{BufRead, BufReader, Cursor, Write},
    path::Path,
};

use quick_xml::{
    Reader, Writer,
    events::{BytesEnd, BytesStart, BytesText, Event},
};
use serde::Serialize;

use crate::error::Error;

/// File extension of invariant resource files (without the dot).
pub const EXTENSION: &str = "resx";

/// One parsed `<data>` element: name/type/value/comment plus the attributes
/// carried through for faithful export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataElement {
    pub name: String,
    pub resource_type: Option<String>,
    pub mime_type: Option<String>,
    pub xml_space: Option<String>,
    pub value: String,
    pub comment: Option<String>,
}

/// A parsed resx document: the ordered `<data>` elements and the residual
/// document (the source with every `<data>` subtree removed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub data: Vec<DataElement>,
    pub residual_xml: String,
}

impl Document {
    /// Parse a document from a file path.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = File::open(path).map_err(Error::Io)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse a document from a string slice.
    pub fn from_str(s: &str) -> Result<Self, Error> {
        Self::from_reader(Cursor::new(s))
    }

    /// Parse from any reader.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut xml_reader = Reader::from_reader(reader);

        let mut buf = Vec::new();
        let mut data = Vec::new();
        let mut residual = Writer::new(Vec::new());
        let mut depth = 0usize;

        loop {
            let event = xml_reader.read_event_into(&mut buf).map_err(Error::XmlParse)?;
            match event {
                Event::Eof => break,
                Event::Start(ref e) if depth == 1 && e.name().as_ref() == b"data" => {
                    data.push(parse_data_element(e, &mut xml_reader)?);
                }
                Event::Empty(ref e) if depth == 1 && e.name().as_ref() == b"data" => {
                    return Err(Error::invalid_resource(
                        "data element has no value element",
                    ));
                }
                Event::Start(e) => {
                    depth += 1;
                    residual.write_event(Event::Start(e))?;
                }
                Event::End(e) => {
                    depth = depth.saturating_sub(1);
                    residual.write_event(Event::End(e))?;
                }
                other => residual.write_event(other)?,
            }
            buf.clear();
        }

        let residual_xml = String::from_utf8(residual.into_inner())
            .map_err(|e| Error::DataMismatch(e.to_string()))?;
        Ok(Document { data, residual_xml })
    }

    /// Write to any writer (file, memory, etc.).
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        write_document(&self.residual_xml, &self.data, writer)
    }
}

/// Streams `residual_xml` and injects freshly rendered `<data>` elements
/// immediately before the root end tag.
pub fn write_document<W: Write>(
    residual_xml: &str,
    data: &[DataElement],
    writer: W,
) -> Result<(), Error> {
    let mut reader = Reader::from_str(residual_xml);
    let mut xml_writer = Writer::new(writer);
    let mut depth = 0usize;

    loop {
        let event = reader.read_event().map_err(Error::XmlParse)?;
        match event {
            Event::Eof => break,
            Event::Start(e) => {
                depth += 1;
                xml_writer.write_event(Event::Start(e))?;
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    write_data_elements(&mut xml_writer, data)?;
                }
                xml_writer.write_event(Event::End(e))?;
            }
            Event::Empty(e) if depth == 0 => {
                // An empty root element; expand it so the data elements have
                // somewhere to live.
                let name = e.name().as_ref().to_vec();
                xml_writer.write_event(Event::Start(e))?;
                write_data_elements(&mut xml_writer, data)?;
                xml_writer.write_event(Event::End(BytesEnd::new(
                    String::from_utf8_lossy(&name).into_owned(),
                )))?;
            }
            other => xml_writer.write_event(other)?,
        }
    }
    Ok(())
}

fn write_data_elements<W: Write>(
    xml_writer: &mut Writer<W>,
    data: &[DataElement],
) -> Result<(), Error> {
    for element in data {
        xml_writer.write_event(Event::Text(BytesText::new("\n  ")))?;

        let mut start = BytesStart::new("data");
        start.push_attribute(("name", element.name.as_str()));
        if let Some(resource_type) = &element.resource_type {
            start.push_attribute(("type", resource_type.as_str()));
        }
        if let Some(mime_type) = &element.mime_type {
            start.push_attribute(("mimetype", mime_type.as_str()));
        }
        if let Some(xml_space) = &element.xml_space {
            start.push_attribute(("xml:space", xml_space.as_str()));
        }
        xml_writer.write_event(Event::Start(start))?;

        xml_writer.write_event(Event::Text(BytesText::new("\n    ")))?;
        xml_writer.write_event(Event::Start(BytesStart::new("value")))?;
        xml_writer.write_event(Event::Text(BytesText::new(&element.value)))?;
        xml_writer.write_event(Event::End(BytesEnd::new("value")))?;

        if let Some(comment) = &element.comment {
            xml_writer.write_event(Event::Text(BytesText::new("\n    ")))?;
            xml_writer.write_event(Event::Start(BytesStart::new("comment")))?;
            xml_writer.write_event(Event::Text(BytesText::new(comment)))?;
            xml_writer.write_event(Event::End(BytesEnd::new("comment")))?;
        }

        xml_writer.write_event(Event::Text(BytesText::new("\n  ")))?;
        xml_writer.write_event(Event::End(BytesEnd::new("data")))?;
    }
    if !data.is_empty() {
        xml_writer.write_event(Event::Text(BytesText::new("\n")))?;
    }
    Ok(())
}

fn parse_data_element<R: BufRead>(
    e: &BytesStart,
    xml_reader: &mut Reader<R>,
) -> Result<DataElement, Error> {
    let mut name = None;
    let mut resource_type = None;
    let mut mime_type = None;
    let mut xml_space = None;

    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(|e| Error::DataMismatch(e.to_string()))?;
        match attr.key.as_ref() {
            b"name" => name = Some(attr.unescape_value()?.to_string()),
            b"type" => resource_type = Some(attr.unescape_value()?.to_string()),
            b"mimetype" => mime_type = Some(attr.unescape_value()?.to_string()),
            b"xml:space" => xml_space = Some(attr.unescape_value()?.to_string()),
            _ => {}
        }
    }
    let name =
        name.ok_or_else(|| Error::invalid_resource("data element missing 'name' attribute"))?;

    let mut value = None;
    let mut comment = None;
    let mut buf = Vec::new();
    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"value" => {
                value = Some(read_text(xml_reader, b"value")?);
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"value" => {
                value = Some(String::new());
            }
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"comment" => {
                comment = Some(read_text(xml_reader, b"comment")?);
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"comment" => {
                comment = Some(String::new());
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"data" => break,
            Ok(Event::Eof) => {
                return Err(Error::invalid_resource("unexpected EOF in data element"));
            }
            Ok(_) => {}
            Err(e) => return Err(Error::XmlParse(e)),
        }
        buf.clear();
    }
    let value = value.ok_or_else(|| {
        Error::invalid_resource(format!("data element '{}' has no value element", name))
    })?;

    Ok(DataElement {
        name,
        resource_type,
        mime_type,
        xml_space,
        value,
        comment,
    })
}

// Accumulate character data until the matching end tag.
fn read_text<R: BufRead>(xml_reader: &mut Reader<R>, end: &[u8]) -> Result<String, Error> {
    let mut buf = Vec::new();
    let mut text = String::new();
    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Text(e)) => text.push_str(&e.unescape().map_err(Error::XmlParse)?),
            Ok(Event::CData(e)) => text.push_str(&String::from_utf8_lossy(&e.into_inner())),
            Ok(Event::End(ref e)) if e.name().as_ref() == end => break,
            Ok(Event::Eof) => {
                return Err(Error::invalid_resource("unexpected EOF in data element"));
            }
            Ok(_) => {}
            Err(e) => return Err(Error::XmlParse(e)),
        }
        buf.clear();
    }
    Ok(text)
}

/// Whether `path` is an invariant resource file the store should ingest.
///
/// The extension must be `.resx`. A base name whose own extension is a
/// language tag (`Resources.fr.resx`, `Strings.zh-CHS.resx`) is a language
/// variant of a sibling base file, not an independent resource file; a longer
/// inner extension (`Foo.Settings.resx`) still qualifies.
pub fn is_invariant_resource_file(path: &Path) -> bool {
    let Some(extension) = path.extension().and_then(OsStr::to_str) else {
        return false;
    };
    if !extension.eq_ignore_ascii_case(EXTENSION) {
        return false;
    }
    match inner_extension(path) {
        None => true,
        Some(tag) => !looks_like_language_tag(&tag),
    }
}

/// The language tag under which `sibling` is a variant of the base file with
/// stem `base_stem`, if it is one (`Resources.fr.resx` next to
/// `Resources.resx` yields `fr`). Matching is case-insensitive.
pub fn language_variant_tag(sibling: &Path, base_stem: &str) -> Option<String> {
    let extension = sibling.extension().and_then(OsStr::to_str)?;
    if !extension.eq_ignore_ascii_case(EXTENSION) {
        return None;
    }
    let stem = sibling.file_stem().and_then(OsStr::to_str)?;
    let language = inner_extension(sibling)?;
    let sibling_base = Path::new(stem).file_stem().and_then(OsStr::to_str)?;
    if language.is_empty() || !sibling_base.eq_ignore_ascii_case(base_stem) {
        return None;
    }
    Some(language)
}

// The extension of the file name with its outer extension removed
// ("Resources.fr.resx" -> "fr").
fn inner_extension(path: &Path) -> Option<String> {
    let stem = path.file_stem().and_then(OsStr::to_str)?;
    Path::new(stem)
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_string)
}

fn looks_like_language_tag(tag: &str) -> bool {
    // "fr", "de", or a locale with a sub-tag marker in third position such
    // as "zh-CHS".
    tag.len() <= 2 || tag.as_bytes().get(2) == Some(&b'-')
}
