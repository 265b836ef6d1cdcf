//! Tabular parsing for uploaded contact files.
//!
//! Two variants with one output contract: a sequence of normalized
//! [`ContactRecord`]s in source row order.
//!
//! - CSV: streamed record by record through the `csv` crate; the header row
//!   is required and each data row is normalized as it is read.
//! - Workbook (XLSX/XLS): the whole archive is loaded and only the first
//!   sheet in the workbook's declared order is used. Cells are resolved
//!   from shared strings, inline strings, or raw values; the first row is
//!   the header row.
//!
//! Format selection by extension is owned by the orchestrator; this module
//! only decodes.

use std::io::{Read, Seek};

use crate::error::IngestError;
use crate::models::ContactRecord;
use crate::normalize::normalize_row;

/// Maximum decompressed bytes to read from a single archive entry.
const MAX_XML_ENTRY_BYTES: u64 = 32 * 1024 * 1024;

/// OOXML sheets end at column XFD; anything past it is a forged reference.
const MAX_SHEET_COLUMNS: usize = 16_384;

/// Upload format, selected by file extension (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Workbook,
}

impl FileFormat {
    /// Maps a file name to its format; `None` means the upload must be
    /// rejected before any parse attempt.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = std::path::Path::new(name)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(FileFormat::Csv),
            "xlsx" | "xls" => Some(FileFormat::Workbook),
            _ => None,
        }
    }
}

/// Parses the reader as the given format.
pub fn parse<R: Read + Seek>(
    reader: R,
    format: FileFormat,
) -> Result<Vec<ContactRecord>, IngestError> {
    match format {
        FileFormat::Csv => parse_csv(reader),
        FileFormat::Workbook => parse_workbook(reader),
    }
}

fn csv_error(err: csv::Error) -> IngestError {
    if matches!(err.kind(), csv::ErrorKind::Io(_)) {
        match err.into_kind() {
            csv::ErrorKind::Io(io) => IngestError::Io(io),
            _ => IngestError::Parse("csv stream error".to_string()),
        }
    } else {
        IngestError::Parse(err.to_string())
    }
}

/// Streams a CSV file, normalizing each row as it arrives.
///
/// An empty file (or one with only a header row) resolves to an empty
/// sequence; that policy belongs to the orchestrator, not the parser.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<ContactRecord>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        let cells: Vec<(String, String)> = headers
            .iter()
            .zip(row.iter())
            .map(|(header, value)| (header.clone(), value.to_string()))
            .collect();
        if let Some(record) = normalize_row(&cells) {
            records.push(record);
        }
    }
    Ok(records)
}

/// Parses an OOXML workbook, using only its first declared sheet.
pub fn parse_workbook<R: Read + Seek>(reader: R) -> Result<Vec<ContactRecord>, IngestError> {
    let mut archive =
        zip::ZipArchive::new(reader).map_err(|e| IngestError::Parse(e.to_string()))?;
    let shared_strings = read_shared_strings(&mut archive)?;
    let sheet_path = first_sheet_path(&mut archive)?;
    let sheet_xml = read_entry_bounded(&mut archive, &sheet_path)?;
    let rows = read_sheet_rows(&sheet_xml, &shared_strings)?;
    Ok(rows_to_records(rows))
}

fn read_entry_bounded<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> Result<Vec<u8>, IngestError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| IngestError::Parse(format!("{name}: {e}")))?;
    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| IngestError::Parse(format!("{name}: {e}")))?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(IngestError::Parse(format!(
            "archive entry {name} exceeds size limit ({MAX_XML_ENTRY_BYTES} bytes)"
        )));
    }
    Ok(out)
}

/// Reads `xl/sharedStrings.xml`, concatenating the text runs of each entry.
/// A workbook without shared strings yields an empty table.
fn read_shared_strings<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<Vec<String>, IngestError> {
    if archive.by_name("xl/sharedStrings.xml").is_err() {
        return Ok(Vec::new());
    }
    let xml = read_entry_bounded(archive, "xl/sharedStrings.xml")?;

    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_si = false;
    let mut in_text = false;
    let mut current = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"t" if in_si => in_text = true,
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(te)) if in_text => {
                current.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"si" => {
                    in_si = false;
                    strings.push(std::mem::take(&mut current));
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(IngestError::Parse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Resolves the archive path of the first sheet in the workbook's declared
/// order (`xl/workbook.xml` plus its relationships). Falls back to the
/// lowest-numbered worksheet part when the manifest is unusable.
fn first_sheet_path<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<String, IngestError> {
    if let Some(rel_id) = first_sheet_rel_id(archive)? {
        if let Some(target) = workbook_rel_target(archive, &rel_id)? {
            let path = match target.strip_prefix('/') {
                Some(absolute) => absolute.to_string(),
                None => format!("xl/{target}"),
            };
            if archive.by_name(&path).is_ok() {
                return Ok(path);
            }
        }
    }

    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(str::to_string)
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches("xl/worksheets/sheet")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names
        .into_iter()
        .next()
        .ok_or_else(|| IngestError::Parse("workbook contains no worksheets".to_string()))
}

/// Returns the `r:id` of the first `<sheet>` element in `xl/workbook.xml`.
fn first_sheet_rel_id<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<Option<String>, IngestError> {
    if archive.by_name("xl/workbook.xml").is_err() {
        return Ok(None);
    }
    let xml = read_entry_bounded(archive, "xl/workbook.xml")?;

    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e))
            | Ok(quick_xml::events::Event::Empty(e))
                if e.local_name().as_ref() == b"sheet" =>
            {
                for attr in e.attributes().flatten() {
                    // The relationship id attribute is namespaced (r:id).
                    if attr.key.local_name().as_ref() == b"id" {
                        return Ok(Some(
                            String::from_utf8_lossy(attr.value.as_ref()).into_owned(),
                        ));
                    }
                }
                return Ok(None);
            }
            Ok(quick_xml::events::Event::Eof) => return Ok(None),
            Err(e) => return Err(IngestError::Parse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
}

/// Looks up a relationship target in `xl/_rels/workbook.xml.rels`.
fn workbook_rel_target<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    rel_id: &str,
) -> Result<Option<String>, IngestError> {
    if archive.by_name("xl/_rels/workbook.xml.rels").is_err() {
        return Ok(None);
    }
    let xml = read_entry_bounded(archive, "xl/_rels/workbook.xml.rels")?;

    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e))
            | Ok(quick_xml::events::Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = Some(String::from_utf8_lossy(attr.value.as_ref()).into_owned()),
                        b"Target" => {
                            target =
                                Some(String::from_utf8_lossy(attr.value.as_ref()).into_owned())
                        }
                        _ => {}
                    }
                }
                if id.as_deref() == Some(rel_id) {
                    return Ok(target);
                }
            }
            Ok(quick_xml::events::Event::Eof) => return Ok(None),
            Err(e) => return Err(IngestError::Parse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
}

/// How a `<c>` element's value should be interpreted.
#[derive(Clone, Copy, PartialEq)]
enum CellKind {
    /// `<v>` holds the value text directly (numbers, formula strings, bools).
    Raw,
    /// `<v>` holds an index into the shared-strings table.
    Shared,
    /// The value lives in `<is><t>` inside the cell.
    Inline,
}

/// Converts a worksheet XML part into rows of optional cell strings,
/// positioned by each cell's column reference.
fn read_sheet_rows(
    xml: &[u8],
    shared_strings: &[String],
) -> Result<Vec<Vec<Option<String>>>, IngestError> {
    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    let mut current: Vec<Option<String>> = Vec::new();
    let mut col = 0usize;
    let mut next_col = 0usize;
    let mut kind = CellKind::Raw;
    let mut in_value = false;
    let mut in_inline_text = false;

    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    current.clear();
                    next_col = 0;
                }
                b"c" => {
                    kind = CellKind::Raw;
                    col = next_col;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"r" => {
                                if let Some(index) =
                                    column_index(&String::from_utf8_lossy(attr.value.as_ref()))?
                                {
                                    col = index;
                                }
                            }
                            b"t" => {
                                kind = match attr.value.as_ref() {
                                    b"s" => CellKind::Shared,
                                    b"inlineStr" => CellKind::Inline,
                                    _ => CellKind::Raw,
                                };
                            }
                            _ => {}
                        }
                    }
                    next_col = col + 1;
                }
                b"v" => in_value = true,
                b"t" if kind == CellKind::Inline => in_inline_text = true,
                _ => {}
            },
            Ok(quick_xml::events::Event::Empty(e)) => match e.local_name().as_ref() {
                b"row" => rows.push(Vec::new()),
                b"c" => {
                    // Valueless cell still advances the running column.
                    col = next_col;
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"r" {
                            if let Some(index) =
                                column_index(&String::from_utf8_lossy(attr.value.as_ref()))?
                            {
                                col = index;
                            }
                        }
                    }
                    next_col = col + 1;
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(te)) if in_value || in_inline_text => {
                let raw = te.unescape().unwrap_or_default();
                let value = if kind == CellKind::Shared {
                    raw.trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| shared_strings.get(i).cloned())
                } else {
                    Some(raw.into_owned())
                };
                if let Some(value) = value {
                    set_cell(&mut current, col, value);
                }
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"row" => rows.push(std::mem::take(&mut current)),
                b"v" => in_value = false,
                b"t" => in_inline_text = false,
                b"c" => kind = CellKind::Raw,
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(IngestError::Parse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}

fn set_cell(row: &mut Vec<Option<String>>, col: usize, value: String) {
    if row.len() <= col {
        row.resize(col + 1, None);
    }
    row[col] = Some(value);
}

/// Parses the column letters of a cell reference (`"BC23"` → 54).
///
/// References past the sheet column limit are rejected rather than
/// resolved: a forged reference would otherwise dictate the row vector's
/// length (or overflow the accumulator outright). `Ok(None)` means the
/// reference carries no column letters at all.
fn column_index(cell_ref: &str) -> Result<Option<usize>, IngestError> {
    let letters: String = cell_ref
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return Ok(None);
    }
    // Three letters already covers XFD; longer cannot be in range.
    if letters.len() > 3 {
        return Err(out_of_range_ref(cell_ref));
    }
    let mut index = 0usize;
    for c in letters.chars() {
        index = index * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    if index > MAX_SHEET_COLUMNS {
        return Err(out_of_range_ref(cell_ref));
    }
    Ok(Some(index - 1))
}

fn out_of_range_ref(cell_ref: &str) -> IngestError {
    IngestError::Parse(format!("cell reference {cell_ref} is out of range"))
}

/// Treats the first row as headers and normalizes the rest. Cells under an
/// empty header and rows shorter than the header row contribute nothing.
fn rows_to_records(rows: Vec<Vec<Option<String>>>) -> Vec<ContactRecord> {
    let mut rows = rows.into_iter();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_row
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect();

    let mut records = Vec::new();
    for row in rows {
        let mut cells = Vec::new();
        for (i, header) in headers.iter().enumerate() {
            if header.trim().is_empty() {
                continue;
            }
            if let Some(Some(value)) = row.get(i) {
                cells.push((header.clone(), value.clone()));
            }
        }
        if let Some(record) = normalize_row(&cells) {
            records.push(record);
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;

    #[test]
    fn format_from_extension_is_case_insensitive() {
        assert_eq!(FileFormat::from_name("leads.csv"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_name("LEADS.CSV"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_name("q3.XLSX"), Some(FileFormat::Workbook));
        assert_eq!(FileFormat::from_name("old.xls"), Some(FileFormat::Workbook));
        assert_eq!(FileFormat::from_name("notes.txt"), None);
        assert_eq!(FileFormat::from_name("no-extension"), None);
    }

    #[test]
    fn csv_rows_are_normalized_in_order() {
        let data = "FirstName,Mobile Number,Comments\n\
                    Alice,+1111,VIP\n\
                    Bob,+2222,\n\
                    ,+3333,missing name\n\
                    Carol,+4444,call back\n";
        let records = parse_csv(Cursor::new(data)).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, "Alice");
        assert_eq!(records[0].notes, "VIP");
        assert_eq!(records[1].name, "Bob");
        assert_eq!(records[1].notes, "");
        assert_eq!(records[2].name, "Carol");
    }

    #[test]
    fn csv_with_no_matching_columns_yields_empty() {
        let data = "Comments,Email\nhello,x@example.com\nworld,y@example.com\n";
        let records = parse_csv(Cursor::new(data)).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn csv_header_only_yields_empty() {
        let records = parse_csv(Cursor::new("FirstName,Phone\n")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn csv_short_rows_are_tolerated() {
        let data = "FirstName,Phone,Notes\nAlice,+1111\nBob\n";
        let records = parse_csv(Cursor::new(data)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Alice");
    }

    // -- workbook fixtures ------------------------------------------------

    fn build_workbook(entries: &[(&str, &str)]) -> Cursor<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            let options = zip::write::SimpleFileOptions::default();
            for (name, content) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.set_position(0);
        cursor
    }

    const WORKBOOK_XML: &str = r#"<?xml version="1.0"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
          xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Leads" sheetId="1" r:id="rId7"/>
    <sheet name="Archive" sheetId="2" r:id="rId8"/>
  </sheets>
</workbook>"#;

    const WORKBOOK_RELS: &str = r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId8" Type="ws" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId7" Type="ws" Target="worksheets/sheet2.xml"/>
</Relationships>"#;

    const SHARED_STRINGS: &str = r#"<?xml version="1.0"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="4" uniqueCount="4">
  <si><t>First Name</t></si>
  <si><t>Mobile</t></si>
  <si><t>Notes</t></si>
  <si><r><t>Al</t></r><r><t>ice</t></r></si>
</sst>"#;

    // Headers from shared strings, one shared-string name with text runs,
    // one inline-string name, numeric phones.
    const LEADS_SHEET: &str = r#"<?xml version="1.0"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1">
      <c r="A1" t="s"><v>0</v></c>
      <c r="B1" t="s"><v>1</v></c>
      <c r="C1" t="s"><v>2</v></c>
    </row>
    <row r="2">
      <c r="A2" t="s"><v>3</v></c>
      <c r="B2"><v>15550001</v></c>
      <c r="C2" t="inlineStr"><is><t>priority</t></is></c>
    </row>
    <row r="3">
      <c r="A3" t="inlineStr"><is><t>Bob</t></is></c>
      <c r="B3"><v>15550002</v></c>
    </row>
    <row r="4">
      <c r="B4"><v>15550003</v></c>
    </row>
  </sheetData>
</worksheet>"#;

    const DECOY_SHEET: &str = r#"<?xml version="1.0"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1">
      <c r="A1" t="inlineStr"><is><t>FirstName</t></is></c>
      <c r="B1" t="inlineStr"><is><t>Phone</t></is></c>
    </row>
    <row r="2">
      <c r="A2" t="inlineStr"><is><t>Decoy</t></is></c>
      <c r="B2"><v>999</v></c>
    </row>
  </sheetData>
</worksheet>"#;

    #[test]
    fn workbook_first_declared_sheet_wins() {
        // The manifest declares sheet2.xml (via rId7) first even though
        // sheet1.xml sorts first numerically.
        let cursor = build_workbook(&[
            ("xl/workbook.xml", WORKBOOK_XML),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/sharedStrings.xml", SHARED_STRINGS),
            ("xl/worksheets/sheet1.xml", DECOY_SHEET),
            ("xl/worksheets/sheet2.xml", LEADS_SHEET),
        ]);
        let records = parse_workbook(cursor).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Alice");
        assert_eq!(records[0].phone, "15550001");
        assert_eq!(records[0].notes, "priority");
        assert_eq!(records[1].name, "Bob");
        assert_eq!(records[1].phone, "15550002");
        assert_eq!(records[1].notes, "");
    }

    #[test]
    fn workbook_without_manifest_falls_back_to_lowest_sheet() {
        let cursor = build_workbook(&[("xl/worksheets/sheet1.xml", DECOY_SHEET)]);
        let records = parse_workbook(cursor).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Decoy");
    }

    #[test]
    fn workbook_row_without_name_is_dropped() {
        let cursor = build_workbook(&[
            ("xl/workbook.xml", WORKBOOK_XML),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/sharedStrings.xml", SHARED_STRINGS),
            ("xl/worksheets/sheet2.xml", LEADS_SHEET),
        ]);
        // Row 4 has a phone but no name cell.
        let records = parse_workbook(cursor).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn undecodable_workbook_is_a_parse_error() {
        let err = parse_workbook(Cursor::new(b"not a zip archive".to_vec())).unwrap_err();
        assert!(matches!(err, IngestError::Parse(_)));
    }

    #[test]
    fn empty_archive_is_a_parse_error() {
        let cursor = build_workbook(&[("placeholder.txt", "x")]);
        let err = parse_workbook(cursor).unwrap_err();
        assert!(matches!(err, IngestError::Parse(_)));
    }

    #[test]
    fn column_references_resolve() {
        assert_eq!(column_index("A1").unwrap(), Some(0));
        assert_eq!(column_index("C10").unwrap(), Some(2));
        assert_eq!(column_index("Z3").unwrap(), Some(25));
        assert_eq!(column_index("AA1").unwrap(), Some(26));
        assert_eq!(column_index("BC23").unwrap(), Some(54));
        assert_eq!(column_index("42").unwrap(), None);
    }

    #[test]
    fn column_references_past_sheet_limit_are_rejected() {
        // XFD is the last real column; XFE is one past it.
        assert_eq!(column_index("XFD1").unwrap(), Some(MAX_SHEET_COLUMNS - 1));
        assert!(column_index("XFE1").is_err());
        assert!(column_index("ZZZZZ1").is_err());
        assert!(column_index("AAAAAAAAAAAAAAAAAAAA1").is_err());
    }

    #[test]
    fn forged_cell_reference_is_a_parse_error() {
        // A reference long enough to overflow a naive accumulator and a
        // shorter one that would force a multi-hundred-MB row allocation;
        // both must come back as parse errors, not crash or allocate.
        for forged in ["AAAAAAAAAAAAAAAAAAAA1", "ZZZZZ1"] {
            let sheet = format!(
                r#"<?xml version="1.0"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1">
      <c r="A1" t="inlineStr"><is><t>FirstName</t></is></c>
      <c r="{forged}" t="inlineStr"><is><t>Phone</t></is></c>
    </row>
  </sheetData>
</worksheet>"#
            );
            let cursor = build_workbook(&[("xl/worksheets/sheet1.xml", sheet.as_str())]);
            let err = parse_workbook(cursor).unwrap_err();
            assert!(matches!(err, IngestError::Parse(_)), "ref {forged}: {err:?}");
        }
    }

    #[test]
    fn mid_stream_read_failure_maps_to_io_error() {
        struct CutStream {
            remaining: &'static [u8],
        }

        impl Read for CutStream {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.remaining.is_empty() {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        "stream cut",
                    ));
                }
                let n = self.remaining.len().min(buf.len());
                buf[..n].copy_from_slice(&self.remaining[..n]);
                self.remaining = &self.remaining[n..];
                Ok(n)
            }
        }

        let reader = CutStream {
            remaining: b"FirstName,Phone\nAlice,+1\n",
        };
        let err = parse_csv(reader).unwrap_err();
        assert!(matches!(err, IngestError::Io(_)), "got {err:?}");
    }
}
