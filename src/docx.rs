//! Minimal DOCX reader.
//!
//! Yields the body as an ordered block stream: paragraphs tagged with their
//! heading level, and tables as grids of cells with their shading fill.
//! Only `word/document.xml`, `word/styles.xml` and `[Content_Types].xml`
//! are read.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use zip::ZipArchive;

pub const WORDPROCESSING_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content_type: Option<String>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub heading: Option<u8>,
    pub toc: bool,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|cells| cells.get(column))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub fill: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleInfo {
    pub heading: Option<u8>,
    pub toc: bool,
}

/// MIME type implied by the file extension, the way the CLI boundary
/// validates inputs before reading them.
pub fn guess_mime_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "docx" => Some(WORDPROCESSING_MIME),
        "doc" => Some("application/msword"),
        "txt" => Some("text/plain"),
        "csv" => Some("text/csv"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

pub fn read_document(path: &Path) -> Result<Document> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("failed to open {} as a zip container", path.display()))?;

    let document_xml = read_archive_entry(&mut archive, "word/document.xml")?
        .with_context(|| format!("{} has no word/document.xml", path.display()))?;
    let styles = match read_archive_entry(&mut archive, "word/styles.xml")? {
        Some(xml) => parse_styles_xml(&xml)?,
        None => HashMap::new(),
    };
    let content_type = read_archive_entry(&mut archive, "[Content_Types].xml")?
        .and_then(|xml| main_document_content_type(&xml));

    let blocks = parse_document_xml(&document_xml, &styles)
        .with_context(|| format!("failed to parse body of {}", path.display()))?;

    Ok(Document {
        content_type,
        blocks,
    })
}

fn read_archive_entry(archive: &mut ZipArchive<File>, name: &str) -> Result<Option<String>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(error) => {
            return Err(error).with_context(|| format!("failed to open archive entry {name}"));
        }
    };

    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .with_context(|| format!("failed to read archive entry {name}"))?;
    Ok(Some(content))
}

fn attr_value(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

pub fn parse_styles_xml(xml: &str) -> Result<HashMap<String, StyleInfo>> {
    let heading_pattern =
        Regex::new(r"^heading\s*([1-9])$").context("failed to compile heading style regex")?;

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut styles = HashMap::new();
    let mut current: Option<(String, Option<String>, Option<u8>)> = None;

    loop {
        match reader.read_event().context("malformed styles.xml")? {
            Event::Start(e) if e.name().as_ref() == b"w:style" => {
                current = attr_value(&e, b"w:styleId").map(|id| (id, None, None));
            }
            Event::Start(e) | Event::Empty(e) => {
                let Some((_, name, outline_level)) = current.as_mut() else {
                    continue;
                };
                match e.name().as_ref() {
                    b"w:name" => *name = attr_value(&e, b"w:val"),
                    b"w:outlineLvl" => {
                        *outline_level = attr_value(&e, b"w:val")
                            .and_then(|value| value.parse::<u8>().ok())
                            .filter(|value| *value < 9)
                            .map(|value| value + 1);
                    }
                    _ => {}
                }
            }
            Event::End(e) if e.name().as_ref() == b"w:style" => {
                if let Some((id, name, outline_level)) = current.take() {
                    let info = classify_style(&id, name.as_deref(), outline_level, &heading_pattern);
                    styles.insert(id, info);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(styles)
}

fn classify_style(
    id: &str,
    name: Option<&str>,
    outline_level: Option<u8>,
    heading_pattern: &Regex,
) -> StyleInfo {
    let name_lower = name.unwrap_or(id).trim().to_lowercase();
    let id_lower = id.to_lowercase();

    let level_from = |value: &str| {
        heading_pattern
            .captures(value)
            .and_then(|captures| captures.get(1))
            .and_then(|level| level.as_str().parse::<u8>().ok())
    };

    StyleInfo {
        heading: level_from(&name_lower)
            .or_else(|| level_from(&id_lower))
            .or(outline_level),
        toc: name_lower.contains("toc") || id_lower.starts_with("toc"),
    }
}

fn fallback_style(style_id: &str) -> StyleInfo {
    let lower = style_id.to_lowercase();
    let heading = lower
        .strip_prefix("heading")
        .and_then(|rest| rest.trim().parse::<u8>().ok())
        .filter(|level| (1..=9).contains(level));
    StyleInfo {
        heading,
        toc: lower.starts_with("toc"),
    }
}

fn main_document_content_type(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"Override" => {
                if attr_value(&e, b"PartName").as_deref() == Some("/word/document.xml") {
                    return attr_value(&e, b"ContentType");
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

#[derive(Debug, Default)]
struct CellDraft {
    paragraphs: Vec<String>,
    current: Option<String>,
    fill: Option<String>,
    span: usize,
}

#[derive(Debug, Default)]
struct BodyWalker {
    blocks: Vec<Block>,
    paragraph: Option<(Option<String>, String)>,
    table_depth: usize,
    table: Table,
    row: Option<Vec<Cell>>,
    cell: Option<CellDraft>,
    in_cell_props: bool,
    in_run: bool,
    in_text: bool,
}

impl BodyWalker {
    fn push_text(&mut self, text: &str) {
        if let Some(cell) = self.cell.as_mut() {
            cell.current.get_or_insert_with(String::new).push_str(text);
        } else if let Some((_, paragraph)) = self.paragraph.as_mut() {
            paragraph.push_str(text);
        }
    }

    fn start(&mut self, e: &BytesStart<'_>) {
        match e.name().as_ref() {
            b"w:tbl" => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.table = Table::default();
                }
            }
            b"w:tr" if self.table_depth == 1 => self.row = Some(Vec::new()),
            b"w:tc" if self.table_depth == 1 => {
                self.cell = Some(CellDraft {
                    span: 1,
                    ..CellDraft::default()
                });
            }
            b"w:tcPr" if self.table_depth == 1 => self.in_cell_props = true,
            b"w:p" => self.start_paragraph(),
            b"w:r" => self.in_run = true,
            b"w:t" if self.in_run => self.in_text = true,
            _ => self.empty(e),
        }
    }

    fn empty(&mut self, e: &BytesStart<'_>) {
        match e.name().as_ref() {
            b"w:p" => {
                self.start_paragraph();
                self.end_paragraph();
            }
            b"w:pStyle" if self.table_depth == 0 => {
                if let Some((style, _)) = self.paragraph.as_mut() {
                    *style = attr_value(e, b"w:val");
                }
            }
            b"w:shd" if self.in_cell_props => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.fill = attr_value(e, b"w:fill")
                        .filter(|fill| !fill.eq_ignore_ascii_case("auto"));
                }
            }
            b"w:gridSpan" if self.in_cell_props => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.span = attr_value(e, b"w:val")
                        .and_then(|value| value.parse::<usize>().ok())
                        .unwrap_or(1)
                        .max(1);
                }
            }
            b"w:tab" if self.in_run => self.push_text("\t"),
            b"w:br" | b"w:cr" if self.in_run => self.push_text("\n"),
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8], styles: &HashMap<String, StyleInfo>) {
        match name {
            b"w:tbl" => {
                if self.table_depth == 1 {
                    self.blocks
                        .push(Block::Table(std::mem::take(&mut self.table)));
                }
                self.table_depth = self.table_depth.saturating_sub(1);
            }
            b"w:tr" if self.table_depth == 1 => {
                if let Some(row) = self.row.take() {
                    self.table.rows.push(row);
                }
            }
            b"w:tc" if self.table_depth == 1 => self.end_cell(),
            b"w:tcPr" if self.table_depth == 1 => self.in_cell_props = false,
            b"w:p" => self.end_paragraph_with(styles),
            b"w:r" => self.in_run = false,
            b"w:t" => self.in_text = false,
            _ => {}
        }
    }

    fn start_paragraph(&mut self) {
        if let Some(cell) = self.cell.as_mut() {
            cell.current = Some(String::new());
        } else if self.table_depth == 0 {
            self.paragraph = Some((None, String::new()));
        }
    }

    fn end_paragraph(&mut self) {
        self.end_paragraph_with(&HashMap::new());
    }

    fn end_paragraph_with(&mut self, styles: &HashMap<String, StyleInfo>) {
        if let Some(cell) = self.cell.as_mut() {
            if let Some(text) = cell.current.take() {
                cell.paragraphs.push(text);
            }
            return;
        }
        if self.table_depth > 0 {
            return;
        }
        let Some((style_id, text)) = self.paragraph.take() else {
            return;
        };

        let style = style_id
            .as_deref()
            .map(|id| styles.get(id).cloned().unwrap_or_else(|| fallback_style(id)))
            .unwrap_or_default();

        self.blocks.push(Block::Paragraph(Paragraph {
            heading: style.heading,
            toc: style.toc,
            text,
        }));
    }

    fn end_cell(&mut self) {
        let Some(mut draft) = self.cell.take() else {
            return;
        };
        if let Some(text) = draft.current.take() {
            draft.paragraphs.push(text);
        }
        let cell = Cell {
            text: draft.paragraphs.join("\n"),
            fill: draft.fill,
        };
        if let Some(row) = self.row.as_mut() {
            for _ in 1..draft.span {
                row.push(cell.clone());
            }
            row.push(cell);
        }
    }
}

pub fn parse_document_xml(xml: &str, styles: &HashMap<String, StyleInfo>) -> Result<Vec<Block>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut walker = BodyWalker::default();

    loop {
        match reader.read_event().context("malformed document.xml")? {
            Event::Start(e) => walker.start(&e),
            Event::Empty(e) => walker.empty(&e),
            Event::End(e) => walker.end(e.name().as_ref(), styles),
            Event::Text(e) if walker.in_text => {
                let text = e.unescape().context("invalid text escape in document.xml")?;
                walker.push_text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(walker.blocks)
}
