//! Document part parsing (word/document.xml, headers, footers)
//!
//! This module parses a WordprocessingML part into an owned block
//! tree the fill engine can mutate. Only the node kinds the engine
//! works on (paragraphs, runs, text fragments, tables, rows, cells)
//! are modelled; everything else (hyperlinks, bookmarks, drawings,
//! section properties) is captured verbatim as raw XML so writing
//! the tree back does not disturb it. Element properties (pPr, rPr,
//! tblPr, ...) and start-tag attributes are preserved the same way.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{FillError, Result};

/// A parsed document part
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Root element name as written, e.g. "w:document" or "w:hdr"
    pub(crate) root_name: String,
    /// Root element attributes, verbatim (namespace declarations live here)
    pub(crate) root_attrs: String,
    /// The w:body wrapper, when the part has one (headers/footers do not)
    pub(crate) body: Option<(String, String)>,
    /// Block-level content
    pub blocks: Vec<Block>,
}

/// Block-level elements
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// A paragraph
    Paragraph(Paragraph),
    /// A table
    Table(Table),
    /// Verbatim passthrough (sectPr, sdt, bookmarks at block level)
    Raw(String),
}

/// A paragraph: an ordered sequence of runs plus passthrough children
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    /// Start-tag attributes, verbatim
    pub attrs: String,
    /// Raw `<w:pPr>...</w:pPr>` element, verbatim
    pub props: Option<String>,
    /// Children in document order
    pub children: Vec<ParagraphChild>,
}

/// Child elements of a paragraph
#[derive(Debug, Clone, PartialEq)]
pub enum ParagraphChild {
    /// A formatting run
    Run(Run),
    /// Verbatim passthrough (hyperlinks, bookmarks, field chars)
    Raw(String),
}

/// A formatting run: text fragments plus passthrough content
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    /// Start-tag attributes, verbatim
    pub attrs: String,
    /// Raw `<w:rPr>...</w:rPr>` element, verbatim
    pub props: Option<String>,
    /// Content in document order
    pub content: Vec<RunChild>,
}

/// Content of a run
#[derive(Debug, Clone, PartialEq)]
pub enum RunChild {
    /// A literal text fragment (w:t)
    Text(TextFragment),
    /// Verbatim passthrough (tabs, breaks, drawings)
    Raw(String),
}

/// The smallest unit of literal text within a run
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    /// Unescaped text content
    pub text: String,
    /// Whether xml:space="preserve" is set
    pub preserve_space: bool,
}

/// A table
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Stable id assigned at parse time, copied by row cloning
    pub id: u32,
    /// Start-tag attributes, verbatim
    pub attrs: String,
    /// Raw `<w:tblPr>...</w:tblPr>` element, verbatim
    pub props: Option<String>,
    /// Raw `<w:tblGrid>...</w:tblGrid>` element, verbatim
    pub grid: Option<String>,
    /// Other non-row table children, verbatim
    pub extras: Vec<String>,
    /// Table rows in document order
    pub rows: Vec<Row>,
}

/// A table row
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Start-tag attributes, verbatim
    pub attrs: String,
    /// Raw `<w:trPr>...</w:trPr>` element, verbatim
    pub props: Option<String>,
    /// Other non-cell row children, verbatim
    pub extras: Vec<String>,
    /// Cells in document order
    pub cells: Vec<Cell>,
}

/// A table cell holding paragraphs and nested tables
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Start-tag attributes, verbatim
    pub attrs: String,
    /// Raw `<w:tcPr>...</w:tcPr>` element, verbatim
    pub props: Option<String>,
    /// Cell content blocks
    pub blocks: Vec<Block>,
}

impl Document {
    /// Parse a document part from XML bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        // Don't trim text - preserve whitespace in fragments
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut next_table_id: u32 = 1;

        // Root element (w:document, w:hdr, w:ftr, ...)
        let root = loop {
            let found = match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => Some(StartTag::from_event(e)),
                Event::Eof => {
                    return Err(FillError::InvalidStructure(
                        "document part has no root element".to_string(),
                    ))
                }
                _ => None,
            };
            buf.clear();
            if let Some(tag) = found {
                break tag;
            }
        };

        let mut body: Option<(String, String)> = None;
        let mut blocks = Vec::new();

        loop {
            let step = match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    if body.is_none() && e.local_name().as_ref() == b"body" {
                        PartStep::Body(StartTag::from_event(e))
                    } else {
                        PartStep::Block(StartTag::from_event(e))
                    }
                }
                Event::Empty(ref e) => PartStep::RawBlock(empty_tag(e)),
                Event::End(_) => PartStep::Done,
                Event::Eof => {
                    return Err(FillError::InvalidStructure(
                        "unexpected end of document part".to_string(),
                    ))
                }
                _ => PartStep::Skip,
            };
            buf.clear();

            match step {
                PartStep::Body(tag) => {
                    blocks = parse_blocks(&mut reader, &mut buf, b"body", &mut next_table_id)?;
                    body = Some((tag.name, tag.attrs));
                }
                PartStep::Block(tag) => {
                    blocks.push(parse_block(&mut reader, &mut buf, tag, &mut next_table_id)?);
                }
                PartStep::RawBlock(raw) => blocks.push(Block::Raw(raw)),
                PartStep::Done => break,
                PartStep::Skip => {}
            }
        }

        Ok(Document {
            root_name: root.name,
            root_attrs: root.attrs,
            body,
            blocks,
        })
    }

    /// Get all paragraphs, flattening tables, in document order
    pub fn paragraphs(&self) -> Vec<&Paragraph> {
        let mut out = Vec::new();
        collect_paragraphs(&self.blocks, &mut out);
        out
    }

    /// Get plain text content of the whole part
    pub fn plain_text(&self) -> String {
        self.paragraphs()
            .iter()
            .map(|p| p.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Paragraph {
    /// Visible text of this paragraph: the concatenation of its direct
    /// run fragments. Passthrough children contribute nothing, matching
    /// what the run merger is able to merge.
    pub fn plain_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                ParagraphChild::Run(run) => Some(run.plain_text()),
                ParagraphChild::Raw(_) => None,
            })
            .collect()
    }

    /// Iterate over the text fragments of direct runs
    pub fn fragments(&self) -> impl Iterator<Item = &TextFragment> {
        self.children.iter().flat_map(|child| match child {
            ParagraphChild::Run(run) => run
                .content
                .iter()
                .filter_map(|c| match c {
                    RunChild::Text(t) => Some(t),
                    RunChild::Raw(_) => None,
                })
                .collect::<Vec<_>>(),
            ParagraphChild::Raw(_) => Vec::new(),
        })
    }

    /// Mutable variant of [`Paragraph::fragments`]
    pub fn fragments_mut(&mut self) -> impl Iterator<Item = &mut TextFragment> {
        self.children.iter_mut().flat_map(|child| match child {
            ParagraphChild::Run(run) => run
                .content
                .iter_mut()
                .filter_map(|c| match c {
                    RunChild::Text(t) => Some(t),
                    RunChild::Raw(_) => None,
                })
                .collect::<Vec<_>>(),
            ParagraphChild::Raw(_) => Vec::new(),
        })
    }
}

impl Run {
    /// Concatenated fragment text of this run
    pub fn plain_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                RunChild::Text(t) => Some(t.text.as_str()),
                RunChild::Raw(_) => None,
            })
            .collect()
    }
}

impl Row {
    /// Visible text of every paragraph in this row, including nested tables
    pub fn plain_text(&self) -> String {
        let mut paragraphs = Vec::new();
        for cell in &self.cells {
            collect_paragraphs(&cell.blocks, &mut paragraphs);
        }
        paragraphs.iter().map(|p| p.plain_text()).collect()
    }

    /// All paragraphs in this row, nested tables included
    pub fn paragraphs_mut(&mut self) -> Vec<&mut Paragraph> {
        let mut out = Vec::new();
        for cell in self.cells.iter_mut() {
            collect_paragraphs_mut(&mut cell.blocks, &mut out);
        }
        out
    }

    /// Paragraphs directly inside this row's cells, nested tables excluded
    pub fn direct_paragraphs_mut(&mut self) -> Vec<&mut Paragraph> {
        let mut out = Vec::new();
        for cell in self.cells.iter_mut() {
            for block in cell.blocks.iter_mut() {
                if let Block::Paragraph(p) = block {
                    out.push(p);
                }
            }
        }
        out
    }
}

fn collect_paragraphs<'a>(blocks: &'a [Block], out: &mut Vec<&'a Paragraph>) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => out.push(p),
            Block::Table(t) => {
                for row in &t.rows {
                    for cell in &row.cells {
                        collect_paragraphs(&cell.blocks, out);
                    }
                }
            }
            Block::Raw(_) => {}
        }
    }
}

fn collect_paragraphs_mut<'a>(blocks: &'a mut [Block], out: &mut Vec<&'a mut Paragraph>) {
    for block in blocks.iter_mut() {
        match block {
            Block::Paragraph(p) => out.push(p),
            Block::Table(t) => {
                for row in t.rows.iter_mut() {
                    for cell in row.cells.iter_mut() {
                        collect_paragraphs_mut(&mut cell.blocks, out);
                    }
                }
            }
            Block::Raw(_) => {}
        }
    }
}

// Parsing internals

/// Owned copy of a start tag, taken before the event buffer is reused
struct StartTag {
    name: String,
    attrs: String,
    local: Vec<u8>,
}

impl StartTag {
    fn from_event(e: &BytesStart) -> Self {
        Self {
            name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
            attrs: raw_attrs(e),
            local: e.local_name().as_ref().to_vec(),
        }
    }

    fn open(&self) -> String {
        format!("<{}{}>", self.name, self.attrs)
    }
}

enum PartStep {
    Body(StartTag),
    Block(StartTag),
    RawBlock(String),
    Done,
    Skip,
}

enum Step {
    Start(StartTag),
    Empty(StartTag, String),
    End(Vec<u8>),
    Skip,
}

fn next_step<R: std::io::BufRead>(reader: &mut Reader<R>, buf: &mut Vec<u8>) -> Result<Step> {
    let step = match reader.read_event_into(buf)? {
        Event::Start(ref e) => Step::Start(StartTag::from_event(e)),
        Event::Empty(ref e) => Step::Empty(StartTag::from_event(e), empty_tag(e)),
        Event::End(ref e) => Step::End(e.local_name().as_ref().to_vec()),
        Event::Eof => {
            return Err(FillError::InvalidStructure(
                "unexpected end of document part".to_string(),
            ))
        }
        _ => Step::Skip,
    };
    buf.clear();
    Ok(step)
}

fn parse_block<R: std::io::BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    start: StartTag,
    ids: &mut u32,
) -> Result<Block> {
    match start.local.as_slice() {
        b"p" => Ok(Block::Paragraph(parse_paragraph(reader, buf, start)?)),
        b"tbl" => Ok(Block::Table(parse_table(reader, buf, start, ids)?)),
        _ => Ok(Block::Raw(capture_element(reader, buf, start)?)),
    }
}

fn parse_blocks<R: std::io::BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    end_local: &[u8],
    ids: &mut u32,
) -> Result<Vec<Block>> {
    let mut blocks = Vec::new();
    loop {
        match next_step(reader, buf)? {
            Step::Start(tag) => blocks.push(parse_block(reader, buf, tag, ids)?),
            Step::Empty(_, raw) => blocks.push(Block::Raw(raw)),
            Step::End(local) if local == end_local => return Ok(blocks),
            Step::End(_) | Step::Skip => {}
        }
    }
}

fn parse_paragraph<R: std::io::BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    start: StartTag,
) -> Result<Paragraph> {
    let mut para = Paragraph {
        attrs: start.attrs,
        props: None,
        children: Vec::new(),
    };
    loop {
        match next_step(reader, buf)? {
            Step::Start(tag) => match tag.local.as_slice() {
                b"pPr" => para.props = Some(capture_element(reader, buf, tag)?),
                b"r" => {
                    let run = parse_run(reader, buf, tag)?;
                    para.children.push(ParagraphChild::Run(run));
                }
                _ => {
                    let raw = capture_element(reader, buf, tag)?;
                    para.children.push(ParagraphChild::Raw(raw));
                }
            },
            Step::Empty(tag, raw) => match tag.local.as_slice() {
                b"pPr" => para.props = Some(raw),
                _ => para.children.push(ParagraphChild::Raw(raw)),
            },
            Step::End(local) if local == b"p" => return Ok(para),
            Step::End(_) | Step::Skip => {}
        }
    }
}

fn parse_run<R: std::io::BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    start: StartTag,
) -> Result<Run> {
    let mut run = Run {
        attrs: start.attrs,
        props: None,
        content: Vec::new(),
    };
    loop {
        match next_step(reader, buf)? {
            Step::Start(tag) => match tag.local.as_slice() {
                b"rPr" => run.props = Some(capture_element(reader, buf, tag)?),
                b"t" => {
                    let preserve = tag.attrs.contains("xml:space=\"preserve\"");
                    let text = read_text(reader, buf)?;
                    run.content.push(RunChild::Text(TextFragment {
                        text,
                        preserve_space: preserve,
                    }));
                }
                _ => {
                    let raw = capture_element(reader, buf, tag)?;
                    run.content.push(RunChild::Raw(raw));
                }
            },
            Step::Empty(tag, raw) => match tag.local.as_slice() {
                b"rPr" => run.props = Some(raw),
                b"t" => run.content.push(RunChild::Text(TextFragment {
                    text: String::new(),
                    preserve_space: tag.attrs.contains("xml:space=\"preserve\""),
                })),
                _ => run.content.push(RunChild::Raw(raw)),
            },
            Step::End(local) if local == b"r" => return Ok(run),
            Step::End(_) | Step::Skip => {}
        }
    }
}

/// Accumulate the text content of a w:t element up to its end tag
fn read_text<R: std::io::BufRead>(reader: &mut Reader<R>, buf: &mut Vec<u8>) -> Result<String> {
    let mut text = String::new();
    loop {
        let done = match reader.read_event_into(buf)? {
            Event::Text(ref e) => {
                text.push_str(&e.unescape().unwrap_or_default());
                false
            }
            Event::CData(ref e) => {
                text.push_str(&String::from_utf8_lossy(e));
                false
            }
            Event::End(_) => true,
            Event::Eof => {
                return Err(FillError::InvalidStructure(
                    "unterminated text element".to_string(),
                ))
            }
            _ => false,
        };
        buf.clear();
        if done {
            return Ok(text);
        }
    }
}

fn parse_table<R: std::io::BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    start: StartTag,
    ids: &mut u32,
) -> Result<Table> {
    let id = *ids;
    *ids += 1;
    let mut table = Table {
        id,
        attrs: start.attrs,
        props: None,
        grid: None,
        extras: Vec::new(),
        rows: Vec::new(),
    };
    loop {
        match next_step(reader, buf)? {
            Step::Start(tag) => match tag.local.as_slice() {
                b"tblPr" => table.props = Some(capture_element(reader, buf, tag)?),
                b"tblGrid" => table.grid = Some(capture_element(reader, buf, tag)?),
                b"tr" => {
                    let row = parse_row(reader, buf, tag, ids)?;
                    table.rows.push(row);
                }
                _ => table.extras.push(capture_element(reader, buf, tag)?),
            },
            Step::Empty(tag, raw) => match tag.local.as_slice() {
                b"tblPr" => table.props = Some(raw),
                b"tblGrid" => table.grid = Some(raw),
                _ => table.extras.push(raw),
            },
            Step::End(local) if local == b"tbl" => return Ok(table),
            Step::End(_) | Step::Skip => {}
        }
    }
}

fn parse_row<R: std::io::BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    start: StartTag,
    ids: &mut u32,
) -> Result<Row> {
    let mut row = Row {
        attrs: start.attrs,
        props: None,
        extras: Vec::new(),
        cells: Vec::new(),
    };
    loop {
        match next_step(reader, buf)? {
            Step::Start(tag) => match tag.local.as_slice() {
                b"trPr" => row.props = Some(capture_element(reader, buf, tag)?),
                b"tc" => {
                    let cell = parse_cell(reader, buf, tag, ids)?;
                    row.cells.push(cell);
                }
                _ => row.extras.push(capture_element(reader, buf, tag)?),
            },
            Step::Empty(tag, raw) => match tag.local.as_slice() {
                b"trPr" => row.props = Some(raw),
                _ => row.extras.push(raw),
            },
            Step::End(local) if local == b"tr" => return Ok(row),
            Step::End(_) | Step::Skip => {}
        }
    }
}

fn parse_cell<R: std::io::BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    start: StartTag,
    ids: &mut u32,
) -> Result<Cell> {
    let mut cell = Cell {
        attrs: start.attrs,
        props: None,
        blocks: Vec::new(),
    };
    loop {
        match next_step(reader, buf)? {
            Step::Start(tag) => match tag.local.as_slice() {
                b"tcPr" => cell.props = Some(capture_element(reader, buf, tag)?),
                _ => cell.blocks.push(parse_block(reader, buf, tag, ids)?),
            },
            Step::Empty(tag, raw) => match tag.local.as_slice() {
                b"tcPr" => cell.props = Some(raw),
                _ => cell.blocks.push(Block::Raw(raw)),
            },
            Step::End(local) if local == b"tc" => return Ok(cell),
            Step::End(_) | Step::Skip => {}
        }
    }
}

/// Capture an element and its whole subtree verbatim, starting from an
/// already-consumed start tag
fn capture_element<R: std::io::BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    start: StartTag,
) -> Result<String> {
    let mut out = start.open();
    let mut depth = 1usize;
    loop {
        let done = match reader.read_event_into(buf)? {
            Event::Start(ref e) => {
                out.push('<');
                out.push_str(&String::from_utf8_lossy(e.name().as_ref()));
                out.push_str(&raw_attrs(e));
                out.push('>');
                depth += 1;
                false
            }
            Event::Empty(ref e) => {
                out.push_str(&empty_tag(e));
                false
            }
            Event::End(ref e) => {
                depth -= 1;
                out.push_str("</");
                out.push_str(&String::from_utf8_lossy(e.name().as_ref()));
                out.push('>');
                depth == 0
            }
            Event::Text(ref e) => {
                // raw bytes keep the source escaping
                out.push_str(&String::from_utf8_lossy(e));
                false
            }
            Event::CData(ref e) => {
                out.push_str("<![CDATA[");
                out.push_str(&String::from_utf8_lossy(e));
                out.push_str("]]>");
                false
            }
            Event::Comment(ref e) => {
                out.push_str("<!--");
                out.push_str(&String::from_utf8_lossy(e));
                out.push_str("-->");
                false
            }
            Event::Eof => {
                return Err(FillError::InvalidStructure(format!(
                    "unterminated element <{}>",
                    start.name
                )))
            }
            _ => false,
        };
        buf.clear();
        if done {
            return Ok(out);
        }
    }
}

fn empty_tag(e: &BytesStart) -> String {
    format!(
        "<{}{}/>",
        String::from_utf8_lossy(e.name().as_ref()),
        raw_attrs(e)
    )
}

/// Reassemble the attribute list of a start tag, verbatim
fn raw_attrs(e: &BytesStart) -> String {
    let mut out = String::new();
    for attr in e.attributes().filter_map(|a| a.ok()) {
        out.push(' ');
        out.push_str(&String::from_utf8_lossy(attr.key.as_ref()));
        out.push_str("=\"");
        out.push_str(&String::from_utf8_lossy(&attr.value));
        out.push('"');
    }
    out
}
