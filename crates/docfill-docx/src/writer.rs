//! Document part serialization
//!
//! Writes a parsed block tree back to WordprocessingML. Raw nodes,
//! property elements and attribute lists were captured verbatim at
//! parse time, so a part that the fill engine never touched
//! round-trips to structurally identical XML.

use quick_xml::escape::escape;

use crate::document::{
    Block, Cell, Document, Paragraph, ParagraphChild, Row, Run, RunChild, Table, TextFragment,
};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Serialize a document part to XML text
pub fn write_document(doc: &Document) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(XML_DECLARATION);
    out.push_str(&format!("<{}{}>", doc.root_name, doc.root_attrs));
    if let Some((body_name, body_attrs)) = &doc.body {
        out.push_str(&format!("<{body_name}{body_attrs}>"));
        for block in &doc.blocks {
            write_block(&mut out, block);
        }
        out.push_str(&format!("</{body_name}>"));
    } else {
        for block in &doc.blocks {
            write_block(&mut out, block);
        }
    }
    out.push_str(&format!("</{}>", doc.root_name));
    out
}

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Paragraph(p) => write_paragraph(out, p),
        Block::Table(t) => write_table(out, t),
        Block::Raw(raw) => out.push_str(raw),
    }
}

fn write_paragraph(out: &mut String, para: &Paragraph) {
    out.push_str(&format!("<w:p{}>", para.attrs));
    if let Some(props) = &para.props {
        out.push_str(props);
    }
    for child in &para.children {
        match child {
            ParagraphChild::Run(run) => write_run(out, run),
            ParagraphChild::Raw(raw) => out.push_str(raw),
        }
    }
    out.push_str("</w:p>");
}

fn write_run(out: &mut String, run: &Run) {
    out.push_str(&format!("<w:r{}>", run.attrs));
    if let Some(props) = &run.props {
        out.push_str(props);
    }
    for child in &run.content {
        match child {
            RunChild::Text(t) => write_fragment(out, t),
            RunChild::Raw(raw) => out.push_str(raw),
        }
    }
    out.push_str("</w:r>");
}

fn write_fragment(out: &mut String, fragment: &TextFragment) {
    // Word drops unmarked edge whitespace, so mark it whenever the
    // text needs it, not only when the source did
    let edges_whitespace = fragment
        .text
        .chars()
        .next()
        .map(|c| c.is_whitespace())
        .unwrap_or(false)
        || fragment
            .text
            .chars()
            .last()
            .map(|c| c.is_whitespace())
            .unwrap_or(false);
    if fragment.preserve_space || edges_whitespace {
        out.push_str(r#"<w:t xml:space="preserve">"#);
    } else {
        out.push_str("<w:t>");
    }
    out.push_str(&escape(fragment.text.as_str()));
    out.push_str("</w:t>");
}

fn write_table(out: &mut String, table: &Table) {
    out.push_str(&format!("<w:tbl{}>", table.attrs));
    if let Some(props) = &table.props {
        out.push_str(props);
    }
    if let Some(grid) = &table.grid {
        out.push_str(grid);
    }
    for extra in &table.extras {
        out.push_str(extra);
    }
    for row in &table.rows {
        write_row(out, row);
    }
    out.push_str("</w:tbl>");
}

fn write_row(out: &mut String, row: &Row) {
    out.push_str(&format!("<w:tr{}>", row.attrs));
    if let Some(props) = &row.props {
        out.push_str(props);
    }
    for extra in &row.extras {
        out.push_str(extra);
    }
    for cell in &row.cells {
        write_cell(out, cell);
    }
    out.push_str("</w:tr>");
}

fn write_cell(out: &mut String, cell: &Cell) {
    out.push_str(&format!("<w:tc{}>", cell.attrs));
    if let Some(props) = &cell.props {
        out.push_str(props);
    }
    for block in &cell.blocks {
        write_block(out, block);
    }
    out.push_str("</w:tc>");
}
