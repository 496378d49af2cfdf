//! The fill engine
//!
//! Rendering runs in phases over each document part. Tables are
//! classified first, so every band-bound table is known before any
//! row is cloned. The fill walk then expands band tables, filling
//! each cloned row against its band instance, and substitutes the
//! remaining aliases against the data tree root. Headers and footers
//! carry no band tables and get alias substitution only.

use std::collections::HashMap;
use std::io::Cursor;

use docfill_band::BandData;
use tracing::{debug, trace};

use crate::alias::{find_occurrences, universal_pattern, AliasToken};
use crate::document::{Document, Paragraph, Row, Table, TextFragment};
use crate::error::{FillError, Result};
use crate::format::format_value;
use crate::inline::ContentInliner;
use crate::merge::TextMerger;
use crate::table::{TableCollector, TableManager};
use crate::template::Template;
use crate::walker::{walk_blocks, Flow, Visitor};
use crate::writer::write_document;

/// Fills DOCX report templates from band data
#[derive(Default)]
pub struct DocxFiller {
    inliners: Vec<Box<dyn ContentInliner>>,
}

impl DocxFiller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a content inliner. Inliners are probed in registration
    /// order against field formats during document-phase substitution.
    pub fn register_inliner(&mut self, inliner: Box<dyn ContentInliner>) {
        self.inliners.push(inliner);
    }

    /// Render a template against a data tree, returning DOCX bytes.
    /// Errors are wrapped with the template name.
    pub fn render(&self, template: &Template, data: &BandData) -> Result<Vec<u8>> {
        self.render_parts(template, data)
            .map_err(|e| e.in_document(template.name()))
    }

    fn render_parts(&self, template: &Template, data: &BandData) -> Result<Vec<u8>> {
        debug!(template = %template.name(), "rendering report");
        let mut archive = template.archive().clone();

        for part in archive.fillable_parts() {
            let Some(xml) = archive.get(&part) else {
                continue;
            };
            let mut doc = Document::parse(xml)?;
            if part == "word/document.xml" {
                self.fill_document(&mut doc, data)?;
            } else {
                // headers and footers: aliases only, no band tables
                self.fill_aliases(&mut doc, data)?;
            }
            archive.set(part, write_document(&doc).into_bytes());
        }

        let mut buffer = Cursor::new(Vec::new());
        archive.write_to(&mut buffer)?;
        Ok(buffer.into_inner())
    }

    /// Fill a parsed main document part in place
    pub fn fill_document(&self, doc: &mut Document, data: &BandData) -> Result<()> {
        let mut collector = TableCollector::new();
        walk_blocks(&mut doc.blocks, &mut collector)?;
        let registry = collector.into_registry();

        let mut visitor = FillVisitor {
            filler: self,
            registry: &registry,
            root: data,
            band_table_depth: 0,
        };
        walk_blocks(&mut doc.blocks, &mut visitor)
    }

    /// Substitute aliases only, without table expansion
    pub fn fill_aliases(&self, doc: &mut Document, data: &BandData) -> Result<()> {
        let registry = HashMap::new();
        let mut visitor = FillVisitor {
            filler: self,
            registry: &registry,
            root: data,
            band_table_depth: 0,
        };
        walk_blocks(&mut doc.blocks, &mut visitor)
    }

    /// Document-phase substitution: every alias resolves from the
    /// root. Inside rows of band-bound tables (`in_band_table`) the
    /// row phase owns bare aliases, so bare and malformed tokens stay
    /// literal there instead of aborting.
    fn fill_paragraph(
        &self,
        paragraph: &mut Paragraph,
        root: &BandData,
        in_band_table: bool,
    ) -> Result<()> {
        if !universal_pattern().is_match(&paragraph.plain_text()) {
            return Ok(());
        }
        TextMerger::new(universal_pattern()).merge(paragraph);

        for fragment in paragraph.fragments_mut() {
            self.fill_fragment(fragment, root, in_band_table)?;
        }
        Ok(())
    }

    fn fill_fragment(
        &self,
        fragment: &mut TextFragment,
        root: &BandData,
        in_band_table: bool,
    ) -> Result<()> {
        for occurrence in find_occurrences(&fragment.text) {
            let token = match AliasToken::parse(&occurrence.inner, occurrence.transform.as_deref())
            {
                Ok(token) => token,
                Err(_) if in_band_table => continue,
                Err(e) => return Err(e),
            };
            if in_band_table && token.band_path.is_empty() {
                continue;
            }

            let band = if token.band_path.is_empty() {
                root
            } else {
                root.find_by_path(&token.band_path)
                    .ok_or_else(|| FillError::BandNotFound(token.path_str()))?
            };
            let value = band.parameter(&token.parameter_name).ok_or_else(|| {
                FillError::ParameterMissing {
                    band: band.name().to_string(),
                    parameter: token.parameter_name.clone(),
                }
            })?;

            let full_name = band.full_name(&token.parameter_name);
            let format = root.field_format(&full_name);
            trace!(alias = %occurrence.full, band = %band.name(), "resolving alias");

            if let Some(format) = format {
                if !value.is_null() {
                    let mut claimed = false;
                    for inliner in &self.inliners {
                        if let Some(captures) = inliner.tag_pattern().captures(format) {
                            inliner.inline(value, fragment, &captures)?;
                            claimed = true;
                            break;
                        }
                    }
                    // an inliner owns the whole fragment once it claims it
                    if claimed {
                        return Ok(());
                    }
                }
            }

            let text = format_value(value, token.transform.as_deref(), format)?;
            fragment.text = fragment.text.replace(&occurrence.full, &text);
            fragment.preserve_space = true;
        }
        Ok(())
    }

    /// Row-phase substitution against one band instance. Only aliases
    /// without an explicit path are handled here; pathed aliases and
    /// nested tables are left to the document phase.
    fn fill_row(&self, row: &mut Row, band: &BandData, root: &BandData) -> Result<()> {
        let merger = TextMerger::new(universal_pattern());
        for paragraph in row.direct_paragraphs_mut() {
            if !universal_pattern().is_match(&paragraph.plain_text()) {
                continue;
            }
            merger.merge(paragraph);

            for fragment in paragraph.fragments_mut() {
                for occurrence in find_occurrences(&fragment.text) {
                    let Ok(token) =
                        AliasToken::parse(&occurrence.inner, occurrence.transform.as_deref())
                    else {
                        // malformed text in a cloned row is left as-is
                        continue;
                    };
                    if !token.band_path.is_empty() {
                        continue;
                    }
                    let value = band.parameter(&token.parameter_name).ok_or_else(|| {
                        FillError::ParameterMissing {
                            band: band.name().to_string(),
                            parameter: token.parameter_name.clone(),
                        }
                    })?;

                    let full_name = band.full_name(&token.parameter_name);
                    let format = root.field_format(&full_name);
                    let text = format_value(value, token.transform.as_deref(), format)?;
                    fragment.text = fragment.text.replace(&occurrence.full, &text);
                    fragment.preserve_space = true;
                }
            }
        }
        Ok(())
    }
}

/// The fill walk: expands band tables and substitutes aliases
struct FillVisitor<'a> {
    filler: &'a DocxFiller,
    registry: &'a HashMap<u32, TableManager>,
    root: &'a BandData,
    /// How many registered band tables enclose the current node
    band_table_depth: usize,
}

impl Visitor for FillVisitor<'_> {
    fn visit_paragraph(&mut self, paragraph: &mut Paragraph) -> Result<Flow> {
        let in_band_table = self.band_table_depth > 0;
        self.filler.fill_paragraph(paragraph, self.root, in_band_table)?;
        Ok(Flow::Continue)
    }

    fn enter_table(&mut self, table: &mut Table) -> Result<Flow> {
        let Some(manager) = self.registry.get(&table.id) else {
            return Ok(Flow::Continue);
        };
        self.band_table_depth += 1;
        let Some(template_idx) = manager.template_row else {
            return Ok(Flow::Continue);
        };

        let bands = self.root.find_recursively(&manager.band_name);
        debug!(
            band = %manager.band_name,
            table = table.id,
            instances = bands.len(),
            "expanding table rows"
        );

        let template_row = table.rows[template_idx].clone();
        let mut filled = Vec::with_capacity(bands.len());
        for band in bands {
            let mut row = template_row.clone();
            self.filler.fill_row(&mut row, band, self.root)?;
            filled.push(row);
        }
        // the template row is consumed; zero instances remove it
        table.rows.splice(template_idx..=template_idx, filled);
        Ok(Flow::Continue)
    }

    fn leave_table(&mut self, table: &Table) -> Result<()> {
        if self.registry.contains_key(&table.id) {
            self.band_table_depth -= 1;
        }
        Ok(())
    }
}
