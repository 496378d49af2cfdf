//! Table classification
//!
//! A table is bound to a band by a `##band=Name` marker in its first
//! row. Classification runs as a separate walk before any filling, so
//! every table, including tables nested in rows that will later be
//! cloned, is registered under its parse-time id first. The marker
//! text is stripped during classification; the marker row itself
//! stays.

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use crate::alias::{find_band_declaration, universal_pattern};
use crate::document::{Paragraph, Row, Table};
use crate::error::{FillError, Result};
use crate::merge::TextMerger;
use crate::walker::{Flow, Visitor};

/// Expansion plan for one band-bound table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableManager {
    /// Parse-time table id
    pub table_id: u32,
    /// Band the table rows iterate over
    pub band_name: String,
    /// Index of the row to clone per band instance, when one exists
    pub template_row: Option<usize>,
}

/// Visitor that registers band-bound tables by id
#[derive(Default)]
pub struct TableCollector {
    registry: HashMap<u32, TableManager>,
    stack: Vec<TableState>,
}

struct TableState {
    manager: Option<TableManager>,
    rows_seen: usize,
}

impl TableCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the collector, yielding table id -> expansion plan
    pub fn into_registry(self) -> HashMap<u32, TableManager> {
        self.registry
    }
}

impl Visitor for TableCollector {
    fn enter_table(&mut self, _table: &mut Table) -> Result<Flow> {
        self.stack.push(TableState {
            manager: None,
            rows_seen: 0,
        });
        Ok(Flow::Continue)
    }

    fn visit_row(&mut self, row: &mut Row) -> Result<Flow> {
        let depth = self.stack.len().saturating_sub(1);
        let state = match self.stack.last_mut() {
            Some(state) => state,
            None => {
                return Err(FillError::InvalidStructure(
                    "row visited outside a table".to_string(),
                ))
            }
        };
        let index = state.rows_seen;
        state.rows_seen += 1;

        if index == 0 {
            match find_band_declaration(&row.plain_text()) {
                Some((marker, band_name)) => {
                    strip_marker(row, &marker)?;
                    debug!(band = %band_name, depth, "table bound to band");
                    state.manager = Some(TableManager {
                        table_id: 0, // assigned in leave_table
                        band_name,
                        template_row: None,
                    });
                }
                None => return Ok(Flow::Continue),
            }
        }

        // the marker row itself may carry the aliases once stripped
        if let Some(manager) = state.manager.as_mut() {
            if manager.template_row.is_none() && universal_pattern().is_match(&row.plain_text()) {
                manager.template_row = Some(index);
            }
        }
        Ok(Flow::Continue)
    }

    fn leave_table(&mut self, table: &Table) -> Result<()> {
        let state = match self.stack.pop() {
            Some(state) => state,
            None => {
                return Err(FillError::InvalidStructure(
                    "table left without matching enter".to_string(),
                ))
            }
        };
        if let Some(mut manager) = state.manager {
            manager.table_id = table.id;
            self.registry.insert(table.id, manager);
        }
        Ok(())
    }
}

/// Remove a band marker from the row text. The marker may be split
/// across fragments, so it is merged into one fragment first.
fn strip_marker(row: &mut Row, marker: &str) -> Result<()> {
    let pattern = Regex::new(&regex::escape(marker))
        .map_err(|e| FillError::InvalidStructure(format!("band marker [{marker}]: {e}")))?;
    let merger = TextMerger::new(&pattern);
    for paragraph in row.paragraphs_mut() {
        if !paragraph.plain_text().contains(marker) {
            continue;
        }
        merger.merge(paragraph);
        remove_text(paragraph, marker);
    }
    Ok(())
}

fn remove_text(paragraph: &mut Paragraph, needle: &str) {
    for fragment in paragraph.fragments_mut() {
        if fragment.text.contains(needle) {
            fragment.text = fragment.text.replace(needle, "");
        }
    }
}
