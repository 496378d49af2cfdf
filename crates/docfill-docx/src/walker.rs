//! Mutable pre-order traversal over block trees
//!
//! Both table classification and filling are expressed as visitors
//! over the same walk, so nested tables reached through expanded rows
//! are visited exactly once each.

use crate::document::{Block, Paragraph, Row, Table};
use crate::error::Result;

/// Controls descent from a visitor callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Descend into children as usual
    Continue,
    /// Skip the children of the current node
    SkipChildren,
}

/// Callbacks for a mutable walk over blocks
pub trait Visitor {
    /// Called for every paragraph
    fn visit_paragraph(&mut self, _paragraph: &mut Paragraph) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    /// Called when a table is entered, before its rows are visited.
    /// The visitor may add or remove rows here.
    fn enter_table(&mut self, _table: &mut Table) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    /// Called for every row of a visited table
    fn visit_row(&mut self, _row: &mut Row) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    /// Called after the rows of a table have been visited
    fn leave_table(&mut self, _table: &Table) -> Result<()> {
        Ok(())
    }
}

/// Walk blocks in document order, visiting paragraphs and tables
pub fn walk_blocks<V: Visitor>(blocks: &mut [Block], visitor: &mut V) -> Result<()> {
    for block in blocks.iter_mut() {
        match block {
            Block::Paragraph(p) => {
                visitor.visit_paragraph(p)?;
            }
            Block::Table(t) => walk_table(t, visitor)?,
            Block::Raw(_) => {}
        }
    }
    Ok(())
}

fn walk_table<V: Visitor>(table: &mut Table, visitor: &mut V) -> Result<()> {
    if visitor.enter_table(table)? == Flow::SkipChildren {
        return Ok(());
    }
    // index loop: enter_table and visit_row may change the row count
    let mut i = 0;
    while i < table.rows.len() {
        let flow = visitor.visit_row(&mut table.rows[i])?;
        if flow == Flow::Continue {
            for cell in table.rows[i].cells.iter_mut() {
                walk_blocks(&mut cell.blocks, visitor)?;
            }
        }
        i += 1;
    }
    visitor.leave_table(table)?;
    Ok(())
}
