//! DOCX report template filling
//!
//! This crate fills Word report templates from a hierarchical band
//! data tree. Templates carry `${band.path.param}` aliases in their
//! text and `##band=Name` markers binding tables to repeating bands;
//! rendering merges fragmented placeholders, expands band tables one
//! row per band instance and substitutes every alias, while all
//! untouched markup round-trips verbatim.
//!
//! ```no_run
//! use docfill_band::BandData;
//! use docfill_docx::{DocxFiller, Template};
//!
//! # fn main() -> docfill_docx::Result<()> {
//! let template = Template::load("invoice.docx")?;
//! let mut data = BandData::new("Root").with_parameter("customer", "ACME".into());
//! data.add_child(BandData::new("Item").with_parameter("qty", 3i64.into()));
//!
//! let filler = DocxFiller::new();
//! let bytes = filler.render(&template, &data)?;
//! std::fs::write("invoice-filled.docx", bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod alias;
pub mod archive;
pub mod document;
pub mod error;
pub mod filler;
pub mod format;
pub mod inline;
pub mod merge;
pub mod table;
pub mod template;
pub mod test_utils;
pub mod walker;
pub mod writer;

pub use alias::AliasToken;
pub use archive::DocxArchive;
pub use document::{Block, Document, Paragraph, Row, Run, Table, TextFragment};
pub use error::{FillError, Result};
pub use filler::DocxFiller;
pub use inline::ContentInliner;
pub use merge::TextMerger;
pub use table::{TableCollector, TableManager};
pub use template::Template;
pub use writer::write_document;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
