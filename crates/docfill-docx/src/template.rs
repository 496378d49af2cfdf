//! Report template container

use std::io::Cursor;
use std::path::Path;

use crate::archive::DocxArchive;
use crate::error::{FillError, Result};

/// A loaded DOCX report template.
///
/// The template is immutable; rendering clones its archive and fills
/// the clone, so one template can serve many renders.
#[derive(Debug, Clone)]
pub struct Template {
    archive: DocxArchive,
    name: String,
}

impl Template {
    /// Load a template from a DOCX file. The template name, used in
    /// error messages, is the file stem.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let archive = DocxArchive::open(path).map_err(|e| FillError::TemplateLoad {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        Self::from_archive(name, archive)
    }

    /// Create a template from in-memory DOCX bytes
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        let archive =
            DocxArchive::from_reader(Cursor::new(bytes)).map_err(|e| FillError::TemplateLoad {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        Self::from_archive(name, archive)
    }

    fn from_archive(name: String, archive: DocxArchive) -> Result<Self> {
        if !archive.contains("word/document.xml") {
            return Err(FillError::TemplateLoad {
                name,
                reason: "missing word/document.xml".to_string(),
            });
        }
        Ok(Self { archive, name })
    }

    /// Template name for diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying archive
    pub fn archive(&self) -> &DocxArchive {
        &self.archive
    }

    /// The main document part
    pub fn document_xml(&self) -> Result<&[u8]> {
        self.archive.document_xml()
    }
}
