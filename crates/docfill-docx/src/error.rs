//! Error types for DOCX template filling

use thiserror::Error;

/// Errors that can occur while filling a report template
#[derive(Error, Debug)]
pub enum FillError {
    /// Template container could not be read
    #[error("Failed to load template [{name}]: {reason}")]
    TemplateLoad { name: String, reason: String },

    /// Alias text matched the universal pattern but failed strict parsing
    #[error("Bad alias [{0}]")]
    AliasSyntax(String),

    /// Band path resolution failed at some segment
    #[error("No band found for alias path [{0}]")]
    BandNotFound(String),

    /// Resolved band has no such parameter (a present null is valid)
    #[error("Band [{band}] has no parameter [{parameter}]")]
    ParameterMissing { band: String, parameter: String },

    /// Filled tree could not be written back
    #[error("Failed to serialize filled document: {0}")]
    Serialization(String),

    /// Invalid document structure
    #[error("Invalid document structure: {0}")]
    InvalidStructure(String),

    /// Error reading or writing the ZIP container
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Error parsing XML content
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any fill error, wrapped with the document it occurred in
    #[error("An error occurred while rendering document [{name}]: {source}")]
    Render {
        name: String,
        #[source]
        source: Box<FillError>,
    },
}

impl FillError {
    /// Wrap this error with the identity of the document being rendered
    pub fn in_document(self, name: &str) -> FillError {
        FillError::Render {
            name: name.to_string(),
            source: Box::new(self),
        }
    }
}

/// Result type for fill operations
pub type Result<T> = std::result::Result<T, FillError>;
