//! Content inliner seam
//!
//! An inliner claims parameter values whose field format matches its
//! tag pattern and rewrites the fragment itself, typically replacing
//! the alias with markup the writer passes through. Inliners run only
//! during document-phase substitution; row-local substitution never
//! probes them.

use docfill_band::ParameterValue;
use regex::{Captures, Regex};

use crate::document::TextFragment;
use crate::error::Result;

/// Handles rich-content parameter values matched by field format tags
pub trait ContentInliner {
    /// Pattern probed against the field format of a parameter
    fn tag_pattern(&self) -> &Regex;

    /// Rewrite the fragment for a claimed value. `captures` is the
    /// tag pattern match over the field format.
    fn inline(
        &self,
        value: &ParameterValue,
        fragment: &mut TextFragment,
        captures: &Captures<'_>,
    ) -> Result<()>;
}
