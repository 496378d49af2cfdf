//! The band data tree
//!
//! A band is a named node in the report data tree. A child name may
//! carry zero, one, or many instances, which is how repeating
//! sub-reports are represented. Band names are unique per sibling
//! group but may repeat across branches, so paths resolve by strict
//! descent only.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::ParameterValue;

/// A node in the hierarchical report data tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandData {
    /// Band name, unique among siblings
    name: String,
    /// Child bands: name -> ordered instances, in first-insertion order
    children: Vec<(String, Vec<BandData>)>,
    /// Parameter values of this band instance
    parameters: HashMap<String, ParameterValue>,
    /// Field formats keyed by "bandName.paramName"; meaningful at the root
    #[serde(default)]
    field_formats: HashMap<String, String>,
}

impl BandData {
    /// Create an empty band with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            parameters: HashMap::new(),
            field_formats: HashMap::new(),
        }
    }

    /// The band name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a child instance, grouped under the child's own name
    pub fn add_child(&mut self, child: BandData) {
        match self.children.iter_mut().find(|(n, _)| *n == child.name) {
            Some((_, instances)) => instances.push(child),
            None => self.children.push((child.name.clone(), vec![child])),
        }
    }

    /// Builder-style parameter assignment
    pub fn with_parameter(mut self, name: impl Into<String>, value: ParameterValue) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Set a parameter value
    pub fn set_parameter(&mut self, name: impl Into<String>, value: ParameterValue) {
        self.parameters.insert(name.into(), value);
    }

    /// Look up a parameter value; `None` means the parameter is absent
    /// (distinct from a present `Null`)
    pub fn parameter(&self, name: &str) -> Option<&ParameterValue> {
        self.parameters.get(name)
    }

    /// Fully qualified parameter name ("bandName.paramName"), the key
    /// field formats are registered under
    pub fn full_name(&self, parameter: &str) -> String {
        format!("{}.{}", self.name, parameter)
    }

    /// Whether a parameter exists on this band
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    /// All instances of a named child band, in insertion order
    pub fn children_by_name(&self, name: &str) -> &[BandData] {
        self.children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, instances)| instances.as_slice())
            .unwrap_or(&[])
    }

    /// Iterate over all child instances in document order
    pub fn children(&self) -> impl Iterator<Item = &BandData> {
        self.children.iter().flat_map(|(_, instances)| instances)
    }

    /// Resolve a dot-separated path by strict descent.
    ///
    /// At each segment the first instance of the named child is taken;
    /// a missing or empty child collection fails the whole resolution.
    /// An empty path resolves to this band itself.
    pub fn find_by_path(&self, path: &[String]) -> Option<&BandData> {
        let mut current = self;
        for segment in path {
            current = current.children_by_name(segment).first()?;
        }
        Some(current)
    }

    /// Find every instance of a named band reachable from here,
    /// including this band itself, in pre-order document order.
    pub fn find_recursively(&self, name: &str) -> Vec<&BandData> {
        let mut found = Vec::new();
        self.collect_recursively(name, &mut found);
        found
    }

    fn collect_recursively<'a>(&'a self, name: &str, found: &mut Vec<&'a BandData>) {
        if self.name == name {
            found.push(self);
        }
        for child in self.children() {
            child.collect_recursively(name, found);
        }
    }

    /// Register a field format under its fully qualified name
    /// ("bandName.paramName")
    pub fn set_field_format(&mut self, full_name: impl Into<String>, format: impl Into<String>) {
        self.field_formats.insert(full_name.into(), format.into());
    }

    /// Look up a field format by fully qualified name
    pub fn field_format(&self, full_name: &str) -> Option<&str> {
        self.field_formats.get(full_name).map(|s| s.as_str())
    }
}
