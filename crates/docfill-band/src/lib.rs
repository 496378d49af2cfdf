//! docfill-band - Hierarchical report data
//!
//! This crate provides the band data tree consumed by the docfill
//! engines: named bands with repeating sibling instances, typed
//! parameter values, and a global field-format map.
//!
//! # Example
//!
//! ```
//! use docfill_band::{BandData, ParameterValue};
//!
//! let mut root = BandData::new("Root");
//! let mut item = BandData::new("Item");
//! item.set_parameter("qty", ParameterValue::Integer(3));
//! root.add_child(item);
//!
//! let band = root.find_by_path(&["Item".to_string()]).unwrap();
//! assert_eq!(band.parameter("qty"), Some(&ParameterValue::Integer(3)));
//! ```

pub mod band;
pub mod value;

pub use band::BandData;
pub use value::ParameterValue;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
