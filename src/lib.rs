//! pdffill Library
//!
//! Inspect and fill the interactive form fields of a PDF.
//! This library provides functionality to:
//! - List every form field with its current value
//! - Fill every field with its own name, to see the layout in a viewer
//! - Assign values to fields addressed by name or object id
//! - Save the result as an incremental update of the original file
//!
//! # Example
//!
//! ```no_run
//! use pdffill::fill::inspect;
//! use std::path::Path;
//!
//! for entry in inspect(Path::new("form.pdf")).expect("Failed to read form") {
//!     println!("{}", entry);
//! }
//! ```

pub mod codec;
pub mod error;
pub mod fill;
pub mod pdf;
pub mod resolver;

// Re-export commonly used items
pub use error::{Error, Result};
pub use fill::{fill_form, inspect, Destination, FieldEntry, FillOptions, FillReport};
pub use resolver::Assignments;
