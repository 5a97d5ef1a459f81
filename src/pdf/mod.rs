//! PDF form access

pub mod document;
pub mod field;
pub mod text;

// Re-export commonly used items
pub use document::FormDocument;
pub use field::{ButtonKind, FieldHandle, FormField, Variety};
pub use text::{decode_text_string, encode_text_string};
