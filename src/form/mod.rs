//! Form-side inputs: element kinds and submitted values

mod element;
mod value;

pub use element::{ElementKind, ElementLookup, FormDefinition};
pub use value::{FileReference, FormValues, UploadValue};
