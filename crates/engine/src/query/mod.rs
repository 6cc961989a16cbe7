//! Query execution
//!
//! - [`translate`]: datastore query to storage filter, sort and projection
//! - [`cursor`]: merged, offset-emulating, projection-splitting result cursor
//! - [`pseudo`]: synthesized introspection results

pub mod cursor;
pub mod pseudo;
pub mod translate;

pub use cursor::{EntityCursor, MergedDocuments, ResultCursor};
pub use pseudo::PseudoKindCursor;
pub use translate::{translate, TranslatedQuery};
