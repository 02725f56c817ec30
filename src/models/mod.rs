pub mod document;
pub mod query;

pub use document::*;
pub use query::*;
