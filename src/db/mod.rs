pub mod similarity;
pub mod snapshot;
pub mod vector_index;

pub use snapshot::{IndexSnapshot, StoredVector};
pub use vector_index::{EmbeddedIndex, MovieIndex};
