pub mod assets;
pub mod csv_read;
pub mod frontmatter;
pub mod notion;
pub mod store;

pub use store::{DirectoryStore, DocumentStore, MemoryStore};
