pub mod config;
pub mod error;
pub mod io;
pub mod lookup;
pub mod model;
pub mod reconcile;
pub mod sync;
pub mod text;

pub use error::{Result, SyncError};
