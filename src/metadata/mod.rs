//! Metadata module - provider abstraction and in-memory catalog

mod memory;
mod provider;
mod schema;

pub use memory::*;
pub use provider::*;
pub use schema::*;
