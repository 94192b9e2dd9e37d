//! Data module - table loading, boundary decoding and the attribute join

mod attribute;
mod boundary;
mod joiner;
mod loader;
mod model;
mod topology;

pub use attribute::{Attribute, AttributeSelection};
pub use joiner::{JoinReport, Joiner};
pub use loader::{DataLoader, LoadedData};
pub use model::Region;
pub use model::TabularRecord;
