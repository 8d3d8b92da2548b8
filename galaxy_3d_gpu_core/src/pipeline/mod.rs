/// Pipeline module - resource tables derived from reflection, and the pipeline state cache

pub mod resource_table;
pub mod cache;

pub use resource_table::*;
pub use cache::*;
