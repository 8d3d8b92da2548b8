/// Command module - pooled allocators and lists, submission and fence tracking

pub mod allocator;
pub mod list;
pub mod pool;
pub mod queue;

pub use allocator::*;
pub use list::*;
pub use pool::*;
pub use queue::*;
