//! Record handling and batch production.

mod base;
mod batch;
mod bucket;
mod list;
mod pool;
mod record;

pub use base::*;
pub use batch::*;
pub use bucket::*;
pub use list::*;
pub use pool::*;
pub use record::*;
