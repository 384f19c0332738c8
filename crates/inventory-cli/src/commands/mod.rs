//! Command implementations

mod resolve;
mod select;

pub use resolve::run_resolve;
pub use select::run_select;
