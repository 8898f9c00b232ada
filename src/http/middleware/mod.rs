//! Request middleware.

pub mod filter;

pub use filter::{filter_middleware, FilterState};
