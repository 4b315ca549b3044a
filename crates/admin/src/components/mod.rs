//! Reusable view components for admin list pages.

pub mod filters;
pub mod pagination;

pub use filters::FilterOption;
pub use pagination::{PageLink, Pagination};
