//! Category-tree utilities.
//!
//! Every screen that needs the category forest goes through this module:
//!
//! - [`flatten`]: breadcrumb-labelled picker options, pre-order
//! - [`resolve_name`] / [`resolve_image`]: id → display name / image path, total
//! - [`matching_ids`]: ids whose own name or any ancestor's name matches a query
//! - [`insert_category`] / [`remove_category`]: copy-on-write splices after API mutations
//!
//! All traversals are iterative (see [`walk`]), so tree depth is bounded by
//! memory rather than by the call stack. None of these functions perform I/O
//! or take configuration.

mod edit;
mod query;
mod walk;

pub use edit::{insert_category, remove_category};
pub use query::{
    all_ids, find, flatten, matching_ids, node_count, resolve_image, resolve_name, EmptyQuery,
    BREADCRUMB_SEPARATOR, DEFAULT_IMAGE, IMAGE_ROOT, UNKNOWN_CATEGORY,
};
pub use walk::{walk, PreOrder};
