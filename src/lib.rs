//! Client library for the rapydo blog API.
//!
//! The category-tree and post-search logic in [`tree`] and [`search`] is pure
//! and synchronous; [`api`] talks to the server; [`editor`] holds the admin
//! form rules; [`render`] turns all of it into terminal text for the CLI.

pub mod api;
pub mod config;
pub mod editor;
pub mod model;
pub mod render;
pub mod search;
pub mod tree;
pub mod util;
