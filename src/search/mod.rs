//! Post search: plain-text extraction from serialized rich-text content,
//! the title/content/category post filter, and listing helpers
//! (newest-first ordering, pagination).

mod content;
mod filter;

pub use content::plain_text;
pub use filter::{filter_posts, newest_first, paginate, search_posts, Page};
