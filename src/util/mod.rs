//! Small text and URL helpers shared by the search layer, the API client,
//! and the CLI renderer.

mod text;
mod url_validator;

pub use text::{contains_ignore_case, display_width, strip_control_chars, truncate_to_width};
pub use url_validator::{validate_base_url, UrlValidationError};
