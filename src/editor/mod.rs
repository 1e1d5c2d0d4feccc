//! Admin-side post editing: form validation, tag selection, and local draft
//! snapshots of in-progress content.

mod draft;
mod form;

pub use draft::{Draft, DraftKey, DraftStore};
pub use form::{
    first_missing_mandatory, owning_tag_type, resolve_picker_choice, FormError, PostForm,
    TagSelection, MAX_TITLE_CHARS,
};
