use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::{CategoryOption, PostPayload, TagType};

/// Longest title the admin forms accept, in characters.
pub const MAX_TITLE_CHARS: usize = 85;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Title cannot be empty")]
    EmptyTitle,
    #[error("Title is {len} characters long (max {max})")]
    TitleTooLong { len: usize, max: usize },
    #[error("Choose a category for the post")]
    MissingCategory,
    #[error("Choose an option for the mandatory tag \"{0}\"")]
    MissingMandatoryTag(String),
}

/// Chosen option per tag type (tag type id → option id). At most one option
/// per type, as the admin form's one-select-per-tag layout allows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSelection(BTreeMap<i64, i64>);

impl TagSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a selection from the option ids stored on a post by scanning
    /// every tag type's options for each id. Ids no tag type owns are dropped.
    pub fn from_option_ids<I>(tag_types: &[TagType], option_ids: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        let mut selection = Self::new();
        for option_id in option_ids {
            match owning_tag_type(tag_types, option_id) {
                Some(tag) => selection.select(tag.id, option_id),
                None => tracing::debug!(option_id, "Tag option not owned by any tag type"),
            }
        }
        selection
    }

    pub fn select(&mut self, tag_type_id: i64, option_id: i64) {
        self.0.insert(tag_type_id, option_id);
    }

    pub fn clear(&mut self, tag_type_id: i64) {
        self.0.remove(&tag_type_id);
    }

    pub fn get(&self, tag_type_id: i64) -> Option<i64> {
        self.0.get(&tag_type_id).copied()
    }

    /// Selected option ids, ordered by tag type id.
    pub fn option_ids(&self) -> Vec<i64> {
        self.0.values().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The tag type whose options include `option_id`.
pub fn owning_tag_type(tag_types: &[TagType], option_id: i64) -> Option<&TagType> {
    tag_types
        .iter()
        .find(|tag| tag.options.iter().any(|opt| opt.id == option_id))
}

/// First mandatory tag type (in list order) without a selected option.
pub fn first_missing_mandatory<'a>(
    tag_types: &'a [TagType],
    selection: &TagSelection,
) -> Option<&'a TagType> {
    tag_types
        .iter()
        .find(|tag| tag.is_mandatory && selection.get(tag.id).is_none())
}

/// Maps a display name typed or picked in the category field back to its id.
pub fn resolve_picker_choice(options: &[CategoryOption], display_name: &str) -> Option<i64> {
    options
        .iter()
        .find(|opt| opt.name == display_name)
        .map(|opt| opt.id)
}

/// State of the add/edit post form.
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub title: String,
    /// Serialized editor document.
    pub content: String,
    pub category_id: Option<i64>,
    pub selection: TagSelection,
}

impl PostForm {
    /// Checks the form against the admin rules and builds the request body.
    pub fn validate(&self, tag_types: &[TagType]) -> Result<PostPayload, FormError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(FormError::EmptyTitle);
        }
        let len = title.chars().count();
        if len > MAX_TITLE_CHARS {
            return Err(FormError::TitleTooLong {
                len,
                max: MAX_TITLE_CHARS,
            });
        }

        let category_id = self.category_id.ok_or(FormError::MissingCategory)?;

        if let Some(tag) = first_missing_mandatory(tag_types, &self.selection) {
            return Err(FormError::MissingMandatoryTag(tag.name.clone()));
        }

        Ok(PostPayload {
            title: title.to_owned(),
            content: self.content.clone(),
            category_id: Some(category_id),
            tag_option_ids: self.selection.option_ids(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TagOption;

    fn tag_types() -> Vec<TagType> {
        vec![
            TagType {
                id: 1,
                name: "Nível".to_string(),
                is_mandatory: true,
                options: vec![
                    TagOption { id: 10, name: "Básico".to_string() },
                    TagOption { id: 11, name: "Avançado".to_string() },
                ],
            },
            TagType {
                id: 2,
                name: "Formato".to_string(),
                is_mandatory: false,
                options: vec![
                    TagOption { id: 20, name: "Tutorial".to_string() },
                    TagOption { id: 21, name: "Notícia".to_string() },
                ],
            },
        ]
    }

    fn valid_form() -> PostForm {
        let mut selection = TagSelection::new();
        selection.select(1, 11);
        PostForm {
            title: "Intro to Rust".to_string(),
            content: r#"{"root":{"children":[]}}"#.to_string(),
            category_id: Some(3),
            selection,
        }
    }

    #[test]
    fn test_valid_form_builds_payload() {
        let payload = valid_form().validate(&tag_types()).unwrap();
        assert_eq!(payload.title, "Intro to Rust");
        assert_eq!(payload.category_id, Some(3));
        assert_eq!(payload.tag_option_ids, vec![11]);
    }

    #[test]
    fn test_title_limit_counts_chars_not_bytes() {
        let mut form = valid_form();
        form.title = "ç".repeat(MAX_TITLE_CHARS);
        assert!(form.validate(&tag_types()).is_ok());

        form.title.push('ç');
        assert_eq!(
            form.validate(&tag_types()),
            Err(FormError::TitleTooLong { len: 86, max: 85 })
        );
    }

    #[test]
    fn test_blank_title_rejected() {
        let mut form = valid_form();
        form.title = "   ".to_string();
        assert_eq!(form.validate(&tag_types()), Err(FormError::EmptyTitle));
    }

    #[test]
    fn test_missing_category_rejected() {
        let mut form = valid_form();
        form.category_id = None;
        assert_eq!(form.validate(&tag_types()), Err(FormError::MissingCategory));
    }

    #[test]
    fn test_missing_mandatory_tag_rejected() {
        let mut form = valid_form();
        form.selection.clear(1);
        let err = form.validate(&tag_types()).unwrap_err();
        assert_eq!(err, FormError::MissingMandatoryTag("Nível".to_string()));
        assert!(err.to_string().contains("Nível"));
    }

    #[test]
    fn test_optional_tag_may_be_empty() {
        let form = valid_form();
        assert!(form.selection.get(2).is_none());
        assert!(form.validate(&tag_types()).is_ok());
    }

    #[test]
    fn test_selection_from_option_ids() {
        let selection = TagSelection::from_option_ids(&tag_types(), [20, 10, 999]);
        assert_eq!(selection.get(1), Some(10));
        assert_eq!(selection.get(2), Some(20));
        assert_eq!(selection.option_ids(), vec![10, 20]);
    }

    #[test]
    fn test_owning_tag_type() {
        let tags = tag_types();
        assert_eq!(owning_tag_type(&tags, 21).map(|t| t.id), Some(2));
        assert!(owning_tag_type(&tags, 5).is_none());
    }

    #[test]
    fn test_resolve_picker_choice() {
        let options = vec![
            CategoryOption { id: 1, name: "Dev".to_string() },
            CategoryOption { id: 2, name: "Dev - Web".to_string() },
        ];
        assert_eq!(resolve_picker_choice(&options, "Dev - Web"), Some(2));
        assert_eq!(resolve_picker_choice(&options, "Web"), None);
    }
}
