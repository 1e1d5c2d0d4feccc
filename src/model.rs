//! Wire types shared by the API client, the tree utilities, and the search layer.
//!
//! Field names follow the blog API's JSON exactly. Subcategories are held behind
//! `Arc` so tree edits can reuse untouched subtrees instead of deep-copying them.
use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Categories
// ============================================================================

/// A node of the category forest as returned by `GET /categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: i64,
    pub name: String,
    /// Bare filename, already-qualified path, or absent for aggregation nodes.
    #[serde(default, alias = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub subcategories: Vec<Arc<CategoryNode>>,
}

impl CategoryNode {
    /// Leaf node with no image.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            image_url: None,
            subcategories: Vec::new(),
        }
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_children(mut self, children: Vec<CategoryNode>) -> Self {
        self.subcategories = children.into_iter().map(Arc::new).collect();
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.subcategories.is_empty()
    }
}

// The derived drop would recurse once per level; deep trees must not
// overflow the stack on the way out.
impl Drop for CategoryNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.subcategories);
        while let Some(child) = pending.pop() {
            if let Ok(mut node) = Arc::try_unwrap(child) {
                pending.append(&mut node.subcategories);
            }
        }
    }
}

/// One entry of a flattened, breadcrumb-labelled category picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOption {
    pub id: i64,
    pub name: String,
}

/// Form body of `POST /categories`.
///
/// The server stores `image` under its image root, so it is a bare filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub parent_id: Option<i64>,
    pub image: String,
}

impl NewCategory {
    /// `application/x-www-form-urlencoded` body. A root category sends an
    /// empty `parent_id`.
    pub fn form_body(&self) -> String {
        let parent_id = self.parent_id.map(|id| id.to_string()).unwrap_or_default();
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("name", &self.name)
            .append_pair("parent_id", &parent_id)
            .append_pair("image", &self.image)
            .finish()
    }
}

/// JSON body of `PUT /categories/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryPayload {
    pub name: String,
    pub parent_id: Option<i64>,
    pub image_url: Option<String>,
}

// ============================================================================
// Tags
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagOption {
    pub id: i64,
    pub name: String,
}

/// A tag taxonomy: a named list of options, optionally mandatory on every post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagType {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default)]
    pub options: Vec<TagOption>,
}

/// Body of `POST /tags` and `PUT /tags/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagPayload {
    pub name: String,
    pub is_mandatory: bool,
    pub options: Vec<String>,
}

impl TagPayload {
    /// Blank option names are dropped; the rest are trimmed.
    pub fn new<I, S>(name: impl Into<String>, is_mandatory: bool, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            is_mandatory,
            options: options
                .into_iter()
                .filter_map(|opt| {
                    let trimmed = opt.as_ref().trim();
                    (!trimmed.is_empty()).then(|| trimmed.to_owned())
                })
                .collect(),
        }
    }
}

// ============================================================================
// Posts
// ============================================================================

/// Tag option as embedded in post responses by some endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTagOption {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tag_type_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    /// Serialized rich-text document. Opaque except for the read path in `search::content`.
    #[serde(deserialize_with = "content_as_string")]
    pub content: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub tag_option_ids: Vec<i64>,
    #[serde(default)]
    pub tag_options: Vec<PostTagOption>,
}

impl Post {
    /// Every tag option id the post was tagged with, from either wire field.
    pub fn selected_option_ids(&self) -> BTreeSet<i64> {
        self.tag_option_ids
            .iter()
            .copied()
            .chain(self.tag_options.iter().map(|opt| opt.id))
            .collect()
    }
}

/// Body of `POST /posts` and `PUT /posts/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPayload {
    pub title: String,
    pub content: String,
    pub category_id: Option<i64>,
    pub tag_option_ids: Vec<i64>,
}

/// The API stores content as a JSON string but has been seen returning the
/// decoded object. Either way we keep the serialized form.
fn content_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}
