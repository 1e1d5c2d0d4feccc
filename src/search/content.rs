use serde::Deserialize;

// Minimal read model of the editor's document: a root holding blocks,
// each block holding inline runs. Unknown fields are ignored.

#[derive(Deserialize)]
struct Document {
    root: Container,
}

#[derive(Deserialize)]
struct Container {
    children: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(default)]
    children: Option<Vec<Inline>>,
}

#[derive(Deserialize)]
struct Inline {
    #[serde(default)]
    text: Option<serde_json::Value>,
}

impl Inline {
    /// Strings as is, numbers and booleans in their JSON spelling, anything
    /// else empty.
    fn into_text(self) -> String {
        match self.text {
            Some(serde_json::Value::String(s)) => s,
            Some(v @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_))) => v.to_string(),
            _ => String::new(),
        }
    }
}

/// Extracts the searchable text of a serialized rich-text document.
///
/// Each block's inline `text` runs are joined with single spaces, then the
/// blocks themselves are joined with single spaces. A block without
/// children, or a run without text, contributes an empty string. A run
/// whose `text` is not a string only affects that run.
///
/// Returns `None` when `content` does not have the expected shape.
pub fn plain_text(content: &str) -> Option<String> {
    let document: Document = match serde_json::from_str(content) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!(error = %e, "Content is not a readable document");
            return None;
        }
    };

    let blocks: Vec<String> = document
        .root
        .children
        .into_iter()
        .map(|block| {
            block
                .children
                .unwrap_or_default()
                .into_iter()
                .map(Inline::into_text)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    Some(blocks.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(blocks: &[&[&str]]) -> String {
        let children: Vec<serde_json::Value> = blocks
            .iter()
            .map(|runs| {
                serde_json::json!({
                    "type": "paragraph",
                    "children": runs
                        .iter()
                        .map(|t| serde_json::json!({ "type": "text", "text": t }))
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        serde_json::json!({ "root": { "type": "root", "children": children } }).to_string()
    }

    #[test]
    fn test_runs_and_blocks_joined_with_spaces() {
        let content = doc(&[&["Hello", "world"], &["Second", "para"]]);
        assert_eq!(plain_text(&content).unwrap(), "Hello world Second para");
    }

    #[test]
    fn test_block_without_children_contributes_empty() {
        let content = r#"{"root":{"children":[
            {"type":"paragraph","children":[{"text":"a"}]},
            {"type":"horizontalrule"},
            {"type":"paragraph","children":[{"text":"b"}]}
        ]}}"#;
        assert_eq!(plain_text(content).unwrap(), "a  b");
    }

    #[test]
    fn test_run_without_text_contributes_empty() {
        let content = r#"{"root":{"children":[{"children":[{"text":"x"},{"type":"linebreak"},{"text":"y"}]}]}}"#;
        assert_eq!(plain_text(content).unwrap(), "x  y");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(plain_text(r#"{"root":{"children":[]}}"#).unwrap(), "");
    }

    #[test]
    fn test_malformed_content_is_none() {
        assert!(plain_text("").is_none());
        assert!(plain_text("not json").is_none());
        assert!(plain_text(r#"{"blocks":[]}"#).is_none());
        assert!(plain_text(r#"{"root":{"children":"oops"}}"#).is_none());
    }

    #[test]
    fn test_odd_run_text_degrades_per_run() {
        let content = r#"{"root":{"children":[{"children":[
            {"text":"Top"},{"text":5},{"text":null},{"text":{"nested":true}},{"text":"list"}
        ]}]}}"#;
        assert_eq!(plain_text(content).unwrap(), "Top 5   list");
    }
}
