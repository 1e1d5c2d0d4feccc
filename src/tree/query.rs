use std::collections::HashSet;
use std::sync::Arc;

use super::walk::walk;
use crate::model::{CategoryNode, CategoryOption};
use crate::util::contains_ignore_case;

/// Joins ancestor names in picker labels: `"Dev - Web - Frontend"`.
pub const BREADCRUMB_SEPARATOR: &str = " - ";

/// Name shown for posts whose category id is missing or does not resolve.
pub const UNKNOWN_CATEGORY: &str = "Uncategorized";

/// Directory that bare image filenames are served from.
pub const IMAGE_ROOT: &str = "/img/";

/// Placeholder image for unresolved categories and categories without an image.
pub const DEFAULT_IMAGE: &str = "/img/default.png";

/// What [`matching_ids`] returns for a blank query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyQuery {
    /// Substring semantics: `""` is contained in every name, so every id matches.
    MatchAll,
    /// Treat a blank query as "no category filter".
    MatchNone,
}

/// Flattens the forest into picker options, pre-order, one entry per node.
///
/// Each display name is the chain of names from the root down to the node
/// joined with [`BREADCRUMB_SEPARATOR`]. Empty names are kept as empty
/// segments.
pub fn flatten(roots: &[Arc<CategoryNode>]) -> Vec<CategoryOption> {
    walk(roots, None, |prefix: &Option<String>, node: &CategoryNode| {
        Some(match prefix {
            Some(prefix) => format!("{prefix}{BREADCRUMB_SEPARATOR}{}", node.name),
            None => node.name.clone(),
        })
    })
    .map(|(node, label)| CategoryOption {
        id: node.id,
        name: label.unwrap_or_default(),
    })
    .collect()
}

/// Finds the node with `id`. Ids are unique across the forest, so the first
/// hit is the only one.
pub fn find(roots: &[Arc<CategoryNode>], id: i64) -> Option<&CategoryNode> {
    walk(roots, (), |_, _| ())
        .map(|(node, ())| node)
        .find(|node| node.id == id)
}

/// Display name of the category `id`, or [`UNKNOWN_CATEGORY`].
pub fn resolve_name(roots: &[Arc<CategoryNode>], id: Option<i64>) -> String {
    id.and_then(|id| find(roots, id))
        .map(|node| node.name.clone())
        .unwrap_or_else(|| UNKNOWN_CATEGORY.to_owned())
}

/// Image path for the category `id`. Never fails.
///
/// - node not found, or no/blank image reference → [`DEFAULT_IMAGE`]
/// - reference already under [`IMAGE_ROOT`] or an absolute http(s) URL → unchanged
/// - bare filename → prefixed with [`IMAGE_ROOT`]
pub fn resolve_image(roots: &[Arc<CategoryNode>], id: Option<i64>) -> String {
    let reference = id
        .and_then(|id| find(roots, id))
        .and_then(|node| node.image_url.as_deref())
        .map(str::trim)
        .filter(|r| !r.is_empty());

    match reference {
        None => DEFAULT_IMAGE.to_owned(),
        Some(r) if is_qualified(r) => r.to_owned(),
        Some(r) => format!("{IMAGE_ROOT}{}", r.trim_start_matches('/')),
    }
}

fn is_qualified(reference: &str) -> bool {
    reference.starts_with(IMAGE_ROOT)
        || reference.starts_with("https://")
        || reference.starts_with("http://")
}

/// Ids of every category whose own name, or any ancestor's name, contains
/// `query` (case-insensitive).
///
/// Matching propagates down only: a match on "Web" pulls in all of Web's
/// descendants, while a match on a leaf never marks its parents.
pub fn matching_ids(roots: &[Arc<CategoryNode>], query: &str, empty: EmptyQuery) -> HashSet<i64> {
    if query.trim().is_empty() {
        return match empty {
            EmptyQuery::MatchAll => all_ids(roots).into_iter().collect(),
            EmptyQuery::MatchNone => HashSet::new(),
        };
    }

    walk(roots, false, |ancestor_matched: &bool, node: &CategoryNode| {
        *ancestor_matched || contains_ignore_case(&node.name, query)
    })
    .filter_map(|(node, matched)| matched.then_some(node.id))
    .collect()
}

/// Every id in the forest, pre-order.
pub fn all_ids(roots: &[Arc<CategoryNode>]) -> Vec<i64> {
    walk(roots, (), |_, _| ()).map(|(node, ())| node.id).collect()
}

pub fn node_count(roots: &[Arc<CategoryNode>]) -> usize {
    walk(roots, (), |_, _| ()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::fixtures::blog_tree;
    use pretty_assertions::assert_eq;

    fn labels(options: &[CategoryOption]) -> Vec<&str> {
        options.iter().map(|o| o.name.as_str()).collect()
    }

    #[test]
    fn test_flatten_breadcrumb_order() {
        let tree = vec![Arc::new(CategoryNode::new(1, "A").with_children(vec![
            CategoryNode::new(2, "B").with_children(vec![CategoryNode::new(4, "D")]),
            CategoryNode::new(3, "C"),
        ]))];

        let options = flatten(&tree);
        assert_eq!(labels(&options), vec!["A", "A - B", "A - B - D", "A - C"]);
        let ids: Vec<i64> = options.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 2, 4, 3]);
    }

    #[test]
    fn test_flatten_multiple_roots() {
        let options = flatten(&blog_tree());
        assert_eq!(
            labels(&options),
            vec![
                "Desenvolvimento",
                "Desenvolvimento - Web",
                "Desenvolvimento - Web - Frontend",
                "Desenvolvimento - Web - Backend",
                "Desenvolvimento - Mobile",
                "Design",
                "Design - UX",
            ]
        );
    }

    #[test]
    fn test_flatten_empty() {
        assert!(flatten(&[]).is_empty());
    }

    #[test]
    fn test_flatten_keeps_empty_name_segments() {
        let tree = vec![Arc::new(
            CategoryNode::new(1, "").with_children(vec![CategoryNode::new(2, "Child")]),
        )];
        assert_eq!(labels(&flatten(&tree)), vec!["", " - Child"]);
    }

    #[test]
    fn test_flatten_count_matches_node_count() {
        let tree = blog_tree();
        assert_eq!(flatten(&tree).len(), node_count(&tree));
        assert_eq!(node_count(&tree), 7);
    }

    #[test]
    fn test_resolve_name_hit_and_miss() {
        let tree = blog_tree();
        assert_eq!(resolve_name(&tree, Some(4)), "Backend");
        assert_eq!(resolve_name(&tree, Some(7)), "UX");
        assert_eq!(resolve_name(&tree, Some(999)), UNKNOWN_CATEGORY);
        assert_eq!(resolve_name(&tree, None), UNKNOWN_CATEGORY);
        assert_eq!(resolve_name(&[], Some(1)), UNKNOWN_CATEGORY);
    }

    #[test]
    fn test_resolve_image_prefixing() {
        let tree = blog_tree();
        // bare filename
        assert_eq!(resolve_image(&tree, Some(1)), "/img/dev.png");
        assert_eq!(resolve_image(&tree, Some(4)), "/img/backend.jpg");
        // already qualified
        assert_eq!(resolve_image(&tree, Some(2)), "/img/web.png");
        assert_eq!(
            resolve_image(&tree, Some(7)),
            "https://cdn.example.com/ux.png"
        );
    }

    #[test]
    fn test_resolve_image_defaults() {
        let tree = blog_tree();
        // node without image
        assert_eq!(resolve_image(&tree, Some(3)), DEFAULT_IMAGE);
        // unknown id
        assert_eq!(resolve_image(&tree, Some(999)), DEFAULT_IMAGE);
        assert_eq!(resolve_image(&tree, None), DEFAULT_IMAGE);
    }

    #[test]
    fn test_resolve_image_blank_reference_uses_default() {
        let tree = vec![Arc::new(CategoryNode::new(1, "Blank").with_image("   "))];
        assert_eq!(resolve_image(&tree, Some(1)), DEFAULT_IMAGE);
    }

    #[test]
    fn test_resolve_image_prefixed_and_bare() {
        let tree = vec![
            Arc::new(CategoryNode::new(1, "Prefixed").with_image("/img/x.png")),
            Arc::new(CategoryNode::new(2, "Bare").with_image("x.png")),
        ];
        assert_eq!(resolve_image(&tree, Some(1)), "/img/x.png");
        assert_eq!(resolve_image(&tree, Some(2)), "/img/x.png");
    }

    #[test]
    fn test_matching_ids_monotonic_down_the_tree() {
        let tree = vec![Arc::new(CategoryNode::new(1, "A").with_children(vec![
            CategoryNode::new(2, "Foo Things").with_children(vec![CategoryNode::new(3, "C")]),
        ]))];

        let ids = matching_ids(&tree, "foo", EmptyQuery::MatchNone);
        assert!(ids.contains(&2));
        assert!(ids.contains(&3));
        assert!(!ids.contains(&1));
    }

    #[test]
    fn test_matching_ids_subtree_pull_in() {
        let ids = matching_ids(&blog_tree(), "WEB", EmptyQuery::MatchNone);
        let mut sorted: Vec<i64> = ids.into_iter().collect();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![2, 3, 4]);
    }

    #[test]
    fn test_matching_ids_leaf_match_does_not_mark_parents() {
        let ids = matching_ids(&blog_tree(), "front", EmptyQuery::MatchNone);
        assert_eq!(ids, HashSet::from([3]));
    }

    #[test]
    fn test_matching_ids_no_match() {
        assert!(matching_ids(&blog_tree(), "culinária", EmptyQuery::MatchAll).is_empty());
    }

    #[test]
    fn test_matching_ids_empty_query_policies() {
        let tree = blog_tree();
        let all = matching_ids(&tree, "", EmptyQuery::MatchAll);
        assert_eq!(all.len(), 7);
        let every: HashSet<i64> = all_ids(&tree).into_iter().collect();
        assert_eq!(all, every);

        assert!(matching_ids(&tree, "", EmptyQuery::MatchNone).is_empty());
        assert!(matching_ids(&tree, "   ", EmptyQuery::MatchNone).is_empty());
    }

    #[test]
    fn test_all_ids_pre_order() {
        assert_eq!(all_ids(&blog_tree()), vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_queries_are_idempotent() {
        let tree = blog_tree();
        assert_eq!(flatten(&tree), flatten(&tree));
        assert_eq!(resolve_name(&tree, Some(5)), resolve_name(&tree, Some(5)));
        assert_eq!(resolve_image(&tree, Some(4)), resolve_image(&tree, Some(4)));
        assert_eq!(
            matching_ids(&tree, "des", EmptyQuery::MatchNone),
            matching_ids(&tree, "des", EmptyQuery::MatchNone)
        );
    }
}
