use std::collections::HashSet;
use std::sync::Arc;

use super::content::plain_text;
use crate::model::{CategoryNode, Post};
use crate::tree::{matching_ids, EmptyQuery};

/// Posts matching `query` by title, by the plain text of their content, or
/// by membership of their category in `category_ids`. Input order is kept.
///
/// Matching is case-insensitive. A post whose content cannot be read simply
/// does not match on content; the rest of the batch is unaffected.
/// `query` is used as given: a blank query matches every title, so callers
/// wanting "no filter" semantics should go through [`search_posts`].
pub fn filter_posts<'a>(
    posts: &'a [Post],
    query: &str,
    category_ids: &HashSet<i64>,
) -> Vec<&'a Post> {
    let needle = query.to_lowercase();

    posts
        .iter()
        .filter(|post| {
            if post.title.to_lowercase().contains(&needle) {
                return true;
            }
            if post
                .category_id
                .is_some_and(|id| category_ids.contains(&id))
            {
                return true;
            }
            match plain_text(&post.content) {
                Some(text) => text.to_lowercase().contains(&needle),
                None => {
                    tracing::debug!(post_id = post.id, "Skipping content match for unreadable post");
                    false
                }
            }
        })
        .collect()
}

/// Search as the public posts screen does it: a blank query shows every
/// post; otherwise categories are matched through the tree (a blank query
/// never reaches the category matcher) and posts are filtered.
pub fn search_posts<'a>(
    posts: &'a [Post],
    roots: &[Arc<CategoryNode>],
    query: &str,
) -> Vec<&'a Post> {
    let query = query.trim();
    if query.is_empty() {
        return posts.iter().collect();
    }

    let category_ids = matching_ids(roots, query, EmptyQuery::MatchNone);
    let found = filter_posts(posts, query, &category_ids);
    tracing::debug!(
        query = %query,
        categories = category_ids.len(),
        matched = found.len(),
        total = posts.len(),
        "Post search"
    );
    found
}

/// Sorts posts newest first (highest id first), as every listing shows them.
pub fn newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.id.cmp(&a.id));
}

/// One page of a listing.
#[derive(Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based page number actually served.
    pub number: usize,
    pub total_pages: usize,
}

/// Slices `items` into 1-based pages of `per_page` entries.
///
/// The requested page is clamped into range: page 0 is served as page 1 and
/// a page past the end as the last page. `per_page == 0` is treated as 1.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> Page<'_, T> {
    let per_page = per_page.max(1);
    let total_pages = items.len().div_ceil(per_page);
    let number = page.clamp(1, total_pages.max(1));

    let start = (number - 1).saturating_mul(per_page).min(items.len());
    let end = start.saturating_add(per_page).min(items.len());

    Page {
        items: &items[start..end],
        number,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::fixtures::blog_tree;
    use pretty_assertions::assert_eq;

    fn content(text: &str) -> String {
        serde_json::json!({
            "root": { "children": [ { "children": [ { "text": text } ] } ] }
        })
        .to_string()
    }

    fn post(id: i64, title: &str, body: &str, category_id: Option<i64>) -> Post {
        Post {
            id,
            title: title.to_string(),
            content: content(body),
            category_id,
            tag_option_ids: Vec::new(),
            tag_options: Vec::new(),
        }
    }

    fn ids(posts: &[&Post]) -> Vec<i64> {
        posts.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_title_match_regardless_of_content_and_category() {
        let posts = vec![post(1, "Intro to Foo", "nothing here", None)];
        let found = filter_posts(&posts, "foo", &HashSet::new());
        assert_eq!(ids(&found), vec![1]);
    }

    #[test]
    fn test_content_match() {
        let posts = vec![
            post(1, "Untitled", "Ownership and Borrowing explained", None),
            post(2, "Untitled", "Lifetimes", None),
        ];
        let found = filter_posts(&posts, "borrowing", &HashSet::new());
        assert_eq!(ids(&found), vec![1]);
    }

    #[test]
    fn test_content_match_spans_runs() {
        let mut p = post(1, "t", "", None);
        p.content = r#"{"root":{"children":[{"children":[{"text":"async"},{"text":"await"}]}]}}"#
            .to_string();
        let posts = vec![p];
        assert_eq!(ids(&filter_posts(&posts, "async await", &HashSet::new())), vec![1]);
    }

    #[test]
    fn test_category_match() {
        let posts = vec![
            post(1, "a", "x", Some(3)),
            post(2, "b", "y", Some(6)),
            post(3, "c", "z", None),
        ];
        let found = filter_posts(&posts, "zzz", &HashSet::from([3]));
        assert_eq!(ids(&found), vec![1]);
    }

    #[test]
    fn test_order_preserved() {
        let posts = vec![
            post(5, "foo five", "", None),
            post(2, "bar", "", None),
            post(9, "Foo nine", "", None),
            post(1, "FOO one", "", None),
        ];
        assert_eq!(ids(&filter_posts(&posts, "foo", &HashSet::new())), vec![5, 9, 1]);
    }

    #[test]
    fn test_malformed_content_does_not_abort_batch() {
        let mut broken = post(2, "broken", "", None);
        broken.content = "{not json".to_string();
        let mut wrong_shape = post(3, "wrong shape", "", None);
        wrong_shape.content = r#"{"root":"flat"}"#.to_string();

        let posts = vec![
            post(1, "first", "rust", None),
            broken,
            wrong_shape,
            post(4, "fourth", "Rust again", None),
        ];
        let found = filter_posts(&posts, "rust", &HashSet::new());
        assert_eq!(ids(&found), vec![1, 4]);
    }

    #[test]
    fn test_malformed_content_still_matches_by_title_and_category() {
        let mut by_title = post(1, "Rust tips", "", None);
        by_title.content = "garbage".to_string();
        let mut by_category = post(2, "other", "", Some(7));
        by_category.content = "garbage".to_string();

        let posts = vec![by_title, by_category];
        let found = filter_posts(&posts, "rust", &HashSet::from([7]));
        assert_eq!(ids(&found), vec![1, 2]);
    }

    #[test]
    fn test_search_blank_query_returns_everything() {
        let posts = vec![post(1, "a", "", Some(99)), post(2, "b", "", None)];
        assert_eq!(ids(&search_posts(&posts, &blog_tree(), "")), vec![1, 2]);
        assert_eq!(ids(&search_posts(&posts, &blog_tree(), "   ")), vec![1, 2]);
    }

    #[test]
    fn test_search_pulls_in_descendant_categories() {
        let posts = vec![
            post(1, "React hooks", "", Some(3)),   // Frontend, under Web
            post(2, "Axum routing", "", Some(4)),  // Backend, under Web
            post(3, "Flutter", "", Some(5)),       // Mobile
            post(4, "Web perf", "", None),         // title match
        ];
        let found = search_posts(&posts, &blog_tree(), "web");
        assert_eq!(ids(&found), vec![1, 2, 4]);
    }

    #[test]
    fn test_search_unresolved_category_degrades() {
        let posts = vec![post(1, "Orphan", "", Some(12345))];
        assert!(search_posts(&posts, &blog_tree(), "web").is_empty());
    }

    #[test]
    fn test_newest_first() {
        let mut posts = vec![post(2, "", "", None), post(7, "", "", None), post(4, "", "", None)];
        newest_first(&mut posts);
        let order: Vec<i64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(order, vec![7, 4, 2]);
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=17).collect();

        let first = paginate(&items, 1, 8);
        assert_eq!(first.items, &items[0..8]);
        assert_eq!(first.total_pages, 3);

        let last = paginate(&items, 3, 8);
        assert_eq!(last.items, &[17]);

        let past_end = paginate(&items, 4, 8);
        assert_eq!(past_end.number, 3);
        assert_eq!(past_end.items, &[17]);
        assert_eq!(past_end.total_pages, 3);

        let far_past_end = paginate(&items, usize::MAX, 8);
        assert_eq!(far_past_end.number, 3);

        let zero = paginate(&items, 0, 8);
        assert_eq!(zero.number, 1);
        assert_eq!(zero.items, first.items);
    }

    #[test]
    fn test_paginate_empty() {
        let items: Vec<u32> = Vec::new();
        let page = paginate(&items, 5, 9);
        assert!(page.items.is_empty());
        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 0);
    }
}
