//! Plain-text rendering for the CLI.
//!
//! Everything that came over the network is passed through
//! [`strip_control_chars`] before it reaches the terminal.
use std::fmt::Write as _;
use std::sync::Arc;

use crate::model::{CategoryNode, CategoryOption, Post, TagType};
use crate::search::{plain_text, Page};
use crate::tree::{resolve_image, resolve_name, walk};
use crate::util::{display_width, strip_control_chars, truncate_to_width};

/// Default column budget for one-line entries.
pub const DEFAULT_WIDTH: usize = 80;

/// The category forest as an indented outline, one node per line.
///
/// ```text
/// v Desenvolvimento [1]
///   v Web [2]
///       Frontend [3]
/// ```
pub fn category_tree(roots: &[Arc<CategoryNode>]) -> Vec<String> {
    walk(roots, 0usize, |depth: &usize, _: &CategoryNode| depth + 1)
        .map(|(node, depth)| {
            let indent = "  ".repeat(depth.saturating_sub(1));
            let icon = if node.is_leaf() { "  " } else { "v " };
            format!(
                "{indent}{icon}{} [{}]",
                strip_control_chars(&node.name),
                node.id
            )
        })
        .collect()
}

/// Picker entries, id column right-aligned.
pub fn picker_lines(options: &[CategoryOption]) -> Vec<String> {
    let id_width = options
        .iter()
        .map(|opt| opt.id.to_string().len())
        .max()
        .unwrap_or(1);
    options
        .iter()
        .map(|opt| {
            format!(
                "{:>id_width$}  {}",
                opt.id,
                strip_control_chars(&opt.name)
            )
        })
        .collect()
}

/// Two-line listing entry: id and title, then category name and image.
pub fn post_card(post: &Post, roots: &[Arc<CategoryNode>], width: usize) -> String {
    let prefix = format!("#{:<5} ", post.id);
    let title = strip_control_chars(&post.title);
    let budget = width.saturating_sub(display_width(&prefix));
    format!(
        "{prefix}{}\n       {} ({})",
        truncate_to_width(&title, budget),
        strip_control_chars(&resolve_name(roots, post.category_id)),
        resolve_image(roots, post.category_id)
    )
}

/// Full view of one post: header, tags, and the readable text of its content.
pub fn post_detail(post: &Post, roots: &[Arc<CategoryNode>], tag_types: &[TagType]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", strip_control_chars(&post.title));
    let _ = writeln!(
        out,
        "Category: {}",
        strip_control_chars(&resolve_name(roots, post.category_id))
    );

    let selected = post.selected_option_ids();
    let selected = &selected;
    let tags: Vec<String> = tag_types
        .iter()
        .flat_map(|tag| {
            tag.options
                .iter()
                .filter(move |opt| selected.contains(&opt.id))
                .map(move |opt| format!("{}: {}", tag.name, opt.name))
        })
        .collect();
    if !tags.is_empty() {
        let _ = writeln!(out, "Tags: {}", strip_control_chars(&tags.join(", ")));
    }

    out.push('\n');
    match plain_text(&post.content) {
        Some(text) if !text.trim().is_empty() => out.push_str(&strip_control_chars(&text)),
        Some(_) => out.push_str("(empty)"),
        None => out.push_str("(content unavailable)"),
    }
    out
}

/// Tag taxonomies with their options, mandatory ones marked with `*`.
pub fn tag_lines(tag_types: &[TagType]) -> Vec<String> {
    tag_types
        .iter()
        .map(|tag| {
            let marker = if tag.is_mandatory { "*" } else { "" };
            let options: Vec<String> = tag
                .options
                .iter()
                .map(|opt| format!("{} [{}]", opt.name, opt.id))
                .collect();
            strip_control_chars(&format!(
                "{}{marker} [{}]: {}",
                tag.name,
                tag.id,
                options.join(", ")
            ))
            .into_owned()
        })
        .collect()
}

pub fn page_footer<T>(page: &Page<'_, T>) -> String {
    if page.total_pages == 0 {
        "No posts.".to_string()
    } else {
        format!("Page {} of {}", page.number, page.total_pages)
    }
}
