use std::sync::Arc;

use crate::model::CategoryNode;

/// Returns a new forest with `node` appended to the subcategories of
/// `parent_id`, or appended as a new root when `parent_id` is `None`.
///
/// Only the nodes on the path from the root to the parent are copied; every
/// other subtree is shared with `roots` by reference. An unknown parent
/// leaves the forest unchanged.
pub fn insert_category(
    roots: &[Arc<CategoryNode>],
    parent_id: Option<i64>,
    node: CategoryNode,
) -> Vec<Arc<CategoryNode>> {
    let node = Arc::new(node);
    let Some(parent_id) = parent_id else {
        let mut next = roots.to_vec();
        next.push(node);
        return next;
    };

    match locate(roots, parent_id) {
        Some(path) => rebuild_along(roots, &path, |children| {
            let mut next = children.to_vec();
            next.push(node);
            next
        }),
        None => {
            tracing::warn!(
                parent_id,
                category_id = node.id,
                "Parent category not in local tree, leaving tree unchanged"
            );
            roots.to_vec()
        }
    }
}

/// Returns a new forest without the category `id` and its subtree.
///
/// Copies only the path from the root to the removed node's parent. An
/// unknown id leaves the forest unchanged.
pub fn remove_category(roots: &[Arc<CategoryNode>], id: i64) -> Vec<Arc<CategoryNode>> {
    let Some(mut path) = locate(roots, id) else {
        tracing::debug!(category_id = id, "Category not in local tree, nothing to remove");
        return roots.to_vec();
    };
    let Some(index) = path.pop() else {
        return roots.to_vec();
    };

    rebuild_along(roots, &path, |children| {
        children
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != index)
            .map(|(_, child)| Arc::clone(child))
            .collect()
    })
}

/// Child-index path from the forest down to the node with `id`.
fn locate(roots: &[Arc<CategoryNode>], id: i64) -> Option<Vec<usize>> {
    let mut path = Vec::new();
    let mut stack: Vec<(usize, usize, &CategoryNode)> = roots
        .iter()
        .enumerate()
        .rev()
        .map(|(i, node)| (0, i, node.as_ref()))
        .collect();

    while let Some((depth, index, node)) = stack.pop() {
        path.truncate(depth);
        path.push(index);
        if node.id == id {
            return Some(path);
        }
        stack.extend(
            node.subcategories
                .iter()
                .enumerate()
                .rev()
                .map(|(i, child)| (depth + 1, i, child.as_ref())),
        );
    }
    None
}

/// Replaces the children list reached by following `path` with
/// `edit(children)`, copying each node along the path bottom-up.
/// An empty path edits the root list itself.
fn rebuild_along<F>(roots: &[Arc<CategoryNode>], path: &[usize], edit: F) -> Vec<Arc<CategoryNode>>
where
    F: FnOnce(&[Arc<CategoryNode>]) -> Vec<Arc<CategoryNode>>,
{
    let mut chain: Vec<&Arc<CategoryNode>> = Vec::with_capacity(path.len());
    let mut level = roots;
    for &index in path {
        let node = &level[index];
        chain.push(node);
        level = &node.subcategories;
    }

    let mut rebuilt = edit(level);
    for (depth, node) in chain.iter().enumerate().rev() {
        let copy = Arc::new(CategoryNode {
            id: node.id,
            name: node.name.clone(),
            image_url: node.image_url.clone(),
            subcategories: rebuilt,
        });
        let siblings: &[Arc<CategoryNode>] = match depth {
            0 => roots,
            _ => &chain[depth - 1].subcategories,
        };
        let mut next = siblings.to_vec();
        next[path[depth]] = copy;
        rebuilt = next;
    }
    rebuilt
}
