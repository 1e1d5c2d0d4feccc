use std::sync::Arc;

use crate::model::CategoryNode;

/// Depth-first, pre-order iterator over a category forest that threads a
/// state value from each node down to its children.
///
/// For every node, `step(&inherited, node)` computes the node's own state
/// from the state its parent produced (roots inherit `seed`). The iterator
/// yields `(node, state)` and hands a clone of `state` to each child.
/// Siblings come out in their stored order, parents before descendants.
pub struct PreOrder<'a, S, F> {
    stack: Vec<(&'a CategoryNode, S)>,
    step: F,
}

impl<'a, S, F> Iterator for PreOrder<'a, S, F>
where
    S: Clone,
    F: FnMut(&S, &CategoryNode) -> S,
{
    type Item = (&'a CategoryNode, S);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, inherited) = self.stack.pop()?;
        let state = (self.step)(&inherited, node);
        // Reversed so the first child is popped next.
        self.stack.extend(
            node.subcategories
                .iter()
                .rev()
                .map(|child| (child.as_ref(), state.clone())),
        );
        Some((node, state))
    }
}

/// Starts a [`PreOrder`] walk over `roots`.
pub fn walk<'a, S, F>(roots: &'a [Arc<CategoryNode>], seed: S, step: F) -> PreOrder<'a, S, F>
where
    S: Clone,
    F: FnMut(&S, &CategoryNode) -> S,
{
    PreOrder {
        stack: roots
            .iter()
            .rev()
            .map(|root| (root.as_ref(), seed.clone()))
            .collect(),
        step,
    }
}
