//! Parse tree produced by the grammar engine

use serde::{Deserialize, Serialize};

/// Rule name carried by leaves.
pub const TERMINAL: &str = "terminal";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseNode {
    pub rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ParseNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postfix: Option<String>,
}

impl ParseNode {
    pub fn terminal(text: impl Into<String>) -> Self {
        Self {
            rule: TERMINAL.to_string(),
            text: Some(text.into()),
            children: Vec::new(),
            postfix: None,
        }
    }

    pub fn branch(rule: impl Into<String>, children: Vec<ParseNode>) -> Self {
        Self {
            rule: rule.into(),
            text: None,
            children,
            postfix: None,
        }
    }

    pub fn with_postfix(mut self, postfix: impl Into<String>) -> Self {
        self.postfix = Some(postfix.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.rule == TERMINAL
    }

    pub fn postfix(&self) -> Option<&str> {
        self.postfix.as_deref()
    }

    /// Postfix of a node known to carry one; empty otherwise.
    pub(crate) fn postfix_str(&self) -> &str {
        self.postfix.as_deref().unwrap_or_default()
    }

    pub fn children_named<'a>(&'a self, rule: &'a str) -> impl Iterator<Item = &'a ParseNode> + 'a {
        self.children.iter().filter(move |child| child.rule == rule)
    }

    /// Depth-first, pre-order search for the first node of `rule`.
    pub fn find(&self, rule: &str) -> Option<&ParseNode> {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            if node.rule == rule {
                return Some(node);
            }
            pending.extend(node.children.iter().rev());
        }
        None
    }

    /// Concatenated text of all leaves, space separated.
    pub fn source_text(&self) -> String {
        let mut words = Vec::new();
        self.walk_preorder(|_, _, node| {
            if let Some(text) = &node.text {
                words.push(text.clone());
            }
        });
        words.join(" ")
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk_preorder(|_, _, _| count += 1);
        count
    }

    /// Visits every node in pre-order with its 1-based number and the number
    /// of its parent.
    ///
    /// Operator chains nest one level per link, so this walks with an explicit
    /// stack rather than recursion.
    pub fn walk_preorder<F>(&self, mut visit: F)
    where
        F: FnMut(usize, Option<usize>, &ParseNode),
    {
        let mut next = 0;
        let mut pending = vec![(self, None)];
        while let Some((node, parent)) = pending.pop() {
            next += 1;
            visit(next, parent, node);
            let id = next;
            pending.extend(node.children.iter().rev().map(|child| (child, Some(id))));
        }
    }
}

/// Tears the tree down one node at a time so a long chain does not drop
/// recursively.
impl Drop for ParseNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}
