//! Rendering of parse outcomes: JSON report, Graphviz tree, postfix text

use crate::Output;
use polska_parser::{ParseNode, ParseResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write;

/// Bare pass/fail outcome. `error` is present exactly when `ok` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Report {
    pub fn from_result(result: &ParseResult<ParseNode>) -> Self {
        match result {
            Ok(_) => Report { ok: true, error: None },
            Err(err) => Report {
                ok: false,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Compact JSON.
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Graphviz description of the tree. Nodes are numbered in pre-order from 1
/// and every node statement is followed by the edge from its parent.
pub fn to_dot(node: &ParseNode) -> String {
    let mut out = String::from("digraph parse_tree {\n");
    node.walk_preorder(|id, parent, node| {
        let label = match &node.text {
            Some(text) => format!("{}: {}", node.rule, text),
            None => node.rule.clone(),
        };
        let _ = writeln!(out, "    {} [label=\"{}\"];", id, escape_label(&label));
        if let Some(parent) = parent {
            let _ = writeln!(out, "    {} -> {};", parent, id);
        }
    });
    out.push('}');
    out
}

fn escape_label(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

/// The postfix form of an expression tree, or one `ID = postfix` line per
/// assignment of a program tree.
pub fn postfix_listing(node: &ParseNode) -> String {
    if let Some(postfix) = node.postfix() {
        return postfix.to_string();
    }

    let Some(operators) = node.find("operators") else {
        return String::new();
    };

    operators
        .children_named("operator")
        .map(|operator| {
            let target = operator
                .children
                .first()
                .map(ParseNode::source_text)
                .unwrap_or_default();
            let postfix = operator
                .find("expr")
                .and_then(ParseNode::postfix)
                .unwrap_or_default();
            format!("{} = {}", target, postfix)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders a successful parse. Failures are reported by the caller, which
/// knows whether they belong on stdout (reports) or stderr.
pub fn render(node: &ParseNode, output: Output) -> String {
    match output {
        Output::Report => Report { ok: true, error: None }.to_string(),
        Output::Tree => to_dot(node),
        Output::Postfix => postfix_listing(node),
    }
}
