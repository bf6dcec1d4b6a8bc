//! Parser entry point: runs a start rule over a whole input

use crate::ast::ParseNode;
use crate::grammar::{Grammar, Rule};
use crate::lexer::Tokenizer;
use crate::source::Source;
use crate::{ParseError, ParseResult};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserConfig {
    /// Emit a trace event on entry and exit of every rule.
    pub trace_rules: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Matches `start` against the whole of `source`. Anything left over
    /// after the start rule is a syntax error.
    pub fn parse(&self, source: Source, start: Rule) -> ParseResult<ParseNode> {
        debug!("Parsing {} bytes starting at `{}`", source.text().len(), start);

        let mut tokens = Tokenizer::new(source);
        let node = self.parse_prefix(&mut tokens, start)?;

        let rest = tokens.next_token();
        if !rest.is_end() {
            return Err(ParseError::syntax(start, "end of input", &rest));
        }

        debug!("Parsed {} nodes", node.node_count());
        Ok(node)
    }

    /// Matches `start` at the cursor and leaves it just past the match.
    pub fn parse_prefix(&self, tokens: &mut Tokenizer, start: Rule) -> ParseResult<ParseNode> {
        Grammar::new(self.config.trace_rules).apply(start, tokens)
    }

    pub fn parse_program(&self, text: &str) -> ParseResult<ParseNode> {
        self.parse(Source::new(text), Rule::Program)
    }

    pub fn parse_expr(&self, text: &str) -> ParseResult<ParseNode> {
        self.parse(Source::new(text), Rule::Expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_one_operator_per_assignment() {
        for n in 1..=6 {
            let body: Vec<String> = (0..n).map(|i| format!("V{}={}", "X".repeat(i + 1), i)).collect();
            let text = format!("begin {} end", body.join("; "));
            let node = Parser::new().parse_program(&text).unwrap();
            let operators = node.find("operators").unwrap();
            assert_eq!(operators.children_named("operator").count(), n);
        }
    }

    #[test]
    fn program_postfix_of_the_assignment() {
        let node = Parser::new().parse_program("begin X=1+2+3 end").unwrap();
        let expr = node.find("expr").unwrap();
        assert_eq!(expr.postfix(), Some("1 2 3 + +"));

        let node = Parser::new().parse_program("begin X=not true end").unwrap();
        assert_eq!(node.find("expr").and_then(ParseNode::postfix), Some("true not"));
    }

    #[test]
    fn empty_input_fails_at_program() {
        let err = Parser::new().parse_program("").unwrap_err();
        assert_eq!(err.to_string(), "program: expected `begin`, found <end>");
    }

    #[test]
    fn dangling_semicolon_expects_identifier() {
        let err = Parser::new().parse_program("begin X=1; end").unwrap_err();
        assert_eq!(err.rule(), "id");
        assert_eq!(err.expected(), "identifier");
        assert_eq!(err.found(), "`end`");
    }

    #[test]
    fn chained_relation_fails_expecting_end() {
        let err = Parser::new().parse_program("begin X=1<2<3 end").unwrap_err();
        assert_eq!(err.to_string(), "program: expected `end`, found `<`");
    }

    #[test]
    fn merged_operator_characters_break_the_assignment() {
        let err = Parser::new().parse_program("begin X=-5 end").unwrap_err();
        assert_eq!(err.to_string(), "operator: expected `=`, found `=-`");

        let node = Parser::new().parse_program("begin X= -5 end").unwrap();
        assert_eq!(node.find("expr").and_then(ParseNode::postfix), Some("5 -"));
    }

    #[test]
    fn unclosed_group_surfaces_the_sign_alternative() {
        let err = Parser::new().parse_program("begin X=(1+2 end").unwrap_err();
        assert_eq!(err.to_string(), "sign: expected one of `+`, `-`, found `(`");
    }

    #[test]
    fn stray_characters_are_reported_verbatim() {
        let err = Parser::new().parse_program("begin X=1. end").unwrap_err();
        assert_eq!(err.to_string(), "program: expected `end`, found `.`");
    }

    #[test]
    fn trailing_input_is_rejected() {
        let err = Parser::new().parse_expr("1+").unwrap_err();
        assert_eq!(err.to_string(), "expr: expected end of input, found `+`");

        let err = Parser::new().parse_program("begin X=1 end end").unwrap_err();
        assert_eq!(err.to_string(), "program: expected end of input, found `end`");
    }

    #[test]
    fn bare_expression_mode() {
        let node = Parser::new().parse_expr("-5").unwrap();
        assert_eq!(node.rule, "expr");
        assert_eq!(node.postfix(), Some("5 -"));
    }

    #[test]
    fn parse_prefix_leaves_the_cursor_after_the_match() {
        let parser = Parser::with_config(ParserConfig { trace_rules: true });
        let mut tokens = Tokenizer::from("A*B ; rest");
        let node = parser.parse_prefix(&mut tokens, Rule::Term).unwrap();
        assert_eq!(node.postfix(), Some("A B *"));
        assert_eq!(tokens.next_token().text, ";");
    }

    #[test]
    fn untouched_snapshot_does_not_disturb_the_cursor() {
        let parser = Parser::new();
        let mut tokens = Tokenizer::from("X Y");
        let snapshot = tokens.snapshot();

        let first = parser.parse_prefix(&mut snapshot.snapshot(), Rule::Id).unwrap();
        let again = parser.parse_prefix(&mut snapshot.snapshot(), Rule::Id).unwrap();
        assert_eq!(first, again);

        assert_eq!(tokens.next_token().text, "X");
        assert_eq!(tokens.next_token().text, "Y");
    }

    #[test]
    fn long_chains_and_programs_parse() {
        let n = 20_000;

        let sum = vec!["1"; n].join("+");
        let node = Parser::new().parse_expr(&sum).unwrap();
        let expected = format!("{}{}", vec!["1"; n].join(" "), " +".repeat(n - 1));
        assert_eq!(node.postfix(), Some(expected.as_str()));

        let product = vec!["A"; n].join(" and ");
        let node = Parser::new().parse_expr(&product).unwrap();
        assert!(node.postfix().unwrap().ends_with("A and and"));

        let program = format!("begin {} end", vec!["X=1+2*3"; n].join("; "));
        let node = Parser::new().parse_program(&program).unwrap();
        let operators = node.find("operators").unwrap();
        assert_eq!(operators.children_named("operator").count(), n);
        assert_eq!(operators.children.len(), 2 * n - 1);
    }
}
