//! Grammar rules and the backtracking engine that applies them
//!
//! Every rule reads tokens from the cursor it is handed. On success the cursor
//! is left just past the matched text; on failure its position is unspecified,
//! so any caller that wants to try something else afterwards hands the rule a
//! snapshot and only restores it once the attempt succeeded.

use crate::ast::ParseNode;
use crate::lexer::{TokenClass, Tokenizer};
use crate::{ParseError, ParseResult};
use std::fmt;
use tracing::trace;

const REL_OPS: &[&str] = &["==", "!=", "<", ">", ">=", "<="];
const SIGNS: &[&str] = &["+", "-"];
const ADD_OPS: &[&str] = &["+", "-", "or"];
const MUL_OPS: &[&str] = &["*", "/", "div", "mod", "and"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Program,
    Operators,
    MoreOperators,
    Operator,
    Expr,
    PrExpr,
    MorePrExpr,
    Term,
    MoreTerm,
    Factor,
    RelOp,
    Sign,
    AddOp,
    MulOp,
    Id,
    Const,
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Program => "program",
            Rule::Operators => "operators",
            Rule::MoreOperators => "more_operators",
            Rule::Operator => "operator",
            Rule::Expr => "expr",
            Rule::PrExpr => "pr_expr",
            Rule::MorePrExpr => "more_pr_expr",
            Rule::Term => "term",
            Rule::MoreTerm => "more_term",
            Rule::Factor => "factor",
            Rule::RelOp => "rel_op",
            Rule::Sign => "sign",
            Rule::AddOp => "add_op",
            Rule::MulOp => "mul_op",
            Rule::Id => "id",
            Rule::Const => "const",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Applies rules to a token cursor.
///
/// The only state is the nesting depth used when rule tracing is on.
#[derive(Debug, Default)]
pub struct Grammar {
    trace: bool,
    depth: usize,
}

impl Grammar {
    pub fn new(trace: bool) -> Self {
        Self { trace, depth: 0 }
    }

    pub fn apply(&mut self, rule: Rule, tokens: &mut Tokenizer) -> ParseResult<ParseNode> {
        self.instrumented(rule, |grammar| grammar.dispatch(rule, tokens))
    }

    fn instrumented<F>(&mut self, rule: Rule, apply: F) -> ParseResult<ParseNode>
    where
        F: FnOnce(&mut Self) -> ParseResult<ParseNode>,
    {
        if !self.trace {
            return apply(self);
        }

        trace!(depth = self.depth, %rule, "applying rule");
        self.depth += 1;
        let result = apply(self);
        self.depth -= 1;

        match &result {
            Ok(node) => trace!(
                depth = self.depth,
                %rule,
                postfix = node.postfix().unwrap_or_default(),
                "rule matched"
            ),
            Err(err) => trace!(depth = self.depth, %rule, error = %err, "rule failed"),
        }
        result
    }

    fn dispatch(&mut self, rule: Rule, tokens: &mut Tokenizer) -> ParseResult<ParseNode> {
        match rule {
            Rule::Program => self.program(tokens),
            Rule::Operators | Rule::MoreOperators => self.operator_list(rule, tokens),
            Rule::Operator => self.operator(tokens),
            Rule::Expr => self.expr(tokens),
            Rule::PrExpr => self.pr_expr(tokens),
            Rule::MorePrExpr => self.continuation(rule, Rule::AddOp, Rule::Term, tokens),
            Rule::Term => self.term(tokens),
            Rule::MoreTerm => self.continuation(rule, Rule::MulOp, Rule::Factor, tokens),
            Rule::Factor => self.factor(tokens),
            Rule::RelOp => one_of(rule, REL_OPS, tokens),
            Rule::Sign => one_of(rule, SIGNS, tokens),
            Rule::AddOp => one_of(rule, ADD_OPS, tokens),
            Rule::MulOp => one_of(rule, MUL_OPS, tokens),
            Rule::Id => id(tokens),
            Rule::Const => constant(tokens),
        }
    }

    /// Runs `rule` on a snapshot and keeps its progress only if it matched.
    fn attempt(&mut self, rule: Rule, tokens: &mut Tokenizer) -> Option<ParseNode> {
        let mut ahead = tokens.snapshot();
        let node = self.apply(rule, &mut ahead).ok()?;
        tokens.restore(ahead);
        Some(node)
    }

    fn program(&mut self, tokens: &mut Tokenizer) -> ParseResult<ParseNode> {
        let begin = tokens.next_token();
        if !begin.is("begin") {
            return Err(ParseError::syntax(Rule::Program, "`begin`", &begin));
        }

        let operators = self.apply(Rule::Operators, tokens)?;

        let end = tokens.next_token();
        if !end.is("end") {
            return Err(ParseError::syntax(Rule::Program, "`end`", &end));
        }

        Ok(ParseNode::branch(
            Rule::Program.name(),
            vec![ParseNode::terminal("begin"), operators, ParseNode::terminal("end")],
        ))
    }

    /// `operator (';' operator)*` as one flat node holding an `operator`
    /// child per assignment.
    fn operator_list(&mut self, rule: Rule, tokens: &mut Tokenizer) -> ParseResult<ParseNode> {
        let mut children = vec![self.apply(Rule::Operator, tokens)?];

        loop {
            let mut ahead = tokens.snapshot();
            if !ahead.next_token().is(";") {
                break;
            }

            // a `;` commits to another assignment; its failure is the answer
            let operator = self.apply(Rule::Operator, &mut ahead)?;
            tokens.restore(ahead);
            children.push(ParseNode::terminal(";"));
            children.push(operator);
        }

        Ok(ParseNode::branch(rule.name(), children))
    }

    fn operator(&mut self, tokens: &mut Tokenizer) -> ParseResult<ParseNode> {
        let id = self.apply(Rule::Id, tokens)?;

        let assign = tokens.next_token();
        if !assign.is("=") {
            return Err(ParseError::syntax(Rule::Operator, "`=`", &assign));
        }

        let expr = self.apply(Rule::Expr, tokens)?;

        Ok(ParseNode::branch(
            Rule::Operator.name(),
            vec![id, ParseNode::terminal("="), expr],
        ))
    }

    fn expr(&mut self, tokens: &mut Tokenizer) -> ParseResult<ParseNode> {
        let left = self.apply(Rule::PrExpr, tokens)?;

        let mut ahead = tokens.snapshot();
        let op = match self.apply(Rule::RelOp, &mut ahead) {
            Ok(op) => op,
            Err(_) => {
                let postfix = left.postfix_str().to_string();
                return Ok(ParseNode::branch(Rule::Expr.name(), vec![left]).with_postfix(postfix));
            }
        };

        let right = self.apply(Rule::PrExpr, &mut ahead)?;
        tokens.restore(ahead);

        let postfix = join_postfix(&[&left, &right, &op]);
        Ok(ParseNode::branch(Rule::Expr.name(), vec![left, op, right]).with_postfix(postfix))
    }

    fn pr_expr(&mut self, tokens: &mut Tokenizer) -> ParseResult<ParseNode> {
        if let Some(term) = self.attempt(Rule::Term, tokens) {
            let node = match self.attempt(Rule::MorePrExpr, tokens) {
                Some(more) => {
                    let postfix = join_postfix(&[&term, &more]);
                    ParseNode::branch(Rule::PrExpr.name(), vec![term, more]).with_postfix(postfix)
                }
                None => {
                    let postfix = term.postfix_str().to_string();
                    ParseNode::branch(Rule::PrExpr.name(), vec![term]).with_postfix(postfix)
                }
            };
            return Ok(node);
        }

        let mut ahead = tokens.snapshot();
        let sign = self.apply(Rule::Sign, &mut ahead)?;
        let term = self.apply(Rule::Term, &mut ahead)?;

        // the sign goes after its operand, ahead of any continuation
        let node = match self.attempt(Rule::MorePrExpr, &mut ahead) {
            Some(more) => {
                let postfix = join_postfix(&[&term, &sign, &more]);
                ParseNode::branch(Rule::PrExpr.name(), vec![sign, term, more]).with_postfix(postfix)
            }
            None => {
                let postfix = join_postfix(&[&term, &sign]);
                ParseNode::branch(Rule::PrExpr.name(), vec![sign, term]).with_postfix(postfix)
            }
        };
        tokens.restore(ahead);
        Ok(node)
    }

    /// `op operand [rule]` for the right-recursive tails of `pr_expr` and
    /// `term`. Each operator is emitted after its operand and everything the
    /// nested tail produced, so a chain reads operands left to right and
    /// then operators right to left.
    ///
    /// The links are collected in a loop and nested afterwards. Only the
    /// outermost node carries the postfix of the whole chain.
    fn continuation(
        &mut self,
        rule: Rule,
        op_rule: Rule,
        operand_rule: Rule,
        tokens: &mut Tokenizer,
    ) -> ParseResult<ParseNode> {
        let op = self.apply(op_rule, tokens)?;
        let operand = self.apply(operand_rule, tokens)?;

        let mut tail = Vec::new();
        loop {
            let mut ahead = tokens.snapshot();
            let Ok(next_op) = self.apply(op_rule, &mut ahead) else {
                break;
            };
            let Ok(next_operand) = self.apply(operand_rule, &mut ahead) else {
                break;
            };
            tokens.restore(ahead);
            tail.push((next_op, next_operand));
        }

        let postfix = std::iter::once(operand.postfix_str())
            .chain(tail.iter().map(|(_, operand)| operand.postfix_str()))
            .chain(tail.iter().rev().map(|(op, _)| op.postfix_str()))
            .chain(std::iter::once(op.postfix_str()))
            .collect::<Vec<_>>()
            .join(" ");

        let nested = tail.into_iter().rev().fold(None::<ParseNode>, |more, (op, operand)| {
            let mut children = vec![op, operand];
            children.extend(more);
            Some(ParseNode::branch(rule.name(), children))
        });

        let mut children = vec![op, operand];
        children.extend(nested);
        Ok(ParseNode::branch(rule.name(), children).with_postfix(postfix))
    }

    fn term(&mut self, tokens: &mut Tokenizer) -> ParseResult<ParseNode> {
        let factor = self.apply(Rule::Factor, tokens)?;

        let node = match self.attempt(Rule::MoreTerm, tokens) {
            Some(more) => {
                let postfix = join_postfix(&[&factor, &more]);
                ParseNode::branch(Rule::Term.name(), vec![factor, more]).with_postfix(postfix)
            }
            None => {
                let postfix = factor.postfix_str().to_string();
                ParseNode::branch(Rule::Term.name(), vec![factor]).with_postfix(postfix)
            }
        };
        Ok(node)
    }

    fn factor(&mut self, tokens: &mut Tokenizer) -> ParseResult<ParseNode> {
        // id and const share nothing but the token class, so each is a full attempt
        for operand in [Rule::Id, Rule::Const] {
            if let Some(node) = self.attempt(operand, tokens) {
                let postfix = node.postfix_str().to_string();
                return Ok(ParseNode::branch(Rule::Factor.name(), vec![node]).with_postfix(postfix));
            }
        }

        let mut ahead = tokens.snapshot();
        let token = ahead.next_token();

        let node = if token.is("(") {
            let inner = self.apply(Rule::Expr, &mut ahead)?;

            let close = ahead.next_token();
            if !close.is(")") {
                return Err(ParseError::syntax(Rule::Factor, "`)`", &close));
            }

            let postfix = inner.postfix_str().to_string();
            ParseNode::branch(
                Rule::Factor.name(),
                vec![ParseNode::terminal("("), inner, ParseNode::terminal(")")],
            )
            .with_postfix(postfix)
        } else if token.is("not") {
            let operand = self.apply(Rule::Factor, &mut ahead)?;
            let postfix = format!("{} not", operand.postfix_str());
            ParseNode::branch(Rule::Factor.name(), vec![ParseNode::terminal("not"), operand])
                .with_postfix(postfix)
        } else {
            return Err(ParseError::syntax(Rule::Factor, "`(` or `not`", &token));
        };

        tokens.restore(ahead);
        Ok(node)
    }
}

fn join_postfix(parts: &[&ParseNode]) -> String {
    parts
        .iter()
        .map(|node| node.postfix_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `rule` wrapping a single leaf; the leaf text is its postfix.
fn leaf(rule: Rule, text: String) -> ParseNode {
    ParseNode::branch(rule.name(), vec![ParseNode::terminal(text.clone())]).with_postfix(text)
}

fn one_of(rule: Rule, choices: &[&str], tokens: &mut Tokenizer) -> ParseResult<ParseNode> {
    let token = tokens.next_token();
    if choices.iter().any(|choice| token.is(choice)) {
        return Ok(leaf(rule, token.text));
    }

    let expected = choices
        .iter()
        .map(|choice| format!("`{}`", choice))
        .collect::<Vec<_>>()
        .join(", ");
    Err(ParseError::syntax(rule, format!("one of {}", expected), &token))
}

fn id(tokens: &mut Tokenizer) -> ParseResult<ParseNode> {
    let token = tokens.next_token();
    if token.class == TokenClass::Identifier {
        Ok(leaf(Rule::Id, token.text))
    } else {
        Err(ParseError::syntax(Rule::Id, "identifier", &token))
    }
}

fn constant(tokens: &mut Tokenizer) -> ParseResult<ParseNode> {
    let token = tokens.next_token();
    let numeric = token.class == TokenClass::Constant && token.text.bytes().all(|b| b.is_ascii_digit());
    if numeric || token.is("true") || token.is("false") {
        Ok(leaf(Rule::Const, token.text))
    } else {
        Err(ParseError::syntax(
            Rule::Const,
            "`true`, `false` or an integer constant",
            &token,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn apply(rule: Rule, input: &str) -> ParseResult<ParseNode> {
        Grammar::new(false).apply(rule, &mut Tokenizer::from(input))
    }

    fn postfix(input: &str) -> String {
        apply(Rule::Expr, input)
            .unwrap()
            .postfix()
            .unwrap()
            .to_string()
    }

    #[rstest]
    #[case("1+2+3", "1 2 3 + +")]
    #[case("1+2*3", "1 2 3 * +")]
    #[case("(1+2)*3", "1 2 + 3 *")]
    #[case("not true", "true not")]
    #[case("not not false", "false not not")]
    #[case("-5", "5 -")]
    #[case("-A+B", "A - B +")]
    #[case("A*B+C", "A B * C +")]
    #[case("X div 2 mod 3", "X 2 3 mod div")]
    #[case("1 or 0 and 1", "1 0 1 and or")]
    #[case("A<B", "A B <")]
    #[case("A >= B+1", "A B 1 + >=")]
    #[case("(A == B) != false", "A B == false !=")]
    #[case("((7))", "7")]
    fn derives_postfix(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(postfix(input), expected);
    }

    #[test]
    fn chain_nests_one_tail_per_operator() {
        let node = apply(Rule::PrExpr, "1+2-3").unwrap();
        assert_eq!(node.postfix(), Some("1 2 3 - +"));

        let more = &node.children[1];
        assert_eq!(more.rule, "more_pr_expr");
        assert_eq!(more.postfix(), Some("2 3 - +"));
        let rules: Vec<&str> = more.children.iter().map(|c| c.rule.as_str()).collect();
        assert_eq!(rules, vec!["add_op", "term", "more_pr_expr"]);

        let inner = &more.children[2];
        assert_eq!(inner.children.len(), 2);
        assert_eq!(inner.source_text(), "- 3");
    }

    #[test]
    fn chain_stops_before_an_unfinished_link() {
        let mut tokens = Tokenizer::from("2*3*");
        let node = Grammar::new(false).apply(Rule::Term, &mut tokens).unwrap();
        assert_eq!(node.postfix(), Some("2 3 *"));
        assert_eq!(tokens.next_token().text, "*");
        assert!(tokens.next_token().is_end());
    }

    #[rstest]
    #[case(Rule::Id, "ABC", "ABC")]
    #[case(Rule::Const, "42", "42")]
    #[case(Rule::Const, "true", "true")]
    #[case(Rule::RelOp, "<=", "<=")]
    #[case(Rule::AddOp, "or", "or")]
    #[case(Rule::MulOp, "mod", "mod")]
    #[case(Rule::Sign, "-", "-")]
    fn terminal_rules_wrap_one_leaf(#[case] rule: Rule, #[case] input: &str, #[case] text: &str) {
        let node = apply(rule, input).unwrap();
        assert_eq!(node.rule, rule.name());
        assert_eq!(node.postfix(), Some(text));
        assert_eq!(node.children.len(), 1);
        assert!(node.children[0].is_terminal());
        assert_eq!(node.children[0].text.as_deref(), Some(text));
    }

    #[rstest]
    #[case(Rule::Const, "abc", "const: expected `true`, `false` or an integer constant, found `abc`")]
    #[case(Rule::Const, "X", "const: expected `true`, `false` or an integer constant, found `X`")]
    #[case(Rule::Id, "x", "id: expected identifier, found `x`")]
    #[case(Rule::Id, "", "id: expected identifier, found <end>")]
    #[case(Rule::AddOp, "*", "add_op: expected one of `+`, `-`, `or`, found `*`")]
    #[case(
        Rule::RelOp,
        "=",
        "rel_op: expected one of `==`, `!=`, `<`, `>`, `>=`, `<=`, found `=`"
    )]
    #[case(Rule::Factor, ")", "factor: expected `(` or `not`, found `)`")]
    #[case(Rule::Factor, "(1", "factor: expected `)`, found <end>")]
    fn rule_failures_name_rule_expectation_and_token(
        #[case] rule: Rule,
        #[case] input: &str,
        #[case] message: &str,
    ) {
        assert_eq!(apply(rule, input).unwrap_err().to_string(), message);
    }

    #[test]
    fn program_flattens_assignments_in_source_order() {
        let node = apply(Rule::Program, "begin A=1; B=2; C=A+B end").unwrap();
        let operators = node.find("operators").unwrap();

        let names: Vec<String> = operators
            .children_named("operator")
            .map(|op| op.children[0].source_text())
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(operators.children.len(), 5);
        assert!(node.find("more_operators").is_none());
    }

    #[test]
    fn program_tree_shape() {
        let node = apply(Rule::Program, "begin X=1 end").unwrap();
        let rules: Vec<&str> = node.children.iter().map(|c| c.rule.as_str()).collect();
        assert_eq!(rules, vec!["terminal", "operators", "terminal"]);
        assert_eq!(node.postfix(), None);

        let operator = node.find("operator").unwrap();
        assert_eq!(operator.children[1].text.as_deref(), Some("="));
        assert_eq!(operator.find("expr").and_then(ParseNode::postfix), Some("1"));
    }

    #[test]
    fn relation_keeps_only_one_operator() {
        let mut tokens = Tokenizer::from("1<2<3");
        let node = Grammar::new(false).apply(Rule::Expr, &mut tokens).unwrap();
        assert_eq!(node.postfix(), Some("1 2 <"));
        assert_eq!(tokens.next_token().text, "<");
    }

    #[test]
    fn failed_tail_leaves_cursor_after_the_operand() {
        let mut tokens = Tokenizer::from("1+");
        let node = Grammar::new(false).apply(Rule::PrExpr, &mut tokens).unwrap();
        assert_eq!(node.postfix(), Some("1"));
        assert_eq!(tokens.next_token().text, "+");
    }

    #[test]
    fn missing_operand_reports_the_last_alternative() {
        let err = apply(Rule::PrExpr, "end").unwrap_err();
        assert_eq!(err.to_string(), "sign: expected one of `+`, `-`, found `end`");

        let err = apply(Rule::PrExpr, "-end").unwrap_err();
        assert_eq!(err.rule(), "factor");
    }

    #[test]
    fn applying_a_snapshot_twice_gives_the_same_tree() {
        let tokens = Tokenizer::from("begin X=(1+2)*3; Y=not X end");
        let mut grammar = Grammar::new(true);

        let first = grammar.apply(Rule::Program, &mut tokens.snapshot());
        let second = grammar.apply(Rule::Program, &mut tokens.snapshot());
        assert_eq!(first, second);
        assert!(first.is_ok());
    }
}
