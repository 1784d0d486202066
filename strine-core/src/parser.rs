//! Token stream to AST, with the disambiguation policy.
//!
//! The chart engine hands back every derivation it found (bounded).
//! The first derivation always wins; what varies is whether the caller
//! hears about it. Extra derivations that are structurally the same
//! program, or that differ only by the equal-plus-negation spelling of
//! an inequality, are benign duplicates of the grammar itself and are
//! dropped silently. Anything else attaches a non-fatal warning.

use crate::ast::{BinOp, ElifClause, Expr, Stmt};
use crate::earley::{Grammar, ParseFailure};
use crate::error::{TranslateError, Warning};
use crate::grammar::{rules, Nt, Val};
use crate::lexer::Token;

/// Upper bound on extracted derivations. Two is enough to detect
/// ambiguity; a few more keeps the warning count honest.
const DERIVATION_BOUND: usize = 8;

#[derive(Debug)]
pub struct ParseOutcome {
    pub program: Vec<Stmt>,
    pub warnings: Vec<Warning>,
}

pub fn parse(tokens: &[Token]) -> Result<ParseOutcome, TranslateError> {
    let grammar = Grammar::new(rules(), Nt::Program);
    let derivations = grammar
        .parse_all(tokens, DERIVATION_BOUND)
        .map_err(failure_to_error)?;

    let programs: Vec<Vec<Stmt>> = derivations
        .into_iter()
        .map(|val| match val {
            Val::Stmts(stmts) => stmts,
            other => unreachable!("start symbol produced {other:?}"),
        })
        .collect();
    let total = programs.len();
    let mut programs = programs.into_iter();
    let program = programs
        .next()
        .expect("a recognized program has at least one derivation");

    let mut warnings = Vec::new();
    let reference = canon_program(&program);
    if programs.any(|other| canon_program(&other) != reference) {
        warnings.push(Warning::AmbiguousParse { derivations: total });
    }

    Ok(ParseOutcome { program, warnings })
}

fn failure_to_error(failure: ParseFailure) -> TranslateError {
    TranslateError::Parse {
        line: failure.line,
        column: failure.column,
        expected: failure.expected,
    }
}

/// True when two programs are the same up to benign duplication.
pub(crate) fn equivalent(a: &[Stmt], b: &[Stmt]) -> bool {
    canon_program(a) == canon_program(b)
}

fn canon_program(program: &[Stmt]) -> Vec<Stmt> {
    program.iter().map(canon_stmt).collect()
}

fn canon_stmt(stmt: &Stmt) -> Stmt {
    match stmt {
        Stmt::Print(e) => Stmt::Print(canon_expr(e)),
        Stmt::Function { name, params, body } => Stmt::Function {
            name: name.clone(),
            params: params.clone(),
            body: canon_program(body),
        },
        Stmt::Return(e) => Stmt::Return(canon_expr(e)),
        Stmt::Assign { name, value } => Stmt::Assign {
            name: name.clone(),
            value: canon_expr(value),
        },
        Stmt::Reassign { name, value } => Stmt::Reassign {
            name: name.clone(),
            value: canon_expr(value),
        },
        Stmt::Call { name, args } => Stmt::Call {
            name: name.clone(),
            args: args.iter().map(canon_expr).collect(),
        },
        Stmt::List { name, items } => Stmt::List {
            name: name.clone(),
            items: items.iter().map(canon_expr).collect(),
        },
        Stmt::Dict { name, entries } => Stmt::Dict {
            name: name.clone(),
            entries: entries
                .iter()
                .map(|(k, v)| (k.clone(), canon_expr(v)))
                .collect(),
        },
        Stmt::Append { target, item } => Stmt::Append {
            target: target.clone(),
            item: canon_expr(item),
        },
        Stmt::Remove { .. } | Stmt::Pop { .. } => stmt.clone(),
        Stmt::ForEach {
            iterator,
            target,
            body,
        } => Stmt::ForEach {
            iterator: iterator.clone(),
            target: target.clone(),
            body: canon_program(body),
        },
        Stmt::ForEachDict {
            key_var,
            val_var,
            target,
            body,
        } => Stmt::ForEachDict {
            key_var: key_var.clone(),
            val_var: val_var.clone(),
            target: target.clone(),
            body: canon_program(body),
        },
        Stmt::ForRange {
            iterator,
            count,
            body,
        } => Stmt::ForRange {
            iterator: iterator.clone(),
            count: canon_expr(count),
            body: canon_program(body),
        },
        Stmt::WhileNot { condition, body } => Stmt::WhileNot {
            condition: canon_expr(condition),
            body: canon_program(body),
        },
        Stmt::If {
            condition,
            body,
            elifs,
            else_body,
        } => Stmt::If {
            condition: canon_expr(condition),
            body: canon_program(body),
            elifs: elifs
                .iter()
                .map(|clause| ElifClause {
                    condition: canon_expr(&clause.condition),
                    body: canon_program(&clause.body),
                })
                .collect(),
            else_body: else_body.as_deref().map(canon_program),
        },
        Stmt::Import { .. } | Stmt::ImportAll { .. } | Stmt::ImportModule { .. } => stmt.clone(),
        Stmt::Throw(e) => Stmt::Throw(canon_expr(e)),
        Stmt::Assert { condition, body } => Stmt::Assert {
            condition: canon_expr(condition),
            body: canon_program(body),
        },
        Stmt::AssertInline(e) => Stmt::AssertInline(canon_expr(e)),
        Stmt::Input { .. } => stmt.clone(),
    }
}

/// Canonical expression form: both negated-equality spellings rewrite
/// to the inequality operator after the children are canonicalized.
fn canon_expr(expr: &Expr) -> Expr {
    let rebuilt = match expr {
        Expr::Bool(_)
        | Expr::Null
        | Expr::Str(_)
        | Expr::Num(_)
        | Expr::Ident(_)
        | Expr::Empty
        | Expr::IndexKey { .. }
        | Expr::Interp(_) => expr.clone(),
        Expr::BinOp { op, left, right } => Expr::BinOp {
            op: *op,
            left: Box::new(canon_expr(left)),
            right: Box::new(canon_expr(right)),
        },
        Expr::Not(inner) => Expr::Not(Box::new(canon_expr(inner))),
        Expr::Concat { left, right } => Expr::Concat {
            left: Box::new(canon_expr(left)),
            right: Box::new(canon_expr(right)),
        },
        Expr::MethodCall {
            target,
            method,
            args,
        } => Expr::MethodCall {
            target: Box::new(canon_expr(target)),
            method: method.clone(),
            args: args.iter().map(canon_expr).collect(),
        },
        Expr::Call { name, args } => Expr::Call {
            name: name.clone(),
            args: args.iter().map(canon_expr).collect(),
        },
        Expr::Index { target, index } => Expr::Index {
            target: target.clone(),
            index: Box::new(canon_expr(index)),
        },
        Expr::Slice { target, start, end } => Expr::Slice {
            target: target.clone(),
            start: Box::new(canon_expr(start)),
            end: Box::new(canon_expr(end)),
        },
        Expr::ListExpr(items) => Expr::ListExpr(items.iter().map(canon_expr).collect()),
        Expr::DictExpr(entries) => Expr::DictExpr(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), canon_expr(v)))
                .collect(),
        ),
    };

    match rebuilt {
        Expr::BinOp {
            op: BinOp::Eq,
            left,
            right,
        } => match *right {
            Expr::Not(negated) => Expr::BinOp {
                op: BinOp::Ne,
                left,
                right: negated,
            },
            other => Expr::BinOp {
                op: BinOp::Eq,
                left,
                right: Box::new(other),
            },
        },
        Expr::Not(inner) => match *inner {
            Expr::BinOp {
                op: BinOp::Eq,
                left,
                right,
            } => Expr::BinOp {
                op: BinOp::Ne,
                left,
                right,
            },
            other => Expr::Not(Box::new(other)),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_source(source: &str) -> Result<ParseOutcome, TranslateError> {
        parse(&tokenize(source).expect("tokenize"))
    }

    fn ident(name: &str) -> Expr {
        Expr::Ident(name.to_string())
    }

    fn ne(l: Expr, r: Expr) -> Expr {
        Expr::BinOp {
            op: BinOp::Ne,
            left: Box::new(l),
            right: Box::new(r),
        }
    }

    fn eq(l: Expr, r: Expr) -> Expr {
        Expr::BinOp {
            op: BinOp::Eq,
            left: Box::new(l),
            right: Box::new(r),
        }
    }

    #[test]
    fn equal_plus_negation_is_equivalent_to_inequality() {
        let a = vec![Stmt::Print(ne(ident("a"), ident("b")))];
        let b = vec![Stmt::Print(eq(
            ident("a"),
            Expr::Not(Box::new(ident("b"))),
        ))];
        assert!(equivalent(&a, &b));
    }

    #[test]
    fn negated_equality_is_equivalent_to_inequality() {
        let a = vec![Stmt::Print(ne(ident("a"), ident("b")))];
        let b = vec![Stmt::Print(Expr::Not(Box::new(eq(
            ident("a"),
            ident("b"),
        ))))];
        assert!(equivalent(&a, &b));
    }

    #[test]
    fn different_operands_are_not_equivalent() {
        let a = vec![Stmt::Print(ne(ident("a"), ident("b")))];
        let b = vec![Stmt::Print(eq(
            ident("a"),
            Expr::Not(Box::new(ident("c"))),
        ))];
        assert!(!equivalent(&a, &b));
    }

    #[test]
    fn equality_alone_is_not_equivalent_to_inequality() {
        let a = vec![Stmt::Print(ne(ident("a"), ident("b")))];
        let b = vec![Stmt::Print(eq(ident("a"), ident("b")))];
        assert!(!equivalent(&a, &b));
    }

    #[test]
    fn duality_is_detected_under_nesting() {
        let wrap = |e: Expr| {
            vec![Stmt::WhileNot {
                condition: e,
                body: vec![Stmt::Print(Expr::Num(1.0))],
            }]
        };
        let a = wrap(ne(ident("x"), Expr::Num(3.0)));
        let b = wrap(eq(ident("x"), Expr::Not(Box::new(Expr::Num(3.0)))));
        assert!(equivalent(&a, &b));
    }

    #[test]
    fn is_not_parses_silently_to_inequality() {
        let outcome = parse_source("crikey! a is not b").expect("parse");
        assert!(outcome.warnings.is_empty());
        assert_eq!(
            outcome.program,
            vec![Stmt::Print(ne(ident("a"), ident("b")))]
        );
    }

    #[test]
    fn isnt_parses_to_inequality() {
        let outcome = parse_source("crikey! a isn't b").expect("parse");
        assert!(outcome.warnings.is_empty());
        assert_eq!(
            outcome.program,
            vec![Stmt::Print(ne(ident("a"), ident("b")))]
        );
    }

    #[test]
    fn list_reset_warns_and_reassigns() {
        let outcome = parse_source("x is empty").expect("parse");
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(
            outcome.program,
            vec![Stmt::Reassign {
                name: "x".to_string(),
                value: Expr::Empty,
            }]
        );
    }

    #[test]
    fn single_parameter_definition_is_unambiguous_output() {
        let outcome =
            parse_source("greet on the barbie with name:\n    crikey! name").expect("parse");
        assert!(outcome.warnings.is_empty());
        let Stmt::Function { params, .. } = &outcome.program[0] else {
            panic!("expected a function definition");
        };
        assert_eq!(params, &vec!["name".to_string()]);
    }

    #[test]
    fn multi_word_identifiers_join_with_underscores() {
        let outcome =
            parse_source("scoffin snag count from stock!\n    crikey! 1").expect("parse");
        let Stmt::ForEach { iterator, .. } = &outcome.program[0] else {
            panic!("expected a for-each loop");
        };
        assert_eq!(iterator, "snag_count");
    }

    #[test]
    fn parse_failure_carries_sorted_expectations() {
        let err = parse_source("crikey! ,").unwrap_err();
        let TranslateError::Parse { line, expected, .. } = err else {
            panic!("expected a parse error, got {err:?}");
        };
        assert_eq!(line, 1);
        let mut sorted = expected.clone();
        sorted.sort();
        assert_eq!(sorted, expected);
    }
}
