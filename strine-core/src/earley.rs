//! Chart parsing engine.
//!
//! A small Earley-style recognizer over the token stream, followed by
//! derivation extraction. The grammar is ambiguous on purpose (the
//! surface language has overlapping spellings), so extraction returns
//! *all* distinct derivations up to a caller-supplied bound, ordered
//! by production declaration order and then by split position; the
//! parser layer decides which derivation survives.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::grammar::{Nt, Rule, Sym, Val};
use crate::lexer::Token;

/// Recognition failure: the position of the offending token and the
/// sorted names of the token kinds that would have been acceptable.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseFailure {
    pub line: u32,
    pub column: u32,
    pub expected: Vec<String>,
}

/// A compiled grammar: the rule table plus the derived lookup tables
/// the recognizer needs.
pub struct Grammar {
    rules: Vec<Rule>,
    by_lhs: HashMap<Nt, Vec<usize>>,
    nullable: HashSet<Nt>,
    start: Nt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Item {
    rule: usize,
    dot: usize,
    origin: usize,
}

impl Grammar {
    pub fn new(rules: Vec<Rule>, start: Nt) -> Self {
        let mut by_lhs: HashMap<Nt, Vec<usize>> = HashMap::new();
        for (idx, rule) in rules.iter().enumerate() {
            by_lhs.entry(rule.lhs).or_default().push(idx);
        }

        // Nullable closure to fixpoint.
        let mut nullable: HashSet<Nt> = HashSet::new();
        loop {
            let mut changed = false;
            for rule in &rules {
                if nullable.contains(&rule.lhs) {
                    continue;
                }
                let all_nullable = rule.rhs.iter().all(|sym| match sym {
                    Sym::T(_) => false,
                    Sym::N(nt) => nullable.contains(nt),
                });
                if all_nullable {
                    nullable.insert(rule.lhs);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        Grammar {
            rules,
            by_lhs,
            nullable,
            start,
        }
    }

    fn next_sym(&self, item: Item) -> Option<Sym> {
        self.rules[item.rule].rhs.get(item.dot).copied()
    }

    /// Recognize and extract up to `limit` derivations of the whole
    /// token stream.
    pub fn parse_all(&self, tokens: &[Token], limit: usize) -> Result<Vec<Val>, ParseFailure> {
        let n = tokens.len();
        let mut sets: Vec<Vec<Item>> = vec![Vec::new(); n + 1];
        let mut seen: Vec<HashSet<Item>> = vec![HashSet::new(); n + 1];
        // Completed spans: (lhs, origin, end) -> producing rules, kept
        // in declaration order for deterministic extraction.
        let mut completed: HashMap<(Nt, usize, usize), Vec<usize>> = HashMap::new();

        let add = |sets: &mut Vec<Vec<Item>>, seen: &mut Vec<HashSet<Item>>, at: usize, item: Item| {
            if seen[at].insert(item) {
                sets[at].push(item);
            }
        };

        for rule in self.by_lhs.get(&self.start).into_iter().flatten() {
            add(
                &mut sets,
                &mut seen,
                0,
                Item {
                    rule: *rule,
                    dot: 0,
                    origin: 0,
                },
            );
        }

        for i in 0..=n {
            let mut j = 0;
            while j < sets[i].len() {
                let item = sets[i][j];
                j += 1;
                match self.next_sym(item) {
                    None => {
                        let lhs = self.rules[item.rule].lhs;
                        let spans = completed.entry((lhs, item.origin, i)).or_default();
                        if !spans.contains(&item.rule) {
                            spans.push(item.rule);
                        }
                        // Complete: advance every item waiting on lhs
                        // at the origin set. The origin set can be the
                        // current one for empty spans, hence the index
                        // loop instead of an iterator.
                        let mut k = 0;
                        while k < sets[item.origin].len() {
                            let waiting = sets[item.origin][k];
                            k += 1;
                            if self.next_sym(waiting) == Some(Sym::N(lhs)) {
                                add(
                                    &mut sets,
                                    &mut seen,
                                    i,
                                    Item {
                                        dot: waiting.dot + 1,
                                        ..waiting
                                    },
                                );
                            }
                        }
                    }
                    Some(Sym::T(kind)) => {
                        if i < n && tokens[i].kind == kind {
                            add(
                                &mut sets,
                                &mut seen,
                                i + 1,
                                Item {
                                    dot: item.dot + 1,
                                    ..item
                                },
                            );
                        }
                    }
                    Some(Sym::N(nt)) => {
                        for rule in self.by_lhs.get(&nt).into_iter().flatten() {
                            add(
                                &mut sets,
                                &mut seen,
                                i,
                                Item {
                                    rule: *rule,
                                    dot: 0,
                                    origin: i,
                                },
                            );
                        }
                        // Nullable prediction: step straight over a
                        // nonterminal that can derive nothing.
                        if self.nullable.contains(&nt) {
                            add(
                                &mut sets,
                                &mut seen,
                                i,
                                Item {
                                    dot: item.dot + 1,
                                    ..item
                                },
                            );
                        }
                    }
                }
            }
            if i < n && sets[i + 1].is_empty() {
                return Err(self.failure(&sets[i], tokens, i));
            }
        }

        if !completed.contains_key(&(self.start, 0, n)) {
            return Err(self.failure(&sets[n], tokens, n));
        }

        let mut extractor = Extractor {
            grammar: self,
            tokens,
            completed: &completed,
            memo: HashMap::new(),
            in_progress: HashSet::new(),
            limit: limit.max(1),
        };
        Ok(extractor.derive_nt(self.start, 0, n))
    }

    fn failure(&self, set: &[Item], tokens: &[Token], at: usize) -> ParseFailure {
        let mut expected: BTreeSet<&'static str> = BTreeSet::new();
        for item in set {
            if let Some(Sym::T(kind)) = self.next_sym(*item) {
                expected.insert(kind.name());
            }
        }
        let (line, column) = match tokens.get(at) {
            Some(tok) => (tok.line, tok.column),
            None => tokens
                .last()
                .map(|tok| (tok.line, tok.column + tok.text.chars().count() as u32))
                .unwrap_or((1, 1)),
        };
        ParseFailure {
            line,
            column,
            expected: expected.into_iter().map(str::to_string).collect(),
        }
    }
}

/// Derivation extraction over the completed-span table. Memoized per
/// span; an in-progress guard breaks derivation cycles (a cyclic span
/// contributes nothing rather than recursing forever).
struct Extractor<'a> {
    grammar: &'a Grammar,
    tokens: &'a [Token],
    completed: &'a HashMap<(Nt, usize, usize), Vec<usize>>,
    memo: HashMap<(Nt, usize, usize), Vec<Val>>,
    in_progress: HashSet<(Nt, usize, usize)>,
    limit: usize,
}

impl Extractor<'_> {
    fn derive_nt(&mut self, nt: Nt, from: usize, to: usize) -> Vec<Val> {
        let key = (nt, from, to);
        if let Some(cached) = self.memo.get(&key) {
            return cached.clone();
        }
        if !self.in_progress.insert(key) {
            return Vec::new();
        }

        let mut out = Vec::new();
        if let Some(rule_ids) = self.completed.get(&key) {
            let mut rule_ids = rule_ids.clone();
            rule_ids.sort_unstable();
            'rules: for rid in rule_ids {
                let rhs = &self.grammar.rules[rid].rhs;
                for children in self.derive_seq(rhs, 0, from, to) {
                    out.push((self.grammar.rules[rid].action)(children));
                    if out.len() >= self.limit {
                        break 'rules;
                    }
                }
            }
        }

        self.in_progress.remove(&key);
        self.memo.insert(key, out.clone());
        out
    }

    /// All ways the tail of `rhs` starting at `pos` can cover the span
    /// `[from, to)`, as child-value rows.
    fn derive_seq(&mut self, rhs: &[Sym], pos: usize, from: usize, to: usize) -> Vec<Vec<Val>> {
        if pos == rhs.len() {
            return if from == to {
                vec![Vec::new()]
            } else {
                Vec::new()
            };
        }
        let mut out = Vec::new();
        match rhs[pos] {
            Sym::T(kind) => {
                if from < to && self.tokens[from].kind == kind {
                    let tok = Val::Tok(self.tokens[from].clone());
                    for mut tail in self.derive_seq(rhs, pos + 1, from + 1, to) {
                        tail.insert(0, tok.clone());
                        out.push(tail);
                        if out.len() >= self.limit {
                            break;
                        }
                    }
                }
            }
            Sym::N(nt) => {
                'splits: for mid in from..=to {
                    if !self.completed.contains_key(&(nt, from, mid)) {
                        continue;
                    }
                    let heads = self.derive_nt(nt, from, mid);
                    if heads.is_empty() {
                        continue;
                    }
                    let tails = self.derive_seq(rhs, pos + 1, mid, to);
                    for head in &heads {
                        for tail in &tails {
                            let mut row = Vec::with_capacity(tail.len() + 1);
                            row.push(head.clone());
                            row.extend(tail.iter().cloned());
                            out.push(row);
                            if out.len() >= self.limit {
                                break 'splits;
                            }
                        }
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinOp, Expr, Stmt};
    use crate::grammar::{rules, Nt};
    use crate::lexer::tokenize;

    fn parse(source: &str, limit: usize) -> Result<Vec<Vec<Stmt>>, ParseFailure> {
        let grammar = Grammar::new(rules(), Nt::Program);
        let tokens = tokenize(source).expect("tokenize");
        let derivations = grammar.parse_all(&tokens, limit)?;
        Ok(derivations
            .into_iter()
            .map(|v| match v {
                Val::Stmts(ss) => ss,
                other => panic!("start symbol produced {other:?}"),
            })
            .collect())
    }

    #[test]
    fn simple_print_has_one_derivation() {
        let programs = parse("crikey! 5", 8).expect("parse");
        assert_eq!(programs.len(), 1);
        assert_eq!(programs[0], vec![Stmt::Print(Expr::Num(5.0))]);
    }

    #[test]
    fn separator_shapes_do_not_multiply_derivations() {
        let programs = parse("crikey! 1.\ncrikey! 2", 8).expect("parse");
        assert_eq!(programs.len(), 1);
        assert_eq!(programs[0].len(), 2);
    }

    #[test]
    fn is_not_yields_inequality_first() {
        let programs = parse("crikey! a is not b", 8).expect("parse");
        assert!(programs.len() >= 2);
        let first = &programs[0][0];
        let Stmt::Print(Expr::BinOp { op, .. }) = first else {
            panic!("expected a comparison print, got {first:?}");
        };
        assert_eq!(*op, BinOp::Ne);
        let second = &programs[1][0];
        let Stmt::Print(Expr::BinOp { op, right, .. }) = second else {
            panic!("expected a comparison print, got {second:?}");
        };
        assert_eq!(*op, BinOp::Eq);
        assert!(matches!(**right, Expr::Not(_)));
    }

    #[test]
    fn extraction_respects_the_bound() {
        let programs = parse("crikey! a is not b", 1).expect("parse");
        assert_eq!(programs.len(), 1);
    }

    #[test]
    fn failure_reports_position_and_expectations() {
        let err = parse("crikey! ,", 8).unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 9);
        assert!(!err.expected.is_empty());
        let sorted = {
            let mut copy = err.expected.clone();
            copy.sort();
            copy
        };
        assert_eq!(sorted, err.expected);
    }

    #[test]
    fn failure_at_end_of_input_points_past_the_last_token() {
        let err = parse("crikey!", 8).unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.column > 7);
        assert!(err.expected.iter().any(|e| e == "number"));
    }

    #[test]
    fn empty_input_fails_to_recognize() {
        assert!(parse("", 8).is_err());
    }

    #[test]
    fn nullable_clauses_do_not_block_recognition() {
        let source = "if x, \n    crikey! 1";
        let programs = parse(source, 8).expect("parse");
        assert_eq!(programs.len(), 1);
        let Stmt::If {
            elifs, else_body, ..
        } = &programs[0][0]
        else {
            panic!("expected an if statement");
        };
        assert!(elifs.is_empty());
        assert!(else_body.is_none());
    }
}
