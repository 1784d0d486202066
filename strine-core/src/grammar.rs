//! The Strine grammar as an ordered table of productions.
//!
//! Each [`Rule`] pairs a right-hand side over [`Sym`] with a reduction
//! action that builds a [`Val`] from the child values. Declaration
//! order is significant: when the chart engine extracts several
//! derivations for one span, it tries rules in this order, and the
//! parser keeps the first derivation. The not-equal production is
//! therefore declared ahead of the equality production, and list
//! reassignment ahead of plain assignment.

use crate::ast::{BinOp, ElifClause, Expr, ListEnd, Segment, Stmt};
use crate::lexer::{Token, TokenKind};

/// Nonterminals of the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nt {
    Program,
    TopStatements,
    LeadingNl,
    Stmtend,
    Statement,
    Statements,
    Block,
    IdentWord,
    MultiIdent,
    PrintStmt,
    FuncDef,
    OffBarbie,
    OptOffBarbie,
    CommaList,
    ParamList,
    ReturnStmt,
    Reassignment,
    Assignment,
    Expression,
    CompareExpr,
    AddExpr,
    MulExpr,
    UnaryExpr,
    ChainExpr,
    ChainArgs,
    Primary,
    KeywordAsIdent,
    FlaminExpr,
    FrothinExpr,
    SpewinExpr,
    EmptyExpr,
    FuncCall,
    FuncCallExpr,
    ArgList,
    EskyDef,
    EskyItems,
    EskyItem,
    EskyExpr,
    TuckshopDef,
    TuckshopItems,
    TuckshopItem,
    TuckshopExpr,
    AppendStmt,
    TopUpStmt,
    RemoveStmt,
    PopStmt,
    GrabExpr,
    SliceExpr,
    ScoffinLoop,
    DealinLoop,
    ParcelLoop,
    EveryLoop,
    TilLoop,
    OptLoopEnd,
    LoopEnd,
    FullySickEnd,
    IfStmt,
    ElifClauses,
    Elif,
    ElseClause,
    OptMakeTracks,
    ImportStmt,
    BuggerStmt,
    SussStmt,
    GimmeStmt,
}

/// A grammar symbol: terminal token kind or nonterminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sym {
    T(TokenKind),
    N(Nt),
}

/// Semantic value flowing through reduction actions.
#[derive(Debug, Clone)]
pub enum Val {
    Tok(Token),
    Stmt(Stmt),
    Stmts(Vec<Stmt>),
    Expr(Expr),
    Exprs(Vec<Expr>),
    Name(String),
    Names(Vec<String>),
    Entry((String, Expr)),
    Entries(Vec<(String, Expr)>),
    Elif(ElifClause),
    Elifs(Vec<ElifClause>),
    OptStmts(Option<Vec<Stmt>>),
    Unit,
}

pub type Action = fn(Vec<Val>) -> Val;

/// One production with its reduction action.
pub struct Rule {
    pub lhs: Nt,
    pub rhs: Vec<Sym>,
    pub action: Action,
}

fn t(kind: TokenKind) -> Sym {
    Sym::T(kind)
}

fn n(nt: Nt) -> Sym {
    Sym::N(nt)
}

// -- child-value extractors; misuse means rule table and action are
// out of step, which is a bug, not an input error --

fn take(d: &mut Vec<Val>, i: usize) -> Val {
    std::mem::replace(&mut d[i], Val::Unit)
}

fn tok(v: Val) -> Token {
    match v {
        Val::Tok(t) => t,
        other => unreachable!("action expected a token, got {other:?}"),
    }
}

fn text(v: Val) -> String {
    tok(v).text
}

fn expr(v: Val) -> Expr {
    match v {
        Val::Expr(e) => e,
        other => unreachable!("action expected an expression, got {other:?}"),
    }
}

fn exprs(v: Val) -> Vec<Expr> {
    match v {
        Val::Exprs(es) => es,
        other => unreachable!("action expected an expression list, got {other:?}"),
    }
}

fn stmt(v: Val) -> Stmt {
    match v {
        Val::Stmt(s) => s,
        other => unreachable!("action expected a statement, got {other:?}"),
    }
}

fn stmts(v: Val) -> Vec<Stmt> {
    match v {
        Val::Stmts(ss) => ss,
        other => unreachable!("action expected a statement list, got {other:?}"),
    }
}

fn name(v: Val) -> String {
    match v {
        Val::Name(s) => s,
        other => unreachable!("action expected a name, got {other:?}"),
    }
}

fn names(v: Val) -> Vec<String> {
    match v {
        Val::Names(ns) => ns,
        other => unreachable!("action expected a name list, got {other:?}"),
    }
}

fn entry(v: Val) -> (String, Expr) {
    match v {
        Val::Entry(e) => e,
        other => unreachable!("action expected a dict entry, got {other:?}"),
    }
}

fn entries(v: Val) -> Vec<(String, Expr)> {
    match v {
        Val::Entries(es) => es,
        other => unreachable!("action expected dict entries, got {other:?}"),
    }
}

fn elif(v: Val) -> ElifClause {
    match v {
        Val::Elif(e) => e,
        other => unreachable!("action expected an elif clause, got {other:?}"),
    }
}

fn elifs(v: Val) -> Vec<ElifClause> {
    match v {
        Val::Elifs(es) => es,
        other => unreachable!("action expected elif clauses, got {other:?}"),
    }
}

fn opt_stmts(v: Val) -> Option<Vec<Stmt>> {
    match v {
        Val::OptStmts(o) => o,
        other => unreachable!("action expected an optional block, got {other:?}"),
    }
}

/// Multi-word identifier segments join with `_`.
fn join(parts: Vec<String>) -> String {
    parts.join("_")
}

fn number(v: Val) -> f64 {
    text(v)
        .parse()
        .expect("number token text is lexer-validated")
}

fn binop(op: BinOp, mut d: Vec<Val>, left: usize, right: usize) -> Val {
    Val::Expr(Expr::BinOp {
        op,
        left: Box::new(expr(take(&mut d, left))),
        right: Box::new(expr(take(&mut d, right))),
    })
}

/// A `"..."` literal with `${name}` references becomes an interpolated
/// expression; anything else stays a plain string.
pub fn string_expr(textual: &str) -> Expr {
    fn is_ref(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    let mut segments = Vec::new();
    let mut lit = String::new();
    let mut rest = textual;
    let mut any = false;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(close) if is_ref(&after[..close]) => {
                lit.push_str(&rest[..start]);
                if !lit.is_empty() {
                    segments.push(Segment::Lit(std::mem::take(&mut lit)));
                }
                segments.push(Segment::Var(after[..close].to_string()));
                any = true;
                rest = &after[close + 1..];
            }
            _ => {
                lit.push_str(&rest[..start + 2]);
                rest = after;
            }
        }
    }
    lit.push_str(rest);
    if any {
        if !lit.is_empty() {
            segments.push(Segment::Lit(lit));
        }
        Expr::Interp(segments)
    } else {
        Expr::Str(textual.to_string())
    }
}

/// The full production table, in disambiguation order.
pub fn rules() -> Vec<Rule> {
    use Nt::*;
    use TokenKind as K;

    let mut rules: Vec<Rule> = Vec::new();
    let mut r = |lhs: Nt, rhs: Vec<Sym>, action: Action| {
        rules.push(Rule { lhs, rhs, action });
    };

    // Program skeleton. A statement separator is one newline or one
    // period; a period at end of line arrives as two separators and
    // the trailing-separator production absorbs the extras.
    r(Program, vec![n(TopStatements)], |mut d| take(&mut d, 0));
    r(Stmtend, vec![t(K::Newline)], |_| Val::Unit);
    r(Stmtend, vec![t(K::Dot)], |_| Val::Unit);
    r(LeadingNl, vec![], |_| Val::Unit);
    r(LeadingNl, vec![n(LeadingNl), t(K::Newline)], |_| Val::Unit);
    r(TopStatements, vec![n(LeadingNl), n(Statement)], |mut d| {
        Val::Stmts(vec![stmt(take(&mut d, 1))])
    });
    r(
        TopStatements,
        vec![n(TopStatements), n(Stmtend), n(Statement)],
        |mut d| {
            let mut ss = stmts(take(&mut d, 0));
            ss.push(stmt(take(&mut d, 2)));
            Val::Stmts(ss)
        },
    );
    r(TopStatements, vec![n(TopStatements), n(Stmtend)], |mut d| {
        take(&mut d, 0)
    });

    // Statement alternatives. Reassignment precedes assignment so that
    // `x is empty` resets an existing binding instead of redeclaring it.
    for alt in [
        PrintStmt,
        FuncDef,
        ReturnStmt,
        Reassignment,
        Assignment,
        EskyDef,
        TuckshopDef,
        FuncCall,
        AppendStmt,
        TopUpStmt,
        RemoveStmt,
        PopStmt,
        ScoffinLoop,
        DealinLoop,
        ParcelLoop,
        EveryLoop,
        TilLoop,
        IfStmt,
        ImportStmt,
        BuggerStmt,
        SussStmt,
        GimmeStmt,
    ] {
        r(Statement, vec![n(alt)], |mut d| take(&mut d, 0));
    }

    // Multi-word identifiers: plain identifiers plus the soft keywords
    // that double as ordinary words.
    r(IdentWord, vec![t(K::Ident)], |mut d| {
        Val::Name(text(take(&mut d, 0)))
    });
    r(IdentWord, vec![t(K::The)], |_| Val::Name("the".to_string()));
    r(IdentWord, vec![t(K::Snag)], |_| {
        Val::Name("snag".to_string())
    });
    r(IdentWord, vec![t(K::Full)], |_| {
        Val::Name("full".to_string())
    });
    r(IdentWord, vec![t(K::Got)], |_| Val::Name("got".to_string()));
    r(IdentWord, vec![t(K::Last)], |_| {
        Val::Name("last".to_string())
    });
    r(IdentWord, vec![t(K::First)], |_| {
        Val::Name("first".to_string())
    });
    r(IdentWord, vec![t(K::Lot)], |_| Val::Name("lot".to_string()));
    r(MultiIdent, vec![n(IdentWord)], |mut d| {
        Val::Names(vec![name(take(&mut d, 0))])
    });
    r(MultiIdent, vec![n(MultiIdent), n(IdentWord)], |mut d| {
        let mut ns = names(take(&mut d, 0));
        ns.push(name(take(&mut d, 1)));
        Val::Names(ns)
    });

    r(
        PrintStmt,
        vec![t(K::Crikey), t(K::Bang), n(Expression)],
        |mut d| Val::Stmt(Stmt::Print(expr(take(&mut d, 2)))),
    );

    // Function definitions, `prep` form and on-the-barbie form.
    r(
        FuncDef,
        vec![t(K::Prep), t(K::Ident), t(K::Barbie), n(Block)],
        |mut d| {
            Val::Stmt(Stmt::Function {
                name: text(take(&mut d, 1)),
                params: Vec::new(),
                body: stmts(take(&mut d, 3)),
            })
        },
    );
    r(
        FuncDef,
        vec![
            t(K::Prep),
            t(K::Ident),
            t(K::Barbie),
            t(K::With),
            n(ParamList),
            n(Block),
        ],
        |mut d| {
            Val::Stmt(Stmt::Function {
                name: text(take(&mut d, 1)),
                params: names(take(&mut d, 4)),
                body: stmts(take(&mut d, 5)),
            })
        },
    );
    r(
        FuncDef,
        vec![
            t(K::Ident),
            t(K::On),
            t(K::The),
            t(K::Barbie),
            t(K::Colon),
            n(Block),
            n(OptOffBarbie),
        ],
        |mut d| {
            Val::Stmt(Stmt::Function {
                name: text(take(&mut d, 0)),
                params: Vec::new(),
                body: stmts(take(&mut d, 5)),
            })
        },
    );
    r(
        FuncDef,
        vec![
            t(K::Ident),
            t(K::On),
            t(K::The),
            t(K::Barbie),
            t(K::With),
            n(CommaList),
            t(K::Colon),
            n(Block),
            n(OptOffBarbie),
        ],
        |mut d| {
            Val::Stmt(Stmt::Function {
                name: text(take(&mut d, 0)),
                params: names(take(&mut d, 5)),
                body: stmts(take(&mut d, 7)),
            })
        },
    );
    r(
        FuncDef,
        vec![
            t(K::Ident),
            t(K::On),
            t(K::The),
            t(K::Barbie),
            t(K::With),
            n(ParamList),
            t(K::Colon),
            n(Block),
            n(OptOffBarbie),
        ],
        |mut d| {
            Val::Stmt(Stmt::Function {
                name: text(take(&mut d, 0)),
                params: names(take(&mut d, 5)),
                body: stmts(take(&mut d, 7)),
            })
        },
    );
    r(OptOffBarbie, vec![], |_| Val::Unit);
    r(OptOffBarbie, vec![n(OffBarbie)], |_| Val::Unit);
    r(
        OffBarbie,
        vec![t(K::Off), t(K::The), t(K::Barbie), t(K::Dot)],
        |_| Val::Unit,
    );
    r(CommaList, vec![n(MultiIdent)], |mut d| {
        Val::Names(vec![join(names(take(&mut d, 0)))])
    });
    r(
        CommaList,
        vec![n(CommaList), t(K::Comma), n(MultiIdent)],
        |mut d| {
            let mut ns = names(take(&mut d, 0));
            ns.push(join(names(take(&mut d, 2))));
            Val::Names(ns)
        },
    );
    r(ParamList, vec![n(MultiIdent)], |mut d| {
        Val::Names(vec![join(names(take(&mut d, 0)))])
    });
    r(
        ParamList,
        vec![n(ParamList), t(K::And), n(MultiIdent)],
        |mut d| {
            let mut ns = names(take(&mut d, 0));
            ns.push(join(names(take(&mut d, 2))));
            Val::Names(ns)
        },
    );

    r(ReturnStmt, vec![t(K::Fair), t(K::Go), n(Expression)], |mut d| {
        Val::Stmt(Stmt::Return(expr(take(&mut d, 2))))
    });

    r(
        Reassignment,
        vec![t(K::Ident), t(K::Is), t(K::Empty)],
        |mut d| {
            Val::Stmt(Stmt::Reassign {
                name: text(take(&mut d, 0)),
                value: Expr::Empty,
            })
        },
    );
    r(Assignment, vec![t(K::Ident), t(K::Is), n(Expression)], |mut d| {
        Val::Stmt(Stmt::Assign {
            name: text(take(&mut d, 0)),
            value: expr(take(&mut d, 2)),
        })
    });

    // Expression precedence, loosest first. `and` is space-joining
    // string concatenation and binds loosest of all.
    r(Expression, vec![n(CompareExpr)], |mut d| take(&mut d, 0));
    r(Expression, vec![n(Expression), t(K::And), n(CompareExpr)], |mut d| {
        Val::Expr(Expr::Concat {
            left: Box::new(expr(take(&mut d, 0))),
            right: Box::new(expr(take(&mut d, 2))),
        })
    });
    r(CompareExpr, vec![n(AddExpr)], |mut d| take(&mut d, 0));
    r(
        CompareExpr,
        vec![n(AddExpr), t(K::Tops), n(AddExpr)],
        |d| binop(BinOp::Gt, d, 0, 2),
    );
    r(
        CompareExpr,
        vec![n(AddExpr), t(K::Cops), n(AddExpr)],
        |d| binop(BinOp::Lt, d, 0, 2),
    );
    r(
        CompareExpr,
        vec![n(AddExpr), t(K::Equals), n(AddExpr)],
        |d| binop(BinOp::Eq, d, 0, 2),
    );
    // The three not-equal spellings precede plain equality so the
    // first derivation of `a is not b` is the inequality.
    r(
        CompareExpr,
        vec![n(AddExpr), t(K::Not), t(K::Equals), n(AddExpr)],
        |d| binop(BinOp::Ne, d, 0, 3),
    );
    r(
        CompareExpr,
        vec![n(AddExpr), t(K::Isnt), n(AddExpr)],
        |d| binop(BinOp::Ne, d, 0, 2),
    );
    r(
        CompareExpr,
        vec![n(AddExpr), t(K::Is), t(K::Not), n(AddExpr)],
        |d| binop(BinOp::Ne, d, 0, 3),
    );
    r(CompareExpr, vec![n(AddExpr), t(K::Is), n(AddExpr)], |d| {
        binop(BinOp::Eq, d, 0, 2)
    });
    r(AddExpr, vec![n(MulExpr)], |mut d| take(&mut d, 0));
    r(AddExpr, vec![n(AddExpr), t(K::Plus), n(MulExpr)], |d| {
        binop(BinOp::Add, d, 0, 2)
    });
    r(AddExpr, vec![n(AddExpr), t(K::Minus), n(MulExpr)], |d| {
        binop(BinOp::Sub, d, 0, 2)
    });
    r(MulExpr, vec![n(UnaryExpr)], |mut d| take(&mut d, 0));
    r(MulExpr, vec![n(MulExpr), t(K::Times), n(UnaryExpr)], |d| {
        binop(BinOp::Mul, d, 0, 2)
    });
    r(
        MulExpr,
        vec![n(MulExpr), t(K::Dividedby), n(UnaryExpr)],
        |d| binop(BinOp::Div, d, 0, 2),
    );
    r(UnaryExpr, vec![n(ChainExpr)], |mut d| take(&mut d, 0));
    r(UnaryExpr, vec![t(K::Not), n(UnaryExpr)], |mut d| {
        Val::Expr(Expr::Not(Box::new(expr(take(&mut d, 1)))))
    });
    r(ChainExpr, vec![n(Primary)], |mut d| take(&mut d, 0));
    r(
        ChainExpr,
        vec![n(ChainExpr), t(K::Then), n(MultiIdent)],
        |mut d| {
            Val::Expr(Expr::MethodCall {
                target: Box::new(expr(take(&mut d, 0))),
                method: join(names(take(&mut d, 2))),
                args: Vec::new(),
            })
        },
    );
    r(
        ChainExpr,
        vec![
            n(ChainExpr),
            t(K::Then),
            n(MultiIdent),
            t(K::With),
            n(ChainArgs),
        ],
        |mut d| {
            Val::Expr(Expr::MethodCall {
                target: Box::new(expr(take(&mut d, 0))),
                method: join(names(take(&mut d, 2))),
                args: exprs(take(&mut d, 4)),
            })
        },
    );
    r(ChainArgs, vec![n(AddExpr)], |mut d| {
        Val::Exprs(vec![expr(take(&mut d, 0))])
    });
    r(
        ChainArgs,
        vec![n(ChainArgs), t(K::Comma), n(AddExpr)],
        |mut d| {
            let mut es = exprs(take(&mut d, 0));
            es.push(expr(take(&mut d, 2)));
            Val::Exprs(es)
        },
    );

    // Primaries.
    r(Primary, vec![t(K::Bool)], |mut d| {
        Val::Expr(Expr::Bool(text(take(&mut d, 0)).eq_ignore_ascii_case("yeah")))
    });
    r(Primary, vec![t(K::Null)], |_| Val::Expr(Expr::Null));
    r(Primary, vec![t(K::Str)], |mut d| {
        Val::Expr(string_expr(&text(take(&mut d, 0))))
    });
    r(Primary, vec![t(K::Number)], |mut d| {
        Val::Expr(Expr::Num(number(take(&mut d, 0))))
    });
    r(Primary, vec![t(K::Ident)], |mut d| {
        Val::Expr(Expr::Ident(text(take(&mut d, 0))))
    });
    r(Primary, vec![n(KeywordAsIdent)], |mut d| take(&mut d, 0));
    r(Primary, vec![t(K::SlangString)], |mut d| {
        Val::Expr(Expr::Str(text(take(&mut d, 0))))
    });
    for alt in [
        FlaminExpr,
        FrothinExpr,
        SpewinExpr,
        GrabExpr,
        FuncCallExpr,
        EskyExpr,
        TuckshopExpr,
        EmptyExpr,
        SliceExpr,
    ] {
        r(Primary, vec![n(alt)], |mut d| take(&mut d, 0));
    }
    r(KeywordAsIdent, vec![t(K::Snag)], |_| {
        Val::Expr(Expr::Ident("snag".to_string()))
    });
    r(KeywordAsIdent, vec![t(K::Full)], |_| {
        Val::Expr(Expr::Ident("full".to_string()))
    });
    r(KeywordAsIdent, vec![t(K::Got)], |_| {
        Val::Expr(Expr::Ident("got".to_string()))
    });
    r(KeywordAsIdent, vec![t(K::Last)], |_| {
        Val::Expr(Expr::Ident("last".to_string()))
    });
    r(KeywordAsIdent, vec![t(K::First)], |_| {
        Val::Expr(Expr::Ident("first".to_string()))
    });
    r(KeywordAsIdent, vec![t(K::Lot)], |_| {
        Val::Expr(Expr::Ident("lot".to_string()))
    });

    // Numeric coercion markers. On an identifier the original
    // semantics take the length of the word itself; preserved.
    r(FlaminExpr, vec![t(K::Flamin), t(K::Ident)], |mut d| {
        Val::Expr(Expr::Num(text(take(&mut d, 1)).len() as f64))
    });
    r(FlaminExpr, vec![t(K::Flamin), t(K::Number)], |mut d| {
        Val::Expr(Expr::Num(number(take(&mut d, 1)).trunc()))
    });
    r(FrothinExpr, vec![t(K::Frothin), t(K::Number)], |mut d| {
        Val::Expr(Expr::Num(number(take(&mut d, 1))))
    });
    r(SpewinExpr, vec![t(K::Spewin), t(K::Ident)], |mut d| {
        Val::Expr(Expr::Num(text(take(&mut d, 1)).len() as f64))
    });
    r(SpewinExpr, vec![t(K::Spewin), t(K::Number)], |mut d| {
        Val::Expr(Expr::Num(number(take(&mut d, 1))))
    });
    r(EmptyExpr, vec![t(K::Empty)], |_| Val::Expr(Expr::Empty));

    // Calls. A bare identifier statement is a zero-argument call.
    r(FuncCall, vec![t(K::Ident)], |mut d| {
        Val::Stmt(Stmt::Call {
            name: text(take(&mut d, 0)),
            args: Vec::new(),
        })
    });
    r(
        FuncCall,
        vec![t(K::Flamin), t(K::Ident), t(K::With), n(ArgList)],
        |mut d| {
            Val::Stmt(Stmt::Call {
                name: text(take(&mut d, 1)),
                args: exprs(take(&mut d, 3)),
            })
        },
    );
    r(
        FuncCallExpr,
        vec![t(K::Flamin), t(K::Ident), t(K::With), n(ArgList)],
        |mut d| {
            Val::Expr(Expr::Call {
                name: text(take(&mut d, 1)),
                args: exprs(take(&mut d, 3)),
            })
        },
    );
    // Argument elements sit below `and` so it always separates
    // arguments, as in the original grammar.
    r(ArgList, vec![n(CompareExpr)], |mut d| {
        Val::Exprs(vec![expr(take(&mut d, 0))])
    });
    r(
        ArgList,
        vec![n(ArgList), t(K::And), n(CompareExpr)],
        |mut d| {
            let mut es = exprs(take(&mut d, 0));
            es.push(expr(take(&mut d, 2)));
            Val::Exprs(es)
        },
    );
    r(
        ArgList,
        vec![n(ArgList), t(K::Comma), n(CompareExpr)],
        |mut d| {
            let mut es = exprs(take(&mut d, 0));
            es.push(expr(take(&mut d, 2)));
            Val::Exprs(es)
        },
    );

    // Lists.
    r(
        EskyDef,
        vec![
            t(K::Ident),
            t(K::Is),
            t(K::Esky),
            t(K::Colon),
            n(EskyItems),
            t(K::Dot),
        ],
        |mut d| {
            Val::Stmt(Stmt::List {
                name: text(take(&mut d, 0)),
                items: exprs(take(&mut d, 4)),
            })
        },
    );
    r(EskyItems, vec![n(EskyItem)], |mut d| {
        Val::Exprs(vec![expr(take(&mut d, 0))])
    });
    r(
        EskyItems,
        vec![n(EskyItems), t(K::Comma), n(EskyItem)],
        |mut d| {
            let mut es = exprs(take(&mut d, 0));
            es.push(expr(take(&mut d, 2)));
            Val::Exprs(es)
        },
    );
    r(EskyItem, vec![t(K::BloodyItem)], |mut d| {
        Val::Expr(Expr::Str(text(take(&mut d, 0))))
    });
    r(EskyItem, vec![t(K::Number)], |mut d| {
        Val::Expr(Expr::Num(number(take(&mut d, 0))))
    });
    r(EskyItem, vec![t(K::Str)], |mut d| {
        Val::Expr(Expr::Str(text(take(&mut d, 0))))
    });
    r(
        EskyExpr,
        vec![t(K::Esky), t(K::Colon), n(EskyItems)],
        |mut d| Val::Expr(Expr::ListExpr(exprs(take(&mut d, 2)))),
    );

    // Dicts.
    r(
        TuckshopDef,
        vec![
            t(K::Ident),
            t(K::Is),
            t(K::Tuckshop),
            t(K::Colon),
            n(TuckshopItems),
            t(K::Dot),
        ],
        |mut d| {
            Val::Stmt(Stmt::Dict {
                name: text(take(&mut d, 0)),
                entries: entries(take(&mut d, 4)),
            })
        },
    );
    r(TuckshopItems, vec![n(TuckshopItem)], |mut d| {
        Val::Entries(vec![entry(take(&mut d, 0))])
    });
    r(
        TuckshopItems,
        vec![n(TuckshopItems), t(K::Comma), n(TuckshopItem)],
        |mut d| {
            let mut es = entries(take(&mut d, 0));
            es.push(entry(take(&mut d, 2)));
            Val::Entries(es)
        },
    );
    r(
        TuckshopItem,
        vec![t(K::Ident), t(K::Is), n(Expression)],
        |mut d| Val::Entry((text(take(&mut d, 0)), expr(take(&mut d, 2)))),
    );
    r(
        TuckshopExpr,
        vec![t(K::Tuckshop), t(K::Colon), n(TuckshopItems)],
        |mut d| Val::Expr(Expr::DictExpr(entries(take(&mut d, 2)))),
    );

    // List mutation.
    r(
        AppendStmt,
        vec![
            t(K::Another),
            t(K::Shrimp),
            t(K::In),
            t(K::Ident),
            t(K::Dash),
            n(EskyItem),
            t(K::Dot),
        ],
        |mut d| {
            Val::Stmt(Stmt::Append {
                target: text(take(&mut d, 3)),
                item: expr(take(&mut d, 5)),
            })
        },
    );
    r(
        TopUpStmt,
        vec![t(K::Ident), t(K::Top), t(K::Up), n(Expression)],
        |mut d| {
            Val::Stmt(Stmt::Append {
                target: text(take(&mut d, 0)),
                item: expr(take(&mut d, 3)),
            })
        },
    );
    r(
        RemoveStmt,
        vec![
            t(K::Ditch),
            t(K::BloodyItem),
            t(K::From),
            t(K::Ident),
            t(K::Dot),
        ],
        |mut d| {
            Val::Stmt(Stmt::Remove {
                target: text(take(&mut d, 3)),
                item: text(take(&mut d, 1)),
            })
        },
    );
    r(
        PopStmt,
        vec![
            t(K::Drop),
            t(K::The),
            t(K::Last),
            t(K::Snag),
            t(K::From),
            t(K::Ident),
            t(K::Dot),
        ],
        |mut d| {
            Val::Stmt(Stmt::Pop {
                target: text(take(&mut d, 5)),
                end: ListEnd::Last,
            })
        },
    );
    r(
        PopStmt,
        vec![
            t(K::Drop),
            t(K::The),
            t(K::First),
            t(K::Snag),
            t(K::From),
            t(K::Ident),
            t(K::Dot),
        ],
        |mut d| {
            Val::Stmt(Stmt::Pop {
                target: text(take(&mut d, 5)),
                end: ListEnd::First,
            })
        },
    );

    // Indexing and slicing.
    r(
        GrabExpr,
        vec![t(K::Grab), n(Expression), t(K::From), t(K::Ident)],
        |mut d| {
            Val::Expr(Expr::Index {
                target: text(take(&mut d, 3)),
                index: Box::new(expr(take(&mut d, 1))),
            })
        },
    );
    r(
        GrabExpr,
        vec![t(K::Grab), t(K::Ident), t(K::From), t(K::Ident)],
        |mut d| {
            Val::Expr(Expr::IndexKey {
                target: text(take(&mut d, 3)),
                key: text(take(&mut d, 1)),
            })
        },
    );
    r(
        GrabExpr,
        vec![t(K::Grab), t(K::Ident), t(K::At), t(K::Ident)],
        |mut d| {
            Val::Expr(Expr::IndexKey {
                target: text(take(&mut d, 1)),
                key: text(take(&mut d, 3)),
            })
        },
    );
    r(
        SliceExpr,
        vec![
            t(K::Sheepshear),
            t(K::Ident),
            t(K::From),
            n(Expression),
            t(K::In),
            n(Expression),
        ],
        |mut d| {
            Val::Expr(Expr::Slice {
                target: text(take(&mut d, 1)),
                start: Box::new(expr(take(&mut d, 3))),
                end: Box::new(expr(take(&mut d, 5))),
            })
        },
    );
    r(
        SliceExpr,
        vec![t(K::Ident), t(K::Sheepshear), n(Expression)],
        |mut d| {
            Val::Expr(Expr::Index {
                target: text(take(&mut d, 0)),
                index: Box::new(expr(take(&mut d, 2))),
            })
        },
    );

    // Loops.
    r(
        ScoffinLoop,
        vec![
            t(K::Scoffin),
            n(MultiIdent),
            t(K::From),
            t(K::Ident),
            t(K::Bang),
            n(Block),
            n(OptLoopEnd),
        ],
        |mut d| {
            Val::Stmt(Stmt::ForEach {
                iterator: join(names(take(&mut d, 1))),
                target: text(take(&mut d, 3)),
                body: stmts(take(&mut d, 5)),
            })
        },
    );
    r(
        DealinLoop,
        vec![
            t(K::Dealin),
            t(K::From),
            t(K::Ident),
            t(K::Bang),
            n(Block),
            n(LoopEnd),
        ],
        |mut d| {
            Val::Stmt(Stmt::ForEachDict {
                key_var: "item".to_string(),
                val_var: "price".to_string(),
                target: text(take(&mut d, 2)),
                body: stmts(take(&mut d, 4)),
            })
        },
    );
    r(
        DealinLoop,
        vec![
            t(K::Dealin),
            n(MultiIdent),
            t(K::And),
            n(MultiIdent),
            t(K::From),
            t(K::Ident),
            t(K::Bang),
            n(Block),
            n(LoopEnd),
        ],
        |mut d| {
            Val::Stmt(Stmt::ForEachDict {
                key_var: join(names(take(&mut d, 1))),
                val_var: join(names(take(&mut d, 3))),
                target: text(take(&mut d, 5)),
                body: stmts(take(&mut d, 7)),
            })
        },
    );
    r(
        ParcelLoop,
        vec![
            t(K::Pass),
            t(K::The),
            n(MultiIdent),
            t(K::Comma),
            n(Expression),
            t(K::Bang),
            n(Block),
            n(LoopEnd),
        ],
        |mut d| {
            Val::Stmt(Stmt::ForRange {
                iterator: join(names(take(&mut d, 2))),
                count: expr(take(&mut d, 4)),
                body: stmts(take(&mut d, 6)),
            })
        },
    );
    r(
        EveryLoop,
        vec![
            t(K::Every),
            n(MultiIdent),
            t(K::In),
            n(Expression),
            t(K::Colon),
            n(Block),
        ],
        |mut d| {
            Val::Stmt(Stmt::ForRange {
                iterator: join(names(take(&mut d, 1))),
                count: expr(take(&mut d, 3)),
                body: stmts(take(&mut d, 5)),
            })
        },
    );
    r(
        TilLoop,
        vec![
            t(K::Til),
            n(Expression),
            t(K::Dot),
            n(Block),
            n(FullySickEnd),
        ],
        |mut d| {
            Val::Stmt(Stmt::WhileNot {
                condition: expr(take(&mut d, 1)),
                body: stmts(take(&mut d, 3)),
            })
        },
    );
    r(OptLoopEnd, vec![], |_| Val::Unit);
    r(OptLoopEnd, vec![n(LoopEnd)], |_| Val::Unit);
    r(
        LoopEnd,
        vec![t(K::Whos), t(K::Full), t(K::Question)],
        |_| Val::Unit,
    );
    r(
        LoopEnd,
        vec![t(K::Whos), t(K::Got), t(K::Ident), t(K::Question)],
        |_| Val::Unit,
    );
    r(
        FullySickEnd,
        vec![t(K::Fully), t(K::Sick), t(K::Dot)],
        |_| Val::Unit,
    );

    // One if production with nullable clause lists; two separate
    // productions would double-parse an if with no trailing clauses.
    r(
        IfStmt,
        vec![
            t(K::If),
            n(Expression),
            t(K::Comma),
            n(Block),
            n(ElifClauses),
            n(ElseClause),
            n(OptMakeTracks),
        ],
        |mut d| {
            Val::Stmt(Stmt::If {
                condition: expr(take(&mut d, 1)),
                body: stmts(take(&mut d, 3)),
                elifs: elifs(take(&mut d, 4)),
                else_body: opt_stmts(take(&mut d, 5)),
            })
        },
    );
    r(ElifClauses, vec![], |_| Val::Elifs(Vec::new()));
    r(
        ElifClauses,
        vec![n(ElifClauses), n(Elif)],
        |mut d| {
            let mut es = elifs(take(&mut d, 0));
            es.push(elif(take(&mut d, 1)));
            Val::Elifs(es)
        },
    );
    r(
        Elif,
        vec![t(K::Or), t(K::If), n(Expression), t(K::Comma), n(Block)],
        |mut d| {
            Val::Elif(ElifClause {
                condition: expr(take(&mut d, 2)),
                body: stmts(take(&mut d, 4)),
            })
        },
    );
    r(ElseClause, vec![], |_| Val::OptStmts(None));
    r(
        ElseClause,
        vec![t(K::Otherwise), t(K::Comma), n(Block)],
        |mut d| Val::OptStmts(Some(stmts(take(&mut d, 2)))),
    );
    r(OptMakeTracks, vec![], |_| Val::Unit);
    r(
        OptMakeTracks,
        vec![t(K::Make), t(K::Tracks), t(K::Dot)],
        |_| Val::Unit,
    );

    // Imports.
    r(
        ImportStmt,
        vec![
            t(K::Chuck),
            t(K::In),
            t(K::Ident),
            t(K::From),
            t(K::Ident),
            t(K::Dot),
        ],
        |mut d| {
            Val::Stmt(Stmt::Import {
                name: text(take(&mut d, 2)),
                from: text(take(&mut d, 4)),
            })
        },
    );
    r(
        ImportStmt,
        vec![
            t(K::Chuck),
            t(K::In),
            t(K::The),
            t(K::Lot),
            t(K::From),
            t(K::Ident),
            t(K::Dot),
        ],
        |mut d| {
            Val::Stmt(Stmt::ImportAll {
                from: text(take(&mut d, 5)),
            })
        },
    );
    r(
        ImportStmt,
        vec![
            t(K::Chuck),
            t(K::In),
            t(K::Ident),
            t(K::Dash),
            t(K::Mates),
            t(K::Call),
            t(K::Ident),
            t(K::Ident),
            t(K::Dot),
        ],
        |mut d| {
            Val::Stmt(Stmt::ImportModule {
                name: text(take(&mut d, 2)),
                alias: text(take(&mut d, 7)),
            })
        },
    );

    r(BuggerStmt, vec![t(K::Bugger), t(K::Dash), n(Expression)], |mut d| {
        Val::Stmt(Stmt::Throw(expr(take(&mut d, 2))))
    });

    // Inverted assertions: the body or the synthesized throw runs when
    // the condition holds.
    r(
        SussStmt,
        vec![t(K::Suss), t(K::If), n(Expression), t(K::Colon), n(Block)],
        |mut d| {
            Val::Stmt(Stmt::Assert {
                condition: expr(take(&mut d, 2)),
                body: stmts(take(&mut d, 4)),
            })
        },
    );
    r(
        SussStmt,
        vec![t(K::Suss), t(K::If), n(Expression), t(K::Dot)],
        |mut d| Val::Stmt(Stmt::AssertInline(expr(take(&mut d, 2)))),
    );

    r(GimmeStmt, vec![t(K::Gimme), n(MultiIdent), t(K::Dot)], |mut d| {
        Val::Stmt(Stmt::Input {
            variable: join(names(take(&mut d, 1))),
        })
    });

    r(
        Block,
        vec![t(K::Indent), n(Statements), t(K::Dedent)],
        |mut d| take(&mut d, 1),
    );
    r(Statements, vec![n(Statement)], |mut d| {
        Val::Stmts(vec![stmt(take(&mut d, 0))])
    });
    r(
        Statements,
        vec![n(Statements), n(Stmtend), n(Statement)],
        |mut d| {
            let mut ss = stmts(take(&mut d, 0));
            ss.push(stmt(take(&mut d, 2)));
            Val::Stmts(ss)
        },
    );
    r(Statements, vec![n(Statements), n(Stmtend)], |mut d| {
        take(&mut d, 0)
    });

    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_equal_productions_precede_equality() {
        let rules = rules();
        let pos = |needle: TokenKind, len: usize| {
            rules
                .iter()
                .position(|r| {
                    r.lhs == Nt::CompareExpr
                        && r.rhs.len() == len
                        && r.rhs.get(1) == Some(&Sym::T(needle))
                })
                .expect("production present")
        };
        let is_not = pos(TokenKind::Is, 4);
        let is_eq = pos(TokenKind::Is, 3);
        assert!(is_not < is_eq);
    }

    #[test]
    fn concat_sits_at_the_loosest_expression_level() {
        let rules = rules();
        let concat = rules
            .iter()
            .find(|r| r.lhs == Nt::Expression && r.rhs.len() == 3)
            .expect("concat production present");
        assert_eq!(concat.rhs[1], Sym::T(TokenKind::And));
        let built = (concat.action)(vec![
            Val::Expr(Expr::Ident("a".to_string())),
            Val::Unit,
            Val::Expr(Expr::Ident("b".to_string())),
        ]);
        assert!(matches!(built, Val::Expr(Expr::Concat { .. })));
    }

    #[test]
    fn reassignment_precedes_assignment() {
        let rules = rules();
        let idx = |nt: Nt| {
            rules
                .iter()
                .position(|r| r.lhs == Nt::Statement && r.rhs == vec![Sym::N(nt)])
                .expect("statement alternative present")
        };
        assert!(idx(Nt::Reassignment) < idx(Nt::Assignment));
    }

    #[test]
    fn plain_string_stays_a_literal() {
        assert_eq!(
            string_expr("g'day"),
            Expr::Str("g'day".to_string())
        );
    }

    #[test]
    fn reference_splits_into_segments() {
        assert_eq!(
            string_expr("hi ${name}!"),
            Expr::Interp(vec![
                Segment::Lit("hi ".to_string()),
                Segment::Var("name".to_string()),
                Segment::Lit("!".to_string()),
            ])
        );
    }

    #[test]
    fn malformed_reference_is_literal_text() {
        assert_eq!(
            string_expr("cost: ${2x}"),
            Expr::Str("cost: ${2x}".to_string())
        );
        assert_eq!(
            string_expr("open ${brace"),
            Expr::Str("open ${brace".to_string())
        );
    }

    #[test]
    fn adjacent_references_keep_order() {
        assert_eq!(
            string_expr("${a}${b}"),
            Expr::Interp(vec![
                Segment::Var("a".to_string()),
                Segment::Var("b".to_string()),
            ])
        );
    }
}
