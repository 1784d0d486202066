//! Surface AST for Strine programs.
//!
//! Both node families are sealed sum types: the parser is the only
//! producer, the code generator the only consumer, and the generator's
//! `match` is exhaustive so a new variant without emission support is
//! a build error rather than a runtime surprise. Nodes are built once
//! by grammar reduction actions and never mutated afterwards.

/// Binary operators of the comparison/arithmetic surface forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Gt,
    Lt,
    Eq,
    Ne,
}

/// Which end of a list a `drop the .. snag` statement removes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEnd {
    First,
    Last,
}

/// One segment of an interpolated string literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Lit(String),
    Var(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Bool(bool),
    Null,
    Str(String),
    Num(f64),
    Ident(String),
    /// The explicit empty-collection literal (`empty`).
    Empty,
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
    /// Space-joining string concatenation (`x and y`).
    Concat {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `target then method [with args]`; `method` is already a joined
    /// underscore name, converted to call casing at emission.
    MethodCall {
        target: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// Index by a computed key (`grab e from xs`, `xs sheepshear e`).
    Index {
        target: String,
        index: Box<Expr>,
    },
    /// Index by a literal key (`grab name from d`, `grab name at d`).
    IndexKey {
        target: String,
        key: String,
    },
    Slice {
        target: String,
        start: Box<Expr>,
        end: Box<Expr>,
    },
    /// Inline list literal (`esky: ..`); items are `Str`/`Num` only.
    ListExpr(Vec<Expr>),
    DictExpr(Vec<(String, Expr)>),
    /// String literal containing `${name}` references.
    Interp(Vec<Segment>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElifClause {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Print(Expr),
    Function {
        name: String,
        params: Vec<String>,
        body: Vec<Stmt>,
    },
    Return(Expr),
    Assign {
        name: String,
        value: Expr,
    },
    /// `x is empty` resets an existing binding without redeclaring it.
    Reassign {
        name: String,
        value: Expr,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// List declaration; the grammar guarantees at least one item.
    List {
        name: String,
        items: Vec<Expr>,
    },
    /// Dict declaration; the grammar guarantees at least one entry.
    Dict {
        name: String,
        entries: Vec<(String, Expr)>,
    },
    Append {
        target: String,
        item: Expr,
    },
    /// Remove the first occurrence of `item` by value.
    Remove {
        target: String,
        item: String,
    },
    Pop {
        target: String,
        end: ListEnd,
    },
    ForEach {
        iterator: String,
        target: String,
        body: Vec<Stmt>,
    },
    ForEachDict {
        key_var: String,
        val_var: String,
        target: String,
        body: Vec<Stmt>,
    },
    ForRange {
        iterator: String,
        count: Expr,
        body: Vec<Stmt>,
    },
    /// Loops until the condition becomes true.
    WhileNot {
        condition: Expr,
        body: Vec<Stmt>,
    },
    If {
        condition: Expr,
        body: Vec<Stmt>,
        elifs: Vec<ElifClause>,
        else_body: Option<Vec<Stmt>>,
    },
    Import {
        name: String,
        from: String,
    },
    ImportAll {
        from: String,
    },
    ImportModule {
        name: String,
        alias: String,
    },
    Throw(Expr),
    /// Inverted guarded assertion: the body runs when the condition is
    /// TRUE.
    Assert {
        condition: Expr,
        body: Vec<Stmt>,
    },
    /// Inverted inline assertion: fails when the condition is TRUE.
    AssertInline(Expr),
    /// Blocking read of one line from standard input.
    Input {
        variable: String,
    },
}
