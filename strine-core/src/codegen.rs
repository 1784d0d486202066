//! AST to JavaScript emission.
//!
//! Deterministic and pure: the same program and options always yield
//! byte-identical output. Two-space indentation per block level. The
//! emitted code targets Node or Bun directly; when the program reads
//! stdin anywhere, the whole output is wrapped in an async IIFE so the
//! blocking read can be awaited.

use crate::ast::{BinOp, Expr, ListEnd, Segment, Stmt};
use crate::compiler::{ModuleStyle, Options};
use crate::error::TranslateError;

pub fn generate(program: &[Stmt], options: &Options) -> Result<String, TranslateError> {
    let mut lines = Vec::with_capacity(program.len());
    for stmt in program {
        lines.push(gen_stmt(stmt, options)?);
    }
    let code = lines.join("\n");
    if program.iter().any(stmt_reads_input) {
        Ok(format!("(async () => {{\n{}\n}})();", indent(&code)))
    } else {
        Ok(code)
    }
}

fn gen_block(body: &[Stmt], options: &Options) -> Result<String, TranslateError> {
    let mut lines = Vec::with_capacity(body.len());
    for stmt in body {
        lines.push(gen_stmt(stmt, options)?);
    }
    Ok(indent(&lines.join("\n")))
}

fn gen_stmt(stmt: &Stmt, options: &Options) -> Result<String, TranslateError> {
    Ok(match stmt {
        Stmt::Print(e) => format!("console.log({});", gen_expr(e)),
        Stmt::Function { name, params, body } => format!(
            "function {name}({}) {{\n{}\n}}",
            params.join(", "),
            gen_block(body, options)?
        ),
        Stmt::Return(e) => format!("return {};", gen_expr(e)),
        Stmt::Assign { name, value } => format!("let {name} = {};", gen_expr(value)),
        Stmt::Reassign { name, value } => format!("{name} = {};", gen_expr(value)),
        Stmt::Call { name, args } => format!("{name}({});", gen_args(args)),
        Stmt::List { name, items } => {
            if items.is_empty() {
                return Err(TranslateError::Codegen(format!(
                    "list declaration `{name}` has no items"
                )));
            }
            format!("let {name} = [{}];", gen_args(items))
        }
        Stmt::Dict { name, entries } => {
            if entries.is_empty() {
                return Err(TranslateError::Codegen(format!(
                    "dict declaration `{name}` has no entries"
                )));
            }
            format!("let {name} = {{{}}};", gen_entries(entries))
        }
        Stmt::Append { target, item } => format!("{target}.push({});", gen_expr(item)),
        Stmt::Remove { target, item } => format!(
            "{target}.splice({target}.indexOf({}), 1);",
            js_string(item)
        ),
        Stmt::Pop { target, end } => match end {
            ListEnd::Last => format!("{target}.pop();"),
            ListEnd::First => format!("{target}.shift();"),
        },
        Stmt::ForEach {
            iterator,
            target,
            body,
        } => format!(
            "for (const {iterator} of {target}) {{\n{}\n}}",
            gen_block(body, options)?
        ),
        Stmt::ForEachDict {
            key_var,
            val_var,
            target,
            body,
        } => format!(
            "for (const [{key_var}, {val_var}] of Object.entries({target})) {{\n{}\n}}",
            gen_block(body, options)?
        ),
        Stmt::ForRange {
            iterator,
            count,
            body,
        } => format!(
            "for (let {iterator} = 0; {iterator} < {}; {iterator}++) {{\n{}\n}}",
            gen_expr(count),
            gen_block(body, options)?
        ),
        Stmt::WhileNot { condition, body } => format!(
            "while (!({})) {{\n{}\n}}",
            gen_expr(condition),
            gen_block(body, options)?
        ),
        Stmt::If {
            condition,
            body,
            elifs,
            else_body,
        } => {
            let mut code = format!(
                "if ({}) {{\n{}\n}}",
                gen_expr(condition),
                gen_block(body, options)?
            );
            for clause in elifs {
                code.push_str(&format!(
                    " else if ({}) {{\n{}\n}}",
                    gen_expr(&clause.condition),
                    gen_block(&clause.body, options)?
                ));
            }
            if let Some(else_body) = else_body {
                code.push_str(&format!(" else {{\n{}\n}}", gen_block(else_body, options)?));
            }
            code
        }
        Stmt::Import { name, from } => match options.module_style {
            ModuleStyle::DynamicRequire => {
                format!("const {{ {name} }} = require(\"{from}\");")
            }
            ModuleStyle::StaticImport => format!("import {{ {name} }} from \"{from}\";"),
        },
        Stmt::ImportAll { from } => match options.module_style {
            ModuleStyle::DynamicRequire => {
                format!("const __{from}__ = require(\"{from}\");")
            }
            ModuleStyle::StaticImport => format!("import * as __{from}__ from \"{from}\";"),
        },
        Stmt::ImportModule { name, alias } => match options.module_style {
            ModuleStyle::DynamicRequire => format!("const {alias} = require(\"{name}\");"),
            ModuleStyle::StaticImport => format!("import {alias} from \"{name}\";"),
        },
        Stmt::Throw(e) => format!("throw new Error({});", gen_expr(e)),
        // Assertions are inverted: the handler runs when the
        // condition holds.
        Stmt::Assert { condition, body } => format!(
            "if ({}) {{\n{}\n}}",
            gen_expr(condition),
            gen_block(body, options)?
        ),
        Stmt::AssertInline(condition) => {
            let cond = gen_expr(condition);
            format!(
                "if ({cond}) {{ throw new Error(\"Assertion failed: \" + {}); }}",
                js_string(&cond)
            )
        }
        Stmt::Input { variable } => format!(
            "const {variable} = await (async () => {{ \
             const readline = require(\"readline\"); \
             const rl = readline.createInterface({{ input: process.stdin, output: process.stdout }}); \
             return new Promise(resolve => rl.question(\"\", answer => {{ rl.close(); resolve(answer); }})); \
             }})();"
        ),
    })
}

fn gen_expr(expr: &Expr) -> String {
    match expr {
        Expr::Bool(true) => "true".to_string(),
        Expr::Bool(false) => "false".to_string(),
        Expr::Null => "null".to_string(),
        Expr::Str(s) => js_string(s),
        Expr::Num(n) => js_number(*n),
        Expr::Ident(name) => name.clone(),
        Expr::Empty => "[]".to_string(),
        Expr::BinOp { op, left, right } => format!(
            "({} {} {})",
            gen_expr(left),
            js_op(*op),
            gen_expr(right)
        ),
        Expr::Not(inner) => format!("(!{})", gen_expr(inner)),
        Expr::Concat { left, right } => {
            format!("({} + \" \" + {})", gen_expr(left), gen_expr(right))
        }
        Expr::MethodCall {
            target,
            method,
            args,
        } => format!(
            "{}.{}({})",
            gen_expr(target),
            camel_case(method),
            gen_args(args)
        ),
        Expr::Call { name, args } => format!("{name}({})", gen_args(args)),
        Expr::Index { target, index } => format!("{target}[{}]", gen_expr(index)),
        Expr::IndexKey { target, key } => format!("{target}[{}]", js_string(key)),
        Expr::Slice { target, start, end } => format!(
            "{target}.slice({}, {})",
            gen_expr(start),
            gen_expr(end)
        ),
        Expr::ListExpr(items) => format!("[{}]", gen_args(items)),
        Expr::DictExpr(entries) => format!("{{{}}}", gen_entries(entries)),
        Expr::Interp(segments) => template_literal(segments),
    }
}

/// Two-space indent applied to every line of an already-rendered block.
fn indent(code: &str) -> String {
    code.lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn gen_args(args: &[Expr]) -> String {
    args.iter().map(gen_expr).collect::<Vec<_>>().join(", ")
}

fn gen_entries(entries: &[(String, Expr)]) -> String {
    entries
        .iter()
        .map(|(key, value)| format!("{}: {}", js_string(key), gen_expr(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn js_op(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Gt => ">",
        BinOp::Lt => "<",
        BinOp::Eq => "===",
        BinOp::Ne => "!==",
    }
}

/// JSON-style double-quoted string.
fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Numbers print the way JavaScript prints them: no trailing `.0` on
/// integral values.
fn js_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Joined method names convert to camelCase past the first segment:
/// `to_upper_case` becomes `toUpperCase`. An underscore not followed
/// by a lowercase letter stays put.
fn camel_case(method: &str) -> String {
    let mut out = String::with_capacity(method.len());
    let mut chars = method.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_' {
            match chars.peek() {
                Some(&next) if next.is_ascii_lowercase() => {
                    out.push(next.to_ascii_uppercase());
                    chars.next();
                }
                _ => out.push('_'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Interpolated strings lower to template literals; literal segments
/// are escaped so backticks and `${` survive untouched.
fn template_literal(segments: &[Segment]) -> String {
    let mut out = String::from("`");
    for segment in segments {
        match segment {
            Segment::Lit(text) => {
                let mut chars = text.chars().peekable();
                while let Some(c) = chars.next() {
                    match c {
                        '`' => out.push_str("\\`"),
                        '\\' => out.push_str("\\\\"),
                        '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
                        c => out.push(c),
                    }
                }
            }
            Segment::Var(name) => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            }
        }
    }
    out.push('`');
    out
}

fn stmt_reads_input(stmt: &Stmt) -> bool {
    let block = |body: &[Stmt]| body.iter().any(stmt_reads_input);
    match stmt {
        Stmt::Input { .. } => true,
        Stmt::Function { body, .. }
        | Stmt::ForEach { body, .. }
        | Stmt::ForEachDict { body, .. }
        | Stmt::ForRange { body, .. }
        | Stmt::WhileNot { body, .. }
        | Stmt::Assert { body, .. } => block(body),
        Stmt::If {
            body,
            elifs,
            else_body,
            ..
        } => {
            block(body)
                || elifs.iter().any(|clause| block(&clause.body))
                || else_body.as_deref().is_some_and(block)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ElifClause;

    fn opts() -> Options {
        Options::default()
    }

    fn num(n: f64) -> Expr {
        Expr::Num(n)
    }

    #[test]
    fn addition_keeps_explicit_parentheses() {
        let program = vec![Stmt::Print(Expr::BinOp {
            op: BinOp::Add,
            left: Box::new(num(2.0)),
            right: Box::new(num(3.0)),
        })];
        assert_eq!(
            generate(&program, &opts()).expect("generate"),
            "console.log((2 + 3));"
        );
    }

    #[test]
    fn integral_numbers_print_without_decimal_point() {
        assert_eq!(js_number(5.0), "5");
        assert_eq!(js_number(-2.0), "-2");
        assert_eq!(js_number(3.5), "3.5");
    }

    #[test]
    fn method_names_convert_to_camel_case() {
        assert_eq!(camel_case("to_upper_case"), "toUpperCase");
        assert_eq!(camel_case("plain"), "plain");
        assert_eq!(camel_case("odd_1"), "odd_1");
    }

    #[test]
    fn pop_ends_map_to_pop_and_shift() {
        let last = Stmt::Pop {
            target: "xs".to_string(),
            end: ListEnd::Last,
        };
        let first = Stmt::Pop {
            target: "xs".to_string(),
            end: ListEnd::First,
        };
        assert_eq!(gen_stmt(&last, &opts()).expect("gen"), "xs.pop();");
        assert_eq!(gen_stmt(&first, &opts()).expect("gen"), "xs.shift();");
    }

    #[test]
    fn remove_splices_out_the_first_match() {
        let stmt = Stmt::Remove {
            target: "xs".to_string(),
            item: "pie".to_string(),
        };
        assert_eq!(
            gen_stmt(&stmt, &opts()).expect("gen"),
            "xs.splice(xs.indexOf(\"pie\"), 1);"
        );
    }

    #[test]
    fn inline_assertion_throws_when_the_condition_holds() {
        let stmt = Stmt::AssertInline(Expr::BinOp {
            op: BinOp::Gt,
            left: Box::new(Expr::Ident("x".to_string())),
            right: Box::new(num(9.0)),
        });
        assert_eq!(
            gen_stmt(&stmt, &opts()).expect("gen"),
            "if ((x > 9)) { throw new Error(\"Assertion failed: \" + \"(x > 9)\"); }"
        );
    }

    #[test]
    fn block_assertion_runs_its_body_when_the_condition_holds() {
        let stmt = Stmt::Assert {
            condition: Expr::Bool(true),
            body: vec![Stmt::Throw(Expr::Str("no good".to_string()))],
        };
        assert_eq!(
            gen_stmt(&stmt, &opts()).expect("gen"),
            "if (true) {\n  throw new Error(\"no good\");\n}"
        );
    }

    #[test]
    fn if_chain_renders_else_if_and_else() {
        let stmt = Stmt::If {
            condition: Expr::Bool(true),
            body: vec![Stmt::Print(num(1.0))],
            elifs: vec![ElifClause {
                condition: Expr::Bool(false),
                body: vec![Stmt::Print(num(2.0))],
            }],
            else_body: Some(vec![Stmt::Print(num(3.0))]),
        };
        assert_eq!(
            gen_stmt(&stmt, &opts()).expect("gen"),
            "if (true) {\n  console.log(1);\n} else if (false) {\n  console.log(2);\n} else {\n  console.log(3);\n}"
        );
    }

    #[test]
    fn import_forms_follow_the_module_style() {
        let program = vec![
            Stmt::Import {
                name: "readFileSync".to_string(),
                from: "fs".to_string(),
            },
            Stmt::ImportAll {
                from: "os".to_string(),
            },
            Stmt::ImportModule {
                name: "express".to_string(),
                alias: "app".to_string(),
            },
        ];
        let require = generate(&program, &opts()).expect("generate");
        assert_eq!(
            require,
            "const { readFileSync } = require(\"fs\");\n\
             const __os__ = require(\"os\");\n\
             const app = require(\"express\");"
        );
        let import_opts = Options {
            module_style: ModuleStyle::StaticImport,
        };
        let import = generate(&program, &import_opts).expect("generate");
        assert_eq!(
            import,
            "import { readFileSync } from \"fs\";\n\
             import * as __os__ from \"os\";\n\
             import app from \"express\";"
        );
    }

    #[test]
    fn input_anywhere_wraps_the_program_in_an_async_iife() {
        let program = vec![Stmt::WhileNot {
            condition: Expr::Bool(true),
            body: vec![Stmt::Input {
                variable: "answer".to_string(),
            }],
        }];
        let code = generate(&program, &opts()).expect("generate");
        assert!(code.starts_with("(async () => {\n"));
        assert!(code.ends_with("\n})();"));
        assert!(code.contains("await"));
    }

    #[test]
    fn program_without_input_is_not_wrapped() {
        let program = vec![Stmt::Print(Expr::Str("await".to_string()))];
        let code = generate(&program, &opts()).expect("generate");
        assert_eq!(code, "console.log(\"await\");");
    }

    #[test]
    fn interpolation_emits_a_template_literal() {
        let program = vec![Stmt::Print(Expr::Interp(vec![
            Segment::Lit("g'day ".to_string()),
            Segment::Var("name".to_string()),
        ]))];
        assert_eq!(
            generate(&program, &opts()).expect("generate"),
            "console.log(`g'day ${name}`);"
        );
    }

    #[test]
    fn template_literal_escapes_backticks_and_dollar_brace() {
        let lit = template_literal(&[Segment::Lit("a`b${c".to_string())]);
        assert_eq!(lit, "`a\\`b\\${c`");
    }

    #[test]
    fn empty_list_declaration_is_a_codegen_error() {
        let program = vec![Stmt::List {
            name: "xs".to_string(),
            items: Vec::new(),
        }];
        let err = generate(&program, &opts()).unwrap_err();
        assert!(matches!(err, TranslateError::Codegen(_)));
    }
}
