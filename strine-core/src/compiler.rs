//! Pipeline orchestration and the public translation API.
//!
//! `translate` is the whole contract for external callers: Strine
//! source in, JavaScript source out. `translate_full` additionally
//! surfaces the non-fatal warnings collected along the way. Every call
//! runs the full pipeline on fresh state; nothing is shared or cached
//! between calls.

use crate::codegen;
use crate::error::{TranslateError, Warning};
use crate::lexer;
use crate::parser;

/// How import statements are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleStyle {
    /// CommonJS `require(..)` forms.
    #[default]
    DynamicRequire,
    /// ES module `import` forms.
    StaticImport,
}

/// Translation options.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub module_style: ModuleStyle,
}

/// A finished translation: the emitted JavaScript plus any warnings.
#[derive(Debug, Clone)]
pub struct Translation {
    pub code: String,
    pub warnings: Vec<Warning>,
}

/// Translate Strine source to JavaScript, discarding warnings.
pub fn translate(source: &str, options: &Options) -> Result<String, TranslateError> {
    translate_full(source, options).map(|translation| translation.code)
}

/// Translate Strine source to JavaScript, keeping warnings.
pub fn translate_full(source: &str, options: &Options) -> Result<Translation, TranslateError> {
    let tokens = lexer::tokenize(source)?;
    let outcome = parser::parse(&tokens)?;
    let code = codegen::generate(&outcome.program, options)?;
    Ok(Translation {
        code,
        warnings: outcome.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn js(source: &str) -> String {
        translate(source, &Options::default()).expect("translate")
    }

    #[test]
    fn prints_an_addition_with_parentheses() {
        assert_eq!(js("crikey! 2 plus 3"), "console.log((2 + 3));");
    }

    #[test]
    fn list_declaration_and_iteration_preserve_order() {
        let source = "snacks is esky: bloody chips, bloody pie, bloody roll.\n\
                      \n\
                      scoffin snack from snacks!\n    crikey! snack";
        let code = js(source);
        assert_eq!(
            code,
            "let snacks = [\"chips\", \"pie\", \"roll\"];\n\
             for (const snack of snacks) {\n  console.log(snack);\n}"
        );
    }

    #[test]
    fn two_parameter_function_call_passes_arguments_positionally() {
        let source = "prep add barbie with a and b\n\
                      \x20   fair go a plus b\n\
                      \n\
                      crikey! flamin add with 2, 3";
        assert_eq!(
            js(source),
            "function add(a, b) {\n  return (a + b);\n}\nconsole.log(add(2, 3));"
        );
    }

    #[test]
    fn translation_is_deterministic() {
        let source = "x is 4\ncrikey! x times 2";
        assert_eq!(js(source), js(source));
    }

    #[test]
    fn is_not_translates_without_warnings() {
        let translation =
            translate_full("crikey! a is not b", &Options::default()).expect("translate");
        assert!(translation.warnings.is_empty());
        assert_eq!(translation.code, "console.log((a !== b));");
    }

    #[test]
    fn append_then_drops_respect_list_order() {
        let source = "xs is esky: bloody a, bloody b.\n\
                      xs top up \"c\"\n\
                      drop the last snag from xs.\n\
                      drop the first snag from xs.";
        assert_eq!(
            js(source),
            "let xs = [\"a\", \"b\"];\nxs.push(\"c\");\nxs.pop();\nxs.shift();"
        );
    }

    #[test]
    fn while_loop_negates_its_condition() {
        let source = "til done.\n    crikey! 1\nfully sick.";
        assert_eq!(js(source), "while (!(done)) {\n  console.log(1);\n}");
    }

    #[test]
    fn inline_assertion_fires_on_a_true_condition() {
        assert_eq!(
            js("suss if x tops 9."),
            "if ((x > 9)) { throw new Error(\"Assertion failed: \" + \"(x > 9)\"); }"
        );
    }

    #[test]
    fn shallower_body_than_any_open_block_is_a_lex_error() {
        let source = "til x.\n        crikey! 1\n    crikey! 2";
        let err = translate(source, &Options::default()).unwrap_err();
        assert!(matches!(err, TranslateError::Lex { .. }));
    }

    #[test]
    fn stdin_read_awaits_inside_an_async_wrapper() {
        let code = js("gimme name.\ncrikey! name");
        assert!(code.starts_with("(async () => {\n"));
        assert!(code.contains("await"));
        assert!(code.contains("console.log(name);"));
    }

    #[test]
    fn list_reset_reassigns_with_a_warning() {
        let translation = translate_full("x is empty", &Options::default()).expect("translate");
        assert_eq!(translation.code, "x = [];");
        assert_eq!(translation.warnings.len(), 1);
    }

    #[test]
    fn module_style_switches_the_import_forms() {
        let source = "chuck in readFileSync from fs.";
        assert_eq!(js(source), "const { readFileSync } = require(\"fs\");");
        let import = translate(
            source,
            &Options {
                module_style: ModuleStyle::StaticImport,
            },
        )
        .expect("translate");
        assert_eq!(import, "import { readFileSync } from \"fs\";");
    }

    #[test]
    fn if_chain_translates_to_else_if_and_else() {
        let source = "if x tops 3,\n    crikey! 1\nor if x cops 1,\n    crikey! 2\notherwise,\n    crikey! 3\nmake tracks.";
        assert_eq!(
            js(source),
            "if ((x > 3)) {\n  console.log(1);\n} else if ((x < 1)) {\n  console.log(2);\n} else {\n  console.log(3);\n}"
        );
    }

    #[test]
    fn dict_iteration_defaults_its_variable_names() {
        let source = "shop is tuckshop: pie is 4, roll is 5.\n\
                      \n\
                      dealin from shop!\n    crikey! price\nwho's full?";
        assert_eq!(
            js(source),
            "let shop = {\"pie\": 4, \"roll\": 5};\n\
             for (const [item, price] of Object.entries(shop)) {\n  console.log(price);\n}"
        );
    }
}
