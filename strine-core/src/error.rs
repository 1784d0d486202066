use thiserror::Error;

/// Fatal failures of the translation pipeline.
///
/// All variants propagate unchanged to the caller of `translate`; the
/// core never recovers or retries, and it performs no logging of its
/// own. Rendering is the CLI's responsibility.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// Malformed indentation or an unterminated string/quoted phrase.
    #[error("lex error at line {line}, column {column}: {message}")]
    Lex {
        line: u32,
        column: u32,
        message: String,
    },
    /// Zero valid derivations for the token stream.
    #[error("parse error at line {line}, column {column}: expected one of {}", .expected.join(", "))]
    Parse {
        line: u32,
        column: u32,
        expected: Vec<String>,
    },
    /// Internal pipeline inconsistency; unreachable when the parser and
    /// the generator agree on the AST invariants.
    #[error("codegen error: {0}")]
    Codegen(String),
}

/// Non-fatal diagnostics attached to a successful translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The input had multiple derivations and none matched the
    /// recognized benign pattern; the first derivation was used.
    AmbiguousParse { derivations: usize },
}

impl core::fmt::Display for Warning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Warning::AmbiguousParse { derivations } => write!(
                f,
                "ambiguous parse ({derivations} derivations); using the first"
            ),
        }
    }
}
