//! Core pipeline for the Strine to JavaScript translator.
//!
//! The pipeline is roughly:
//!
//!   source .strine
//!     -> lexer     (tokens, indentation structure)
//!     -> parser    (chart engine over the grammar table, AST)
//!     -> codegen   (JavaScript text)
//!
//! Higher-level tools (CLI, editor integrations, etc.) should depend
//! on this crate rather than reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod lexer;
pub mod ast;
pub mod grammar;
pub mod earley;
pub mod parser;

// ---------------------------------------------------------------------
// Back-end: code generation and compiler orchestration
// ---------------------------------------------------------------------

pub mod codegen;
pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{ModuleStyle, Options, Translation, translate, translate_full};
pub use error::{TranslateError, Warning};
