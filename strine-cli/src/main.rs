use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use strine_core::{ModuleStyle, Options, TranslateError, translate_full};

#[derive(Parser, Debug)]
#[command(version, about = "Translate Strine source to JavaScript", long_about = None)]
struct Cli {
    /// Input file; reads stdin when omitted.
    #[arg(short, long)]
    input: Option<String>,

    /// Output file; writes stdout when omitted.
    #[arg(short, long)]
    output: Option<String>,

    #[arg(
        long,
        value_enum,
        default_value_t = StyleArg::Require,
        help = "Import emission style: require (CommonJS) or import (ES modules)"
    )]
    module_style: StyleArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StyleArg {
    Require,
    Import,
}

impl From<StyleArg> for ModuleStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Require => ModuleStyle::DynamicRequire,
            StyleArg::Import => ModuleStyle::StaticImport,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    let source = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {path}"))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let options = Options {
        module_style: cli.module_style.into(),
    };
    let translation = translate_full(&source, &options)
        .map_err(|err| anyhow::anyhow!(render_error(&source, &err)))?;

    for warning in &translation.warnings {
        eprintln!("warning: {warning}");
    }

    match &cli.output {
        Some(path) => write_output(path, translation.code.as_bytes())?,
        None => println!("{}", translation.code),
    }
    Ok(())
}

/// Renders a pipeline error with the offending source line and a caret
/// under the reported column.
fn render_error(source: &str, err: &TranslateError) -> String {
    let position = match err {
        TranslateError::Lex { line, column, .. } => Some((*line, *column)),
        TranslateError::Parse { line, column, .. } => Some((*line, *column)),
        TranslateError::Codegen(_) => None,
    };
    let mut rendered = err.to_string();
    if let Some((line, column)) = position {
        if let Some(text) = source.lines().nth(line.saturating_sub(1) as usize) {
            let caret_pad = " ".repeat(column.saturating_sub(1) as usize);
            rendered.push_str(&format!("\n  | {text}\n  | {caret_pad}^"));
        }
    }
    rendered
}

fn write_output(path: &str, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = PathBuf::from(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    fs::write(path, bytes).with_context(|| format!("failed to write output file {path}"))?;
    Ok(())
}
