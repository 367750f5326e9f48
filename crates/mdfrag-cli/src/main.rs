use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;
use mdfrag_core::{Diagnostic, HtmlEmitOptions, emit_html_with_options, parse};
use serde::Serialize;
use thiserror::Error;

#[derive(Parser)]
#[command(name = "mdfrag-cli")]
#[command(version, about = "Convert constrained Markdown into an HTML fragment", long_about = None)]
#[command(after_help = "EXAMPLES:
    mdfrag-cli notes.md                     Print the fragment for notes.md
    cat notes.md | mdfrag-cli -o out.html   Convert stdin into out.html
    mdfrag-cli --diagnostics pretty a.md    Also list markup kept as text")]
struct Cli {
    /// Markdown file to convert (reads stdin when omitted)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Write the fragment to this file instead of stdout
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Leave bare URLs as plain text
    #[arg(long)]
    no_autolink: bool,

    /// Keep newlines inside code as raw newlines instead of <br/>
    #[arg(long)]
    raw_code_newlines: bool,

    /// Maximum number of adjacent <br/> markers
    #[arg(long, value_name = "N", default_value_t = 2)]
    max_breaks: usize,

    /// Report markup that was kept as text on stderr
    #[arg(long, value_enum, value_name = "FORMAT")]
    diagnostics: Option<DiagnosticsMode>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn emit_options(&self) -> HtmlEmitOptions {
        HtmlEmitOptions {
            autolink: !self.no_autolink,
            code_line_breaks: !self.raw_code_newlines,
            max_consecutive_breaks: self.max_breaks,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DiagnosticsMode {
    Json,
    Pretty,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to read stdin: {0}")]
    Stdin(#[source] io::Error),

    #[error("failed to write {target}: {source}")]
    Write { target: String, source: io::Error },

    #[error("failed to encode diagnostics: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    code: &'a str,
    severity: &'a str,
    message: &'a str,
    range: JsonRange,
}

#[derive(Serialize)]
struct JsonRange {
    start: JsonPosition,
    end: JsonPosition,
}

#[derive(Serialize)]
struct JsonPosition {
    line: usize,
    character: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let source = read_source(cli.input.as_deref())?;
    let parsed = parse(&source);
    log::info!(
        "parsed {} bytes into {} blocks with {} code segments",
        source.len(),
        parsed.document.blocks.len(),
        parsed.document.protected.len()
    );

    if let Some(mode) = cli.diagnostics {
        emit_diagnostics(&parsed.diagnostics, mode)?;
    }

    let html = emit_html_with_options(&parsed.document, &cli.emit_options());
    write_output(cli.output.as_deref(), &html)
}

fn read_source(input: Option<&Path>) -> Result<String, CliError> {
    match input {
        Some(path) => fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(CliError::Stdin)?;
            Ok(buffer)
        }
    }
}

fn write_output(output: Option<&Path>, html: &str) -> Result<(), CliError> {
    match output {
        Some(path) => fs::write(path, html).map_err(|source| CliError::Write {
            target: path.display().to_string(),
            source,
        }),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(html.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|source| CliError::Write {
                    target: "stdout".to_string(),
                    source,
                })
        }
    }
}

fn emit_diagnostics(diagnostics: &[Diagnostic], mode: DiagnosticsMode) -> Result<(), CliError> {
    match mode {
        DiagnosticsMode::Json => {
            let entries: Vec<JsonDiagnostic<'_>> = diagnostics.iter().map(to_json).collect();
            eprintln!("{}", serde_json::to_string_pretty(&entries)?);
        }
        DiagnosticsMode::Pretty => {
            for diagnostic in diagnostics {
                eprintln!("{}", diagnostic_to_pretty(diagnostic));
            }
        }
    }
    Ok(())
}

fn to_json(diagnostic: &Diagnostic) -> JsonDiagnostic<'_> {
    JsonDiagnostic {
        code: diagnostic.code,
        severity: diagnostic.severity.label(),
        message: &diagnostic.message,
        range: JsonRange {
            start: JsonPosition {
                line: diagnostic.range.start.line,
                character: diagnostic.range.start.character,
            },
            end: JsonPosition {
                line: diagnostic.range.end.line,
                character: diagnostic.range.end.character,
            },
        },
    }
}

fn diagnostic_to_pretty(diagnostic: &Diagnostic) -> String {
    format!(
        "{}:{}: {} {} {}",
        diagnostic.range.start.line + 1,
        diagnostic.range.start.character + 1,
        diagnostic.severity.label(),
        diagnostic.code,
        diagnostic.message
    )
}
