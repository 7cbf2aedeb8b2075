use std::fs;
use std::path::PathBuf;
use std::process;

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::Parser;

use golite_common::AnalysisError;
use golite_semantic::ast::Program;
use golite_semantic::{analyze, weed, AnalysisConfig};

/// GoLite semantic analyzer.
///
/// Checks a parsed GoLite program (serialized AST, JSON) and prints a
/// VALID/INVALID verdict.
#[derive(Parser)]
#[command(
    name = "golitec",
    version,
    about,
    long_about = "GoLite semantic analyzer.\n\nReads a parsed GoLite program (JSON AST) and runs weeding, symbol\nresolution, and type checking over it.\n\nExamples:\n  golitec prog.ast.json                    Full analysis, prints VALID/INVALID\n  golitec prog.ast.json --weed-only        Weeding pass only\n  golitec prog.ast.json --dump-symtab      Also write prog.symtab\n  golitec prog.ast.json --dump-types       Print the type annotations as JSON\n  golitec prog.ast.json --source prog.go   Rich error reports against the source"
)]
struct Cli {
    /// Input AST file (JSON).
    input: PathBuf,

    /// Run the weeding pass only.
    #[arg(long = "weed-only")]
    weed_only: bool,

    /// Write the symbol table log to <input stem>.symtab.
    #[arg(long = "dump-symtab")]
    dump_symtab: bool,

    /// Print the per-expression type annotations as JSON to stdout.
    #[arg(long = "dump-types")]
    dump_types: bool,

    /// Original source file, for rich error reports.
    #[arg(long)]
    source: Option<PathBuf>,

    /// Suppress error detail; print the verdict only.
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let ast_json = match fs::read_to_string(&cli.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: could not read '{}': {}", cli.input.display(), e);
            process::exit(2);
        }
    };

    let program: Program = match serde_json::from_str(&ast_json) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: malformed AST in '{}': {}", cli.input.display(), e);
            process::exit(2);
        }
    };

    if cli.weed_only {
        match weed(&program) {
            Ok(()) => {
                println!("VALID");
                return;
            }
            Err(err) => reject(&cli, &err),
        }
    }

    let config = AnalysisConfig {
        log_symbols: cli.dump_symtab,
    };
    let analysis = match analyze(&program, &config) {
        Ok(a) => a,
        Err(err) => reject(&cli, &err),
    };

    if cli.dump_symtab {
        let mut path = cli.input.clone();
        path.set_extension("symtab");
        if let Err(e) = fs::write(&path, analysis.symbols.render_log()) {
            eprintln!("error: could not write '{}': {}", path.display(), e);
            process::exit(2);
        }
    }

    if cli.dump_types {
        match serde_json::to_string_pretty(&analysis.types.to_display_map()) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: failed to serialize type annotations: {}", e);
                process::exit(2);
            }
        }
    }

    println!("VALID");
}

/// Print the verdict and the error detail, then exit with status 1.
fn reject(cli: &Cli, err: &AnalysisError) -> ! {
    println!("INVALID");
    if !cli.quiet {
        match cli.source.as_deref().and_then(|p| fs::read_to_string(p).ok()) {
            Some(source) => print_report(cli, &source, err),
            None => eprintln!("{}", err),
        }
    }
    process::exit(1);
}

fn print_report(cli: &Cli, source: &str, err: &AnalysisError) {
    let file_name = cli
        .source
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let span = err.span();
    let start = span.start.offset as usize;
    let end = (span.end.offset as usize).max(start + 1);

    Report::build(ReportKind::Error, file_name.as_str(), start)
        .with_message(format!("{}: {}", err.kind(), err.message()))
        .with_label(
            Label::new((file_name.as_str(), start..end))
                .with_message(err.message())
                .with_color(Color::Red),
        )
        .finish()
        .eprint((file_name.as_str(), Source::from(source)))
        .ok();
}
