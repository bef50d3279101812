//! esqlc CLI - command line front end for the embedded-SQL translator

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};

use esqlc_ast::{CancelToken, Diagnostic, Item, Program, Severity, Stmt};
use esqlc_checker::{analyze, CursorScope};
use esqlc_codegen::DialectName;
use esqlc_driver::{translate_unit, Options};
use esqlc_parser::parse;

#[derive(Parser)]
#[command(name = "esqlc")]
#[command(about = "Embedded-SQL translator front end", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and output the AST as JSON
    Parse {
        /// Input file
        file: PathBuf,
        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
    },
    /// Run cursor-lifecycle and binding analysis
    Check {
        /// Input file(s)
        files: Vec<PathBuf>,
    },
    /// Translate a file into one or more target dialects
    Translate {
        /// Input file
        file: PathBuf,
        /// Target dialect(s): java-jdbc, python-dbapi
        #[arg(short, long = "dialect")]
        dialects: Vec<String>,
        /// Output path (extension per dialect when several are requested)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Treat cursor-lifecycle warnings as errors
        #[arg(long)]
        strict: bool,
        /// Carry source comments into the output
        #[arg(long)]
        preserve_comments: bool,
    },
    /// Show information about a file
    Info {
        /// Input file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { file, pretty } => cmd_parse(&file, pretty),
        Commands::Check { files } => cmd_check(&files),
        Commands::Translate {
            file,
            dialects,
            output,
            strict,
            preserve_comments,
        } => cmd_translate(&file, &dialects, output, strict, preserve_comments),
        Commands::Info { file } => cmd_info(&file),
    }
}

fn read_source(file: &Path) -> String {
    match fs::read_to_string(file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {}: {}", file.display(), e);
            std::process::exit(1);
        }
    }
}

fn cmd_parse(file: &PathBuf, pretty: bool) {
    let source = read_source(file);
    let parsed = parse(&source);

    let json = if pretty {
        serde_json::to_string_pretty(&parsed.program).unwrap()
    } else {
        serde_json::to_string(&parsed.program).unwrap()
    };
    println!("{}", json);

    report_diagnostics(file, &source, &parsed.diagnostics);
    if parsed.diagnostics.iter().any(|d| d.is_error()) {
        std::process::exit(1);
    }
}

fn cmd_check(files: &[PathBuf]) {
    let mut all_ok = true;

    for file in files {
        let source = match fs::read_to_string(file) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error reading {}: {}", file.display(), e);
                all_ok = false;
                continue;
            }
        };

        let parsed = parse(&source);
        let analysis = analyze(&parsed.program);

        let mut diagnostics = parsed.diagnostics;
        diagnostics.extend(analysis.diagnostics);
        diagnostics.sort_by_key(|d| (d.span.start, d.span.end));
        report_diagnostics(file, &source, &diagnostics);

        let errors = diagnostics.iter().filter(|d| d.is_error()).count();
        let warnings = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        if errors > 0 {
            eprintln!("✗ {} - {} errors, {} warnings", file.display(), errors, warnings);
            all_ok = false;
        } else {
            println!(
                "✓ {} - {} functions, {} cursors, {} warnings",
                file.display(),
                parsed.program.functions().count(),
                analysis.cursors.len(),
                warnings
            );
        }
    }

    if !all_ok {
        std::process::exit(1);
    }
}

fn cmd_translate(
    file: &PathBuf,
    dialects: &[String],
    output: Option<PathBuf>,
    strict: bool,
    preserve_comments: bool,
) {
    let source = read_source(file);

    let mut options = Options {
        strict_cursor_checking: strict,
        preserve_comments,
        ..Options::default()
    };
    if !dialects.is_empty() {
        options.dialects = dialects
            .iter()
            .map(|name| match DialectName::from_str(name) {
                Ok(dialect) => dialect,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            })
            .collect();
    }

    let unit = file.to_string_lossy();
    let result = match translate_unit(&source, &unit, &options, &CancelToken::new()) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    report_diagnostics(file, &source, &result.diagnostics);

    if result.failed {
        eprintln!("✗ {} - translation failed under strict cursor checking", file.display());
        std::process::exit(1);
    }

    let several = result.outputs.len() > 1;
    for generated in &result.outputs {
        let out_path = match (&output, several) {
            (Some(base), false) => base.clone(),
            (Some(base), true) => base.with_extension(generated.dialect.extension()),
            (None, _) => file.with_extension(generated.dialect.extension()),
        };
        if let Err(e) = fs::write(&out_path, &generated.text) {
            eprintln!("Error writing {}: {}", out_path.display(), e);
            std::process::exit(1);
        }
        println!(
            "Wrote {} ({}, {} bytes)",
            out_path.display(),
            generated.dialect,
            generated.text.len()
        );
    }

    if result.has_errors() {
        std::process::exit(1);
    }
}

fn cmd_info(file: &PathBuf) {
    let source = read_source(file);

    let tokens = esqlc_lexer::tokenize(&source);
    let parsed = parse(&source);
    let analysis = analyze(&parsed.program);

    println!("File: {}", file.display());
    println!(
        "Tokens: {} ({} comments)",
        tokens.tokens.len(),
        tokens.comments.len()
    );
    println!(
        "Items: {} ({} functions)",
        parsed.program.items.len(),
        parsed.program.functions().count()
    );
    println!("Embedded SQL: {} statements", count_embedded(&parsed.program));
    println!();

    if analysis.cursors.is_empty() {
        println!("No cursors declared");
    } else {
        println!("Cursors:");
        for cursor in analysis.cursors.iter() {
            let scope = match cursor.scope {
                CursorScope::File => "file scope",
                CursorScope::Function => "function scope",
            };
            println!(
                "  {} - {} ({})",
                cursor.name,
                cursor.state.describe(),
                scope
            );
        }
    }

    let mut diagnostics = parsed.diagnostics;
    diagnostics.extend(analysis.diagnostics);
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();
    println!();
    println!("Diagnostics: {} errors, {} warnings", errors, warnings);
}

fn count_embedded(program: &Program) -> usize {
    fn in_stmt(stmt: &Stmt, total: &mut usize) {
        match stmt {
            Stmt::Embedded(_) => *total += 1,
            Stmt::Block(block) => {
                for stmt in &block.stmts {
                    in_stmt(stmt, total);
                }
            }
            Stmt::If(node) => {
                in_stmt(&node.then_branch, total);
                if let Some(else_branch) = &node.else_branch {
                    in_stmt(else_branch, total);
                }
            }
            Stmt::Loop(node) => in_stmt(&node.body, total),
            _ => {}
        }
    }

    let mut total = 0;
    for item in &program.items {
        match item {
            Item::Embedded(_) => total += 1,
            Item::Function(decl) => {
                for stmt in &decl.body.stmts {
                    in_stmt(stmt, &mut total);
                }
            }
            _ => {}
        }
    }
    total
}

fn report_diagnostics(file: &Path, source: &str, diagnostics: &[Diagnostic]) {
    let path = file.to_string_lossy().to_string();
    for diag in diagnostics {
        let (kind, color) = match diag.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
            Severity::Info => (ReportKind::Advice, Color::Cyan),
        };
        Report::build(kind, path.clone(), diag.span.start)
            .with_code(diag.code.as_str())
            .with_message(&diag.message)
            .with_label(
                Label::new((path.clone(), diag.span.start..diag.span.end))
                    .with_message(&diag.message)
                    .with_color(color),
            )
            .finish()
            .eprint((path.clone(), Source::from(source)))
            .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_counts_tokens_and_embedded_statements() {
        let source = r#"
int f(void)
{
    int x;

    EXEC SQL SELECT a INTO :x FROM t;
    while (1) {
        EXEC SQL COMMIT WORK;
    }
}
"#;
        let lexed = esqlc_lexer::tokenize(source);
        assert!(lexed.tokens.len() > 1);
        assert!(lexed.diagnostics.is_empty(), "{:?}", lexed.diagnostics);

        let parsed = parse(source);
        assert_eq!(count_embedded(&parsed.program), 2);
    }
}
