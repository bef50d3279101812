//! Pipeline-wide properties
//!
//! Where translator_integration.rs pins down what each fixture turns
//! into, these tests check invariants that must hold over any input:
//! lossless lexing, ordered diagnostics, deterministic generation, and
//! damage isolation between functions.

mod common;

use std::fs;
use std::path::PathBuf;

use esqlc_ast::{CancelToken, DiagCode};
use esqlc_codegen::DialectName;
use esqlc_driver::{translate_unit, Options, UnitResult};
use esqlc_lexer::{tokenize, TokenKind};

use common::assertions::{assert_has_code, assert_no_errors};
use common::fixtures::{fixture_dir, load_fixture};

/// Discover all .pc files in tests/fixtures/
fn discover_fixtures() -> Vec<PathBuf> {
    fs::read_dir(fixture_dir())
        .expect("Failed to read fixtures directory")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("pc"))
        .collect()
}

fn both_dialects() -> Options {
    Options {
        dialects: vec![DialectName::JavaJdbc, DialectName::PythonDbApi],
        ..Options::default()
    }
}

fn run(source: &str, unit: &str, options: &Options) -> UnitResult {
    translate_unit(source, unit, options, &CancelToken::new())
        .expect(&format!("pipeline failed on {}", unit))
}

/// Token and comment spans must tile every fixture: no overlaps, and
/// whatever the spans leave uncovered is whitespace. Anything else means
/// the lexer dropped source text.
#[test]
fn test_lexing_is_lossless_over_all_fixtures() {
    let fixtures = discover_fixtures();
    assert!(
        !fixtures.is_empty(),
        "No .pc fixtures found! Check tests/fixtures/ directory."
    );

    let mut failures = Vec::new();

    for fixture_path in &fixtures {
        let source = fs::read_to_string(fixture_path)
            .expect(&format!("Failed to read {:?}", fixture_path));
        let name = fixture_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("?")
            .to_string();

        let output = tokenize(&source);
        assert_no_errors(&output.diagnostics);

        let mut spans: Vec<(usize, usize)> = output
            .tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| (t.span.start, t.span.end))
            .chain(output.comments.iter().map(|c| (c.start, c.end)))
            .collect();
        spans.sort_unstable();

        let bytes = source.as_bytes();
        let mut cursor = 0usize;
        let mut problem = None;
        for (start, end) in spans {
            if start < cursor {
                problem = Some(format!("overlapping spans near byte {}", start));
                break;
            }
            if !bytes[cursor..start].iter().all(|b| b.is_ascii_whitespace()) {
                problem = Some(format!("bytes {}..{} dropped by the lexer", cursor, start));
                break;
            }
            cursor = end;
        }
        if problem.is_none() && !bytes[cursor..].iter().all(|b| b.is_ascii_whitespace()) {
            problem = Some(format!(
                "trailing bytes {}..{} dropped by the lexer",
                cursor,
                bytes.len()
            ));
        }

        match problem {
            None => println!("✓ Lossless: {}", name),
            Some(detail) => {
                eprintln!("✗ Lossy lexing in {}: {}", name, detail);
                failures.push(format!("{}: {}", name, detail));
            }
        }
    }

    if !failures.is_empty() {
        panic!(
            "\n{} out of {} fixtures lexed lossily:\n{}",
            failures.len(),
            fixtures.len(),
            failures.join("\n")
        );
    }
}

/// Translating the same unit twice must produce byte-identical output
/// for every requested dialect.
#[test]
fn test_translation_is_deterministic_for_both_dialects() {
    let options = both_dialects();

    for fixture_path in discover_fixtures() {
        let source = fs::read_to_string(&fixture_path)
            .expect(&format!("Failed to read {:?}", fixture_path));
        let name = fixture_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unit.pc");

        let first = run(&source, name, &options);
        let second = run(&source, name, &options);

        assert_eq!(first.outputs.len(), second.outputs.len());
        for (a, b) in first.outputs.iter().zip(second.outputs.iter()) {
            assert_eq!(a.dialect, b.dialect);
            assert_eq!(
                a.text, b.text,
                "{} output changed between runs of {}",
                a.dialect, name
            );
        }
        println!("✓ Deterministic: {}", name);
    }
}

/// Unit diagnostics come out sorted by source position no matter which
/// stage produced each entry.
#[test]
fn test_fixture_diagnostics_are_ordered_by_span() {
    let options = both_dialects();

    for fixture_path in discover_fixtures() {
        let source = fs::read_to_string(&fixture_path)
            .expect(&format!("Failed to read {:?}", fixture_path));
        let name = fixture_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unit.pc");

        let result = run(&source, name, &options);
        for pair in result.diagnostics.windows(2) {
            assert!(
                (pair[0].span.start, pair[0].span.end) <= (pair[1].span.start, pair[1].span.end),
                "diagnostics out of order in {}: {} then {}",
                name,
                pair[0],
                pair[1]
            );
        }
        println!("✓ Ordered diagnostics: {}", name);
    }
}

/// Generation runs last, but its markers still sort into place between
/// earlier-stage findings.
#[test]
fn test_generation_markers_sort_with_analysis_findings() {
    let source = r#"
int load(void)
{
    int qty;

    EXEC SQL SAVEPOINT before_load;
    EXEC SQL FETCH stray_cur INTO :qty;
    EXEC SQL SAVEPOINT after_load;
    return 0;
}
"#;
    let result = run(source, "stages.pc", &both_dialects());

    let codes: Vec<DiagCode> = result.diagnostics.iter().map(|d| d.code).collect();
    assert!(codes.contains(&DiagCode::CursorNotOpen), "{:?}", codes);
    // the first savepoint precedes the fetch in the source, so its
    // marker must sort ahead of the cursor warning
    assert_eq!(codes.first(), Some(&DiagCode::UnsupportedConstruct));
    assert_eq!(codes.last(), Some(&DiagCode::UnsupportedConstruct));
    for pair in result.diagnostics.windows(2) {
        assert!(
            (pair[0].span.start, pair[0].span.end) <= (pair[1].span.start, pair[1].span.end),
            "{} then {}",
            pair[0],
            pair[1]
        );
    }
}

/// A unit whose cursors follow declare, open, fetch, close to the letter
/// reports no lifecycle findings at all.
#[test]
fn test_clean_lifecycle_yields_no_cursor_findings() {
    let source = load_fixture("employee_report.pc");
    let result = run(&source, "employee_report.pc", &both_dialects());

    assert!(!result.failed);
    assert_no_errors(&result.diagnostics);
    assert!(
        result.diagnostics.iter().all(|d| !d.code.is_lifecycle()),
        "unexpected lifecycle findings: {:?}",
        result.diagnostics
    );
}

/// A fetch on a never-opened cursor is reported against that statement,
/// but the healthy functions around it still translate.
#[test]
fn test_fetch_before_open_does_not_derail_the_unit() {
    let source = r#"
void broken(void)
{
    int n;

    EXEC SQL DECLARE ghost_cur CURSOR FOR SELECT n FROM t;
    EXEC SQL FETCH ghost_cur INTO :n;
}

void healthy(void)
{
    int id;

    EXEC SQL DECLARE ok_cur CURSOR FOR SELECT id FROM t;
    EXEC SQL OPEN ok_cur;
    EXEC SQL FETCH ok_cur INTO :id;
    EXEC SQL CLOSE ok_cur;
}
"#;
    let result = run(source, "mixed.pc", &both_dialects());

    assert!(!result.failed);
    assert_has_code(&result.diagnostics, DiagCode::CursorNotOpen);

    let java = result
        .outputs
        .iter()
        .find(|o| o.dialect == DialectName::JavaJdbc)
        .map(|o| o.text.as_str())
        .expect("no Java output was generated");
    assert!(java.contains("ok_cur_stmt = conn.prepareStatement(ok_cur_SQL);"));

    let python = result
        .outputs
        .iter()
        .find(|o| o.dialect == DialectName::PythonDbApi)
        .map(|o| o.text.as_str())
        .expect("no Python output was generated");
    assert!(python.contains("ok_cur_cur = conn.cursor()"));
}
