//! End-to-end integration tests for the esqlc translator
//!
//! These tests drive the full pipeline from embedded-SQL source to
//! generated Java and Python over the checked-in fixture files.

mod common;

use std::fs;
use std::path::PathBuf;

use esqlc_ast::{CancelToken, DiagCode, Severity};
use esqlc_checker::{CursorScope, CursorState};
use esqlc_codegen::DialectName;
use esqlc_driver::{translate_unit, Options, PipelineError, UnitResult};

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

/// Run one fixture through the driver under the given options
fn run_fixture(name: &str, options: &Options) -> UnitResult {
    let source = load_fixture(name);
    let cancel = CancelToken::new();
    translate_unit(&source, name, options, &cancel)
        .expect(&format!("pipeline failed on {}", name))
}

fn output_for(result: &UnitResult, dialect: DialectName) -> &str {
    result
        .outputs
        .iter()
        .find(|o| o.dialect == dialect)
        .map(|o| o.text.as_str())
        .expect(&format!("no {} output was generated", dialect))
}

/// Test that all fixture files parse without errors
#[test]
fn e2e_all_fixtures_parse() {
    let fixtures = discover_fixtures();

    assert!(
        !fixtures.is_empty(),
        "No .pc fixtures found! Check tests/fixtures/ directory."
    );

    let mut failures = Vec::new();

    for fixture_path in &fixtures {
        let source = fs::read_to_string(fixture_path)
            .expect(&format!("Failed to read {:?}", fixture_path));

        let output = esqlc_parser::parse(&source);
        let errors: Vec<_> = output.diagnostics.iter().filter(|d| d.is_error()).collect();
        if errors.is_empty() {
            println!("✓ Parsed: {}", fixture_path.display());
        } else {
            eprintln!("✗ Failed to parse: {}", fixture_path.display());
            for err in &errors {
                eprintln!("  Error: {:?}", err);
            }
            failures.push((fixture_path.clone(), format!("{:?}", errors)));
        }
    }

    if !failures.is_empty() {
        panic!(
            "\n{} out of {} fixtures failed to parse:\n{}",
            failures.len(),
            fixtures.len(),
            failures
                .iter()
                .map(|(path, err)| format!("  - {}: {}", path.display(), err))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}

/// Test the full pipeline over the report fixture in both dialects
#[test]
fn e2e_report_translates_to_both_dialects() {
    let options = Options {
        dialects: vec![DialectName::JavaJdbc, DialectName::PythonDbApi],
        ..Options::default()
    };
    let result = run_fixture("employee_report.pc", &options);

    assert!(!result.failed, "clean fixture should not fail");
    assert_no_errors(&result.diagnostics);
    assert_eq!(result.outputs.len(), 2);

    let java = output_for(&result, DialectName::JavaJdbc);
    assert!(java.contains("int report(int dept)"));
    assert!(java.contains(
        "final String emp_cur_SQL = \"SELECT ename, sal, comm FROM emp WHERE deptno = ?\";"
    ));
    assert!(java.contains("emp_cur_stmt.setInt(1, dept);"));
    assert!(java.contains("if (!emp_cur_rs.next()) break;"));
    assert!(java.contains("commission = emp_cur_rs.getDouble(3);"));
    assert!(java.contains("comm_ind = emp_cur_rs.wasNull() ? -1 : 0;"));
    assert!(java.contains("} finally {"));

    // the singleton COUNT query binds and reads through numbered locals
    assert!(java.contains("SELECT COUNT (*) FROM emp WHERE deptno = ?"));
    assert!(java.contains("emp_count = rs1.getInt(1);"));

    // COMMIT WORK RELEASE also closes the connection
    assert!(java.contains("conn.commit();"));
    assert!(java.contains("conn.close();"));

    let python = output_for(&result, DialectName::PythonDbApi);
    assert!(python.contains("def report(dept):"));
    assert!(python.contains("emp_cur_cur.execute(emp_cur_SQL, (dept,))"));
    assert!(python.contains("if emp_cur_row is None: break"));
    assert!(python.contains("emp_name, salary, commission = emp_cur_row"));
    assert!(python.contains("comm_ind = -1 if commission is None else 0"));
    assert!(python.contains("finally:"));
    assert!(python.contains("emp_count, = row1"));
}

/// Test that DML statements bind host variables positionally
#[test]
fn e2e_payroll_update_binds_positionally() {
    let result = run_fixture("payroll_update.pc", &Options::default());

    assert!(!result.failed);
    assert_no_errors(&result.diagnostics);

    let java = output_for(&result, DialectName::JavaJdbc);
    assert!(java.contains("stmt1.setInt(1, target);"));
    assert!(java.contains("old_salary = rs1.getDouble(1);"));
    assert!(java.contains("sal_ind = rs1.wasNull() ? -1 : 0;"));
    assert!(java.contains("stmt2.setDouble(1, new_salary);"));
    assert!(java.contains("stmt2.setInt(2, target);"));
    assert!(java.contains("stmt2.executeUpdate();"));
    assert!(java.contains("stmt3.setString(4, changed_by);"));
    assert!(java.contains("conn.rollback();"));

    // no cursor ever opens, so no handle declarations and no finally
    assert!(!java.contains("try {"));
}

/// Test that a cursor leak surfaces as a warning under default options
#[test]
fn e2e_cursor_leak_warns_by_default() {
    let result = run_fixture("leaky_cursor.pc", &Options::default());

    assert!(!result.failed);
    assert!(!result.outputs.is_empty(), "default options still generate");
    assert_has_code(&result.diagnostics, DiagCode::CursorNeverClosed);
    assert!(result
        .diagnostics
        .iter()
        .filter(|d| d.code == DiagCode::CursorNeverClosed)
        .all(|d| d.severity == Severity::Warning));
}

/// Test that strict cursor checking escalates the leak and blocks output
#[test]
fn e2e_strict_mode_rejects_the_leak() {
    let options = Options {
        strict_cursor_checking: true,
        ..Options::default()
    };
    let result = run_fixture("leaky_cursor.pc", &options);

    assert!(result.failed, "strict mode should fail a leaky unit");
    assert!(result.outputs.is_empty(), "no output for a failed unit");
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.code == DiagCode::CursorNeverClosed && d.severity == Severity::Error));
}

/// Test that statements without a mapping leave a marker instead of failing
#[test]
fn e2e_unsupported_statement_is_marked() {
    let result = run_fixture("legacy_batch.pc", &Options::default());

    assert!(!result.failed, "unsupported statements do not fail a unit");
    assert_has_code(&result.diagnostics, DiagCode::UnsupportedConstruct);

    let java = output_for(&result, DialectName::JavaJdbc);
    assert!(java.contains("/* not translated (E-GEN-001)"));
    assert!(java.contains("SAVEPOINT before_update"));

    // the rest of the loop still translates around the marker
    assert!(java.contains("final String order_cur_SQL = \"SELECT order_id FROM orders WHERE batch <= ?\";"));
    assert!(java.contains("order_cur_stmt.setInt(1, batch_size);"));
    assert!(java.contains("} while (sqlca.sqlcode == 0);"));
}

/// Test that the cursor table records scope and final state per cursor
#[test]
fn e2e_cursor_table_tracks_scope_and_state() {
    let report = esqlc_parser::parse(&load_fixture("employee_report.pc"));
    let analysis = esqlc_checker::analyze(&report.program);
    let emp_cur = analysis.cursor("emp_cur").expect("emp_cur not tracked");
    assert_eq!(emp_cur.scope, CursorScope::Function);
    assert_eq!(emp_cur.state, CursorState::Closed);

    let batch = esqlc_parser::parse(&load_fixture("legacy_batch.pc"));
    let analysis = esqlc_checker::analyze(&batch.program);
    let order_cur = analysis.cursor("order_cur").expect("order_cur not tracked");
    assert_eq!(order_cur.scope, CursorScope::File);
    assert_eq!(order_cur.state, CursorState::Closed);
    assert_eq!(order_cur.query.params.len(), 1);
}

/// Test that the AST survives a JSON round trip
#[test]
fn e2e_program_round_trips_through_json() {
    let source = load_fixture("employee_report.pc");
    let output = esqlc_parser::parse(&source);
    assert_no_errors(&output.diagnostics);

    let json = serde_json::to_string_pretty(&output.program).expect("serialize failed");
    assert!(json.contains("\"type\""));
    assert!(json.contains("\"FunctionDeclaration\""));

    let round_trip: esqlc_ast::Program =
        serde_json::from_str(&json).expect("deserialize failed");
    assert_eq!(round_trip.items.len(), output.program.items.len());
}

/// Test that a cancelled token stops the pipeline before it produces output
#[test]
fn e2e_cancellation_stops_the_pipeline() {
    let source = load_fixture("employee_report.pc");
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = translate_unit(&source, "employee_report.pc", &Options::default(), &cancel)
        .unwrap_err();
    assert_eq!(err, PipelineError::Cancelled);
}
