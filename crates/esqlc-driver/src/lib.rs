//! The translation pipeline: lex, parse, analyze, generate.
//!
//! One call per translation unit. Units are independent; nothing here
//! touches the filesystem or shares state between calls, so callers can
//! fan units out however they like. The driver is also where policy
//! lives: input limits are enforced before lexing, strict cursor
//! checking escalates lifecycle warnings, and the final diagnostic list
//! is sorted by source position regardless of which stage produced each
//! entry.

use esqlc_ast::{CancelToken, Cancelled, Diagnostic, Program, Severity};
use esqlc_checker::analyze_with;
use esqlc_codegen::{generate_with, DialectName, GenOptions};
use esqlc_parser::parse_with;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Backends to generate, in order
    pub dialects: Vec<DialectName>,
    /// Escalate cursor-lifecycle warnings to errors and fail the unit
    pub strict_cursor_checking: bool,
    /// Carry source comments into the generated output
    pub preserve_comments: bool,
    /// Upper bound on input size, checked before lexing
    pub max_input_bytes: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            dialects: vec![DialectName::JavaJdbc],
            strict_cursor_checking: false,
            preserve_comments: false,
            max_input_bytes: None,
        }
    }
}

/// Generated text for one dialect
#[derive(Debug, Clone)]
pub struct DialectOutput {
    pub dialect: DialectName,
    pub text: String,
}

/// Everything one unit's translation produced. The AST and diagnostics
/// are always present, even when generation was skipped.
#[derive(Debug)]
pub struct UnitResult {
    pub unit: String,
    pub program: Program,
    /// All stages' diagnostics, ordered by source position
    pub diagnostics: Vec<Diagnostic>,
    pub outputs: Vec<DialectOutput>,
    /// True when strict cursor checking suppressed generation
    pub failed: bool,
}

impl UnitResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }
}

/// Failures that abort the pipeline outright, with no partial result
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("input is {actual} bytes, over the {limit} byte limit")]
    ResourceLimitExceeded { limit: u64, actual: u64 },

    #[error("translation was cancelled")]
    Cancelled,
}

impl From<Cancelled> for PipelineError {
    fn from(_: Cancelled) -> Self {
        PipelineError::Cancelled
    }
}

/// Translate one unit end to end.
///
/// `unit` is the caller's name for the input (usually its path); it
/// comes back unchanged in the result so callers can route outputs.
pub fn translate_unit(
    source: &str,
    unit: &str,
    options: &Options,
    cancel: &CancelToken,
) -> Result<UnitResult, PipelineError> {
    if let Some(limit) = options.max_input_bytes {
        let actual = source.len() as u64;
        if actual > limit {
            return Err(PipelineError::ResourceLimitExceeded { limit, actual });
        }
    }

    let parsed = parse_with(source, cancel)?;
    let mut analysis = analyze_with(&parsed.program, cancel)?;

    let mut diagnostics = parsed.diagnostics;
    let mut semantic = std::mem::take(&mut analysis.diagnostics);
    if options.strict_cursor_checking {
        for diag in &mut semantic {
            if diag.code.is_lifecycle() && diag.severity == Severity::Warning {
                diag.severity = Severity::Error;
            }
        }
    }
    let failed = options.strict_cursor_checking && semantic.iter().any(|d| d.is_error());
    diagnostics.append(&mut semantic);

    let mut outputs = Vec::new();
    if !failed {
        let gen_options = GenOptions {
            preserve_comments: options.preserve_comments,
        };
        for name in &options.dialects {
            let dialect = name.create();
            let generated = generate_with(
                &parsed.program,
                &analysis,
                dialect.as_ref(),
                source,
                &parsed.comments,
                &gen_options,
                cancel,
            )?;
            diagnostics.extend(generated.diagnostics);
            outputs.push(DialectOutput {
                dialect: *name,
                text: generated.text,
            });
        }
    }

    diagnostics.sort_by_key(|d| (d.span.start, d.span.end));

    Ok(UnitResult {
        unit: unit.to_string(),
        program: parsed.program,
        diagnostics,
        outputs,
        failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use esqlc_ast::DiagCode;

    const CLEAN: &str = r#"
int report(int dept) {
    int empno;
    EXEC SQL DECLARE c1 CURSOR FOR SELECT empno FROM emp WHERE deptno = :dept;
    EXEC SQL OPEN c1;
    while (1) {
        EXEC SQL FETCH c1 INTO :empno;
        if (sqlca.sqlcode == 1403) break;
        tally(empno);
    }
    EXEC SQL CLOSE c1;
    return 0;
}
"#;

    const FETCH_BEFORE_OPEN: &str = r#"
int broken() {
    int x;
    EXEC SQL DECLARE c1 CURSOR FOR SELECT a FROM t;
    EXEC SQL FETCH c1 INTO :x;
    EXEC SQL CLOSE c1;
}
"#;

    fn run(source: &str, options: &Options) -> Result<UnitResult, PipelineError> {
        translate_unit(source, "unit.pc", options, &CancelToken::new())
    }

    #[test]
    fn test_clean_unit_translates() {
        let result = run(CLEAN, &Options::default()).unwrap();
        assert_eq!(result.unit, "unit.pc");
        assert!(!result.failed);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(result.outputs.len(), 1);
        assert_eq!(result.outputs[0].dialect, DialectName::JavaJdbc);
        assert!(result.outputs[0].text.contains("c1_rs = c1_stmt.executeQuery();"));
    }

    #[test]
    fn test_every_requested_dialect_is_generated() {
        let options = Options {
            dialects: vec![DialectName::JavaJdbc, DialectName::PythonDbApi],
            ..Options::default()
        };
        let result = run(CLEAN, &options).unwrap();
        assert_eq!(result.outputs.len(), 2);
        assert!(result.outputs[0].text.contains("PreparedStatement"));
        assert!(result.outputs[1].text.contains("conn.cursor()"));
    }

    #[test]
    fn test_lifecycle_warnings_stay_warnings_by_default() {
        let result = run(FETCH_BEFORE_OPEN, &Options::default()).unwrap();
        assert!(!result.failed);
        assert!(!result.outputs.is_empty());
        let lifecycle: Vec<_> = result
            .diagnostics
            .iter()
            .filter(|d| d.code.is_lifecycle())
            .collect();
        assert!(!lifecycle.is_empty());
        assert!(lifecycle.iter().all(|d| d.severity == Severity::Warning));
    }

    #[test]
    fn test_strict_mode_escalates_and_fails_the_unit() {
        let options = Options {
            strict_cursor_checking: true,
            ..Options::default()
        };
        let result = run(FETCH_BEFORE_OPEN, &options).unwrap();
        assert!(result.failed);
        assert!(result.outputs.is_empty());
        assert!(!result.program.items.is_empty(), "AST survives failure");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code.is_lifecycle() && d.is_error()));
    }

    #[test]
    fn test_strict_mode_passes_a_clean_unit() {
        let options = Options {
            strict_cursor_checking: true,
            ..Options::default()
        };
        let result = run(CLEAN, &options).unwrap();
        assert!(!result.failed);
        assert_eq!(result.outputs.len(), 1);
    }

    #[test]
    fn test_input_limit_short_circuits() {
        let options = Options {
            max_input_bytes: Some(16),
            ..Options::default()
        };
        let err = run(CLEAN, &options).unwrap_err();
        assert_eq!(
            err,
            PipelineError::ResourceLimitExceeded {
                limit: 16,
                actual: CLEAN.len() as u64,
            }
        );
    }

    #[test]
    fn test_cancellation_surfaces_as_pipeline_error() {
        let token = CancelToken::new();
        token.cancel();
        let err = translate_unit(CLEAN, "unit.pc", &Options::default(), &token).unwrap_err();
        assert_eq!(err, PipelineError::Cancelled);
    }

    #[test]
    fn test_diagnostics_are_ordered_by_source_position() {
        // parse-stage and analysis-stage entries interleave by span
        let source = r#"
int f() {
    int x;
    EXEC SQL FETCH nowhere INTO :x;
    EXEC SQL DECLARE ;
    done();
}
"#;
        let result = run(source, &Options::default()).unwrap();
        assert!(result.diagnostics.len() >= 2, "{:?}", result.diagnostics);
        let starts: Vec<usize> = result.diagnostics.iter().map(|d| d.span.start).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn test_unsupported_constructs_do_not_fail_the_unit() {
        let source = "int f() {\n    EXEC SQL SAVEPOINT sp1;\n}\n";
        let options = Options {
            strict_cursor_checking: true,
            ..Options::default()
        };
        let result = run(source, &options).unwrap();
        assert!(!result.failed);
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == DiagCode::UnsupportedConstruct));
        assert!(result.outputs[0].text.contains("not translated"));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: Options =
            serde_json::from_str(r#"{"dialects":["python-dbapi"],"strictCursorChecking":true}"#)
                .unwrap();
        assert_eq!(options.dialects, vec![DialectName::PythonDbApi]);
        assert!(options.strict_cursor_checking);
        assert!(!options.preserve_comments);
        assert_eq!(options.max_input_bytes, None);

        let options: Options = serde_json::from_str("{}").unwrap();
        assert_eq!(options.dialects, vec![DialectName::JavaJdbc]);
    }
}
