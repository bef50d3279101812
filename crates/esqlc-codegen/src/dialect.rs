//! The `Dialect` trait: everything a target language must know how to say.

use std::fmt;
use std::str::FromStr;

use esqlc_ast::{
    FunctionDecl, HostVarRef, LoopKind, QueryText, SentinelBranch, Span, WheneverAction,
    WheneverCondition,
};
use esqlc_checker::{AnalysisResult, VarInfo};
use serde::{Deserialize, Serialize};

use crate::java::JavaJdbc;
use crate::python::PythonDbApi;

/// Identifies a shipped backend. The CLI and driver options pass these
/// around; `create` turns one into a live backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DialectName {
    JavaJdbc,
    #[serde(rename = "python-dbapi")]
    PythonDbApi,
}

impl DialectName {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialectName::JavaJdbc => "java-jdbc",
            DialectName::PythonDbApi => "python-dbapi",
        }
    }

    /// File extension for the generated output
    pub fn extension(&self) -> &'static str {
        match self {
            DialectName::JavaJdbc => "java",
            DialectName::PythonDbApi => "py",
        }
    }

    pub fn create(&self) -> Box<dyn Dialect> {
        match self {
            DialectName::JavaJdbc => Box::new(JavaJdbc),
            DialectName::PythonDbApi => Box::new(PythonDbApi),
        }
    }
}

impl fmt::Display for DialectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectName {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "java" | "jdbc" | "java-jdbc" => Ok(DialectName::JavaJdbc),
            "python" | "dbapi" | "python-dbapi" => Ok(DialectName::PythonDbApi),
            other => Err(format!(
                "unknown dialect '{}' (expected java-jdbc or python-dbapi)",
                other
            )),
        }
    }
}

/// Read-only context handed to every mapping method: the semantic
/// analysis that resolved host-variable references and cursor queries.
pub struct GenCtx<'a> {
    pub analysis: &'a AnalysisResult,
}

impl<'a> GenCtx<'a> {
    pub fn new(analysis: &'a AnalysisResult) -> Self {
        GenCtx { analysis }
    }

    /// Declared type of a host-variable reference, when resolution found one
    pub fn binding(&self, var: &HostVarRef) -> Option<&VarInfo> {
        self.analysis.binding(var)
    }
}

/// A target language backend. Each method returns the lines it wants
/// emitted at the current indentation; lines may carry their own extra
/// leading spaces for structure internal to the fragment.
///
/// Adding a dialect means implementing this trait and listing the new
/// name in [`DialectName`]; nothing outside this crate changes.
pub trait Dialect {
    fn name(&self) -> DialectName;

    /// True when the target scopes blocks by indentation instead of
    /// closing delimiters (Python). Controls where the generator places
    /// the do/while exit test.
    fn indent_scoped(&self) -> bool {
        false
    }

    /// One level of indentation
    fn indent_unit(&self) -> &'static str {
        "    "
    }

    /// Positional bind placeholder spliced into query text
    fn placeholder(&self) -> &'static str;

    /// Render opaque text as a comment in the target language
    fn comment(&self, text: &str) -> Vec<String>;

    /// Inline marker for a construct this dialect cannot express
    fn unsupported_marker(&self, detail: &str, span: Span) -> Vec<String>;

    // ========== Program structure ==========

    /// Lines introducing a function; the body block follows
    fn function_open(&self, decl: &FunctionDecl) -> Vec<String>;

    /// Opening of a `{ ... }` block (before its statements)
    fn block_open(&self) -> Vec<String>;

    /// Closing of a `{ ... }` block (after its statements)
    fn block_close(&self) -> Vec<String>;

    fn if_open(&self, cond: &str) -> Vec<String>;

    fn else_open(&self) -> Vec<String>;

    fn loop_open(&self, kind: LoopKind, header: &str) -> Vec<String>;

    /// Exit test of a do/while loop. Emitted inside the loop body when
    /// `indent_scoped` is true, after it otherwise.
    fn do_while_tail(&self, header: &str) -> Vec<String>;

    /// Step statement of a `for` loop the dialect rewrites as an
    /// unconditional loop; emitted at the end of the loop body.
    fn for_step_tail(&self, _header: &str) -> Vec<String> {
        Vec::new()
    }

    /// Handle declarations at function entry for every cursor the
    /// function opens. A non-empty result must end by opening the scope
    /// that `epilogue` closes; the generator indents the body one level.
    fn prologue(&self, cursors: &[String]) -> Vec<String>;

    /// Release of every handle in `prologue`, on all exit paths
    fn epilogue(&self, cursors: &[String]) -> Vec<String>;

    // ========== Host passthrough ==========

    /// An opaque host statement, reproduced as written
    fn host_stmt(&self, text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    // ========== Embedded statements ==========

    /// `DECLARE c CURSOR FOR ...`
    fn declare(&self, ctx: &GenCtx, cursor_name: &str, query: &QueryText) -> Vec<String>;

    /// `OPEN c [USING ...]`; `binds` is already the effective bind list
    fn open(&self, ctx: &GenCtx, cursor_name: &str, binds: &[HostVarRef]) -> Vec<String>;

    /// `FETCH c INTO ...` with the folded no-more-rows branch, if any
    fn fetch(
        &self,
        ctx: &GenCtx,
        cursor_name: &str,
        into: &[HostVarRef],
        not_found: Option<&SentinelBranch>,
    ) -> Vec<String>;

    /// `CLOSE c`
    fn close(&self, cursor_name: &str) -> Vec<String>;

    /// Singleton `SELECT ... INTO`; `seq` keeps generated locals unique
    fn select_into(
        &self,
        ctx: &GenCtx,
        seq: usize,
        query: &QueryText,
        into: &[HostVarRef],
    ) -> Vec<String>;

    /// `INSERT` / `UPDATE` / `DELETE` without a cursor
    fn execute(&self, ctx: &GenCtx, seq: usize, query: &QueryText) -> Vec<String>;

    fn commit(&self, release: bool) -> Vec<String>;

    fn rollback(&self, release: bool) -> Vec<String>;

    /// `WHENEVER` directives annotate the output; they do not translate
    fn whenever(&self, condition: WheneverCondition, action: &WheneverAction) -> Vec<String>;
}

/// Replace `:name` and `:name.member` host-variable references with the
/// dialect's positional placeholder, leaving single-quoted SQL string
/// literals untouched.
pub fn parameterize(text: &str, placeholder: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            if ch == '\'' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '\'' => {
                in_string = true;
                out.push(ch);
            }
            ':' => {
                let mut name_len = 0usize;
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' || next == '.' {
                        name_len += 1;
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name_len == 0 {
                    out.push(':');
                } else {
                    out.push_str(placeholder);
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Escape query text for inclusion in a double-quoted target string
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}
