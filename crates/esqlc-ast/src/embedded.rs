//! Embedded-SQL AST nodes
//!
//! Every `EXEC SQL ... ;` statement becomes one `EmbeddedStmt`, classified
//! by its leading keywords. The raw clause text is kept alongside the
//! extracted structure so diagnostics and passthrough output can show the
//! original statement.

use serde::{Deserialize, Serialize};

use crate::Span;

/// An embedded statement: `EXEC SQL <clause> ;`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedStmt {
    #[serde(flatten)]
    pub kind: EmbeddedKind,
    /// Normalized clause text between the introducer and the terminator
    pub sql: String,
    pub span: Span,
}

/// Classified embedded-statement forms
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "subtype")]
pub enum EmbeddedKind {
    /// `DECLARE c CURSOR FOR SELECT ...`
    #[serde(rename_all = "camelCase")]
    Declare { cursor_name: String, query: QueryText },

    /// `OPEN c` or `OPEN c USING :v, ...`
    #[serde(rename_all = "camelCase")]
    Open {
        cursor_name: String,
        using: Vec<HostVarRef>,
    },

    /// `FETCH c INTO :a, :b, ...`
    #[serde(rename_all = "camelCase")]
    Fetch {
        cursor_name: String,
        #[serde(rename = "hostVariables")]
        into: Vec<HostVarRef>,
        /// Folded "no more rows" branch, when the next host statement
        /// tested the not-found status (see `SentinelBranch`)
        not_found: Option<SentinelBranch>,
    },

    /// `CLOSE c`
    #[serde(rename_all = "camelCase")]
    Close { cursor_name: String },

    /// Singleton `SELECT ... INTO :a, :b FROM ...`
    #[serde(rename_all = "camelCase")]
    Select {
        query: QueryText,
        #[serde(rename = "hostVariables")]
        into: Vec<HostVarRef>,
    },

    /// `INSERT INTO t ... VALUES (...)`
    Insert { query: QueryText },

    /// `UPDATE t SET ...`
    Update { query: QueryText },

    /// `DELETE FROM t ...`
    Delete { query: QueryText },

    /// `COMMIT [WORK] [RELEASE]`
    Commit { release: bool },

    /// `ROLLBACK [WORK] [RELEASE]`
    Rollback { release: bool },

    /// `BEGIN DECLARE SECTION`
    BeginDeclareSection,

    /// `END DECLARE SECTION`
    EndDeclareSection,

    /// `INCLUDE SQLCA`
    IncludeSqlca,

    /// `WHENEVER SQLERROR|SQLWARNING|NOT FOUND CONTINUE|GOTO l|STOP`
    Whenever {
        condition: WheneverCondition,
        action: WheneverAction,
    },

    /// Recognized as embedded SQL but not a form we translate
    Other,
}

/// Query text recorded for later parameterized execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryText {
    /// Normalized SQL with `:var` placeholders still in place
    pub text: String,
    /// Bind parameters in placeholder order
    pub params: Vec<HostVarRef>,
    /// Projected column count when statically known (`None` for `*`)
    pub columns: Option<usize>,
}

/// A `:name` or `:name.member` reference inside an embedded statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostVarRef {
    pub name: String,
    /// Struct field for `:emp.salary` style references
    pub member: Option<String>,
    /// Companion indicator variable (`:var:ind` or `:var INDICATOR :ind`)
    pub indicator: Option<String>,
    pub span: Span,
}

impl HostVarRef {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            member: None,
            indicator: None,
            span,
        }
    }

    /// The reference as written, without the leading colon
    pub fn qualified(&self) -> String {
        match &self.member {
            Some(member) => format!("{}.{}", self.name, member),
            None => self.name.clone(),
        }
    }
}

/// The "no more rows" branch recognized after a Fetch
///
/// `if (sqlca.sqlcode == 1403) break;` immediately after a fetch is not an
/// ordinary conditional: it is the loop's termination condition, and the
/// generator must emit it as such.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelBranch {
    /// The status code tested (1403 or 100)
    pub code: i32,
    pub action: SentinelAction,
    pub span: Span,
}

/// What the program does when no more rows are available
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentinelAction {
    Break,
    Continue,
    Goto(String),
    /// `return;` or `return <expr>;` with the raw expression text
    Return(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WheneverCondition {
    SqlError,
    SqlWarning,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WheneverAction {
    Continue,
    Goto(String),
    Stop,
}

impl WheneverCondition {
    pub fn describe(&self) -> &'static str {
        match self {
            WheneverCondition::SqlError => "SQLERROR",
            WheneverCondition::SqlWarning => "SQLWARNING",
            WheneverCondition::NotFound => "NOT FOUND",
        }
    }
}

impl WheneverAction {
    pub fn describe(&self) -> String {
        match self {
            WheneverAction::Continue => "CONTINUE".into(),
            WheneverAction::Goto(label) => format!("GOTO {}", label),
            WheneverAction::Stop => "STOP".into(),
        }
    }
}
