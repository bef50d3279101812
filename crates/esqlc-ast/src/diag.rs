//! Structured diagnostics
//!
//! Every stage reports problems by returning `Diagnostic` values in source
//! order; nothing in the core prints. The CLI renders them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Span;

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn describe(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Stable diagnostic codes
///
/// The short id (`as_str`) appears in CLI reports and inline output
/// markers; the variant name is the serialized identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagCode {
    // Lexical
    UnexpectedCharacter,
    UnterminatedString,
    UnterminatedComment,
    UnterminatedEmbedded,

    // Syntactic
    UnexpectedToken,
    UnbalancedNesting,
    MalformedEmbedded,

    // Cursor lifecycle
    DuplicateCursor,
    CursorNotDeclared,
    ReopenWithoutDeclare,
    CursorNotOpen,
    CursorNeverClosed,

    // Host-variable binding
    UnresolvedHostVariable,
    ArityMismatch,
    ArityUnknown,

    // Generation
    UnsupportedConstruct,
    SkippedNode,
}

impl DiagCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagCode::UnexpectedCharacter => "E-LEX-001",
            DiagCode::UnterminatedString => "E-LEX-002",
            DiagCode::UnterminatedComment => "E-LEX-003",
            DiagCode::UnterminatedEmbedded => "E-LEX-004",
            DiagCode::UnexpectedToken => "E-SYN-001",
            DiagCode::UnbalancedNesting => "E-SYN-002",
            DiagCode::MalformedEmbedded => "E-SYN-003",
            DiagCode::DuplicateCursor => "W-CUR-001",
            DiagCode::CursorNotDeclared => "W-CUR-002",
            DiagCode::ReopenWithoutDeclare => "W-CUR-003",
            DiagCode::CursorNotOpen => "W-CUR-004",
            DiagCode::CursorNeverClosed => "W-CUR-005",
            DiagCode::UnresolvedHostVariable => "E-BIND-001",
            DiagCode::ArityMismatch => "E-BIND-002",
            DiagCode::ArityUnknown => "I-BIND-003",
            DiagCode::UnsupportedConstruct => "E-GEN-001",
            DiagCode::SkippedNode => "W-VIS-001",
        }
    }

    /// Cursor-lifecycle codes escalate under strict cursor checking
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            DiagCode::DuplicateCursor
                | DiagCode::CursorNotDeclared
                | DiagCode::ReopenWithoutDeclare
                | DiagCode::CursorNotOpen
                | DiagCode::CursorNeverClosed
        )
    }
}

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagCode,
    pub message: String,
    #[serde(rename = "sourceSpan")]
    pub span: Span,
}

impl Diagnostic {
    pub fn error(code: DiagCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            span,
        }
    }

    pub fn warning(code: DiagCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            span,
        }
    }

    pub fn info(code: DiagCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Info,
            code,
            message: message.into(),
            span,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {} ({}..{})",
            self.severity.describe(),
            self.code,
            self.message,
            self.span.start,
            self.span.end
        )
    }
}
