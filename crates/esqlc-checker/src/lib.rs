//! Cursor lifecycle tracking and host-variable binding
//!
//! One analysis pass per unit, riding the shared walker. Each function
//! scope gets a fresh lifecycle view of every known cursor; file-scope
//! declarations seed the table the functions extend. The result carries
//! the cursor registry and the resolved declaration behind every
//! host-variable reference, which is what the generator binds against.

mod cursor;
mod symbols;
mod tracker;

pub use cursor::*;
pub use symbols::*;
pub use tracker::*;

use std::collections::HashMap;

use esqlc_ast::{CancelToken, Cancelled, Diagnostic, HostVarRef, Program, Span};

/// What one analysis pass learned about a unit
#[derive(Debug)]
pub struct AnalysisResult {
    pub cursors: CursorTable,
    /// Resolved declaration per reference, keyed by the reference's span
    pub resolved: HashMap<Span, VarInfo>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisResult {
    pub fn cursor(&self, name: &str) -> Option<&CursorDescriptor> {
        self.cursors.get(name)
    }

    /// The declaration a host-variable reference landed on
    pub fn binding(&self, var: &HostVarRef) -> Option<&VarInfo> {
        self.resolved.get(&var.span)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }
}

/// Analyze a program
pub fn analyze(program: &Program) -> AnalysisResult {
    let token = CancelToken::new();
    match analyze_with(program, &token) {
        Ok(result) => result,
        // the token above has no other handle, so this arm cannot run
        Err(Cancelled) => AnalysisResult {
            cursors: CursorTable::new(),
            resolved: HashMap::new(),
            diagnostics: Vec::new(),
        },
    }
}

/// Analyze a program, polling `cancel` at node boundaries
pub fn analyze_with(program: &Program, cancel: &CancelToken) -> Result<AnalysisResult, Cancelled> {
    let mut tracker = CursorTracker::new();
    let outcome = esqlc_visit::walk_program(program, &mut tracker, cancel)?;
    let mut diagnostics = tracker.diagnostics;
    diagnostics.extend(outcome.diagnostics);
    Ok(AnalysisResult {
        cursors: tracker.cursors,
        resolved: tracker.resolved,
        diagnostics,
    })
}
