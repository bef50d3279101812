//! The lifecycle and binding pass

use std::collections::HashMap;

use esqlc_ast::*;
use esqlc_visit::{NodeVisitor, Visited};

use crate::{CursorDescriptor, CursorScope, CursorState, CursorTable, SymbolTable, VarInfo};

/// Analysis pass the walker carries over the AST
///
/// Tracks each cursor's lifecycle per function, resolves every
/// host-variable reference against the symbol table, and checks
/// destination arity on fetches and singleton selects. Violations become
/// diagnostics; the pass always runs to the end of the program.
///
/// Lifecycle violations are recorded as warnings here; the driver
/// escalates them under strict checking.
pub struct CursorTracker {
    pub(crate) symbols: SymbolTable,
    pub(crate) cursors: CursorTable,
    pub(crate) resolved: HashMap<Span, VarInfo>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    in_function: bool,
}

impl CursorTracker {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            cursors: CursorTable::new(),
            resolved: HashMap::new(),
            diagnostics: Vec::new(),
            in_function: false,
        }
    }

    fn warn(&mut self, code: DiagCode, message: String, span: Span) {
        self.diagnostics
            .push(Diagnostic::warning(code, message, span));
    }

    fn error(&mut self, code: DiagCode, message: String, span: Span) {
        self.diagnostics.push(Diagnostic::error(code, message, span));
    }

    fn scope(&self) -> CursorScope {
        if self.in_function {
            CursorScope::Function
        } else {
            CursorScope::File
        }
    }

    /// Resolve one `:name` or `:name.member` reference and record the
    /// declaration it lands on, keyed by the reference span
    fn resolve_var(&mut self, var: &HostVarRef) {
        let Some(info) = self.symbols.lookup(&var.name).cloned() else {
            self.error(
                DiagCode::UnresolvedHostVariable,
                format!("host variable :{} is not declared", var.name),
                var.span,
            );
            return;
        };
        let landed = match &var.member {
            None => info,
            Some(member) => match self.member_info(&info, member) {
                Some(field) => field,
                None => {
                    self.error(
                        DiagCode::UnresolvedHostVariable,
                        format!(
                            "no member {} on host variable :{} of type {}",
                            member,
                            var.name,
                            info.ty.describe()
                        ),
                        var.span,
                    );
                    return;
                }
            },
        };
        self.resolved.insert(var.span, landed);
        if let Some(indicator) = &var.indicator {
            if self.symbols.lookup(indicator).is_none() {
                self.error(
                    DiagCode::UnresolvedHostVariable,
                    format!("indicator variable :{} is not declared", indicator),
                    var.span,
                );
            }
        }
    }

    fn member_info(&self, info: &VarInfo, member: &str) -> Option<VarInfo> {
        let struct_name = match &info.ty {
            HostType::Struct(name) | HostType::Named(name) => name,
            _ => return None,
        };
        let field = self.symbols.struct_field(struct_name, member)?;
        Some(VarInfo {
            ty: field.ty.clone(),
            array_len: field.array_len,
            span: field.span,
        })
    }

    fn resolve_all(&mut self, vars: &[HostVarRef]) {
        for var in vars {
            self.resolve_var(var);
        }
    }

    // === Lifecycle transitions ===

    fn open_cursor(&mut self, cursor_name: &str, span: Span) {
        match self.cursors.get(cursor_name).map(|c| c.state) {
            None => {
                self.warn(
                    DiagCode::CursorNotDeclared,
                    format!(
                        "cursor {} opened without a visible declaration",
                        cursor_name
                    ),
                    span,
                );
                // placeholder descriptor so the rest of the lifecycle
                // checks cleanly; a later real declare claims it
                self.cursors.declare(CursorDescriptor {
                    name: cursor_name.to_string(),
                    query: QueryText {
                        text: String::new(),
                        params: Vec::new(),
                        columns: None,
                    },
                    declared_at: span,
                    state: CursorState::Open,
                    scope: self.scope(),
                    placeholder: true,
                });
            }
            Some(CursorState::Declared) | Some(CursorState::Closed) => {
                if let Some(cursor) = self.cursors.get_mut(cursor_name) {
                    cursor.state = CursorState::Open;
                }
            }
            Some(CursorState::Open) | Some(CursorState::Fetching) => {
                self.warn(
                    DiagCode::ReopenWithoutDeclare,
                    format!("cursor {} is already open", cursor_name),
                    span,
                );
            }
        }
    }

    fn fetch_cursor(&mut self, cursor_name: &str, span: Span) {
        match self.cursors.get(cursor_name).map(|c| c.state) {
            Some(CursorState::Open) | Some(CursorState::Fetching) => {
                if let Some(cursor) = self.cursors.get_mut(cursor_name) {
                    cursor.state = CursorState::Fetching;
                }
            }
            Some(state) => {
                self.warn(
                    DiagCode::CursorNotOpen,
                    format!(
                        "cursor {} fetched while {}, not open",
                        cursor_name,
                        state.describe()
                    ),
                    span,
                );
            }
            None => {
                self.warn(
                    DiagCode::CursorNotOpen,
                    format!("cursor {} fetched but never declared", cursor_name),
                    span,
                );
            }
        }
    }

    fn close_cursor(&mut self, cursor_name: &str, span: Span) {
        match self.cursors.get(cursor_name).map(|c| c.state) {
            Some(CursorState::Open) | Some(CursorState::Fetching) => {
                if let Some(cursor) = self.cursors.get_mut(cursor_name) {
                    cursor.state = CursorState::Closed;
                }
            }
            _ => {
                self.warn(
                    DiagCode::CursorNotOpen,
                    format!("cursor {} closed while not open", cursor_name),
                    span,
                );
            }
        }
    }

    /// Destination count against the statically-known column count
    fn check_arity(&mut self, columns: Option<usize>, destinations: usize, span: Span) {
        match columns {
            Some(expected) if expected != destinations => {
                self.error(
                    DiagCode::ArityMismatch,
                    format!(
                        "{} destinations bound but the query projects {} columns",
                        destinations, expected
                    ),
                    span,
                );
            }
            Some(_) => {}
            None => {
                self.diagnostics.push(Diagnostic::info(
                    DiagCode::ArityUnknown,
                    "column count is not statically known; destination arity unchecked"
                        .to_string(),
                    span,
                ));
            }
        }
    }
}

impl Default for CursorTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeVisitor for CursorTracker {
    type Output = ();

    fn enter_function(&mut self, decl: &FunctionDecl) -> Option<()> {
        self.symbols.enter_scope();
        for param in &decl.params {
            self.symbols.define(
                param.name.clone(),
                VarInfo {
                    ty: param.ty.clone(),
                    array_len: None,
                    span: param.span,
                },
            );
        }
        self.cursors.reset();
        self.in_function = true;
        None
    }

    fn leave_function(&mut self, decl: &FunctionDecl) -> Option<()> {
        let open: Vec<(String, Span)> = self
            .cursors
            .left_open()
            .map(|c| (c.name.clone(), c.declared_at))
            .collect();
        for (name, span) in open {
            self.warn(
                DiagCode::CursorNeverClosed,
                format!("cursor {} is still open at the end of {}", name, decl.name),
                span,
            );
        }
        self.symbols.exit_scope();
        self.in_function = false;
        None
    }

    fn enter_block(&mut self, _block: &Block) -> Option<()> {
        self.symbols.enter_scope();
        None
    }

    fn leave_block(&mut self, _block: &Block) -> Option<()> {
        self.symbols.exit_scope();
        None
    }

    fn visit_struct(&mut self, node: &StructDecl) -> Visited<()> {
        self.symbols.define_struct(node);
        Visited::Output(())
    }

    fn visit_variable(&mut self, node: &VariableDecl) -> Visited<()> {
        self.symbols.define(
            node.name.clone(),
            VarInfo {
                ty: node.ty.clone(),
                array_len: node.array_len,
                span: node.span,
            },
        );
        Visited::Output(())
    }

    fn visit_declare(
        &mut self,
        stmt: &EmbeddedStmt,
        cursor_name: &str,
        query: &QueryText,
    ) -> Visited<()> {
        self.resolve_all(&query.params);
        let fresh = self.cursors.declare(CursorDescriptor {
            name: cursor_name.to_string(),
            query: query.clone(),
            declared_at: stmt.span,
            state: CursorState::Declared,
            scope: self.scope(),
            placeholder: false,
        });
        if !fresh {
            self.warn(
                DiagCode::DuplicateCursor,
                format!("cursor {} is already declared", cursor_name),
                stmt.span,
            );
        }
        Visited::Output(())
    }

    fn visit_open(
        &mut self,
        stmt: &EmbeddedStmt,
        cursor_name: &str,
        using: &[HostVarRef],
    ) -> Visited<()> {
        self.resolve_all(using);
        self.open_cursor(cursor_name, stmt.span);
        Visited::Output(())
    }

    fn visit_fetch(
        &mut self,
        stmt: &EmbeddedStmt,
        cursor_name: &str,
        into: &[HostVarRef],
        _not_found: Option<&SentinelBranch>,
    ) -> Visited<()> {
        self.resolve_all(into);
        self.fetch_cursor(cursor_name, stmt.span);
        let known = self
            .cursors
            .get(cursor_name)
            .filter(|c| !c.placeholder)
            .map(|c| c.query.columns);
        if let Some(columns) = known {
            self.check_arity(columns, into.len(), stmt.span);
        }
        Visited::Output(())
    }

    fn visit_close(&mut self, stmt: &EmbeddedStmt, cursor_name: &str) -> Visited<()> {
        self.close_cursor(cursor_name, stmt.span);
        Visited::Output(())
    }

    fn visit_select(
        &mut self,
        stmt: &EmbeddedStmt,
        query: &QueryText,
        into: &[HostVarRef],
    ) -> Visited<()> {
        self.resolve_all(&query.params);
        self.resolve_all(into);
        self.check_arity(query.columns, into.len(), stmt.span);
        Visited::Output(())
    }

    fn visit_insert(&mut self, _stmt: &EmbeddedStmt, query: &QueryText) -> Visited<()> {
        self.resolve_all(&query.params);
        Visited::Output(())
    }

    fn visit_update(&mut self, _stmt: &EmbeddedStmt, query: &QueryText) -> Visited<()> {
        self.resolve_all(&query.params);
        Visited::Output(())
    }

    fn visit_delete(&mut self, _stmt: &EmbeddedStmt, query: &QueryText) -> Visited<()> {
        self.resolve_all(&query.params);
        Visited::Output(())
    }
}
