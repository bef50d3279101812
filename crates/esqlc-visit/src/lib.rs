//! Shared AST traversal for analysis and transform passes
//!
//! Both the cursor tracker and the code generator ride the same walker:
//! deterministic pre-order in source order, with per-variant dispatch on a
//! closed `NodeKind`. A pass declares the variants it handles; everything
//! else is skipped with a warning so a new AST variant degrades loudly
//! instead of breaking existing passes. A handled variant the pass still
//! has no mapping for comes back as `Visited::Unsupported`, which
//! transforming passes turn into an inline marker.

use esqlc_ast::*;

/// Every AST variant a pass can dispatch on, embedded subtypes included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Include,
    Define,
    Struct,
    Function,
    Variable,
    Host,
    Block,
    If,
    Loop,
    Unparsed,
    DeclareCursor,
    OpenCursor,
    FetchCursor,
    CloseCursor,
    SelectInto,
    Insert,
    Update,
    Delete,
    Commit,
    Rollback,
    BeginDeclareSection,
    EndDeclareSection,
    IncludeSqlca,
    Whenever,
    OtherEmbedded,
}

impl NodeKind {
    pub fn of_item(item: &Item) -> NodeKind {
        match item {
            Item::Include(_) => NodeKind::Include,
            Item::Define(_) => NodeKind::Define,
            Item::Struct(_) => NodeKind::Struct,
            Item::Function(_) => NodeKind::Function,
            Item::Variable(_) => NodeKind::Variable,
            Item::Embedded(stmt) => NodeKind::of_embedded(&stmt.kind),
            Item::Host(_) => NodeKind::Host,
            Item::Unparsed(_) => NodeKind::Unparsed,
        }
    }

    pub fn of_stmt(stmt: &Stmt) -> NodeKind {
        match stmt {
            Stmt::Declaration(_) => NodeKind::Variable,
            Stmt::Host(_) => NodeKind::Host,
            Stmt::Block(_) => NodeKind::Block,
            Stmt::If(_) => NodeKind::If,
            Stmt::Loop(_) => NodeKind::Loop,
            Stmt::Embedded(node) => NodeKind::of_embedded(&node.kind),
            Stmt::Unparsed(_) => NodeKind::Unparsed,
        }
    }

    pub fn of_embedded(kind: &EmbeddedKind) -> NodeKind {
        match kind {
            EmbeddedKind::Declare { .. } => NodeKind::DeclareCursor,
            EmbeddedKind::Open { .. } => NodeKind::OpenCursor,
            EmbeddedKind::Fetch { .. } => NodeKind::FetchCursor,
            EmbeddedKind::Close { .. } => NodeKind::CloseCursor,
            EmbeddedKind::Select { .. } => NodeKind::SelectInto,
            EmbeddedKind::Insert { .. } => NodeKind::Insert,
            EmbeddedKind::Update { .. } => NodeKind::Update,
            EmbeddedKind::Delete { .. } => NodeKind::Delete,
            EmbeddedKind::Commit { .. } => NodeKind::Commit,
            EmbeddedKind::Rollback { .. } => NodeKind::Rollback,
            EmbeddedKind::BeginDeclareSection => NodeKind::BeginDeclareSection,
            EmbeddedKind::EndDeclareSection => NodeKind::EndDeclareSection,
            EmbeddedKind::IncludeSqlca => NodeKind::IncludeSqlca,
            EmbeddedKind::Whenever { .. } => NodeKind::Whenever,
            EmbeddedKind::Other => NodeKind::OtherEmbedded,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            NodeKind::Include => "include directive",
            NodeKind::Define => "macro definition",
            NodeKind::Struct => "struct declaration",
            NodeKind::Function => "function",
            NodeKind::Variable => "variable declaration",
            NodeKind::Host => "host statement",
            NodeKind::Block => "block",
            NodeKind::If => "conditional",
            NodeKind::Loop => "loop",
            NodeKind::Unparsed => "unparsed region",
            NodeKind::DeclareCursor => "cursor declaration",
            NodeKind::OpenCursor => "cursor open",
            NodeKind::FetchCursor => "cursor fetch",
            NodeKind::CloseCursor => "cursor close",
            NodeKind::SelectInto => "singleton select",
            NodeKind::Insert => "insert statement",
            NodeKind::Update => "update statement",
            NodeKind::Delete => "delete statement",
            NodeKind::Commit => "commit",
            NodeKind::Rollback => "rollback",
            NodeKind::BeginDeclareSection => "declare section begin",
            NodeKind::EndDeclareSection => "declare section end",
            NodeKind::IncludeSqlca => "sqlca include",
            NodeKind::Whenever => "whenever directive",
            NodeKind::OtherEmbedded => "embedded statement",
        }
    }
}

/// Result of dispatching one node to a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visited<T> {
    /// The pass produced a result for this node
    Output(T),
    /// The pass has no mapping for this node
    Unsupported { kind: NodeKind, span: Span },
}

impl<T> Visited<T> {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Visited::Unsupported { .. })
    }

    pub fn into_output(self) -> Option<T> {
        match self {
            Visited::Output(value) => Some(value),
            Visited::Unsupported { .. } => None,
        }
    }
}

/// One pass over the AST
///
/// Leaf methods default to `Unsupported`; container hooks default to
/// producing nothing. An analysis pass mutates its own state and leaves
/// `Output = ()`; a transforming pass returns text fragments the walker
/// collects in order.
pub trait NodeVisitor {
    type Output;

    /// Variants this pass handles. The walker skips an unhandled node
    /// (subtree included) and records a warning in its place.
    fn handles(&self, _kind: NodeKind) -> bool {
        true
    }

    /// Called for every handled node the dispatch returned `Unsupported`
    /// for, before the walker moves on to the next sibling.
    fn unsupported(&mut self, _kind: NodeKind, _span: Span) {}

    // ========== Container hooks ==========

    fn enter_function(&mut self, _decl: &FunctionDecl) -> Option<Self::Output> {
        None
    }

    fn leave_function(&mut self, _decl: &FunctionDecl) -> Option<Self::Output> {
        None
    }

    fn enter_block(&mut self, _block: &Block) -> Option<Self::Output> {
        None
    }

    fn leave_block(&mut self, _block: &Block) -> Option<Self::Output> {
        None
    }

    fn enter_if(&mut self, _stmt: &IfStmt) -> Option<Self::Output> {
        None
    }

    /// Called between the two branches of an `if` with an `else`
    fn enter_else(&mut self, _stmt: &IfStmt) -> Option<Self::Output> {
        None
    }

    fn leave_if(&mut self, _stmt: &IfStmt) -> Option<Self::Output> {
        None
    }

    fn enter_loop(&mut self, _stmt: &LoopStmt) -> Option<Self::Output> {
        None
    }

    fn leave_loop(&mut self, _stmt: &LoopStmt) -> Option<Self::Output> {
        None
    }

    // ========== Host leaves ==========

    fn visit_include(&mut self, node: &IncludeDirective) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::Include,
            span: node.span,
        }
    }

    fn visit_define(&mut self, node: &MacroDefine) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::Define,
            span: node.span,
        }
    }

    fn visit_struct(&mut self, node: &StructDecl) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::Struct,
            span: node.span,
        }
    }

    fn visit_variable(&mut self, node: &VariableDecl) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::Variable,
            span: node.span,
        }
    }

    fn visit_host(&mut self, node: &HostStmt) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::Host,
            span: node.span,
        }
    }

    fn visit_unparsed(&mut self, node: &UnparsedNode) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::Unparsed,
            span: node.span,
        }
    }

    // ========== Embedded leaves ==========

    fn visit_declare(
        &mut self,
        stmt: &EmbeddedStmt,
        _cursor_name: &str,
        _query: &QueryText,
    ) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::DeclareCursor,
            span: stmt.span,
        }
    }

    fn visit_open(
        &mut self,
        stmt: &EmbeddedStmt,
        _cursor_name: &str,
        _using: &[HostVarRef],
    ) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::OpenCursor,
            span: stmt.span,
        }
    }

    fn visit_fetch(
        &mut self,
        stmt: &EmbeddedStmt,
        _cursor_name: &str,
        _into: &[HostVarRef],
        _not_found: Option<&SentinelBranch>,
    ) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::FetchCursor,
            span: stmt.span,
        }
    }

    fn visit_close(&mut self, stmt: &EmbeddedStmt, _cursor_name: &str) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::CloseCursor,
            span: stmt.span,
        }
    }

    fn visit_select(
        &mut self,
        stmt: &EmbeddedStmt,
        _query: &QueryText,
        _into: &[HostVarRef],
    ) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::SelectInto,
            span: stmt.span,
        }
    }

    fn visit_insert(&mut self, stmt: &EmbeddedStmt, _query: &QueryText) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::Insert,
            span: stmt.span,
        }
    }

    fn visit_update(&mut self, stmt: &EmbeddedStmt, _query: &QueryText) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::Update,
            span: stmt.span,
        }
    }

    fn visit_delete(&mut self, stmt: &EmbeddedStmt, _query: &QueryText) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::Delete,
            span: stmt.span,
        }
    }

    fn visit_commit(&mut self, stmt: &EmbeddedStmt, _release: bool) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::Commit,
            span: stmt.span,
        }
    }

    fn visit_rollback(&mut self, stmt: &EmbeddedStmt, _release: bool) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::Rollback,
            span: stmt.span,
        }
    }

    fn visit_begin_declare_section(&mut self, stmt: &EmbeddedStmt) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::BeginDeclareSection,
            span: stmt.span,
        }
    }

    fn visit_end_declare_section(&mut self, stmt: &EmbeddedStmt) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::EndDeclareSection,
            span: stmt.span,
        }
    }

    fn visit_include_sqlca(&mut self, stmt: &EmbeddedStmt) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::IncludeSqlca,
            span: stmt.span,
        }
    }

    fn visit_whenever(
        &mut self,
        stmt: &EmbeddedStmt,
        _condition: WheneverCondition,
        _action: &WheneverAction,
    ) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::Whenever,
            span: stmt.span,
        }
    }

    fn visit_other(&mut self, stmt: &EmbeddedStmt) -> Visited<Self::Output> {
        Visited::Unsupported {
            kind: NodeKind::OtherEmbedded,
            span: stmt.span,
        }
    }
}

/// Everything one walk produced
#[derive(Debug)]
pub struct WalkOutcome<T> {
    /// Pass outputs in traversal order
    pub results: Vec<T>,
    /// Warnings the walker recorded for skipped nodes
    pub diagnostics: Vec<Diagnostic>,
}

/// Drive a visitor over the whole program in source order
pub fn walk_program<V: NodeVisitor>(
    program: &Program,
    visitor: &mut V,
    cancel: &CancelToken,
) -> Result<WalkOutcome<V::Output>, Cancelled> {
    let mut walk = Walk {
        visitor,
        cancel,
        results: Vec::new(),
        diagnostics: Vec::new(),
    };
    for item in &program.items {
        walk.item(item)?;
    }
    Ok(WalkOutcome {
        results: walk.results,
        diagnostics: walk.diagnostics,
    })
}

struct Walk<'a, V: NodeVisitor> {
    visitor: &'a mut V,
    cancel: &'a CancelToken,
    results: Vec<V::Output>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a, V: NodeVisitor> Walk<'a, V> {
    fn collect(&mut self, visited: Visited<V::Output>) {
        match visited {
            Visited::Output(value) => self.results.push(value),
            Visited::Unsupported { kind, span } => self.visitor.unsupported(kind, span),
        }
    }

    fn hook(&mut self, value: Option<V::Output>) {
        if let Some(value) = value {
            self.results.push(value);
        }
    }

    /// False when the pass does not handle `kind`; the caller must then
    /// skip the node and its subtree
    fn handled(&mut self, kind: NodeKind, span: Span) -> bool {
        if self.visitor.handles(kind) {
            return true;
        }
        self.diagnostics.push(Diagnostic::warning(
            DiagCode::SkippedNode,
            format!("{} skipped: not handled by this pass", kind.describe()),
            span,
        ));
        false
    }

    fn item(&mut self, item: &Item) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        if !self.handled(NodeKind::of_item(item), item.span()) {
            return Ok(());
        }
        match item {
            Item::Include(node) => {
                let visited = self.visitor.visit_include(node);
                self.collect(visited);
            }
            Item::Define(node) => {
                let visited = self.visitor.visit_define(node);
                self.collect(visited);
            }
            Item::Struct(node) => {
                let visited = self.visitor.visit_struct(node);
                self.collect(visited);
            }
            Item::Variable(node) => {
                let visited = self.visitor.visit_variable(node);
                self.collect(visited);
            }
            Item::Host(node) => {
                let visited = self.visitor.visit_host(node);
                self.collect(visited);
            }
            Item::Unparsed(node) => {
                let visited = self.visitor.visit_unparsed(node);
                self.collect(visited);
            }
            Item::Embedded(node) => self.embedded(node),
            Item::Function(decl) => {
                let opened = self.visitor.enter_function(decl);
                self.hook(opened);
                self.block(&decl.body)?;
                let closed = self.visitor.leave_function(decl);
                self.hook(closed);
            }
        }
        Ok(())
    }

    fn block(&mut self, block: &Block) -> Result<(), Cancelled> {
        let opened = self.visitor.enter_block(block);
        self.hook(opened);
        for stmt in &block.stmts {
            self.stmt(stmt)?;
        }
        let closed = self.visitor.leave_block(block);
        self.hook(closed);
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        if !self.handled(NodeKind::of_stmt(stmt), stmt.span()) {
            return Ok(());
        }
        match stmt {
            Stmt::Declaration(node) => {
                let visited = self.visitor.visit_variable(node);
                self.collect(visited);
            }
            Stmt::Host(node) => {
                let visited = self.visitor.visit_host(node);
                self.collect(visited);
            }
            Stmt::Unparsed(node) => {
                let visited = self.visitor.visit_unparsed(node);
                self.collect(visited);
            }
            Stmt::Embedded(node) => self.embedded(node),
            Stmt::Block(block) => self.block(block)?,
            Stmt::If(node) => {
                let opened = self.visitor.enter_if(node);
                self.hook(opened);
                self.stmt(&node.then_branch)?;
                if let Some(else_branch) = &node.else_branch {
                    let between = self.visitor.enter_else(node);
                    self.hook(between);
                    self.stmt(else_branch)?;
                }
                let closed = self.visitor.leave_if(node);
                self.hook(closed);
            }
            Stmt::Loop(node) => {
                let opened = self.visitor.enter_loop(node);
                self.hook(opened);
                self.stmt(&node.body)?;
                let closed = self.visitor.leave_loop(node);
                self.hook(closed);
            }
        }
        Ok(())
    }

    fn embedded(&mut self, stmt: &EmbeddedStmt) {
        let visited = match &stmt.kind {
            EmbeddedKind::Declare { cursor_name, query } => {
                self.visitor.visit_declare(stmt, cursor_name, query)
            }
            EmbeddedKind::Open { cursor_name, using } => {
                self.visitor.visit_open(stmt, cursor_name, using)
            }
            EmbeddedKind::Fetch {
                cursor_name,
                into,
                not_found,
            } => self
                .visitor
                .visit_fetch(stmt, cursor_name, into, not_found.as_ref()),
            EmbeddedKind::Close { cursor_name } => self.visitor.visit_close(stmt, cursor_name),
            EmbeddedKind::Select { query, into } => self.visitor.visit_select(stmt, query, into),
            EmbeddedKind::Insert { query } => self.visitor.visit_insert(stmt, query),
            EmbeddedKind::Update { query } => self.visitor.visit_update(stmt, query),
            EmbeddedKind::Delete { query } => self.visitor.visit_delete(stmt, query),
            EmbeddedKind::Commit { release } => self.visitor.visit_commit(stmt, *release),
            EmbeddedKind::Rollback { release } => self.visitor.visit_rollback(stmt, *release),
            EmbeddedKind::BeginDeclareSection => self.visitor.visit_begin_declare_section(stmt),
            EmbeddedKind::EndDeclareSection => self.visitor.visit_end_declare_section(stmt),
            EmbeddedKind::IncludeSqlca => self.visitor.visit_include_sqlca(stmt),
            EmbeddedKind::Whenever { condition, action } => {
                self.visitor.visit_whenever(stmt, *condition, action)
            }
            EmbeddedKind::Other => self.visitor.visit_other(stmt),
        };
        self.collect(visited);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esqlc_parser::parse;

    const CURSOR_LOOP: &str = r#"
int main() {
    EXEC SQL DECLARE c1 CURSOR FOR SELECT a FROM t;
    EXEC SQL OPEN c1;
    while (1) {
        EXEC SQL FETCH c1 INTO :x;
    }
    EXEC SQL CLOSE c1;
    return 0;
}
"#;

    /// Labels every node it sees, in order
    struct Labeler;

    impl NodeVisitor for Labeler {
        type Output = String;

        fn enter_function(&mut self, decl: &FunctionDecl) -> Option<String> {
            Some(format!("enter {}", decl.name))
        }

        fn leave_function(&mut self, decl: &FunctionDecl) -> Option<String> {
            Some(format!("leave {}", decl.name))
        }

        fn visit_host(&mut self, _node: &HostStmt) -> Visited<String> {
            Visited::Output("host".to_string())
        }

        fn visit_declare(
            &mut self,
            _stmt: &EmbeddedStmt,
            cursor_name: &str,
            _query: &QueryText,
        ) -> Visited<String> {
            Visited::Output(format!("declare {}", cursor_name))
        }

        fn visit_open(
            &mut self,
            _stmt: &EmbeddedStmt,
            cursor_name: &str,
            _using: &[HostVarRef],
        ) -> Visited<String> {
            Visited::Output(format!("open {}", cursor_name))
        }

        fn visit_fetch(
            &mut self,
            _stmt: &EmbeddedStmt,
            cursor_name: &str,
            _into: &[HostVarRef],
            _not_found: Option<&SentinelBranch>,
        ) -> Visited<String> {
            Visited::Output(format!("fetch {}", cursor_name))
        }

        fn visit_close(&mut self, _stmt: &EmbeddedStmt, cursor_name: &str) -> Visited<String> {
            Visited::Output(format!("close {}", cursor_name))
        }
    }

    #[test]
    fn test_walk_visits_in_source_order() {
        let output = parse(CURSOR_LOOP);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        let cancel = CancelToken::new();
        let outcome = walk_program(&output.program, &mut Labeler, &cancel).unwrap();
        assert_eq!(
            outcome.results,
            vec![
                "enter main",
                "declare c1",
                "open c1",
                "fetch c1",
                "close c1",
                "host",
                "leave main",
            ]
        );
    }

    #[test]
    fn test_walk_is_deterministic() {
        let output = parse(CURSOR_LOOP);
        let cancel = CancelToken::new();
        let first = walk_program(&output.program, &mut Labeler, &cancel).unwrap();
        let second = walk_program(&output.program, &mut Labeler, &cancel).unwrap();
        assert_eq!(first.results, second.results);
    }

    /// Handles everything except loops
    struct NoLoops;

    impl NodeVisitor for NoLoops {
        type Output = String;

        fn handles(&self, kind: NodeKind) -> bool {
            kind != NodeKind::Loop
        }

        fn visit_fetch(
            &mut self,
            _stmt: &EmbeddedStmt,
            cursor_name: &str,
            _into: &[HostVarRef],
            _not_found: Option<&SentinelBranch>,
        ) -> Visited<String> {
            Visited::Output(format!("fetch {}", cursor_name))
        }
    }

    #[test]
    fn test_unhandled_kind_skips_subtree_with_warning() {
        let output = parse(CURSOR_LOOP);
        let cancel = CancelToken::new();
        let outcome = walk_program(&output.program, &mut NoLoops, &cancel).unwrap();
        // the fetch lives inside the skipped loop, so it never fires
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].code, DiagCode::SkippedNode);
        assert_eq!(outcome.diagnostics[0].severity, Severity::Warning);
    }

    /// Counts dispatches it had no mapping for
    #[derive(Default)]
    struct Unmapped {
        seen: Vec<NodeKind>,
    }

    impl NodeVisitor for Unmapped {
        type Output = ();

        fn unsupported(&mut self, kind: NodeKind, _span: Span) {
            self.seen.push(kind);
        }
    }

    #[test]
    fn test_unsupported_nodes_reach_the_hook() {
        let output = parse("int x;\nEXEC SQL COMMIT;");
        let cancel = CancelToken::new();
        let mut visitor = Unmapped::default();
        let outcome = walk_program(&output.program, &mut visitor, &cancel).unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(visitor.seen, vec![NodeKind::Variable, NodeKind::Commit]);
    }

    #[test]
    fn test_if_else_hook_order() {
        struct Marks;
        impl NodeVisitor for Marks {
            type Output = &'static str;

            fn enter_if(&mut self, _stmt: &IfStmt) -> Option<&'static str> {
                Some("if")
            }

            fn enter_else(&mut self, _stmt: &IfStmt) -> Option<&'static str> {
                Some("else")
            }

            fn leave_if(&mut self, _stmt: &IfStmt) -> Option<&'static str> {
                Some("end")
            }

            fn visit_host(&mut self, _node: &HostStmt) -> Visited<&'static str> {
                Visited::Output("host")
            }
        }

        let output = parse("int f(int c) { if (c) { g(); } else { h(); } }");
        let cancel = CancelToken::new();
        let outcome = walk_program(&output.program, &mut Marks, &cancel).unwrap();
        assert_eq!(outcome.results, vec!["if", "host", "else", "host", "end"]);
    }

    #[test]
    fn test_cancelled_walk_stops() {
        let output = parse(CURSOR_LOOP);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(walk_program(&output.program, &mut Labeler, &cancel).is_err());
    }
}
