//! Per-dialect code generation over the unified AST.
//!
//! The generator is one transforming pass over the program: host items
//! reproduce their original text, embedded statements are mapped through
//! a [`Dialect`] backend, and constructs with no mapping leave an inline
//! marker plus a diagnostic while their siblings keep flowing. Output is
//! a pure function of the validated AST, the analysis result, and the
//! options; the same input always yields byte-identical text.

mod dialect;
mod java;
mod python;

pub use dialect::{parameterize, Dialect, DialectName, GenCtx};
pub use java::JavaJdbc;
pub use python::PythonDbApi;

use esqlc_ast::{
    Block, CancelToken, Cancelled, DiagCode, Diagnostic, EmbeddedKind, EmbeddedStmt, FunctionDecl,
    HostStmt, HostVarRef, IfStmt, IncludeDirective, LoopKind, LoopStmt, MacroDefine, Program,
    QueryText, SentinelBranch, Span, Stmt, StructDecl, VariableDecl, WheneverAction,
    WheneverCondition,
};
use esqlc_checker::AnalysisResult;
use esqlc_visit::{walk_program, NodeKind, NodeVisitor, Visited};

/// Knobs the driver forwards into one generation run
#[derive(Debug, Clone, Default)]
pub struct GenOptions {
    /// Re-emit source comments at their positions, in the dialect's
    /// comment syntax
    pub preserve_comments: bool,
}

/// Generated text plus everything the generator had to report
#[derive(Debug)]
pub struct GenOutput {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Generate target code for one translation unit.
///
/// `source` and `comments` come from the parse of the same unit; they
/// feed passthrough snippets and comment re-emission.
pub fn generate(
    program: &Program,
    analysis: &AnalysisResult,
    dialect: &dyn Dialect,
    source: &str,
    comments: &[Span],
    options: &GenOptions,
) -> GenOutput {
    let token = CancelToken::new();
    match generate_with(program, analysis, dialect, source, comments, options, &token) {
        Ok(output) => output,
        // the token above has no other handle, so this arm cannot run
        Err(Cancelled) => GenOutput {
            text: String::new(),
            diagnostics: Vec::new(),
        },
    }
}

/// Cancellable variant of [`generate`]
pub fn generate_with(
    program: &Program,
    analysis: &AnalysisResult,
    dialect: &dyn Dialect,
    source: &str,
    comments: &[Span],
    options: &GenOptions,
    cancel: &CancelToken,
) -> Result<GenOutput, Cancelled> {
    let mut generator = Generator::new(dialect, analysis, source, comments, options);
    walk_program(program, &mut generator, cancel)?;
    Ok(generator.finish())
}

/// The transforming pass. Indentation, top-level spacing, and comment
/// interleaving live here; everything language-shaped comes from the
/// dialect.
struct Generator<'a> {
    dialect: &'a dyn Dialect,
    ctx: GenCtx<'a>,
    source: &'a str,
    comments: &'a [Span],
    next_comment: usize,
    preserve_comments: bool,
    lines: Vec<String>,
    indent: usize,
    block_depth: usize,
    in_function: bool,
    pending_prologue: Option<Vec<String>>,
    epilogue_cursors: Vec<String>,
    seq: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Generator<'a> {
    fn new(
        dialect: &'a dyn Dialect,
        analysis: &'a AnalysisResult,
        source: &'a str,
        comments: &'a [Span],
        options: &GenOptions,
    ) -> Self {
        Generator {
            dialect,
            ctx: GenCtx::new(analysis),
            source,
            comments,
            next_comment: 0,
            preserve_comments: options.preserve_comments,
            lines: Vec::new(),
            indent: 0,
            block_depth: 0,
            in_function: false,
            pending_prologue: None,
            epilogue_cursors: Vec::new(),
            seq: 0,
            diagnostics: Vec::new(),
        }
    }

    fn finish(mut self) -> GenOutput {
        self.flush_comments(usize::MAX);
        while matches!(self.lines.last(), Some(line) if line.is_empty()) {
            self.lines.pop();
        }
        let mut text = self.lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        GenOutput {
            text,
            diagnostics: self.diagnostics,
        }
    }

    fn snippet(&self, span: Span) -> &'a str {
        self.source.get(span.start..span.end).unwrap_or("")
    }

    fn push_lines(&mut self, fragment: Vec<String>) {
        let unit = self.dialect.indent_unit();
        for line in fragment {
            if line.is_empty() {
                self.lines.push(String::new());
            } else {
                let mut indented = unit.repeat(self.indent);
                indented.push_str(&line);
                self.lines.push(indented);
            }
        }
    }

    /// Blank line between top-level items, then any comments that start
    /// before this node
    fn open_node(&mut self, span: Span) {
        if self.indent == 0 && !self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.flush_comments(span.start);
    }

    fn flush_comments(&mut self, upto: usize) {
        if !self.preserve_comments {
            return;
        }
        while let Some(&span) = self.comments.get(self.next_comment) {
            if span.start >= upto {
                break;
            }
            let text = self.snippet(span);
            let rendered = self.dialect.comment(text);
            self.push_lines(rendered);
            self.next_comment += 1;
        }
    }

    fn comment_line(&mut self, text: &str) {
        let rendered = self.dialect.comment(text);
        self.push_lines(rendered);
    }
}

/// Cursors a function body opens, in first-open order
fn opened_cursors(block: &Block) -> Vec<String> {
    let mut found = Vec::new();
    scan_block(block, &mut found);
    found
}

fn scan_block(block: &Block, found: &mut Vec<String>) {
    for stmt in &block.stmts {
        scan_stmt(stmt, found);
    }
}

fn scan_stmt(stmt: &Stmt, found: &mut Vec<String>) {
    match stmt {
        Stmt::Embedded(node) => {
            if let EmbeddedKind::Open { cursor_name, .. } = &node.kind {
                if !found.iter().any(|name| name == cursor_name) {
                    found.push(cursor_name.clone());
                }
            }
        }
        Stmt::Block(block) => scan_block(block, found),
        Stmt::If(node) => {
            scan_stmt(&node.then_branch, found);
            if let Some(else_branch) = &node.else_branch {
                scan_stmt(else_branch, found);
            }
        }
        Stmt::Loop(node) => scan_stmt(&node.body, found),
        _ => {}
    }
}

fn is_block(stmt: &Stmt) -> bool {
    matches!(stmt, Stmt::Block(_))
}

impl NodeVisitor for Generator<'_> {
    type Output = ();

    fn unsupported(&mut self, kind: NodeKind, span: Span) {
        self.open_node(span);
        let detail = self.snippet(span);
        let marker = self.dialect.unsupported_marker(detail, span);
        self.push_lines(marker);
        self.diagnostics.push(Diagnostic::warning(
            DiagCode::UnsupportedConstruct,
            format!("{} has no {} mapping", kind.describe(), self.dialect.name()),
            span,
        ));
    }

    // ========== Containers ==========

    fn enter_function(&mut self, decl: &FunctionDecl) -> Option<()> {
        self.open_node(decl.span);
        let opening = self.dialect.function_open(decl);
        self.push_lines(opening);
        let opened = opened_cursors(&decl.body);
        self.pending_prologue = if opened.is_empty() {
            None
        } else {
            Some(opened)
        };
        self.in_function = true;
        None
    }

    fn leave_function(&mut self, _decl: &FunctionDecl) -> Option<()> {
        self.in_function = false;
        None
    }

    fn enter_block(&mut self, _block: &Block) -> Option<()> {
        let opening = self.dialect.block_open();
        self.push_lines(opening);
        self.indent += 1;
        self.block_depth += 1;
        if self.block_depth == 1 && self.in_function {
            if let Some(cursors) = self.pending_prologue.take() {
                let prologue = self.dialect.prologue(&cursors);
                self.push_lines(prologue);
                self.indent += 1;
                self.epilogue_cursors = cursors;
            }
        }
        None
    }

    fn leave_block(&mut self, _block: &Block) -> Option<()> {
        if self.block_depth == 1 && self.in_function && !self.epilogue_cursors.is_empty() {
            let cursors = std::mem::take(&mut self.epilogue_cursors);
            self.indent -= 1;
            let epilogue = self.dialect.epilogue(&cursors);
            self.push_lines(epilogue);
        }
        self.indent -= 1;
        self.block_depth -= 1;
        let closing = self.dialect.block_close();
        self.push_lines(closing);
        None
    }

    fn enter_if(&mut self, stmt: &IfStmt) -> Option<()> {
        self.flush_comments(stmt.span.start);
        let opening = self.dialect.if_open(&stmt.cond);
        self.push_lines(opening);
        if !is_block(&stmt.then_branch) {
            self.indent += 1;
        }
        None
    }

    fn enter_else(&mut self, stmt: &IfStmt) -> Option<()> {
        if !is_block(&stmt.then_branch) {
            self.indent -= 1;
        }
        let opening = self.dialect.else_open();
        self.push_lines(opening);
        if let Some(else_branch) = &stmt.else_branch {
            if !is_block(else_branch) {
                self.indent += 1;
            }
        }
        None
    }

    fn leave_if(&mut self, stmt: &IfStmt) -> Option<()> {
        let last = stmt.else_branch.as_ref().unwrap_or(&stmt.then_branch);
        if !is_block(last) {
            self.indent -= 1;
        }
        None
    }

    fn enter_loop(&mut self, stmt: &LoopStmt) -> Option<()> {
        self.flush_comments(stmt.span.start);
        let opening = self.dialect.loop_open(stmt.kind, &stmt.header);
        self.push_lines(opening);
        if !is_block(&stmt.body) {
            self.indent += 1;
        }
        None
    }

    fn leave_loop(&mut self, stmt: &LoopStmt) -> Option<()> {
        let plain_body = !is_block(&stmt.body);
        if self.dialect.indent_scoped() {
            // the exit test or step statement has to sit at body depth
            let tail = match stmt.kind {
                LoopKind::DoWhile => self.dialect.do_while_tail(&stmt.header),
                LoopKind::For => self.dialect.for_step_tail(&stmt.header),
                LoopKind::While => Vec::new(),
            };
            if !tail.is_empty() {
                if !plain_body {
                    self.indent += 1;
                }
                self.push_lines(tail);
                self.indent -= 1;
                return None;
            }
        }
        if plain_body {
            self.indent -= 1;
        }
        if stmt.kind == LoopKind::DoWhile {
            let mut tail = self.dialect.do_while_tail(&stmt.header);
            if !plain_body && !tail.is_empty() {
                // the exit test attaches to the block's closing delimiter
                let first = tail.remove(0);
                match self.lines.last_mut() {
                    Some(last) => {
                        last.push(' ');
                        last.push_str(&first);
                    }
                    None => tail.insert(0, first),
                }
            }
            self.push_lines(tail);
        }
        None
    }

    // ========== Host items ==========

    fn visit_include(&mut self, node: &IncludeDirective) -> Visited<()> {
        self.open_node(node.span);
        let text = if node.system {
            format!("#include <{}>", node.name)
        } else {
            format!("#include \"{}\"", node.name)
        };
        self.comment_line(&text);
        Visited::Output(())
    }

    fn visit_define(&mut self, node: &MacroDefine) -> Visited<()> {
        self.open_node(node.span);
        let text = match &node.body {
            Some(body) => format!("#define {} {}", node.name, body),
            None => format!("#define {}", node.name),
        };
        self.comment_line(&text);
        Visited::Output(())
    }

    fn visit_struct(&mut self, node: &StructDecl) -> Visited<()> {
        self.open_node(node.span);
        let mut lines = vec![format!("struct {} {{", node.name)];
        for field in &node.fields {
            lines.push(match field.array_len {
                Some(len) => format!("    {} {}[{}];", field.ty.describe(), field.name, len),
                None => format!("    {} {};", field.ty.describe(), field.name),
            });
        }
        lines.push("};".into());
        self.push_lines(lines);
        Visited::Output(())
    }

    fn visit_variable(&mut self, node: &VariableDecl) -> Visited<()> {
        self.open_node(node.span);
        let mut decl = match node.array_len {
            Some(len) => format!("{} {}[{}]", node.ty.describe(), node.name, len),
            None => format!("{} {}", node.ty.describe(), node.name),
        };
        if let Some(init) = &node.init {
            decl.push_str(&format!(" = {}", init));
        }
        decl.push(';');
        self.push_lines(vec![decl]);
        Visited::Output(())
    }

    fn visit_host(&mut self, node: &HostStmt) -> Visited<()> {
        self.open_node(node.span);
        let lines = self.dialect.host_stmt(&node.text);
        self.push_lines(lines);
        Visited::Output(())
    }

    // ========== Embedded statements ==========

    fn visit_declare(
        &mut self,
        stmt: &EmbeddedStmt,
        cursor_name: &str,
        query: &QueryText,
    ) -> Visited<()> {
        self.open_node(stmt.span);
        let lines = self.dialect.declare(&self.ctx, cursor_name, query);
        self.push_lines(lines);
        Visited::Output(())
    }

    fn visit_open(
        &mut self,
        stmt: &EmbeddedStmt,
        cursor_name: &str,
        using: &[HostVarRef],
    ) -> Visited<()> {
        self.open_node(stmt.span);
        let binds = if using.is_empty() {
            self.ctx
                .analysis
                .cursor(cursor_name)
                .map(|descriptor| descriptor.query.params.clone())
                .unwrap_or_default()
        } else {
            using.to_vec()
        };
        let lines = self.dialect.open(&self.ctx, cursor_name, &binds);
        self.push_lines(lines);
        Visited::Output(())
    }

    fn visit_fetch(
        &mut self,
        stmt: &EmbeddedStmt,
        cursor_name: &str,
        into: &[HostVarRef],
        not_found: Option<&SentinelBranch>,
    ) -> Visited<()> {
        self.open_node(stmt.span);
        let lines = self.dialect.fetch(&self.ctx, cursor_name, into, not_found);
        self.push_lines(lines);
        Visited::Output(())
    }

    fn visit_close(&mut self, stmt: &EmbeddedStmt, cursor_name: &str) -> Visited<()> {
        self.open_node(stmt.span);
        let lines = self.dialect.close(cursor_name);
        self.push_lines(lines);
        Visited::Output(())
    }

    fn visit_select(
        &mut self,
        stmt: &EmbeddedStmt,
        query: &QueryText,
        into: &[HostVarRef],
    ) -> Visited<()> {
        self.open_node(stmt.span);
        self.seq += 1;
        let lines = self.dialect.select_into(&self.ctx, self.seq, query, into);
        self.push_lines(lines);
        Visited::Output(())
    }

    fn visit_insert(&mut self, stmt: &EmbeddedStmt, query: &QueryText) -> Visited<()> {
        self.open_node(stmt.span);
        self.seq += 1;
        let lines = self.dialect.execute(&self.ctx, self.seq, query);
        self.push_lines(lines);
        Visited::Output(())
    }

    fn visit_update(&mut self, stmt: &EmbeddedStmt, query: &QueryText) -> Visited<()> {
        self.open_node(stmt.span);
        self.seq += 1;
        let lines = self.dialect.execute(&self.ctx, self.seq, query);
        self.push_lines(lines);
        Visited::Output(())
    }

    fn visit_delete(&mut self, stmt: &EmbeddedStmt, query: &QueryText) -> Visited<()> {
        self.open_node(stmt.span);
        self.seq += 1;
        let lines = self.dialect.execute(&self.ctx, self.seq, query);
        self.push_lines(lines);
        Visited::Output(())
    }

    fn visit_commit(&mut self, stmt: &EmbeddedStmt, release: bool) -> Visited<()> {
        self.open_node(stmt.span);
        let lines = self.dialect.commit(release);
        self.push_lines(lines);
        Visited::Output(())
    }

    fn visit_rollback(&mut self, stmt: &EmbeddedStmt, release: bool) -> Visited<()> {
        self.open_node(stmt.span);
        let lines = self.dialect.rollback(release);
        self.push_lines(lines);
        Visited::Output(())
    }

    fn visit_begin_declare_section(&mut self, stmt: &EmbeddedStmt) -> Visited<()> {
        self.open_node(stmt.span);
        self.comment_line(&format!("EXEC SQL {}", stmt.sql));
        Visited::Output(())
    }

    fn visit_end_declare_section(&mut self, stmt: &EmbeddedStmt) -> Visited<()> {
        self.open_node(stmt.span);
        self.comment_line(&format!("EXEC SQL {}", stmt.sql));
        Visited::Output(())
    }

    fn visit_include_sqlca(&mut self, stmt: &EmbeddedStmt) -> Visited<()> {
        self.open_node(stmt.span);
        self.comment_line(&format!("EXEC SQL {}", stmt.sql));
        Visited::Output(())
    }

    fn visit_whenever(
        &mut self,
        stmt: &EmbeddedStmt,
        condition: WheneverCondition,
        action: &WheneverAction,
    ) -> Visited<()> {
        self.open_node(stmt.span);
        let lines = self.dialect.whenever(condition, action);
        self.push_lines(lines);
        Visited::Output(())
    }

    // Unparsed regions and unrecognized embedded statements keep their
    // default Unsupported dispatch and come back through `unsupported`.
}

#[cfg(test)]
mod tests {
    use super::*;
    use esqlc_checker::analyze;
    use esqlc_parser::parse;

    const REPORT: &str = r#"
int report(int dept) {
    int empno;
    char ename[11];
    EXEC SQL DECLARE c1 CURSOR FOR SELECT empno, ename FROM emp WHERE deptno = :dept;
    EXEC SQL OPEN c1;
    while (1) {
        EXEC SQL FETCH c1 INTO :empno, :ename;
        if (sqlca.sqlcode == 1403) break;
        process(empno, ename);
    }
    EXEC SQL CLOSE c1;
    return 0;
}
"#;

    fn emit(source: &str, name: DialectName, options: &GenOptions) -> GenOutput {
        let parsed = parse(source);
        let analysis = analyze(&parsed.program);
        let dialect = name.create();
        generate(
            &parsed.program,
            &analysis,
            dialect.as_ref(),
            source,
            &parsed.comments,
            options,
        )
    }

    fn java(source: &str) -> String {
        emit(source, DialectName::JavaJdbc, &GenOptions::default()).text
    }

    fn python(source: &str) -> String {
        emit(source, DialectName::PythonDbApi, &GenOptions::default()).text
    }

    #[test]
    fn java_translates_a_cursor_loop() {
        let out = java(REPORT);
        for expected in [
            "int report(int dept)",
            "final String c1_SQL = \"SELECT empno, ename FROM emp WHERE deptno = ?\";",
            "c1_stmt = conn.prepareStatement(c1_SQL);",
            "c1_stmt.setInt(1, dept);",
            "c1_rs = c1_stmt.executeQuery();",
            "if (!c1_rs.next()) break;",
            "empno = c1_rs.getInt(1);",
            "ename = c1_rs.getString(2);",
            "c1_rs.close();",
        ] {
            assert!(out.contains(expected), "missing {:?} in:\n{}", expected, out);
        }
    }

    #[test]
    fn java_wraps_opened_handles_in_finally() {
        let out = java(REPORT);
        let declared = out.find("ResultSet c1_rs = null;").unwrap();
        let tried = out.find("try {").unwrap();
        let opened = out.find("c1_stmt = conn.prepareStatement").unwrap();
        let released = out.find("} finally {").unwrap();
        assert!(declared < tried && tried < opened && opened < released);
        assert!(out.contains("if (c1_rs != null) c1_rs.close();"));
        assert!(out.contains("if (c1_stmt != null) c1_stmt.close();"));
    }

    #[test]
    fn python_translates_a_cursor_loop() {
        let out = python(REPORT);
        for expected in [
            "def report(dept):",
            "c1_SQL = \"SELECT empno, ename FROM emp WHERE deptno = %s\"",
            "c1_cur = conn.cursor()",
            "c1_cur.execute(c1_SQL, (dept,))",
            "c1_row = c1_cur.fetchone()",
            "if c1_row is None: break",
            "empno, ename = c1_row",
            "finally:",
            "if c1_cur is not None: c1_cur.close()",
        ] {
            assert!(out.contains(expected), "missing {:?} in:\n{}", expected, out);
        }
    }

    #[test]
    fn output_is_deterministic() {
        assert_eq!(java(REPORT), java(REPORT));
        assert_eq!(python(REPORT), python(REPORT));
    }

    #[test]
    fn unsupported_statement_leaves_marker_between_siblings() {
        let source = r#"
int step() {
    before();
    EXEC SQL SAVEPOINT sp1;
    after();
}
"#;
        let output = emit(source, DialectName::JavaJdbc, &GenOptions::default());
        let before = output.text.find("before();").unwrap();
        let marker = output.text.find("/* not translated (E-GEN-001)").unwrap();
        let after = output.text.find("after();").unwrap();
        assert!(before < marker && marker < after, "{}", output.text);
        assert!(output.text.contains("EXEC SQL SAVEPOINT sp1"));
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].code, DiagCode::UnsupportedConstruct);
    }

    #[test]
    fn unparsed_region_leaves_marker() {
        let source = "int main() {\n    EXEC SQL DECLARE ;\n    done();\n}\n";
        let output = emit(source, DialectName::PythonDbApi, &GenOptions::default());
        assert!(output.text.contains("# not translated (E-GEN-001)"));
        assert!(output.text.contains("done();"));
        assert!(output
            .diagnostics
            .iter()
            .any(|d| d.code == DiagCode::UnsupportedConstruct));
    }

    #[test]
    fn commit_release_also_closes_the_connection() {
        let source = "int finish() {\n    EXEC SQL COMMIT WORK RELEASE;\n}\n";
        let out = java(source);
        assert!(out.contains("conn.commit();"));
        assert!(out.contains("conn.close();"));
        let out = python(source);
        assert!(out.contains("conn.commit()"));
        assert!(out.contains("conn.close()"));
    }

    #[test]
    fn singleton_select_needs_no_function_prologue() {
        let source = r#"
int lookup(int id) {
    char name[21];
    float sal;
    short sal_ind;
    EXEC SQL SELECT ename, sal INTO :name, :sal:sal_ind FROM emp WHERE empno = :id;
    return 0;
}
"#;
        let out = java(source);
        assert!(!out.contains("try {"), "no cursor, no prologue:\n{}", out);
        for expected in [
            "PreparedStatement stmt1 = conn.prepareStatement(\"SELECT ename, sal FROM emp WHERE empno = ?\");",
            "stmt1.setInt(1, id);",
            "if (rs1.next()) {",
            "name = rs1.getString(1);",
            "sal = rs1.getFloat(2);",
            "sal_ind = rs1.wasNull() ? -1 : 0;",
            "rs1.close();",
        ] {
            assert!(out.contains(expected), "missing {:?} in:\n{}", expected, out);
        }
    }

    #[test]
    fn insert_binds_positionally_in_both_dialects() {
        let source = r#"
int record(int emp_id, char name) {
    EXEC SQL INSERT INTO emp (empno, ename) VALUES (:emp_id, :name);
}
"#;
        let out = java(source);
        assert!(out.contains("stmt1.setInt(1, emp_id);"));
        assert!(out.contains("stmt1.setString(2, name);"));
        assert!(out.contains("stmt1.executeUpdate();"));
        let out = python(source);
        assert!(out.contains(
            "cur1.execute(\"INSERT INTO emp (empno, ename) VALUES (%s, %s)\", (emp_id, name))"
        ));
    }

    #[test]
    fn do_while_exit_test_lands_inside_the_python_loop() {
        let source = r#"
int drain() {
    int n;
    EXEC SQL DECLARE c2 CURSOR FOR SELECT n FROM t;
    EXEC SQL OPEN c2;
    do {
        EXEC SQL FETCH c2 INTO :n;
        use_row(n);
    } while (sqlca.sqlcode == 0);
    EXEC SQL CLOSE c2;
}
"#;
        let out = python(source);
        assert!(out.contains("while True:"));
        assert!(
            out.contains("\n            if not (sqlca.sqlcode == 0): break"),
            "exit test must sit at body depth:\n{}",
            out
        );
        let out = java(source);
        let body_end = out.find("\n        }").unwrap();
        let tail = out.find("while (sqlca.sqlcode == 0);").unwrap();
        assert!(body_end < tail, "{}", out);
    }

    #[test]
    fn for_loop_keeps_its_exit_test_in_python() {
        let source = r#"
int load(int n) {
    int i;
    int total;
    for (i = 0; i < n; i++) {
        EXEC SQL SELECT amount INTO :total FROM ledger WHERE slot = :i;
        tally(total);
    }
    return 0;
}
"#;
        let out = python(source);
        let init = out.find("\n    i = 0").unwrap();
        let head = out.find("\n    while True:").unwrap();
        let test = out.find("\n        if not (i < n): break").unwrap();
        let body = out.find("\n        tally(total);").unwrap();
        let step = out.find("\n        i += 1").unwrap();
        assert!(
            init < head && head < test && test < body && body < step,
            "{}",
            out
        );
        let out = java(source);
        assert!(out.contains("for (i = 0; i < n; i++)"), "{}", out);
    }

    #[test]
    fn bare_for_header_adds_no_exit_test() {
        let source = "int spin() {\n    for (;;) {\n        EXEC SQL COMMIT;\n    }\n}\n";
        let out = python(source);
        assert!(out.contains("    while True:"), "{}", out);
        assert!(!out.contains("if not ("), "{}", out);
        assert!(!out.contains("# for"), "{}", out);
    }

    #[test]
    fn directives_render_as_comments() {
        let source = r#"
#include <stdio.h>
EXEC SQL INCLUDE SQLCA;
EXEC SQL WHENEVER SQLERROR GOTO err_exit;
int main() {
    return 0;
}
"#;
        let out = java(source);
        assert!(out.contains("// #include <stdio.h>"));
        assert!(out.contains("// EXEC SQL INCLUDE SQLCA"));
        assert!(out.contains("// WHENEVER SQLERROR GOTO err_exit (directive not translated)"));
    }

    #[test]
    fn comments_follow_the_preserve_flag() {
        let source = "/* fetch block */\nint main() {\n    run();\n}\n";
        let kept = emit(
            source,
            DialectName::JavaJdbc,
            &GenOptions {
                preserve_comments: true,
            },
        );
        assert!(kept.text.contains("/* fetch block */"));
        let dropped = emit(source, DialectName::JavaJdbc, &GenOptions::default());
        assert!(!dropped.text.contains("fetch block"));
    }

    #[test]
    fn file_scope_cursor_emits_at_top_level() {
        let source = r#"
EXEC SQL DECLARE g1 CURSOR FOR SELECT a FROM t;

int use_it() {
    int a;
    EXEC SQL OPEN g1;
    EXEC SQL FETCH g1 INTO :a;
    EXEC SQL CLOSE g1;
}
"#;
        let out = java(source);
        assert!(
            out.starts_with("final String g1_SQL = \"SELECT a FROM t\";"),
            "{}",
            out
        );
        assert!(out.contains("g1_stmt = conn.prepareStatement(g1_SQL);"));
        assert!(out.contains("} finally {"));
    }
}
