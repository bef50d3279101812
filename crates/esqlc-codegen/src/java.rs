//! JDBC-flavoured Java backend.
//!
//! Cursors become a `PreparedStatement`/`ResultSet` pair named after the
//! cursor; singleton statements get sequentially numbered locals. Every
//! handle a function opens is declared up front and released in a
//! `finally` block.

use esqlc_ast::{
    DiagCode, FunctionDecl, HostType, HostVarRef, LoopKind, QueryText, SentinelAction,
    SentinelBranch, Span, WheneverAction, WheneverCondition,
};
use esqlc_checker::VarInfo;

use crate::dialect::{escape, parameterize, Dialect, DialectName, GenCtx};

pub struct JavaJdbc;

impl Dialect for JavaJdbc {
    fn name(&self) -> DialectName {
        DialectName::JavaJdbc
    }

    fn placeholder(&self) -> &'static str {
        "?"
    }

    fn comment(&self, text: &str) -> Vec<String> {
        if text.starts_with("//") || text.starts_with("/*") {
            return text.lines().map(str::to_string).collect();
        }
        text.lines().map(|line| format!("// {}", line)).collect()
    }

    fn unsupported_marker(&self, detail: &str, span: Span) -> Vec<String> {
        let mut lines = vec![format!(
            "/* not translated ({}) source {}..{}:",
            DiagCode::UnsupportedConstruct.as_str(),
            span.start,
            span.end
        )];
        for line in detail.lines() {
            lines.push(format!(" * {}", line.replace("*/", "* /")));
        }
        lines.push(" */".into());
        lines
    }

    fn function_open(&self, decl: &FunctionDecl) -> Vec<String> {
        let params: Vec<String> = decl
            .params
            .iter()
            .map(|p| format!("{} {}", p.ty.describe(), p.name))
            .collect();
        vec![format!(
            "{} {}({})",
            decl.return_type,
            decl.name,
            params.join(", ")
        )]
    }

    fn block_open(&self) -> Vec<String> {
        vec!["{".into()]
    }

    fn block_close(&self) -> Vec<String> {
        vec!["}".into()]
    }

    fn if_open(&self, cond: &str) -> Vec<String> {
        vec![format!("if ({})", cond)]
    }

    fn else_open(&self) -> Vec<String> {
        vec!["else".into()]
    }

    fn loop_open(&self, kind: LoopKind, header: &str) -> Vec<String> {
        match kind {
            LoopKind::While => vec![format!("while ({})", header)],
            LoopKind::For => vec![format!("for ({})", header)],
            LoopKind::DoWhile => vec!["do".into()],
        }
    }

    fn do_while_tail(&self, header: &str) -> Vec<String> {
        vec![format!("while ({});", header)]
    }

    fn prologue(&self, cursors: &[String]) -> Vec<String> {
        let mut lines = Vec::new();
        for cursor in cursors {
            lines.push(format!("PreparedStatement {}_stmt = null;", cursor));
            lines.push(format!("ResultSet {}_rs = null;", cursor));
        }
        lines.push("try {".into());
        lines
    }

    fn epilogue(&self, cursors: &[String]) -> Vec<String> {
        let mut lines = vec!["} finally {".to_string()];
        for cursor in cursors {
            lines.push(format!(
                "    if ({0}_rs != null) {0}_rs.close();",
                cursor
            ));
            lines.push(format!(
                "    if ({0}_stmt != null) {0}_stmt.close();",
                cursor
            ));
        }
        lines.push("}".into());
        lines
    }

    fn declare(&self, _ctx: &GenCtx, cursor_name: &str, query: &QueryText) -> Vec<String> {
        vec![format!(
            "final String {}_SQL = \"{}\";",
            cursor_name,
            escape(&parameterize(&query.text, self.placeholder()))
        )]
    }

    fn open(&self, ctx: &GenCtx, cursor_name: &str, binds: &[HostVarRef]) -> Vec<String> {
        let mut lines = vec![format!(
            "{0}_stmt = conn.prepareStatement({0}_SQL);",
            cursor_name
        )];
        let handle = format!("{}_stmt", cursor_name);
        bind_params(ctx, &handle, binds, &mut lines);
        lines.push(format!("{0}_rs = {0}_stmt.executeQuery();", cursor_name));
        lines
    }

    fn fetch(
        &self,
        ctx: &GenCtx,
        cursor_name: &str,
        into: &[HostVarRef],
        not_found: Option<&SentinelBranch>,
    ) -> Vec<String> {
        let rs = format!("{}_rs", cursor_name);
        match not_found {
            Some(branch) => {
                let mut lines = vec![format!(
                    "if (!{}.next()) {}",
                    rs,
                    sentinel_stmt(&branch.action)
                )];
                read_columns(ctx, &rs, into, "", &mut lines);
                lines
            }
            None => {
                let mut lines = vec![format!("if ({}.next()) {{", rs)];
                read_columns(ctx, &rs, into, "    ", &mut lines);
                lines.push("}".into());
                lines
            }
        }
    }

    fn close(&self, cursor_name: &str) -> Vec<String> {
        vec![
            format!("{}_rs.close();", cursor_name),
            format!("{}_rs = null;", cursor_name),
            format!("{}_stmt.close();", cursor_name),
            format!("{}_stmt = null;", cursor_name),
        ]
    }

    fn select_into(
        &self,
        ctx: &GenCtx,
        seq: usize,
        query: &QueryText,
        into: &[HostVarRef],
    ) -> Vec<String> {
        let stmt = format!("stmt{}", seq);
        let rs = format!("rs{}", seq);
        let mut lines = vec![format!(
            "PreparedStatement {} = conn.prepareStatement(\"{}\");",
            stmt,
            escape(&parameterize(&query.text, self.placeholder()))
        )];
        bind_params(ctx, &stmt, &query.params, &mut lines);
        lines.push(format!("ResultSet {} = {}.executeQuery();", rs, stmt));
        lines.push(format!("if ({}.next()) {{", rs));
        read_columns(ctx, &rs, into, "    ", &mut lines);
        lines.push("}".into());
        lines.push(format!("{}.close();", rs));
        lines.push(format!("{}.close();", stmt));
        lines
    }

    fn execute(&self, ctx: &GenCtx, seq: usize, query: &QueryText) -> Vec<String> {
        let stmt = format!("stmt{}", seq);
        let mut lines = vec![format!(
            "PreparedStatement {} = conn.prepareStatement(\"{}\");",
            stmt,
            escape(&parameterize(&query.text, self.placeholder()))
        )];
        bind_params(ctx, &stmt, &query.params, &mut lines);
        lines.push(format!("{}.executeUpdate();", stmt));
        lines.push(format!("{}.close();", stmt));
        lines
    }

    fn commit(&self, release: bool) -> Vec<String> {
        let mut lines = vec!["conn.commit();".to_string()];
        if release {
            lines.push("conn.close();".into());
        }
        lines
    }

    fn rollback(&self, release: bool) -> Vec<String> {
        let mut lines = vec!["conn.rollback();".to_string()];
        if release {
            lines.push("conn.close();".into());
        }
        lines
    }

    fn whenever(&self, condition: WheneverCondition, action: &WheneverAction) -> Vec<String> {
        vec![format!(
            "// WHENEVER {} {} (directive not translated)",
            condition.describe(),
            action.describe()
        )]
    }
}

/// `setXxx` method for a resolved host type; unresolved binds fall back
/// to `setObject`.
fn setter_for(info: Option<&VarInfo>) -> &'static str {
    match info {
        Some(info) => match &info.ty {
            HostType::Int => "setInt",
            HostType::Short => "setShort",
            HostType::Long => "setLong",
            HostType::Float => "setFloat",
            HostType::Double => "setDouble",
            HostType::Char => "setString",
            HostType::Struct(_) | HostType::Named(_) | HostType::Unknown => "setObject",
        },
        None => "setObject",
    }
}

fn getter_for(info: Option<&VarInfo>) -> &'static str {
    match info {
        Some(info) => match &info.ty {
            HostType::Int => "getInt",
            HostType::Short => "getShort",
            HostType::Long => "getLong",
            HostType::Float => "getFloat",
            HostType::Double => "getDouble",
            HostType::Char => "getString",
            HostType::Struct(_) | HostType::Named(_) | HostType::Unknown => "getObject",
        },
        None => "getObject",
    }
}

fn bind_params(ctx: &GenCtx, handle: &str, binds: &[HostVarRef], lines: &mut Vec<String>) {
    for (position, var) in binds.iter().enumerate() {
        lines.push(format!(
            "{}.{}({}, {});",
            handle,
            setter_for(ctx.binding(var)),
            position + 1,
            var.qualified()
        ));
    }
}

/// Typed getters for each destination, with indicator assignment when
/// the source carried one.
fn read_columns(
    ctx: &GenCtx,
    rs: &str,
    into: &[HostVarRef],
    indent: &str,
    lines: &mut Vec<String>,
) {
    for (position, var) in into.iter().enumerate() {
        lines.push(format!(
            "{}{} = {}.{}({});",
            indent,
            var.qualified(),
            rs,
            getter_for(ctx.binding(var)),
            position + 1
        ));
        if let Some(indicator) = &var.indicator {
            lines.push(format!(
                "{}{} = {}.wasNull() ? -1 : 0;",
                indent, indicator, rs
            ));
        }
    }
}

fn sentinel_stmt(action: &SentinelAction) -> String {
    match action {
        SentinelAction::Break => "break;".into(),
        SentinelAction::Continue => "continue;".into(),
        SentinelAction::Goto(label) => format!("break; /* was: goto {} */", label),
        SentinelAction::Return(None) => "return;".into(),
        SentinelAction::Return(Some(value)) => format!("return {};", value),
    }
}
