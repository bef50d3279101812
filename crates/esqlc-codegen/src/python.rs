//! DB-API 2.0 Python backend.
//!
//! Cursors map onto `conn.cursor()` objects named `<name>_cur`; fetches
//! go through `fetchone()` with tuple unpacking into the destinations.
//! Block structure is carried by indentation, so the generator asks this
//! dialect for no closing delimiters.

use esqlc_ast::{
    DiagCode, FunctionDecl, HostVarRef, LoopKind, QueryText, SentinelAction, SentinelBranch, Span,
    WheneverAction, WheneverCondition,
};

use crate::dialect::{escape, parameterize, Dialect, DialectName, GenCtx};

pub struct PythonDbApi;

impl Dialect for PythonDbApi {
    fn name(&self) -> DialectName {
        DialectName::PythonDbApi
    }

    fn indent_scoped(&self) -> bool {
        true
    }

    fn placeholder(&self) -> &'static str {
        "%s"
    }

    fn comment(&self, text: &str) -> Vec<String> {
        let body = if let Some(rest) = text.strip_prefix("/*") {
            rest.strip_suffix("*/").unwrap_or(rest)
        } else if let Some(rest) = text.strip_prefix("//") {
            rest
        } else if let Some(rest) = text.strip_prefix("--") {
            rest
        } else {
            text
        };
        body.lines().map(|line| format!("# {}", line.trim())).collect()
    }

    fn unsupported_marker(&self, detail: &str, span: Span) -> Vec<String> {
        let mut lines = vec![format!(
            "# not translated ({}) source {}..{}:",
            DiagCode::UnsupportedConstruct.as_str(),
            span.start,
            span.end
        )];
        for line in detail.lines() {
            lines.push(format!("#   {}", line));
        }
        lines
    }

    fn function_open(&self, decl: &FunctionDecl) -> Vec<String> {
        let params: Vec<&str> = decl.params.iter().map(|p| p.name.as_str()).collect();
        vec![format!("def {}({}):", decl.name, params.join(", "))]
    }

    fn block_open(&self) -> Vec<String> {
        Vec::new()
    }

    fn block_close(&self) -> Vec<String> {
        Vec::new()
    }

    fn if_open(&self, cond: &str) -> Vec<String> {
        vec![format!("if {}:", cond)]
    }

    fn else_open(&self) -> Vec<String> {
        vec!["else:".into()]
    }

    fn loop_open(&self, kind: LoopKind, header: &str) -> Vec<String> {
        match kind {
            LoopKind::While => vec![format!("while {}:", header)],
            LoopKind::For => match split_for_header(header) {
                Some((init, cond, _)) => {
                    let mut lines = Vec::new();
                    if !init.is_empty() {
                        lines.push(init.to_string());
                    }
                    lines.push("while True:".into());
                    if !cond.is_empty() {
                        lines.push(format!("    if not ({}): break", cond));
                    }
                    lines
                }
                None => vec![format!("# for ({})", header), "while True:".into()],
            },
            LoopKind::DoWhile => vec!["while True:".into()],
        }
    }

    fn do_while_tail(&self, header: &str) -> Vec<String> {
        vec![format!("if not ({}): break", header)]
    }

    fn for_step_tail(&self, header: &str) -> Vec<String> {
        match split_for_header(header) {
            Some((_, _, step)) if !step.is_empty() => vec![step_stmt(step)],
            _ => Vec::new(),
        }
    }

    fn prologue(&self, cursors: &[String]) -> Vec<String> {
        let mut lines = Vec::new();
        for cursor in cursors {
            lines.push(format!("{}_cur = None", cursor));
        }
        lines.push("try:".into());
        lines
    }

    fn epilogue(&self, cursors: &[String]) -> Vec<String> {
        let mut lines = vec!["finally:".to_string()];
        for cursor in cursors {
            lines.push(format!(
                "    if {0}_cur is not None: {0}_cur.close()",
                cursor
            ));
        }
        lines
    }

    fn declare(&self, _ctx: &GenCtx, cursor_name: &str, query: &QueryText) -> Vec<String> {
        vec![format!(
            "{}_SQL = \"{}\"",
            cursor_name,
            escape(&parameterize(&query.text, self.placeholder()))
        )]
    }

    fn open(&self, _ctx: &GenCtx, cursor_name: &str, binds: &[HostVarRef]) -> Vec<String> {
        let mut lines = vec![format!("{0}_cur = conn.cursor()", cursor_name)];
        match bind_tuple(binds) {
            Some(tuple) => lines.push(format!(
                "{0}_cur.execute({0}_SQL, {1})",
                cursor_name, tuple
            )),
            None => lines.push(format!("{0}_cur.execute({0}_SQL)", cursor_name)),
        }
        lines
    }

    fn fetch(
        &self,
        _ctx: &GenCtx,
        cursor_name: &str,
        into: &[HostVarRef],
        not_found: Option<&SentinelBranch>,
    ) -> Vec<String> {
        let row = format!("{}_row", cursor_name);
        let mut lines = vec![format!("{} = {}_cur.fetchone()", row, cursor_name)];
        match not_found {
            Some(branch) => {
                lines.push(format!(
                    "if {} is None: {}",
                    row,
                    sentinel_stmt(&branch.action)
                ));
                unpack_row(&row, into, "", &mut lines);
            }
            None if into.is_empty() => {}
            None => {
                lines.push(format!("if {} is not None:", row));
                unpack_row(&row, into, "    ", &mut lines);
            }
        }
        lines
    }

    fn close(&self, cursor_name: &str) -> Vec<String> {
        vec![
            format!("{}_cur.close()", cursor_name),
            format!("{}_cur = None", cursor_name),
        ]
    }

    fn select_into(
        &self,
        _ctx: &GenCtx,
        seq: usize,
        query: &QueryText,
        into: &[HostVarRef],
    ) -> Vec<String> {
        let cur = format!("cur{}", seq);
        let row = format!("row{}", seq);
        let mut lines = vec![format!("{} = conn.cursor()", cur)];
        lines.push(execute_line(&cur, query, self.placeholder()));
        lines.push(format!("{} = {}.fetchone()", row, cur));
        if !into.is_empty() {
            lines.push(format!("if {} is not None:", row));
            unpack_row(&row, into, "    ", &mut lines);
        }
        lines.push(format!("{}.close()", cur));
        lines
    }

    fn execute(&self, _ctx: &GenCtx, seq: usize, query: &QueryText) -> Vec<String> {
        let cur = format!("cur{}", seq);
        vec![
            format!("{} = conn.cursor()", cur),
            execute_line(&cur, query, self.placeholder()),
            format!("{}.close()", cur),
        ]
    }

    fn commit(&self, release: bool) -> Vec<String> {
        let mut lines = vec!["conn.commit()".to_string()];
        if release {
            lines.push("conn.close()".into());
        }
        lines
    }

    fn rollback(&self, release: bool) -> Vec<String> {
        let mut lines = vec!["conn.rollback()".to_string()];
        if release {
            lines.push("conn.close()".into());
        }
        lines
    }

    fn whenever(&self, condition: WheneverCondition, action: &WheneverAction) -> Vec<String> {
        vec![format!(
            "# WHENEVER {} {} (directive not translated)",
            condition.describe(),
            action.describe()
        )]
    }
}

/// The `init; cond; step` pieces of a C `for` header, trimmed
fn split_for_header(header: &str) -> Option<(&str, &str, &str)> {
    let mut parts = header.split(';');
    let init = parts.next()?;
    let cond = parts.next()?;
    let step = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((init.trim(), cond.trim(), step.trim()))
}

/// Python spelling of a C step expression; `++` and `--` have no
/// direct equivalent
fn step_stmt(step: &str) -> String {
    if let Some(var) = step.strip_suffix("++").or_else(|| step.strip_prefix("++")) {
        return format!("{} += 1", var.trim());
    }
    if let Some(var) = step.strip_suffix("--").or_else(|| step.strip_prefix("--")) {
        return format!("{} -= 1", var.trim());
    }
    step.to_string()
}

/// `(a,)` / `(a, b)` literal for the bind values, `None` when empty
fn bind_tuple(binds: &[HostVarRef]) -> Option<String> {
    if binds.is_empty() {
        return None;
    }
    let values: Vec<String> = binds.iter().map(HostVarRef::qualified).collect();
    if values.len() == 1 {
        Some(format!("({},)", values[0]))
    } else {
        Some(format!("({})", values.join(", ")))
    }
}

fn execute_line(cur: &str, query: &QueryText, placeholder: &str) -> String {
    let sql = escape(&parameterize(&query.text, placeholder));
    match bind_tuple(&query.params) {
        Some(tuple) => format!("{}.execute(\"{}\", {})", cur, sql, tuple),
        None => format!("{}.execute(\"{}\")", cur, sql),
    }
}

/// Tuple-unpack a fetched row into the destinations, then derive any
/// indicator values from the unpacked results.
fn unpack_row(row: &str, into: &[HostVarRef], indent: &str, lines: &mut Vec<String>) {
    if into.is_empty() {
        return;
    }
    let targets: Vec<String> = into.iter().map(HostVarRef::qualified).collect();
    if targets.len() == 1 {
        lines.push(format!("{}{}, = {}", indent, targets[0], row));
    } else {
        lines.push(format!("{}{} = {}", indent, targets.join(", "), row));
    }
    for var in into {
        if let Some(indicator) = &var.indicator {
            lines.push(format!(
                "{}{} = -1 if {} is None else 0",
                indent,
                indicator,
                var.qualified()
            ));
        }
    }
}

fn sentinel_stmt(action: &SentinelAction) -> String {
    match action {
        SentinelAction::Break => "break".into(),
        SentinelAction::Continue => "continue".into(),
        SentinelAction::Goto(label) => format!("break  # was: goto {}", label),
        SentinelAction::Return(None) => "return".into(),
        SentinelAction::Return(Some(value)) => format!("return {}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_headers_split_at_the_two_semicolons() {
        assert_eq!(
            split_for_header("i = 0; i < n; i++"),
            Some(("i = 0", "i < n", "i++"))
        );
        assert_eq!(split_for_header(";;"), Some(("", "", "")));
        assert_eq!(split_for_header("ever"), None);
        assert_eq!(split_for_header("a; b; c; d"), None);
    }

    #[test]
    fn step_expressions_respell_increment_and_decrement() {
        assert_eq!(step_stmt("i++"), "i += 1");
        assert_eq!(step_stmt("++i"), "i += 1");
        assert_eq!(step_stmt("count--"), "count -= 1");
        assert_eq!(step_stmt("i += 2"), "i += 2");
    }
}
