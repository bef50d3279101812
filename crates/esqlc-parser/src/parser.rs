//! Recursive descent parser implementation
//!
//! The host language is parsed shallowly: declarations, functions, and the
//! control-flow statements that can contain embedded SQL are structured,
//! everything else is carried as opaque statement text. Embedded statements
//! are classified by their leading keywords into the forms the generator
//! knows how to translate.

use std::collections::HashMap;

use esqlc_ast::*;
use esqlc_lexer::{LexMode, Token, TokenKind};

use crate::ParseError;

pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    /// Object-like macro bodies seen so far; resolves symbolic sentinel
    /// codes and array lengths
    macros: HashMap<String, String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            macros: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    // === Utilities ===

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens.last().expect("tokens should have at least EOF")
        })
    }

    fn peek(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_ahead(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = *self.current();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    fn consume(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::unexpected(
                kind.describe(),
                self.peek(),
                self.current().span,
            ))
        }
    }

    fn text(&self, token: Token) -> &'a str {
        token.text(self.source)
    }

    fn span(&self) -> Span {
        self.current().span
    }

    fn slice(&self, span: Span) -> &'a str {
        &self.source[span.start..span.end]
    }

    fn report(&mut self, err: &ParseError) {
        let code = match err {
            ParseError::MalformedEmbedded { .. } => DiagCode::MalformedEmbedded,
            _ => DiagCode::UnexpectedToken,
        };
        self.diagnostics
            .push(Diagnostic::error(code, err.to_string(), err.span()));
    }

    // === Program ===

    pub fn parse_program(&mut self, cancel: &CancelToken) -> Result<Program, Cancelled> {
        let start = self.span();
        let mut items = Vec::new();

        while !self.at(TokenKind::Eof) {
            if cancel.is_cancelled() {
                return Err(Cancelled);
            }
            let before = self.pos;
            match self.parse_item_into(&mut items) {
                Ok(()) => {}
                Err(err) => {
                    self.report(&err);
                    items.push(Item::Unparsed(self.recover_item(before)));
                }
            }
        }

        let end = self.span();
        Ok(Program::new(items, start.merge(end)))
    }

    // === Items ===

    fn parse_item_into(&mut self, out: &mut Vec<Item>) -> Result<(), ParseError> {
        match self.peek() {
            TokenKind::IncludeDirective => {
                out.push(self.parse_include_item());
            }
            TokenKind::DefineDirective => {
                out.push(self.parse_define_item());
            }
            TokenKind::Directive => {
                let token = self.advance();
                out.push(Item::Host(HostStmt {
                    text: self.text(token).to_string(),
                    span: token.span,
                }));
            }
            TokenKind::ExecSql => {
                out.push(Item::Embedded(self.parse_embedded()?));
            }
            TokenKind::KwStruct if self.is_struct_definition() => {
                out.push(self.parse_struct_item()?);
            }
            k if k.starts_type() => {
                self.parse_typed_into(out)?;
            }
            TokenKind::Ident if self.looks_like_declaration(true) => {
                self.parse_typed_into(out)?;
            }
            _ => {
                out.push(self.parse_host_item());
            }
        }
        Ok(())
    }

    fn parse_include_item(&mut self) -> Item {
        let token = self.advance();
        let text = self.text(token);
        match esqlc_lexer::parse_include(text) {
            Some((name, system)) => Item::Include(IncludeDirective {
                name,
                system,
                span: token.span,
            }),
            None => Item::Host(HostStmt {
                text: text.to_string(),
                span: token.span,
            }),
        }
    }

    fn parse_define_item(&mut self) -> Item {
        let token = self.advance();
        let text = self.text(token);
        match esqlc_lexer::parse_define(text) {
            Some((name, body)) => {
                self.macros
                    .insert(name.clone(), body.clone().unwrap_or_default());
                Item::Define(MacroDefine {
                    name,
                    body,
                    span: token.span,
                })
            }
            None => Item::Host(HostStmt {
                text: text.to_string(),
                span: token.span,
            }),
        }
    }

    fn is_struct_definition(&self) -> bool {
        self.peek_ahead(1) == TokenKind::Ident && self.peek_ahead(2) == TokenKind::LBrace
    }

    fn parse_struct_item(&mut self) -> Result<Item, ParseError> {
        let start = self.span();
        self.consume(TokenKind::KwStruct)?;
        let name_token = self.consume(TokenKind::Ident)?;
        let name = self.text(name_token).to_string();
        self.consume(TokenKind::LBrace)?;

        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            fields.extend(self.parse_field_decls()?);
        }

        self.consume(TokenKind::RBrace)?;
        let end = self.consume(TokenKind::Semi)?.span;

        Ok(Item::Struct(StructDecl {
            name,
            fields,
            span: start.merge(end),
        }))
    }

    fn parse_field_decls(&mut self) -> Result<Vec<FieldDecl>, ParseError> {
        let start = self.span();
        let (ty, _) = self.parse_type_spec()?;
        let mut fields = Vec::new();

        loop {
            while self.at(TokenKind::Star) {
                self.advance();
            }
            let name_token = self.consume(TokenKind::Ident)?;
            let mut end = name_token.span;
            let mut array_len = None;
            if self.at(TokenKind::LBracket) {
                let (len, close) = self.parse_array_suffix()?;
                array_len = len;
                end = close;
            }
            fields.push(FieldDecl {
                name: self.text(name_token).to_string(),
                ty: ty.clone(),
                array_len,
                span: start.merge(end),
            });
            if self.at(TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }

        self.consume(TokenKind::Semi)?;
        Ok(fields)
    }

    /// Type specifier plus optional stars plus a name: is this the start
    /// of a declaration built on a typedef'd name?
    fn looks_like_declaration(&self, item_level: bool) -> bool {
        if self.peek() != TokenKind::Ident {
            return false;
        }
        let mut n = 1;
        while self.peek_ahead(n) == TokenKind::Star {
            n += 1;
        }
        if self.peek_ahead(n) != TokenKind::Ident {
            return false;
        }
        match self.peek_ahead(n + 1) {
            TokenKind::Semi | TokenKind::Assign | TokenKind::Comma | TokenKind::LBracket => true,
            // a function returning a typedef'd type, item level only
            TokenKind::LParen => item_level,
            _ => false,
        }
    }

    fn parse_typed_into(&mut self, out: &mut Vec<Item>) -> Result<(), ParseError> {
        let start = self.span();
        let (ty, ty_text) = self.parse_type_spec()?;
        let mut pointer = false;
        while self.at(TokenKind::Star) {
            self.advance();
            pointer = true;
        }
        let name_token = self.consume(TokenKind::Ident)?;
        let name = self.text(name_token).to_string();

        if self.at(TokenKind::LParen) {
            let return_type = if pointer {
                format!("{} *", ty_text)
            } else {
                ty_text
            };
            out.push(self.parse_function_rest(start, return_type, name)?);
        } else {
            let decls = self.parse_declarator_rest(start, ty, name_token)?;
            out.extend(decls.into_iter().map(Item::Variable));
        }
        Ok(())
    }

    fn parse_function_rest(
        &mut self,
        start: Span,
        return_type: String,
        name: String,
    ) -> Result<Item, ParseError> {
        self.consume(TokenKind::LParen)?;
        let params = self.parse_params()?;
        self.consume(TokenKind::RParen)?;

        // a prototype has no body to translate; carry it through verbatim
        if self.at(TokenKind::Semi) {
            let end = self.advance().span;
            let span = start.merge(end);
            return Ok(Item::Host(HostStmt {
                text: self.slice(span).to_string(),
                span,
            }));
        }

        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Ok(Item::Function(FunctionDecl {
            name,
            return_type,
            params,
            body,
            span,
        }))
    }

    fn parse_params(&mut self) -> Result<Vec<Parameter>, ParseError> {
        let mut params = Vec::new();
        if self.at(TokenKind::RParen) {
            return Ok(params);
        }
        if self.at(TokenKind::KwVoid) && self.peek_ahead(1) == TokenKind::RParen {
            self.advance();
            return Ok(params);
        }

        loop {
            let start = self.span();
            let (ty, _) = self.parse_type_spec()?;
            while self.at(TokenKind::Star) {
                self.advance();
            }
            let (name, mut end) = if self.at(TokenKind::Ident) {
                let token = self.advance();
                (self.text(token).to_string(), token.span)
            } else {
                // unnamed parameter in a prototype
                (String::new(), start)
            };
            if self.at(TokenKind::LBracket) {
                let (_, close) = self.parse_array_suffix()?;
                end = close;
            }
            params.push(Parameter {
                name,
                ty,
                span: start.merge(end),
            });
            if self.at(TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        Ok(params)
    }

    fn parse_type_spec(&mut self) -> Result<(HostType, String), ParseError> {
        let start = self.span();
        let mut end = start;
        let mut saw: Vec<TokenKind> = Vec::new();
        let mut struct_name = None;
        let mut named = None;

        loop {
            let kind = self.peek();
            if kind.starts_type() {
                let token = self.advance();
                end = token.span;
                saw.push(kind);
                if kind == TokenKind::KwStruct && self.at(TokenKind::Ident) {
                    let token = self.advance();
                    end = token.span;
                    struct_name = Some(self.text(token).to_string());
                }
                continue;
            }
            if kind == TokenKind::Ident && saw.is_empty() && named.is_none() {
                let token = self.advance();
                end = token.span;
                named = Some(self.text(token).to_string());
            }
            break;
        }

        if saw.is_empty() && named.is_none() {
            return Err(ParseError::unexpected("type", self.peek(), self.span()));
        }

        let ty = if let Some(name) = struct_name {
            HostType::Struct(name)
        } else if saw.contains(&TokenKind::KwChar) {
            HostType::Char
        } else if saw.contains(&TokenKind::KwDouble) {
            HostType::Double
        } else if saw.contains(&TokenKind::KwFloat) {
            HostType::Float
        } else if saw.contains(&TokenKind::KwShort) {
            HostType::Short
        } else if saw.contains(&TokenKind::KwLong) {
            HostType::Long
        } else if saw.contains(&TokenKind::KwInt)
            || saw.contains(&TokenKind::KwUnsigned)
            || saw.contains(&TokenKind::KwSigned)
        {
            HostType::Int
        } else if let Some(name) = named {
            HostType::Named(name)
        } else {
            HostType::Unknown
        };

        Ok((ty, self.slice(start.merge(end)).to_string()))
    }

    fn parse_array_suffix(&mut self) -> Result<(Option<u32>, Span), ParseError> {
        self.consume(TokenKind::LBracket)?;
        let mut len = None;
        if self.at(TokenKind::IntLit) {
            let token = self.advance();
            len = self.text(token).parse().ok();
        } else if self.at(TokenKind::Ident) {
            // `char name[NAME_LEN]` through the macro table
            let token = self.advance();
            len = self
                .macros
                .get(self.text(token))
                .and_then(|body| body.trim().parse().ok());
        }
        let end = self.consume(TokenKind::RBracket)?.span;
        Ok((len, end))
    }

    fn parse_declarator_rest(
        &mut self,
        start: Span,
        ty: HostType,
        first_name: Token,
    ) -> Result<Vec<VariableDecl>, ParseError> {
        let mut decls = Vec::new();
        let mut name_token = first_name;

        loop {
            let name = self.text(name_token).to_string();
            let mut end = name_token.span;
            let mut array_len = None;
            if self.at(TokenKind::LBracket) {
                let (len, close) = self.parse_array_suffix()?;
                array_len = len;
                end = close;
            }
            let mut init = None;
            if self.at(TokenKind::Assign) {
                self.advance();
                let (text, close) = self.initializer_text()?;
                init = Some(text);
                end = close;
            }
            decls.push(VariableDecl {
                name,
                ty: ty.clone(),
                array_len,
                init,
                span: start.merge(end),
            });
            if self.at(TokenKind::Comma) {
                self.advance();
                while self.at(TokenKind::Star) {
                    self.advance();
                }
                name_token = self.consume(TokenKind::Ident)?;
                continue;
            }
            break;
        }

        self.consume(TokenKind::Semi)?;
        Ok(decls)
    }

    fn initializer_text(&mut self) -> Result<(String, Span), ParseError> {
        let start = self.span();
        let mut end = start;
        let mut depth = 0usize;
        let mut consumed = false;

        while !self.at(TokenKind::Eof) {
            if depth == 0
                && (self.at(TokenKind::Semi) || self.at(TokenKind::Comma))
            {
                break;
            }
            let token = self.advance();
            consumed = true;
            end = token.span;
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
        }

        if !consumed {
            return Err(ParseError::unexpected(
                "initializer",
                self.peek(),
                self.span(),
            ));
        }
        Ok((self.slice(start.merge(end)).to_string(), end))
    }

    /// Opaque top-level construct: ends at `;` or at the close of a braced
    /// group (with an optional trailing `;`)
    fn parse_host_item(&mut self) -> Item {
        let start = self.span();
        let mut end = start;
        let mut depth = 0usize;
        let mut consumed = false;

        while !self.at(TokenKind::Eof) {
            if depth == 0 && self.at(TokenKind::ExecSql) && consumed {
                break;
            }
            let token = self.advance();
            consumed = true;
            end = token.span;
            match token.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        if self.at(TokenKind::Semi) {
                            end = self.advance().span;
                        }
                        break;
                    }
                }
                TokenKind::Semi if depth == 0 => break,
                _ => {}
            }
        }

        let span = start.merge(end);
        Item::Host(HostStmt {
            text: self.slice(span).to_string(),
            span,
        })
    }

    // === Recovery ===

    fn recover_item(&mut self, from: usize) -> UnparsedNode {
        self.pos = from;
        let start = self.span();
        let mut end = start;
        let mut depth = 0usize;

        while !self.at(TokenKind::Eof) {
            let token = self.advance();
            end = token.span;
            match token.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    if depth <= 1 {
                        break;
                    }
                    depth -= 1;
                }
                TokenKind::Semi if depth == 0 => break,
                _ => {}
            }
        }

        let span = start.merge(end);
        UnparsedNode {
            text: self.slice(span).to_string(),
            span,
        }
    }

    fn recover_stmt(&mut self, from: usize) -> UnparsedNode {
        self.pos = from;
        let start = self.span();
        let mut end = start;
        let mut depth = 0usize;

        while !self.at(TokenKind::Eof) {
            if depth == 0 && self.at(TokenKind::RBrace) {
                break;
            }
            let token = self.advance();
            end = token.span;
            match token.kind {
                TokenKind::LBrace | TokenKind::LParen => depth += 1,
                TokenKind::RBrace | TokenKind::RParen => depth = depth.saturating_sub(1),
                TokenKind::Semi if depth == 0 => break,
                _ => {}
            }
        }

        let span = start.merge(end);
        UnparsedNode {
            text: self.slice(span).to_string(),
            span,
        }
    }

    // === Statements ===

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let start = self.span();
        self.consume(TokenKind::LBrace)?;
        let mut stmts = Vec::new();

        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let before = self.pos;
            match self.parse_stmt_into(&mut stmts) {
                Ok(()) => {}
                Err(err) => {
                    self.report(&err);
                    stmts.push(Stmt::Unparsed(self.recover_stmt(before)));
                }
            }
        }

        let end = self.consume(TokenKind::RBrace)?.span;
        Ok(Block {
            stmts,
            span: start.merge(end),
        })
    }

    fn parse_stmt_into(&mut self, out: &mut Vec<Stmt>) -> Result<(), ParseError> {
        match self.peek() {
            k if k.starts_type() => {
                let decls = self.parse_variable_decls()?;
                out.extend(decls.into_iter().map(Stmt::Declaration));
            }
            TokenKind::Ident if self.looks_like_declaration(false) => {
                let decls = self.parse_variable_decls()?;
                out.extend(decls.into_iter().map(Stmt::Declaration));
            }
            _ => {
                let stmt = self.parse_stmt()?;
                self.push_stmt(out, stmt);
            }
        }
        Ok(())
    }

    /// A single statement; branch bodies come through here so an unbraced
    /// `if (...) EXEC SQL ...;` still structures its embedded statement
    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek() {
            TokenKind::ExecSql => Ok(Stmt::Embedded(self.parse_embedded()?)),
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::KwIf => self.parse_if_stmt(),
            TokenKind::KwWhile => self.parse_while_stmt(),
            TokenKind::KwFor => self.parse_for_stmt(),
            TokenKind::KwDo => self.parse_do_while_stmt(),
            _ => Ok(self.parse_host_stmt()),
        }
    }

    fn parse_variable_decls(&mut self) -> Result<Vec<VariableDecl>, ParseError> {
        let start = self.span();
        let (ty, _) = self.parse_type_spec()?;
        while self.at(TokenKind::Star) {
            self.advance();
        }
        let name_token = self.consume(TokenKind::Ident)?;
        self.parse_declarator_rest(start, ty, name_token)
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        self.consume(TokenKind::KwIf)?;
        let cond = self.parenthesized_text()?;
        let then_branch = Box::new(self.parse_stmt()?);
        let mut end = then_branch.span();

        let else_branch = if self.at(TokenKind::KwElse) {
            self.advance();
            let branch = self.parse_stmt()?;
            end = branch.span();
            Some(Box::new(branch))
        } else {
            None
        };

        Ok(Stmt::If(IfStmt {
            cond,
            then_branch,
            else_branch,
            span: start.merge(end),
        }))
    }

    fn parse_while_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        self.consume(TokenKind::KwWhile)?;
        let header = self.parenthesized_text()?;
        let body = Box::new(self.parse_stmt()?);
        let span = start.merge(body.span());
        Ok(Stmt::Loop(LoopStmt {
            kind: LoopKind::While,
            header,
            body,
            span,
        }))
    }

    fn parse_for_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        self.consume(TokenKind::KwFor)?;
        let header = self.parenthesized_text()?;
        let body = Box::new(self.parse_stmt()?);
        let span = start.merge(body.span());
        Ok(Stmt::Loop(LoopStmt {
            kind: LoopKind::For,
            header,
            body,
            span,
        }))
    }

    fn parse_do_while_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        self.consume(TokenKind::KwDo)?;
        let body = Box::new(self.parse_stmt()?);
        self.consume(TokenKind::KwWhile)?;
        let header = self.parenthesized_text()?;
        let end = self.consume(TokenKind::Semi)?.span;
        Ok(Stmt::Loop(LoopStmt {
            kind: LoopKind::DoWhile,
            header,
            body,
            span: start.merge(end),
        }))
    }

    /// Text between a balanced pair of parentheses, delimiters excluded
    fn parenthesized_text(&mut self) -> Result<String, ParseError> {
        self.consume(TokenKind::LParen)?;
        let text_start = self.span().start;
        let mut text_end = text_start;
        let mut depth = 0usize;

        loop {
            match self.peek() {
                TokenKind::Eof => {
                    return Err(ParseError::UnexpectedEof { span: self.span() })
                }
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            text_end = self.advance().span.end;
        }

        self.consume(TokenKind::RParen)?;
        Ok(self.source[text_start..text_end].to_string())
    }

    fn parse_host_stmt(&mut self) -> Stmt {
        let start = self.span();
        let mut end = start;
        let mut depth = 0usize;
        let mut consumed = false;

        while !self.at(TokenKind::Eof) {
            if depth == 0 && (self.at(TokenKind::RBrace) || self.at(TokenKind::ExecSql)) {
                break;
            }
            let token = self.advance();
            consumed = true;
            end = token.span;
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1)
                }
                TokenKind::Semi if depth == 0 => break,
                _ => {}
            }
        }

        if !consumed {
            let span = Span::new(start.start, start.start);
            return Stmt::Host(HostStmt {
                text: String::new(),
                span,
            });
        }

        let span = start.merge(end);
        Stmt::Host(HostStmt {
            text: self.slice(span).to_string(),
            span,
        })
    }

    // === Sentinel folding ===

    /// Push a statement, folding a "no more rows" conditional into the
    /// fetch it follows
    fn push_stmt(&mut self, out: &mut Vec<Stmt>, stmt: Stmt) {
        if let Stmt::If(branch) = &stmt {
            if branch.else_branch.is_none() {
                if let (Some(code), Some(action)) = (
                    self.sentinel_code(&branch.cond),
                    sentinel_action(&branch.then_branch),
                ) {
                    if let Some(Stmt::Embedded(fetch)) = out.last_mut() {
                        if let EmbeddedKind::Fetch { not_found, .. } = &mut fetch.kind {
                            if not_found.is_none() {
                                *not_found = Some(SentinelBranch {
                                    code,
                                    action,
                                    span: branch.span,
                                });
                                fetch.span = fetch.span.merge(branch.span);
                                return;
                            }
                        }
                    }
                }
            }
        }
        out.push(stmt);
    }

    /// Recognize `sqlca.sqlcode == 1403` and its spellings, through the
    /// macro table when the code is symbolic
    fn sentinel_code(&self, cond: &str) -> Option<i32> {
        let (lhs, rhs) = cond.split_once("==")?;
        let lhs = lhs.trim();
        let rhs = rhs.trim();
        if is_sqlcode_ref(lhs) {
            self.resolve_code(rhs)
        } else if is_sqlcode_ref(rhs) {
            self.resolve_code(lhs)
        } else {
            None
        }
    }

    fn resolve_code(&self, text: &str) -> Option<i32> {
        let value = match text.parse::<i32>() {
            Ok(value) => value,
            Err(_) => self.macros.get(text)?.trim().parse().ok()?,
        };
        matches!(value, 1403 | 100).then_some(value)
    }

    // === Embedded statements ===

    fn parse_embedded(&mut self) -> Result<EmbeddedStmt, ParseError> {
        let intro = self.consume(TokenKind::ExecSql)?;

        // the lexer guarantees the statement is exactly the following run
        // of SQL-mode tokens, terminator included
        let mut clause: Vec<Token> = Vec::new();
        while !self.at(TokenKind::Eof) && self.current().mode == LexMode::Sql {
            clause.push(self.advance());
        }

        let end = clause.last().map(|t| t.span).unwrap_or(intro.span);
        let span = intro.span.merge(end);
        if clause.last().map(|t| t.kind) == Some(TokenKind::Semi) {
            clause.pop();
        }

        let sql = render_sql(&clause, self.source);
        let kind = self.classify_embedded(&clause, span)?;
        Ok(EmbeddedStmt { kind, sql, span })
    }

    fn classify_embedded(
        &self,
        clause: &[Token],
        span: Span,
    ) -> Result<EmbeddedKind, ParseError> {
        let mut c = Clause::new(clause, self.source, span);
        match c.peek() {
            TokenKind::KwDeclare => self.classify_declare(&mut c),
            TokenKind::KwOpen => self.classify_open(&mut c),
            TokenKind::KwFetch => self.classify_fetch(&mut c),
            TokenKind::KwClose => self.classify_close(&mut c),
            TokenKind::KwSelect => self.classify_select(clause),
            TokenKind::KwInsert => Ok(EmbeddedKind::Insert {
                query: build_query(clause, self.source),
            }),
            TokenKind::KwUpdate => Ok(EmbeddedKind::Update {
                query: build_query(clause, self.source),
            }),
            TokenKind::KwDelete => Ok(EmbeddedKind::Delete {
                query: build_query(clause, self.source),
            }),
            TokenKind::KwCommit => {
                c.advance();
                c.eat(TokenKind::KwWork);
                let release = c.eat(TokenKind::KwRelease);
                Ok(EmbeddedKind::Commit { release })
            }
            TokenKind::KwRollback => {
                c.advance();
                c.eat(TokenKind::KwWork);
                let release = c.eat(TokenKind::KwRelease);
                Ok(EmbeddedKind::Rollback { release })
            }
            TokenKind::KwBegin => {
                c.advance();
                if c.eat(TokenKind::KwDeclare) && c.eat(TokenKind::KwSection) {
                    Ok(EmbeddedKind::BeginDeclareSection)
                } else {
                    Ok(EmbeddedKind::Other)
                }
            }
            TokenKind::KwEnd => {
                c.advance();
                if c.eat(TokenKind::KwDeclare) && c.eat(TokenKind::KwSection) {
                    Ok(EmbeddedKind::EndDeclareSection)
                } else {
                    Ok(EmbeddedKind::Other)
                }
            }
            TokenKind::KwInclude => {
                c.advance();
                if c.peek() == TokenKind::Ident
                    && c.peek_text().eq_ignore_ascii_case("sqlca")
                {
                    Ok(EmbeddedKind::IncludeSqlca)
                } else {
                    Ok(EmbeddedKind::Other)
                }
            }
            TokenKind::KwWhenever => self.classify_whenever(&mut c),
            _ => Ok(EmbeddedKind::Other),
        }
    }

    fn classify_declare(&self, c: &mut Clause<'_>) -> Result<EmbeddedKind, ParseError> {
        c.advance();
        let cursor_name = c.expect_ident("cursor name after DECLARE")?;
        c.expect(TokenKind::KwCursor, "CURSOR after the cursor name")?;
        c.expect(TokenKind::KwFor, "FOR before the cursor query")?;
        let query_tokens = c.take_rest();
        if query_tokens.is_empty() {
            return Err(ParseError::malformed("cursor declaration has no query", c.end_span));
        }
        Ok(EmbeddedKind::Declare {
            cursor_name,
            query: build_query(query_tokens, self.source),
        })
    }

    fn classify_open(&self, c: &mut Clause<'_>) -> Result<EmbeddedKind, ParseError> {
        c.advance();
        let cursor_name = c.expect_ident("cursor name after OPEN")?;
        let using = if c.eat(TokenKind::KwUsing) {
            collect_host_vars(c.take_rest(), self.source)
        } else {
            Vec::new()
        };
        Ok(EmbeddedKind::Open { cursor_name, using })
    }

    fn classify_fetch(&self, c: &mut Clause<'_>) -> Result<EmbeddedKind, ParseError> {
        c.advance();
        c.eat(TokenKind::KwFrom);
        let cursor_name = c.expect_ident("cursor name after FETCH")?;
        c.expect(TokenKind::KwInto, "INTO after the cursor name")?;
        let into = collect_host_vars(c.take_rest(), self.source);
        if into.is_empty() {
            return Err(ParseError::malformed(
                "FETCH INTO list has no host variables",
                c.end_span,
            ));
        }
        Ok(EmbeddedKind::Fetch {
            cursor_name,
            into,
            not_found: None,
        })
    }

    fn classify_close(&self, c: &mut Clause<'_>) -> Result<EmbeddedKind, ParseError> {
        c.advance();
        let cursor_name = c.expect_ident("cursor name after CLOSE")?;
        Ok(EmbeddedKind::Close { cursor_name })
    }

    /// Singleton select: the INTO clause is spliced out of the query text
    /// and becomes the fetch destinations
    fn classify_select(&self, clause: &[Token]) -> Result<EmbeddedKind, ParseError> {
        let mut depth = 0usize;
        let mut into_start = None;
        let mut into_end = None;
        for (i, token) in clause.iter().enumerate() {
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth = depth.saturating_sub(1),
                TokenKind::KwInto if depth == 0 && into_start.is_none() => {
                    into_start = Some(i)
                }
                TokenKind::KwFrom if depth == 0 && into_start.is_some() && into_end.is_none() => {
                    into_end = Some(i)
                }
                _ => {}
            }
        }

        let Some(s) = into_start else {
            // a select with no INTO fetches nothing we can bind
            return Ok(EmbeddedKind::Other);
        };
        let e = into_end.unwrap_or(clause.len());
        let into = collect_host_vars(&clause[s + 1..e], self.source);
        if into.is_empty() {
            return Err(ParseError::malformed(
                "SELECT INTO list has no host variables",
                clause[s].span,
            ));
        }

        let mut query_tokens: Vec<Token> = clause[..s].to_vec();
        query_tokens.extend_from_slice(&clause[e..]);
        Ok(EmbeddedKind::Select {
            query: build_query(&query_tokens, self.source),
            into,
        })
    }

    fn classify_whenever(&self, c: &mut Clause<'_>) -> Result<EmbeddedKind, ParseError> {
        c.advance();
        let condition = match c.peek() {
            TokenKind::KwSqlError => {
                c.advance();
                WheneverCondition::SqlError
            }
            TokenKind::KwSqlWarning => {
                c.advance();
                WheneverCondition::SqlWarning
            }
            TokenKind::KwNot => {
                c.advance();
                c.expect(TokenKind::KwFound, "FOUND after NOT")?;
                WheneverCondition::NotFound
            }
            _ => {
                return Err(ParseError::malformed(
                    "expected SQLERROR, SQLWARNING, or NOT FOUND",
                    c.span(),
                ))
            }
        };
        let action = match c.peek() {
            TokenKind::KwContinue => {
                c.advance();
                WheneverAction::Continue
            }
            TokenKind::KwStop => {
                c.advance();
                WheneverAction::Stop
            }
            TokenKind::KwGoto => {
                c.advance();
                c.eat(TokenKind::Colon);
                let label = c.expect_ident("label after GOTO")?;
                WheneverAction::Goto(label)
            }
            _ => {
                return Err(ParseError::malformed(
                    "expected CONTINUE, GOTO, or STOP",
                    c.span(),
                ))
            }
        };
        Ok(EmbeddedKind::Whenever { condition, action })
    }
}

// === Clause reader ===

/// Cursor over one embedded statement's clause tokens
struct Clause<'a> {
    tokens: &'a [Token],
    source: &'a str,
    pos: usize,
    /// Where diagnostics land when the clause runs out
    end_span: Span,
}

impl<'a> Clause<'a> {
    fn new(tokens: &'a [Token], source: &'a str, end_span: Span) -> Self {
        Self {
            tokens,
            source,
            pos: 0,
            end_span,
        }
    }

    fn peek(&self) -> TokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn peek_text(&self) -> &'a str {
        self.tokens
            .get(self.pos)
            .map(|t| t.text(self.source))
            .unwrap_or("")
    }

    fn span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|t| t.span)
            .unwrap_or(self.end_span)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek() == kind {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        match self.tokens.get(self.pos) {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(*token)
            }
            _ => Err(ParseError::malformed(format!("expected {}", what), self.span())),
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, ParseError> {
        let token = self.expect(TokenKind::Ident, what)?;
        Ok(token.text(self.source).to_string())
    }

    fn take_rest(&mut self) -> &'a [Token] {
        let rest = &self.tokens[self.pos..];
        self.pos = self.tokens.len();
        rest
    }
}

// === SQL text helpers ===

/// Join clause tokens back into one normalized line of SQL
fn render_sql(tokens: &[Token], source: &str) -> String {
    let mut out = String::new();
    let mut prev: Option<TokenKind> = None;
    for token in tokens {
        if let Some(prev) = prev {
            if needs_space(prev, token.kind) {
                out.push(' ');
            }
        }
        out.push_str(token.text(source));
        prev = Some(token.kind);
    }
    out
}

fn needs_space(prev: TokenKind, next: TokenKind) -> bool {
    !matches!(
        next,
        TokenKind::Comma | TokenKind::RParen | TokenKind::Dot | TokenKind::Semi
    ) && !matches!(prev, TokenKind::LParen | TokenKind::Dot)
}

fn host_var_from(token: Token, source: &str) -> HostVarRef {
    let text = &token.text(source)[1..];
    match text.split_once('.') {
        Some((name, member)) => HostVarRef {
            name: name.to_string(),
            member: Some(member.to_string()),
            indicator: None,
            span: token.span,
        },
        None => HostVarRef::new(text, token.span),
    }
}

/// One host-variable entry starting at `i`, with its indicator companion
/// (`:v:ind`, `:v :ind`, or `:v INDICATOR :ind`); returns the entry and
/// how many tokens it occupied
fn take_host_var(tokens: &[Token], i: usize, source: &str) -> (HostVarRef, usize) {
    let mut var = host_var_from(tokens[i], source);
    if let Some(next) = tokens.get(i + 1) {
        if next.kind == TokenKind::HostVar {
            var.indicator = Some(next.text(source)[1..].to_string());
            return (var, 2);
        }
        if next.kind == TokenKind::KwIndicator {
            if let Some(ind) = tokens.get(i + 2) {
                if ind.kind == TokenKind::HostVar {
                    var.indicator = Some(ind.text(source)[1..].to_string());
                    return (var, 3);
                }
            }
        }
    }
    (var, 1)
}

fn collect_host_vars(tokens: &[Token], source: &str) -> Vec<HostVarRef> {
    let mut vars = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].kind == TokenKind::HostVar {
            let (var, consumed) = take_host_var(tokens, i, source);
            vars.push(var);
            i += consumed;
        } else {
            i += 1;
        }
    }
    vars
}

/// Build the query record for a clause: normalized text with indicator
/// companions removed, bind parameters in order, and the projected column
/// count when it is statically known
fn build_query(tokens: &[Token], source: &str) -> QueryText {
    let mut params = Vec::new();
    let mut kept: Vec<Token> = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].kind == TokenKind::HostVar {
            let (var, consumed) = take_host_var(tokens, i, source);
            params.push(var);
            kept.push(tokens[i]);
            i += consumed;
        } else {
            kept.push(tokens[i]);
            i += 1;
        }
    }

    let columns = if kept.first().map(|t| t.kind) == Some(TokenKind::KwSelect) {
        count_select_columns(&kept)
    } else {
        None
    };

    QueryText {
        text: render_sql(&kept, source),
        params,
        columns,
    }
}

/// Top-level commas in the select list, `None` when the projection uses `*`
fn count_select_columns(tokens: &[Token]) -> Option<usize> {
    let mut i = 1;
    while matches!(
        tokens.get(i).map(|t| t.kind),
        Some(TokenKind::KwDistinct) | Some(TokenKind::KwAll)
    ) {
        i += 1;
    }

    let mut depth = 0usize;
    let mut commas = 0usize;
    let mut star = false;
    let mut any = false;
    while i < tokens.len() {
        match tokens[i].kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            TokenKind::KwFrom if depth == 0 => break,
            TokenKind::Comma if depth == 0 => commas += 1,
            TokenKind::Star if depth == 0 => star = true,
            _ => {}
        }
        any = true;
        i += 1;
    }

    if !any || star {
        None
    } else {
        Some(commas + 1)
    }
}

// === Sentinel helpers ===

fn is_sqlcode_ref(text: &str) -> bool {
    text.eq_ignore_ascii_case("sqlca.sqlcode") || text.eq_ignore_ascii_case("sqlcode")
}

/// The single terminating statement inside a sentinel branch, if the
/// branch has that shape
fn sentinel_action(stmt: &Stmt) -> Option<SentinelAction> {
    match stmt {
        Stmt::Host(host) => parse_sentinel_action(&host.text),
        Stmt::Block(block) if block.stmts.len() == 1 => sentinel_action(&block.stmts[0]),
        _ => None,
    }
}

fn parse_sentinel_action(text: &str) -> Option<SentinelAction> {
    let text = text.trim().trim_end_matches(';').trim();
    let mut words = text.split_whitespace();
    match words.next()? {
        "break" => words.next().is_none().then_some(SentinelAction::Break),
        "continue" => words.next().is_none().then_some(SentinelAction::Continue),
        "goto" => {
            let label = words.next()?;
            words
                .next()
                .is_none()
                .then(|| SentinelAction::Goto(label.to_string()))
        }
        "return" => {
            let rest: Vec<&str> = words.collect();
            if rest.is_empty() {
                Some(SentinelAction::Return(None))
            } else {
                Some(SentinelAction::Return(Some(rest.join(" "))))
            }
        }
        _ => None,
    }
}
