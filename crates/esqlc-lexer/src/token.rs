//! Token definitions for both lexer modes
//!
//! Two logos grammars share one public `TokenKind`: the host grammar for
//! C-like code, and the SQL grammar active between `EXEC SQL` and the
//! statement terminator. The driver in `lib.rs` switches between them and
//! tags every token with the mode it was emitted in.

use logos::Logos;

/// Which grammar produced a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexMode {
    Host,
    Sql,
}

/// Host-language grammar
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum HostToken {
    // Comments are tokens rather than skips: their spans feed
    // comment-preserving output
    #[regex(r"//[^\n]*")]
    LineComment,
    #[token("/*", lex_host_block_comment)]
    BlockComment,

    // Preprocessor line, classified by the driver (#include, #define, ...)
    #[token("#", lex_directive)]
    Directive,

    // Embedded-statement introducer pair
    #[token("EXEC", ignore(ascii_case))]
    Exec,
    #[token("SQL", ignore(ascii_case))]
    Sql,

    // === Keywords ===
    #[token("struct")]
    Struct,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("do")]
    Do,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("return")]
    Return,
    #[token("goto")]
    Goto,
    #[token("int")]
    Int,
    #[token("char")]
    Char,
    #[token("float")]
    Float,
    #[token("double")]
    Double,
    #[token("long")]
    Long,
    #[token("short")]
    Short,
    #[token("unsigned")]
    Unsigned,
    #[token("signed")]
    Signed,
    #[token("void")]
    Void,
    #[token("static")]
    Static,
    #[token("extern")]
    Extern,
    #[token("const")]
    Const,

    // === Operators ===
    #[token("=")]
    Assign,
    #[token("==")]
    EqEq,
    #[token("!=")]
    Ne,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("+")]
    Plus,
    #[token("++")]
    PlusPlus,
    #[token("+=")]
    PlusEq,
    #[token("-")]
    Minus,
    #[token("--")]
    MinusMinus,
    #[token("-=")]
    MinusEq,
    #[token("->")]
    Arrow,
    #[token("*")]
    Star,
    #[token("*=")]
    StarEq,
    #[token("/")]
    Slash,
    #[token("/=")]
    SlashEq,
    #[token("%")]
    Percent,
    #[token("%=")]
    PercentEq,
    #[token("&")]
    Amp,
    #[token("&&")]
    AndAnd,
    #[token("&=")]
    AmpEq,
    #[token("|")]
    Pipe,
    #[token("||")]
    OrOr,
    #[token("|=")]
    PipeEq,
    #[token("^")]
    Caret,
    #[token("^=")]
    CaretEq,
    #[token("<<")]
    Shl,
    #[token("<<=")]
    ShlEq,
    #[token(">>")]
    Shr,
    #[token(">>=")]
    ShrEq,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("?")]
    Question,

    // === Delimiters and punctuation ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(".")]
    Dot,

    // === Literals ===
    #[regex(r"0[xX][0-9a-fA-F]+")]
    HexLit,
    #[regex(r"[0-9]+", priority = 2)]
    IntLit,
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    FloatLit,
    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    StringLit,
    #[regex(r#""([^"\\\n]|\\[^\n])*"#)]
    StringUnterminated,
    #[regex(r"'(\\[^\n]|[^\\'\n])*'")]
    CharLit,
    #[regex(r"'(\\[^\n]|[^\\'\n])*")]
    CharUnterminated,

    // === Identifiers ===
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

/// Embedded-SQL grammar
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum SqlToken {
    #[regex(r"--[^\n]*")]
    LineComment,
    #[token("/*", lex_sql_block_comment)]
    BlockComment,

    // === Keywords (SQL is case-insensitive) ===
    #[token("SELECT", ignore(ascii_case))]
    Select,
    #[token("FROM", ignore(ascii_case))]
    From,
    #[token("WHERE", ignore(ascii_case))]
    Where,
    #[token("INSERT", ignore(ascii_case))]
    Insert,
    #[token("INTO", ignore(ascii_case))]
    Into,
    #[token("VALUES", ignore(ascii_case))]
    Values,
    #[token("UPDATE", ignore(ascii_case))]
    Update,
    #[token("SET", ignore(ascii_case))]
    Set,
    #[token("DELETE", ignore(ascii_case))]
    Delete,
    #[token("DECLARE", ignore(ascii_case))]
    Declare,
    #[token("CURSOR", ignore(ascii_case))]
    Cursor,
    #[token("FOR", ignore(ascii_case))]
    For,
    #[token("OPEN", ignore(ascii_case))]
    Open,
    #[token("FETCH", ignore(ascii_case))]
    Fetch,
    #[token("CLOSE", ignore(ascii_case))]
    Close,
    #[token("COMMIT", ignore(ascii_case))]
    Commit,
    #[token("ROLLBACK", ignore(ascii_case))]
    Rollback,
    #[token("WORK", ignore(ascii_case))]
    Work,
    #[token("RELEASE", ignore(ascii_case))]
    Release,
    #[token("AND", ignore(ascii_case))]
    And,
    #[token("OR", ignore(ascii_case))]
    Or,
    #[token("NOT", ignore(ascii_case))]
    Not,
    #[token("NULL", ignore(ascii_case))]
    Null,
    #[token("IS", ignore(ascii_case))]
    Is,
    #[token("IN", ignore(ascii_case))]
    In,
    #[token("LIKE", ignore(ascii_case))]
    Like,
    #[token("BETWEEN", ignore(ascii_case))]
    Between,
    #[token("ORDER", ignore(ascii_case))]
    Order,
    #[token("BY", ignore(ascii_case))]
    By,
    #[token("GROUP", ignore(ascii_case))]
    Group,
    #[token("HAVING", ignore(ascii_case))]
    Having,
    #[token("DISTINCT", ignore(ascii_case))]
    Distinct,
    #[token("ALL", ignore(ascii_case))]
    All,
    #[token("UNION", ignore(ascii_case))]
    Union,
    #[token("AS", ignore(ascii_case))]
    As,
    #[token("JOIN", ignore(ascii_case))]
    Join,
    #[token("ON", ignore(ascii_case))]
    On,
    #[token("INNER", ignore(ascii_case))]
    Inner,
    #[token("LEFT", ignore(ascii_case))]
    Left,
    #[token("RIGHT", ignore(ascii_case))]
    Right,
    #[token("OUTER", ignore(ascii_case))]
    Outer,
    #[token("BEGIN", ignore(ascii_case))]
    Begin,
    #[token("END", ignore(ascii_case))]
    End,
    #[token("SECTION", ignore(ascii_case))]
    Section,
    #[token("INCLUDE", ignore(ascii_case))]
    Include,
    #[token("WHENEVER", ignore(ascii_case))]
    Whenever,
    #[token("SQLERROR", ignore(ascii_case))]
    SqlError,
    #[token("SQLWARNING", ignore(ascii_case))]
    SqlWarning,
    #[token("FOUND", ignore(ascii_case))]
    Found,
    #[token("CONTINUE", ignore(ascii_case))]
    Continue,
    #[token("GOTO", ignore(ascii_case))]
    Goto,
    #[token("STOP", ignore(ascii_case))]
    Stop,
    #[token("USING", ignore(ascii_case))]
    Using,
    #[token("INDICATOR", ignore(ascii_case))]
    Indicator,

    // === Host-variable reference ===
    #[regex(r":[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)?")]
    HostVar,

    // === Operators and punctuation ===
    #[token("=")]
    Eq,
    #[token("<>")]
    NeAngle,
    #[token("!=")]
    NeBang,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("||")]
    Concat,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,

    // === Literals ===
    #[regex(r"[0-9]+", priority = 2)]
    IntLit,
    #[regex(r"[0-9]+\.[0-9]+")]
    FloatLit,
    #[regex(r"'([^'\n]|'')*'")]
    StringLit,
    #[regex(r"'([^'\n]|'')*")]
    StringUnterminated,
    #[regex(r#""[^"\n]*""#)]
    QuotedIdent,

    // === Identifiers ===
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

fn lex_host_block_comment(lex: &mut logos::Lexer<HostToken>) -> bool {
    let (n, closed) = block_comment_len(lex.remainder());
    lex.bump(n);
    closed
}

fn lex_sql_block_comment(lex: &mut logos::Lexer<SqlToken>) -> bool {
    let (n, closed) = block_comment_len(lex.remainder());
    lex.bump(n);
    closed
}

/// Bytes to consume after `/*` and whether the comment was closed. An
/// unclosed comment consumes the rest of the input, so the resulting
/// error span runs to end of file.
fn block_comment_len(remainder: &str) -> (usize, bool) {
    match remainder.find("*/") {
        Some(at) => (at + 2, true),
        None => (remainder.len(), false),
    }
}

/// Consume a preprocessor line, honoring `\` line continuations
fn lex_directive(lex: &mut logos::Lexer<HostToken>) -> bool {
    loop {
        let rest = lex.remainder();
        let line_end = rest.find('\n').unwrap_or(rest.len());
        let line = &rest[..line_end];
        lex.bump(line_end);
        let continued = line.trim_end().ends_with('\\');
        if continued && !lex.remainder().is_empty() {
            lex.bump(1);
        } else {
            return true;
        }
    }
}

/// The unified token vocabulary seen by the parser
///
/// Literal/punctuation kinds are shared between modes; the token's
/// `LexMode` tells them apart where it matters (an `Ident` in SQL mode is
/// a table or column name, not a host identifier).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Host keywords
    KwStruct,
    KwIf,
    KwElse,
    KwWhile,
    KwFor,
    KwDo,
    KwBreak,
    KwContinue,
    KwReturn,
    KwGoto,
    KwInt,
    KwChar,
    KwFloat,
    KwDouble,
    KwLong,
    KwShort,
    KwUnsigned,
    KwSigned,
    KwVoid,
    KwStatic,
    KwExtern,
    KwConst,

    // Preprocessor
    IncludeDirective,
    DefineDirective,
    Directive,

    // Embedded-statement introducer (`EXEC SQL`, one token)
    ExecSql,

    // SQL keywords
    KwSelect,
    KwFrom,
    KwWhere,
    KwInsert,
    KwInto,
    KwValues,
    KwUpdate,
    KwSet,
    KwDelete,
    KwDeclare,
    KwCursor,
    KwOpen,
    KwFetch,
    KwClose,
    KwCommit,
    KwRollback,
    KwWork,
    KwRelease,
    KwAnd,
    KwOr,
    KwNot,
    KwNull,
    KwIs,
    KwIn,
    KwLike,
    KwBetween,
    KwOrder,
    KwBy,
    KwGroup,
    KwHaving,
    KwDistinct,
    KwAll,
    KwUnion,
    KwAs,
    KwJoin,
    KwOn,
    KwInner,
    KwLeft,
    KwRight,
    KwOuter,
    KwBegin,
    KwEnd,
    KwSection,
    KwInclude,
    KwWhenever,
    KwSqlError,
    KwSqlWarning,
    KwFound,
    KwStop,
    KwUsing,
    KwIndicator,

    // SQL host-variable reference (`:name` / `:name.member`)
    HostVar,

    // Operators
    Assign,
    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    PlusPlus,
    PlusEq,
    Minus,
    MinusMinus,
    MinusEq,
    Arrow,
    Star,
    StarEq,
    Slash,
    SlashEq,
    Percent,
    PercentEq,
    Amp,
    AmpAmp,
    AmpEq,
    Pipe,
    PipePipe,
    PipeEq,
    Caret,
    CaretEq,
    Shl,
    ShlEq,
    Shr,
    ShrEq,
    Bang,
    Tilde,
    Question,

    // Delimiters and punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semi,
    Dot,

    // Literals
    IntLit,
    FloatLit,
    StringLit,
    CharLit,

    // Identifiers
    Ident,

    // Special
    Error,
    Eof,
}

impl TokenKind {
    /// Can this token begin a host variable/function declaration?
    pub fn starts_type(&self) -> bool {
        matches!(
            self,
            TokenKind::KwStruct
                | TokenKind::KwInt
                | TokenKind::KwChar
                | TokenKind::KwFloat
                | TokenKind::KwDouble
                | TokenKind::KwLong
                | TokenKind::KwShort
                | TokenKind::KwUnsigned
                | TokenKind::KwSigned
                | TokenKind::KwVoid
                | TokenKind::KwStatic
                | TokenKind::KwExtern
                | TokenKind::KwConst
        )
    }

    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::KwStruct => "'struct'",
            TokenKind::KwIf => "'if'",
            TokenKind::KwElse => "'else'",
            TokenKind::KwWhile => "'while'",
            TokenKind::KwFor => "'for'",
            TokenKind::KwDo => "'do'",
            TokenKind::KwBreak => "'break'",
            TokenKind::KwContinue => "'continue'",
            TokenKind::KwReturn => "'return'",
            TokenKind::KwGoto => "'goto'",
            TokenKind::KwInt => "'int'",
            TokenKind::KwChar => "'char'",
            TokenKind::KwFloat => "'float'",
            TokenKind::KwDouble => "'double'",
            TokenKind::KwLong => "'long'",
            TokenKind::KwShort => "'short'",
            TokenKind::KwUnsigned => "'unsigned'",
            TokenKind::KwSigned => "'signed'",
            TokenKind::KwVoid => "'void'",
            TokenKind::KwStatic => "'static'",
            TokenKind::KwExtern => "'extern'",
            TokenKind::KwConst => "'const'",
            TokenKind::IncludeDirective => "include directive",
            TokenKind::DefineDirective => "define directive",
            TokenKind::Directive => "preprocessor directive",
            TokenKind::ExecSql => "'EXEC SQL'",
            TokenKind::KwSelect => "'SELECT'",
            TokenKind::KwFrom => "'FROM'",
            TokenKind::KwWhere => "'WHERE'",
            TokenKind::KwInsert => "'INSERT'",
            TokenKind::KwInto => "'INTO'",
            TokenKind::KwValues => "'VALUES'",
            TokenKind::KwUpdate => "'UPDATE'",
            TokenKind::KwSet => "'SET'",
            TokenKind::KwDelete => "'DELETE'",
            TokenKind::KwDeclare => "'DECLARE'",
            TokenKind::KwCursor => "'CURSOR'",
            TokenKind::KwOpen => "'OPEN'",
            TokenKind::KwFetch => "'FETCH'",
            TokenKind::KwClose => "'CLOSE'",
            TokenKind::KwCommit => "'COMMIT'",
            TokenKind::KwRollback => "'ROLLBACK'",
            TokenKind::KwWork => "'WORK'",
            TokenKind::KwRelease => "'RELEASE'",
            TokenKind::KwAnd => "'AND'",
            TokenKind::KwOr => "'OR'",
            TokenKind::KwNot => "'NOT'",
            TokenKind::KwNull => "'NULL'",
            TokenKind::KwIs => "'IS'",
            TokenKind::KwIn => "'IN'",
            TokenKind::KwLike => "'LIKE'",
            TokenKind::KwBetween => "'BETWEEN'",
            TokenKind::KwOrder => "'ORDER'",
            TokenKind::KwBy => "'BY'",
            TokenKind::KwGroup => "'GROUP'",
            TokenKind::KwHaving => "'HAVING'",
            TokenKind::KwDistinct => "'DISTINCT'",
            TokenKind::KwAll => "'ALL'",
            TokenKind::KwUnion => "'UNION'",
            TokenKind::KwAs => "'AS'",
            TokenKind::KwJoin => "'JOIN'",
            TokenKind::KwOn => "'ON'",
            TokenKind::KwInner => "'INNER'",
            TokenKind::KwLeft => "'LEFT'",
            TokenKind::KwRight => "'RIGHT'",
            TokenKind::KwOuter => "'OUTER'",
            TokenKind::KwBegin => "'BEGIN'",
            TokenKind::KwEnd => "'END'",
            TokenKind::KwSection => "'SECTION'",
            TokenKind::KwInclude => "'INCLUDE'",
            TokenKind::KwWhenever => "'WHENEVER'",
            TokenKind::KwSqlError => "'SQLERROR'",
            TokenKind::KwSqlWarning => "'SQLWARNING'",
            TokenKind::KwFound => "'FOUND'",
            TokenKind::KwStop => "'STOP'",
            TokenKind::KwUsing => "'USING'",
            TokenKind::KwIndicator => "'INDICATOR'",
            TokenKind::HostVar => "host variable",
            TokenKind::Assign => "'='",
            TokenKind::EqEq => "'=='",
            TokenKind::Ne => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::Plus => "'+'",
            TokenKind::PlusPlus => "'++'",
            TokenKind::PlusEq => "'+='",
            TokenKind::Minus => "'-'",
            TokenKind::MinusMinus => "'--'",
            TokenKind::MinusEq => "'-='",
            TokenKind::Arrow => "'->'",
            TokenKind::Star => "'*'",
            TokenKind::StarEq => "'*='",
            TokenKind::Slash => "'/'",
            TokenKind::SlashEq => "'/='",
            TokenKind::Percent => "'%'",
            TokenKind::PercentEq => "'%='",
            TokenKind::Amp => "'&'",
            TokenKind::AmpAmp => "'&&'",
            TokenKind::AmpEq => "'&='",
            TokenKind::Pipe => "'|'",
            TokenKind::PipePipe => "'||'",
            TokenKind::PipeEq => "'|='",
            TokenKind::Caret => "'^'",
            TokenKind::CaretEq => "'^='",
            TokenKind::Shl => "'<<'",
            TokenKind::ShlEq => "'<<='",
            TokenKind::Shr => "'>>'",
            TokenKind::ShrEq => "'>>='",
            TokenKind::Bang => "'!'",
            TokenKind::Tilde => "'~'",
            TokenKind::Question => "'?'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Semi => "';'",
            TokenKind::Dot => "'.'",
            TokenKind::IntLit => "integer",
            TokenKind::FloatLit => "float",
            TokenKind::StringLit => "string",
            TokenKind::CharLit => "character",
            TokenKind::Ident => "identifier",
            TokenKind::Error => "error",
            TokenKind::Eof => "end of file",
        }
    }
}

impl HostToken {
    /// Map to the unified vocabulary
    ///
    /// `Exec`/`Sql` fall back to `Ident`: the driver intercepts the pair
    /// before this runs, so a lone occurrence is an ordinary identifier.
    pub(crate) fn unified(self) -> TokenKind {
        match self {
            HostToken::LineComment | HostToken::BlockComment => TokenKind::Error,
            HostToken::Directive => TokenKind::Directive,
            HostToken::Exec | HostToken::Sql => TokenKind::Ident,
            HostToken::Struct => TokenKind::KwStruct,
            HostToken::If => TokenKind::KwIf,
            HostToken::Else => TokenKind::KwElse,
            HostToken::While => TokenKind::KwWhile,
            HostToken::For => TokenKind::KwFor,
            HostToken::Do => TokenKind::KwDo,
            HostToken::Break => TokenKind::KwBreak,
            HostToken::Continue => TokenKind::KwContinue,
            HostToken::Return => TokenKind::KwReturn,
            HostToken::Goto => TokenKind::KwGoto,
            HostToken::Int => TokenKind::KwInt,
            HostToken::Char => TokenKind::KwChar,
            HostToken::Float => TokenKind::KwFloat,
            HostToken::Double => TokenKind::KwDouble,
            HostToken::Long => TokenKind::KwLong,
            HostToken::Short => TokenKind::KwShort,
            HostToken::Unsigned => TokenKind::KwUnsigned,
            HostToken::Signed => TokenKind::KwSigned,
            HostToken::Void => TokenKind::KwVoid,
            HostToken::Static => TokenKind::KwStatic,
            HostToken::Extern => TokenKind::KwExtern,
            HostToken::Const => TokenKind::KwConst,
            HostToken::Assign => TokenKind::Assign,
            HostToken::EqEq => TokenKind::EqEq,
            HostToken::Ne => TokenKind::Ne,
            HostToken::Lt => TokenKind::Lt,
            HostToken::Le => TokenKind::Le,
            HostToken::Gt => TokenKind::Gt,
            HostToken::Ge => TokenKind::Ge,
            HostToken::Plus => TokenKind::Plus,
            HostToken::PlusPlus => TokenKind::PlusPlus,
            HostToken::PlusEq => TokenKind::PlusEq,
            HostToken::Minus => TokenKind::Minus,
            HostToken::MinusMinus => TokenKind::MinusMinus,
            HostToken::MinusEq => TokenKind::MinusEq,
            HostToken::Arrow => TokenKind::Arrow,
            HostToken::Star => TokenKind::Star,
            HostToken::StarEq => TokenKind::StarEq,
            HostToken::Slash => TokenKind::Slash,
            HostToken::SlashEq => TokenKind::SlashEq,
            HostToken::Percent => TokenKind::Percent,
            HostToken::PercentEq => TokenKind::PercentEq,
            HostToken::Amp => TokenKind::Amp,
            HostToken::AndAnd => TokenKind::AmpAmp,
            HostToken::AmpEq => TokenKind::AmpEq,
            HostToken::Pipe => TokenKind::Pipe,
            HostToken::OrOr => TokenKind::PipePipe,
            HostToken::PipeEq => TokenKind::PipeEq,
            HostToken::Caret => TokenKind::Caret,
            HostToken::CaretEq => TokenKind::CaretEq,
            HostToken::Shl => TokenKind::Shl,
            HostToken::ShlEq => TokenKind::ShlEq,
            HostToken::Shr => TokenKind::Shr,
            HostToken::ShrEq => TokenKind::ShrEq,
            HostToken::Bang => TokenKind::Bang,
            HostToken::Tilde => TokenKind::Tilde,
            HostToken::Question => TokenKind::Question,
            HostToken::LParen => TokenKind::LParen,
            HostToken::RParen => TokenKind::RParen,
            HostToken::LBrace => TokenKind::LBrace,
            HostToken::RBrace => TokenKind::RBrace,
            HostToken::LBracket => TokenKind::LBracket,
            HostToken::RBracket => TokenKind::RBracket,
            HostToken::Comma => TokenKind::Comma,
            HostToken::Colon => TokenKind::Colon,
            HostToken::Semi => TokenKind::Semi,
            HostToken::Dot => TokenKind::Dot,
            HostToken::HexLit | HostToken::IntLit => TokenKind::IntLit,
            HostToken::FloatLit => TokenKind::FloatLit,
            HostToken::StringLit | HostToken::StringUnterminated => TokenKind::StringLit,
            HostToken::CharLit | HostToken::CharUnterminated => TokenKind::CharLit,
            HostToken::Ident => TokenKind::Ident,
        }
    }
}

impl SqlToken {
    pub(crate) fn unified(self) -> TokenKind {
        match self {
            SqlToken::LineComment | SqlToken::BlockComment => TokenKind::Error,
            SqlToken::Select => TokenKind::KwSelect,
            SqlToken::From => TokenKind::KwFrom,
            SqlToken::Where => TokenKind::KwWhere,
            SqlToken::Insert => TokenKind::KwInsert,
            SqlToken::Into => TokenKind::KwInto,
            SqlToken::Values => TokenKind::KwValues,
            SqlToken::Update => TokenKind::KwUpdate,
            SqlToken::Set => TokenKind::KwSet,
            SqlToken::Delete => TokenKind::KwDelete,
            SqlToken::Declare => TokenKind::KwDeclare,
            SqlToken::Cursor => TokenKind::KwCursor,
            SqlToken::For => TokenKind::KwFor,
            SqlToken::Open => TokenKind::KwOpen,
            SqlToken::Fetch => TokenKind::KwFetch,
            SqlToken::Close => TokenKind::KwClose,
            SqlToken::Commit => TokenKind::KwCommit,
            SqlToken::Rollback => TokenKind::KwRollback,
            SqlToken::Work => TokenKind::KwWork,
            SqlToken::Release => TokenKind::KwRelease,
            SqlToken::And => TokenKind::KwAnd,
            SqlToken::Or => TokenKind::KwOr,
            SqlToken::Not => TokenKind::KwNot,
            SqlToken::Null => TokenKind::KwNull,
            SqlToken::Is => TokenKind::KwIs,
            SqlToken::In => TokenKind::KwIn,
            SqlToken::Like => TokenKind::KwLike,
            SqlToken::Between => TokenKind::KwBetween,
            SqlToken::Order => TokenKind::KwOrder,
            SqlToken::By => TokenKind::KwBy,
            SqlToken::Group => TokenKind::KwGroup,
            SqlToken::Having => TokenKind::KwHaving,
            SqlToken::Distinct => TokenKind::KwDistinct,
            SqlToken::All => TokenKind::KwAll,
            SqlToken::Union => TokenKind::KwUnion,
            SqlToken::As => TokenKind::KwAs,
            SqlToken::Join => TokenKind::KwJoin,
            SqlToken::On => TokenKind::KwOn,
            SqlToken::Inner => TokenKind::KwInner,
            SqlToken::Left => TokenKind::KwLeft,
            SqlToken::Right => TokenKind::KwRight,
            SqlToken::Outer => TokenKind::KwOuter,
            SqlToken::Begin => TokenKind::KwBegin,
            SqlToken::End => TokenKind::KwEnd,
            SqlToken::Section => TokenKind::KwSection,
            SqlToken::Include => TokenKind::KwInclude,
            SqlToken::Whenever => TokenKind::KwWhenever,
            SqlToken::SqlError => TokenKind::KwSqlError,
            SqlToken::SqlWarning => TokenKind::KwSqlWarning,
            SqlToken::Found => TokenKind::KwFound,
            SqlToken::Continue => TokenKind::KwContinue,
            SqlToken::Goto => TokenKind::KwGoto,
            SqlToken::Stop => TokenKind::KwStop,
            SqlToken::Using => TokenKind::KwUsing,
            SqlToken::Indicator => TokenKind::KwIndicator,
            SqlToken::HostVar => TokenKind::HostVar,
            SqlToken::Eq => TokenKind::Assign,
            SqlToken::NeAngle | SqlToken::NeBang => TokenKind::Ne,
            SqlToken::Lt => TokenKind::Lt,
            SqlToken::Le => TokenKind::Le,
            SqlToken::Gt => TokenKind::Gt,
            SqlToken::Ge => TokenKind::Ge,
            SqlToken::Plus => TokenKind::Plus,
            SqlToken::Minus => TokenKind::Minus,
            SqlToken::Star => TokenKind::Star,
            SqlToken::Slash => TokenKind::Slash,
            SqlToken::Percent => TokenKind::Percent,
            SqlToken::Concat => TokenKind::PipePipe,
            SqlToken::LParen => TokenKind::LParen,
            SqlToken::RParen => TokenKind::RParen,
            SqlToken::Comma => TokenKind::Comma,
            SqlToken::Dot => TokenKind::Dot,
            SqlToken::Semi => TokenKind::Semi,
            SqlToken::Colon => TokenKind::Colon,
            SqlToken::Question => TokenKind::Question,
            SqlToken::IntLit => TokenKind::IntLit,
            SqlToken::FloatLit => TokenKind::FloatLit,
            SqlToken::StringLit | SqlToken::StringUnterminated => TokenKind::StringLit,
            SqlToken::QuotedIdent => TokenKind::Ident,
            SqlToken::Ident => TokenKind::Ident,
        }
    }
}
