//! Lexical analysis.
//!
//! Turns raw source text into a linear token sequence. Identifiers are
//! classified at lex time into language keywords, library subcategories
//! (containers, algorithms, iterators, ...) or plain identifiers; multi
//! character operators win over single character ones by longest match.

use crate::ast::DataType;
use logos::{Lexer, Logos};
use std::fmt;
use std::ops::Range;

/// Library identifier subcategory.
///
/// Classification checks the categories in declaration order; an identifier
/// present in several sets gets the earliest matching category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibKind {
    Plain,
    Container,
    Algorithm,
    Iterator,
    Utility,
    StringOp,
    Io,
    Memory,
}

const CONTAINERS: &[&str] = &[
    "vector",
    "list",
    "map",
    "set",
    "multimap",
    "multiset",
    "unordered_map",
    "unordered_set",
    "array",
    "deque",
    "stack",
    "queue",
    "priority_queue",
    "forward_list",
    "bitset",
];

const ALGORITHMS: &[&str] = &[
    "sort",
    "stable_sort",
    "find",
    "find_if",
    "transform",
    "accumulate",
    "copy",
    "move",
    "swap",
    "for_each",
    "count",
    "count_if",
    "binary_search",
    "lower_bound",
    "upper_bound",
    "min_element",
    "max_element",
    "reverse",
    "unique",
    "partition",
    "merge",
    "fill",
    "replace",
    "remove",
    "rotate",
];

const ITERATORS: &[&str] = &[
    "begin",
    "end",
    "rbegin",
    "rend",
    "cbegin",
    "cend",
    "advance",
    "next",
    "prev",
    "distance",
    "inserter",
    "back_inserter",
    "front_inserter",
];

const UTILITIES: &[&str] = &[
    "make_pair",
    "make_unique",
    "make_shared",
    "forward",
    "get",
    "tie",
    "tuple",
    "pair",
];

const STRING_OPS: &[&str] = &[
    "substr",
    "length",
    "append",
    "compare",
    "c_str",
    "at",
    "front",
    "back",
    "push_back",
    "pop_back",
    "empty",
    "clear",
    "npos",
    "stoi",
    "stod",
    "to_string",
    "getline",
];

const IO_OPS: &[&str] = &[
    "cout",
    "cin",
    "cerr",
    "clog",
    "endl",
    "printf",
    "scanf",
    "flush",
    "ostream",
    "istream",
    "ifstream",
    "ofstream",
    "fstream",
    "stringstream",
];

const MEMORY_OPS: &[&str] = &[
    "malloc",
    "free",
    "calloc",
    "realloc",
    "unique_ptr",
    "shared_ptr",
    "weak_ptr",
    "allocator",
    "addressof",
];

/// An identifier together with its library subcategory tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub kind: LibKind,
    pub text: String,
}

impl Ident {
    pub fn plain(text: impl ToString) -> Self {
        Self {
            kind: LibKind::Plain,
            text: text.to_string(),
        }
    }

    fn classify(text: &str) -> Self {
        let kind = if CONTAINERS.contains(&text) {
            LibKind::Container
        } else if ALGORITHMS.contains(&text) {
            LibKind::Algorithm
        } else if ITERATORS.contains(&text) {
            LibKind::Iterator
        } else if UTILITIES.contains(&text) {
            LibKind::Utility
        } else if STRING_OPS.contains(&text) {
            LibKind::StringOp
        } else if IO_OPS.contains(&text) {
            LibKind::Io
        } else if MEMORY_OPS.contains(&text) {
            LibKind::Memory
        } else {
            LibKind::Plain
        };
        Self {
            kind,
            text: text.to_string(),
        }
    }
}

fn keyword<'s>(lex: &mut Lexer<'s, Token>) -> String {
    lex.slice().to_string()
}

fn number_literal<'s>(lex: &mut Lexer<'s, Token>) -> String {
    lex.slice().to_string()
}

/// Strips the surrounding quotes; escape pairs inside are kept verbatim.
/// An unterminated literal simply has no closing quote to strip.
fn string_literal<'s>(lex: &mut Lexer<'s, Token>) -> String {
    let inner = lex.slice().strip_prefix('"').unwrap_or_else(|| lex.slice());
    inner.strip_suffix('"').unwrap_or(inner).to_string()
}

fn char_literal<'s>(lex: &mut Lexer<'s, Token>) -> String {
    let inner = lex.slice().strip_prefix('\'').unwrap_or_else(|| lex.slice());
    inner.strip_suffix('\'').unwrap_or(inner).to_string()
}

/// An unterminated block comment consumes to end of input. That is defined
/// behavior, not an error.
fn block_comment<'s>(lex: &mut Lexer<'s, Token>) -> logos::Skip {
    let rest = lex.remainder();
    let len = rest.find("*/").map(|i| i + 2).unwrap_or_else(|| rest.len());
    lex.bump(len);
    logos::Skip
}

#[derive(Debug, Logos, Clone, PartialEq)]
pub enum Token {
    // literals
    #[regex(r"[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?", number_literal)]
    Number(String),
    #[regex(r#""([^"\\]|\\.)*"?"#, string_literal)]
    Str(String),
    #[regex(r"'([^'\\]|\\.)*'?", char_literal)]
    Char(String),
    #[token("true", |_| true)]
    #[token("false", |_| false)]
    Bool(bool),

    // identifiers, classified by set membership
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| Ident::classify(lex.slice()))]
    Ident(Ident),

    // type keywords
    #[token("void", |_| DataType::Void)]
    #[token("int", |_| DataType::Int)]
    #[token("float", |_| DataType::Float)]
    #[token("double", |_| DataType::Double)]
    #[token("char", |_| DataType::Char)]
    #[token("bool", |_| DataType::Bool)]
    #[token("auto", |_| DataType::Auto)]
    Type(DataType),

    // structural keywords
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("return")]
    Return,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("def")]
    Def,
    #[token("extern")]
    Extern,

    // remaining language keywords, kept as classified text
    #[token("do", keyword)]
    #[token("switch", keyword)]
    #[token("case", keyword)]
    #[token("default", keyword)]
    #[token("const", keyword)]
    #[token("static", keyword)]
    #[token("register", keyword)]
    #[token("volatile", keyword)]
    #[token("struct", keyword)]
    #[token("union", keyword)]
    #[token("enum", keyword)]
    #[token("typedef", keyword)]
    #[token("long", keyword)]
    #[token("short", keyword)]
    #[token("signed", keyword)]
    #[token("unsigned", keyword)]
    #[token("sizeof", keyword)]
    #[token("goto", keyword)]
    Keyword(String),

    // multi-character operators (longest match wins)
    #[token("==")]
    EqualsEquals,
    #[token("!=")]
    NotEquals,
    #[token("<=")]
    LessThanEquals,
    #[token(">=")]
    GreaterThanEquals,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("::")]
    ColonColon,
    #[token("->")]
    Arrow,
    #[token("<<")]
    ShiftLeft,
    #[token(">>")]
    ShiftRight,
    #[token("+=")]
    PlusEquals,
    #[token("-=")]
    MinusEquals,
    #[token("*=")]
    AsteriskEquals,
    #[token("/=")]
    SlashEquals,

    // single-character operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus, // NOTE: can also be unary
    #[token("*")]
    Asterisk,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("=")]
    Equals,
    #[token("<")]
    LessThan,
    #[token(">")]
    GreaterThan,
    #[token("!")]
    LogicalNot,
    #[token("~")]
    Tilde,
    #[token("&")]
    Ampersand,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,

    // punctuation
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("?")]
    Question,

    // misc
    #[regex(r"[ \t\n\r\f]+", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)] // line comments
    #[regex(r"#[^\n]*", logos::skip)] // hash comments and preprocessor directives
    #[token("/*", block_comment)]
    #[error]
    Error,

    /// Only generated in parse phase when the token stream runs out.
    Eof,
}

impl Token {
    /// Returns the binary binding power or `None` if invalid binop token.
    /// Binding power `0` and `1` is reserved for accepting any expression.
    /// Assignment (`Token::Equals`) has the lowest precedence with `(3, 2)`.
    pub fn binop_bp(&self) -> Option<(u8, u8)> {
        match self {
            /* Assignment (right associative) */
            Token::Equals => Some((3, 2)),
            /* Logical */
            Token::OrOr => Some((4, 5)),
            Token::AndAnd => Some((6, 7)),
            /* Equality */
            Token::EqualsEquals | Token::NotEquals => Some((8, 9)),
            /* Ordering */
            Token::LessThan
            | Token::LessThanEquals
            | Token::GreaterThan
            | Token::GreaterThanEquals => Some((10, 11)),
            /* Additive */
            Token::Plus | Token::Minus => Some((12, 13)),
            /* Multiplicative */
            Token::Asterisk | Token::Slash | Token::Percent => Some((14, 15)),
            _ => None,
        }
    }

    /// Returns `true` for tokens that may start a unary prefix expression.
    pub fn is_prefix_op(&self) -> bool {
        matches!(
            self,
            Token::LogicalNot
                | Token::Minus
                | Token::Plus
                | Token::Tilde
                | Token::PlusPlus
                | Token::MinusMinus
                | Token::Asterisk
                | Token::Ampersand
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spelling = match self {
            Token::Number(text) => text,
            Token::Str(text) => return write!(f, "\"{}\"", text),
            Token::Char(text) => return write!(f, "'{}'", text),
            Token::Bool(val) => return write!(f, "{}", val),
            Token::Ident(ident) => &ident.text,
            Token::Type(ty) => return write!(f, "{}", ty),
            Token::Keyword(text) => text,
            Token::If => "if",
            Token::Else => "else",
            Token::While => "while",
            Token::For => "for",
            Token::Return => "return",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::Def => "def",
            Token::Extern => "extern",
            Token::EqualsEquals => "==",
            Token::NotEquals => "!=",
            Token::LessThanEquals => "<=",
            Token::GreaterThanEquals => ">=",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::PlusPlus => "++",
            Token::MinusMinus => "--",
            Token::ColonColon => "::",
            Token::Arrow => "->",
            Token::ShiftLeft => "<<",
            Token::ShiftRight => ">>",
            Token::PlusEquals => "+=",
            Token::MinusEquals => "-=",
            Token::AsteriskEquals => "*=",
            Token::SlashEquals => "/=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Asterisk => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Equals => "=",
            Token::LessThan => "<",
            Token::GreaterThan => ">",
            Token::LogicalNot => "!",
            Token::Tilde => "~",
            Token::Ampersand => "&",
            Token::Pipe => "|",
            Token::Caret => "^",
            Token::OpenParen => "(",
            Token::CloseParen => ")",
            Token::OpenBrace => "{",
            Token::CloseBrace => "}",
            Token::OpenBracket => "[",
            Token::CloseBracket => "]",
            Token::Comma => ",",
            Token::Semi => ";",
            Token::Colon => ":",
            Token::Dot => ".",
            Token::Question => "?",
            Token::Error => "<error>",
            Token::Eof => "<eof>",
        };
        f.write_str(spelling)
    }
}

/// Failure to classify a character into any token category.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    /// Byte offset of the offending character.
    pub position: usize,
    /// The offending character itself.
    pub character: char,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown character `{}` at position {}",
            self.character, self.position
        )
    }
}

/// Tokenizes `source`, also returning the byte span of every token.
pub fn lex_spanned(source: &str) -> Result<(Vec<Token>, Vec<Range<usize>>), LexError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut spans = Vec::new();
    while let Some(token) = lexer.next() {
        if token == Token::Error {
            let span = lexer.span();
            return Err(LexError {
                position: span.start,
                character: source[span.start..].chars().next().unwrap_or('\0'),
            });
        }
        tokens.push(token);
        spans.push(lexer.span());
    }
    Ok((tokens, spans))
}

/// Tokenizes `source` into a flat token sequence.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    lex_spanned(source).map(|(tokens, _)| tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_and_comments_only() {
        assert_eq!(tokenize("").unwrap(), vec![]);
        assert_eq!(tokenize("   \t\n  ").unwrap(), vec![]);
        assert_eq!(tokenize("// just a comment\n").unwrap(), vec![]);
        assert_eq!(tokenize("# a hash comment").unwrap(), vec![]);
        assert_eq!(tokenize("/* block\ncomment */  ").unwrap(), vec![]);
        assert_eq!(tokenize("#include <iostream>\n#define MAX 100\n").unwrap(), vec![]);
    }

    #[test]
    fn unterminated_block_comment_consumes_to_eof() {
        assert_eq!(tokenize("1 /* never closed ...").unwrap().len(), 1);
    }

    #[test]
    fn arithmetic_expression() {
        let tokens = tokenize("1 + 2 * 3").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Number("1".to_string()),
                Token::Plus,
                Token::Number("2".to_string()),
                Token::Asterisk,
                Token::Number("3".to_string()),
            ]
        );
    }

    #[test]
    fn numbers() {
        let tokens = tokenize("42 3.14 -5.2 1e-3 .5").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Number("42".to_string()),
                Token::Number("3.14".to_string()),
                Token::Number("-5.2".to_string()),
                Token::Number("1e-3".to_string()),
                Token::Number(".5".to_string()),
            ]
        );
        // a second decimal point stops the scan instead of erroring
        assert_eq!(
            tokenize("1.2.3").unwrap(),
            vec![
                Token::Number("1.2".to_string()),
                Token::Number(".3".to_string()),
            ]
        );
        // a lone dot is a punctuator, not a number
        assert_eq!(tokenize(".").unwrap(), vec![Token::Dot]);
    }

    #[test]
    fn sign_binds_to_the_following_digits() {
        // the longest match wins, so an unspaced `+`/`-` before digits is
        // part of the literal rather than an operator
        assert_eq!(
            tokenize("1+2").unwrap(),
            vec![
                Token::Number("1".to_string()),
                Token::Number("+2".to_string()),
            ]
        );
        assert_eq!(
            tokenize("x-5").unwrap(),
            vec![
                Token::Ident(Ident::plain("x")),
                Token::Number("-5".to_string()),
            ]
        );
        // whitespace detaches the sign into an operator
        assert_eq!(
            tokenize("1 - 2").unwrap(),
            vec![
                Token::Number("1".to_string()),
                Token::Minus,
                Token::Number("2".to_string()),
            ]
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        let tokens = tokenize("int x while foo_1 struct").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Type(crate::ast::DataType::Int),
                Token::Ident(Ident::plain("x")),
                Token::While,
                Token::Ident(Ident::plain("foo_1")),
                Token::Keyword("struct".to_string()),
            ]
        );
    }

    #[test]
    fn library_identifier_classification() {
        fn kind_of(source: &str) -> LibKind {
            match &tokenize(source).unwrap()[0] {
                Token::Ident(ident) => ident.kind,
                other => panic!("not an identifier: {:?}", other),
            }
        }

        assert_eq!(kind_of("vector"), LibKind::Container);
        assert_eq!(kind_of("unordered_map"), LibKind::Container);
        assert_eq!(kind_of("sort"), LibKind::Algorithm);
        assert_eq!(kind_of("accumulate"), LibKind::Algorithm);
        assert_eq!(kind_of("begin"), LibKind::Iterator);
        assert_eq!(kind_of("back_inserter"), LibKind::Iterator);
        assert_eq!(kind_of("make_pair"), LibKind::Utility);
        assert_eq!(kind_of("substr"), LibKind::StringOp);
        assert_eq!(kind_of("cout"), LibKind::Io);
        assert_eq!(kind_of("malloc"), LibKind::Memory);
        assert_eq!(kind_of("shared_ptr"), LibKind::Memory);
        assert_eq!(kind_of("just_a_name"), LibKind::Plain);
        // `move` and `swap` appear in two sets; the earliest checked wins
        assert_eq!(kind_of("move"), LibKind::Algorithm);
        assert_eq!(kind_of("swap"), LibKind::Algorithm);
    }

    #[test]
    fn operators_longest_match() {
        let tokens = tokenize("+ - * / = < > <= >= == != && || ++ --").unwrap();
        assert_eq!(tokens.len(), 15);
        assert_eq!(tokens[7], Token::LessThanEquals);
        assert_eq!(tokens[10], Token::NotEquals);
        assert_eq!(tokens[13], Token::PlusPlus);
        // separated characters stay separate
        assert_eq!(
            tokenize("< =").unwrap(),
            vec![Token::LessThan, Token::Equals]
        );
        assert_eq!(
            tokenize("a :: b").unwrap()[1],
            Token::ColonColon
        );
    }

    #[test]
    fn string_literals() {
        assert_eq!(
            tokenize(r#""Hello World""#).unwrap(),
            vec![Token::Str("Hello World".to_string())]
        );
        // the escape pair is copied verbatim, not interpreted
        assert_eq!(
            tokenize(r#""Test\nString""#).unwrap(),
            vec![Token::Str(r"Test\nString".to_string())]
        );
        assert_eq!(tokenize(r#""""#).unwrap(), vec![Token::Str(String::new())]);
        // unterminated literals keep what was scanned
        assert_eq!(
            tokenize(r#""unterminated"#).unwrap(),
            vec![Token::Str("unterminated".to_string())]
        );
    }

    #[test]
    fn char_literals() {
        assert_eq!(
            tokenize(r"'a' '\n' '\0'").unwrap(),
            vec![
                Token::Char("a".to_string()),
                Token::Char(r"\n".to_string()),
                Token::Char(r"\0".to_string()),
            ]
        );
    }

    #[test]
    fn bool_literals() {
        assert_eq!(
            tokenize("true false trueish").unwrap(),
            vec![
                Token::Bool(true),
                Token::Bool(false),
                Token::Ident(Ident::plain("trueish")),
            ]
        );
    }

    #[test]
    fn unknown_character() {
        let err = tokenize("int x = 5; @").unwrap_err();
        assert_eq!(err.position, 11);
        assert_eq!(err.character, '@');
    }

    #[test]
    fn spans_track_source() {
        let (tokens, spans) = lex_spanned("x = 5").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(spans[0], 0..1);
        assert_eq!(spans[1], 2..3);
        assert_eq!(spans[2], 4..5);
    }
}
