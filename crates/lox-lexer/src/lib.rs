//! lox-lexer: analyse lexicale pour lox
//!
//! Faits saillants :
//! - `Scanner` : flux **paresseux** de `Token`, un jeton par appel, sans retour arrière
//!   (maximal munch, un seul caractère de lookahead au-delà du curseur pour `12.5`)
//! - suivi des lignes via une primitive unique `advance()` : espaces, chaînes et
//!   commentaires `//` incrémentent tous la ligne sur `\n`
//! - mots-clés reconnus par aiguillage sur le premier octet puis comparaison du suffixe
//! - les erreurs lexicales sont des jetons `Error` dont le lexème porte le message
//!
//! Exemple éclair :
//! ```
//! use lox_lexer::{Scanner, TokenKind};
//!
//! let mut sc = Scanner::new("var x = 12.5;");
//! let kinds: Vec<_> = sc.by_ref().map(|t| t.kind).collect();
//! assert_eq!(kinds.last(), Some(&TokenKind::Eof));
//! ```

#![deny(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

use core::{fmt, iter::FusedIterator};

#[cfg(feature = "std")]
use std::{string::String, vec::Vec};

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};
#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ─────────────────────────── Tokens ─────────────────────────── */

/// Genre de jeton lexical (énumération fermée).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TokenKind {
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `;`
    Semicolon,
    /// `/`
    Slash,
    /// `*`
    Star,
    /// `!`
    Bang,
    /// `!=`
    BangEqual,
    /// `=`
    Equal,
    /// `==`
    EqualEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// Identifiant.
    Identifier,
    /// Littéral chaîne (lexème avec guillemets).
    String,
    /// Littéral nombre.
    Number,
    /// `and`
    And,
    /// `class`
    Class,
    /// `else`
    Else,
    /// `false`
    False,
    /// `for`
    For,
    /// `fun`
    Fun,
    /// `if`
    If,
    /// `nil`
    Nil,
    /// `or`
    Or,
    /// `print`
    Print,
    /// `return`
    Return,
    /// `super`
    Super,
    /// `this`
    This,
    /// `true`
    True,
    /// `var`
    Var,
    /// `while`
    While,
    /// Erreur lexicale ; le lexème contient le message.
    Error,
    /// Fin de source.
    Eof,
}

impl TokenKind {
    /// Nom en majuscules utilisé par les dumps.
    pub const fn name(self) -> &'static str {
        use TokenKind::*;
        match self {
            LeftParen => "LEFT_PAREN",
            RightParen => "RIGHT_PAREN",
            LeftBrace => "LEFT_BRACE",
            RightBrace => "RIGHT_BRACE",
            Comma => "COMMA",
            Dot => "DOT",
            Minus => "MINUS",
            Plus => "PLUS",
            Semicolon => "SEMICOLON",
            Slash => "SLASH",
            Star => "STAR",
            Bang => "BANG",
            BangEqual => "BANG_EQUAL",
            Equal => "EQUAL",
            EqualEqual => "EQUAL_EQUAL",
            Greater => "GREATER",
            GreaterEqual => "GREATER_EQUAL",
            Less => "LESS",
            LessEqual => "LESS_EQUAL",
            Identifier => "IDENTIFIER",
            TokenKind::String => "STRING",
            Number => "NUMBER",
            And => "AND",
            Class => "CLASS",
            Else => "ELSE",
            False => "FALSE",
            For => "FOR",
            Fun => "FUN",
            If => "IF",
            Nil => "NIL",
            Or => "OR",
            Print => "PRINT",
            Return => "RETURN",
            Super => "SUPER",
            This => "THIS",
            True => "TRUE",
            Var => "VAR",
            While => "WHILE",
            Error => "ERROR",
            Eof => "EOF",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// Jeton : genre, lexème exact (ou message pour `Error`) et ligne de départ (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Token<'a> {
    /// Genre.
    pub kind: TokenKind,
    /// Sous-chaîne couverte, ou message de diagnostic si `kind == Error`.
    pub lexeme: &'a str,
    /// Ligne où le jeton commence.
    pub line: u32,
}

impl Token<'_> {
    /// Vrai pour un jeton d'erreur.
    pub fn is_error(&self) -> bool { self.kind == TokenKind::Error }
    /// Vrai pour la sentinelle de fin.
    pub fn is_eof(&self) -> bool { self.kind == TokenKind::Eof }
}

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Message des chaînes non terminées.
pub const UNTERMINATED_STRING: &str = "Unterminated string.";
/// Message des caractères non reconnus.
pub const UNEXPECTED_CHARACTER: &str = "Unexpected character.";

/// Erreur lexicale extraite d'un jeton `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LexError {
    /// Ligne du jeton fautif.
    pub line: u32,
    /// Message (`Unterminated string.`, `Unexpected character.`).
    pub message: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error: {}", self.line, self.message)
    }
}
#[cfg(feature = "std")]
impl std::error::Error for LexError {}

impl From<Token<'_>> for LexError {
    fn from(tok: Token<'_>) -> Self { Self { line: tok.line, message: tok.lexeme.into() } }
}

/* ─────────────────────────── Scanner ─────────────────────────── */

/// Analyseur lexical (itératif, une instance par source).
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    /// Début du jeton en construction.
    start: usize,
    /// Curseur de lookahead.
    current: usize,
    /// Ligne courante (1-based).
    line: u32,
    /// Ligne au début du jeton en construction.
    start_line: u32,
    /// `Eof` déjà rendu par l'itérateur.
    done: bool,
}

impl<'a> Scanner<'a> {
    /// Crée un scanner au début de `src`.
    pub fn new(src: &'a str) -> Self {
        Self { src, bytes: src.as_bytes(), start: 0, current: 0, line: 1, start_line: 1, done: false }
    }

    /// Prochain jeton. Après la fin, renvoie `Eof` indéfiniment.
    pub fn scan_token(&mut self) -> Token<'a> {
        let tok = self.scan();
        #[cfg(feature = "trace")]
        log::trace!("token {} {:?} @{}", tok.kind, tok.lexeme, tok.line);
        tok
    }

    fn scan(&mut self) -> Token<'a> {
        loop {
            self.skip_whitespace();
            self.start = self.current;
            self.start_line = self.line;

            let Some(c) = self.advance() else {
                return self.make_token(TokenKind::Eof);
            };

            if c == b'/' && self.eat(b'/') {
                self.skip_line_comment();
                continue;
            }

            let kind = match c {
                c if is_alpha(c) => return self.identifier(),
                c if c.is_ascii_digit() => return self.number(),
                b'"' => return self.string(),

                b'(' => TokenKind::LeftParen,
                b')' => TokenKind::RightParen,
                b'{' => TokenKind::LeftBrace,
                b'}' => TokenKind::RightBrace,
                b';' => TokenKind::Semicolon,
                b',' => TokenKind::Comma,
                b'.' => TokenKind::Dot,
                b'-' => TokenKind::Minus,
                b'+' => TokenKind::Plus,
                b'*' => TokenKind::Star,
                b'/' => TokenKind::Slash,
                b'!' => if self.eat(b'=') { TokenKind::BangEqual } else { TokenKind::Bang },
                b'=' => if self.eat(b'=') { TokenKind::EqualEqual } else { TokenKind::Equal },
                b'<' => if self.eat(b'=') { TokenKind::LessEqual } else { TokenKind::Less },
                b'>' => if self.eat(b'=') { TokenKind::GreaterEqual } else { TokenKind::Greater },

                other => {
                    if !other.is_ascii() {
                        // un point de code = une erreur ; garde `start` sur une frontière UTF-8
                        while self.peek().is_some_and(|b| b & 0xC0 == 0x80) {
                            self.advance();
                        }
                    }
                    return self.error_token(UNEXPECTED_CHARACTER);
                }
            };
            return self.make_token(kind);
        }
    }

    /* ────────── Primitives internes ────────── */

    #[inline] fn peek(&self) -> Option<u8> { self.bytes.get(self.current).copied() }
    #[inline] fn peek_next(&self) -> Option<u8> { self.bytes.get(self.current + 1).copied() }

    /// Seul point d'avance du curseur ; compte les `\n`.
    #[inline]
    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.current += 1;
        if b == b'\n' {
            self.line += 1;
        }
        Some(b)
    }

    #[inline]
    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\r' | b'\t' | b'\n')) {
            self.advance();
        }
    }

    fn skip_line_comment(&mut self) {
        while self.peek().is_some_and(|b| b != b'\n') {
            self.advance();
        }
    }

    fn string(&mut self) -> Token<'a> {
        while self.peek().is_some_and(|b| b != b'"') {
            self.advance();
        }
        if !self.eat(b'"') {
            return self.error_token(UNTERMINATED_STRING);
        }
        self.make_token(TokenKind::String)
    }

    fn number(&mut self) -> Token<'a> {
        self.consume_digits();
        if self.peek() == Some(b'.') && self.peek_next().is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
            self.consume_digits();
        }
        self.make_token(TokenKind::Number)
    }

    fn consume_digits(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
        }
    }

    fn identifier(&mut self) -> Token<'a> {
        while self.peek().is_some_and(|b| is_alpha(b) || b.is_ascii_digit()) {
            self.advance();
        }
        self.make_token(self.identifier_kind())
    }

    fn identifier_kind(&self) -> TokenKind {
        use TokenKind::*;
        let text = &self.bytes[self.start..self.current];
        let keyword = |skip: usize, rest: &[u8], kind: TokenKind| {
            if &text[skip..] == rest { kind } else { Identifier }
        };
        match text {
            [b'a', ..] => keyword(1, b"nd", And),
            [b'c', ..] => keyword(1, b"lass", Class),
            [b'e', ..] => keyword(1, b"lse", Else),
            [b'f', b'a', ..] => keyword(2, b"lse", False),
            [b'f', b'o', ..] => keyword(2, b"r", For),
            [b'f', b'u', ..] => keyword(2, b"n", Fun),
            [b'i', ..] => keyword(1, b"f", If),
            [b'n', ..] => keyword(1, b"il", Nil),
            [b'o', ..] => keyword(1, b"r", Or),
            [b'p', ..] => keyword(1, b"rint", Print),
            [b'r', ..] => keyword(1, b"eturn", Return),
            [b's', ..] => keyword(1, b"uper", Super),
            [b't', b'h', ..] => keyword(2, b"is", This),
            [b't', b'r', ..] => keyword(2, b"ue", True),
            [b'v', ..] => keyword(1, b"ar", Var),
            [b'w', ..] => keyword(1, b"hile", While),
            _ => Identifier,
        }
    }

    fn make_token(&self, kind: TokenKind) -> Token<'a> {
        Token { kind, lexeme: &self.src[self.start..self.current], line: self.start_line }
    }

    fn error_token(&self, message: &'static str) -> Token<'a> {
        Token { kind: TokenKind::Error, lexeme: message, line: self.start_line }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    /// Rend chaque jeton jusqu'à `Eof` inclus, puis `None`.
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let tok = self.scan_token();
        self.done = tok.is_eof();
        Some(tok)
    }
}

impl FusedIterator for Scanner<'_> {}

/* ─────────────────────────── API de confort ─────────────────────────── */

/// Tokenise toute la source (ajoute `Eof` final).
pub fn tokenize(src: &str) -> Vec<Token<'_>> { Scanner::new(src).collect() }

/// Tokenise toute la source ; échoue avec **toutes** les erreurs lexicales rencontrées.
pub fn scan_all(src: &str) -> Result<Vec<Token<'_>>, Vec<LexError>> {
    let tokens = tokenize(src);
    let errors: Vec<LexError> = tokens.iter().filter(|t| t.is_error()).copied().map(LexError::from).collect();
    if errors.is_empty() { Ok(tokens) } else { Err(errors) }
}

/// Dump lisible des jetons : ligne (ou `   |` si répétée), genre, `'lexème'`.
pub fn dump_tokens(src: &str) -> String {
    use core::fmt::Write;

    let mut out = String::new();
    let mut last_line = None;
    for tok in Scanner::new(src) {
        if last_line == Some(tok.line) {
            out.push_str("   | ");
        } else {
            let _ = write!(out, "{:4} ", tok.line);
            last_line = Some(tok.line);
        }
        let _ = writeln!(out, "{:<13} '{}'", tok.kind.name(), tok.lexeme);
    }
    out
}

/* ─────────────────────────── Helpers ─────────────────────────── */

#[inline]
const fn is_alpha(c: u8) -> bool { c == b'_' || c.is_ascii_alphabetic() }

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn kinds(src: &str) -> Vec<TokenKind> { tokenize(src).into_iter().map(|t| t.kind).collect() }

    fn tok(kind: TokenKind, lexeme: &str, line: u32) -> Token<'_> { Token { kind, lexeme, line } }

    #[test]
    fn var_declaration() {
        use TokenKind::*;
        assert_eq!(
            tokenize("var x = 12.5;"),
            vec![
                tok(Var, "var", 1),
                tok(Identifier, "x", 1),
                tok(Equal, "=", 1),
                tok(Number, "12.5", 1),
                tok(Semicolon, ";", 1),
                tok(Eof, "", 1),
            ]
        );
    }

    #[test]
    fn comment_emits_no_token() {
        assert_eq!(tokenize("// comment\n"), vec![tok(TokenKind::Eof, "", 2)]);
        assert_eq!(kinds("1 // trailing / stuff\n/ 2"), {
            use TokenKind::*;
            vec![Number, Slash, Number, Eof]
        });
    }

    #[test]
    fn unterminated_string() {
        let mut sc = Scanner::new("\"abc");
        assert_eq!(sc.scan_token(), tok(TokenKind::Error, "Unterminated string.", 1));
        assert_eq!(sc.scan_token(), tok(TokenKind::Eof, "", 1));
    }

    #[test]
    fn keywords_and_near_misses() {
        use TokenKind::*;
        assert_eq!(
            kinds("and class else false for fun if nil or print return super this true var while"),
            vec![And, Class, Else, False, For, Fun, If, Nil, Or, Print, Return, Super, This, True, Var, While, Eof]
        );
        assert_eq!(
            kinds("an classy f fo t th tru variable _while w2 ifx"),
            vec![Identifier; 11].into_iter().chain([Eof]).collect::<Vec<_>>()
        );
    }

    #[test]
    fn one_and_two_char_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("( ) { } , . - + ; / * ! != = == > >= < <="),
            vec![
                LeftParen, RightParen, LeftBrace, RightBrace, Comma, Dot, Minus, Plus, Semicolon, Slash,
                Star, Bang, BangEqual, Equal, EqualEqual, Greater, GreaterEqual, Less, LessEqual, Eof,
            ]
        );
        assert_eq!(kinds("!==="), vec![BangEqual, EqualEqual, Eof]);
    }

    #[test]
    fn numbers_need_a_digit_after_the_dot() {
        use TokenKind::*;
        assert_eq!(tokenize("1."), vec![tok(Number, "1", 1), tok(Dot, ".", 1), tok(Eof, "", 1)]);
        assert_eq!(tokenize(".5"), vec![tok(Dot, ".", 1), tok(Number, "5", 1), tok(Eof, "", 1)]);
        assert_eq!(tokenize("1.2.3")[..2], [tok(Number, "1.2", 1), tok(Dot, ".", 1)]);
    }

    #[test]
    fn newlines_are_tracked_everywhere() {
        use TokenKind::*;
        let src = "a\n\"multi\nline\" b // c\n\n  d";
        assert_eq!(
            tokenize(src),
            vec![
                tok(Identifier, "a", 1),
                tok(TokenKind::String, "\"multi\nline\"", 2),
                tok(Identifier, "b", 3),
                tok(Identifier, "d", 5),
                tok(Eof, "", 5),
            ]
        );
    }

    #[test]
    fn unexpected_characters() {
        use TokenKind::*;
        assert_eq!(
            tokenize("@ é #"),
            vec![
                tok(Error, "Unexpected character.", 1),
                tok(Error, "Unexpected character.", 1),
                tok(Error, "Unexpected character.", 1),
                tok(Eof, "", 1),
            ]
        );
    }

    #[test]
    fn iterator_is_fused_and_scanner_keeps_eof() {
        let mut sc = Scanner::new("x");
        assert_eq!(sc.by_ref().count(), 2);
        assert_eq!(sc.next(), None);
        assert!(sc.scan_token().is_eof());
    }

    #[test]
    fn scan_all_collects_errors() {
        assert!(scan_all("1 + 2").is_ok());
        let errs = scan_all("1 $\n\"open").unwrap_err();
        assert_eq!(
            errs,
            vec![
                LexError { line: 1, message: "Unexpected character.".into() },
                LexError { line: 2, message: "Unterminated string.".into() },
            ]
        );
        assert_eq!(errs[0].to_string(), "[line 1] Error: Unexpected character.");
    }

    #[test]
    fn dump_format() {
        assert_eq!(
            dump_tokens("print 1;\n-x"),
            "   1 PRINT         'print'\n\
             \x20  | NUMBER        '1'\n\
             \x20  | SEMICOLON     ';'\n\
             \x20  2 MINUS         '-'\n\
             \x20  | IDENTIFIER    'x'\n\
             \x20  | EOF           ''\n"
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn tokens_serialize() {
        let json = serde_json::to_string(&tokenize("nil")[0]).unwrap();
        assert_eq!(json, r#"{"kind":"Nil","lexeme":"nil","line":1}"#);
    }

    proptest! {
        #[test]
        fn any_input_terminates_with_eof_on_last_line(src in "(?s).{0,200}") {
            let toks = tokenize(&src);
            let last = toks.last().unwrap();
            prop_assert!(last.is_eof());
            prop_assert_eq!(toks.iter().filter(|t| t.is_eof()).count(), 1);
            prop_assert_eq!(last.line as usize, 1 + src.matches('\n').count());
            prop_assert!(toks.windows(2).all(|w| w[0].line <= w[1].line));
        }
    }
}
