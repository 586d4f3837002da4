use std::fmt;

use serde::Serialize;

use crate::utils::{Diagnostic, Loc};

/// The kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    /// End of the source line.
    Eol,
    Symbol,
    /// `::=` or `=`.
    Definition,
    /// `=/`.
    IncrementalAlternative,
    /// `|` or `/`.
    Alternation,
    String,
    BracketOpen,
    BracketClose,
    CurlyOpen,
    CurlyClose,
    ParenOpen,
    ParenClose,
    Ellipsis,
    Dash,
    Asterisk,
    Number,
    /// `%xHH-HH`, both bounds held in the token text.
    ValueRange,
}

impl TokenKind {
    /// Human-readable name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Eol => "end of line",
            TokenKind::Symbol => "symbol",
            TokenKind::Definition => "definition symbol",
            TokenKind::IncrementalAlternative => "incremental alternative symbol",
            TokenKind::Alternation => "alternation symbol",
            TokenKind::String => "string literal",
            TokenKind::BracketOpen => "open bracket",
            TokenKind::BracketClose => "close bracket",
            TokenKind::CurlyOpen => "open curly",
            TokenKind::CurlyClose => "close curly",
            TokenKind::ParenOpen => "open paren",
            TokenKind::ParenClose => "close paren",
            TokenKind::Ellipsis => "ellipsis",
            TokenKind::Dash => "dash",
            TokenKind::Asterisk => "asterisk",
            TokenKind::Number => "number",
            TokenKind::ValueRange => "value range",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed literal tokens, matched most-specific-first: `::=` must win over
/// `=`, and `=/` must win over `=`.
const LITERAL_TOKENS: &[(&str, TokenKind)] = &[
    ("::=", TokenKind::Definition),
    ("=/", TokenKind::IncrementalAlternative),
    ("...", TokenKind::Ellipsis),
    ("=", TokenKind::Definition),
    ("|", TokenKind::Alternation),
    ("/", TokenKind::Alternation),
    ("[", TokenKind::BracketOpen),
    ("]", TokenKind::BracketClose),
    ("{", TokenKind::CurlyOpen),
    ("}", TokenKind::CurlyClose),
    ("(", TokenKind::ParenOpen),
    (")", TokenKind::ParenClose),
    ("*", TokenKind::Asterisk),
    ("-", TokenKind::Dash),
];

/// A single token of a grammar source line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// The symbol name, the unescaped string contents, or the two bound
    /// characters of a value range.
    pub text: String,
    /// Parsed value of a number token; zero for every other kind.
    pub number: u32,
    pub loc: Loc,
}

/// Tokenizer over a single source line with one token of lookahead.
#[derive(Debug, Clone)]
pub struct Lexer {
    content: Vec<char>,
    file: String,
    row: usize,
    col: usize,
    peeked: Option<Token>,
}

impl Lexer {
    pub fn new(line: &str, file: &str, row: usize) -> Self {
        Lexer {
            content: line.chars().collect(),
            file: file.to_string(),
            row,
            col: 0,
            peeked: None,
        }
    }

    /// Location of the next unread character.
    pub fn loc(&self) -> Loc {
        Loc::new(self.file.clone(), self.row, self.col)
    }

    /// Consume and return the next token. Returns an EOL token, not an
    /// error, once the line is exhausted.
    pub fn next_token(&mut self) -> Result<Token, Diagnostic> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.chop_token(),
        }
    }

    /// Return the next token without consuming it, cached in a one-slot
    /// buffer.
    pub fn peek(&mut self) -> Result<Token, Diagnostic> {
        if let Some(token) = &self.peeked {
            return Ok(token.clone());
        }
        let token = self.chop_token()?;
        self.peeked = Some(token.clone());
        Ok(token)
    }

    /// Drop the buffered lookahead token, if any. The next read lexes
    /// fresh from the position after the dropped token, so the caller has
    /// effectively consumed it.
    pub fn reset_peek(&mut self) {
        self.peeked = None;
    }

    fn is_symbol_start(ch: char) -> bool {
        ch.is_alphabetic() || ch == '-' || ch == '_'
    }

    fn is_symbol_char(ch: char) -> bool {
        ch.is_alphanumeric() || ch == '-' || ch == '_'
    }

    fn trim(&mut self) {
        while self.col < self.content.len() && self.content[self.col].is_whitespace() {
            self.col += 1;
        }
    }

    fn starts_with(&self, prefix: &str) -> bool {
        let mut i = self.col;
        for ch in prefix.chars() {
            if i >= self.content.len() || self.content[i] != ch {
                return false;
            }
            i += 1;
        }
        true
    }

    fn chop_token(&mut self) -> Result<Token, Diagnostic> {
        self.trim();

        // A comment runs to the end of the line.
        if self.starts_with("//") || self.starts_with(";") {
            self.col = self.content.len();
        }

        let loc = self.loc();

        if self.col >= self.content.len() {
            return Ok(Token {
                kind: TokenKind::Eol,
                text: String::new(),
                number: 0,
                loc,
            });
        }

        let ch = self.content[self.col];

        if ch.is_ascii_digit() {
            let begin = self.col;
            while self.col < self.content.len() && self.content[self.col].is_ascii_digit() {
                self.col += 1;
            }
            let text: String = self.content[begin..self.col].iter().collect();
            let number = text
                .parse::<u32>()
                .map_err(|_| Diagnostic::new(loc.clone(), format!("number {text} is too large")))?;
            return Ok(Token {
                kind: TokenKind::Number,
                text,
                number,
                loc,
            });
        }

        if Self::is_symbol_start(ch) {
            let begin = self.col;
            while self.col < self.content.len() && Self::is_symbol_char(self.content[self.col]) {
                self.col += 1;
            }
            let text: String = self.content[begin..self.col].iter().collect();
            return Ok(Token {
                kind: TokenKind::Symbol,
                text,
                number: 0,
                loc,
            });
        }

        if ch == '<' {
            self.col += 1;
            let begin = self.col;
            while self.col < self.content.len() && self.content[self.col] != '>' {
                let ch = self.content[self.col];
                if !Self::is_symbol_char(ch) {
                    return Err(Diagnostic::new(
                        self.loc(),
                        format!("unexpected character {ch} in symbol name"),
                    ));
                }
                self.col += 1;
            }
            if self.col >= self.content.len() {
                return Err(Diagnostic::new(
                    self.loc(),
                    "expected > at the end of the symbol name",
                ));
            }
            let text: String = self.content[begin..self.col].iter().collect();
            self.col += 1;
            return Ok(Token {
                kind: TokenKind::Symbol,
                text,
                number: 0,
                loc,
            });
        }

        if ch == '"' || ch == '\'' {
            let text = self.chop_str_lit()?;
            return Ok(Token {
                kind: TokenKind::String,
                text,
                number: 0,
                loc,
            });
        }

        if self.starts_with("%x") {
            self.col += 2;
            let lower = self.chop_hex_byte()?;
            if self.col >= self.content.len() || self.content[self.col] != '-' {
                return Err(Diagnostic::new(
                    self.loc(),
                    "expected - between the boundaries of the value range",
                ));
            }
            self.col += 1;
            let upper = self.chop_hex_byte()?;
            let mut text = String::new();
            text.push(lower);
            text.push(upper);
            return Ok(Token {
                kind: TokenKind::ValueRange,
                text,
                number: 0,
                loc,
            });
        }

        for &(name, kind) in LITERAL_TOKENS {
            if self.starts_with(name) {
                self.col += name.chars().count();
                return Ok(Token {
                    kind,
                    text: name.to_string(),
                    number: 0,
                    loc,
                });
            }
        }

        Err(Diagnostic::new(loc, "invalid token"))
    }

    /// Unescape a quoted string literal. The opening delimiter may be `"`
    /// or `'`, and only the matching one needs escaping inside.
    fn chop_str_lit(&mut self) -> Result<String, Diagnostic> {
        let open_loc = self.loc();
        let quote = self.content[self.col];
        self.col += 1;

        let mut lit = String::new();
        while self.col < self.content.len() {
            let ch = self.content[self.col];
            if ch == quote {
                self.col += 1;
                return Ok(lit);
            }
            if ch == '\\' {
                if self.col + 1 >= self.content.len() {
                    return Err(Diagnostic::new(self.loc(), "unfinished escape sequence"));
                }
                self.col += 1;
                let esc = self.content[self.col];
                match esc {
                    'n' => lit.push('\n'),
                    'r' => lit.push('\r'),
                    '0' => lit.push('\0'),
                    '\\' => lit.push('\\'),
                    'x' => {
                        let mut value = 0u32;
                        for _ in 0..2 {
                            self.col += 1;
                            if self.col >= self.content.len() {
                                return Err(Diagnostic::new(
                                    self.loc(),
                                    "unfinished hex escape sequence",
                                ));
                            }
                            let digit = self.content[self.col];
                            match digit.to_digit(16) {
                                Some(d) => value = value * 16 + d,
                                None => {
                                    return Err(Diagnostic::new(
                                        self.loc(),
                                        format!(
                                            "expected a hex digit in escape sequence, but got {digit}"
                                        ),
                                    ));
                                }
                            }
                        }
                        lit.push(char::from(value as u8));
                    }
                    _ if esc == quote => lit.push(quote),
                    _ => {
                        return Err(Diagnostic::new(
                            self.loc(),
                            format!("unknown escape sequence starting with {esc}"),
                        ));
                    }
                }
            } else {
                lit.push(ch);
            }
            self.col += 1;
        }

        Err(Diagnostic::new(
            open_loc,
            format!("expected {quote} at the end of this string literal"),
        ))
    }

    /// Two hex digits making up one bound of a `%xHH-HH` value range.
    fn chop_hex_byte(&mut self) -> Result<char, Diagnostic> {
        let mut value = 0u32;
        for _ in 0..2 {
            if self.col >= self.content.len() {
                return Err(Diagnostic::new(
                    self.loc(),
                    "expected a hex digit in the value range",
                ));
            }
            let digit = self.content[self.col];
            match digit.to_digit(16) {
                Some(d) => value = value * 16 + d,
                None => {
                    return Err(Diagnostic::new(
                        self.loc(),
                        format!("expected a hex digit in the value range, but got {digit}"),
                    ));
                }
            }
            self.col += 1;
        }
        Ok(char::from(value as u8))
    }
}
