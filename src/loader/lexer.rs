//! Tokenizer for `.proto` sources.
//!
//! Produces a flat token stream with line/column positions; the parser owns
//! all grammar decisions, including assembling dotted names from `.` symbols.

use crate::error::LoadDiagnostic;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    /// Identifier or keyword. The lexer does not distinguish them.
    Ident(String),
    /// Unsigned integer literal. The parser applies any leading `-`.
    Int(u64),
    Float(f64),
    Str(String),
    /// Single punctuation character: `{ } ( ) [ ] < > = ; , . -`.
    Symbol(char),
    Eof,
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub column: u32,
}

const SYMBOLS: &[char] = &['{', '}', '(', ')', '[', ']', '<', '>', '=', ';', ',', '.', '-'];

/// Tokenize one source file. The stream always ends with an `Eof` token so
/// the parser never indexes past the end.
pub(crate) fn tokenize(file: &str, source: &str) -> (Vec<Token>, Vec<LoadDiagnostic>) {
    let mut lexer = Lexer {
        file,
        chars: source.chars().collect(),
        pos: 0,
        line: 1,
        column: 1,
        tokens: Vec::new(),
        diagnostics: Vec::new(),
    };
    lexer.run();
    (lexer.tokens, lexer.diagnostics)
}

struct Lexer<'a> {
    file: &'a str,
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    tokens: Vec<Token>,
    diagnostics: Vec<LoadDiagnostic>,
}

impl Lexer<'_> {
    fn run(&mut self) {
        while let Some(c) = self.peek() {
            let (line, column) = (self.line, self.column);
            match c {
                c if c.is_whitespace() => {
                    self.bump();
                }
                '/' if self.peek_at(1) == Some('/') => self.skip_line_comment(),
                '/' if self.peek_at(1) == Some('*') => self.skip_block_comment(),
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let ident = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
                    self.push(TokenKind::Ident(ident), line, column);
                }
                c if c.is_ascii_digit() => self.lex_number(line, column),
                '"' | '\'' => self.lex_string(c, line, column),
                c if SYMBOLS.contains(&c) => {
                    self.bump();
                    self.push(TokenKind::Symbol(c), line, column);
                }
                c => {
                    self.bump();
                    self.diagnostics.push(LoadDiagnostic::new(
                        self.file,
                        line,
                        column,
                        format!("unexpected character '{c}'"),
                    ));
                }
            }
        }
        let (line, column) = (self.line, self.column);
        self.push(TokenKind::Eof, line, column);
    }

    fn lex_number(&mut self, line: u32, column: u32) {
        let mut text = self.take_while(|c| c.is_ascii_digit());
        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.bump();
            text.push('.');
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            text.push(self.bump().unwrap_or('e'));
            if matches!(self.peek(), Some('+' | '-')) {
                text.push(self.bump().unwrap_or('+'));
            }
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }

        let kind = if is_float {
            match text.parse::<f64>() {
                Ok(value) => TokenKind::Float(value),
                Err(_) => {
                    self.diagnostics.push(LoadDiagnostic::new(
                        self.file,
                        line,
                        column,
                        format!("invalid float literal '{text}'"),
                    ));
                    return;
                }
            }
        } else {
            match text.parse::<u64>() {
                Ok(value) => TokenKind::Int(value),
                Err(_) => {
                    self.diagnostics.push(LoadDiagnostic::new(
                        self.file,
                        line,
                        column,
                        format!("integer literal '{text}' out of range"),
                    ));
                    return;
                }
            }
        };
        self.push(kind, line, column);
    }

    fn lex_string(&mut self, quote: char, line: u32, column: u32) {
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => break,
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some(c) => text.push(c),
                    None => break,
                },
                Some('\n') | None => {
                    self.diagnostics.push(LoadDiagnostic::new(
                        self.file,
                        line,
                        column,
                        "unterminated string literal",
                    ));
                    return;
                }
                Some(c) => text.push(c),
            }
        }
        self.push(TokenKind::Str(text), line, column);
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let (line, column) = (self.line, self.column);
        self.bump();
        self.bump();
        loop {
            match self.bump() {
                Some('*') if self.peek() == Some('/') => {
                    self.bump();
                    return;
                }
                Some(_) => {}
                None => {
                    self.diagnostics.push(LoadDiagnostic::new(
                        self.file,
                        line,
                        column,
                        "unterminated block comment",
                    ));
                    return;
                }
            }
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            text.push(c);
            self.bump();
        }
        text
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn push(&mut self, kind: TokenKind, line: u32, column: u32) {
        self.tokens.push(Token { kind, line, column });
    }
}
