/// Single-pass O(n) lexer for Tidal source code.
use crate::ast::Span;
use crate::error::ParseError;
use crate::token::{keyword, Token, TokenKind};

pub struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
        let mut lexer = Lexer {
            source: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        };
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token()?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> u8 {
        let ch = self.source[self.pos];
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        ch
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            col: self.col,
        }
    }

    /// Length of a long bracket opener (`[[`, `[==[`) at the cursor, as its level.
    fn long_bracket_level(&self) -> Option<usize> {
        if self.peek() != Some(b'[') {
            return None;
        }
        let mut level = 0;
        while self.peek_at(1 + level) == Some(b'=') {
            level += 1;
        }
        (self.peek_at(1 + level) == Some(b'[')).then_some(level)
    }

    fn read_long_bracket(&mut self, level: usize, sp: &Span) -> Result<String, ParseError> {
        for _ in 0..level + 2 {
            self.advance();
        }
        let start = self.pos;
        loop {
            match self.peek() {
                None => {
                    return Err(ParseError::new("unterminated long bracket", sp.line, sp.col));
                }
                Some(b']') => {
                    let closes = (1..=level).all(|i| self.peek_at(i) == Some(b'='))
                        && self.peek_at(level + 1) == Some(b']');
                    if closes {
                        let text = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
                        for _ in 0..level + 2 {
                            self.advance();
                        }
                        return Ok(text);
                    }
                    self.advance();
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => {
                    self.advance();
                }
                Some(b'-') if self.peek_at(1) == Some(b'-') => {
                    let sp = self.span();
                    self.advance();
                    self.advance();
                    if let Some(level) = self.long_bracket_level() {
                        self.read_long_bracket(level, &sp)?;
                    } else {
                        while let Some(ch) = self.peek() {
                            if ch == b'\n' {
                                break;
                            }
                            self.advance();
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace_and_comments()?;

        let sp = self.span();
        let start = self.pos;

        let Some(ch) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                span: sp,
                lexeme: String::new(),
            });
        };

        if ch.is_ascii_alphabetic() || ch == b'_' {
            while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
                self.advance();
            }
            let lexeme = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
            let kind = keyword(&lexeme).unwrap_or(TokenKind::Ident);
            return Ok(Token { kind, span: sp, lexeme });
        }

        if ch.is_ascii_digit() || (ch == b'.' && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit())) {
            return self.read_number(sp);
        }

        if ch == b'"' || ch == b'\'' {
            return self.read_string(ch, sp);
        }

        if let Some(level) = self.long_bracket_level() {
            let text = self.read_long_bracket(level, &sp)?;
            return Ok(Token {
                kind: TokenKind::StringLit,
                span: sp,
                lexeme: text,
            });
        }

        let (kind, len) = match (ch, self.peek_at(1), self.peek_at(2)) {
            (b'.', Some(b'.'), Some(b'.')) => (TokenKind::Ellipsis, 3),
            (b'.', Some(b'.'), Some(b'=')) => (TokenKind::DotDotAssign, 3),
            (b'/', Some(b'/'), Some(b'=')) => (TokenKind::SlashSlashAssign, 3),
            (b'.', Some(b'.'), _) => (TokenKind::DotDot, 2),
            (b'/', Some(b'/'), _) => (TokenKind::SlashSlash, 2),
            (b'=', Some(b'='), _) => (TokenKind::EqEq, 2),
            (b'~', Some(b'='), _) => (TokenKind::Neq, 2),
            (b'<', Some(b'='), _) => (TokenKind::Le, 2),
            (b'>', Some(b'='), _) => (TokenKind::Ge, 2),
            (b'+', Some(b'='), _) => (TokenKind::PlusAssign, 2),
            (b'-', Some(b'='), _) => (TokenKind::MinusAssign, 2),
            (b'*', Some(b'='), _) => (TokenKind::StarAssign, 2),
            (b'/', Some(b'='), _) => (TokenKind::SlashAssign, 2),
            (b'%', Some(b'='), _) => (TokenKind::PercentAssign, 2),
            (b'^', Some(b'='), _) => (TokenKind::CaretAssign, 2),
            (b'+', _, _) => (TokenKind::Plus, 1),
            (b'-', _, _) => (TokenKind::Minus, 1),
            (b'*', _, _) => (TokenKind::Star, 1),
            (b'/', _, _) => (TokenKind::Slash, 1),
            (b'%', _, _) => (TokenKind::Percent, 1),
            (b'^', _, _) => (TokenKind::Caret, 1),
            (b'#', _, _) => (TokenKind::Hash, 1),
            (b'<', _, _) => (TokenKind::Lt, 1),
            (b'>', _, _) => (TokenKind::Gt, 1),
            (b'=', _, _) => (TokenKind::Assign, 1),
            (b'.', _, _) => (TokenKind::Dot, 1),
            (b'(', _, _) => (TokenKind::LParen, 1),
            (b')', _, _) => (TokenKind::RParen, 1),
            (b'[', _, _) => (TokenKind::LBracket, 1),
            (b']', _, _) => (TokenKind::RBracket, 1),
            (b'{', _, _) => (TokenKind::LBrace, 1),
            (b'}', _, _) => (TokenKind::RBrace, 1),
            (b',', _, _) => (TokenKind::Comma, 1),
            (b':', _, _) => (TokenKind::Colon, 1),
            (b';', _, _) => (TokenKind::Semicolon, 1),
            _ => {
                return Err(ParseError::new(
                    format!("unexpected character `{}`", ch as char),
                    sp.line,
                    sp.col,
                ))
            }
        };
        for _ in 0..len {
            self.advance();
        }
        let lexeme = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
        Ok(Token { kind, span: sp, lexeme })
    }

    fn read_number(&mut self, sp: Span) -> Result<Token, ParseError> {
        let start = self.pos;
        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x' | b'X')) {
            self.advance();
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit() || c == b'_') {
                self.advance();
            }
        } else {
            while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == b'_' || c == b'.') {
                self.advance();
            }
            if matches!(self.peek(), Some(b'e' | b'E')) {
                self.advance();
                if matches!(self.peek(), Some(b'+' | b'-')) {
                    self.advance();
                }
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }
        let lexeme = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
        if parse_number(&lexeme).is_none() {
            return Err(ParseError::new(
                format!("malformed number `{}`", lexeme),
                sp.line,
                sp.col,
            ));
        }
        Ok(Token {
            kind: TokenKind::Number,
            span: sp,
            lexeme,
        })
    }

    fn read_string(&mut self, quote: u8, sp: Span) -> Result<Token, ParseError> {
        self.advance();
        let mut bytes = Vec::new();
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    return Err(ParseError::new("unterminated string", sp.line, sp.col));
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some(b'\\') => {
                    self.advance();
                    let Some(esc) = self.peek() else {
                        return Err(ParseError::new("unterminated string", sp.line, sp.col));
                    };
                    self.advance();
                    match esc {
                        b'n' => bytes.push(b'\n'),
                        b't' => bytes.push(b'\t'),
                        b'r' => bytes.push(b'\r'),
                        b'0' => bytes.push(0),
                        b'\\' => bytes.push(b'\\'),
                        b'"' => bytes.push(b'"'),
                        b'\'' => bytes.push(b'\''),
                        b'\n' => bytes.push(b'\n'),
                        other => {
                            return Err(ParseError::new(
                                format!("invalid escape sequence `\\{}`", other as char),
                                self.line,
                                self.col,
                            ))
                        }
                    }
                }
                Some(_) => bytes.push(self.advance()),
            }
        }
        Ok(Token {
            kind: TokenKind::StringLit,
            span: sp,
            lexeme: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

/// Numeric literal value; `None` when malformed.
pub fn parse_number(lexeme: &str) -> Option<f64> {
    let cleaned: String = lexeme.chars().filter(|&c| c != '_').collect();
    if let Some(hex) = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).ok().map(|v| v as f64);
    }
    cleaned.parse::<f64>().ok()
}
