use super::token::{Token, TokenKind};
use crate::error::{Error, Result};

/// Scanner for VeLa source text
pub struct Scanner {
    /// Source code as character vector
    source: Vec<char>,
    /// Accumulated tokens
    tokens: Vec<Token>,
    /// Start position of current token
    start: usize,
    /// Current position in source
    current: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column (0-indexed)
    column: usize,
    /// Line and column where the current token began
    start_line: usize,
    start_column: usize,
}

impl Scanner {
    /// Creates a new scanner from source code
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            column: 0,
            start_line: 1,
            start_column: 0,
        }
    }

    /// Scans all tokens from source code and returns them as a vector
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_column = self.column;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            self.line,
            self.column,
        ));

        Ok(std::mem::take(&mut self.tokens))
    }

    fn scan_token(&mut self) -> Result<()> {
        let c = self.advance();

        match c {
            ' ' | '\t' | '\n' | '\r' | '\u{000C}' => {}

            '#' => self.skip_line_comment(),

            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            '[' => self.add_token(TokenKind::LeftBracket),
            ']' => self.add_token(TokenKind::RightBracket),
            ',' => self.add_token(TokenKind::Comma),
            ':' => self.add_token(TokenKind::Colon),

            '+' => self.add_token(TokenKind::Plus),
            '*' => self.add_token(TokenKind::Star),
            '/' => self.add_token(TokenKind::Slash),
            '^' => self.add_token(TokenKind::Caret),
            '-' => {
                if self.match_char('-') {
                    self.skip_line_comment();
                } else if self.match_char('>') {
                    self.add_token(TokenKind::Arrow);
                } else {
                    self.add_token(TokenKind::Minus);
                }
            }
            '=' => {
                if self.match_char('~') {
                    self.add_token(TokenKind::Match);
                } else {
                    self.add_token(TokenKind::Equal);
                }
            }
            '<' => {
                if self.match_char('-') {
                    self.add_token(TokenKind::Bind);
                } else if self.match_char('=') {
                    self.add_token(TokenKind::LessEqual);
                } else if self.match_char('>') {
                    self.add_token(TokenKind::NotEqual);
                } else if self.match_char('<') {
                    if self.block_comment_closes() {
                        self.skip_block_comment();
                    } else {
                        self.add_token(TokenKind::ShiftLeft);
                    }
                } else {
                    self.add_token(TokenKind::Less);
                }
            }
            '>' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::GreaterEqual);
                } else if self.match_char('>') {
                    self.add_token(TokenKind::ShiftRight);
                } else {
                    self.add_token(TokenKind::Greater);
                }
            }

            '"' => self.scan_string()?,

            c if c.is_ascii_digit() => self.scan_number()?,
            '.' if self.peek().is_ascii_digit() => self.scan_number()?,

            c if c.is_alphabetic() || c == '_' => self.scan_identifier_or_keyword(),

            _ => return Err(self.lexical_error(format!("unexpected character '{}'", c))),
        }

        Ok(())
    }

    fn skip_line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' && self.peek() != '\r' {
            self.advance();
        }
    }

    /// True if a `>>` appears anywhere after the current position
    fn block_comment_closes(&self) -> bool {
        self.source[self.current..]
            .windows(2)
            .any(|pair| pair == ['>', '>'])
    }

    /// Skips `<< ... >>`; the opening `<<` is already consumed and the
    /// closing `>>` is known to exist
    fn skip_block_comment(&mut self) {
        while !self.is_at_end() {
            if self.peek() == '>' && self.peek_next() == '>' {
                self.advance();
                self.advance();
                return;
            }
            self.advance();
        }
    }

    fn scan_string(&mut self) -> Result<()> {
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != '"' {
            value.push(self.advance());
        }

        if self.is_at_end() {
            return Err(self.lexical_error("unterminated string literal"));
        }

        self.advance(); // Closing "

        self.add_token(TokenKind::String(value));
        Ok(())
    }

    fn scan_number(&mut self) -> Result<()> {
        let first = self.source[self.start];

        if first == '0' && matches!(self.peek(), 'x' | 'X') && self.peek_next().is_ascii_hexdigit()
        {
            self.advance();
            return self.scan_radix_integer(16);
        }
        if first == '0' && matches!(self.peek(), 'b' | 'B') && matches!(self.peek_next(), '0' | '1')
        {
            self.advance();
            return self.scan_radix_integer(2);
        }

        let mut is_real = first == '.';
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if !is_real && self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_real = true;
            self.advance(); // consume .
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        if matches!(self.peek(), 'e' | 'E') {
            let signed = matches!(self.peek_next(), '+' | '-');
            let digit_at = if signed { 2 } else { 1 };
            if self
                .source
                .get(self.current + digit_at)
                .is_some_and(|c| c.is_ascii_digit())
            {
                is_real = true;
                for _ in 0..digit_at {
                    self.advance();
                }
                while self.peek().is_ascii_digit() {
                    self.advance();
                }
            }
        }

        let text: String = self.source[self.start..self.current].iter().collect();

        if is_real {
            let value: f64 = text
                .parse()
                .map_err(|_| self.lexical_error(format!("invalid real literal {}", text)))?;
            self.add_token(TokenKind::Real(value));
        } else {
            let value: i64 = text
                .parse()
                .map_err(|_| self.lexical_error(format!("integer literal {} out of range", text)))?;
            self.add_token(TokenKind::Integer(value));
        }

        Ok(())
    }

    fn scan_radix_integer(&mut self, radix: u32) -> Result<()> {
        let digits_start = self.current;
        while self.peek().is_digit(radix) {
            self.advance();
        }
        let digits: String = self.source[digits_start..self.current].iter().collect();
        let value = i64::from_str_radix(&digits, radix).map_err(|_| {
            let text: String = self.source[self.start..self.current].iter().collect();
            self.lexical_error(format!("integer literal {} out of range", text))
        })?;
        self.add_token(TokenKind::Integer(value));
        Ok(())
    }

    fn scan_identifier_or_keyword(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();

        let token_kind = TokenKind::keyword(&text)
            .unwrap_or_else(|| TokenKind::Identifier(text.to_ascii_uppercase()));

        self.add_token(token_kind);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        match c {
            '\n' => self.new_line(),
            // A lone \r ends a line; in \r\n the \n does
            '\r' if self.peek() != '\n' => self.new_line(),
            '\r' => {}
            _ => self.column += 1,
        }
        c
    }

    fn new_line(&mut self) {
        self.line += 1;
        self.column = 0;
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            '\0'
        } else {
            self.source[self.current + 1]
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme: String = self.source[self.start..self.current].iter().collect();
        self.tokens.push(Token::new(
            kind,
            lexeme,
            self.start_line,
            self.start_column,
        ));
    }

    fn lexical_error(&self, message: impl Into<String>) -> Error {
        Error::LexicalError {
            line: self.start_line,
            col: self.start_column,
            message: message.into(),
        }
    }
}
