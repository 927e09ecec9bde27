// CQL Lexer Implementation
//
// Breaks CQL text into tokens. Lines and columns are 1-based; the end of
// input is reported one column past the last character.

use std::collections::HashMap;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use once_cell::sync::Lazy;

use super::error::{ParseResult, SyntaxError};

/// CQL token types
#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    // Keywords
    AND,
    OR,
    NOT,
    BETWEEN,
    LIKE,
    ILIKE,
    IN,
    IS,
    NULL,
    TRUE,
    FALSE,
    INCLUDE,
    EXCLUDE,

    // Literals
    STRING(String),
    INTEGER(i64),
    FLOAT(f64),

    // Identifiers
    IDENTIFIER(String),
    QUOTED(String), // [name]

    // Operators
    EQUALS,       // =
    NotEqual,     // <> or !=
    LessThan,     // <
    LessEqual,    // <=
    GreaterThan,  // >
    GreaterEqual, // >=
    PLUS,         // +
    MINUS,        // -
    MULTIPLY,     // *
    DIVIDE,       // /

    // Punctuation
    COMMA,      // ,
    LeftParen,  // (
    RightParen, // )

    EOF,
}

static KEYWORDS: Lazy<HashMap<&'static str, TokenType>> = Lazy::new(|| {
    HashMap::from([
        ("AND", TokenType::AND),
        ("OR", TokenType::OR),
        ("NOT", TokenType::NOT),
        ("BETWEEN", TokenType::BETWEEN),
        ("LIKE", TokenType::LIKE),
        ("ILIKE", TokenType::ILIKE),
        ("IN", TokenType::IN),
        ("IS", TokenType::IS),
        ("NULL", TokenType::NULL),
        ("TRUE", TokenType::TRUE),
        ("FALSE", TokenType::FALSE),
        ("INCLUDE", TokenType::INCLUDE),
        ("EXCLUDE", TokenType::EXCLUDE),
    ])
});

/// A lexical unit with its source position
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub literal: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    fn new(token_type: TokenType, literal: impl Into<String>, line: usize, column: usize) -> Self {
        Token {
            token_type,
            literal: literal.into(),
            line,
            column,
        }
    }

    /// How the token is named in error messages
    pub fn describe(&self) -> String {
        match self.token_type {
            TokenType::EOF => "<EOF>".to_string(),
            _ => format!("\"{}\"", self.literal),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}({})", self.token_type, self.literal)
    }
}

/// CQL lexer over a query string
pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    ch: Option<char>,
    started: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer {
            input: input.chars().peekable(),
            line: 1,
            column: 0,
            ch: None,
            started: false,
        };
        lexer.read_char();
        lexer
    }

    /// Advance to the next character, keeping `line`/`column` on `ch`
    fn read_char(&mut self) {
        match self.ch {
            Some('\n') => {
                self.line += 1;
                self.column = 1;
            }
            Some(_) => self.column += 1,
            None if !self.started => self.column = 1,
            None => {}
        }
        self.started = true;
        self.ch = self.input.next();
    }

    fn peek_char(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.ch {
            if ch.is_whitespace() {
                self.read_char();
            } else {
                break;
            }
        }
    }

    fn single(&mut self, token_type: TokenType, literal: &str, line: usize, column: usize) -> Token {
        self.read_char();
        Token::new(token_type, literal, line, column)
    }

    fn read_identifier(&mut self, line: usize, column: usize) -> Token {
        let mut identifier = String::new();
        while let Some(ch) = self.ch {
            if is_letter(ch) || ch.is_ascii_digit() {
                identifier.push(ch);
                self.read_char();
            } else {
                break;
            }
        }
        let token_type = KEYWORDS
            .get(identifier.to_ascii_uppercase().as_str())
            .cloned()
            .unwrap_or_else(|| TokenType::IDENTIFIER(identifier.clone()));
        Token::new(token_type, identifier, line, column)
    }

    /// Whether the exponent marker at `ch` is followed by an exponent
    fn exponent_follows(&self) -> bool {
        let mut ahead = self.input.clone();
        match ahead.next() {
            Some(c) if c.is_ascii_digit() => true,
            Some('+') | Some('-') => matches!(ahead.next(), Some(c) if c.is_ascii_digit()),
            _ => false,
        }
    }

    fn read_number(&mut self, line: usize, column: usize) -> ParseResult<Token> {
        let mut number = String::new();
        let mut is_float = false;

        while let Some(ch) = self.ch.filter(|c| c.is_ascii_digit()) {
            number.push(ch);
            self.read_char();
        }
        if self.ch == Some('.') {
            is_float = true;
            number.push('.');
            self.read_char();
            while let Some(ch) = self.ch.filter(|c| c.is_ascii_digit()) {
                number.push(ch);
                self.read_char();
            }
        }
        if matches!(self.ch, Some('e') | Some('E')) && self.exponent_follows() {
            is_float = true;
            number.push('e');
            self.read_char();
            if let Some(sign) = self.ch.filter(|c| *c == '+' || *c == '-') {
                number.push(sign);
                self.read_char();
            }
            while let Some(ch) = self.ch.filter(|c| c.is_ascii_digit()) {
                number.push(ch);
                self.read_char();
            }
        }

        let token_type = if is_float {
            number.parse::<f64>().map(TokenType::FLOAT).ok()
        } else {
            // integers past the i64 range read as floats
            number
                .parse::<i64>()
                .map(TokenType::INTEGER)
                .or_else(|_| number.parse::<f64>().map(TokenType::FLOAT))
                .ok()
        };
        match token_type {
            Some(token_type) => Ok(Token::new(token_type, number, line, column)),
            None => Err(SyntaxError::lexical(
                line,
                column,
                "numeric literal out of range",
                format!("\"{}\"", number),
                "",
            )),
        }
    }

    /// Read a quoted run; `''` inside a string stands for one quote
    fn read_delimited(
        &mut self,
        close: char,
        what: &str,
        line: usize,
        column: usize,
    ) -> ParseResult<(String, String)> {
        let mut image = String::new();
        let mut value = String::new();
        if let Some(open) = self.ch {
            image.push(open);
        }
        self.read_char();

        loop {
            match self.ch {
                None => {
                    return Err(SyntaxError::lexical(
                        self.line,
                        self.column,
                        format!("unterminated {}", what),
                        "<EOF>",
                        image,
                    ));
                }
                Some(c) if c == close => {
                    image.push(c);
                    self.read_char();
                    if close == '\'' && self.ch == Some('\'') {
                        image.push('\'');
                        value.push('\'');
                        self.read_char();
                        continue;
                    }
                    break;
                }
                Some(c) => {
                    image.push(c);
                    value.push(c);
                    self.read_char();
                }
            }
        }

        if close == ']' && value.trim().is_empty() {
            return Err(SyntaxError::lexical(line, column, "empty quoted identifier", "\"]\"", "["));
        }
        Ok((value, image))
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> ParseResult<Token> {
        self.skip_whitespace();
        let (line, column) = (self.line, self.column);

        let ch = match self.ch {
            Some(ch) => ch,
            None => return Ok(Token::new(TokenType::EOF, "", line, column)),
        };

        let token = match ch {
            ',' => self.single(TokenType::COMMA, ",", line, column),
            '(' => self.single(TokenType::LeftParen, "(", line, column),
            ')' => self.single(TokenType::RightParen, ")", line, column),
            '+' => self.single(TokenType::PLUS, "+", line, column),
            '-' => self.single(TokenType::MINUS, "-", line, column),
            '*' => self.single(TokenType::MULTIPLY, "*", line, column),
            '/' => self.single(TokenType::DIVIDE, "/", line, column),
            '=' => self.single(TokenType::EQUALS, "=", line, column),
            '<' => match self.peek_char() {
                Some('=') => {
                    self.read_char();
                    self.single(TokenType::LessEqual, "<=", line, column)
                }
                Some('>') => {
                    self.read_char();
                    self.single(TokenType::NotEqual, "<>", line, column)
                }
                _ => self.single(TokenType::LessThan, "<", line, column),
            },
            '>' => match self.peek_char() {
                Some('=') => {
                    self.read_char();
                    self.single(TokenType::GreaterEqual, ">=", line, column)
                }
                _ => self.single(TokenType::GreaterThan, ">", line, column),
            },
            '!' if self.peek_char() == Some('=') => {
                self.read_char();
                self.single(TokenType::NotEqual, "!=", line, column)
            }
            '\'' => {
                let (value, image) = self.read_delimited('\'', "string literal", line, column)?;
                Token::new(TokenType::STRING(value), image, line, column)
            }
            '[' => {
                let (value, image) = self.read_delimited(']', "quoted identifier", line, column)?;
                Token::new(TokenType::QUOTED(value), image, line, column)
            }
            c if is_letter(c) => self.read_identifier(line, column),
            c if c.is_ascii_digit() => self.read_number(line, column)?,
            '.' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number(line, column)?
            }
            other => {
                return Err(SyntaxError::lexical(
                    line,
                    column,
                    "illegal character",
                    format!("\"{}\"", other),
                    "",
                ));
            }
        };
        Ok(token)
    }
}

fn is_letter(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

/// Tokenize a whole query, ending with an EOF token
pub fn tokenize(input: &str) -> ParseResult<Vec<Token>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_eof = token.token_type == TokenType::EOF;
        tokens.push(token);
        if is_eof {
            return Ok(tokens);
        }
    }
}
