//! Tokenizer for config modules.
//!
//! There is no division operator in the supported subset, so a `/` that does
//! not open a comment always opens a regex literal.

use crate::error::ScriptError;

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Number(f64),
    Str(String),
    Regex { pattern: String, flags: String },
    Punct(Punct),
    Eof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Punct {
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
    FatArrow,
    Assign,
    Bang,
    Minus,
    StrictEq,
    StrictNe,
    LooseEq,
    LooseNe,
    Lt,
    Lte,
    Gt,
    Gte,
    AndAnd,
    OrOr,
    Question,
}

#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

pub struct Lexer {
    chars: Vec<char>,
    idx: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            idx: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the whole input, ending with a single `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, ScriptError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = matches!(tok.kind, TokenKind::Eof);
            tokens.push(tok);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.idx + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.idx).copied()?;
        self.idx += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::syntax(self.line, self.column, message)
    }

    fn skip_trivia(&mut self) -> Result<(), ScriptError> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                (Some('/'), Some('*')) => {
                    self.bump();
                    self.bump();
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some('*'), Some('/')) => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            (Some(_), _) => {
                                self.bump();
                            }
                            (None, _) => return Err(self.error("unterminated block comment")),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ScriptError> {
        self.skip_trivia()?;
        let line = self.line;
        let column = self.column;
        let kind = match self.peek() {
            None => TokenKind::Eof,
            Some(c) if c.is_ascii_digit() => self.lex_number()?,
            Some('.') if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.lex_number()?
            }
            Some(c) if is_ident_start(c) => self.lex_ident(),
            Some(q @ ('\'' | '"' | '`')) => self.lex_string(q)?,
            Some('/') => self.lex_regex()?,
            Some(_) => TokenKind::Punct(self.lex_punct()?),
        };
        Ok(Token { kind, line, column })
    }

    fn lex_ident(&mut self) -> TokenKind {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if !is_ident_continue(c) {
                break;
            }
            name.push(c);
            self.bump();
        }
        TokenKind::Ident(name)
    }

    fn lex_number(&mut self) -> Result<TokenKind, ScriptError> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '+' || c == '-') && text.ends_with(['e', 'E']);
            if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || c == '_' || exponent_sign
            {
                if c != '_' {
                    text.push(c);
                }
                self.bump();
            } else {
                break;
            }
        }
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| self.error(format!("invalid number literal `{}`", text)))
    }

    fn lex_string(&mut self, quote: char) -> Result<TokenKind, ScriptError> {
        self.bump();
        let mut value = String::new();
        loop {
            let c = match self.bump() {
                Some(c) => c,
                None => return Err(self.error("unterminated string literal")),
            };
            if c == quote {
                return Ok(TokenKind::Str(value));
            }
            match c {
                '\n' if quote != '`' => return Err(self.error("unterminated string literal")),
                '$' if quote == '`' && self.peek() == Some('{') => {
                    return Err(self.error("template literal substitutions are not supported"));
                }
                '\\' => value.push(self.lex_escape()?),
                _ => value.push(c),
            }
        }
    }

    fn lex_escape(&mut self) -> Result<char, ScriptError> {
        let c = self
            .bump()
            .ok_or_else(|| self.error("unterminated escape sequence"))?;
        Ok(match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            'u' => {
                let mut hex = String::new();
                if self.peek() == Some('{') {
                    self.bump();
                    while let Some(h) = self.bump() {
                        if h == '}' {
                            break;
                        }
                        hex.push(h);
                    }
                } else {
                    for _ in 0..4 {
                        if let Some(h) = self.bump() {
                            hex.push(h);
                        }
                    }
                }
                u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| self.error(format!("invalid unicode escape `\\u{}`", hex)))?
            }
            other => other,
        })
    }

    fn lex_regex(&mut self) -> Result<TokenKind, ScriptError> {
        self.bump();
        let mut pattern = String::new();
        let mut in_class = false;
        loop {
            let c = match self.bump() {
                Some('\n') | None => return Err(self.error("unterminated regex literal")),
                Some(c) => c,
            };
            match c {
                '\\' => {
                    pattern.push(c);
                    if let Some(next) = self.bump() {
                        pattern.push(next);
                    }
                }
                '[' => {
                    in_class = true;
                    pattern.push(c);
                }
                ']' => {
                    in_class = false;
                    pattern.push(c);
                }
                '/' if !in_class => break,
                _ => pattern.push(c),
            }
        }
        let mut flags = String::new();
        while let Some(c) = self.peek() {
            if !c.is_ascii_alphabetic() {
                break;
            }
            flags.push(c);
            self.bump();
        }
        Ok(TokenKind::Regex { pattern, flags })
    }

    fn lex_punct(&mut self) -> Result<Punct, ScriptError> {
        let c = self.bump().ok_or_else(|| self.error("unexpected end of input"))?;
        let punct = match c {
            '(' => Punct::LParen,
            ')' => Punct::RParen,
            '{' => Punct::LBrace,
            '}' => Punct::RBrace,
            '[' => Punct::LBracket,
            ']' => Punct::RBracket,
            ',' => Punct::Comma,
            ':' => Punct::Colon,
            ';' => Punct::Semi,
            '.' => Punct::Dot,
            '?' => Punct::Question,
            '-' => Punct::Minus,
            '=' => match (self.peek(), self.peek_at(1)) {
                (Some('='), Some('=')) => {
                    self.bump();
                    self.bump();
                    Punct::StrictEq
                }
                (Some('='), _) => {
                    self.bump();
                    Punct::LooseEq
                }
                (Some('>'), _) => {
                    self.bump();
                    Punct::FatArrow
                }
                _ => Punct::Assign,
            },
            '!' => match (self.peek(), self.peek_at(1)) {
                (Some('='), Some('=')) => {
                    self.bump();
                    self.bump();
                    Punct::StrictNe
                }
                (Some('='), _) => {
                    self.bump();
                    Punct::LooseNe
                }
                _ => Punct::Bang,
            },
            '<' => self.with_eq(Punct::Lt, Punct::Lte),
            '>' => self.with_eq(Punct::Gt, Punct::Gte),
            '&' if self.peek() == Some('&') => {
                self.bump();
                Punct::AndAnd
            }
            '|' if self.peek() == Some('|') => {
                self.bump();
                Punct::OrOr
            }
            other => return Err(self.error(format!("unexpected character `{}`", other))),
        };
        Ok(punct)
    }

    fn with_eq(&mut self, bare: Punct, with_eq: Punct) -> Punct {
        if self.peek() == Some('=') {
            self.bump();
            with_eq
        } else {
            bare
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_arrow_and_method_call() {
        let tokens = kinds("name => name.endsWith('tag')");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Ident("name".into()),
                TokenKind::Punct(Punct::FatArrow),
                TokenKind::Ident("name".into()),
                TokenKind::Punct(Punct::Dot),
                TokenKind::Ident("endsWith".into()),
                TokenKind::Punct(Punct::LParen),
                TokenKind::Str("tag".into()),
                TokenKind::Punct(Punct::RParen),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comparison_operators() {
        let tokens = kinds("a === b !== c == d != e <= f");
        assert!(tokens.contains(&TokenKind::Punct(Punct::StrictEq)));
        assert!(tokens.contains(&TokenKind::Punct(Punct::StrictNe)));
        assert!(tokens.contains(&TokenKind::Punct(Punct::LooseEq)));
        assert!(tokens.contains(&TokenKind::Punct(Punct::LooseNe)));
        assert!(tokens.contains(&TokenKind::Punct(Punct::Lte)));
    }

    #[test]
    fn test_regex_literal_with_class_slash() {
        let tokens = kinds("/^@types[/]x/i");
        assert_eq!(
            tokens[0],
            TokenKind::Regex {
                pattern: "^@types[/]x".into(),
                flags: "i".into()
            }
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = kinds("// leading\n/* block\n comment */ true");
        assert_eq!(tokens, vec![TokenKind::Ident("true".into()), TokenKind::Eof]);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = kinds(r#""a\"b\nA""#);
        assert_eq!(tokens[0], TokenKind::Str("a\"b\nA".into()));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42")[0], TokenKind::Number(42.0));
        assert_eq!(kinds("1.5e3")[0], TokenKind::Number(1500.0));
    }

    #[test]
    fn test_unterminated_string_reports_position() {
        let err = Lexer::new("\n  'abc").tokenize().unwrap_err();
        match err {
            ScriptError::Syntax { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_template_substitution_rejected() {
        assert!(Lexer::new("`a${b}`").tokenize().is_err());
    }
}
