//! Tokenizer for declaration files.

use crate::ast::Position;
use crate::error::DeclarationError;

/// Lexer token produced from declaration input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    /// Identifier, including keywords.
    Ident(&'a str),
    /// String literal body, escapes not yet processed.
    Str(&'a str),
    /// Numeric literal text.
    Number(&'a str),
    /// `=`
    Eq,
    /// `;`
    Semi,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `?`
    Question,
    /// `|`
    Pipe,
    /// `&`
    Amp,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `@`
    At,
    /// End-of-input marker.
    Eof,
}

impl Token<'_> {
    /// Formats the token for diagnostics.
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("`{name}`"),
            Self::Str(raw) => format!("string \"{raw}\""),
            Self::Number(raw) => format!("number `{raw}`"),
            Self::Eq => "`=`".to_string(),
            Self::Semi => "`;`".to_string(),
            Self::Colon => "`:`".to_string(),
            Self::Comma => "`,`".to_string(),
            Self::Question => "`?`".to_string(),
            Self::Pipe => "`|`".to_string(),
            Self::Amp => "`&`".to_string(),
            Self::LBrace => "`{`".to_string(),
            Self::RBrace => "`}`".to_string(),
            Self::LBracket => "`[`".to_string(),
            Self::RBracket => "`]`".to_string(),
            Self::LParen => "`(`".to_string(),
            Self::RParen => "`)`".to_string(),
            Self::Lt => "`<`".to_string(),
            Self::Gt => "`>`".to_string(),
            Self::At => "`@`".to_string(),
            Self::Eof => "end of input".to_string(),
        }
    }
}

/// Token paired with its byte offset.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SpannedToken<'a> {
    /// Token value.
    pub(crate) token: Token<'a>,
    /// Byte offset into the input.
    pub(crate) offset: usize,
}

/// Lexer for declaration files.
pub(crate) struct Lexer<'a> {
    input: &'a str,
    offset: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    pub(crate) const fn new(input: &'a str) -> Self {
        Self { input, offset: 0 }
    }

    /// Lexes the input into a sequence of tokens ending in [`Token::Eof`].
    pub(crate) fn lex(&mut self) -> Result<Vec<SpannedToken<'a>>, DeclarationError> {
        let mut tokens = Vec::new();
        let bytes = self.input.as_bytes();

        while self.offset < bytes.len() {
            let ch = bytes[self.offset];
            let single = match ch {
                b' ' | b'\t' | b'\n' | b'\r' => {
                    self.offset += 1;
                    continue;
                }
                b'/' if bytes.get(self.offset + 1) == Some(&b'/') => {
                    self.consume_while(bytes, |b| b != b'\n');
                    continue;
                }
                b'/' if bytes.get(self.offset + 1) == Some(&b'*') => {
                    self.skip_block_comment()?;
                    continue;
                }
                b'"' | b'\'' => {
                    tokens.push(self.string(ch)?);
                    continue;
                }
                b'0'..=b'9' => {
                    tokens.push(self.number());
                    continue;
                }
                b'-' if bytes.get(self.offset + 1).is_some_and(u8::is_ascii_digit) => {
                    tokens.push(self.number());
                    continue;
                }
                b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' => {
                    let start = self.offset;
                    self.consume_while(bytes, |b| b.is_ascii_alphanumeric() || b == b'_' || b == b'$');
                    tokens.push(SpannedToken {
                        token: Token::Ident(&self.input[start..self.offset]),
                        offset: start,
                    });
                    continue;
                }
                b'=' => Token::Eq,
                b';' => Token::Semi,
                b':' => Token::Colon,
                b',' => Token::Comma,
                b'?' => Token::Question,
                b'|' => Token::Pipe,
                b'&' => Token::Amp,
                b'{' => Token::LBrace,
                b'}' => Token::RBrace,
                b'[' => Token::LBracket,
                b']' => Token::RBracket,
                b'(' => Token::LParen,
                b')' => Token::RParen,
                b'<' => Token::Lt,
                b'>' => Token::Gt,
                b'@' => Token::At,
                _ => {
                    let found = self.input[self.offset..].chars().next().unwrap_or('\u{fffd}');
                    return Err(DeclarationError::UnexpectedCharacter {
                        found,
                        position: Position::locate(self.input, self.offset),
                    });
                }
            };
            tokens.push(SpannedToken {
                token: single,
                offset: self.offset,
            });
            self.offset += 1;
        }

        tokens.push(SpannedToken {
            token: Token::Eof,
            offset: self.offset,
        });
        Ok(tokens)
    }

    fn string(&mut self, quote: u8) -> Result<SpannedToken<'a>, DeclarationError> {
        let bytes = self.input.as_bytes();
        let start = self.offset;
        self.offset += 1;
        while let Some(&b) = bytes.get(self.offset) {
            match b {
                b'\\' => self.offset += 2,
                b'\n' => break,
                _ if b == quote => {
                    let body = &self.input[start + 1..self.offset];
                    self.offset += 1;
                    return Ok(SpannedToken {
                        token: Token::Str(body),
                        offset: start,
                    });
                }
                _ => self.offset += 1,
            }
        }
        Err(DeclarationError::UnterminatedString {
            position: Position::locate(self.input, start),
        })
    }

    fn number(&mut self) -> SpannedToken<'a> {
        let bytes = self.input.as_bytes();
        let start = self.offset;
        if bytes[self.offset] == b'-' {
            self.offset += 1;
        }
        self.consume_while(bytes, |b| b.is_ascii_digit() || b == b'_');
        if bytes.get(self.offset) == Some(&b'.')
            && bytes.get(self.offset + 1).is_some_and(u8::is_ascii_digit)
        {
            self.offset += 1;
            self.consume_while(bytes, |b| b.is_ascii_digit());
        }
        if matches!(bytes.get(self.offset), Some(b'e' | b'E')) {
            let mut lookahead = self.offset + 1;
            if matches!(bytes.get(lookahead), Some(b'+' | b'-')) {
                lookahead += 1;
            }
            if bytes.get(lookahead).is_some_and(u8::is_ascii_digit) {
                self.offset = lookahead;
                self.consume_while(bytes, |b| b.is_ascii_digit());
            }
        }
        SpannedToken {
            token: Token::Number(&self.input[start..self.offset]),
            offset: start,
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), DeclarationError> {
        let start = self.offset;
        match self.input[self.offset + 2..].find("*/") {
            Some(end) => {
                self.offset += 2 + end + 2;
                Ok(())
            }
            None => Err(DeclarationError::UnterminatedComment {
                position: Position::locate(self.input, start),
            }),
        }
    }

    /// Advances while the condition matches the current byte.
    fn consume_while<F>(&mut self, bytes: &[u8], condition: F)
    where
        F: Fn(u8) -> bool,
    {
        while let Some(&b) = bytes.get(self.offset) {
            if condition(b) {
                self.offset += 1;
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token<'_>> {
        Lexer::new(input)
            .lex()
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_lex_declaration() {
        assert_eq!(
            kinds("type Id = string @minLength(1);"),
            vec![
                Token::Ident("type"),
                Token::Ident("Id"),
                Token::Eq,
                Token::Ident("string"),
                Token::At,
                Token::Ident("minLength"),
                Token::LParen,
                Token::Number("1"),
                Token::RParen,
                Token::Semi,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_skips_comments() {
        assert_eq!(
            kinds("// line\n/* block\n comment */ a"),
            vec![Token::Ident("a"), Token::Eof]
        );
    }

    #[test]
    fn test_lex_strings_with_escapes() {
        assert_eq!(
            kinds(r#""a\"b" 'c'"#),
            vec![Token::Str(r#"a\"b"#), Token::Str("c"), Token::Eof]
        );
    }

    #[test]
    fn test_lex_numbers() {
        assert_eq!(
            kinds("-8640000000000000 1.5 2e3 7"),
            vec![
                Token::Number("-8640000000000000"),
                Token::Number("1.5"),
                Token::Number("2e3"),
                Token::Number("7"),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("type A = \"oops;").lex().unwrap_err();
        assert!(matches!(err, DeclarationError::UnterminatedString { .. }));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = Lexer::new("/* never closed").lex().unwrap_err();
        assert!(matches!(err, DeclarationError::UnterminatedComment { .. }));
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::new("type A = #").lex().unwrap_err();
        assert_eq!(
            err,
            DeclarationError::UnexpectedCharacter {
                found: '#',
                position: Position { line: 1, column: 10 },
            }
        );
    }
}
