use std::fmt;

use serde::{Deserialize, Serialize};

/// Token types produced by the GROQ lexer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Token {
    /// A string literal, escapes already resolved.
    String(String),
    /// An integer literal.
    Integer(i64),
    /// A floating-point literal.
    Float(f64),
    /// A boolean literal.
    Bool(bool),
    /// The null literal.
    Null,

    /// An identifier. Parameters keep their leading `$`.
    Ident(String),

    /// Equality.
    Eq, // ==
    /// Inequality.
    Neq, // !=
    /// Less than.
    Lt, // <
    /// Greater than.
    Gt, // >
    /// Less than or equal.
    Lte, // <=
    /// Greater than or equal.
    Gte, // >=
    /// Logical and.
    And, // &&
    /// Logical or.
    Or, // ||
    /// Logical not.
    Not, // !
    /// Full-text `match` keyword.
    Match, // match
    /// Membership `in` keyword.
    In, // in
    /// Ascending sort keyword.
    Asc, // asc
    /// Descending sort keyword.
    Desc, // desc

    /// Everything in the dataset.
    Star, // *
    /// Field access.
    Dot, // .
    /// Inclusive range.
    DotDot, // ..
    /// Exclusive range, or spread inside a projection.
    Ellipsis, // ...
    /// Separator.
    Comma, // ,
    /// Projection alias separator.
    Colon, // :
    /// Pipe into `order()` or a projection.
    Pipe, // |
    /// Reference dereference.
    Arrow, // ->
    /// The current item.
    At, // @
    /// The enclosing scope.
    Caret, // ^

    /// Opening parenthesis.
    LParen, // (
    /// Closing parenthesis.
    RParen, // )
    /// Opening bracket.
    LBracket, // [
    /// Closing bracket.
    RBracket, // ]
    /// Opening brace.
    LBrace, // {
    /// Closing brace.
    RBrace, // }

    /// The end of the input.
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::String(s) => write!(f, "\"{s}\""),
            Token::Integer(n) => write!(f, "{n}"),
            Token::Float(n) => write!(f, "{n}"),
            Token::Bool(b) => write!(f, "{b}"),
            Token::Null => write!(f, "null"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::Star => write!(f, "*"),
            Token::Dot => write!(f, "."),
            Token::DotDot => write!(f, ".."),
            Token::Ellipsis => write!(f, "..."),
            Token::Arrow => write!(f, "->"),
            Token::Pipe => write!(f, "|"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Eof => write!(f, "EOF"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Position in source code for error reporting, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A token with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Lexer error.
#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
    #[error("unterminated string starting at position {0}")]
    UnterminatedString(usize),
    #[error("invalid number '{0}' at position {1}")]
    InvalidNumber(String, usize),
}

/// Tokenize a GROQ query string into a sequence of tokens.
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, LexError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];

        if ch.is_whitespace() {
            pos += 1;
            continue;
        }

        // Single-line comments
        if ch == '/' && chars.get(pos + 1) == Some(&'/') {
            while pos < chars.len() && chars[pos] != '\n' {
                pos += 1;
            }
            continue;
        }

        let start = pos;
        let next = chars.get(pos + 1).copied();

        let token = match ch {
            '*' => {
                pos += 1;
                Token::Star
            }
            '.' => {
                if next == Some('.') && chars.get(pos + 2) == Some(&'.') {
                    pos += 3;
                    Token::Ellipsis
                } else if next == Some('.') {
                    pos += 2;
                    Token::DotDot
                } else {
                    pos += 1;
                    Token::Dot
                }
            }
            ',' => {
                pos += 1;
                Token::Comma
            }
            ':' => {
                pos += 1;
                Token::Colon
            }
            '@' => {
                pos += 1;
                Token::At
            }
            '^' => {
                pos += 1;
                Token::Caret
            }
            '(' => {
                pos += 1;
                Token::LParen
            }
            ')' => {
                pos += 1;
                Token::RParen
            }
            '[' => {
                pos += 1;
                Token::LBracket
            }
            ']' => {
                pos += 1;
                Token::RBracket
            }
            '{' => {
                pos += 1;
                Token::LBrace
            }
            '}' => {
                pos += 1;
                Token::RBrace
            }
            '=' => {
                if next == Some('=') {
                    pos += 2;
                    Token::Eq
                } else {
                    return Err(LexError::UnexpectedChar(ch, pos));
                }
            }
            '!' => {
                if next == Some('=') {
                    pos += 2;
                    Token::Neq
                } else {
                    pos += 1;
                    Token::Not
                }
            }
            '<' => {
                if next == Some('=') {
                    pos += 2;
                    Token::Lte
                } else {
                    pos += 1;
                    Token::Lt
                }
            }
            '>' => {
                if next == Some('=') {
                    pos += 2;
                    Token::Gte
                } else {
                    pos += 1;
                    Token::Gt
                }
            }
            '&' => {
                if next == Some('&') {
                    pos += 2;
                    Token::And
                } else {
                    return Err(LexError::UnexpectedChar(ch, pos));
                }
            }
            '|' => {
                if next == Some('|') {
                    pos += 2;
                    Token::Or
                } else {
                    pos += 1;
                    Token::Pipe
                }
            }
            '-' => {
                if next == Some('>') {
                    pos += 2;
                    Token::Arrow
                } else if next.is_some_and(|c| c.is_ascii_digit()) {
                    pos += 1;
                    let (token, end) = lex_number(&chars, pos, true)?;
                    pos = end;
                    token
                } else {
                    return Err(LexError::UnexpectedChar(ch, pos));
                }
            }
            '"' | '\'' => {
                let quote = ch;
                pos += 1;
                let mut s = String::new();
                loop {
                    match chars.get(pos) {
                        None => return Err(LexError::UnterminatedString(start)),
                        Some(&c) if c == quote => break,
                        Some('\\') => {
                            let escaped = chars
                                .get(pos + 1)
                                .ok_or(LexError::UnterminatedString(start))?;
                            s.push(match escaped {
                                'n' => '\n',
                                't' => '\t',
                                'r' => '\r',
                                other => *other,
                            });
                            pos += 2;
                        }
                        Some(&c) => {
                            s.push(c);
                            pos += 1;
                        }
                    }
                }
                pos += 1; // closing quote
                Token::String(s)
            }
            c if c.is_ascii_digit() => {
                let (token, end) = lex_number(&chars, pos, false)?;
                pos = end;
                token
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                pos += 1;
                while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                    pos += 1;
                }
                let word: String = chars[start..pos].iter().collect();
                match word.as_str() {
                    "true" => Token::Bool(true),
                    "false" => Token::Bool(false),
                    "null" => Token::Null,
                    "match" => Token::Match,
                    "in" => Token::In,
                    "asc" => Token::Asc,
                    "desc" => Token::Desc,
                    _ => Token::Ident(word),
                }
            }
            _ => return Err(LexError::UnexpectedChar(ch, pos)),
        };

        tokens.push(SpannedToken {
            token,
            span: Span { start, end: pos },
        });
    }

    tokens.push(SpannedToken {
        token: Token::Eof,
        span: Span {
            start: pos,
            end: pos,
        },
    });

    Ok(tokens)
}

/// Lex digits starting at `pos`. A `.` followed by another `.` is a range,
/// not a decimal point.
fn lex_number(chars: &[char], mut pos: usize, negative: bool) -> Result<(Token, usize), LexError> {
    let start = pos;
    let mut is_float = false;
    while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
        if chars[pos] == '.' {
            if chars.get(pos + 1) == Some(&'.') || is_float {
                break;
            }
            is_float = true;
        }
        pos += 1;
    }
    let literal: String = chars[start..pos].iter().collect();
    let token = if is_float {
        let n: f64 = literal
            .parse()
            .map_err(|_| LexError::InvalidNumber(literal.clone(), start))?;
        Token::Float(if negative { -n } else { n })
    } else {
        let n: i64 = literal
            .parse()
            .map_err(|_| LexError::InvalidNumber(literal.clone(), start))?;
        Token::Integer(if negative { -n } else { n })
    };
    Ok((token, pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn tokenize_simple_filter() {
        let tokens = tok("*[_type == \"venue\"]");
        assert_eq!(tokens[0], Token::Star);
        assert_eq!(tokens[1], Token::LBracket);
        assert_eq!(tokens[2], Token::Ident("_type".into()));
        assert_eq!(tokens[3], Token::Eq);
        assert_eq!(tokens[4], Token::String("venue".into()));
        assert_eq!(tokens[5], Token::RBracket);
        assert_eq!(tokens[6], Token::Eof);
    }

    #[test]
    fn tokenize_projection() {
        let tokens = tok("{title, \"slug\": slug.current}");
        assert_eq!(tokens[0], Token::LBrace);
        assert_eq!(tokens[1], Token::Ident("title".into()));
        assert_eq!(tokens[2], Token::Comma);
        assert_eq!(tokens[3], Token::String("slug".into()));
        assert_eq!(tokens[4], Token::Colon);
        assert_eq!(tokens[5], Token::Ident("slug".into()));
        assert_eq!(tokens[6], Token::Dot);
        assert_eq!(tokens[7], Token::Ident("current".into()));
        assert_eq!(tokens[8], Token::RBrace);
    }

    #[test]
    fn tokenize_numbers() {
        let tokens = tok("42 3.125 -7");
        assert_eq!(tokens[0], Token::Integer(42));
        assert_eq!(tokens[1], Token::Float(3.125));
        assert_eq!(tokens[2], Token::Integer(-7));
    }

    #[test]
    fn tokenize_slices() {
        assert_eq!(
            tok("[0...10]"),
            vec![
                Token::LBracket,
                Token::Integer(0),
                Token::Ellipsis,
                Token::Integer(10),
                Token::RBracket,
                Token::Eof
            ]
        );
        assert_eq!(tok("[2..4]")[2], Token::DotDot);
    }

    #[test]
    fn tokenize_comparison_operators() {
        let tokens = tok("< > <= >= == != !");
        assert_eq!(tokens[0], Token::Lt);
        assert_eq!(tokens[1], Token::Gt);
        assert_eq!(tokens[2], Token::Lte);
        assert_eq!(tokens[3], Token::Gte);
        assert_eq!(tokens[4], Token::Eq);
        assert_eq!(tokens[5], Token::Neq);
        assert_eq!(tokens[6], Token::Not);
    }

    #[test]
    fn tokenize_keywords() {
        let tokens = tok("true false null match in asc desc");
        assert_eq!(tokens[0], Token::Bool(true));
        assert_eq!(tokens[1], Token::Bool(false));
        assert_eq!(tokens[2], Token::Null);
        assert_eq!(tokens[3], Token::Match);
        assert_eq!(tokens[4], Token::In);
        assert_eq!(tokens[5], Token::Asc);
        assert_eq!(tokens[6], Token::Desc);
    }

    #[test]
    fn tokenize_dereference_and_params() {
        let tokens = tok("city->slug.current == $city");
        assert_eq!(tokens[0], Token::Ident("city".into()));
        assert_eq!(tokens[1], Token::Arrow);
        assert_eq!(tokens[2], Token::Ident("slug".into()));
        assert_eq!(tokens[6], Token::Ident("$city".into()));
    }

    #[test]
    fn tokenize_non_ascii_strings() {
        let tokens = tok("title == \"Cañas y Tapas\" && x == 'jamón'");
        assert_eq!(tokens[2], Token::String("Cañas y Tapas".into()));
        assert_eq!(tokens[6], Token::String("jamón".into()));
    }

    #[test]
    fn tokenize_escapes() {
        assert_eq!(tok(r#""say \"hola\"""#)[0], Token::String("say \"hola\"".into()));
    }

    #[test]
    fn unterminated_string_error() {
        assert!(matches!(
            tokenize("\"hello"),
            Err(LexError::UnterminatedString(0))
        ));
    }
}
