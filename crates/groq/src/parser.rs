use crate::ast::Expr;
use crate::lexer::{tokenize, LexError, SpannedToken, Token};

/// Parser error types.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("unexpected token: {found}, expected: {expected}")]
    UnexpectedToken { found: String, expected: String },
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("projection key cannot be inferred, use \"alias\": expression")]
    AnonymousProjection,
    #[error("query nests deeper than {0} levels")]
    TooDeep(usize),
}

/// Deepest expression tree the parser will build. Nesting, unary `!` and
/// every chained operator each add a level.
pub const MAX_DEPTH: usize = 128;

/// Parse a GROQ query string into an AST.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expr()?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        other => Err(ParseError::UnexpectedToken {
            found: other.to_string(),
            expected: "end of query".to_string(),
        }),
    }
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ParseError> {
        let found = self.advance();
        if &found == expected {
            Ok(())
        } else if found == Token::Eof {
            Err(ParseError::UnexpectedEof)
        } else {
            Err(ParseError::UnexpectedToken {
                found: found.to_string(),
                expected: expected.to_string(),
            })
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.descend()?;
        let expr = self.parse_or()?;
        self.depth -= 1;
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let start = self.depth;
        let mut left = self.parse_and()?;
        while self.peek() == &Token::Or {
            self.advance();
            self.descend()?;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        self.depth = start;
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let start = self.depth;
        let mut left = self.parse_unary()?;
        while self.peek() == &Token::And {
            self.advance();
            self.descend()?;
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        self.depth = start;
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.peek() == &Token::Not {
            self.advance();
            self.descend()?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_postfix()?;

        let build: fn(Box<Expr>, Box<Expr>) -> Expr = match self.peek() {
            Token::Eq => Expr::Eq,
            Token::Neq => Expr::Neq,
            Token::Lt => Expr::Lt,
            Token::Gt => Expr::Gt,
            Token::Lte => Expr::Lte,
            Token::Gte => Expr::Gte,
            Token::In => Expr::In,
            Token::Match => Expr::Match,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_postfix()?;
        Ok(build(Box::new(left), Box::new(right)))
    }

    /// A primary expression followed by any chain of access, dereference,
    /// bracket, projection and pipe operators.
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let start = self.depth;
        let mut expr = self.parse_primary()?;

        loop {
            if matches!(
                self.peek(),
                Token::Dot | Token::Arrow | Token::LBracket | Token::LBrace | Token::Pipe
            ) {
                self.descend()?;
            }
            match self.peek().clone() {
                Token::Dot => {
                    self.advance();
                    match self.advance() {
                        Token::Ident(field) => expr = Expr::DotAccess(Box::new(expr), field),
                        other => {
                            return Err(ParseError::UnexpectedToken {
                                found: other.to_string(),
                                expected: "field name".to_string(),
                            })
                        }
                    }
                }
                Token::Arrow => {
                    self.advance();
                    if let Token::Ident(field) = self.peek().clone() {
                        self.advance();
                        expr = Expr::Deref(Box::new(expr), Some(field));
                    } else {
                        expr = Expr::Deref(Box::new(expr), None);
                    }
                }
                Token::LBracket => {
                    self.advance();
                    let stage = self.parse_bracket()?;
                    expr = expr.with_stage(stage);
                }
                Token::LBrace => {
                    self.advance();
                    let fields = self.parse_projection()?;
                    self.expect(&Token::RBrace)?;
                    expr = expr.with_stage(Expr::Projection(fields));
                }
                Token::Pipe => {
                    self.advance();
                    let stage = self.parse_pipe_expr()?;
                    expr = expr.with_stage(stage);
                }
                _ => break,
            }
        }

        self.depth = start;
        Ok(expr)
    }

    /// Everything after an opening `[`: traversal, index, slice or filter.
    fn parse_bracket(&mut self) -> Result<Expr, ParseError> {
        if self.peek() == &Token::RBracket {
            self.advance();
            return Ok(Expr::Traverse);
        }

        if let Token::Integer(start) = *self.peek() {
            match (self.peek_at(1).clone(), self.peek_at(2).clone()) {
                (Token::RBracket, _) => {
                    self.pos += 2;
                    return Ok(Expr::Index(start));
                }
                (Token::DotDot, Token::Integer(end)) | (Token::Ellipsis, Token::Integer(end)) => {
                    let inclusive = self.peek_at(1) == &Token::DotDot;
                    self.pos += 3;
                    self.expect(&Token::RBracket)?;
                    let end = if inclusive { end + 1 } else { end };
                    return Ok(Expr::Slice(start, end));
                }
                _ => {}
            }
        }

        let filter = self.parse_expr()?;
        self.expect(&Token::RBracket)?;
        Ok(Expr::Filter(Box::new(filter)))
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.advance() {
            Token::Star => Ok(Expr::Everything),
            Token::Ident(name) => {
                if let Some(param) = name.strip_prefix('$') {
                    return Ok(Expr::Param(param.to_string()));
                }
                if self.peek() == &Token::LParen {
                    self.advance();
                    let mut args = Vec::new();
                    if self.peek() != &Token::RParen {
                        args.push(self.parse_expr()?);
                        while self.peek() == &Token::Comma {
                            self.advance();
                            args.push(self.parse_expr()?);
                        }
                    }
                    self.expect(&Token::RParen)?;
                    return Ok(Expr::FuncCall(name, args));
                }
                Ok(Expr::Ident(name))
            }
            Token::String(s) => Ok(Expr::StringLiteral(s)),
            Token::Integer(n) => Ok(Expr::IntLiteral(n)),
            Token::Float(n) => Ok(Expr::FloatLiteral(n)),
            Token::Bool(b) => Ok(Expr::BoolLiteral(b)),
            Token::Null => Ok(Expr::Null),
            Token::At => Ok(Expr::This),
            Token::Caret => Ok(Expr::Parent),
            Token::LParen => {
                let expr = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Token::LBracket => {
                let mut items = Vec::new();
                if self.peek() != &Token::RBracket {
                    items.push(self.parse_expr()?);
                    while self.peek() == &Token::Comma {
                        self.advance();
                        items.push(self.parse_expr()?);
                    }
                }
                self.expect(&Token::RBracket)?;
                Ok(Expr::Array(items))
            }
            Token::LBrace => {
                let fields = self.parse_projection()?;
                self.expect(&Token::RBrace)?;
                Ok(Expr::Object(fields))
            }
            Token::Eof => Err(ParseError::UnexpectedEof),
            other => Err(ParseError::UnexpectedToken {
                found: other.to_string(),
                expected: "expression".to_string(),
            }),
        }
    }

    fn parse_projection(&mut self) -> Result<Vec<(String, Expr)>, ParseError> {
        let mut fields = Vec::new();

        while self.peek() != &Token::RBrace && self.peek() != &Token::Eof {
            if self.peek() == &Token::Ellipsis {
                self.advance();
                fields.push(("...".to_string(), Expr::Everything));
            } else if let (Token::String(alias), Token::Colon) =
                (self.peek().clone(), self.peek_at(1).clone())
            {
                self.pos += 2;
                let expr = self.parse_expr()?;
                fields.push((alias, expr));
            } else if let (Token::Ident(alias), Token::Colon) =
                (self.peek().clone(), self.peek_at(1).clone())
            {
                self.pos += 2;
                let expr = self.parse_expr()?;
                fields.push((alias, expr));
            } else {
                let expr = self.parse_expr()?;
                let key = projection_key(&expr).ok_or(ParseError::AnonymousProjection)?;
                fields.push((key, expr));
            }

            if self.peek() == &Token::Comma {
                self.advance();
            } else {
                break;
            }
        }

        Ok(fields)
    }

    fn parse_pipe_expr(&mut self) -> Result<Expr, ParseError> {
        match self.advance() {
            Token::Ident(name) if name == "order" => {
                self.expect(&Token::LParen)?;
                let mut keys = Vec::new();
                loop {
                    let key = self.parse_postfix()?;
                    let ascending = match self.peek() {
                        Token::Desc => {
                            self.advance();
                            false
                        }
                        Token::Asc => {
                            self.advance();
                            true
                        }
                        _ => true,
                    };
                    keys.push((key, ascending));
                    if self.peek() == &Token::Comma {
                        self.advance();
                    } else {
                        break;
                    }
                }
                self.expect(&Token::RParen)?;
                Ok(Expr::Order(keys))
            }
            Token::LBrace => {
                let fields = self.parse_projection()?;
                self.expect(&Token::RBrace)?;
                Ok(Expr::Projection(fields))
            }
            Token::Eof => Err(ParseError::UnexpectedEof),
            other => Err(ParseError::UnexpectedToken {
                found: other.to_string(),
                expected: "order(...) or projection after |".to_string(),
            }),
        }
    }
}

/// Key used for an unaliased projection entry: the last field name.
fn projection_key(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Ident(name) => Some(name.clone()),
        Expr::DotAccess(_, field) => Some(field.clone()),
        Expr::Deref(base, None) => projection_key(base),
        Expr::Deref(_, Some(field)) => Some(field.clone()),
        Expr::Pipeline(stages) => stages.first().and_then(projection_key),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_everything() {
        let expr = parse("*").unwrap();
        assert!(matches!(expr, Expr::Everything));
    }

    #[test]
    fn parse_simple_filter() {
        let expr = parse("*[_type == \"venue\"]").unwrap();
        match expr {
            Expr::Pipeline(stages) => {
                assert_eq!(stages.len(), 2);
                assert!(matches!(stages[0], Expr::Everything));
                match &stages[1] {
                    Expr::Filter(inner) => match inner.as_ref() {
                        Expr::Eq(left, right) => {
                            assert!(matches!(left.as_ref(), Expr::Ident(n) if n == "_type"));
                            assert!(
                                matches!(right.as_ref(), Expr::StringLiteral(s) if s == "venue")
                            );
                        }
                        _ => panic!("expected Eq"),
                    },
                    _ => panic!("expected Filter"),
                }
            }
            _ => panic!("expected Pipeline"),
        }
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let expr = parse("a == 1 || b == 2 && c == 3").unwrap();
        match expr {
            Expr::Or(_, right) => assert!(matches!(*right, Expr::And(_, _))),
            other => panic!("expected Or, got {other:?}"),
        }
    }

    #[test]
    fn parse_dot_access() {
        let expr = parse("slug.current").unwrap();
        match expr {
            Expr::DotAccess(base, field) => {
                assert!(matches!(*base, Expr::Ident(n) if n == "slug"));
                assert_eq!(field, "current");
            }
            _ => panic!("expected DotAccess, got {expr:?}"),
        }
    }

    #[test]
    fn parse_function_call_over_query() {
        let expr = parse("count(*[_type == \"review\"])").unwrap();
        match expr {
            Expr::FuncCall(name, args) => {
                assert_eq!(name, "count");
                assert_eq!(args.len(), 1);
                assert!(matches!(args[0], Expr::Pipeline(_)));
            }
            _ => panic!("expected FuncCall"),
        }
    }

    #[test]
    fn parse_full_listing_query() {
        let expr = parse(
            "*[_type == \"venue\" && city->slug.current == $city] | order(title asc, _createdAt desc) [0...12] { _id, title, \"slug\": slug.current, \"categories\": categories[]->title }",
        )
        .unwrap();
        match expr {
            Expr::Pipeline(stages) => {
                assert_eq!(stages.len(), 5);
                assert!(matches!(&stages[2], Expr::Order(keys) if keys.len() == 2 && !keys[1].1));
                assert_eq!(stages[3], Expr::Slice(0, 12));
                match &stages[4] {
                    Expr::Projection(fields) => {
                        let keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
                        assert_eq!(keys, vec!["_id", "title", "slug", "categories"]);
                    }
                    other => panic!("expected Projection, got {other:?}"),
                }
            }
            other => panic!("expected Pipeline, got {other:?}"),
        }
    }

    #[test]
    fn inclusive_range_becomes_half_open() {
        let expr = parse("*[0..2]").unwrap();
        assert_eq!(expr, Expr::Pipeline(vec![Expr::Everything, Expr::Slice(0, 3)]));
        let expr = parse("*[_type == \"post\"][0]").unwrap();
        assert!(matches!(expr, Expr::Pipeline(ref s) if s[2] == Expr::Index(0)));
    }

    #[test]
    fn parse_deref_projection_and_params() {
        let expr = parse("city->{title}").unwrap();
        assert!(matches!(
            expr,
            Expr::Pipeline(ref s) if matches!(s[0], Expr::Deref(_, None))
        ));
        assert_eq!(parse("$slug").unwrap(), Expr::Param("slug".into()));
    }

    #[test]
    fn parse_object_literal() {
        let expr = parse("{\"venues\": count(*[_type == \"venue\"]), \"now\": now()}").unwrap();
        assert!(matches!(expr, Expr::Object(ref f) if f.len() == 2));
    }

    #[test]
    fn rejects_trailing_tokens() {
        assert!(parse("title title").is_err());
        assert!(matches!(parse("*[_type =="), Err(ParseError::UnexpectedEof)));
    }

    #[test]
    fn deep_nesting_is_rejected_not_recursed() {
        let nested = format!("{}true{}", "(".repeat(5000), ")".repeat(5000));
        assert!(matches!(parse(&nested), Err(ParseError::TooDeep(MAX_DEPTH))));

        let negated = format!("{}true", "!".repeat(5000));
        assert!(matches!(parse(&negated), Err(ParseError::TooDeep(_))));

        let chained = format!("a{}", ".b".repeat(5000));
        assert!(matches!(parse(&chained), Err(ParseError::TooDeep(_))));
    }

    #[test]
    fn moderate_nesting_still_parses() {
        let nested = format!("{}true{}", "(".repeat(20), ")".repeat(20));
        assert!(matches!(parse(&nested).unwrap(), Expr::BoolLiteral(true)));
    }
}
