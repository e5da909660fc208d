use crate::{
    ast::{Expr, FieldRef, Spanned, Token},
    error::ParseError,
    lexer::Lexer,
};
use std::mem;

/// Recursive-descent parser with one token of lookahead.
pub struct Parser {
    lexer: Lexer,
    current: Spanned,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Parser { lexer, current })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current.token) == mem::discriminant(token)
    }

    /// Take the current token and move past it.
    fn bump(&mut self) -> Result<Token, ParseError> {
        let token = mem::replace(&mut self.current.token, Token::Eof);
        self.advance()?;
        Ok(token)
    }

    fn parse_list(&mut self) -> Result<Expr, ParseError> {
        let open = self.current.offset;
        self.advance()?; // Consume '('

        let mut items = Vec::new();
        while !self.check(&Token::RParen) {
            if self.check(&Token::Eof) {
                return Err(ParseError::at("missing closing parenthesis", open));
            }
            items.push(self.parse_expression()?);
        }

        self.advance()?; // Consume ')'
        Ok(Expr::List(items))
    }

    fn parse_symbol(word: String) -> Expr {
        match word.to_lowercase().as_str() {
            "true" => Expr::Boolean(true),
            "false" => Expr::Boolean(false),
            "null" | "nil" => Expr::Null,
            "$" => Expr::Context,
            _ => Expr::String(word),
        }
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let offset = self.current.offset;
        match &self.current.token {
            Token::LParen => self.parse_list(),
            Token::RParen => Err(ParseError::at("unexpected ')'", offset)),
            Token::Eof => Err(ParseError::at("unexpected end of input", offset)),
            _ => Ok(match self.bump()? {
                Token::String(s) => Expr::String(s),
                Token::Field { sigil, path } => Expr::Field(FieldRef { sigil, path }),
                Token::Float(n) => Expr::Float(n),
                Token::Integer(n) => Expr::Integer(n),
                Token::Symbol(word) => Parser::parse_symbol(word),
                Token::LParen | Token::RParen | Token::Eof => unreachable!(),
            }),
        }
    }

    /// Parse a complete query. Empty input yields the empty list.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        if self.check(&Token::Eof) {
            return Ok(Expr::List(Vec::new()));
        }

        let expr = self.parse_expression()?;

        if !self.check(&Token::Eof) {
            return Err(ParseError::at(
                "unexpected trailing tokens",
                self.current.offset,
            ));
        }
        Ok(expr)
    }
}

/// Parse query text into an AST.
///
/// ```
/// use fuzzy_query::parse_query;
/// use serde_json::json;
///
/// let ast = parse_query("(>= :age 25)").unwrap();
/// assert_eq!(ast.to_json(), json!([">=", ":age", 25]));
/// ```
pub fn parse_query(input: &str) -> Result<Expr, ParseError> {
    Parser::new(input)?.parse()
}

/// Check query text for syntax errors without keeping the AST.
pub fn validate_query_syntax(input: &str) -> Result<(), ParseError> {
    parse_query(input).map(|_| ())
}

#[test]
fn test_symbols_map_to_literals() {
    let ast = parse_query("(f TRUE false Nil null $ word)").unwrap();
    assert_eq!(
        ast,
        Expr::List(vec![
            Expr::string("f"),
            Expr::Boolean(true),
            Expr::Boolean(false),
            Expr::Null,
            Expr::Null,
            Expr::Context,
            Expr::string("word"),
        ])
    );
}

#[test]
fn test_error_offsets() {
    let err = parse_query("(and (x 1)").unwrap_err();
    assert_eq!(err.message, "missing closing parenthesis");
    assert_eq!(err.position.map(|p| p.offset), Some(0));

    let err = parse_query("(x) y").unwrap_err();
    assert_eq!(err.message, "unexpected trailing tokens");
    assert_eq!(err.position.map(|p| p.offset), Some(4));
}
