use crate::{
    ast::{Sigil, Spanned, Token},
    ast::expressions::is_path_text,
    error::ParseError,
};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_string(&mut self, quote: char) -> Result<String, ParseError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance(); // Consume backslash
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('"') => result.push('"'),
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        Some(ch) => {
                            return Err(ParseError::at(
                                format!("invalid escape sequence '\\{}'", ch),
                                self.position - 1,
                            ));
                        }
                        None => break,
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(ParseError::at("unterminated string literal", start))
    }

    /// Maximal run of characters up to whitespace, a paren or a quote.
    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() || matches!(ch, '(' | ')' | '"' | '\'') {
                break;
            }
            word.push(ch);
            self.advance();
        }
        word
    }

    fn classify(word: String, offset: usize) -> Result<Token, ParseError> {
        if is_float_text(&word) {
            return word
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| ParseError::at(format!("invalid number '{}'", word), offset));
        }
        if is_integer_text(&word) {
            return word
                .parse::<i64>()
                .map(Token::Integer)
                .map_err(|_| ParseError::at(format!("integer '{}' out of range", word), offset));
        }

        let mut chars = word.chars();
        if let Some(sigil) = chars.next().and_then(Sigil::from_char) {
            let path = chars.as_str();
            if is_path_text(path) {
                return Ok(Token::Field {
                    sigil,
                    path: path.to_string(),
                });
            }
        }

        Ok(Token::Symbol(word))
    }

    pub fn next_token(&mut self) -> Result<Spanned, ParseError> {
        self.skip_whitespace();
        let offset = self.position;

        let token = match self.current_char() {
            None => Token::Eof,
            Some('(') => {
                self.advance();
                Token::LParen
            }
            Some(')') => {
                self.advance();
                Token::RParen
            }
            Some(quote @ ('"' | '\'')) => Token::String(self.read_string(quote)?),
            Some(_) => {
                let word = self.read_word();
                Lexer::classify(word, offset)?
            }
        };

        Ok(Spanned { token, offset })
    }

    /// Every token up to and including `Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Spanned>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }
}

/// `-?digits.digits`
pub(crate) fn is_float_text(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);
    match body.split_once('.') {
        Some((int, frac)) => is_digits(int) && is_digits(frac),
        None => false,
    }
}

/// `-?digits`
pub(crate) fn is_integer_text(s: &str) -> bool {
    is_digits(s.strip_prefix('-').unwrap_or(s))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[test]
fn test_word_classification() {
    let mut lexer = Lexer::new("and >= -12 0.5 :age @a.b true");
    let tokens: Vec<Token> = lexer
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|s| s.token)
        .collect();
    assert_eq!(
        tokens,
        vec![
            Token::Symbol("and".to_string()),
            Token::Symbol(">=".to_string()),
            Token::Integer(-12),
            Token::Float(0.5),
            Token::Field {
                sigil: Sigil::Colon,
                path: "age".to_string()
            },
            Token::Field {
                sigil: Sigil::At,
                path: "a.b".to_string()
            },
            Token::Symbol("true".to_string()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_offsets() {
    let mut lexer = Lexer::new("(very 'x')");
    let offsets: Vec<usize> = lexer
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|s| s.offset)
        .collect();
    assert_eq!(offsets, vec![0, 1, 6, 9, 10]);
}
