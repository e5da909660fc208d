use crate::ast::Sigil;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Left parenthesis, opens an operator application
    LParen,

    /// Right parenthesis
    RParen,

    /// Quoted string literal, quotes removed
    ///
    /// # Examples
    /// ```text
    /// "john smith"
    /// 'single quoted'
    /// ```
    String(String),

    /// Field reference
    ///
    /// # Examples
    /// ```text
    /// :age
    /// @user.address.city
    /// @items.*.price
    /// ```
    Field { sigil: Sigil, path: String },

    /// Floating-point number (decimal point required)
    ///
    /// # Examples
    /// ```text
    /// 0.75
    /// -2.5
    /// ```
    Float(f64),

    /// Integer
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -10
    /// ```
    Integer(i64),

    /// Bare word: operator, predicate name, keyword or implicit literal
    ///
    /// # Examples
    /// ```text
    /// and
    /// >=
    /// contains?
    /// smith
    /// ```
    Symbol(String),

    /// End of input
    Eof,
}

/// A token with the character offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}
