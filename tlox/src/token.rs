use crate::{literal::Literal, token_type::TokenTy};

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub ty: TokenTy,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub line: usize,
}

impl Token {
    pub fn new(ty: TokenTy, lexeme: String, literal: Option<Literal>, line: usize) -> Self {
        Token {
            ty,
            lexeme,
            literal,
            line,
        }
    }
}

/// `type=<kind> lexeme=<lexeme> literal=<literal>`, with `empty` standing in
/// for a blank lexeme and `none` for a missing literal.
impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lexeme = if self.lexeme.is_empty() {
            "empty"
        } else {
            &self.lexeme
        };
        match &self.literal {
            Some(literal) => write!(f, "type={} lexeme={} literal={}", self.ty, lexeme, literal),
            None => write!(f, "type={} lexeme={} literal=none", self.ty, lexeme),
        }
    }
}
