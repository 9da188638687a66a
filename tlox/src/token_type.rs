#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenTy {
	// single character
	LeftParen,
	RightParen,
	LeftBrace,
	RightBrace,
	Comma,
	Dot,
	Minus,
	Plus,
	Semicolon,
	Slash,
	Star,

	// one or two character
	Bang,
	BangEqual,
	Equal,
	EqualEqual,
	Greater,
	GreaterEqual,
	Less,
	LessEqual,

	// literals
	Identifier,
	String,
	Number,

	// keywords
	And,
	Class,
	Else,
	False,
	Fun,
	For,
	If,
	Nil,
	Or,
	Print,
	Return,
	True,
	Var,
	While,

	Eof,
}

impl TokenTy {
	/// Short name used in token dumps: the operator text for punctuation,
	/// the keyword itself for keywords.
	pub fn as_str(self) -> &'static str {
		match self {
			TokenTy::LeftParen => "(",
			TokenTy::RightParen => ")",
			TokenTy::LeftBrace => "{",
			TokenTy::RightBrace => "}",
			TokenTy::Comma => ",",
			TokenTy::Dot => ".",
			TokenTy::Minus => "-",
			TokenTy::Plus => "+",
			TokenTy::Semicolon => ";",
			TokenTy::Slash => "/",
			TokenTy::Star => "*",
			TokenTy::Bang => "!",
			TokenTy::BangEqual => "!=",
			TokenTy::Equal => "=",
			TokenTy::EqualEqual => "==",
			TokenTy::Greater => ">",
			TokenTy::GreaterEqual => ">=",
			TokenTy::Less => "<",
			TokenTy::LessEqual => "<=",
			TokenTy::Identifier => "id",
			TokenTy::String => "str",
			TokenTy::Number => "num",
			TokenTy::And => "and",
			TokenTy::Class => "class",
			TokenTy::Else => "else",
			TokenTy::False => "false",
			TokenTy::Fun => "fun",
			TokenTy::For => "for",
			TokenTy::If => "if",
			TokenTy::Nil => "nil",
			TokenTy::Or => "or",
			TokenTy::Print => "print",
			TokenTy::Return => "return",
			TokenTy::True => "true",
			TokenTy::Var => "var",
			TokenTy::While => "while",
			TokenTy::Eof => "eof",
		}
	}
}

impl std::fmt::Display for TokenTy {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
