use std::str::CharIndices;

use itertools::{Itertools, MultiPeek};

use crate::{literal::Literal, token::Token, token_type::TokenTy};

static KEYWORDS: phf::Map<&'static str, TokenTy> = phf::phf_map! {
    "and" =>    TokenTy::And,
    "class" =>  TokenTy::Class,
    "else" =>   TokenTy::Else,
    "false" =>  TokenTy::False,
    "for" =>    TokenTy::For,
    "fun" =>    TokenTy::Fun,
    "if" =>     TokenTy::If,
    "nil" =>    TokenTy::Nil,
    "or" =>     TokenTy::Or,
    "print" =>  TokenTy::Print,
    "return" => TokenTy::Return,
    "true" =>   TokenTy::True,
    "var" =>    TokenTy::Var,
    "while" =>  TokenTy::While,
};

pub struct Scanner<'a> {
    source: &'a str,
    current: MultiPeek<CharIndices<'a>>,
    tokens: Vec<Token>,
    errors: Vec<ScanError>,
    start: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            current: source.char_indices().multipeek(),
            tokens: Vec::new(),
            errors: Vec::new(),
            start: 0,
            line: 1,
        }
    }

    /// Scans the whole source. Errors do not stop the scan, so the token list
    /// is always complete and always ends with a single `Eof`.
    pub fn scan_tokens(mut self) -> (Vec<Token>, Vec<ScanError>) {
        loop {
            self.start = self.offset();
            match self.advance() {
                Some(ch) => self.scan_token(ch),
                None => break,
            }
        }
        self.tokens
            .push(Token::new(TokenTy::Eof, String::new(), None, self.line));
        log::debug!(
            "scanned {} tokens with {} errors",
            self.tokens.len(),
            self.errors.len()
        );
        (self.tokens, self.errors)
    }

    fn scan_token(&mut self, ch: char) {
        match ch {
            '(' => self.add_token(TokenTy::LeftParen),
            ')' => self.add_token(TokenTy::RightParen),
            '{' => self.add_token(TokenTy::LeftBrace),
            '}' => self.add_token(TokenTy::RightBrace),
            ',' => self.add_token(TokenTy::Comma),
            '.' => self.add_token(TokenTy::Dot),
            '-' => self.add_token(TokenTy::Minus),
            '+' => self.add_token(TokenTy::Plus),
            ';' => self.add_token(TokenTy::Semicolon),
            '*' => self.add_token(TokenTy::Star),
            '!' => {
                let ty = if self.matches('=') {
                    TokenTy::BangEqual
                } else {
                    TokenTy::Bang
                };
                self.add_token(ty);
            }
            '=' => {
                let ty = if self.matches('=') {
                    TokenTy::EqualEqual
                } else {
                    TokenTy::Equal
                };
                self.add_token(ty);
            }
            '<' => {
                let ty = if self.matches('=') {
                    TokenTy::LessEqual
                } else {
                    TokenTy::Less
                };
                self.add_token(ty);
            }
            '>' => {
                let ty = if self.matches('=') {
                    TokenTy::GreaterEqual
                } else {
                    TokenTy::Greater
                };
                self.add_token(ty);
            }
            '/' => {
                if self.matches('/') {
                    while !matches!(self.peek(), Some('\n') | None) {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenTy::Slash);
                }
            }
            // skip
            ' ' | '\r' | '\t' => {}
            '\n' => {
                self.line += 1;
            }
            '"' => self.string(),
            ch if ch.is_ascii_digit() => self.number(),
            ch if is_identifier_start(ch) => self.identifier(),
            ch => self
                .errors
                .push(ScanError::UnexpectedCharacter(self.line, ch)),
        }
    }

    fn string(&mut self) {
        loop {
            match self.advance() {
                Some('"') => break,
                Some('\n') => self.line += 1,
                Some(_) => {}
                None => {
                    self.errors.push(ScanError::UnterminatedString(self.line));
                    return;
                }
            }
        }

        // trim the quotes
        let end = self.offset() - 1;
        let value = self.source[self.start + 1..end].to_owned();
        self.add_literal(TokenTy::String, Literal::from(value));
    }

    fn number(&mut self) {
        while self.peek_is_digit() {
            self.advance();
        }

        if self.peek() == Some('.') && matches!(self.peek_next(), Some(c) if c.is_ascii_digit()) {
            self.advance();
            while self.peek_is_digit() {
                self.advance();
            }
        }

        let text = self.lexeme();
        match text.parse::<f64>() {
            Ok(value) => self.add_literal(TokenTy::Number, Literal::Number(value)),
            Err(_) => unreachable!("digits with an optional fraction always parse: {text:?}"),
        }
    }

    fn identifier(&mut self) {
        while matches!(self.peek(), Some(c) if is_identifier_continue(c)) {
            self.advance();
        }

        let ty = KEYWORDS
            .get(self.lexeme())
            .copied()
            .unwrap_or(TokenTy::Identifier);
        self.add_token(ty);
    }

    #[inline]
    fn offset(&mut self) -> usize {
        let offset = self
            .current
            .peek()
            .map(|&(offset, _)| offset)
            .unwrap_or(self.source.len());
        self.current.reset_peek();
        offset
    }

    #[inline]
    fn lexeme(&mut self) -> &'a str {
        let end = self.offset();
        &self.source[self.start..end]
    }

    #[inline]
    fn advance(&mut self) -> Option<char> {
        self.current.next().map(|(_, c)| c)
    }

    fn peek(&mut self) -> Option<char> {
        let ch = self.current.peek().map(|&(_, c)| c);
        self.current.reset_peek();
        ch
    }

    fn peek_next(&mut self) -> Option<char> {
        self.current.peek();
        let ch = self.current.peek().map(|&(_, c)| c);
        self.current.reset_peek();
        ch
    }

    fn peek_is_digit(&mut self) -> bool {
        matches!(self.peek(), Some(c) if c.is_ascii_digit())
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    #[inline]
    fn add_token(&mut self, ty: TokenTy) {
        self.add_token_or_literal(ty, None)
    }

    #[inline]
    fn add_literal(&mut self, ty: TokenTy, literal: Literal) {
        self.add_token_or_literal(ty, Some(literal))
    }

    fn add_token_or_literal(&mut self, ty: TokenTy, literal: Option<Literal>) {
        let text = self.lexeme().to_owned();
        self.tokens.push(Token::new(ty, text, literal, self.line))
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_identifier_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanError {
    #[error("Unexpected character.")]
    UnexpectedCharacter(usize, char),
    #[error("Unterminated string.")]
    UnterminatedString(usize),
}

impl ScanError {
    pub fn line(&self) -> usize {
        match self {
            ScanError::UnexpectedCharacter(line, _) | ScanError::UnterminatedString(line) => *line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump(source: &str) -> Vec<String> {
        let (tokens, errors) = Scanner::new(source).scan_tokens();
        assert!(errors.is_empty(), "unexpected scan errors: {errors:?}");
        tokens.iter().map(ToString::to_string).collect()
    }

    fn kinds(source: &str) -> Vec<TokenTy> {
        let (tokens, _) = Scanner::new(source).scan_tokens();
        tokens.into_iter().map(|token| token.ty).collect()
    }

    #[test]
    fn whitespace_and_comments_yield_only_eof() {
        for source in ["", "   \t\r", "// nothing here", "\n\n  // a\n\t// b\n"] {
            assert_eq!(kinds(source), vec![TokenTy::Eof], "source: {source:?}");
        }
    }

    #[test]
    fn eof_carries_final_line() {
        let (tokens, _) = Scanner::new("1\n2\n\n").scan_tokens();
        let eof = tokens.last().unwrap();
        assert_eq!(eof.ty, TokenTy::Eof);
        assert_eq!(eof.line, 4);
        assert!(eof.lexeme.is_empty());
    }

    #[test]
    fn lone_slash_is_a_token() {
        assert_eq!(
            dump("/"),
            vec!["type=/ lexeme=/ literal=none", "type=eof lexeme=empty literal=none"]
        );
    }

    #[test]
    fn groupings() {
        assert_eq!(
            dump("(( )){}"),
            vec![
                "type=( lexeme=( literal=none",
                "type=( lexeme=( literal=none",
                "type=) lexeme=) literal=none",
                "type=) lexeme=) literal=none",
                "type={ lexeme={ literal=none",
                "type=} lexeme=} literal=none",
                "type=eof lexeme=empty literal=none",
            ]
        );
    }

    #[test]
    fn operators_prefer_two_characters() {
        assert_eq!(
            dump("!*+-/=<> <= == != >="),
            vec![
                "type=! lexeme=! literal=none",
                "type=* lexeme=* literal=none",
                "type=+ lexeme=+ literal=none",
                "type=- lexeme=- literal=none",
                "type=/ lexeme=/ literal=none",
                "type== lexeme== literal=none",
                "type=< lexeme=< literal=none",
                "type=> lexeme=> literal=none",
                "type=<= lexeme=<= literal=none",
                "type=== lexeme=== literal=none",
                "type=!= lexeme=!= literal=none",
                "type=>= lexeme=>= literal=none",
                "type=eof lexeme=empty literal=none",
            ]
        );
    }

    #[test]
    fn string_literal_strips_quotes() {
        assert_eq!(
            dump("\"test a word\""),
            vec![
                "type=str lexeme=\"test a word\" literal=test a word",
                "type=eof lexeme=empty literal=none",
            ]
        );
    }

    #[test]
    fn empty_string_literal() {
        let (tokens, errors) = Scanner::new("\"\"").scan_tokens();
        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].ty, TokenTy::String);
        assert_eq!(tokens[0].literal, Some(Literal::from("")));
    }

    #[test]
    fn strings_span_lines() {
        let (tokens, errors) = Scanner::new("\"a\nb\"\nx").scan_tokens();
        assert!(errors.is_empty());
        assert_eq!(tokens[0].literal, Some(Literal::from("a\nb")));
        assert_eq!(tokens[1].ty, TokenTy::Identifier);
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn unterminated_string_is_reported_without_a_token() {
        let (tokens, errors) = Scanner::new("var a = \"oops\n").scan_tokens();
        assert_eq!(errors, vec![ScanError::UnterminatedString(2)]);
        assert_eq!(
            tokens.iter().map(|t| t.ty).collect::<Vec<_>>(),
            vec![TokenTy::Var, TokenTy::Identifier, TokenTy::Equal, TokenTy::Eof]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            dump("1 120 120.50"),
            vec![
                "type=num lexeme=1 literal=1",
                "type=num lexeme=120 literal=120",
                "type=num lexeme=120.50 literal=120.5",
                "type=eof lexeme=empty literal=none",
            ]
        );
    }

    #[test]
    fn trailing_dot_is_not_part_of_a_number() {
        assert_eq!(
            kinds("12.;"),
            vec![TokenTy::Number, TokenTy::Dot, TokenTy::Semicolon, TokenTy::Eof]
        );
        assert_eq!(kinds("-3"), vec![TokenTy::Minus, TokenTy::Number, TokenTy::Eof]);
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            dump("var test = \"value\""),
            vec![
                "type=var lexeme=var literal=none",
                "type=id lexeme=test literal=none",
                "type== lexeme== literal=none",
                "type=str lexeme=\"value\" literal=value",
                "type=eof lexeme=empty literal=none",
            ]
        );
        assert_eq!(
            kinds("and class else false fun for if nil or print return true var while"),
            vec![
                TokenTy::And,
                TokenTy::Class,
                TokenTy::Else,
                TokenTy::False,
                TokenTy::Fun,
                TokenTy::For,
                TokenTy::If,
                TokenTy::Nil,
                TokenTy::Or,
                TokenTy::Print,
                TokenTy::Return,
                TokenTy::True,
                TokenTy::Var,
                TokenTy::While,
                TokenTy::Eof,
            ]
        );
        assert_eq!(
            kinds("_under score9 orchid classy"),
            vec![
                TokenTy::Identifier,
                TokenTy::Identifier,
                TokenTy::Identifier,
                TokenTy::Identifier,
                TokenTy::Eof,
            ]
        );
    }

    #[test]
    fn lines_are_tracked_across_statements() {
        let (tokens, _) = Scanner::new("var test = \"value\"\n  if (test) { return }\n").scan_tokens();
        let lines: Vec<_> = tokens.iter().map(|t| (t.ty, t.line)).collect();
        assert_eq!(lines[0], (TokenTy::Var, 1));
        assert_eq!(lines[4], (TokenTy::If, 2));
        assert_eq!(lines.last(), Some(&(TokenTy::Eof, 3)));
    }

    #[test]
    fn unexpected_character_does_not_stop_scanning() {
        let (tokens, errors) = Scanner::new("1 @ 2\n#").scan_tokens();
        assert_eq!(
            errors,
            vec![
                ScanError::UnexpectedCharacter(1, '@'),
                ScanError::UnexpectedCharacter(2, '#'),
            ]
        );
        assert_eq!(
            tokens.iter().map(|t| t.ty).collect::<Vec<_>>(),
            vec![TokenTy::Number, TokenTy::Number, TokenTy::Eof]
        );
    }

    #[test]
    fn non_ascii_text_inside_strings_is_preserved() {
        let (tokens, errors) = Scanner::new("\"héllo ✓\" é").scan_tokens();
        assert_eq!(tokens[0].literal, Some(Literal::from("héllo ✓")));
        assert_eq!(errors, vec![ScanError::UnexpectedCharacter(1, 'é')]);
    }

    #[test]
    fn scanning_is_repeatable() {
        let source = "fun f(a, b) { return a + b * 2.5; } // done\nprint f(1, \"x\");";
        let (first, _) = Scanner::new(source).scan_tokens();
        let (second, _) = Scanner::new(source).scan_tokens();
        assert_eq!(first, second);
    }
}
