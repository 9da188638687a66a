use std::{borrow::Cow, rc::Rc};

use crate::{
    expr::Expr,
    literal::Literal,
    stack::ensure_sufficient_stack,
    stmt::{Stmt, StmtFunction},
    token::Token,
    token_type::TokenTy,
};

/// Upper bound on both call arguments and function parameters.
pub const MAX_ARGUMENTS: usize = 255;

/// How deeply blocks, statement bodies, groupings and prefix operators may nest.
pub const MAX_NESTING: usize = 256;

#[derive(Default)]
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    function_depth: usize,
    nesting: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            ..Default::default()
        }
    }

    /// Parses a whole program. Every declaration that parsed cleanly is
    /// returned, alongside all errors collected while recovering.
    pub fn parse(mut self) -> (Vec<Stmt>, Vec<ParseError>) {
        let mut statements = Vec::new();
        if self.tokens.last().map(|token| token.ty) != Some(TokenTy::Eof) {
            let line = self.tokens.last().map_or(1, |token| token.line);
            self.tokens
                .push(Token::new(TokenTy::Eof, String::new(), None, line));
        }

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        log::debug!(
            "parsed {} statements with {} errors",
            statements.len(),
            self.errors.len()
        );
        (statements, self.errors)
    }

    /// Parses one declaration, recovering at the next statement boundary on
    /// error. Used at the top level and inside blocks alike.
    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.matches([TokenTy::Fun]) {
            self.function().map(Stmt::Function)
        } else if self.matches([TokenTy::Var]) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(err) => {
                log::trace!("recovering from parse error at line {}", err.token.line);
                self.errors.push(err);
                self.synchronize();
                None
            }
        }
    }

    fn function(&mut self) -> Result<Rc<StmtFunction>> {
        let name = self
            .consume(TokenTy::Identifier, "Expect function name.")?
            .clone();
        self.consume(TokenTy::LeftParen, "Expect '(' after function name.")?;

        let mut params = Vec::new();
        if !self.check(TokenTy::RightParen) {
            loop {
                if params.len() >= MAX_ARGUMENTS {
                    let token = self.peek().clone();
                    self.error(token, "Can't have more than 255 parameters.");
                }
                params.push(
                    self.consume(TokenTy::Identifier, "Expect parameter name.")?
                        .clone(),
                );
                if !self.matches([TokenTy::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenTy::RightParen, "Expect ')' after parameters.")?;

        self.consume(TokenTy::LeftBrace, "Expect '{' before function body.")?;
        self.function_depth += 1;
        let body = self.nested(Self::block);
        self.function_depth -= 1;

        Ok(Rc::new(StmtFunction {
            name,
            params,
            body: body?,
        }))
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name = self
            .consume(TokenTy::Identifier, "Expect variable name.")?
            .clone();

        let initializer = self
            .matches([TokenTy::Equal])
            .then(|| self.expression())
            .transpose()?;

        self.consume(
            TokenTy::Semicolon,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&mut self) -> Result<Stmt> {
        if self.matches([TokenTy::For]) {
            self.for_statement()
        } else if self.matches([TokenTy::If]) {
            self.if_statement()
        } else if self.matches([TokenTy::Print]) {
            self.print_statement()
        } else if self.matches([TokenTy::Return]) {
            self.return_statement()
        } else if self.matches([TokenTy::While]) {
            self.while_statement()
        } else if self.matches([TokenTy::LeftBrace]) {
            Ok(Stmt::Block(self.nested(Self::block)?))
        } else {
            self.expression_statement()
        }
    }

    /// `for` has no node of its own: it becomes
    /// `{ initializer; while (condition) { body; increment; } }`.
    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenTy::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.matches([TokenTy::Semicolon]) {
            None
        } else if self.matches([TokenTy::Var]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if self.check(TokenTy::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenTy::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.check(TokenTy::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenTy::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.nested(Self::statement)?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let condition = condition.unwrap_or(Expr::Literal(Literal::Boolean(true)));
        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenTy::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenTy::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.nested(Self::statement)?);
        let else_branch = self
            .matches([TokenTy::Else])
            .then(|| self.nested(Self::statement).map(Box::new))
            .transpose()?;

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let keyword = self.previous().clone();
        let value = self.expression()?;
        self.consume(TokenTy::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print { keyword, value })
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword = self.previous().clone();
        if self.function_depth == 0 {
            self.error(keyword.clone(), "Can't return from top-level code.");
        }

        let value = if self.check(TokenTy::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenTy::Semicolon, "Expect ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenTy::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenTy::RightParen, "Expect ')' after condition.")?;
        let body = Box::new(self.nested(Self::statement)?);

        Ok(Stmt::While { condition, body })
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check(TokenTy::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenTy::RightBrace, "Expect '}' after block.")?;

        Ok(statements)
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenTy::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    fn expression(&mut self) -> Result<Expr> {
        self.nested(Self::assignment)
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr = self.or()?;

        if self.matches([TokenTy::Equal]) {
            let equals = self.previous().clone();
            let value = self.nested(Self::assignment)?;

            if let Expr::Variable(name) = expr {
                return Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                });
            }

            // reported, but the parse goes on with the left-hand side
            self.error(equals, "Invalid assignment target.");
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr> {
        let mut expr = self.and()?;

        while self.matches([TokenTy::Or]) {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut expr = self.equality()?;

        while self.matches([TokenTy::And]) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary([TokenTy::BangEqual, TokenTy::EqualEqual], Self::comparison)
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary(
            [
                TokenTy::Greater,
                TokenTy::GreaterEqual,
                TokenTy::Less,
                TokenTy::LessEqual,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary([TokenTy::Minus, TokenTy::Plus], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr> {
        self.binary([TokenTy::Slash, TokenTy::Star], Self::unary)
    }

    /// One left-associative precedence tier: `operand (op operand)*`.
    fn binary<const N: usize>(
        &mut self,
        operators: [TokenTy; N],
        operand: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut expr = operand(self)?;

        while self.matches(operators) {
            let operator = self.previous().clone();
            let right = operand(self)?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.matches([TokenTy::Bang, TokenTy::Minus]) {
            let operator = self.previous().clone();
            let right = self.nested(Self::unary)?;
            Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            })
        } else {
            self.call()
        }
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;

        while self.matches([TokenTy::LeftParen]) {
            expr = self.finish_call(expr)?;
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments = Vec::new();
        if !self.check(TokenTy::RightParen) {
            loop {
                if arguments.len() >= MAX_ARGUMENTS {
                    let token = self.peek().clone();
                    self.error(token, "Can't have more than 255 arguments.");
                }
                arguments.push(self.expression()?);
                if !self.matches([TokenTy::Comma]) {
                    break;
                }
            }
        }

        let paren = self
            .consume(TokenTy::RightParen, "Expect ')' after arguments.")?
            .clone();

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.matches([TokenTy::False]) {
            Ok(Expr::Literal(Literal::Boolean(false)))
        } else if self.matches([TokenTy::True]) {
            Ok(Expr::Literal(Literal::Boolean(true)))
        } else if self.matches([TokenTy::Nil]) {
            Ok(Expr::Literal(Literal::Nil))
        } else if self.matches([TokenTy::Number, TokenTy::String]) {
            let literal = self.previous().literal.clone().unwrap_or(Literal::Nil);
            Ok(Expr::Literal(literal))
        } else if self.matches([TokenTy::Identifier]) {
            Ok(Expr::Variable(self.previous().clone()))
        } else if self.matches([TokenTy::LeftParen]) {
            let expr = self.expression()?;
            self.consume(TokenTy::RightParen, "Expect ')' after expression.")?;
            Ok(Expr::Grouping(Box::new(expr)))
        } else {
            Err(ParseError::new(self.peek().clone(), "Expect expression."))
        }
    }

    /// Runs a rule one nesting level deeper. Past `MAX_NESTING` the rule is
    /// not entered and the error unwinds to the enclosing declaration.
    fn nested<T>(&mut self, rule: fn(&mut Self) -> Result<T>) -> Result<T> {
        if self.nesting >= MAX_NESTING {
            return Err(ParseError::new(self.peek().clone(), "Too much nesting."));
        }
        self.nesting += 1;
        let result = ensure_sufficient_stack(|| rule(self));
        self.nesting -= 1;
        result
    }

    /// Records an error without unwinding the current rule.
    fn error(&mut self, token: Token, message: &'static str) {
        self.errors.push(ParseError::new(token, message));
    }

    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().ty == TokenTy::Semicolon {
                return;
            }

            match self.peek().ty {
                TokenTy::Class
                | TokenTy::Fun
                | TokenTy::Var
                | TokenTy::For
                | TokenTy::If
                | TokenTy::While
                | TokenTy::Print
                | TokenTy::Return => {
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn consume(&mut self, ty: TokenTy, message: &'static str) -> Result<&Token> {
        if self.check(ty) {
            Ok(self.advance())
        } else {
            Err(ParseError::new(self.peek().clone(), message))
        }
    }

    fn matches<const N: usize>(&mut self, tys: [TokenTy; N]) -> bool {
        if tys.iter().any(|&ty| self.check(ty)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, ty: TokenTy) -> bool {
        !self.is_at_end() && self.peek().ty == ty
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().ty == TokenTy::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub token: Token,
    pub message: Cow<'static, str>,
}

impl ParseError {
    pub fn new(token: Token, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            token,
            message: message.into(),
        }
    }

    /// `" at end"` for the end of input, `" at '<lexeme>'"` otherwise.
    pub fn location(&self) -> String {
        if self.token.ty == TokenTy::Eof {
            " at end".to_owned()
        } else {
            format!(" at '{}'", self.token.lexeme)
        }
    }
}

type Result<T> = std::result::Result<T, ParseError>;
