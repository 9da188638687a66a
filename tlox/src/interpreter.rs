use std::{borrow::Cow, io::Write, rc::Rc};

use crate::{
    config::Config,
    environment::EnvironmentPointer,
    expr::Expr,
    literal::Literal,
    lox_function::LoxFunction,
    native_functions::Clock,
    object::Object,
    stack::ensure_sufficient_stack,
    stmt::Stmt,
    token::Token,
    token_type::TokenTy,
};

/// How a statement finished. `Return` unwinds to the nearest call and is
/// never an error.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Normal,
    Return(Object),
}

pub struct Interpreter {
    environment: EnvironmentPointer,
    output: Box<dyn Write>,
    config: Config,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Interpreter {
    pub fn new(config: Config) -> Self {
        Self::with_output(config, Box::new(std::io::stdout()))
    }

    /// Interpreter whose `print` statements write to `output`.
    pub fn with_output(config: Config, output: Box<dyn Write>) -> Self {
        let mut globals = EnvironmentPointer::default();
        globals.define("clock".to_owned(), Object::Callable(Rc::new(Clock)));
        Self {
            environment: globals,
            output,
            config,
            call_depth: 0,
        }
    }

    /// Runs a program. The result is the value of the last statement when
    /// that is an expression or `print` statement, `nil` otherwise.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<Object> {
        log::debug!("interpreting {} statements", statements.len());
        let mut last = Object::from(());
        for statement in statements {
            last = match statement {
                Stmt::Expression(expr) => self.evaluate(expr)?,
                Stmt::Print { keyword, value } => self.print(keyword, value)?,
                _ => match self.execute(statement)? {
                    Flow::Normal => ().into(),
                    Flow::Return(value) => return Ok(value),
                },
            };
        }
        Ok(last)
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }
            Stmt::Print { keyword, value } => {
                self.print(keyword, value)?;
            }
            Stmt::Var { name, initializer } => {
                let value = initializer
                    .as_ref()
                    .map_or(Ok(().into()), |expr| self.evaluate(expr))?;
                self.environment.define(name.lexeme.to_owned(), value);
            }
            Stmt::Block(stmts) => {
                return self.execute_block(stmts, EnvironmentPointer::new(self.environment.clone()));
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.evaluate(condition)?;
                if Self::is_truthy(&condition) {
                    return self.execute(then_branch);
                } else if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                while Self::is_truthy(&self.evaluate(condition)?) {
                    if let flow @ Flow::Return(_) = self.execute(body)? {
                        return Ok(flow);
                    }
                }
            }
            Stmt::Function(declaration) => {
                log::trace!("declaring function {}", declaration.name.lexeme);
                let function = LoxFunction::new(Rc::clone(declaration), self.environment.clone());
                self.environment.define(
                    declaration.name.lexeme.to_owned(),
                    Object::Callable(Rc::new(function)),
                );
            }
            Stmt::Return { value, .. } => {
                let value = value
                    .as_ref()
                    .map_or(Ok(().into()), |expr| self.evaluate(expr))?;
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    /// Runs `statements` with `env` as the current scope, restoring the
    /// previous scope however the block ends.
    pub(crate) fn execute_block(
        &mut self,
        statements: &[Stmt],
        env: EnvironmentPointer,
    ) -> Result<Flow> {
        let previous = std::mem::replace(&mut self.environment, env);
        let result = self.execute_all(statements);
        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let flow @ Flow::Return(_) = self.execute(stmt)? {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    /// Evaluates and prints `value`, returning what was printed.
    fn print(&mut self, keyword: &Token, value: &Expr) -> Result<Object> {
        let value = self.evaluate(value)?;
        writeln!(self.output, "{value}").map_err(|err| {
            RuntimeError::new(keyword.clone(), format!("Failed to write output: {err}"))
        })?;
        Ok(value)
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Object> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Object> {
        match expr {
            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;

                match operator.ty {
                    TokenTy::Plus => match (left, right) {
                        (
                            Object::Literal(Literal::Number(left)),
                            Object::Literal(Literal::Number(right)),
                        ) => Ok((left + right).into()),
                        (
                            Object::Literal(Literal::String(left)),
                            Object::Literal(Literal::String(right)),
                        ) => Ok(Object::Literal(Literal::String(
                            [left, right].concat().into(),
                        ))),
                        _ => Err(RuntimeError::new(
                            operator.clone(),
                            "Operands must be two numbers or two strings.",
                        )),
                    },
                    TokenTy::Minus => {
                        let (left, right) = Self::check_number_operands(operator, &left, &right)?;
                        Ok((left - right).into())
                    }
                    TokenTy::Star => {
                        let (left, right) = Self::check_number_operands(operator, &left, &right)?;
                        Ok((left * right).into())
                    }
                    TokenTy::Slash => {
                        let (left, right) = Self::check_number_operands(operator, &left, &right)?;
                        Ok((left / right).into())
                    }
                    TokenTy::Greater => {
                        let (left, right) = Self::check_number_operands(operator, &left, &right)?;
                        Ok((left > right).into())
                    }
                    TokenTy::GreaterEqual => {
                        let (left, right) = Self::check_number_operands(operator, &left, &right)?;
                        Ok((left >= right).into())
                    }
                    TokenTy::Less => {
                        let (left, right) = Self::check_number_operands(operator, &left, &right)?;
                        Ok((left < right).into())
                    }
                    TokenTy::LessEqual => {
                        let (left, right) = Self::check_number_operands(operator, &left, &right)?;
                        Ok((left <= right).into())
                    }
                    TokenTy::EqualEqual => Ok(Self::is_equal(&left, &right).into()),
                    TokenTy::BangEqual => Ok((!Self::is_equal(&left, &right)).into()),
                    _ => unreachable!("parser only builds binary nodes from binary operators"),
                }
            }
            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let short_circuits = if operator.ty == TokenTy::Or {
                    Self::is_truthy(&left)
                } else {
                    !Self::is_truthy(&left)
                };
                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }
            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;
                let arguments = arguments
                    .iter()
                    .map(|argument| self.evaluate(argument))
                    .collect::<Result<Vec<_>>>()?;

                let Object::Callable(function) = callee else {
                    return Err(RuntimeError::new(
                        paren.clone(),
                        "Can only call functions and classes.",
                    ));
                };

                if arguments.len() != function.arity() {
                    return Err(RuntimeError::new(
                        paren.clone(),
                        format!(
                            "Expected {} arguments but got {}.",
                            function.arity(),
                            arguments.len()
                        ),
                    ));
                }

                if self.call_depth >= self.config.max_call_depth {
                    return Err(RuntimeError::new(paren.clone(), "Stack overflow."));
                }

                log::trace!("calling {:?} with {} arguments", function, arguments.len());
                self.call_depth += 1;
                let result = function.call(self, arguments);
                self.call_depth -= 1;
                result
            }
            Expr::Grouping(expr) => self.evaluate(expr),
            Expr::Literal(lit) => Ok(Object::Literal(lit.clone())),
            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                match operator.ty {
                    TokenTy::Minus => {
                        let right = Self::check_number_operand(operator, &right)?;
                        Ok((-right).into())
                    }
                    TokenTy::Bang => Ok((!Self::is_truthy(&right)).into()),
                    _ => unreachable!("parser only builds unary nodes from '!' and '-'"),
                }
            }
            Expr::Variable(name) => self.environment.get(name),
            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment.assign(name, value.clone())?;
                Ok(value)
            }
        }
    }

    fn is_equal(left: &Object, right: &Object) -> bool {
        left == right
    }

    /// `nil` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(obj: &Object) -> bool {
        match obj {
            Object::Literal(Literal::Nil) => false,
            Object::Literal(Literal::Boolean(b)) => *b,
            _ => true,
        }
    }

    fn check_number_operand(operator: &Token, operand: &Object) -> Result<f64> {
        if let Object::Literal(Literal::Number(n)) = *operand {
            Ok(n)
        } else {
            Err(RuntimeError::new(
                operator.clone(),
                "Operand must be a number.",
            ))
        }
    }

    fn check_number_operands(
        operator: &Token,
        left: &Object,
        right: &Object,
    ) -> Result<(f64, f64)> {
        match (left, right) {
            (Object::Literal(Literal::Number(left)), Object::Literal(Literal::Number(right))) => {
                Ok((*left, *right))
            }
            (Object::Literal(Literal::Number(_)), _) => Err(RuntimeError::new(
                operator.clone(),
                "Right operand must be a number.",
            )),
            _ => Err(RuntimeError::new(
                operator.clone(),
                "Left operand must be a number.",
            )),
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub token: Token,
    pub message: Cow<'static, str>,
}

impl RuntimeError {
    pub fn new(token: Token, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            token,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, io};

    use super::*;
    use crate::{parser::Parser, scanner::Scanner};

    #[derive(Clone, Default)]
    struct Output(Rc<RefCell<Vec<u8>>>);

    impl Write for Output {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Harness {
        interpreter: Interpreter,
        output: Output,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_config(Config::default())
        }

        fn with_config(config: Config) -> Self {
            let output = Output::default();
            let interpreter = Interpreter::with_output(config, Box::new(output.clone()));
            Self {
                interpreter,
                output,
            }
        }

        fn run(&mut self, source: &str) -> Result<Object> {
            let (tokens, scan_errors) = Scanner::new(source).scan_tokens();
            assert!(scan_errors.is_empty(), "scan errors: {scan_errors:?}");
            let (statements, parse_errors) = Parser::new(tokens).parse();
            assert!(parse_errors.is_empty(), "parse errors: {parse_errors:?}");
            self.interpreter.interpret(&statements)
        }

        fn printed(&self) -> String {
            String::from_utf8(self.output.0.borrow().clone()).unwrap()
        }
    }

    fn eval(source: &str) -> Object {
        Harness::new().run(source).unwrap()
    }

    fn error(source: &str) -> RuntimeError {
        Harness::new().run(source).unwrap_err()
    }

    #[test]
    fn literals() {
        assert_eq!(eval("false;"), Object::from(false));
        assert_eq!(eval("true;"), Object::from(true));
        assert_eq!(eval("nil;"), Object::from(()));
        assert_eq!(eval("100;"), Object::from(100.0));
        assert_eq!(eval("\"hi\";"), Object::from("hi"));
    }

    #[test]
    fn unary() {
        assert_eq!(eval("!false;"), Object::from(true));
        assert_eq!(eval("!true;"), Object::from(false));
        assert_eq!(eval("-1;"), Object::from(-1.0));
        assert_eq!(eval("--1;"), Object::from(1.0));
    }

    #[test]
    fn binary() {
        let cases = [
            ("1 - 1;", Object::from(0.0)),
            ("15 / 3;", Object::from(5.0)),
            ("2 * 2;", Object::from(4.0)),
            ("2 + 12;", Object::from(14.0)),
            ("\"a\" + \"b\";", Object::from("ab")),
            ("5 > 2;", Object::from(true)),
            ("5 >= 5;", Object::from(true)),
            ("4 >= 5;", Object::from(false)),
            ("10 <= 10;", Object::from(true)),
            ("3 < 1;", Object::from(false)),
            ("0 == 0;", Object::from(true)),
            ("3 == 1;", Object::from(false)),
            ("2 != 1;", Object::from(true)),
            ("100 != 100;", Object::from(false)),
        ];
        for (source, expected) in cases {
            assert_eq!(eval(source), expected, "source: {source}");
        }
    }

    #[test]
    fn precedence() {
        assert_eq!(eval("2 + 3 * 4;"), Object::from(14.0));
        assert_eq!(eval("(2 + 3) * 4;"), Object::from(20.0));
        assert_eq!(eval("10 - 4 - 3;"), Object::from(3.0));
    }

    #[test]
    fn equality_never_coerces() {
        assert_eq!(eval("1 == \"1\";"), Object::from(false));
        assert_eq!(eval("nil == false;"), Object::from(false));
        assert_eq!(eval("nil == nil;"), Object::from(true));
        assert_eq!(eval("\"a\" == \"a\";"), Object::from(true));
        assert_eq!(eval("clock == clock;"), Object::from(true));
    }

    #[test]
    fn truthiness() {
        let cases = [
            ("nil", false),
            ("false", false),
            ("true", true),
            ("0", true),
            ("\"\"", true),
            ("\"a\"", true),
        ];
        for (value, expected) in cases {
            assert_eq!(eval(&format!("!!{value};")), Object::from(expected), "value: {value}");
        }
    }

    #[test]
    fn logical_operators_short_circuit_and_return_operands() {
        assert_eq!(eval("nil or \"yes\";"), Object::from("yes"));
        assert_eq!(eval("0 or boom;"), Object::from(0.0));
        assert_eq!(eval("nil and boom;"), Object::from(()));
        assert_eq!(eval("1 and 2;"), Object::from(2.0));
    }

    #[test]
    fn operand_type_errors_name_the_side() {
        let err = error("\"a\" - 1;");
        assert_eq!(err.message, "Left operand must be a number.");
        assert_eq!(err.token.lexeme, "-");
        assert_eq!(error("1 < nil;").message, "Right operand must be a number.");
        assert_eq!(error("-\"a\";").message, "Operand must be a number.");
        assert_eq!(
            error("1 + \"a\";").message,
            "Operands must be two numbers or two strings."
        );
    }

    #[test]
    fn print_writes_display_form() {
        let mut harness = Harness::new();
        let value = harness
            .run("print 1 - 1; print \"one\"; print true; print nil; print 2.5; print clock;")
            .unwrap();
        assert_eq!(value.to_string(), "<native fn>");
        assert_eq!(harness.printed(), "0\none\ntrue\nnil\n2.5\n<native fn>\n");
    }

    #[test]
    fn variables_persist_between_runs() {
        let mut harness = Harness::new();
        harness.run("var a = 1;").unwrap();
        harness.run("var b = 2;").unwrap();
        assert_eq!(harness.run("print a + b;").unwrap(), Object::from(3.0));
        harness.run("a = 2;").unwrap();
        assert_eq!(harness.run("a;").unwrap(), Object::from(2.0));
        assert_eq!(harness.run("var c;").unwrap(), Object::from(()));
        assert_eq!(harness.run("c;").unwrap(), Object::from(()));
    }

    #[test]
    fn assignment_is_an_expression() {
        assert_eq!(eval("var a; var b; a = b = 3; a + b;"), Object::from(6.0));
    }

    #[test]
    fn block_scope() {
        let mut harness = Harness::new();
        harness
            .run("var a = \"outer\"; { var a = \"inner\"; print a; } print a;")
            .unwrap();
        assert_eq!(harness.printed(), "inner\nouter\n");

        let err = harness.run("{ var hidden = 1; } hidden;").unwrap_err();
        assert_eq!(err.message, "Undefined variable 'hidden'.");
        assert_eq!(
            harness.run("undeclared = 1;").unwrap_err().message,
            "Undefined variable 'undeclared'."
        );
    }

    #[test]
    fn runtime_error_restores_scope() {
        let mut harness = Harness::new();
        harness.run("var a = 1;").unwrap();
        assert!(harness.run("{ var a = 2; a = a + nil; }").is_err());
        assert_eq!(harness.run("a;").unwrap(), Object::from(1.0));
        assert!(harness.interpreter.environment.enclosing().is_none());
    }

    #[test]
    fn if_and_while() {
        let mut harness = Harness::new();
        harness
            .run(
                "var i = 0; while (i < 3) { if (i == 1) print \"one\"; else print i; i = i + 1; }",
            )
            .unwrap();
        assert_eq!(harness.printed(), "0\none\n2\n");
    }

    #[test]
    fn for_loop() {
        let mut harness = Harness::new();
        harness
            .run("for (var i = 0; i < 3; i = i + 1) print i; var i = \"after\"; print i;")
            .unwrap();
        assert_eq!(harness.printed(), "0\n1\n2\nafter\n");
    }

    #[test]
    fn functions_and_returns() {
        let mut harness = Harness::new();
        harness
            .run(
                "fun add(a, b) { return a + b; }
                 fun nothing() {}
                 fun early() { return; print \"unreachable\"; }
                 print add(1, 2);
                 print nothing();
                 print early();
                 print add;",
            )
            .unwrap();
        assert_eq!(harness.printed(), "3\nnil\nnil\n<fn add>\n");
    }

    #[test]
    fn return_unwinds_through_loops_and_blocks() {
        assert_eq!(
            eval(
                "fun find() {
                     var i = 0;
                     while (true) {
                         { if (i == 3) { return i * 10; } }
                         i = i + 1;
                     }
                     return -1;
                 }
                 find();"
            ),
            Object::from(30.0)
        );
        assert_eq!(
            eval("fun f() { for (var i = 0; i < 10; i = i + 1) { if (i == 2) return i; } } f();"),
            Object::from(2.0)
        );
    }

    #[test]
    fn recursion() {
        assert_eq!(
            eval("fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } fib(15);"),
            Object::from(610.0)
        );
    }

    #[test]
    fn closures_share_captured_state() {
        let mut harness = Harness::new();
        harness
            .run(
                "fun makeCounter() {
                     var i = 0;
                     fun inc() { i = i + 1; return i; }
                     return inc;
                 }
                 var c = makeCounter();
                 var d = makeCounter();
                 print c(); print c(); print d(); print c();",
            )
            .unwrap();
        assert_eq!(harness.printed(), "1\n2\n1\n3\n");
    }

    #[test]
    fn closures_bind_lexically() {
        let mut harness = Harness::new();
        harness
            .run(
                "var a = \"global\";
                 {
                     fun show() { print a; }
                     show();
                     var a = \"block\";
                     show();
                 }",
            )
            .unwrap();
        // without a resolver the second call sees the later block binding
        assert_eq!(harness.printed(), "global\nblock\n");
    }

    #[test]
    fn call_errors() {
        let err = error("\"not a function\"();");
        assert_eq!(err.message, "Can only call functions and classes.");
        assert_eq!(err.token.lexeme, ")");
        assert_eq!(
            error("fun f(a) {} f(1, 2);").message,
            "Expected 1 arguments but got 2."
        );
        assert_eq!(error("clock(1);").message, "Expected 0 arguments but got 1.");
    }

    #[test]
    fn deep_recursion_is_a_runtime_error() {
        let mut harness = Harness::with_config(Config { max_call_depth: 16 });
        let err = harness.run("fun f(n) { return f(n + 1); } f(0);").unwrap_err();
        assert_eq!(err.message, "Stack overflow.");
        assert_eq!(harness.interpreter.call_depth, 0);
        assert_eq!(
            harness
                .run("fun g(n) { if (n == 0) return 0; return g(n - 1); } g(10);")
                .unwrap(),
            Object::from(0.0)
        );
    }

    #[test]
    fn default_call_depth_survives_nested_bodies() {
        // every level goes through several blocks, a loop and an if before recursing
        let mut harness = Harness::new();
        let value = harness
            .run(
                "fun down(n) {
                     if (n == 0) return 0;
                     { { { { while (true) { if (true) { { { return down(n - 1) + 1; } } } } } } } }
                 }
                 down(250);",
            )
            .unwrap();
        assert_eq!(value, Object::from(250.0));

        let err = harness.run("down(5000);").unwrap_err();
        assert_eq!(err.message, "Stack overflow.");
        assert_eq!(harness.interpreter.call_depth, 0);
        assert!(harness.interpreter.environment.enclosing().is_none());
    }

    #[test]
    fn nan_is_not_equal_to_itself() {
        assert_eq!(eval("var n = 0 / 0; n == n;"), Object::from(false));
        assert_eq!(eval("var n = 0 / 0; n != n;"), Object::from(true));
        assert_eq!(eval("var n = 0 / 0; print n; n;").to_string(), "NaN");
    }

    #[test]
    fn clock_returns_a_number() {
        assert!(matches!(
            eval("clock();"),
            Object::Literal(Literal::Number(n)) if n > 0.0
        ));
    }
}
