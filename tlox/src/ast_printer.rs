use std::borrow::Cow;

use crate::{expr::Expr, literal::Literal, stmt::Stmt};

pub fn ast_to_string(expr: &Expr) -> Cow<'_, str> {
    match expr {
        Expr::Binary {
            left,
            operator,
            right,
        }
        | Expr::Logical {
            left,
            operator,
            right,
        } => parenthesize(&operator.lexeme, &[left, right]).into(),
        Expr::Call {
            callee, arguments, ..
        } => {
            let mut exprs: Vec<&Expr> = vec![callee.as_ref()];
            exprs.extend(arguments);
            parenthesize("call", &exprs).into()
        }
        Expr::Grouping(expr) => parenthesize("group", &[expr]).into(),
        Expr::Literal(Literal::String(s)) => format!("{s:?}").into(),
        Expr::Literal(lit) => format!("{lit}").into(),
        Expr::Unary { operator, right } => parenthesize(&operator.lexeme, &[right]).into(),
        Expr::Variable(name) => (&name.lexeme).into(),
        Expr::Assign { name, value } => {
            format!("(= {} {})", name.lexeme, ast_to_string(value)).into()
        }
    }
}

/// Prefix rendering of a statement, e.g. `(var a (+ 1 2))`.
pub fn stmt_to_string(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Expression(expr) => parenthesize(";", &[expr]),
        Stmt::Print { value, .. } => parenthesize("print", &[value]),
        Stmt::Var {
            name,
            initializer: Some(initializer),
        } => format!("(var {} {})", name.lexeme, ast_to_string(initializer)),
        Stmt::Var {
            name,
            initializer: None,
        } => format!("(var {})", name.lexeme),
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => match else_branch {
            Some(else_branch) => format!(
                "(if {} {} {})",
                ast_to_string(condition),
                stmt_to_string(then_branch),
                stmt_to_string(else_branch)
            ),
            None => format!(
                "(if {} {})",
                ast_to_string(condition),
                stmt_to_string(then_branch)
            ),
        },
        Stmt::While { condition, body } => format!(
            "(while {} {})",
            ast_to_string(condition),
            stmt_to_string(body)
        ),
        Stmt::Function(function) => {
            let params: Vec<&str> = function.params.iter().map(|p| p.lexeme.as_str()).collect();
            let mut str = format!("(fun {}({})", function.name.lexeme, params.join(" "));
            push_statements(&mut str, &function.body);
            str.push(')');
            str
        }
        Stmt::Return { value: Some(value), .. } => parenthesize("return", &[value]),
        Stmt::Return { value: None, .. } => "(return)".to_owned(),
        Stmt::Block(statements) => {
            let mut str = String::from("(block");
            push_statements(&mut str, statements);
            str.push(')');
            str
        }
    }
}

fn push_statements(str: &mut String, statements: &[Stmt]) {
    for stmt in statements {
        str.push(' ');
        str.push_str(&stmt_to_string(stmt));
    }
}

fn parenthesize(name: &str, exprs: &[&Expr]) -> String {
    let mut str = String::new();
    str.push('(');
    str.push_str(name);
    for expr in exprs {
        str.push(' ');
        str.push_str(&ast_to_string(expr));
    }
    str.push(')');
    str
}
