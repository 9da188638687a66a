use std::rc::Rc;

use crate::{expr::Expr, token::Token};

/// A function declaration. Shared between the statement tree and every
/// closure created from it.
#[derive(Debug)]
pub struct StmtFunction {
	pub name: Token,
	pub params: Vec<Token>,
	pub body: Vec<Stmt>,
}

#[derive(Debug)]
pub enum Stmt {
	Expression(Expr),
	Print {
		keyword: Token,
		value: Expr,
	},
	Var {
		name: Token,
		initializer: Option<Expr>,
	},
	If {
		condition: Expr,
		then_branch: Box<Stmt>,
		else_branch: Option<Box<Stmt>>,
	},
	While {
		condition: Expr,
		body: Box<Stmt>,
	},
	Function(Rc<StmtFunction>),
	Return {
		keyword: Token,
		value: Option<Expr>,
	},
	Block(Vec<Stmt>),
}
