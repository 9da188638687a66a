use std::rc::Rc;

use crate::{literal::Literal, lox_callable::LoxCallable};

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Object {
    Literal(Literal),
    Callable(Rc<dyn LoxCallable>),
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // numbers compare as IEEE doubles, so NaN never equals itself
            (Object::Literal(left), Object::Literal(right)) => left == right,
            // callables compare by identity
            (Object::Callable(left), Object::Callable(right)) => std::ptr::eq(
                Rc::as_ptr(left) as *const (),
                Rc::as_ptr(right) as *const (),
            ),
            _ => false,
        }
    }
}

impl std::fmt::Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Object::Literal(lit) => lit.fmt(f),
            Object::Callable(callable) => write!(f, "{callable:?}"),
        }
    }
}

impl<T: Into<Literal>> From<T> for Object {
    fn from(lit: T) -> Self {
        Self::Literal(lit.into())
    }
}
