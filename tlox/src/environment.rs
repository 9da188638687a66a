use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{interpreter::RuntimeError, object::Object, token::Token};

/// Shared handle to one scope. Blocks, calls and closures all hold these;
/// a scope lives as long as its longest holder.
#[derive(Debug, Default, Clone)]
pub struct EnvironmentPointer(Rc<RefCell<Environment>>);

impl EnvironmentPointer {
	pub fn new(enclosing: EnvironmentPointer) -> Self {
		Self(Rc::new(RefCell::new(Environment::new(enclosing))))
	}

	/// Binds `name` in this scope only, replacing any binding already here.
	#[inline]
	pub fn define(&mut self, name: String, value: Object) {
		self.0.borrow_mut().define(name, value);
	}

	#[inline]
	pub fn get(&self, name: &Token) -> Result<Object, RuntimeError> {
		self.0.borrow().get(name)
	}

	#[inline]
	pub fn assign(&mut self, name: &Token, value: Object) -> Result<(), RuntimeError> {
		self.0.borrow_mut().assign(name, value)
	}

	#[cfg(test)]
	pub(crate) fn enclosing(&self) -> Option<EnvironmentPointer> {
		self.0.borrow().enclosing.clone()
	}

	#[cfg(test)]
	pub(crate) fn same_scope(&self, other: &EnvironmentPointer) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

#[derive(Debug, Default)]
struct Environment {
	enclosing: Option<EnvironmentPointer>,
	values: HashMap<String, Object>,
}

impl Environment {
	fn new(enclosing: EnvironmentPointer) -> Self {
		Self {
			enclosing: Some(enclosing),
			..Default::default()
		}
	}

	fn define(&mut self, name: String, value: Object) {
		self.values.insert(name, value);
	}

	fn get(&self, name: &Token) -> Result<Object, RuntimeError> {
		if let Some(obj) = self.values.get(&name.lexeme) {
			Ok(obj.clone())
		} else if let Some(enclosing) = self.enclosing.as_ref() {
			enclosing.get(name)
		} else {
			Err(undefined(name))
		}
	}

	fn assign(&mut self, name: &Token, value: Object) -> Result<(), RuntimeError> {
		if let Some(slot) = self.values.get_mut(&name.lexeme) {
			*slot = value;
			Ok(())
		} else if let Some(enclosing) = self.enclosing.as_mut() {
			enclosing.assign(name, value)
		} else {
			Err(undefined(name))
		}
	}
}

fn undefined(name: &Token) -> RuntimeError {
	RuntimeError::new(
		name.clone(),
		format!("Undefined variable '{}'.", name.lexeme),
	)
}
