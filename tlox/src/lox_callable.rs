use crate::{
    interpreter::{Interpreter, RuntimeError},
    object::Object,
};

/// Anything a call expression can invoke. `Debug` doubles as the value's
/// printed form, e.g. `<fn add>`.
pub trait LoxCallable: std::fmt::Debug {
    fn arity(&self) -> usize;
    fn call(&self, intpr: &mut Interpreter, args: Vec<Object>) -> Result<Object, RuntimeError>;
}
