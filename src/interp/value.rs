//! Runtime values of the flat program.
//!
//! Mirrors the tagged values of the C runtime: integers, strings, curried
//! closures and nullary constructors. Closures are immutable and shared;
//! applying one argument to an unsaturated closure copies it.

use std::fmt;
use std::rc::Rc;

use crate::codegen::flat::Callee;
use crate::codegen::MAX_ARITY;
use crate::error::RuntimeError;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Str(Rc<str>),
    Closure(Rc<Closure>),
    /// Constructor value; tag 0 with no fields is unit.
    Con { tag: u32, fields: Rc<[Value]> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub callee: Callee,
    pub arity: usize,
    /// Arguments applied so far, always fewer than `arity`.
    pub args: Vec<Value>,
}

impl Value {
    pub fn unit() -> Self {
        Value::Con {
            tag: 0,
            fields: Rc::from(Vec::new()),
        }
    }

    pub fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    pub fn closure(callee: Callee, arity: usize) -> Self {
        Value::Closure(Rc::new(Closure {
            callee,
            arity,
            args: Vec::new(),
        }))
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Con { tag: 0, fields } if fields.is_empty())
    }

    /// Short name of the value's kind, used in runtime error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Closure(_) => "closure",
            Value::Con { .. } => "constructor",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }
}

/// The printed form, as `main` and `show` render it.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
            Value::Closure(_) => write!(f, "<closure>"),
            Value::Con { tag, .. } => write!(f, "<con {}>", tag),
        }
    }
}

/// Calls the code behind a saturated closure.
pub trait Invoke {
    fn invoke(&mut self, callee: Callee, args: Vec<Value>) -> Result<Value, RuntimeError>;
}

/// Applies one argument to `func`.
///
/// An unsaturated closure yields a fresh closure holding one more argument;
/// `func` itself is never changed, so a partial application can be shared.
/// A saturated closure is invoked with all of its arguments.
pub fn apply(func: &Value, arg: Value, invoker: &mut dyn Invoke) -> Result<Value, RuntimeError> {
    let Value::Closure(c) = func else {
        return Err(RuntimeError::NotAClosure { found: func.kind() });
    };
    let mut args = Vec::with_capacity(c.args.len() + 1);
    args.extend(c.args.iter().cloned());
    args.push(arg);
    if args.len() < c.arity {
        return Ok(Value::Closure(Rc::new(Closure {
            callee: c.callee,
            arity: c.arity,
            args,
        })));
    }
    if c.arity == 0 || c.arity > MAX_ARITY {
        return Err(RuntimeError::UnsupportedArity { arity: c.arity });
    }
    invoker.invoke(c.callee, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Intrinsic;

    /// Records calls instead of running anything.
    struct Recorder(Vec<(Callee, Vec<Value>)>);

    impl Invoke for Recorder {
        fn invoke(&mut self, callee: Callee, args: Vec<Value>) -> Result<Value, RuntimeError> {
            self.0.push((callee, args));
            Ok(Value::Int(0))
        }
    }

    #[test]
    fn partial_application_copies() {
        let mut rec = Recorder(Vec::new());
        let plus = Value::closure(Callee::Intrinsic(Intrinsic::Plus), 2);
        let add1 = apply(&plus, Value::Int(1), &mut rec).unwrap();
        let add2 = apply(&plus, Value::Int(2), &mut rec).unwrap();
        assert!(rec.0.is_empty());

        apply(&add1, Value::Int(10), &mut rec).unwrap();
        apply(&add2, Value::Int(10), &mut rec).unwrap();
        assert_eq!(rec.0[0].1, vec![Value::Int(1), Value::Int(10)]);
        assert_eq!(rec.0[1].1, vec![Value::Int(2), Value::Int(10)]);

        match &plus {
            Value::Closure(c) => assert!(c.args.is_empty()),
            other => panic!("expected closure, got {:?}", other),
        }
    }

    #[test]
    fn applying_a_non_closure_fails() {
        let mut rec = Recorder(Vec::new());
        let err = apply(&Value::Int(3), Value::Int(1), &mut rec).unwrap_err();
        assert_eq!(err, RuntimeError::NotAClosure { found: "int" });
        assert_eq!(err.to_string(), "applying a non-closure value (int)");
    }

    #[test]
    fn oversized_arity_is_rejected_when_saturated() {
        let mut rec = Recorder(Vec::new());
        let mut f = Value::closure(Callee::Intrinsic(Intrinsic::Plus), MAX_ARITY + 1);
        for i in 0..MAX_ARITY {
            f = apply(&f, Value::Int(i as i64), &mut rec).unwrap();
        }
        let err = apply(&f, Value::Int(0), &mut rec).unwrap_err();
        assert_eq!(err, RuntimeError::UnsupportedArity { arity: MAX_ARITY + 1 });
    }

    #[test]
    fn unit_and_printing() {
        assert!(Value::unit().is_unit());
        assert!(!Value::Int(0).is_unit());
        assert_eq!(Value::str("hi").to_string(), "hi");
        assert_eq!(
            Value::Con {
                tag: 2,
                fields: Rc::from(Vec::new())
            }
            .to_string(),
            "<con 2>"
        );
    }
}
