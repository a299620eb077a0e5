//! Intrinsic entry points. Arithmetic wraps on overflow like the C runtime.

use crate::error::RuntimeError;
use crate::interp::value::Value;
use crate::ir::Intrinsic;

/// Runs `intrinsic` on exactly its arity in arguments. Text written by
/// `putStrLn` is appended to `out`.
pub fn call(intrinsic: Intrinsic, args: &[Value], out: &mut String) -> Result<Value, RuntimeError> {
    if args.len() != intrinsic.arity() {
        return Err(RuntimeError::ArityMismatch {
            expected: intrinsic.arity(),
            found: args.len(),
        });
    }
    let name = intrinsic.name();
    let value = match intrinsic {
        Intrinsic::Plus => {
            let (a, b) = ints(name, args)?;
            Value::Int(a.wrapping_add(b))
        }
        Intrinsic::Minus => {
            let (a, b) = ints(name, args)?;
            Value::Int(a.wrapping_sub(b))
        }
        Intrinsic::Mult => {
            let (a, b) = ints(name, args)?;
            Value::Int(a.wrapping_mul(b))
        }
        Intrinsic::Div => {
            let (a, b) = ints(name, args)?;
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Value::Int(a.wrapping_div(b))
        }
        Intrinsic::Mod => {
            let (a, b) = ints(name, args)?;
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Value::Int(a.wrapping_rem(b))
        }
        Intrinsic::Eq => bool_value(equal(name, &args[0], &args[1])?),
        Intrinsic::Neq => bool_value(!equal(name, &args[0], &args[1])?),
        Intrinsic::Lt => {
            let (a, b) = ints(name, args)?;
            bool_value(a < b)
        }
        Intrinsic::Lte => {
            let (a, b) = ints(name, args)?;
            bool_value(a <= b)
        }
        Intrinsic::Gt => {
            let (a, b) = ints(name, args)?;
            bool_value(a > b)
        }
        Intrinsic::Gte => {
            let (a, b) = ints(name, args)?;
            bool_value(a >= b)
        }
        Intrinsic::Negate => Value::Int(int(name, &args[0])?.wrapping_neg()),
        Intrinsic::Show => match &args[0] {
            Value::Str(_) => args[0].clone(),
            other => Value::str(&other.to_string()),
        },
        Intrinsic::PutStrLn => match &args[0] {
            Value::Str(s) => {
                out.push_str(s);
                out.push('\n');
                Value::unit()
            }
            other => {
                return Err(RuntimeError::TypeMismatch {
                    intrinsic: name,
                    expected: "string",
                    found: other.kind(),
                })
            }
        },
    };
    Ok(value)
}

fn bool_value(b: bool) -> Value {
    Value::Int(b as i64)
}

fn int(intrinsic: &'static str, v: &Value) -> Result<i64, RuntimeError> {
    v.as_int().ok_or(RuntimeError::TypeMismatch {
        intrinsic,
        expected: "int",
        found: v.kind(),
    })
}

fn ints(intrinsic: &'static str, args: &[Value]) -> Result<(i64, i64), RuntimeError> {
    Ok((int(intrinsic, &args[0])?, int(intrinsic, &args[1])?))
}

fn equal(intrinsic: &'static str, a: &Value, b: &Value) -> Result<bool, RuntimeError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x == y),
        (Value::Str(x), Value::Str(y)) => Ok(x == y),
        (Value::Con { tag: x, .. }, Value::Con { tag: y, .. }) => Ok(x == y),
        _ => {
            let culprit = if matches!(a, Value::Closure(_)) { a } else { b };
            Err(RuntimeError::TypeMismatch {
                intrinsic,
                expected: "comparable values",
                found: culprit.kind(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(i: Intrinsic, args: &[Value]) -> Result<Value, RuntimeError> {
        call(i, args, &mut String::new())
    }

    #[test]
    fn arithmetic_wraps() {
        assert_eq!(
            run(Intrinsic::Plus, &[Value::Int(i64::MAX), Value::Int(1)]),
            Ok(Value::Int(i64::MIN))
        );
        assert_eq!(
            run(Intrinsic::Div, &[Value::Int(i64::MIN), Value::Int(-1)]),
            Ok(Value::Int(i64::MIN))
        );
        assert_eq!(run(Intrinsic::Negate, &[Value::Int(i64::MIN)]), Ok(Value::Int(i64::MIN)));
    }

    #[test]
    fn division_truncates_and_checks_zero() {
        assert_eq!(run(Intrinsic::Div, &[Value::Int(-7), Value::Int(2)]), Ok(Value::Int(-3)));
        assert_eq!(run(Intrinsic::Mod, &[Value::Int(-7), Value::Int(2)]), Ok(Value::Int(-1)));
        assert_eq!(
            run(Intrinsic::Mod, &[Value::Int(1), Value::Int(0)]),
            Err(RuntimeError::DivisionByZero)
        );
    }

    #[test]
    fn comparisons_yield_integers() {
        assert_eq!(run(Intrinsic::Lt, &[Value::Int(1), Value::Int(2)]), Ok(Value::Int(1)));
        assert_eq!(run(Intrinsic::Eq, &[Value::str("a"), Value::str("b")]), Ok(Value::Int(0)));
        let err = run(Intrinsic::Eq, &[Value::Int(1), Value::str("1")]).unwrap_err();
        assert_eq!(err.to_string(), "eq expects comparable values, found string");
    }

    #[test]
    fn put_str_ln_writes_output() {
        let mut out = String::new();
        let v = call(Intrinsic::PutStrLn, &[Value::str("hello")], &mut out).unwrap();
        assert!(v.is_unit());
        assert_eq!(out, "hello\n");
        assert_eq!(run(Intrinsic::Show, &[Value::Int(-4)]), Ok(Value::str("-4")));
    }
}
