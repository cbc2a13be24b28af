//! Boxing and unboxing at the proxy boundary
//!
//! The interceptor chain deals in the uniform boxed representation only.
//! Arguments are checked against the declared parameter kinds when marshalled
//! into the argument array; return values are unboxed with exact kind
//! correspondence, and wide primitives (64-bit) must come back through the
//! wide return path rather than the generic one.

use wirecore_domain::{Error, MethodSignature, ParamType, Result, Value, ValueKind};

/// Whether a boxed value may occupy a slot of the given kind
pub fn kind_accepts(kind: ValueKind, value: &Value) -> bool {
    match kind {
        // an array is itself a reference, so it fits any reference slot
        ValueKind::Reference => matches!(
            value,
            Value::Null | Value::Str(_) | Value::Ref(_) | Value::Array(_)
        ),
        ValueKind::Array => matches!(value, Value::Null | Value::Array(_) | Value::Ref(_)),
        ValueKind::Void => matches!(value, Value::Unit),
        primitive => value.kind() == primitive,
    }
}

/// Verify and box the argument array for one invocation.
///
/// Arity must match the signature exactly and every argument must occupy its
/// declared slot kind; primitives are never silently widened or narrowed.
pub fn box_args(signature: &MethodSignature, args: Vec<Value>) -> Result<Vec<Value>> {
    if args.len() != signature.params.len() {
        return Err(Error::proxy_generation(format!(
            "method {} expects {} argument(s), got {}",
            signature,
            signature.params.len(),
            args.len()
        )));
    }
    for (param, arg) in signature.params.iter().zip(args.iter()) {
        if !kind_accepts(param.kind, arg) {
            return Err(Error::proxy_generation(format!(
                "argument for {} slot {} does not fit kind {:?}: {arg:?}",
                signature, param.key, param.kind
            )));
        }
    }
    Ok(args)
}

/// Unbox a chain result back into the declared return slot.
///
/// A void method must produce `Unit`; wide kinds take the wide return path
/// (the value must already be exactly `I64`/`F64`); `Null` is legal only for
/// reference and array returns.
pub fn unbox_return(ret: &ParamType, value: Value) -> Result<Value> {
    match ret.kind {
        ValueKind::Void => {
            if matches!(value, Value::Unit | Value::Null) {
                Ok(Value::Unit)
            } else {
                Err(wrong_return(ret, &value))
            }
        }
        kind if kind.is_wide() => {
            // wide return path: exact 64-bit correspondence required
            if value.kind() == kind {
                Ok(value)
            } else {
                Err(wrong_return(ret, &value))
            }
        }
        kind => {
            if kind_accepts(kind, &value) {
                Ok(value)
            } else {
                Err(wrong_return(ret, &value))
            }
        }
    }
}

fn wrong_return(ret: &ParamType, value: &Value) -> Error {
    Error::proxy_generation(format!(
        "return value does not fit {} ({:?}): {value:?}",
        ret.key, ret.kind
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wirecore_domain::TypeKey;

    fn long_returning() -> ParamType {
        ParamType::primitive("long", ValueKind::I64)
    }

    #[test]
    fn test_box_args_checks_arity() {
        let sig = MethodSignature::new(
            "greet",
            vec![ParamType::reference("java.lang.String")],
            ParamType::void(),
        );
        assert!(box_args(&sig, vec![]).is_err());
        assert!(box_args(&sig, vec![Value::from("hi")]).is_ok());
    }

    #[test]
    fn test_box_args_rejects_kind_mismatch() {
        let sig = MethodSignature::new(
            "count",
            vec![ParamType::primitive("int", ValueKind::I32)],
            ParamType::void(),
        );
        assert!(box_args(&sig, vec![Value::I64(1)]).is_err());
        assert!(box_args(&sig, vec![Value::I32(1)]).is_ok());
    }

    #[test]
    fn test_wide_return_requires_exact_wide_kind() {
        let err = unbox_return(&long_returning(), Value::I32(7));
        assert!(err.is_err());
        let ok = unbox_return(&long_returning(), Value::I64(7)).unwrap();
        assert_eq!(ok, Value::I64(7));
    }

    #[test]
    fn test_null_only_fits_reference_and_array_returns() {
        assert!(unbox_return(&ParamType::reference("demo.Greeter"), Value::Null).is_ok());
        assert!(
            unbox_return(
                &ParamType::array(&TypeKey::new("demo.Greeter")),
                Value::Null
            )
            .is_ok()
        );
        assert!(unbox_return(&ParamType::primitive("int", ValueKind::I32), Value::Null).is_err());
    }

    #[test]
    fn test_void_return_normalizes_to_unit() {
        let unit = unbox_return(&ParamType::void(), Value::Unit).unwrap();
        assert_eq!(unit, Value::Unit);
        assert!(unbox_return(&ParamType::void(), Value::I32(0)).is_err());
    }

    #[test]
    fn test_array_value_fits_a_reference_slot() {
        let sig = MethodSignature::new(
            "accept",
            vec![ParamType::reference("java.lang.Object")],
            ParamType::reference("java.lang.Object"),
        );
        let array = Value::Array(vec![Value::from("a")]);
        assert!(box_args(&sig, vec![array.clone()]).is_ok());
        assert_eq!(unbox_return(&sig.ret, array.clone()).unwrap(), array);
        // the converse stays strict: a plain reference does not fit an
        // array-declared slot unless it is opaque or null
        assert!(
            unbox_return(&ParamType::array(&TypeKey::new("demo.Greeter")), Value::from("a"))
                .is_err()
        );
    }

    #[test]
    fn test_array_return_is_first_class() {
        let ret = ParamType::array(&TypeKey::new("demo.Greeter"));
        let value = Value::Array(vec![Value::from("a"), Value::from("b")]);
        assert_eq!(unbox_return(&ret, value.clone()).unwrap(), value);
    }
}
