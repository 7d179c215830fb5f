//! Receiver-explicit invocation utilities.
//!
//! Repository-local helpers for calling *methods*: callables of the shape
//! `Fn(&Value, &[Value]) -> Result<Value, Value>`, a receiver plus
//! positional arguments. They are plain parameter-forwarding utilities with
//! no shared state; the deferred-value engine does not depend on them and
//! they do not depend on it.

use crate::value::Value;

/// Invokes `f` once with an explicit receiver and argument list.
///
/// Pure forwarding; exists so call sites can name the receiver explicitly
/// instead of threading it through a closure capture.
///
/// # Errors
///
/// Whatever `f` itself returns as its fault channel.
pub fn invoke_with<F>(f: F, receiver: &Value, args: &[Value]) -> Result<Value, Value>
where
    F: Fn(&Value, &[Value]) -> Result<Value, Value>,
{
    f(receiver, args)
}

/// Returns a callable with the receiver fixed and `prefix` bound ahead of
/// call-time arguments.
///
/// Each invocation of the returned callable sees `prefix` first, then its
/// own arguments, in order. The receiver is fixed for the callable's whole
/// lifetime.
pub fn rebind<F>(
    f: F,
    receiver: Value,
    prefix: Vec<Value>,
) -> impl Fn(&[Value]) -> Result<Value, Value>
where
    F: Fn(&Value, &[Value]) -> Result<Value, Value>,
{
    move |call_args: &[Value]| {
        let mut full = prefix.clone();
        full.extend_from_slice(call_args);
        f(&receiver, &full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test method: renders the receiver followed by every argument.
    fn describe(receiver: &Value, args: &[Value]) -> Result<Value, Value> {
        let mut rendered = format!("recv={receiver}");
        for arg in args {
            rendered.push_str(&format!(" {arg}"));
        }
        Ok(Value::text(rendered))
    }

    /// Test method: faults when the receiver is null.
    fn require_receiver(receiver: &Value, _args: &[Value]) -> Result<Value, Value> {
        match receiver {
            Value::Null => Err(Value::text("missing receiver")),
            other => Ok(other.clone()),
        }
    }

    #[test]
    fn invoke_with_forwards_receiver_and_args() {
        let out = invoke_with(describe, &Value::text("ctx"), &[Value::from(1), Value::from(2)])
            .expect("describe never faults");
        assert_eq!(out, Value::text("recv=\"ctx\" 1 2"));
    }

    #[test]
    fn invoke_with_propagates_faults() {
        let err = invoke_with(require_receiver, &Value::Null, &[]);
        assert_eq!(err, Err(Value::text("missing receiver")));
    }

    #[test]
    fn rebind_fixes_receiver_and_orders_arguments() {
        let bound = rebind(
            describe,
            Value::text("ctx"),
            vec![Value::from(1), Value::from(2)],
        );

        let out = bound(&[Value::from(3), Value::from(4)]).expect("describe never faults");
        assert_eq!(out, Value::text("recv=\"ctx\" 1 2 3 4"));
    }

    #[test]
    fn rebind_is_reusable_with_fresh_tail_arguments() {
        let bound = rebind(describe, Value::from(0), vec![Value::text("p")]);

        let first = bound(&[Value::from(1)]).expect("describe never faults");
        let second = bound(&[Value::from(2)]).expect("describe never faults");
        assert_eq!(first, Value::text("recv=0 \"p\" 1"));
        assert_eq!(second, Value::text("recv=0 \"p\" 2"));
    }

    #[test]
    fn rebind_with_empty_prefix_forwards_call_arguments() {
        let bound = rebind(describe, Value::Null, Vec::new());
        let out = bound(&[Value::from(9)]).expect("describe never faults");
        assert_eq!(out, Value::text("recv=null 9"));
    }
}
