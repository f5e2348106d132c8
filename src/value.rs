//! The dynamic value model the settlement machinery moves around.
//!
//! A `Value` is anything a handler can produce or a promise can settle with.
//! Objects are modeled down to the single aspect the resolution procedure
//! ever observes: their "then" member (see [`ThenSlot`]).

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::promise::Promise;

/// Errors the settlement core manufactures itself. Everything a caller
/// throws travels as the caller's own [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromiseError {
    /// A resolution chain tried to resolve a promise with itself.
    #[error("TypeError: promise and its resolution value are the same")]
    SelfResolution,
}

/// A continuation handed to a foreign "then": called with the value or
/// reason the thenable settles with. Repeat calls are ignored by the
/// resolution latch, so implementations may call it any number of times.
pub type OnSettled = Rc<dyn Fn(Value)>;

/// A callable "then" member. Receives the thenable itself, the fulfill
/// continuation, and the reject continuation. Returning `Err` models a
/// synchronous throw out of "then".
pub type ThenFn = Rc<dyn Fn(Value, OnSettled, OnSettled) -> Result<(), Value>>;

/// What an object's "then" member looks like to the resolution procedure.
pub enum ThenSlot {
    /// No "then" member at all.
    Missing,
    /// A "then" member exists but is plain data.
    NotCallable(Value),
    /// A callable "then": the object is a thenable.
    Callable(ThenFn),
    /// Reading "then" throws the carried value.
    Poisoned(Value),
}

/// An object as seen by the resolution procedure: its "then" slot.
pub struct ObjectValue {
    then: ThenSlot,
}

impl ObjectValue {
    /// A plain object with no "then" member.
    pub fn plain() -> Rc<Self> {
        Rc::new(Self {
            then: ThenSlot::Missing,
        })
    }

    /// A thenable whose "then" is the given function.
    pub fn with_then(
        then: impl Fn(Value, OnSettled, OnSettled) -> Result<(), Value> + 'static,
    ) -> Rc<Self> {
        Rc::new(Self {
            then: ThenSlot::Callable(Rc::new(then)),
        })
    }

    /// An object whose "then" member is plain data rather than callable.
    pub fn with_data_then(value: Value) -> Rc<Self> {
        Rc::new(Self {
            then: ThenSlot::NotCallable(value),
        })
    }

    /// An object whose "then" member throws `reason` when read.
    pub fn with_poisoned_then(reason: Value) -> Rc<Self> {
        Rc::new(Self {
            then: ThenSlot::Poisoned(reason),
        })
    }

    /// Read the "then" member. `Err` is the thrown access error,
    /// `Ok(None)` means the object is not a thenable.
    pub(crate) fn read_then(&self) -> Result<Option<ThenFn>, Value> {
        match &self.then {
            ThenSlot::Missing | ThenSlot::NotCallable(_) => Ok(None),
            ThenSlot::Callable(then) => Ok(Some(then.clone())),
            ThenSlot::Poisoned(reason) => Err(reason.clone()),
        }
    }
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = match &self.then {
            ThenSlot::Missing => "missing",
            ThenSlot::NotCallable(_) => "not-callable",
            ThenSlot::Callable(_) => "callable",
            ThenSlot::Poisoned(_) => "poisoned",
        };
        f.debug_struct("ObjectValue").field("then", &slot).finish()
    }
}

/// A dynamically-typed value: a settlement outcome, a handler result, or a
/// thrown reason.
#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Error(PromiseError),
    Object(Rc<ObjectValue>),
    Promise(Promise),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl PartialEq for Value {
    /// Structural for scalars; identity for objects and promises.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Promise(a), Value::Promise(b)) => Promise::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_equality_is_structural() {
        assert_eq!(Value::from(4.0), Value::Number(4.0));
        assert_eq!(Value::str("hi"), Value::from("hi"));
        assert_ne!(Value::Null, Value::Undefined);
        assert_ne!(Value::from(1.0), Value::from(true));
    }

    #[test]
    fn object_equality_is_identity() {
        let a = ObjectValue::plain();
        let b = ObjectValue::plain();
        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a), Value::Object(b));
    }

    #[test]
    fn poisoned_then_throws_on_read() {
        let obj = ObjectValue::with_poisoned_then(Value::str("boom"));
        let thrown = match obj.read_then() {
            Err(reason) => reason,
            Ok(_) => panic!("reading a poisoned then must throw"),
        };
        assert_eq!(thrown, Value::str("boom"));
    }

    #[test]
    fn data_then_is_not_a_thenable() {
        let obj = ObjectValue::with_data_then(Value::from(1.0));
        assert!(obj.read_then().unwrap().is_none());
    }

    #[test]
    fn self_resolution_error_message() {
        assert_eq!(
            PromiseError::SelfResolution.to_string(),
            "TypeError: promise and its resolution value are the same"
        );
    }
}
