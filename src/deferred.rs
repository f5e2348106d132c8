//! Settlement capabilities and the deferred handle.
//!
//! A [`Deferred`] drives a promise from outside its own executor, the shape
//! conformance harnesses expect: `{promise, resolve, reject}`.

use crate::promise::Promise;
use crate::resolve::resolve_value;
use crate::value::Value;

/// The fulfill half of a promise's settlement capability. Resolving runs
/// the full resolution procedure, so thenables are adopted.
#[derive(Clone, Debug)]
pub struct Resolver {
    target: Promise,
}

impl Resolver {
    pub(crate) fn new(target: Promise) -> Self {
        Resolver { target }
    }

    /// Resolve the promise with `value`. No-op once the promise settled.
    pub fn resolve(&self, value: Value) {
        resolve_value(&self.target, value);
    }
}

/// The reject half of a promise's settlement capability.
#[derive(Clone, Debug)]
pub struct Rejector {
    target: Promise,
}

impl Rejector {
    pub(crate) fn new(target: Promise) -> Self {
        Rejector { target }
    }

    /// Reject the promise with `reason`. No-op once the promise settled.
    pub fn reject(&self, reason: Value) {
        self.target.settle_rejected(reason);
    }
}

/// A promise plus the capabilities that settle it.
///
/// # Examples
///
/// ```
/// use thenable::{deferred, PromiseState, Value};
///
/// let d = deferred();
/// assert_eq!(d.promise.state(), PromiseState::Pending);
/// d.resolve.resolve(Value::from(1.0));
/// assert_eq!(d.promise.state(), PromiseState::Fulfilled(Value::from(1.0)));
/// ```
#[derive(Debug)]
pub struct Deferred {
    pub promise: Promise,
    pub resolve: Resolver,
    pub reject: Rejector,
}

/// A pending promise whose resolve/reject are exposed for external use.
pub fn deferred() -> Deferred {
    let promise = Promise::pending();
    Deferred {
        resolve: Resolver::new(promise.clone()),
        reject: Rejector::new(promise.clone()),
        promise,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promise::PromiseState;
    use crate::scheduler;
    use crate::value::{ObjectValue, PromiseError};

    #[test]
    fn first_settlement_wins() {
        let d = deferred();
        d.resolve.resolve(Value::from(1.0));
        d.reject.reject(Value::str("late"));
        d.resolve.resolve(Value::from(2.0));
        assert_eq!(d.promise.state(), PromiseState::Fulfilled(Value::from(1.0)));

        let d = deferred();
        d.reject.reject(Value::str("first"));
        d.resolve.resolve(Value::from(1.0));
        d.reject.reject(Value::str("second"));
        assert_eq!(d.promise.state(), PromiseState::Rejected(Value::str("first")));
    }

    #[test]
    fn resolving_with_the_promise_itself_rejects() {
        let d = deferred();
        d.resolve.resolve(Value::Promise(d.promise.clone()));
        assert_eq!(
            d.promise.state(),
            PromiseState::Rejected(Value::Error(PromiseError::SelfResolution))
        );
    }

    #[test]
    fn resolving_with_a_thenable_adopts_it() {
        let thenable = ObjectValue::with_then(|_this, on_fulfilled, _on_rejected| {
            on_fulfilled(Value::str("adopted"));
            Ok(())
        });
        let d = deferred();
        d.resolve.resolve(Value::Object(thenable));
        assert_eq!(
            d.promise.state(),
            PromiseState::Fulfilled(Value::str("adopted"))
        );
    }

    #[test]
    fn resolving_with_a_pending_promise_keeps_the_outcome_open() {
        let other = deferred();
        let d = deferred();
        d.resolve.resolve(Value::Promise(other.promise.clone()));
        assert_eq!(d.promise.state(), PromiseState::Pending);

        other.resolve.resolve(Value::from(3.0));
        scheduler::drain();
        assert_eq!(d.promise.state(), PromiseState::Fulfilled(Value::from(3.0)));
    }
}
