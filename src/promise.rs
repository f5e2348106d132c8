//! The promise itself: settlement state machine, chaining, and the static
//! factories.
//!
//! A [`Promise`] is a shared handle to a two-transition automaton: Pending
//! moves to Fulfilled or Rejected exactly once, and every later transition
//! attempt is a no-op. Reactions registered while pending are drained once,
//! in registration order, at the moment of settlement; each reaction defers
//! its real work to the [`scheduler`](crate::scheduler), so handlers always
//! observe settlement asynchronously.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::deferred::{Rejector, Resolver};
use crate::resolve::resolve_value;
use crate::scheduler;
use crate::value::Value;

/// A `then`/`catch` handler. `Err` models a thrown value.
pub type Handler = Rc<dyn Fn(Value) -> Result<Value, Value>>;

/// A `finally` side-effect callback. `Err` models a thrown value.
pub type FinallyFn = Rc<dyn Fn() -> Result<Value, Value>>;

/// Observable settlement state.
#[derive(Debug, Clone, PartialEq)]
pub enum PromiseState {
    Pending,
    Fulfilled(Value),
    Rejected(Value),
}

/// A queued reaction body: invoked with the settled value or reason at
/// settlement time, it schedules the handler run on the microtask queue.
type Reaction = Box<dyn FnOnce(Value)>;

struct Inner {
    state: PromiseState,
    fulfill_reactions: Vec<Reaction>,
    reject_reactions: Vec<Reaction>,
}

/// The eventual result of an asynchronous operation.
///
/// # Examples
///
/// ```
/// use thenable::{scheduler, Promise, PromiseState, Value};
///
/// let p = Promise::resolve(Value::from(4.0)).then(
///     Some(std::rc::Rc::new(|v: Value| Ok(v))),
///     None,
/// );
/// assert_eq!(p.state(), PromiseState::Pending);
/// scheduler::drain();
/// assert_eq!(p.state(), PromiseState::Fulfilled(Value::from(4.0)));
/// ```
#[derive(Clone)]
pub struct Promise {
    inner: Rc<RefCell<Inner>>,
}

impl Promise {
    /// A promise nothing has settled yet.
    pub fn pending() -> Self {
        Promise {
            inner: Rc::new(RefCell::new(Inner {
                state: PromiseState::Pending,
                fulfill_reactions: Vec::new(),
                reject_reactions: Vec::new(),
            })),
        }
    }

    /// Construct a promise from an executor, which runs synchronously and
    /// settles the promise through the given capabilities. An `Err` return
    /// models a synchronous throw and rejects the promise, unless the
    /// executor already settled it.
    pub fn new(executor: impl FnOnce(Resolver, Rejector) -> Result<(), Value>) -> Self {
        let promise = Promise::pending();
        let resolve = Resolver::new(promise.clone());
        let reject = Rejector::new(promise.clone());
        if let Err(reason) = executor(resolve, reject) {
            promise.settle_rejected(reason);
        }
        promise
    }

    /// A promise that fulfills with `value` on a later microtask. Settlement
    /// is asynchronous even for plain values; thenables are adopted.
    pub fn resolve(value: Value) -> Self {
        let promise = Promise::pending();
        let target = promise.clone();
        scheduler::schedule(move || resolve_value(&target, value));
        promise
    }

    /// A promise that rejects with `reason` on a later microtask.
    pub fn reject(reason: Value) -> Self {
        let promise = Promise::pending();
        let target = promise.clone();
        scheduler::schedule(move || target.settle_rejected(reason));
        promise
    }

    /// Current settlement state.
    pub fn state(&self) -> PromiseState {
        self.inner.borrow().state.clone()
    }

    /// Whether two handles refer to the same promise.
    pub fn ptr_eq(a: &Promise, b: &Promise) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// Pending -> Fulfilled, then drain the fulfillment reactions in
    /// registration order. No-op once settled.
    pub(crate) fn settle_fulfilled(&self, value: Value) {
        let reactions = {
            let mut inner = self.inner.borrow_mut();
            if !matches!(inner.state, PromiseState::Pending) {
                return;
            }
            inner.state = PromiseState::Fulfilled(value.clone());
            trace!(
                reactions = inner.fulfill_reactions.len(),
                "promise fulfilled"
            );
            inner.reject_reactions = Vec::new();
            std::mem::take(&mut inner.fulfill_reactions)
        };
        for reaction in reactions {
            reaction(value.clone());
        }
    }

    /// Pending -> Rejected, then drain the rejection reactions in
    /// registration order. No-op once settled.
    pub(crate) fn settle_rejected(&self, reason: Value) {
        let reactions = {
            let mut inner = self.inner.borrow_mut();
            if !matches!(inner.state, PromiseState::Pending) {
                return;
            }
            inner.state = PromiseState::Rejected(reason.clone());
            trace!(reactions = inner.reject_reactions.len(), "promise rejected");
            inner.fulfill_reactions = Vec::new();
            std::mem::take(&mut inner.reject_reactions)
        };
        for reaction in reactions {
            reaction(reason.clone());
        }
    }

    /// Chain a dependent step. Returns a new promise settled from the
    /// handler's result: a returned value resolves it (thenables are
    /// adopted), a thrown value rejects it. Missing handlers default to
    /// identity (fulfillment) and rethrow (rejection).
    pub fn then(&self, on_fulfilled: Option<Handler>, on_rejected: Option<Handler>) -> Promise {
        let on_fulfilled = on_fulfilled.unwrap_or_else(|| Rc::new(|value: Value| Ok(value)));
        let on_rejected = on_rejected.unwrap_or_else(|| Rc::new(|reason: Value| Err(reason)));
        let derived = Promise::pending();

        let fulfilled_path = {
            let derived = derived.clone();
            move |value: Value| {
                scheduler::schedule(move || match on_fulfilled(value) {
                    Ok(x) => resolve_value(&derived, x),
                    Err(thrown) => derived.settle_rejected(thrown),
                });
            }
        };
        let rejected_path = {
            let derived = derived.clone();
            move |reason: Value| {
                scheduler::schedule(move || match on_rejected(reason) {
                    Ok(x) => resolve_value(&derived, x),
                    Err(thrown) => derived.settle_rejected(thrown),
                });
            }
        };

        let mut inner = self.inner.borrow_mut();
        match inner.state.clone() {
            PromiseState::Pending => {
                inner.fulfill_reactions.push(Box::new(fulfilled_path));
                inner.reject_reactions.push(Box::new(rejected_path));
            }
            PromiseState::Fulfilled(value) => {
                drop(inner);
                fulfilled_path(value);
            }
            PromiseState::Rejected(reason) => {
                drop(inner);
                rejected_path(reason);
            }
        }
        derived
    }

    /// `then(None, Some(on_rejected))`.
    pub fn catch(&self, on_rejected: Handler) -> Promise {
        self.then(None, Some(on_rejected))
    }

    /// Run `on_finally` once the promise settles, either way, then pass the
    /// original outcome through. If the callback throws, or returns a
    /// thenable that rejects, that failure replaces the original outcome; a
    /// returned thenable is awaited before anything propagates.
    pub fn finally(&self, on_finally: FinallyFn) -> Promise {
        let on_fulfilled: Handler = {
            let on_finally = on_finally.clone();
            Rc::new(move |value: Value| {
                let side = Promise::resolve(on_finally()?);
                let pass = value.clone();
                Ok(Value::Promise(side.then(
                    Some(Rc::new(move |_| Ok(pass.clone()))),
                    None,
                )))
            })
        };
        let on_rejected: Handler = Rc::new(move |reason: Value| {
            let side = Promise::resolve(on_finally()?);
            let rethrow = reason.clone();
            Ok(Value::Promise(side.then(
                Some(Rc::new(move |_| Err(rethrow.clone()))),
                None,
            )))
        });
        self.then(Some(on_fulfilled), Some(on_rejected))
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Promise")
            .field("state", &inner.state)
            .field("fulfill_reactions", &inner.fulfill_reactions.len())
            .field("reject_reactions", &inner.reject_reactions.len())
            .finish()
    }
}
