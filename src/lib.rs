//! A deferred-computation primitive: an object representing the eventual
//! result of an asynchronous operation, with `then`/`catch`/`finally`
//! chaining, one-time irrevocable settlement, and transparent adoption of
//! any value exposing a callable "then".
//!
//! Execution is single-threaded and cooperative: reactions never run
//! inline, they are deferred onto the FIFO [`scheduler`] queue, and the
//! host decides when to pump it.
//!
//! # Examples
//!
//! ```
//! use std::rc::Rc;
//! use thenable::{scheduler, Promise, PromiseState, Value};
//!
//! let p = Promise::resolve(Value::Undefined)
//!     .then(
//!         Some(Rc::new(|_| Ok(Value::Promise(Promise::resolve(Value::from(4.0)))))),
//!         None,
//!     )
//!     .then(Some(Rc::new(|result: Value| Ok(result))), None);
//!
//! scheduler::drain();
//! assert_eq!(p.state(), PromiseState::Fulfilled(Value::from(4.0)));
//! ```

mod deferred;
mod promise;
mod resolve;
pub mod scheduler;
mod value;

pub use deferred::{deferred, Deferred, Rejector, Resolver};
pub use promise::{FinallyFn, Handler, Promise, PromiseState};
pub use value::{ObjectValue, OnSettled, PromiseError, ThenFn, ThenSlot, Value};
