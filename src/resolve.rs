//! The resolution procedure: decides how a value produced for a promise
//! becomes that promise's outcome.
//!
//! Given `target` and a value `x`:
//! 1. `x` is `target` itself: reject with a self-resolution TypeError.
//! 2. `x` is a promise: adopt its eventual outcome.
//! 3. `x` is an object with a callable "then": invoke it with two latched
//!    continuations; the first continuation call wins and every later call
//!    (and any throw after a call) is ignored.
//! 4. Anything else fulfills `target` with `x` as-is.

use std::cell::Cell;
use std::rc::Rc;

use crate::promise::Promise;
use crate::value::{OnSettled, PromiseError, Value};

pub(crate) fn resolve_value(target: &Promise, x: Value) {
    match x {
        Value::Promise(ref other) => {
            if Promise::ptr_eq(other, target) {
                target.settle_rejected(Value::Error(PromiseError::SelfResolution));
                return;
            }
            // Adopt: subscribe to the other promise's outcome. Its value may
            // itself need resolving, so the fulfillment side recurses.
            let on_value = {
                let target = target.clone();
                move |value: Value| {
                    resolve_value(&target, value);
                    Ok(Value::Undefined)
                }
            };
            let on_reason = {
                let target = target.clone();
                move |reason: Value| {
                    target.settle_rejected(reason);
                    Ok(Value::Undefined)
                }
            };
            other.then(Some(Rc::new(on_value)), Some(Rc::new(on_reason)));
        }
        Value::Object(ref object) => match object.read_then() {
            Err(access_error) => target.settle_rejected(access_error),
            Ok(None) => target.settle_fulfilled(x.clone()),
            Ok(Some(then)) => {
                // One latch shared by both continuations: exactly one of
                // fulfill/reject/no-op happens per resolution chain, no
                // matter how often the thenable calls back.
                let called = Rc::new(Cell::new(false));
                let on_fulfilled: OnSettled = {
                    let called = called.clone();
                    let target = target.clone();
                    Rc::new(move |y: Value| {
                        if called.replace(true) {
                            return;
                        }
                        resolve_value(&target, y);
                    })
                };
                let on_rejected: OnSettled = {
                    let called = called.clone();
                    let target = target.clone();
                    Rc::new(move |r: Value| {
                        if called.replace(true) {
                            return;
                        }
                        target.settle_rejected(r);
                    })
                };
                let receiver = x.clone();
                if let Err(thrown) = then(receiver, on_fulfilled, on_rejected) {
                    if !called.replace(true) {
                        target.settle_rejected(thrown);
                    }
                }
            }
        },
        _ => target.settle_fulfilled(x),
    }
}
