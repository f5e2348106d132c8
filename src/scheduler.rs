//! The microtask queue: a thread-local FIFO of deferred callbacks.
//!
//! Every reaction body defers its real work here, which is what turns
//! synchronous settlement into asynchronous, ordered delivery. Jobs run
//! strictly in the order they were scheduled; a job scheduled by a running
//! job goes to the back of the queue. The core never drains the queue on
//! its own — the host (or a test) pumps it with [`run_one`] or [`drain`].

use std::cell::RefCell;
use std::collections::VecDeque;

use tracing::trace;

type Microtask = Box<dyn FnOnce()>;

thread_local! {
    static QUEUE: RefCell<VecDeque<Microtask>> = const { RefCell::new(VecDeque::new()) };
}

/// Queue `job` to run after the current synchronous execution completes.
/// Never runs it inline.
pub fn schedule(job: impl FnOnce() + 'static) {
    QUEUE.with(|queue| {
        let mut queue = queue.borrow_mut();
        queue.push_back(Box::new(job));
        trace!(depth = queue.len(), "microtask scheduled");
    });
}

/// Run a single microtask. Returns `false` if the queue was empty.
///
/// The job is popped before it runs, so it may schedule further microtasks.
pub fn run_one() -> bool {
    let job = QUEUE.with(|queue| queue.borrow_mut().pop_front());
    match job {
        Some(job) => {
            job();
            true
        }
        None => false,
    }
}

/// Run microtasks until the queue is empty, including jobs scheduled by
/// running jobs.
pub fn drain() {
    while run_one() {}
}

/// Current queue depth.
pub fn pending() -> usize {
    QUEUE.with(|queue| queue.borrow().len())
}
