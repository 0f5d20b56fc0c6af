//! Transition interception.
//!
//! [`use_middleware`] returns a microstate whose external transitions pass
//! through an interceptor, composed with whatever interceptors the
//! microstate already carried. The chain fires exactly once per external
//! call: transitions that operations, computed fields and initializers
//! perform internally run against standalone microstates that carry no
//! chain, and transitions invoked on query results are re-anchored to their
//! origin's chain rather than adding one of their own.
//!
//! ```
//! use microstate::middleware::{from_fn, use_middleware};
//! use microstate::{args, Engine};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let engine = Engine::default();
//! let calls = Arc::new(AtomicUsize::new(0));
//! let counter = calls.clone();
//!
//! let number = engine.create("Number", 41).unwrap();
//! let number = use_middleware(
//!     from_fn(move |ms, transition, args, next| {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!         next.run(ms, transition, args)
//!     }),
//!     &number,
//! );
//!
//! let next = number.transition("increment", args![]).unwrap();
//! assert_eq!(next.state().unwrap().as_f64(), Some(42.0));
//! assert_eq!(calls.load(Ordering::SeqCst), 1);
//! ```

pub mod chain;
pub mod descriptor;

pub use chain::{from_fn, Chain, FnMiddleware, Middleware, Next};
pub use descriptor::TransitionDescriptor;

use crate::microstate::Microstate;

/// Wrap `microstate`'s transitions with `interceptor`.
///
/// Interceptors registered earlier stay outermost.
pub fn use_middleware<M>(interceptor: M, microstate: &Microstate) -> Microstate
where
    M: Middleware + 'static,
{
    microstate.use_middleware(interceptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::{args, Engine};
    use std::sync::{Arc, Mutex};

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> impl Middleware + 'static {
        let log = log.clone();
        from_fn(move |ms, transition, args, next| {
            log.lock().unwrap().push(format!("{tag}:{}", transition.name()));
            next.run(ms, transition, args)
        })
    }

    #[test]
    fn registration_order_is_call_order() {
        let engine = Engine::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        let ms = engine.create("Number", 1).unwrap();
        let ms = use_middleware(recorder(&log, "first"), &ms);
        let ms = use_middleware(recorder(&log, "second"), &ms);

        ms.transition("increment", args![]).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:increment".to_string(), "second:increment".to_string()]
        );
    }

    #[test]
    fn chain_survives_transitions() {
        let engine = Engine::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        let watched = use_middleware(recorder(&log, "m"), &engine.create("Number", 1).unwrap());

        let ms = watched.transition("increment", args![]).unwrap();
        assert!(ms.middleware().ptr_eq(watched.middleware()));
        let ms = ms.transition("decrement", args![]).unwrap();

        assert_eq!(ms.state().unwrap().as_f64(), Some(1.0));
        assert_eq!(log.lock().unwrap().len(), 2);
        assert_eq!(ms.middleware().len(), 1);
    }

    #[test]
    fn not_calling_next_short_circuits() {
        let engine = Engine::default();
        let ms = engine.create("Number", 5).unwrap();
        let ms = use_middleware(
            from_fn(|ms, _transition, _args, _next| Ok(ms.root())),
            &ms,
        );

        let after = ms.transition("increment", args![]).unwrap();
        assert_eq!(after.state().unwrap().as_f64(), Some(5.0));
    }

    #[test]
    fn interceptor_errors_propagate() {
        let engine = Engine::default();
        let ms = engine.create("Number", 5).unwrap();
        let ms = use_middleware(
            from_fn(|_ms, transition, _args, _next| {
                Err(Error::transition_failed(transition.name(), "frozen"))
            }),
            &ms,
        );

        assert!(matches!(
            ms.transition("increment", args![]),
            Err(Error::TransitionFailed { .. })
        ));
    }

    #[test]
    fn interceptor_sees_path_and_type() {
        let engine = Engine::default();
        let seen = Arc::new(Mutex::new(None));
        let slot = seen.clone();
        let ms = engine
            .create("Object", serde_json::json!({"count": 1}))
            .unwrap();
        let ms = use_middleware(
            from_fn(move |ms, transition, args, next| {
                *slot.lock().unwrap() = Some(transition.clone());
                next.run(ms, transition, args)
            }),
            &ms,
        );

        ms.field("count").unwrap().transition("increment", args![]).unwrap();

        let descriptor = seen.lock().unwrap().clone().unwrap();
        assert_eq!(descriptor.name(), "increment");
        assert_eq!(descriptor.path().to_string(), "count");
        assert_eq!(descriptor.type_name(), "Number");
    }
}
