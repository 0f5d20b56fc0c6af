//! Interceptors and the chain that runs them.

use crate::error::Error;
use crate::microstate::Microstate;
use crate::middleware::TransitionDescriptor;
use crate::transition::Arg;
use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

/// Wraps every external transition invoked through a microstate.
///
/// Call `next.run(..)` to continue toward the transition; return without
/// calling it to short-circuit. `next` is consumed, so it runs at most once.
pub trait Middleware: Send + Sync {
    fn call(
        &self,
        microstate: &Microstate,
        transition: &TransitionDescriptor,
        args: &[Arg],
        next: Next<'_>,
    ) -> Result<Microstate, Error>;
}

/// Adapter turning a closure into a [`Middleware`].
pub struct FnMiddleware<F>(F);

/// Build an interceptor from a closure.
///
/// ```
/// use microstate::middleware::from_fn;
///
/// let logger = from_fn(|ms, transition, args, next| {
///     println!("{} at [{}]", transition.name(), transition.path());
///     next.run(ms, transition, args)
/// });
/// # let _ = logger;
/// ```
pub fn from_fn<F>(f: F) -> FnMiddleware<F>
where
    F: Fn(&Microstate, &TransitionDescriptor, &[Arg], Next<'_>) -> Result<Microstate, Error>
        + Send
        + Sync,
{
    FnMiddleware(f)
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&Microstate, &TransitionDescriptor, &[Arg], Next<'_>) -> Result<Microstate, Error>
        + Send
        + Sync,
{
    fn call(
        &self,
        microstate: &Microstate,
        transition: &TransitionDescriptor,
        args: &[Arg],
        next: Next<'_>,
    ) -> Result<Microstate, Error> {
        (self.0)(microstate, transition, args, next)
    }
}

type Terminal<'a> =
    &'a dyn Fn(&Microstate, &TransitionDescriptor, &[Arg]) -> Result<Microstate, Error>;

/// The rest of the chain, ending in the transition itself.
pub struct Next<'a> {
    rest: &'a [Arc<dyn Middleware>],
    terminal: Terminal<'a>,
}

impl Next<'_> {
    pub fn run(
        self,
        microstate: &Microstate,
        transition: &TransitionDescriptor,
        args: &[Arg],
    ) -> Result<Microstate, Error> {
        match self.rest.split_first() {
            Some((head, rest)) => head.call(
                microstate,
                transition,
                args,
                Next {
                    rest,
                    terminal: self.terminal,
                },
            ),
            None => (self.terminal)(microstate, transition, args),
        }
    }
}

/// Ordered interceptors; the first registered runs outermost.
///
/// Held in a shared slice: every root derived by a transition carries the
/// chain along by reference.
#[derive(Clone)]
pub struct Chain {
    interceptors: Arc<[Arc<dyn Middleware>]>,
}

impl Default for Chain {
    fn default() -> Self {
        Chain {
            interceptors: Arc::from(Vec::new()),
        }
    }
}

impl Chain {
    /// A chain with `interceptor` appended innermost.
    pub fn with(&self, interceptor: Arc<dyn Middleware>) -> Chain {
        Chain {
            interceptors: self
                .interceptors
                .iter()
                .cloned()
                .chain(std::iter::once(interceptor))
                .collect(),
        }
    }

    /// This chain wrapped around `inner`.
    pub fn then(&self, inner: &Chain) -> Chain {
        if inner.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return inner.clone();
        }
        Chain {
            interceptors: self
                .interceptors
                .iter()
                .chain(inner.interceptors.iter())
                .cloned()
                .collect(),
        }
    }

    /// Whether both chains share the same interceptors.
    pub fn ptr_eq(&self, other: &Chain) -> bool {
        Arc::ptr_eq(&self.interceptors, &other.interceptors)
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub(crate) fn run(
        &self,
        microstate: &Microstate,
        transition: &TransitionDescriptor,
        args: &[Arg],
        terminal: Terminal<'_>,
    ) -> Result<Microstate, Error> {
        let reached = Cell::new(false);
        let observed = |ms: &Microstate, t: &TransitionDescriptor, a: &[Arg]| {
            reached.set(true);
            terminal(ms, t, a)
        };
        let result = Next {
            rest: &self.interceptors[..],
            terminal: &observed,
        }
        .run(microstate, transition, args);

        if !reached.get() {
            tracing::debug!(
                transition = transition.name(),
                path = %transition.path(),
                "transition short-circuited by middleware"
            );
        }
        result
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}
