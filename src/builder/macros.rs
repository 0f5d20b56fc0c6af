//! Macros for paths and transition arguments.

/// Build a [`Path`](crate::core::Path) from keys and indices.
///
/// # Example
///
/// ```
/// use microstate::path;
///
/// let path = path!("todos", 1, "text");
/// assert_eq!(path.to_string(), "todos.1.text");
/// assert!(path!().is_root());
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::core::Path::root()
    };
    ($($seg:expr),+ $(,)?) => {
        $crate::core::Path::from_segments(::std::vec![$($crate::core::Seg::from($seg)),+])
    };
}

/// Build the argument list of a transition.
///
/// Each argument may be anything convertible into an
/// [`Arg`](crate::transition::Arg): plain values, JSON, or microstates.
///
/// # Example
///
/// ```
/// use microstate::{args, Engine};
///
/// let engine = Engine::default();
/// let number = engine.create("Number", 1).unwrap();
/// let next = number.transition("sum", args![2, 3]).unwrap();
/// assert_eq!(next.state().unwrap().as_f64(), Some(6.0));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::transition::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::transition::Arg::from($arg)),+]
    };
}
