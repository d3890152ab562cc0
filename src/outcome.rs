//! The outcome taxonomy a launched [`crate::task::Task`] produces.

use std::any::Any;

/// A process-wide, uniquely-addressed marker used as the `Value` for
/// void-returning callables, and as the payload pointer returned by
/// [`DynOutcome::get_cancellation`].
///
/// Repeated observations of the same void outcome always yield the
/// same address, matching spec.md's requirement that the sentinel be
/// "an immutable, uniquely-addressed unit marker shared across
/// observations".
pub static UNIT: () = ();

/// The result of running a [`crate::task::Task`]'s callable to
/// completion, or the reason it never ran.
#[derive(Debug)]
pub enum Outcome<R> {
    /// The callable returned normally.
    Value(R),
    /// The task was dropped before it launched, or its callable raised
    /// the [`crate::task::Cancel`] signal.
    Cancelled,
    /// The callable panicked (or otherwise unwound) with a payload
    /// other than [`crate::task::Cancel`].
    Failed(Box<dyn Any + Send>),
}

impl<R> Outcome<R> {
    /// `true` if this is [`Outcome::Value`].
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Value(_))
    }

    /// The contained value, or `None` for `Cancelled`/`Failed`.
    pub fn value(&self) -> Option<&R> {
        match self {
            Outcome::Value(v) => Some(v),
            _ => None,
        }
    }

    /// `true` if this is [`Outcome::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    /// The failure payload, or `None` if this isn't [`Outcome::Failed`].
    pub fn failure(&self) -> Option<&(dyn Any + Send)> {
        match self {
            Outcome::Failed(e) => Some(e.as_ref()),
            _ => None,
        }
    }

    /// Best-effort human-readable message for [`Outcome::Failed`].
    ///
    /// Mirrors the downcast chain a caller of `std::panic::catch_unwind`
    /// would normally perform by hand: panic payloads are almost always
    /// `&'static str` or `String`.
    pub fn failure_message(&self) -> Option<String> {
        self.failure().map(|payload| extract_message(payload))
    }
}

/// Extracts a human-readable message from an opaque failure payload.
pub(crate) fn extract_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown failure".to_owned()
    }
}

/// A type-erased view of an [`Outcome`], usable without knowing `R`.
///
/// `get_value` returns an untyped pointer to the contained value (or
/// to [`UNIT`] for void callables); it is the caller's responsibility
/// to know the real type behind the pointer if they intend to
/// dereference it. This exists purely so that a `Future<R>` can be
/// converted into a `DynFuture` that preserves every inspector except
/// the statically-typed value accessor (spec.md §4.2, §9).
pub trait DynOutcome {
    /// `true` if the outcome is [`Outcome::Value`].
    fn success(&self) -> bool;
    /// Untyped pointer to the value, or `None` if not a `Value`.
    fn get_value(&self) -> Option<*const ()>;
    /// Non-null marker if the outcome is [`Outcome::Cancelled`].
    fn get_cancellation(&self) -> Option<*const ()>;
    /// The failure payload, if the outcome is [`Outcome::Failed`].
    fn get_failure(&self) -> Option<&(dyn Any + Send)>;
    /// Best-effort failure message, if the outcome is
    /// [`Outcome::Failed`].
    fn get_failure_message(&self) -> Option<String>;
}

impl<R> DynOutcome for Outcome<R> {
    fn success(&self) -> bool {
        self.is_success()
    }

    fn get_value(&self) -> Option<*const ()> {
        match self {
            Outcome::Value(v) => Some(v as *const R as *const ()),
            _ => None,
        }
    }

    fn get_cancellation(&self) -> Option<*const ()> {
        match self {
            Outcome::Cancelled => Some(&UNIT as *const ()),
            _ => None,
        }
    }

    fn get_failure(&self) -> Option<&(dyn Any + Send)> {
        self.failure()
    }

    fn get_failure_message(&self) -> Option<String> {
        self.failure_message()
    }
}
