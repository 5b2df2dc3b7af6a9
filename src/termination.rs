//! A [`std::process::Termination`] replacement that can be implemented for foreign types and
//! turned into a process exit code manually.

use std::fmt::Debug;

/// Trait for types that can be returned from the application closure passed to
/// [`gui::run`][crate::gui::run].
pub trait Termination {
    /// Logs any contained error and returns the process exit code to use.
    fn report(self) -> i32;
}

impl Termination for () {
    fn report(self) -> i32 {
        0
    }
}

impl Termination for std::convert::Infallible {
    fn report(self) -> i32 {
        match self {}
    }
}

impl<E: Debug> Termination for Result<(), E> {
    fn report(self) -> i32 {
        match self {
            Ok(()) => 0,
            Err(e) => {
                log::error!("fatal error: {e:?}");
                1
            }
        }
    }
}
