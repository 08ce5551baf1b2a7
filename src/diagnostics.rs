//! Low-level diagnostic output.
//!
//! Forwarding failures are written here instead of going through `tracing`.
//! Under Lambda, stdout lands in the function's log stream next to the
//! structured log lines.

use std::sync::Arc;

/// A sink for plain-text diagnostic lines.
pub trait Diagnostics: Send + Sync {
    /// Write one line. Implementations add the line terminator.
    fn report(&self, line: &str);
}

/// Writes diagnostic lines to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stdout;

impl Diagnostics for Stdout {
    fn report(&self, line: &str) {
        println!("{}", line);
    }
}

impl<T: Diagnostics + ?Sized> Diagnostics for Arc<T> {
    fn report(&self, line: &str) {
        (**self).report(line)
    }
}
