//! Output formatting for CLI commands.

use std::future::Future;
use std::time::Instant;

use crate::error::Result;

/// Output formatter for CLI.
///
/// Result lines go to stdout; progress labels go to stderr so plan output
/// stays pipeable.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutputFormatter;

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Prints a result line.
    pub fn line(&self, text: impl AsRef<str>) {
        println!("{}", text.as_ref());
    }

    /// Runs `work` under a labeled progress scope, reporting elapsed time.
    ///
    /// # Errors
    ///
    /// Propagates the error of `work`.
    pub async fn report<T, F>(&self, label: &str, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        eprintln!("{label} ...");
        let started = Instant::now();
        let result = work.await?;
        eprintln!("{label} ... {:.2}s", started.elapsed().as_secs_f64());
        Ok(result)
    }
}
