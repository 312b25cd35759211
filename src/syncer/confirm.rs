//! Interactive confirmation before a plan is applied.

use std::io::{BufRead, IsTerminal, Write};

use tracing::info;

use crate::error::Result;

use super::plan::Plan;

/// Outcome of the confirmation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Not yet resolved.
    Pending,
    /// The plan may be executed.
    Approved,
    /// The plan must not be executed.
    Denied,
}

/// Decides whether an apply run may proceed.
///
/// An empty plan is always denied (there is nothing to execute). Otherwise
/// approval comes from the `--yes` flag, a CI environment, a non-interactive
/// stdin, or an explicit `y` at the prompt.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmationGate {
    assume_yes: bool,
}

impl ConfirmationGate {
    /// Creates a gate; `assume_yes` skips the interactive prompt.
    #[must_use]
    pub const fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }

    /// Resolves the gate for the given plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the interactive prompt cannot be read.
    pub fn resolve(&self, plan: &Plan) -> Result<Confirmation> {
        let stdin = std::io::stdin();
        let non_interactive = std::env::var_os("CI").is_some() || !stdin.is_terminal();
        match decide(plan.is_empty(), self.assume_yes, non_interactive) {
            Confirmation::Pending => {
                print!("Execute Plan? [y/N] ");
                std::io::stdout().flush()?;
                let mut answer = String::new();
                stdin.lock().read_line(&mut answer)?;
                if answer.trim().eq_ignore_ascii_case("y") {
                    Ok(Confirmation::Approved)
                } else {
                    info!("Plan denied at prompt");
                    Ok(Confirmation::Denied)
                }
            }
            resolved => Ok(resolved),
        }
    }
}

/// Pure decision step, separated from terminal and environment probing.
#[must_use]
pub fn decide(plan_is_empty: bool, assume_yes: bool, non_interactive: bool) -> Confirmation {
    if plan_is_empty {
        Confirmation::Denied
    } else if assume_yes || non_interactive {
        Confirmation::Approved
    } else {
        Confirmation::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_plans_are_denied_even_with_yes() {
        assert_eq!(decide(true, true, true), Confirmation::Denied);
        assert_eq!(decide(true, false, false), Confirmation::Denied);
    }

    #[test]
    fn assume_yes_approves_without_prompting() {
        assert_eq!(decide(false, true, false), Confirmation::Approved);
    }

    #[test]
    fn non_interactive_runs_approve() {
        assert_eq!(decide(false, false, true), Confirmation::Approved);
    }

    #[test]
    fn interactive_runs_defer_to_the_prompt() {
        assert_eq!(decide(false, false, false), Confirmation::Pending);
    }
}
