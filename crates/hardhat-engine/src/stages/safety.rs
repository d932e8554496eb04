use tracing::{info, warn};

use crate::narrative::{Narrative, Speaker};
use crate::state::TurnState;

/// Keyword screen run before anything else sees the order.
pub struct SafetyFilter {
    terms: Vec<String>,
}

impl SafetyFilter {
    pub fn new(terms: &[String]) -> Self {
        Self {
            terms: terms.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    /// First forbidden term contained in `input`, ignoring case.
    pub fn find_violation(&self, input: &str) -> Option<&str> {
        let lowered = input.to_lowercase();
        self.terms
            .iter()
            .find(|term| lowered.contains(term.as_str()))
            .map(String::as_str)
    }

    pub fn run(&self, state: &mut TurnState) {
        let input = state.latest().map(|m| m.text.clone()).unwrap_or_default();
        match self.find_violation(&input) {
            Some(term) => {
                warn!(term, "guardrail triggered");
                state.push(Narrative::new(
                    Speaker::SafetyOfficer,
                    format!(
                        "SAFETY OFFICER: Access Denied. The term '{term}' violates job site safety protocols. This incident has been logged."
                    ),
                ));
                state.safety_violation = true;
            }
            None => {
                info!("input cleared safety checks");
                state.safety_violation = false;
            }
        }
    }
}
