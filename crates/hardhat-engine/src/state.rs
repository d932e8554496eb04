use hardhat_core::{Category, Component};

use crate::narrative::{Narrative, Speaker};

/// What the crew says happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClaimKind {
    /// "Job done", true or not.
    JobDone,
    /// The build was refused because `missing` isn't standing yet.
    MissingDependency { missing: Component },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerClaim {
    pub team: Component,
    pub kind: ClaimKind,
    pub text: String,
}

impl WorkerClaim {
    pub fn job_done(team: Component) -> Self {
        Self {
            team,
            kind: ClaimKind::JobDone,
            text: format!("The {team} team reports: Job done, looks great!"),
        }
    }

    pub fn missing_dependency(team: Component, missing: Component, reason_code: &str) -> Self {
        Self {
            team,
            kind: ClaimKind::MissingDependency { missing },
            text: format!("The {team} team reports: We couldn't start. {reason_code}"),
        }
    }
}

/// The inspector's finding for the turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Verified,
    Fraud,
    CodeViolation,
    NoWorkClaimed,
}

/// Scratch record for a single pipeline run. Discarded when the turn ends.
#[derive(Clone, Debug)]
pub struct TurnState {
    /// Append-only; the first entry is the raw client order.
    pub messages: Vec<Narrative>,
    pub category: Option<Category>,
    pub worker_claim: Option<WorkerClaim>,
    pub verdict: Option<Verdict>,
    pub safety_violation: bool,
}

impl TurnState {
    pub fn new(order: &str) -> Self {
        Self {
            messages: vec![Narrative::new(Speaker::Client, order)],
            category: None,
            worker_claim: None,
            verdict: None,
            safety_violation: false,
        }
    }

    /// The client's order as typed.
    pub fn order(&self) -> &str {
        self.messages.first().map(|m| m.text.as_str()).unwrap_or_default()
    }

    pub fn latest(&self) -> Option<&Narrative> {
        self.messages.last()
    }

    pub fn push(&mut self, message: Narrative) {
        self.messages.push(message);
    }

    /// Everything said after the client's order.
    pub fn replies(&self) -> &[Narrative] {
        self.messages.get(1..).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_turn_is_seeded_with_order() {
        let state = TurnState::new("pour the foundation");
        assert_eq!(state.order(), "pour the foundation");
        assert_eq!(state.messages.len(), 1);
        assert!(state.replies().is_empty());
        assert!(!state.safety_violation);
        assert!(state.category.is_none());
    }

    #[test]
    fn replies_exclude_the_order() {
        let mut state = TurnState::new("frame it");
        state.push(Narrative::new(Speaker::Crew, "a"));
        state.push(Narrative::new(Speaker::Inspector, "b"));
        let replies: Vec<&str> = state.replies().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(replies, vec!["a", "b"]);
        assert_eq!(state.latest().unwrap().text, "b");
        assert_eq!(state.order(), "frame it");
    }

    #[test]
    fn claim_texts() {
        assert_eq!(
            WorkerClaim::job_done(Component::Roof).text,
            "The ROOF team reports: Job done, looks great!"
        );
        assert_eq!(
            WorkerClaim::missing_dependency(
                Component::Framing,
                Component::Foundation,
                "MISSING_DEPENDENCY: Foundation"
            )
            .text,
            "The FRAMING team reports: We couldn't start. MISSING_DEPENDENCY: Foundation"
        );
    }
}
