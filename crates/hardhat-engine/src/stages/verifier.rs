use tracing::{info, instrument};

use hardhat_store::SiteLedger;

use crate::error::EngineError;
use crate::narrative::{site_list, Narrative, Speaker};
use crate::rules::GameRules;
use crate::state::{ClaimKind, TurnState, Verdict};

/// Check the crew's claim against the actual site and fine any mismatch.
#[instrument(skip_all)]
pub fn verify(ledger: &SiteLedger, rules: &GameRules, state: &mut TurnState) -> Result<Verdict, EngineError> {
    let site = ledger.built_components()?;
    info!(?site, "reviewing work");
    state.push(Narrative::new(
        Speaker::Site,
        format!("INSPECTOR: Reviewing work... (Site State: {})", site_list(&site)),
    ));

    let (verdict, text) = match &state.worker_claim {
        Some(claim) => match claim.kind {
            ClaimKind::JobDone if site.contains(&claim.team) => (
                Verdict::Verified,
                "Inspector: Verified. Work matches blueprints.".to_string(),
            ),
            ClaimKind::JobDone => (
                Verdict::Fraud,
                fine(ledger, rules.fraud_penalty, "FRAUD! Worker claimed completion but nothing was built.")?,
            ),
            ClaimKind::MissingDependency { .. } => (
                Verdict::CodeViolation,
                fine(ledger, rules.code_violation_penalty, "CODE VIOLATION! You tried to build out of order.")?,
            ),
        },
        None => (Verdict::NoWorkClaimed, "Inspector: No work claimed.".to_string()),
    };

    info!(?verdict, "inspection complete");
    state.push(Narrative::new(Speaker::Inspector, text));
    state.verdict = Some(verdict);
    Ok(verdict)
}

fn fine(ledger: &SiteLedger, amount: i64, reason: &str) -> Result<String, EngineError> {
    ledger.debit(amount)?;
    Ok(format!("FINE ISSUED: ${amount} for {reason}"))
}
