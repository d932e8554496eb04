use tracing::{info, instrument};

use hardhat_core::Component;
use hardhat_store::{BuildOutcome, SiteLedger};

use crate::dice::Dice;
use crate::error::EngineError;
use crate::narrative::{Narrative, Speaker};
use crate::rules::GameRules;
use crate::state::{TurnState, WorkerClaim};

/// Dispatch the crew for `team`: pay labor, then report a missing prerequisite,
/// slack off, or do the build.
///
/// The prerequisite is checked before the dice are rolled, so an
/// out-of-order order is always a code violation and never a slacking crew.
/// Rolling first would let a hallucinated out-of-order build be fined as
/// fraud instead.
#[instrument(skip_all, fields(team = %team))]
pub fn execute(
    ledger: &SiteLedger,
    dice: &mut dyn Dice,
    rules: &GameRules,
    team: Component,
    state: &mut TurnState,
) -> Result<(), EngineError> {
    let balance = ledger.debit(rules.labor_cost)?;
    info!(labor = rules.labor_cost, balance, "crew received orders");

    let site = ledger.built_components()?;
    let unmet = team.prerequisite().filter(|p| !site.contains(p));

    let claim = match unmet {
        Some(missing) => missing_dependency(team, missing),
        None if dice.roll() < rules.hallucination_rate => {
            info!("crew hallucinated");
            state.push(Narrative::new(
                Speaker::Site,
                format!(
                    "[SYSTEM ALERT] The {team} Foreman is looking suspicious... (He's drinking a smoothie and his crew is sleeping)"
                ),
            ));
            WorkerClaim::job_done(team)
        }
        None => match ledger.try_build(team)? {
            BuildOutcome::Built => WorkerClaim::job_done(team),
            BuildOutcome::MissingDependency(missing) => missing_dependency(team, missing),
        },
    };

    state.push(Narrative::new(Speaker::Crew, claim.text.clone()));
    state.worker_claim = Some(claim);
    Ok(())
}

fn missing_dependency(team: Component, missing: Component) -> WorkerClaim {
    let reason = BuildOutcome::MissingDependency(missing).reason_code();
    WorkerClaim::missing_dependency(team, missing, &reason)
}
