use std::collections::BTreeSet;

use tracing::{info, warn};

use hardhat_core::{Classifier, ClassifyOptions, Component};
use hardhat_store::SiteLedger;

use crate::error::EngineError;
use crate::narrative::{Narrative, Speaker};
use crate::prompts;
use crate::state::TurnState;

/// First component in build order that isn't standing yet.
pub fn next_needed(site: &BTreeSet<Component>) -> Option<Component> {
    Component::ALL.into_iter().find(|c| !site.contains(c))
}

fn next_task_phrase(next: Option<Component>) -> &'static str {
    match next {
        Some(Component::Foundation) => "pouring the FOUNDATION",
        Some(Component::Framing) => "building the FRAMING",
        Some(Component::Electrical) => "installing ELECTRICAL",
        Some(Component::Roof) => "finishing the ROOF",
        None => "celebrating (House Complete)",
    }
}

/// Turn away an off-topic order and point the client at the next job.
pub async fn respond(
    classifier: &dyn Classifier,
    ledger: &SiteLedger,
    state: &mut TurnState,
) -> Result<(), EngineError> {
    let site = ledger.built_components()?;
    let next_task = next_task_phrase(next_needed(&site));
    let prompt = prompts::grumpy_supervisor(state.order(), next_task);

    info!(next_task, "grumbling at client");
    let reply = match classifier.classify(&prompt, &ClassifyOptions::default()).await {
        Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
        Ok(_) => format!("We don't do that here. Focus: we should be {next_task}."),
        Err(e) => {
            warn!(error_kind = e.error_kind(), error = %e, "supervisor unavailable, using canned refusal");
            format!("We don't do that here. Focus: we should be {next_task}.")
        }
    };

    state.push(Narrative::new(Speaker::Supervisor, format!("Supervisor: {reply}")));
    Ok(())
}
