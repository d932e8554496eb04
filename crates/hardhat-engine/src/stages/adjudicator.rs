use tracing::{info, warn};

use hardhat_core::{Classifier, ClassifyOptions};

use crate::narrative::{Narrative, Speaker};
use crate::prompts;
use crate::state::{TurnState, Verdict};

/// Issue the permit office ruling for an inspected turn. Emits nothing when
/// the latest message isn't from the inspector.
pub async fn adjudicate(classifier: &dyn Classifier, state: &mut TurnState) {
    let Some(ruling) = state.latest().filter(|m| m.is_inspection()).map(|m| m.text.clone()) else {
        info!("nothing to review");
        return;
    };

    let claim = state
        .worker_claim
        .as_ref()
        .map(|c| c.text.as_str())
        .unwrap_or("No claim.");
    let prompt = prompts::permit_office(state.order(), claim, &ruling);

    info!("reviewing case");
    let text = match classifier.classify(&prompt, &ClassifyOptions::default()).await {
        Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
        Ok(_) => {
            warn!("empty ruling, using canned ruling");
            canned_ruling(state.verdict)
        }
        Err(e) => {
            warn!(error_kind = e.error_kind(), error = %e, "review board unavailable, using canned ruling");
            canned_ruling(state.verdict)
        }
    };

    state.push(Narrative::new(Speaker::PermitOffice, text));
}

fn canned_ruling(verdict: Option<Verdict>) -> String {
    match verdict {
        Some(Verdict::Verified) => "PERMIT OFFICE: Inspection passed. Permit stamped APPROVED.",
        Some(Verdict::Fraud) => {
            "PERMIT OFFICE: Completion claimed, nothing built. Contractor license REVOKED."
        }
        Some(Verdict::CodeViolation) => {
            "PERMIT OFFICE: Client cited for a code violation. Build in order."
        }
        Some(Verdict::NoWorkClaimed) | None => "PERMIT OFFICE: Nothing on file to rule on.",
    }
    .to_string()
}
