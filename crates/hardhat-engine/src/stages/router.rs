use tracing::{info, warn};

use hardhat_core::{Category, Classifier, ClassifyOptions};

use crate::narrative::{Narrative, Speaker};
use crate::prompts;
use crate::state::TurnState;

/// Classify the cleared order. A failed or off-list reply routes to CHAT.
pub async fn route(classifier: &dyn Classifier, state: &mut TurnState) -> Category {
    let order = state.latest().map(|m| m.text.clone()).unwrap_or_default();
    info!("analyzing request");

    let category = match classifier
        .classify(&prompts::supervisor(&order), &ClassifyOptions::default())
        .await
    {
        Ok(reply) => {
            let category = Category::from_label(&reply);
            if category == Category::Chat && !reply.trim().eq_ignore_ascii_case("CHAT") {
                warn!(reply = reply.trim(), "unrecognized category, routing to CHAT");
            }
            category
        }
        Err(e) => {
            warn!(error_kind = e.error_kind(), error = %e, "classification failed, routing to CHAT");
            Category::Chat
        }
    };

    info!(%category, "assigned team");
    state.push(Narrative::new(
        Speaker::Site,
        format!("SUPERVISOR: Decision -> Assign to {category} Team."),
    ));
    state.category = Some(category);
    category
}
