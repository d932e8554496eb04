use std::sync::Arc;

use tracing::{field, info_span, Instrument};

use hardhat_core::ids::TurnId;
use hardhat_core::{Category, Classifier};
use hardhat_store::SiteLedger;
use hardhat_telemetry::{STAGE_SPAN, TURN_SPAN};

use crate::dice::Dice;
use crate::error::EngineError;
use crate::rules::GameRules;
use crate::stages::{adjudicator, executor, responder, router, verifier, SafetyFilter};
use crate::state::TurnState;

/// A step of the per-turn decision graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Safety,
    Router,
    Executor,
    Verifier,
    Adjudicator,
    Responder,
    Done,
}

impl Stage {
    /// Name reported as `agent.type` on the stage span.
    pub fn agent_type(&self) -> &'static str {
        match self {
            Self::Safety => "safety_guardrail",
            Self::Router => "supervisor",
            Self::Executor => "worker",
            Self::Verifier => "inspector",
            Self::Adjudicator => "judge",
            Self::Responder => "chatbot",
            Self::Done => "done",
        }
    }

    /// The only edges in the graph:
    ///
    /// ```text
    /// Safety ──violation──▶ Done
    ///   └──▶ Router ──CHAT──▶ Responder ──▶ Done
    ///          └──build──▶ Executor ──▶ Verifier ──▶ Adjudicator ──▶ Done
    /// ```
    pub fn next(self, state: &TurnState) -> Stage {
        match self {
            Self::Safety if state.safety_violation => Self::Done,
            Self::Safety => Self::Router,
            Self::Router => match state.category {
                Some(Category::Build(_)) => Self::Executor,
                Some(Category::Chat) | None => Self::Responder,
            },
            Self::Executor => Self::Verifier,
            Self::Verifier => Self::Adjudicator,
            Self::Adjudicator | Self::Responder | Self::Done => Self::Done,
        }
    }
}

/// Runs one client order through the decision graph against the site ledger.
pub struct Pipeline {
    ledger: SiteLedger,
    classifier: Arc<dyn Classifier>,
    dice: Box<dyn Dice>,
    rules: GameRules,
    safety: SafetyFilter,
}

impl Pipeline {
    pub fn new(
        ledger: SiteLedger,
        classifier: Arc<dyn Classifier>,
        dice: Box<dyn Dice>,
        rules: GameRules,
    ) -> Self {
        let safety = SafetyFilter::new(&rules.forbidden_terms);
        Self {
            ledger,
            classifier,
            dice,
            rules,
            safety,
        }
    }

    pub fn ledger(&self) -> &SiteLedger {
        &self.ledger
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Process one order. A store failure aborts the turn; nothing else does.
    pub async fn run_turn(&mut self, order: &str) -> Result<TurnState, EngineError> {
        let turn_id = TurnId::new();
        let span = info_span!(TURN_SPAN, turn_id = %turn_id);
        self.drive(TurnState::new(order)).instrument(span).await
    }

    async fn drive(&mut self, mut state: TurnState) -> Result<TurnState, EngineError> {
        let mut stage = Stage::Safety;
        while stage != Stage::Done {
            let span = info_span!(
                STAGE_SPAN,
                agent.type = stage.agent_type(),
                worker.team = field::Empty
            );
            self.run_stage(stage, &mut state).instrument(span).await?;
            stage = stage.next(&state);
        }
        Ok(state)
    }

    async fn run_stage(&mut self, stage: Stage, state: &mut TurnState) -> Result<(), EngineError> {
        match stage {
            Stage::Safety => self.safety.run(state),
            Stage::Router => {
                router::route(self.classifier.as_ref(), state).await;
            }
            Stage::Executor => {
                // Only reachable with a build category; see `Stage::next`.
                if let Some(team) = state.category.and_then(|c| c.component()) {
                    tracing::Span::current().record("worker.team", team.as_str());
                    executor::execute(&self.ledger, self.dice.as_mut(), &self.rules, team, state)?;
                }
            }
            Stage::Verifier => {
                verifier::verify(&self.ledger, &self.rules, state)?;
            }
            Stage::Adjudicator => adjudicator::adjudicate(self.classifier.as_ref(), state).await,
            Stage::Responder => responder::respond(self.classifier.as_ref(), &self.ledger, state).await?,
            Stage::Done => {}
        }
        Ok(())
    }
}
