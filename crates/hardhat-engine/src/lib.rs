pub mod dice;
pub mod error;
pub mod game;
pub mod narrative;
pub mod pipeline;
pub mod prompts;
pub mod rules;
pub mod stages;
pub mod state;

pub use dice::{Dice, FixedDice, RandomDice};
pub use error::EngineError;
pub use game::{Game, GameOutcome};
pub use narrative::{Narrative, Speaker};
pub use pipeline::{Pipeline, Stage};
pub use rules::GameRules;
pub use state::{ClaimKind, TurnState, Verdict, WorkerClaim};
