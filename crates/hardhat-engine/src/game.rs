use std::collections::BTreeSet;
use std::future::Future;
use std::io::{BufRead, Write};

use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use hardhat_core::ids::GameId;
use hardhat_core::Component;

use crate::error::EngineError;
use crate::narrative::site_list;
use crate::pipeline::Pipeline;

/// How a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameOutcome {
    Bankrupt,
    Complete,
    Quit,
}

const RULE: &str = "---------------------------------------------------------";

/// Lines buffered between the reader thread and the game.
const INPUT_BUFFER: usize = 16;

/// Read `reader` line by line on a dedicated OS thread and forward each line.
/// The channel closes at end of input or on a read error. The thread is
/// detached and never holds up runtime shutdown.
pub fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(INPUT_BUFFER);
    std::thread::spawn(move || {
        for line in reader.lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
        debug!("input closed");
    });
    rx
}

/// Console front end: reads orders line by line and prints each turn's replies.
pub struct Game {
    pipeline: Pipeline,
}

impl Game {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Play until the game ends or `interrupt` resolves. An interrupt is a
    /// graceful quit, even while waiting for the client's next line.
    pub async fn play_until<W, F>(
        &mut self,
        input: mpsc::Receiver<String>,
        out: &mut W,
        interrupt: F,
    ) -> Result<GameOutcome, EngineError>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        let finished = tokio::select! {
            result = self.play(input, out) => Some(result),
            _ = interrupt => None,
        };
        match finished {
            Some(result) => result,
            None => {
                writeln!(out, "\nExiting game...")?;
                out.flush()?;
                info!("game interrupted");
                Ok(GameOutcome::Quit)
            }
        }
    }

    /// Reset the site and play until bankruptcy, completion, or the client
    /// walks away. Only store and console failures are returned as errors.
    #[instrument(skip_all)]
    pub async fn play<W: Write>(
        &mut self,
        mut input: mpsc::Receiver<String>,
        out: &mut W,
    ) -> Result<GameOutcome, EngineError> {
        let budget = self.pipeline.rules().initial_budget;
        self.pipeline.ledger().reset_game(budget)?;
        info!(game_id = %GameId::new(), budget, "new game");
        self.banner(out)?;

        loop {
            let ledger = self.pipeline.ledger();
            let budget = ledger.budget()?;
            let site = ledger.built_components()?;
            writeln!(out, "\nCurrent Budget: ${budget} | Site Progress: {}", site_list(&site))?;

            // A finished house wins even when the last job overdrew the budget.
            if site.len() == Component::ALL.len() {
                writeln!(out, "HOUSE COMPLETED!")?;
                info!(budget, "game over: complete");
                return Ok(GameOutcome::Complete);
            }
            if budget <= 0 {
                writeln!(out, "BANKRUPT.")?;
                info!(budget, "game over: bankrupt");
                return Ok(GameOutcome::Bankrupt);
            }

            write!(out, "\n{}", prompt_for(&site))?;
            out.flush()?;

            let Some(line) = input.recv().await else {
                writeln!(out, "\nExiting game...")?;
                return Ok(GameOutcome::Quit);
            };
            if is_quit(&line) {
                writeln!(out, "Exiting game...")?;
                return Ok(GameOutcome::Quit);
            }

            let state = self.pipeline.run_turn(&line).await?;
            writeln!(out, "\n--- SITE REPORT ---")?;
            for message in state.replies() {
                writeln!(out, "  {message}")?;
            }
        }
    }

    fn banner<W: Write>(&self, out: &mut W) -> Result<(), EngineError> {
        let rules = self.pipeline.rules();
        writeln!(out, "\n{RULE}")?;
        writeln!(out, "CONSTRUCTION CREW: A JOB SITE SIMULATOR")?;
        writeln!(out, "{RULE}")?;
        writeln!(out, "OBJECTIVE: Build a complete house within the ${} budget.", rules.initial_budget)?;
        writeln!(out, "REQUIRED STEPS (In Order):")?;
        for (i, component) in Component::ALL.iter().enumerate() {
            writeln!(out, "  {}. {:<10} [- ${}]", i + 1, component.as_str(), rules.labor_cost)?;
        }
        writeln!(out, "\nRULES:")?;
        writeln!(out, "  - Strict safety protocols active (No shortcuts, no hazards).")?;
        writeln!(out, "  - The Inspector verifies all work.")?;
        writeln!(
            out,
            "  - Crews may slack off ({:.0}% chance). Watch your budget!",
            rules.hallucination_rate * 100.0
        )?;
        writeln!(out, "{RULE}")?;
        Ok(())
    }
}

fn is_quit(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit")
}

fn prompt_for(site: &BTreeSet<Component>) -> &'static str {
    match site.len() {
        0 => "CLIENT ORDER (Start with the Foundation) >> ",
        3 => "CLIENT ORDER (Final Step!) >> ",
        _ => "CLIENT ORDER >> ",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::oneshot;

    use crate::dice::FixedDice;
    use crate::rules::GameRules;
    use hardhat_llm::{MockClassifier, MockResponse};
    use hardhat_store::{Database, SiteLedger};

    fn game(responses: Vec<MockResponse>, rolls: Vec<f64>, rules: GameRules) -> (Game, Arc<MockClassifier>) {
        let ledger = SiteLedger::new(Database::in_memory().unwrap());
        let mock = Arc::new(MockClassifier::new(responses));
        let pipeline = Pipeline::new(ledger, mock.clone(), Box::new(FixedDice::sequence(rolls)), rules);
        (Game::new(pipeline), mock)
    }

    async fn play(game: &mut Game, script: &str) -> (GameOutcome, String) {
        let mut out = Vec::new();
        let input = spawn_line_reader(Cursor::new(script.to_string()));
        let outcome = game.play(input, &mut out).await.unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn line_reader_forwards_lines_then_closes() {
        let mut rx = spawn_line_reader(Cursor::new("pour the slab\r\nframe it\n".to_string()));
        assert_eq!(rx.recv().await.as_deref(), Some("pour the slab"));
        assert_eq!(rx.recv().await.as_deref(), Some("frame it"));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn interrupt_while_waiting_for_input_quits() {
        let (mut game, mock) = game(vec![], vec![], GameRules::default());
        // Sender stays alive: the game is parked on an order that never comes.
        let (_tx, rx) = mpsc::channel::<String>(1);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let mut out = Vec::new();

        let interrupt = async {
            let _ = stop_rx.await;
        };
        let outcome = {
            let play = game.play_until(rx, &mut out, interrupt);
            tokio::pin!(play);

            assert!(
                tokio::time::timeout(Duration::from_millis(50), &mut play).await.is_err(),
                "game should be waiting for input"
            );
            stop_tx.send(()).unwrap();
            tokio::time::timeout(Duration::from_secs(1), play)
                .await
                .expect("interrupt must end the game")
                .unwrap()
        };

        assert_eq!(outcome, GameOutcome::Quit);
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("CLIENT ORDER (Start with the Foundation) >> "));
        assert!(out.trim_end().ends_with("Exiting game..."));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn play_until_returns_normal_outcome_without_interrupt() {
        let (mut game, _) = game(vec![], vec![], GameRules::default());
        let mut out = Vec::new();
        let input = spawn_line_reader(Cursor::new("quit\n".to_string()));

        let outcome = game
            .play_until(input, &mut out, std::future::pending())
            .await
            .unwrap();
        assert_eq!(outcome, GameOutcome::Quit);
        assert_eq!(String::from_utf8(out).unwrap().matches("Exiting game...").count(), 1);
    }

    #[test]
    fn quit_tokens_ignore_case_and_padding() {
        assert!(is_quit("quit"));
        assert!(is_quit("  EXIT \r"));
        assert!(is_quit("Quit"));
        assert!(!is_quit("quit now"));
        assert!(!is_quit(""));
    }

    #[test]
    fn prompt_tracks_progress() {
        let mut site = BTreeSet::new();
        assert!(prompt_for(&site).contains("Start with the Foundation"));
        site.insert(Component::Foundation);
        assert_eq!(prompt_for(&site), "CLIENT ORDER >> ");
        site.insert(Component::Framing);
        site.insert(Component::Electrical);
        assert!(prompt_for(&site).contains("Final Step!"));
    }

    #[tokio::test]
    async fn foundation_then_pool_then_quit() {
        let (mut game, mock) = game(
            vec![
                MockResponse::text("FOUNDATION"),
                MockResponse::text("PERMIT OFFICE: APPROVED."),
                MockResponse::text("CHAT"),
                MockResponse::text("No pools. Frame the house."),
            ],
            vec![0.9],
            GameRules::default(),
        );

        let (outcome, out) = play(&mut game, "pour the foundation\nbuild a pool\nquit\n").await;

        assert_eq!(outcome, GameOutcome::Quit);
        let ledger = game.pipeline().ledger();
        assert_eq!(ledger.budget().unwrap(), 1800);
        assert_eq!(
            ledger.built_components().unwrap(),
            BTreeSet::from([Component::Foundation])
        );
        assert!(mock.prompts()[3].contains("building the FRAMING"));
        assert!(out.contains("  Inspector: Verified. Work matches blueprints."));
        assert!(out.contains("  Supervisor: No pools. Frame the house."));
        assert!(out.contains("Current Budget: $1800 | Site Progress: [FOUNDATION]"));
        assert!(!out.contains("  pour the foundation"));
    }

    #[tokio::test]
    async fn eof_quits() {
        let (mut game, mock) = game(vec![], vec![], GameRules::default());
        let (outcome, out) = play(&mut game, "").await;
        assert_eq!(outcome, GameOutcome::Quit);
        assert!(out.contains("REQUIRED STEPS"));
        assert!(out.contains("Exiting game..."));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn complete_even_when_overdrawn() {
        let responses = ["FOUNDATION", "FRAMING", "ELECTRICAL", "ROOF"]
            .into_iter()
            .flat_map(|label| [MockResponse::text(label), MockResponse::text("PERMIT OFFICE: ok")])
            .collect();
        let rules = GameRules {
            initial_budget: 700,
            ..GameRules::default()
        };
        let (mut game, _) = game(responses, vec![0.9], rules);

        let (outcome, out) = play(&mut game, "slab\nwalls\nwiring\nshingles\n").await;

        assert_eq!(outcome, GameOutcome::Complete);
        assert_eq!(game.pipeline().ledger().budget().unwrap(), -100);
        assert!(out.contains("HOUSE COMPLETED!"));
        assert!(out.contains("(Final Step!)"));
    }

    #[tokio::test]
    async fn bankrupt_at_zero() {
        let rules = GameRules {
            initial_budget: 700,
            ..GameRules::default()
        };
        let (mut game, _) = game(
            vec![MockResponse::text("FOUNDATION"), MockResponse::text("PERMIT OFFICE: REVOKED.")],
            vec![0.0],
            rules,
        );

        let (outcome, out) = play(&mut game, "pour the slab\npour it again\n").await;

        assert_eq!(outcome, GameOutcome::Bankrupt);
        assert_eq!(game.pipeline().ledger().budget().unwrap(), 0);
        assert!(out.contains("FINE ISSUED: $500 for FRAUD!"));
        assert!(out.contains("BANKRUPT."));
    }

    #[tokio::test]
    async fn safety_violation_prints_denial_only() {
        let (mut game, mock) = game(vec![], vec![], GameRules::default());
        let (outcome, out) = play(&mut game, "use cheap materials on the roof\nexit\n").await;

        assert_eq!(outcome, GameOutcome::Quit);
        assert!(out.contains("  SAFETY OFFICER: Access Denied. The term 'cheap materials'"));
        assert_eq!(mock.call_count(), 0);
        assert_eq!(game.pipeline().ledger().budget().unwrap(), 2000);
    }
}
