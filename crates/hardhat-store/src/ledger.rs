use std::collections::BTreeSet;

use tracing::{debug, instrument};

use hardhat_core::Component;

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;
use crate::schema;

/// Result of a dependency-checked build attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildOutcome {
    Built,
    MissingDependency(Component),
}

impl BuildOutcome {
    /// Reason code carried in the worker's claim text.
    pub fn reason_code(&self) -> String {
        match self {
            Self::Built => "SUCCESS".to_string(),
            Self::MissingDependency(c) => format!("MISSING_DEPENDENCY: {}", c.title()),
        }
    }
}

/// The job site: which components stand, and how much money is left.
pub struct SiteLedger {
    db: Database,
}

impl SiteLedger {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Wipe all site state and start a new game with the given budget.
    #[instrument(skip(self))]
    pub fn reset_game(&self, initial_budget: i64) -> Result<(), StoreError> {
        self.db.with_tx(|conn| {
            conn.execute_batch(schema::RESET_TABLES)?;
            conn.execute("INSERT INTO budget (amount) VALUES (?1)", [initial_budget])?;
            Ok(())
        })
    }

    #[instrument(skip(self))]
    pub fn budget(&self) -> Result<i64, StoreError> {
        self.db.with_conn(|conn| {
            conn.query_row("SELECT amount FROM budget LIMIT 1", [], |row| row.get(0))
                .map_err(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => {
                        StoreError::NotInitialized("budget row missing".into())
                    }
                    other => row_helpers::not_initialized(other, "budget"),
                })
        })
    }

    /// Subtract `amount` from the budget and return the new balance.
    /// The budget never increases, so negative amounts are rejected.
    #[instrument(skip(self))]
    pub fn debit(&self, amount: i64) -> Result<i64, StoreError> {
        if amount < 0 {
            return Err(StoreError::InvalidDebit(amount));
        }
        self.db.with_tx(|conn| {
            let changed = conn
                .execute("UPDATE budget SET amount = amount - ?1", [amount])
                .map_err(|e| row_helpers::not_initialized(e, "budget"))?;
            if changed == 0 {
                return Err(StoreError::NotInitialized("budget row missing".into()));
            }
            let balance: i64 = conn.query_row("SELECT amount FROM budget LIMIT 1", [], |row| row.get(0))?;
            debug!(amount, balance, "budget debited");
            Ok(balance)
        })
    }

    #[instrument(skip(self))]
    pub fn built_components(&self) -> Result<BTreeSet<Component>, StoreError> {
        self.db.with_conn(|conn| read_components(conn))
    }

    /// Mark `component` as built if its prerequisite stands. Rebuilding an
    /// existing component overwrites its row.
    #[instrument(skip(self), fields(component = %component))]
    pub fn try_build(&self, component: Component) -> Result<BuildOutcome, StoreError> {
        self.db.with_tx(|conn| {
            let existing = read_components(conn)?;
            if let Some(required) = component.prerequisite() {
                if !existing.contains(&required) {
                    debug!(missing = %required, "prerequisite not built");
                    return Ok(BuildOutcome::MissingDependency(required));
                }
            }
            conn.execute(
                "INSERT OR REPLACE INTO components (name, status) VALUES (?1, ?2)",
                [component.as_str(), schema::BUILT_STATUS],
            )
            .map_err(|e| row_helpers::not_initialized(e, "components"))?;
            Ok(BuildOutcome::Built)
        })
    }
}

fn read_components(conn: &rusqlite::Connection) -> Result<BTreeSet<Component>, StoreError> {
    let mut stmt = conn
        .prepare("SELECT name FROM components")
        .map_err(|e| row_helpers::not_initialized(e, "components"))?;
    let mut rows = stmt.query([])?;
    let mut built = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let name: String = row_helpers::get(row, 0, "components", "name")?;
        built.insert(row_helpers::parse_enum(&name, "components", "name")?);
    }
    Ok(built)
}
