/// Terms the site safety officer refuses to hear, checked in this order.
pub const DEFAULT_FORBIDDEN_TERMS: &[&str] = &[
    "asbestos",
    "lead paint",
    "bribe",
    "fire",
    "explode",
    "kill",
    "dynamite",
    "insurance fraud",
    "cut corners",
    "cheap materials",
    "unlicensed",
    "illegal",
    "dump",
];

/// Money and odds for one game.
#[derive(Clone, Debug)]
pub struct GameRules {
    pub initial_budget: i64,
    /// Paid every time a crew is dispatched, whether or not work happens.
    pub labor_cost: i64,
    /// Charged when a crew claims work the inspector can't find.
    pub fraud_penalty: i64,
    /// Charged when the client orders a component out of order.
    pub code_violation_penalty: i64,
    /// Chance in [0, 1] that a crew claims success without doing anything.
    pub hallucination_rate: f64,
    pub forbidden_terms: Vec<String>,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            initial_budget: 2000,
            labor_cost: 200,
            fraud_penalty: 500,
            code_violation_penalty: 200,
            hallucination_rate: 0.3,
            forbidden_terms: DEFAULT_FORBIDDEN_TERMS.iter().map(|t| t.to_string()).collect(),
        }
    }
}
