/// SQL DDL for the job site database: one row per built component and a
/// single-row budget table. Both are dropped and recreated on every new game.
pub const RESET_TABLES: &str = r#"
DROP TABLE IF EXISTS components;
CREATE TABLE components (
    name TEXT PRIMARY KEY,
    status TEXT NOT NULL
);

DROP TABLE IF EXISTS budget;
CREATE TABLE budget (
    amount INTEGER NOT NULL
);
"#;

pub const BUILT_STATUS: &str = "BUILT";

pub const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA busy_timeout = 5000;
PRAGMA synchronous = NORMAL;
"#;
