use crate::error::StoreError;

/// Get a required column value from a row, returning CorruptRow on failure.
pub fn get<T: rusqlite::types::FromSql>(
    row: &rusqlite::Row<'_>,
    idx: usize,
    table: &'static str,
    column: &'static str,
) -> Result<T, StoreError> {
    row.get(idx).map_err(|e| StoreError::CorruptRow {
        table,
        column,
        detail: e.to_string(),
    })
}

/// Parse a string into an enum, returning CorruptRow on failure.
pub fn parse_enum<T: std::str::FromStr>(
    raw: &str,
    table: &'static str,
    column: &'static str,
) -> Result<T, StoreError> {
    raw.parse().map_err(|_| StoreError::CorruptRow {
        table,
        column,
        detail: format!("unknown variant: {raw}"),
    })
}

/// Map a missing-table error to `NotInitialized` so callers can tell a fresh
/// database from a broken one.
pub fn not_initialized(e: rusqlite::Error, table: &'static str) -> StoreError {
    let text = e.to_string();
    if text.contains("no such table") {
        StoreError::NotInitialized(format!("table {table} missing; start a new game first"))
    } else {
        StoreError::Database(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hardhat_core::Component;

    #[test]
    fn parse_enum_success() {
        let result: Result<Component, _> = parse_enum("FRAMING", "components", "name");
        assert_eq!(result.unwrap(), Component::Framing);
    }

    #[test]
    fn parse_enum_failure() {
        let result: Result<Component, _> = parse_enum("POOL", "components", "name");
        assert!(matches!(
            result,
            Err(StoreError::CorruptRow { table: "components", column: "name", .. })
        ));
    }

    #[test]
    fn missing_table_maps_to_not_initialized() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err = conn
            .query_row("SELECT amount FROM budget", [], |row| row.get::<_, i64>(0))
            .unwrap_err();
        assert!(matches!(not_initialized(err, "budget"), StoreError::NotInitialized(_)));
    }
}
