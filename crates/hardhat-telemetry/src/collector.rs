use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::Connection;
use tracing::field::{Field, Visit};
use tracing::span;
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Name of the span every pipeline stage runs in.
pub const STAGE_SPAN: &str = "stage";

/// A closed stage span persisted to the collector database.
#[derive(Clone, Debug)]
pub struct StageSpanRecord {
    pub id: i64,
    pub timestamp: String,
    pub stage: String,
    pub team: Option<String>,
    pub turn_id: Option<String>,
    pub duration_ms: i64,
}

/// SQLite sink for stage spans.
pub struct SpanCollector {
    conn: Mutex<Connection>,
}

impl SpanCollector {
    pub fn new(db_path: &Path) -> Result<Self, rusqlite::Error> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             CREATE TABLE IF NOT EXISTS stage_spans (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 timestamp TEXT NOT NULL,
                 service TEXT NOT NULL,
                 stage TEXT NOT NULL,
                 team TEXT,
                 turn_id TEXT,
                 duration_ms INTEGER NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_stage_spans_stage ON stage_spans(stage);
             CREATE INDEX IF NOT EXISTS idx_stage_spans_turn ON stage_spans(turn_id);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // Best-effort: a failed insert must never disturb the game.
    fn insert(&self, fields: &StageFields, duration_ms: i64) {
        let Some(stage) = fields.stage.as_deref() else {
            return;
        };
        let conn = self.conn.lock();
        let _ = conn.execute(
            "INSERT INTO stage_spans (timestamp, service, stage, team, turn_id, duration_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                Utc::now().to_rfc3339(),
                crate::SERVICE_NAME,
                stage,
                fields.team,
                fields.turn_id,
                duration_ms,
            ],
        );
    }

    /// Most recent spans first.
    pub fn recent(&self, limit: u32) -> Result<Vec<StageSpanRecord>, rusqlite::Error> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, stage, team, turn_id, duration_ms
             FROM stage_spans ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit], |row| {
            Ok(StageSpanRecord {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                stage: row.get(2)?,
                team: row.get(3)?,
                turn_id: row.get(4)?,
                duration_ms: row.get(5)?,
            })
        })?;
        rows.collect()
    }

    pub fn count(&self) -> Result<i64, rusqlite::Error> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM stage_spans", [], |row| row.get(0))
    }
}

/// Fields captured from a stage span, stored in its extensions.
#[derive(Default)]
struct StageFields {
    stage: Option<String>,
    team: Option<String>,
    turn_id: Option<String>,
    opened: Option<Instant>,
}

impl Visit for StageFields {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_str(field, format!("{value:?}").trim_matches('"'));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "agent.type" => self.stage = Some(value.to_string()),
            "worker.team" => self.team = Some(value.to_string()),
            "turn_id" => self.turn_id = Some(value.to_string()),
            _ => {}
        }
    }
}

/// tracing Layer that forwards closed `stage` spans to a [`SpanCollector`],
/// tagging each with the id of the `turn` span it ran under.
pub struct StageSpanLayer {
    collector: Arc<SpanCollector>,
}

impl StageSpanLayer {
    pub fn new(collector: Arc<SpanCollector>) -> Self {
        Self { collector }
    }
}

impl<S> Layer<S> for StageSpanLayer
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let name = attrs.metadata().name();
        if name == crate::TURN_SPAN {
            let mut fields = StageFields::default();
            attrs.record(&mut fields);
            if let (Some(turn_id), Some(span)) = (fields.turn_id, ctx.span(id)) {
                span.extensions_mut().insert(TurnField(turn_id));
            }
            return;
        }
        if name != STAGE_SPAN {
            return;
        }
        let mut fields = StageFields {
            opened: Some(Instant::now()),
            ..Default::default()
        };
        attrs.record(&mut fields);

        // Inherit the turn id from the enclosing turn span.
        if fields.turn_id.is_none() {
            if let Some(scope) = ctx.span_scope(id) {
                for ancestor in scope.skip(1) {
                    if let Some(turn) = ancestor.extensions().get::<TurnField>() {
                        fields.turn_id = Some(turn.0.clone());
                        break;
                    }
                }
            }
        }

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(fields);
        }
    }

    fn on_record(&self, id: &span::Id, values: &span::Record<'_>, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            if let Some(fields) = span.extensions_mut().get_mut::<StageFields>() {
                values.record(fields);
            }
        }
    }

    fn on_close(&self, id: span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else {
            return;
        };
        let extensions = span.extensions();
        if let Some(fields) = extensions.get::<StageFields>() {
            let duration_ms = fields
                .opened
                .map(|t| t.elapsed().as_millis() as i64)
                .unwrap_or_default();
            self.collector.insert(fields, duration_ms);
        }
    }
}

/// Turn id stored on the enclosing `turn` span.
struct TurnField(String);
