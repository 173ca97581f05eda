use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;

use crate::types::GameKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Info,
    Warn,
    Error,
}

#[derive(Clone, Debug, Serialize)]
pub struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    pub timestamp_ms: u64,
    pub level: Level,
    pub event: String,
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<GameKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<u32>,
    pub details: Value,
}

#[derive(Clone, Debug)]
pub struct LogContext {
    pub run_id: String,
    pub game: Option<GameKind>,
    pub seed: Option<u64>,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            game: None,
            seed: None,
        }
    }

    pub fn for_game(&self, game: GameKind, seed: u64) -> Self {
        Self {
            run_id: self.run_id.clone(),
            game: Some(game),
            seed: Some(seed),
        }
    }

    pub fn line(&self, level: Level, event: &str, frame: Option<u32>, details: Value) -> StructuredLogLine {
        StructuredLogLine {
            timestamp_ms: now_ms(),
            level,
            event: event.to_string(),
            run_id: self.run_id.clone(),
            game: self.game,
            seed: self.seed,
            frame,
            details,
        }
    }

    pub fn emit(&self, level: Level, event: &str, frame: Option<u32>, details: Value) {
        emit_log(&self.line(level, event, frame, details));
    }
}

pub fn emit_log(line: &StructuredLogLine) {
    match serde_json::to_string(line) {
        Ok(text) => eprintln!("{text}"),
        Err(error) => eprintln!("{{\"level\":\"error\",\"event\":\"log_encode_failed\",\"error\":\"{error}\"}}"),
    }
}

pub fn default_run_id(seed: u64, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_run_id_contains_seed_and_timestamp() {
        assert_eq!(default_run_id(42, 123456789), "sim-42-123456789");
    }

    #[test]
    fn log_line_skips_missing_context_fields() {
        let ctx = LogContext::new("run-1");
        let line = ctx.line(Level::Info, "run_started", None, json!({ "games": 5 }));
        let value = serde_json::to_value(&line).expect("line serializes");
        assert_eq!(value["level"], "info");
        assert_eq!(value["runId"], "run-1");
        assert!(value.get("game").is_none());
        assert!(value.get("frame").is_none());

        let game_ctx = ctx.for_game(GameKind::Dalgona, 42);
        let line = game_ctx.line(Level::Warn, "anomaly_detected", Some(3), json!({}));
        let value = serde_json::to_value(&line).expect("line serializes");
        assert_eq!(value["game"], "dalgona");
        assert_eq!(value["seed"], 42);
        assert_eq!(value["frame"], 3);
    }
}
