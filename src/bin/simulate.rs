use clap::Parser;
use serde::Serialize;
use serde_json::json;
use squid_sim::constants::DEFAULT_SEED;
use squid_sim::error::SimError;
use squid_sim::export::{ensure_dir, write_json, FrameWriter};
use squid_sim::logging::{default_run_id, now_ms, Level, LogContext};
use squid_sim::runner::{run_to_completion, AnomalyRecord, Playback};
use squid_sim::server_utils::parse_game;
use squid_sim::types::{GameKind, GameSummary};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Game key (`red_light`, `dalgona`, `tug_of_war`, `marbles`, `glass_bridge`); all when omitted.
    #[arg(long)]
    game: Option<String>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value = "out")]
    out_dir: PathBuf,
    #[arg(long)]
    frames_out: Option<PathBuf>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    #[arg(long)]
    run_id: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
struct GameResultLine {
    seed: u64,
    frames: u32,
    #[serde(flatten)]
    summary: GameSummary,
    #[serde(rename = "logFiles")]
    log_files: Vec<String>,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug)]
struct GameRun {
    result: GameResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "generatedAtIso")]
    generated_at_iso: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    seed: u64,
    #[serde(rename = "gameCount")]
    game_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "finishedTotal")]
    finished_total: usize,
    #[serde(rename = "failedTotal")]
    failed_total: usize,
    games: Vec<GameResultLine>,
}

fn main() {
    let cli = Cli::parse();
    let seed = cli.seed.unwrap_or(DEFAULT_SEED);
    let run_started_at_ms = now_ms();
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed, run_started_at_ms));
    let log = LogContext::new(run_id.clone());

    let games = match resolve_games(cli.game.as_deref()) {
        Ok(games) => games,
        Err(error) => {
            log.emit(
                Level::Error,
                "invalid_arguments",
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };

    if let Err(error) = ensure_dir(&cli.out_dir) {
        fail_export(&log, &cli.out_dir, &error);
    }
    let mut frame_writer = match cli.frames_out.as_ref() {
        Some(path) => match FrameWriter::create(path) {
            Ok(writer) => Some(writer),
            Err(error) => fail_export(&log, path, &error),
        },
        None => None,
    };

    let mut has_anomaly = false;
    let mut results = Vec::new();
    let mut total_anomalies = 0usize;

    for kind in games {
        let game_log = log.for_game(kind, seed);
        game_log.emit(
            Level::Info,
            "game_started",
            None,
            json!({ "title": kind.title() }),
        );

        let game_run = match run_game(kind, seed, &cli.out_dir, frame_writer.as_mut()) {
            Ok(game_run) => game_run,
            Err(error) => {
                game_log.emit(
                    Level::Error,
                    "game_failed",
                    None,
                    json!({ "error": error.to_string() }),
                );
                std::process::exit(2);
            }
        };

        for anomaly in &game_run.anomaly_records {
            game_log.emit(
                Level::Warn,
                "anomaly_detected",
                Some(anomaly.frame),
                json!({ "message": anomaly.message }),
            );
        }
        if !game_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += game_run.anomaly_records.len();

        game_log.emit(
            Level::Info,
            "game_finished",
            Some(game_run.result.frames.saturating_sub(1)),
            json!({
                "finished": game_run.result.summary.finished,
                "failed": game_run.result.summary.failed,
                "active": game_run.result.summary.active,
                "logFiles": game_run.result.log_files,
                "anomalyCount": game_run.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&game_run.result) {
            Ok(text) => println!("{text}"),
            Err(error) => fail_export(&log, Path::new("-"), &error.into()),
        }
        results.push(game_run.result);
    }

    let mut frames_out_written: Option<String> = None;
    if let (Some(writer), Some(path)) = (frame_writer.take(), cli.frames_out.as_ref()) {
        if let Err(error) = writer.finish() {
            fail_export(&log, path, &error);
        }
        frames_out_written = Some(path.to_string_lossy().to_string());
    }

    let summary = build_run_summary(
        run_id,
        seed,
        run_started_at_ms,
        now_ms(),
        results,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_json(path, &summary) {
            fail_export(&log, path, &error);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    log.emit(
        Level::Info,
        "run_finished",
        None,
        json!({
            "gameCount": summary.game_count,
            "anomalyCount": summary.anomaly_count,
            "finishedTotal": summary.finished_total,
            "failedTotal": summary.failed_total,
            "framesOut": frames_out_written,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_game(
    kind: GameKind,
    seed: u64,
    out_dir: &Path,
    mut frame_writer: Option<&mut FrameWriter>,
) -> Result<GameRun, SimError> {
    let mut playback = Playback::new(kind, seed)?;
    let report = run_to_completion(&mut playback, |snapshot| match frame_writer.as_mut() {
        Some(writer) => writer.push(snapshot),
        None => Ok(()),
    })?;
    let log_files = playback
        .sim()
        .write_logs(out_dir)?
        .into_iter()
        .map(|path| path.to_string_lossy().to_string())
        .collect();

    Ok(GameRun {
        result: GameResultLine {
            seed,
            frames: report.frames,
            summary: report.summary,
            log_files,
            anomalies: report.anomalies,
        },
        anomaly_records: report.anomaly_records,
    })
}

fn resolve_games(game: Option<&str>) -> Result<Vec<GameKind>, SimError> {
    match game {
        None => Ok(GameKind::ALL.to_vec()),
        Some(raw) if raw.trim().eq_ignore_ascii_case("all") => Ok(GameKind::ALL.to_vec()),
        Some(raw) => Ok(vec![parse_game(raw)?]),
    }
}

fn build_run_summary(
    run_id: String,
    seed: u64,
    started_at_ms: u64,
    finished_at_ms: u64,
    games: Vec<GameResultLine>,
    anomaly_count: usize,
) -> RunSummary {
    let finished_total = games.iter().map(|game| game.summary.finished).sum();
    let failed_total = games.iter().map(|game| game.summary.failed).sum();
    RunSummary {
        run_id,
        generated_at_iso: iso_timestamp(finished_at_ms),
        started_at_ms,
        finished_at_ms,
        seed,
        game_count: games.len(),
        anomaly_count,
        finished_total,
        failed_total,
        games,
    }
}

fn iso_timestamp(timestamp_ms: u64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms as i64)
        .unwrap_or_default()
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn fail_export(log: &LogContext, path: &Path, error: &SimError) -> ! {
    log.emit(
        Level::Error,
        "export_failed",
        None,
        json!({
            "path": path.to_string_lossy(),
            "error": error.to_string(),
        }),
    );
    std::process::exit(2);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(tag: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!("squid-sim-{tag}-{now}"))
    }

    #[test]
    fn resolve_games_defaults_to_every_game() {
        assert_eq!(resolve_games(None).expect("all games"), GameKind::ALL.to_vec());
        assert_eq!(resolve_games(Some("ALL")).expect("all games").len(), 5);
        assert_eq!(
            resolve_games(Some("dalgona")).expect("one game"),
            vec![GameKind::Dalgona]
        );
        assert!(resolve_games(Some("hopscotch")).is_err());
    }

    #[test]
    fn iso_timestamp_uses_utc_millis() {
        assert_eq!(iso_timestamp(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(iso_timestamp(1_500), "1970-01-01T00:00:01.500Z");
    }

    #[test]
    fn run_game_writes_logs_and_frames() {
        let dir = temp_dir("run");
        ensure_dir(&dir).expect("temp dir");
        let frames_path = dir.join("frames.jsonl");
        let mut writer = FrameWriter::create(&frames_path).expect("frame writer");

        let run = run_game(GameKind::Dalgona, 42, &dir, Some(&mut writer)).expect("dalgona runs");
        assert_eq!(writer.finish().expect("flush"), run.result.frames as usize);
        assert_eq!(run.result.summary.finished, 107);
        assert_eq!(run.result.summary.failed, 79);
        assert!(run.result.anomalies.is_empty());
        assert_eq!(run.result.log_files.len(), 4);

        let text = std::fs::read_to_string(&frames_path).expect("frames file");
        assert_eq!(text.lines().count(), run.result.frames as usize);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn build_run_summary_totals_every_game() {
        let dir = temp_dir("summary");
        ensure_dir(&dir).expect("temp dir");
        let games = vec![
            run_game(GameKind::TugOfWar, 42, &dir, None).expect("tug runs").result,
            run_game(GameKind::GlassBridge, 42, &dir, None).expect("glass runs").result,
        ];
        let summary = build_run_summary("run-1".to_string(), 42, 1, 2, games, 0);
        assert_eq!(summary.game_count, 2);
        assert_eq!(summary.finished_total, 40 + 3);
        assert_eq!(summary.failed_total, 40 + 13);
        let value = serde_json::to_value(&summary).expect("summary serializes");
        assert_eq!(value["runId"], "run-1");
        assert_eq!(value["games"][0]["game"], "tug_of_war");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let target = temp_dir("missing").join("summary.json");
        let summary = build_run_summary("run-1".to_string(), 1, 1, 2, Vec::new(), 0);
        assert!(matches!(write_json(&target, &summary), Err(SimError::Io { .. })));
    }
}
