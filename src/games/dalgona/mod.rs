use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::json;

use crate::constants::{
    dalgona_line_x, dalgona_x_max, DALGONA_FAILED_ROW_Y, DALGONA_FPS, DALGONA_FRAMES_CARVE,
    DALGONA_FRAMES_EXIT, DALGONA_FRAMES_LINEUP, DALGONA_FRAMES_SCATTER, DALGONA_FRAMES_TIMEOUT,
    DALGONA_ROW_STEP, DALGONA_SCATTER_Y, DALGONA_SURVIVED_ROW_Y, DALGONA_TIME_CARVE_END_SEC,
    DALGONA_TIME_SCATTER_END_SEC, DALGONA_TIME_START_SEC, DALGONA_Y_MAX, TIMEOUT_FAIL_FRACTION,
};
use crate::data::{ShapeOutcome, DALGONA_LINEUP, DALGONA_OUTCOMES};
use crate::error::SimError;
use crate::games::{out_of_range, FrameSimulation};
use crate::metrics::MetricsLogger;
use crate::phase::{Countdown, PhaseSpec, PhaseTable};
use crate::rng::Rng;
use crate::schedule::EventSchedule;
use crate::types::{
    FailMode, FrameSnapshot, GameKind, GameSummary, ParticipantView, Status, Vec2,
};

mod logs;
mod updater;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DalgonaPhase {
    Lineup,
    Scatter,
    Carving,
    Timeout,
    Exit,
}

impl DalgonaPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Lineup => "Lineup",
            Self::Scatter => "Scatter",
            Self::Carving => "Carving",
            Self::Timeout => "Timeout",
            Self::Exit => "Exit",
        }
    }

    pub fn caption(self) -> &'static str {
        match self {
            Self::Lineup => "Line up by shape",
            Self::Scatter => "Blending to tables (stepwise)",
            Self::Carving => "Carving (breaks & finishers to doors)",
            Self::Timeout => "Time-out: can't finish eliminated",
            Self::Exit => "Finished exit",
        }
    }
}

#[derive(Clone, Debug)]
pub struct DalgonaConfig {
    pub outcomes: Vec<ShapeOutcome>,
    pub lineup: Vec<&'static str>,
    pub timeout_fail_fraction: f64,
    pub frames_lineup: u32,
    pub frames_scatter: u32,
    pub frames_carve: u32,
    pub frames_timeout: u32,
    pub frames_exit: u32,
}

impl Default for DalgonaConfig {
    fn default() -> Self {
        Self {
            outcomes: DALGONA_OUTCOMES.to_vec(),
            lineup: DALGONA_LINEUP.to_vec(),
            timeout_fail_fraction: TIMEOUT_FAIL_FRACTION,
            frames_lineup: DALGONA_FRAMES_LINEUP,
            frames_scatter: DALGONA_FRAMES_SCATTER,
            frames_carve: DALGONA_FRAMES_CARVE,
            frames_timeout: DALGONA_FRAMES_TIMEOUT,
            frames_exit: DALGONA_FRAMES_EXIT,
        }
    }
}

impl DalgonaConfig {
    pub fn phase_table(&self) -> PhaseTable<DalgonaPhase> {
        PhaseTable::new(vec![
            PhaseSpec::new(DalgonaPhase::Lineup, self.frames_lineup)
                .counting(Countdown::constant(DALGONA_TIME_START_SEC)),
            PhaseSpec::new(DalgonaPhase::Scatter, self.frames_scatter).counting(Countdown::linear(
                DALGONA_TIME_START_SEC,
                DALGONA_TIME_SCATTER_END_SEC,
            )),
            PhaseSpec::new(DalgonaPhase::Carving, self.frames_carve).counting(Countdown::linear(
                DALGONA_TIME_SCATTER_END_SEC,
                DALGONA_TIME_CARVE_END_SEC,
            )),
            PhaseSpec::new(DalgonaPhase::Timeout, self.frames_timeout)
                .counting(Countdown::linear(DALGONA_TIME_CARVE_END_SEC, 0.0).with_lead(1)),
            PhaseSpec::new(DalgonaPhase::Exit, self.frames_exit),
        ])
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Participant {
    pub id: usize,
    pub group: &'static str,
    pub status: Status,
    pub position: Vec2,
    pub target: Vec2,
    pub fail_mode: Option<FailMode>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeoutRecord {
    pub frame: u32,
    pub timeleft: i32,
    pub player_index: usize,
    pub shape: String,
}

#[derive(Clone, Debug)]
pub struct DalgonaSim {
    config: DalgonaConfig,
    table: PhaseTable<DalgonaPhase>,
    participants: Vec<Participant>,
    scatter_points: Vec<Vec2>,
    doors: Vec<(&'static str, Vec2)>,
    schedule: EventSchedule,
    timeout_applied: bool,
    timeout_log: Vec<TimeoutRecord>,
    metrics: MetricsLogger,
}

impl DalgonaSim {
    pub fn new(config: DalgonaConfig, rng: &mut Rng) -> Self {
        let table = config.phase_table();
        let lanes = config.lineup.len();
        let x_max = dalgona_x_max(lanes);

        let mut participants = Vec::new();
        for (lane, shape) in config.lineup.iter().enumerate() {
            let Some(outcome) = config.outcomes.iter().find(|row| row.shape == *shape) else {
                continue;
            };
            let line_x = dalgona_line_x(lane);
            for i in 0..outcome.failed {
                let position = Vec2::new(
                    line_x + rng.uniform(-1.0, 1.0),
                    DALGONA_FAILED_ROW_Y - i as f32 * DALGONA_ROW_STEP,
                );
                participants.push(Participant {
                    id: participants.len(),
                    group: outcome.shape,
                    status: Status::Queued,
                    position,
                    target: position,
                    fail_mode: None,
                });
            }
            for i in 0..outcome.survived {
                let position = Vec2::new(
                    line_x + rng.uniform(-1.0, 1.0),
                    DALGONA_SURVIVED_ROW_Y - i as f32 * DALGONA_ROW_STEP,
                );
                participants.push(Participant {
                    id: participants.len(),
                    group: outcome.shape,
                    status: Status::Working,
                    position,
                    target: position,
                    fail_mode: None,
                });
            }
        }

        let scatter_points = (0..participants.len())
            .map(|_| {
                Vec2::new(
                    rng.uniform(5.0, x_max - 5.0),
                    rng.uniform(DALGONA_SCATTER_Y.0, DALGONA_SCATTER_Y.1),
                )
            })
            .collect();

        let doors = config
            .lineup
            .iter()
            .enumerate()
            .map(|(lane, shape)| (*shape, Vec2::new(dalgona_line_x(lane), DALGONA_Y_MAX - 1.0)))
            .collect();

        let failing: Vec<usize> = participants
            .iter()
            .filter(|p| p.status == Status::Queued)
            .map(|p| p.id)
            .collect();
        let finishing: Vec<usize> = participants
            .iter()
            .filter(|p| p.status == Status::Working && p.fail_mode.is_none())
            .map(|p| p.id)
            .collect();
        let schedule = EventSchedule::build(
            &failing,
            &finishing,
            config.timeout_fail_fraction,
            config.frames_carve,
            rng,
        );

        for id in schedule.timeout_set() {
            let participant = &mut participants[*id];
            participant.fail_mode = Some(FailMode::Timeout);
            // Shown as still carving until the clock runs out.
            participant.status = Status::Working;
        }
        for id in schedule.break_failers() {
            participants[id].fail_mode = Some(FailMode::Break);
        }

        let metrics = MetricsLogger::new(config.lineup.iter().copied());
        Self {
            config,
            table,
            participants,
            scatter_points,
            doors,
            schedule,
            timeout_applied: false,
            timeout_log: Vec::new(),
            metrics,
        }
    }

    pub fn count(&self, status: Status) -> usize {
        self.participants
            .iter()
            .filter(|p| p.status == status)
            .count()
    }

    fn door_of(&self, group: &str) -> Option<Vec2> {
        self.doors
            .iter()
            .find(|(shape, _)| *shape == group)
            .map(|(_, door)| *door)
    }
}

pub fn advance(mut sim: DalgonaSim, frame: u32, rng: &mut Rng) -> Result<DalgonaSim, SimError> {
    sim.step_frame(frame, rng)?;
    Ok(sim)
}

impl FrameSimulation for DalgonaSim {
    fn kind(&self) -> GameKind {
        GameKind::Dalgona
    }

    fn total_frames(&self) -> u32 {
        self.table.total_frames()
    }

    fn fps(&self) -> u32 {
        DALGONA_FPS
    }

    fn step(&mut self, frame: u32, rng: &mut Rng) -> Result<(), SimError> {
        self.step_frame(frame, rng)
    }

    fn snapshot(&self, frame: u32) -> FrameSnapshot {
        let cursor = self.table.resolve(frame);
        let phase = cursor.map(|c| c.phase).unwrap_or(DalgonaPhase::Exit);
        let time_left = self.table.time_left(frame).unwrap_or(0.0);
        let finished = self.count(Status::Finished);
        let failed = self.count(Status::Failed);
        let participants = self
            .participants
            .iter()
            .map(|p| ParticipantView {
                id: p.id as u32,
                label: format!("{} #{:03}", p.group, p.id),
                group: p.group.to_string(),
                lane: 0,
                status: p.status,
                x: p.position.x,
                y: p.position.y,
                visible: true,
            })
            .collect();
        let doors: Vec<_> = self
            .doors
            .iter()
            .map(|(shape, door)| json!({ "shape": shape, "x": door.x, "y": door.y }))
            .collect();

        FrameSnapshot {
            game: GameKind::Dalgona,
            frame,
            total_frames: self.table.total_frames(),
            phase: phase.label().to_string(),
            caption: format!(
                "Phase: {}   |   Finished (Survived): {finished}   Eliminated: {failed}",
                phase.caption()
            ),
            time_left: Some(time_left),
            participants,
            extras: json!({
                "timer": format!("Time left: {} sec", time_left as i32),
                "doors": doors,
                "xMax": dalgona_x_max(self.config.lineup.len()) + 12.0,
                "yMax": DALGONA_Y_MAX,
            }),
        }
    }

    fn log_frame(&mut self, frame: u32) {
        let Some(cursor) = self.table.resolve(frame) else {
            return;
        };
        let time_left = self.table.time_left(frame).unwrap_or(0.0);
        self.metrics.record(
            frame,
            cursor.phase.label(),
            time_left,
            self.participants.iter().map(|p| (p.group, p.status)),
        );
    }

    fn summary(&self) -> GameSummary {
        GameSummary::from_statuses(
            GameKind::Dalgona,
            self.table.total_frames(),
            self.participants.iter().map(|p| p.status),
        )
    }

    fn write_logs(&self, out_dir: &Path) -> Result<Vec<PathBuf>, SimError> {
        self.export_logs(out_dir)
    }
}

#[cfg(test)]
mod tests;
