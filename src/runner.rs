use std::collections::HashSet;

use serde::Serialize;

use crate::error::SimError;
use crate::games::{self, FrameSimulation};
use crate::rng::Rng;
use crate::types::{FrameSnapshot, GameKind, GameSummary, Status};

#[derive(Clone, Debug, Serialize)]
pub struct AnomalyRecord {
    pub frame: u32,
    pub message: String,
}

#[derive(Clone, Debug, Default)]
pub struct StatusMonitor {
    previous: Option<Vec<Status>>,
    terminal: usize,
}

impl StatusMonitor {
    pub fn observe(&mut self, snapshot: &FrameSnapshot) -> Vec<String> {
        let mut anomalies = Vec::new();
        let statuses: Vec<Status> = snapshot.participants.iter().map(|p| p.status).collect();

        for participant in &snapshot.participants {
            if !participant.x.is_finite() || !participant.y.is_finite() {
                anomalies.push(format!("non-finite position: {}", participant.label));
            }
        }

        if let Some(previous) = &self.previous {
            if previous.len() != statuses.len() {
                anomalies.push(format!(
                    "participant count changed: {} -> {}",
                    previous.len(),
                    statuses.len()
                ));
            } else {
                for (idx, (before, now)) in previous.iter().zip(&statuses).enumerate() {
                    if !before.can_become(*now) {
                        let label = &snapshot.participants[idx].label;
                        anomalies.push(format!("status regressed: {label} {before:?} -> {now:?}"));
                    }
                }
            }
        }

        let terminal = statuses.iter().filter(|s| s.is_terminal()).count();
        if terminal < self.terminal {
            anomalies.push(format!(
                "terminal count decreased: {} -> {terminal}",
                self.terminal
            ));
        }
        self.terminal = terminal;
        self.previous = Some(statuses);
        anomalies
    }
}

pub struct Playback {
    sim: Box<dyn FrameSimulation>,
    rng: Rng,
    next_frame: u32,
    monitor: StatusMonitor,
}

impl Playback {
    pub fn new(kind: GameKind, seed: u64) -> Result<Self, SimError> {
        let mut rng = Rng::new(seed);
        let sim = games::build(kind, &mut rng)?;
        Ok(Self {
            sim,
            rng,
            next_frame: 0,
            monitor: StatusMonitor::default(),
        })
    }

    pub fn kind(&self) -> GameKind {
        self.sim.kind()
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn sim(&self) -> &dyn FrameSimulation {
        self.sim.as_ref()
    }

    pub fn next_frame(&self) -> u32 {
        self.next_frame
    }

    pub fn is_done(&self) -> bool {
        self.next_frame >= self.sim.total_frames()
    }

    pub fn advance(&mut self) -> Result<Option<(FrameSnapshot, Vec<String>)>, SimError> {
        if self.is_done() {
            return Ok(None);
        }
        let frame = self.next_frame;
        self.sim.step(frame, &mut self.rng)?;
        let snapshot = self.sim.snapshot(frame);
        let anomalies = self.monitor.observe(&snapshot);
        self.sim.log_frame(frame);
        self.next_frame += 1;
        Ok(Some((snapshot, anomalies)))
    }

    pub fn summary(&self) -> GameSummary {
        self.sim.summary()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub summary: GameSummary,
    pub anomalies: Vec<String>,
    #[serde(rename = "anomalyRecords")]
    pub anomaly_records: Vec<AnomalyRecord>,
    pub frames: u32,
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    frame: u32,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        frame,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

pub fn run_to_completion(
    playback: &mut Playback,
    mut on_frame: impl FnMut(&FrameSnapshot) -> Result<(), SimError>,
) -> Result<RunReport, SimError> {
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut frames = 0u32;

    while let Some((snapshot, found)) = playback.advance()? {
        for message in found {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.frame,
                message,
            );
        }
        on_frame(&snapshot)?;
        frames += 1;
    }

    let summary = playback.summary();
    if summary.active > 0 {
        push_anomaly(
            &mut anomalies,
            &mut anomaly_records,
            &mut anomaly_seen,
            frames.saturating_sub(1),
            format!("{} participants never reached a terminal status", summary.active),
        );
    }

    Ok(RunReport {
        summary,
        anomalies,
        anomaly_records,
        frames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParticipantView;
    use serde_json::json;

    fn snapshot_with(statuses: &[Status]) -> FrameSnapshot {
        FrameSnapshot {
            game: GameKind::Dalgona,
            frame: 0,
            total_frames: 1,
            phase: "Carving".to_string(),
            caption: String::new(),
            time_left: None,
            participants: statuses
                .iter()
                .enumerate()
                .map(|(idx, status)| ParticipantView {
                    id: idx as u32,
                    label: format!("p{idx}"),
                    group: "Star".to_string(),
                    lane: 0,
                    status: *status,
                    x: 0.0,
                    y: 0.0,
                    visible: true,
                })
                .collect(),
            extras: json!({}),
        }
    }

    #[test]
    fn monitor_flags_terminal_regression() {
        let mut monitor = StatusMonitor::default();
        assert!(monitor
            .observe(&snapshot_with(&[Status::Failed, Status::Working]))
            .is_empty());
        let found = monitor.observe(&snapshot_with(&[Status::Working, Status::Working]));
        assert!(found.iter().any(|m| m.starts_with("status regressed: p0")));
        assert!(found.iter().any(|m| m.starts_with("terminal count decreased")));
    }

    #[test]
    fn every_game_runs_clean() {
        for kind in GameKind::ALL {
            let mut playback = Playback::new(kind, 42).expect("game builds");
            let total = playback.sim().total_frames();
            let mut seen = 0u32;
            let report = run_to_completion(&mut playback, |snapshot| {
                assert_eq!(snapshot.frame, seen);
                seen += 1;
                Ok(())
            })
            .expect("run completes");
            assert_eq!(report.frames, total, "{kind:?}");
            assert!(report.anomalies.is_empty(), "{kind:?}: {:?}", report.anomalies);
            assert_eq!(report.summary.active, 0, "{kind:?}");
            assert!(playback.is_done());
            assert!(playback.advance().expect("no error after end").is_none());
        }
    }

    #[test]
    fn same_seed_same_snapshots() {
        let mut a = Playback::new(GameKind::Dalgona, 7).expect("game builds");
        let mut b = Playback::new(GameKind::Dalgona, 7).expect("game builds");
        let mut frames_a = Vec::new();
        let mut frames_b = Vec::new();
        run_to_completion(&mut a, |s| {
            frames_a.push(serde_json::to_string(s)?);
            Ok(())
        })
        .expect("run completes");
        run_to_completion(&mut b, |s| {
            frames_b.push(serde_json::to_string(s)?);
            Ok(())
        })
        .expect("run completes");
        assert_eq!(frames_a, frames_b);
    }

    #[test]
    fn callback_errors_stop_the_run() {
        let mut playback = Playback::new(GameKind::Marbles, 1).expect("game builds");
        let result = run_to_completion(&mut playback, |snapshot| {
            if snapshot.frame == 3 {
                Err(SimError::UnknownGame("stop".to_string()))
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
        assert_eq!(playback.next_frame(), 4);
    }
}
