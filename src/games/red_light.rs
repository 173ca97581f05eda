use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::json;

use crate::constants::{
    RED_LIGHT_ADVANCE, RED_LIGHT_FIELD_LENGTH, RED_LIGHT_FIELD_WIDTH, RED_LIGHT_FPS,
    RED_LIGHT_PANIC_Y, RED_LIGHT_PLAYERS, RED_LIGHT_SHUFFLE,
};
use crate::data::{FeaturedPlayer, Light, RoundRecord, RED_LIGHT_FEATURED, RED_LIGHT_ROUNDS};
use crate::error::SimError;
use crate::export::write_csv;
use crate::games::{out_of_range, FrameSimulation};
use crate::rng::Rng;
use crate::schedule::pick_eliminations;
use crate::types::{FrameSnapshot, GameKind, GameSummary, ParticipantView, Status, Vec2};

#[derive(Clone, Debug, PartialEq)]
pub struct Runner {
    pub number: usize,
    pub status: Status,
    pub position: Vec2,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoundLogRow {
    pub round: u32,
    pub light: &'static str,
    pub minutes_left: f32,
    pub target_survived: u32,
    pub alive: usize,
    pub eliminated_step: usize,
    pub eliminated_total: usize,
}

#[derive(Clone, Debug)]
pub struct RedLightSim {
    rounds: Vec<RoundRecord>,
    featured: Vec<FeaturedPlayer>,
    runners: Vec<Runner>,
    log: Vec<RoundLogRow>,
}

impl RedLightSim {
    pub fn new(rng: &mut Rng) -> Self {
        Self::with_tables(RED_LIGHT_ROUNDS.to_vec(), RED_LIGHT_FEATURED.to_vec(), rng)
    }

    pub fn with_tables(rounds: Vec<RoundRecord>, featured: Vec<FeaturedPlayer>, rng: &mut Rng) -> Self {
        let half = RED_LIGHT_FIELD_WIDTH / 2.0;
        let mut runners: Vec<Runner> = (0..RED_LIGHT_PLAYERS)
            .map(|number| Runner {
                number,
                status: Status::Working,
                position: Vec2::new(rng.uniform(-half, half), 0.0),
            })
            .collect();
        for player in &featured {
            if let Some(runner) = runners.get_mut(player.number) {
                runner.position.x = player.x;
            }
        }
        Self {
            rounds,
            featured,
            runners,
            log: Vec::new(),
        }
    }

    pub fn alive(&self) -> usize {
        self.runners
            .iter()
            .filter(|r| r.status != Status::Failed)
            .count()
    }

    fn eliminated(&self) -> usize {
        self.runners
            .iter()
            .filter(|r| r.status == Status::Failed)
            .count()
    }

    fn is_featured(&self, number: usize) -> bool {
        self.featured.iter().any(|p| p.number == number)
    }

    fn eliminate(&mut self, number: usize) {
        if let Some(runner) = self.runners.get_mut(number) {
            if !runner.status.is_terminal() {
                runner.status = Status::Failed;
            }
        }
    }

    fn first_sprint(&mut self, rng: &mut Rng) {
        for idx in 0..self.runners.len() {
            if self.runners[idx].status.is_terminal() {
                continue;
            }
            let number = self.runners[idx].number;
            match self.featured.iter().find(|p| p.number == number) {
                Some(player) => self.runners[idx].position.y = player.sprint_y,
                None => {
                    self.runners[idx].position.y += rng.uniform(RED_LIGHT_SHUFFLE.0, RED_LIGHT_SHUFFLE.1)
                }
            }
        }
    }

    fn advance_survivors(&mut self, rng: &mut Rng) {
        for runner in &mut self.runners {
            if runner.status.is_terminal() {
                continue;
            }
            let y = runner.position.y + rng.uniform(RED_LIGHT_ADVANCE.0, RED_LIGHT_ADVANCE.1);
            runner.position.y = y.min(RED_LIGHT_FIELD_LENGTH);
        }
    }

    fn reconcile(&mut self, target: u32, rng: &mut Rng) {
        let survivors: Vec<usize> = self
            .runners
            .iter()
            .filter(|r| !r.status.is_terminal())
            .map(|r| r.number)
            .collect();
        for number in pick_eliminations(&survivors, target as usize, rng) {
            self.eliminate(number);
        }
    }
}

impl FrameSimulation for RedLightSim {
    fn kind(&self) -> GameKind {
        GameKind::RedLight
    }

    fn total_frames(&self) -> u32 {
        self.rounds.len() as u32
    }

    fn fps(&self) -> u32 {
        RED_LIGHT_FPS
    }

    fn step(&mut self, frame: u32, rng: &mut Rng) -> Result<(), SimError> {
        let row = *self
            .rounds
            .get(frame as usize)
            .ok_or_else(|| out_of_range(frame, self.total_frames()))?;
        let before = self.eliminated();

        match row.light {
            Light::Backfacing if frame == 0 => self.first_sprint(rng),
            Light::Backfacing => self.advance_survivors(rng),
            Light::Facing => {
                let scripted: Vec<usize> = self
                    .featured
                    .iter()
                    .filter(|p| p.eliminated_round == row.round)
                    .map(|p| p.number)
                    .collect();
                if scripted.is_empty() {
                    self.reconcile(row.survived, rng);
                } else {
                    for number in scripted {
                        self.eliminate(number);
                    }
                }
            }
        }

        // Featured eliminations on a backfacing round happen mid-crowd.
        if row.light == Light::Backfacing {
            let panicked: Vec<usize> = self
                .featured
                .iter()
                .filter(|p| p.eliminated_round == row.round)
                .map(|p| p.number)
                .collect();
            for number in panicked {
                if let Some(runner) = self.runners.get_mut(number) {
                    runner.position.y = rng.uniform(RED_LIGHT_PANIC_Y.0, RED_LIGHT_PANIC_Y.1);
                }
                self.eliminate(number);
            }
        }

        if frame + 1 == self.total_frames() {
            for runner in &mut self.runners {
                if !runner.status.is_terminal() {
                    runner.position.y = RED_LIGHT_FIELD_LENGTH;
                    runner.status = Status::Finished;
                }
            }
        }

        let eliminated_total = self.eliminated();
        self.log.push(RoundLogRow {
            round: row.round,
            light: row.light.label(),
            minutes_left: row.minutes_left,
            target_survived: row.survived,
            alive: self.alive(),
            eliminated_step: eliminated_total - before,
            eliminated_total,
        });
        Ok(())
    }

    fn snapshot(&self, frame: u32) -> FrameSnapshot {
        let row = self.rounds.get(frame as usize).copied();
        let participants = self
            .runners
            .iter()
            .map(|r| ParticipantView {
                id: r.number as u32,
                label: format!("{:03}", r.number),
                group: if self.is_featured(r.number) {
                    format!("player_{}", r.number)
                } else {
                    "crowd".to_string()
                },
                lane: 0,
                status: r.status,
                x: r.position.x,
                y: r.position.y,
                visible: true,
            })
            .collect();
        let (phase, caption, minutes) = match row {
            Some(row) => (
                row.light.label().to_string(),
                format!(
                    "Round {}  |  {}  |  Time left: {:.2} min   Alive: {}  |  Eliminated: {}",
                    row.round,
                    row.light.label(),
                    row.minutes_left,
                    row.survived,
                    row.eliminated
                ),
                row.minutes_left,
            ),
            None => ("Done".to_string(), String::new(), 0.0),
        };
        FrameSnapshot {
            game: GameKind::RedLight,
            frame,
            total_frames: self.total_frames(),
            phase,
            caption,
            time_left: Some(minutes * 60.0),
            participants,
            extras: json!({
                "fieldLength": RED_LIGHT_FIELD_LENGTH,
                "fieldWidth": RED_LIGHT_FIELD_WIDTH,
                "minutesLeft": minutes,
            }),
        }
    }

    fn log_frame(&mut self, _frame: u32) {}

    fn summary(&self) -> GameSummary {
        GameSummary::from_statuses(
            GameKind::RedLight,
            self.total_frames(),
            self.runners.iter().map(|r| r.status),
        )
    }

    fn write_logs(&self, out_dir: &Path) -> Result<Vec<PathBuf>, SimError> {
        Ok(vec![write_csv(out_dir, "game1_red_light_rounds.csv", &self.log)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_all(seed: u64) -> RedLightSim {
        let mut rng = Rng::new(seed);
        let mut sim = RedLightSim::new(&mut rng);
        for frame in 0..sim.total_frames() {
            sim.step(frame, &mut rng).expect("round in range");
        }
        sim
    }

    #[test]
    fn ends_with_literal_survivors_on_the_finish_line() {
        let sim = run_all(42);
        let summary = sim.summary();
        assert_eq!(summary.participants, 456);
        assert_eq!(summary.finished, 201);
        assert_eq!(summary.failed, 255);
        assert_eq!(summary.active, 0);
        for runner in &sim.runners {
            if runner.status == Status::Finished {
                assert_eq!(runner.position.y, RED_LIGHT_FIELD_LENGTH);
            }
        }
    }

    #[test]
    fn featured_players_fall_on_their_scripted_rounds() {
        let mut rng = Rng::new(42);
        let mut sim = RedLightSim::new(&mut rng);
        sim.step(0, &mut rng).expect("round 1");
        assert_eq!(sim.runners[324].position.y, 8.0);
        assert_eq!(sim.runners[250].position.y, 7.5);
        assert_eq!(sim.runners[324].position.x, 1.0);

        sim.step(1, &mut rng).expect("round 2");
        assert_eq!(sim.runners[324].status, Status::Failed);
        assert_eq!(sim.log[1].eliminated_step, 1);

        sim.step(2, &mut rng).expect("round 3");
        let player = &sim.runners[250];
        assert_eq!(player.status, Status::Failed);
        assert!((2.0..=4.0).contains(&player.position.y));
    }

    #[test]
    fn facing_round_reconciles_to_the_literal_count() {
        let sim = run_all(9);
        let log = &sim.log;
        assert_eq!(log.len(), 12);
        // Round 8: 221 → 211.
        assert_eq!(log[7].eliminated_step, 10);
        assert_eq!(log[7].alive, 211);
        // Backfacing rounds after the first sprint never eliminate the crowd.
        assert_eq!(log[4].eliminated_step, 0);
        assert_eq!(log[3].alive, 236);
    }

    #[test]
    fn survivors_never_pass_the_finish_line() {
        let sim = run_all(3);
        assert!(sim
            .runners
            .iter()
            .all(|r| r.position.y <= RED_LIGHT_FIELD_LENGTH));
    }

    #[test]
    fn inconsistent_target_eliminates_nobody() {
        let rounds = vec![RoundRecord {
            round: 1,
            light: Light::Facing,
            minutes_left: 1.0,
            eliminated: 0,
            survived: 999,
        }];
        let mut rng = Rng::new(1);
        let mut sim = RedLightSim::with_tables(rounds, Vec::new(), &mut rng);
        sim.step(0, &mut rng).expect("round in range");
        assert_eq!(sim.log[0].eliminated_step, 0);
        assert!(sim.step(1, &mut rng).is_err());
    }
}
