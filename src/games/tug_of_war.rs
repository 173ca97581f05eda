use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::json;

use crate::constants::{
    TUG_CENTER_X, TUG_DROP_FALL_Y, TUG_DROP_JITTER, TUG_FPS, TUG_FRAMES_DROP, TUG_FRAMES_LINEUP,
    TUG_FRAMES_PULL, TUG_GAP_W, TUG_LEFT_ANCHOR_X, TUG_LINE_JITTER, TUG_LOSER_RESIST,
    TUG_PULL_JITTER, TUG_RIGHT_ANCHOR_X, TUG_ROPE_PULL_SHIFT_MAX, TUG_ROPE_Y, TUG_STAGGER,
    TUG_STAGGER_JITTER, TUG_WINNER_RETREAT_MAX, TUG_WINNER_SETTLE,
};
use crate::data::{Gender, RosterEntry, TugMatch, TUG_MATCHES, TUG_ROSTER};
use crate::error::SimError;
use crate::export::write_csv;
use crate::games::{out_of_range, FrameSimulation};
use crate::phase::{PhaseSpec, PhaseTable};
use crate::rng::Rng;
use crate::types::{FrameSnapshot, GameKind, GameSummary, ParticipantView, Status, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TugPhase {
    Lineup,
    Pull,
    Drop,
}

impl TugPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Lineup => "LINEUP",
            Self::Pull => "PULL",
            Self::Drop => "DROP",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RopeSide {
    Left,
    Right,
}

#[derive(Clone, Debug)]
pub struct Puller {
    pub number: u32,
    pub team: &'static str,
    pub gender: Gender,
    pub lane: usize,
    pub side: RopeSide,
    pub status: Status,
    pub base: Vec2,
    pub position: Vec2,
}

#[derive(Clone, Debug)]
struct Lane {
    matchup: TugMatch,
    pull_dir: f32,
}

impl Lane {
    fn winner_side(&self) -> RopeSide {
        if self.matchup.winner == self.matchup.left {
            RopeSide::Left
        } else {
            RopeSide::Right
        }
    }

    fn loser(&self) -> &'static str {
        if self.winner_side() == RopeSide::Left {
            self.matchup.right
        } else {
            self.matchup.left
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TugFrameRow {
    pub frame: u32,
    pub phase: &'static str,
    pub round: u32,
    pub left_team: &'static str,
    pub right_team: &'static str,
    pub winner: &'static str,
    pub pull_k: f32,
    pub drop_k: f32,
    pub rope_shift: f32,
    pub finished: usize,
    pub eliminated: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TugPlayerRow {
    pub round: u32,
    pub team: &'static str,
    pub side: RopeSide,
    pub slot: usize,
    pub player_number: u32,
    pub gender: &'static str,
    pub result: Status,
}

#[derive(Clone, Debug)]
pub struct TugOfWarSim {
    table: PhaseTable<TugPhase>,
    lanes: Vec<Lane>,
    pullers: Vec<Puller>,
    rope_shift: Vec<f32>,
    frame_log: Vec<TugFrameRow>,
}

fn linspace(start: f32, end: f32, n: usize) -> Vec<f32> {
    if n <= 1 {
        return vec![start; n];
    }
    (0..n)
        .map(|i| start + (end - start) * i as f32 / (n - 1) as f32)
        .collect()
}

fn team_roster<'a>(roster: &'a [RosterEntry], team: &str) -> Vec<&'a RosterEntry> {
    roster.iter().filter(|entry| entry.team == team).collect()
}

impl TugOfWarSim {
    pub fn new(rng: &mut Rng) -> Self {
        Self::with_tables(&TUG_MATCHES, &TUG_ROSTER, rng)
    }

    pub fn with_tables(matches: &[TugMatch], roster: &[RosterEntry], rng: &mut Rng) -> Self {
        let table = PhaseTable::new(vec![
            PhaseSpec::new(TugPhase::Lineup, TUG_FRAMES_LINEUP),
            PhaseSpec::new(TugPhase::Pull, TUG_FRAMES_PULL),
            PhaseSpec::new(TugPhase::Drop, TUG_FRAMES_DROP),
        ]);
        let mut lanes = Vec::with_capacity(matches.len());
        let mut pullers = Vec::new();

        for (lane_idx, matchup) in matches.iter().enumerate() {
            let lane = Lane {
                matchup: *matchup,
                pull_dir: if matchup.winner == matchup.left { -1.0 } else { 1.0 },
            };
            for side in [RopeSide::Left, RopeSide::Right] {
                let team = match side {
                    RopeSide::Left => matchup.left,
                    RopeSide::Right => matchup.right,
                };
                let members = team_roster(roster, team);
                let n = members.len();
                let xs = match side {
                    RopeSide::Left => {
                        linspace(TUG_LEFT_ANCHOR_X, TUG_CENTER_X - TUG_GAP_W / 2.0 - 0.02, n)
                    }
                    RopeSide::Right => {
                        let mut xs =
                            linspace(TUG_RIGHT_ANCHOR_X, TUG_CENTER_X + TUG_GAP_W / 2.0 + 0.02, n);
                        xs.reverse();
                        xs
                    }
                };
                let xs: Vec<f32> = xs
                    .into_iter()
                    .map(|x| x + rng.uniform(-TUG_LINE_JITTER, TUG_LINE_JITTER))
                    .collect();
                let mut sign = 1.0;
                for (slot, entry) in members.into_iter().enumerate() {
                    let offset = sign
                        * (TUG_STAGGER + rng.uniform(-TUG_STAGGER_JITTER, TUG_STAGGER_JITTER));
                    sign = -sign;
                    let base = Vec2::new(xs[slot], TUG_ROPE_Y + offset);
                    pullers.push(Puller {
                        number: entry.number,
                        team: entry.team,
                        gender: entry.gender,
                        lane: lane_idx,
                        side,
                        status: Status::Working,
                        base,
                        position: base,
                    });
                }
            }
            lanes.push(lane);
        }

        let rope_shift = vec![0.0; lanes.len()];
        Self {
            table,
            lanes,
            pullers,
            rope_shift,
            frame_log: Vec::new(),
        }
    }

    pub fn rope_shift(&self, lane: usize) -> Option<f32> {
        self.rope_shift.get(lane).copied()
    }

    fn player_rows(&self) -> Vec<TugPlayerRow> {
        let mut slots = vec![[0usize; 2]; self.lanes.len()];
        self.pullers
            .iter()
            .map(|p| {
                let side_idx = match p.side {
                    RopeSide::Left => 0,
                    RopeSide::Right => 1,
                };
                let slot = slots[p.lane][side_idx];
                slots[p.lane][side_idx] += 1;
                TugPlayerRow {
                    round: self.lanes[p.lane].matchup.round,
                    team: p.team,
                    side: p.side,
                    slot,
                    player_number: p.number,
                    gender: p.gender.label(),
                    result: p.status,
                }
            })
            .collect()
    }
}

fn pull_factors(phase: TugPhase, progress: f32) -> (f32, f32) {
    match phase {
        TugPhase::Lineup => (0.0, 0.0),
        TugPhase::Pull => (progress, 0.0),
        TugPhase::Drop => (1.0, progress.clamp(0.0, 1.0)),
    }
}

impl FrameSimulation for TugOfWarSim {
    fn kind(&self) -> GameKind {
        GameKind::TugOfWar
    }

    fn total_frames(&self) -> u32 {
        self.table.total_frames()
    }

    fn fps(&self) -> u32 {
        TUG_FPS
    }

    fn step(&mut self, frame: u32, rng: &mut Rng) -> Result<(), SimError> {
        let cursor = self
            .table
            .resolve(frame)
            .ok_or_else(|| out_of_range(frame, self.table.total_frames()))?;
        let (pull_k, drop_k) = pull_factors(cursor.phase, cursor.progress());

        for (idx, lane) in self.lanes.iter().enumerate() {
            self.rope_shift[idx] = lane.pull_dir * TUG_ROPE_PULL_SHIFT_MAX * pull_k;
        }

        for puller in &mut self.pullers {
            let lane = &self.lanes[puller.lane];
            let is_left = puller.side == RopeSide::Left;
            let is_winner = puller.side == lane.winner_side();
            let shift = match (is_winner, is_left) {
                (true, true) => -TUG_WINNER_RETREAT_MAX,
                (true, false) => TUG_WINNER_RETREAT_MAX,
                (false, true) => TUG_LOSER_RESIST,
                (false, false) => -TUG_LOSER_RESIST,
            };

            match cursor.phase {
                TugPhase::Lineup | TugPhase::Pull => {
                    puller.position = Vec2::new(
                        puller.base.x
                            + shift * pull_k
                            + rng.uniform(-TUG_PULL_JITTER, TUG_PULL_JITTER),
                        puller.base.y + rng.uniform(-TUG_PULL_JITTER, TUG_PULL_JITTER),
                    );
                }
                TugPhase::Drop => {
                    if cursor.is_first_frame() {
                        puller.status = if is_winner {
                            Status::Finished
                        } else {
                            Status::Failed
                        };
                    }
                    let start_x = puller.base.x + shift;
                    if is_winner {
                        let settle = (TUG_WINNER_SETTLE * (cursor.offset + 1) as f32).min(1.0);
                        puller.position = Vec2::new(
                            start_x,
                            puller.base.y + (TUG_ROPE_Y - puller.base.y) * settle,
                        );
                    } else {
                        let gap_x = if is_left {
                            TUG_CENTER_X - TUG_GAP_W / 4.0
                        } else {
                            TUG_CENTER_X + TUG_GAP_W / 4.0
                        };
                        puller.position = Vec2::new(
                            start_x
                                + (gap_x - start_x) * (0.25 + 0.50 * drop_k)
                                + rng.uniform(-TUG_DROP_JITTER, TUG_DROP_JITTER),
                            puller.base.y - TUG_DROP_FALL_Y * (0.25 + 0.75 * drop_k),
                        );
                    }
                }
            }
        }

        for (idx, lane) in self.lanes.iter().enumerate() {
            let in_lane = self.pullers.iter().filter(|p| p.lane == idx);
            let (finished, eliminated) = in_lane.fold((0, 0), |(fin, elim), p| match p.status {
                Status::Finished => (fin + 1, elim),
                Status::Failed => (fin, elim + 1),
                _ => (fin, elim),
            });
            self.frame_log.push(TugFrameRow {
                frame,
                phase: cursor.phase.label(),
                round: lane.matchup.round,
                left_team: lane.matchup.left,
                right_team: lane.matchup.right,
                winner: lane.matchup.winner,
                pull_k,
                drop_k,
                rope_shift: self.rope_shift[idx],
                finished,
                eliminated,
            });
        }
        Ok(())
    }

    fn snapshot(&self, frame: u32) -> FrameSnapshot {
        let phase = self
            .table
            .resolve(frame)
            .map(|c| c.phase)
            .unwrap_or(TugPhase::Drop);
        let participants = self
            .pullers
            .iter()
            .map(|p| ParticipantView {
                id: p.number,
                label: format!("{:03}", p.number),
                group: p.team.to_string(),
                lane: p.lane as u32,
                status: p.status,
                x: p.position.x,
                y: p.position.y,
                visible: true,
            })
            .collect();
        let lanes: Vec<_> = self
            .lanes
            .iter()
            .enumerate()
            .map(|(idx, lane)| {
                json!({
                    "round": lane.matchup.round,
                    "left": lane.matchup.left,
                    "right": lane.matchup.right,
                    "winner": lane.matchup.winner,
                    "loser": lane.loser(),
                    "ropeLeftX": TUG_LEFT_ANCHOR_X + self.rope_shift[idx],
                    "ropeRightX": TUG_RIGHT_ANCHOR_X + self.rope_shift[idx],
                })
            })
            .collect();
        FrameSnapshot {
            game: GameKind::TugOfWar,
            frame,
            total_frames: self.table.total_frames(),
            phase: phase.label().to_string(),
            caption: format!("Tug of War: {} Rounds  |  {}", self.lanes.len(), phase.label()),
            time_left: None,
            participants,
            extras: json!({
                "lanes": lanes,
                "ropeY": TUG_ROPE_Y,
                "gapWidth": TUG_GAP_W,
            }),
        }
    }

    fn log_frame(&mut self, _frame: u32) {}

    fn summary(&self) -> GameSummary {
        GameSummary::from_statuses(
            GameKind::TugOfWar,
            self.table.total_frames(),
            self.pullers.iter().map(|p| p.status),
        )
    }

    fn write_logs(&self, out_dir: &Path) -> Result<Vec<PathBuf>, SimError> {
        Ok(vec![
            write_csv(out_dir, "game3_tug_of_war_by_frame.csv", &self.frame_log)?,
            write_csv(out_dir, "game3_tug_of_war_players.csv", &self.player_rows())?,
        ])
    }
}
