use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::json;

use crate::constants::{
    glass_column_width, GLASS_FALL_DEPTH, GLASS_FPS, GLASS_FRAMES_FALL, GLASS_FRAMES_PAUSE,
    GLASS_PANE_GAP_Y, GLASS_X0, GLASS_X1, GLASS_Y_MID,
};
use crate::data::{Crossing, GlassTurn, Side, GLASS_SAFE_PATH, GLASS_TURNS};
use crate::error::SimError;
use crate::export::write_csv;
use crate::games::{out_of_range, FrameSimulation};
use crate::rng::Rng;
use crate::types::{FrameSnapshot, GameKind, GameSummary, ParticipantView, Status, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Place {
    Start,
    Pane(usize),
    End,
    Gone,
}

#[derive(Clone, Debug)]
struct Crosser {
    number: u32,
    place: Place,
    position: Vec2,
    status: Status,
    visible: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CrosserFrame {
    pub number: u32,
    pub position: Vec2,
    pub status: Status,
    pub visible: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoardFrame {
    pub crossers: Vec<CrosserFrame>,
    pub safe_revealed: BTreeSet<usize>,
    pub broken: BTreeSet<(usize, Side)>,
    pub status_note: String,
    pub cause_note: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BrokenPaneRow {
    pub step: usize,
    pub side: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GlassOutcomeRow {
    pub turn: u32,
    pub player: u32,
    pub result: &'static str,
    pub cause: String,
    pub fail_step: Option<usize>,
}

pub fn pane_center(step: usize, side: Side) -> Vec2 {
    let x = GLASS_X0 + glass_column_width() * step as f32;
    let y = match side {
        Side::L => GLASS_Y_MID + GLASS_PANE_GAP_Y,
        Side::R => GLASS_Y_MID - GLASS_PANE_GAP_Y,
    };
    Vec2::new(x, y)
}

fn start_position() -> Vec2 {
    Vec2::new(GLASS_X0 + glass_column_width() * 0.40, GLASS_Y_MID)
}

fn end_position() -> Vec2 {
    Vec2::new(GLASS_X1 - glass_column_width() * 0.40, GLASS_Y_MID)
}

struct Storyboard<'a> {
    safe_path: &'a [Side],
    crossers: Vec<Crosser>,
    safe_revealed: BTreeSet<usize>,
    broken: BTreeSet<(usize, Side)>,
    frames: Vec<BoardFrame>,
}

impl<'a> Storyboard<'a> {
    fn new(turns: &[GlassTurn], safe_path: &'a [Side]) -> Self {
        let crossers = turns
            .iter()
            .map(|turn| Crosser {
                number: turn.player,
                place: Place::Start,
                position: start_position(),
                status: Status::Queued,
                visible: true,
            })
            .collect();
        Self {
            safe_path,
            crossers,
            safe_revealed: BTreeSet::new(),
            broken: BTreeSet::new(),
            frames: Vec::new(),
        }
    }

    fn safe_side(&self, step: usize) -> Side {
        self.safe_path[step - 1]
    }

    fn capture(&mut self, status_note: String, cause_note: &str) {
        self.frames.push(BoardFrame {
            crossers: self
                .crossers
                .iter()
                .map(|c| CrosserFrame {
                    number: c.number,
                    position: c.position,
                    status: c.status,
                    visible: c.visible,
                })
                .collect(),
            safe_revealed: self.safe_revealed.clone(),
            broken: self.broken.clone(),
            status_note,
            cause_note: cause_note.to_string(),
        });
    }

    fn is_waiting(crosser: &Crosser) -> bool {
        matches!(crosser.place, Place::Start | Place::Pane(_))
    }

    fn set_place(&mut self, idx: usize, place: Place) {
        let crosser = &mut self.crossers[idx];
        crosser.place = place;
        if let Place::Pane(step) = place {
            crosser.status = Status::Working;
            self.safe_revealed.insert(step);
        }
    }

    fn advance_followers(&mut self, leader_step: usize, leader: usize) {
        let mut occupied: BTreeSet<usize> = BTreeSet::from([leader_step]);
        let mut on_glass = Vec::new();
        let mut at_start = Vec::new();
        for (idx, crosser) in self.crossers.iter().enumerate() {
            if idx == leader || !Self::is_waiting(crosser) {
                continue;
            }
            match crosser.place {
                Place::Pane(step) => {
                    occupied.insert(step);
                    on_glass.push((step, idx));
                }
                Place::Start => at_start.push(idx),
                Place::End | Place::Gone => {}
            }
        }
        on_glass.sort_by(|a, b| b.cmp(a));

        for (step, idx) in on_glass {
            let target = step + 1;
            if target < leader_step && !occupied.contains(&target) {
                self.crossers[idx].position = pane_center(target, self.safe_side(target));
                self.set_place(idx, Place::Pane(target));
                occupied.insert(target);
                occupied.remove(&step);
            }
        }

        if leader_step >= 2 && !occupied.contains(&1) {
            if let Some(idx) = at_start.first().copied() {
                self.crossers[idx].position = pane_center(1, self.safe_side(1));
                self.set_place(idx, Place::Pane(1));
            }
        }
    }

    fn hop(&mut self, leader: usize, step: usize, capture: bool) {
        self.advance_followers(step, leader);
        let side = self.safe_side(step);
        self.crossers[leader].position = pane_center(step, side);
        self.set_place(leader, Place::Pane(step));
        if capture {
            let number = self.crossers[leader].number;
            self.capture(
                format!("Step {step} safe {} • Leader {number}", side.label()),
                "",
            );
        }
    }

    fn fall(&mut self, leader: usize, status_note: &str, cause: &str) {
        let origin = self.crossers[leader].position;
        self.crossers[leader].status = Status::Failed;
        for k in 0..GLASS_FRAMES_FALL {
            let t = (k + 1) as f32 / GLASS_FRAMES_FALL as f32;
            self.crossers[leader].position = Vec2::new(origin.x, origin.y - GLASS_FALL_DEPTH * t);
            self.capture(status_note.to_string(), cause);
        }
        let crosser = &mut self.crossers[leader];
        crosser.place = Place::Gone;
        crosser.visible = false;
    }

    fn break_and_fall(&mut self, leader: usize, step: usize, side: Side, cause: &str) {
        self.advance_followers(step, leader);
        let number = self.crossers[leader].number;
        self.crossers[leader].position = pane_center(step, side);
        self.capture(
            format!("WRONG {step}{} • Leader {number}", side.label()),
            cause,
        );
        self.broken.insert((step, side));
        self.fall(
            leader,
            &format!("Leader {number} FELL at {step}{}", side.label()),
            cause,
        );
    }

    fn push_out(&mut self, leader: usize, cause: &str) {
        let number = self.crossers[leader].number;
        let crosser = &mut self.crossers[leader];
        crosser.position = Vec2::new(GLASS_X0 - 0.10, GLASS_Y_MID);
        crosser.status = Status::Failed;
        self.capture(format!("Leader {number} {cause}"), cause);
        let crosser = &mut self.crossers[leader];
        crosser.place = Place::Gone;
        crosser.visible = false;
    }

    fn run_turn(&mut self, leader: usize, turn: &GlassTurn) -> GlassOutcomeRow {
        // A leader still on the start platform steps onto pane 1 off-camera.
        if self.crossers[leader].place == Place::Start {
            self.hop(leader, 1, false);
        }
        let current = match self.crossers[leader].place {
            Place::Pane(step) => step,
            _ => 0,
        };
        if current > 0 {
            for _ in 0..GLASS_FRAMES_PAUSE {
                self.capture(
                    format!(
                        "Turn {} • Player {} ready (from step {current})",
                        turn.turn, turn.player
                    ),
                    "",
                );
            }
        }

        let eliminated = |cause: String, fail_step: Option<usize>| GlassOutcomeRow {
            turn: turn.turn,
            player: turn.player,
            result: "Eliminated",
            cause,
            fail_step,
        };

        match turn.crossing {
            Crossing::Survived => {
                for step in current + 1..=self.safe_path.len() {
                    self.hop(leader, step, true);
                }
                let crosser = &mut self.crossers[leader];
                crosser.position = end_position();
                crosser.status = Status::Finished;
                crosser.place = Place::End;
                self.capture(format!("Turn {} • {} exit", turn.turn, turn.player), "");
                GlassOutcomeRow {
                    turn: turn.turn,
                    player: turn.player,
                    result: "Survived Stage",
                    cause: turn.cause.unwrap_or("Survived crossing").to_string(),
                    fail_step: None,
                }
            }
            Crossing::PushedOut => {
                let cause = turn.cause.unwrap_or("PUSHED OUT");
                self.push_out(leader, cause);
                eliminated(turn.cause.unwrap_or("Pushed out").to_string(), None)
            }
            Crossing::Breaks { step, side } => {
                for hop_step in current + 1..step {
                    self.hop(leader, hop_step, true);
                }
                let cause = turn.cause.unwrap_or("Fell through glass");
                self.break_and_fall(leader, step, side, cause);
                eliminated(cause.to_string(), Some(step))
            }
            Crossing::Falls => {
                let note = turn.cause.unwrap_or("ELIMINATED");
                self.fall(leader, &format!("Leader {} {note}", turn.player), note);
                eliminated(turn.cause.unwrap_or("No glass break").to_string(), None)
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct GlassBridgeSim {
    safe_path: Vec<Side>,
    frames: Vec<BoardFrame>,
    outcomes: Vec<GlassOutcomeRow>,
    broken: BTreeSet<(usize, Side)>,
    current: usize,
}

impl GlassBridgeSim {
    pub fn new() -> Self {
        Self::with_tables(&GLASS_TURNS, &GLASS_SAFE_PATH)
    }

    pub fn with_tables(turns: &[GlassTurn], safe_path: &[Side]) -> Self {
        let mut board = Storyboard::new(turns, safe_path);
        board.capture("All players ready at Start".to_string(), "");
        let mut outcomes = Vec::with_capacity(turns.len());
        for (idx, turn) in turns.iter().enumerate() {
            if !Storyboard::is_waiting(&board.crossers[idx]) {
                continue;
            }
            outcomes.push(board.run_turn(idx, turn));
        }
        Self {
            safe_path: safe_path.to_vec(),
            frames: board.frames,
            outcomes,
            broken: board.broken,
            current: 0,
        }
    }

    fn frame(&self, frame: u32) -> Option<&BoardFrame> {
        self.frames.get(frame as usize)
    }
}

impl Default for GlassBridgeSim {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSimulation for GlassBridgeSim {
    fn kind(&self) -> GameKind {
        GameKind::GlassBridge
    }

    fn total_frames(&self) -> u32 {
        self.frames.len() as u32
    }

    fn fps(&self) -> u32 {
        GLASS_FPS
    }

    fn step(&mut self, frame: u32, _rng: &mut Rng) -> Result<(), SimError> {
        if self.frame(frame).is_none() {
            return Err(out_of_range(frame, self.total_frames()));
        }
        self.current = frame as usize;
        Ok(())
    }

    fn snapshot(&self, frame: u32) -> FrameSnapshot {
        let board = self.frame(frame).or_else(|| self.frames.last());
        let participants = board
            .map(|b| {
                b.crossers
                    .iter()
                    .map(|c| ParticipantView {
                        id: c.number,
                        label: c.number.to_string(),
                        group: "crosser".to_string(),
                        lane: 0,
                        status: c.status,
                        x: c.position.x,
                        y: c.position.y,
                        visible: c.visible,
                    })
                    .collect()
            })
            .unwrap_or_default();
        let (safe, broken, status_note, cause_note) = match board {
            Some(b) => (
                b.safe_revealed
                    .iter()
                    .map(|step| json!({ "step": step, "side": self.safe_path[step - 1].label() }))
                    .collect::<Vec<_>>(),
                b.broken
                    .iter()
                    .map(|(step, side)| json!({ "step": step, "side": side.label() }))
                    .collect::<Vec<_>>(),
                b.status_note.clone(),
                b.cause_note.clone(),
            ),
            None => (Vec::new(), Vec::new(), String::new(), String::new()),
        };
        FrameSnapshot {
            game: GameKind::GlassBridge,
            frame,
            total_frames: self.total_frames(),
            phase: "Crossing".to_string(),
            caption: status_note,
            time_left: None,
            participants,
            extras: json!({
                "steps": self.safe_path.len(),
                "safeRevealed": safe,
                "broken": broken,
                "cause": cause_note,
            }),
        }
    }

    fn log_frame(&mut self, _frame: u32) {}

    fn summary(&self) -> GameSummary {
        let statuses = self
            .frames
            .get(self.current)
            .map(|b| b.crossers.iter().map(|c| c.status).collect::<Vec<_>>())
            .unwrap_or_default();
        GameSummary::from_statuses(GameKind::GlassBridge, self.total_frames(), statuses)
    }

    fn write_logs(&self, out_dir: &Path) -> Result<Vec<PathBuf>, SimError> {
        let broken: Vec<BrokenPaneRow> = self
            .broken
            .iter()
            .map(|(step, side)| BrokenPaneRow {
                step: *step,
                side: side.label(),
            })
            .collect();
        Ok(vec![
            write_csv(out_dir, "game5_broken_panes.csv", &broken)?,
            write_csv(out_dir, "game5_outcomes.csv", &self.outcomes)?,
        ])
    }
}
