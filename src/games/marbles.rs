use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::constants::{
    MARBLES_FPS, MARBLES_FRAMES_INTRO, MARBLES_FRAMES_PLAY, MARBLES_FRAMES_RESOLVE, START_MARBLES,
    TRANSFER_STEPS, WINNER_TARGET_MARBLES,
};
use crate::data::MARBLES_CSV;
use crate::error::SimError;
use crate::export::write_csv;
use crate::games::{out_of_range, FrameSimulation};
use crate::phase::{PhaseSpec, PhaseTable};
use crate::rng::Rng;
use crate::types::{FrameSnapshot, GameKind, GameSummary, ParticipantView, Status};

const BYE_MARKER: &str = "did not find a partner";

#[derive(Clone, Debug, Deserialize)]
struct RawMatch {
    #[serde(rename = "Order Finished")]
    order: u32,
    #[serde(rename = "Winning Player No.")]
    winner_id: String,
    #[serde(rename = "Winning Player Name")]
    winner_name: Option<String>,
    #[serde(rename = "Losing Player No.")]
    loser_id: Option<String>,
    #[serde(rename = "Losing Player Name")]
    loser_name: Option<String>,
    #[serde(rename = "Sub-Game Played")]
    subgame: Option<String>,
    #[serde(rename = "Notes")]
    notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchRecord {
    pub order: u32,
    pub winner_id: String,
    pub winner_name: Option<String>,
    pub loser_id: Option<String>,
    pub loser_name: Option<String>,
    pub subgame: Option<String>,
    pub notes: Option<String>,
}

impl MatchRecord {
    pub fn is_bye(&self) -> bool {
        self.loser_id.is_none()
    }

    pub fn style(&self) -> SubgameStyle {
        SubgameStyle::classify(self.subgame.as_deref().unwrap_or(""))
    }
}

fn missing(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") || trimmed == "None"
}

fn present(value: Option<String>) -> Option<String> {
    let value = value?;
    if missing(&value) {
        None
    } else {
        Some(value.trim().to_string())
    }
}

fn recorded(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn parse_matches(text: &str) -> Result<Vec<MatchRecord>, SimError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut matches = Vec::new();
    for row in reader.deserialize::<RawMatch>() {
        let row = row?;
        let loser_id = row
            .loser_id
            .filter(|id| !id.to_ascii_lowercase().contains(BYE_MARKER));
        let bye = loser_id.is_none();
        matches.push(MatchRecord {
            order: row.order,
            winner_id: row.winner_id.trim().to_string(),
            winner_name: present(row.winner_name),
            loser_id: present(loser_id),
            loser_name: if bye { None } else { present(row.loser_name) },
            subgame: recorded(row.subgame),
            notes: present(row.notes),
        });
    }
    matches.sort_by_key(|m| m.order);
    Ok(matches)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubgameStyle {
    OddEven,
    ThrowWall,
    HitOut,
    Generic,
}

impl SubgameStyle {
    pub fn classify(subgame: &str) -> Self {
        let text = subgame.to_ascii_lowercase();
        if text.contains("odd or even") {
            Self::OddEven
        } else if text.contains("throw marble close to wall") {
            Self::ThrowWall
        } else if text.contains("hit the marbles out") {
            Self::HitOut
        } else {
            Self::Generic
        }
    }

    fn choices(self) -> &'static [i32] {
        match self {
            Self::OddEven => &[1, 2, 3],
            Self::ThrowWall => &[0, 2, 2, 4],
            Self::HitOut => &[1, 2, 3, 4],
            Self::Generic => &[1, 1, 2, 2, 3],
        }
    }
}

/// Per-step marble gains for the winner. Always `steps` entries, none
/// negative, summing to `target - START_MARBLES` (or all zero when there is
/// nothing to gain).
pub fn transfer_schedule(target: i32, steps: usize, style: SubgameStyle, rng: &mut Rng) -> Vec<i32> {
    let remaining = target - START_MARBLES;
    if remaining <= 0 || steps == 0 {
        return vec![0; steps];
    }
    let choices = style.choices();
    let mut gains: Vec<i32> = (0..steps - 1)
        .map(|_| choices[rng.pick_index(choices.len())])
        .collect();
    let drawn: i32 = gains.iter().sum();
    gains.push((remaining - drawn).max(1));

    let total: i32 = gains.iter().sum();
    if total != remaining && total > 0 {
        let scale = remaining as f64 / total as f64;
        for gain in &mut gains {
            *gain = ((*gain as f64 * scale).round() as i32).max(0);
        }
        let mut delta = remaining - gains.iter().sum::<i32>();
        let mut idx = 0usize;
        while delta != 0 {
            let slot = idx % gains.len();
            if delta > 0 {
                gains[slot] += 1;
                delta -= 1;
            } else if gains[slot] > 0 {
                gains[slot] -= 1;
                delta += 1;
            }
            idx += 1;
        }
    }
    gains
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchPhase {
    Intro,
    Play,
    Resolve,
}

impl MatchPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Intro => "Intro",
            Self::Play => "Play",
            Self::Resolve => "Resolve",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub id: String,
    pub name: Option<String>,
    pub match_index: usize,
    pub winner: bool,
    pub status: Status,
}

impl Player {
    fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{name} #{}", self.id),
            None => format!("#{}", self.id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepLogRow {
    pub order: u32,
    pub winner_id: String,
    pub loser_id: Option<String>,
    pub frame: u32,
    pub step_index: usize,
    pub winner_count: i32,
    pub loser_count: i32,
    pub subgame: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutcomeRow {
    pub order: u32,
    pub winner_id: String,
    pub winner_name: Option<String>,
    pub loser_id: Option<String>,
    pub loser_name: Option<String>,
    pub subgame: Option<String>,
    pub notes: Option<String>,
    pub winner_final_marbles: i32,
    pub loser_final_marbles: i32,
}

#[derive(Clone, Debug)]
pub struct MarblesSim {
    table: PhaseTable<MatchPhase>,
    matches: Vec<MatchRecord>,
    schedules: Vec<Vec<i32>>,
    players: Vec<Player>,
    counts: (i32, i32),
    step_log: Vec<StepLogRow>,
    outcomes: Vec<OutcomeRow>,
}

impl MarblesSim {
    pub fn new(rng: &mut Rng) -> Result<Self, SimError> {
        Ok(Self::with_matches(parse_matches(MARBLES_CSV)?, rng))
    }

    pub fn with_matches(matches: Vec<MatchRecord>, rng: &mut Rng) -> Self {
        let table = PhaseTable::new(vec![
            PhaseSpec::new(MatchPhase::Intro, MARBLES_FRAMES_INTRO),
            PhaseSpec::new(MatchPhase::Play, MARBLES_FRAMES_PLAY),
            PhaseSpec::new(MatchPhase::Resolve, MARBLES_FRAMES_RESOLVE),
        ]);
        let schedules = matches
            .iter()
            .map(|m| {
                if m.is_bye() {
                    vec![0; TRANSFER_STEPS]
                } else {
                    transfer_schedule(WINNER_TARGET_MARBLES, TRANSFER_STEPS, m.style(), rng)
                }
            })
            .collect();
        let mut players = Vec::new();
        for (match_index, record) in matches.iter().enumerate() {
            players.push(Player {
                id: record.winner_id.clone(),
                name: record.winner_name.clone(),
                match_index,
                winner: true,
                status: Status::Queued,
            });
            if let Some(loser_id) = &record.loser_id {
                players.push(Player {
                    id: loser_id.clone(),
                    name: record.loser_name.clone(),
                    match_index,
                    winner: false,
                    status: Status::Queued,
                });
            }
        }
        Self {
            table,
            matches,
            schedules,
            players,
            counts: (START_MARBLES, START_MARBLES),
            step_log: Vec::new(),
            outcomes: Vec::new(),
        }
    }


    fn frames_per_match(&self) -> u32 {
        self.table.total_frames()
    }

    fn locate(&self, frame: u32) -> Option<(usize, MatchPhase, u32, u32)> {
        if frame >= self.total_frames() {
            return None;
        }
        let per_match = self.frames_per_match();
        let match_index = (frame / per_match) as usize;
        let cursor = self.table.resolve(frame % per_match)?;
        Some((match_index, cursor.phase, cursor.offset, cursor.len))
    }
}

fn transfer_progress(gains: &[i32], phase: MatchPhase, offset: u32, len: u32) -> (usize, f64) {
    let steps = gains.len();
    if steps == 0 {
        return (0, 0.0);
    }
    let (step_idx, within) = match phase {
        MatchPhase::Intro => (0, 0.0),
        MatchPhase::Play => {
            let position = offset as f64 / len.max(1) as f64 * steps as f64;
            let step_idx = (position.floor() as usize).min(steps - 1);
            (step_idx, position - step_idx as f64)
        }
        MatchPhase::Resolve => (steps - 1, 1.0),
    };
    let before: i32 = gains[..step_idx].iter().sum();
    (step_idx, before as f64 + gains[step_idx] as f64 * within)
}

impl FrameSimulation for MarblesSim {
    fn kind(&self) -> GameKind {
        GameKind::Marbles
    }

    fn total_frames(&self) -> u32 {
        self.frames_per_match() * self.matches.len() as u32
    }

    fn fps(&self) -> u32 {
        MARBLES_FPS
    }

    fn step(&mut self, frame: u32, _rng: &mut Rng) -> Result<(), SimError> {
        let (match_index, phase, offset, len) = self
            .locate(frame)
            .ok_or_else(|| out_of_range(frame, self.total_frames()))?;
        let record = &self.matches[match_index];

        for player in &mut self.players {
            if player.match_index != match_index || player.status.is_terminal() {
                continue;
            }
            player.status = match phase {
                MatchPhase::Resolve if player.winner => Status::Finished,
                MatchPhase::Resolve => Status::Failed,
                _ => Status::Working,
            };
        }

        if record.is_bye() {
            self.counts = (START_MARBLES, 0);
            return Ok(());
        }

        let (step_idx, gained) =
            transfer_progress(&self.schedules[match_index], phase, offset, len);
        let gained = gained.round() as i32;
        let winner_count = (START_MARBLES + gained).clamp(0, WINNER_TARGET_MARBLES);
        let loser_count = (START_MARBLES - gained).clamp(0, WINNER_TARGET_MARBLES);
        self.counts = (winner_count, loser_count);

        match phase {
            MatchPhase::Play => self.step_log.push(StepLogRow {
                order: record.order,
                winner_id: record.winner_id.clone(),
                loser_id: record.loser_id.clone(),
                frame,
                step_index: step_idx,
                winner_count,
                loser_count,
                subgame: record.subgame.clone(),
            }),
            MatchPhase::Resolve if offset == 0 => self.outcomes.push(OutcomeRow {
                order: record.order,
                winner_id: record.winner_id.clone(),
                winner_name: record.winner_name.clone(),
                loser_id: record.loser_id.clone(),
                loser_name: record.loser_name.clone(),
                subgame: record.subgame.clone(),
                notes: record.notes.clone(),
                winner_final_marbles: winner_count,
                loser_final_marbles: loser_count,
            }),
            _ => {}
        }
        Ok(())
    }

    fn snapshot(&self, frame: u32) -> FrameSnapshot {
        let located = self.locate(frame);
        let match_index = located.map(|l| l.0).unwrap_or(self.matches.len().saturating_sub(1));
        let phase = located.map(|l| l.1).unwrap_or(MatchPhase::Resolve);
        let record = self.matches.get(match_index);
        let bye = record.map(MatchRecord::is_bye).unwrap_or(false);

        let participants = self
            .players
            .iter()
            .map(|p| ParticipantView {
                id: p.id.parse().unwrap_or(0),
                label: p.label(),
                group: if p.winner { "winner" } else { "loser" }.to_string(),
                lane: p.match_index as u32,
                status: p.status,
                x: if p.winner { 0.25 } else { 0.75 },
                y: 0.5,
                visible: p.match_index == match_index,
            })
            .collect();

        let caption = match record {
            Some(r) if r.is_bye() => format!("Order {} • BYE (odd player): auto-advance", r.order),
            Some(r) => format!(
                "Order {} • Sub-game: {}",
                r.order,
                r.subgame
                    .as_deref()
                    .filter(|text| !missing(text))
                    .unwrap_or("—")
            ),
            None => String::new(),
        };
        let banner = match (record, phase) {
            (Some(r), MatchPhase::Resolve) => {
                let winner = self
                    .players
                    .iter()
                    .find(|p| p.match_index == match_index && p.winner)
                    .map(Player::label)
                    .unwrap_or_else(|| format!("#{}", r.winner_id));
                match self
                    .players
                    .iter()
                    .find(|p| p.match_index == match_index && !p.winner)
                {
                    Some(loser) => format!("WIN: {winner}   •   ELIMINATED: {}", loser.label()),
                    None => format!("{winner} advances by BYE"),
                }
            }
            _ => String::new(),
        };

        FrameSnapshot {
            game: GameKind::Marbles,
            frame,
            total_frames: self.total_frames(),
            phase: phase.label().to_string(),
            caption,
            time_left: None,
            participants,
            extras: json!({
                "order": record.map(|r| r.order),
                "isBye": bye,
                "winnerCount": self.counts.0,
                "loserCount": if bye { None } else { Some(self.counts.1) },
                "banner": banner,
            }),
        }
    }

    fn log_frame(&mut self, _frame: u32) {}

    fn summary(&self) -> GameSummary {
        GameSummary::from_statuses(
            GameKind::Marbles,
            self.total_frames(),
            self.players.iter().map(|p| p.status),
        )
    }

    fn write_logs(&self, out_dir: &Path) -> Result<Vec<PathBuf>, SimError> {
        Ok(vec![
            write_csv(out_dir, "game4_marbles_per_frame_steps.csv", &self.step_log)?,
            write_csv(out_dir, "game4_marbles_outcomes.csv", &self.outcomes)?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_embedded_pairings() {
        let matches = parse_matches(MARBLES_CSV).expect("embedded csv parses");
        assert_eq!(matches.len(), 17);
        assert!(matches[0].is_bye());
        assert_eq!(matches[0].winner_id, "212");
        assert_eq!(matches[0].subgame.as_deref(), Some("None"));
        assert_eq!(matches.iter().filter(|m| m.is_bye()).count(), 1);

        assert_eq!(matches[13].style(), SubgameStyle::OddEven);
        assert_eq!(matches[14].style(), SubgameStyle::ThrowWall);
        assert_eq!(matches[6].style(), SubgameStyle::OddEven);
        assert_eq!(matches[1].subgame.as_deref(), Some("N/A"));
        assert_eq!(matches[1].style(), SubgameStyle::Generic);

        // Row 10 is taken as recorded: its sub-game lands in the name column.
        assert_eq!(matches[10].loser_name.as_deref(), Some("Hit the Marbles Out"));
        assert_eq!(matches[10].style(), SubgameStyle::Generic);
        assert_eq!(matches[10].notes, None);
    }

    #[test]
    fn every_schedule_transfers_exactly_ten() {
        for seed in 0..50 {
            let mut rng = Rng::new(seed);
            for style in [
                SubgameStyle::OddEven,
                SubgameStyle::ThrowWall,
                SubgameStyle::HitOut,
                SubgameStyle::Generic,
            ] {
                let gains = transfer_schedule(20, 16, style, &mut rng);
                assert_eq!(gains.len(), 16);
                assert_eq!(gains.iter().sum::<i32>(), 10, "{style:?} seed {seed}");
                assert!(gains.iter().all(|g| *g >= 0), "{style:?} seed {seed}");
            }
        }
    }

    #[test]
    fn nothing_to_gain_is_all_zero() {
        let mut rng = Rng::new(1);
        assert_eq!(transfer_schedule(10, 4, SubgameStyle::Generic, &mut rng), vec![0; 4]);
    }

    #[test]
    fn winners_end_with_twenty_and_losers_are_eliminated() {
        let mut rng = Rng::new(42);
        let mut sim = MarblesSim::new(&mut rng).expect("embedded csv parses");
        assert_eq!(sim.total_frames(), 102);
        for frame in 0..sim.total_frames() {
            sim.step(frame, &mut rng).expect("frame in range");
        }
        assert_eq!(sim.outcomes.len(), 16);
        for outcome in &sim.outcomes {
            assert_eq!(outcome.winner_final_marbles, 20);
            assert_eq!(outcome.loser_final_marbles, 0);
        }
        assert_eq!(sim.step_log.len(), 16 * 3);
        for row in &sim.step_log {
            assert_eq!(row.winner_count + row.loser_count, 20);
            assert!((0..=20).contains(&row.winner_count));
        }

        let summary = sim.summary();
        assert_eq!(summary.participants, 33);
        assert_eq!(summary.finished, 17);
        assert_eq!(summary.failed, 16);
    }

    #[test]
    fn players_wait_until_their_pairing() {
        let mut rng = Rng::new(42);
        let mut sim = MarblesSim::new(&mut rng).expect("embedded csv parses");
        for frame in 0..8 {
            sim.step(frame, &mut rng).expect("frame in range");
        }
        // Frame 7 is the second frame of pairing 1.
        for player in &sim.players {
            match player.match_index {
                0 => assert_eq!(player.status, Status::Finished),
                1 => assert_eq!(player.status, Status::Working),
                _ => assert_eq!(player.status, Status::Queued),
            }
        }
        let snapshot = sim.snapshot(7);
        assert_eq!(snapshot.phase, "Intro");
        assert_eq!(snapshot.extras["winnerCount"], 10);
    }

    #[test]
    fn logs_keep_the_recorded_subgame_text() {
        let mut rng = Rng::new(42);
        let mut sim = MarblesSim::new(&mut rng).expect("embedded csv parses");
        for frame in 0..sim.total_frames() {
            sim.step(frame, &mut rng).expect("frame in range");
        }
        let first = sim.step_log.iter().find(|row| row.order == 1).expect("pairing 1 steps");
        assert_eq!(first.subgame.as_deref(), Some("N/A"));
        let outcome = sim.outcomes.iter().find(|row| row.order == 1).expect("pairing 1 outcome");
        assert_eq!(outcome.subgame.as_deref(), Some("N/A"));
        assert_eq!(sim.snapshot(7).caption, "Order 1 • Sub-game: —");
    }
}
