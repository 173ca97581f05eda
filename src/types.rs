use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    RedLight,
    Dalgona,
    TugOfWar,
    Marbles,
    GlassBridge,
}

impl GameKind {
    pub const ALL: [GameKind; 5] = [
        GameKind::RedLight,
        GameKind::Dalgona,
        GameKind::TugOfWar,
        GameKind::Marbles,
        GameKind::GlassBridge,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "red_light" | "redlight" | "game1" => Some(Self::RedLight),
            "dalgona" | "honeycomb" | "game2" => Some(Self::Dalgona),
            "tug_of_war" | "tug" | "game3" => Some(Self::TugOfWar),
            "marbles" | "game4" => Some(Self::Marbles),
            "glass_bridge" | "glass" | "game5" => Some(Self::GlassBridge),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::RedLight => "red_light",
            Self::Dalgona => "dalgona",
            Self::TugOfWar => "tug_of_war",
            Self::Marbles => "marbles",
            Self::GlassBridge => "glass_bridge",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::RedLight => "Game 1: Red Light, Green Light",
            Self::Dalgona => "Game 2: Sugar Honeycombs (Dalgona)",
            Self::TugOfWar => "Game 3: Tug of War",
            Self::Marbles => "Game 4: Marbles",
            Self::GlassBridge => "Game 5: Glass Stepping Stones",
        }
    }
}

/// Participant status. Only moves forward; `Finished` and `Failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Queued,
    Working,
    Finished,
    Failed,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }

    pub fn rank(self) -> u8 {
        match self {
            Self::Queued => 0,
            Self::Working => 1,
            Self::Finished | Self::Failed => 2,
        }
    }

    pub fn can_become(self, next: Status) -> bool {
        if self == next {
            return true;
        }
        !self.is_terminal() && next.rank() >= self.rank()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailMode {
    Break,
    Timeout,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ParticipantView {
    pub id: u32,
    pub label: String,
    pub group: String,
    pub lane: u32,
    pub status: Status,
    pub x: f32,
    pub y: f32,
    pub visible: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct FrameSnapshot {
    pub game: GameKind,
    pub frame: u32,
    #[serde(rename = "totalFrames")]
    pub total_frames: u32,
    pub phase: String,
    pub caption: String,
    #[serde(rename = "timeLeft", skip_serializing_if = "Option::is_none")]
    pub time_left: Option<f32>,
    pub participants: Vec<ParticipantView>,
    pub extras: Value,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub game: GameKind,
    #[serde(rename = "totalFrames")]
    pub total_frames: u32,
    pub participants: usize,
    pub finished: usize,
    pub failed: usize,
    pub active: usize,
}

impl GameSummary {
    pub fn from_statuses(
        game: GameKind,
        total_frames: u32,
        statuses: impl IntoIterator<Item = Status>,
    ) -> Self {
        let mut summary = Self {
            game,
            total_frames,
            participants: 0,
            finished: 0,
            failed: 0,
            active: 0,
        };
        for status in statuses {
            summary.participants += 1;
            match status {
                Status::Finished => summary.finished += 1,
                Status::Failed => summary.failed += 1,
                Status::Queued | Status::Working => summary.active += 1,
            }
        }
        summary
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GameInfo {
    pub key: &'static str,
    pub title: &'static str,
    #[serde(rename = "totalFrames")]
    pub total_frames: u32,
    pub fps: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_kind_parse_accepts_keys_and_aliases() {
        for kind in GameKind::ALL {
            assert_eq!(GameKind::parse(kind.key()), Some(kind));
        }
        assert_eq!(GameKind::parse(" Glass "), Some(GameKind::GlassBridge));
        assert_eq!(GameKind::parse("game2"), Some(GameKind::Dalgona));
        assert_eq!(GameKind::parse("squid"), None);
    }

    #[test]
    fn terminal_status_never_changes() {
        assert!(Status::Queued.can_become(Status::Failed));
        assert!(Status::Working.can_become(Status::Finished));
        assert!(!Status::Working.can_become(Status::Queued));
        assert!(!Status::Failed.can_become(Status::Finished));
        assert!(!Status::Finished.can_become(Status::Working));
        assert!(Status::Failed.can_become(Status::Failed));
    }

    #[test]
    fn summary_counts_statuses() {
        let summary = GameSummary::from_statuses(
            GameKind::Dalgona,
            10,
            [Status::Finished, Status::Failed, Status::Working, Status::Failed],
        );
        assert_eq!(summary.participants, 4);
        assert_eq!(summary.finished, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.active, 1);
    }
}
