#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Light {
    Backfacing,
    Facing,
}

impl Light {
    pub fn label(self) -> &'static str {
        match self {
            Self::Backfacing => "Backfacing",
            Self::Facing => "Facing",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RoundRecord {
    pub round: u32,
    pub light: Light,
    pub minutes_left: f32,
    pub eliminated: u32,
    pub survived: u32,
}

pub const RED_LIGHT_ROUNDS: [RoundRecord; 12] = [
    RoundRecord { round: 1, light: Light::Backfacing, minutes_left: 5.00, eliminated: 0, survived: 456 },
    RoundRecord { round: 2, light: Light::Facing, minutes_left: 4.90, eliminated: 1, survived: 455 },
    RoundRecord { round: 3, light: Light::Backfacing, minutes_left: 3.18, eliminated: 150, survived: 306 },
    RoundRecord { round: 4, light: Light::Facing, minutes_left: 3.00, eliminated: 220, survived: 236 },
    RoundRecord { round: 5, light: Light::Backfacing, minutes_left: 2.60, eliminated: 220, survived: 236 },
    RoundRecord { round: 6, light: Light::Facing, minutes_left: 2.30, eliminated: 235, survived: 221 },
    RoundRecord { round: 7, light: Light::Backfacing, minutes_left: 1.90, eliminated: 235, survived: 221 },
    RoundRecord { round: 8, light: Light::Facing, minutes_left: 1.50, eliminated: 245, survived: 211 },
    RoundRecord { round: 9, light: Light::Backfacing, minutes_left: 1.10, eliminated: 245, survived: 211 },
    RoundRecord { round: 10, light: Light::Facing, minutes_left: 0.70, eliminated: 252, survived: 204 },
    RoundRecord { round: 11, light: Light::Backfacing, minutes_left: 0.40, eliminated: 252, survived: 204 },
    RoundRecord { round: 12, light: Light::Facing, minutes_left: 0.00, eliminated: 255, survived: 201 },
];

#[derive(Clone, Copy, Debug)]
pub struct FeaturedPlayer {
    pub number: usize,
    pub x: f32,
    pub sprint_y: f32,
    pub eliminated_round: u32,
}

pub const RED_LIGHT_FEATURED: [FeaturedPlayer; 2] = [
    FeaturedPlayer { number: 324, x: 1.0, sprint_y: 8.0, eliminated_round: 2 },
    FeaturedPlayer { number: 250, x: -1.0, sprint_y: 7.5, eliminated_round: 3 },
];

#[derive(Clone, Copy, Debug)]
pub struct ShapeOutcome {
    pub shape: &'static str,
    pub failed: usize,
    pub survived: usize,
}

pub const DALGONA_OUTCOMES: [ShapeOutcome; 4] = [
    ShapeOutcome { shape: "Circle", failed: 25, survived: 18 },
    ShapeOutcome { shape: "Star", failed: 22, survived: 37 },
    ShapeOutcome { shape: "Triangle", failed: 18, survived: 32 },
    ShapeOutcome { shape: "Umbrella", failed: 14, survived: 20 },
];

pub const DALGONA_LINEUP: [&str; 4] = ["Circle", "Triangle", "Star", "Umbrella"];

#[derive(Clone, Copy, Debug)]
pub struct TugMatch {
    pub round: u32,
    pub left: &'static str,
    pub right: &'static str,
    pub winner: &'static str,
}

pub const TUG_MATCHES: [TugMatch; 4] = [
    TugMatch { round: 1, left: "Team 1", right: "Team 7", winner: "Team 1" },
    TugMatch { round: 2, left: "Team 4", right: "Team 5", winner: "Team 4" },
    TugMatch { round: 3, left: "Team 2", right: "Team 8", winner: "Team 8" },
    TugMatch { round: 4, left: "Team 3", right: "Team 6", winner: "Team 3" },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RosterEntry {
    pub number: u32,
    pub team: &'static str,
    pub gender: Gender,
}

const fn m(number: u32, team: &'static str) -> RosterEntry {
    RosterEntry { number, team, gender: Gender::Male }
}

const fn f(number: u32, team: &'static str) -> RosterEntry {
    RosterEntry { number, team, gender: Gender::Female }
}

pub const TUG_ROSTER: [RosterEntry; 80] = [
    m(245, "Team 7"), m(120, "Team 7"), f(37, "Team 7"), f(408, "Team 7"), m(27, "Team 7"),
    m(273, "Team 7"), m(58, "Team 7"), m(243, "Team 7"), m(327, "Team 7"), f(241, "Team 7"),
    m(194, "Team 5"), m(63, "Team 5"), m(19, "Team 5"), m(314, "Team 5"), m(156, "Team 5"),
    m(184, "Team 5"), m(315, "Team 5"), m(396, "Team 5"), m(410, "Team 5"), f(447, "Team 5"),
    m(55, "Team 2"), m(105, "Team 2"), m(132, "Team 2"), f(231, "Team 2"), m(110, "Team 2"),
    m(374, "Team 2"), f(365, "Team 2"), f(59, "Team 2"), m(204, "Team 2"), f(364, "Team 2"),
    m(109, "Team 3"), m(60, "Team 3"), m(279, "Team 3"), m(226, "Team 3"), f(404, "Team 3"),
    m(146, "Team 3"), f(330, "Team 3"), m(403, "Team 3"), m(234, "Team 3"), m(88, "Team 3"),
    m(101, "Team 1"), m(111, "Team 1"), m(278, "Team 1"), m(303, "Team 1"), m(40, "Team 1"),
    m(83, "Team 1"), m(122, "Team 1"), m(357, "Team 1"), m(32, "Team 1"), m(360, "Team 1"),
    m(456, "Team 4"), m(218, "Team 4"), f(67, "Team 4"), m(199, "Team 4"), m(1, "Team 4"),
    f(240, "Team 4"), f(212, "Team 4"), m(244, "Team 4"), m(196, "Team 4"), m(276, "Team 4"),
    m(236, "Team 6"), m(92, "Team 6"), m(86, "Team 6"), m(225, "Team 6"), f(230, "Team 6"),
    m(183, "Team 6"), m(201, "Team 6"), m(417, "Team 6"), f(308, "Team 6"), m(312, "Team 6"),
    m(17, "Team 8"), m(322, "Team 8"), m(96, "Team 8"), f(453, "Team 8"), m(21, "Team 8"),
    m(413, "Team 8"), m(43, "Team 8"), m(28, "Team 8"), m(130, "Team 8"), m(229, "Team 8"),
];

/// Marbles pairings as recorded, including the odd-player bye and one row
/// whose trailing columns are shifted by a missing field.
pub const MARBLES_CSV: &str = "\
Order Finished,Game Name,Winning Player No.,Winning Player Name,Losing Player No.,Losing Player Name,Sub-Game Played,Notes
0,Marbles,212,Han Mi-nyeo,Did not find a partner due to odd number of players,N/A,None,
1,Marbles,17,Do Jung-soo,413,,N/A,
2,Marbles,360,,89,,N/A,
3,Marbles,62,,130,,N/A,
4,Marbles,151,,68,,N/A,
5,Marbles,96,,229,,N/A,
6,Marbles,101,Jang Deok-su,278,,Odd or Even / Dig a Hole,
7,Marbles,407,,43,,N/A,
8,Marbles,453,,85,,N/A,
9,Marbles,21,,276,,N/A,
10,Marbles,244,,196,Hit the Marbles Out,Possibly involved throwing at a group of marbles
11,Marbles,308,,158,,N/A,
12,Marbles,69,,70,,N/A,
13,Marbles,218,Cho Sang-woo,199,Ali Abdul,Odd or Even,
14,Marbles,67,Kang Sae-byeok,240,Ji-yeong,Throw marble close to wall,
15,Marbles,322,Jung Min-tae,28,,N/A,
16,Marbles,456,Seong Gi-hun,1,Oh Il-nam,Odd or Even,
";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    L,
    R,
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Self::L => "L",
            Self::R => "R",
        }
    }
}

pub const GLASS_SAFE_PATH: [Side; 18] = [
    Side::L, Side::R, Side::R, Side::R, Side::R, Side::L,
    Side::R, Side::R, Side::L, Side::R, Side::R, Side::R,
    Side::L, Side::L, Side::L, Side::R, Side::R, Side::L,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Crossing {
    Survived,
    Breaks { step: usize, side: Side },
    PushedOut,
    Falls,
}

#[derive(Clone, Copy, Debug)]
pub struct GlassTurn {
    pub turn: u32,
    pub player: u32,
    pub crossing: Crossing,
    pub cause: Option<&'static str>,
}

const fn breaks(step: usize, side: Side) -> Crossing {
    Crossing::Breaks { step, side }
}

pub const GLASS_TURNS: [GlassTurn; 16] = [
    GlassTurn { turn: 1, player: 96, crossing: breaks(2, Side::L), cause: None },
    GlassTurn { turn: 2, player: 308, crossing: breaks(3, Side::L), cause: None },
    GlassTurn { turn: 3, player: 62, crossing: breaks(7, Side::L), cause: None },
    GlassTurn { turn: 4, player: 21, crossing: breaks(5, Side::L), cause: Some("forgetting the correct step.") },
    GlassTurn { turn: 5, player: 453, crossing: breaks(8, Side::L), cause: None },
    GlassTurn { turn: 6, player: 244, crossing: breaks(10, Side::L), cause: Some("pushed by player 407.") },
    GlassTurn { turn: 7, player: 151, crossing: breaks(9, Side::R), cause: Some("position taking over player 244.") },
    GlassTurn { turn: 8, player: 407, crossing: breaks(11, Side::L), cause: None },
    GlassTurn { turn: 9, player: 101, crossing: breaks(13, Side::R), cause: Some("player 212 hugged by player 101.") },
    GlassTurn { turn: 10, player: 322, crossing: Crossing::PushedOut, cause: Some("pushed out of arena (no glass).") },
    GlassTurn { turn: 11, player: 212, crossing: breaks(13, Side::R), cause: Some("player 212 hugged by player 101.") },
    GlassTurn { turn: 12, player: 360, crossing: Crossing::Falls, cause: Some("eliminated (no glass break).") },
    GlassTurn { turn: 13, player: 17, crossing: breaks(18, Side::R), cause: Some("pushed by player 218.") },
    GlassTurn { turn: 14, player: 218, crossing: Crossing::Survived, cause: None },
    GlassTurn { turn: 15, player: 67, crossing: Crossing::Survived, cause: None },
    GlassTurn { turn: 16, player: 456, crossing: Crossing::Survived, cause: None },
];
