pub const DEFAULT_SEED: u64 = 42;

pub const SERVER_TICK_MS: u64 = 20;
pub const OUTBOUND_QUEUE: usize = 256;

// Dalgona timeline (frames per phase).
pub const DALGONA_FRAMES_LINEUP: u32 = 15;
pub const DALGONA_FRAMES_SCATTER: u32 = 18;
pub const DALGONA_FRAMES_CARVE: u32 = 28;
pub const DALGONA_FRAMES_TIMEOUT: u32 = 6;
pub const DALGONA_FRAMES_EXIT: u32 = 10;
pub const DALGONA_FPS: u32 = 5;

pub const DALGONA_TIME_START_SEC: f32 = 600.0;
pub const DALGONA_TIME_SCATTER_END_SEC: f32 = 420.0;
pub const DALGONA_TIME_CARVE_END_SEC: f32 = 60.0;

pub const TIMEOUT_FAIL_FRACTION: f64 = 0.20;

pub const DALGONA_LINE_SPACING: f32 = 11.0;
pub const DALGONA_LINE_OFFSET: f32 = 7.0;
pub const DALGONA_FAILED_ROW_Y: f32 = 28.0;
pub const DALGONA_SURVIVED_ROW_Y: f32 = 24.0;
pub const DALGONA_ROW_STEP: f32 = 0.25;
pub const DALGONA_Y_MAX: f32 = 32.0;
pub const DALGONA_SCATTER_Y: (f32, f32) = (7.0, 20.0);

pub const SCATTER_STEP: f32 = 0.6;
pub const MOVE_JITTER: f32 = 0.02;
pub const LINEUP_JITTER: f32 = 0.04;
pub const IDLE_JITTER: f32 = 0.05;
pub const CARVE_EXIT_RATE: f32 = 0.15;
pub const TIMEOUT_EXIT_RATE: f32 = 0.12;
pub const FINAL_EXIT_RATE: f32 = 0.10;
pub const BREAK_DROP: (f32, f32) = (0.35, 0.8);
pub const TIMEOUT_DROP: (f32, f32) = (0.25, 0.6);

pub const RED_LIGHT_PLAYERS: usize = 456;
pub const RED_LIGHT_FIELD_LENGTH: f32 = 30.0;
pub const RED_LIGHT_FIELD_WIDTH: f32 = 40.0;
pub const RED_LIGHT_FPS: u32 = 4;
pub const RED_LIGHT_SHUFFLE: (f32, f32) = (0.1, 0.3);
pub const RED_LIGHT_ADVANCE: (f32, f32) = (5.0, 7.0);
pub const RED_LIGHT_PANIC_Y: (f32, f32) = (2.0, 4.0);

pub const TUG_FRAMES_LINEUP: u32 = 12;
pub const TUG_FRAMES_PULL: u32 = 30;
pub const TUG_FRAMES_DROP: u32 = 22;
pub const TUG_FPS: u32 = 3;
pub const TUG_TEAM_SIZE: usize = 10;
pub const TUG_LEFT_ANCHOR_X: f32 = 0.16;
pub const TUG_RIGHT_ANCHOR_X: f32 = 0.84;
pub const TUG_CENTER_X: f32 = 0.50;
pub const TUG_ROPE_Y: f32 = 0.50;
pub const TUG_GAP_W: f32 = 0.14;
pub const TUG_ROPE_PULL_SHIFT_MAX: f32 = 0.04;
pub const TUG_WINNER_RETREAT_MAX: f32 = 0.04;
pub const TUG_LOSER_RESIST: f32 = 0.015;
pub const TUG_DROP_FALL_Y: f32 = 0.40;
pub const TUG_LINE_JITTER: f32 = 0.008;
pub const TUG_STAGGER: f32 = 0.06;
pub const TUG_STAGGER_JITTER: f32 = 0.01;
pub const TUG_PULL_JITTER: f32 = 0.002;
pub const TUG_DROP_JITTER: f32 = 0.01;
pub const TUG_WINNER_SETTLE: f32 = 0.08;

pub const MARBLES_FRAMES_INTRO: u32 = 2;
pub const MARBLES_FRAMES_PLAY: u32 = 3;
pub const MARBLES_FRAMES_RESOLVE: u32 = 1;
pub const MARBLES_FPS: u32 = 1;
pub const START_MARBLES: i32 = 10;
pub const WINNER_TARGET_MARBLES: i32 = 20;
pub const TRANSFER_STEPS: usize = 16;

pub const GLASS_STEPS: usize = 18;
pub const GLASS_FPS: u32 = 1;
pub const GLASS_FRAMES_FALL: u32 = 2;
pub const GLASS_FRAMES_PAUSE: u32 = 1;
pub const GLASS_FALL_DEPTH: f32 = 0.40;
pub const GLASS_X0: f32 = 0.05;
pub const GLASS_X1: f32 = 0.95;
pub const GLASS_Y_MID: f32 = 0.50;
pub const GLASS_PANE_GAP_Y: f32 = 0.06;

pub fn dalgona_line_x(lane: usize) -> f32 {
    lane as f32 * DALGONA_LINE_SPACING + DALGONA_LINE_OFFSET
}

pub fn dalgona_x_max(lanes: usize) -> f32 {
    dalgona_line_x(lanes.saturating_sub(1)) + 12.0
}

pub fn glass_column_width() -> f32 {
    (GLASS_X1 - GLASS_X0) / (GLASS_STEPS as f32 + 2.0)
}
