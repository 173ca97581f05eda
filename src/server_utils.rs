use crate::constants::DEFAULT_SEED;
use crate::error::SimError;
use crate::types::GameKind;

pub const MIN_PLAYBACK_FPS: u32 = 1;
pub const MAX_PLAYBACK_FPS: u32 = 30;

pub fn normalize_fps(value: Option<i64>, game_fps: u32) -> u32 {
    match value {
        Some(fps) => fps.clamp(MIN_PLAYBACK_FPS as i64, MAX_PLAYBACK_FPS as i64) as u32,
        None => game_fps.clamp(MIN_PLAYBACK_FPS, MAX_PLAYBACK_FPS),
    }
}

pub fn frame_interval_ms(fps: u32) -> u64 {
    1000 / fps.max(1) as u64
}

pub fn parse_seed(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
}

pub fn default_seed_from(raw: Option<&str>) -> u64 {
    parse_seed(raw).unwrap_or(DEFAULT_SEED)
}

pub fn parse_game(raw: &str) -> Result<GameKind, SimError> {
    GameKind::parse(raw).ok_or_else(|| SimError::UnknownGame(raw.trim().to_string()))
}

pub fn parse_port(raw: Option<&str>) -> u16 {
    raw.and_then(|value| value.trim().parse::<u16>().ok())
        .unwrap_or(8080)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_fps_clamps_range() {
        assert_eq!(normalize_fps(None, 5), 5);
        assert_eq!(normalize_fps(None, 0), 1);
        assert_eq!(normalize_fps(Some(-3), 5), 1);
        assert_eq!(normalize_fps(Some(12), 5), 12);
        assert_eq!(normalize_fps(Some(999), 5), 30);
    }

    #[test]
    fn frame_interval_is_never_divided_by_zero() {
        assert_eq!(frame_interval_ms(4), 250);
        assert_eq!(frame_interval_ms(0), 1000);
    }

    #[test]
    fn seed_parsing_is_lenient_for_invalid_values() {
        assert_eq!(parse_seed(Some("7")), Some(7));
        assert_eq!(parse_seed(Some(" 42 ")), Some(42));
        assert_eq!(parse_seed(Some("-1")), None);
        assert_eq!(parse_seed(Some("abc")), None);
        assert_eq!(parse_seed(None), None);
        assert_eq!(default_seed_from(Some("abc")), DEFAULT_SEED);
        assert_eq!(default_seed_from(Some("9")), 9);
    }

    #[test]
    fn parse_game_reports_unknown_keys() {
        assert_eq!(parse_game("glass").ok(), Some(GameKind::GlassBridge));
        assert!(matches!(
            parse_game(" hopscotch "),
            Err(SimError::UnknownGame(name)) if name == "hopscotch"
        ));
    }

    #[test]
    fn parse_port_falls_back_to_default() {
        assert_eq!(parse_port(Some("9000")), 9000);
        assert_eq!(parse_port(Some("99999")), 8080);
        assert_eq!(parse_port(None), 8080);
    }
}
