use serde_json::Value;

use crate::types::GameKind;

#[derive(Debug, PartialEq)]
pub enum ParsedClientMessage {
    Play {
        game: GameKind,
        seed: Option<u64>,
        fps: Option<i64>,
    },
    Pause,
    Resume,
    Ping {
        t: f64,
    },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "play" => {
            let game = GameKind::parse(object.get("game")?.as_str()?)?;
            let seed = match object.get("seed") {
                None | Some(Value::Null) => None,
                Some(value) => Some(parse_seed_value(value)?),
            };
            let fps = parse_optional_i64(object.get("fps"))?;
            Some(ParsedClientMessage::Play { game, seed, fps })
        }
        "pause" => Some(ParsedClientMessage::Pause),
        "resume" => Some(ParsedClientMessage::Resume),
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

/// Seeds arrive as JSON numbers or decimal strings (for values past 2^53).
fn parse_seed_value(value: &Value) -> Option<u64> {
    if let Some(number) = value.as_u64() {
        return Some(number);
    }
    value.as_str()?.trim().parse::<u64>().ok()
}

fn parse_optional_i64(value: Option<&Value>) -> Option<Option<i64>> {
    const MAX_SAFE_INTEGER_F64: f64 = 9_007_199_254_740_991.0;

    let Some(value) = value else {
        return Some(None);
    };
    if let Some(number) = value.as_i64() {
        return Some(Some(number));
    }
    if let Some(number) = value.as_u64() {
        return i64::try_from(number).ok().map(Some);
    }
    if let Some(number) = value.as_f64() {
        if number.is_finite() {
            let floored = number.floor();
            if floored.abs() > MAX_SAFE_INTEGER_F64 {
                return None;
            }
            return Some(Some(floored as i64));
        }
    }
    None
}
