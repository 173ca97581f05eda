use crate::rng::Rng;
use crate::types::Vec2;

pub(crate) fn jitter(position: &mut Vec2, amplitude: f32, rng: &mut Rng) {
    position.x += rng.jitter(amplitude);
    position.y += rng.jitter(amplitude);
}

pub(crate) fn move_step(position: &mut Vec2, target: Vec2, step: f32, amplitude: f32, rng: &mut Rng) {
    let dx = target.x - position.x;
    let dy = target.y - position.y;
    let dist = dx.hypot(dy);
    if dist > step {
        position.x += dx / dist * step;
        position.y += dy / dist * step;
    } else {
        *position = target;
    }
    jitter(position, amplitude, rng);
}

pub(crate) fn move_towards(position: &mut Vec2, target: Vec2, rate: f32, amplitude: f32, rng: &mut Rng) {
    position.x += (target.x - position.x) * rate + rng.jitter(amplitude);
    position.y += (target.y - position.y) * rate + rng.jitter(amplitude);
}
