use std::path::{Path, PathBuf};

use crate::error::SimError;
use crate::rng::Rng;
use crate::types::{FrameSnapshot, GameInfo, GameKind, GameSummary};

pub mod dalgona;
pub mod glass_bridge;
pub mod marbles;
pub(crate) mod motion;
pub mod red_light;
pub mod tug_of_war;

pub trait FrameSimulation: Send {
    fn kind(&self) -> GameKind;
    fn total_frames(&self) -> u32;
    fn fps(&self) -> u32;
    fn step(&mut self, frame: u32, rng: &mut Rng) -> Result<(), SimError>;
    fn snapshot(&self, frame: u32) -> FrameSnapshot;
    fn log_frame(&mut self, frame: u32);
    fn summary(&self) -> GameSummary;
    fn write_logs(&self, out_dir: &Path) -> Result<Vec<PathBuf>, SimError>;

    fn info(&self) -> GameInfo {
        GameInfo {
            key: self.kind().key(),
            title: self.kind().title(),
            total_frames: self.total_frames(),
            fps: self.fps(),
        }
    }
}

pub fn build(kind: GameKind, rng: &mut Rng) -> Result<Box<dyn FrameSimulation>, SimError> {
    let sim: Box<dyn FrameSimulation> = match kind {
        GameKind::RedLight => Box::new(red_light::RedLightSim::new(rng)),
        GameKind::Dalgona => Box::new(dalgona::DalgonaSim::new(
            dalgona::DalgonaConfig::default(),
            rng,
        )),
        GameKind::TugOfWar => Box::new(tug_of_war::TugOfWarSim::new(rng)),
        GameKind::Marbles => Box::new(marbles::MarblesSim::new(rng)?),
        GameKind::GlassBridge => Box::new(glass_bridge::GlassBridgeSim::new()),
    };
    Ok(sim)
}

pub fn catalog(seed: u64) -> Result<Vec<GameInfo>, SimError> {
    GameKind::ALL
        .iter()
        .map(|kind| {
            let mut rng = Rng::new(seed);
            Ok(build(*kind, &mut rng)?.info())
        })
        .collect()
}

pub(crate) fn out_of_range(frame: u32, total: u32) -> SimError {
    SimError::FrameOutOfRange { frame, total }
}
