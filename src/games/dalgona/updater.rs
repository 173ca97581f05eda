use super::*;
use crate::constants::{
    BREAK_DROP, CARVE_EXIT_RATE, FINAL_EXIT_RATE, IDLE_JITTER, LINEUP_JITTER, MOVE_JITTER,
    SCATTER_STEP, TIMEOUT_DROP, TIMEOUT_EXIT_RATE,
};
use crate::games::motion::{jitter, move_step, move_towards};

impl DalgonaSim {
    pub fn step_frame(&mut self, frame: u32, rng: &mut Rng) -> Result<(), SimError> {
        let cursor = self
            .table
            .resolve(frame)
            .ok_or_else(|| out_of_range(frame, self.table.total_frames()))?;

        match cursor.phase {
            DalgonaPhase::Lineup => {
                for participant in &mut self.participants {
                    jitter(&mut participant.position, LINEUP_JITTER, rng);
                }
            }
            DalgonaPhase::Scatter => {
                if cursor.is_first_frame() {
                    for participant in &mut self.participants {
                        participant.target = self.scatter_points[participant.id];
                    }
                }
                for participant in &mut self.participants {
                    move_step(
                        &mut participant.position,
                        participant.target,
                        SCATTER_STEP,
                        MOVE_JITTER,
                        rng,
                    );
                }
            }
            DalgonaPhase::Carving => {
                if cursor.is_first_frame() {
                    self.assign_doors();
                }
                self.apply_breaks(cursor.offset, rng);
                self.apply_finishes(cursor.offset);
                self.walk_finished(CARVE_EXIT_RATE, rng);
                for participant in &mut self.participants {
                    if !participant.status.is_terminal() {
                        jitter(&mut participant.position, IDLE_JITTER, rng);
                    }
                }
            }
            DalgonaPhase::Timeout => {
                if cursor.is_first_frame() {
                    let time_left = self.table.time_left(frame).unwrap_or(0.0);
                    self.apply_timeout(frame, time_left, rng);
                }
                self.walk_finished(TIMEOUT_EXIT_RATE, rng);
            }
            DalgonaPhase::Exit => {
                self.walk_finished(FINAL_EXIT_RATE, rng);
            }
        }
        Ok(())
    }

    fn assign_doors(&mut self) {
        for idx in 0..self.participants.len() {
            if let Some(door) = self.door_of(self.participants[idx].group) {
                self.participants[idx].target = door;
            }
        }
    }

    fn apply_breaks(&mut self, offset: u32, rng: &mut Rng) {
        for id in self.schedule.fail_batch(offset) {
            let participant = &mut self.participants[*id];
            if participant.status.is_terminal() {
                continue;
            }
            participant.status = Status::Failed;
            participant.position.y -= rng.uniform(BREAK_DROP.0, BREAK_DROP.1);
        }
    }

    fn apply_finishes(&mut self, offset: u32) {
        for id in self.schedule.finish_batch(offset) {
            let door = self.door_of(self.participants[*id].group);
            let participant = &mut self.participants[*id];
            if participant.status == Status::Working && participant.fail_mode.is_none() {
                participant.status = Status::Finished;
                if let Some(door) = door {
                    participant.target = door;
                }
            }
        }
    }

    fn apply_timeout(&mut self, frame: u32, time_left: f32, rng: &mut Rng) {
        if self.timeout_applied {
            return;
        }
        self.timeout_applied = true;
        for id in self.schedule.timeout_set() {
            let participant = &mut self.participants[*id];
            if participant.status.is_terminal() {
                continue;
            }
            participant.status = Status::Failed;
            participant.position.y -= rng.uniform(TIMEOUT_DROP.0, TIMEOUT_DROP.1);
            self.timeout_log.push(TimeoutRecord {
                frame,
                timeleft: time_left as i32,
                player_index: participant.id,
                shape: participant.group.to_string(),
            });
        }
    }

    fn walk_finished(&mut self, rate: f32, rng: &mut Rng) {
        for participant in &mut self.participants {
            if participant.status == Status::Finished {
                move_towards(
                    &mut participant.position,
                    participant.target,
                    rate,
                    MOVE_JITTER,
                    rng,
                );
            }
        }
    }
}
