use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::Status;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverallRow {
    pub frame: u32,
    pub timeleft: i32,
    pub phase: String,
    pub finished_total: usize,
    pub eliminated_total: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupRow {
    pub frame: u32,
    pub timeleft: i32,
    pub phase: String,
    pub shape: String,
    pub finished_cum: usize,
    pub eliminated_cum: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupStepRow {
    pub frame: u32,
    pub timeleft: i32,
    pub phase: String,
    pub shape: String,
    pub finished_cum: usize,
    pub eliminated_cum: usize,
    pub finished_step: usize,
    pub eliminated_step: usize,
}

#[derive(Clone, Debug)]
pub struct MetricsLogger {
    groups: Vec<String>,
    overall: Vec<OverallRow>,
    by_group: Vec<GroupRow>,
}

impl MetricsLogger {
    pub fn new(groups: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            groups: groups.into_iter().map(Into::into).collect(),
            overall: Vec::new(),
            by_group: Vec::new(),
        }
    }

    pub fn record<'a>(
        &mut self,
        frame: u32,
        phase: &str,
        time_left: f32,
        participants: impl IntoIterator<Item = (&'a str, Status)>,
    ) {
        let timeleft = time_left as i32;
        let mut per_group: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        let mut finished_total = 0usize;
        let mut eliminated_total = 0usize;
        for (group, status) in participants {
            let entry = per_group.entry(group).or_insert((0, 0));
            match status {
                Status::Finished => {
                    finished_total += 1;
                    entry.0 += 1;
                }
                Status::Failed => {
                    eliminated_total += 1;
                    entry.1 += 1;
                }
                Status::Queued | Status::Working => {}
            }
        }

        self.overall.push(OverallRow {
            frame,
            timeleft,
            phase: phase.to_string(),
            finished_total,
            eliminated_total,
        });
        for group in &self.groups {
            let (finished_cum, eliminated_cum) =
                per_group.get(group.as_str()).copied().unwrap_or((0, 0));
            self.by_group.push(GroupRow {
                frame,
                timeleft,
                phase: phase.to_string(),
                shape: group.clone(),
                finished_cum,
                eliminated_cum,
            });
        }
    }

    pub fn overall(&self) -> &[OverallRow] {
        &self.overall
    }

    pub fn by_group_sorted(&self) -> Vec<GroupRow> {
        let mut rows = self.by_group.clone();
        rows.sort_by(|a, b| a.frame.cmp(&b.frame).then_with(|| a.shape.cmp(&b.shape)));
        rows
    }

    /// Per-frame deltas of the cumulative group counts. The first frame of each
    /// group reports its cumulative value; negative deltas clip to zero.
    pub fn by_group_steps(&self) -> Vec<GroupStepRow> {
        let mut previous: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        self.by_group_sorted()
            .into_iter()
            .map(|row| {
                let (finished_step, eliminated_step) = match previous.get(&row.shape) {
                    Some((fin, elim)) => (
                        row.finished_cum.saturating_sub(*fin),
                        row.eliminated_cum.saturating_sub(*elim),
                    ),
                    None => (row.finished_cum, row.eliminated_cum),
                };
                previous.insert(row.shape.clone(), (row.finished_cum, row.eliminated_cum));
                GroupStepRow {
                    frame: row.frame,
                    timeleft: row.timeleft,
                    phase: row.phase,
                    shape: row.shape,
                    finished_cum: row.finished_cum,
                    eliminated_cum: row.eliminated_cum,
                    finished_step,
                    eliminated_step,
                }
            })
            .collect()
    }
}
