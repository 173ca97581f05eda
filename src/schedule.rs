use std::collections::HashSet;

use crate::rng::Rng;

pub fn split_sizes(len: usize, batches: usize) -> Vec<usize> {
    assert!(batches > 0, "cannot split into zero batches");
    let base = len / batches;
    let extra = len % batches;
    (0..batches)
        .map(|idx| if idx < extra { base + 1 } else { base })
        .collect()
}

pub fn split_into_batches<T: Copy>(items: &[T], batches: usize) -> Vec<Vec<T>> {
    let mut out = Vec::with_capacity(batches);
    let mut cursor = 0usize;
    for size in split_sizes(items.len(), batches) {
        out.push(items[cursor..cursor + size].to_vec());
        cursor += size;
    }
    assert_eq!(cursor, items.len(), "batches must cover every item");
    out
}

/// `round(len * fraction)` with ties to even, the fraction clamped to `[0, 1]`.
pub fn timeout_quota(len: usize, fraction: f64) -> usize {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    ((len as f64 * fraction).round_ties_even() as usize).min(len)
}

#[derive(Clone, Debug)]
pub struct EventSchedule {
    timeout: Vec<usize>,
    fail_batches: Vec<Vec<usize>>,
    finish_batches: Vec<Vec<usize>>,
}

impl EventSchedule {
    pub fn build(
        failing: &[usize],
        finishing: &[usize],
        timeout_fraction: f64,
        main_frames: u32,
        rng: &mut Rng,
    ) -> Self {
        let frames = main_frames as usize;

        let mut fail_pool = failing.to_vec();
        rng.shuffle(&mut fail_pool);
        let n_timeout = timeout_quota(fail_pool.len(), timeout_fraction);
        let breakers = fail_pool.split_off(n_timeout);
        let timeout = fail_pool;
        let fail_batches = split_into_batches(&breakers, frames);

        let mut finish_pool = finishing.to_vec();
        rng.shuffle(&mut finish_pool);
        let finish_batches = split_into_batches(&finish_pool, frames);

        let schedule = Self {
            timeout,
            fail_batches,
            finish_batches,
        };
        schedule.assert_partition(failing.len(), finishing.len());
        schedule
    }

    pub fn timeout_set(&self) -> &[usize] {
        &self.timeout
    }

    pub fn fail_batch(&self, offset: u32) -> &[usize] {
        self.fail_batches
            .get(offset as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn finish_batch(&self, offset: u32) -> &[usize] {
        self.finish_batches
            .get(offset as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn break_failers(&self) -> impl Iterator<Item = usize> + '_ {
        self.fail_batches.iter().flatten().copied()
    }

    fn assert_partition(&self, failing_len: usize, finishing_len: usize) {
        let fail_total: usize = self.fail_batches.iter().map(Vec::len).sum();
        let finish_total: usize = self.finish_batches.iter().map(Vec::len).sum();
        assert_eq!(
            self.timeout.len() + fail_total,
            failing_len,
            "fail partition lost or duplicated participants"
        );
        assert_eq!(
            finish_total, finishing_len,
            "finish partition lost or duplicated participants"
        );
        assert!(spread_at_most_one(&self.fail_batches));
        assert!(spread_at_most_one(&self.finish_batches));

        let mut seen = HashSet::new();
        let all = self
            .timeout
            .iter()
            .chain(self.fail_batches.iter().flatten())
            .chain(self.finish_batches.iter().flatten());
        for id in all {
            assert!(seen.insert(*id), "participant {id} scheduled twice");
        }
    }
}

fn spread_at_most_one(batches: &[Vec<usize>]) -> bool {
    let min = batches.iter().map(Vec::len).min().unwrap_or(0);
    let max = batches.iter().map(Vec::len).max().unwrap_or(0);
    max - min <= 1
}

pub fn elimination_shortfall(current_survivors: usize, target_survivors: usize) -> usize {
    current_survivors.saturating_sub(target_survivors)
}

pub fn pick_eliminations(survivors: &[usize], target_survivors: usize, rng: &mut Rng) -> Vec<usize> {
    let count = elimination_shortfall(survivors.len(), target_survivors);
    if count == 0 {
        return Vec::new();
    }
    rng.sample_indices(survivors.len(), count)
        .into_iter()
        .map(|idx| survivors[idx])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_sizes_sum_and_differ_by_at_most_one() {
        for len in [0usize, 1, 27, 28, 63, 107, 500] {
            for batches in [1usize, 5, 28] {
                let sizes = split_sizes(len, batches);
                assert_eq!(sizes.len(), batches);
                assert_eq!(sizes.iter().sum::<usize>(), len);
                let min = *sizes.iter().min().unwrap();
                let max = *sizes.iter().max().unwrap();
                assert!(max - min <= 1);
            }
        }
        assert_eq!(split_sizes(63, 28)[..8], [3, 3, 3, 3, 3, 3, 3, 2]);
    }

    #[test]
    fn timeout_quota_rounds_and_clamps() {
        assert_eq!(timeout_quota(79, 0.2), 16);
        assert_eq!(timeout_quota(10, 0.0), 0);
        assert_eq!(timeout_quota(10, 1.5), 10);
        assert_eq!(timeout_quota(10, f64::NAN), 0);
    }

    #[test]
    fn timeout_quota_rounds_half_to_even() {
        assert_eq!(timeout_quota(45, 0.1), 4);
        assert_eq!(timeout_quota(5, 0.5), 2);
        assert_eq!(timeout_quota(7, 0.5), 4);
        assert_eq!(timeout_quota(3, 0.5), 2);
    }

    #[test]
    fn schedule_covers_each_participant_exactly_once() {
        let failing: Vec<usize> = (0..79).collect();
        let finishing: Vec<usize> = (79..186).collect();
        let mut rng = Rng::new(42);
        let schedule = EventSchedule::build(&failing, &finishing, 0.2, 28, &mut rng);

        assert_eq!(schedule.timeout_set().len(), 16);
        assert_eq!(schedule.break_failers().count(), 63);
        assert_eq!(schedule.fail_batches.len(), 28);

        let mut ids: Vec<usize> = schedule.timeout_set().to_vec();
        for offset in 0..28 {
            ids.extend_from_slice(schedule.fail_batch(offset));
            ids.extend_from_slice(schedule.finish_batch(offset));
        }
        ids.sort_unstable();
        assert_eq!(ids, (0..186).collect::<Vec<usize>>());
        assert!(schedule.fail_batch(28).is_empty());
    }

    #[test]
    fn empty_pools_still_produce_one_batch_per_frame() {
        let mut rng = Rng::new(1);
        let schedule = EventSchedule::build(&[], &[], 0.2, 5, &mut rng);
        assert!(schedule.timeout_set().is_empty());
        for offset in 0..5 {
            assert!(schedule.fail_batch(offset).is_empty());
            assert!(schedule.finish_batch(offset).is_empty());
        }
    }

    #[test]
    fn shortfall_is_clamped_to_zero() {
        assert_eq!(elimination_shortfall(221, 211), 10);
        assert_eq!(elimination_shortfall(211, 221), 0);
        assert_eq!(elimination_shortfall(0, 0), 0);
    }

    #[test]
    fn pick_eliminations_selects_distinct_current_survivors() {
        let survivors: Vec<usize> = (100..321).collect();
        let mut rng = Rng::new(9);
        let picked = pick_eliminations(&survivors, 211, &mut rng);
        let unique: HashSet<usize> = picked.iter().copied().collect();
        assert_eq!(picked.len(), 10);
        assert_eq!(unique.len(), 10);
        assert!(picked.iter().all(|id| survivors.contains(id)));

        assert!(pick_eliminations(&survivors, 400, &mut rng).is_empty());
    }
}
