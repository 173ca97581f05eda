use super::*;
use crate::export::write_csv;

impl DalgonaSim {
    pub(super) fn export_logs(&self, out_dir: &Path) -> Result<Vec<PathBuf>, SimError> {
        Ok(vec![
            write_csv(
                out_dir,
                "game2_dalgona_overall_by_frame.csv",
                self.metrics.overall(),
            )?,
            write_csv(
                out_dir,
                "game2_dalgona_per_shape_cum.csv",
                &self.metrics.by_group_sorted(),
            )?,
            write_csv(
                out_dir,
                "game2_dalgona_per_shape_step.csv",
                &self.metrics.by_group_steps(),
            )?,
            write_csv(
                out_dir,
                "game2_dalgona_timeout_players.csv",
                &self.timeout_log,
            )?,
        ])
    }
}
