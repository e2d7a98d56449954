#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing for the `collision_map` binary.
//!
//! [`SchoolJoinBar`] shows the per-school radius queries of a proximity
//! join and logs the pair count when the join ends. [`init_logger`] routes
//! `log` output through the same [`MultiProgress`] so log lines do not
//! tear the bar.

use std::sync::Arc;
use std::time::Duration;

use collision_map_spatial::progress::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;

pub use indicatif::MultiProgress;

/// Progress of one school/collision proximity join.
pub struct SchoolJoinBar {
    bar: ProgressBar,
    radius_miles: f64,
}

impl SchoolJoinBar {
    /// Adds a bar to `multi` for a join at `radius_miles`. It stays a
    /// spinner until the number of schools is known.
    #[must_use]
    pub fn new(multi: &MultiProgress, radius_miles: f64) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(120));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} {prefix} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix("schools");
        bar.set_message(format!("indexing collisions for a {radius_miles} mi join"));

        Arc::new(Self { bar, radius_miles })
    }
}

impl ProgressCallback for SchoolJoinBar {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_message(format!("within {} mi", self.radius_miles));
        self.bar.set_style(
            ProgressStyle::with_template(
                "{prefix:>8} {wide_bar:.green/dim} {pos}/{len} {msg} [{elapsed}]",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
        );
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn finish(&self, msg: String) {
        let elapsed = self.bar.elapsed();
        self.bar.finish_and_clear();
        log::info!("{}", join_summary(&msg, self.radius_miles, elapsed));
    }
}

fn join_summary(result: &str, radius_miles: f64, elapsed: Duration) -> String {
    format!(
        "{result} within {radius_miles} mi in {:.1}s",
        elapsed.as_secs_f64()
    )
}

/// Installs `pretty_env_logger` behind `indicatif-log-bridge` and returns
/// the [`MultiProgress`] every bar must be added to.
///
/// `RUST_LOG` wins when set. Otherwise the level is `info`, or `warn`
/// when `quiet`.
#[must_use]
pub fn init_logger(quiet: bool) -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .filter_level(default_level(quiet))
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // A second call keeps the first logger.
    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_ok()
    {
        log::set_max_level(level);
    }

    multi
}

const fn default_level(quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_names_radius_and_duration() {
        let line = join_summary(
            "Joined 3 schools (12 pairs)",
            0.25,
            Duration::from_millis(1300),
        );
        assert_eq!(line, "Joined 3 schools (12 pairs) within 0.25 mi in 1.3s");
    }

    #[test]
    fn quiet_lowers_the_default_level() {
        assert_eq!(default_level(false), LevelFilter::Info);
        assert_eq!(default_level(true), LevelFilter::Warn);
    }

    #[test]
    fn hidden_bar_accepts_a_whole_join() {
        let multi = MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden());
        let bar = SchoolJoinBar::new(&multi, 0.25);
        bar.set_total(2);
        bar.inc(1);
        bar.inc(1);
        bar.finish("Joined 2 schools (0 pairs)".to_string());
    }
}
