use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for batch orchestration events.
///
/// Keeps the organize use case free of any particular output mechanism so
/// the CLI, tests and future front ends can watch the same run.
pub trait PipelineLogger: Send {
    /// Report per-image progress.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage (`decode`, `classify`, `store`) took
    /// for one image.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a per-image measurement such as the number of faces found.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything. Used where nobody is watching.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Terminal logger: forwards messages to `log`, keeps stage timings and
/// metrics, and reports throughput in images per second at the end.
///
/// Progress lines are emitted every `throttle_images` images and on the
/// last one.
pub struct StdoutPipelineLogger {
    throttle_images: usize,
    timings: BTreeMap<String, Vec<f64>>,
    metrics: BTreeMap<String, Vec<f64>>,
    start_time: Instant,
    total_images: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_images: usize) -> Self {
        Self {
            throttle_images: throttle_images.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            total_images: 0,
        }
    }

    /// Formatted timing report, or `None` before anything was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let images = self.total_images;
        let mut lines = vec![format!("Timing ({images} images, {elapsed_s:.1}s total):")];

        for (stage, durations) in &self.timings {
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = mean(durations);
            lines.push(format!("  {stage:10}: avg {avg_ms:7.1}ms  total {total_ms:8.0}ms"));
        }
        for (name, values) in &self.metrics {
            lines.push(format!("  {name}: avg {:.1}", mean(values)));
        }

        if images > 0 && elapsed_s > 0.0 {
            lines.push(format!("  Throughput: {:.2} images/s", images as f64 / elapsed_s));
        }
        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(25)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.total_images = total;
        if total > 0 && (current % self.throttle_images == 0 || current == total) {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Progress: {current}/{total} images ({pct:.0}%)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_accepts_everything() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 3);
        logger.timing("classify", 5.0);
        logger.metric("faces", 2.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timings_are_kept_per_stage() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("decode", 12.0);
        logger.timing("classify", 40.0);
        logger.timing("classify", 60.0);

        assert_eq!(logger.timings_for("decode").unwrap(), &[12.0]);
        assert_relative_eq!(mean(logger.timings_for("classify").unwrap()), 50.0);
        assert!(logger.timings_for("store").is_none());
    }

    #[test]
    fn test_summary_lists_stages_metrics_and_throughput() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.progress(4, 4);
        logger.timing("decode", 3.0);
        logger.timing("store", 1.0);
        logger.metric("faces", 1.0);
        logger.metric("faces", 2.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.starts_with("Timing (4 images"));
        assert!(summary.contains("decode"));
        assert!(summary.contains("store"));
        assert!(summary.contains("faces: avg 1.5"));
        assert!(summary.contains("images/s"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutPipelineLogger::default().summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_total() {
        let mut logger = StdoutPipelineLogger::new(0);
        for i in 1..=7 {
            logger.progress(i, 7);
        }
        assert_eq!(logger.total_images, 7);
        assert_eq!(logger.throttle_images, 1);
    }

    #[test]
    fn test_mean_of_nothing_is_zero() {
        assert_relative_eq!(mean(&[]), 0.0);
    }
}
