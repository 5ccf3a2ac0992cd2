use std::collections::HashMap;
use std::time::Instant;

/// Observer for frame loop activity: per-stage timings, metrics, progress.
///
/// Lets each front-end decide how much of the loop's behaviour to surface
/// without touching the loop itself.
pub trait FrameLoopLogger: Send {
    /// Report that `current` frames out of `total` have been presented.
    /// `total` is 0 when the container does not report a frame count.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage (decode, detect, present) took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. faces per frame).
    fn metric(&mut self, name: &str, value: f64);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullFrameLoopLogger;

impl FrameLoopLogger for NullFrameLoopLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
}

/// Collects timings and metrics and logs a summary table when asked.
///
/// Progress lines are throttled to one every `throttle_frames` frames.
pub struct SummaryFrameLoopLogger {
    throttle_frames: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    frames: usize,
}

impl SummaryFrameLoopLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames: 0,
        }
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Playback summary ({} frames, {:.1}s):",
            self.frames,
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = average(durations);
            let max_ms = durations.iter().copied().fold(0.0, f64::max);
            lines.push(format!(
                "  {stage:8}: avg {avg_ms:6.1}ms  max {max_ms:6.1}ms  total {total_ms:7.0}ms"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            lines.push(format!("  {name}: avg {:.1}", average(&self.metrics[name])));
        }

        if self.frames > 0 && elapsed_ms > 0.0 {
            let fps = self.frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    pub fn frames(&self) -> usize {
        self.frames
    }
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl Default for SummaryFrameLoopLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl FrameLoopLogger for SummaryFrameLoopLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames = current;
        if current % self.throttle_frames == 0 || current == total {
            if total > 0 {
                let pct = current as f64 / total as f64 * 100.0;
                log::info!("Played {current}/{total} frames ({pct:.1}%)");
            } else {
                log::info!("Played {current} frames");
            }
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_accepts_everything() {
        let mut logger = NullFrameLoopLogger;
        logger.progress(1, 10);
        logger.timing("detect", 5.0);
        logger.metric("faces", 3.0);
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = SummaryFrameLoopLogger::new(10);
        logger.timing("detect", 20.0);
        logger.timing("detect", 30.0);
        logger.timing("present", 5.0);

        assert_eq!(logger.timings_for("detect"), Some(&[20.0, 30.0][..]));
        assert_eq!(logger.timings_for("present"), Some(&[5.0][..]));
        assert!(logger.timings_for("decode").is_none());
    }

    #[test]
    fn test_summary_lists_stages_and_metrics() {
        let mut logger = SummaryFrameLoopLogger::new(10);
        logger.progress(2, 0);
        logger.timing("detect", 20.0);
        logger.timing("detect", 40.0);
        logger.metric("faces", 1.0);
        logger.metric("faces", 2.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.starts_with("Playback summary (2 frames"));
        assert!(summary.contains("detect"));
        assert!(summary.contains("max   40.0ms"));
        assert!(summary.contains("faces: avg 1.5"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(SummaryFrameLoopLogger::default().summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_frames() {
        let mut logger = SummaryFrameLoopLogger::new(10);
        for i in 1..=25 {
            logger.progress(i, 0);
        }
        assert_eq!(logger.frames(), 25);
    }

    #[test]
    fn test_average() {
        assert_relative_eq!(average(&[10.0, 20.0, 30.0]), 20.0);
        assert_relative_eq!(average(&[]), 0.0);
    }
}
