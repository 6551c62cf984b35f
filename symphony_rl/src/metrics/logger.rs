//! Episode loggers.
//!
//! Provides different backends for per-episode training metrics.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

/// Metrics reported at the end of every training episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSnapshot {
    /// Episode index (0-based).
    pub episode: usize,
    /// Steps taken in this episode.
    pub episode_steps: usize,
    /// Transitions added to the store so far.
    pub total_steps: usize,
    /// Undiscounted return of this episode.
    pub episode_return: f64,
    /// Mean return over the last 100 episodes.
    pub avg_return_100: f64,
    /// Mean episode length over the last 100 episodes.
    pub avg_steps_100: f64,
    /// Actor-loss baseline after the last update.
    pub q_old_policy: f32,
    /// Current exploration noise scale.
    pub exploration_eps: f64,
}

impl EpisodeSnapshot {
    /// Snapshot with zeroed statistics.
    pub fn new(episode: usize, episode_steps: usize, total_steps: usize, episode_return: f64) -> Self {
        Self {
            episode,
            episode_steps,
            total_steps,
            episode_return,
            avg_return_100: 0.0,
            avg_steps_100: 0.0,
            q_old_policy: 0.0,
            exploration_eps: 0.0,
        }
    }

    /// Set the rolling averages.
    pub fn with_averages(mut self, avg_return: f64, avg_steps: f64) -> Self {
        self.avg_return_100 = avg_return;
        self.avg_steps_100 = avg_steps;
        self
    }

    /// Set learner state.
    pub fn with_learner(mut self, q_old_policy: f32, exploration_eps: f64) -> Self {
        self.q_old_policy = q_old_policy;
        self.exploration_eps = exploration_eps;
        self
    }
}

/// Logger trait for different logging backends.
pub trait MetricsLogger {
    /// Log one finished episode.
    fn log(&mut self, snapshot: &EpisodeSnapshot);

    /// Flush any buffered output.
    fn flush(&mut self);
}

/// Console logger with a fixed-width table.
pub struct ConsoleLogger {
    log_interval: usize,
    start_time: Instant,
    show_header: bool,
}

impl ConsoleLogger {
    /// Create a new console logger.
    ///
    /// # Arguments
    ///
    /// * `log_interval` - Episodes between log lines (0 or 1 logs every episode)
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval: log_interval.max(1),
            start_time: Instant::now(),
            show_header: true,
        }
    }

    /// Reset the start time.
    pub fn reset_timer(&mut self) {
        self.start_time = Instant::now();
    }

    fn print_header(&self) {
        println!(
            "{:>7} {:>6} {:>9} {:>10} {:>10} {:>8} {:>9} {:>8} {:>7}",
            "Episode", "Steps", "Total", "Return", "Avg100", "Len100", "Q_old", "Eps", "SPS"
        );
        println!("{}", "-".repeat(82));
    }
}

impl MetricsLogger for ConsoleLogger {
    fn log(&mut self, snapshot: &EpisodeSnapshot) {
        if snapshot.episode % self.log_interval != 0 {
            return;
        }

        if self.show_header {
            self.print_header();
            self.show_header = false;
        }

        let elapsed = self.start_time.elapsed().as_secs_f32();
        let sps = if elapsed > 0.0 {
            snapshot.total_steps as f32 / elapsed
        } else {
            0.0
        };

        println!(
            "{:>7} {:>6} {:>9} {:>10.2} {:>10.2} {:>8.1} {:>9.4} {:>8.4} {:>7.0}",
            snapshot.episode,
            snapshot.episode_steps,
            snapshot.total_steps,
            snapshot.episode_return,
            snapshot.avg_return_100,
            snapshot.avg_steps_100,
            snapshot.q_old_policy,
            snapshot.exploration_eps,
            sps
        );
    }

    fn flush(&mut self) {
        let _ = std::io::stdout().flush();
    }
}

/// CSV file logger for analysis.
pub struct CSVLogger {
    writer: BufWriter<File>,
    start_time: Instant,
}

impl CSVLogger {
    /// Column names, in write order.
    pub const HEADER: &'static str = "episode,episode_steps,total_steps,episode_return,avg_return_100,avg_steps_100,q_old_policy,exploration_eps,elapsed_secs";

    /// Create a new CSV logger, truncating `path`.
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", Self::HEADER)?;

        Ok(Self {
            writer,
            start_time: Instant::now(),
        })
    }
}

impl MetricsLogger for CSVLogger {
    fn log(&mut self, snapshot: &EpisodeSnapshot) {
        let elapsed = self.start_time.elapsed().as_secs_f32();

        let result = writeln!(
            self.writer,
            "{},{},{},{:.4},{:.4},{:.2},{:.6},{:.6},{:.2}",
            snapshot.episode,
            snapshot.episode_steps,
            snapshot.total_steps,
            snapshot.episode_return,
            snapshot.avg_return_100,
            snapshot.avg_steps_100,
            snapshot.q_old_policy,
            snapshot.exploration_eps,
            elapsed
        );
        if let Err(e) = result {
            log::warn!("CSV logger write failed: {}", e);
        }
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }
}

impl Drop for CSVLogger {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Logger that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl MetricsLogger for NullLogger {
    fn log(&mut self, _snapshot: &EpisodeSnapshot) {}

    fn flush(&mut self) {}
}

/// Multi-logger that writes to multiple backends.
pub struct MultiLogger {
    loggers: Vec<Box<dyn MetricsLogger>>,
}

impl MultiLogger {
    /// Create a new multi-logger.
    pub fn new() -> Self {
        Self {
            loggers: Vec::new(),
        }
    }

    /// Add a logger.
    pub fn add<L: MetricsLogger + 'static>(mut self, logger: L) -> Self {
        self.loggers.push(Box::new(logger));
        self
    }

    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }
}

impl Default for MultiLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsLogger for MultiLogger {
    fn log(&mut self, snapshot: &EpisodeSnapshot) {
        for logger in &mut self.loggers {
            logger.log(snapshot);
        }
    }

    fn flush(&mut self) {
        for logger in &mut self.loggers {
            logger.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recording(Rc<RefCell<Vec<EpisodeSnapshot>>>);

    impl MetricsLogger for Recording {
        fn log(&mut self, snapshot: &EpisodeSnapshot) {
            self.0.borrow_mut().push(snapshot.clone());
        }

        fn flush(&mut self) {}
    }

    #[test]
    fn test_episode_snapshot() {
        let snapshot = EpisodeSnapshot::new(7, 200, 1400, -150.0)
            .with_averages(-160.0, 200.0)
            .with_learner(1.5, 0.3);

        assert_eq!(snapshot.episode, 7);
        assert_eq!(snapshot.total_steps, 1400);
        assert!((snapshot.avg_return_100 + 160.0).abs() < 1e-9);
        assert!((snapshot.q_old_policy - 1.5).abs() < 1e-6);
        assert!((snapshot.exploration_eps - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_console_logger() {
        let mut logger = ConsoleLogger::new(0);
        logger.log(&EpisodeSnapshot::new(0, 10, 10, 1.0));
        logger.log(&EpisodeSnapshot::new(1, 10, 20, 2.0));
        logger.flush();
    }

    #[test]
    fn test_csv_logger_writes_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("episodes.csv");
        {
            let mut logger = CSVLogger::new(&path).unwrap();
            logger.log(&EpisodeSnapshot::new(0, 5, 5, 1.25));
            logger.log(&EpisodeSnapshot::new(1, 6, 11, 2.5));
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSVLogger::HEADER);
        assert!(lines[1].starts_with("0,5,5,1.2500,"));
        assert!(lines[2].starts_with("1,6,11,2.5000,"));
    }

    #[test]
    fn test_multi_logger_fans_out() {
        let a = Rc::new(RefCell::new(Vec::new()));
        let b = Rc::new(RefCell::new(Vec::new()));
        let mut multi = MultiLogger::new()
            .add(Recording(a.clone()))
            .add(Recording(b.clone()))
            .add(NullLogger);
        assert_eq!(multi.len(), 3);

        let snapshot = EpisodeSnapshot::new(3, 100, 400, 10.0);
        multi.log(&snapshot);
        multi.flush();

        assert_eq!(a.borrow().as_slice(), &[snapshot.clone()]);
        assert_eq!(b.borrow().as_slice(), &[snapshot]);
    }
}
