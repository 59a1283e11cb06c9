//! Append-only trace streams for offline inspection of a run.
//!
//! Four text files, one value per line: the k-mutation pmf, the sampled
//! `k` per proposal, the scaled cost after each step, and the running best
//! cost. A stream that cannot be opened is silently absent; the search
//! behaves identically either way.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Handles to the four optional trace files.
#[derive(Debug, Default)]
pub struct Trace {
    alias: Option<File>,
    mutate: Option<File>,
    cost: Option<File>,
    fitness: Option<File>,
}

impl Trace {
    /// Opens the trace files under `./log/`, appending to existing ones.
    pub fn open() -> Self {
        Self::open_in("log")
    }

    /// Opens the trace files under `dir`. Streams that fail to open are
    /// disabled rather than reported.
    pub fn open_in(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let open = |name: &str| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(name))
                .ok()
        };

        Self {
            alias: open("alias.log"),
            mutate: open("mutate.log"),
            cost: open("cost.log"),
            fitness: open("fitness.log"),
        }
    }

    /// A trace with every stream disabled.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub(crate) fn alias(&mut self, probability: f64) {
        line(&mut self.alias, format_args!("{probability:.6}"));
    }

    pub(crate) fn mutate(&mut self, k: usize) {
        line(&mut self.mutate, format_args!("{k}"));
    }

    pub(crate) fn cost(&mut self, scaled: f64) {
        line(&mut self.cost, format_args!("{scaled:.6}"));
    }

    pub(crate) fn fitness(&mut self, best: f64) {
        line(&mut self.fitness, format_args!("{best:.6}"));
    }
}

fn line(stream: &mut Option<File>, args: fmt::Arguments) {
    if let Some(file) = stream {
        let _ = writeln!(file, "{args}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_trace_is_inert() {
        let mut trace = Trace::disabled();
        trace.alias(0.5);
        trace.mutate(3);
        trace.cost(0.25);
        trace.fitness(0.75);
    }

    #[test]
    fn test_missing_directory_disables_streams() {
        let mut trace = Trace::open_in("/nonexistent/mqtc-trace");
        trace.fitness(1.0);
    }

    #[test]
    fn test_open_appends() {
        let dir = std::env::temp_dir().join(format!("mqtc-trace-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let _ = std::fs::remove_file(dir.join("mutate.log"));

        {
            let mut trace = Trace::open_in(&dir);
            trace.mutate(1);
        }
        {
            let mut trace = Trace::open_in(&dir);
            trace.mutate(2);
        }

        let text = std::fs::read_to_string(dir.join("mutate.log")).unwrap();
        assert!(text.ends_with("1\n2\n"), "{text:?}");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
