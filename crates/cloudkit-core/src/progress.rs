//! Per-region progress line
//!
//! Regions where nothing was found keep overwriting the same line; a region
//! with results ends the line so its count stays visible.

use std::io::{self, Stdout, Write};

/// Live `[region] N found.` counter
pub struct ProgressReporter<W: Write> {
    out: W,
    prev_len: usize,
    committed: bool,
    started: bool,
}

impl ProgressReporter<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl ProgressReporter<io::Sink> {
    /// Reporter that discards all output
    pub fn silent() -> Self {
        Self::new(io::sink())
    }
}

impl<W: Write> ProgressReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            prev_len: 0,
            committed: false,
            started: false,
        }
    }

    /// Whether the last printed line has been terminated
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Compute the text for a region update and advance the line state
    pub fn render(&mut self, region: &str, delta: usize) -> String {
        let mut progress = format!("[{}] {} found.", region, delta);
        // Only a committed line starts bare; everything else returns the
        // carriage first, including the very first update of a walk.
        let fresh_line = self.committed;
        if !fresh_line {
            progress.push_str(&padding(self.prev_len, progress.len()));
        }
        self.prev_len = progress.len();

        let rendered = match (delta, fresh_line) {
            (0, true) => progress,
            (0, false) => format!("\r{}", progress),
            (_, true) => format!("{}\n", progress),
            (_, false) => format!("\r{}\n", progress),
        };
        self.committed = delta > 0;
        self.started = true;
        rendered
    }

    /// Print the update for a finished region
    pub fn region_done(&mut self, region: &str, delta: usize) -> io::Result<()> {
        let rendered = self.render(region, delta);
        self.out.write_all(rendered.as_bytes())?;
        self.out.flush()
    }

    /// Erase a trailing open line, if any
    pub fn finish(&mut self) -> io::Result<()> {
        if self.started && !self.committed {
            self.out.write_all(b"\n\x1b[F\x1b[K")?;
            self.out.flush()?;
        }
        self.started = false;
        self.prev_len = 0;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn padding(prev_len: usize, new_len: usize) -> String {
    " ".repeat(prev_len.saturating_sub(new_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_updates_overwrite_in_place() {
        let mut reporter = ProgressReporter::new(Vec::new());
        assert_eq!(reporter.render("cn-hangzhou", 0), "\r[cn-hangzhou] 0 found.");
        assert!(!reporter.is_committed());

        // Shorter region name: padded to fully cover the previous text
        let second = reporter.render("cn-wh", 0);
        assert_eq!(second, "\r[cn-wh] 0 found.      ");
        assert_eq!(second.len() - 1, "[cn-hangzhou] 0 found.".len());
    }

    #[test]
    fn test_commit_then_fresh_line() {
        let mut reporter = ProgressReporter::new(Vec::new());
        let first = reporter.render("cn-1", 0);
        let second = reporter.render("cn-1", 5);
        let third = reporter.render("cn-2", 0);

        assert_eq!(first, "\r[cn-1] 0 found.");
        assert_eq!(second, "\r[cn-1] 5 found.\n");
        assert!(second.ends_with('\n'));
        // The third update starts on the line after the committed one
        assert!(!third.starts_with('\r'));
        assert_eq!(third, "[cn-2] 0 found.");
        assert!(!reporter.is_committed());
    }

    #[test]
    fn test_first_update_returns_carriage() {
        let mut reporter = ProgressReporter::new(Vec::new());
        assert_eq!(reporter.render("cn-1", 0), "\r[cn-1] 0 found.");

        let mut reporter = ProgressReporter::new(Vec::new());
        assert_eq!(reporter.render("cn-1", 4), "\r[cn-1] 4 found.\n");
    }

    #[test]
    fn test_overwrite_never_shorter_than_previous() {
        let mut reporter = ProgressReporter::new(Vec::new());
        let updates = [
            ("ap-southeast-1", 0),
            ("us-east-1", 0),
            ("eu-central-1", 0),
            ("me-east-1", 12),
            ("cn-qingdao", 0),
            ("ap-northeast-1", 0),
            ("cn-zb", 0),
        ];

        let mut prev: Option<String> = None;
        for (region, delta) in updates {
            let out = reporter.render(region, delta);
            if let (Some(p), Some(body)) = (&prev, out.strip_prefix('\r')) {
                let body = body.trim_end_matches('\n');
                let p = p.trim_start_matches('\r').trim_end_matches('\n');
                assert!(body.len() >= p.len(), "{:?} does not cover {:?}", body, p);
            }
            prev = Some(out);
        }
    }

    #[test]
    fn test_region_done_writes_and_finish_erases_open_line() {
        let mut reporter = ProgressReporter::new(Vec::new());
        reporter.region_done("cn-1", 3).unwrap();
        reporter.region_done("cn-2", 0).unwrap();
        reporter.finish().unwrap();

        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(out, "\r[cn-1] 3 found.\n[cn-2] 0 found.\n\x1b[F\x1b[K");
    }

    #[test]
    fn test_finish_after_commit_prints_nothing() {
        let mut reporter = ProgressReporter::new(Vec::new());
        reporter.finish().unwrap();
        reporter.region_done("cn-1", 1).unwrap();
        reporter.finish().unwrap();

        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(out, "\r[cn-1] 1 found.\n");
    }
}
