use crawler::{PageVisit, VisitOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::Cell;

const TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages {msg}";

pub struct CrawlProgress {
    bar: Option<ProgressBar>,
    failed: Cell<usize>,
    finished: Cell<bool>,
}

impl CrawlProgress {
    pub fn new(max_pages: u64, enabled: bool) -> Self {
        let bar = enabled.then(|| {
            let pb = ProgressBar::new(max_pages);
            let style = ProgressStyle::default_bar()
                .template(TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            pb.set_style(style);
            pb
        });

        Self {
            bar,
            failed: Cell::new(0),
            finished: Cell::new(false),
        }
    }

    /// Advances past one dequeued URL. Failed loads still use up a slot
    /// in the queue, so they count towards the position.
    pub fn record(&self, visit: &PageVisit<'_>) {
        if visit.outcome == VisitOutcome::Failed {
            self.failed.set(self.failed.get() + 1);
        }
        if let Some(ref pb) = self.bar {
            pb.inc(1);
            pb.set_message(visit.url.to_string());
        }
    }

    pub fn failed(&self) -> usize {
        self.failed.get()
    }

    pub fn finish(&self, pages: usize) {
        if self.finished.replace(true) {
            return;
        }

        if let Some(ref pb) = self.bar {
            pb.set_length(pb.position());
            pb.finish_with_message(format!("✓ {} pages recorded", pages));
        }
    }
}

impl Drop for CrawlProgress {
    fn drop(&mut self) {
        if !self.finished.get() {
            if let Some(ref pb) = self.bar {
                pb.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit(url: &str, outcome: VisitOutcome) -> PageVisit<'_> {
        PageVisit {
            url,
            outcome,
            visited: 1,
            discovered: 1,
        }
    }

    #[test]
    fn test_counts_failures_without_bar() {
        let progress = CrawlProgress::new(10, false);
        progress.record(&visit("https://example.com/", VisitOutcome::Loaded));
        progress.record(&visit("https://example.com/a", VisitOutcome::Failed));
        progress.record(&visit("https://example.com/b", VisitOutcome::Unreadable));
        assert_eq!(progress.failed(), 1);
        progress.finish(2);
        progress.finish(2);
    }
}
