// src/refresh.rs

use crate::analyzer::build_batch;
use crate::config::TlocSettings;
use crate::error::{Result, TimelineError};
use crate::git::OpenSource;
use crate::model::{TimelineBatch, TimelineRequest};
use crossbeam_channel::{unbounded, Receiver, Sender};
use indicatif::ProgressBar;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

/// Shared source of refresh generations
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    latest: Arc<AtomicU64>,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new request and returns its generation.
    pub fn next(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn token(&self, generation: u64) -> CancelToken {
        CancelToken { generation, counter: self.clone() }
    }
}

/// Lets a running batch notice that it has been superseded
#[derive(Debug, Clone)]
pub struct CancelToken {
    generation: u64,
    counter: GenerationCounter,
}

impl CancelToken {
    /// A token that is never cancelled, for one-off batches.
    pub fn detached() -> Self {
        let counter = GenerationCounter::new();
        let generation = counter.next();
        Self { generation, counter }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.counter.latest() != self.generation
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(TimelineError::Superseded { generation: self.generation });
        }
        Ok(())
    }
}

/// Result of one refresh, tagged with the generation it was requested as
#[derive(Debug)]
pub struct BatchOutcome {
    pub generation: u64,
    pub result: Result<TimelineBatch>,
}

/// Runs each refresh on its own thread. A newer request supersedes any batch
/// still running, which then stops at its next commit.
pub struct TimelineWorker<O> {
    opener: Arc<O>,
    settings: TlocSettings,
    generations: GenerationCounter,
    show_progress: bool,
    tx: Sender<BatchOutcome>,
    rx: Receiver<BatchOutcome>,
}

impl<O> TimelineWorker<O>
where
    O: OpenSource + Send + 'static,
{
    pub fn new(opener: O, settings: TlocSettings) -> Self {
        let (tx, rx) = unbounded();
        Self {
            opener: Arc::new(opener),
            settings,
            generations: GenerationCounter::new(),
            show_progress: false,
            tx,
            rx,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Display state bound to this worker's generations.
    pub fn view(&self) -> TimelineView {
        TimelineView::new(self.generations.clone())
    }

    pub fn outcomes(&self) -> &Receiver<BatchOutcome> {
        &self.rx
    }

    /// Starts a refresh in the background and returns its generation.
    /// Any refresh still in flight is superseded.
    pub fn request(&self, request: TimelineRequest) -> Result<u64> {
        let generation = self.generations.next();
        let cancel = self.generations.token(generation);
        let opener = Arc::clone(&self.opener);
        let settings = self.settings;
        let tx = self.tx.clone();
        let progress = if self.show_progress {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };

        debug!("Requesting timeline generation {} for {}", generation, request.selector);
        thread::Builder::new()
            .name(format!("timeline-{}", generation))
            .spawn(move || {
                let result = build_batch(opener.as_ref(), &request, &settings, &cancel, &progress);
                // receiver gone means nobody is displaying anymore
                let _ = tx.send(BatchOutcome { generation, result });
            })?;
        Ok(generation)
    }
}

/// What happened when an outcome reached the display side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Shown,
    /// An older generation, ignored
    Stale,
    /// The latest request failed; the previous batch stays on display
    Failed(String),
}

/// Display-side state: the batch currently shown and the last failure notice
#[derive(Debug)]
pub struct TimelineView {
    generations: GenerationCounter,
    shown: Option<TimelineBatch>,
    notice: Option<String>,
}

impl TimelineView {
    pub fn new(generations: GenerationCounter) -> Self {
        Self { generations, shown: None, notice: None }
    }

    pub fn apply(&mut self, outcome: BatchOutcome) -> Applied {
        let shown_generation = self.shown.as_ref().map_or(0, |b| b.generation);
        if outcome.generation != self.generations.latest() || outcome.generation <= shown_generation {
            debug!("Dropping stale timeline generation {}", outcome.generation);
            return Applied::Stale;
        }

        match outcome.result {
            Ok(batch) => {
                self.shown = Some(batch);
                self.notice = None;
                Applied::Shown
            }
            Err(TimelineError::Superseded { .. }) => Applied::Stale,
            Err(e) => {
                warn!("Timeline refresh {} failed: {}", outcome.generation, e);
                let notice = format!("Error loading timeline: {}", e);
                self.notice = Some(notice.clone());
                Applied::Failed(notice)
            }
        }
    }

    pub fn batch(&self) -> Option<&TimelineBatch> {
        self.shown.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}
