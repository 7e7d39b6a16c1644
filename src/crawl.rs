use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::db;
use crate::loader::{LoadError, LoadEvent, LoadRequest, PageLoader};
use crate::parser::{self, filter, fixup, Category, Entry, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Idle,
    Indexing,
    FixingUp,
    Complete(Duration),
}

#[derive(Debug, Error)]
pub enum CrawlError {
    /// The loader answered a request that is not in flight.
    #[error("unexpected load completion for {} (ticket {received}, expected {expected})", .path.display())]
    UnexpectedCompletion {
        expected: u64,
        received: u64,
        path: PathBuf,
    },
    #[error("page loader went away while loading {}", .0.display())]
    LoaderGone(PathBuf),
}

/// Progress notifications handed to the caller of [`Indexer::index`].
#[derive(Debug)]
pub enum CrawlEvent<'a> {
    /// Indexing starts over this many pages.
    Started { files: usize },
    Loaded(&'a str),
    /// Same page as the previous item, processed without reloading.
    Reused(&'a str),
    Failed { file: &'a str, error: &'a LoadError },
    /// Listed but no longer on disk.
    Skipped(&'a str),
    FixingUp { entries: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Pages listed for the indexing pass.
    pub file_count: usize,
    pub duration: Duration,
    pub inserted: usize,
    /// Entries still unknown after indexing.
    pub unknown: usize,
    pub resolved: usize,
    /// Unknown rows deleted at the end.
    pub purged: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// One page to visit. During fixup each visit carries the entry it is for,
/// so pages and entries can never drift apart.
struct WorkItem {
    filename: String,
    fixup: Option<Entry>,
}

/// Two-pass docset crawler: index every page, then reload the pages of
/// entries left unknown and classify them from their surroundings.
pub struct Indexer<'a, L: PageLoader> {
    documents: PathBuf,
    extension: String,
    loader: L,
    conn: &'a Connection,
    on_event: Box<dyn FnMut(CrawlEvent<'_>) + 'a>,

    state: CrawlState,
    started: Option<Instant>,
    queue: VecDeque<WorkItem>,
    // most recently loaded page, dropped before the next load
    page: Option<Page>,
    next_ticket: u64,

    inserted: Vec<Entry>,
    fixed: Vec<Entry>,
    summary: CrawlSummary,
}

impl<'a, L: PageLoader> Indexer<'a, L> {
    pub fn new(documents: &Path, extension: &str, loader: L, conn: &'a Connection) -> Self {
        Indexer {
            documents: documents.to_path_buf(),
            extension: extension.trim_start_matches('.').to_string(),
            loader,
            conn,
            on_event: Box::new(|_| {}),
            state: CrawlState::Idle,
            started: None,
            queue: VecDeque::new(),
            page: None,
            next_ticket: 0,
            inserted: Vec::new(),
            fixed: Vec::new(),
            summary: CrawlSummary {
                file_count: 0,
                duration: Duration::ZERO,
                inserted: 0,
                unknown: 0,
                resolved: 0,
                purged: 0,
                failed: 0,
                skipped: 0,
            },
        }
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// List the pages to index and get ready to crawl them.
    pub fn index(mut self, on_event: impl FnMut(CrawlEvent<'_>) + 'a) -> Result<Self> {
        if self.state != CrawlState::Idle {
            bail!("indexing already started");
        }

        self.documents = std::path::absolute(&self.documents)
            .with_context(|| format!("Bad documents folder {}", self.documents.display()))?;
        let files = list_pages(&self.documents, &self.extension)?;
        info!(folder = %self.documents.display(), pages = files.len(), "starting index");

        self.on_event = Box::new(on_event);
        self.started = Some(Instant::now());
        self.state = CrawlState::Indexing;
        self.summary.file_count = files.len();
        (self.on_event)(CrawlEvent::Started { files: files.len() });

        self.queue = files
            .into_iter()
            .map(|filename| WorkItem { filename, fixup: None })
            .collect();
        Ok(self)
    }

    /// Block until both passes are done.
    pub fn wait(mut self) -> Result<CrawlSummary> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run())
    }

    /// Drive the crawl to completion. Only one page load is ever in flight.
    pub async fn run(&mut self) -> Result<CrawlSummary> {
        if self.state == CrawlState::Idle {
            bail!("index() must be called before run()");
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<LoadEvent>();

        loop {
            if let CrawlState::Complete(_) = self.state {
                return Ok(self.summary.clone());
            }

            let Some(item) = self.queue.pop_front() else {
                match self.state {
                    CrawlState::Indexing => self.begin_fixup()?,
                    _ => self.finish()?,
                }
                continue;
            };

            let path = self.documents.join(&item.filename);
            if !path.exists() {
                warn!(file = %item.filename, "skipping missing page");
                self.summary.skipped += 1;
                (self.on_event)(CrawlEvent::Skipped(&item.filename));
                continue;
            }

            let reuse = self
                .page
                .as_ref()
                .is_some_and(|p| p.filename() == item.filename);
            if reuse {
                (self.on_event)(CrawlEvent::Reused(&item.filename));
            } else {
                self.page = None;
                let event = self.load(path, &tx, &mut rx).await?;
                match event.result.and_then(|source| Page::parse(&event.path, &source)) {
                    Ok(page) => {
                        (self.on_event)(CrawlEvent::Loaded(&item.filename));
                        self.page = Some(page);
                    }
                    Err(error) => {
                        warn!(file = %item.filename, %error, "page failed to load");
                        self.summary.failed += 1;
                        (self.on_event)(CrawlEvent::Failed {
                            file: &item.filename,
                            error: &error,
                        });
                        continue;
                    }
                }
            }

            self.process(item)?;
        }
    }

    async fn load(
        &mut self,
        path: PathBuf,
        tx: &mpsc::UnboundedSender<LoadEvent>,
        rx: &mut mpsc::UnboundedReceiver<LoadEvent>,
    ) -> Result<LoadEvent> {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        self.loader.load(
            LoadRequest {
                ticket,
                path: path.clone(),
            },
            tx.clone(),
        );

        let event = rx.recv().await.ok_or(CrawlError::LoaderGone(path))?;
        if event.ticket != ticket {
            return Err(CrawlError::UnexpectedCompletion {
                expected: ticket,
                received: event.ticket,
                path: event.path,
            }
            .into());
        }
        Ok(event)
    }

    /// Index or fix up the item whose page was just loaded.
    fn process(&mut self, item: WorkItem) -> Result<()> {
        let Some(page) = self.page.as_ref() else {
            return Ok(());
        };
        if filter::skip_page(page.filename()) {
            debug!(file = %item.filename, "member listing, not processed");
            return Ok(());
        }

        match item.fixup {
            None => {
                let documents = &self.documents;
                let entries: Vec<Entry> = parser::process_page(page)
                    .into_iter()
                    // links to pages missing from the docset are useless
                    .filter(|e| documents.join(&e.filename).exists())
                    .collect();
                debug!(file = %item.filename, entries = entries.len(), "indexed");
                self.summary.inserted += db::insert_entries(self.conn, &entries)?;
                self.inserted.extend(entries);
            }
            Some(entry) => {
                if let Some(found) = fixup::resolve(&entry, page) {
                    debug!(name = %entry.name, category = %found.category, "resolved");
                    let fixed = entry.with_category(found.category);
                    // ignored when it would duplicate a row, purged later
                    if db::update_entry(self.conn, &fixed, found.strip_namespace)? > 0 {
                        self.fixed.push(found.apply(&entry));
                    }
                }
            }
        }
        Ok(())
    }

    /// Swap the queue for one visit per unknown entry, ordered by link target.
    fn begin_fixup(&mut self) -> Result<()> {
        let mut unknowns: Vec<Entry> = std::mem::take(&mut self.inserted)
            .into_iter()
            .filter(|e| e.category.is_unknown())
            .collect();
        unknowns.sort_by(|a, b| a.href.cmp(&b.href));
        self.summary.unknown = unknowns.len();

        if unknowns.is_empty() {
            return self.finish();
        }

        info!(entries = unknowns.len(), "fixing up unknown entries");
        self.state = CrawlState::FixingUp;
        (self.on_event)(CrawlEvent::FixingUp {
            entries: unknowns.len(),
        });

        self.queue = unknowns
            .into_iter()
            .map(|entry| WorkItem {
                filename: entry.filename.clone(),
                fixup: Some(entry),
            })
            .collect();
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.page = None;
        self.summary.purged = db::purge_category(self.conn, Category::Unknown)?;
        self.summary.resolved = self.fixed.len();

        let duration = self.started.map(|t| t.elapsed()).unwrap_or_default();
        self.summary.duration = duration;
        self.state = CrawlState::Complete(duration);
        info!(
            resolved = self.summary.resolved,
            purged = self.summary.purged,
            secs = duration.as_secs_f64(),
            "index complete"
        );
        Ok(())
    }
}

/// Pages with the given extension, sorted by name.
fn list_pages(folder: &Path, extension: &str) -> Result<Vec<String>> {
    let suffix = format!(".{}", extension);
    let mut files: Vec<String> = std::fs::read_dir(folder)
        .with_context(|| format!("Failed to list {}", folder.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(&suffix))
        .collect();
    files.sort();
    Ok(files)
}
