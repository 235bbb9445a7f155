use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::grid::GridGeometry;
use crate::heatmap::{self, Heatmap, HeatmapConfig};
use crate::journal::{JournalDocument, JournalEntry};

/// Owns the journal files under a set of roots and turns them into heatmaps.
pub struct DiaryService {
    roots: Vec<PathBuf>,
    documents: RwLock<HashMap<PathBuf, JournalDocument>>,
    watcher: Option<RecommendedWatcher>,
    changed: Arc<AtomicBool>,
}

pub struct DiaryServiceBuilder {
    roots: Vec<PathBuf>,
}

impl DiaryServiceBuilder {
    pub fn new() -> Self {
        Self { roots: Vec::new() }
    }

    pub fn add_root(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        if !self.roots.contains(&path) {
            self.roots.push(path);
        }
        self
    }

    pub fn build(self) -> Result<DiaryService> {
        let mut service = DiaryService {
            roots: self.roots,
            documents: RwLock::new(HashMap::new()),
            watcher: None,
            changed: Arc::new(AtomicBool::new(false)),
        };
        service.reload_all()?;
        Ok(service)
    }
}

impl Default for DiaryServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DiaryService {
    pub fn builder() -> DiaryServiceBuilder {
        DiaryServiceBuilder::new()
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Rescans every root. On failure the previously loaded documents stay.
    pub fn reload_all(&mut self) -> Result<()> {
        let mut docs = HashMap::new();
        for root in self.unique_roots() {
            Self::ingest_root(&mut docs, &root)?;
        }
        info!(documents = docs.len(), "journal documents loaded");
        *self.documents.write() = docs;
        Ok(())
    }

    pub fn list_documents(&self) -> Vec<PathBuf> {
        let mut entries: Vec<PathBuf> = self.documents.read().keys().cloned().collect();
        entries.sort();
        entries
    }

    pub fn get_document(&self, path: impl AsRef<Path>) -> Result<JournalDocument> {
        self.documents
            .read()
            .get(path.as_ref())
            .cloned()
            .ok_or_else(|| anyhow!("document not loaded"))
    }

    /// Journal entries in file-name order. Files without a date prefix are skipped.
    pub fn entries(&self) -> Vec<JournalEntry> {
        let docs = self.documents.read();
        let mut dated: Vec<&JournalDocument> = docs.values().collect();
        dated.sort_by(|a, b| a.stem().cmp(b.stem()).then_with(|| a.path().cmp(b.path())));
        dated
            .into_iter()
            .filter_map(|doc| {
                let entry = doc.entry();
                if entry.is_none() {
                    debug!(path = %doc.path().display(), "skipping undated file");
                }
                entry
            })
            .collect()
    }

    pub fn heatmap(&self, config: &HeatmapConfig, geometry: &GridGeometry) -> Result<Heatmap> {
        let entries = self.entries();
        let heatmap = heatmap::render_heatmap(&entries, config, geometry)?;
        Ok(heatmap)
    }

    /// Starts watching the roots. Any event marks the service as changed.
    pub fn watch(&mut self) -> Result<()> {
        if self.watcher.is_some() {
            return Ok(());
        }
        let changed = Arc::clone(&self.changed);
        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    debug!(?event, "filesystem change detected");
                    changed.store(true, Ordering::Release);
                }
                Err(err) => warn!(%err, "watch error"),
            })?;
        for root in self.unique_roots() {
            if !root.exists() {
                continue;
            }
            watcher
                .watch(&root, RecursiveMode::Recursive)
                .with_context(|| format!("failed to watch `{}`", root.display()))?;
        }
        self.watcher = Some(watcher);
        Ok(())
    }

    /// Returns whether anything changed since the last call, clearing the flag.
    pub fn take_changes(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }
}

impl DiaryService {
    fn unique_roots(&self) -> Vec<PathBuf> {
        let mut seen: HashSet<&PathBuf> = HashSet::new();
        self.roots
            .iter()
            .filter(|root| seen.insert(*root))
            .cloned()
            .collect()
    }

    fn ingest_root(docs: &mut HashMap<PathBuf, JournalDocument>, path: &Path) -> Result<()> {
        if path.is_file() {
            if Self::is_journal_file(path) {
                Self::ingest_file(docs, path);
            }
            return Ok(());
        }
        if !path.is_dir() {
            warn!(path = %path.display(), "diary root does not exist");
            return Ok(());
        }
        for entry in WalkDir::new(path).follow_links(true) {
            let entry =
                entry.with_context(|| format!("failed to scan `{}`", path.display()))?;
            if entry.file_type().is_file() && Self::is_journal_file(entry.path()) {
                Self::ingest_file(docs, entry.path());
            }
        }
        Ok(())
    }

    /// Unreadable files are logged and left out.
    fn ingest_file(docs: &mut HashMap<PathBuf, JournalDocument>, path: &Path) {
        match JournalDocument::load(path) {
            Ok(doc) => {
                docs.insert(path.to_path_buf(), doc);
            }
            Err(err) => warn!(path = %path.display(), %err, "skipping unreadable journal file"),
        }
    }

    fn is_journal_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("md"))
            .unwrap_or(false)
    }
}
