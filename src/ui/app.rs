use crate::cleaner::{DeleteMode, DeletionTask};
use crate::entry::{EntryId, FileEntry};
use crate::events::{DeletionEvent, ScanEvent};
use crate::files::XcodeFiles;
use crate::installed;
use crate::model::{InstalledVersion, Location, ScanScope};
use crate::preferences::Preferences;
use crate::scanner::ScanTask;
use humansize::{BINARY, format_size};
use ratatui::widgets::ListState;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::mpsc::{self, TryRecvError};
use sysinfo::Disks;

pub enum AppState {
    Browsing,
    Confirming,
    Cleaning,
    Scanning,
    Done(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Waiting,
    Scanning,
    Done,
}

impl ScanStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Waiting => "Waiting...",
            Self::Scanning => "Scanning...",
            Self::Done => "Done",
        }
    }
}

/// One visible line of the tree pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    pub location: Location,
    pub id: EntryId,
    pub depth: usize,
}

#[derive(Debug, Default, Clone)]
pub struct CleaningProgress {
    pub done: usize,
    pub total: usize,
    pub failed: usize,
    pub bytes_done: u64,
    pub bytes_total: u64,
    pub current: Option<String>,
    /// `path: reason` for every failed item so far.
    pub failures: Vec<String>,
}

const MAX_LISTED_FAILURES: usize = 5;

pub struct App {
    pub files: XcodeFiles,
    pub preferences: Preferences,
    pub list_state: ListState,
    pub state: AppState,
    pub disks: Disks,
    pub expanded: HashSet<(Location, EntryId)>,
    pub scope: ScanScope,
    pub delete_mode: DeleteMode,
    pub scan_task: Option<ScanTask>,
    pub scan_progress: HashMap<Location, ScanStatus>,
    pub pending_scans: usize,
    pub cleaning_task: Option<DeletionTask>,
    pub cleaning_progress: CleaningProgress,
    pub installed_rx: Option<mpsc::Receiver<Vec<InstalledVersion>>>,
}

impl App {
    pub fn new(files: XcodeFiles, preferences: Preferences, scope: ScanScope) -> Self {
        let delete_mode = files.config().delete_mode();
        Self {
            files,
            preferences,
            list_state: ListState::default(),
            state: AppState::Scanning,
            disks: Disks::new_with_refreshed_list(),
            expanded: HashSet::new(),
            scope,
            delete_mode,
            scan_task: None,
            scan_progress: HashMap::new(),
            pending_scans: 0,
            cleaning_task: None,
            cleaning_progress: CleaningProgress::default(),
            installed_rx: None,
        }
    }

    pub fn rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        for (location, tree) in self.files.trees() {
            let mut stack = vec![(tree.root(), 0)];
            while let Some((id, depth)) = stack.pop() {
                rows.push(Row {
                    location,
                    id,
                    depth,
                });
                if self.expanded.contains(&(location, id)) {
                    for child in tree.children(id).iter().rev() {
                        stack.push((*child, depth + 1));
                    }
                }
            }
        }
        rows
    }

    pub fn entry(&self, row: Row) -> Option<&FileEntry> {
        self.files.tree(row.location).and_then(|t| t.get(row.id))
    }

    pub fn highlighted(&self) -> Option<Row> {
        let i = self.list_state.selected()?;
        self.rows().get(i).copied()
    }

    pub fn next(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    pub fn toggle(&mut self) {
        if let Some(row) = self.highlighted() {
            self.files.toggle(row.location, row.id);
        }
    }

    pub fn expand(&mut self) {
        if let Some(row) = self.highlighted()
            && self.entry(row).is_some_and(|e| !e.is_leaf())
        {
            self.expanded.insert((row.location, row.id));
        }
    }

    /// Collapses the highlighted node, or moves to its parent when there is
    /// nothing to collapse.
    pub fn collapse(&mut self) {
        let Some(row) = self.highlighted() else {
            return;
        };
        if self.expanded.remove(&(row.location, row.id)) {
            return;
        }
        let Some(parent) = self.entry(row).and_then(FileEntry::parent) else {
            return;
        };
        let target = Row {
            location: row.location,
            id: parent,
            depth: row.depth.saturating_sub(1),
        };
        if let Some(i) = self.rows().iter().position(|r| *r == target) {
            self.list_state.select(Some(i));
        }
    }

    pub fn select_all(&mut self) {
        self.files.select_all();
    }

    pub fn deselect_all(&mut self) {
        self.files.deselect_all();
    }

    pub fn total_selected_size(&self) -> u64 {
        self.files.selected_size()
    }

    pub fn start_installed_check(&mut self) {
        let (tx, rx) = mpsc::channel();
        self.installed_rx = Some(rx);
        installed::check_for_installed_xcodes(self.files.config().applications_dir(), move |found| {
            let _ = tx.send(found);
        });
    }

    pub fn check_installed_status(&mut self) {
        if let Some(rx) = &self.installed_rx
            && let Ok(found) = rx.try_recv()
        {
            self.files.set_installed(found);
            self.installed_rx = None;
        }
    }

    pub fn start_scan(&mut self) {
        let locations = self.scope.locations();
        self.scan_progress = locations
            .iter()
            .map(|location| (*location, ScanStatus::Waiting))
            .collect();
        self.pending_scans = locations.len();
        self.expanded.clear();
        self.scan_task = Some(self.files.scan_files(self.scope));
    }

    pub fn check_scan_status(&mut self) {
        let Some(task) = &self.scan_task else {
            return;
        };
        let (events, disconnected) = drain(&task.events);
        for event in events {
            match &event {
                ScanEvent::WillBegin { location, .. } => {
                    self.scan_progress.insert(*location, ScanStatus::Scanning);
                }
                ScanEvent::DidFinish { location, root } => {
                    self.scan_progress.insert(*location, ScanStatus::Done);
                    self.expanded.insert((*location, root.root()));
                    self.pending_scans = self.pending_scans.saturating_sub(1);
                }
                ScanEvent::BatchWillBegin | ScanEvent::BatchDidFinish => {}
            }
            self.files.absorb(event);
        }

        if self.pending_scans > 0 && !disconnected {
            return;
        }
        if let Some(task) = self.scan_task.take()
            && !task.finish()
        {
            tracing::warn!("{} location(s) never finished scanning", self.pending_scans);
        }
        self.pending_scans = 0;
        let len = self.rows().len();
        let selected = self.list_state.selected().unwrap_or(0);
        self.list_state
            .select((len > 0).then(|| selected.min(len - 1)));
        if let AppState::Scanning = self.state {
            self.state = AppState::Browsing;
        }
    }

    pub fn clean_selected(&mut self) {
        let targets = self.files.deletion_targets();
        if targets.is_empty() {
            self.state = AppState::Done("Nothing selected to clean.".to_string());
            return;
        }

        self.state = AppState::Cleaning;
        self.cleaning_progress = CleaningProgress {
            total: targets.len(),
            ..CleaningProgress::default()
        };
        self.cleaning_task = Some(self.files.delete_selected_entries(self.delete_mode));
    }

    pub fn check_cleaning_status(&mut self) {
        let Some(task) = &self.cleaning_task else {
            return;
        };
        let (events, disconnected) = drain(&task.events);
        for event in events {
            let progress = &mut self.cleaning_progress;
            match event {
                DeletionEvent::Started { total, bytes } => {
                    progress.total = total;
                    progress.bytes_total = bytes;
                }
                DeletionEvent::ItemStarted { index, target } => {
                    progress.done = index;
                    progress.current = Some(target.name);
                }
                DeletionEvent::ItemSucceeded { index, bytes } => {
                    progress.done = index + 1;
                    progress.bytes_done += bytes;
                }
                DeletionEvent::ItemFailed {
                    index,
                    path,
                    reason,
                } => {
                    progress.done = index + 1;
                    progress.failed += 1;
                    progress.failures.push(format!("{}: {reason}", path.display()));
                }
                DeletionEvent::Finished(report) => {
                    if let Some(task) = self.cleaning_task.take() {
                        task.finish();
                    }
                    self.preferences.record_cleaned(report.bytes_freed);
                    if let Err(e) = self.preferences.save() {
                        tracing::warn!("cannot save preferences: {e}");
                    }

                    let mut msg = format!(
                        "Cleaned {} in {} of {} item(s).",
                        format_size(report.bytes_freed, BINARY),
                        report.succeeded,
                        report.attempted()
                    );
                    if !report.is_clean() {
                        let _ = write!(msg, "\n{} item(s) failed:", report.failures.len());
                        for failure in report.failures.iter().take(MAX_LISTED_FAILURES) {
                            let _ = write!(msg, "\n - {}: {}", failure.path.display(), failure.reason);
                        }
                    }
                    self.finish_cleaning(msg);
                    return;
                }
            }
        }

        if disconnected {
            // The worker died before reporting; count only what it confirmed.
            self.cleaning_task = None;
            let progress = &self.cleaning_progress;
            self.preferences.record_cleaned(progress.bytes_done);
            if let Err(e) = self.preferences.save() {
                tracing::warn!("cannot save preferences: {e}");
            }
            let msg = format!(
                "Cleaning stopped after {} of {} item(s); {} freed.",
                progress.done,
                progress.total,
                format_size(progress.bytes_done, BINARY)
            );
            self.finish_cleaning(msg);
        }
    }

    fn finish_cleaning(&mut self, msg: String) {
        self.state = AppState::Done(msg);
        self.cleaning_progress.current = None;
        self.disks.refresh(true);
        self.start_scan();
    }
}

/// Everything queued on `rx` right now, and whether its sender is gone.
fn drain<T>(rx: &mpsc::Receiver<T>) -> (Vec<T>, bool) {
    let mut items = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(item) => items.push(item),
            Err(TryRecvError::Empty) => return (items, false),
            Err(TryRecvError::Disconnected) => return (items, true),
        }
    }
}
