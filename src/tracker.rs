//! Download lifecycle tracking
//!
//! Owns the active set and the bounded history. All mutation goes through
//! [`DownloadTracker::apply`], [`DownloadTracker::fire_due`] and
//! [`DownloadTracker::reconcile`], which the UI thread calls one at a time.

use crate::constants::*;
use crate::events::{DownloadCompleted, DownloadFailed, DownloadProgress, DownloadStarted, ServerEvent};
use crate::scheduler::DelayedTasks;
use crate::types::{non_blank, DownloadMetadata, DownloadStatus};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRecord {
    pub id: String,
    pub metadata: DownloadMetadata,
    pub status: DownloadStatus,
    pub progress_log: Vec<String>,
    pub latest_output: Option<String>,
    /// Collapsed output block, set once the record is terminal
    pub final_output: Option<String>,
    pub error_detail: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Set when the record moves into history
    pub completed_at: Option<DateTime<Utc>>,
}

impl DownloadRecord {
    fn new(id: String, metadata: DownloadMetadata, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            metadata,
            status: DownloadStatus::Downloading,
            progress_log: Vec::new(),
            latest_output: None,
            final_output: None,
            error_detail: None,
            started_at,
            ended_at: None,
            completed_at: None,
        }
    }

    fn push_output(&mut self, output: &str) {
        self.progress_log.push(output.to_string());
        self.latest_output = Some(output.to_string());
    }

    /// Supplied output, else the joined log, else a placeholder
    fn collapse_output(&self, supplied: Option<&str>) -> String {
        if let Some(output) = non_blank(supplied) {
            return output.to_string();
        }
        if !self.progress_log.is_empty() {
            return self.progress_log.join("\n");
        }
        NO_OUTPUT_PLACEHOLDER.to_string()
    }
}

/// Views touched by a structural change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Surfaces {
    pub active: bool,
    pub history: bool,
}

impl Surfaces {
    pub const ACTIVE: Surfaces = Surfaces { active: true, history: false };
    pub const BOTH: Surfaces = Surfaces { active: true, history: true };

    pub fn union(self, other: Surfaces) -> Surfaces {
        Surfaces {
            active: self.active || other.active,
            history: self.history || other.history,
        }
    }
}

/// What a mutation did, so the renderer knows how much to redraw
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerChange {
    None,
    /// Only the output of one in-flight record changed
    Progress { id: String },
    Structural(Surfaces),
}

impl TrackerChange {
    pub fn merge(self, other: TrackerChange) -> TrackerChange {
        match (self, other) {
            (TrackerChange::Structural(a), TrackerChange::Structural(b)) => {
                TrackerChange::Structural(a.union(b))
            }
            (TrackerChange::Structural(a), _) | (_, TrackerChange::Structural(a)) => {
                TrackerChange::Structural(a)
            }
            (TrackerChange::None, other) => other,
            (progress, _) => progress,
        }
    }
}

/// A download the backend reports as in flight
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSnapshot {
    pub id: String,
    pub metadata: DownloadMetadata,
    pub started_at: Option<DateTime<Utc>>,
}

/// Identifies one outstanding status request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileTicket(u64);

/// What the tracker knew when a status request went out, plus what settled since
struct PendingReconcile {
    ticket: ReconcileTicket,
    baseline: HashSet<String>,
    settled: HashSet<String>,
}

pub struct DownloadTracker {
    active: HashMap<String, DownloadRecord>,
    order: Vec<String>,
    history: VecDeque<DownloadRecord>,
    evictions: DelayedTasks<String>,
    history_capacity: usize,
    completed_grace: Duration,
    error_grace: Duration,
    pending: Option<PendingReconcile>,
    next_ticket: u64,
}

impl Default for DownloadTracker {
    fn default() -> Self {
        Self {
            active: HashMap::new(),
            order: Vec::new(),
            history: VecDeque::new(),
            evictions: DelayedTasks::new(),
            history_capacity: HISTORY_CAPACITY,
            completed_grace: COMPLETED_GRACE,
            error_grace: ERROR_GRACE,
            pending: None,
            next_ticket: 0,
        }
    }
}

impl DownloadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &ServerEvent, now: Instant) -> TrackerChange {
        match event {
            ServerEvent::Started(started) => self.on_started(started),
            ServerEvent::Progress(progress) => self.on_progress(progress),
            ServerEvent::Completed(completed) => self.on_completed(completed, now),
            ServerEvent::Error(failed) => self.on_error(failed, now),
            ServerEvent::Heartbeat | ServerEvent::Connected => TrackerChange::None,
            ServerEvent::Unknown(kind) => {
                debug!(kind = %kind, "Ignoring unknown event type");
                TrackerChange::None
            }
        }
    }

    fn on_started(&mut self, started: &DownloadStarted) -> TrackerChange {
        if self.active.contains_key(&started.id) {
            debug!(id = %started.id, "Duplicate download_started ignored");
            return TrackerChange::None;
        }
        let metadata = started.metadata.clone().unwrap_or_default();
        info!(id = %started.id, title = metadata.title_or_default(), "Download started");
        self.insert_active(DownloadRecord::new(started.id.clone(), metadata, Utc::now()));
        TrackerChange::Structural(Surfaces::ACTIVE)
    }

    fn on_progress(&mut self, progress: &DownloadProgress) -> TrackerChange {
        let Some(record) = self.active.get_mut(&progress.id) else {
            debug!(id = %progress.id, "Progress for untracked download dropped");
            return TrackerChange::None;
        };
        if record.status.is_terminal() {
            return TrackerChange::None;
        }
        record.push_output(&progress.output);
        TrackerChange::Progress { id: progress.id.clone() }
    }

    fn on_completed(&mut self, completed: &DownloadCompleted, now: Instant) -> TrackerChange {
        self.note_settled(&completed.id);
        let Some(record) = self.active.get_mut(&completed.id) else {
            debug!(id = %completed.id, "Completion for untracked download dropped");
            return TrackerChange::None;
        };
        if record.status.is_terminal() {
            return TrackerChange::None;
        }
        record.status = DownloadStatus::from_completion(&completed.status);
        record.ended_at = Some(Utc::now());
        record.final_output = Some(record.collapse_output(completed.output.as_deref()));
        info!(id = %completed.id, status = completed.status.as_str(), "Download finished");

        self.evictions.schedule(completed.id.clone(), now + self.completed_grace);
        TrackerChange::Structural(Surfaces::ACTIVE)
    }

    fn on_error(&mut self, failed: &DownloadFailed, now: Instant) -> TrackerChange {
        self.note_settled(&failed.id);
        let Some(record) = self.active.get_mut(&failed.id) else {
            debug!(id = %failed.id, "Error for untracked download dropped");
            return TrackerChange::None;
        };
        if record.status.is_terminal() {
            return TrackerChange::None;
        }
        if let Some(output) = non_blank(failed.output.as_deref()) {
            record.push_output(output);
        }
        Self::mark_error(record, failed.error.clone());
        warn!(id = %failed.id, error = %failed.error, "Download failed");

        self.evictions.schedule(failed.id.clone(), now + self.error_grace);
        TrackerChange::Structural(Surfaces::ACTIVE)
    }

    fn note_settled(&mut self, id: &str) {
        if let Some(pending) = self.pending.as_mut() {
            pending.settled.insert(id.to_string());
        }
    }

    fn mark_error(record: &mut DownloadRecord, detail: String) {
        record.status = DownloadStatus::Error;
        record.ended_at = Some(Utc::now());
        record.final_output = Some(record.collapse_output(None));
        record.error_detail = Some(detail);
    }

    /// Move every record whose grace period has elapsed into history
    pub fn fire_due(&mut self, now: Instant) -> TrackerChange {
        let due = self.evictions.drain_due(now);
        if due.is_empty() {
            return TrackerChange::None;
        }
        for id in due {
            self.evict(&id);
        }
        TrackerChange::Structural(Surfaces::BOTH)
    }

    fn evict(&mut self, id: &str) {
        let Some(mut record) = self.active.remove(id) else {
            return;
        };
        self.order.retain(|o| o != id);
        record.completed_at = Some(Utc::now());
        debug!(id = %id, status = record.status.label(), "Moved download to history");
        self.history.push_front(record);
        self.history.truncate(self.history_capacity);
    }

    /// Remember which records exist right before a status request is sent.
    /// A newer call supersedes any ticket handed out earlier.
    pub fn begin_reconcile(&mut self) -> ReconcileTicket {
        self.next_ticket += 1;
        let ticket = ReconcileTicket(self.next_ticket);
        self.pending = Some(PendingReconcile {
            ticket,
            baseline: self.order.iter().cloned().collect(),
            settled: HashSet::new(),
        });
        ticket
    }

    /// Align in-flight records with what the backend reported for `ticket`.
    ///
    /// Only records that already existed when the request went out can be
    /// declared lost, and ids that finished while it was in flight are not
    /// adopted. Answers to superseded requests are ignored.
    pub fn reconcile(
        &mut self,
        ticket: ReconcileTicket,
        server_active: &[ActiveSnapshot],
        now: Instant,
    ) -> TrackerChange {
        let pending = match self.pending.take() {
            Some(pending) if pending.ticket == ticket => pending,
            other => {
                debug!("Ignoring status for a superseded request");
                self.pending = other;
                return TrackerChange::None;
            }
        };
        let mut change = TrackerChange::None;

        let lost: Vec<String> = self
            .order
            .iter()
            .filter(|id| pending.baseline.contains(id.as_str()))
            .filter(|id| !server_active.iter().any(|s| &s.id == *id))
            .filter(|id| {
                self.active
                    .get(id.as_str())
                    .is_some_and(|r| r.status == DownloadStatus::Downloading)
            })
            .cloned()
            .collect();

        for id in lost {
            if let Some(record) = self.active.get_mut(&id) {
                warn!(id = %id, "Download missing from backend after reconnect");
                Self::mark_error(record, LOST_DOWNLOAD_DETAIL.to_string());
                self.evictions.schedule(id, now + self.error_grace);
                change = TrackerChange::Structural(Surfaces::ACTIVE);
            }
        }

        for snapshot in server_active {
            if self.active.contains_key(&snapshot.id) {
                continue;
            }
            if pending.settled.contains(&snapshot.id) {
                debug!(id = %snapshot.id, "Download finished before status arrived, not adopting");
                continue;
            }
            info!(id = %snapshot.id, "Adopting download reported by backend");
            let started_at = snapshot.started_at.unwrap_or_else(Utc::now);
            self.insert_active(DownloadRecord::new(
                snapshot.id.clone(),
                snapshot.metadata.clone(),
                started_at,
            ));
            change = TrackerChange::Structural(Surfaces::ACTIVE);
        }

        change
    }

    fn insert_active(&mut self, record: DownloadRecord) {
        self.order.push(record.id.clone());
        self.active.insert(record.id.clone(), record);
    }

    /// Active records, oldest first
    pub fn active(&self) -> impl Iterator<Item = &DownloadRecord> {
        self.order.iter().filter_map(|id| self.active.get(id))
    }

    /// History, most recent first
    pub fn history(&self) -> impl Iterator<Item = &DownloadRecord> {
        self.history.iter()
    }

    pub fn get(&self, id: &str) -> Option<&DownloadRecord> {
        self.active.get(id)
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn next_eviction(&self) -> Option<Instant> {
        self.evictions.next_deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::*;

    fn started(id: &str, title: &str) -> ServerEvent {
        ServerEvent::Started(DownloadStarted {
            id: id.into(),
            metadata: Some(DownloadMetadata {
                title: Some(title.into()),
                artist: Some("Artist".into()),
                service: Some("qobuz".into()),
                ..Default::default()
            }),
        })
    }

    fn progress(id: &str, output: &str) -> ServerEvent {
        ServerEvent::Progress(DownloadProgress { id: id.into(), output: output.into() })
    }

    fn completed(id: &str, output: Option<&str>) -> ServerEvent {
        ServerEvent::Completed(DownloadCompleted {
            id: id.into(),
            status: "completed".into(),
            output: output.map(String::from),
        })
    }

    fn errored(id: &str, error: &str) -> ServerEvent {
        ServerEvent::Error(DownloadFailed { id: id.into(), error: error.into(), output: None })
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn completed_download_moves_to_history_after_grace() {
        let t0 = Instant::now();
        let mut tracker = DownloadTracker::new();

        assert_eq!(tracker.apply(&started("dl_1", "A"), t0), TrackerChange::Structural(Surfaces::ACTIVE));
        assert_eq!(
            tracker.apply(&progress("dl_1", "line 1"), t0),
            TrackerChange::Progress { id: "dl_1".into() }
        );
        tracker.apply(&progress("dl_1", "line 2"), t0);
        tracker.apply(&completed("dl_1", None), t0 + ms(100));

        let record = tracker.get("dl_1").unwrap();
        assert_eq!(record.status, DownloadStatus::Completed);
        assert_eq!(record.final_output.as_deref(), Some("line 1\nline 2"));
        assert!(record.ended_at.is_some());

        assert_eq!(tracker.fire_due(t0 + ms(3099)), TrackerChange::None);
        assert_eq!(tracker.active_len(), 1);

        assert_eq!(tracker.fire_due(t0 + ms(3100)), TrackerChange::Structural(Surfaces::BOTH));
        assert_eq!(tracker.active_len(), 0);
        assert_eq!(tracker.history_len(), 1);
        let archived = tracker.history().next().unwrap();
        assert_eq!(archived.id, "dl_1");
        assert_eq!(archived.status, DownloadStatus::Completed);
        assert!(archived.completed_at.is_some());

        // the timer fires once
        assert_eq!(tracker.fire_due(t0 + ms(10_000)), TrackerChange::None);
        assert_eq!(tracker.history_len(), 1);
    }

    #[test]
    fn errored_download_uses_shorter_grace() {
        let t0 = Instant::now();
        let mut tracker = DownloadTracker::new();
        tracker.apply(&started("dl_1", "A"), t0);
        tracker.apply(&errored("dl_1", "rip exited with code 1"), t0);

        assert_eq!(tracker.get("dl_1").unwrap().status, DownloadStatus::Error);
        tracker.fire_due(t0 + ms(1999));
        assert_eq!(tracker.active_len(), 1);
        tracker.fire_due(t0 + ms(2000));
        assert_eq!(tracker.active_len(), 0);

        let archived = tracker.history().next().unwrap();
        assert_eq!(archived.error_detail.as_deref(), Some("rip exited with code 1"));
        assert_eq!(archived.final_output.as_deref(), Some(NO_OUTPUT_PLACEHOLDER));
    }

    #[test]
    fn supplied_output_wins_over_progress_log() {
        let t0 = Instant::now();
        let mut tracker = DownloadTracker::new();
        tracker.apply(&started("dl_1", "A"), t0);
        tracker.apply(&progress("dl_1", "partial"), t0);
        tracker.apply(&completed("dl_1", Some("full log")), t0);
        assert_eq!(tracker.get("dl_1").unwrap().final_output.as_deref(), Some("full log"));
    }

    #[test]
    fn completion_without_any_output_uses_placeholder() {
        let t0 = Instant::now();
        let mut tracker = DownloadTracker::new();
        tracker.apply(&started("dl_1", "A"), t0);
        tracker.apply(&completed("dl_1", Some("   ")), t0);
        assert_eq!(
            tracker.get("dl_1").unwrap().final_output.as_deref(),
            Some(NO_OUTPUT_PLACEHOLDER)
        );
    }

    #[test]
    fn failed_status_is_terminal() {
        let t0 = Instant::now();
        let mut tracker = DownloadTracker::new();
        tracker.apply(&started("dl_1", "A"), t0);
        tracker.apply(
            &ServerEvent::Completed(DownloadCompleted {
                id: "dl_1".into(),
                status: "failed".into(),
                output: Some("boom".into()),
            }),
            t0,
        );
        assert_eq!(tracker.get("dl_1").unwrap().status, DownloadStatus::Failed);
        tracker.fire_due(t0 + COMPLETED_GRACE);
        assert_eq!(tracker.history().next().unwrap().status, DownloadStatus::Failed);
    }

    #[test]
    fn progress_for_unknown_id_is_noop() {
        let t0 = Instant::now();
        let mut tracker = DownloadTracker::new();
        assert_eq!(tracker.apply(&progress("ghost", "x"), t0), TrackerChange::None);
        assert_eq!(tracker.active_len(), 0);
        assert_eq!(tracker.history_len(), 0);
    }

    #[test]
    fn duplicate_start_does_not_double_count() {
        let t0 = Instant::now();
        let mut tracker = DownloadTracker::new();
        tracker.apply(&started("dl_1", "A"), t0);
        tracker.apply(&progress("dl_1", "kept"), t0);
        assert_eq!(tracker.apply(&started("dl_1", "B"), t0), TrackerChange::None);

        assert_eq!(tracker.active_len(), 1);
        assert_eq!(tracker.active().count(), 1);
        let record = tracker.get("dl_1").unwrap();
        assert_eq!(record.metadata.title.as_deref(), Some("A"));
        assert_eq!(record.progress_log, vec!["kept"]);
    }

    #[test]
    fn second_terminal_event_does_not_rearm_eviction() {
        let t0 = Instant::now();
        let mut tracker = DownloadTracker::new();
        tracker.apply(&started("dl_1", "A"), t0);
        tracker.apply(&completed("dl_1", None), t0);
        assert_eq!(tracker.apply(&errored("dl_1", "late"), t0 + ms(2500)), TrackerChange::None);
        assert_eq!(tracker.get("dl_1").unwrap().status, DownloadStatus::Completed);

        tracker.fire_due(t0 + COMPLETED_GRACE);
        assert_eq!(tracker.history_len(), 1);
        assert!(tracker.next_eviction().is_none());
    }

    #[test]
    fn history_is_capped_and_most_recent_first() {
        let t0 = Instant::now();
        let mut tracker = DownloadTracker::new();
        for i in 0..51 {
            let id = format!("dl_{}", i);
            let at = t0 + ms(i as u64 * 10);
            tracker.apply(&started(&id, "x"), at);
            tracker.apply(&completed(&id, None), at);
            tracker.fire_due(at + COMPLETED_GRACE);
        }

        assert_eq!(tracker.history_len(), HISTORY_CAPACITY);
        let ids: Vec<&str> = tracker.history().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.first().copied(), Some("dl_50"));
        assert_eq!(ids.last().copied(), Some("dl_1"));
        assert!(!ids.contains(&"dl_0"));
    }

    #[test]
    fn active_keeps_start_order() {
        let t0 = Instant::now();
        let mut tracker = DownloadTracker::new();
        tracker.apply(&started("b", "B"), t0);
        tracker.apply(&started("a", "A"), t0);
        tracker.apply(&started("c", "C"), t0);
        tracker.apply(&errored("a", "x"), t0);
        tracker.fire_due(t0 + ERROR_GRACE);

        let ids: Vec<&str> = tracker.active().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn reconcile_fails_lost_downloads_and_adopts_unknown_ones() {
        let t0 = Instant::now();
        let mut tracker = DownloadTracker::new();
        tracker.apply(&started("kept", "K"), t0);
        tracker.apply(&started("lost", "L"), t0);
        tracker.apply(&started("done", "D"), t0);
        tracker.apply(&completed("done", None), t0);

        let server = vec![
            ActiveSnapshot { id: "kept".into(), metadata: DownloadMetadata::default(), started_at: None },
            ActiveSnapshot {
                id: "new".into(),
                metadata: DownloadMetadata { title: Some("N".into()), ..Default::default() },
                started_at: None,
            },
        ];
        let ticket = tracker.begin_reconcile();
        let change = tracker.reconcile(ticket, &server, t0 + ms(500));
        assert_eq!(change, TrackerChange::Structural(Surfaces::ACTIVE));

        assert_eq!(tracker.get("kept").unwrap().status, DownloadStatus::Downloading);
        let lost = tracker.get("lost").unwrap();
        assert_eq!(lost.status, DownloadStatus::Error);
        assert_eq!(lost.error_detail.as_deref(), Some(LOST_DOWNLOAD_DETAIL));
        assert_eq!(tracker.get("done").unwrap().status, DownloadStatus::Completed);
        assert_eq!(tracker.get("new").unwrap().metadata.title.as_deref(), Some("N"));

        tracker.fire_due(t0 + ms(3000));
        let ids: Vec<&str> = tracker.active().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["kept", "new"]);
    }

    #[test]
    fn reconcile_with_matching_state_changes_nothing() {
        let t0 = Instant::now();
        let mut tracker = DownloadTracker::new();
        tracker.apply(&started("a", "A"), t0);
        let server = vec![ActiveSnapshot {
            id: "a".into(),
            metadata: DownloadMetadata::default(),
            started_at: None,
        }];
        let ticket = tracker.begin_reconcile();
        assert_eq!(tracker.reconcile(ticket, &server, t0), TrackerChange::None);
    }

    fn snapshot(id: &str) -> ActiveSnapshot {
        ActiveSnapshot { id: id.into(), metadata: DownloadMetadata::default(), started_at: None }
    }

    #[test]
    fn download_started_during_status_request_is_not_lost() {
        let t0 = Instant::now();
        let mut tracker = DownloadTracker::new();
        let ticket = tracker.begin_reconcile();
        tracker.apply(&started("live", "L"), t0);

        assert_eq!(tracker.reconcile(ticket, &[], t0 + ms(100)), TrackerChange::None);
        assert_eq!(tracker.get("live").unwrap().status, DownloadStatus::Downloading);
        assert!(tracker.next_eviction().is_none());

        assert_eq!(
            tracker.apply(&progress("live", "50%"), t0 + ms(200)),
            TrackerChange::Progress { id: "live".into() }
        );
        tracker.apply(&completed("live", None), t0 + ms(300));
        tracker.fire_due(t0 + ms(300) + COMPLETED_GRACE);
        let archived = tracker.history().next().unwrap();
        assert_eq!(archived.status, DownloadStatus::Completed);
        assert_eq!(archived.error_detail, None);
    }

    #[test]
    fn download_finished_during_status_request_is_not_adopted() {
        let t0 = Instant::now();
        let mut tracker = DownloadTracker::new();
        let ticket = tracker.begin_reconcile();
        assert_eq!(tracker.apply(&completed("x", None), t0), TrackerChange::None);

        assert_eq!(tracker.reconcile(ticket, &[snapshot("x")], t0 + ms(100)), TrackerChange::None);
        assert!(tracker.get("x").is_none());
        assert_eq!(tracker.active_len(), 0);
    }

    #[test]
    fn download_evicted_during_status_request_is_not_readopted() {
        let t0 = Instant::now();
        let mut tracker = DownloadTracker::new();
        tracker.apply(&started("a", "A"), t0);
        let ticket = tracker.begin_reconcile();
        tracker.apply(&errored("a", "boom"), t0);
        tracker.fire_due(t0 + ERROR_GRACE);
        assert_eq!(tracker.active_len(), 0);

        tracker.reconcile(ticket, &[snapshot("a")], t0 + ERROR_GRACE + ms(1));
        assert_eq!(tracker.active_len(), 0);
        assert_eq!(tracker.history_len(), 1);
    }

    #[test]
    fn superseded_status_response_is_ignored() {
        let t0 = Instant::now();
        let mut tracker = DownloadTracker::new();
        tracker.apply(&started("a", "A"), t0);
        let first = tracker.begin_reconcile();
        let second = tracker.begin_reconcile();

        assert_eq!(tracker.reconcile(first, &[], t0), TrackerChange::None);
        assert_eq!(tracker.get("a").unwrap().status, DownloadStatus::Downloading);

        assert_eq!(tracker.reconcile(second, &[], t0), TrackerChange::Structural(Surfaces::ACTIVE));
        assert_eq!(tracker.get("a").unwrap().status, DownloadStatus::Error);
        // a ticket is consumed once
        assert_eq!(tracker.reconcile(second, &[snapshot("b")], t0), TrackerChange::None);
    }

    #[test]
    fn merge_prefers_structural_changes() {
        let progress = TrackerChange::Progress { id: "a".into() };
        assert_eq!(
            progress.clone().merge(TrackerChange::Structural(Surfaces::ACTIVE)),
            TrackerChange::Structural(Surfaces::ACTIVE)
        );
        assert_eq!(TrackerChange::None.merge(progress.clone()), progress);
        assert_eq!(
            TrackerChange::Structural(Surfaces::ACTIVE)
                .merge(TrackerChange::Structural(Surfaces { active: false, history: true })),
            TrackerChange::Structural(Surfaces::BOTH)
        );
    }
}
