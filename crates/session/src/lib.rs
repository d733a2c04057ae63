use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Notify, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Session {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: SessionStatus,
        to: SessionStatus,
    },
    #[error("Session queue is full ({0} waiting)")]
    QueueFull(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub max_running: usize,
    pub max_queued: usize,
    /// How long finished sessions stay queryable.
    pub retention: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_running: 3,
            max_queued: 32,
            retention: Duration::from_secs(60 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed { pages_visited: usize, stories: usize },
    Failed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord<R> {
    pub id: String,
    pub status: SessionStatus,
    pub request: R,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub pages_visited: Option<usize>,
    pub stories: Option<usize>,
    pub error: Option<String>,
}

impl<R> SessionRecord<R> {
    fn new(request: R) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            status: SessionStatus::Pending,
            request,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            pages_visited: None,
            stories: None,
            error: None,
        }
    }

    fn start(&mut self) {
        self.status = SessionStatus::Running;
        self.started_at = Some(Utc::now());
    }

    fn finish(&mut self, outcome: SessionOutcome) {
        self.finished_at = Some(Utc::now());
        match outcome {
            SessionOutcome::Completed {
                pages_visited,
                stories,
            } => {
                self.status = SessionStatus::Completed;
                self.pages_visited = Some(pages_visited);
                self.stories = Some(stories);
            }
            SessionOutcome::Failed(error) => {
                self.status = SessionStatus::Failed;
                self.error = Some(error);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Capacity was free; the caller should start the session now.
    Started(String),
    /// Waiting behind `position` sessions, 1-based.
    Queued { id: String, position: usize },
}

impl Admission {
    pub fn id(&self) -> &str {
        match self {
            Admission::Started(id) => id,
            Admission::Queued { id, .. } => id,
        }
    }
}

struct State<R> {
    sessions: HashMap<String, SessionRecord<R>>,
    queue: VecDeque<String>,
}

impl<R> State<R> {
    fn running_count(&self) -> usize {
        self.sessions
            .values()
            .filter(|s| s.status == SessionStatus::Running)
            .count()
    }

    fn purge(&mut self, now: DateTime<Utc>, retention: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, record| {
            let expired = record.status.is_terminal()
                && record
                    .finished_at
                    .and_then(|finished| (now - finished).to_std().ok())
                    .map(|age| age > retention)
                    .unwrap_or(false);
            !expired
        });

        let purged = before - self.sessions.len();
        if purged > 0 {
            debug!("Purged {} expired sessions", purged);
        }
        purged
    }
}

/// Bounded set of crawl sessions: at most `max_running` run at once, the
/// rest wait in FIFO order. Every completion drains at most one waiter.
pub struct SessionManager<R> {
    limits: SessionLimits,
    state: Arc<RwLock<State<R>>>,
    idle: Arc<Notify>,
}

impl<R> Clone for SessionManager<R> {
    fn clone(&self) -> Self {
        Self {
            limits: self.limits,
            state: Arc::clone(&self.state),
            idle: Arc::clone(&self.idle),
        }
    }
}

impl<R: Clone> SessionManager<R> {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            limits,
            state: Arc::new(RwLock::new(State {
                sessions: HashMap::new(),
                queue: VecDeque::new(),
            })),
            idle: Arc::new(Notify::new()),
        }
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    pub async fn create(&self, request: R) -> Result<Admission, SessionError> {
        let mut state = self.state.write().await;
        state.purge(Utc::now(), self.limits.retention);
        let mut record = SessionRecord::new(request);
        let id = record.id.clone();

        if state.queue.is_empty() && state.running_count() < self.limits.max_running {
            record.start();
            state.sessions.insert(id.clone(), record);
            info!("Session {} started", id);
            return Ok(Admission::Started(id));
        }

        if state.queue.len() >= self.limits.max_queued {
            warn!("Rejecting session: {} already queued", state.queue.len());
            return Err(SessionError::QueueFull(state.queue.len()));
        }

        state.sessions.insert(id.clone(), record);
        state.queue.push_back(id.clone());
        let position = state.queue.len();
        info!("Session {} queued at position {}", id, position);
        Ok(Admission::Queued { id, position })
    }

    /// Records the outcome of a running session and promotes the oldest
    /// pending one if a slot is free. The promoted session is returned with
    /// its request so the caller can start it.
    pub async fn complete(
        &self,
        id: &str,
        outcome: SessionOutcome,
    ) -> Result<Option<(String, R)>, SessionError> {
        let mut state = self.state.write().await;

        let record = state
            .sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        if record.status != SessionStatus::Running {
            let to = match outcome {
                SessionOutcome::Completed { .. } => SessionStatus::Completed,
                SessionOutcome::Failed(_) => SessionStatus::Failed,
            };
            return Err(SessionError::InvalidTransition {
                id: id.to_string(),
                from: record.status,
                to,
            });
        }
        record.finish(outcome);
        info!("Session {} {}", id, record.status);

        let mut promoted = None;
        if state.running_count() < self.limits.max_running {
            if let Some(next) = state.queue.pop_front() {
                if let Some(waiting) = state.sessions.get_mut(&next) {
                    waiting.start();
                    info!("Session {} promoted from queue", next);
                    promoted = Some((next, waiting.request.clone()));
                }
            }
        }

        if state.queue.is_empty() && state.running_count() == 0 {
            debug!("No active sessions left");
            self.idle.notify_waiters();
        }
        Ok(promoted)
    }

    pub async fn get(&self, id: &str) -> Option<SessionRecord<R>> {
        self.state.read().await.sessions.get(id).cloned()
    }

    /// All known sessions, oldest first.
    pub async fn list(&self) -> Vec<SessionRecord<R>> {
        let state = self.state.read().await;
        let mut records: Vec<_> = state.sessions.values().cloned().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        records
    }

    pub async fn running_count(&self) -> usize {
        self.state.read().await.running_count()
    }

    /// Running plus pending sessions.
    pub async fn active_count(&self) -> usize {
        let state = self.state.read().await;
        state.running_count() + state.queue.len()
    }

    /// Drops finished sessions older than the retention window.
    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        self.state.write().await.purge(now, self.limits.retention)
    }

    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now()).await
    }

    /// Resolves once no session is running or pending.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.active_count().await == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(max_running: usize, max_queued: usize) -> SessionManager<String> {
        SessionManager::new(SessionLimits {
            max_running,
            max_queued,
            ..SessionLimits::default()
        })
    }

    fn done() -> SessionOutcome {
        SessionOutcome::Completed {
            pages_visited: 4,
            stories: 2,
        }
    }

    #[tokio::test]
    async fn test_admission_respects_running_limit() {
        let sessions = manager(3, 32);
        let mut admissions = Vec::new();
        for i in 0..5 {
            admissions.push(sessions.create(format!("job-{}", i)).await.unwrap());
        }

        assert!(matches!(admissions[0], Admission::Started(_)));
        assert!(matches!(admissions[2], Admission::Started(_)));
        assert!(matches!(admissions[3], Admission::Queued { position: 1, .. }));
        assert!(matches!(admissions[4], Admission::Queued { position: 2, .. }));
        assert_eq!(sessions.running_count().await, 3);
        assert_eq!(sessions.active_count().await, 5);

        let queued = sessions.get(admissions[3].id()).await.unwrap();
        assert_eq!(queued.status, SessionStatus::Pending);
        assert!(queued.started_at.is_none());
    }

    #[tokio::test]
    async fn test_queue_overflow_is_rejected() {
        let sessions = manager(1, 1);
        sessions.create("a".into()).await.unwrap();
        sessions.create("b".into()).await.unwrap();
        let err = sessions.create("c".into()).await.unwrap_err();
        assert!(matches!(err, SessionError::QueueFull(1)));
        assert_eq!(sessions.list().await.len(), 2);
    }

    #[tokio::test]
    async fn test_completion_promotes_oldest_pending() {
        let sessions = manager(1, 8);
        let first = sessions.create("first".into()).await.unwrap();
        let second = sessions.create("second".into()).await.unwrap();
        let third = sessions.create("third".into()).await.unwrap();

        let promoted = sessions.complete(first.id(), done()).await.unwrap();
        assert_eq!(promoted, Some((second.id().to_string(), "second".to_string())));
        assert_eq!(
            sessions.get(third.id()).await.unwrap().status,
            SessionStatus::Pending
        );

        let finished = sessions.get(first.id()).await.unwrap();
        assert_eq!(finished.status, SessionStatus::Completed);
        assert_eq!(finished.pages_visited, Some(4));
        assert_eq!(finished.stories, Some(2));
        assert!(finished.finished_at.is_some());

        let promoted = sessions
            .complete(second.id(), SessionOutcome::Failed("boom".into()))
            .await
            .unwrap();
        assert_eq!(promoted.map(|(id, _)| id), Some(third.id().to_string()));
        let failed = sessions.get(second.id()).await.unwrap();
        assert_eq!(failed.status, SessionStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("boom"));

        assert_eq!(sessions.complete(third.id(), done()).await.unwrap(), None);
        assert_eq!(sessions.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_transitions() {
        let sessions = manager(1, 8);
        let running = sessions.create("a".into()).await.unwrap();
        let pending = sessions.create("b".into()).await.unwrap();

        let err = sessions.complete(pending.id(), done()).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                from: SessionStatus::Pending,
                ..
            }
        ));

        sessions.complete(running.id(), done()).await.unwrap();
        let err = sessions.complete(running.id(), done()).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                from: SessionStatus::Completed,
                to: SessionStatus::Completed,
                ..
            }
        ));

        let err = sessions.complete("missing", done()).await.unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_purge_only_drops_old_terminal_sessions() {
        let sessions = manager(2, 8);
        let old = sessions.create("old".into()).await.unwrap();
        let live = sessions.create("live".into()).await.unwrap();
        sessions.complete(old.id(), done()).await.unwrap();

        let now = Utc::now();
        assert_eq!(sessions.purge_expired_at(now).await, 0);

        let later = now + chrono::Duration::hours(2);
        assert_eq!(sessions.purge_expired_at(later).await, 1);
        assert!(sessions.get(old.id()).await.is_none());
        assert!(sessions.get(live.id()).await.is_some());
    }

    #[tokio::test]
    async fn test_create_evicts_expired_sessions() {
        let sessions = manager(2, 8);
        let old = sessions.create("old".into()).await.unwrap();
        let recent = sessions.create("recent".into()).await.unwrap();
        sessions.complete(old.id(), done()).await.unwrap();
        sessions.complete(recent.id(), done()).await.unwrap();

        {
            let mut state = sessions.state.write().await;
            let record = state.sessions.get_mut(old.id()).unwrap();
            record.finished_at = Some(Utc::now() - chrono::Duration::hours(2));
        }

        let next = sessions.create("next".into()).await.unwrap();
        assert!(sessions.get(old.id()).await.is_none());
        assert!(sessions.get(recent.id()).await.is_some());
        assert!(sessions.get(next.id()).await.is_some());
        assert_eq!(sessions.list().await.len(), 2);
    }

    #[tokio::test]
    async fn test_wait_idle_returns_after_last_completion() {
        let sessions = manager(2, 8);
        assert_eq!(sessions.active_count().await, 0);
        sessions.wait_idle().await;

        let a = sessions.create("a".into()).await.unwrap();
        let b = sessions.create("b".into()).await.unwrap();

        let worker = sessions.clone();
        let handle = tokio::spawn(async move {
            for id in [a.id(), b.id()] {
                tokio::time::sleep(Duration::from_millis(10)).await;
                worker.complete(id, done()).await.unwrap();
            }
        });

        tokio::time::timeout(Duration::from_secs(5), sessions.wait_idle())
            .await
            .unwrap();
        handle.await.unwrap();
        assert_eq!(sessions.active_count().await, 0);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&SessionStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");
    }
}
