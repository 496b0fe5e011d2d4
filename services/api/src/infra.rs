use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use rental_intake::workflows::intake::{
    ApplicationBackend, AttachmentStore, BackendError, BackendReceipt, DocumentUpload,
    IntakeSession, Locale, RepositoryError, SessionId, SessionRepository, SubmissionPayload,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) default_locale: Locale,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, store: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{store} lock poisoned")))
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySessionRepository {
    sessions: Arc<Mutex<HashMap<SessionId, IntakeSession>>>,
}

impl SessionRepository for InMemorySessionRepository {
    fn insert(&self, session: IntakeSession) -> Result<IntakeSession, RepositoryError> {
        let mut guard = lock(&self.sessions, "session store")?;
        if guard.contains_key(&session.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn update(&self, session: IntakeSession) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.sessions, "session store")?;
        if guard.contains_key(&session.id) {
            guard.insert(session.id.clone(), session);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<IntakeSession>, RepositoryError> {
        let guard = lock(&self.sessions, "session store")?;
        Ok(guard.get(id).cloned())
    }
}

/// Uploaded bytes kept in process memory, keyed by `memory://` URIs.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAttachmentStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryAttachmentStore {
    pub(crate) fn stored_bytes(&self) -> Result<usize, RepositoryError> {
        let guard = lock(&self.blobs, "attachment store")?;
        Ok(guard.values().map(Vec::len).sum())
    }
}

impl AttachmentStore for InMemoryAttachmentStore {
    fn store(&self, session: &SessionId, upload: &DocumentUpload) -> Result<String, RepositoryError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let key = format!("memory://{session}/{id:04}/{}", upload.file_name);
        let mut guard = lock(&self.blobs, "attachment store")?;
        guard.insert(key.clone(), upload.bytes.clone());
        Ok(key)
    }

    fn remove(&self, storage_key: &str) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.blobs, "attachment store")?;
        guard
            .remove(storage_key)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

/// Accepts every payload and logs where the notification would go.
#[derive(Default, Clone)]
pub(crate) struct LoggingBackend {
    accepted: Arc<Mutex<Vec<SubmissionPayload>>>,
}

impl LoggingBackend {
    pub(crate) fn accepted(&self) -> Vec<SubmissionPayload> {
        self.accepted
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl ApplicationBackend for LoggingBackend {
    fn accept(&self, payload: &SubmissionPayload) -> Result<BackendReceipt, BackendError> {
        let mut guard = self
            .accepted
            .lock()
            .map_err(|_| BackendError::Unavailable("submission log lock poisoned".to_string()))?;
        guard.push(payload.clone());
        let reference = format!("SOL-{:06}", guard.len());

        info!(
            %reference,
            recipients = ?payload.notify,
            tenants = payload.tenants.len(),
            "application stored; notification queued"
        );
        Ok(BackendReceipt { reference })
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_locale(raw: &str) -> Result<Locale, String> {
    Locale::parse(raw).ok_or_else(|| format!("unsupported locale '{raw}' (expected es or en)"))
}
