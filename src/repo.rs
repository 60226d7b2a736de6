use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")] NotFound,
    #[error("store lock poisoned")] Poisoned,
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Report Store: ordered newest-first, ids unique at all times.
#[async_trait]
pub trait ReportRepo: Send + Sync {
    async fn list_reports(&self) -> RepoResult<Vec<InstitutionReport>>;
    async fn get_report(&self, id: Id) -> RepoResult<InstitutionReport>;
    /// Assigns a fresh id and prepends. The draft is expected to be validated.
    async fn add_report(&self, draft: ReportDraft) -> RepoResult<InstitutionReport>;
    /// Full replace of the record with the same id, keeping its position.
    async fn update_report(&self, report: InstitutionReport) -> RepoResult<InstitutionReport>;
    /// Returns whether a record was removed; unknown ids are a no-op.
    async fn remove_report(&self, id: Id) -> RepoResult<bool>;
}

/// File Registry: ordered oldest-first, independent of reports.
#[async_trait]
pub trait FileRepo: Send + Sync {
    async fn list_files(&self) -> RepoResult<Vec<AppFile>>;
    async fn get_file(&self, id: &str) -> RepoResult<AppFile>;
    /// Appends the batch in order and returns the registered entries.
    async fn add_files(&self, batch: Vec<NewFile>) -> RepoResult<Vec<AppFile>>;
    async fn remove_file(&self, id: &str) -> RepoResult<Option<AppFile>>;
}

pub trait Repo: ReportRepo + FileRepo {}

impl<T> Repo for T where T: ReportRepo + FileRepo {}

pub mod inmem {
    use super::*;
    use chrono::Utc;
    use tracing::info;

    #[derive(Default)]
    struct State {
        reports: Vec<InstitutionReport>,
        files: Vec<AppFile>,
        last_id: Id,
    }

    /// Session-lifetime store. Clones share the same state.
    #[derive(Clone, Default)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
    }

    impl InMemRepo {
        pub fn new() -> Self {
            Self::default()
        }

        /// Store preloaded with `reports` in the given order.
        pub fn with_reports(reports: Vec<InstitutionReport>) -> Self {
            let last_id = reports.iter().map(|r| r.id).max().unwrap_or(0);
            Self {
                state: Arc::new(RwLock::new(State { reports, files: Vec::new(), last_id })),
            }
        }

        /// Creation timestamp in millis, bumped past the last issued id so
        /// two reports created within the same millisecond never collide.
        fn next_id(state: &mut State) -> Id {
            let id = Utc::now().timestamp_millis().max(state.last_id + 1);
            state.last_id = id;
            id
        }

        /// `"{name}-{lastModified}"`, suffixed with `-2`, `-3`, … while taken.
        fn file_id(state: &State, name: &str, last_modified: i64) -> String {
            let base = format!("{name}-{last_modified}");
            let taken = |id: &str| state.files.iter().any(|f| f.id == id);
            if !taken(&base) {
                return base;
            }
            let mut n = 2u32;
            loop {
                let candidate = format!("{base}-{n}");
                if !taken(&candidate) {
                    return candidate;
                }
                n += 1;
            }
        }
    }

    #[async_trait]
    impl ReportRepo for InMemRepo {
        async fn list_reports(&self) -> RepoResult<Vec<InstitutionReport>> {
            let s = self.state.read().map_err(|_| RepoError::Poisoned)?;
            Ok(s.reports.clone())
        }

        async fn get_report(&self, id: Id) -> RepoResult<InstitutionReport> {
            let s = self.state.read().map_err(|_| RepoError::Poisoned)?;
            s.reports.iter().find(|r| r.id == id).cloned().ok_or(RepoError::NotFound)
        }

        async fn add_report(&self, draft: ReportDraft) -> RepoResult<InstitutionReport> {
            let mut s = self.state.write().map_err(|_| RepoError::Poisoned)?;
            let id = Self::next_id(&mut s);
            let report = draft.into_report(id);
            s.reports.insert(0, report.clone());
            info!(id, name = %report.institution_name, total = s.reports.len(), "report added");
            Ok(report)
        }

        async fn update_report(&self, report: InstitutionReport) -> RepoResult<InstitutionReport> {
            let mut s = self.state.write().map_err(|_| RepoError::Poisoned)?;
            let slot = s.reports.iter_mut().find(|r| r.id == report.id).ok_or(RepoError::NotFound)?;
            *slot = report.clone();
            info!(id = report.id, "report updated");
            Ok(report)
        }

        async fn remove_report(&self, id: Id) -> RepoResult<bool> {
            let mut s = self.state.write().map_err(|_| RepoError::Poisoned)?;
            let before = s.reports.len();
            s.reports.retain(|r| r.id != id);
            let removed = s.reports.len() != before;
            if removed {
                info!(id, total = s.reports.len(), "report removed");
            }
            Ok(removed)
        }
    }

    #[async_trait]
    impl FileRepo for InMemRepo {
        async fn list_files(&self) -> RepoResult<Vec<AppFile>> {
            let s = self.state.read().map_err(|_| RepoError::Poisoned)?;
            Ok(s.files.clone())
        }

        async fn get_file(&self, id: &str) -> RepoResult<AppFile> {
            let s = self.state.read().map_err(|_| RepoError::Poisoned)?;
            s.files.iter().find(|f| f.id == id).cloned().ok_or(RepoError::NotFound)
        }

        async fn add_files(&self, batch: Vec<NewFile>) -> RepoResult<Vec<AppFile>> {
            let mut s = self.state.write().map_err(|_| RepoError::Poisoned)?;
            let mut added = Vec::with_capacity(batch.len());
            for new in batch {
                let id = Self::file_id(&s, &new.name, new.last_modified);
                let file = AppFile {
                    url: AppFile::content_url(&id),
                    id,
                    name: new.name,
                    mime_type: new.mime_type,
                    size: new.size,
                    checksum: new.checksum,
                };
                s.files.push(file.clone());
                added.push(file);
            }
            info!(added = added.len(), total = s.files.len(), "files registered");
            Ok(added)
        }

        async fn remove_file(&self, id: &str) -> RepoResult<Option<AppFile>> {
            let mut s = self.state.write().map_err(|_| RepoError::Poisoned)?;
            let removed = s.files.iter().position(|f| f.id == id).map(|pos| s.files.remove(pos));
            if removed.is_some() {
                info!(id, "file unregistered");
            }
            Ok(removed)
        }
    }
}
