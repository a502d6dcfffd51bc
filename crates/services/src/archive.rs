use std::sync::Arc;

use exam_core::Clock;
use exam_core::model::{ARCHIVE_CAPACITY, ArchivedTest, ExamSession, RecordId};
use storage::repository::{ArchiveRepository, LiveTestRepository, StorageError};
use tracing::{info, warn};

/// Number of archived tests shown as cards on the dashboard.
pub const DASHBOARD_RECENT: usize = 6;

/// Aggregate counters over the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArchiveStats {
    /// Number of archived tests.
    pub total: usize,
    /// Tests whose timer ran at all (`elapsed_seconds > 0`).
    pub completed: usize,
    /// Tests that ended with every question answered.
    pub fully_answered: usize,
}

impl ArchiveStats {
    #[must_use]
    pub fn from_records(records: &[ArchivedTest]) -> Self {
        Self {
            total: records.len(),
            completed: records.iter().filter(|r| r.is_completed()).count(),
            fully_answered: records.iter().filter(|r| r.all_answered()).count(),
        }
    }
}

/// The first `limit` archived tests, newest first.
///
/// `iter` can be called any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentTests {
    records: Vec<ArchivedTest>,
    limit: usize,
}

impl RecentTests {
    pub fn iter(&self) -> impl Iterator<Item = &ArchivedTest> {
        self.records.iter().take(self.limit)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len().min(self.limit)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn first(&self) -> Option<&ArchivedTest> {
        self.iter().next()
    }
}

/// Appends finished tests to the bounded archive.
#[derive(Clone)]
pub struct ArchiveService {
    clock: Clock,
    archive: Arc<dyn ArchiveRepository>,
    live: Arc<dyn LiveTestRepository>,
}

impl ArchiveService {
    #[must_use]
    pub fn new(
        clock: Clock,
        archive: Arc<dyn ArchiveRepository>,
        live: Arc<dyn LiveTestRepository>,
    ) -> Self {
        Self {
            clock,
            archive,
            live,
        }
    }

    /// Archive a finished test and drop the live snapshot.
    ///
    /// The record is prepended and the list is cut to `ARCHIVE_CAPACITY`.
    /// Once the archive is written the test counts as ended; a snapshot that
    /// cannot be removed is only logged.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the archive cannot be read or written.
    pub async fn complete_session(
        &self,
        session: &ExamSession,
        elapsed_seconds: u64,
    ) -> Result<ArchivedTest, StorageError> {
        let mut records = self.archive.load_archive().await?;
        let completed_at = self.clock.now();
        let newest = records.iter().map(ArchivedTest::id).max();
        let record = ArchivedTest::complete(
            RecordId::next(completed_at, newest),
            session,
            elapsed_seconds,
            completed_at,
        );

        records.insert(0, record.clone());
        records.truncate(ARCHIVE_CAPACITY);
        self.archive.save_archive(&records).await?;
        if let Err(err) = self.live.clear_live().await {
            warn!(error = %err, "archived test but could not clear its snapshot");
        }

        info!(
            id = %record.id(),
            name = record.name(),
            elapsed = elapsed_seconds,
            archived = records.len(),
            "test archived"
        );
        Ok(record)
    }

    /// Newest-first view over at most `limit` records.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    pub async fn list_recent(&self, limit: usize) -> Result<RecentTests, StorageError> {
        let records = self.archive.load_archive().await?;
        Ok(RecentTests { records, limit })
    }

    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    pub async fn aggregate_stats(&self) -> Result<ArchiveStats, StorageError> {
        let records = self.archive.load_archive().await?;
        Ok(ArchiveStats::from_records(&records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use exam_core::model::{LiveSnapshot, SectionCounts};
    use exam_core::time::{fixed_clock, fixed_now};
    use storage::Storage;

    fn session(name: &str) -> ExamSession {
        ExamSession::new(name, SectionCounts::new(1, 1)).unwrap()
    }

    fn service_with(storage: &Storage, clock: Clock) -> ArchiveService {
        ArchiveService::new(
            clock,
            Arc::clone(&storage.archive),
            Arc::clone(&storage.live),
        )
    }

    #[tokio::test]
    async fn complete_session_prepends_and_clears_live() {
        let storage = Storage::in_memory();
        let svc = service_with(&storage, fixed_clock());
        storage
            .live
            .save_live(&LiveSnapshot::capture(&session("A"), 10, fixed_now()))
            .await
            .unwrap();

        svc.complete_session(&session("A"), 10).await.unwrap();
        let second = svc.complete_session(&session("B"), 25).await.unwrap();

        let recent = svc.list_recent(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent.first(), Some(&second));
        assert_eq!(recent.first().unwrap().elapsed_seconds(), 25);
        assert!(storage.live.load_live().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ids_are_unique_within_the_same_millisecond() {
        let storage = Storage::in_memory();
        let svc = service_with(&storage, fixed_clock());

        let a = svc.complete_session(&session("A"), 1).await.unwrap();
        let b = svc.complete_session(&session("B"), 1).await.unwrap();

        assert_ne!(a.id(), b.id());
        assert!(b.id() > a.id());
    }

    #[tokio::test]
    async fn twenty_first_record_evicts_the_oldest() {
        let storage = Storage::in_memory();
        let mut clock = fixed_clock();
        for n in 0..=ARCHIVE_CAPACITY {
            let svc = service_with(&storage, clock);
            svc.complete_session(&session(&format!("Test {n}")), 60)
                .await
                .unwrap();
            clock.advance(Duration::seconds(1));
        }

        let svc = service_with(&storage, clock);
        let all = svc.list_recent(usize::MAX).await.unwrap();
        let names: Vec<&str> = all.iter().map(ArchivedTest::name).collect();

        assert_eq!(all.len(), ARCHIVE_CAPACITY);
        assert_eq!(names.first(), Some(&"Test 20"));
        assert_eq!(names.last(), Some(&"Test 1"));
        assert!(!names.contains(&"Test 0"));
    }

    #[tokio::test]
    async fn recent_view_is_restartable() {
        let storage = Storage::in_memory();
        let svc = service_with(&storage, fixed_clock());
        for name in ["A", "B", "C"] {
            svc.complete_session(&session(name), 5).await.unwrap();
        }

        let recent = svc.list_recent(2).await.unwrap();
        let first_pass: Vec<_> = recent.iter().map(ArchivedTest::name).collect();
        let second_pass: Vec<_> = recent.iter().map(ArchivedTest::name).collect();

        assert_eq!(first_pass, vec!["C", "B"]);
        assert_eq!(first_pass, second_pass);
    }

    #[tokio::test]
    async fn stats_count_duration_and_full_completion_separately() {
        let storage = Storage::in_memory();
        let svc = service_with(&storage, fixed_clock());

        svc.complete_session(&session("untimed"), 0).await.unwrap();
        svc.complete_session(&session("timed"), 30).await.unwrap();
        let empty = ExamSession::new("nothing to answer", SectionCounts::new(0, 0)).unwrap();
        svc.complete_session(&empty, 4).await.unwrap();

        let stats = svc.aggregate_stats().await.unwrap();
        assert_eq!(
            stats,
            ArchiveStats {
                total: 3,
                completed: 2,
                fully_answered: 0,
            }
        );
    }
}
