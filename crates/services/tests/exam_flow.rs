use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use exam_core::model::{Answer, Choice, LiveSnapshot, Section, SectionCounts, SlotKey, Subject};
use exam_core::time::fixed_clock;
use exam_core::TimerState;
use services::{
    AppServices, ConfirmPrompt, ExamController, ResumeOutcome, ScheduledEvent, ServiceError,
};
use storage::Storage;
use storage::repository::{LiveTestRepository, StorageError};

struct Always(bool);

#[async_trait]
impl ConfirmPrompt for Always {
    async fn confirm(&mut self, _message: &str) -> bool {
        self.0
    }
}

/// Live-test store whose first `clear_live` fails.
struct FailFirstClear {
    inner: Arc<dyn LiveTestRepository>,
    failed: AtomicBool,
}

#[async_trait]
impl LiveTestRepository for FailFirstClear {
    async fn load_live(&self) -> Result<Option<LiveSnapshot>, StorageError> {
        self.inner.load_live().await
    }

    async fn save_live(&self, snapshot: &LiveSnapshot) -> Result<(), StorageError> {
        self.inner.save_live(snapshot).await
    }

    async fn clear_live(&self) -> Result<(), StorageError> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            return Err(StorageError::Connection("disk full".into()));
        }
        self.inner.clear_live().await
    }
}

fn physics1() -> SlotKey {
    SlotKey::new(Subject::Physics, Section::Section1)
}

fn maths2() -> SlotKey {
    SlotKey::new(Subject::Mathematics, Section::Section2)
}

fn controller_over(storage: &Storage) -> ExamController {
    AppServices::from_storage(storage, fixed_clock()).controller()
}

#[tokio::test]
async fn answering_updates_progress_and_autosaves() {
    let storage = Storage::in_memory();
    let mut ctl = controller_over(&storage);

    ctl.start_test("Mock A", SectionCounts::new(2, 1)).await.unwrap();
    assert_eq!(ctl.progress().percent(), 0.0);
    assert!(storage.live.load_live().await.unwrap().is_some());

    let progress = ctl.answer(physics1(), 0, "B").await.unwrap();
    assert_eq!(progress.rounded_percent(), 11);

    let saved = storage.live.load_live().await.unwrap().unwrap();
    assert_eq!(
        saved.session().answer(physics1(), 0),
        Some(&Answer::Choice(Choice::B))
    );
}

#[tokio::test]
async fn ignored_writes_do_not_autosave() {
    let storage = Storage::in_memory();
    let mut ctl = controller_over(&storage);

    assert_eq!(ctl.answer(physics1(), 0, "A").await, None);
    assert!(storage.live.load_live().await.unwrap().is_none());

    ctl.start_test("T", SectionCounts::new(1, 1)).await.unwrap();
    assert_eq!(ctl.answer(physics1(), 5, "A").await, None);
}

#[tokio::test]
async fn end_test_archives_and_clears_everything() {
    let storage = Storage::in_memory();
    let mut ctl = controller_over(&storage);

    ctl.start_test("Mock A", SectionCounts::new(1, 1)).await.unwrap();
    ctl.answer(maths2(), 0, "42").await.unwrap();
    for _ in 0..7 {
        ctl.on_timer_tick();
    }

    let record = ctl.end_test().await.unwrap();

    assert_eq!(record.elapsed_seconds(), 7);
    assert_eq!(record.name(), "Mock A");
    assert!(!ctl.is_active());
    assert!(!ctl.is_scheduled());
    assert_eq!(ctl.timer_state(), TimerState::Stopped);
    assert_eq!(ctl.elapsed_display(), "00:00:00");
    assert!(storage.live.load_live().await.unwrap().is_none());

    let recent = ctl.recent(1).await.unwrap();
    assert_eq!(recent.first(), Some(&record));

    let stats = ctl.stats().await.unwrap();
    assert_eq!((stats.total, stats.completed), (1, 1));
}

#[tokio::test]
async fn failed_snapshot_clear_still_ends_the_test_once() {
    let base = Storage::in_memory();
    let storage = Storage {
        live: Arc::new(FailFirstClear {
            inner: Arc::clone(&base.live),
            failed: AtomicBool::new(false),
        }),
        ..base.clone()
    };
    let mut ctl = controller_over(&storage);

    ctl.start_test("Mock A", SectionCounts::new(1, 1)).await.unwrap();
    ctl.on_timer_tick();
    ctl.end_test().await.unwrap();

    assert!(!ctl.is_active());
    assert!(!ctl.is_scheduled());
    assert!(matches!(ctl.end_test().await, Err(ServiceError::NoActiveTest)));
    assert_eq!(ctl.stats().await.unwrap().total, 1);
}

#[tokio::test]
async fn lifecycle_guards() {
    let storage = Storage::in_memory();
    let mut ctl = controller_over(&storage);

    assert!(matches!(
        ctl.end_test().await,
        Err(ServiceError::NoActiveTest)
    ));
    assert!(matches!(
        ctl.start_test("   ", SectionCounts::default()).await,
        Err(ServiceError::Session(_))
    ));

    ctl.start_test("One", SectionCounts::default()).await.unwrap();
    assert!(matches!(
        ctl.start_test("Two", SectionCounts::default()).await,
        Err(ServiceError::AlreadyActive)
    ));
    assert!(matches!(
        ctl.quick_resume(&mut Always(true)).await,
        Err(ServiceError::AlreadyActive)
    ));
}

#[tokio::test]
async fn launch_resume_restores_answers_and_elapsed() {
    let storage = Storage::in_memory();

    let mut first = controller_over(&storage);
    first.start_test("Mock A", SectionCounts::new(2, 1)).await.unwrap();
    first.answer(physics1(), 1, "C").await.unwrap();
    first.answer(maths2(), 0, "  x = 3 ").await.unwrap();
    for _ in 0..42 {
        first.on_timer_tick();
    }
    first.on_autosave_tick().await;
    drop(first);

    let mut second = controller_over(&storage);
    let outcome = second.resume_on_launch(&mut Always(true)).await.unwrap();

    assert!(matches!(outcome, ResumeOutcome::Resumed(_)));
    assert!(second.is_active());
    assert!(second.is_scheduled());
    assert_eq!(second.elapsed_seconds(), 42);
    assert_eq!(second.progress().answered, 2);

    let views = second.slot_views(physics1());
    assert_eq!(views.len(), 2);
    assert!(!views[0].is_answered());
    assert_eq!(views[1].choice, Some(Choice::C));

    let views = second.slot_views(maths2());
    assert_eq!(views[0].custom, Some("x = 3"));
    assert_eq!(views[0].choice, None);
}

#[tokio::test]
async fn quick_resume_also_restores_elapsed() {
    let storage = Storage::in_memory();

    let mut first = controller_over(&storage);
    first.start_test("Mock Q", SectionCounts::new(1, 1)).await.unwrap();
    first.answer(physics1(), 0, "D").await.unwrap();
    for _ in 0..9 {
        first.on_timer_tick();
    }
    first.on_autosave_tick().await;
    first.reset();
    assert!(!first.is_active());

    let outcome = first.quick_resume(&mut Always(true)).await.unwrap();
    assert!(matches!(outcome, ResumeOutcome::Resumed(_)));
    assert_eq!(first.elapsed_seconds(), 9);
    assert_eq!(first.slot_views(physics1())[0].choice, Some(Choice::D));
}

#[tokio::test]
async fn quick_resume_without_snapshot_reports_nothing() {
    let storage = Storage::in_memory();
    let mut ctl = controller_over(&storage);
    let outcome = ctl.quick_resume(&mut Always(true)).await.unwrap();
    assert_eq!(outcome, ResumeOutcome::NothingToResume);
    assert!(!ctl.is_active());
}

#[tokio::test]
async fn declined_resume_keeps_snapshot_until_a_new_test_starts() {
    let storage = Storage::in_memory();

    let mut first = controller_over(&storage);
    first.start_test("Old", SectionCounts::new(1, 1)).await.unwrap();
    drop(first);

    let mut second = controller_over(&storage);
    let outcome = second.resume_on_launch(&mut Always(false)).await.unwrap();
    assert_eq!(outcome, ResumeOutcome::Declined);
    assert!(!second.is_active());
    assert_eq!(
        storage.live.load_live().await.unwrap().unwrap().session().name(),
        "Old"
    );

    second.start_test("New", SectionCounts::new(1, 1)).await.unwrap();
    assert_eq!(
        storage.live.load_live().await.unwrap().unwrap().session().name(),
        "New"
    );
}

#[tokio::test(start_paused = true)]
async fn scheduled_ticks_drive_timer_and_autosave() {
    let storage = Storage::in_memory();
    let mut ctl = controller_over(&storage);
    ctl.start_test("Timed", SectionCounts::new(1, 0)).await.unwrap();

    let mut seen = Vec::new();
    while seen.len() < 6 {
        let event = ctl.next_event().await;
        ctl.on_event(event).await;
        seen.push(event);
    }

    assert_eq!(seen.last(), Some(&ScheduledEvent::Autosave));
    assert_eq!(ctl.elapsed_seconds(), 5);
    assert_eq!(ctl.elapsed_display(), "00:00:05");
    let saved = storage.live.load_live().await.unwrap().unwrap();
    assert_eq!(saved.elapsed_seconds(), 5);

    ctl.end_test().await.unwrap();
    let after_end = tokio::time::timeout(Duration::from_secs(30), ctl.next_event()).await;
    assert!(after_end.is_err(), "ticks must stop with the test");
}

#[tokio::test]
async fn theme_toggle_persists() {
    let storage = Storage::in_memory();
    let ctl = controller_over(&storage);
    let next = ctl.toggle_theme().await.unwrap();
    assert_eq!(ctl.theme().await.unwrap(), next);
    assert_eq!(
        storage.preferences.load_theme().await.unwrap(),
        Some(next)
    );
}
