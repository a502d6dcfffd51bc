use exam_core::model::{
    Answer, ArchivedTest, ExamSession, LiveSnapshot, SectionCounts, SlotKey, SlotView, Theme,
};
use exam_core::time::format_hms;
use exam_core::{Progress, Timer, TimerState};
use tracing::{info, warn};

use crate::archive::{ArchiveService, ArchiveStats, RecentTests};
use crate::autosave::{AutosaveService, ConfirmPrompt, ResumeOutcome, ResumePath};
use crate::error::ServiceError;
use crate::schedule::{Schedule, ScheduledEvent};
use crate::session_store::SessionStore;
use crate::theme_service::ThemeService;

/// Owns every piece of mutable application state.
///
/// UI events and the periodic ticks are funneled through `&mut self`
/// methods, so the single-test and single-snapshot invariants follow from
/// sequencing alone.
pub struct ExamController {
    store: SessionStore,
    timer: Timer,
    schedule: Schedule,
    cursor: SlotKey,
    autosave: AutosaveService,
    archive: ArchiveService,
    theme: ThemeService,
}

impl ExamController {
    #[must_use]
    pub fn new(autosave: AutosaveService, archive: ArchiveService, theme: ThemeService) -> Self {
        Self {
            store: SessionStore::new(),
            timer: Timer::new(),
            schedule: Schedule::new(),
            cursor: SlotKey::default(),
            autosave,
            archive,
            theme,
        }
    }

    //
    // ─── LIFECYCLE ─────────────────────────────────────────────────────────────
    //

    /// Start a new test with all answers empty and the timer at zero.
    ///
    /// A snapshot is written right away, replacing any stale one left by a
    /// declined resume.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::AlreadyActive` while another test runs, or
    /// `ServiceError::Session` for a blank name.
    pub async fn start_test(
        &mut self,
        name: &str,
        counts: SectionCounts,
    ) -> Result<&ExamSession, ServiceError> {
        if self.store.is_active() {
            return Err(ServiceError::AlreadyActive);
        }
        self.store.create_session(name, counts)?;
        self.timer.start();
        self.schedule.start();
        self.cursor = SlotKey::default();
        self.persist_live().await;

        let session = self.store.active().ok_or(ServiceError::NoActiveTest)?;
        info!(name = session.name(), total = counts.total_slots(), "test started");
        Ok(session)
    }

    /// Offer the saved test when the app starts.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::AlreadyActive` while a test runs, or storage failures.
    pub async fn resume_on_launch(
        &mut self,
        prompt: &mut dyn ConfirmPrompt,
    ) -> Result<ResumeOutcome, ServiceError> {
        self.resume(ResumePath::Launch, prompt).await
    }

    /// Restore the saved test on explicit request.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::AlreadyActive` while a test runs, or storage failures.
    pub async fn quick_resume(
        &mut self,
        prompt: &mut dyn ConfirmPrompt,
    ) -> Result<ResumeOutcome, ServiceError> {
        self.resume(ResumePath::Quick, prompt).await
    }

    async fn resume(
        &mut self,
        path: ResumePath,
        prompt: &mut dyn ConfirmPrompt,
    ) -> Result<ResumeOutcome, ServiceError> {
        if self.store.is_active() {
            return Err(ServiceError::AlreadyActive);
        }
        let outcome = self.autosave.try_resume(path, prompt).await?;
        if let ResumeOutcome::Resumed(snapshot) = &outcome {
            self.install(snapshot.clone());
        }
        Ok(outcome)
    }

    fn install(&mut self, snapshot: LiveSnapshot) {
        let (session, elapsed) = snapshot.into_parts();
        self.store.restore(session);
        self.timer.resume_from(elapsed);
        self.schedule.start();
        self.cursor = SlotKey::default();
    }

    /// Stop the clock, archive the test and clear it.
    ///
    /// If archiving fails the test keeps running so nothing is lost.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NoActiveTest` with nothing running, or storage failures.
    pub async fn end_test(&mut self) -> Result<ArchivedTest, ServiceError> {
        self.schedule.stop();
        let elapsed = self.timer.stop();

        let Some(session) = self.store.active() else {
            self.timer.reset();
            return Err(ServiceError::NoActiveTest);
        };

        match self.archive.complete_session(session, elapsed).await {
            Ok(record) => {
                self.store.clear_session();
                self.timer.reset();
                Ok(record)
            }
            Err(err) => {
                warn!(error = %err, "archiving failed; test left running");
                self.timer.resume_from(elapsed);
                self.schedule.start();
                Err(err.into())
            }
        }
    }

    /// Abandon the active test without archiving it.
    ///
    /// The live snapshot stays so the test can still be resumed later.
    pub fn reset(&mut self) {
        self.schedule.stop();
        self.timer.reset();
        if let Some(session) = self.store.clear_session() {
            info!(name = session.name(), "test abandoned");
        }
    }

    //
    // ─── ANSWERS ───────────────────────────────────────────────────────────────
    //

    /// Record raw input for a slot and autosave.
    ///
    /// Returns the new progress, or `None` when the write was ignored.
    pub async fn answer(&mut self, key: SlotKey, index: usize, raw: &str) -> Option<Progress> {
        let progress = self.store.set_answer(key, index, raw)?;
        self.persist_live().await;
        Some(progress)
    }

    /// Record a typed answer for a slot and autosave.
    pub async fn set_answer(
        &mut self,
        key: SlotKey,
        index: usize,
        answer: Option<Answer>,
    ) -> Option<Progress> {
        let progress = self.store.set(key, index, answer)?;
        self.persist_live().await;
        Some(progress)
    }

    pub async fn clear_answer(&mut self, key: SlotKey, index: usize) -> Option<Progress> {
        self.set_answer(key, index, None).await
    }

    /// Move to another subject/section.
    pub fn navigate(&mut self, key: SlotKey) {
        self.cursor = key;
    }

    #[must_use]
    pub fn cursor(&self) -> SlotKey {
        self.cursor
    }

    //
    // ─── TICKS ─────────────────────────────────────────────────────────────────
    //

    /// Wait for the next periodic tick; never resolves while no test runs.
    pub async fn next_event(&mut self) -> ScheduledEvent {
        self.schedule.next().await
    }

    /// Apply a periodic tick. Returns the new elapsed seconds for a timer tick.
    pub async fn on_event(&mut self, event: ScheduledEvent) -> Option<u64> {
        match event {
            ScheduledEvent::TimerTick => self.on_timer_tick(),
            ScheduledEvent::Autosave => {
                self.on_autosave_tick().await;
                None
            }
        }
    }

    pub fn on_timer_tick(&mut self) -> Option<u64> {
        self.timer.tick()
    }

    pub async fn on_autosave_tick(&mut self) {
        self.persist_live().await;
    }

    async fn persist_live(&self) {
        let Some(session) = self.store.active() else {
            return;
        };
        if let Err(err) = self.autosave.save(session, self.timer.elapsed()).await {
            warn!(error = %err, "autosave failed");
        }
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn session(&self) -> Option<&ExamSession> {
        self.store.active()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.store.is_active()
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        self.store.progress()
    }

    #[must_use]
    pub fn section_progress(&self, key: SlotKey) -> Progress {
        self.store
            .active()
            .map(|s| Progress::of_key(s.answers(), key))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.timer.elapsed()
    }

    #[must_use]
    pub fn elapsed_display(&self) -> String {
        format_hms(self.timer.elapsed())
    }

    #[must_use]
    pub fn timer_state(&self) -> TimerState {
        self.timer.state()
    }

    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.schedule.is_running()
    }

    /// Input state for every question in one section, for restoring a form.
    #[must_use]
    pub fn slot_views(&self, key: SlotKey) -> Vec<SlotView<'_>> {
        self.store
            .active()
            .map(|s| s.answers().views(key).collect())
            .unwrap_or_default()
    }

    /// # Errors
    ///
    /// Returns storage failures.
    pub async fn recent(&self, limit: usize) -> Result<RecentTests, ServiceError> {
        Ok(self.archive.list_recent(limit).await?)
    }

    /// # Errors
    ///
    /// Returns storage failures.
    pub async fn stats(&self) -> Result<ArchiveStats, ServiceError> {
        Ok(self.archive.aggregate_stats().await?)
    }

    /// # Errors
    ///
    /// Returns storage failures.
    pub async fn theme(&self) -> Result<Theme, ServiceError> {
        Ok(self.theme.load().await?)
    }

    /// # Errors
    ///
    /// Returns storage failures.
    pub async fn toggle_theme(&self) -> Result<Theme, ServiceError> {
        Ok(self.theme.toggle().await?)
    }
}
