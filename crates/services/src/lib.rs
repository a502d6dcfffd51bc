#![forbid(unsafe_code)]

pub mod app_services;
pub mod archive;
pub mod autosave;
pub mod controller;
pub mod error;
pub mod schedule;
pub mod session_store;
pub mod theme_service;

pub use exam_core::Clock;

pub use app_services::AppServices;
pub use archive::{ArchiveService, ArchiveStats, DASHBOARD_RECENT, RecentTests};
pub use autosave::{AutosaveService, ConfirmPrompt, ResumeOutcome, ResumePath};
pub use controller::ExamController;
pub use error::{AppServicesError, ServiceError};
pub use schedule::{AUTOSAVE_PERIOD, Schedule, ScheduledEvent, TIMER_TICK};
pub use session_store::SessionStore;
pub use theme_service::ThemeService;
