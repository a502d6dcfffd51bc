mod answer;
mod ids;
mod record;
mod session;
mod snapshot;
mod subject;
mod theme;

pub use answer::{Answer, Choice, SlotView};
pub use ids::{ParseIdError, RecordId};
pub use record::{ARCHIVE_CAPACITY, ArchivedTest, UNNAMED_TEST};
pub use session::{AnswerSheet, ExamSession, SectionCounts, SessionError};
pub use snapshot::LiveSnapshot;
pub use subject::{ParseKeyError, Section, SlotKey, Subject};
pub use theme::{ParseThemeError, Theme};
