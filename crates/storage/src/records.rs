//! JSON shapes stored under `liveTest` and `recentTests`.
//!
//! The field names match the layout written by the browser version of the
//! tracker, so existing data loads unchanged. These types stay in the storage
//! layer; services only ever see the domain types.

use chrono::{DateTime, Utc};
use exam_core::model::{
    Answer, AnswerSheet, ArchivedTest, ExamSession, LiveSnapshot, RecordId, Section,
    SectionCounts, SessionError, SlotKey, Subject,
};
use serde::{Deserialize, Serialize};

type RawSlots = Vec<Option<String>>;

/// Fields shared by live and archived tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub section1_count: u32,
    #[serde(default)]
    pub section2_count: u32,
    #[serde(default)]
    pub physics_section1_answers: RawSlots,
    #[serde(default)]
    pub physics_section2_answers: RawSlots,
    #[serde(default)]
    pub chemistry_section1_answers: RawSlots,
    #[serde(default)]
    pub chemistry_section2_answers: RawSlots,
    #[serde(default)]
    pub mathematics_section1_answers: RawSlots,
    #[serde(default)]
    pub mathematics_section2_answers: RawSlots,
}

impl TestRecord {
    #[must_use]
    pub fn from_parts(name: &str, counts: SectionCounts, sheet: &AnswerSheet) -> Self {
        let mut record = Self {
            name: name.to_owned(),
            section1_count: counts.section1(),
            section2_count: counts.section2(),
            ..Self::default()
        };
        for (key, slots) in sheet.iter() {
            *record.slots_mut(key) = slots
                .iter()
                .map(|slot| slot.as_ref().map(|a| a.as_str().to_owned()))
                .collect();
        }
        record
    }

    /// Stored counts, rejected when a section is over the question limit.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::TooManyQuestions` for an oversized section.
    pub fn counts(&self) -> Result<SectionCounts, SessionError> {
        SectionCounts::checked(self.section1_count.into(), self.section2_count.into())
    }

    /// Parse the six raw arrays into a typed sheet.
    ///
    /// Empty strings are read as unanswered.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if a count is too large or an array disagrees
    /// with its count.
    pub fn sheet(&self) -> Result<AnswerSheet, SessionError> {
        AnswerSheet::from_persisted(self.counts()?, |key| {
            self.slots(key)
                .iter()
                .map(|slot| slot.as_deref().and_then(Answer::parse))
                .collect()
        })
    }

    fn slots(&self, key: SlotKey) -> &RawSlots {
        match (key.subject, key.section) {
            (Subject::Physics, Section::Section1) => &self.physics_section1_answers,
            (Subject::Physics, Section::Section2) => &self.physics_section2_answers,
            (Subject::Chemistry, Section::Section1) => &self.chemistry_section1_answers,
            (Subject::Chemistry, Section::Section2) => &self.chemistry_section2_answers,
            (Subject::Mathematics, Section::Section1) => &self.mathematics_section1_answers,
            (Subject::Mathematics, Section::Section2) => &self.mathematics_section2_answers,
        }
    }

    fn slots_mut(&mut self, key: SlotKey) -> &mut RawSlots {
        match (key.subject, key.section) {
            (Subject::Physics, Section::Section1) => &mut self.physics_section1_answers,
            (Subject::Physics, Section::Section2) => &mut self.physics_section2_answers,
            (Subject::Chemistry, Section::Section1) => &mut self.chemistry_section1_answers,
            (Subject::Chemistry, Section::Section2) => &mut self.chemistry_section2_answers,
            (Subject::Mathematics, Section::Section1) => &mut self.mathematics_section1_answers,
            (Subject::Mathematics, Section::Section2) => &mut self.mathematics_section2_answers,
        }
    }
}

/// Persisted shape of the in-progress test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveTestRecord {
    #[serde(flatten)]
    pub test: TestRecord,
    #[serde(default)]
    pub estimated_seconds: u64,
    #[serde(default)]
    pub last_saved: Option<DateTime<Utc>>,
}

impl LiveTestRecord {
    #[must_use]
    pub fn from_snapshot(snapshot: &LiveSnapshot) -> Self {
        let session = snapshot.session();
        Self {
            test: TestRecord::from_parts(session.name(), session.counts(), session.answers()),
            estimated_seconds: snapshot.elapsed_seconds(),
            last_saved: Some(snapshot.saved_at()),
        }
    }

    /// Convert back into a domain snapshot.
    ///
    /// A snapshot without a save time is dated at the Unix epoch.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the name is blank or the arrays do not fit the counts.
    pub fn into_snapshot(self) -> Result<LiveSnapshot, SessionError> {
        let sheet = self.test.sheet()?;
        let session = ExamSession::from_persisted(&self.test.name, self.test.counts()?, sheet)?;
        let saved_at = self.last_saved.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Ok(LiveSnapshot::capture(
            &session,
            self.estimated_seconds,
            saved_at,
        ))
    }
}

/// Persisted shape of one archived test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedTestRecord {
    #[serde(flatten)]
    pub test: TestRecord,
    pub id: RecordId,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub estimated_seconds: u64,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_answered: Option<bool>,
}

impl ArchivedTestRecord {
    #[must_use]
    pub fn from_archived(record: &ArchivedTest) -> Self {
        Self {
            test: TestRecord::from_parts(record.name(), record.counts(), record.answers()),
            id: record.id(),
            date: record.completion_label().to_owned(),
            estimated_seconds: record.elapsed_seconds(),
            completed_at: Some(record.completed_at()),
            all_answered: Some(record.all_answered()),
        }
    }

    /// Convert back into a domain record.
    ///
    /// Entries written before `completedAt` existed take their completion time
    /// from the millisecond id.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the arrays do not fit the counts.
    pub fn into_archived(self) -> Result<ArchivedTest, SessionError> {
        let counts = self.test.counts()?;
        let answers = self.test.sheet()?;
        let completed_at = self
            .completed_at
            .or_else(|| {
                i64::try_from(self.id.value())
                    .ok()
                    .and_then(DateTime::<Utc>::from_timestamp_millis)
            })
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Ok(ArchivedTest::from_persisted(
            self.id,
            self.test.name.trim().to_owned(),
            counts,
            answers,
            self.estimated_seconds,
            completed_at,
            self.date,
            self.all_answered,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::Choice;
    use exam_core::time::fixed_now;

    #[test]
    fn reads_browser_layout() {
        let raw = r#"{
            "physicsSection1Answers": ["A", null],
            "physicsSection2Answers": [""],
            "chemistrySection1Answers": [null, "12 mol"],
            "chemistrySection2Answers": [null],
            "mathematicsSection1Answers": [null, null],
            "mathematicsSection2Answers": ["D"],
            "name": "Mock A",
            "section1Count": 2,
            "section2Count": 1,
            "estimatedSeconds": 75,
            "lastSaved": "2024-03-01T10:00:00.000Z"
        }"#;

        let snapshot = serde_json::from_str::<LiveTestRecord>(raw)
            .unwrap()
            .into_snapshot()
            .unwrap();

        let session = snapshot.session();
        assert_eq!(session.name(), "Mock A");
        assert_eq!(snapshot.elapsed_seconds(), 75);
        assert_eq!(
            session.answer(SlotKey::new(Subject::Physics, Section::Section1), 0),
            Some(&Answer::Choice(Choice::A))
        );
        assert_eq!(
            session.answer(SlotKey::new(Subject::Physics, Section::Section2), 0),
            None
        );
        assert_eq!(
            session.answer(SlotKey::new(Subject::Chemistry, Section::Section1), 1),
            Some(&Answer::Custom("12 mol".into()))
        );
    }

    #[test]
    fn writes_browser_field_names() {
        let session = ExamSession::new("Mock A", SectionCounts::new(1, 0)).unwrap();
        let snapshot = LiveSnapshot::capture(&session, 3, fixed_now());
        let record = LiveTestRecord::from_snapshot(&snapshot);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["name"], "Mock A");
        assert_eq!(json["section1Count"], 1);
        assert_eq!(json["estimatedSeconds"], 3);
        assert_eq!(json["physicsSection1Answers"], serde_json::json!([null]));
        assert_eq!(json["mathematicsSection2Answers"], serde_json::json!([]));
        assert!(json["lastSaved"].is_string());
    }

    #[test]
    fn oversized_counts_are_rejected_before_reading_answers() {
        let raw = r#"{
            "name": "Broken",
            "section1Count": 4000000000,
            "section2Count": 1,
            "physicsSection1Answers": [null]
        }"#;
        let err = serde_json::from_str::<LiveTestRecord>(raw)
            .unwrap()
            .into_snapshot()
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::TooManyQuestions { section: Section::Section1, .. }
        ));
    }

    #[test]
    fn legacy_archive_entry_derives_completion_time_from_id() {
        let raw = r#"{
            "name": "Old",
            "section1Count": 0,
            "section2Count": 0,
            "date": "3/1/2024, 10:00:00 AM",
            "estimatedSeconds": 0,
            "id": "1700000000000"
        }"#;
        let record = serde_json::from_str::<ArchivedTestRecord>(raw)
            .unwrap()
            .into_archived()
            .unwrap();

        assert_eq!(record.completed_at(), fixed_now());
        assert_eq!(record.completion_label(), "3/1/2024, 10:00:00 AM");
        assert!(!record.is_completed());
        assert!(!record.all_answered());
    }
}
