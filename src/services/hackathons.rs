use std::collections::HashSet;

use serde::de;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    models::{
        draft::{HackathonDraft, Rejection},
        hackathon::{Hackathon, StageRemoval, sort_hackathons},
        stage::StageStatus,
    },
    storage::{Storage, StorageError, load_value, migrations::upgrade_hackathons, save_document},
};

pub const HACKATHONS_KEY: &str = "solomon_hackathons";

/// Result of a tracker operation that did not hit an I/O failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A new hackathon was stored under this id
    Added(String),
    Applied,
    /// The hackathon is gone from the collection
    Deleted,
    /// Nothing was changed or written
    Skipped(Rejection),
}

/// Validates a raw hackathon collection, upgrading legacy records first.
///
/// Ids must be unique across the collection.
pub fn decode_hackathons(value: Value) -> Result<Vec<Hackathon>, serde_json::Error> {
    let mut hackathons: Vec<Hackathon> = serde_json::from_value(upgrade_hackathons(value))?;

    let mut seen = HashSet::new();
    if let Some(duplicate) = hackathons.iter().find(|h| !seen.insert(h.id.as_str())) {
        return Err(de::Error::custom(format!(
            "duplicate hackathon id '{}'",
            duplicate.id
        )));
    }

    sort_hackathons(&mut hackathons);
    Ok(hackathons)
}

/// Loads the hackathon collection; unreadable content yields an empty one.
pub fn load_hackathons(storage: &impl Storage) -> Result<Vec<Hackathon>, StorageError> {
    let Some(value) = load_value(storage, HACKATHONS_KEY)? else {
        return Ok(vec![]);
    };

    match decode_hackathons(value) {
        Ok(hackathons) => Ok(hackathons),
        Err(e) => {
            tracing::warn!(key = HACKATHONS_KEY, error = %e, "stored hackathons are invalid, starting empty");
            Ok(vec![])
        }
    }
}

/// Owns the hackathon collection for one session and mirrors every change to storage.
///
/// The collection is kept sorted by deadline after each mutation.
pub struct Tracker<S: Storage> {
    storage: S,
    hackathons: Vec<Hackathon>,
}

impl<S: Storage> Tracker<S> {
    pub fn open(storage: S) -> Result<Self, StorageError> {
        let hackathons = load_hackathons(&storage)?;
        Ok(Self {
            storage,
            hackathons,
        })
    }

    pub fn hackathons(&self) -> &[Hackathon] {
        &self.hackathons
    }

    pub fn get(&self, id: &str) -> Option<&Hackathon> {
        self.hackathons.iter().find(|h| h.id == id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Discards in-memory state and reads the collection again
    pub fn reload(&mut self) -> Result<(), StorageError> {
        self.hackathons = load_hackathons(&self.storage)?;
        Ok(())
    }

    pub fn add(&mut self, draft: HackathonDraft) -> Result<Outcome, StorageError> {
        let hackathon = match draft.into_hackathon(Uuid::new_v4().to_string()) {
            Ok(hackathon) => hackathon,
            Err(rejection) => return Ok(Outcome::Skipped(rejection)),
        };

        tracing::debug!(id = %hackathon.id, name = %hackathon.name, deadline = %hackathon.deadline(), "adding hackathon");
        let id = hackathon.id.clone();
        self.hackathons.push(hackathon);
        self.commit()?;
        Ok(Outcome::Added(id))
    }

    /// Replaces the record in place, keeping its id
    pub fn update(&mut self, id: &str, draft: HackathonDraft) -> Result<Outcome, StorageError> {
        let Some(index) = self.position(id) else {
            return Ok(Outcome::Skipped(Rejection::NotFound));
        };
        let hackathon = match draft.into_hackathon(id.to_string()) {
            Ok(hackathon) => hackathon,
            Err(rejection) => return Ok(Outcome::Skipped(rejection)),
        };

        tracing::debug!(id, deadline = %hackathon.deadline(), "updating hackathon");
        self.hackathons[index] = hackathon;
        self.commit()?;
        Ok(Outcome::Applied)
    }

    pub fn remove(&mut self, id: &str) -> Result<Outcome, StorageError> {
        let Some(index) = self.position(id) else {
            return Ok(Outcome::Skipped(Rejection::NotFound));
        };

        tracing::debug!(id, "removing hackathon");
        self.hackathons.remove(index);
        self.commit()?;
        Ok(Outcome::Deleted)
    }

    /// Finishes a stage and discards it. Completing the last remaining stage
    /// deletes the hackathon.
    pub fn complete_stage(&mut self, id: &str, stage_id: &str) -> Result<Outcome, StorageError> {
        let Some(index) = self.position(id) else {
            return Ok(Outcome::Skipped(Rejection::NotFound));
        };

        let outcome = match self.hackathons[index].complete_stage(stage_id) {
            StageRemoval::StageNotFound => return Ok(Outcome::Skipped(Rejection::NotFound)),
            StageRemoval::Removed => Outcome::Applied,
            StageRemoval::Exhausted => {
                self.hackathons.remove(index);
                Outcome::Deleted
            }
        };

        tracing::debug!(id, stage_id, ?outcome, "stage completed");
        self.commit()?;
        Ok(outcome)
    }

    /// Flips a stage's completion and keeps it. Never deletes the hackathon.
    pub fn toggle_stage(&mut self, id: &str, stage_id: &str) -> Result<Outcome, StorageError> {
        self.edit_stage(id, |hackathon| hackathon.toggle_stage(stage_id))
    }

    pub fn update_stage_status(
        &mut self,
        id: &str,
        stage_id: &str,
        status: StageStatus,
    ) -> Result<Outcome, StorageError> {
        self.edit_stage(id, |hackathon| hackathon.set_stage_status(stage_id, status))
    }

    fn edit_stage(
        &mut self,
        id: &str,
        edit: impl FnOnce(&mut Hackathon) -> bool,
    ) -> Result<Outcome, StorageError> {
        let Some(index) = self.position(id) else {
            return Ok(Outcome::Skipped(Rejection::NotFound));
        };
        if !edit(&mut self.hackathons[index]) {
            return Ok(Outcome::Skipped(Rejection::NotFound));
        }

        tracing::debug!(id, deadline = %self.hackathons[index].deadline(), "stage updated");
        self.commit()?;
        Ok(Outcome::Applied)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.hackathons.iter().position(|h| h.id == id)
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        sort_hackathons(&mut self.hackathons);
        save_document(&self.storage, HACKATHONS_KEY, &self.hackathons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::{Date, date};

    use crate::{
        models::{draft::StageDraft, hackathon::Attendance},
        storage::memory::MemoryStorage,
    };

    fn fixed(name: &str, deadline: Date) -> HackathonDraft {
        HackathonDraft {
            name: name.to_string(),
            kind: Attendance::Virtual,
            deadline: Some(deadline),
            ..HackathonDraft::default()
        }
    }

    fn staged(name: &str, stages: &[(&str, Date)]) -> HackathonDraft {
        let mut draft = HackathonDraft {
            name: name.to_string(),
            is_multistage: true,
            ..HackathonDraft::default()
        };
        for (stage_name, end) in stages {
            draft
                .add_stage(StageDraft {
                    name: stage_name.to_string(),
                    end_date: Some(*end),
                    start_date: None,
                })
                .unwrap();
        }
        draft
    }

    fn find<'a>(tracker: &'a Tracker<&MemoryStorage>, name: &str) -> &'a Hackathon {
        tracker.hackathons().iter().find(|h| h.name == name).unwrap()
    }

    fn deadlines(tracker: &Tracker<&MemoryStorage>) -> Vec<Date> {
        tracker.hackathons().iter().map(|h| h.deadline()).collect()
    }

    fn is_sorted(dates: &[Date]) -> bool {
        dates.windows(2).all(|w| w[0] <= w[1])
    }

    #[test]
    fn test_add_fixed_keeps_submitted_deadline() {
        let storage = MemoryStorage::default();
        let mut tracker = Tracker::open(&storage).unwrap();

        let outcome = tracker.add(fixed("HashCode", date(2025, 3, 10))).unwrap();

        assert_eq!(tracker.hackathons().len(), 1);
        assert_eq!(outcome, Outcome::Added(tracker.hackathons()[0].id.clone()));
        assert_eq!(tracker.hackathons()[0].deadline(), date(2025, 3, 10));
    }

    #[test]
    fn test_add_reports_the_new_id_among_namesakes() {
        let storage = MemoryStorage::default();
        let mut tracker = Tracker::open(&storage).unwrap();

        tracker.add(fixed("Hack Night", date(2025, 1, 5))).unwrap();
        let Outcome::Added(id) = tracker.add(fixed("Hack Night", date(2025, 6, 5))).unwrap() else {
            panic!("Expected the second hackathon to be added");
        };

        assert_eq!(tracker.get(&id).unwrap().deadline(), date(2025, 6, 5));
    }

    #[test]
    fn test_add_stageless_multistage_uses_supplied_deadline() {
        let storage = MemoryStorage::default();
        let mut tracker = Tracker::open(&storage).unwrap();

        let mut solo = staged("Solo", &[]);
        solo.deadline = Some(date(2025, 5, 5));
        let outcome = tracker.add(solo).unwrap();

        assert!(matches!(outcome, Outcome::Added(_)));
        let solo = find(&tracker, "Solo");
        assert!(!solo.is_multistage());
        assert_eq!(solo.deadline(), date(2025, 5, 5));
        assert_eq!(Tracker::open(&storage).unwrap().hackathons(), tracker.hackathons());
    }

    #[test]
    fn test_add_rejects_invalid_drafts_without_writing() {
        let storage = MemoryStorage::default();
        let mut tracker = Tracker::open(&storage).unwrap();

        let unnamed = tracker.add(fixed("", date(2025, 3, 10))).unwrap();
        let undated = tracker
            .add(HackathonDraft {
                name: "No date".to_string(),
                ..HackathonDraft::default()
            })
            .unwrap();
        let stageless = tracker.add(staged("Empty", &[])).unwrap();

        assert_eq!(unnamed, Outcome::Skipped(Rejection::EmptyName));
        assert_eq!(undated, Outcome::Skipped(Rejection::MissingDeadline));
        assert_eq!(stageless, Outcome::Skipped(Rejection::MissingDeadline));
        assert!(tracker.hackathons().is_empty());
        assert_eq!(storage.read(HACKATHONS_KEY).unwrap(), None);
    }

    #[test]
    fn test_duplicate_ids_invalidate_the_document() {
        let storage = MemoryStorage::default();
        storage
            .write(
                HACKATHONS_KEY,
                r#"[
                    {"id": "1", "name": "HashCode", "deadline": "2025-03-10", "type": "virtual"},
                    {"id": "1", "name": "Devfest", "deadline": "2025-04-01", "type": "in-person"}
                ]"#,
            )
            .unwrap();

        let stored = storage.read(HACKATHONS_KEY).unwrap().unwrap();
        let err = decode_hackathons(serde_json::from_str(&stored).unwrap()).unwrap_err();
        assert!(err.to_string().contains("duplicate hackathon id '1'"));
        assert!(Tracker::open(&storage).unwrap().hackathons().is_empty());
    }

    #[test]
    fn test_hashcode_scenario() {
        let storage = MemoryStorage::default();
        let mut tracker = Tracker::open(&storage).unwrap();

        tracker.add(fixed("HashCode", date(2025, 3, 10))).unwrap();
        tracker
            .add(staged(
                "Build Week",
                &[("Final", date(2025, 3, 1)), ("Proposal", date(2025, 2, 1))],
            ))
            .unwrap();

        let build_week = find(&tracker, "Build Week");
        assert_eq!(build_week.deadline(), date(2025, 2, 1));
        assert_eq!(tracker.hackathons()[0].name, "Build Week");
        let id = build_week.id.clone();
        let proposal = build_week.stages()[0].id.clone();
        let fin = build_week.stages()[1].id.clone();

        assert_eq!(tracker.complete_stage(&id, &proposal).unwrap(), Outcome::Applied);
        let build_week = tracker.get(&id).unwrap();
        assert_eq!(build_week.deadline(), date(2025, 3, 1));
        assert!(build_week.stages().iter().all(|s| s.id != proposal));

        assert_eq!(tracker.complete_stage(&id, &fin).unwrap(), Outcome::Deleted);
        assert!(tracker.get(&id).is_none());
        assert_eq!(tracker.hackathons().len(), 1);
    }

    #[test]
    fn test_collection_stays_sorted_by_deadline() {
        let storage = MemoryStorage::default();
        let mut tracker = Tracker::open(&storage).unwrap();

        tracker.add(fixed("C", date(2025, 5, 1))).unwrap();
        tracker.add(fixed("A", date(2025, 1, 1))).unwrap();
        tracker
            .add(staged("B", &[("One", date(2025, 2, 1)), ("Two", date(2025, 6, 1))]))
            .unwrap();
        assert!(is_sorted(&deadlines(&tracker)));

        let id = find(&tracker, "A").id.clone();
        tracker.update(&id, fixed("A", date(2025, 12, 1))).unwrap();
        assert!(is_sorted(&deadlines(&tracker)));
        assert_eq!(tracker.hackathons().last().unwrap().name, "A");

        let b = find(&tracker, "B");
        let (b_id, one) = (b.id.clone(), b.stages()[0].id.clone());
        tracker.complete_stage(&b_id, &one).unwrap();
        assert!(is_sorted(&deadlines(&tracker)));
        assert_eq!(find(&tracker, "B").deadline(), date(2025, 6, 1));

        tracker.remove(&b_id).unwrap();
        assert!(is_sorted(&deadlines(&tracker)));
    }

    #[test]
    fn test_update_preserves_id_and_ignores_unknown_ids() {
        let storage = MemoryStorage::default();
        let mut tracker = Tracker::open(&storage).unwrap();
        tracker.add(fixed("HashCode", date(2025, 3, 10))).unwrap();
        let id = tracker.hackathons()[0].id.clone();

        let outcome = tracker
            .update(&id, staged("HashCode", &[("Qualifier", date(2025, 2, 20))]))
            .unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(tracker.hackathons()[0].id, id);
        assert_eq!(tracker.hackathons()[0].deadline(), date(2025, 2, 20));

        let missing = tracker.update("missing", fixed("X", date(2025, 1, 1))).unwrap();
        assert_eq!(missing, Outcome::Skipped(Rejection::NotFound));

        let invalid = tracker.update(&id, fixed("", date(2025, 1, 1))).unwrap();
        assert_eq!(invalid, Outcome::Skipped(Rejection::EmptyName));
        assert_eq!(tracker.hackathons()[0].name, "HashCode");
    }

    #[test]
    fn test_remove_is_idempotent() {
        let storage = MemoryStorage::default();
        let mut tracker = Tracker::open(&storage).unwrap();
        tracker.add(fixed("HashCode", date(2025, 3, 10))).unwrap();
        let id = tracker.hackathons()[0].id.clone();

        assert_eq!(tracker.remove(&id).unwrap(), Outcome::Deleted);
        assert_eq!(
            tracker.remove(&id).unwrap(),
            Outcome::Skipped(Rejection::NotFound)
        );
        assert!(tracker.hackathons().is_empty());
    }

    #[test]
    fn test_toggle_stage_keeps_record_when_all_done() {
        let storage = MemoryStorage::default();
        let mut tracker = Tracker::open(&storage).unwrap();
        tracker
            .add(staged(
                "Build Week",
                &[("Proposal", date(2025, 2, 1)), ("Final", date(2025, 3, 1))],
            ))
            .unwrap();
        let hackathon = &tracker.hackathons()[0];
        let id = hackathon.id.clone();
        let stage_ids: Vec<_> = hackathon.stages().iter().map(|s| s.id.clone()).collect();

        tracker.toggle_stage(&id, &stage_ids[0]).unwrap();
        assert_eq!(tracker.get(&id).unwrap().deadline(), date(2025, 3, 1));

        tracker.toggle_stage(&id, &stage_ids[1]).unwrap();
        let hackathon = tracker.get(&id).unwrap();
        assert_eq!(hackathon.stages().len(), 2);
        assert_eq!(hackathon.deadline(), date(2025, 3, 1));
        assert_eq!(hackathon.stages()[1].status, StageStatus::Done);

        tracker.toggle_stage(&id, &stage_ids[0]).unwrap();
        assert_eq!(tracker.get(&id).unwrap().deadline(), date(2025, 2, 1));

        assert_eq!(
            tracker.toggle_stage(&id, "missing").unwrap(),
            Outcome::Skipped(Rejection::NotFound)
        );
    }

    #[test]
    fn test_update_stage_status_recomputes_deadline() {
        let storage = MemoryStorage::default();
        let mut tracker = Tracker::open(&storage).unwrap();
        tracker
            .add(staged(
                "Build Week",
                &[("Proposal", date(2025, 2, 1)), ("Final", date(2025, 3, 1))],
            ))
            .unwrap();
        let id = tracker.hackathons()[0].id.clone();
        let proposal = tracker.hackathons()[0].stages()[0].id.clone();

        tracker
            .update_stage_status(&id, &proposal, StageStatus::InProgress)
            .unwrap();
        let stage = &tracker.get(&id).unwrap().stages()[0];
        assert!(!stage.completed);
        assert_eq!(tracker.get(&id).unwrap().deadline(), date(2025, 2, 1));

        tracker
            .update_stage_status(&id, &proposal, StageStatus::Done)
            .unwrap();
        let hackathon = tracker.get(&id).unwrap();
        assert!(hackathon.stages()[0].completed);
        assert_eq!(hackathon.deadline(), date(2025, 3, 1));
    }

    #[test]
    fn test_changes_survive_reopen() {
        let storage = MemoryStorage::default();
        {
            let mut tracker = Tracker::open(&storage).unwrap();
            tracker.add(fixed("HashCode", date(2025, 3, 10))).unwrap();
            tracker
                .add(staged("Build Week", &[("Proposal", date(2025, 2, 1))]))
                .unwrap();
        }

        let reopened = Tracker::open(&storage).unwrap();
        let names: Vec<_> = reopened.hackathons().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["Build Week", "HashCode"]);
        assert!(reopened.hackathons()[0].is_multistage());
    }

    #[test]
    fn test_corrupt_document_opens_empty() {
        let storage = MemoryStorage::default();
        storage.write(HACKATHONS_KEY, "[{\"id\": ").unwrap();
        assert!(Tracker::open(&storage).unwrap().hackathons().is_empty());

        storage
            .write(HACKATHONS_KEY, r#"[{"id": "1", "name": "", "deadline": "2025-01-01"}]"#)
            .unwrap();
        assert!(Tracker::open(&storage).unwrap().hackathons().is_empty());
    }

    #[test]
    fn test_opens_legacy_documents() {
        let storage = MemoryStorage::default();
        storage
            .write(
                HACKATHONS_KEY,
                r#"[
                    {"id": "2", "name": "Later", "deadline": "2025-04-01", "link": "", "platform": ""},
                    {"id": "1", "name": "Sooner", "deadline": "2025-03-10", "link": "devpost.com", "platform": "Devpost"}
                ]"#,
            )
            .unwrap();

        let tracker = Tracker::open(&storage).unwrap();
        assert_eq!(tracker.hackathons()[0].name, "Sooner");
        assert_eq!(tracker.hackathons()[0].kind, Attendance::Virtual);
        assert_eq!(tracker.hackathons()[1].kind, Attendance::InPerson);
    }
}
