use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::models::{
    draft::Rejection,
    stage::{Stage, StageStatus, active_stage, sort_stages},
};

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Attendance {
    #[default]
    InPerson,
    Virtual,
}

/// Where a hackathon's deadline comes from.
///
/// A staged schedule never stores a deadline of its own: it is read off the
/// active stage every time, so it cannot drift from the stage state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    Fixed { deadline: Date },
    /// Non-empty, sorted by end date
    Staged { stages: Vec<Stage> },
}

/// What happened to a hackathon when one of its stages was finished off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRemoval {
    StageNotFound,
    Removed,
    /// The last stage went away; the hackathon should be dropped
    Exhausted,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "HackathonRecord", into = "HackathonRecord")]
pub struct Hackathon {
    /// Opaque identifier assigned at creation
    pub id: String,
    pub name: String,
    /// Empty when attendance is in person
    pub link: String,
    /// Organizer or platform label
    pub platform: String,
    pub kind: Attendance,
    schedule: Schedule,
}

impl Hackathon {
    pub(crate) fn new(
        id: String,
        name: String,
        link: String,
        platform: String,
        kind: Attendance,
        schedule: Schedule,
    ) -> Self {
        Self {
            id,
            name,
            link,
            platform,
            kind,
            schedule,
        }
    }

    pub fn deadline(&self) -> Date {
        match &self.schedule {
            Schedule::Fixed { deadline } => *deadline,
            Schedule::Staged { stages } => active_stage(stages)
                .map(|s| s.end_date)
                .unwrap_or(Date::MAX),
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn is_multistage(&self) -> bool {
        matches!(self.schedule, Schedule::Staged { .. })
    }

    /// Stages in due-date order; empty for single-deadline hackathons
    pub fn stages(&self) -> &[Stage] {
        match &self.schedule {
            Schedule::Fixed { .. } => &[],
            Schedule::Staged { stages } => stages,
        }
    }

    pub fn active_stage(&self) -> Option<&Stage> {
        active_stage(self.stages())
    }

    /// Removes a stage for good. Dropping the last one exhausts the schedule
    /// and the caller is expected to delete the whole hackathon.
    pub fn complete_stage(&mut self, stage_id: &str) -> StageRemoval {
        let Schedule::Staged { stages } = &mut self.schedule else {
            return StageRemoval::StageNotFound;
        };
        let Some(index) = stages.iter().position(|s| s.id == stage_id) else {
            return StageRemoval::StageNotFound;
        };
        stages.remove(index);

        if stages.is_empty() {
            StageRemoval::Exhausted
        } else {
            StageRemoval::Removed
        }
    }

    /// Flips a stage's completion. Returns false when the stage is unknown.
    pub fn toggle_stage(&mut self, stage_id: &str) -> bool {
        match self.stage_mut(stage_id) {
            Some(stage) => {
                let completed = !stage.completed;
                stage.set_completed(completed);
                true
            }
            None => false,
        }
    }

    pub fn set_stage_status(&mut self, stage_id: &str, status: StageStatus) -> bool {
        match self.stage_mut(stage_id) {
            Some(stage) => {
                stage.set_status(status);
                true
            }
            None => false,
        }
    }

    fn stage_mut(&mut self, stage_id: &str) -> Option<&mut Stage> {
        match &mut self.schedule {
            Schedule::Fixed { .. } => None,
            Schedule::Staged { stages } => stages.iter_mut().find(|s| s.id == stage_id),
        }
    }
}

/// Persisted shape of a hackathon. The domain type is validated from it.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HackathonRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub deadline: Option<Date>,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub platform: String,
    #[serde(rename = "type")]
    pub kind: Attendance,
    #[serde(default)]
    pub is_multistage: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Stage>,
}

impl TryFrom<HackathonRecord> for Hackathon {
    type Error = Rejection;

    fn try_from(record: HackathonRecord) -> Result<Self, Self::Error> {
        if record.name.trim().is_empty() {
            return Err(Rejection::EmptyName);
        }

        // A multi-stage record with no stages left falls back to its stored deadline
        let schedule = if record.is_multistage && !record.subtasks.is_empty() {
            let mut stages = record.subtasks;
            sort_stages(&mut stages);
            Schedule::Staged { stages }
        } else {
            let deadline = record.deadline.ok_or(Rejection::MissingDeadline)?;
            Schedule::Fixed { deadline }
        };

        Ok(Hackathon::new(
            record.id,
            record.name,
            record.link,
            record.platform,
            record.kind,
            schedule,
        ))
    }
}

impl From<Hackathon> for HackathonRecord {
    fn from(hackathon: Hackathon) -> Self {
        let deadline = Some(hackathon.deadline());
        let (is_multistage, subtasks) = match hackathon.schedule {
            Schedule::Fixed { .. } => (false, vec![]),
            Schedule::Staged { stages } => (true, stages),
        };

        Self {
            id: hackathon.id,
            name: hackathon.name,
            deadline,
            link: hackathon.link,
            platform: hackathon.platform,
            kind: hackathon.kind,
            is_multistage,
            subtasks,
        }
    }
}

/// Stable sort by deadline
pub fn sort_hackathons(hackathons: &mut [Hackathon]) {
    hackathons.sort_by_key(|h| h.deadline());
}
