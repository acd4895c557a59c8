use jiff::civil::Date;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StageStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

/// A submission milestone of a multi-stage hackathon
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    /// Unique within the parent hackathon
    pub id: String,
    /// Label of the submission stage
    pub name: String,
    /// Due date of the stage
    pub end_date: Date,
    /// Informational only, never used to derive deadlines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Date>,
    pub completed: bool,
    #[serde(default)]
    pub status: StageStatus,
}

impl Stage {
    pub fn new(name: String, end_date: Date, start_date: Option<Date>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            end_date,
            start_date,
            completed: false,
            status: StageStatus::Todo,
        }
    }

    /// Keeps `status` in step: done when completed, todo otherwise
    pub fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
        self.status = if completed {
            StageStatus::Done
        } else {
            StageStatus::Todo
        };
    }

    pub fn set_status(&mut self, status: StageStatus) {
        self.status = status;
        self.completed = status == StageStatus::Done;
    }
}

/// Stable sort by due date; stages sharing a date keep their insertion order.
pub fn sort_stages(stages: &mut [Stage]) {
    stages.sort_by_key(|s| s.end_date);
}

/// The earliest-due incomplete stage, or the last stage when all are done.
///
/// Expects `stages` sorted by [`sort_stages`].
pub fn active_stage(stages: &[Stage]) -> Option<&Stage> {
    stages.iter().find(|s| !s.completed).or_else(|| stages.last())
}

/// "Stage {completed + 1} of {total}"
pub fn stage_label(stages: &[Stage]) -> String {
    let completed = stages.iter().filter(|s| s.completed).count();
    format!("Stage {} of {}", completed + 1, stages.len())
}
