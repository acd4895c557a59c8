use std::str::FromStr;

use jiff::civil::Date;
use thiserror::Error;

use crate::models::{
    hackathon::{Attendance, Hackathon, Schedule},
    stage::{Stage, active_stage, sort_stages},
};

/// Why an edit was not applied. None of these leave any state behind.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("a name is required")]
    EmptyName,

    #[error("a deadline is required")]
    MissingDeadline,

    #[error("the stage needs a name")]
    EmptyStageName,

    #[error("the stage needs an end date")]
    MissingStageEndDate,

    #[error("no matching record")]
    NotFound,
}

/// A hackathon being filled in before it is committed to the tracker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HackathonDraft {
    pub name: String,
    pub kind: Attendance,
    pub platform: String,
    pub link: String,
    pub is_multistage: bool,
    /// Kept sorted by end date
    pub stages: Vec<Stage>,
    /// Only meaningful when not multi-stage
    pub deadline: Option<Date>,
}

impl HackathonDraft {
    pub fn from_hackathon(hackathon: &Hackathon) -> Self {
        let (deadline, stages) = match hackathon.schedule() {
            Schedule::Fixed { deadline } => (Some(*deadline), vec![]),
            Schedule::Staged { stages } => (None, stages.clone()),
        };

        Self {
            name: hackathon.name.clone(),
            kind: hackathon.kind,
            platform: hackathon.platform.clone(),
            link: hackathon.link.clone(),
            is_multistage: hackathon.is_multistage(),
            stages,
            deadline,
        }
    }

    pub fn add_stage(&mut self, stage: StageDraft) -> Result<&Stage, Rejection> {
        if stage.name.trim().is_empty() {
            return Err(Rejection::EmptyStageName);
        }
        let end_date = stage.end_date.ok_or(Rejection::MissingStageEndDate)?;

        let stage = Stage::new(stage.name, end_date, stage.start_date);
        let stage_id = stage.id.clone();
        self.stages.push(stage);
        sort_stages(&mut self.stages);

        self.stages
            .iter()
            .find(|s| s.id == stage_id)
            .ok_or(Rejection::NotFound)
    }

    /// Deadlines are only re-derived once the draft is committed.
    pub fn remove_stage(&mut self, stage_id: &str) -> Result<Stage, Rejection> {
        let index = self
            .stages
            .iter()
            .position(|s| s.id == stage_id)
            .ok_or(Rejection::NotFound)?;
        Ok(self.stages.remove(index))
    }

    /// Stages govern the deadline only while there is at least one;
    /// otherwise the supplied deadline stands.
    pub fn resolve_deadline(&self) -> Option<Date> {
        if self.is_staged() {
            active_stage(&self.stages).map(|s| s.end_date)
        } else {
            self.deadline
        }
    }

    fn is_staged(&self) -> bool {
        self.is_multistage && !self.stages.is_empty()
    }

    pub fn into_hackathon(mut self, id: String) -> Result<Hackathon, Rejection> {
        if self.name.trim().is_empty() {
            return Err(Rejection::EmptyName);
        }
        let deadline = self.resolve_deadline().ok_or(Rejection::MissingDeadline)?;

        let schedule = if self.is_staged() {
            sort_stages(&mut self.stages);
            Schedule::Staged {
                stages: self.stages,
            }
        } else {
            Schedule::Fixed { deadline }
        };

        Ok(Hackathon::new(
            id,
            self.name,
            self.link,
            self.platform,
            self.kind,
            schedule,
        ))
    }
}

/// Stage input as typed on the command line: `Name@END` or `Name@START..END`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageDraft {
    pub name: String,
    pub end_date: Option<Date>,
    pub start_date: Option<Date>,
}

#[derive(Debug, Error)]
#[error("Invalid stage date '{input}': {source}")]
pub struct StageDraftParseError {
    input: String,
    #[source]
    source: jiff::Error,
}

impl FromStr for StageDraft {
    type Err = StageDraftParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((name, dates)) = s.rsplit_once('@') else {
            return Ok(StageDraft {
                name: s.trim().to_string(),
                ..StageDraft::default()
            });
        };

        let parse = |raw: &str| -> Result<Option<Date>, StageDraftParseError> {
            let raw = raw.trim();
            if raw.is_empty() {
                return Ok(None);
            }
            raw.parse::<Date>()
                .map(Some)
                .map_err(|e| StageDraftParseError {
                    input: raw.to_string(),
                    source: e,
                })
        };

        let (start_date, end_date) = match dates.split_once("..") {
            Some((start, end)) => (parse(start)?, parse(end)?),
            None => (None, parse(dates)?),
        };

        Ok(StageDraft {
            name: name.trim().to_string(),
            end_date,
            start_date,
        })
    }
}
