use slug::slugify;
use thiserror::Error;

use crate::models::{hackathon::Hackathon, stage::Stage};

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Hackathon '{0}' not found")]
    HackathonNotFound(String),

    #[error("Hackathon reference is ambiguous. Multiple hackathons found: {}", .0.join(", "))]
    AmbiguousHackathon(Vec<String>),

    #[error("Stage '{0}' not found")]
    StageNotFound(String),

    #[error("Stage reference is ambiguous. Multiple stages found: {}", .0.join(", "))]
    AmbiguousStage(Vec<String>),
}

enum Matches<'a, T> {
    None,
    One(&'a T),
    Many(Vec<&'a T>),
}

/// Tries each matcher in turn and stops at the first one that matches anything.
fn resolve<'a, T>(items: &'a [T], matchers: &[&dyn Fn(&T) -> bool]) -> Matches<'a, T> {
    for matcher in matchers {
        let found: Vec<_> = items.iter().filter(|&item| matcher(item)).collect();
        match found.len() {
            0 => continue,
            1 => return Matches::One(found[0]),
            _ => return Matches::Many(found),
        }
    }
    Matches::None
}

/// Finds a hackathon by id, slug, id prefix, or part of its name
pub fn find_hackathon<'a>(
    hackathons: &'a [Hackathon],
    reference: &str,
) -> Result<&'a Hackathon, LookupError> {
    let needle = reference.trim().to_lowercase();
    let reference_slug = slugify(reference);

    let by_id = |h: &Hackathon| h.id == reference;
    let by_id_prefix = |h: &Hackathon| !needle.is_empty() && h.id.to_lowercase().starts_with(&needle);
    let by_slug = |h: &Hackathon| !reference_slug.is_empty() && slugify(&h.name) == reference_slug;
    let by_name = |h: &Hackathon| !needle.is_empty() && h.name.to_lowercase().contains(&needle);

    match resolve(hackathons, &[&by_id, &by_slug, &by_id_prefix, &by_name]) {
        Matches::None => Err(LookupError::HackathonNotFound(reference.to_string())),
        Matches::One(hackathon) => Ok(hackathon),
        Matches::Many(found) => Err(LookupError::AmbiguousHackathon(
            found.iter().map(|h| h.name.clone()).collect(),
        )),
    }
}

/// Finds a stage by id, exact name, id prefix, or part of its name
pub fn find_stage<'a>(stages: &'a [Stage], reference: &str) -> Result<&'a Stage, LookupError> {
    let needle = reference.trim().to_lowercase();

    let by_id = |s: &Stage| s.id == reference;
    let by_id_prefix = |s: &Stage| !needle.is_empty() && s.id.to_lowercase().starts_with(&needle);
    let by_exact_name = |s: &Stage| s.name.to_lowercase() == needle;
    let by_name = |s: &Stage| !needle.is_empty() && s.name.to_lowercase().contains(&needle);

    match resolve(stages, &[&by_id, &by_exact_name, &by_id_prefix, &by_name]) {
        Matches::None => Err(LookupError::StageNotFound(reference.to_string())),
        Matches::One(stage) => Ok(stage),
        Matches::Many(found) => Err(LookupError::AmbiguousStage(
            found.iter().map(|s| s.name.clone()).collect(),
        )),
    }
}
