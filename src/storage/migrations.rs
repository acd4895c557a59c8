//! Upgrades hackathon records written by earlier versions so they validate
//! against the current schema. Runs on raw JSON before typed decoding.

use serde_json::{Map, Value};

type RecordUpgrade = fn(&mut Map<String, Value>);

fn hackathon_upgrades() -> Vec<RecordUpgrade> {
    vec![
        stringify_id,
        blank_text_fields,
        truncate_deadline,
        infer_attendance,
        default_multistage,
        upgrade_subtasks,
    ]
}

/// Applies every record upgrade to each object in a hackathon collection.
/// Anything that is not an array of objects is passed through for the
/// schema to reject.
pub fn upgrade_hackathons(mut data: Value) -> Value {
    if let Some(records) = data.as_array_mut() {
        for record in records {
            if let Some(obj) = record.as_object_mut() {
                for upgrade in hackathon_upgrades() {
                    upgrade(obj);
                }
            }
        }
    }
    data
}

/// Ids were once raw millisecond timestamps
fn stringify_id(obj: &mut Map<String, Value>) {
    if let Some(Value::Number(n)) = obj.get("id") {
        let id = n.to_string();
        obj.insert("id".to_string(), Value::from(id));
    }
}

fn blank_text_fields(obj: &mut Map<String, Value>) {
    for field in ["link", "platform"] {
        if obj.get(field).is_none_or(Value::is_null) {
            obj.insert(field.to_string(), Value::from(""));
        }
    }
}

fn truncate_deadline(obj: &mut Map<String, Value>) {
    if let Some(deadline) = obj.get_mut("deadline") {
        normalize_date(deadline);
    }
}

/// Records from before attendance tracking: no link means in person
fn infer_attendance(obj: &mut Map<String, Value>) {
    if obj.get("type").is_some_and(|t| !t.is_null()) {
        return;
    }
    let has_link = obj
        .get("link")
        .and_then(Value::as_str)
        .is_some_and(|link| !link.trim().is_empty());
    let kind = if has_link { "virtual" } else { "in-person" };
    obj.insert("type".to_string(), Value::from(kind));
}

fn default_multistage(obj: &mut Map<String, Value>) {
    if !obj.get("isMultistage").is_some_and(Value::is_boolean) {
        obj.insert("isMultistage".to_string(), Value::Bool(false));
    }
    if obj.get("subtasks").is_none_or(Value::is_null) {
        obj.insert("subtasks".to_string(), Value::Array(vec![]));
    }
}

fn upgrade_subtasks(obj: &mut Map<String, Value>) {
    let Some(subtasks) = obj.get_mut("subtasks").and_then(Value::as_array_mut) else {
        return;
    };

    for subtask in subtasks.iter_mut().filter_map(Value::as_object_mut) {
        stringify_id(subtask);
        for field in ["endDate", "startDate"] {
            if let Some(date) = subtask.get_mut(field) {
                normalize_date(date);
            }
        }
        if subtask.get("startDate").is_some_and(Value::is_null) {
            subtask.remove("startDate");
        }
        mirror_completion(subtask);
    }
}

/// `completed` wins when both are present and disagree
fn mirror_completion(subtask: &mut Map<String, Value>) {
    let status = subtask.get("status").and_then(Value::as_str).map(str::to_owned);
    let completed = match subtask.get("completed").and_then(Value::as_bool) {
        Some(completed) => completed,
        None => status.as_deref() == Some("done"),
    };

    let status = match status.as_deref() {
        _ if completed => "done",
        Some("in-progress") => "in-progress",
        _ => "todo",
    };

    subtask.insert("completed".to_string(), Value::Bool(completed));
    subtask.insert("status".to_string(), Value::from(status));
}

/// Empty strings become null; timestamps are cut down to their date part.
fn normalize_date(value: &mut Value) {
    let Some(raw) = value.as_str() else {
        return;
    };
    let raw = raw.trim();

    let replacement = if raw.is_empty() {
        Value::Null
    } else if raw.len() > 10 && matches!(raw.as_bytes()[10], b'T' | b't' | b' ') {
        Value::from(&raw[..10])
    } else {
        return;
    };
    *value = replacement;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upgrades_legacy_record_shape() {
        let legacy = json!([
            {"id": 1712345678901u64, "name": "HashCode", "deadline": "2025-03-10", "link": "hashcode.dev", "platform": "Google"},
            {"id": "2", "name": "Local Jam", "deadline": "2025-04-01T00:00:00.000Z", "link": "", "platform": ""}
        ]);

        let upgraded = upgrade_hackathons(legacy);

        assert_eq!(upgraded[0]["id"], json!("1712345678901"));
        assert_eq!(upgraded[0]["type"], json!("virtual"));
        assert_eq!(upgraded[0]["isMultistage"], json!(false));
        assert_eq!(upgraded[0]["subtasks"], json!([]));
        assert_eq!(upgraded[1]["type"], json!("in-person"));
        assert_eq!(upgraded[1]["deadline"], json!("2025-04-01"));
    }

    #[test]
    fn test_keeps_explicit_attendance() {
        let upgraded = upgrade_hackathons(json!([
            {"id": "1", "name": "Remote", "deadline": "2025-03-10", "link": "", "type": "virtual"}
        ]));
        assert_eq!(upgraded[0]["type"], json!("virtual"));
    }

    #[test]
    fn test_blank_deadline_becomes_null() {
        let upgraded = upgrade_hackathons(json!([{"id": "1", "name": "x", "deadline": ""}]));
        assert_eq!(upgraded[0]["deadline"], Value::Null);
    }

    #[test]
    fn test_subtask_completion_and_status_are_mirrored() {
        let upgraded = upgrade_hackathons(json!([{
            "id": "1", "name": "Staged", "deadline": "", "isMultistage": true,
            "subtasks": [
                {"id": "a", "name": "Proposal", "startDate": "", "endDate": "2025-02-01", "completed": true},
                {"id": "b", "name": "Prototype", "endDate": "2025-02-15", "status": "done"},
                {"id": "c", "name": "Final", "endDate": "2025-03-01T10:00", "completed": false, "status": "done"},
                {"id": "d", "name": "Demo", "endDate": "2025-03-05", "completed": false, "status": "in-progress"}
            ]
        }]));
        let subtasks = &upgraded[0]["subtasks"];

        assert_eq!(subtasks[0]["status"], json!("done"));
        assert!(subtasks[0].get("startDate").is_none());
        assert_eq!(subtasks[1]["completed"], json!(true));
        assert_eq!(subtasks[2]["status"], json!("todo"));
        assert_eq!(subtasks[2]["endDate"], json!("2025-03-01"));
        assert_eq!(subtasks[3]["status"], json!("in-progress"));
    }

    #[test]
    fn test_non_array_passes_through() {
        let data = json!({"not": "a collection"});
        assert_eq!(upgrade_hackathons(data.clone()), data);
    }
}
