use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::llm::{ChatMessage, DEFAULT_TEMPERATURE};
use crate::providers::{Backend, OpenAiBackend};

const HOSTED_MODEL: &str = "gpt-3.5-turbo";

const SYSTEM_PROMPT: &str = r#"You are a family schedule organizer. Analyze the provided schedule and:
1. Identify potential conflicts or busy times
2. Suggest optimizations for better time management
3. Recommend gaps for family time
4. Consider travel time between activities

Format your response as a detailed analysis with practical suggestions."#;

#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub title: String,
    /// Date and time, passed through as given.
    pub date: String,
    /// Duration in minutes.
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub person: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleRequest {
    pub prompt: String,
    #[serde(default)]
    pub events: Option<Vec<Event>>,
    #[serde(default)]
    pub family_members: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConflict {
    pub events: Vec<String>,
    pub time: String,
    pub resolution: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub suggestions: String,
    #[serde(default)]
    pub conflicts: Option<Vec<ScheduleConflict>>,
}

fn render_event(event: &Event) -> String {
    let mut line = format!("- {} on {}", event.title, event.date);
    if let Some(duration) = event.duration {
        line.push_str(&format!(" ({duration} min)"));
    }
    if let Some(person) = &event.person {
        line.push_str(&format!(" for {person}"));
    }
    line
}

fn build_context(request: &ScheduleRequest) -> String {
    let mut parts = Vec::new();

    if let Some(events) = &request.events {
        let lines: Vec<String> = events.iter().map(render_event).collect();
        parts.push(format!("Current events:\n{}", lines.join("\n")));
    }

    if let Some(members) = &request.family_members {
        parts.push(format!("Family members: {}", members.join(", ")));
    }

    if parts.is_empty() {
        "No current schedule".to_string()
    } else {
        parts.join("\n")
    }
}

/// Coarse conflict heuristic over the free-text analysis: every line that
/// mentions "conflict" (case-insensitive) yields one placeholder record
/// pointing the reader back at the main suggestions. Not a real detector.
fn extract_conflicts(analysis: &str) -> Option<Vec<ScheduleConflict>> {
    if !analysis.to_lowercase().contains("conflict") {
        return None;
    }

    let conflicts: Vec<ScheduleConflict> = analysis
        .lines()
        .filter(|line| line.to_lowercase().contains("conflict"))
        .map(|_| ScheduleConflict {
            events: vec!["Event A".to_string(), "Event B".to_string()],
            time: "TBD".to_string(),
            resolution: "See suggestions above".to_string(),
        })
        .collect();

    Some(conflicts)
}

/// Analyze a family schedule with the hosted backend. Free-text reply, no
/// local fallback for this operation.
pub async fn analyze_schedule(
    openai: &OpenAiBackend,
    request: &ScheduleRequest,
) -> Result<ScheduleResponse, ApiError> {
    let context = build_context(request);
    let full_prompt = format!("{context}\n\n{}", request.prompt);
    let messages = [
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(full_prompt),
    ];

    let reply = openai
        .complete(&messages, HOSTED_MODEL, None, DEFAULT_TEMPERATURE)
        .await?;

    let conflicts = extract_conflicts(&reply.content);
    Ok(ScheduleResponse {
        suggestions: reply.content,
        conflicts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> ScheduleRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn context_defaults_when_empty() {
        assert_eq!(
            build_context(&request(r#"{"prompt":"help"}"#)),
            "No current schedule"
        );
    }

    #[test]
    fn event_line_includes_optional_suffixes() {
        let event: Event = serde_json::from_str(
            r#"{"title":"Soccer practice","date":"Saturday 9am","duration":90,"person":"Sam"}"#,
        )
        .unwrap();
        assert_eq!(
            render_event(&event),
            "- Soccer practice on Saturday 9am (90 min) for Sam"
        );
    }

    #[test]
    fn event_line_without_optionals() {
        let event: Event =
            serde_json::from_str(r#"{"title":"Piano","date":"Tuesday 4pm"}"#).unwrap();
        assert_eq!(render_event(&event), "- Piano on Tuesday 4pm");
    }

    #[test]
    fn context_lists_events_under_header_plus_members() {
        let context = build_context(&request(
            r#"{
                "prompt": "x",
                "events": [
                    {"title": "Soccer", "date": "Sat 9am"},
                    {"title": "Piano", "date": "Sat 10am"}
                ],
                "family_members": ["Ana", "Ben"]
            }"#,
        ));
        assert_eq!(
            context,
            "Current events:\n- Soccer on Sat 9am\n- Piano on Sat 10am\nFamily members: Ana, Ben"
        );
    }

    #[test]
    fn conflict_line_yields_one_placeholder() {
        let conflicts =
            extract_conflicts("There may be a conflict between soccer and piano").unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].time, "TBD");
        assert_eq!(conflicts[0].events, vec!["Event A", "Event B"]);
        assert_eq!(conflicts[0].resolution, "See suggestions above");
    }

    #[test]
    fn conflict_matching_is_case_insensitive() {
        let text = "Schedule looks busy.\nCONFLICT: Saturday morning.\nAlso a Conflict on Sunday.";
        let conflicts = extract_conflicts(text).unwrap();
        assert_eq!(conflicts.len(), 2);
    }

    #[test]
    fn no_conflict_means_none() {
        assert!(extract_conflicts("Your week looks well balanced.").is_none());
    }
}
