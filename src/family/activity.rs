use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ParseError};
use crate::llm::{ChatMessage, DEFAULT_TEMPERATURE};
use crate::providers::{Backend, OllamaBackend, OpenAiBackend};

const HOSTED_MODEL: &str = "gpt-3.5-turbo";
const FALLBACK_MODEL: &str = "llama2";

const SYSTEM_PROMPT: &str = r#"You are a family activity expert. When suggesting activities, provide practical, creative, and age-appropriate ideas.
Always format your response as a JSON object with the following structure:
{
    "suggestions": [
        {
            "title": "Activity Name",
            "description": "Detailed description",
            "estimated_time": 60,
            "suitable_for": ["all ages", "children"]
        }
    ],
    "rationale": "Why these activities were chosen"
}
Provide at least 3-5 suggestions."#;

#[derive(Debug, Clone, Deserialize)]
pub struct FamilyMember {
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityRequest {
    pub prompt: String,
    #[serde(default)]
    pub family_members: Option<Vec<FamilyMember>>,
    #[serde(default)]
    pub preferences: Option<Vec<String>>,
    /// Available time in minutes.
    #[serde(default)]
    pub time_available: Option<u32>,
}

/// A single suggestion mapped from backend JSON. Fields the backend omitted
/// stay absent (or empty) rather than failing the whole response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySuggestion {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub estimated_time: Option<u32>,
    #[serde(default)]
    pub suitable_for: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityResponse {
    #[serde(default)]
    pub suggestions: Vec<ActivitySuggestion>,
    #[serde(default)]
    pub rationale: String,
}

/// Render the request context: members summary, preferences, available time.
/// Each clause appears only when its source field is present.
fn build_context(request: &ActivityRequest) -> String {
    let mut parts = Vec::new();

    if let Some(members) = &request.family_members {
        let summaries: Vec<String> = members
            .iter()
            .map(|m| match m.age {
                Some(age) => format!("{} (age {age})", m.name),
                None => m.name.clone(),
            })
            .collect();
        parts.push(format!("Family members: {}", summaries.join(", ")));
    }

    if let Some(preferences) = &request.preferences {
        parts.push(format!("Preferences: {}", preferences.join(", ")));
    }

    if let Some(minutes) = request.time_available {
        parts.push(format!("Available time: {minutes} minutes"));
    }

    if parts.is_empty() {
        "General family".to_string()
    } else {
        parts.join(". ")
    }
}

/// First stage of the recovery policy: parse backend text into the typed
/// response, or report why it could not be.
pub fn parse_activity_json(text: &str) -> Result<ActivityResponse, ParseError> {
    serde_json::from_str(text).map_err(ParseError::from)
}

/// Second stage: the canned answer substituted when parsing fails.
fn fallback_suggestions() -> ActivityResponse {
    ActivityResponse {
        suggestions: vec![ActivitySuggestion {
            title: "Family Game Time".to_string(),
            description: "Play board games or card games together".to_string(),
            estimated_time: Some(60),
            suitable_for: Some(vec!["all ages".to_string()]),
        }],
        rationale: "These are general family activities that work for most situations".to_string(),
    }
}

/// Generate activity suggestions: hosted backend with strict JSON output
/// first, local backend as the fallback, canned default as the terminal
/// answer when the fallback text does not parse.
///
/// Only a failure of the local call itself, after the hosted path has already
/// failed, surfaces as an error.
pub async fn suggest_activities(
    openai: &OpenAiBackend,
    ollama: &OllamaBackend,
    request: &ActivityRequest,
) -> Result<ActivityResponse, ApiError> {
    let context = build_context(request);
    let full_prompt = format!("{context}. {}", request.prompt);
    let messages = [
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(full_prompt),
    ];

    match openai
        .complete_json(&messages, HOSTED_MODEL, None, DEFAULT_TEMPERATURE)
        .await
    {
        Ok(reply) => match parse_activity_json(&reply.content) {
            Ok(parsed) => return Ok(parsed),
            Err(e) => {
                tracing::warn!("hosted activity reply was not usable JSON, trying local: {e}");
            }
        },
        Err(e) => {
            tracing::warn!("hosted backend failed for activity suggestions, trying local: {e}");
        }
    }

    let reply = ollama
        .complete(&messages, FALLBACK_MODEL, None, DEFAULT_TEMPERATURE)
        .await?;

    Ok(parse_activity_json(&reply.content).unwrap_or_else(|e| {
        tracing::warn!("local activity reply was not JSON, using canned suggestions: {e}");
        fallback_suggestions()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> ActivityRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn context_defaults_to_general_family() {
        assert_eq!(
            build_context(&request(r#"{"prompt":"ideas?"}"#)),
            "General family"
        );
    }

    #[test]
    fn context_renders_members_with_and_without_age() {
        let context = build_context(&request(
            r#"{"prompt":"x","family_members":[{"name":"Alice","age":10},{"name":"Bob"}]}"#,
        ));
        assert_eq!(context, "Family members: Alice (age 10), Bob");
    }

    #[test]
    fn context_joins_all_clauses_with_periods() {
        let context = build_context(&request(
            r#"{
                "prompt": "x",
                "family_members": [{"name": "Ana"}],
                "preferences": ["outdoors", "crafts"],
                "time_available": 90
            }"#,
        ));
        assert_eq!(
            context,
            "Family members: Ana. Preferences: outdoors, crafts. Available time: 90 minutes"
        );
    }

    #[test]
    fn parse_maps_full_suggestions() {
        let parsed = parse_activity_json(
            r#"{
                "suggestions": [{
                    "title": "Hike",
                    "description": "Walk a trail",
                    "estimated_time": 120,
                    "suitable_for": ["children"]
                }],
                "rationale": "Fresh air"
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.suggestions.len(), 1);
        assert_eq!(parsed.suggestions[0].title, "Hike");
        assert_eq!(parsed.suggestions[0].estimated_time, Some(120));
        assert_eq!(parsed.rationale, "Fresh air");
    }

    #[test]
    fn parse_leaves_missing_fields_absent() {
        let parsed =
            parse_activity_json(r#"{"suggestions":[{"title":"Read together"}]}"#).unwrap();
        let suggestion = &parsed.suggestions[0];
        assert_eq!(suggestion.title, "Read together");
        assert!(suggestion.description.is_empty());
        assert!(suggestion.estimated_time.is_none());
        assert!(suggestion.suitable_for.is_none());
        assert!(parsed.rationale.is_empty());
    }

    #[test]
    fn parse_keeps_empty_suggestions_empty() {
        // An empty-but-valid array is a real answer, not a parse failure
        let parsed = parse_activity_json(r#"{"suggestions":[],"rationale":"none fit"}"#).unwrap();
        assert!(parsed.suggestions.is_empty());
        assert_eq!(parsed.rationale, "none fit");
    }

    #[test]
    fn parse_rejects_prose() {
        assert!(parse_activity_json("Here are some fun ideas for your family!").is_err());
    }

    #[test]
    fn canned_default_is_fixed() {
        let fallback = fallback_suggestions();
        assert_eq!(fallback.suggestions.len(), 1);
        let s = &fallback.suggestions[0];
        assert_eq!(s.title, "Family Game Time");
        assert_eq!(s.description, "Play board games or card games together");
        assert_eq!(s.estimated_time, Some(60));
        assert_eq!(s.suitable_for, Some(vec!["all ages".to_string()]));
        assert_eq!(
            fallback.rationale,
            "These are general family activities that work for most situations"
        );
    }

    #[test]
    fn system_prompt_demands_json_shape() {
        assert!(SYSTEM_PROMPT.contains("\"suggestions\""));
        assert!(SYSTEM_PROMPT.contains("\"rationale\""));
        assert!(SYSTEM_PROMPT.contains("3-5 suggestions"));
    }
}
