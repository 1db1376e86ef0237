//! Turning raw model output into suggestions

use serde_json::Value;

use crate::error::GenerateError;
use crate::models::{ActivityDuration, Category, SUGGESTION_COUNT, Suggestion};

pub const PLACEHOLDER_TITLE: &str = "Quick refresh break";
pub const PLACEHOLDER_DESCRIPTION: &str = "Take a few minutes to step away and reset.";

/// Drop every ``` fence marker and the language tag glued to it, keeping the
/// text on either side.
fn strip_code_fence(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("```") {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 3..];
        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        rest = &rest[tag_len..];
    }
    out.push_str(rest);
    out.trim().to_string()
}

/// The first `[` that opens a complete JSON array
fn first_json_array(text: &str) -> Result<Vec<Value>, GenerateError> {
    let mut saw_bracket = false;
    for (pos, _) in text.match_indices('[') {
        saw_bracket = true;
        let mut stream = serde_json::Deserializer::from_str(&text[pos..]).into_iter::<Value>();
        if let Some(Ok(Value::Array(items))) = stream.next() {
            return Ok(items);
        }
    }

    if saw_bracket {
        Err(GenerateError::Parse("response holds no valid JSON array".to_string()))
    } else {
        Err(GenerateError::Parse("no JSON array found in response".to_string()))
    }
}

fn text_field(item: &Value, field: &str) -> Option<String> {
    item.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn to_suggestion(item: &Value, duration: ActivityDuration) -> Suggestion {
    let category = item
        .get("category")
        .and_then(Value::as_str)
        .and_then(Category::from_label)
        .unwrap_or_default();

    let steps = match item.get("steps") {
        Some(Value::Array(steps)) => steps
            .iter()
            .map(|step| match step {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    };

    Suggestion {
        id: Suggestion::fresh_id("gen"),
        title: text_field(item, "title").unwrap_or_else(|| PLACEHOLDER_TITLE.to_string()),
        description: text_field(item, "description")
            .unwrap_or_else(|| PLACEHOLDER_DESCRIPTION.to_string()),
        duration,
        category,
        steps,
    }
}

/// Parse generated text into at most three suggestions carrying the
/// requested duration.
pub fn parse_suggestions(
    text: &str,
    duration: ActivityDuration,
) -> Result<Vec<Suggestion>, GenerateError> {
    let items = match first_json_array(&strip_code_fence(text)) {
        Ok(items) => items,
        Err(_) => first_json_array(text)?,
    };
    if items.is_empty() {
        return Err(GenerateError::Parse("response array is empty".to_string()));
    }

    Ok(items
        .iter()
        .take(SUGGESTION_COUNT)
        .map(|item| to_suggestion(item, duration))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_array() {
        let text = r#"```json
[
  {"title": "Box breathing", "description": "Breathe in for four.",
   "category": "behavioral", "steps": ["In", "Hold", "Out"]},
  {"title": "Name it", "description": "Label the feeling.", "category": "cognitive", "steps": []}
]
```"#;
        let suggestions = parse_suggestions(text, ActivityDuration::Fifteen).unwrap();

        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].title, "Box breathing");
        assert_eq!(suggestions[0].category, Category::Behavioral);
        assert_eq!(suggestions[0].steps, vec!["In", "Hold", "Out"]);
        assert_eq!(suggestions[1].category, Category::Cognitive);
        assert!(suggestions.iter().all(|s| s.duration == ActivityDuration::Fifteen));
        assert!(suggestions.iter().all(|s| s.id.starts_with("gen-")));
    }

    #[test]
    fn test_parse_array_surrounded_by_prose() {
        let text = "Sure [here you go]: [{\"title\": \"Walk\"}] Enjoy!";
        let suggestions = parse_suggestions(text, ActivityDuration::Five).unwrap();

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].title, "Walk");
    }

    #[test]
    fn test_parse_takes_at_most_three() {
        let text = r#"[{"title":"a"},{"title":"b"},{"title":"c"},{"title":"d"},{"title":"e"}]"#;
        let suggestions = parse_suggestions(text, ActivityDuration::Five).unwrap();

        let titles: Vec<_> = suggestions.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_fills_defaults() {
        let text = r#"[{"steps": "not a list", "category": "mystery"}, 42]"#;
        let suggestions = parse_suggestions(text, ActivityDuration::Thirty).unwrap();

        assert_eq!(suggestions.len(), 2);
        for s in &suggestions {
            assert_eq!(s.title, PLACEHOLDER_TITLE);
            assert_eq!(s.description, PLACEHOLDER_DESCRIPTION);
            assert_eq!(s.category, Category::Cognitive);
            assert!(s.steps.is_empty());
        }
    }

    #[test]
    fn test_parse_ids_are_unique() {
        let text = r#"[{"title":"a"},{"title":"a"}]"#;
        let suggestions = parse_suggestions(text, ActivityDuration::Five).unwrap();
        assert_ne!(suggestions[0].id, suggestions[1].id);
    }

    #[test]
    fn test_parse_without_array_fails() {
        let err =
            parse_suggestions("I cannot help with that.", ActivityDuration::Five).unwrap_err();
        assert!(matches!(err, GenerateError::Parse(ref msg) if msg.contains("no JSON array")));
    }

    #[test]
    fn test_parse_invalid_json_fails() {
        let err = parse_suggestions("[{\"title\": \"cut off", ActivityDuration::Five).unwrap_err();
        assert!(matches!(err, GenerateError::Parse(ref msg) if msg.contains("no valid JSON")));
    }

    #[test]
    fn test_parse_empty_array_fails() {
        let err = parse_suggestions("```json\n[]\n```", ActivityDuration::Five).unwrap_err();
        assert!(matches!(err, GenerateError::Parse(ref msg) if msg.contains("empty")));
    }

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```\n[2]\n```"), "[2]");
        assert_eq!(strip_code_fence("intro\n```json\n[3]\n```\noutro"), "intro\n\n[3]\n\noutro");
        assert_eq!(strip_code_fence("  [4]  "), "[4]");
        assert_eq!(strip_code_fence("```json [5] ```"), "[5]");
    }

    #[test]
    fn test_parse_single_line_fence() {
        let text = "```json [{\"title\":\"a\"}] ```";
        let suggestions = parse_suggestions(text, ActivityDuration::Five).unwrap();

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].title, "a");
    }

    #[test]
    fn test_parse_array_opening_on_fence_line() {
        let text = "```json [\n{\"title\":\"a\"},\n{\"title\":\"b\"}\n]\n```";
        let suggestions = parse_suggestions(text, ActivityDuration::Five).unwrap();

        let titles: Vec<_> = suggestions.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_bare_array_with_stray_closing_fence() {
        let text = "[{\"title\":\"a\"}]\n```";
        let suggestions = parse_suggestions(text, ActivityDuration::Five).unwrap();

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].title, "a");
    }

    #[test]
    fn test_parse_keeps_text_beside_fences() {
        let text = "Here you go:\n```\n[{\"title\":\"a\"}]\n```\nEnjoy";
        let suggestions = parse_suggestions(text, ActivityDuration::Thirty).unwrap();

        assert_eq!(suggestions[0].title, "a");
        assert_eq!(suggestions[0].duration, ActivityDuration::Thirty);
    }
}
