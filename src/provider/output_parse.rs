use crate::provider::ProviderError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Finds the first JSON object embedded in a completion. Models wrap payloads
/// in prose or ```json fences; both are tolerated.
pub fn extract_json_object(output: &str) -> Result<Map<String, Value>, ProviderError> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Err(ProviderError::ParseFailure {
            reason: "completion was empty".to_string(),
        });
    }

    let mut last_error = None;
    for (start, _) in trimmed.match_indices('{') {
        let Some(candidate) = balanced_object(&trimmed[start..]) else {
            continue;
        };
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => return Ok(map),
            Ok(_) => continue,
            Err(err) => last_error = Some(err.to_string()),
        }
    }

    Err(ProviderError::ParseFailure {
        reason: match last_error {
            Some(err) => format!("embedded json object is invalid: {err}"),
            None => "completion contains no json object".to_string(),
        },
    })
}

pub fn parse_embedded<T: DeserializeOwned>(output: &str) -> Result<T, ProviderError> {
    let object = extract_json_object(output)?;
    serde_json::from_value(Value::Object(object)).map_err(|err| ProviderError::ParseFailure {
        reason: format!("json does not match expected schema: {err}"),
    })
}

fn balanced_object(input: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in input.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&input[..=idx]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Plan {
        search_terms: Vec<String>,
    }

    #[test]
    fn parses_fenced_json_after_prose() {
        let output = "Here is the plan:\n```json\n{\"search_terms\": [\"chanukah\", \"hermon\"]}\n```\nLet me know.";
        let plan: Plan = parse_embedded(output).expect("plan");
        assert_eq!(plan.search_terms, vec!["chanukah", "hermon"]);
    }

    #[test]
    fn braces_inside_strings_do_not_break_matching() {
        let output = r#"{"search_terms": ["a } b", "{c"]} trailing"#;
        let plan: Plan = parse_embedded(output).expect("plan");
        assert_eq!(plan.search_terms, vec!["a } b", "{c"]);
    }

    #[test]
    fn skips_non_json_braces_before_payload() {
        let output = r#"Using {placeholders} first, then {"search_terms": []}"#;
        let plan: Plan = parse_embedded(output).expect("plan");
        assert!(plan.search_terms.is_empty());
    }

    #[test]
    fn missing_or_mismatched_json_is_a_parse_failure() {
        let err = extract_json_object("no structure here").expect_err("missing");
        assert!(err.to_string().contains("no json object"));

        let err = parse_embedded::<Plan>(r#"{"terms": []}"#).expect_err("schema");
        assert!(err.to_string().contains("expected schema"));

        assert!(extract_json_object("   ").is_err());
    }
}
