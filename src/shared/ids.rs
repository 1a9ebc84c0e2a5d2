use getrandom::getrandom;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

const SUFFIX_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 4;

pub fn validate_identifier_value(kind: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{kind} must be non-empty"));
    }
    if value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Ok(());
    }
    Err(format!(
        "{kind} must use only ASCII letters, digits, '-' or '_'"
    ))
}

macro_rules! define_id_type {
    ($name:ident, $kind:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn parse(raw: &str) -> Result<Self, String> {
                validate_identifier_value($kind, raw)?;
                Ok(Self(raw.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::parse(&raw).map_err(|err| {
                    D::Error::custom(format!("invalid {} `{}`: {}", $kind, raw, err))
                })
            }
        }
    };
}

define_id_type!(TaskId, "task id");

/// Builds `<task_type>_<unix seconds>_<suffix>`; the suffix keeps ids unique when
/// two tasks of the same type start within the same second.
pub fn generate_task_id(task_type: &str, now: i64) -> Result<TaskId, String> {
    let timestamp =
        u64::try_from(now).map_err(|_| "task id requires a non-negative timestamp".to_string())?;
    let mut bytes = [0_u8; SUFFIX_LEN];
    getrandom(&mut bytes).map_err(|err| format!("failed to generate task id suffix: {err}"))?;
    let suffix = bytes
        .iter()
        .map(|byte| SUFFIX_ALPHABET[(*byte as usize) % SUFFIX_ALPHABET.len()] as char)
        .collect::<String>();
    TaskId::parse(&format!("{task_type}_{timestamp}_{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_rejects_path_separators_and_empty_values() {
        assert!(TaskId::parse("").is_err());
        assert!(TaskId::parse("../etc").is_err());
        assert!(TaskId::parse("citation_only_17_abcd").is_ok());
    }

    #[test]
    fn generated_task_ids_carry_type_and_timestamp() {
        let id = generate_task_id("citation_only", 1_734_566_400).expect("id");
        assert!(id.as_str().starts_with("citation_only_1734566400_"));
        assert_eq!(id.as_str().len(), "citation_only_1734566400_".len() + SUFFIX_LEN);
    }

    #[test]
    fn generated_task_id_requires_non_negative_clock() {
        assert!(generate_task_id("citation_only", -1).is_err());
    }

    #[test]
    fn task_id_deserialization_validates() {
        let ok: TaskId = serde_json::from_str("\"dvar_torah_1_x\"").expect("valid");
        assert_eq!(ok.as_str(), "dvar_torah_1_x");
        let err = serde_json::from_str::<TaskId>("\"bad id\"").expect_err("invalid");
        assert!(err.to_string().contains("invalid task id"));
    }
}
