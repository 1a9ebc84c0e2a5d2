use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Sicha,
    #[serde(alias = "igros_kodesh", alias = "letter")]
    Igros,
    #[serde(alias = "halachic", alias = "rambam", alias = "shulchan_aruch")]
    Halacha,
    #[serde(other)]
    Other,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sicha => "sicha",
            Self::Igros => "igros",
            Self::Halacha => "halacha",
            Self::Other => "other",
        }
    }
}

/// A citation found by the research step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub citation: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prophecy {
    pub prophecy: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub fulfillment: String,
}

/// Current events mapped onto teachings by the context step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMapping {
    #[serde(default)]
    pub current_events: Vec<String>,
    #[serde(default)]
    pub rebbe_prophecies: Vec<Prophecy>,
    #[serde(default)]
    pub relevant_sichos: Vec<String>,
}

impl ContextMapping {
    pub fn is_empty(&self) -> bool {
        self.current_events.is_empty()
            && self.rebbe_prophecies.is_empty()
            && self.relevant_sichos.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Opening,
    #[serde(alias = "main")]
    MainPoint,
    #[serde(alias = "practical_application")]
    Application,
    Closing,
}

impl SectionKind {
    pub fn heading(self) -> &'static str {
        match self {
            Self::Opening => "Opening",
            Self::MainPoint => "Main point",
            Self::Application => "Practical application",
            Self::Closing => "Closing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSection {
    pub kind: SectionKind,
    #[serde(default)]
    pub title: String,
    pub duration_seconds: u32,
    pub text: String,
    #[serde(default)]
    pub citations: Vec<String>,
}

/// Timed sections drafted by the content step, plus their rendered text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftedContent {
    #[serde(default)]
    pub sections: Vec<ContentSection>,
    #[serde(default)]
    pub english_text: String,
}

impl DraftedContent {
    pub fn from_sections(sections: Vec<ContentSection>) -> Self {
        let english_text = render_sections(&sections);
        Self {
            sections,
            english_text,
        }
    }

    pub fn total_duration_seconds(&self) -> u32 {
        self.sections
            .iter()
            .map(|section| section.duration_seconds)
            .sum()
    }

    pub fn citations(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for citation in self.sections.iter().flat_map(|s| s.citations.iter()) {
            if !seen.contains(&citation.as_str()) {
                seen.push(citation.as_str());
            }
        }
        seen
    }
}

fn render_sections(sections: &[ContentSection]) -> String {
    sections
        .iter()
        .map(|section| {
            let heading = if section.title.trim().is_empty() {
                section.kind.heading().to_string()
            } else {
                format!("{}: {}", section.kind.heading(), section.title.trim())
            };
            let mut block = format!(
                "## {heading} ({})\n\n{}",
                format_timing(section.duration_seconds),
                section.text.trim()
            );
            if !section.citations.is_empty() {
                block.push_str("\n\nSources: ");
                block.push_str(&section.citations.join("; "));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_timing(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Active,
    Broken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCheck {
    pub url: String,
    pub status: LinkStatus,
    #[serde(default)]
    pub http_status: Option<u16>,
    pub checked_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkReport {
    #[serde(default)]
    pub verified: Vec<LinkCheck>,
    #[serde(default)]
    pub broken: Vec<String>,
}

impl LinkReport {
    pub fn from_checks(checks: Vec<LinkCheck>) -> Self {
        let broken = checks
            .iter()
            .filter(|check| check.status == LinkStatus::Broken)
            .map(|check| check.url.clone())
            .collect();
        Self {
            verified: checks,
            broken,
        }
    }
}

/// Term mappings in both directions plus terms kept untranslated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationSet {
    #[serde(default)]
    pub hebrew_to_english: BTreeMap<String, String>,
    #[serde(default)]
    pub english_to_hebrew: BTreeMap<String, String>,
    #[serde(default, alias = "chassidic_terms")]
    pub preserved_terms: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(kind: SectionKind, seconds: u32, citations: &[&str]) -> ContentSection {
        ContentSection {
            kind,
            title: String::new(),
            duration_seconds: seconds,
            text: format!("{} text", kind.heading()),
            citations: citations.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn drafted_content_renders_timing_cues_and_sources() {
        let content = DraftedContent::from_sections(vec![
            section(SectionKind::Opening, 60, &[]),
            section(SectionKind::MainPoint, 210, &["Likkutei Sichos 5:1"]),
            section(SectionKind::Closing, 30, &["Likkutei Sichos 5:1"]),
        ]);
        assert!(content.english_text.starts_with("## Opening (1:00)"));
        assert!(content.english_text.contains("## Main point (3:30)"));
        assert!(content
            .english_text
            .contains("Sources: Likkutei Sichos 5:1"));
        assert_eq!(content.total_duration_seconds(), 300);
        assert_eq!(content.citations(), vec!["Likkutei Sichos 5:1"]);
    }

    #[test]
    fn link_report_collects_broken_urls() {
        let report = LinkReport::from_checks(vec![
            LinkCheck {
                url: "https://a.example".to_string(),
                status: LinkStatus::Active,
                http_status: Some(200),
                checked_at: "2024-12-19T00:00:00+00:00".to_string(),
            },
            LinkCheck {
                url: "https://b.example".to_string(),
                status: LinkStatus::Broken,
                http_status: Some(404),
                checked_at: "2024-12-19T00:00:00+00:00".to_string(),
            },
        ]);
        assert_eq!(report.broken, vec!["https://b.example".to_string()]);
        assert_eq!(report.verified.len(), 2);
    }

    #[test]
    fn source_type_accepts_model_spellings() {
        let record: SourceRecord = serde_json::from_str(
            r#"{"type":"igros_kodesh","citation":"Igros Kodesh vol. 3, 512"}"#,
        )
        .expect("record");
        assert_eq!(record.source_type, SourceType::Igros);
        assert!(record.url.is_none());

        let other: SourceRecord =
            serde_json::from_str(r#"{"type":"midrash","citation":"Bereishis Rabbah 1:1"}"#)
                .expect("other");
        assert_eq!(other.source_type, SourceType::Other);
    }
}
