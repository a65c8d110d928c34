use serde::{Deserialize, Serialize};

/// Dataset summary returned by the scouting backend.
///
/// Every field is optional on the wire; a backend that only fills in a
/// summary still yields a valid result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoutResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(
        rename = "relevancyExplained",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub relevancy_explained: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools_used: Vec<String>,
}

impl ScoutResult {
    /// Result carrying nothing but a summary, used when the backend
    /// answered with text that is not JSON.
    pub fn from_summary(summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        non_blank(&self.summary).is_none()
            && non_blank(&self.relevancy_explained).is_none()
            && self.sources.is_empty()
            && self.tools_used.is_empty()
    }

    /// Flatten summary, relevancy and sources into one readable block.
    pub fn to_content(&self) -> String {
        let mut parts = Vec::new();

        if let Some(summary) = non_blank(&self.summary) {
            parts.push(summary.to_string());
        }

        if let Some(relevancy) = non_blank(&self.relevancy_explained) {
            parts.push(format!("Why it's relevant: {}", relevancy));
        }

        let sources: Vec<&str> = self
            .sources
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if !sources.is_empty() {
            let list = sources
                .iter()
                .map(|s| format!("- {}", s))
                .collect::<Vec<_>>()
                .join("\n");
            parts.push(format!("Sources:\n{}", list));
        }

        parts.join("\n\n")
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
