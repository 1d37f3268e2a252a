use serde::{Deserialize, Serialize};
use std::fmt;

/// Source coordinate of an IR statement.
///
/// Produced entirely by the authoring front-end; this core never synthesizes
/// origins, it only carries them through to the source map. Line/column values
/// are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin {
    pub file: String,
    pub line: u32,
    pub column: u32,
    /// The originating source text, attached only for debug builds of the
    /// front-end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Origin {
    /// Create a new origin without a snippet.
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            snippet: None,
        }
    }

    /// Attach the originating source text.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_display() {
        let o = Origin::new("game.def", 12, 5);
        assert_eq!(format!("{o}"), "game.def:12:5");
    }

    #[test]
    fn test_origin_snippet() {
        let o = Origin::new("game.def", 3, 1).with_snippet("spawn bullets");
        assert_eq!(o.snippet.as_deref(), Some("spawn bullets"));
    }

    #[test]
    fn test_origin_json_omits_missing_snippet() {
        let o = Origin::new("game.def", 1, 1);
        let json = serde_json::to_string(&o).unwrap();
        assert!(!json.contains("snippet"));
    }
}
