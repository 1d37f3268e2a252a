//! Source mapping — generated C line → front-end source location.
//!
//! Each entry maps one physical line of the emitted translation unit back to
//! the statement origin the front-end recorded. The external contract is an
//! ordered JSON list; generated-line values must exactly match physical line
//! numbers in the emitted text, which the writer guarantees by recording
//! entries at emission time.

use gamec_ir::Origin;
use serde::{Deserialize, Serialize};

/// A complete source map for one generated translation unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceMap {
    pub entries: Vec<SourceMapEntry>,
}

/// A single entry: one generated C line → one front-end source position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMapEntry {
    /// 1-based physical line in the generated C text.
    pub generated_line: u32,
    /// Origin file as recorded by the front-end.
    pub file: String,
    /// 1-based origin line.
    pub line: u32,
    /// 1-based origin column.
    pub column: u32,
    /// The enclosing generated symbol (e.g. "scene_title_enter").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Debug-only source snippet, carried through unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one generated line against an origin.
    pub fn push(&mut self, generated_line: u32, origin: &Origin, symbol: Option<&str>) {
        self.entries.push(SourceMapEntry {
            generated_line,
            file: origin.file.clone(),
            line: origin.line,
            column: origin.column,
            symbol: symbol.map(str::to_string),
            snippet: origin.snippet.clone(),
        });
    }

    /// Look up the entry for a generated line, if any statement maps there.
    pub fn find_by_line(&self, generated_line: u32) -> Option<&SourceMapEntry> {
        self.entries
            .iter()
            .find(|e| e.generated_line == generated_line)
    }

    /// Serialize to JSON bytes. Entry order is emission order, so the bytes
    /// are as deterministic as the generated text itself.
    pub fn to_json(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Deserialize from JSON bytes.
    pub fn from_json(data: &[u8]) -> Option<Self> {
        serde_json::from_slice(data).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_json() {
        let mut map = SourceMap::new();
        map.push(12, &Origin::new("game.def", 4, 2), Some("scene_title_enter"));
        map.push(
            13,
            &Origin::new("game.def", 5, 2).with_snippet("score = 0"),
            Some("scene_title_enter"),
        );

        let json = map.to_json();
        let map2 = SourceMap::from_json(&json).expect("parse failed");
        assert_eq!(map2.entries.len(), 2);
        assert_eq!(map2.entries[0].generated_line, 12);
        assert_eq!(map2.entries[1].snippet.as_deref(), Some("score = 0"));
    }

    #[test]
    fn find_by_line() {
        let mut map = SourceMap::new();
        map.push(7, &Origin::new("game.def", 1, 1), None);
        assert!(map.find_by_line(7).is_some());
        assert!(map.find_by_line(8).is_none());
    }
}
