use crate::Origin;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Diagnostic category, determined by code range. One per validator pass
/// family so downstream tooling can filter and aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    Reference,
    Budget,
    Range,
    Duplicate,
    Structure,
}

/// Numeric diagnostic code (E100–E599).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DiagnosticCode(pub u16);

impl DiagnosticCode {
    // ── Reference (E100–E199) ──
    pub const UNRESOLVED_REFERENCE: Self = Self(100);

    // ── Resource budgets (E200–E299) ──
    pub const OAM_OVERFLOW: Self = Self(200);
    pub const SPRITE_PALETTE_COUNT: Self = Self(201);
    pub const BACKGROUND_PALETTE_COUNT: Self = Self(202);
    pub const PALETTE_SLOT_COLLISION: Self = Self(203);
    pub const WRAM_OVERFLOW: Self = Self(204);
    pub const OAM_NEAR_CAP: Self = Self(210);
    pub const WRAM_NEAR_BUDGET: Self = Self(211);
    pub const VRAM_TILE_OVERFLOW: Self = Self(212);

    // ── Numeric ranges (E300–E399) ──
    pub const COLOR_CHANNEL_RANGE: Self = Self(300);
    pub const COLOR_VALUE_RANGE: Self = Self(301);
    pub const ARRAY_INDEX_RANGE: Self = Self(302);
    pub const LOOP_INDEX_RANGE: Self = Self(303);
    pub const TWEEN_VALUE_RANGE: Self = Self(304);
    pub const TWEEN_DURATION: Self = Self(305);
    pub const MASS_NOT_POSITIVE: Self = Self(306);
    pub const UNPROVABLE_INDEX: Self = Self(310);
    pub const TWEEN_PRECISION_LOSS: Self = Self(311);
    pub const VELOCITY_CLAMP_RANGE: Self = Self(312);
    pub const PHYSICS_SANITY: Self = Self(313);

    // ── Duplicate declarations (E400–E499) ──
    pub const DUPLICATE_NAME: Self = Self(400);

    // ── Structure (E500–E599) ──
    pub const EMPTY_STATE_MACHINE: Self = Self(500);
    pub const PALETTE_COLOR_COUNT: Self = Self(501);
    pub const MISSING_START_SCENE: Self = Self(502);
    pub const POOL_CAPACITY_ZERO: Self = Self(503);
    pub const UNREACHABLE_STATE: Self = Self(510);

    /// Get the category for this code.
    pub fn category(self) -> DiagnosticCategory {
        match self.0 {
            100..=199 => DiagnosticCategory::Reference,
            200..=299 => DiagnosticCategory::Budget,
            300..=399 => DiagnosticCategory::Range,
            400..=499 => DiagnosticCategory::Duplicate,
            _ => DiagnosticCategory::Structure,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference => write!(f, "reference"),
            Self::Budget => write!(f, "budget"),
            Self::Range => write!(f, "range"),
            Self::Duplicate => write!(f, "duplicate"),
            Self::Structure => write!(f, "structure"),
        }
    }
}

/// A single validation finding.
///
/// The build layer renders these — it must not parse free-form strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Diagnostic code (e.g. E200).
    pub code: DiagnosticCode,
    pub severity: Severity,
    /// Category (derived from code).
    pub category: DiagnosticCategory,
    /// Human-readable message.
    pub message: String,
    /// Source coordinate, when the finding points at a tagged statement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
    /// Nearest-match fix suggestion (reference errors only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    /// Create a new error-severity diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Error,
            category: code.category(),
            message: message.into(),
            origin: None,
            suggestion: None,
        }
    }

    /// Create a new warning-severity diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, message)
        }
    }

    /// Attach a source coordinate.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Some(origin) => write!(
                f,
                "{}: {} [{}] {}",
                origin, self.code, self.category, self.message
            ),
            None => write!(f, "{} [{}] {}", self.code, self.category, self.message),
        }
    }
}

/// The accumulated validation report.
///
/// Every pass runs to completion against the same accumulator; there is no
/// short-circuiting, so one validation call surfaces every independent
/// problem. Unlike a front-end parser, the validator never caps the count —
/// the complete set of findings is the report's contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no errors were accumulated. Warnings do not affect validity.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error.
    pub fn push_error(&mut self, diagnostic: Diagnostic) {
        debug_assert_eq!(diagnostic.severity, Severity::Error);
        self.errors.push(diagnostic);
    }

    /// Add a warning.
    pub fn push_warning(&mut self, diagnostic: Diagnostic) {
        debug_assert_eq!(diagnostic.severity, Severity::Warning);
        self.warnings.push(diagnostic);
    }

    /// Throw-on-invalid convenience: `Ok(self)` when valid, otherwise one
    /// aggregated multi-line report listing every error, then every warning.
    pub fn into_result(self) -> Result<Self, InvalidGameError> {
        if self.is_valid() {
            return Ok(self);
        }
        let mut report = format!(
            "game validation failed with {} error{}",
            self.errors.len(),
            if self.errors.len() == 1 { "" } else { "s" }
        );
        for error in &self.errors {
            report.push_str(&format!("\n  error: {error}"));
        }
        for warning in &self.warnings {
            report.push_str(&format!("\n  warning: {warning}"));
        }
        Err(InvalidGameError { report })
    }
}

/// Aggregated failure raised by [`Diagnostics::into_result`].
#[derive(Debug, Error)]
#[error("{report}")]
pub struct InvalidGameError {
    pub report: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_category_ranges() {
        assert_eq!(
            DiagnosticCode::UNRESOLVED_REFERENCE.category(),
            DiagnosticCategory::Reference
        );
        assert_eq!(
            DiagnosticCode::OAM_OVERFLOW.category(),
            DiagnosticCategory::Budget
        );
        assert_eq!(
            DiagnosticCode::TWEEN_VALUE_RANGE.category(),
            DiagnosticCategory::Range
        );
        assert_eq!(
            DiagnosticCode::DUPLICATE_NAME.category(),
            DiagnosticCategory::Duplicate
        );
        assert_eq!(
            DiagnosticCode::EMPTY_STATE_MACHINE.category(),
            DiagnosticCategory::Structure
        );
    }

    #[test]
    fn test_code_display() {
        assert_eq!(format!("{}", DiagnosticCode::OAM_OVERFLOW), "E200");
        assert_eq!(format!("{}", DiagnosticCode::DUPLICATE_NAME), "E400");
    }

    #[test]
    fn test_report_validity() {
        let mut diags = Diagnostics::new();
        assert!(diags.is_valid());
        diags.push_warning(Diagnostic::warning(
            DiagnosticCode::UNREACHABLE_STATE,
            "state 'stunned' is unreachable",
        ));
        assert!(diags.is_valid(), "warnings alone must not invalidate");
        diags.push_error(Diagnostic::error(
            DiagnosticCode::OAM_OVERFLOW,
            "42 hardware sprites exceed the cap of 40",
        ));
        assert!(!diags.is_valid());
    }

    #[test]
    fn test_into_result_renders_all_findings() {
        let mut diags = Diagnostics::new();
        diags.push_error(Diagnostic::error(
            DiagnosticCode::DUPLICATE_NAME,
            "name 'score' declared twice",
        ));
        diags.push_error(Diagnostic::error(
            DiagnosticCode::MISSING_START_SCENE,
            "no start scene declared",
        ));
        diags.push_warning(Diagnostic::warning(
            DiagnosticCode::WRAM_NEAR_BUDGET,
            "static RAM at 85% of budget",
        ));

        let err = diags.into_result().unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("2 errors"));
        assert!(rendered.contains("'score' declared twice"));
        assert!(rendered.contains("no start scene declared"));
        assert!(rendered.contains("85% of budget"));
    }

    #[test]
    fn test_diagnostic_with_suggestion_json() {
        let d = Diagnostic::error(
            DiagnosticCode::UNRESOLVED_REFERENCE,
            "unknown sprite 'platfromer'",
        )
        .with_suggestion("Did you mean 'platformer'?");

        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"suggestion\""));
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code, DiagnosticCode::UNRESOLVED_REFERENCE);
        assert_eq!(back.suggestion.as_deref(), Some("Did you mean 'platformer'?"));
    }
}
