//! Confidence scoring.

use crate::archetype::Classification;
use crate::config::ScoringConfig;
use crate::header::HeaderBlock;

/// Suffix appended to the method when merged header cells shaped the columns.
pub const MERGED_HEADER_SUFFIX: &str = "+merged_header";

/// Final confidence and the name of the heuristic that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub confidence: f64,
    pub method: String,
}

/// How well the header boundary is supported: full marks for a density
/// shift, the configured fallback fit otherwise.
pub fn header_fit(header: &HeaderBlock, scoring: &ScoringConfig) -> f64 {
    if header.density_shift {
        1.0
    } else {
        scoring.fallback_header_fit
    }
}

/// `clamp(base + header_weight * header_fit + archetype_weight * signal)`,
/// rounded to four decimals.
pub fn score(
    scoring: &ScoringConfig,
    header_fit: f64,
    classification: &Classification,
    merged_header: bool,
) -> Score {
    let raw = scoring.base
        + scoring.header_weight * header_fit
        + scoring.archetype_weight * classification.signal;
    let confidence = (raw.clamp(0.0, 1.0) * 10_000.0).round() / 10_000.0;

    let mut method = classification.archetype.as_str().to_string();
    if merged_header {
        method.push_str(MERGED_HEADER_SUFFIX);
    }

    Score { confidence, method }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::{Archetype, STANDARD_SIGNAL};

    fn classification(archetype: Archetype, signal: f64) -> Classification {
        Classification { archetype, signal }
    }

    #[test]
    fn test_default_weights() {
        let scoring = ScoringConfig::default();
        let result = score(&scoring, 1.0, &classification(Archetype::Pivot, 1.0), false);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.method, "pivot");

        let result = score(
            &scoring,
            0.6,
            &classification(Archetype::Standard, STANDARD_SIGNAL),
            true,
        );
        assert_eq!(result.confidence, 0.73);
        assert_eq!(result.method, "standard+merged_header");
    }

    #[test]
    fn test_confidence_is_clamped() {
        let scoring = ScoringConfig {
            base: 0.9,
            ..ScoringConfig::default()
        };
        let result = score(&scoring, 1.0, &classification(Archetype::Pivot, 1.0), false);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_stronger_signal_never_lowers_confidence() {
        let scoring = ScoringConfig::default();
        let weak = score(&scoring, 1.0, &classification(Archetype::BudgetComparison, 0.67), false);
        let strong = score(&scoring, 1.0, &classification(Archetype::BudgetComparison, 1.0), false);
        assert!(strong.confidence >= weak.confidence);
    }

    #[test]
    fn test_header_fit() {
        let scoring = ScoringConfig::default();
        let matched = HeaderBlock {
            row_count: 1,
            density_shift: true,
            merge_extended: false,
        };
        let fallback = HeaderBlock {
            density_shift: false,
            ..matched
        };
        assert_eq!(header_fit(&matched, &scoring), 1.0);
        assert_eq!(header_fit(&fallback, &scoring), 0.6);
    }
}
