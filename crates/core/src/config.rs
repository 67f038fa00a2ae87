//! Detector configuration.
//!
//! Every heuristic threshold lives here rather than in the detection code, so
//! behavior can be tuned per deployment. The defaults were calibrated against
//! the reference fixtures in `tests/detection.rs`.
//!
//! Configuration files may be YAML or JSON and only need to name the values
//! they override:
//!
//! ```yaml
//! titleSparsity: 0.25
//! maxHeaderRows: 4
//! archetypeThresholds:
//!   pivot: 0.6
//! rateKeywords: [MoM, YoY, 环比, 同比]
//! ```

use crate::archetype::Archetype;
use crate::error::{ConfigError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Minimum signal an archetype must exceed when no override is configured.
pub const DEFAULT_ARCHETYPE_THRESHOLD: f64 = 0.5;

/// Immutable detector settings, shared read-only across detections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectorConfig {
    /// Rows whose occupancy ratio is at or below this are title-like.
    pub title_sparsity: f64,
    /// Occupancy ratio a row must exceed to start the table region.
    pub data_density: f64,
    /// Minimum share of text cells in a header row.
    pub header_text_threshold: f64,
    /// Minimum share of numeric/date cells in the row after the header.
    pub header_data_shift_threshold: f64,
    pub max_header_rows: usize,
    pub max_title_scan: usize,
    /// Per-archetype minimum signal. Missing entries use
    /// [`DEFAULT_ARCHETYPE_THRESHOLD`].
    pub archetype_thresholds: IndexMap<Archetype, f64>,
    pub budget_keywords: BudgetKeywords,
    pub rate_keywords: Vec<String>,
    /// Upper bound on distinct row labels for a pivot's first column.
    pub pivot_max_categories: usize,
    pub scoring: ScoringConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            title_sparsity: 0.3,
            data_density: 0.6,
            header_text_threshold: 0.7,
            header_data_shift_threshold: 0.5,
            max_header_rows: 3,
            max_title_scan: 10,
            archetype_thresholds: Archetype::PRIORITY
                .iter()
                .filter(|archetype| **archetype != Archetype::Standard)
                .map(|archetype| (*archetype, DEFAULT_ARCHETYPE_THRESHOLD))
                .collect(),
            budget_keywords: BudgetKeywords::default(),
            rate_keywords: strings(&["MoM", "YoY", "环比", "同比", "增长率", "growth rate"]),
            pivot_max_categories: 50,
            scoring: ScoringConfig::default(),
        }
    }
}

/// Keyword sets for the three columns of a budget-vs-actual table.
///
/// Matching is a case-insensitive substring test on the leaf header label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetKeywords {
    pub budget: Vec<String>,
    pub actual: Vec<String>,
    pub variance: Vec<String>,
}

impl Default for BudgetKeywords {
    fn default() -> Self {
        Self {
            budget: strings(&["budget", "预算", "planned", "计划"]),
            actual: strings(&["actual", "实际"]),
            variance: strings(&["variance", "差异", "偏差", "diff"]),
        }
    }
}

/// Weights of the confidence formula
/// `base + header_weight * header_fit + archetype_weight * signal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringConfig {
    pub base: f64,
    pub header_weight: f64,
    pub archetype_weight: f64,
    /// Header fit used when no density shift was found.
    pub fallback_header_fit: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base: 0.4,
            header_weight: 0.3,
            archetype_weight: 0.3,
            fallback_header_fit: 0.6,
        }
    }
}

impl DetectorConfig {
    /// Threshold an archetype's signal must exceed to win.
    pub fn threshold(&self, archetype: Archetype) -> f64 {
        self.archetype_thresholds
            .get(&archetype)
            .copied()
            .unwrap_or(DEFAULT_ARCHETYPE_THRESHOLD)
    }

    /// Check ranges and required keyword lists.
    pub fn validate(&self) -> Result<()> {
        let ratios = [
            ("titleSparsity", self.title_sparsity),
            ("dataDensity", self.data_density),
            ("headerTextThreshold", self.header_text_threshold),
            ("headerDataShiftThreshold", self.header_data_shift_threshold),
            ("scoring.base", self.scoring.base),
            ("scoring.headerWeight", self.scoring.header_weight),
            ("scoring.archetypeWeight", self.scoring.archetype_weight),
            ("scoring.fallbackHeaderFit", self.scoring.fallback_header_fit),
        ];
        for (field, value) in ratios {
            check_ratio(field, value)?;
        }
        for (archetype, value) in &self.archetype_thresholds {
            check_ratio(&format!("archetypeThresholds.{archetype}"), *value)?;
        }

        if self.max_header_rows == 0 {
            return Err(ConfigError::invalid("maxHeaderRows", "must be at least 1"));
        }
        if self.max_title_scan == 0 {
            return Err(ConfigError::invalid("maxTitleScan", "must be at least 1"));
        }
        if self.pivot_max_categories == 0 {
            return Err(ConfigError::invalid(
                "pivotMaxCategories",
                "must be at least 1",
            ));
        }

        let keyword_sets = [
            ("budgetKeywords.budget", &self.budget_keywords.budget),
            ("budgetKeywords.actual", &self.budget_keywords.actual),
            ("budgetKeywords.variance", &self.budget_keywords.variance),
            ("rateKeywords", &self.rate_keywords),
        ];
        for (field, keywords) in keyword_sets {
            if keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(ConfigError::invalid(field, "needs at least one keyword"));
            }
        }

        Ok(())
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, choosing the format by extension
    /// (`.yaml`, `.yml` or `.json`).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let content = std::fs::read_to_string(path)?;
        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&content),
            "json" => Self::from_json_str(&content),
            other => Err(ConfigError::UnsupportedFormat(format!(
                "{} (extension '{other}')",
                path.display()
            ))),
        }
    }
}

fn check_ratio(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("{value} is outside [0, 1]"),
        ))
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| (*s).to_string()).collect()
}
