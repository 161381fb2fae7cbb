//! Risk scoring, categorization and feature grouping over an analysis
//! result. Pure functions; nothing here touches the disk or git.

mod category;
mod features;
mod risk;

use std::path::PathBuf;

use serde::Serialize;

use crate::analyzer::AnalysisResult;
use crate::paths::relative_slash_path;

pub use category::{categorize, FileCategory};
pub use features::{feature_key, identify_features, Feature, ROOT_FEATURE};
pub use risk::{levels, points, risk_score, RiskLevel, RiskScore, MAX_SCORE};

/// Risk and category of one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileInsight {
    pub path: PathBuf,
    pub category: FileCategory,
    pub risk: RiskScore,
}

/// Derived views of an [`AnalysisResult`].
#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    /// Sorted by descending risk score.
    pub files: Vec<FileInsight>,
    pub features: Vec<Feature>,
}

impl Insights {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let mut files: Vec<FileInsight> = result
            .files
            .iter()
            .map(|f| {
                let relative = relative_slash_path(&result.root, &f.analysis.path)
                    .unwrap_or_else(|| f.analysis.path.to_string_lossy().into_owned());
                FileInsight {
                    path: f.analysis.path.clone(),
                    category: categorize(&relative),
                    risk: risk_score(f),
                }
            })
            .collect();
        files.sort_by(|a, b| b.risk.score.cmp(&a.risk.score).then_with(|| a.path.cmp(&b.path)));

        Self {
            features: identify_features(&result.files, &result.call_graph, &result.root),
            files,
        }
    }

    /// Files at or above `level`.
    pub fn at_least(&self, level: RiskLevel) -> impl Iterator<Item = &FileInsight> {
        self.files.iter().filter(move |f| f.risk.level >= level)
    }
}
