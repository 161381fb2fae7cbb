//! Per-file risk scoring.
//!
//! Adds up points for complexity, churn, coupling, bus factor, fan-in and
//! size, capped at 100.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analyzer::EnrichedFile;

/// Point weights for each risk factor.
pub mod points {
    pub const COMPLEXITY_HIGH: i32 = 10; // > 10
    pub const COMPLEXITY_VERY_HIGH: i32 = 20; // > 20
    pub const COMPLEXITY_EXTREME: i32 = 30; // > 50
    pub const CHURN: i32 = 10; // > 0.1 commits/day
    pub const CHURN_HIGH: i32 = 20; // > 0.5
    pub const CHURN_EXTREME: i32 = 25; // > 1
    pub const COUPLING: i32 = 10; // >= 3 co-changed files
    pub const BUS_FACTOR: i32 = 10; // one author, > 5 commits
    pub const FAN_IN: i32 = 10; // >= 5 importers
    pub const FAN_IN_HIGH: i32 = 15; // >= 10
    pub const SIZE: i32 = 10; // > 500 lines
    pub const SIZE_LARGE: i32 = 15; // > 1000
}

/// Level thresholds (inclusive upper bounds).
pub mod levels {
    pub const LOW_MAX: i32 = 25;
    pub const MEDIUM_MAX: i32 = 50;
    pub const HIGH_MAX: i32 = 75;
}

pub const MAX_SCORE: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s <= levels::LOW_MAX => RiskLevel::Low,
            s if s <= levels::MEDIUM_MAX => RiskLevel::Medium,
            s if s <= levels::HIGH_MAX => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskScore {
    /// 0-100, higher is riskier
    pub score: i32,
    pub level: RiskLevel,
    /// Points by factor; factors that scored nothing are left out
    pub factors: BTreeMap<String, i32>,
}

impl RiskScore {
    /// Points before capping.
    pub fn total_points(&self) -> i32 {
        self.factors.values().sum()
    }
}

/// Score one enriched file.
pub fn risk_score(file: &EnrichedFile) -> RiskScore {
    let mut factors = BTreeMap::new();
    let mut add = |name: &str, pts: i32| {
        if pts > 0 {
            factors.insert(name.to_string(), pts);
        }
    };

    add(
        "complexity",
        match file.analysis.complexity {
            c if c > 50 => points::COMPLEXITY_EXTREME,
            c if c > 20 => points::COMPLEXITY_VERY_HIGH,
            c if c > 10 => points::COMPLEXITY_HIGH,
            _ => 0,
        },
    );

    let freq = file.change_frequency;
    add(
        "change_frequency",
        if freq > 1.0 {
            points::CHURN_EXTREME
        } else if freq > 0.5 {
            points::CHURN_HIGH
        } else if freq > 0.1 {
            points::CHURN
        } else {
            0
        },
    );

    if file.co_changes.len() >= 3 {
        add("coupling", points::COUPLING);
    }

    let ownership = &file.ownership;
    if ownership.contributors.len() == 1 && ownership.total_commits > 5 {
        add("bus_factor", points::BUS_FACTOR);
    }

    add(
        "fan_in",
        match file.graph.called_by.len() {
            n if n >= 10 => points::FAN_IN_HIGH,
            n if n >= 5 => points::FAN_IN,
            _ => 0,
        },
    );

    add(
        "size",
        match file.analysis.lines {
            n if n > 1000 => points::SIZE_LARGE,
            n if n > 500 => points::SIZE,
            _ => 0,
        },
    );

    let score = factors.values().sum::<i32>().min(MAX_SCORE);
    RiskScore {
        score,
        level: RiskLevel::from_score(score),
        factors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::tests::sample;
    use crate::history::{ContributorCount, FileOwnership};
    use std::path::PathBuf;

    #[test]
    fn test_quiet_file_is_low() {
        let file = sample("/r/src/a.ts", "export const a = 1;\n");
        let risk = risk_score(&file);
        assert_eq!(risk.score, 0);
        assert_eq!(risk.level, RiskLevel::Low);
        assert!(risk.factors.is_empty());
    }

    #[test]
    fn test_points_add_up() {
        let mut file = sample("/r/src/a.ts", &"if (a) {}\n".repeat(25));
        file.change_frequency = 0.6;
        file.ownership = FileOwnership {
            primary: "Ann".into(),
            contributors: vec![ContributorCount {
                name: "Ann".into(),
                commits: 9,
            }],
            total_commits: 9,
        };
        file.graph.called_by = (0..5).map(|i| PathBuf::from(format!("/r/{i}.ts"))).collect();

        let risk = risk_score(&file);
        assert_eq!(risk.factors["complexity"], points::COMPLEXITY_VERY_HIGH);
        assert_eq!(risk.factors["change_frequency"], points::CHURN_HIGH);
        assert_eq!(risk.factors["bus_factor"], points::BUS_FACTOR);
        assert_eq!(risk.factors["fan_in"], points::FAN_IN);
        assert_eq!(risk.score, 60);
        assert_eq!(risk.level, RiskLevel::High);
    }

    #[test]
    fn test_score_is_capped() {
        let mut file = sample("/r/src/a.ts", &"if (a) {}\n".repeat(1200));
        file.change_frequency = 3.0;
        file.graph.called_by = (0..12).map(|i| PathBuf::from(format!("/r/{i}.ts"))).collect();
        file.co_changes = (0..3)
            .map(|i| crate::history::CoChange {
                file: format!("f{i}"),
                count: 1,
                correlation: 1.0,
            })
            .collect();
        file.ownership = FileOwnership {
            primary: "Ann".into(),
            contributors: vec![ContributorCount {
                name: "Ann".into(),
                commits: 6,
            }],
            total_commits: 6,
        };

        let risk = risk_score(&file);
        assert_eq!(risk.total_points(), 30 + 25 + 10 + 10 + 15 + 15);
        assert_eq!(risk.score, MAX_SCORE);
        assert_eq!(risk.level, RiskLevel::Critical);
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(RiskLevel::from_score(25), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(26), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(50), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(75), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(76), RiskLevel::Critical);
    }
}
