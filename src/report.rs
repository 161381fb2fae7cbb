//! Output formatting for analysis results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: the full analysis result plus insights for programmatic consumption

use colored::*;
use serde::Serialize;
use std::path::Path;

use crate::analyzer::AnalysisResult;
use crate::history::{CoChange, Commit, FileOwnership};
use crate::insights::{Insights, RiskLevel};
use crate::paths::relative_slash_path;

/// Rows shown per section in pretty output.
const PRETTY_LIMIT: usize = 10;

// =============================================================================
// JSON Format
// =============================================================================

#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub version: &'static str,
    #[serde(flatten)]
    pub result: &'a AnalysisResult,
    pub insights: &'a Insights,
}

/// Render the analysis as pretty-printed JSON.
pub fn render_json(result: &AnalysisResult, insights: &Insights) -> anyhow::Result<String> {
    let report = JsonReport {
        version: env!("CARGO_PKG_VERSION"),
        result,
        insights,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

pub fn write_json(result: &AnalysisResult, insights: &Insights) -> anyhow::Result<()> {
    println!("{}", render_json(result, insights)?);
    Ok(())
}

/// History of one file, as printed by the `history` command.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHistoryReport {
    pub file: String,
    pub ownership: FileOwnership,
    pub change_frequency: f64,
    pub co_changes: Vec<CoChange>,
    pub commits: Vec<Commit>,
}

pub fn write_history_json(report: &FileHistoryReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in colored pretty format.
pub fn write_pretty(result: &AnalysisResult, insights: &Insights) {
    let root = result.root.as_path();

    // Header
    println!();
    print!("  ");
    print!("{}", "archscope".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Repository: ".dimmed());
    println!("{}", root.display());
    print!("  {}", "Files:      ".dimmed());
    println!(
        "{}  ({} imports resolved)",
        result.total_files,
        result.call_graph.edge_count()
    );
    println!();

    write_languages(result);
    write_contributors(result);
    write_risky_files(root, insights);
    write_features(insights);
    write_dead_code(root, result);
}

fn write_languages(result: &AnalysisResult) {
    if result.language_stats.is_empty() {
        return;
    }
    println!("  {}", "Languages:".bold());
    for (language, stats) in &result.language_stats {
        println!(
            "    {:<12} {:>5} files {:>8} lines {:>10} bytes",
            language.as_str(),
            stats.count,
            stats.total_lines,
            stats.total_size
        );
    }
    println!();
}

fn write_contributors(result: &AnalysisResult) {
    if result.top_contributors.is_empty() {
        println!("  {}", "No git history available".dimmed());
        println!();
        return;
    }
    println!("  {}", "Top contributors:".bold());
    for c in &result.top_contributors {
        println!(
            "    {:<24} {:>5} commits {:>5} files owned",
            c.name.blue(),
            c.commits,
            c.files_owned
        );
    }
    println!();
}

fn write_risky_files(root: &Path, insights: &Insights) {
    let risky: Vec<_> = insights
        .at_least(RiskLevel::Medium)
        .take(PRETTY_LIMIT)
        .collect();
    if risky.is_empty() {
        return;
    }

    println!("  {}:", "Riskiest files".bold());
    println!();
    for f in risky {
        write_level_tag(f.risk.level);
        print!(" ");
        write_colored_score(f.risk.score);
        print!("  {:<10}", f.category.as_str().dimmed());
        println!("{}", display_path(root, &f.path).blue());

        let factors: Vec<String> = f
            .risk
            .factors
            .iter()
            .map(|(name, pts)| format!("{name} +{pts}"))
            .collect();
        println!("            {}", factors.join(", ").dimmed());
    }
    println!();
}

fn write_features(insights: &Insights) {
    if insights.features.is_empty() {
        return;
    }
    println!("  {}", "Features:".bold());
    for feature in &insights.features {
        println!(
            "    {:<20} {:>4} files {:>7} lines  risk {:>5.1}  {}",
            feature.name,
            feature.files.len(),
            feature.total_lines,
            feature.average_risk,
            feature.contributors.join(", ").dimmed()
        );
    }
    println!();
}

fn write_dead_code(root: &Path, result: &AnalysisResult) {
    if result.dead_code.is_empty() {
        println!("  {}", "✓ No unreferenced files".green());
        println!();
        return;
    }

    println!(
        "  {} ({}):",
        "Possibly unused files".bold(),
        result.dead_code.len()
    );
    println!();
    for entry in &result.dead_code {
        print!("    {:<8}", entry.confidence.to_string().yellow());
        println!("{}", display_path(root, &entry.path).blue());
        println!(
            "            {} {}",
            entry.reason.dimmed(),
            format!("[{}]", entry.exports.join(", ")).dimmed()
        );
    }
    println!();
}

/// Write one file's history in pretty format.
pub fn write_history_pretty(report: &FileHistoryReport) {
    println!();
    print!("  {}", "File: ".dimmed());
    println!("{}", report.file.blue());
    println!();

    let ownership = &report.ownership;
    print!("  Primary owner: ");
    println!("{}", ownership.primary.bold());
    println!(
        "  Commits: {}  Change frequency: {:.3}/day",
        ownership.total_commits, report.change_frequency
    );
    for c in &ownership.contributors {
        println!("    {:<24} {:>5}", c.name, c.commits);
    }
    println!();

    if !report.co_changes.is_empty() {
        println!("  {}", "Changed together with:".bold());
        for c in &report.co_changes {
            println!(
                "    {:>5.0}%  {:>4}x  {}",
                c.correlation * 100.0,
                c.count,
                c.file.blue()
            );
        }
        println!();
    }

    if !report.commits.is_empty() {
        println!("  {}", "Recent commits:".bold());
        for commit in report.commits.iter().take(PRETTY_LIMIT) {
            let short = commit.hash.get(..8).unwrap_or(&commit.hash);
            println!(
                "    {}  {}  {:<20} {}",
                short.yellow(),
                commit.date.dimmed(),
                commit.author,
                commit.message
            );
        }
        println!();
    }
}

fn write_colored_score(s: i32) {
    let text = format!("{s:>3}");
    match RiskLevel::from_score(s) {
        RiskLevel::Low => print!("{}", text.green()),
        RiskLevel::Medium => print!("{}", text.yellow()),
        RiskLevel::High => print!("{}", text.yellow().bold()),
        RiskLevel::Critical => print!("{}", text.red()),
    }
}

fn write_level_tag(level: RiskLevel) {
    match level {
        RiskLevel::Critical => print!("    {}", "CRIT".red()),
        RiskLevel::High => print!("    {}", "HIGH".yellow()),
        RiskLevel::Medium => print!("    {}", "MED ".blue()),
        RiskLevel::Low => print!("    {}", "LOW ".dimmed()),
    }
}

fn display_path(root: &Path, path: &Path) -> String {
    relative_slash_path(root, path).unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{AnalyzeOptions, RepositoryAnalyzer};
    use crate::config::AnalyzerConfig;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_json_report_shape() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.js"), "const b = require('./b');\n").unwrap();
        fs::write(temp.path().join("b.js"), "module.exports = { run };\n").unwrap();

        let analyzer = RepositoryAnalyzer::new(temp.path(), AnalyzerConfig::default()).unwrap();
        let options = AnalyzeOptions {
            cochange: false,
            ..AnalyzeOptions::default()
        };
        let result = analyzer.analyze(&options).await.unwrap();
        let insights = Insights::from_result(&result);

        let json: serde_json::Value =
            serde_json::from_str(&render_json(&result, &insights).unwrap()).unwrap();
        assert_eq!(json["totalFiles"], 2);
        assert_eq!(json["languageStats"]["javascript"]["count"], 2);
        assert!(json["files"][0]["calls"].is_array());
        assert!(json["files"][0]["ownership"]["primary"].is_string());
        assert!(json["insights"]["files"].is_array());

        let b = result.root.join("b.js").to_string_lossy().into_owned();
        assert_eq!(json["callGraph"][b.as_str()]["calledBy"].as_array().unwrap().len(), 1);
    }
}
