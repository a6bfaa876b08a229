use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("input path does not exist: {0}")]
    MissingInput(String),
    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),
    #[error("no test results found in input")]
    NoResults,
}

/// One executed test case, as recorded by the verification campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRecord {
    pub test_id: String,
    pub requirement_id: String,
    pub result: String,
    #[serde(default)]
    pub details: String,
}

impl TestRecord {
    /// Result strings come from several tools, so parsing is forgiving.
    pub fn passed(&self) -> bool {
        matches!(
            self.result.trim().to_lowercase().as_str(),
            "pass" | "passed" | "true" | "1" | "yes" | "y"
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub requirements_covered: usize,
    pub requirements_failed: Vec<String>,
}

pub fn load_records(input: &Path) -> Result<Vec<TestRecord>, ReportError> {
    if !input.exists() {
        return Err(ReportError::MissingInput(input.display().to_string()));
    }

    let records = if input.is_dir() {
        let mut records = Vec::new();
        let mut entries: Vec<_> = fs::read_dir(input)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|entry| entry.path())
            .collect();
        entries.sort();

        for path in entries {
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                match load_json_file(&path) {
                    Ok(loaded) => records.extend(loaded),
                    Err(e) => {
                        // A bad file in the evidence directory does not sink
                        // the whole run
                        warn!(path = %path.display(), error = %e, "skipping unreadable results file");
                    }
                }
            }
        }
        records
    } else {
        match input.extension().and_then(|ext| ext.to_str()) {
            Some("json") => load_json_file(input)?,
            Some("csv") => load_csv_file(input)?,
            other => {
                return Err(ReportError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        }
    };

    if records.is_empty() {
        return Err(ReportError::NoResults);
    }

    Ok(records)
}

/// One results file holds either a single record or an array of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonResults {
    Single(TestRecord),
    Many(Vec<TestRecord>),
}

fn load_json_file(path: &Path) -> Result<Vec<TestRecord>, ReportError> {
    let content = fs::read_to_string(path)?;
    match serde_json::from_str(&content)? {
        JsonResults::Single(record) => Ok(vec![record]),
        JsonResults::Many(records) => Ok(records),
    }
}

fn load_csv_file(path: &Path) -> Result<Vec<TestRecord>, ReportError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: TestRecord = result?;
        records.push(record);
    }
    Ok(records)
}

pub fn summarize(records: &[TestRecord]) -> ReportSummary {
    let passed = records.iter().filter(|r| r.passed()).count();

    let covered: BTreeSet<&str> = records.iter().map(|r| r.requirement_id.as_str()).collect();
    let failed_requirements: BTreeSet<&str> = records
        .iter()
        .filter(|r| !r.passed())
        .map(|r| r.requirement_id.as_str())
        .collect();

    ReportSummary {
        total: records.len(),
        passed,
        failed: records.len() - passed,
        requirements_covered: covered.len(),
        requirements_failed: failed_requirements.iter().map(|s| s.to_string()).collect(),
    }
}

/// Render the compliance report as Markdown.
pub fn render_markdown(records: &[TestRecord], summary: &ReportSummary) -> String {
    let mut out = String::new();

    out.push_str("# Safety Systems Compliance Report\n\n");
    out.push_str(&format!(
        "Generated: {}\n\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    out.push_str("## Summary\n\n");
    out.push_str(&format!("- Total test cases: {}\n", summary.total));
    out.push_str(&format!("- Passed: {}\n", summary.passed));
    out.push_str(&format!("- Failed: {}\n", summary.failed));
    out.push_str(&format!(
        "- Requirements covered: {}\n",
        summary.requirements_covered
    ));
    let verdict = if summary.failed == 0 {
        "COMPLIANT"
    } else {
        "NON-COMPLIANT"
    };
    out.push_str(&format!("- Overall verdict: **{}**\n\n", verdict));

    if !summary.requirements_failed.is_empty() {
        out.push_str("## Non-compliant Requirements\n\n");
        for requirement in &summary.requirements_failed {
            out.push_str(&format!("- {}\n", requirement));
        }
        out.push('\n');
    }

    out.push_str("## Test Results\n\n");
    out.push_str("| Test | Requirement | Result | Details |\n");
    out.push_str("|------|-------------|--------|---------|\n");
    for record in records {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            record.test_id,
            record.requirement_id,
            if record.passed() { "Pass" } else { "Fail" },
            record.details
        ));
    }

    out
}

pub fn generate_report(input: &Path, output: &Path) -> Result<ReportSummary, ReportError> {
    let records = load_records(input)?;
    let summary = summarize(&records);
    let markdown = render_markdown(&records, &summary);
    fs::write(output, markdown)?;
    Ok(summary)
}
