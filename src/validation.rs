//! Consistency checks for a decoded report.
//!
//! Provides detailed validation with helpful error messages and suggestions.
//! Decoders and encoders run these checks through [`Report::validate`];
//! the `--check` mode of the binary prints the full issue list.
//!
//! [`Report::validate`]: crate::model::Report::validate

use crate::model::{Branch, CvssVersion, Report, Timestamp, Vulnerability};
use chrono::{DateTime, Utc};
use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Validation severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A single validation issue with context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            location: None,
            suggestion: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            location: None,
            suggestion: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            location: None,
            suggestion: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Format the issue with colors for terminal output
    pub fn format_colored(&self) -> String {
        let mut output = String::new();

        let (icon, color_fn): (&str, fn(&str) -> ColoredString) = match self.severity {
            Severity::Error => ("✗", |s: &str| s.red().bold()),
            Severity::Warning => ("⚠", |s: &str| s.yellow().bold()),
            Severity::Info => ("ℹ", |s: &str| s.cyan().bold()),
        };

        output.push_str(&format!("{} ", color_fn(icon)));

        if let Some(ref location) = self.location {
            output.push_str(&format!("[{}] ", location.bright_blue()));
        }

        output.push_str(&self.message);
        output.push('\n');

        if let Some(ref suggestion) = self.suggestion {
            output.push_str(&format!(
                "  {} {}\n",
                "→".bright_green(),
                suggestion.green()
            ));
        }

        output
    }

    /// Format without colors for logs or non-terminal output
    pub fn format_plain(&self) -> String {
        let mut output = String::new();

        let severity_str = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        };

        output.push_str(&format!("[{}] ", severity_str));

        if let Some(ref location) = self.location {
            output.push_str(&format!("[{}] ", location));
        }

        output.push_str(&self.message);
        output.push('\n');

        if let Some(ref suggestion) = self.suggestion {
            output.push_str(&format!("  Suggestion: {}\n", suggestion));
        }

        output
    }
}

/// Validation result containing all issues found
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file_path = Some(path.as_ref().display().to_string());
        self
    }

    pub fn add_issue(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn first_error(&self) -> Option<&ValidationIssue> {
        self.issues.iter().find(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn info_count(&self) -> usize {
        self.count(Severity::Info)
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Print the report with colors
    pub fn print_colored(&self) {
        if let Some(ref path) = self.file_path {
            println!("\n{} {}\n", "Checking:".bold(), path.bright_blue());
        }

        for issue in &self.issues {
            print!("{}", issue.format_colored());
        }

        if self.issues.is_empty() {
            println!("{}", "✓ No issues found".green().bold());
            return;
        }

        println!();
        let mut summary = Vec::new();
        let errors = self.error_count();
        if errors > 0 {
            summary.push(
                format!("{} {}", errors, if errors == 1 { "error" } else { "errors" })
                    .red()
                    .bold()
                    .to_string(),
            );
        }
        let warnings = self.warning_count();
        if warnings > 0 {
            summary.push(
                format!(
                    "{} {}",
                    warnings,
                    if warnings == 1 { "warning" } else { "warnings" }
                )
                .yellow()
                .bold()
                .to_string(),
            );
        }
        let infos = self.info_count();
        if infos > 0 {
            summary.push(
                format!("{} {}", infos, if infos == 1 { "info" } else { "infos" })
                    .cyan()
                    .bold()
                    .to_string(),
            );
        }
        println!("{} {}", "Summary:".bold(), summary.join(", "));
    }
}

/// Runs every consistency check against `doc`.
pub fn validate_report(doc: &Report) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_tracking(doc, &mut report);
    let product_ids = validate_product_tree(doc, &mut report);
    let group_ids: HashSet<&str> = doc
        .product_tree
        .product_groups
        .iter()
        .map(|g| g.group_id.as_str())
        .collect();

    if doc.product_tree.is_empty() && !doc.vulnerabilities.is_empty() {
        report.add_issue(
            ValidationIssue::warning("Report has vulnerabilities but no product tree")
                .with_location("product_tree"),
        );
    }

    if doc.has_translations() {
        report.add_issue(
            ValidationIssue::info("Report carries translations that CVRF output drops")
                .with_suggestion("Convert to JSON to keep every language"),
        );
    }

    let mut ordinals = HashSet::new();
    for (idx, vuln) in doc.vulnerabilities.iter().enumerate() {
        if let Some(ordinal) = vuln.ordinal
            && !ordinals.insert(ordinal)
        {
            report.add_issue(
                ValidationIssue::warning(format!("Duplicate vulnerability ordinal {}", ordinal))
                    .with_location(format!("vulnerabilities[{}]", idx)),
            );
        }
        validate_vulnerability(vuln, idx, &product_ids, &group_ids, &mut report);
    }

    report
}

fn validate_tracking(doc: &Report, report: &mut ValidationReport) {
    let tracking = &doc.document.tracking;

    if tracking.id.trim().is_empty() {
        report.add_issue(
            ValidationIssue::error("Document tracking id is empty")
                .with_location("document.tracking.id"),
        );
    }

    if tracking.revision_history.is_empty() {
        report.add_issue(
            ValidationIssue::error("Revision history is empty")
                .with_location("document.tracking.revision_history")
                .with_suggestion("Add at least one revision entry"),
        );
    }

    let mut previous: Option<DateTime<Utc>> = None;
    for (idx, revision) in tracking.revision_history.iter().enumerate() {
        let location = format!("document.tracking.revision_history[{}].date", idx);
        let Some(date) = parse_date(&revision.date, &location, report) else {
            continue;
        };
        if let Some(prev) = previous
            && date < prev
        {
            report.add_issue(
                ValidationIssue::error(format!(
                    "Revision {} ({}) is dated before the preceding revision",
                    revision.number, revision.date
                ))
                .with_location(&location)
                .with_suggestion("Order the revision history by ascending date"),
            );
        }
        previous = Some(date);
    }

    parse_date(
        &tracking.initial_release_date,
        "document.tracking.initial_release_date",
        report,
    );
    parse_date(
        &tracking.current_release_date,
        "document.tracking.current_release_date",
        report,
    );
}

fn parse_date(value: &Timestamp, location: &str, report: &mut ValidationReport) -> Option<DateTime<Utc>> {
    let parsed = value.parse();
    if parsed.is_none() {
        report.add_issue(
            ValidationIssue::error(format!("Unparseable date '{}'", value))
                .with_location(location)
                .with_suggestion("Use an ISO 8601 date-time such as 2021-01-31T12:00:00Z"),
        );
    }
    parsed
}

/// Checks product id uniqueness and internal references; returns the ids.
fn validate_product_tree<'a>(doc: &'a Report, report: &mut ValidationReport) -> HashSet<&'a str> {
    let tree = &doc.product_tree;
    let mut seen: HashMap<&str, usize> = HashMap::new();

    for product in tree.products() {
        let count = seen.entry(product.product_id.as_str()).or_insert(0);
        *count += 1;
        if *count == 2 {
            report.add_issue(
                ValidationIssue::error(format!(
                    "Product id '{}' is defined more than once",
                    product.product_id
                ))
                .with_location("product_tree"),
            );
        }
        if product.product_id.trim().is_empty() {
            report.add_issue(
                ValidationIssue::error(format!("Product '{}' has an empty product id", product.name))
                    .with_location("product_tree"),
            );
        }
    }

    for (idx, branch) in tree.branches.iter().enumerate() {
        check_branch(branch, &format!("product_tree.branches[{}]", idx), report);
    }

    let ids: HashSet<&str> = seen.keys().copied().collect();

    for (idx, rel) in tree.relationships.iter().enumerate() {
        let location = format!("product_tree.relationships[{}]", idx);
        for id in [&rel.product_reference, &rel.relates_to_product_reference] {
            if !ids.contains(id.as_str()) {
                report.add_issue(unknown_product(id, &location));
            }
        }
        if rel.full_product_names.is_empty() {
            report.add_issue(
                ValidationIssue::error("Relationship defines no full product name")
                    .with_location(&location),
            );
        }
    }

    let mut group_ids = HashSet::new();
    for (idx, group) in tree.product_groups.iter().enumerate() {
        let location = format!("product_tree.product_groups[{}]", idx);
        if !group_ids.insert(group.group_id.as_str()) {
            report.add_issue(
                ValidationIssue::error(format!(
                    "Group id '{}' is defined more than once",
                    group.group_id
                ))
                .with_location(&location),
            );
        }
        for id in &group.product_ids {
            if !ids.contains(id.as_str()) {
                report.add_issue(unknown_product(id, &location));
            }
        }
    }

    ids
}

fn check_branch(branch: &Branch, location: &str, report: &mut ValidationReport) {
    if branch.branches.is_empty() && branch.product.is_none() {
        report.add_issue(
            ValidationIssue::warning(format!(
                "Branch '{}' has neither sub-branches nor a product",
                branch.name
            ))
            .with_location(location),
        );
    }
    for (idx, child) in branch.branches.iter().enumerate() {
        check_branch(child, &format!("{}.branches[{}]", location, idx), report);
    }
}

fn validate_vulnerability(
    vuln: &Vulnerability,
    idx: usize,
    product_ids: &HashSet<&str>,
    group_ids: &HashSet<&str>,
    report: &mut ValidationReport,
) {
    let location = format!("vulnerabilities[{}]", idx);

    for (field, id) in vuln.referenced_product_ids() {
        if !product_ids.contains(id) {
            report.add_issue(unknown_product(id, &format!("{}.{}", location, field)));
        }
    }

    for (field, id) in vuln.referenced_group_ids() {
        if !group_ids.contains(id) {
            report.add_issue(
                ValidationIssue::error(format!("Unknown group id '{}'", id))
                    .with_location(format!("{}.{}", location, field))
                    .with_suggestion("Declare the group under product_tree.product_groups"),
            );
        }
    }

    for (sidx, score) in vuln.scores.iter().enumerate() {
        let score_location = format!("{}.scores[{}]", location, sidx);
        let values = [
            Some(score.base_score),
            score.temporal_score,
            score.environmental_score,
        ];
        for value in values.into_iter().flatten() {
            if !(0.0..=10.0).contains(&value) {
                report.add_issue(
                    ValidationIssue::error(format!("CVSS score {} is outside 0.0-10.0", value))
                        .with_location(&score_location),
                );
            }
        }
        if score.version == CvssVersion::V3
            && let Some(vector) = &score.vector
            && !vector.starts_with("CVSS:3.")
        {
            report.add_issue(
                ValidationIssue::warning(format!(
                    "CVSS v3 vector '{}' lacks the CVSS:3.x/ prefix",
                    vector
                ))
                .with_location(&score_location),
            );
        }
    }
}

fn unknown_product(id: &str, location: &str) -> ValidationIssue {
    ValidationIssue::error(format!("Unknown product id '{}'", id))
        .with_location(location)
        .with_suggestion("Add a full product name with this id to the product tree")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DocumentMeta, FullProductName, Note, NoteType, ProductGroup, ProductStatus,
        ProductStatusType, Revision, ScoreSet, Tracking,
    };

    fn report_with(vuln: Vulnerability) -> Report {
        Report {
            document: DocumentMeta {
                title: "T".into(),
                doc_type: "Advisory".into(),
                tracking: Tracking {
                    id: "ID-1".into(),
                    version: "1".into(),
                    revision_history: vec![Revision {
                        number: "1".into(),
                        date: "2021-01-01T00:00:00Z".into(),
                        description: "Initial".into(),
                    }],
                    initial_release_date: "2021-01-01T00:00:00Z".into(),
                    current_release_date: "2021-01-01T00:00:00Z".into(),
                    ..Default::default()
                },
                ..Default::default()
            },
            product_tree: crate::model::ProductTree {
                full_product_names: vec![FullProductName::new("CSAFPID-1", "Widget")],
                ..Default::default()
            },
            vulnerabilities: vec![vuln],
            ..Default::default()
        }
    }

    #[test]
    fn test_validation_issue_creation() {
        let issue = ValidationIssue::error("Test error")
            .with_location("test.field")
            .with_suggestion("Fix it");

        assert_eq!(issue.severity, Severity::Error);
        assert_eq!(issue.message, "Test error");
        assert_eq!(issue.location, Some("test.field".to_string()));
        assert_eq!(issue.suggestion, Some("Fix it".to_string()));
        assert!(issue.format_plain().starts_with("[ERROR] [test.field]"));
    }

    #[test]
    fn test_valid_report_has_no_errors() {
        let vuln = Vulnerability {
            product_statuses: vec![ProductStatus::new(
                ProductStatusType::KnownAffected,
                vec!["CSAFPID-1".into()],
            )],
            ..Default::default()
        };
        let report = validate_report(&report_with(vuln));
        assert!(!report.has_errors());
    }

    #[test]
    fn test_dangling_product_reference() {
        let mut score = ScoreSet::new(CvssVersion::V3, 7.5);
        score.product_ids.push("CSAFPID-9999".into());
        let vuln = Vulnerability {
            scores: vec![score],
            ..Default::default()
        };
        let report = validate_report(&report_with(vuln));
        let error = report.first_error().unwrap();
        assert!(error.message.contains("CSAFPID-9999"));
        assert_eq!(error.location.as_deref(), Some("vulnerabilities[0].scores[0]"));
    }

    #[test]
    fn test_revision_history_must_ascend() {
        let mut doc = report_with(Vulnerability::default());
        doc.document.tracking.revision_history.push(Revision {
            number: "2".into(),
            date: "2020-06-01T00:00:00Z".into(),
            description: "Backdated".into(),
        });
        let report = validate_report(&doc);
        assert!(report.has_errors());
        assert!(report.first_error().unwrap().message.contains("dated before"));
    }

    #[test]
    fn test_duplicate_product_ids() {
        let mut doc = report_with(Vulnerability::default());
        doc.product_tree
            .full_product_names
            .push(FullProductName::new("CSAFPID-1", "Widget again"));
        assert_eq!(validate_report(&doc).error_count(), 1);
    }

    #[test]
    fn test_group_members_must_exist() {
        let mut doc = report_with(Vulnerability::default());
        doc.product_tree.product_groups.push(ProductGroup {
            group_id: "GRP-1".into(),
            product_ids: vec!["CSAFPID-1".into(), "CSAFPID-7".into()],
            ..Default::default()
        });
        let report = validate_report(&doc);
        assert!(report.first_error().unwrap().message.contains("CSAFPID-7"));
    }

    #[test]
    fn test_score_range_and_vector_warning() {
        let mut score = ScoreSet::new(CvssVersion::V3, 11.0);
        score.vector = Some("AV:N/AC:L".into());
        let report = validate_report(&report_with(Vulnerability {
            scores: vec![score],
            ..Default::default()
        }));
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn test_translations_are_reported_as_info() {
        let mut note = Note::new(NoteType::Summary, "Summary");
        note.translations.insert("de", "Zusammenfassung");
        let report = validate_report(&report_with(Vulnerability {
            notes: vec![note],
            ..Default::default()
        }));
        assert!(!report.has_errors());
        assert_eq!(report.info_count(), 1);
        assert!(report.issues[0].format_plain().starts_with("[INFO]"));
    }

    #[test]
    fn test_unparseable_release_date() {
        let mut doc = report_with(Vulnerability::default());
        doc.document.tracking.current_release_date = "last tuesday".into();
        let report = validate_report(&doc);
        let error = report.first_error().unwrap();
        assert!(error.message.contains("last tuesday"));
        assert_eq!(
            error.location.as_deref(),
            Some("document.tracking.current_release_date")
        );
    }
}
