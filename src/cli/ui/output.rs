use console::style;

use crate::types::{ProjectRecord, ProjectStatus, ScanErrorRecord};

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        println!("  {:<14} {}", style(label).dim(), value);
    }

    /// One line per record: id, type, confidence, status, path
    pub fn project_row(&self, record: &ProjectRecord) {
        let status = match record.status {
            ProjectStatus::Development => style(record.status.to_string()).green(),
            ProjectStatus::Proposed => style(record.status.to_string()).yellow(),
        };
        println!(
            "  {:<32} {:<10} {:>4.0}%  {:<12} {}",
            style(&record.id).cyan(),
            record.project_type,
            record.confidence * 100.0,
            status,
            style(record.path.display()).dim()
        );
    }

    pub fn scan_errors(&self, errors: &[ScanErrorRecord]) {
        if errors.is_empty() {
            return;
        }
        self.section(&format!("Errors ({})", errors.len()));
        for err in errors {
            println!(
                "  {} {} {}",
                style(err.kind.to_string()).red(),
                err.path.display(),
                style(&err.error).dim()
            );
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
