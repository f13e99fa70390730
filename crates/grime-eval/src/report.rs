use crate::metrics::ProfileReport;

/// Render a deterministic markdown report from profile metrics.
pub fn render_report(metrics: &ProfileReport, max_examples: usize) -> String {
    let mut lines = Vec::new();

    lines.push("# Grime Defect Profile".to_string());
    lines.push(String::new());
    lines.push("## Run summary".to_string());
    if let Some(run_id) = &metrics.run_id {
        lines.push(format!("- run_id: {run_id}"));
    }
    if let Some(seed) = metrics.seed {
        lines.push(format!("- seed: {seed}"));
    }
    lines.push(format!("- as_of: {}", metrics.as_of));
    lines.push(String::new());

    lines.push("## Row counts".to_string());
    lines.push("| dataset | file | rows_expected | rows_found |".to_string());
    lines.push("| --- | --- | --- | --- |".to_string());
    for dataset in &metrics.datasets {
        let expected = dataset
            .rows_expected
            .map(|value| value.to_string())
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "| {} | {} | {} | {} |",
            dataset.dataset, dataset.file_name, expected, dataset.rows_found
        ));
    }
    lines.push(String::new());

    lines.push("## Defect rates".to_string());
    lines.push("| dataset | metric | target | measured | tolerance | status |".to_string());
    lines.push("| --- | --- | --- | --- | --- | --- |".to_string());
    for check in &metrics.rate_checks {
        let status = if check.within_tolerance { "ok" } else { "OUT" };
        lines.push(format!(
            "| {} | {} | {:.4} | {:.4} | ±{:.4} | {} |",
            check.dataset, check.metric, check.target, check.measured, check.tolerance, status
        ));
    }
    lines.push(String::new());

    if !metrics.warnings.is_empty() {
        lines.push("## Warnings".to_string());
        for warning in &metrics.warnings {
            lines.push(format!("- {warning}"));
        }
        lines.push(String::new());
    }

    if !metrics.violations.is_empty() {
        lines.push(format!("## Violations ({})", metrics.violations.len()));
        for violation in metrics.violations.iter().take(max_examples) {
            let row = violation
                .row_index
                .map(|row| format!(" row {row}"))
                .unwrap_or_default();
            let example = violation
                .example
                .as_ref()
                .map(|value| format!(" example={value}"))
                .unwrap_or_default();
            lines.push(format!(
                "- {}.{}{}: {}{}",
                violation.dataset, violation.code, row, violation.message, example
            ));
        }
        lines.push(String::new());
    }

    lines.push("## Verdict".to_string());
    let failed = metrics.failed_checks().count();
    if failed == 0 && metrics.violations.is_empty() {
        lines.push("- all declared rates within tolerance; no invariant violations.".to_string());
    } else {
        if failed > 0 {
            lines.push(format!("- {failed} rate(s) outside tolerance."));
        }
        if !metrics.violations.is_empty() {
            lines.push(format!(
                "- {} invariant violation(s).",
                metrics.violations.len()
            ));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use grime_core::DatasetKind;

    use super::*;
    use crate::metrics::{PerformanceMetrics, RateCheck};
    use crate::model::Violation;

    fn metrics(within_tolerance: bool, violations: Vec<Violation>) -> ProfileReport {
        ProfileReport {
            metrics_version: "0.1".to_string(),
            run_id: Some("run-1".to_string()),
            seed: Some(42),
            as_of: NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
            datasets: Vec::new(),
            rate_checks: vec![RateCheck {
                dataset: DatasetKind::Events,
                metric: "null_user_id".to_string(),
                target: 0.05,
                measured: 0.0502,
                count: 2008,
                tolerance: 0.0075,
                within_tolerance,
                ground_truth: Some(2008),
            }],
            violations,
            warnings: Vec::new(),
            performance: PerformanceMetrics {
                load_ms: 1,
                profile_ms: 1,
                total_ms: 2,
            },
        }
    }

    #[test]
    fn clean_profile_has_clean_verdict() {
        let report = render_report(&metrics(true, Vec::new()), 5);
        assert!(report.contains("| events | null_user_id | 0.0500 | 0.0502 | ±0.0075 | ok |"));
        assert!(report.contains("no invariant violations"));
        assert!(!report.contains("## Violations"));
    }

    #[test]
    fn violations_are_capped_to_max_examples() {
        let violations = (0..4)
            .map(|idx| Violation {
                code: "unresolvable_state".to_string(),
                dataset: "users".to_string(),
                message: "state does not map".to_string(),
                row_index: Some(idx),
                example: Some("Atlantis".to_string()),
            })
            .collect();
        let report = render_report(&metrics(false, violations), 2);
        assert!(report.contains("## Violations (4)"));
        assert_eq!(report.matches("users.unresolvable_state").count(), 2);
        assert!(report.contains("1 rate(s) outside tolerance."));
    }
}
