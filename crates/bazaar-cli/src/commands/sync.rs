use bazaar_core::{BookmarkStore, ReconcileReport, RemoteAvailability};

use crate::error::CliError;

/// Probe the remote and run one reconcile pass
pub async fn run_sync(store: &BookmarkStore) -> Result<ReconcileReport, CliError> {
    if !matches!(store.connect().await, RemoteAvailability::Available(_)) {
        return Err(CliError::RemoteNotConfigured);
    }

    let report = store.reconcile().await?;
    for line in format_report_lines(&report) {
        println!("{line}");
    }
    Ok(report)
}

pub fn format_report_lines(report: &ReconcileReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Sync complete: pulled {}, pushed {}",
        report.pulled, report.pushed
    )];
    if report.failed_pushes > 0 {
        lines.push(format!(
            "{} bookmark(s) could not be pushed and will be retried next sync",
            report.failed_pushes
        ));
    }
    if report.skipped_records > 0 {
        lines.push(format!(
            "Skipped {} unreadable remote record(s)",
            report.skipped_records
        ));
    }
    lines
}
