use kudoboard_core::ObjectInfo;
use kudoboard_infra::ReclaimReport;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Render a reclaim report as a plain-text table.
pub fn format_report_table(report: &ReclaimReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\n=== Orphan Reclaim{} ===\n\n",
        if report.dry_run { " (dry run)" } else { "" }
    ));
    out.push_str(&format!(
        "Started: {}\nFinished: {}\n",
        report.started_at.format("%Y-%m-%d %H:%M:%S"),
        report.finished_at.format("%Y-%m-%d %H:%M:%S")
    ));
    if report.cancelled {
        out.push_str("Run was cancelled before completion.\n");
    }
    if let Some(failure) = &report.failure {
        out.push_str(&format!("Run failed: {}\n", failure));
    }

    out.push_str(&format!(
        "\n{:<16} {:>8} {:>10} {:>9} {:>8} {:>7} {:>7}  {}\n",
        "Prefix", "Scanned", "Processed", "Orphaned", "Deleted", "Errors", "Pages!", "Status"
    ));
    out.push_str(&format!("{}\n", "-".repeat(90)));

    for p in &report.prefixes {
        let status = match &p.aborted {
            Some(reason) => format!("aborted: {}", truncate_string(reason, 30)),
            None if p.is_clean() => "ok".to_string(),
            None => "partial".to_string(),
        };
        out.push_str(&format!(
            "{:<16} {:>8} {:>10} {:>9} {:>8} {:>7} {:>7}  {}\n",
            truncate_string(&p.prefix, 16),
            p.scanned,
            p.processed,
            p.orphaned,
            p.deleted,
            p.errors,
            p.failed_pages,
            status
        ));
    }

    out.push_str(&format!(
        "\nTotal: {} processed, {} deleted, {} errors ({} prefixes aborted)\n",
        report.total_processed, report.total_deleted, report.total_errors, report.aborted_prefixes
    ));
    out
}

/// Render one listing page as a plain-text table.
pub fn format_objects_table(objects: &[ObjectInfo]) -> String {
    if objects.is_empty() {
        return "No objects found.\n".to_string();
    }

    let mut out = format!(
        "{:<60} {:>12} {:<24} {:>20}\n",
        "Public Ref", "Size (KB)", "Content Type", "Last Modified"
    );
    out.push_str(&format!("{}\n", "-".repeat(119)));
    for obj in objects {
        out.push_str(&format!(
            "{:<60} {:>12.1} {:<24} {:>20}\n",
            truncate_string(&obj.public_ref, 60),
            obj.size as f64 / 1024.0,
            truncate_string(&obj.content_type, 24),
            obj.last_modified.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    out
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }
}
