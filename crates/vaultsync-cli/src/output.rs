use vaultsync_core::domain::{ActionOutcome, SyncReport};
use vaultsync_core::ports::IProgressObserver;

/// Selected by the global `--json` and `--quiet` flags
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
    /// Human output without informational lines
    Quiet,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        self == OutputFormat::Json
    }
}

/// Where command results go; one implementation per output format
pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    fn print_json(&self, value: &serde_json::Value);
}

/// Symbols and indented detail lines for a terminal
pub struct HumanFormatter {
    quiet: bool,
}

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        println!("\u{2713} {}", message);
    }
    fn error(&self, message: &str) {
        eprintln!("\u{2717} Error: {}", message);
    }
    fn warn(&self, message: &str) {
        eprintln!("\u{26a0} Warning: {}", message);
    }
    fn info(&self, message: &str) {
        if !self.quiet {
            println!("  {}", message);
        }
    }
    fn print_json(&self, _value: &serde_json::Value) {
        // JSON only exists in --json mode
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, message: &str) {
        println!(
            "{}",
            serde_json::json!({"success": true, "message": message})
        );
    }
    fn error(&self, message: &str) {
        eprintln!(
            "{}",
            serde_json::json!({"success": false, "error": message})
        );
    }
    fn warn(&self, message: &str) {
        eprintln!(
            "{}",
            serde_json::json!({"level": "warning", "message": message})
        );
    }
    fn info(&self, _message: &str) {}
    fn print_json(&self, value: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_default()
        );
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Human => Box::new(HumanFormatter { quiet: false }),
        OutputFormat::Quiet => Box::new(HumanFormatter { quiet: true }),
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Prints one line per completed action to stderr
pub struct ConsoleProgress {
    enabled: bool,
}

impl ConsoleProgress {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            enabled: format == OutputFormat::Human,
        }
    }
}

impl IProgressObserver for ConsoleProgress {
    fn on_action_complete(&self, index: usize, total: usize, outcome: &ActionOutcome) {
        if !self.enabled {
            return;
        }
        match outcome {
            ActionOutcome::Succeeded { action, bytes } => {
                eprintln!(
                    "[{}/{}] \u{2713} {} ({})",
                    index + 1,
                    total,
                    action,
                    format_bytes(*bytes)
                );
            }
            ActionOutcome::Failed(failure) => {
                eprintln!(
                    "[{}/{}] \u{2717} {}: {} ({})",
                    index + 1,
                    total,
                    failure.kind,
                    failure.path,
                    failure.error
                );
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Human-readable byte count: `0 B`, `512 B`, `1.5 KB`, `2 MB`
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rendered = format!("{:.2}", value);
    let trimmed = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

pub fn plural(n: u64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Renders the outcome of a batch
pub fn print_report(report: &SyncReport, format: OutputFormat) {
    let formatter = get_formatter(format);

    if format.is_json() {
        match serde_json::to_value(report) {
            Ok(json) => formatter.print_json(&json),
            Err(e) => formatter.error(&format!("Failed to serialize report: {}", e)),
        }
        return;
    }

    let stats = &report.statistics;
    let duration_ms = stats.duration().num_milliseconds().max(0);
    let duration_display = if duration_ms >= 1000 {
        format!("{:.1}s", duration_ms as f64 / 1000.0)
    } else {
        format!("{}ms", duration_ms)
    };

    if report.cancelled {
        formatter.warn(&format!(
            "Sync cancelled after {}; {} action{} not attempted",
            duration_display,
            report.not_attempted.len(),
            plural(report.not_attempted.len() as u64)
        ));
    } else if stats.files_processed == 0 {
        formatter.success("Vault and bucket are in sync");
    } else {
        formatter.success(&format!("Finished in {}", duration_display));
    }

    if stats.files_uploaded > 0 {
        formatter.info(&format!(
            "Uploaded:   {} file{}",
            stats.files_uploaded,
            plural(stats.files_uploaded)
        ));
    }
    if stats.files_downloaded > 0 {
        formatter.info(&format!(
            "Downloaded: {} file{}",
            stats.files_downloaded,
            plural(stats.files_downloaded)
        ));
    }
    if stats.files_deleted > 0 {
        formatter.info(&format!(
            "Deleted:    {} file{}",
            stats.files_deleted,
            plural(stats.files_deleted)
        ));
    }
    if stats.total_bytes > 0 {
        formatter.info(&format!("Transferred: {}", format_bytes(stats.total_bytes)));
    }
    if !report.skipped_orphans.is_empty() {
        formatter.info(&format!(
            "Skipped:    {} remote-only file{}",
            report.skipped_orphans.len(),
            plural(report.skipped_orphans.len() as u64)
        ));
    }

    if report.has_failures() {
        formatter.error(&format!(
            "{} action{} failed:",
            report.failures.len(),
            plural(report.failures.len() as u64)
        ));
        for failure in &report.failures {
            formatter.info(&format!(
                "  - {} {}: {}",
                failure.kind, failure.path, failure.error
            ));
        }
        if report.state_error.is_none() {
            formatter.info("Run 'vaultsync retry' to try them again.");
        }
    }

    if let Some(problem) = &report.state_error {
        formatter.warn(&format!("Run outcome not saved: {}", problem));
    }
}
