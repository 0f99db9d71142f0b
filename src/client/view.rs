//! Three-state view model and its text rendering.

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::ClientError;
use crate::report::HealthReport;
use crate::utils::{format_mib, format_uptime};

/// Data the rendering layer reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// A fetch cycle is in flight.
    pub loading: bool,
    /// Message of the last failed cycle, cleared when a cycle starts.
    pub error: Option<String>,
    /// Last successfully fetched report; survives later failures.
    pub report: Option<HealthReport>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            loading: true,
            error: None,
            report: None,
        }
    }
}

/// What to show, resolved by precedence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View<'a> {
    Loading,
    Error(&'a str),
    Unavailable,
    Ready(&'a HealthReport),
}

impl ViewState {
    /// A cycle started.
    pub fn begin_fetch(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// A cycle finished.
    pub fn apply(&mut self, result: Result<HealthReport, ClientError>) {
        match result {
            Ok(report) => {
                self.report = Some(report);
                self.error = None;
            }
            Err(e) => {
                self.error = Some(e.to_string());
            }
        }
        self.loading = false;
    }

    /// Loading beats error, error beats missing data, then the report.
    pub fn view(&self) -> View<'_> {
        if self.loading {
            View::Loading
        } else if let Some(error) = self.error.as_deref().filter(|e| !e.is_empty()) {
            View::Error(error)
        } else if let Some(report) = &self.report {
            View::Ready(report)
        } else {
            View::Unavailable
        }
    }
}

/// Render a view as terminal text.
pub fn render(view: View<'_>) -> String {
    match view {
        View::Loading => "Loading...".to_string(),
        View::Error(message) => format!("❌ Error\nError loading version info: {}", message),
        View::Unavailable => "❓ Unknown\nVersion info unavailable: \
             Unable to fetch version information from the backend."
            .to_string(),
        View::Ready(report) => {
            let lines = [
                format!("✅ {}", report.status),
                format!("Client Version:  {}", env!("CARGO_PKG_VERSION")),
                format!("Backend Version: {}", report.version),
                format!("Environment:     {}", report.environment),
                format!("Uptime:          {}", format_uptime(report.uptime)),
                format!("PID:             {}", report.pid),
                format!("Memory (RSS):    {}", format_mib(report.memory.rss)),
                format!("Updated:         {}", format_epoch_ms(report.timestamp)),
            ];
            lines.join("\n")
        }
    }
}

fn format_epoch_ms(ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| ms.to_string())
}
