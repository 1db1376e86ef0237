//! API key display model

use serde::Serialize;
use tabled::Tabled;

use crate::keys::{CredentialReport, CredentialStatus};

/// Key pool row for table output. Secrets are always masked.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct KeyDisplay {
    #[tabled(rename = "#")]
    pub index: usize,

    #[tabled(rename = "KEY")]
    pub key: String,

    #[tabled(rename = "STATUS")]
    pub status: String,

    #[tabled(rename = "FAILURES")]
    pub failures: u32,

    #[tabled(rename = "COOLDOWN")]
    pub cooldown: String,

    #[tabled(rename = "ACTIVE")]
    pub active: String,
}

impl KeyDisplay {
    pub fn new(report: &CredentialReport, active_index: usize) -> Self {
        let cooldown = match (report.status, report.cooldown_remaining_secs) {
            (CredentialStatus::Failed, Some(secs)) => format!("{}m {}s", secs / 60, secs % 60),
            _ => "--".to_string(),
        };

        Self {
            index: report.index,
            key: report.masked_key.clone(),
            status: report.status.as_str().to_string(),
            failures: report.failure_count,
            cooldown,
            active: if report.index == active_index {
                "\u{2713}".to_string() // checkmark
            } else {
                "".to_string()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: CredentialStatus, remaining: Option<u64>) -> CredentialReport {
        CredentialReport {
            index: 1,
            masked_key: "AIzaSy...".to_string(),
            status,
            failure_count: 3,
            last_failure_at: None,
            cooldown_remaining_secs: remaining,
        }
    }

    #[test]
    fn test_key_display_failed_shows_cooldown() {
        let display = KeyDisplay::new(&report(CredentialStatus::Failed, Some(125)), 0);

        assert_eq!(display.key, "AIzaSy...");
        assert_eq!(display.status, "failed");
        assert_eq!(display.cooldown, "2m 5s");
        assert_eq!(display.active, "");
    }

    #[test]
    fn test_key_display_marks_active() {
        let display = KeyDisplay::new(&report(CredentialStatus::Working, None), 1);

        assert_eq!(display.cooldown, "--");
        assert_eq!(display.active, "\u{2713}");
    }
}
