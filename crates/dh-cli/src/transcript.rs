use std::fmt::Display;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Record of a scripted session, written as JSON by `dh run --transcript`.
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub program: String,
    pub args: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub entries: Vec<TranscriptEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub at: DateTime<Utc>,
    pub step: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reply: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Transcript {
    pub fn new(program: &str, args: &[String]) -> Self {
        Self {
            program: program.to_string(),
            args: args.to_vec(),
            started_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    pub fn record<E: Display>(&mut self, step: &str, outcome: &Result<Vec<String>, E>) {
        let (reply, error) = match outcome {
            Ok(lines) => (lines.clone(), None),
            Err(e) => (Vec::new(), Some(e.to_string())),
        };
        self.entries.push(TranscriptEntry {
            at: Utc::now(),
            step: step.to_string(),
            reply,
            error,
        });
    }

    pub fn record_check(&mut self, step: &str, passed: bool) {
        self.entries.push(TranscriptEntry {
            at: Utc::now(),
            step: step.to_string(),
            reply: Vec::new(),
            error: (!passed).then(|| "expectation not met".to_string()),
        });
    }

    pub async fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}
