use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

pub type EventPayload = Map<String, Value>;

pub const EVENTS_FILE: &str = "events.jsonl";

/// Appends to `<campaign_dir>/events.jsonl`, one compact JSON object per line.
///
/// Each line starts with `type`, `campaign_id`, `operation` (when the writer
/// is bound to one) and `ts`; payload keys are merged after them.
#[derive(Debug)]
pub struct EventWriter {
    path: PathBuf,
    campaign_id: String,
    operation: Option<String>,
}

impl EventWriter {
    pub fn for_campaign(campaign_dir: &Path, campaign_id: &str) -> Self {
        Self {
            path: campaign_dir.join(EVENTS_FILE),
            campaign_id: campaign_id.to_string(),
            operation: None,
        }
    }

    /// Stamps every line with the batch that produced it.
    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn emit(&self, event_type: &str, payload: EventPayload) -> anyhow::Result<Value> {
        let mut event = Map::new();
        event.insert("type".to_string(), Value::String(event_type.to_string()));
        event.insert(
            "campaign_id".to_string(),
            Value::String(self.campaign_id.clone()),
        );
        if let Some(operation) = &self.operation {
            event.insert("operation".to_string(), Value::String(operation.clone()));
        }
        event.insert(
            "ts".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        event.extend(payload);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed creating {}", parent.display()))?;
        }
        let mut line = serde_json::to_string(&event)?;
        line.push('\n');
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()))
            .with_context(|| format!("failed appending to {}", self.path.display()))?;

        Ok(Value::Object(event))
    }
}
