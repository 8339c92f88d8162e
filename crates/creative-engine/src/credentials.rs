use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const ALT_API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Value shipped in sample `.env` files; treated as unset.
pub const PLACEHOLDER_KEY: &str = "your_api_key_here";

const ENV_FILE_HEADER: &str = "# Environment Variables\n";

/// API key held in the process environment and persisted to a `.env` file.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    env_file: PathBuf,
    var: String,
    fallback_var: Option<String>,
}

impl CredentialStore {
    pub fn new(env_file: impl Into<PathBuf>) -> Self {
        Self {
            env_file: env_file.into(),
            var: API_KEY_VAR.to_string(),
            fallback_var: Some(ALT_API_KEY_VAR.to_string()),
        }
    }

    /// Store bound to a single variable name.
    pub fn with_var(env_file: impl Into<PathBuf>, var: impl Into<String>) -> Self {
        Self {
            env_file: env_file.into(),
            var: var.into(),
            fallback_var: None,
        }
    }

    pub fn env_file(&self) -> &Path {
        &self.env_file
    }

    /// Seeds unset process variables from the `.env` file. Variables that
    /// are already set win. Returns how many were seeded.
    pub fn load_env_file(&self) -> usize {
        let mut seeded = 0;
        for (key, value) in parse_dotenv(&self.env_file) {
            if env::var_os(&key).is_some() {
                continue;
            }
            env::set_var(&key, value);
            seeded += 1;
        }
        if seeded > 0 {
            tracing::debug!(path = %self.env_file.display(), seeded, "loaded .env");
        }
        seeded
    }

    /// The configured key, ignoring blanks and the placeholder.
    pub fn api_key(&self) -> Option<String> {
        std::iter::once(self.var.as_str())
            .chain(self.fallback_var.as_deref())
            .filter_map(|var| env::var(var).ok())
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty() && value != PLACEHOLDER_KEY)
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    /// Persists `key` to the `.env` file and the process environment.
    pub fn save(&self, key: &str) -> Result<String> {
        let key = key.trim();
        if key.is_empty() {
            return Ok("Please enter a valid API key".to_string());
        }

        let existing = if self.env_file.exists() {
            fs::read_to_string(&self.env_file)
                .with_context(|| format!("failed reading {}", self.env_file.display()))?
        } else {
            ENV_FILE_HEADER.to_string()
        };
        let updated = upsert_dotenv_line(&existing, &self.var, key);
        if let Some(parent) = self.env_file.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating {}", parent.display()))?;
        }
        fs::write(&self.env_file, updated)
            .with_context(|| format!("failed writing {}", self.env_file.display()))?;
        env::set_var(&self.var, key);
        tracing::info!(path = %self.env_file.display(), var = %self.var, "saved API key");
        Ok("API key saved successfully!".to_string())
    }

    pub fn status(&self) -> String {
        match self.api_key() {
            Some(key) => format!("API Key configured: {}", mask_key(&key)),
            None => "API Key not configured".to_string(),
        }
    }
}

/// First 8 and last 4 characters; `***` for short keys.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "***".to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

fn parse_dotenv(path: &Path) -> HashMap<String, String> {
    let content = fs::read_to_string(path).unwrap_or_default();
    let mut vars = HashMap::new();
    for raw_line in content.lines() {
        let Some((key, value)) = parse_dotenv_line(raw_line) else {
            continue;
        };
        vars.insert(key.to_string(), value);
    }
    vars
}

fn parse_dotenv_line(raw_line: &str) -> Option<(&str, String)> {
    let mut line = raw_line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    if let Some(stripped) = line.strip_prefix("export ") {
        line = stripped.trim();
    }
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let mut value = value.trim().to_string();
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\'')
        {
            value = value[1..value.len() - 1].to_string();
        }
    }
    Some((key, value))
}

/// Rewrites every assignment of `var`, or appends one when absent.
fn upsert_dotenv_line(content: &str, var: &str, value: &str) -> String {
    let assignment = format!("{var}={value}");
    let mut replaced = false;
    let mut lines = Vec::new();
    for line in content.lines() {
        if parse_dotenv_line(line).map(|(key, _)| key == var).unwrap_or(false) {
            lines.push(assignment.clone());
            replaced = true;
        } else {
            lines.push(line.to_string());
        }
    }
    if !replaced {
        lines.push(assignment);
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_key_keeps_head_and_tail() {
        assert_eq!(mask_key("AIzaSyA1234567890abcd"), "AIzaSyA1...abcd");
        assert_eq!(mask_key("short"), "***");
        assert_eq!(mask_key("exactly12chr"), "***");
    }

    #[test]
    fn save_creates_file_and_sets_variable() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let var = "CREATIVE_TEST_KEY_SAVE";
        let store = CredentialStore::with_var(temp.path().join(".env"), var);

        let status = store.save("  AIzaSyA1234567890abcd  ")?;
        assert_eq!(status, "API key saved successfully!");
        let content = fs::read_to_string(store.env_file())?;
        assert_eq!(content, format!("# Environment Variables\n{var}=AIzaSyA1234567890abcd\n"));
        assert_eq!(store.api_key().as_deref(), Some("AIzaSyA1234567890abcd"));
        assert_eq!(store.status(), "API Key configured: AIzaSyA1...abcd");
        Ok(())
    }

    #[test]
    fn save_replaces_existing_assignment() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let var = "CREATIVE_TEST_KEY_UPDATE";
        let path = temp.path().join(".env");
        fs::write(&path, format!("OTHER=1\nexport {var}=\"old\"\n# trailing\n"))?;

        let store = CredentialStore::with_var(&path, var);
        store.save("new-key-value-000")?;
        let content = fs::read_to_string(&path)?;
        assert_eq!(content, format!("OTHER=1\n{var}=new-key-value-000\n# trailing\n"));
        Ok(())
    }

    #[test]
    fn blank_key_is_refused_without_touching_disk() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let store = CredentialStore::with_var(temp.path().join(".env"), "CREATIVE_TEST_KEY_BLANK");
        assert_eq!(store.save("   ")?, "Please enter a valid API key");
        assert!(!store.env_file().exists());
        assert_eq!(store.status(), "API Key not configured");
        Ok(())
    }

    #[test]
    fn placeholder_counts_as_unset() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let var = "CREATIVE_TEST_KEY_PLACEHOLDER";
        let store = CredentialStore::with_var(temp.path().join(".env"), var);
        env::set_var(var, PLACEHOLDER_KEY);
        assert!(!store.is_configured());
        Ok(())
    }

    #[test]
    fn load_env_file_does_not_override_process_values() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join(".env");
        fs::write(
            &path,
            "CREATIVE_TEST_SEEDED='from-file'\nCREATIVE_TEST_PRESET=from-file\n",
        )?;
        env::set_var("CREATIVE_TEST_PRESET", "from-process");

        let store = CredentialStore::with_var(&path, "CREATIVE_TEST_SEEDED");
        assert_eq!(store.load_env_file(), 1);
        assert_eq!(env::var("CREATIVE_TEST_SEEDED")?, "from-file");
        assert_eq!(env::var("CREATIVE_TEST_PRESET")?, "from-process");
        Ok(())
    }
}
