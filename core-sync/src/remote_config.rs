//! # Remote Configuration
//!
//! ## Overview
//!
//! Loader and validator for the transfer tool's remote configuration file,
//! an INI-style document of `[section]` blocks with `key = value` lines.
//! The engine validates the section for the selected provider before any
//! transfer: the section must exist, its `type` must match the provider's
//! backend, and providers that authenticate with an OAuth token must carry
//! one that parses as a JSON object.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, SyncError};
use crate::provider::ProviderKind;

/// Parsed remote configuration. Unknown sections and keys are preserved
/// verbatim; only the section for the selected provider is ever validated.
#[derive(Debug, Clone, Default)]
pub struct RemoteConfig {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl RemoteConfig {
    /// Parses configuration text. Tolerant of comments (`#` or `;`), blank
    /// lines, and junk lines outside any section.
    pub fn parse(content: &str) -> Self {
        let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        let mut current: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim().to_string();
                sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }
            if let (Some(section), Some((key, value))) = (&current, line.split_once('=')) {
                if let Some(entries) = sections.get_mut(section) {
                    entries.insert(key.trim().to_string(), value.trim().to_string());
                }
            }
        }

        RemoteConfig { sections }
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            SyncError::setup(format!(
                "cannot read remote configuration {}: {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::parse(&content);
        debug!(
            path = %path.display(),
            sections = config.sections.len(),
            "Loaded remote configuration"
        );
        Ok(config)
    }

    pub fn section(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.sections.get(name)
    }

    /// Validates the configuration section for `provider`. Every failure is
    /// a setup error; the engine aborts the run before transferring anything.
    pub fn validate_provider(&self, provider: ProviderKind) -> Result<()> {
        let profile = provider.profile();
        let section = self.section(profile.remote_identifier).ok_or_else(|| {
            SyncError::setup(format!(
                "remote configuration has no [{}] section for {}",
                profile.remote_identifier, profile.display_name
            ))
        })?;

        match section.get("type").map(String::as_str) {
            Some(t) if t == profile.backend_type => {}
            Some(t) => {
                return Err(SyncError::setup(format!(
                    "remote [{}] has type '{}', expected '{}'",
                    profile.remote_identifier, t, profile.backend_type
                )));
            }
            None => {
                return Err(SyncError::setup(format!(
                    "remote [{}] is missing the 'type' key",
                    profile.remote_identifier
                )));
            }
        }

        if profile.requires_token_check {
            let token = section.get("token").ok_or_else(|| {
                SyncError::setup(format!(
                    "remote [{}] is missing its OAuth token",
                    profile.remote_identifier
                ))
            })?;
            let parsed: serde_json::Value = serde_json::from_str(token).map_err(|e| {
                SyncError::setup(format!(
                    "remote [{}] token is not valid JSON: {}",
                    profile.remote_identifier, e
                ))
            })?;
            if !parsed.is_object() {
                return Err(SyncError::setup(format!(
                    "remote [{}] token is not a JSON object",
                    profile.remote_identifier
                )));
            }
        }

        Ok(())
    }
}
