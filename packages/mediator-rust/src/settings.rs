//! Process settings and `{system.prop.*}` placeholder substitution in
//! endpoint addresses.

use std::collections::HashMap;
use std::sync::LazyLock;

use parking_lot::RwLock;
use regex::{Captures, Regex};
use tracing::{info, warn};

/// Token prefix that marks a placeholder as a process-setting reference.
pub const SYSTEM_PROPERTY_PREFIX: &str = "system.prop.";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(.*?)\}").expect("placeholder pattern compiles"));

// ---------------------------------------------------------------------------
// ProcessSettings
// ---------------------------------------------------------------------------

/// Read access to named process-level settings.
pub trait ProcessSettings: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

/// Settings backed by the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSettings;

impl ProcessSettings for EnvSettings {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// In-memory settings, mutable after construction.
#[derive(Debug, Default)]
pub struct StaticSettings {
    values: RwLock<HashMap<String, String>>,
}

impl StaticSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        self.values.write().insert(name.into(), value.into());
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        self.values.write().remove(name)
    }
}

impl ProcessSettings for StaticSettings {
    fn get(&self, name: &str) -> Option<String> {
        self.values.read().get(name).cloned()
    }
}

// ---------------------------------------------------------------------------
// Placeholder resolution
// ---------------------------------------------------------------------------

/// Outcome of substituting placeholders into an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderResolution {
    /// The address with every resolvable token replaced.
    pub address: String,
    /// Setting names referenced by tokens that had no value, in order.
    pub unresolved: Vec<String>,
}

impl PlaceholderResolution {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Replaces each `{system.prop.NAME}` token with the setting `NAME`.
///
/// Tokens without the prefix are left untouched. A token naming an unset
/// setting is kept verbatim and reported in
/// [`PlaceholderResolution::unresolved`].
#[must_use]
pub fn resolve_placeholders(address: &str, settings: &dyn ProcessSettings) -> PlaceholderResolution {
    let mut unresolved = Vec::new();
    let resolved = PLACEHOLDER.replace_all(address, |caps: &Captures<'_>| {
        let token = &caps[0];
        let Some(name) = caps[1].strip_prefix(SYSTEM_PROPERTY_PREFIX) else {
            return token.to_string();
        };
        match settings.get(name) {
            Some(value) => {
                info!(setting = name, %value, "replacing address placeholder");
                value
            }
            None => {
                warn!(setting = name, address, "system property is not set, keeping placeholder");
                unresolved.push(name.to_string());
                token.to_string()
            }
        }
    });
    PlaceholderResolution {
        address: resolved.into_owned(),
        unresolved,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
