//! Principals served by the binary, loaded from a JSON file.

use std::path::Path;

use anyhow::{Context, Result};
use passlink_auth::{Authenticatable, StaticPrincipalProvider};
use serde::{Deserialize, Serialize};

/// An account that may log in with a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Identifier placed in the link path.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Contact address the link would be delivered to.
    #[serde(default)]
    pub email: String,
}

impl Authenticatable for Account {
    fn unique_key(&self) -> String {
        self.id.clone()
    }
}

/// Parse a JSON array of accounts.
///
/// Ids may be JSON strings or integers; integers are stored in decimal form.
pub fn parse_accounts(raw: &str) -> Result<Vec<Account>> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(raw).context("principals must be a JSON array")?;

    values
        .into_iter()
        .enumerate()
        .map(|(idx, mut value)| {
            if let Some(id) = value.get_mut("id") {
                if let Some(n) = id.as_u64() {
                    *id = serde_json::Value::String(n.to_string());
                }
            }
            serde_json::from_value::<Account>(value)
                .with_context(|| format!("invalid principal at index {idx}"))
        })
        .collect()
}

/// Load the provider from `path`, or an empty one when no path is configured.
pub fn load_provider(path: Option<&Path>) -> Result<StaticPrincipalProvider<Account>> {
    let Some(path) = path else {
        return Ok(StaticPrincipalProvider::new(Vec::new()));
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read principals file {}", path.display()))?;
    Ok(StaticPrincipalProvider::new(parse_accounts(&raw)?))
}
