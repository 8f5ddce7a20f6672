//! Credential provisioning
//!
//! Secrets are hashed with bcrypt before they reach the store. Field
//! agents get a 4-digit PIN, every other role a password. Each identity
//! is provisioned independently: one failure never stops the rest.

use promo_common::config::is_pin;
use promo_common::db::{Area, Role};
use promo_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

use crate::db::accounts::{self, AccountFields};

pub const MIN_PASSWORD_LEN: usize = 6;

/// One identity to provision
#[derive(Clone, Deserialize)]
pub struct Identity {
    pub email: String,
    pub name: String,
    pub secret: String,
    pub role: Role,
    #[serde(default)]
    pub area: Option<Area>,
    #[serde(default)]
    pub sator: Option<String>,
}

// Keep the plaintext secret out of logs and panics
impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .field("role", &self.role)
            .field("area", &self.area)
            .field("sator", &self.sator)
            .finish()
    }
}

/// TOML list of identities: `[[identity]]` tables
#[derive(Debug, Deserialize)]
pub struct CredentialFile {
    #[serde(rename = "identity", default)]
    pub identities: Vec<Identity>,
}

impl CredentialFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            Error::InvalidInput(format!("Invalid credential file {}: {}", path.display(), e))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvisionAction {
    Created,
    Updated,
}

/// Per-identity result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionOutcome {
    pub email: String,
    pub success: bool,
    pub action: Option<ProvisionAction>,
    pub message: String,
}

impl fmt::Display for ProvisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.success { "ok  " } else { "FAIL" };
        write!(f, "[{}] {} - {}", mark, self.email, self.message)
    }
}

/// Check the secret's shape for the role, then bcrypt it
pub fn hash_secret(secret: &str, role: Role, cost: u32) -> Result<String> {
    if role.uses_pin() {
        if !is_pin(secret) {
            return Err(Error::Credential("PIN must be exactly four digits".to_string()));
        }
    } else if secret.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::Credential(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    bcrypt::hash(secret, cost).map_err(|e| Error::Credential(format!("hashing failed: {}", e)))
}

/// Compare a plaintext secret with a stored hash
pub fn verify_secret(secret: &str, hash: &str) -> bool {
    bcrypt::verify(secret, hash).unwrap_or(false)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn provision_one(pool: &SqlitePool, identity: &Identity, cost: u32) -> Result<ProvisionAction> {
    let email = normalize_email(&identity.email);
    if email.is_empty() {
        return Err(Error::InvalidInput("email is blank".to_string()));
    }
    if identity.name.trim().is_empty() {
        return Err(Error::InvalidInput("name is blank".to_string()));
    }

    let secret_hash = hash_secret(&identity.secret, identity.role, cost)?;
    let existed = accounts::id_for_email(pool, &email).await?.is_some();

    accounts::upsert_account(
        pool,
        &AccountFields {
            email: &email,
            name: identity.name.trim(),
            role: identity.role,
            area: identity.area,
            sator: identity.sator.as_deref().map(str::trim),
            secret_hash: &secret_hash,
        },
    )
    .await?;

    Ok(if existed {
        ProvisionAction::Updated
    } else {
        ProvisionAction::Created
    })
}

/// Provision every identity, collecting one outcome each
pub async fn provision(pool: &SqlitePool, identities: &[Identity], cost: u32) -> Vec<ProvisionOutcome> {
    let mut outcomes = Vec::with_capacity(identities.len());

    for identity in identities {
        let email = normalize_email(&identity.email);
        let outcome = match provision_one(pool, identity, cost).await {
            Ok(action) => {
                info!(email = %email, role = %identity.role, ?action, "Provisioned account");
                ProvisionOutcome {
                    email,
                    success: true,
                    action: Some(action),
                    message: match action {
                        ProvisionAction::Created => format!("created as {}", identity.role),
                        ProvisionAction::Updated => format!("updated as {}", identity.role),
                    },
                }
            }
            Err(e) => {
                warn!(email = %email, error = %e, "Provisioning failed");
                ProvisionOutcome {
                    email,
                    success: false,
                    action: None,
                    message: e.to_string(),
                }
            }
        };
        outcomes.push(outcome);
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_shape_enforced_for_promoters() {
        assert!(hash_secret("1234", Role::Promoter, 4).is_ok());
        assert!(hash_secret("12345", Role::Promoter, 4).is_err());
        assert!(hash_secret("abcd", Role::Promoter, 4).is_err());
    }

    #[test]
    fn test_password_length_enforced() {
        assert!(hash_secret("short", Role::AreaManager, 4).is_err());
        let hash = hash_secret("rahasia123", Role::AreaManager, 4).unwrap();
        assert_ne!(hash, "rahasia123");
        assert!(verify_secret("rahasia123", &hash));
        assert!(!verify_secret("rahasia124", &hash));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let identity = Identity {
            email: "a@b".into(),
            name: "A".into(),
            secret: "topsecret".into(),
            role: Role::TopAdmin,
            area: None,
            sator: None,
        };
        let debug = format!("{:?}", identity);
        assert!(!debug.contains("topsecret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_parse_credential_file() {
        let file: CredentialFile = toml::from_str(
            r#"
            [[identity]]
            email = "manager.kupang@promo.local"
            name = "Manager Kupang"
            secret = "rahasia123"
            role = "manager_area"
            area = "KUPANG"

            [[identity]]
            email = "sator.andi@promo.local"
            name = "Andi"
            secret = "rahasia123"
            role = "sator"
            area = "SUMBA"
            sator = "Andi"
            "#,
        )
        .unwrap();
        assert_eq!(file.identities.len(), 2);
        assert_eq!(file.identities[0].role, Role::AreaManager);
        assert_eq!(file.identities[1].area, Some(Area::Sumba));
    }
}
