//! Secret lookup for source database credentials

use tracing::debug;

use crate::error::{MapError, Result};

/// A store of named secrets grouped by vault
pub trait SecretStore {
    fn get_secret(&self, vault: &str, name: &str) -> Result<String>;
}

/// Secrets exported as environment variables
///
/// A secret `name` in `vault` is read from `<VAULT>__<NAME>`, upper-cased with
/// every non-alphanumeric character replaced by `_`.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore;

/// Environment variable holding a vault secret
pub fn secret_env_var(vault: &str, name: &str) -> String {
    let normalize = |s: &str| -> String {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect()
    };
    format!("{}__{}", normalize(vault), normalize(name))
}

impl SecretStore for EnvSecretStore {
    fn get_secret(&self, vault: &str, name: &str) -> Result<String> {
        let var = secret_env_var(vault, name);
        debug!(%var, "Reading secret from environment");
        match std::env::var(&var) {
            Ok(value) if !value.is_empty() => Ok(value),
            Ok(_) => Err(MapError::Secret {
                vault: vault.to_string(),
                name: name.to_string(),
                message: format!("{} is empty", var),
            }),
            Err(e) => Err(MapError::Secret {
                vault: vault.to_string(),
                name: name.to_string(),
                message: format!("{}: {}", var, e),
            }),
        }
    }
}
