//! Source schema resolution
//!
//! The schema of a source table comes from whichever data area feeds the target:
//! a live catalog query for the landing zone, or the target schema artifact a
//! previous run wrote for bronze and silver.

use tracing::info;

use crate::config::SourceConfig;
use crate::error::{MapError, Result};
use crate::introspect::TableIntrospector;
use crate::rules::{Rules, Tier};
use crate::schema::SourceSchema;
use crate::secrets::SecretStore;
use crate::store::ArtifactStore;

/// Resolves the schema of a source table for a target data area
pub trait ResolveSchema {
    fn resolve(&self, domain: &str, target: Tier, source_table: &str) -> Result<SourceSchema>;
}

/// File name of the schema artifact a data area publishes for a table
pub fn schema_file_name(tier: Tier, table: &str) -> String {
    format!("{}_schema_{}.json", tier, table)
}

/// Resolver backed by a secret store, a catalog introspector and the artifact store
pub struct SchemaResolver<'a> {
    rules: &'a Rules,
    source: &'a SourceConfig,
    store: &'a ArtifactStore,
    secrets: &'a dyn SecretStore,
    introspector: &'a dyn TableIntrospector,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(
        rules: &'a Rules,
        source: &'a SourceConfig,
        store: &'a ArtifactStore,
        secrets: &'a dyn SecretStore,
        introspector: &'a dyn TableIntrospector,
    ) -> Self {
        Self {
            rules,
            source,
            store,
            secrets,
            introspector,
        }
    }

    fn introspect(&self, domain: &str, source_table: &str) -> Result<SourceSchema> {
        let (vault, secret) = match (&self.source.key_vault, &self.source.secret_name) {
            (Some(vault), Some(secret)) => (vault.as_str(), secret.as_str()),
            _ => {
                return Err(MapError::Secret {
                    vault: self.source.key_vault.clone().unwrap_or_default(),
                    name: self.source.secret_name.clone().unwrap_or_default(),
                    message: "source key vault and secret name must be configured".to_string(),
                });
            }
        };

        let connection = self.secrets.get_secret(vault, secret)?;
        let columns = self.introspector.table_schema(&connection, source_table)?;
        Ok(SourceSchema::new(domain, source_table, columns))
    }

    fn load_artifact(&self, domain: &str, upstream: Tier, source_table: &str) -> Result<SourceSchema> {
        let path = self
            .store
            .artifact_path(domain, upstream, &schema_file_name(upstream, source_table));
        self.store.load(&path)
    }
}

impl ResolveSchema for SchemaResolver<'_> {
    fn resolve(&self, domain: &str, target: Tier, source_table: &str) -> Result<SourceSchema> {
        let upstream = self.rules.upstream_of(target);
        info!(?upstream, source_table, "Generating source schema");

        match upstream {
            Some(Tier::LandingZone) => self.introspect(domain, source_table),
            Some(upstream @ (Tier::Bronze | Tier::Silver)) => self.load_artifact(domain, upstream, source_table),
            _ => Err(MapError::UnresolvedSchema { target }),
        }
    }
}
