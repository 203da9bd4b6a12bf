//! Compilation of a mapping specification into its configuration artifacts
//!
//! A run validates the whole specification and builds every artifact in memory
//! before anything is written, so a failed run leaves no partial output behind.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::audit::{AuditColumnProvider, DataAreasFile};
use crate::config::{Config, OutputConfig};
use crate::error::Result;
use crate::generate::{self, ColumnMappingSet, GenerateContext, PipelineLinkage, TargetSchema, TargetTableList};
use crate::introspect::MssqlIntrospector;
use crate::loader::{self, FileType};
use crate::resolver::{ResolveSchema, SchemaResolver, schema_file_name};
use crate::rules::{DataType, Rules, Tier};
use crate::schema::SourceSchema;
use crate::secrets::EnvSecretStore;
use crate::spec::MappingSpecification;
use crate::store::ArtifactStore;
use crate::validate::validate;

/// Every artifact produced for one domain and data area
#[derive(Debug, Clone)]
pub struct CompiledArtifacts {
    pub domain: String,
    pub tier: Tier,
    pub target_tables: TargetTableList,
    /// Source schemas as echoed next to the target artifacts, with their file names
    pub source_schemas: Vec<(String, SourceSchema)>,
    pub target_schemas: Vec<TargetSchema>,
    pub pipelines: Vec<PipelineLinkage>,
    pub mappings: Vec<ColumnMappingSet>,
}

impl CompiledArtifacts {
    /// Write all artifacts, returning file names in write order
    pub fn write(&self, store: &ArtifactStore) -> Result<Vec<String>> {
        let mut written = Vec::new();

        info!(domain = %self.domain, tier = %self.tier, "Writing target tables configuration");
        written.push(self.save(store, self.target_tables.file_name(&self.domain), &self.target_tables)?);

        info!("Writing source schema configuration files");
        for (file_name, schema) in &self.source_schemas {
            written.push(self.save(store, file_name.clone(), schema)?);
        }

        info!("Writing target schema configuration files");
        for schema in &self.target_schemas {
            written.push(self.save(store, schema.file_name(self.tier), schema)?);
        }

        info!("Writing pipeline configuration files");
        for pipeline in &self.pipelines {
            written.push(self.save(store, pipeline.file_name(), pipeline)?);
        }

        info!("Writing mapping configuration files");
        for mapping in &self.mappings {
            written.push(self.save(store, mapping.file_name(), mapping)?);
        }

        Ok(written)
    }

    fn save<T: Serialize>(&self, store: &ArtifactStore, file_name: String, value: &T) -> Result<String> {
        store.save(&self.domain, self.tier, &file_name, value)?;
        Ok(file_name)
    }
}

/// Compiles specifications against a fixed set of rules and collaborators
pub struct Compiler<'a> {
    rules: &'a Rules,
    output: &'a OutputConfig,
    resolver: &'a dyn ResolveSchema,
    audit: &'a dyn AuditColumnProvider,
}

impl<'a> Compiler<'a> {
    pub fn new(
        rules: &'a Rules,
        output: &'a OutputConfig,
        resolver: &'a dyn ResolveSchema,
        audit: &'a dyn AuditColumnProvider,
    ) -> Self {
        Self {
            rules,
            output,
            resolver,
            audit,
        }
    }

    /// Validate a specification and generate all artifacts for it
    pub fn compile(&self, spec: MappingSpecification, domain: &str, tier: Tier) -> Result<CompiledArtifacts> {
        let validated = validate(spec, domain, tier, self.rules, self.resolver)?;
        let ctx = GenerateContext {
            domain,
            tier,
            rules: self.rules,
            spec: &validated.spec,
            schemas: &validated.schemas,
        };

        info!(domain, %tier, "Generating target tables configuration");
        let target_tables = generate::tables::generate(&ctx, self.output);

        info!(domain, %tier, "Generating source schema configuration");
        let source_schemas = self.echo_source_schemas(&ctx);

        info!(domain, %tier, "Generating target schema configuration");
        let target_schemas = generate::target_schema::generate(&ctx, self.audit)?;

        info!(domain, %tier, "Generating pipeline configuration");
        let pipelines = generate::pipeline::generate(&ctx, &self.output.table_path)?;

        info!(domain, %tier, "Generating mapping configuration");
        let mappings = generate::mapping::generate(&ctx)?;

        Ok(CompiledArtifacts {
            domain: domain.to_string(),
            tier,
            target_tables,
            source_schemas,
            target_schemas,
            pipelines,
            mappings,
        })
    }

    /// Copies of the resolved source schemas in first-seen order, named after the
    /// first target table each one feeds. Landing-zone files are delimited text,
    /// so their columns are all typed as strings.
    fn echo_source_schemas(&self, ctx: &GenerateContext<'_>) -> Vec<(String, SourceSchema)> {
        let Some(upstream) = self.rules.upstream_of(ctx.tier) else {
            return Vec::new();
        };

        ctx.spec
            .source_tables()
            .iter()
            .filter_map(|source_table| {
                let schema = ctx.schemas.get(source_table)?;
                let target = ctx
                    .spec
                    .rows_for_source(source_table)
                    .find_map(|r| r.target_table.as_deref())?;

                let mut echo = schema.clone();
                if upstream == Tier::LandingZone {
                    for column in &mut echo.columns {
                        column.data_type = DataType::String.as_str().to_string();
                    }
                }
                debug!(%source_table, target, "Echoing source schema");
                Some((schema_file_name(upstream, target), echo))
            })
            .collect()
    }
}

/// Load, validate, compile and write a mapping file with the configured collaborators
pub fn run(config: &Config, input: &Path, file_type: FileType, domain: &str, tier: Tier) -> Result<Vec<String>> {
    info!(input = %input.display(), "Validating mapping file");
    let spec = loader::load(input, file_type)?;

    let store = ArtifactStore::open(&config.output_dir);
    let secrets = EnvSecretStore;
    let introspector = MssqlIntrospector;
    let resolver = SchemaResolver::new(&config.rules, &config.source, &store, &secrets, &introspector);
    let audit = DataAreasFile::new(config.data_areas_path());

    let compiler = Compiler::new(&config.rules, &config.output, &resolver, &audit);
    let artifacts = compiler.compile(spec, domain, tier)?;

    info!(input = %input.display(), "Processing mapping file");
    artifacts.write(&store)
}
