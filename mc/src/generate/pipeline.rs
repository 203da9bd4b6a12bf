//! Pipeline linkage between an upstream table and its target table

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::GenerateContext;
use crate::error::{MapError, Result};
use crate::rules::Tier;

/// Connects one source table in the upstream data area to one target table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineLinkage {
    pub source_data_area: Tier,
    pub source_table_path: String,
    pub source_table_name: String,
    pub target_data_area: Tier,
    pub target_table_path: String,
    pub target_table_name: String,
}

impl PipelineLinkage {
    pub fn file_name(&self) -> String {
        format!("{}_pipeline_{}.json", self.target_data_area, self.target_table_name)
    }
}

/// One linkage per distinct (source table, target table) pair, in file order
pub fn generate(ctx: &GenerateContext<'_>, table_path: &str) -> Result<Vec<PipelineLinkage>> {
    let upstream = ctx.rules.upstream_of(ctx.tier).ok_or_else(|| MapError::PipelineGeneration {
        message: format!("no upstream data area for {}", ctx.tier),
    })?;

    let mut seen = HashSet::new();
    let mut targets = HashSet::new();
    let mut linkages = Vec::new();

    for row in &ctx.spec.rows {
        let (Some(source), Some(target)) = (&row.source_table, &row.target_table) else {
            continue;
        };
        if !seen.insert((source.as_str(), target.as_str())) {
            continue;
        }
        if !targets.insert(target.as_str()) {
            warn!(table = %target, %source, "Target table is fed by more than one source table");
        }

        linkages.push(PipelineLinkage {
            source_data_area: upstream,
            source_table_path: table_path.to_string(),
            source_table_name: source.clone(),
            target_data_area: ctx.tier,
            target_table_path: table_path.to_string(),
            target_table_name: target.clone(),
        });
    }

    Ok(linkages)
}
