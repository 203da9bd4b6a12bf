//! Target table list

use serde::{Deserialize, Serialize};

use super::GenerateContext;
use crate::config::OutputConfig;
use crate::rules::Tier;

/// How the pipeline loads a data area's tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Ingest,
    Merge,
}

impl Action {
    pub fn for_tier(tier: Tier) -> Self {
        if tier.merges() { Action::Merge } else { Action::Ingest }
    }
}

/// The tables a data area processes for one domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetTableList {
    pub action: Action,
    pub target_data_area: Tier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_storage_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_vault_name: Option<String>,
    pub target_table_list: Vec<String>,
}

impl TargetTableList {
    pub fn file_name(&self, domain: &str) -> String {
        format!("{}_target_tables_{}.json", self.target_data_area, domain)
    }
}

pub fn generate(ctx: &GenerateContext<'_>, output: &OutputConfig) -> TargetTableList {
    TargetTableList {
        action: Action::for_tier(ctx.tier),
        target_data_area: ctx.tier,
        config_storage_account: output.config_storage_account.clone(),
        key_vault_name: output.key_vault_name.clone(),
        target_table_list: ctx.spec.target_tables(),
    }
}
