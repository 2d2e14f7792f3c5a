//! Scanners backed by a JSON resource inventory.
//!
//! The inventory is a snapshot of the resources of one or more accounts,
//! typically exported by a separate collector. Each [`InventoryScanner`]
//! reports the records of its resource family that are unattached and have
//! been idle for at least the requested number of days.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cloudsift_model::{
    Account, ResourceCostConfig, ResourceKind, ResourceSize, ScanResult, ScanResults,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ignore::IgnoreRules;
use super::registry::ScannerRegistry;
use super::scanner::{ScanOptions, Scanner};
use crate::error::{CoreError, Result};
use crate::pricing::CostEstimator;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub resources: Vec<InventoryRecord>,
}

/// One resource as captured by the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub account_id: String,
    pub region: String,
    pub kind: ResourceKind,
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Capacity in GiB or instance type, depending on the kind.
    #[serde(default)]
    pub size: ResourceSize,
    #[serde(default)]
    pub volume_type: String,
    #[serde(default)]
    pub lb_type: String,
    #[serde(default)]
    pub instance_count: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
    /// Whether the resource is currently attached or serving traffic.
    #[serde(default)]
    pub attached: bool,
    #[serde(default)]
    pub details: BTreeMap<String, String>,
}

impl InventoryRecord {
    /// Whole days since the resource was last used, falling back to its
    /// creation time. `None` when neither is known.
    pub fn idle_days(&self, now: DateTime<Utc>) -> Option<i64> {
        let since = self.last_used_at.or(self.created_at)?;
        Some((now - since).num_days())
    }

    pub fn cost_config(&self) -> ResourceCostConfig {
        let mut config = ResourceCostConfig::new(self.kind, self.region.clone())
            .with_size(self.size.clone())
            .with_volume_type(self.volume_type.clone())
            .with_lb_type(self.lb_type.clone())
            .with_instance_count(self.instance_count);
        config.creation_time = self.created_at;
        config
    }

    fn reason(&self, idle_days: i64) -> String {
        match self.last_used_at {
            Some(_) => format!("Not used in {idle_days} days"),
            None => format!("Never used since creation {idle_days} days ago"),
        }
    }

    fn result_details(&self) -> BTreeMap<String, String> {
        let mut details = self.details.clone();
        details.insert("region".to_string(), self.region.clone());
        if self.size != ResourceSize::Unspecified {
            details.insert("size".to_string(), self.size.to_string());
        }
        if !self.volume_type.is_empty() {
            details.insert("volume_type".to_string(), self.volume_type.clone());
        }
        if !self.lb_type.is_empty() {
            details.insert("lb_type".to_string(), self.lb_type.clone());
        }
        if self.instance_count > 0 {
            details.insert("instance_count".to_string(), self.instance_count.to_string());
        }
        if let Some(created) = self.created_at {
            details.insert("created_at".to_string(), created.to_rfc3339());
        }
        if let Some(last_used) = self.last_used_at {
            details.insert("last_used_at".to_string(), last_used.to_rfc3339());
        }
        details
    }
}

impl Inventory {
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| CoreError::Inventory {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;
        serde_json::from_slice(&bytes).map_err(|err| CoreError::Inventory {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }

    /// Declared accounts plus any account only referenced by a resource,
    /// sorted by id.
    pub fn accounts(&self) -> Vec<Account> {
        let mut accounts: BTreeMap<&str, Account> = self
            .accounts
            .iter()
            .map(|account| (account.id.as_str(), account.clone()))
            .collect();
        for record in &self.resources {
            accounts
                .entry(record.account_id.as_str())
                .or_insert_with(|| Account::new(&record.account_id, &record.account_id));
        }
        accounts.into_values().collect()
    }

    /// Distinct regions referenced by resources, sorted.
    pub fn regions(&self) -> Vec<String> {
        self.resources
            .iter()
            .map(|record| record.region.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn records<'a>(
        &'a self,
        kind: ResourceKind,
        account_id: &'a str,
        region: &'a str,
    ) -> impl Iterator<Item = &'a InventoryRecord> + 'a {
        self.resources.iter().filter(move |record| {
            record.kind == kind && record.account_id == account_id && record.region == region
        })
    }
}

/// Scanner name and label of each resource family.
fn scanner_names(kind: ResourceKind) -> (&'static str, &'static str) {
    match kind {
        ResourceKind::Ec2Instance => ("ec2-instances", "EC2 Instances"),
        ResourceKind::EbsVolume => ("ebs-volumes", "EBS Volumes"),
        ResourceKind::ElasticIp => ("elastic-ips", "Elastic IPs"),
        ResourceKind::LoadBalancer => ("elb", "Elastic Load Balancers"),
        ResourceKind::DynamoDbTable => ("dynamodb", "DynamoDB Tables"),
        ResourceKind::OpenSearchDomain => ("opensearch", "OpenSearch Domains"),
        ResourceKind::NatGateway => ("nat-gateways", "NAT Gateways"),
    }
}

pub struct InventoryScanner {
    kind: ResourceKind,
    argument_name: &'static str,
    label: &'static str,
    inventory: Arc<Inventory>,
    estimator: Option<Arc<CostEstimator>>,
    ignore: Arc<IgnoreRules>,
}

impl std::fmt::Debug for InventoryScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryScanner")
            .field("kind", &self.kind)
            .field("estimates_cost", &self.estimator.is_some())
            .finish_non_exhaustive()
    }
}

impl InventoryScanner {
    pub fn new(
        kind: ResourceKind,
        inventory: Arc<Inventory>,
        estimator: Option<Arc<CostEstimator>>,
        ignore: Arc<IgnoreRules>,
    ) -> Self {
        let (argument_name, label) = scanner_names(kind);
        Self {
            kind,
            argument_name,
            label,
            inventory,
            estimator,
            ignore,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    async fn to_result(&self, record: &InventoryRecord, idle_days: i64) -> ScanResult {
        let mut result = ScanResult {
            resource_type: self.label.to_string(),
            resource_name: record.name.clone(),
            resource_id: record.id.clone(),
            reason: record.reason(idle_days),
            account_id: record.account_id.clone(),
            tags: record.tags.clone(),
            details: record.result_details(),
            ..ScanResult::default()
        };

        if let Some(estimator) = &self.estimator {
            match estimator.calculate_cost(&record.cost_config()).await {
                Ok(cost) => result.cost = Some(cost),
                Err(err) => warn!(
                    target: "scan",
                    resource_id = %record.id,
                    resource_type = %self.kind,
                    region = %record.region,
                    error = %err,
                    "failed to estimate cost"
                ),
            }
        }

        result
    }
}

#[async_trait]
impl Scanner for InventoryScanner {
    fn argument_name(&self) -> &str {
        self.argument_name
    }

    fn label(&self) -> &str {
        self.label
    }

    async fn scan(&self, options: ScanOptions) -> anyhow::Result<ScanResults> {
        let now = Utc::now();
        let threshold = i64::from(options.days_unused);
        let mut results = Vec::new();

        for record in self
            .inventory
            .records(self.kind, &options.account_id, &options.region)
        {
            if self.ignore.matches(&record.id, &record.name, &record.tags) {
                debug!(target: "scan", resource_id = %record.id, "resource ignored by rule");
                continue;
            }
            if record.attached {
                continue;
            }
            let Some(idle_days) = record.idle_days(now) else {
                debug!(target: "scan", resource_id = %record.id, "no usage timestamps, skipping");
                continue;
            };
            if idle_days < threshold {
                continue;
            }

            results.push(self.to_result(record, idle_days).await);
        }

        Ok(results)
    }
}

/// One scanner per resource family over a shared inventory.
pub fn inventory_scanners(
    inventory: Arc<Inventory>,
    estimator: Option<Arc<CostEstimator>>,
    ignore: Arc<IgnoreRules>,
) -> Vec<Arc<dyn Scanner>> {
    ResourceKind::ALL
        .into_iter()
        .map(|kind| {
            Arc::new(InventoryScanner::new(
                kind,
                Arc::clone(&inventory),
                estimator.clone(),
                Arc::clone(&ignore),
            )) as Arc<dyn Scanner>
        })
        .collect()
}

pub fn register_inventory_scanners(
    registry: &ScannerRegistry,
    inventory: Arc<Inventory>,
    estimator: Option<Arc<CostEstimator>>,
    ignore: Arc<IgnoreRules>,
) {
    for scanner in inventory_scanners(inventory, estimator, ignore) {
        registry.register(scanner);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::pricing::PriceCache;
    use crate::pricing::client::MockPricingClient;
    use crate::pricing::rate_limit::MockRateLimit;

    fn record(id: &str, kind: ResourceKind, idle_days: i64, attached: bool) -> InventoryRecord {
        InventoryRecord {
            account_id: "111111111111".to_string(),
            region: "us-east-1".to_string(),
            kind,
            id: id.to_string(),
            name: format!("{id}-name"),
            tags: BTreeMap::new(),
            size: ResourceSize::Capacity(100),
            volume_type: "gp3".to_string(),
            lb_type: String::new(),
            instance_count: 0,
            created_at: Some(Utc::now() - Duration::days(idle_days + 30)),
            last_used_at: Some(Utc::now() - Duration::days(idle_days)),
            attached,
            details: BTreeMap::new(),
        }
    }

    fn options(days_unused: u32) -> ScanOptions {
        ScanOptions {
            region: "us-east-1".to_string(),
            days_unused,
            account_id: "111111111111".to_string(),
        }
    }

    fn scanner(kind: ResourceKind, inventory: Inventory, ignore: IgnoreRules) -> InventoryScanner {
        InventoryScanner::new(kind, Arc::new(inventory), None, Arc::new(ignore))
    }

    #[tokio::test]
    async fn reports_detached_idle_resources_only() {
        let mut elsewhere = record("vol-elsewhere", ResourceKind::EbsVolume, 200, false);
        elsewhere.region = "eu-west-1".to_string();
        let inventory = Inventory {
            accounts: Vec::new(),
            resources: vec![
                record("vol-idle", ResourceKind::EbsVolume, 120, false),
                record("vol-attached", ResourceKind::EbsVolume, 120, true),
                record("vol-recent", ResourceKind::EbsVolume, 10, false),
                record("i-idle", ResourceKind::Ec2Instance, 120, false),
                elsewhere,
            ],
        };

        let results = scanner(ResourceKind::EbsVolume, inventory, IgnoreRules::default())
            .scan(options(90))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].resource_id, "vol-idle");
        assert_eq!(results[0].resource_type, "EBS Volumes");
        assert_eq!(results[0].reason, "Not used in 120 days");
        assert_eq!(results[0].details["volume_type"], "gp3");
        assert!(results[0].cost.is_none());
    }

    #[tokio::test]
    async fn ignore_rules_are_honoured() {
        let mut tagged = record("vol-tagged", ResourceKind::EbsVolume, 120, false);
        tagged
            .tags
            .insert("keep".to_string(), "yes".to_string());
        let inventory = Inventory {
            accounts: Vec::new(),
            resources: vec![
                record("vol-by-id", ResourceKind::EbsVolume, 120, false),
                tagged,
                record("vol-reported", ResourceKind::EbsVolume, 120, false),
            ],
        };
        let ignore = IgnoreRules::new(
            ["vol-by-id".to_string()],
            Vec::new(),
            BTreeMap::from([("keep".to_string(), "yes".to_string())]),
        );

        let results = scanner(ResourceKind::EbsVolume, inventory, ignore)
            .scan(options(30))
            .await
            .unwrap();

        let ids: Vec<_> = results.iter().map(|r| r.resource_id.as_str()).collect();
        assert_eq!(ids, vec!["vol-reported"]);
    }

    #[tokio::test]
    async fn results_carry_estimated_cost() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = MockPricingClient::new();
        client.expect_get_products().never();
        let mut limiter = MockRateLimit::new();
        limiter.expect_wait().never();
        let estimator = CostEstimator::new(
            Arc::new(client),
            Arc::new(limiter),
            Arc::new(PriceCache::new(dir.path().join("costs.json"))),
        );

        let inventory = Inventory {
            accounts: Vec::new(),
            resources: vec![record("eipalloc-1", ResourceKind::ElasticIp, 45, false)],
        };
        let scanner = InventoryScanner::new(
            ResourceKind::ElasticIp,
            Arc::new(inventory),
            Some(Arc::new(estimator)),
            Arc::new(IgnoreRules::default()),
        );

        let results = scanner.scan(options(30)).await.unwrap();
        let cost = results[0].cost.unwrap();
        assert_eq!(cost.hourly_rate, 0.005);
        assert!(cost.lifetime.is_some());
    }

    #[test]
    fn accounts_include_undeclared_owners() {
        let inventory: Inventory = serde_json::from_str(
            r#"{
                "accounts": [{"id": "222222222222", "name": "prod"}],
                "resources": [
                    {"account_id": "111111111111", "region": "us-west-2", "kind": "ELB", "id": "lb-1"},
                    {"account_id": "222222222222", "region": "us-east-1", "kind": "EBSVolumes", "id": "vol-1", "size": 20}
                ]
            }"#,
        )
        .unwrap();

        let accounts = inventory.accounts();
        assert_eq!(
            accounts,
            vec![
                Account::new("111111111111", "111111111111"),
                Account::new("222222222222", "prod"),
            ]
        );
        assert_eq!(inventory.regions(), vec!["us-east-1", "us-west-2"]);
        assert_eq!(inventory.resources[1].size, ResourceSize::Capacity(20));
        assert_eq!(inventory.resources[0].size, ResourceSize::Unspecified);
    }
}
