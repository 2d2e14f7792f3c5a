use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Resource families the cost estimator knows how to price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ResourceKind {
    #[cfg_attr(feature = "serde", serde(rename = "EC2"))]
    Ec2Instance,
    #[cfg_attr(feature = "serde", serde(rename = "EBSVolumes"))]
    EbsVolume,
    #[cfg_attr(feature = "serde", serde(rename = "ElasticIP"))]
    ElasticIp,
    #[cfg_attr(feature = "serde", serde(rename = "ELB"))]
    LoadBalancer,
    #[cfg_attr(feature = "serde", serde(rename = "DynamoDB"))]
    DynamoDbTable,
    #[cfg_attr(feature = "serde", serde(rename = "OpenSearch"))]
    OpenSearchDomain,
    #[cfg_attr(feature = "serde", serde(rename = "NATGateway"))]
    NatGateway,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Ec2Instance,
        ResourceKind::EbsVolume,
        ResourceKind::ElasticIp,
        ResourceKind::LoadBalancer,
        ResourceKind::DynamoDbTable,
        ResourceKind::OpenSearchDomain,
        ResourceKind::NatGateway,
    ];

    /// Stable tag used in cache keys, inventories and the CLI.
    pub fn tag(&self) -> &'static str {
        match self {
            ResourceKind::Ec2Instance => "EC2",
            ResourceKind::EbsVolume => "EBSVolumes",
            ResourceKind::ElasticIp => "ElasticIP",
            ResourceKind::LoadBalancer => "ELB",
            ResourceKind::DynamoDbTable => "DynamoDB",
            ResourceKind::OpenSearchDomain => "OpenSearch",
            ResourceKind::NatGateway => "NATGateway",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ResourceKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| ModelError::UnsupportedResourceType(s.to_string()))
    }
}

/// Size discriminator of a resource.
///
/// Storage-like resources carry a capacity (GiB), compute-like resources
/// carry a variant such as an instance type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ResourceSize {
    Capacity(i64),
    Variant(String),
    #[default]
    Unspecified,
}

impl ResourceSize {
    pub fn capacity(&self) -> Option<i64> {
        match self {
            ResourceSize::Capacity(size) => Some(*size),
            _ => None,
        }
    }

    pub fn variant(&self) -> Option<&str> {
        match self {
            ResourceSize::Variant(variant) => Some(variant),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ResourceSize::Capacity(_) => "capacity",
            ResourceSize::Variant(_) => "variant",
            ResourceSize::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for ResourceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceSize::Capacity(size) => write!(f, "{size}"),
            ResourceSize::Variant(variant) => f.write_str(variant),
            ResourceSize::Unspecified => f.write_str("none"),
        }
    }
}

impl From<i64> for ResourceSize {
    fn from(size: i64) -> Self {
        ResourceSize::Capacity(size)
    }
}

impl From<&str> for ResourceSize {
    fn from(variant: &str) -> Self {
        ResourceSize::Variant(variant.to_string())
    }
}

impl From<String> for ResourceSize {
    fn from(variant: String) -> Self {
        ResourceSize::Variant(variant)
    }
}

/// Input to a cost calculation.
///
/// Only the fields relevant to `resource_type` are read; the rest keep their
/// defaults and are ignored.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResourceCostConfig {
    pub resource_type: ResourceKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub resource_size: ResourceSize,
    pub region: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub creation_time: Option<DateTime<Utc>>,
    /// Block storage volume type (gp2, gp3, io1, ...).
    #[cfg_attr(feature = "serde", serde(default))]
    pub volume_type: String,
    /// Load balancer flavour (application, network, classic).
    #[cfg_attr(feature = "serde", serde(default))]
    pub lb_type: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub processed_gb: f64,
    /// Node count for search clusters.
    #[cfg_attr(feature = "serde", serde(default))]
    pub instance_count: i64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub storage_size: i64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub multi_az: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub engine: String,
}

impl ResourceCostConfig {
    pub fn new(resource_type: ResourceKind, region: impl Into<String>) -> Self {
        Self {
            resource_type,
            resource_size: ResourceSize::Unspecified,
            region: region.into(),
            creation_time: None,
            volume_type: String::new(),
            lb_type: String::new(),
            processed_gb: 0.0,
            instance_count: 0,
            storage_size: 0,
            multi_az: false,
            engine: String::new(),
        }
    }

    pub fn with_size(mut self, size: impl Into<ResourceSize>) -> Self {
        self.resource_size = size.into();
        self
    }

    pub fn with_creation_time(mut self, created: DateTime<Utc>) -> Self {
        self.creation_time = Some(created);
        self
    }

    pub fn with_volume_type(mut self, volume_type: impl Into<String>) -> Self {
        self.volume_type = volume_type.into();
        self
    }

    pub fn with_lb_type(mut self, lb_type: impl Into<String>) -> Self {
        self.lb_type = lb_type.into();
        self
    }

    pub fn with_instance_count(mut self, count: i64) -> Self {
        self.instance_count = count;
        self
    }
}
