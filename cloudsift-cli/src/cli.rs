use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use cloudsift_config::{Config, LogFormat};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "cloudsift")]
#[command(about = "Find unused cloud resources and estimate what they cost")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to a cloudsift.toml configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of concurrent scan workers (overrides config)
    #[arg(long, global = true)]
    pub max_workers: Option<usize>,

    /// Log filter, e.g. info or cloudsift=debug (RUST_LOG wins when set)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log output format: text or json
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,
}

impl GlobalArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(max_workers) = self.max_workers {
            config.max_workers = max_workers;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan the inventory for unused resources and write JSON reports
    Scan(ScanArgs),
    /// List available components
    #[command(subcommand)]
    List(ListCommand),
    /// Estimate the cost of a single resource
    Estimate(EstimateArgs),
    /// Write starter configuration files
    #[command(subcommand)]
    Init(InitCommand),
    /// Print the version and exit
    Version,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Comma-separated regions to scan (default: every region in the inventory)
    #[arg(long, value_delimiter = ',')]
    pub regions: Vec<String>,

    /// Comma-separated scanners to run (default: all)
    #[arg(long, value_delimiter = ',')]
    pub scanners: Vec<String>,

    /// Minimum idle days before a resource is reported
    #[arg(long)]
    pub days_unused: Option<u32>,

    /// Inventory file to scan
    #[arg(long)]
    pub inventory: Option<PathBuf>,

    /// Directory reports are written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Skip price lookups; results are reported without cost
    #[arg(long, default_value_t = false)]
    pub skip_cost: bool,
}

impl ScanArgs {
    pub fn apply(&self, config: &mut Config) {
        if !self.regions.is_empty() {
            config.scan.regions = self.regions.clone();
        }
        if !self.scanners.is_empty() {
            config.scan.scanners = self.scanners.clone();
        }
        if let Some(days) = self.days_unused {
            config.scan.days_unused = days;
        }
        if let Some(inventory) = &self.inventory {
            config.scan.inventory = inventory.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ListCommand {
    /// List the scanners selectable with `scan --scanners`
    Scanners,
    /// List the regions with a known price list location
    Regions,
}

#[derive(Debug, Subcommand)]
pub enum InitCommand {
    /// Write a commented cloudsift.toml
    Config(InitArgs),
    /// Write a .env listing every CLOUDSIFT_* variable
    Env(InitArgs),
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct InitArgs {
    /// Destination file (default: ./cloudsift.toml or ./.env)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long, short, default_value_t = false)]
    pub force: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct EstimateArgs {
    /// Resource type: EC2, EBSVolumes, ElasticIP, ELB, DynamoDB, OpenSearch, NATGateway
    #[arg(long = "type")]
    pub resource_type: String,

    #[arg(long)]
    pub region: String,

    /// Instance type, or capacity in GiB for storage
    #[arg(long)]
    pub size: Option<String>,

    /// EBS volume type, e.g. gp3
    #[arg(long)]
    pub volume_type: Option<String>,

    /// Load balancer type: application, network or classic
    #[arg(long)]
    pub lb_type: Option<String>,

    /// Node count of a search domain
    #[arg(long)]
    pub instance_count: Option<i64>,

    /// Creation time (RFC 3339) used for the lifetime cost
    #[arg(long)]
    pub created_at: Option<String>,
}
