//! Commented starter files written by `cloudsift init`.

/// Starter `cloudsift.toml`. Every active value equals the built-in default.
pub const STARTER_CONFIG: &str = r#"# cloudsift configuration

max_workers = 8       # concurrent scan workers
log_level = "info"    # tracing filter, e.g. "info" or "cloudsift=debug"
log_format = "text"   # text or json

[scan]
inventory = "inventory.json"
days_unused = 90      # idle days before a resource is reported

# Empty lists mean every region in the inventory and every scanner.
regions = []
# regions = ["us-east-1", "eu-west-1"]
scanners = []
# scanners = ["ebs-volumes", "elastic-ips"]

# Accounts to scan. Without entries every account in the inventory is scanned.
# accounts = [{ id = "123456789012", name = "production" }]

# Resources matching any ignore rule are left out of the results.
# Ids and names match case-insensitively.
# ignore_resource_ids = ["vol-1234567890abcdef0"]
# ignore_resource_names = ["critical-data-volume"]

[scan.ignore_resource_tags]
# Environment = "production"

[output]
dir = "output"

[pricing]
cache_file = "cache/costs.json"
# Price list gateway that signs requests with AWS credentials. Without it,
# scans need --skip-cost.
# endpoint = "https://pricing-gateway.example.internal"

[rate_limit]
requests_per_second = 20.0
max_retries = 10
base_delay_ms = 100
max_delay_ms = 120000
"#;

/// Starter `.env` with every recognised variable commented out.
pub const STARTER_ENV: &str = r#"# cloudsift environment overrides; these win over cloudsift.toml

# CLOUDSIFT_CONFIG=cloudsift.toml
# CLOUDSIFT_MAX_WORKERS=8
# CLOUDSIFT_LOG_LEVEL=info
# CLOUDSIFT_LOG_FORMAT=text
# CLOUDSIFT_SCAN_REGIONS=us-east-1,eu-west-1
# CLOUDSIFT_SCAN_SCANNERS=ebs-volumes,elastic-ips
# CLOUDSIFT_SCAN_DAYS_UNUSED=90
# CLOUDSIFT_SCAN_INVENTORY=inventory.json
# CLOUDSIFT_OUTPUT_DIR=output
# CLOUDSIFT_PRICE_CACHE=cache/costs.json
# CLOUDSIFT_PRICING_ENDPOINT=https://pricing-gateway.example.internal
"#;
