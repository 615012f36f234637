//! Configuration system tests

use alloy_primitives::address;
use anyhow::Result;
use coinfluence_core::FeeTier;
use coinfluence_launcher::config::StorageBackend;
use coinfluence_launcher::LauncherConfig;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn create_test_config_content() -> String {
    r#"
[chain]
rpc_url = "https://sepolia.base.org"
chain_id = 84532
token_factory = "0x9999999999999999999999999999999999999999"
launcher_account = "0x5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e"
confirmation_poll_ms = 500

[liquidity]
fee_tier = 10000
base_amount = "100000000000000000"
token_bps = 2000
slippage_bps = 100

[token]
total_supply = "500000000000000000000000"
creation_fee = 0

[retry]
max_retries = 5

[storage]
backend = "postgres"
postgres_url = "postgresql://launcher:secret@db:5432/launcher"

[api]
bind_address = "0.0.0.0:8080"
admin_addresses = ["0xadadadadadadadadadadadadadadadadadadadad"]

[monitoring]
metrics_port = 0
structured_logging = true
"#
    .to_string()
}

fn write_config(dir: &TempDir, content: &str) -> Result<String> {
    let path = dir.path().join("launcher.toml");
    fs::write(&path, content)?;
    Ok(path.to_string_lossy().into_owned())
}

#[test]
fn test_config_loading_from_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_config(&temp_dir, &create_test_config_content())?;

    let config = LauncherConfig::from_file(&path)?;

    assert_eq!(config.chain.rpc_url, "https://sepolia.base.org");
    assert_eq!(
        config.chain.token_factory,
        Some(address!("0x9999999999999999999999999999999999999999"))
    );
    assert_eq!(config.chain.confirmation_poll_ms, 500);
    assert_eq!(config.fee_tier(), FeeTier::HIGH);
    assert_eq!(config.liquidity.base_amount, 100_000_000_000_000_000);
    assert_eq!(config.token.total_supply, 500_000 * 10u128.pow(18));
    assert_eq!(config.token.creation_fee, 0);
    assert_eq!(config.retry.max_retries, 5);
    assert_eq!(config.storage.backend, StorageBackend::Postgres);
    assert_eq!(config.api.admin_addresses.len(), 1);
    assert!(config.monitoring.structured_logging);

    // Unspecified values fall back to defaults
    assert_eq!(config.chain.base_asset, address!("0x4200000000000000000000000000000000000006"));
    assert_eq!(config.liquidity.deadline_secs, 1200);
    assert_eq!(config.retry.base_delay_ms, 1000);
    Ok(())
}

#[test]
fn test_shipped_config_is_valid() -> Result<()> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("launcher.toml");
    let config = LauncherConfig::from_file(&path.to_string_lossy())?;

    assert_eq!(config.chain.chain_id, 84532);
    assert_eq!(config.token.total_supply, 1_000_000 * 10u128.pow(18));
    assert_eq!(config.storage.backend, StorageBackend::Memory);
    assert!(config.api.admin_addresses.is_empty());
    Ok(())
}

#[test]
fn test_invalid_configs_are_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let cases = [
        ("[liquidity]\nbase_amount = \"0\"\n", "zero base amount"),
        ("[liquidity]\ntoken_bps = 7000\n", "seed above the treasury share"),
        ("[liquidity]\nslippage_bps = 6000\n", "slippage out of range"),
        ("[liquidity]\nbase_amount = -5\n", "negative amount"),
        ("[token]\ntotal_supply = \"0\"\n", "zero supply"),
        ("[token]\ntotal_supply = \"lots\"\n", "non-numeric supply"),
        ("[chain]\nrpc_url = \"not a url\"\n", "malformed rpc url"),
        ("[chain]\nbase_asset = \"0x0000000000000000000000000000000000000000\"\n", "zero base asset"),
        ("[retry]\nbase_delay_ms = 5000\nmax_delay_ms = 1000\n", "inverted retry delays"),
        ("[storage]\nbackend = \"rocksdb\"\n", "unknown backend"),
        ("[storage]\nmin_connections = 30\nmax_connections = 10\n", "inverted pool bounds"),
    ];

    for (content, case) in cases {
        let path = write_config(&temp_dir, content)?;
        assert!(LauncherConfig::from_file(&path).is_err(), "accepted config with {}", case);
    }
    Ok(())
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(LauncherConfig::from_file("/nonexistent/launcher.toml").is_err());
}

#[test]
fn test_config_round_trips_through_toml() -> Result<()> {
    let mut config = LauncherConfig::default();
    config.token.total_supply = u128::MAX;
    config.api.admin_addresses = vec![address!("0xadadadadadadadadadadadadadadadadadadadad")];

    let rendered = toml::to_string(&config)?;
    let parsed: LauncherConfig = toml::from_str(&rendered)?;
    assert_eq!(parsed.token.total_supply, u128::MAX);
    assert_eq!(parsed.api.admin_addresses, config.api.admin_addresses);
    Ok(())
}
