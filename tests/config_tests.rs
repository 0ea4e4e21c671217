use std::fs;
use std::path::PathBuf;

use oddsmith::error::{ConfigError, Error};
use oddsmith::infrastructure::config::settings::Config;
use rust_decimal::Decimal;
use tempfile::TempDir;

fn write_temp_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("oddsmith.toml");
    fs::write(&path, contents).expect("write temp config");
    (dir, path)
}

fn expect_invalid(toml: &str, expected: &str) {
    match Config::parse_toml(toml) {
        Err(Error::Config(ConfigError::InvalidValue { field, .. })) if field == expected => {}
        Err(err) => panic!("Expected invalid {expected}, got {err}"),
        Ok(_) => panic!("Expected {expected} to be rejected"),
    }
}

#[test]
fn full_file_loads_every_section() {
    let toml = r#"
database = "markets.db"

[logging]
level = "debug"
format = "json"

[economics.market_creation]
initial_market_probability = 0.25
initial_market_subsidization = 20

[economics.market_incentives]
create_market_cost = 5
trader_bonus = 2

[economics.user]
initial_account_balance = 1000
maximum_debt_allowed = 0

[economics.betting]
minimum_bet = 2
initial_bet_fee = 0
each_bet_fee = 1
sell_shares_fee = 3

[market_policy]
minimum_future_hours = 0.5
max_dust_per_sale = 2
"#;

    let (_dir, path) = write_temp_config(toml);
    let config = Config::load(&path).unwrap();
    assert_eq!(config.logging.format, "json");

    let economics = config.economics().unwrap();
    assert_eq!(economics.seeds.initial_yes, 5);
    assert_eq!(economics.seeds.initial_no, 15);
    assert_eq!(economics.create_market_cost, 5);
    assert_eq!(economics.trader_bonus, 2);
    assert_eq!(economics.initial_account_balance, 1000);
    assert_eq!(economics.maximum_debt_allowed, 0);
    assert_eq!(economics.minimum_bet, 2);
    assert_eq!(economics.each_bet_fee, 1);
    assert_eq!(economics.sell_shares_fee, 3);
    assert!((economics.minimum_future_hours - 0.5).abs() < f64::EPSILON);
    assert_eq!(economics.max_dust_per_sale, Decimal::from(2));
}

#[test]
fn omitted_sections_take_defaults() {
    let config = Config::parse_toml("[logging]\nlevel = \"warn\"\n").unwrap();
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.logging.format, "pretty");

    let economics = config.economics().unwrap();
    assert_eq!(economics.seeds.initial_yes + economics.seeds.initial_no, 10);
    assert_eq!(economics.maximum_debt_allowed, 500);
    assert_eq!(economics.max_dust_per_sale, Decimal::ZERO);
}

#[test]
fn config_rejects_unbalanced_seeds() {
    expect_invalid(
        r#"
[economics.market_creation]
initial_market_subsidization = 10
initial_market_yes = 3
initial_market_no = 3
"#,
        "initial_market_yes",
    );
}

#[test]
fn config_rejects_probability_out_of_range() {
    expect_invalid(
        "[economics.market_creation]\ninitial_market_probability = -0.1\n",
        "initial_market_probability",
    );
}

#[test]
fn config_rejects_negative_debt_and_zero_minimum_bet() {
    expect_invalid(
        "[economics.user]\nmaximum_debt_allowed = -1\n",
        "maximum_debt_allowed",
    );
    expect_invalid("[economics.betting]\nminimum_bet = 0\n", "minimum_bet");
}

#[test]
fn config_rejects_an_unbounded_horizon() {
    expect_invalid(
        "[market_policy]\nminimum_future_hours = 1e12\n",
        "minimum_future_hours",
    );
}

#[test]
fn config_accepts_a_fractional_dust_cap() {
    let config = Config::parse_toml("[market_policy]\nmax_dust_per_sale = 0.25\n").unwrap();
    assert_eq!(config.economics().unwrap().max_dust_per_sale, Decimal::new(25, 2));
}

#[test]
fn config_rejects_unknown_log_format() {
    expect_invalid("[logging]\nformat = \"xml\"\n", "logging.format");
}

#[test]
fn config_rejects_malformed_toml() {
    match Config::parse_toml("database = [") {
        Err(Error::Config(ConfigError::Parse(_))) => {}
        Err(err) => panic!("Expected parse error, got {err}"),
        Ok(_) => panic!("Expected malformed TOML to be rejected"),
    }
}

#[test]
fn missing_file_is_an_error_for_load_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    assert!(matches!(
        Config::load(&path),
        Err(Error::Config(ConfigError::ReadFile(_)))
    ));
    assert!(Config::load_or_default(&path).is_ok());
}

#[test]
fn effective_config_serializes_back_to_toml() {
    let config = Config::parse_toml("[market_policy]\nmax_dust_per_sale = 4\n").unwrap();
    let rendered = config.to_toml().unwrap();
    assert!(rendered.contains("max_dust_per_sale = 4"));

    let reparsed = Config::parse_toml(&rendered).unwrap();
    assert_eq!(reparsed, config);
}
