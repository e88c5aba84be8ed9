use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::tempdir;

fn sample_config() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/pipeline.toml")
}

fn cli(args: &[&str]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_price-pipeline"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("PRICE_PIPELINE_LOG_DIR")
        .output()?;
    Ok(output)
}

#[test]
fn test_query_and_country_print_ranked_json() -> Result<()> {
    let config = sample_config();
    let output = cli(&[
        "--query",
        "iPhone 16 Pro, 128GB",
        "--country",
        "US",
        "--config",
        config.to_str().unwrap(),
    ])?;

    assert!(output.status.success());
    let products: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let products = products.as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["price"], "989.99");
    assert!(products[0]["productName"].is_string());
    Ok(())
}

#[test]
fn test_input_file_and_report() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("input.json");
    let report = dir.path().join("report.json");
    fs::write(&input, r#"{"query": "iPhone 16 Pro 128GB", "country": "IN"}"#)?;

    let config = sample_config();
    let output = cli(&[
        "--input_file",
        input.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--report",
        report.to_str().unwrap(),
    ])?;

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report)?)?;
    assert_eq!(report["country"], "IN");
    assert_eq!(report["stages"].as_array().unwrap().len(), 8);
    assert_eq!(report["product_count"], 1);
    Ok(())
}

#[test]
fn test_missing_arguments_fail_with_one_line() -> Result<()> {
    let output = cli(&["--query", "iPhone 16 Pro"])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr)?;
    assert_eq!(stderr.trim_end().lines().count(), 1);
    assert!(stderr.contains("--query and --country"));
    Ok(())
}

#[test]
fn test_unparsable_input_file_fails_with_one_line() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("input.json");
    fs::write(&input, "{not json")?;

    let output = cli(&["--input_file", input.to_str().unwrap()])?;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr)?;
    assert_eq!(stderr.trim_end().lines().count(), 1);
    assert!(stderr.starts_with("error: cannot parse input file"));
    Ok(())
}

#[test]
fn test_describe_lists_stages() -> Result<()> {
    let output = cli(&["--describe"])?;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(stdout.lines().count(), 8);
    assert!(stdout.contains("5. extract:"));
    Ok(())
}
