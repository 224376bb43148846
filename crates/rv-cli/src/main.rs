//! Response verification from the command line
//!
//! ```text
//! response-verify <expected> <actual> [--config FILE] [--prefix P] [--depth N] [--case-insensitive]
//! response-verify --test-data DIR [--test-data DIR ...] --id ID [--config FILE] [--depth N]
//! ```
//!
//! Exit status is 0 when verified, 1 when issues were found and 2 for usage or
//! configuration errors.

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser};
use rv_config::VerifierConfig;
use rv_core::{VerificationResult, Value};
use rv_test_data::{HttpTestDataSource, JsonStoreHttpTestDataSource, ResponseVerifier};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Parser)]
#[command(name = "response-verify", version)]
#[command(about = "Verify an actual response against an expected one", long_about = None)]
#[command(group(ArgGroup::new("mode").required(true).args(["expected", "test_data"])))]
struct Cli {
    /// Expected document (JSON or YAML)
    #[arg(requires = "actual", conflicts_with_all = ["test_data", "id"])]
    expected: Option<PathBuf>,

    /// Actual document (JSON or YAML)
    #[arg(requires = "expected")]
    actual: Option<PathBuf>,

    /// Directory of *.td.json test data files
    #[arg(long = "test-data", value_name = "DIR", requires = "id")]
    test_data: Vec<PathBuf>,

    /// Test data to verify
    #[arg(long, requires = "test_data")]
    id: Option<String>,

    /// Verifier configuration (YAML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path prefix of issue messages
    #[arg(long, value_name = "PATH")]
    prefix: Option<String>,

    /// Cascade depth budget
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    depth: Option<i64>,

    /// Compare keys and strings case-insensitively
    #[arg(long)]
    case_insensitive: bool,
}

/// Read a JSON or YAML document; `.json` files are parsed as JSON
fn load_value(path: &Path) -> Result<Value> {
    debug!("Loading document: {:?}", path);
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON in {}", path.display()))
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML in {}", path.display()))
    }
}

/// Configuration file (or defaults) with environment and flag overrides applied
fn build_config(cli: &Cli) -> Result<VerifierConfig> {
    let mut config = match &cli.config {
        Some(path) => VerifierConfig::load(path)?,
        None => VerifierConfig::default().with_env_overrides()?,
    };
    if let Some(prefix) = &cli.prefix {
        config.field_prefix = prefix.clone();
    }
    if let Some(depth) = cli.depth {
        config.max_depth = depth;
    }
    if cli.case_insensitive {
        config.case_sensitive = false;
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<VerificationResult> {
    let config = build_config(cli)?;
    debug!(?config, "Effective configuration");

    match (&cli.expected, &cli.actual, &cli.id) {
        (Some(expected), Some(actual), _) => {
            let expected = load_value(expected)?;
            let actual = load_value(actual)?;
            Ok(config.build_verifier()?.verify(&expected, &actual)?)
        }
        (_, _, Some(id)) => {
            let store = JsonStoreHttpTestDataSource::new(&cli.test_data)?;
            let data = store.get_data_for_test_call(id)?;
            let verifier = ResponseVerifier::with_settings(
                config.max_depth,
                config.case_sensitive,
                config.collections.clone(),
            )?;
            Ok(verifier.verify_test_data(&data)?)
        }
        _ => bail!("expected two files, or --test-data with --id"),
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> ExitCode {
    // Usage errors exit with status 2
    let cli = Cli::parse();

    if let Err(e) = init_tracing() {
        eprintln!("error: {:#}", e);
        return ExitCode::from(2);
    }

    match run(&cli) {
        Ok(result) if result.is_verified() => {
            info!("Verification passed");
            println!("{}", result);
            ExitCode::SUCCESS
        }
        Ok(result) => {
            info!(issues = result.issues().len(), "Verification failed");
            println!("{}", result);
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;
    use serde_json::json;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("response-verify").chain(args.iter().copied()))
    }

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_files() {
        let cli = parse(&["e.json", "a.yaml", "--depth", "2", "--case-insensitive"]).unwrap();
        assert_eq!(cli.expected, Some(PathBuf::from("e.json")));
        assert_eq!(cli.actual, Some(PathBuf::from("a.yaml")));
        assert!(cli.test_data.is_empty());
        assert_eq!(cli.depth, Some(2));
        assert!(cli.case_insensitive);

        let cli = parse(&["e.json", "a.json", "--depth", "-1"]).unwrap();
        assert_eq!(cli.depth, Some(-1));
    }

    #[test]
    fn test_parse_test_data() {
        let cli = parse(&["--test-data", "a", "--test-data", "b", "--id", "S-001"]).unwrap();
        assert_eq!(cli.test_data, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(cli.id.as_deref(), Some("S-001"));
        assert!(cli.expected.is_none());
    }

    #[test]
    fn test_parse_errors() {
        let kind = |args: &[&str]| parse(args).unwrap_err().kind();

        assert_eq!(kind(&[]), ErrorKind::MissingRequiredArgument);
        assert_eq!(kind(&["only-one.json"]), ErrorKind::MissingRequiredArgument);
        assert_eq!(kind(&["--test-data", "dir"]), ErrorKind::MissingRequiredArgument);
        assert_eq!(kind(&["--id", "S-001"]), ErrorKind::MissingRequiredArgument);
        assert_eq!(
            kind(&["e.json", "a.json", "--test-data", "dir", "--id", "S-001"]),
            ErrorKind::ArgumentConflict
        );
        assert_eq!(kind(&["e.json", "a.json", "--depth"]), ErrorKind::InvalidValue);
        assert_eq!(kind(&["e.json", "a.json", "--depth", "deep"]), ErrorKind::ValueValidation);
        assert_eq!(kind(&["e.json", "a.json", "--verbose"]), ErrorKind::UnknownArgument);
        assert_eq!(kind(&["--help"]), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_usage_errors_exit_with_two() {
        assert_eq!(parse(&["only-one.json"]).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn test_load_json_and_yaml() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("expected.json");
        let yaml_path = dir.path().join("actual.yaml");
        fs::write(&json_path, r#"{"state": "open", "count": 2}"#).unwrap();
        fs::write(&yaml_path, "state: open\ncount: 2\n").unwrap();

        assert_eq!(load_value(&json_path).unwrap(), json!({"state": "open", "count": 2}));
        assert_eq!(load_value(&yaml_path).unwrap(), json!({"state": "open", "count": 2}));
        assert!(load_value(&dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn test_run_files() {
        let dir = TempDir::new().unwrap();
        let expected = dir.path().join("expected.json");
        let actual = dir.path().join("actual.json");
        fs::write(&expected, r#"{"id": "[[ANY_INTEGER_NOT_NULLABLE]]", "state": "open"}"#).unwrap();
        fs::write(&actual, r#"{"id": 7, "state": "closed"}"#).unwrap();

        let cli = parse(&[
            expected.to_str().unwrap(),
            actual.to_str().unwrap(),
            "--prefix",
            "body",
            "--depth",
            "0",
        ])
        .unwrap();
        let result = run(&cli).unwrap();
        assert_eq!(
            result.issues(),
            ["body contains 1 bad value(s): [state: expected 'open' but got 'closed']"]
        );
    }

    #[test]
    fn test_run_rejects_negative_depth() {
        let cli = parse(&["e.json", "a.json", "--depth", "-1"]).unwrap();
        assert!(run(&cli).is_err());
    }

    #[test]
    fn test_run_test_data() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("S-001.td.json"),
            r#"{
                "expectedResponse": {"responseCode": 200, "body": {"ok": true}},
                "actualResponse": {"responseCode": 200, "body": {"ok": true}}
            }"#,
        )
        .unwrap();

        let cli = parse(&["--test-data", dir.path().to_str().unwrap(), "--id", "S-001"]).unwrap();
        assert!(run(&cli).unwrap().is_verified());
    }
}
