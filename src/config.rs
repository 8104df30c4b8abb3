use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::fids::OperatorFilter;

pub const DEFAULT_AIRPORT: &str = "EGNM";
pub const DEFAULT_OPERATOR_PREFIX: &str = "LS";
pub const DEFAULT_OPERATOR_NAME: &str = "Jet2";
pub const DEFAULT_REFRESH_SECS: u64 = 60;
pub const MIN_REFRESH_SECS: u64 = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const MIN_TIMEOUT_SECS: u64 = 2;
pub const DEFAULT_CHECKWX_BASE: &str = "https://api.checkwx.com";
pub const DEFAULT_AERODATABOX_HOST: &str = "aerodatabox.p.rapidapi.com";
pub const DEFAULT_OPENSKY_URL: &str = "https://opensky-network.org/api/states/all";
pub const DEFAULT_ALLOW_HTTP: bool = false;
pub const DEFAULT_CONFIG_FILE: &str = "airport-ops.toml";
pub const DEFAULT_LOG_FILE: &str = "airport-ops.log";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format: {value} (expected text or json)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub airport: String,
    pub operator_prefix: String,
    pub operator_name: String,
    pub refresh: Duration,
    pub timeout: Duration,
    pub checkwx_base: String,
    pub checkwx_api_key: String,
    pub aerodatabox_host: String,
    pub aerodatabox_api_key: String,
    pub opensky_url: String,
    pub allow_http: bool,
    pub config_path: PathBuf,
    pub log_enabled: bool,
    pub log_level: String,
    pub log_file: String,
    pub once: bool,
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            airport: DEFAULT_AIRPORT.to_string(),
            operator_prefix: DEFAULT_OPERATOR_PREFIX.to_string(),
            operator_name: DEFAULT_OPERATOR_NAME.to_string(),
            refresh: Duration::from_secs(DEFAULT_REFRESH_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            checkwx_base: DEFAULT_CHECKWX_BASE.to_string(),
            checkwx_api_key: String::new(),
            aerodatabox_host: DEFAULT_AERODATABOX_HOST.to_string(),
            aerodatabox_api_key: String::new(),
            opensky_url: DEFAULT_OPENSKY_URL.to_string(),
            allow_http: DEFAULT_ALLOW_HTTP,
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            log_enabled: false,
            log_level: "info".to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
            once: false,
            format: OutputFormat::Text,
        }
    }
}

impl Config {
    pub fn operator(&self) -> OperatorFilter {
        OperatorFilter::new(self.operator_prefix.clone(), self.operator_name.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    airport: Option<String>,
    operator_prefix: Option<String>,
    operator_name: Option<String>,
    refresh_secs: Option<u64>,
    timeout_secs: Option<u64>,
    checkwx_base: Option<String>,
    checkwx_api_key: Option<String>,
    aerodatabox_host: Option<String>,
    aerodatabox_api_key: Option<String>,
    opensky_url: Option<String>,
    allow_http: Option<bool>,
    log_enabled: Option<bool>,
    log_level: Option<String>,
    log_file: Option<String>,
}

/// Upper-cased, trimmed airport code; blank falls back to `fallback`.
pub fn normalize_airport(code: &str, fallback: &str) -> String {
    let code = code.trim().to_ascii_uppercase();
    if code.is_empty() {
        fallback.trim().to_ascii_uppercase()
    } else {
        code
    }
}

pub fn parse_args() -> Result<Config> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_arg_list(&args)
}

fn parse_arg_list(args: &[String]) -> Result<Config> {
    let mut explicit_config: Option<PathBuf> = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let value = iter
                .next()
                .ok_or_else(|| anyhow!("--config needs a value"))?;
            explicit_config = Some(PathBuf::from(value));
        }
    }

    let env_config = env::var("AIRPORT_OPS_CONFIG").ok().map(PathBuf::from);
    let config_path = explicit_config
        .clone()
        .or(env_config)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut config = Config {
        config_path: config_path.clone(),
        ..Config::default()
    };

    if config_path.exists() {
        if let Some(file_config) = load_file_config(&config_path)? {
            apply_file_config(&mut config, file_config);
        }
    } else if explicit_config.is_some() {
        return Err(anyhow!("Config file not found: {}", config_path.display()));
    }

    apply_env(&mut config);

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                iter.next();
            }
            "--airport" => {
                config.airport = iter
                    .next()
                    .ok_or_else(|| anyhow!("--airport needs a value"))?
                    .to_string();
            }
            "--prefix" => {
                config.operator_prefix = iter
                    .next()
                    .ok_or_else(|| anyhow!("--prefix needs a value"))?
                    .to_string();
            }
            "--operator" => {
                config.operator_name = iter
                    .next()
                    .ok_or_else(|| anyhow!("--operator needs a value"))?
                    .to_string();
            }
            "--refresh" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--refresh needs a value"))?;
                let secs: u64 = value.parse()?;
                config.refresh = Duration::from_secs(secs.max(MIN_REFRESH_SECS));
            }
            "--timeout" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--timeout needs a value"))?;
                let secs: u64 = value.parse()?;
                config.timeout = Duration::from_secs(secs.max(MIN_TIMEOUT_SECS));
            }
            "--checkwx-key" => {
                config.checkwx_api_key = iter
                    .next()
                    .ok_or_else(|| anyhow!("--checkwx-key needs a value"))?
                    .to_string();
            }
            "--aerodatabox-key" => {
                config.aerodatabox_api_key = iter
                    .next()
                    .ok_or_else(|| anyhow!("--aerodatabox-key needs a value"))?
                    .to_string();
            }
            "--allow-http" => {
                config.allow_http = true;
            }
            "--log" => {
                config.log_enabled = true;
            }
            "--no-log" => {
                config.log_enabled = false;
            }
            "--log-level" => {
                config.log_level = iter
                    .next()
                    .ok_or_else(|| anyhow!("--log-level needs a value"))?
                    .to_string();
            }
            "--log-file" => {
                config.log_file = iter
                    .next()
                    .ok_or_else(|| anyhow!("--log-file needs a value"))?
                    .to_string();
            }
            "--once" => {
                config.once = true;
            }
            "--format" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--format needs a value"))?;
                config.format = value.parse()?;
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                return Err(anyhow!("Unknown argument: {other}"));
            }
        }
    }

    config.airport = normalize_airport(&config.airport, DEFAULT_AIRPORT);
    validate_security(&config)?;
    Ok(config)
}

fn apply_env(config: &mut Config) {
    if let Ok(value) = env::var("AIRPORT_OPS_AIRPORT") {
        config.airport = value;
    }
    if let Ok(value) = env::var("AIRPORT_OPS_OPERATOR_PREFIX") {
        config.operator_prefix = value;
    }
    if let Ok(value) = env::var("AIRPORT_OPS_OPERATOR_NAME") {
        config.operator_name = value;
    }
    if let Ok(value) = env::var("AIRPORT_OPS_REFRESH") {
        if let Ok(secs) = value.parse::<u64>() {
            config.refresh = Duration::from_secs(secs.max(MIN_REFRESH_SECS));
        }
    }
    if let Ok(value) = env::var("AIRPORT_OPS_TIMEOUT") {
        if let Ok(secs) = value.parse::<u64>() {
            config.timeout = Duration::from_secs(secs.max(MIN_TIMEOUT_SECS));
        }
    }
    if let Ok(value) = env::var("CHECKWX_API_KEY") {
        config.checkwx_api_key = value;
    }
    if let Ok(value) = env::var("AERODATABOX_API_KEY") {
        config.aerodatabox_api_key = value;
    }
    if let Ok(value) = env::var("AIRPORT_OPS_OPENSKY_URL") {
        config.opensky_url = value;
    }
    if let Ok(value) = env::var("AIRPORT_OPS_ALLOW_HTTP") {
        config.allow_http = matches!(value.as_str(), "1" | "true" | "yes" | "on");
    }
    if let Ok(value) = env::var("AIRPORT_OPS_LOG_ENABLED") {
        config.log_enabled = matches!(value.as_str(), "1" | "true" | "yes" | "on");
    }
    if let Ok(value) = env::var("AIRPORT_OPS_LOG_LEVEL") {
        config.log_level = value;
    }
    if let Ok(value) = env::var("AIRPORT_OPS_LOG_FILE") {
        config.log_file = value;
    }
}

fn load_file_config(path: &Path) -> Result<Option<FileConfig>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let cfg: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(Some(cfg))
}

fn apply_file_config(target: &mut Config, file: FileConfig) {
    if let Some(airport) = file.airport {
        target.airport = airport;
    }
    if let Some(prefix) = file.operator_prefix {
        target.operator_prefix = prefix;
    }
    if let Some(name) = file.operator_name {
        target.operator_name = name;
    }
    if let Some(refresh) = file.refresh_secs {
        target.refresh = Duration::from_secs(refresh.max(MIN_REFRESH_SECS));
    }
    if let Some(timeout) = file.timeout_secs {
        target.timeout = Duration::from_secs(timeout.max(MIN_TIMEOUT_SECS));
    }
    if let Some(base) = file.checkwx_base {
        target.checkwx_base = base;
    }
    if let Some(key) = file.checkwx_api_key {
        target.checkwx_api_key = key;
    }
    if let Some(host) = file.aerodatabox_host {
        target.aerodatabox_host = host;
    }
    if let Some(key) = file.aerodatabox_api_key {
        target.aerodatabox_api_key = key;
    }
    if let Some(url) = file.opensky_url {
        target.opensky_url = url;
    }
    if let Some(allow_http) = file.allow_http {
        target.allow_http = allow_http;
    }
    if let Some(log_enabled) = file.log_enabled {
        target.log_enabled = log_enabled;
    }
    if let Some(log_level) = file.log_level {
        target.log_level = log_level;
    }
    if let Some(log_file) = file.log_file {
        target.log_file = log_file;
    }
}

fn print_help() {
    println!("airport-ops");
    println!("Usage: airport-ops [--airport ICAO] [--prefix LS] [--operator NAME]");
    println!("       [--refresh SECONDS] [--timeout SECONDS] [--config PATH]");
    println!("       [--checkwx-key KEY] [--aerodatabox-key KEY] [--allow-http]");
    println!("       [--log] [--no-log] [--log-level LEVEL] [--log-file PATH]");
    println!("       [--once] [--format text|json]");
    println!("Environment: AIRPORT_OPS_CONFIG overrides config path");
    println!("Environment: AIRPORT_OPS_AIRPORT sets the airport (ICAO or IATA)");
    println!("Environment: AIRPORT_OPS_OPERATOR_PREFIX/NAME select the airline");
    println!("Environment: AIRPORT_OPS_REFRESH AIRPORT_OPS_TIMEOUT control polling");
    println!("Environment: CHECKWX_API_KEY AERODATABOX_API_KEY provide API keys");
    println!("Environment: AIRPORT_OPS_OPENSKY_URL overrides the state vector endpoint");
    println!("Environment: AIRPORT_OPS_ALLOW_HTTP=1 allows http:// endpoints");
    println!("Environment: AIRPORT_OPS_LOG_ENABLED/LEVEL/FILE configure logging");
    println!("Keys: q quit | a airport | r refresh | w save airport | ? help");
}

fn validate_security(config: &Config) -> Result<()> {
    let endpoints = [
        config.checkwx_base.as_str(),
        config.opensky_url.as_str(),
        config.aerodatabox_host.as_str(),
    ];
    for url in endpoints {
        if url.trim().to_ascii_lowercase().starts_with("http://") && !config.allow_http {
            return Err(anyhow!(
                "Refusing insecure http URL {url} (set allow_http=true or AIRPORT_OPS_ALLOW_HTTP=1 to override)"
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file(name: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        dir.push(format!("airport-ops-config-test-{suffix}"));
        let _ = fs::create_dir_all(&dir);
        dir.push(name);
        dir
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_endpoints_pass_validation() {
        assert!(validate_security(&Config::default()).is_ok());
    }

    #[test]
    fn http_endpoint_rejected_unless_allowed() {
        let mut cfg = Config {
            opensky_url: "http://localhost:8080/api/states/all".to_string(),
            ..Config::default()
        };
        let err = validate_security(&cfg).unwrap_err();
        assert!(err.to_string().contains("Refusing insecure http URL"));
        cfg.allow_http = true;
        assert!(validate_security(&cfg).is_ok());
    }

    #[test]
    fn airport_codes_are_normalized() {
        assert_eq!(normalize_airport(" egnm ", DEFAULT_AIRPORT), "EGNM");
        assert_eq!(normalize_airport("lba", DEFAULT_AIRPORT), "LBA");
        assert_eq!(normalize_airport("   ", DEFAULT_AIRPORT), "EGNM");
    }

    #[test]
    fn load_file_config_parses_values() {
        let path = temp_file("config.toml");
        let content = r#"
airport = "egcc"
operator_prefix = "EZY"
operator_name = "easyJet"
refresh_secs = 120
timeout_secs = 1
checkwx_api_key = "wx-key"
aerodatabox_api_key = "adb-key"
log_enabled = true
log_level = "debug"
"#;
        fs::write(&path, content).unwrap();
        let cfg = load_file_config(&path).unwrap().unwrap();
        assert_eq!(cfg.airport.as_deref(), Some("egcc"));
        assert_eq!(cfg.operator_prefix.as_deref(), Some("EZY"));
        assert_eq!(cfg.refresh_secs, Some(120));
        assert_eq!(cfg.checkwx_api_key.as_deref(), Some("wx-key"));
        assert_eq!(cfg.log_enabled, Some(true));

        let mut target = Config::default();
        apply_file_config(&mut target, cfg);
        assert_eq!(target.operator(), OperatorFilter::new("EZY", "easyJet"));
        assert_eq!(target.refresh, Duration::from_secs(120));
        assert_eq!(target.timeout, Duration::from_secs(MIN_TIMEOUT_SECS));
        assert_eq!(target.aerodatabox_api_key, "adb-key");
        assert_eq!(target.log_level, "debug");
        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir(path.parent().unwrap());
    }

    #[test]
    fn cli_flags_override_file() {
        let path = temp_file("airport-ops.toml");
        fs::write(&path, "airport = \"EGCC\"\nrefresh_secs = 300\n").unwrap();
        let path_arg = path.to_string_lossy().to_string();
        let cfg = parse_arg_list(&args(&[
            "--config",
            &path_arg,
            "--airport",
            " egnm",
            "--refresh",
            "3",
            "--once",
            "--format",
            "json",
        ]))
        .unwrap();
        assert_eq!(cfg.airport, "EGNM");
        assert_eq!(cfg.refresh, Duration::from_secs(MIN_REFRESH_SECS));
        assert!(cfg.once);
        assert_eq!(cfg.format, OutputFormat::Json);
        assert_eq!(cfg.config_path, path);
        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir(path.parent().unwrap());
    }

    #[test]
    fn output_format_parses() {
        assert_eq!(" JSON ".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("txt".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        let err = "html".parse::<OutputFormat>().unwrap_err();
        assert!(err.to_string().contains("expected text or json"));
    }

    #[test]
    fn bad_arguments_are_errors() {
        let missing = temp_file("missing.toml");
        let missing_arg = missing.to_string_lossy().to_string();
        assert!(parse_arg_list(&args(&["--config", &missing_arg])).is_err());
        assert!(parse_arg_list(&args(&["--bogus"])).is_err());
        assert!(parse_arg_list(&args(&["--format", "html"])).is_err());
        assert!(parse_arg_list(&args(&["--airport"])).is_err());
    }
}
