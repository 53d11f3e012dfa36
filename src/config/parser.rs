use std::path::Path;
use reqwest::Method;
use crate::errors::SqlsentryError;
use super::types::SqlsentryConfig;
use super::schema::CONFIG_SCHEMA;
use tracing::warn;

pub async fn parse_config(path: &Path) -> Result<SqlsentryConfig, SqlsentryError> {
    if !path.exists() {
        return Err(SqlsentryError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(SqlsentryError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

pub fn parse_config_str(content: &str) -> Result<SqlsentryConfig, SqlsentryError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;

    // JSON Schema validation
    validate_schema(&yaml)?;

    let config: SqlsentryConfig = serde_yaml::from_value(yaml)?;

    validate_conflicts(&config)?;

    Ok(config)
}

/// Parse a user supplied HTTP method name.
pub fn parse_method(name: &str) -> Result<Method, SqlsentryError> {
    match name.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        other => Err(SqlsentryError::Config(format!(
            "Unsupported HTTP method '{}' (expected GET, POST or PUT)",
            other
        ))),
    }
}

/// Split a `Name: value` header argument.
pub fn parse_header(raw: &str) -> Result<(String, String), SqlsentryError> {
    let (name, value) = raw.split_once(':').ok_or_else(|| {
        SqlsentryError::Config(format!("Invalid header '{}' (expected 'Name: value')", raw))
    })?;
    let name = name.trim();
    if name.is_empty() {
        return Err(SqlsentryError::Config(format!("Invalid header '{}': empty name", raw)));
    }
    Ok((name.to_string(), value.trim_start().to_string()))
}

/// Read a targets file: one URL per line, blank lines and `#` comments skipped.
pub async fn load_targets_file(path: &Path) -> Result<Vec<String>, SqlsentryError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        SqlsentryError::FilePath(format!("unable to read targets file '{}' ({})", path.display(), e))
    })?;
    let targets: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();
    if targets.is_empty() {
        return Err(SqlsentryError::Config(format!(
            "Targets file '{}' does not contain any URL",
            path.display()
        )));
    }
    Ok(targets)
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), SqlsentryError> {
    let json_value = serde_json::to_value(yaml)
        .map_err(|e| SqlsentryError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| SqlsentryError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        // Advisory only
        for e in errors {
            warn!(validation_error = %e, path = %e.instance_path, "Config schema warning");
        }
    }

    Ok(())
}

/// Detect semantic conflicts in the parsed configuration.
fn validate_conflicts(config: &SqlsentryConfig) -> Result<(), SqlsentryError> {
    if let Some(target) = &config.target {
        if target.url.is_some() && target.targets_file.is_some() {
            return Err(SqlsentryError::Config(
                "Both 'target.url' and 'target.targets_file' are set; choose one".into(),
            ));
        }

        if target.direct.unwrap_or(false) && target.data.is_some() {
            warn!("Direct connection configured; POST data will be ignored");
        }

        if let Some(method) = &target.method {
            parse_method(method)?;
        }
    }

    Ok(())
}
