//! ef-spec: model document format and document-level validation.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{ValidationError, validate_spec};

pub const LATEST_VERSION: u32 = 1;

pub type SpecResult<T> = Result<T, SpecError>;

#[derive(thiserror::Error, Debug)]
pub enum SpecError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn from_yaml_str(content: &str) -> SpecResult<ModelSpec> {
    let spec: ModelSpec = serde_yaml::from_str(content)?;
    validate_spec(&spec)?;
    Ok(spec)
}

pub fn load_yaml(path: &std::path::Path) -> SpecResult<ModelSpec> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn save_yaml(path: &std::path::Path, spec: &ModelSpec) -> SpecResult<()> {
    validate_spec(spec)?;
    let content = serde_yaml::to_string(spec)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> SpecResult<ModelSpec> {
    let content = std::fs::read_to_string(path)?;
    let spec: ModelSpec = serde_json::from_str(&content)?;
    validate_spec(&spec)?;
    Ok(spec)
}

pub fn save_json(path: &std::path::Path, spec: &ModelSpec) -> SpecResult<()> {
    validate_spec(spec)?;
    let content = serde_json::to_string_pretty(spec)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load by file extension: `.json` as JSON, anything else as YAML.
pub fn load(path: &std::path::Path) -> SpecResult<ModelSpec> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => load_json(path),
        _ => load_yaml(path),
    }
}
