//! JSON parsing that names the failing path.

use anyhow::Result;

/// Parse JSON into `T`, attaching the serde path and location on failure so
/// a malformed backend response points at the offending field instead of
/// just "invalid type".
pub fn parse_json_with_path<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    let jd = &mut serde_json::Deserializer::from_str(body);
    match serde_path_to_error::deserialize(jd) {
        Ok(value) => Ok(value),
        Err(err) => {
            let path = err.path().to_string();
            let inner = err.inner();
            if path.is_empty() || path == "." {
                Err(anyhow::anyhow!("{inner}"))
            } else {
                Err(anyhow::anyhow!("at path '{path}': {inner}"))
            }
        }
    }
}
