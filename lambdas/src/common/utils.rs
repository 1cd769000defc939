use serde_json::Value;

use crate::common::errors::Error;

const EMPTY_SECRET_ERROR: &str = "secret has no string value";

/// Pulls a single string field out of a Secrets Manager JSON bundle.
pub fn extract_secret_field(
    secret_id: &str,
    secret_string: Option<&str>,
    key: &str,
) -> Result<String, Error> {
    let secret_string =
        secret_string.ok_or_else(|| Error::secret(secret_id, EMPTY_SECRET_ERROR))?;
    let bundle: Value = serde_json::from_str(secret_string)
        .map_err(|err| Error::secret(secret_id, format!("secret is not JSON: {err}")))?;

    match bundle.get(key) {
        Some(Value::String(val)) if !val.is_empty() => Ok(val.clone()),
        Some(_) => Err(Error::secret(secret_id, format!("{key} is not a non-empty string"))),
        None => Err(Error::secret(secret_id, format!("{key} is missing"))),
    }
}
