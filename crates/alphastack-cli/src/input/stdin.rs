//! Piped input (`alphastack value < company.json`).

use std::io::{self, Read};

use serde::de::DeserializeOwned;

/// Read a piped document into the command's input type. `shape` names the
/// expected document in parse errors.
///
/// Returns None when stdin is a terminal or nothing was piped.
pub fn read_stdin<T: DeserializeOwned>(
    shape: &str,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer, shape)
}

fn parse_piped<T: DeserializeOwned>(
    buffer: &str,
    shape: &str,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| format!("stdin is not a valid {shape} document: {e}").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphastack_core::AssumptionSet;

    #[test]
    fn test_blank_pipe_is_no_input() {
        let parsed: Option<AssumptionSet> = parse_piped("  \n", "assumptions").unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_error_names_expected_shape() {
        let err = parse_piped::<AssumptionSet>("{\"forecast_years\": \"many\"}", "assumptions")
            .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("stdin is not a valid assumptions document"));
    }
}
