//! Positional argument validation.
//!
//! All checks run client-side before any RPC so malformed input is rejected
//! cheaply with a `validation` error.

use crate::errors::ChaincodeError;
use serde::de::DeserializeOwned;

/// Require exactly `expected` arguments.
pub fn expect_args(function: &str, args: &[String], expected: usize) -> Result<(), ChaincodeError> {
    if args.len() != expected {
        return Err(ChaincodeError::validation(format!(
            "{function}: incorrect number of arguments, expecting {expected}, got {}",
            args.len()
        )));
    }
    Ok(())
}

/// Require between `min` and `max` arguments, inclusive.
pub fn expect_args_range(
    function: &str,
    args: &[String],
    min: usize,
    max: usize,
) -> Result<(), ChaincodeError> {
    if args.len() < min || args.len() > max {
        return Err(ChaincodeError::validation(format!(
            "{function}: incorrect number of arguments, expecting {min} to {max}, got {}",
            args.len()
        )));
    }
    Ok(())
}

/// Reject empty required arguments such as ids.
pub fn require_non_empty(name: &str, value: &str) -> Result<(), ChaincodeError> {
    if value.is_empty() {
        return Err(ChaincodeError::validation(format!("{name} cannot be empty")));
    }
    Ok(())
}

/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn parse_bool(name: &str, value: &str) -> Result<bool, ChaincodeError> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ChaincodeError::validation(format!(
            "{name} must be a boolean, got {value:?}"
        ))),
    }
}

pub fn parse_i64(name: &str, value: &str) -> Result<i64, ChaincodeError> {
    value
        .parse()
        .map_err(|_| ChaincodeError::validation(format!("{name} must be an integer, got {value:?}")))
}

pub fn parse_f64(name: &str, value: &str) -> Result<f64, ChaincodeError> {
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(ChaincodeError::validation(format!(
            "{name} must be a finite number, got {value:?}"
        ))),
    }
}

pub fn parse_json<T: DeserializeOwned>(name: &str, value: &str) -> Result<T, ChaincodeError> {
    serde_json::from_str(value)
        .map_err(|e| ChaincodeError::validation(format!("{name} is not valid JSON: {e}")))
}

/// Pair up trailing `k1 v1 k2 v2 ...` arguments.
pub fn key_value_pairs(args: &[String]) -> Result<Vec<(String, String)>, ChaincodeError> {
    if args.len() % 2 != 0 {
        return Err(ChaincodeError::validation(
            "metadata must be given as key/value pairs",
        ));
    }
    args.chunks_exact(2)
        .map(|pair| -> Result<(String, String), ChaincodeError> {
            require_non_empty("metadata key", &pair[0])?;
            Ok((pair[0].clone(), pair[1].clone()))
        })
        .collect()
}

/// Optional trailing argument; an empty string counts as absent.
pub fn optional_arg(args: &[String], index: usize) -> Option<&str> {
    args.get(index)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_arg_counts() {
        let args = strings(&["a", "b"]);
        assert!(expect_args("f", &args, 2).is_ok());
        let err = expect_args("f", &args, 3).unwrap_err();
        assert!(err.to_string().contains("expecting 3, got 2"));
        assert!(expect_args_range("f", &args, 1, 2).is_ok());
        assert!(expect_args_range("f", &args, 3, 4).is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("success", "true").unwrap());
        assert!(parse_bool("success", "T").unwrap());
        assert!(!parse_bool("success", "0").unwrap());
        assert!(parse_bool("success", "yes").is_err());
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_i64("days", "-3").unwrap(), -3);
        assert!(parse_i64("days", "3.5").is_err());
        assert_eq!(parse_f64("amount", "12.5").unwrap(), 12.5);
        assert!(parse_f64("amount", "NaN").is_err());
    }

    #[test]
    fn test_key_value_pairs() {
        let pairs = key_value_pairs(&strings(&["region", "eu", "tier", "1"])).unwrap();
        assert_eq!(pairs[1], ("tier".to_string(), "1".to_string()));
        assert!(key_value_pairs(&strings(&["dangling"])).is_err());
        assert!(key_value_pairs(&strings(&["", "v"])).is_err());
    }

    #[test]
    fn test_optional_arg() {
        let args = strings(&["a", ""]);
        assert_eq!(optional_arg(&args, 0), Some("a"));
        assert_eq!(optional_arg(&args, 1), None);
        assert_eq!(optional_arg(&args, 5), None);
    }

    #[test]
    fn test_parse_json() {
        let value: serde_json::Value = parse_json("claims", r#"{"a":1}"#).unwrap();
        assert_eq!(value["a"], 1);
        assert!(parse_json::<serde_json::Value>("claims", "{").is_err());
    }
}
