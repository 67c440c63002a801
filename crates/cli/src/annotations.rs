//! Parsing of `key=value` annotation arguments

use golembase_storagetx::{NumericAnnotation, StringAnnotation};

fn split_pair(arg: &str) -> Result<(&str, &str), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", arg))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("annotation key is empty in '{}'", arg));
    }
    Ok((key, value))
}

pub fn parse_string_annotation(arg: &str) -> Result<StringAnnotation, String> {
    let (key, value) = split_pair(arg)?;
    Ok(StringAnnotation::new(key, value))
}

pub fn parse_numeric_annotation(arg: &str) -> Result<NumericAnnotation, String> {
    let (key, value) = split_pair(arg)?;
    let value = value
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid number '{}' for annotation '{}': {}", value, key, e))?;
    Ok(NumericAnnotation::new(key, value))
}
