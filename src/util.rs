use crate::error::{BlockingError, Result};
use std::env;

pub fn get_env_flag(name: &str) -> Result<Option<bool>> {
    match env::var(name) {
        Ok(val) => parse_flag(name, &val).map(Some),
        Err(_) => Ok(None),
    }
}

pub fn get_env_usize(name: &str) -> Result<Option<usize>> {
    match env::var(name) {
        Ok(val) => val.trim().parse().map(Some).map_err(|_| {
            BlockingError::invalid_config(format!("Unable to parse {} from '{}'", name, val))
        }),
        Err(_) => Ok(None),
    }
}

fn parse_flag(name: &str, val: &str) -> Result<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BlockingError::invalid_config(format!(
            "Unable to parse {} from '{}'",
            name, val
        ))),
    }
}
