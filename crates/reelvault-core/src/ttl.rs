//! Time-to-live parsing and display for signed links.

use crate::error::AppError;

pub const ONE_HOUR: u64 = 3600;
pub const ONE_DAY: u64 = 86_400;

const TTL_ALIASES: &[(&str, u64)] = &[
    ("1h", ONE_HOUR),
    ("6h", 6 * ONE_HOUR),
    ("24h", ONE_DAY),
    ("1d", ONE_DAY),
    ("7d", 7 * ONE_DAY),
    ("1w", 7 * ONE_DAY),
    ("30d", 30 * ONE_DAY),
    ("1m", 30 * ONE_DAY),
];

/// Parse a TTL given as whole seconds (`>= 1`) or one of the shorthand aliases
/// (`1h`, `6h`, `24h`/`1d`, `7d`/`1w`, `30d`/`1m`).
pub fn parse_ttl(input: &str) -> Result<u64, AppError> {
    let trimmed = input.trim();
    if let Some((_, secs)) = TTL_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
    {
        return Ok(*secs);
    }

    match trimmed.parse::<i64>() {
        Ok(secs) if secs >= 1 => Ok(secs as u64),
        Ok(_) => Err(AppError::InvalidInput(
            "TTL must be at least 1 second".to_string(),
        )),
        Err(_) => Err(AppError::InvalidInput(format!(
            "Invalid TTL '{}': expected seconds or one of 1h, 6h, 1d, 7d, 30d",
            input
        ))),
    }
}

/// Render a TTL the coarse way a person would say it: "45 seconds", "2 hours", "7 days".
pub fn describe_ttl(secs: u64) -> String {
    let (value, unit) = if secs < 60 {
        (secs, "second")
    } else if secs < ONE_HOUR {
        (secs / 60, "minute")
    } else if secs < ONE_DAY {
        (secs / ONE_HOUR, "hour")
    } else {
        (secs / ONE_DAY, "day")
    };

    if value == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", value, unit)
    }
}
