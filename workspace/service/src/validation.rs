use url::Url;

use crate::error::{Result, ServiceError};

/// Parses an avatar link, rejecting anything that is not an absolute URL.
pub fn parse_avatar(field: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| ServiceError::Validation(format!("{} is not a valid URL: {}", field, e)))
}

/// Parses an optional avatar link.
pub fn parse_optional_avatar(field: &str, value: Option<&str>) -> Result<Option<Url>> {
    value.map(|v| parse_avatar(field, v)).transpose()
}

/// Applies a signed change to a balance, refusing overflow and negative results.
pub fn apply_money_delta(balance: i32, delta: i32) -> Result<i32> {
    let updated = balance
        .checked_add(delta)
        .ok_or_else(|| ServiceError::Validation(format!("Money change {} overflows balance {}", delta, balance)))?;
    if updated < 0 {
        return Err(ServiceError::Validation(format!(
            "Insufficient money: balance {} cannot cover {}",
            balance, delta
        )));
    }
    Ok(updated)
}

/// Rejects a balance that is already negative.
pub fn check_balance(money: i32) -> Result<()> {
    if money < 0 {
        return Err(ServiceError::Validation(format!("Money cannot be negative (got {})", money)));
    }
    Ok(())
}
