use serde_json::Value;

use crate::error::AppError;

/// Donation amounts arrive as a JSON string or number depending on the
/// client. Whole, positive VND amounts only.
pub fn parse_amount(raw: Option<&Value>) -> Result<i64, AppError> {
    let invalid = || AppError::InvalidInput("A valid amount is required.".to_string());

    let numeric = match raw.ok_or_else(invalid)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    match numeric {
        Some(amount) if amount > 0.0 && amount.fract() == 0.0 && amount <= i64::MAX as f64 => {
            Ok(amount as i64)
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_amount;
    use serde_json::json;

    #[test]
    fn accepts_positive_whole_amounts() {
        assert_eq!(parse_amount(Some(&json!(50000))).unwrap(), 50000);
        assert_eq!(parse_amount(Some(&json!("50000"))).unwrap(), 50000);
        assert_eq!(parse_amount(Some(&json!(" 20000 "))).unwrap(), 20000);
    }

    #[test]
    fn rejects_missing_zero_and_negative() {
        assert!(parse_amount(None).is_err());
        assert!(parse_amount(Some(&json!(0))).is_err());
        assert!(parse_amount(Some(&json!(-5))).is_err());
        assert!(parse_amount(Some(&json!("-5"))).is_err());
    }

    #[test]
    fn rejects_non_numeric() {
        assert!(parse_amount(Some(&json!("abc"))).is_err());
        assert!(parse_amount(Some(&json!(null))).is_err());
        assert!(parse_amount(Some(&json!(123.45))).is_err());
        assert!(parse_amount(Some(&json!({"amount": 1}))).is_err());
    }
}
