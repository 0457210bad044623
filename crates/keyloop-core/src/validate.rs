//! Input validation shared by orchestration and request translation

use crate::error::{GatewayError, GatewayResult};
use crate::models::PartsOrderRequest;

/// Require a non-blank parameter, returning it trimmed
pub fn require<'a>(name: &str, value: Option<&'a str>) -> GatewayResult<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(GatewayError::Validation(format!("{} is required", name))),
    }
}

/// Require at least one order line
pub fn require_order_lines(order: &PartsOrderRequest) -> GatewayResult<()> {
    match &order.parts {
        None => Err(GatewayError::Validation(
            "Parts list is required.".to_string(),
        )),
        Some(parts) if parts.is_empty() => Err(GatewayError::Validation(
            "At least one part is required.".to_string(),
        )),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PartOrder;

    #[test]
    fn test_require() {
        assert_eq!(require("brandCode", Some(" B1 ")).unwrap(), "B1");
        assert!(matches!(
            require("brandCode", Some("")),
            Err(GatewayError::Validation(msg)) if msg == "brandCode is required"
        ));
        assert!(require("partCode", Some("   ")).is_err());
        assert!(require("customerId", None).is_err());
    }

    #[test]
    fn test_require_order_lines() {
        let mut order = PartsOrderRequest::default();
        assert!(require_order_lines(&order).is_err());

        order.parts = Some(vec![]);
        assert!(require_order_lines(&order).is_err());

        order.parts = Some(vec![PartOrder::default()]);
        assert!(require_order_lines(&order).is_ok());
    }
}
