//! Pure validation of create-inquiry requests. All rules are evaluated
//! independently and every violation is collected, so one response can list
//! everything that is wrong with a request.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::inquiry::CreateInquiryRequest;

// Simple local@domain.tld shape, not full RFC 5322.
static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

pub fn validate_create_inquiry(request: &CreateInquiryRequest) -> ValidationReport {
    let mut errors = Vec::new();

    if request.customer_name.trim().is_empty() {
        errors.push("customer_name is required".to_string());
    }

    let email = request.customer_email.trim();
    if email.is_empty() {
        errors.push("customer_email is required".to_string());
    } else if !EMAIL_SHAPE.is_match(email) {
        errors.push("customer_email must be a valid email address".to_string());
    }

    if request.items.is_empty() {
        errors.push("items cannot be empty".to_string());
    }

    for (index, item) in request.items.iter().enumerate() {
        if item.product_id.trim().is_empty() {
            errors.push(format!("items[{}].product_id is required", index));
        }
        if item.product_name.trim().is_empty() {
            errors.push(format!("items[{}].product_name is required", index));
        }
        if item.quantity <= 0 {
            errors.push(format!("items[{}].quantity must be greater than zero", index));
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inquiry::InquiryItemRequest;
    use rust_decimal_macros::dec;

    fn valid_request() -> CreateInquiryRequest {
        CreateInquiryRequest {
            customer_name: "Ann".to_string(),
            customer_email: "ann@x.com".to_string(),
            customer_phone: None,
            notes: None,
            delivery_address: None,
            preferred_delivery_date: None,
            items: vec![InquiryItemRequest {
                product_id: "p1".to_string(),
                product_name: "Tea".to_string(),
                product_category: Some("beverage".to_string()),
                quantity: 2,
                unit_price: Some(dec!(100)),
                total_price: None,
                notes: None,
            }],
        }
    }

    #[test]
    fn valid_request_passes() {
        let report = validate_create_inquiry(&valid_request());
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn all_violations_are_collected_in_one_call() {
        let request = CreateInquiryRequest {
            customer_name: "   ".to_string(),
            customer_email: String::new(),
            items: Vec::new(),
            ..valid_request()
        };

        let report = validate_create_inquiry(&request);
        assert!(!report.is_valid);
        assert_eq!(
            report.errors,
            vec![
                "customer_name is required",
                "customer_email is required",
                "items cannot be empty",
            ]
        );
    }

    #[test]
    fn malformed_email_is_rejected() {
        for email in ["ann", "ann@", "@x.com", "ann@x", "ann x@x.com"] {
            let mut request = valid_request();
            request.customer_email = email.to_string();
            let report = validate_create_inquiry(&request);
            assert!(!report.is_valid, "email {:?} should fail", email);
            assert!(report
                .errors
                .contains(&"customer_email must be a valid email address".to_string()));
        }
    }

    #[test]
    fn item_violations_carry_their_index() {
        let mut request = valid_request();
        request.items.push(InquiryItemRequest {
            product_id: String::new(),
            product_name: "  ".to_string(),
            product_category: None,
            quantity: 0,
            unit_price: None,
            total_price: None,
            notes: None,
        });

        let report = validate_create_inquiry(&request);
        assert_eq!(
            report.errors,
            vec![
                "items[1].product_id is required",
                "items[1].product_name is required",
                "items[1].quantity must be greater than zero",
            ]
        );
    }
}
