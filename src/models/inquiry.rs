use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle of a quote request. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    Pending,
    Quoted,
    Confirmed,
    Completed,
    Cancelled,
}

impl InquiryStatus {
    pub const ALL: [InquiryStatus; 5] = [
        InquiryStatus::Pending,
        InquiryStatus::Quoted,
        InquiryStatus::Confirmed,
        InquiryStatus::Completed,
        InquiryStatus::Cancelled,
    ];

    /// Allowed next states. Empty for terminal states; self-transitions are
    /// never in the set.
    pub fn available_transitions(&self) -> &'static [InquiryStatus] {
        match self {
            InquiryStatus::Pending => &[InquiryStatus::Quoted, InquiryStatus::Cancelled],
            InquiryStatus::Quoted => &[InquiryStatus::Confirmed, InquiryStatus::Cancelled],
            InquiryStatus::Confirmed => &[InquiryStatus::Completed, InquiryStatus::Cancelled],
            InquiryStatus::Completed | InquiryStatus::Cancelled => &[],
        }
    }

    /// Pure predicate; callers decide how to handle a rejected transition.
    pub fn can_transition_to(&self, to: InquiryStatus) -> bool {
        self.available_transitions().contains(&to)
    }

    pub fn is_terminal(&self) -> bool {
        self.available_transitions().is_empty()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryStatus::Pending => "pending",
            InquiryStatus::Quoted => "quoted",
            InquiryStatus::Confirmed => "confirmed",
            InquiryStatus::Completed => "completed",
            InquiryStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for InquiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown inquiry status '{0}'")]
pub struct ParseStatusError(String);

impl FromStr for InquiryStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InquiryStatus::Pending),
            "quoted" => Ok(InquiryStatus::Quoted),
            "confirmed" => Ok(InquiryStatus::Confirmed),
            "completed" => Ok(InquiryStatus::Completed),
            "cancelled" => Ok(InquiryStatus::Cancelled),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub status: InquiryStatus,
    pub notes: Option<String>,
    pub delivery_address: Option<String>,
    pub preferred_delivery_date: Option<NaiveDate>,
    pub total_estimated_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One product line of an inquiry. Product fields are a snapshot taken at
/// creation time so historical inquiries stay stable if the catalog record
/// changes later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InquiryItem {
    pub id: Uuid,
    pub inquiry_id: Uuid,
    pub product_id: String,
    pub product_name: String,
    pub product_category: Option<String>,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub total_price: Option<Decimal>,
    pub notes: Option<String>,
}

/// An inquiry plus its owned items, treated as one consistency unit.
#[derive(Debug, Clone, Serialize)]
pub struct InquiryAggregate {
    pub inquiry: Inquiry,
    pub items: Vec<InquiryItem>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInquiryRequest {
    #[validate(length(max = 200, message = "Customer name too long"))]
    pub customer_name: String,
    #[validate(length(max = 320, message = "Customer email too long"))]
    pub customer_email: String,
    #[validate(length(max = 40, message = "Phone number too long"))]
    pub customer_phone: Option<String>,
    #[validate(length(max = 2000, message = "Notes too long"))]
    pub notes: Option<String>,
    #[validate(length(max = 500, message = "Delivery address too long"))]
    pub delivery_address: Option<String>,
    pub preferred_delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub items: Vec<InquiryItemRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InquiryItemRequest {
    pub product_id: String,
    pub product_name: String,
    pub product_category: Option<String>,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub total_price: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInquiryRequest {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InquiryResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub inquiry_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub status: InquiryStatus,
    pub notes: Option<String>,
    pub delivery_address: Option<String>,
    pub preferred_delivery_date: Option<NaiveDate>,
    pub total_estimated_amount: Decimal,
    pub total_quantity: i64,
    pub items: Vec<InquiryItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<InquiryAggregate> for InquiryResponse {
    fn from(aggregate: InquiryAggregate) -> Self {
        let InquiryAggregate { inquiry, items } = aggregate;
        Self {
            inquiry_number: format_inquiry_number(inquiry.id, inquiry.created_at),
            total_quantity: calculate_total_quantity(&items),
            id: inquiry.id,
            user_id: inquiry.user_id,
            customer_name: inquiry.customer_name,
            customer_email: inquiry.customer_email,
            customer_phone: inquiry.customer_phone,
            status: inquiry.status,
            notes: inquiry.notes,
            delivery_address: inquiry.delivery_address,
            preferred_delivery_date: inquiry.preferred_delivery_date,
            total_estimated_amount: inquiry.total_estimated_amount,
            items,
            created_at: inquiry.created_at,
            updated_at: inquiry.updated_at,
        }
    }
}

/// Line total with the pricing fallback chain:
/// total_price, else quantity * unit_price, else zero.
fn line_total(quantity: i32, unit_price: Option<Decimal>, total_price: Option<Decimal>) -> Decimal {
    total_price
        .or_else(|| unit_price.map(|price| Decimal::from(quantity) * price))
        .unwrap_or(Decimal::ZERO)
}

/// Sum of line totals over stored items. Zero for an inquiry with no items.
pub fn calculate_total_amount(items: &[InquiryItem]) -> Decimal {
    items
        .iter()
        .map(|item| line_total(item.quantity, item.unit_price, item.total_price))
        .sum()
}

/// Same computation over a create request, used to derive
/// `total_estimated_amount` before the aggregate is persisted.
pub fn estimate_total(items: &[InquiryItemRequest]) -> Decimal {
    items
        .iter()
        .map(|item| line_total(item.quantity, item.unit_price, item.total_price))
        .sum()
}

pub fn calculate_total_quantity(items: &[InquiryItem]) -> i64 {
    items.iter().map(|item| i64::from(item.quantity)).sum()
}

/// Human-readable display code, e.g. `INQ20260830-9F3A21BC`. Derived from the
/// creation date (UTC) and the first eight characters of the id; never
/// persisted as a separate identity.
pub fn format_inquiry_number(id: Uuid, created_at: DateTime<Utc>) -> String {
    let id_str = id.to_string();
    format!(
        "INQ{}-{}",
        created_at.format("%Y%m%d"),
        id_str[..8].to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn item(quantity: i32, unit_price: Option<Decimal>, total_price: Option<Decimal>) -> InquiryItem {
        InquiryItem {
            id: Uuid::new_v4(),
            inquiry_id: Uuid::new_v4(),
            product_id: "p1".to_string(),
            product_name: "Sencha".to_string(),
            product_category: None,
            quantity,
            unit_price,
            total_price,
            notes: None,
        }
    }

    #[test]
    fn transition_table_matches_state_machine() {
        use InquiryStatus::*;

        let allowed = [
            (Pending, Quoted),
            (Pending, Cancelled),
            (Quoted, Confirmed),
            (Quoted, Cancelled),
            (Confirmed, Completed),
            (Confirmed, Cancelled),
        ];

        for from in InquiryStatus::ALL {
            for to in InquiryStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "transition {} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn terminal_states_have_no_transitions() {
        assert!(InquiryStatus::Completed.available_transitions().is_empty());
        assert!(InquiryStatus::Cancelled.available_transitions().is_empty());
        assert!(InquiryStatus::Completed.is_terminal());
        assert!(InquiryStatus::Cancelled.is_terminal());
        assert!(!InquiryStatus::Pending.is_terminal());
    }

    #[test]
    fn self_transitions_are_rejected() {
        for status in InquiryStatus::ALL {
            assert!(!status.can_transition_to(status), "self-transition {}", status);
        }
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in InquiryStatus::ALL {
            assert_eq!(status.as_str().parse::<InquiryStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<InquiryStatus>().is_err());
    }

    #[test]
    fn total_amount_prefers_explicit_total_price() {
        let items = vec![
            item(2, Some(dec!(100)), None),
            item(3, Some(dec!(10)), Some(dec!(25))),
            item(5, None, None),
        ];
        assert_eq!(calculate_total_amount(&items), dec!(225));
    }

    #[test]
    fn total_amount_is_order_independent() {
        let mut items = vec![
            item(2, Some(dec!(100)), None),
            item(1, None, Some(dec!(42.50))),
            item(4, Some(dec!(7.25)), None),
        ];
        let forward = calculate_total_amount(&items);
        items.reverse();
        assert_eq!(calculate_total_amount(&items), forward);
    }

    #[test]
    fn total_amount_of_no_items_is_zero() {
        assert_eq!(calculate_total_amount(&[]), Decimal::ZERO);
    }

    #[test]
    fn total_quantity_sums_all_lines() {
        let items = vec![item(2, None, None), item(7, None, None)];
        assert_eq!(calculate_total_quantity(&items), 9);
    }

    #[test]
    fn inquiry_number_is_deterministic() {
        let id = Uuid::parse_str("9f3a21bc-0000-4000-8000-000000000000").unwrap();
        let created_at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();

        let first = format_inquiry_number(id, created_at);
        let second = format_inquiry_number(id, created_at);
        assert_eq!(first, second);
        assert_eq!(first, "INQ20260314-9F3A21BC");
    }

    #[test]
    fn same_day_inquiries_share_prefix_but_differ_in_suffix() {
        let created_at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        let a = format_inquiry_number(Uuid::new_v4(), created_at);
        let b = format_inquiry_number(Uuid::new_v4(), created_at);

        assert!(a.starts_with("INQ20260314-"));
        assert!(b.starts_with("INQ20260314-"));
        assert_ne!(a, b);
    }
}
