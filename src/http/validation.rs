//! Request validation for order bodies.
//!
//! All rules run on every request; violations are collected, never
//! short-circuited. Item violations are path-qualified as
//! `items[<index>].<field>`.

use rust_decimal::Decimal;
use serde::Serialize;

use super::dto::{OrderItemRequest, OrderRequest};
use crate::order::{OrderDraft, OrderItem};

const MAX_CUSTOMER_NAME: usize = 200;
const MAX_SKU: usize = 100;
const MAX_DESCRIPTION: usize = 500;

/// One violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub error_message: String,
    pub member_names: Vec<String>,
}

impl ValidationError {
    fn new(message: &str, member: impl Into<String>) -> Self {
        Self {
            error_message: message.to_string(),
            member_names: vec![member.into()],
        }
    }
}

/// Body of a 400 validation response.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
}

#[derive(Default)]
struct Violations(Vec<ValidationError>);

impl Violations {
    fn push(&mut self, message: &str, member: impl Into<String>) {
        self.0.push(ValidationError::new(message, member));
    }

    fn text(
        &mut self,
        value: Option<&str>,
        max: usize,
        member: impl Into<String>,
        required: &str,
        too_long: &str,
    ) {
        match value {
            Some(v) if !v.trim().is_empty() => {
                if v.chars().count() > max {
                    self.push(too_long, member);
                }
            }
            _ => self.push(required, member),
        }
    }
}

fn check_item(violations: &mut Violations, index: usize, item: &OrderItemRequest) {
    let member = |field: &str| format!("items[{index}].{field}");

    violations.text(
        item.sku.as_deref(),
        MAX_SKU,
        member("sku"),
        "SKU is required",
        "SKU cannot exceed 100 characters",
    );
    violations.text(
        item.description.as_deref(),
        MAX_DESCRIPTION,
        member("description"),
        "Description is required",
        "Description cannot exceed 500 characters",
    );

    if !matches!(item.quantity, Some(q) if (1..=i64::from(i32::MAX)).contains(&q)) {
        violations.push("Quantity must be greater than 0", member("quantity"));
    }

    let min_price = Decimal::new(1, 2);
    if !matches!(item.unit_price, Some(p) if p >= min_price) {
        violations.push("Unit price must be greater than 0", member("unitPrice"));
    }
}

/// Check every rule and return all violations, in field order.
pub fn validate(request: &OrderRequest) -> Vec<ValidationError> {
    let mut violations = Violations::default();

    violations.text(
        request.customer_name.as_deref(),
        MAX_CUSTOMER_NAME,
        "customerName",
        "Customer name is required",
        "Customer name cannot exceed 200 characters",
    );

    match &request.items {
        None => violations.push("Order items are required", "items"),
        Some(items) if items.is_empty() => {
            violations.push("Order must contain at least one item", "items")
        }
        Some(items) => {
            for (index, item) in items.iter().enumerate() {
                check_item(&mut violations, index, item);
            }
        }
    }

    violations.0
}

impl TryFrom<OrderRequest> for OrderDraft {
    type Error = Vec<ValidationError>;

    fn try_from(request: OrderRequest) -> Result<Self, Self::Error> {
        let violations = validate(&request);
        if !violations.is_empty() {
            return Err(violations);
        }

        // validate() guarantees every field below is present and in range.
        let items = request
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|item| {
                OrderItem::new(
                    item.sku.unwrap_or_default(),
                    item.description.unwrap_or_default(),
                    item.quantity.and_then(|q| u32::try_from(q).ok()).unwrap_or_default(),
                    item.unit_price.unwrap_or_default(),
                )
            })
            .collect();

        Ok(OrderDraft::new(request.customer_name.unwrap_or_default(), items))
    }
}
