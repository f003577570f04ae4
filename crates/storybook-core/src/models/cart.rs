use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Line item in the server-owned cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub book_id: String,
    #[serde(default)]
    pub personalization_id: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub book_title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub subtotal: Option<Decimal>,
}

impl Cart {
    /// Number of books in the cart (drives the header badge).
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// Body of `POST /cart/items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub book_id: String,
    pub personalization_id: String,
    pub quantity: u32,
    pub language_code: String,
}

/// Body of `PUT /cart/items/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_request_uses_camel_case() {
        let req = AddCartItemRequest {
            book_id: "b-1".to_string(),
            personalization_id: "p-1".to_string(),
            quantity: 1,
            language_code: "en".to_string(),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "bookId": "b-1",
                "personalizationId": "p-1",
                "quantity": 1,
                "languageCode": "en"
            })
        );
    }

    #[test]
    fn item_count_sums_quantities() {
        let cart: Cart = serde_json::from_value(serde_json::json!({
            "items": [
                {"id": "1", "bookId": "b-1", "quantity": 2},
                {"id": "2", "bookId": "b-2", "quantity": 1, "personalizationId": "p-9"}
            ]
        }))
        .unwrap();
        assert_eq!(cart.item_count(), 3);
    }
}
