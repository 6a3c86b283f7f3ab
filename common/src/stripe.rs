use std::collections::HashMap;

use stripe::{
    Client, CreatePrice, CreatePriceRecurring, CreatePriceRecurringInterval, CreateProduct,
    Currency, IdOrCreate, Price, Product,
};

use crate::error::{AppError, Res};

pub fn create_client(secret_key: &str) -> Client {
    Client::new(secret_key)
}

/// Billing interval of a published price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceInterval {
    Month,
    Year,
}

impl From<PriceInterval> for CreatePriceRecurringInterval {
    fn from(interval: PriceInterval) -> Self {
        match interval {
            PriceInterval::Month => CreatePriceRecurringInterval::Month,
            PriceInterval::Year => CreatePriceRecurringInterval::Year,
        }
    }
}

pub fn parse_currency(code: &str) -> Res<Currency> {
    serde_json::from_value(serde_json::Value::String(code.trim().to_lowercase()))
        .map_err(|_| AppError::Validation(format!("Unsupported currency: {}", code)))
}

pub async fn create_product(
    client: &Client,
    name: &str,
    description: Option<&str>,
    metadata: HashMap<String, String>,
) -> Res<Product> {
    let mut params = CreateProduct::new(name);
    params.description = description;
    params.metadata = Some(metadata);

    Product::create(client, params)
        .await
        .map_err(AppError::from)
}

/// Publishes a recurring price for `product_id`, amount in the smallest currency unit.
pub async fn create_recurring_price(
    client: &Client,
    product_id: &str,
    unit_amount: i64,
    currency: Currency,
    interval: PriceInterval,
    interval_count: u64,
) -> Res<Price> {
    let mut params = CreatePrice::new(currency);
    params.product = Some(IdOrCreate::Id(product_id));
    params.unit_amount = Some(unit_amount);
    params.recurring = Some(CreatePriceRecurring {
        interval: interval.into(),
        interval_count: Some(interval_count),
        ..Default::default()
    });

    Price::create(client, params).await.map_err(AppError::from)
}
