use common::error::Res;
use sqlx::PgPool;

use crate::{
    dtos::plan::PlanCreateRequest,
    models::plan::{BillingCycle, Plan},
};

fn premium_features() -> Vec<String> {
    [
        "Full catalogue access",
        "4K quality",
        "4 simultaneous screens",
        "Offline downloads",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

pub fn default_plans() -> Vec<PlanCreateRequest> {
    vec![
        PlanCreateRequest {
            name: "Premium".to_string(),
            description: Some("Full catalogue access at top quality".to_string()),
            price: 49.90,
            billing_cycle: BillingCycle::Monthly,
            discount_percentage: 0.0,
            features: premium_features(),
        },
        PlanCreateRequest {
            name: "Premium Trimestral".to_string(),
            description: Some("Full catalogue access at top quality".to_string()),
            price: 134.90,
            billing_cycle: BillingCycle::Quarterly,
            discount_percentage: 10.0,
            features: premium_features(),
        },
        PlanCreateRequest {
            name: "Premium Anual".to_string(),
            description: Some("Full catalogue access at top quality".to_string()),
            price: 499.90,
            billing_cycle: BillingCycle::Annual,
            discount_percentage: 16.7,
            features: premium_features(),
        },
    ]
}

/// Inserts the default catalogue into an empty `plans` table.
/// Returns the inserted plans; nothing is inserted when plans already exist.
pub async fn seed_default_plans(pool: &PgPool) -> Res<Vec<Plan>> {
    if crate::plan::count_plans(pool).await? > 0 {
        return Ok(Vec::new());
    }

    let mut tx = pool.begin().await?;
    let mut inserted = Vec::new();
    for plan in default_plans() {
        inserted.push(crate::plan::insert_plan(&mut *tx, plan).await?);
    }
    tx.commit().await?;

    Ok(inserted)
}
