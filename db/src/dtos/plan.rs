use crate::models::plan::BillingCycle;

pub struct PlanCreateRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub billing_cycle: BillingCycle,
    pub discount_percentage: f64,
    pub features: Vec<String>,
}
