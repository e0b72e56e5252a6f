use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingCreatedEvent {
    pub booking_id: Uuid,
    pub reference: String,
    pub customer_id: Uuid,
    pub tour_id: Uuid,
    pub total_amount: String,
    pub currency: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct VoucherIssuedEvent {
    pub booking_id: Uuid,
    pub path: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ReviewModeratedEvent {
    pub review_id: Uuid,
    pub tour_id: Uuid,
    pub approved: bool,
    pub timestamp: i64,
}
