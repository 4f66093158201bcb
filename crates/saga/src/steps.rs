//! Step names recorded in the saga audit trail.

pub const STEP_ORDER_CREATED: &str = "ORDER_CREATED";
pub const STEP_PAYMENT_PROCESSED: &str = "PAYMENT_PROCESSED";
pub const STEP_RISK_ANALYZED: &str = "RISK_ANALYZED";
