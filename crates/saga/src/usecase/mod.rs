//! Application use cases, one per saga step plus the payment refresh.

pub mod analyze_risk;
pub mod create_order;
pub mod process_payment;
pub mod refresh_payment_status;

pub use analyze_risk::{AnalyzeRisk, RiskAnalysisOutcome, RiskDisposition};
pub use create_order::CreateOrder;
pub use process_payment::ProcessPayment;
pub use refresh_payment_status::RefreshPaymentStatus;
