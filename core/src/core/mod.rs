pub mod aggregator;
pub mod category;
pub mod engine;
pub mod identity;
pub mod issue;
pub mod remediation;
pub mod report;
pub mod score;
pub mod store;
