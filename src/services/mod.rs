pub mod availability;
pub mod credentials;
pub mod csrf;
pub mod ledger;
pub mod lifecycle;
pub mod pricing;
pub mod report;
pub mod session;
