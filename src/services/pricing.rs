//! Price, minimum deposit and payment status for a booking.
//!
//! Everything here is pure. The figures are re-derived whenever the
//! duration or the amount paid changes: on booking create/edit and on every
//! payment write.

use serde::Serialize;

use crate::models::PaymentStatus;

/// Rupiah per hour of room use.
pub const HOURLY_RATE: i64 = 1_000_000;

/// Share of the total that counts as a deposit, in percent.
pub const DEPOSIT_PERCENT: i64 = 30;

/// Upper bound accepted for a configured rate.
pub const MAX_HOURLY_RATE: i64 = 1_000_000_000_000;

pub const MIN_DURATION_HOURS: i64 = 1;
pub const MAX_DURATION_HOURS: i64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub total_price: i64,
    pub min_deposit: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    hourly_rate: i64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self { hourly_rate: HOURLY_RATE }
    }
}

impl Pricing {
    pub fn new(hourly_rate: i64) -> Self {
        Self { hourly_rate }
    }

    pub fn hourly_rate(&self) -> i64 {
        self.hourly_rate
    }

    pub fn total_price(&self, duration_hours: i64) -> i64 {
        duration_hours.saturating_mul(self.hourly_rate)
    }

    /// `floor(total * 30%)`.
    pub fn min_deposit(&self, duration_hours: i64) -> i64 {
        deposit_of(self.total_price(duration_hours))
    }

    pub fn quote(&self, duration_hours: i64) -> Quote {
        let total_price = self.total_price(duration_hours);
        Quote {
            total_price,
            min_deposit: deposit_of(total_price),
        }
    }

    pub fn status_for(&self, amount_paid: i64, duration_hours: i64) -> PaymentStatus {
        status_against_total(amount_paid, self.total_price(duration_hours))
    }
}

fn deposit_of(total: i64) -> i64 {
    ((total as i128 * DEPOSIT_PERCENT as i128).div_euclid(100)) as i64
}

/// Classifies a payment against an already known total. The deposit
/// threshold is compared exactly, so paying precisely 30% is a deposit.
pub fn status_against_total(amount_paid: i64, total: i64) -> PaymentStatus {
    let paid = amount_paid as i128;
    if paid >= total as i128 {
        PaymentStatus::Paid
    } else if paid * 100 >= total as i128 * DEPOSIT_PERCENT as i128 {
        PaymentStatus::Deposit
    } else {
        PaymentStatus::Unpaid
    }
}

/// Status at the standard hourly rate.
pub fn compute_status(amount_paid: i64, duration_hours: i64) -> PaymentStatus {
    Pricing::default().status_for(amount_paid, duration_hours)
}
