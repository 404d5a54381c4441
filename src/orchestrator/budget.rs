//! Budget management

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Spend is tracked in millionths of a dollar
const MICROS_PER_DOLLAR: i64 = 1_000_000;

fn to_micros(amount: Decimal) -> u64 {
    (amount * Decimal::from(MICROS_PER_DOLLAR))
        .round()
        .to_u64()
        .unwrap_or(0)
}

/// Dollar amount from an f64, dropping binary noise below a nano-dollar
fn to_decimal(amount: f64) -> Option<Decimal> {
    Decimal::from_f64_retain(amount).map(|d| d.round_dp(9))
}

fn from_micros(micros: u64) -> Decimal {
    Decimal::from(micros) / Decimal::from(MICROS_PER_DOLLAR)
}

/// Snapshot of spend against limits
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    pub daily_limit: Decimal,
    pub monthly_limit: Decimal,
    pub spent_today: Decimal,
    pub spent_month: Decimal,
}

/// Budget manager for API costs
///
/// Cloning shares the counters, so one manager can serve all request
/// handlers.
#[derive(Clone)]
pub struct BudgetManager {
    daily_limit: Decimal,
    monthly_limit: Decimal,
    spent_today: Arc<AtomicU64>,
    spent_month: Arc<AtomicU64>,
    period: Arc<Mutex<NaiveDate>>,
}

impl BudgetManager {
    pub fn new() -> Self {
        Self::with_limits(1.0, 10.0)
    }

    pub fn with_limits(daily_limit: f64, monthly_limit: f64) -> Self {
        Self {
            daily_limit: to_decimal(daily_limit).unwrap_or_default(),
            monthly_limit: to_decimal(monthly_limit).unwrap_or_default(),
            spent_today: Arc::new(AtomicU64::new(0)),
            spent_month: Arc::new(AtomicU64::new(0)),
            period: Arc::new(Mutex::new(Utc::now().date_naive())),
        }
    }

    pub fn from_config(config: &crate::config::BudgetConfig) -> Self {
        Self::with_limits(config.daily_limit, config.monthly_limit)
    }

    /// Reset counters whose period ended before `today`
    pub fn roll_over(&self, today: NaiveDate) {
        let mut period = match self.period.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *period == today {
            return;
        }
        if (period.year(), period.month()) != (today.year(), today.month()) {
            info!("New budget month, resetting monthly spend");
            self.spent_month.store(0, Ordering::Relaxed);
        }
        info!("New budget day, resetting daily spend");
        self.spent_today.store(0, Ordering::Relaxed);
        *period = today;
    }

    /// Check if we can afford this cost
    pub fn can_afford(&self, estimated_cost: Decimal) -> bool {
        // Always allow free
        if estimated_cost <= Decimal::ZERO {
            return true;
        }
        self.roll_over(Utc::now().date_naive());

        let today_spent = from_micros(self.spent_today.load(Ordering::Relaxed));
        let month_spent = from_micros(self.spent_month.load(Ordering::Relaxed));

        today_spent + estimated_cost <= self.daily_limit
            && month_spent + estimated_cost <= self.monthly_limit
    }

    /// Convenience method to check if we can spend an amount (in dollars)
    pub fn can_spend(&self, amount: f64) -> bool {
        match to_decimal(amount) {
            Some(cost) => self.can_afford(cost),
            None => false,
        }
    }

    /// Record a spent amount (in dollars)
    pub fn record_spend(&self, amount: f64) {
        let Some(cost) = to_decimal(amount) else {
            warn!("Ignoring non-finite spend amount {}", amount);
            return;
        };
        if cost <= Decimal::ZERO {
            return;
        }
        self.roll_over(Utc::now().date_naive());
        let micros = to_micros(cost);
        self.spent_today.fetch_add(micros, Ordering::Relaxed);
        self.spent_month.fetch_add(micros, Ordering::Relaxed);
    }

    /// What is left of today's allowance, never negative
    pub fn remaining_today(&self) -> Decimal {
        self.roll_over(Utc::now().date_naive());
        let spent = from_micros(self.spent_today.load(Ordering::Relaxed));
        let daily = (self.daily_limit - spent).max(Decimal::ZERO);
        let monthly = (self.monthly_limit - from_micros(self.spent_month.load(Ordering::Relaxed)))
            .max(Decimal::ZERO);
        daily.min(monthly)
    }

    pub fn summary(&self) -> BudgetSummary {
        self.roll_over(Utc::now().date_naive());
        BudgetSummary {
            daily_limit: self.daily_limit,
            monthly_limit: self.monthly_limit,
            spent_today: from_micros(self.spent_today.load(Ordering::Relaxed)),
            spent_month: from_micros(self.spent_month.load(Ordering::Relaxed)),
        }
    }
}

impl Default for BudgetManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_free_is_always_allowed() {
        let budget = BudgetManager::with_limits(0.0, 0.0);
        assert!(budget.can_afford(Decimal::ZERO));
        assert!(!budget.can_spend(0.01));
    }

    #[test]
    fn test_spend_accumulates_against_daily_limit() {
        let budget = BudgetManager::with_limits(1.0, 10.0);
        assert!(budget.can_spend(0.6));
        budget.record_spend(0.6);
        assert!(budget.can_spend(0.4));
        assert!(!budget.can_spend(0.41));
        assert_eq!(budget.summary().spent_today, dec!(0.6));
        assert_eq!(budget.remaining_today(), dec!(0.4));
    }

    #[test]
    fn test_small_costs_are_not_truncated() {
        let budget = BudgetManager::with_limits(1.0, 10.0);
        for _ in 0..1000 {
            budget.record_spend(0.001365);
        }
        assert_eq!(budget.summary().spent_today, dec!(1.365));
        assert!(!budget.can_spend(0.000001));
    }

    #[test]
    fn test_monthly_limit_also_applies() {
        let budget = BudgetManager::with_limits(5.0, 2.0);
        budget.record_spend(1.5);
        assert!(!budget.can_spend(1.0));
        assert_eq!(budget.remaining_today(), dec!(0.5));
    }

    #[test]
    fn test_clones_share_counters() {
        let budget = BudgetManager::new();
        let other = budget.clone();
        other.record_spend(0.25);
        assert_eq!(budget.summary().spent_today, dec!(0.25));
    }

    #[test]
    fn test_roll_over_resets_periods() {
        let budget = BudgetManager::with_limits(1.0, 10.0);
        let today = Utc::now().date_naive();
        budget.record_spend(0.5);

        let tomorrow = today.succ_opt().unwrap();
        budget.roll_over(tomorrow);
        let summary = budget.summary();
        assert_eq!(summary.spent_today, Decimal::ZERO);
        if tomorrow.month() == today.month() {
            assert_eq!(summary.spent_month, dec!(0.5));
        } else {
            assert_eq!(summary.spent_month, Decimal::ZERO);
        }
    }

    #[test]
    fn test_reports_reset_after_day_change_without_new_spend() {
        let budget = BudgetManager::with_limits(1.0, 10.0);
        budget.record_spend(0.5);
        let today = Utc::now().date_naive();
        *budget.period.lock().unwrap() = today.pred_opt().unwrap();

        assert_eq!(budget.remaining_today(), dec!(1.0));
        assert_eq!(budget.summary().spent_today, Decimal::ZERO);
    }

    #[test]
    fn test_negative_and_nan_spend_ignored() {
        let budget = BudgetManager::new();
        budget.record_spend(-1.0);
        budget.record_spend(f64::NAN);
        assert_eq!(budget.summary().spent_today, Decimal::ZERO);
    }
}
