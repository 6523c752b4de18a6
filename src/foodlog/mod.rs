pub mod repo;
pub mod report;
pub mod totals;

pub use repo::{FoodLogEntry, FoodLogStore, NewFoodLogEntry, PgFoodLogStore};
pub use totals::{DailyTotals, PeriodTotals};
