use serde::Serialize;
use time::{Date, Duration};

use super::repo::FoodLogEntry;

/// Nutrition totals for one calendar day. Derived only, never persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyTotals {
    pub date: Date,
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub sodium: f64,
    pub entry_count: usize,
}

/// Totals over a date range with per-day subtotals. The average is taken
/// across days that have at least one entry.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodTotals {
    pub start: Date,
    pub end: Date,
    pub days: Vec<DailyTotals>,
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub sodium: f64,
    pub entry_count: usize,
    pub average_calories_per_day: f64,
}

pub fn daily_totals(date: Date, entries: &[FoodLogEntry]) -> DailyTotals {
    let mut totals = DailyTotals {
        date,
        calories: 0.0,
        protein: 0.0,
        carbohydrates: 0.0,
        fat: 0.0,
        fiber: 0.0,
        sugar: 0.0,
        sodium: 0.0,
        entry_count: 0,
    };
    for entry in entries {
        if entry.deleted || entry.consumed_at.date() != date {
            continue;
        }
        totals.calories += entry.calories;
        totals.protein += entry.protein.unwrap_or(0.0);
        totals.carbohydrates += entry.carbohydrates.unwrap_or(0.0);
        totals.fat += entry.fat.unwrap_or(0.0);
        totals.fiber += entry.fiber.unwrap_or(0.0);
        totals.sugar += entry.sugar.unwrap_or(0.0);
        totals.sodium += entry.sodium.unwrap_or(0.0);
        totals.entry_count += 1;
    }
    totals
}

pub fn period_totals(start: Date, end: Date, entries: &[FoodLogEntry]) -> PeriodTotals {
    let mut days = Vec::new();
    let mut date = start;
    while date <= end {
        let day = daily_totals(date, entries);
        if day.entry_count > 0 {
            days.push(day);
        }
        date += Duration::days(1);
    }

    let calories: f64 = days.iter().map(|d| d.calories).sum();
    let protein: f64 = days.iter().map(|d| d.protein).sum();
    let carbohydrates: f64 = days.iter().map(|d| d.carbohydrates).sum();
    let fat: f64 = days.iter().map(|d| d.fat).sum();
    let fiber: f64 = days.iter().map(|d| d.fiber).sum();
    let sugar: f64 = days.iter().map(|d| d.sugar).sum();
    let sodium: f64 = days.iter().map(|d| d.sodium).sum();
    let entry_count: usize = days.iter().map(|d| d.entry_count).sum();
    let average_calories_per_day = if days.is_empty() {
        0.0
    } else {
        calories / days.len() as f64
    };

    PeriodTotals {
        start,
        end,
        days,
        calories,
        protein,
        carbohydrates,
        fat,
        fiber,
        sugar,
        sodium,
        entry_count,
        average_calories_per_day,
    }
}
