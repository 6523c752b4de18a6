//! Plain-text report rendering for diary replies.

use super::repo::FoodLogEntry;
use super::totals::{DailyTotals, PeriodTotals};

fn entry_line(index: usize, entry: &FoodLogEntry) -> String {
    let serving = match (&entry.serving_description, entry.number_of_servings) {
        (Some(desc), n) if n != 1.0 => format!("{n:.1}x {desc}"),
        (Some(desc), _) => desc.clone(),
        (None, n) if n != 1.0 => format!("{n:.1} порций"),
        (None, _) => "1 порция".into(),
    };
    format!(
        "{index}. {} ({serving}) - {:.0} ккал",
        entry.food_name, entry.calories
    )
}

fn totals_block(calories: f64, protein: f64, carbohydrates: f64, fat: f64) -> String {
    format!(
        "Итого:\nКалории: {calories:.0} ккал\nБелки: {protein:.0}г\nУглеводы: {carbohydrates:.0}г\nЖиры: {fat:.0}г"
    )
}

pub fn render_daily(title: &str, totals: &DailyTotals, entries: &[FoodLogEntry]) -> String {
    if totals.entry_count == 0 {
        return format!(
            "Дневник {title} пуст.\n\nЗапишите что вы съели, например: 'съел яблоко'"
        );
    }
    let mut lines = vec![format!("Отчёт {title}"), String::new()];
    for (i, entry) in entries
        .iter()
        .filter(|e| !e.deleted && e.consumed_at.date() == totals.date)
        .enumerate()
    {
        lines.push(entry_line(i + 1, entry));
    }
    lines.push(String::new());
    lines.push(totals_block(
        totals.calories,
        totals.protein,
        totals.carbohydrates,
        totals.fat,
    ));
    lines.join("\n")
}

pub fn render_period(title: &str, totals: &PeriodTotals) -> String {
    if totals.days.is_empty() {
        return format!(
            "Дневник {title} пуст.\n\nЗапишите что вы съели, например: 'съел яблоко'"
        );
    }
    let mut lines = vec![format!("Отчёт {title}"), String::new()];
    for day in &totals.days {
        lines.push(format!(
            "{}: {:.0} ккал ({} записей)",
            day.date, day.calories, day.entry_count
        ));
    }
    lines.push(String::new());
    lines.push(totals_block(
        totals.calories,
        totals.protein,
        totals.carbohydrates,
        totals.fat,
    ));
    lines.push(format!(
        "В среднем: {:.0} ккал/день",
        totals.average_calories_per_day
    ));
    lines.join("\n")
}
