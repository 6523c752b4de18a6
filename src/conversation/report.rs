use serde::{Deserialize, Serialize};
use time::{Date, Duration};
use tracing::warn;

use crate::llm::LlmGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodName {
    Today,
    Yesterday,
    Week,
    All,
    Days,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    pub name: PeriodName,
    pub days: i64,
}

impl ReportPeriod {
    pub fn today() -> Self {
        Self {
            name: PeriodName::Today,
            days: 1,
        }
    }

    pub fn title(&self) -> String {
        match self.name {
            PeriodName::Today => "за сегодня".into(),
            PeriodName::Yesterday => "вчера".into(),
            PeriodName::Week => "за неделю".into(),
            PeriodName::All | PeriodName::Days => {
                format!("за последние {} дней", self.days)
            }
        }
    }
}

/// Coerce the model's free-form period answer into the enumerated set.
/// Anything unrecognized becomes `today`; `all` always means the configured
/// cap regardless of what the model returned; `days` is clamped to the cap.
pub fn coerce_period(period: &str, days: i64, all_days_cap: i64) -> ReportPeriod {
    match period {
        "today" => ReportPeriod::today(),
        "yesterday" => ReportPeriod {
            name: PeriodName::Yesterday,
            days: 1,
        },
        "week" => ReportPeriod {
            name: PeriodName::Week,
            days: 7,
        },
        "all" => ReportPeriod {
            name: PeriodName::All,
            days: all_days_cap,
        },
        "days" => ReportPeriod {
            name: PeriodName::Days,
            days: days.clamp(1, all_days_cap),
        },
        _ => ReportPeriod::today(),
    }
}

/// Resolve a natural-language report request into a bounded period. Gateway
/// failure or nonsense output falls back to `today`.
pub async fn resolve_period(gateway: &LlmGateway, text: &str, all_days_cap: i64) -> ReportPeriod {
    match gateway.resolve_time_period(text).await {
        Ok(raw) => coerce_period(&raw.period, raw.days, all_days_cap),
        Err(e) => {
            warn!(error = %e, "period resolution failed, defaulting to today");
            ReportPeriod::today()
        }
    }
}

/// Concrete inclusive date range for the period, counting back from `today`.
pub fn date_range(period: ReportPeriod, today: Date) -> (Date, Date) {
    match period.name {
        PeriodName::Today => (today, today),
        PeriodName::Yesterday => {
            let yesterday = today - Duration::days(1);
            (yesterday, yesterday)
        }
        PeriodName::Week => (today - Duration::days(6), today),
        PeriodName::All | PeriodName::Days => {
            (today - Duration::days(period.days - 1), today)
        }
    }
}
