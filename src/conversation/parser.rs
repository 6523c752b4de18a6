use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::error::OrchestratorError;
use crate::llm::types::{RawCustomNutrition, RawNutritionValues, RawParsedItem};
use crate::llm::LlmGateway;
use crate::nutrition::CustomNutrition;

use super::state::{ItemStatus, ParsedFoodItem};

/// Foods whose nutrition differs substantially raw vs. cooked; logging one
/// without a cooking method needs a follow-up question.
const PREPARATION_AMBIGUOUS: &[&str] = &[
    "гречка",
    "рис",
    "макароны",
    "овсянка",
    "курица",
    "мясо",
    "buckwheat",
    "rice",
    "pasta",
    "oats",
    "oatmeal",
    "chicken",
    "meat",
];

pub fn is_preparation_ambiguous(name: &str) -> bool {
    let lower = name.to_lowercase();
    PREPARATION_AMBIGUOUS.iter().any(|w| lower.contains(w))
}

/// What a single item is still missing, checked in question order. An item
/// with user-stated nutrition only ever needs its weight.
pub fn missing_info(item: &ParsedFoodItem) -> Option<super::state::ClarificationKind> {
    use super::state::ClarificationKind;
    if item.quantity.is_none() {
        return Some(ClarificationKind::MissingQuantity);
    }
    if item.custom_nutrition.is_some() {
        return None;
    }
    if item.cooking_method.is_none() && is_preparation_ambiguous(&item.raw_name) {
        return Some(ClarificationKind::CookingMethod);
    }
    None
}

/// Re-flag an item after parsing or after an answer was applied.
pub fn refresh_status(item: &mut ParsedFoodItem) {
    if item.status == ItemStatus::Resolved || item.status == ItemStatus::Failed {
        return;
    }
    item.status = if missing_info(item).is_some() {
        ItemStatus::NeedsClarification
    } else {
        ItemStatus::Pending
    };
}

/// User-stated nutrition is usable only when calories were given; partial
/// macros alone go through the normal database lookup instead.
pub fn to_custom_nutrition(raw: RawCustomNutrition) -> Option<CustomNutrition> {
    let calories = raw.values.calories?;
    Some(CustomNutrition {
        calories,
        protein: raw.values.protein,
        fat: raw.values.fat,
        carbohydrate: raw.values.carbs,
        per_100g: raw.is_per_100g,
    })
}

async fn to_item(gateway: &LlmGateway, raw: RawParsedItem) -> ParsedFoodItem {
    let name_en = gateway.translate_to_english(&raw.name).await;
    let mut item = ParsedFoodItem {
        raw_name: raw.name,
        name_en: Some(name_en),
        quantity: raw.quantity,
        unit: raw.unit,
        cooking_method: raw.cooking_method,
        status: ItemStatus::Pending,
        custom_nutrition: raw.custom_nutrition.and_then(to_custom_nutrition),
        candidates: Vec::new(),
        candidate_page: 0,
        chosen: None,
        servings: Vec::new(),
        chosen_serving: None,
    };
    refresh_status(&mut item);
    item
}

/// Parse free text into food items. The gateway does the heavy lifting; when
/// it fails or finds nothing, a regex fallback keeps the simple cases
/// ("150г гречка", "2 яйца") working. Quantities are never invented.
pub async fn parse_food_text(
    gateway: &LlmGateway,
    text: &str,
) -> Result<Vec<ParsedFoodItem>, OrchestratorError> {
    let raw_items = match gateway.parse_food_text(text).await {
        Ok(items) if !items.is_empty() => items,
        Ok(_) => {
            info!("model returned no items, using fallback parser");
            fallback_parse(text)
        }
        Err(e) => {
            warn!(error = %e, "model parse failed, using fallback parser");
            fallback_parse(text)
        }
    };

    if raw_items.is_empty() {
        return Err(OrchestratorError::ParseFailure);
    }

    let mut items = Vec::with_capacity(raw_items.len());
    for raw in raw_items {
        items.push(to_item(gateway, raw).await);
    }
    Ok(items)
}

lazy_static! {
    static ref LEADING_VERB_RE: Regex =
        Regex::new(r"(?i)^(съел[аи]?|ел[аи]?|выпил[аи]?|ate|had|drank)\s+").unwrap();
    static ref QUANTITY_RE: Regex =
        Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(г\.?|гр\.?|грамм(?:а|ов)?|g|grams?|мл|ml|шт\.?|pieces?)?").unwrap();
    // "КБЖУ 150/50/50/50": calories, protein, fat, carbs.
    static ref KBJU_RE: Regex = Regex::new(
        r"(?i)кбжу\s*(\d+(?:[.,]\d+)?)\s*/\s*(\d+(?:[.,]\d+)?)\s*/\s*(\d+(?:[.,]\d+)?)\s*/\s*(\d+(?:[.,]\d+)?)"
    ).unwrap();
    // "БЖУ 50/50/50": protein, fat, carbs.
    static ref BJU_RE: Regex = Regex::new(
        r"(?i)бжу\s*(\d+(?:[.,]\d+)?)\s*/\s*(\d+(?:[.,]\d+)?)\s*/\s*(\d+(?:[.,]\d+)?)"
    ).unwrap();
    static ref CALORIES_RE: Regex = Regex::new(
        r"(?i)калори[йия]\w*\s*:?\s*(\d+(?:[.,]\d+)?)|(\d+(?:[.,]\d+)?)\s*ккал"
    ).unwrap();
    static ref PER_100G_RE: Regex = Regex::new(r"(?i)на\s*100\s*(?:г|грамм\w*|g)").unwrap();
}

/// "съел яблоко" while a question is pending reads as a new statement, not
/// an answer.
pub fn starts_with_food_verb(text: &str) -> bool {
    LEADING_VERB_RE.is_match(text.trim())
}

fn normalize_fallback_unit(raw: &str) -> String {
    let lower = raw.trim_end_matches('.').to_lowercase();
    match lower.as_str() {
        "г" | "гр" | "грамм" | "грамма" | "граммов" | "g" | "gram" | "grams" => "g".into(),
        "мл" | "ml" => "ml".into(),
        "шт" | "piece" | "pieces" => "piece".into(),
        other => other.into(),
    }
}

/// Pull user-stated nutrition ("БЖУ 50/50/50 калорий 150", "КБЖУ 150/50/50/50")
/// out of the text, returning the cleaned remainder for name parsing.
fn extract_custom_nutrition(text: &str) -> (String, Option<RawCustomNutrition>) {
    let num = |s: &str| s.replace(',', ".").parse::<f64>().ok();

    if let Some(caps) = KBJU_RE.captures(text) {
        let values = RawNutritionValues {
            calories: num(&caps[1]),
            protein: num(&caps[2]),
            fat: num(&caps[3]),
            carbs: num(&caps[4]),
        };
        let cleaned = KBJU_RE.replace(text, "");
        let is_per_100g = PER_100G_RE.is_match(&cleaned);
        let cleaned = PER_100G_RE.replace(&cleaned, "").trim().to_string();
        return (cleaned, Some(RawCustomNutrition { values, is_per_100g }));
    }

    if let Some(caps) = BJU_RE.captures(text) {
        let mut values = RawNutritionValues {
            calories: None,
            protein: num(&caps[1]),
            fat: num(&caps[2]),
            carbs: num(&caps[3]),
        };
        let mut cleaned = BJU_RE.replace(text, "").into_owned();
        if let Some(caps) = CALORIES_RE.captures(&cleaned) {
            values.calories = caps
                .get(1)
                .or_else(|| caps.get(2))
                .and_then(|m| num(m.as_str()));
            cleaned = CALORIES_RE.replace(&cleaned, "").into_owned();
        }
        let is_per_100g = PER_100G_RE.is_match(&cleaned);
        let cleaned = PER_100G_RE.replace(&cleaned, "").trim().to_string();
        return (cleaned, Some(RawCustomNutrition { values, is_per_100g }));
    }

    (text.to_string(), None)
}

/// Regex fallback when no model is reachable: pull user-stated nutrition off
/// the whole message first, then split on separators and take the leading
/// quantity/unit off each chunk, keeping the rest as the food name.
pub fn fallback_parse(text: &str) -> Vec<RawParsedItem> {
    let (text, custom) = extract_custom_nutrition(text.trim());
    let stripped = LEADING_VERB_RE.replace(text.trim(), "");
    let mut items: Vec<RawParsedItem> = stripped
        .split([',', ';'])
        .flat_map(|chunk| chunk.split(" и "))
        .filter_map(|chunk| {
            let chunk = chunk.trim();
            if chunk.is_empty() {
                return None;
            }

            let mut quantity = None;
            let mut unit = None;
            let mut name = chunk.to_string();
            if let Some(caps) = QUANTITY_RE.captures(chunk) {
                let matched = caps.get(0).unwrap();
                quantity = caps[1].replace(',', ".").parse::<f64>().ok();
                unit = caps
                    .get(2)
                    .map(|u| normalize_fallback_unit(u.as_str()))
                    .or_else(|| quantity.map(|_| "piece".into()));
                name = format!("{}{}", &chunk[..matched.start()], &chunk[matched.end()..]);
            }

            let name = name.trim().trim_matches(['.', '!']).to_string();
            if name.is_empty() {
                return None;
            }
            Some(RawParsedItem {
                name,
                quantity,
                unit: if quantity.is_some() { unit } else { None },
                cooking_method: None,
                custom_nutrition: None,
            })
        })
        .collect();

    // Stated nutrition covers a single food; attach it to the first item.
    if let Some(custom) = custom {
        if let Some(first) = items.first_mut() {
            first.custom_nutrition = Some(custom);
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_extracts_quantity_and_name() {
        let items = fallback_parse("съел 150г гречки");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "гречки");
        assert_eq!(items[0].quantity, Some(150.0));
        assert_eq!(items[0].unit.as_deref(), Some("g"));
    }

    #[test]
    fn fallback_splits_multiple_foods() {
        let items = fallback_parse("2 яйца и яблоко");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, Some(2.0));
        assert_eq!(items[1].name, "яблоко");
        assert_eq!(items[1].quantity, None);
    }

    #[test]
    fn fallback_handles_english_input() {
        let items = fallback_parse("ate 100g rice, apple");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, Some(100.0));
        assert_eq!(items[0].unit.as_deref(), Some("g"));
        assert_eq!(items[1].name, "apple");
    }

    #[test]
    fn fallback_returns_nothing_for_empty_text() {
        assert!(fallback_parse("   ").is_empty());
    }

    #[test]
    fn fallback_extracts_stated_nutrition_for_the_whole_portion() {
        let items = fallback_parse("съел 150г салата БЖУ 50/50/50 калорий 150");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "салата");
        assert_eq!(items[0].quantity, Some(150.0));
        let custom = items[0].custom_nutrition.as_ref().expect("custom nutrition");
        assert_eq!(custom.values.calories, Some(150.0));
        assert_eq!(custom.values.protein, Some(50.0));
        assert_eq!(custom.values.fat, Some(50.0));
        assert_eq!(custom.values.carbs, Some(50.0));
        assert!(!custom.is_per_100g);
    }

    #[test]
    fn fallback_extracts_per_100g_nutrition_without_a_weight() {
        let items = fallback_parse("салат БЖУ 30/20/10 калорий 250 на 100г");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "салат");
        assert_eq!(items[0].quantity, None);
        let custom = items[0].custom_nutrition.as_ref().expect("custom nutrition");
        assert_eq!(custom.values.calories, Some(250.0));
        assert_eq!(custom.values.protein, Some(30.0));
        assert!(custom.is_per_100g);
    }

    #[test]
    fn fallback_reads_kbju_shorthand() {
        let items = fallback_parse("скрэмбл КБЖУ 280/14/23/6");
        let custom = items[0].custom_nutrition.as_ref().expect("custom nutrition");
        assert_eq!(custom.values.calories, Some(280.0));
        assert_eq!(custom.values.protein, Some(14.0));
        assert_eq!(custom.values.fat, Some(23.0));
        assert_eq!(custom.values.carbs, Some(6.0));
    }

    #[test]
    fn stated_macros_without_calories_are_not_usable() {
        let items = fallback_parse("100г салат БЖУ 10/5/20");
        let custom = items[0].custom_nutrition.clone().expect("custom nutrition");
        assert!(to_custom_nutrition(custom).is_none());
    }

    #[test]
    fn buckwheat_without_cooking_method_is_ambiguous() {
        assert!(is_preparation_ambiguous("гречка"));
        assert!(is_preparation_ambiguous("Cooked Rice"));
        assert!(!is_preparation_ambiguous("яблоко"));
    }

    #[test]
    fn refresh_status_flags_missing_quantity_first() {
        use crate::conversation::state::ClarificationKind;
        let mut item = ParsedFoodItem {
            raw_name: "гречка".into(),
            name_en: Some("buckwheat".into()),
            quantity: None,
            unit: None,
            cooking_method: None,
            status: ItemStatus::Pending,
            custom_nutrition: None,
            candidates: Vec::new(),
            candidate_page: 0,
            chosen: None,
            servings: Vec::new(),
            chosen_serving: None,
        };
        refresh_status(&mut item);
        assert_eq!(item.status, ItemStatus::NeedsClarification);
        assert_eq!(missing_info(&item), Some(ClarificationKind::MissingQuantity));

        item.quantity = Some(150.0);
        refresh_status(&mut item);
        assert_eq!(missing_info(&item), Some(ClarificationKind::CookingMethod));

        item.cooking_method = Some("варёная".into());
        refresh_status(&mut item);
        assert_eq!(item.status, ItemStatus::Pending);
    }
}
