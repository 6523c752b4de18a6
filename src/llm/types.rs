use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    FoodEntry,
    ViewReport,
    Question,
    Chat,
}

impl Intent {
    pub fn from_wire(s: &str) -> Option<Intent> {
        match s {
            "food_entry" => Some(Intent::FoodEntry),
            "view_report" => Some(Intent::ViewReport),
            "question" => Some(Intent::Question),
            "chat" => Some(Intent::Chat),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IntentResult {
    pub intent: Intent,
    pub confidence: f64,
}

/// One food item as the model returned it, before flagging and translation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawParsedItem {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub cooking_method: Option<String>,
    #[serde(default)]
    pub custom_nutrition: Option<RawCustomNutrition>,
}

/// Nutrition values read verbatim from the model's output, wire-format field
/// names ("carbs") included.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNutritionValues {
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
}

/// User-stated nutrition as extracted by the parse prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCustomNutrition {
    #[serde(flatten)]
    pub values: RawNutritionValues,
    #[serde(default)]
    pub is_per_100g: bool,
}

/// What a vision-capable model read off a nutrition-label photo.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLabel {
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub nutrition_per_100g: RawNutritionValues,
}

/// Outcome of looking at a photo: either a meal to parse as text, or a
/// nutrition label whose printed values are used directly.
#[derive(Debug, Clone)]
pub enum ImageExtraction {
    Meal(String),
    Label(RawLabel),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawParseResult {
    #[serde(default)]
    pub items: Vec<RawParsedItem>,
}

/// Unvalidated period answer from the model; the report resolver coerces it
/// into the enumerated set.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPeriod {
    pub period: String,
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 {
    1
}
