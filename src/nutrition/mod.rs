pub mod fatsecret;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One match from the nutrition database for a food name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodCandidate {
    pub food_id: String,
    pub food_name: String,
    pub brand_name: Option<String>,
}

impl FoodCandidate {
    /// Display name as shown to the user in selection options.
    pub fn display_name(&self) -> String {
        match self.brand_name.as_deref() {
            Some(brand) if !brand.eq_ignore_ascii_case("generic") => {
                format!("{} ({})", self.food_name, brand)
            }
            _ => self.food_name.clone(),
        }
    }
}

/// Per-serving nutrient values, exactly as the database returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    pub calories: f64,
    pub protein: f64,
    pub carbohydrate: f64,
    pub fat: f64,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    pub sodium: Option<f64>,
}

impl Nutrients {
    pub fn scaled(&self, number_of_servings: f64) -> Nutrients {
        Nutrients {
            calories: self.calories * number_of_servings,
            protein: self.protein * number_of_servings,
            carbohydrate: self.carbohydrate * number_of_servings,
            fat: self.fat * number_of_servings,
            fiber: self.fiber.map(|v| v * number_of_servings),
            sugar: self.sugar.map(|v| v * number_of_servings),
            sodium: self.sodium.map(|v| v * number_of_servings),
        }
    }
}

/// Nutrition values the user stated directly ("БЖУ 50/50/50 калорий 150")
/// or read off a package label. `per_100g` values scale by the eaten weight;
/// otherwise they cover the whole portion as stated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomNutrition {
    pub calories: f64,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub carbohydrate: Option<f64>,
    pub per_100g: bool,
}

impl CustomNutrition {
    /// Nutrient snapshot for `quantity_g` grams of this food. Micro-nutrients
    /// are left empty: the user never stated them.
    pub fn nutrients_for(&self, quantity_g: f64) -> Nutrients {
        let factor = if self.per_100g { quantity_g / 100.0 } else { 1.0 };
        Nutrients {
            calories: self.calories * factor,
            protein: self.protein.unwrap_or(0.0) * factor,
            carbohydrate: self.carbohydrate.unwrap_or(0.0) * factor,
            fat: self.fat.unwrap_or(0.0) * factor,
            fiber: None,
            sugar: None,
            sodium: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServingOption {
    pub serving_id: String,
    pub description: String,
    pub metric_amount: Option<f64>,
    pub metric_unit: Option<String>,
    pub nutrients: Nutrients,
}

/// External nutrition database, name-based search plus serving lookup.
/// Failures degrade to empty lists; the orchestrator turns those into a
/// "not found" reply rather than an error.
#[async_trait]
pub trait NutritionLookup: Send + Sync {
    async fn search(&self, name: &str, max_results: u32) -> Vec<FoodCandidate>;

    async fn get_servings(&self, food_id: &str) -> Vec<ServingOption>;
}
