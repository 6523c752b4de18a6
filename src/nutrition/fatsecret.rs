use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use super::{FoodCandidate, NutritionLookup, Nutrients, ServingOption};

/// FatSecret-style REST client. Token acquisition is out of scope; an access
/// token is injected via configuration.
pub struct FatSecretClient {
    client: reqwest::Client,
    api_url: String,
    access_token: String,
}

impl FatSecretClient {
    pub fn new(api_url: &str, access_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.to_string(),
            access_token: access_token.to_string(),
        }
    }

    async fn call(&self, params: &[(&str, &str)]) -> anyhow::Result<Value> {
        let mut form = params.to_vec();
        form.push(("format", "json"));
        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.access_token)
            .form(&form)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl NutritionLookup for FatSecretClient {
    async fn search(&self, name: &str, max_results: u32) -> Vec<FoodCandidate> {
        let max = max_results.to_string();
        let params = [
            ("method", "foods.search"),
            ("search_expression", name),
            ("max_results", max.as_str()),
        ];
        match self.call(&params).await {
            Ok(body) => parse_candidates(&body),
            Err(e) => {
                warn!(error = %e, name, "food search failed");
                Vec::new()
            }
        }
    }

    async fn get_servings(&self, food_id: &str) -> Vec<ServingOption> {
        let params = [("method", "food.get.v2"), ("food_id", food_id)];
        match self.call(&params).await {
            Ok(body) => parse_servings(&body),
            Err(e) => {
                warn!(error = %e, food_id, "servings lookup failed");
                Vec::new()
            }
        }
    }
}

/// FatSecret collapses single-element arrays into bare objects.
fn as_array(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(String::from)
}

/// Numeric fields arrive as strings ("123.45").
fn num_field(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn parse_candidates(body: &Value) -> Vec<FoodCandidate> {
    as_array(&body["foods"]["food"])
        .into_iter()
        .filter_map(|food| {
            Some(FoodCandidate {
                food_id: str_field(food, "food_id")?,
                food_name: str_field(food, "food_name")?,
                brand_name: str_field(food, "brand_name"),
            })
        })
        .collect()
}

fn parse_servings(body: &Value) -> Vec<ServingOption> {
    as_array(&body["food"]["servings"]["serving"])
        .into_iter()
        .filter_map(|serving| {
            Some(ServingOption {
                serving_id: str_field(serving, "serving_id")?,
                description: str_field(serving, "serving_description")?,
                metric_amount: num_field(serving, "metric_serving_amount"),
                metric_unit: str_field(serving, "metric_serving_unit"),
                nutrients: Nutrients {
                    calories: num_field(serving, "calories")?,
                    protein: num_field(serving, "protein").unwrap_or(0.0),
                    carbohydrate: num_field(serving, "carbohydrate").unwrap_or(0.0),
                    fat: num_field(serving, "fat").unwrap_or(0.0),
                    fiber: num_field(serving, "fiber"),
                    sugar: num_field(serving, "sugar"),
                    sodium: num_field(serving, "sodium"),
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_candidate_list() {
        let body = json!({
            "foods": {"food": [
                {"food_id": "1", "food_name": "Egg", "brand_name": "Generic"},
                {"food_id": "2", "food_name": "Egg White"},
            ]}
        });
        let candidates = parse_candidates(&body);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].food_id, "1");
        assert_eq!(candidates[1].brand_name, None);
    }

    #[test]
    fn single_result_object_is_treated_as_list() {
        let body = json!({
            "foods": {"food": {"food_id": "7", "food_name": "Buckwheat"}}
        });
        let candidates = parse_candidates(&body);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].food_name, "Buckwheat");
    }

    #[test]
    fn parses_servings_with_string_numbers() {
        let body = json!({
            "food": {"servings": {"serving": [{
                "serving_id": "100",
                "serving_description": "100 g",
                "metric_serving_amount": "100.000",
                "metric_serving_unit": "g",
                "calories": "343",
                "protein": "13.25",
                "carbohydrate": "71.50",
                "fat": "3.40",
                "fiber": "10.0"
            }]}}
        });
        let servings = parse_servings(&body);
        assert_eq!(servings.len(), 1);
        assert_eq!(servings[0].metric_amount, Some(100.0));
        assert_eq!(servings[0].nutrients.calories, 343.0);
        assert_eq!(servings[0].nutrients.fiber, Some(10.0));
        assert_eq!(servings[0].nutrients.sodium, None);
    }

    #[test]
    fn serving_without_calories_is_skipped() {
        let body = json!({
            "food": {"servings": {"serving": [{
                "serving_id": "1",
                "serving_description": "1 cup"
            }]}}
        });
        assert!(parse_servings(&body).is_empty());
    }
}
