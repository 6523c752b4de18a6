use crate::nutrition::ServingOption;

/// Outcome of the deterministic serving-selection rules. Ambiguity is never
/// resolved by numeric closeness; it surfaces to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum ServingSelection {
    Picked {
        serving: ServingOption,
        number_of_servings: f64,
    },
    Ambiguous {
        options: Vec<String>,
    },
}

const MAX_SERVING_OPTIONS: usize = 5;

pub fn normalize_unit(raw: &str) -> String {
    let lower = raw.trim().trim_end_matches('.').to_lowercase();
    match lower.as_str() {
        "г" | "гр" | "грамм" | "грамма" | "граммов" | "g" | "gram" | "grams" => "g".into(),
        "мл" | "ml" | "milliliter" | "milliliters" => "ml".into(),
        "шт" | "штука" | "штуки" | "pc" | "pcs" | "piece" | "pieces" => "piece".into(),
        other => other.into(),
    }
}

fn is_metric_weight(unit: &str) -> bool {
    matches!(normalize_unit(unit).as_str(), "g" | "ml")
}

fn unit_matches_serving(serving: &ServingOption, unit: &str) -> bool {
    let normalized = normalize_unit(unit);
    if let Some(metric_unit) = &serving.metric_unit {
        if normalize_unit(metric_unit) == normalized {
            return true;
        }
    }
    serving.description.to_lowercase().contains(&normalized)
}

fn metric_ratio(serving: &ServingOption, quantity: f64) -> Option<f64> {
    match serving.metric_amount {
        Some(amount) if amount > 0.0 => Some(quantity / amount),
        _ => None,
    }
}

/// Map the user's stated quantity/unit onto one of the serving options.
///
/// Rule order, first match wins:
/// 1. metric weight stated and a 100 g serving exists -> quantity / 100
/// 2. a serving's description or metric unit matches the stated unit
/// 3. exactly one serving option exists
/// 4. otherwise ask the user (up to 5 options)
pub fn select_serving(
    servings: &[ServingOption],
    quantity: Option<f64>,
    unit: Option<&str>,
) -> ServingSelection {
    // Rule 1: exact 100 g serving scaled by the stated weight.
    if let (Some(q), Some(u)) = (quantity, unit) {
        if is_metric_weight(u) {
            let hundred = servings.iter().find(|s| {
                s.metric_amount == Some(100.0)
                    && s.metric_unit
                        .as_deref()
                        .map(|mu| normalize_unit(mu) == normalize_unit(u))
                        .unwrap_or(false)
            });
            if let Some(serving) = hundred {
                return ServingSelection::Picked {
                    serving: serving.clone(),
                    number_of_servings: q / 100.0,
                };
            }
        }
    }

    // Rule 2: serving matching the stated unit.
    if let Some(u) = unit {
        if let Some(serving) = servings.iter().find(|s| unit_matches_serving(s, u)) {
            let number_of_servings = match quantity {
                Some(q) if is_metric_weight(u) => metric_ratio(serving, q).unwrap_or(q),
                Some(q) => q,
                None => 1.0,
            };
            return ServingSelection::Picked {
                serving: serving.clone(),
                number_of_servings,
            };
        }
    }

    // Rule 3: a single option is unambiguous.
    if servings.len() == 1 {
        let serving = servings[0].clone();
        let number_of_servings = match (quantity, unit) {
            (Some(q), Some(u)) if is_metric_weight(u) => {
                metric_ratio(&serving, q).unwrap_or(1.0)
            }
            (Some(q), _) => q,
            _ => 1.0,
        };
        return ServingSelection::Picked {
            serving,
            number_of_servings,
        };
    }

    // Rule 4: let the user choose.
    ServingSelection::Ambiguous {
        options: servings
            .iter()
            .take(MAX_SERVING_OPTIONS)
            .map(|s| s.description.clone())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::Nutrients;

    fn serving(id: &str, description: &str, amount: Option<f64>, unit: Option<&str>) -> ServingOption {
        ServingOption {
            serving_id: id.into(),
            description: description.into(),
            metric_amount: amount,
            metric_unit: unit.map(String::from),
            nutrients: Nutrients {
                calories: 100.0,
                protein: 3.0,
                carbohydrate: 20.0,
                fat: 1.0,
                ..Default::default()
            },
        }
    }

    #[test]
    fn rule1_hundred_gram_serving_scales_exactly() {
        let servings = vec![
            serving("1", "1 cup", Some(170.0), Some("g")),
            serving("2", "100 g", Some(100.0), Some("g")),
        ];
        match select_serving(&servings, Some(150.0), Some("г")) {
            ServingSelection::Picked {
                serving,
                number_of_servings,
            } => {
                assert_eq!(serving.serving_id, "2");
                assert_eq!(number_of_servings, 150.0 / 100.0);
            }
            other => panic!("expected pick, got {other:?}"),
        }
    }

    #[test]
    fn rule2_matches_unit_in_description() {
        let servings = vec![
            serving("1", "1 cup cooked", Some(195.0), Some("g")),
            serving("2", "1 slice", None, None),
        ];
        match select_serving(&servings, Some(2.0), Some("cup")) {
            ServingSelection::Picked {
                serving,
                number_of_servings,
            } => {
                assert_eq!(serving.serving_id, "1");
                assert_eq!(number_of_servings, 2.0);
            }
            other => panic!("expected pick, got {other:?}"),
        }
    }

    #[test]
    fn rule3_single_option_defaults_to_one_serving() {
        let servings = vec![serving("1", "1 large egg", Some(50.0), Some("g"))];
        match select_serving(&servings, None, None) {
            ServingSelection::Picked {
                number_of_servings, ..
            } => assert_eq!(number_of_servings, 1.0),
            other => panic!("expected pick, got {other:?}"),
        }
    }

    #[test]
    fn rule3_single_option_uses_metric_ratio_for_weight() {
        let servings = vec![serving("1", "1 large egg", Some(50.0), Some("g"))];
        match select_serving(&servings, Some(100.0), Some("g")) {
            ServingSelection::Picked {
                number_of_servings, ..
            } => assert_eq!(number_of_servings, 2.0),
            other => panic!("expected pick, got {other:?}"),
        }
    }

    #[test]
    fn two_eggs_with_piece_unit_and_single_serving_resolves() {
        // "ate 2 eggs": no serving mentions "piece", but only one option exists.
        let servings = vec![serving("1", "1 large egg (50g)", Some(50.0), Some("g"))];
        match select_serving(&servings, Some(2.0), Some("piece")) {
            ServingSelection::Picked {
                number_of_servings, ..
            } => assert_eq!(number_of_servings, 2.0),
            other => panic!("expected pick, got {other:?}"),
        }
    }

    #[test]
    fn rule4_multiple_unmatched_servings_are_ambiguous() {
        let servings = vec![
            serving("1", "1 large egg", Some(50.0), Some("g")),
            serving("2", "1 small egg", Some(38.0), Some("g")),
            serving("3", "1 cup chopped", Some(135.0), Some("g")),
        ];
        match select_serving(&servings, Some(2.0), Some("piece")) {
            ServingSelection::Ambiguous { options } => {
                assert_eq!(options.len(), 3);
                assert_eq!(options[0], "1 large egg");
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn options_are_capped_at_five() {
        let servings: Vec<_> = (0..8)
            .map(|i| serving(&i.to_string(), &format!("option {i}"), None, None))
            .collect();
        match select_serving(&servings, None, None) {
            ServingSelection::Ambiguous { options } => assert_eq!(options.len(), 5),
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn no_closest_match_guessing_without_unit() {
        // 149 g serving is numerically close to the stated 150 but must not win.
        let servings = vec![
            serving("1", "1 portion", Some(149.0), Some("g")),
            serving("2", "1 bowl", Some(300.0), Some("g")),
        ];
        match select_serving(&servings, Some(150.0), None) {
            ServingSelection::Ambiguous { .. } => {}
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }
}
