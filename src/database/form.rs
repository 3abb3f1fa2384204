use std::{collections::HashMap, str::FromStr};

use serde_json::Value;

use super::error::Error;
use crate::constants::{MAX_RECIPE_NAME_LENGTH, MIN_COOKING_TIME};

pub type FormData = HashMap<String, Value>;

pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn get_value<T>(&self, key: &str) -> Result<T, Error>
    where
        T: TryFrom<Value>,
    {
        match self.inner.get(key) {
            Some(value) => value
                .to_owned()
                .try_into()
                .map_err(|_e| Error::validation("Invalid type conversion")),
            None => Err(Error::validation("Invalid key")),
        }
    }

    pub fn get_number<T>(&self, key: &str) -> Result<T, Error>
    where
        T: FromStr,
    {
        match self.inner.get(key) {
            Some(value) => {
                let raw = match value {
                    Value::Number(n) => n.to_string(),
                    Value::String(s) => s.to_owned(),
                    _ => return Err(Error::validation("Failed to parse value as number")),
                };
                raw.parse()
                    .map_err(|_e| Error::validation("Invalid type conversion"))
            }
            None => Err(Error::validation("Invalid key")),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<String, Error> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(v.to_string()),
                None => Err(Error::validation("Invalid key")),
            },
            None => Err(Error::validation("Invalid key")),
        }
    }

    pub fn get_str_opt(&self, key: &str) -> Option<String> {
        self.inner
            .get(key)
            .and_then(|value| value.as_str())
            .map(|v| v.to_string())
    }

    pub fn get_list<T>(&self, key: &str) -> Result<Vec<T>, Error>
    where
        T: TryFrom<Value, Error = Error>,
    {
        match self.inner.get(key) {
            Some(Value::Array(items)) => items.iter().map(|v| T::try_from(v.to_owned())).collect(),
            Some(_) => Err(Error::validation("Failed to parse value as list")),
            None => Err(Error::validation("Invalid key")),
        }
    }

    pub fn get_id_list(&self, key: &str) -> Result<Vec<i32>, Error> {
        match self.inner.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| match v.as_i64() {
                    Some(id) => Ok(id as i32),
                    None => Err(Error::validation("Failed to parse value as id")),
                })
                .collect(),
            Some(_) => Err(Error::validation("Failed to parse value as list")),
            None => Err(Error::validation("Invalid key")),
        }
    }
}

/// One `{id, amount}` entry of a recipe write payload.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientAmount {
    pub ingredient_id: i32,
    pub amount: f64,
}

impl TryFrom<Value> for IngredientAmount {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let ingredient_id = match value.get("id").and_then(|v| v.as_i64()) {
            Some(id) => id as i32,
            None => return Err(Error::validation("Failed to parse ingredient id")),
        };
        let amount = match value.get("amount").and_then(|v| v.as_f64()) {
            Some(amount) => amount,
            None => return Err(Error::validation("Failed to parse ingredient amount")),
        };

        Ok(Self {
            ingredient_id,
            amount,
        })
    }
}

/// Validated recipe write payload. The same form drives create and update;
/// on update the ingredient and tag sets replace the stored ones wholesale.
#[derive(Debug, Clone)]
pub struct RecipeForm {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub tags: Vec<i32>,
    pub ingredients: Vec<IngredientAmount>,
}

impl RecipeForm {
    pub fn from_data(data: FormData) -> Result<Self, Error> {
        let form = Form::from_data(data);

        let name = form.get_str("name")?;
        if name.is_empty() {
            return Err(Error::validation("Recipe name cannot be empty"));
        }
        if name.chars().count() > MAX_RECIPE_NAME_LENGTH {
            return Err(Error::validation("Recipe name is too long"));
        }

        let text = form.get_str("text")?;

        let cooking_time: i32 = form.get_number("cooking_time")?;
        if cooking_time < MIN_COOKING_TIME {
            return Err(Error::validation(
                "Cooking time must be greater than zero",
            ));
        }

        let tags = form.get_id_list("tags")?;
        let ingredients: Vec<IngredientAmount> = form.get_list("ingredients")?;
        let image = form.get_str_opt("image");

        Ok(Self {
            name,
            text,
            cooking_time,
            image,
            tags,
            ingredients,
        })
    }
}

/// Collapses repeated ingredient references by summing their amounts.
///
/// The output carries exactly one entry per distinct ingredient id; its
/// order is unspecified. The whole payload is rejected if it is empty or
/// if any single amount is not positive.
pub fn merge_ingredient_amounts(
    lines: &[IngredientAmount],
) -> Result<Vec<IngredientAmount>, Error> {
    if lines.is_empty() {
        return Err(Error::validation("Recipe requires at least one ingredient"));
    }

    let mut amounts: HashMap<i32, f64> = HashMap::new();
    for line in lines {
        if line.amount <= 0.0 {
            return Err(Error::validation(
                "Ingredient amount must be greater than zero",
            ));
        }

        match amounts.get_mut(&line.ingredient_id) {
            Some(amount) => *amount += line.amount,
            None => {
                amounts.insert(line.ingredient_id, line.amount);
            }
        }
    }

    Ok(amounts
        .into_iter()
        .map(|(ingredient_id, amount)| IngredientAmount {
            ingredient_id,
            amount,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;
    use serde_json::json;

    fn amounts_by_id(lines: Vec<IngredientAmount>) -> HashMap<i32, f64> {
        lines
            .into_iter()
            .map(|line| (line.ingredient_id, line.amount))
            .collect()
    }

    #[test]
    fn merge_sums_repeated_ingredients() {
        let lines = vec![
            IngredientAmount {
                ingredient_id: 1,
                amount: 2.0,
            },
            IngredientAmount {
                ingredient_id: 2,
                amount: 1.0,
            },
            IngredientAmount {
                ingredient_id: 1,
                amount: 3.0,
            },
        ];

        let merged = merge_ingredient_amounts(&lines).unwrap();
        assert_eq!(
            amounts_by_id(merged),
            hashmap! { 1 => 5.0, 2 => 1.0 }
        );
    }

    #[test]
    fn merge_keeps_distinct_ingredients() {
        let lines = vec![
            IngredientAmount {
                ingredient_id: 7,
                amount: 0.5,
            },
            IngredientAmount {
                ingredient_id: 9,
                amount: 250.0,
            },
        ];

        let merged = merge_ingredient_amounts(&lines).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(
            amounts_by_id(merged),
            hashmap! { 7 => 0.5, 9 => 250.0 }
        );
    }

    #[test]
    fn merge_rejects_empty_payload() {
        assert!(matches!(
            merge_ingredient_amounts(&[]),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn merge_rejects_non_positive_amounts() {
        let zero = vec![IngredientAmount {
            ingredient_id: 1,
            amount: 0.0,
        }];
        assert!(matches!(
            merge_ingredient_amounts(&zero),
            Err(Error::Validation(_))
        ));

        let negative = vec![
            IngredientAmount {
                ingredient_id: 1,
                amount: 2.0,
            },
            IngredientAmount {
                ingredient_id: 2,
                amount: -1.0,
            },
        ];
        assert!(matches!(
            merge_ingredient_amounts(&negative),
            Err(Error::Validation(_))
        ));
    }

    fn recipe_data() -> FormData {
        serde_json::from_value(json!({
            "name": "Pancakes",
            "text": "Mix and fry.",
            "cooking_time": 25,
            "image": "recipes/pancakes.png",
            "tags": [1, 3],
            "ingredients": [
                { "id": 1, "amount": 200 },
                { "id": 2, "amount": 2 }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn recipe_form_parses_payload() {
        let form = RecipeForm::from_data(recipe_data()).unwrap();

        assert_eq!(form.name, "Pancakes");
        assert_eq!(form.cooking_time, 25);
        assert_eq!(form.tags, vec![1, 3]);
        assert_eq!(form.image.as_deref(), Some("recipes/pancakes.png"));
        assert_eq!(
            form.ingredients,
            vec![
                IngredientAmount {
                    ingredient_id: 1,
                    amount: 200.0
                },
                IngredientAmount {
                    ingredient_id: 2,
                    amount: 2.0
                },
            ]
        );
    }

    #[test]
    fn recipe_form_rejects_zero_cooking_time() {
        let mut data = recipe_data();
        data.insert("cooking_time".to_string(), json!(0));

        assert!(matches!(
            RecipeForm::from_data(data),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn recipe_form_rejects_missing_name() {
        let mut data = recipe_data();
        data.remove("name");

        assert!(matches!(
            RecipeForm::from_data(data),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn recipe_form_allows_missing_image() {
        let mut data = recipe_data();
        data.remove("image");

        let form = RecipeForm::from_data(data).unwrap();
        assert_eq!(form.image, None);
    }

    #[test]
    fn ingredient_amount_rejects_malformed_entries() {
        assert!(IngredientAmount::try_from(json!({ "id": 1 })).is_err());
        assert!(IngredientAmount::try_from(json!({ "amount": 2 })).is_err());
        assert!(IngredientAmount::try_from(json!("1,2")).is_err());
    }
}
