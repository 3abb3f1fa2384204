use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::Error;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Moderator,
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecipeOrder {
    Newest,
    Oldest,
    Alphabetical,
    CookingTimeAsc,
    CookingTimeDesc,
}

impl TryFrom<Value> for RecipeOrder {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value {
                "newest" => Ok(Self::Newest),
                "oldest" => Ok(Self::Oldest),
                "alphabetical" => Ok(Self::Alphabetical),
                "cooking_time_asc" => Ok(Self::CookingTimeAsc),
                "cooking_time_desc" => Ok(Self::CookingTimeDesc),
                _ => Err(Error::validation("Invalid variant")),
            },
            None => Err(Error::validation("Failed to parse value as string")),
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Ingredient {
    pub id: i32,
    pub name: String,
    pub unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct IngredientRow {
    pub id: i32,
    pub name: String,
    pub unit: String,

    pub count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Tag {
    pub id: i32,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: i32,
    pub author_id: i32,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub favorite_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeRow {
    pub id: i32,
    pub author_id: i32,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub favorite_count: i32,
    pub created_at: DateTime<Utc>,

    pub count: i64,
}

/// One (ingredient, amount) pairing of a recipe, joined with the
/// catalog name and unit.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeLineItem {
    pub recipe_id: i32,
    pub ingredient_id: i32,
    pub name: String,
    pub unit: String,
    pub amount: f64,
}

/// One line item of a recipe currently queued in a user's shopping cart.
/// Several rows may reference the same ingredient; aggregation happens in
/// [`crate::shopping::aggregate_shopping_list`].
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct ShoppingCartLine {
    pub ingredient_id: i32,
    pub name: String,
    pub unit: String,
    pub amount: f64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct SubscriptionRow {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,

    pub recipe_count: i64,

    pub count: i64,
}

/// Full detail surface of a single recipe, assembled from several queries.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetails {
    pub recipe: Recipe,
    pub author: User,
    pub tags: Vec<Tag>,
    pub line_items: Vec<RecipeLineItem>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}
