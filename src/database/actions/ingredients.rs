use crate::{
    constants::{INGREDIENT_COUNT_PER_PAGE, MAX_INGREDIENT_NAME_LENGTH, MAX_UNIT_LENGTH},
    error::{Error, QueryError},
    loader::parse_ingredient_records,
    pagination::PageContext,
    schema::{Ingredient, IngredientRow},
};

use sqlx::{Pool, Postgres, QueryBuilder};

pub async fn list_ingredients(pool: &Pool<Postgres>) -> Result<Vec<Ingredient>, Error> {
    let rows: Vec<Ingredient> = sqlx::query_as("SELECT * FROM ingredients;")
        .fetch_all(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

pub async fn fetch_ingredients(
    offset: i64,
    search: String,
    pool: &Pool<Postgres>,
) -> Result<PageContext<IngredientRow>, Error> {
    let rows: Vec<IngredientRow> = sqlx::query_as(
        "SELECT i.*, COUNT(ii) OVER() AS count FROM ingredients i LEFT JOIN ingredients ii ON ii.id = i.id WHERE i.name ILIKE $1 ORDER BY name LIMIT $2 OFFSET $3",
    )
    .bind(search)
    .bind(INGREDIENT_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.get(0).map(|p| p.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, INGREDIENT_COUNT_PER_PAGE, offset);
    Ok(page)
}

pub async fn get_ingredient(
    id: i32,
    pool: &Pool<Postgres>,
) -> Result<Option<Ingredient>, Error> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn find_ingredient(
    name: &str,
    unit: &str,
    pool: &Pool<Postgres>,
) -> Result<Option<i32>, Error> {
    let row: Option<(i32,)> = sqlx::query_as(
        "SELECT id FROM ingredients WHERE LOWER(name) = LOWER($1) AND LOWER(unit) = LOWER($2)",
    )
    .bind(name)
    .bind(unit)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(row.map(|r| r.0))
}

/// Idempotent on the (name, unit) key; reports whether a row was created.
pub async fn create_ingredient(
    name: &str,
    unit: &str,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    if name.is_empty() || name.chars().count() > MAX_INGREDIENT_NAME_LENGTH {
        return Err(Error::validation("Invalid ingredient name"));
    }
    if unit.is_empty() || unit.chars().count() > MAX_UNIT_LENGTH {
        return Err(Error::validation("Invalid ingredient unit"));
    }

    let query = sqlx::query(
        "
        INSERT INTO ingredients (name, unit)
        VALUES ($1, $2)
        ON CONFLICT (name, unit) DO NOTHING;
    ",
    )
    .bind(name)
    .bind(unit)
    .execute(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(query.rows_affected() > 0)
}

/// Loads `name,unit` rows into the ingredient catalog in one bulk insert.
/// Malformed rows are skipped by the parser; already-known (name, unit)
/// pairs are left untouched. Returns the number of ingredients created.
pub async fn load_ingredients(input: &str, pool: &Pool<Postgres>) -> Result<u64, Error> {
    let records = parse_ingredient_records(input);
    if records.is_empty() {
        return Ok(0);
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO ingredients (name, unit) ");

    query_builder.push_values(records.iter(), |mut b, record| {
        b.push_bind(&record.name).push_bind(&record.unit);
    });
    query_builder.push(" ON CONFLICT (name, unit) DO NOTHING");

    let result = query_builder
        .build()
        .execute(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(result.rows_affected())
}
