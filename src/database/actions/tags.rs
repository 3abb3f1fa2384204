use crate::{
    constants::MAX_TAG_NAME_LENGTH,
    error::{Error, QueryError},
    loader::{is_hex_color, parse_tag_records},
    schema::Tag,
};

use sqlx::{Pool, Postgres};

pub async fn create_tag(
    name: &str,
    color: &str,
    slug: &str,
    pool: &Pool<Postgres>,
) -> Result<i32, Error> {
    if name.is_empty() || name.chars().count() > MAX_TAG_NAME_LENGTH {
        return Err(Error::validation("Invalid tag name"));
    }
    if !is_hex_color(color) {
        return Err(Error::validation("Tag color must be a hex color code"));
    }

    let id: Option<(i32,)> = sqlx::query_as(
        "INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING RETURNING id",
    )
    .bind(name)
    .bind(color)
    .bind(slug)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    match id {
        Some(id) => Ok(id.0),
        None => Err(Error::conflict(
            "Tag with this name, color or slug already exists",
        )),
    }
}

pub async fn get_tag(id: i32, pool: &Pool<Postgres>) -> Result<Option<Tag>, Error> {
    let row: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn find_tag(slug: &str, pool: &Pool<Postgres>) -> Result<Option<i32>, Error> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM tags WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row.map(|tag| tag.0))
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags")
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

pub async fn list_recipe_tags(
    pool: &Pool<Postgres>,
    recipe_id: i32,
) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.id AS id, t.name AS name, t.color AS color, t.slug AS slug
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

/// Loads `name,color,slug` rows into the tag catalog. Malformed rows are
/// skipped by the parser; existing tags are left untouched. Returns the
/// number of tags actually created.
pub async fn load_tags(input: &str, pool: &Pool<Postgres>) -> Result<u64, Error> {
    let records = parse_tag_records(input);

    let mut created = 0;
    for record in records {
        let result = sqlx::query(
            "INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
        )
        .bind(&record.name)
        .bind(&record.color)
        .bind(&record.slug)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

        created += result.rows_affected();
    }

    Ok(created)
}
