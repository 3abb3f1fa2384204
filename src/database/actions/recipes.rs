use crate::{
    constants::RECIPE_COUNT_PER_PAGE,
    error::{Error, QueryError},
    form::{merge_ingredient_amounts, IngredientAmount, RecipeForm},
    pagination::PageContext,
    schema::{Recipe, RecipeDetails, RecipeLineItem, RecipeOrder, RecipeRow, ShoppingCartLine},
    shopping::{aggregate_shopping_list, render_shopping_list},
};

use super::{tags::list_recipe_tags, users::get_user_by_id};

use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

pub async fn list_recipes(pool: &Pool<Postgres>) -> Result<Vec<Recipe>, Error> {
    let rows: Vec<Recipe> = sqlx::query_as("SELECT * FROM recipes;")
        .fetch_all(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

pub async fn fetch_recipes(
    tag: Option<i32>,
    order: Option<RecipeOrder>,
    offset: i64,
    search: String,
    author: Option<i32>,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, Error> {
    let order = order
        .map(|order| match order {
            RecipeOrder::Newest => "created_at DESC",
            RecipeOrder::Oldest => "created_at",
            RecipeOrder::Alphabetical => "name",
            RecipeOrder::CookingTimeAsc => "cooking_time",
            RecipeOrder::CookingTimeDesc => "cooking_time DESC",
        })
        .unwrap_or("created_at DESC");

    let rows: Vec<RecipeRow> = match (tag, author) {
        (Some(tag), Some(author)) => {
            sqlx::query_as(&format!("SELECT r.*, COUNT(rr) OVER() AS count FROM recipes r LEFT JOIN recipes rr ON rr.id = r.id INNER JOIN recipe_tags rt ON rt.recipe_id = r.id WHERE rt.tag_id = $1 AND r.author_id = $2 AND r.name ILIKE $3 ORDER BY {order} LIMIT $4 OFFSET $5"))
                .bind(tag)
                .bind(author)
                .bind(search)
                .bind(RECIPE_COUNT_PER_PAGE)
                .bind(offset)
                .fetch_all(&*pool).await.map_err(|e| QueryError::from(e).into())?
        },
        (None, Some(author)) => {
            sqlx::query_as(&format!("SELECT r.*, COUNT(rr) OVER() AS count FROM recipes r LEFT JOIN recipes rr ON rr.id = r.id WHERE r.author_id = $1 AND r.name ILIKE $2 ORDER BY {order} LIMIT $3 OFFSET $4"))
                .bind(author)
                .bind(search)
                .bind(RECIPE_COUNT_PER_PAGE)
                .bind(offset)
                .fetch_all(&*pool).await.map_err(|e| QueryError::from(e).into())?
        },
        (Some(tag), None) => {
            sqlx::query_as(&format!("SELECT r.*, COUNT(rr) OVER() AS count FROM recipes r LEFT JOIN recipes rr ON rr.id = r.id INNER JOIN recipe_tags rt ON rt.recipe_id = r.id WHERE rt.tag_id = $1 AND r.name ILIKE $2 ORDER BY {order} LIMIT $3 OFFSET $4"))
                .bind(tag)
                .bind(search)
                .bind(RECIPE_COUNT_PER_PAGE)
                .bind(offset)
                .fetch_all(&*pool).await.map_err(|e| QueryError::from(e).into())?
        },
        (None, None) => {
            sqlx::query_as(&format!("SELECT r.*, COUNT(rr) OVER() AS count FROM recipes r LEFT JOIN recipes rr ON rr.id = r.id WHERE r.name ILIKE $1 ORDER BY {order} LIMIT $2 OFFSET $3"))
                .bind(search)
                .bind(RECIPE_COUNT_PER_PAGE)
                .bind(offset)
                .fetch_all(&*pool).await.map_err(|e| QueryError::from(e).into())?
        },
    };

    let total_count = rows.get(0).map(|p| p.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, RECIPE_COUNT_PER_PAGE, offset);
    Ok(page)
}

pub async fn get_recipe(id: i32, pool: &Pool<Postgres>) -> Result<Option<Recipe>, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn find_recipe(name: &str, pool: &Pool<Postgres>) -> Result<Option<i32>, Error> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT id FROM recipes WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_optional(&*pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    Ok(row.map(|r| r.0))
}

pub async fn get_recipe_author(
    id: i32,
    pool: &Pool<Postgres>,
) -> Result<Option<String>, Error> {
    let row: Option<(String,)> = sqlx::query_as(
        "
        SELECT u.username
        FROM recipes r
        INNER JOIN users u ON u.id = r.author_id
        WHERE r.id = $1
    ",
    )
    .bind(id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(row.map(|x| x.0))
}

pub async fn list_recipe_line_items(
    pool: &Pool<Postgres>,
    recipe_id: i32,
) -> Result<Vec<RecipeLineItem>, Error> {
    let rows: Vec<RecipeLineItem> = sqlx::query_as("
        SELECT ri.recipe_id AS recipe_id, i.id AS ingredient_id, i.name AS name, i.unit AS unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
    ")
    .bind(recipe_id)
    .fetch_all(pool).await.map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

/// Creates a recipe together with its merged line items and tag links.
/// The whole write is one transaction; the first unknown ingredient or tag
/// id aborts it and nothing is persisted.
pub async fn create_recipe(
    form: &RecipeForm,
    author_id: i32,
    pool: &Pool<Postgres>,
) -> Result<i32, Error> {
    let image = match &form.image {
        Some(image) => image.to_owned(),
        None => return Err(Error::validation("Recipe image is required")),
    };
    let line_items = merge_ingredient_amounts(&form.ingredients)?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| QueryError::from(e).into())?;

    let id: (i32,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(author_id)
    .bind(&form.name)
    .bind(image)
    .bind(&form.text)
    .bind(form.cooking_time)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    insert_line_items(&mut tx, id.0, &line_items).await?;
    insert_tag_links(&mut tx, id.0, &form.tags).await?;

    tx.commit()
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(id.0)
}

/// Replaces the stored recipe wholesale: info fields are overwritten and
/// the line-item and tag sets are deleted and recreated from the form.
/// The whole replace is one transaction; a failed validation leaves the
/// stored recipe unchanged and no reader observes a recipe without
/// ingredients.
pub async fn update_recipe(
    id: i32,
    form: &RecipeForm,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let recipe = get_recipe(id, pool).await?;
    if recipe.is_none() {
        return Err(Error::not_found("No recipe exists with specified id"));
    }

    let line_items = merge_ingredient_amounts(&form.ingredients)?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| QueryError::from(e).into())?;

    sqlx::query(
        "UPDATE recipes SET name = $1, text = $2, cooking_time = $3, image = COALESCE($4, image) WHERE id = $5",
    )
    .bind(&form.name)
    .bind(&form.text)
    .bind(form.cooking_time)
    .bind(form.image.as_deref())
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| QueryError::from(e).into())?;
    insert_line_items(&mut tx, id, &line_items).await?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| QueryError::from(e).into())?;
    insert_tag_links(&mut tx, id, &form.tags).await?;

    tx.commit()
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

pub async fn delete_recipe(id: i32, pool: &Pool<Postgres>) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(Error::not_found("No recipe exists with specified id"));
    }

    Ok(())
}

async fn insert_line_items(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i32,
    line_items: &[IngredientAmount],
) -> Result<(), Error> {
    for line in line_items {
        let exists: Option<(i32,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = $1")
            .bind(line.ingredient_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| QueryError::from(e).into())?;

        if exists.is_none() {
            return Err(Error::validation("No ingredient exists with specified id"));
        }
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");

    query_builder.push_values(line_items.iter(), |mut b, line| {
        b.push_bind(recipe_id)
            .push_bind(line.ingredient_id)
            .push_bind(line.amount);
    });

    query_builder
        .build()
        .execute(&mut **tx)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

async fn insert_tag_links(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i32,
    tags: &[i32],
) -> Result<(), Error> {
    if tags.is_empty() {
        return Ok(());
    }

    for tag_id in tags {
        let exists: Option<(i32,)> = sqlx::query_as("SELECT id FROM tags WHERE id = $1")
            .bind(tag_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| QueryError::from(e).into())?;

        if exists.is_none() {
            return Err(Error::validation("No tag exists with specified id"));
        }
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");

    query_builder.push_values(tags.iter(), |mut b, tag_id| {
        b.push_bind(recipe_id).push_bind(tag_id);
    });
    query_builder.push(" ON CONFLICT (recipe_id, tag_id) DO NOTHING");

    query_builder
        .build()
        .execute(&mut **tx)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

/// Assembles the full detail surface of one recipe. `actor_id` is the
/// viewing user, if any; the favorite and shopping-cart flags are false for
/// anonymous viewers.
pub async fn get_recipe_details(
    id: i32,
    actor_id: Option<i32>,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetails, Error> {
    let recipe = match get_recipe(id, pool).await? {
        Some(recipe) => recipe,
        None => return Err(Error::not_found("No recipe exists with specified id")),
    };

    let author = match get_user_by_id(pool, recipe.author_id).await? {
        Some(author) => author,
        None => return Err(Error::not_found("No user exists with specified id")),
    };

    let tags = list_recipe_tags(pool, id).await?;
    let line_items = list_recipe_line_items(pool, id).await?;

    let (is_favorited, is_queued) = match actor_id {
        Some(user_id) => (
            is_favorite(id, user_id, pool).await?,
            is_in_shopping_cart(id, user_id, pool).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeDetails {
        recipe,
        author,
        tags,
        line_items,
        is_favorited,
        is_in_shopping_cart: is_queued,
    })
}

pub async fn is_favorite(
    id: i32,
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let result: Option<(i32,)> = sqlx::query_as(
        "
        SELECT recipe_id FROM user_favorites WHERE recipe_id = $1 AND user_id = $2
    ",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(result.is_some())
}

pub async fn fetch_favorites(
    user_id: i32,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, Error> {
    let rows: Vec<RecipeRow> = sqlx::query_as("
        SELECT r.*, COUNT(rr) OVER() AS count FROM user_favorites f INNER JOIN recipes r ON r.id = f.recipe_id LEFT JOIN recipes rr ON rr.id = r.id WHERE f.user_id = $1 ORDER BY r.created_at DESC LIMIT $2 OFFSET $3
    ")
        .bind(user_id)
        .bind(RECIPE_COUNT_PER_PAGE)
        .bind(offset)
        .fetch_all(pool).await.map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.get(0).map(|p| p.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, RECIPE_COUNT_PER_PAGE, offset);

    Ok(page)
}

/// Favoriting your own recipe is rejected. A repeated add is a conflict,
/// never a silent no-op.
pub async fn add_to_favorites(
    id: i32,
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let recipe = match get_recipe(id, pool).await? {
        Some(recipe) => recipe,
        None => return Err(Error::not_found("No recipe exists with specified id")),
    };
    if recipe.author_id == user_id {
        return Err(Error::validation("You cannot favorite your own recipe"));
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| QueryError::from(e).into())?;

    let result = sqlx::query(
        "INSERT INTO user_favorites (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT (user_id, recipe_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(Error::conflict("Recipe is already in favorites"));
    }

    sqlx::query("UPDATE recipes SET favorite_count = favorite_count + 1 WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    tx.commit()
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

pub async fn remove_from_favorites(
    id: i32,
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| QueryError::from(e).into())?;

    let result = sqlx::query("DELETE FROM user_favorites WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(Error::not_found("Recipe is not in favorites"));
    }

    sqlx::query("UPDATE recipes SET favorite_count = favorite_count - 1 WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    tx.commit()
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

pub async fn is_in_shopping_cart(
    id: i32,
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let result: Option<(i32,)> = sqlx::query_as(
        "
        SELECT recipe_id FROM shopping_cart WHERE recipe_id = $1 AND user_id = $2
    ",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(result.is_some())
}

pub async fn add_to_shopping_cart(
    id: i32,
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let recipe = get_recipe(id, pool).await?;
    if recipe.is_none() {
        return Err(Error::not_found("No recipe exists with specified id"));
    }

    let result = sqlx::query(
        "INSERT INTO shopping_cart (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT (user_id, recipe_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(Error::conflict("Recipe is already in shopping cart"));
    }

    Ok(())
}

pub async fn remove_from_shopping_cart(
    id: i32,
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM shopping_cart WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(Error::not_found("Recipe is not in shopping cart"));
    }

    Ok(())
}

pub async fn list_shopping_cart_lines(
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingCartLine>, Error> {
    let rows: Vec<ShoppingCartLine> = sqlx::query_as("
        SELECT ri.ingredient_id AS ingredient_id, i.name AS name, i.unit AS unit, ri.amount AS amount
        FROM shopping_cart sc
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = $1
    ")
    .bind(user_id)
    .fetch_all(pool).await.map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

/// The downloadable shopping-list document for a user's queued recipes.
pub async fn export_shopping_list(
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<String, Error> {
    let lines = list_shopping_cart_lines(user_id, pool).await?;
    let items = aggregate_shopping_list(lines);

    Ok(render_shopping_list(&items))
}
