use crate::{
    constants::SUBSCRIPTION_COUNT_PER_PAGE,
    error::{Error, QueryError},
    pagination::PageContext,
    schema::{SubscriptionRow, User},
};

use sqlx::{Pool, Postgres};

pub async fn get_user(
    pool: &Pool<Postgres>,
    username: &str,
) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_user_by_id(
    pool: &Pool<Postgres>,
    user_id: i32,
) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Creates a user, reporting whether a row was actually inserted. Username
/// and email are unique; a duplicate insert is a no-op.
pub async fn create_user(
    username: &str,
    email: &str,
    first_name: &str,
    last_name: &str,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let query = sqlx::query(
        "
        INSERT INTO users (username, email, first_name, last_name)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT DO NOTHING RETURNING *;
    ",
    )
    .bind(username)
    .bind(email)
    .bind(first_name)
    .bind(last_name)
    .execute(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(query.rows_affected() > 0)
}

pub async fn is_subscribed(
    follower_id: i32,
    author_id: i32,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let result: Option<(i32,)> = sqlx::query_as(
        "
        SELECT author_id FROM subscriptions WHERE follower_id = $1 AND author_id = $2
    ",
    )
    .bind(follower_id)
    .bind(author_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(result.is_some())
}

/// Self-subscription is rejected up front, before any state is consulted.
pub async fn subscribe(
    follower_id: i32,
    author_id: i32,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    if follower_id == author_id {
        return Err(Error::validation("You cannot subscribe to yourself"));
    }

    let author = get_user_by_id(pool, author_id).await?;
    if author.is_none() {
        return Err(Error::not_found("No user exists with specified id"));
    }

    let result = sqlx::query(
        "INSERT INTO subscriptions (follower_id, author_id) VALUES ($1, $2) ON CONFLICT (follower_id, author_id) DO NOTHING",
    )
    .bind(follower_id)
    .bind(author_id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(Error::conflict("You are already subscribed to this author"));
    }

    Ok(())
}

pub async fn unsubscribe(
    follower_id: i32,
    author_id: i32,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE follower_id = $1 AND author_id = $2")
        .bind(follower_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(Error::not_found("You are not subscribed to this author"));
    }

    Ok(())
}

pub async fn fetch_subscriptions(
    follower_id: i32,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<SubscriptionRow>, Error> {
    let rows: Vec<SubscriptionRow> = sqlx::query_as(
        "
        SELECT u.id, u.username, u.email, u.first_name, u.last_name,
            (SELECT COUNT(*) FROM recipes r WHERE r.author_id = u.id) AS recipe_count,
            COUNT(uu) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        LEFT JOIN users uu ON uu.id = u.id
        WHERE s.follower_id = $1
        ORDER BY u.username
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(follower_id)
    .bind(SUBSCRIPTION_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.get(0).map(|p| p.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, SUBSCRIPTION_COUNT_PER_PAGE, offset);

    Ok(page)
}
