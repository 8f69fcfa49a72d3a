//! "Helpful" reactions on posts, one per user and post

use kaushiru_common::time::{now, to_db_timestamp};
use kaushiru_common::{Error, Result};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::BTreeMap;
use tracing::debug;

use super::{new_id, validate_user_uuid};

/// Split `a,b,,c` into distinct trimmed ids, order kept
pub fn parse_post_ids(raw: Option<&str>) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in raw.unwrap_or_default().split(',').map(str::trim) {
        if !id.is_empty() && !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

/// Add a reaction; adding it twice is not an error
pub async fn add_reaction(pool: &SqlitePool, post_id: &str, user_uuid: &str) -> Result<()> {
    validate_user_uuid(user_uuid)?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?)")
        .bind(post_id)
        .fetch_one(pool)
        .await?;
    if !exists {
        return Err(Error::NotFound(format!("Post {}", post_id)));
    }

    let inserted = sqlx::query(
        r#"
        INSERT INTO reactions (id, post_id, user_uuid, created_at)
        SELECT ?, ?, ?, ?
        WHERE NOT EXISTS (SELECT 1 FROM reactions WHERE post_id = ? AND user_uuid = ?)
        "#,
    )
    .bind(new_id())
    .bind(post_id)
    .bind(user_uuid.trim())
    .bind(to_db_timestamp(now()))
    .bind(post_id)
    .bind(user_uuid.trim())
    .execute(pool)
    .await?
    .rows_affected();

    if inserted == 0 {
        debug!("Reaction on {} already present", post_id);
    }
    Ok(())
}

pub async fn remove_reaction(pool: &SqlitePool, post_id: &str, user_uuid: &str) -> Result<()> {
    validate_user_uuid(user_uuid)?;

    sqlx::query("DELETE FROM reactions WHERE post_id = ? AND user_uuid = ?")
        .bind(post_id)
        .bind(user_uuid.trim())
        .execute(pool)
        .await?;
    Ok(())
}

fn push_id_list<'a>(builder: &mut QueryBuilder<'a, Sqlite>, post_ids: &'a [String]) {
    builder.push("(");
    let mut separated = builder.separated(", ");
    for id in post_ids {
        separated.push_bind(id.as_str());
    }
    separated.push_unseparated(")");
}

/// Reaction count per post; posts without reactions are absent
pub async fn reaction_counts(pool: &SqlitePool, post_ids: &[String]) -> Result<BTreeMap<String, i64>> {
    if post_ids.is_empty() {
        return Ok(BTreeMap::new());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT post_id, COUNT(*) FROM reactions WHERE post_id IN ");
    push_id_list(&mut builder, post_ids);
    builder.push(" GROUP BY post_id");

    let rows: Vec<(String, i64)> = builder.build_query_as().fetch_all(pool).await?;
    Ok(rows.into_iter().collect())
}

/// Which of `post_ids` the user reacted to
pub async fn user_reactions(pool: &SqlitePool, user_uuid: &str, post_ids: &[String]) -> Result<Vec<String>> {
    let user_uuid = user_uuid.trim();
    if user_uuid.is_empty() || post_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT post_id FROM reactions WHERE user_uuid = ");
    builder.push_bind(user_uuid);
    builder.push(" AND post_id IN ");
    push_id_list(&mut builder, post_ids);
    builder.push(" ORDER BY created_at");

    let ids: Vec<String> = builder.build_query_scalar().fetch_all(pool).await?;
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::*;

    async fn insert_post(pool: &SqlitePool, id: &str) {
        sqlx::query("INSERT INTO posts (id, user_uuid, price, created_at) VALUES (?, ?, 100, ?)")
            .bind(id)
            .bind(USER_A)
            .bind(to_db_timestamp(now()))
            .execute(pool)
            .await
            .unwrap();
    }

    #[test]
    fn test_parse_post_ids() {
        assert_eq!(parse_post_ids(Some("a, b,,a ,c")), vec!["a", "b", "c"]);
        assert!(parse_post_ids(Some("")).is_empty());
        assert!(parse_post_ids(None).is_empty());
    }

    #[tokio::test]
    async fn test_add_is_idempotent_and_counted() {
        let pool = memory_db().await;
        insert_post(&pool, "p1").await;
        insert_post(&pool, "p2").await;

        add_reaction(&pool, "p1", USER_A).await.unwrap();
        add_reaction(&pool, "p1", USER_A).await.unwrap();
        add_reaction(&pool, "p1", USER_B).await.unwrap();

        let ids = vec!["p1".to_string(), "p2".to_string()];
        let counts = reaction_counts(&pool, &ids).await.unwrap();
        assert_eq!(counts.get("p1"), Some(&2));
        assert!(!counts.contains_key("p2"));

        assert_eq!(user_reactions(&pool, USER_A, &ids).await.unwrap(), vec!["p1"]);
        assert!(user_reactions(&pool, "", &ids).await.unwrap().is_empty());
        assert!(reaction_counts(&pool, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_requires_existing_post() {
        let pool = memory_db().await;
        let result = add_reaction(&pool, "ghost", USER_A).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_reaction() {
        let pool = memory_db().await;
        insert_post(&pool, "p1").await;
        add_reaction(&pool, "p1", USER_A).await.unwrap();

        remove_reaction(&pool, "p1", USER_A).await.unwrap();
        // removing again is fine
        remove_reaction(&pool, "p1", USER_A).await.unwrap();

        let counts = reaction_counts(&pool, &["p1".to_string()]).await.unwrap();
        assert!(counts.is_empty());
    }
}
