use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::{ContentStore, PostFilter, RELEASED_USERNAME_PREFIX};
use crate::error::Result;
use crate::models::{Comment, Group, NewComment, NewGroup, NewPost, Post, PostChanges, User};

/// Columns of a listed post; expects the post row aliased as `p`.
const POST_PROJECTION: &str = r#"
    SELECT p.id, p.author_id, u.username AS author, p.text, p.pub_date,
           p.group_id, g.slug AS group_slug, p.image
"#;

const POST_JOINS: &str = r#"
    JOIN users u ON u.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id
"#;

/// PostgreSQL content store (source of truth)
#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        debug!("content store migrations applied");
        Ok(())
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: PostFilter) {
    match filter {
        PostFilter::All => {}
        PostFilter::Group(group_id) => {
            qb.push(" WHERE p.group_id = ").push_bind(group_id);
        }
        PostFilter::Author(author_id) => {
            qb.push(" WHERE p.author_id = ").push_bind(author_id);
        }
        PostFilter::FollowedBy(user_id) => {
            qb.push(" WHERE p.author_id IN (SELECT author_id FROM follows WHERE user_id = ")
                .push_bind(user_id)
                .push(")");
        }
    }
}

#[async_trait::async_trait]
impl ContentStore for PgContentStore {
    async fn upsert_user(&self, id: i64, username: &str) -> Result<User> {
        let mut tx = self.pool.begin().await?;

        // A rename upstream can hand this username to a new account before the
        // previous holder acts again; park the stale row until it resyncs.
        let released = sqlx::query(
            r#"
            UPDATE users
            SET username = $3 || id::text, updated_at = NOW()
            WHERE username = $2 AND id <> $1
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(RELEASED_USERNAME_PREFIX)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if released > 0 {
            debug!(user_id = id, username, "released username held by a stale user row");
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                updated_at = NOW()
            RETURNING id, username
            "#,
        )
        .bind(id)
        .bind(username)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, username FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }

    async fn find_group(&self, id: i64) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    async fn insert_group(&self, group: NewGroup) -> Result<Option<Group>> {
        let inserted = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO post_groups (title, slug, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO NOTHING
            RETURNING id, title, slug, description
            "#,
        )
        .bind(&group.title)
        .bind(&group.slug)
        .bind(&group.description)
        .fetch_optional(&self.pool)
        .await?;

        if inserted.is_none() {
            debug!(slug = %group.slug, "group slug already taken");
        }
        Ok(inserted)
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
        push_filter(&mut qb, filter);
        let count = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn fetch_posts(&self, filter: PostFilter, limit: i64, offset: i64) -> Result<Vec<Post>> {
        let mut qb = QueryBuilder::<Postgres>::new(POST_PROJECTION);
        qb.push(" FROM posts p ").push(POST_JOINS);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let posts = qb.build_query_as::<Post>().fetch_all(&self.pool).await?;
        Ok(posts)
    }

    async fn find_post(&self, author_id: i64, post_id: i64) -> Result<Option<Post>> {
        let mut qb = QueryBuilder::<Postgres>::new(POST_PROJECTION);
        qb.push(" FROM posts p ")
            .push(POST_JOINS)
            .push(" WHERE p.id = ")
            .push_bind(post_id)
            .push(" AND p.author_id = ")
            .push_bind(author_id);

        let post = qb.build_query_as::<Post>().fetch_optional(&self.pool).await?;
        Ok(post)
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        let sql = format!(
            r#"
            WITH p AS (
                INSERT INTO posts (author_id, text, group_id, image)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            {POST_PROJECTION} FROM p {POST_JOINS}
            "#
        );

        let created = sqlx::query_as::<_, Post>(&sql)
            .bind(post.author_id)
            .bind(&post.text)
            .bind(post.group_id)
            .bind(&post.image)
            .fetch_one(&self.pool)
            .await?;

        debug!(post_id = created.id, author_id = created.author_id, "post inserted");
        Ok(created)
    }

    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let sql = format!(
            r#"
            WITH p AS (
                UPDATE posts SET text = $2, group_id = $3, image = $4
                WHERE id = $1
                RETURNING *
            )
            {POST_PROJECTION} FROM p {POST_JOINS}
            "#
        );

        let updated = sqlx::query_as::<_, Post>(&sql)
            .bind(post_id)
            .bind(&changes.text)
            .bind(changes.group_id)
            .bind(&changes.image)
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.post_id, c.author_id, u.username AS author, c.text, c.created
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created ASC, c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment> {
        let created = sqlx::query_as::<_, Comment>(
            r#"
            WITH c AS (
                INSERT INTO comments (post_id, author_id, text)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT c.id, c.post_id, c.author_id, u.username AS author, c.text, c.created
            FROM c
            JOIN users u ON u.id = c.author_id
            "#,
        )
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(&comment.text)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn insert_follow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO follows (user_id, author_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id, author_id) DO NOTHING
            RETURNING user_id
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?;

        debug!(user_id, author_id, created = inserted.is_some(), "follow upsert");
        Ok(inserted.is_some())
    }

    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        debug!(user_id, author_id, removed = affected > 0, "follow delete");
        Ok(affected > 0)
    }

    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn count_followers(&self, author_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_following(&self, user_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn followed_author_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT author_id FROM follows WHERE user_id = $1 ORDER BY author_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
