//! SQLite-backed data source using sqlx.

use {
    async_trait::async_trait,
    sqlx::{QueryBuilder, Sqlite, SqlitePool, sqlite::SqlitePoolOptions},
    tracing::debug,
};

use crate::{
    error::{Error, Result},
    store::DataSource,
    types::{
        EntityKind, NewPost, NewProduct, NewUser, Page, Post, PostQuery, Product, ProductQuery,
        User, new_id, now_ms,
    },
};

const USER_COLUMNS: &str = "id, name, email";
const POST_COLUMNS: &str = "id, title, content, published, author_id, created_at";
const PRODUCT_COLUMNS: &str = "id, name, image, price, description, created_at";

/// Persists users, posts and products in SQLite.
pub struct SqliteDataSource {
    pool: SqlitePool,
}

impl SqliteDataSource {
    /// Open a pool on `database_url` and run migrations.
    ///
    /// An in-memory database lives only as long as a connection to it, so
    /// in-memory URLs get one connection that is never reaped.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = if is_in_memory_url(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };
        let pool = options.connect(database_url).await?;
        crate::run_migrations(&pool).await?;
        debug!(
            url = database_url,
            max_connections = pool.options().get_max_connections(),
            "sqlite data source ready"
        );
        Ok(Self { pool })
    }
}

fn is_in_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// SQLite only accepts OFFSET after a LIMIT; `LIMIT -1` means unbounded.
fn push_page(qb: &mut QueryBuilder<'_, Sqlite>, page: &Page) {
    if page.is_unbounded() {
        return;
    }
    let take = page.take.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
    let skip = page.skip.map_or(0, |n| i64::try_from(n).unwrap_or(i64::MAX));
    qb.push(" LIMIT ").push_bind(take);
    qb.push(" OFFSET ").push_bind(skip);
}

fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[String]) {
    qb.push("(");
    let mut list = qb.separated(", ");
    for id in ids {
        list.push_bind(id.clone());
    }
    list.push_unseparated(")");
}

#[async_trait]
impl DataSource for SqliteDataSource {
    async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY rowid"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::adapter("list", EntityKind::User))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn user_by_id(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::adapter("find", EntityKind::User))?;
        Ok(row.map(Into::into))
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::adapter("find", EntityKind::User))?;
        Ok(row.map(Into::into))
    }

    async fn users_by_ids(&self, ids: &[String]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id IN "
        ));
        push_id_list(&mut qb, ids);
        let rows = qb
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::adapter("batch load", EntityKind::User))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(Error::adapter("insert", EntityKind::User))?;

        let taken: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
            .bind(&user.email)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::adapter("insert", EntityKind::User))?;
        if taken.is_some() {
            return Err(Error::validation(
                "email",
                format!("{} is already registered", user.email),
            ));
        }

        let record = User {
            id: new_id(),
            name: user.name,
            email: user.email,
        };
        sqlx::query("INSERT INTO users (id, name, email, created_at) VALUES (?, ?, ?, ?)")
            .bind(&record.id)
            .bind(&record.name)
            .bind(&record.email)
            .bind(now_ms())
            .execute(&mut *tx)
            .await
            .map_err(Error::adapter("insert", EntityKind::User))?;
        tx.commit()
            .await
            .map_err(Error::adapter("insert", EntityKind::User))?;
        Ok(record)
    }

    async fn post_by_id(&self, id: &str) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::adapter("find", EntityKind::Post))?;
        Ok(row.map(Into::into))
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
        let mut qb =
            QueryBuilder::<Sqlite>::new(format!("SELECT {POST_COLUMNS} FROM posts WHERE 1 = 1"));
        if let Some(published) = query.published {
            qb.push(" AND published = ").push_bind(i32::from(published));
        }
        // instr() keeps matching case-sensitive, unlike LIKE.
        if let Some(ref needle) = query.search {
            qb.push(" AND (instr(title, ")
                .push_bind(needle.clone())
                .push(") > 0 OR instr(coalesce(content, ''), ")
                .push_bind(needle.clone())
                .push(") > 0)");
        }
        qb.push(" ORDER BY rowid");
        push_page(&mut qb, &query.page);

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::adapter("list", EntityKind::Post))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn posts_by_authors(&self, user_ids: &[String]) -> Result<Vec<Post>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author_id IN "
        ));
        push_id_list(&mut qb, user_ids);
        qb.push(" ORDER BY rowid");
        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::adapter("batch load", EntityKind::Post))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(Error::adapter("insert", EntityKind::Post))?;

        let author_id = match post.author_email {
            Some(email) => {
                let id: Option<String> =
                    sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
                        .bind(&email)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(Error::adapter("find", EntityKind::User))?;
                Some(id.ok_or_else(|| Error::not_found_by(EntityKind::User, "email", email))?)
            },
            None => None,
        };

        let record = Post {
            id: new_id(),
            title: post.title,
            content: post.content,
            published: false,
            author_id,
            created_at: now_ms(),
        };
        sqlx::query(
            "INSERT INTO posts (id, title, content, published, author_id, created_at)
             VALUES (?, ?, ?, 0, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.title)
        .bind(&record.content)
        .bind(&record.author_id)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await
        .map_err(Error::adapter("insert", EntityKind::Post))?;
        tx.commit()
            .await
            .map_err(Error::adapter("insert", EntityKind::Post))?;
        Ok(record)
    }

    async fn set_post_published(&self, id: &str, published: bool) -> Result<Post> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "UPDATE posts SET published = ? WHERE id = ? RETURNING {POST_COLUMNS}"
        ))
        .bind(i32::from(published))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::adapter("update", EntityKind::Post))?;
        row.map(Into::into)
            .ok_or_else(|| Error::not_found(EntityKind::Post, id))
    }

    async fn product_by_id(&self, id: &str) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::adapter("find", EntityKind::Product))?;
        Ok(row.map(Into::into))
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE 1 = 1"
        ));
        if let Some(ref needle) = query.search {
            qb.push(" AND (instr(name, ")
                .push_bind(needle.clone())
                .push(") > 0 OR instr(description, ")
                .push_bind(needle.clone())
                .push(") > 0)");
        }
        qb.push(" ORDER BY created_at DESC, rowid DESC");
        push_page(&mut qb, &query.page);

        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::adapter("list", EntityKind::Product))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let record = Product {
            id: new_id(),
            name: product.name,
            image: product.image,
            price: product.price,
            description: product.description,
            created_at: now_ms(),
        };
        sqlx::query(
            "INSERT INTO products (id, name, image, price, description, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.image)
        .bind(record.price)
        .bind(&record.description)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::adapter("insert", EntityKind::Product))?;
        Ok(record)
    }
}

// ── Row types ────────────────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    name: Option<String>,
    email: String,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            email: r.email,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: String,
    title: String,
    content: Option<String>,
    published: i32,
    author_id: Option<String>,
    created_at: i64,
}

impl From<PostRow> for Post {
    fn from(r: PostRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            content: r.content,
            published: r.published != 0,
            author_id: r.author_id,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    image: String,
    price: f64,
    description: String,
    created_at: i64,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            image: r.image,
            price: r.price,
            description: r.description,
            created_at: r.created_at,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    async fn make_store() -> SqliteDataSource {
        SqliteDataSource::connect("sqlite::memory:", 1).await.unwrap()
    }

    async fn seed_user(store: &SqliteDataSource, email: &str) -> User {
        store
            .create_user(NewUser {
                name: Some(email.split('@').next().unwrap().into()),
                email: email.into(),
            })
            .await
            .unwrap()
    }

    async fn draft(store: &SqliteDataSource, title: &str, content: Option<&str>) -> Post {
        store
            .create_post(NewPost {
                title: title.into(),
                content: content.map(Into::into),
                author_email: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn user_lookups() {
        let store = make_store().await;
        let alice = seed_user(&store, "alice@example.com").await;
        let bob = seed_user(&store, "bob@example.com").await;

        assert_eq!(store.list_users().await.unwrap(), vec![alice.clone(), bob.clone()]);
        assert_eq!(store.user_by_id(&bob.id).await.unwrap(), Some(bob.clone()));
        assert_eq!(
            store.user_by_email("alice@example.com").await.unwrap(),
            Some(alice.clone())
        );
        assert!(store.user_by_id("missing").await.unwrap().is_none());

        let mut batch = store
            .users_by_ids(&[alice.id.clone(), "missing".into()])
            .await
            .unwrap();
        batch.sort_by(|a, b| a.email.cmp(&b.email));
        assert_eq!(batch, vec![alice]);
        assert!(store.users_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = make_store().await;
        seed_user(&store, "dup@example.com").await;
        let err = store
            .create_user(NewUser {
                name: None,
                email: "dup@example.com".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { field: "email", .. }));
    }

    #[tokio::test]
    async fn draft_with_author_and_relation_lookup() {
        let store = make_store().await;
        let alice = seed_user(&store, "alice@example.com").await;
        let bob = seed_user(&store, "bob@example.com").await;

        let post = store
            .create_post(NewPost {
                title: "Hello".into(),
                content: Some("first".into()),
                author_email: Some("alice@example.com".into()),
            })
            .await
            .unwrap();
        assert!(!post.published);
        assert_eq!(post.author_id.as_deref(), Some(alice.id.as_str()));

        assert_eq!(store.posts_by_authors(&[alice.id.clone()]).await.unwrap(), vec![post.clone()]);
        assert!(store.posts_by_authors(&[bob.id.clone()]).await.unwrap().is_empty());
        assert_eq!(store.post_by_id(&post.id).await.unwrap(), Some(post));
    }

    #[tokio::test]
    async fn draft_with_unknown_author_rolls_back() {
        let store = make_store().await;
        let err = store
            .create_post(NewPost {
                title: "Orphan".into(),
                content: None,
                author_email: Some("ghost@example.com".into()),
            })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.list_posts(&PostQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn feed_filters_published_and_search() {
        let store = make_store().await;
        let a = draft(&store, "foo first", None).await;
        let b = draft(&store, "second", Some("contains foo")).await;
        draft(&store, "foo but draft", None).await;
        let d = draft(&store, "unrelated", Some("bar")).await;
        for p in [&a, &b, &d] {
            store.set_post_published(&p.id, true).await.unwrap();
        }

        let titles = |posts: Vec<Post>| posts.into_iter().map(|p| p.title).collect::<Vec<_>>();

        let found = store
            .list_posts(&PostQuery::feed(Some("foo".into()), Page::default()))
            .await
            .unwrap();
        assert_eq!(titles(found), ["foo first", "second"]);

        let all = store
            .list_posts(&PostQuery::feed(None, Page::default()))
            .await
            .unwrap();
        assert_eq!(titles(all), ["foo first", "second", "unrelated"]);

        let upper = store
            .list_posts(&PostQuery::feed(Some("FOO".into()), Page::default()))
            .await
            .unwrap();
        assert!(upper.is_empty());
    }

    #[tokio::test]
    async fn paging_honors_zero() {
        let store = make_store().await;
        for title in ["a", "b", "c"] {
            let p = draft(&store, title, None).await;
            store.set_post_published(&p.id, true).await.unwrap();
        }

        let window = |skip, take| PostQuery::feed(None, Page::new(skip, take));

        assert_eq!(store.list_posts(&window(Some(0), Some(2))).await.unwrap().len(), 2);
        assert_eq!(store.list_posts(&window(None, Some(2))).await.unwrap().len(), 2);
        assert!(store.list_posts(&window(None, Some(0))).await.unwrap().is_empty());

        let rest = store.list_posts(&window(Some(1), None)).await.unwrap();
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].title, "b");
    }

    #[tokio::test]
    async fn products_newest_first_with_search() {
        let store = make_store().await;
        for (name, description) in [("Lamp", "warm light"), ("Chair", "oak"), ("Desk", "oak top")] {
            store
                .create_product(NewProduct {
                    name: name.into(),
                    image: format!("{name}.jpg"),
                    price: 10.0,
                    description: description.into(),
                })
                .await
                .unwrap();
        }

        let names = |products: Vec<Product>| products.into_iter().map(|p| p.name).collect::<Vec<_>>();

        let all = store.list_products(&ProductQuery::default()).await.unwrap();
        assert_eq!(names(all), ["Desk", "Chair", "Lamp"]);

        let oak = store
            .list_products(&ProductQuery::new(Some("oak".into()), Page::default()))
            .await
            .unwrap();
        assert_eq!(names(oak), ["Desk", "Chair"]);

        let by_name = store
            .list_products(&ProductQuery::new(Some("Lamp".into()), Page::default()))
            .await
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(
            store.product_by_id(&by_name[0].id).await.unwrap(),
            Some(by_name[0].clone())
        );
    }

    #[tokio::test]
    async fn set_published_returns_updated_record() {
        let store = make_store().await;
        let post = draft(&store, "toggle me", None).await;

        let updated = store.set_post_published(&post.id, true).await.unwrap();
        assert!(updated.published);
        assert_eq!(updated.id, post.id);

        let err = store.set_post_published("missing", true).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn recognizes_in_memory_urls() {
        assert!(is_in_memory_url("sqlite::memory:"));
        assert!(is_in_memory_url("sqlite://file:shop?mode=memory&cache=shared"));
        assert!(!is_in_memory_url("sqlite:///var/lib/storefront/storefront.db"));
    }

    #[tokio::test]
    async fn in_memory_pool_shares_one_database() {
        let store = SqliteDataSource::connect("sqlite::memory:", 5).await.unwrap();
        seed_user(&store, "alice@example.com").await;

        let product_query = ProductQuery::default();
        let post_query = PostQuery::default();
        let (a, b, c) = tokio::join!(
            store.list_users(),
            store.list_products(&product_query),
            store.list_posts(&post_query),
        );
        assert_eq!(a.unwrap().len(), 1);
        assert!(b.unwrap().is_empty());
        assert!(c.unwrap().is_empty());
    }
}
