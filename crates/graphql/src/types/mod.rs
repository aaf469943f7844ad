//! GraphQL output and input types.
//!
//! Output types mirror the store records and add the relation fields, which
//! resolve through the batch loaders registered on the schema. Input types
//! are validated into store inserts before any data source call is made.

use {
    async_graphql::{ComplexObject, Context, InputObject, Result, SimpleObject, dataloader::DataLoader},
    storefront_store::{self as store, EntityKind, NewPost, NewProduct},
};

use crate::{
    error::{store_err, validation_err},
    loaders::{AuthorLoader, PostsByAuthorLoader},
};

/// Relation fields never run an unfiltered lookup for an empty parent id.
fn require_parent_id(kind: EntityKind, id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(store_err(store::Error::not_found(kind, "(empty)")));
    }
    Ok(())
}

// ── User ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
}

#[ComplexObject]
impl User {
    /// Posts written by this user, oldest first. Empty when there are none.
    async fn posts(&self, ctx: &Context<'_>) -> Result<Vec<Post>> {
        require_parent_id(EntityKind::User, &self.id)?;
        let loader = ctx.data::<DataLoader<PostsByAuthorLoader>>()?;
        let posts = loader.load_one(self.id.clone()).await?.unwrap_or_default();
        Ok(posts.into_iter().map(Post::from).collect())
    }
}

impl From<store::User> for User {
    fn from(user: store::User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

// ── Post ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: Option<String>,
    pub published: bool,
    #[graphql(skip)]
    pub author_id: Option<String>,
}

#[ComplexObject]
impl Post {
    /// The author, or `null` for a post written without one.
    async fn author(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let Some(author_id) = &self.author_id else {
            return Ok(None);
        };
        require_parent_id(EntityKind::User, author_id)?;
        let loader = ctx.data::<DataLoader<AuthorLoader>>()?;
        Ok(loader.load_one(author_id.clone()).await?.map(User::from))
    }
}

impl From<store::Post> for Post {
    fn from(post: store::Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            published: post.published,
            author_id: post.author_id,
        }
    }
}

// ── Product ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, SimpleObject)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub image: String,
    pub price: f64,
    pub description: String,
    /// Milliseconds since the Unix epoch. Listings are newest first.
    pub created_at: f64,
}

impl From<store::Product> for Product {
    fn from(product: store::Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            image: product.image,
            price: product.price,
            description: product.description,
            created_at: product.created_at as f64,
        }
    }
}

// ── Inputs ──────────────────────────────────────────────────────────────────

/// Fields for `createProduct`. Every field except `name` is optional in the
/// input shape but required to create a product.
#[derive(Debug, InputObject)]
pub struct ProductCreateInput {
    pub name: String,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl TryFrom<ProductCreateInput> for NewProduct {
    type Error = async_graphql::Error;

    fn try_from(input: ProductCreateInput) -> Result<Self> {
        if input.name.trim().is_empty() {
            return Err(validation_err("name", "must not be blank"));
        }
        let price = input
            .price
            .ok_or_else(|| validation_err("price", "is required"))?;
        if !price.is_finite() || price < 0.0 {
            return Err(validation_err(
                "price",
                format!("must be a non-negative number, got {price}"),
            ));
        }
        let image = input
            .image
            .ok_or_else(|| validation_err("image", "is required"))?;
        let description = input
            .description
            .ok_or_else(|| validation_err("description", "is required"))?;

        Ok(Self {
            name: input.name,
            image,
            price,
            description,
        })
    }
}

/// Fields for `createDraft`.
#[derive(Debug, InputObject)]
pub struct PostCreateInput {
    pub title: String,
    pub content: Option<String>,
}

impl PostCreateInput {
    /// Validate and attach the optional author email.
    pub fn into_new_post(self, author_email: Option<String>) -> Result<NewPost> {
        if self.title.trim().is_empty() {
            return Err(validation_err("title", "must not be blank"));
        }
        Ok(NewPost {
            title: self.title,
            content: self.content,
            author_email,
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn product_input() -> ProductCreateInput {
        ProductCreateInput {
            name: "Lamp".into(),
            price: Some(12.5),
            image: Some("lamp.png".into()),
            description: Some("A desk lamp".into()),
        }
    }

    #[test]
    fn complete_product_input_converts() {
        let product = NewProduct::try_from(product_input()).unwrap();
        assert_eq!(product.name, "Lamp");
        assert_eq!(product.price, 12.5);
        assert_eq!(product.image, "lamp.png");
        assert_eq!(product.description, "A desk lamp");
    }

    #[test]
    fn product_input_requires_entity_fields() {
        let err = NewProduct::try_from(ProductCreateInput {
            image: None,
            ..product_input()
        })
        .unwrap_err();
        assert_eq!(err.message, "invalid image: is required");

        let err = NewProduct::try_from(ProductCreateInput {
            price: None,
            ..product_input()
        })
        .unwrap_err();
        assert_eq!(err.message, "invalid price: is required");
    }

    #[test]
    fn product_price_must_be_non_negative_and_finite() {
        for price in [-1.0, f64::NAN, f64::INFINITY] {
            let input = ProductCreateInput {
                price: Some(price),
                ..product_input()
            };
            assert!(NewProduct::try_from(input).is_err(), "accepted {price}");
        }
        let free = ProductCreateInput {
            price: Some(0.0),
            ..product_input()
        };
        assert!(NewProduct::try_from(free).is_ok());
    }

    #[test]
    fn blank_names_and_titles_are_rejected() {
        let input = ProductCreateInput {
            name: "  ".into(),
            ..product_input()
        };
        assert!(NewProduct::try_from(input).is_err());

        let draft = PostCreateInput {
            title: String::new(),
            content: Some("body".into()),
        };
        assert_eq!(
            draft.into_new_post(None).unwrap_err().message,
            "invalid title: must not be blank"
        );
    }

    #[test]
    fn draft_keeps_author_email() {
        let draft = PostCreateInput {
            title: "Hello".into(),
            content: None,
        }
        .into_new_post(Some("alice@example.com".into()))
        .unwrap();
        assert_eq!(draft.author_email.as_deref(), Some("alice@example.com"));
        assert!(draft.content.is_none());
    }

    #[test]
    fn graphql_post_hides_author_id_but_keeps_it_for_resolution() {
        let post = Post::from(store::Post {
            id: "p1".into(),
            title: "t".into(),
            content: None,
            published: true,
            author_id: Some("u1".into()),
            created_at: 1,
        });
        assert_eq!(post.author_id.as_deref(), Some("u1"));
    }

    #[test]
    fn product_timestamp_keeps_millisecond_precision() {
        let product = Product::from(store::Product {
            id: "p1".into(),
            name: "Lamp".into(),
            image: "lamp.png".into(),
            price: 12.5,
            description: "A desk lamp".into(),
            created_at: 1_735_689_600_123,
        });
        assert_eq!(product.created_at, 1_735_689_600_123.0);
    }
}
