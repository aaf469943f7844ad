//! GraphQL mutation resolvers.
//!
//! Each mutation validates its input, performs one data source write and
//! only then publishes on the matching topic. A failed write never reaches
//! the event bus.

use {
    async_graphql::{Context, Object, Result},
    storefront_store::{EntityKind, Error, NewProduct},
    tracing::info,
};

use crate::{
    error::store_err,
    gql_context,
    types::{Post, PostCreateInput, Product, ProductCreateInput},
};

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Create a product and announce it on `newProduct`.
    async fn create_product(&self, ctx: &Context<'_>, data: ProductCreateInput) -> Result<Product> {
        let new_product = NewProduct::try_from(data)?;
        let c = gql_context!(ctx);
        let product = c
            .data
            .create_product(new_product)
            .await
            .map_err(store_err)?;
        info!(product_id = %product.id, name = %product.name, "product created");

        c.events.new_product().publish(&product);
        Ok(product.into())
    }

    /// Create an unpublished post, optionally authored by the user with
    /// `authorEmail`, and announce it on `newPost`.
    async fn create_draft(
        &self,
        ctx: &Context<'_>,
        data: PostCreateInput,
        author_email: Option<String>,
    ) -> Result<Post> {
        let new_post = data.into_new_post(author_email)?;
        let c = gql_context!(ctx);
        let post = c.data.create_post(new_post).await.map_err(store_err)?;
        info!(post_id = %post.id, author_id = ?post.author_id, "draft created");

        c.events.new_post().publish(&post);
        Ok(post.into())
    }

    /// Flip a post's `published` flag. When the post goes from unpublished to
    /// published, its record as it was before the change is announced on
    /// `postPublished`.
    async fn toggle_publish_post(&self, ctx: &Context<'_>, id: String) -> Result<Post> {
        let c = gql_context!(ctx);
        let before = c
            .data
            .post_by_id(&id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| store_err(Error::not_found(EntityKind::Post, id.as_str())))?;

        let after = c
            .data
            .set_post_published(&id, !before.published)
            .await
            .map_err(store_err)?;
        info!(post_id = %id, published = after.published, "post publish flag toggled");

        if !before.published {
            c.events.post_published().publish(&before);
        }
        Ok(after.into())
    }
}
