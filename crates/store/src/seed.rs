//! Demo data for a fresh database.

use tracing::{debug, info};

use crate::{
    error::Result,
    store::DataSource,
    types::{NewPost, NewProduct, NewUser},
};

struct SeedPost {
    title: &'static str,
    content: &'static str,
    published: bool,
}

struct SeedUser {
    name: &'static str,
    email: &'static str,
    posts: &'static [SeedPost],
}

const USERS: &[SeedUser] = &[
    SeedUser {
        name: "Alice",
        email: "alice@example.com",
        posts: &[SeedPost {
            title: "Opening the shop",
            content: "The storefront is live. Browse the catalogue and tell us what you think.",
            published: true,
        }],
    },
    SeedUser {
        name: "Nilu",
        email: "nilu@example.com",
        posts: &[SeedPost {
            title: "Behind the product photos",
            content: "How we shoot every item on a plain background.",
            published: true,
        }],
    },
    SeedUser {
        name: "Mahmoud",
        email: "mahmoud@example.com",
        posts: &[
            SeedPost {
                title: "Shipping update",
                content: "Orders now ship within two business days.",
                published: true,
            },
            SeedPost {
                title: "Winter collection",
                content: "Draft notes for the upcoming collection.",
                published: false,
            },
        ],
    },
];

const PRODUCTS: &[(&str, &str, f64, &str)] = &[
    (
        "Canvas Tote",
        "/images/tote.jpg",
        24.0,
        "Heavy cotton tote with an inside pocket.",
    ),
    (
        "Ceramic Mug",
        "/images/mug.jpg",
        14.5,
        "Stoneware mug, dishwasher safe.",
    ),
    (
        "Desk Lamp",
        "/images/lamp.jpg",
        59.99,
        "Adjustable arm lamp with a warm LED.",
    ),
];

/// What a seeding run inserted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub posts: usize,
    pub products: usize,
}

/// Insert the demo users, posts and products.
///
/// Users whose email already exists are skipped together with their posts,
/// and products are only inserted into an empty catalogue, so running this
/// twice is harmless.
pub async fn seed(data: &dyn DataSource) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for user in USERS {
        if data.user_by_email(user.email).await?.is_some() {
            debug!(email = user.email, "seed user exists, skipping");
            continue;
        }
        data.create_user(NewUser {
            name: Some(user.name.to_string()),
            email: user.email.to_string(),
        })
        .await?;
        report.users += 1;

        for post in user.posts {
            let created = data
                .create_post(NewPost {
                    title: post.title.to_string(),
                    content: Some(post.content.to_string()),
                    author_email: Some(user.email.to_string()),
                })
                .await?;
            if post.published {
                data.set_post_published(&created.id, true).await?;
            }
            report.posts += 1;
        }
    }

    let catalogue = data.list_products(&Default::default()).await?;
    if catalogue.is_empty() {
        for (name, image, price, description) in PRODUCTS {
            data.create_product(NewProduct {
                name: (*name).to_string(),
                image: (*image).to_string(),
                price: *price,
                description: (*description).to_string(),
            })
            .await?;
            report.products += 1;
        }
    }

    info!(
        users = report.users,
        posts = report.posts,
        products = report.products,
        "seed complete"
    );
    Ok(report)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{MemoryDataSource, types::PostQuery},
    };

    #[tokio::test]
    async fn seeding_twice_inserts_once() {
        let store = MemoryDataSource::new();

        let first = seed(&store).await.unwrap();
        assert_eq!(first, SeedReport {
            users: 3,
            posts: 4,
            products: 3,
        });

        let second = seed(&store).await.unwrap();
        assert_eq!(second, SeedReport::default());

        let feed = store
            .list_posts(&PostQuery::feed(None, Default::default()))
            .await
            .unwrap();
        assert_eq!(feed.len(), 3);
    }
}
