//! crates/agro_shop_core/src/reviews.rs
//!
//! Product reviews. A user gets one review per product, and `rating` /
//! `num_reviews` are always derived from the embedded review list.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Product, Review, User};
use crate::ports::{DatabaseService, PortError, PortResult};

/// Appends a review by `author` and recomputes the aggregates.
pub fn add_review(product: &mut Product, author: &User, rating: f64, comment: &str) -> PortResult<()> {
    if product.reviews.iter().any(|r| r.user == author.id) {
        return Err(PortError::Validation("Product already reviewed".to_string()));
    }
    product.reviews.push(Review {
        user: author.id,
        name: author.full_name(),
        rating,
        comment: comment.to_string(),
        created_at: Utc::now(),
    });
    recompute_rating(product);
    Ok(())
}

/// `num_reviews` = review count, `rating` = mean review rating (0 when empty).
pub fn recompute_rating(product: &mut Product) {
    product.num_reviews = product.reviews.len() as u32;
    product.rating = if product.reviews.is_empty() {
        0.0
    } else {
        product.reviews.iter().map(|r| r.rating).sum::<f64>() / product.reviews.len() as f64
    };
}

/// Loads, reviews and saves a product.
pub async fn submit_review(
    db: &dyn DatabaseService,
    product_id: Uuid,
    author: &User,
    rating: f64,
    comment: &str,
) -> PortResult<Product> {
    let mut product = db.get_product(product_id).await.map_err(|e| match e {
        PortError::NotFound(_) => PortError::NotFound("Product not found".to_string()),
        other => other,
    })?;
    add_review(&mut product, author, rating, comment)?;
    let saved = db.save_product(&product).await?;
    info!(product_id = %product_id, user_id = %author.id, rating, "Review added");
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewProduct, NewUser};
    use crate::memory::InMemoryDatabase;
    use rust_decimal::Decimal;

    async fn setup() -> (InMemoryDatabase, Product, User, User) {
        let db = InMemoryDatabase::new();
        let category = db.create_category("Seeds", None).await.unwrap();
        let product = db
            .create_product(NewProduct {
                name: "Wheat Seeds".into(),
                description: "HD-2967".into(),
                price: Decimal::new(450, 0),
                category: category.id,
                images: vec![],
                stock: 10,
                rating: 0.0,
            })
            .await
            .unwrap();
        let mut users = Vec::new();
        for email in ["a@example.com", "b@example.com"] {
            users.push(
                db.create_user(NewUser {
                    first_name: "Test".into(),
                    last_name: "Farmer".into(),
                    email: email.into(),
                    hashed_password: "x".into(),
                    is_admin: false,
                    city_or_village: None,
                    contact_number: None,
                })
                .await
                .unwrap(),
            );
        }
        let b = users.pop().unwrap();
        let a = users.pop().unwrap();
        (db, product, a, b)
    }

    #[tokio::test]
    async fn rating_is_the_mean_of_reviews() {
        let (db, product, a, b) = setup().await;
        submit_review(&db, product.id, &a, 5.0, "Great germination").await.unwrap();
        let saved = submit_review(&db, product.id, &b, 2.0, "Patchy").await.unwrap();

        assert_eq!(saved.num_reviews, 2);
        assert_eq!(saved.reviews.len() as u32, saved.num_reviews);
        assert!((saved.rating - 3.5).abs() < f64::EPSILON);
        assert_eq!(saved.reviews[0].name, "Test Farmer");
    }

    #[tokio::test]
    async fn second_review_by_same_user_is_rejected() {
        let (db, product, a, _b) = setup().await;
        submit_review(&db, product.id, &a, 4.0, "Good").await.unwrap();
        let err = submit_review(&db, product.id, &a, 1.0, "Changed my mind").await.unwrap_err();
        assert_eq!(err, PortError::Validation("Product already reviewed".into()));

        let stored = db.get_product(product.id).await.unwrap();
        assert_eq!(stored.num_reviews, 1);
        assert!((stored.rating - 4.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let (db, _product, a, _b) = setup().await;
        let err = submit_review(&db, Uuid::new_v4(), &a, 3.0, "?").await.unwrap_err();
        assert_eq!(err, PortError::NotFound("Product not found".into()));
    }
}
