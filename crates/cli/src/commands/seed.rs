//! Demo data for local development.
//!
//! Inserts a small catalog (categories, products, approved reviews). Rows
//! that already exist, matched by slug, are left alone, so the command can
//! be run repeatedly. Products are created without images; add them from the
//! admin product form.

use elegance_admin::db;
use elegance_core::Money;
use elegance_core::catalog::{COLORS, SIZES};
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Missing environment variable: DATABASE_URL")]
    MissingDatabaseUrl,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

struct DemoCategory {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
}

struct DemoProduct {
    category: &'static str,
    name: &'static str,
    slug: &'static str,
    sku: &'static str,
    description: &'static str,
    price_cents: i64,
    sale_cents: Option<i64>,
    stock: i32,
    colors: &'static [&'static str],
    featured: bool,
}

struct DemoReview {
    product: &'static str,
    reviewer: &'static str,
    rating: i16,
    title: &'static str,
    comment: &'static str,
}

const CATEGORIES: &[DemoCategory] = &[
    DemoCategory {
        name: "Everyday Abayas",
        slug: "everyday-abayas",
        description: "Comfortable, breathable abayas for daily wear.",
    },
    DemoCategory {
        name: "Occasion Abayas",
        slug: "occasion-abayas",
        description: "Embellished designs for weddings, Eid, and evenings out.",
    },
    DemoCategory {
        name: "Open Abayas",
        slug: "open-abayas",
        description: "Kimono-style front-open cuts to layer over any outfit.",
    },
    DemoCategory {
        name: "Kaftans",
        slug: "kaftans",
        description: "Flowing kaftans in light fabrics.",
    },
];

const PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        category: "everyday-abayas",
        name: "Classic Black Abaya",
        slug: "classic-black-abaya",
        sku: "EL-EVD-001",
        description: "A timeless nida abaya with a relaxed fit and hidden snap closure.",
        price_cents: 8_900,
        sale_cents: None,
        stock: 40,
        colors: &["Black"],
        featured: true,
    },
    DemoProduct {
        category: "everyday-abayas",
        name: "Crepe Travel Abaya",
        slug: "crepe-travel-abaya",
        sku: "EL-EVD-002",
        description: "Wrinkle-resistant crepe with deep side pockets.",
        price_cents: 7_500,
        sale_cents: Some(5_900),
        stock: 25,
        colors: &["Black", "Navy Blue", "Gray"],
        featured: false,
    },
    DemoProduct {
        category: "everyday-abayas",
        name: "Linen Blend Abaya",
        slug: "linen-blend-abaya",
        sku: "EL-EVD-003",
        description: "Light linen blend for warm days.",
        price_cents: 9_500,
        sale_cents: None,
        stock: 6,
        colors: &["Brown", "Gray"],
        featured: false,
    },
    DemoProduct {
        category: "occasion-abayas",
        name: "Embroidered Evening Abaya",
        slug: "embroidered-evening-abaya",
        sku: "EL-OCC-001",
        description: "Tonal embroidery along the sleeves and hem.",
        price_cents: 18_900,
        sale_cents: None,
        stock: 12,
        colors: &["Black", "Burgundy"],
        featured: true,
    },
    DemoProduct {
        category: "occasion-abayas",
        name: "Pearl Trim Abaya",
        slug: "pearl-trim-abaya",
        sku: "EL-OCC-002",
        description: "Hand-set pearl trim on soft georgette.",
        price_cents: 22_500,
        sale_cents: Some(19_900),
        stock: 0,
        colors: &["Navy Blue", "Dark Green"],
        featured: false,
    },
    DemoProduct {
        category: "open-abayas",
        name: "Kimono Open Abaya",
        slug: "kimono-open-abaya",
        sku: "EL-OPN-001",
        description: "Wide kimono sleeves with a matching belt.",
        price_cents: 11_000,
        sale_cents: None,
        stock: 18,
        colors: &["Black", "Dark Green", "Burgundy"],
        featured: true,
    },
    DemoProduct {
        category: "open-abayas",
        name: "Pleated Open Abaya",
        slug: "pleated-open-abaya",
        sku: "EL-OPN-002",
        description: "Fine pleats that move as you walk.",
        price_cents: 12_500,
        sale_cents: None,
        stock: 9,
        colors: &["Gray", "Brown"],
        featured: false,
    },
    DemoProduct {
        category: "kaftans",
        name: "Chiffon Kaftan",
        slug: "chiffon-kaftan",
        sku: "EL-KFT-001",
        description: "Layered chiffon with an inner slip.",
        price_cents: 13_500,
        sale_cents: Some(10_800),
        stock: 15,
        colors: &["Navy Blue", "Burgundy"],
        featured: false,
    },
];

const REVIEWS: &[DemoReview] = &[
    DemoReview {
        product: "classic-black-abaya",
        reviewer: "Sarah M.",
        rating: 5,
        title: "Perfect everyday abaya",
        comment: "The fabric is soft and the fit is exactly as described.",
    },
    DemoReview {
        product: "classic-black-abaya",
        reviewer: "Fatima A.",
        rating: 4,
        title: "Lovely quality",
        comment: "Runs slightly long, but the quality is excellent.",
    },
    DemoReview {
        product: "embroidered-evening-abaya",
        reviewer: "Aisha K.",
        rating: 5,
        title: "Wore it to a wedding",
        comment: "So many compliments. The embroidery is beautiful in person.",
    },
    DemoReview {
        product: "kimono-open-abaya",
        reviewer: "Maryam H.",
        rating: 4,
        title: "Great for layering",
        comment: "Light enough for spring and the belt is a nice touch.",
    },
];

/// Insert the demo catalog.
///
/// # Errors
///
/// Returns `SeedError` if the database can't be reached or an insert fails.
pub async fn demo() -> Result<(), SeedError> {
    let database_url = super::database_url().ok_or(SeedError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    let (categories, products, reviews) = seed(&pool).await?;

    tracing::info!("Seeding complete!");
    tracing::info!("  Categories inserted: {categories}");
    tracing::info!("  Products inserted: {products}");
    tracing::info!("  Reviews inserted: {reviews}");
    Ok(())
}

async fn seed(pool: &PgPool) -> Result<(u64, u64, u64), SeedError> {
    let mut tx = pool.begin().await?;

    let mut categories = 0;
    for category in CATEGORIES {
        categories += sqlx::query(
            r"
            INSERT INTO categories (name, slug, description)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(category.name)
        .bind(category.slug)
        .bind(category.description)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    let mut products = 0;
    for product in PRODUCTS {
        products += insert_product(&mut tx, product).await?;
    }

    let mut reviews = 0;
    for review in REVIEWS {
        reviews += insert_review(&mut tx, review).await?;
    }

    tx.commit().await?;
    Ok((categories, products, reviews))
}

async fn insert_product(
    tx: &mut Transaction<'_, Postgres>,
    product: &DemoProduct,
) -> Result<u64, sqlx::Error> {
    let sizes: Vec<&str> = SIZES.to_vec();
    let colors: Vec<&str> = product
        .colors
        .iter()
        .copied()
        .filter(|c| COLORS.contains(c))
        .collect();

    let result = sqlx::query(
        r"
        INSERT INTO products (
            category_id, name, slug, description, sku, price, sale_price,
            stock_quantity, sizes, colors, is_active, is_featured
        )
        VALUES (
            (SELECT id FROM categories WHERE slug = $1),
            $2, $3, $4, $5, $6, $7, $8, $9, $10, TRUE, $11
        )
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(product.category)
    .bind(product.name)
    .bind(product.slug)
    .bind(product.description)
    .bind(product.sku)
    .bind(Money::from_cents(product.price_cents))
    .bind(product.sale_cents.map(Money::from_cents))
    .bind(product.stock)
    .bind(sizes)
    .bind(colors)
    .bind(product.featured)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

/// Reviews are only added to products that have none, so reruns don't duplicate them.
async fn insert_review(
    tx: &mut Transaction<'_, Postgres>,
    review: &DemoReview,
) -> Result<u64, sqlx::Error> {
    let email = format!(
        "{}@demo.elegance.test",
        review
            .reviewer
            .split_whitespace()
            .next()
            .unwrap_or("reviewer")
            .to_lowercase()
    );

    let result = sqlx::query(
        r"
        INSERT INTO reviews (product_id, reviewer_name, reviewer_email, rating, title, comment, status)
        SELECT p.id, $2, $3, $4, $5, $6, 'approved'
        FROM products p
        WHERE p.slug = $1
          AND NOT EXISTS (
              SELECT 1 FROM reviews r WHERE r.product_id = p.id AND r.reviewer_name = $2
          )
        ",
    )
    .bind(review.product)
    .bind(review.reviewer)
    .bind(email)
    .bind(review.rating)
    .bind(review.title)
    .bind(review.comment)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use elegance_core::reviews::MAX_RATING;

    use super::*;

    #[test]
    fn test_products_reference_known_categories() {
        let slugs: HashSet<_> = CATEGORIES.iter().map(|c| c.slug).collect();
        for product in PRODUCTS {
            assert!(slugs.contains(product.category), "{} has no category", product.slug);
        }
    }

    #[test]
    fn test_demo_products_are_valid() {
        let mut slugs = HashSet::new();
        for product in PRODUCTS {
            assert!(slugs.insert(product.slug), "duplicate slug {}", product.slug);
            assert!(product.price_cents > 0);
            if let Some(sale) = product.sale_cents {
                assert!(sale < product.price_cents, "{} sale price", product.slug);
            }
            assert!(product.stock >= 0);
            assert!(product.colors.iter().all(|c| COLORS.contains(c)));
        }
    }

    #[test]
    fn test_reviews_reference_demo_products() {
        for review in REVIEWS {
            assert!(PRODUCTS.iter().any(|p| p.slug == review.product));
            assert!((1..=MAX_RATING).contains(&review.rating));
        }
    }
}
