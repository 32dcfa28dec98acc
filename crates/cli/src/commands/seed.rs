//! Seed the catalog with sample categories and books.
//!
//! Seeding is skipped when the catalog already holds books.

use rust_decimal::Decimal;

use bookstore_core::{CategoryId, Price};
use bookstore_server::db::PgStore;
use bookstore_server::models::{BookDraft, CategoryDraft, PageRequest};
use bookstore_server::services::CatalogService;

use super::{CommandError, connect};

struct SeedBook {
    title: &'static str,
    author: &'static str,
    isbn: &'static str,
    price: i64,
    category: &'static str,
}

const CATEGORIES: &[(&str, &str)] = &[
    ("Self-help", "Books on personal growth"),
    ("Science Fiction", "Speculative and futuristic fiction"),
    ("Classics", "Enduring literature"),
];

const BOOKS: &[SeedBook] = &[
    SeedBook {
        title: "Secret",
        author: "Rhonda Byrne",
        isbn: "12345",
        price: 199,
        category: "Self-help",
    },
    SeedBook {
        title: "Dune",
        author: "Frank Herbert",
        isbn: "978-0441013593",
        price: 18,
        category: "Science Fiction",
    },
    SeedBook {
        title: "The Left Hand of Darkness",
        author: "Ursula K. Le Guin",
        isbn: "978-0441478125",
        price: 17,
        category: "Science Fiction",
    },
    SeedBook {
        title: "Emma",
        author: "Jane Austen",
        isbn: "978-0141439587",
        price: 9,
        category: "Classics",
    },
];

/// Insert the sample catalog.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let store = PgStore::new(connect().await?);
    let catalog = CatalogService::new(&store);

    let existing = catalog.list_books(&PageRequest::new(0, 1)).await?;
    if existing.total_elements > 0 {
        tracing::info!(books = existing.total_elements, "Catalog not empty, skipping seed");
        return Ok(());
    }

    let mut categories: Vec<(&str, CategoryId)> = Vec::with_capacity(CATEGORIES.len());
    for (name, description) in CATEGORIES {
        let category = catalog
            .create_category(&CategoryDraft {
                name: (*name).to_owned(),
                description: Some((*description).to_owned()),
            })
            .await?;
        categories.push((*name, category.id));
    }

    for seed in BOOKS {
        let category_ids: Vec<CategoryId> = categories
            .iter()
            .filter(|(name, _)| *name == seed.category)
            .map(|(_, id)| *id)
            .collect();

        let draft = BookDraft {
            title: seed.title.to_owned(),
            author: seed.author.to_owned(),
            isbn: seed.isbn.to_owned(),
            price: Price::new(Decimal::from(seed.price))?,
            description: None,
            cover_image: None,
        };
        catalog.create_book(&draft, &category_ids).await?;
    }

    tracing::info!(
        categories = CATEGORIES.len(),
        books = BOOKS.len(),
        "Seed complete!"
    );
    Ok(())
}
