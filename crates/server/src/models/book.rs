//! Book domain types.

use serde::Serialize;

use bookstore_core::{BookId, CategoryId, Price};

/// A catalog book with the ids of the categories it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub price: Price,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    #[serde(rename = "categoriesIds")]
    pub category_ids: Vec<CategoryId>,
}

/// A book projected without its category links.
///
/// Returned when listing the books of a category, where the category is
/// already known to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub price: Price,
    pub description: Option<String>,
    pub cover_image: Option<String>,
}

impl From<Book> for BookSummary {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            price: book.price,
            description: book.description,
            cover_image: book.cover_image,
        }
    }
}

/// The writable fields of a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub price: Price,
    pub description: Option<String>,
    pub cover_image: Option<String>,
}

/// Exact-match search over titles and authors.
///
/// Each non-empty list contributes one "field equals any value" predicate and
/// the predicates are OR-ed. With both lists empty every book matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookSearch {
    pub titles: Vec<String>,
    pub authors: Vec<String>,
}

impl BookSearch {
    /// Whether the search places no restriction at all.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.titles.is_empty() && self.authors.is_empty()
    }

    /// Whether a book with this title and author satisfies the search.
    #[must_use]
    pub fn matches(&self, title: &str, author: &str) -> bool {
        self.is_unfiltered()
            || self.titles.iter().any(|t| t == title)
            || self.authors.iter().any(|a| a == author)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_search_unfiltered_matches_everything() {
        let search = BookSearch::default();
        assert!(search.matches("Dune", "Frank Herbert"));
    }

    #[test]
    fn test_search_is_or_of_predicates() {
        let search = BookSearch {
            titles: vec!["Dune".to_owned()],
            authors: vec!["Ursula K. Le Guin".to_owned()],
        };
        assert!(search.matches("Dune", "Someone Else"));
        assert!(search.matches("The Dispossessed", "Ursula K. Le Guin"));
        assert!(!search.matches("Emma", "Jane Austen"));
    }

    #[test]
    fn test_search_is_exact() {
        let search = BookSearch {
            titles: vec!["Dune".to_owned()],
            authors: vec![],
        };
        assert!(!search.matches("Dune Messiah", "Frank Herbert"));
        assert!(!search.matches("dune", "Frank Herbert"));
    }

    #[test]
    fn test_book_json_uses_categories_ids() {
        let book = Book {
            id: BookId::new(1),
            title: "Secret".to_owned(),
            author: "Rhonda Byrne".to_owned(),
            isbn: "12345".to_owned(),
            price: Price::from_cents(19_900).unwrap(),
            description: None,
            cover_image: None,
            category_ids: vec![CategoryId::new(2)],
        };
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["categoriesIds"], serde_json::json!([2]));
        assert_eq!(json["coverImage"], serde_json::Value::Null);

        let summary = serde_json::to_value(BookSummary::from(book)).unwrap();
        assert!(summary.get("categoriesIds").is_none());
    }
}
