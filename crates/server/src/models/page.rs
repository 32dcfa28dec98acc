//! Pagination and sorting.
//!
//! Pages are zero-based. Sorting is restricted to a per-resource whitelist of
//! API field names, each mapped to a fixed column name, so a sort expression
//! never reaches SQL as free text.

use serde::Serialize;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// SQL keyword for the direction.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A validated sort order over a whitelisted column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    /// Column name, always one of the `allowed` entries passed to [`Sort::parse`].
    pub column: &'static str,
    pub direction: SortDirection,
}

impl Sort {
    /// Parse a `field[,asc|desc]` expression.
    ///
    /// `allowed` maps API field names to column names.
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending part if the field is not in
    /// `allowed` or the direction is neither `asc` nor `desc`.
    pub fn parse(raw: &str, allowed: &[(&str, &'static str)]) -> Result<Self, String> {
        let mut parts = raw.split(',').map(str::trim);
        let field = parts.next().unwrap_or_default();

        let column = allowed
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, column)| *column)
            .ok_or_else(|| format!("cannot sort by '{field}'"))?;

        let direction = match parts.next() {
            None => SortDirection::Asc,
            Some(dir) if dir.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            Some(dir) if dir.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            Some(dir) => return Err(format!("invalid sort direction '{dir}'")),
        };

        if parts.next().is_some() {
            return Err(format!("invalid sort expression '{raw}'"));
        }

        Ok(Self { column, direction })
    }

    /// `ORDER BY` clause body for this sort, qualified with `table_alias`.
    #[must_use]
    pub fn to_sql(self, table_alias: &str) -> String {
        format!(
            "{table_alias}.{} {}, {table_alias}.id ASC",
            self.column,
            self.direction.as_sql()
        )
    }
}

/// A page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Option<Sort>,
}

impl PageRequest {
    /// Page size used when the client does not ask for one.
    pub const DEFAULT_SIZE: u32 = 20;
    /// Largest page size served; bigger requests are clamped.
    pub const MAX_SIZE: u32 = 100;

    /// Create an unsorted page request. `size` is clamped to `1..=MAX_SIZE`.
    #[must_use]
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, Self::MAX_SIZE),
            sort: None,
        }
    }

    /// Attach a sort order.
    #[must_use]
    pub const fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Row offset of the first element of the page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    /// Maximum number of rows on the page.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    /// `ORDER BY` clause body, defaulting to ascending ids.
    #[must_use]
    pub fn order_by(&self, table_alias: &str) -> String {
        self.sort.map_or_else(
            || format!("{table_alias}.id ASC"),
            |sort| sort.to_sql(table_alias),
        )
    }

    /// Slice an already sorted, complete result set down to this page.
    #[must_use]
    pub fn slice<T>(&self, all: Vec<T>) -> Page<T> {
        let total = all.len() as u64;
        let skip = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(self.size).unwrap_or(usize::MAX);
        let content = all.into_iter().skip(skip).take(take).collect();
        Page::new(content, self, total)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Wrap `content` as the page described by `request`.
    #[must_use]
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages: total_elements.div_ceil(u64::from(request.size)),
        }
    }

    /// Transform the page content, keeping the paging metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const FIELDS: &[(&str, &str)] = &[("id", "id"), ("orderDate", "order_date")];

    #[test]
    fn test_sort_parse() {
        let sort = Sort::parse("orderDate,desc", FIELDS).unwrap();
        assert_eq!(sort.column, "order_date");
        assert_eq!(sort.direction, SortDirection::Desc);

        let sort = Sort::parse("id", FIELDS).unwrap();
        assert_eq!(sort.direction, SortDirection::Asc);
    }

    #[test]
    fn test_sort_rejects_unknown_field() {
        assert!(Sort::parse("password_hash", FIELDS).is_err());
        assert!(Sort::parse("id; DROP TABLE", FIELDS).is_err());
    }

    #[test]
    fn test_sort_rejects_bad_direction() {
        assert!(Sort::parse("id,sideways", FIELDS).is_err());
        assert!(Sort::parse("id,asc,desc", FIELDS).is_err());
    }

    #[test]
    fn test_order_by_has_stable_tiebreak() {
        let request = PageRequest::default().with_sort(Sort::parse("orderDate,desc", FIELDS).unwrap());
        assert_eq!(request.order_by("o"), "o.order_date DESC, o.id ASC");
        assert_eq!(PageRequest::default().order_by("b"), "b.id ASC");
    }

    #[test]
    fn test_size_is_clamped() {
        assert_eq!(PageRequest::new(0, 0).size, 1);
        assert_eq!(PageRequest::new(0, 5000).size, PageRequest::MAX_SIZE);
    }

    #[test]
    fn test_slice() {
        let page = PageRequest::new(1, 2).slice((1..=5).collect::<Vec<_>>());
        assert_eq!(page.content, vec![3, 4]);
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages, 3);

        let past_end = PageRequest::new(9, 2).slice((1..=5).collect::<Vec<_>>());
        assert!(past_end.content.is_empty());
    }
}
