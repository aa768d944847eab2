use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Storefront sort options exposed on the product listing.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSort {
    PriceAsc,
    PriceDesc,
    Newest,
}

// Pagination fields are inlined rather than #[serde(flatten)]-ed: flatten
// makes serde_urlencoded buffer values as strings, which rejects ?page=2
// at deserialization time.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Substring match on name or description.
    pub q: Option<String>,
    pub category: Option<Uuid>,
    pub sort: Option<CatalogSort>,
}

impl ProductQuery {
    pub fn normalize(&self) -> (i64, i64, i64) {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
        .normalize()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl OrderListQuery {
    pub fn normalize(&self) -> (i64, i64, i64) {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
        .normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;

    #[test]
    fn pagination_defaults_and_clamps() {
        let p = Pagination {
            page: None,
            per_page: None,
        };
        assert_eq!(p.normalize(), (1, 20, 0));

        let p = Pagination {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(p.normalize(), (1, 100, 0));

        let p = Pagination {
            page: Some(3),
            per_page: Some(10),
        };
        assert_eq!(p.normalize(), (3, 10, 20));
    }

    #[test]
    fn product_query_parses_paging_params() {
        let uri: Uri = "/api/products?page=2&per_page=10&sort=price_asc&q=shirt"
            .parse()
            .unwrap();
        let query = Query::<ProductQuery>::try_from_uri(&uri).unwrap().0;
        assert_eq!(query.normalize(), (2, 10, 10));
        assert_eq!(query.q.as_deref(), Some("shirt"));
        assert!(matches!(query.sort, Some(CatalogSort::PriceAsc)));
    }

    #[test]
    fn order_query_parses_paging_params() {
        let uri: Uri = "/api/orders?page=3&per_page=5&status=pending&sort_order=asc"
            .parse()
            .unwrap();
        let query = Query::<OrderListQuery>::try_from_uri(&uri).unwrap().0;
        assert_eq!(query.normalize(), (3, 5, 10));
        assert_eq!(query.status.as_deref(), Some("pending"));
        assert!(matches!(query.sort_order, Some(SortOrder::Asc)));
    }

    #[test]
    fn queries_parse_without_params() {
        let uri: Uri = "/api/products".parse().unwrap();
        let query = Query::<ProductQuery>::try_from_uri(&uri).unwrap().0;
        assert_eq!(query.normalize(), (1, 20, 0));
    }
}
