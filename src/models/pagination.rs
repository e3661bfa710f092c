// src/models/pagination.rs

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    /// Case-insensitive. Anything other than "desc" is ascending; absent input
    /// takes the endpoint's default.
    pub fn parse(input: Option<&str>, default: Direction) -> Direction {
        match input.map(str::trim) {
            None | Some("") => default,
            Some(s) if s.eq_ignore_ascii_case("DESC") => Direction::Desc,
            Some(_) => Direction::Asc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Raw paging query parameters (`?page=&size=&sort=&direction=`).
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

impl PageParams {
    pub fn into_request(self, default_direction: Direction) -> PageRequest {
        PageRequest {
            page: self.page.unwrap_or(0).max(0),
            size: self
                .size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            sort: self
                .sort
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            direction: Direction::parse(self.direction.as_deref(), default_direction),
        }
    }
}

/// Normalized paging descriptor handed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
    pub sort: Option<String>,
    pub direction: Direction,
}

impl PageRequest {
    pub fn new(page: i64, size: i64, direction: Direction) -> Self {
        PageParams {
            page: Some(page),
            size: Some(size),
            ..Default::default()
        }
        .into_request(direction)
    }

    /// Not capped against the total; an offset past the end yields an empty page.
    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }

    /// Resolves the requested sort column against an allow-list.
    pub fn sort_column(
        &self,
        allowed: &[&'static str],
        default: &'static str,
    ) -> Result<&'static str, AppError> {
        let Some(requested) = self.sort.as_deref() else {
            return Ok(default);
        };
        allowed
            .iter()
            .copied()
            .find(|column| *column == requested)
            .ok_or_else(|| {
                AppError::invalid_field(
                    "sort",
                    format!(
                        "Invalid sort parameter. Allowed values are: {}",
                        allowed.join(", ")
                    ),
                )
            })
    }
}

/// Rows for one page plus the unpaged total, as returned by the store.
#[derive(Debug, Clone)]
pub struct RowPage<T> {
    pub rows: Vec<T>,
    pub total: i64,
}

impl<T> RowPage<T> {
    pub fn empty() -> Self {
        RowPage {
            rows: Vec::new(),
            total: 0,
        }
    }
}

/// Uniform paged envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
    pub first: bool,
    pub last: bool,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> PageResponse<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: i64) -> Self {
        let size = request.size.max(1);
        let page = request.page;
        let total_pages = if total_elements <= 0 {
            0
        } else {
            (total_elements + size - 1) / size
        };

        PageResponse {
            content,
            page,
            size,
            total_elements: total_elements.max(0),
            total_pages,
            first: page == 0,
            last: page >= total_pages - 1,
            has_next: page < total_pages - 1,
            has_previous: page > 0,
        }
    }

    pub fn from_rows<R>(rows: RowPage<R>, request: &PageRequest, f: impl FnMut(R) -> T) -> Self {
        let content = rows.rows.into_iter().map(f).collect();
        PageResponse::new(content, request, rows.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(page: i64, size: i64) -> PageRequest {
        PageRequest::new(page, size, Direction::Asc)
    }

    #[test]
    fn normalizes_page_and_size() {
        let r = PageParams::default().into_request(Direction::Desc);
        assert_eq!((r.page, r.size, r.direction), (0, 10, Direction::Desc));

        let r = PageParams {
            page: Some(-3),
            size: Some(1000),
            ..Default::default()
        }
        .into_request(Direction::Asc);
        assert_eq!((r.page, r.size), (0, 100));

        let r = req(2, 0);
        assert_eq!(r.size, 1);
        assert_eq!(req(3, 20).offset(), 60);
    }

    #[test]
    fn direction_is_case_insensitive() {
        assert_eq!(Direction::parse(Some("desc"), Direction::Asc), Direction::Desc);
        assert_eq!(Direction::parse(Some("DeSc"), Direction::Asc), Direction::Desc);
        assert_eq!(Direction::parse(Some("asc"), Direction::Desc), Direction::Asc);
        assert_eq!(Direction::parse(Some("sideways"), Direction::Desc), Direction::Asc);
        assert_eq!(Direction::parse(None, Direction::Desc), Direction::Desc);
    }

    #[test]
    fn envelope_properties_hold() {
        for size in [1_i64, 3, 10, 100] {
            for total in [0_i64, 1, 9, 10, 11, 250] {
                for page in 0..5_i64 {
                    let p = PageResponse::<()>::new(vec![], &req(page, size), total);
                    let expected_pages = (total as f64 / size as f64).ceil() as i64;
                    assert_eq!(p.total_pages, expected_pages);
                    assert_eq!(p.has_next, page < expected_pages - 1);
                    assert_eq!(p.has_previous, page > 0);
                    assert_eq!(p.first, page == 0);
                    assert_eq!(p.last, page >= expected_pages - 1);
                }
            }
        }
    }

    #[test]
    fn empty_result_is_first_and_last() {
        let p = PageResponse::<i32>::new(vec![], &req(0, 10), 0);
        assert_eq!(p.total_pages, 0);
        assert!(p.first && p.last);
        assert!(!p.has_next && !p.has_previous);
    }

    #[test]
    fn sort_column_uses_allow_list() {
        let allowed = ["created_at", "view_count"];
        let mut r = req(0, 10);
        assert_eq!(r.sort_column(&allowed, "created_at").unwrap(), "created_at");

        r.sort = Some("view_count".into());
        assert_eq!(r.sort_column(&allowed, "created_at").unwrap(), "view_count");

        r.sort = Some("password; DROP TABLE users".into());
        let err = r.sort_column(&allowed, "created_at").unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert!(err.to_string().contains("created_at, view_count"));
    }
}
