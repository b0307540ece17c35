//! Types shared by help requests and ambulance requests.

use serde::{Deserialize, Serialize};

/// The two kinds of patient request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Help,
    Ambulance,
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestKind::Help => write!(f, "help"),
            RequestKind::Ambulance => write!(f, "ambulance"),
        }
    }
}

/// Status filter and page window for listing requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFilter<S> {
    /// Statuses to include; empty means every status.
    pub statuses: Vec<S>,
    pub limit: i64,
    pub offset: i64,
}

impl<S> RequestFilter<S> {
    pub fn all(limit: i64, offset: i64) -> Self {
        Self {
            statuses: Vec::new(),
            limit,
            offset,
        }
    }

    pub fn with_statuses(statuses: Vec<S>, limit: i64, offset: i64) -> Self {
        Self {
            statuses,
            limit,
            offset,
        }
    }
}

/// Query parameters for admin request listings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListRequestsQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

impl ListRequestsQuery {
    /// Parses the comma-separated `status` parameter. Absent or blank means
    /// every status.
    pub fn statuses<S>(&self) -> Result<Vec<S>, String>
    where
        S: std::str::FromStr<Err = String>,
    {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(Vec::new()),
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(S::from_str)
                .collect(),
        }
    }

    /// Clamps page and page size to sane bounds and returns `(limit, offset)`.
    pub fn window(&self, max_per_page: i64) -> (i64, i64) {
        let per_page = self.per_page.clamp(1, max_per_page.max(1));
        let page = self.page.clamp(1, MAX_PAGE);
        (per_page, (page - 1).saturating_mul(per_page))
    }
}

/// Highest page number honoured; larger requests read the last reachable page.
const MAX_PAGE: i64 = 1_000_000;

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    20
}

/// Pagination info for list responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = if per_page > 0 {
            total / per_page + i64::from(total % per_page != 0)
        } else {
            0
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// Body of a reject action; the admin must confirm explicitly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RejectRequestBody {
    #[serde(default)]
    pub confirm: bool,
}
