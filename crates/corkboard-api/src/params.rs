// SPDX-License-Identifier: Apache-2.0

//! Query-string parsing shared by the list endpoints.

use std::collections::HashMap;

use corkboard_model::{TaskPriority, TaskStatus};

use crate::errors::ApiError;

pub const MAX_PAGE_LIMIT: u32 = 100;

/// Uniform pagination: `page` ≥ 1, `limit` in 1..=100 with a per-route
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u32,
    pub limit: u32,
}

impl PageParams {
    pub fn parse(
        query: &HashMap<String, String>,
        default_limit: u32,
    ) -> Result<Self, ApiError> {
        let page = match query.get("page") {
            Some(raw) => {
                let value: u32 = raw
                    .parse()
                    .map_err(|_| ApiError::validation("Page must be a positive integer"))?;
                if value == 0 {
                    return Err(ApiError::validation("Page must be a positive integer"));
                }
                value
            }
            None => 1,
        };
        let limit = match query.get("limit") {
            Some(raw) => {
                let value: u32 = raw
                    .parse()
                    .map_err(|_| ApiError::validation("Limit must be 1-100"))?;
                if value == 0 || value > MAX_PAGE_LIMIT {
                    return Err(ApiError::validation("Limit must be 1-100"));
                }
                value
            }
            None => default_limit,
        };
        Ok(Self { page, limit })
    }
}

pub fn parse_status_filter(
    query: &HashMap<String, String>,
) -> Result<Option<TaskStatus>, ApiError> {
    query
        .get("status")
        .map(|raw| TaskStatus::parse(raw).ok_or_else(|| ApiError::validation("Invalid status")))
        .transpose()
}

pub fn parse_priority_filter(
    query: &HashMap<String, String>,
) -> Result<Option<TaskPriority>, ApiError> {
    query
        .get("priority")
        .map(|raw| TaskPriority::parse(raw).ok_or_else(|| ApiError::validation("Invalid priority")))
        .transpose()
}

pub fn bool_flag(query: &HashMap<String, String>, name: &str) -> bool {
    matches!(
        query.get(name).map(String::as_str),
        Some("1" | "true" | "TRUE" | "yes")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_absent() {
        let params = PageParams::parse(&query(&[]), 20).expect("parse");
        assert_eq!(params, PageParams { page: 1, limit: 20 });
    }

    #[test]
    fn bounds_are_enforced() {
        assert!(PageParams::parse(&query(&[("page", "0")]), 20).is_err());
        assert!(PageParams::parse(&query(&[("limit", "0")]), 20).is_err());
        assert!(PageParams::parse(&query(&[("limit", "101")]), 20).is_err());
        assert!(PageParams::parse(&query(&[("page", "abc")]), 20).is_err());

        let ok = PageParams::parse(&query(&[("page", "3"), ("limit", "100")]), 20).expect("parse");
        assert_eq!(ok, PageParams { page: 3, limit: 100 });
    }

    #[test]
    fn filters_parse_or_reject() {
        assert_eq!(
            parse_status_filter(&query(&[("status", "review")])).expect("parse"),
            Some(TaskStatus::Review)
        );
        assert!(parse_status_filter(&query(&[("status", "archived")])).is_err());
        assert_eq!(parse_priority_filter(&query(&[])).expect("parse"), None);
        assert!(bool_flag(&query(&[("unread_only", "true")]), "unread_only"));
        assert!(!bool_flag(&query(&[("unread_only", "false")]), "unread_only"));
    }
}
