//! # Paged Query Client
//!
//! Client side of the host-response service's paged search protocol.
//!
//! ## Protocol
//!
//! ```text
//! create(projections, conditions)        -> { searchId, resultCount }
//! getResults(searchId, offset, limit,
//!            sortBy, sortDirection)      -> { items: [...] }
//! ```
//!
//! The result count is fixed when the search is created; pages are read-only
//! windows over that snapshot. Offsets and page sizes are validated locally
//! before anything goes on the wire.

use fabric_bus::topics::SERVICE_HOST_RESPONSE;
use fabric_bus::BusGateway;
use fabric_types::{ConditionTree, QueryError, QueryRequest, ResultPage, SortDirection};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Client for the paged search protocol.
pub struct PagedQueryClient {
    gateway: Arc<dyn BusGateway>,
}

impl PagedQueryClient {
    /// Create a client over a connected gateway.
    #[must_use]
    pub fn new(gateway: Arc<dyn BusGateway>) -> Self {
        Self { gateway }
    }

    /// Create a search and return a handle with the result count fixed at
    /// creation time.
    ///
    /// `projections` names the entity sets to return (must be non-empty);
    /// `conditions` is validated against the tree invariants before the
    /// request is issued.
    pub async fn search(
        &self,
        projections: &[&str],
        conditions: &ConditionTree,
    ) -> Result<ResultHandle, QueryError> {
        if projections.is_empty() {
            return Err(QueryError::InvalidCondition(
                "projection set is empty".to_string(),
            ));
        }
        conditions.validate()?;

        let (operation, params) = QueryRequest::new("create")
            .with_param(
                "projections",
                projections
                    .iter()
                    .map(|name| json!({ "name": name }))
                    .collect::<Vec<_>>(),
            )
            .with_param("conditions", conditions.to_wire())
            .into_wire();

        let response = self
            .gateway
            .request(SERVICE_HOST_RESPONSE, &operation, params)
            .await?;

        let search_id = response
            .get("searchId")
            .and_then(Value::as_str)
            .ok_or_else(|| QueryError::malformed(SERVICE_HOST_RESPONSE, "missing searchId"))?
            .to_string();
        let result_count = response
            .get("resultCount")
            .and_then(Value::as_u64)
            .ok_or_else(|| QueryError::malformed(SERVICE_HOST_RESPONSE, "missing resultCount"))?
            as usize;

        debug!(search_id = %search_id, result_count, "Search created");

        Ok(ResultHandle {
            gateway: self.gateway.clone(),
            search_id,
            result_count,
        })
    }
}

/// Handle to a created search. `result_count` never changes after creation.
pub struct ResultHandle {
    gateway: Arc<dyn BusGateway>,
    search_id: String,
    result_count: usize,
}

impl std::fmt::Debug for ResultHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultHandle")
            .field("search_id", &self.search_id)
            .field("result_count", &self.result_count)
            .finish_non_exhaustive()
    }
}

impl ResultHandle {
    /// Whether the search matched anything.
    #[must_use]
    pub fn has_results(&self) -> bool {
        self.result_count > 0
    }

    /// Total result count, fixed at search creation.
    #[must_use]
    pub fn result_count(&self) -> usize {
        self.result_count
    }

    /// Fetch one page. Requires `offset < result_count` and `page_size > 0`.
    ///
    /// Pages are deterministic for a fixed handle, offset, and sort, absent
    /// concurrent mutation on the remote side. A failed fetch is not
    /// retried here; the same page may be re-requested by the caller.
    pub async fn get_page(
        &self,
        offset: usize,
        page_size: usize,
        sort_by: &str,
        sort_direction: SortDirection,
    ) -> Result<ResultPage, QueryError> {
        if page_size == 0 {
            return Err(QueryError::ZeroPageSize);
        }
        if offset >= self.result_count {
            return Err(QueryError::OffsetOutOfRange {
                offset,
                result_count: self.result_count,
            });
        }

        let (operation, params) = QueryRequest::new("getResults")
            .with_param("searchId", self.search_id.as_str())
            .with_param("offset", offset)
            .with_param("limit", page_size)
            .with_param("sortBy", sort_by)
            .with_param("sortDirection", sort_direction.as_wire())
            .into_wire();

        let response = self
            .gateway
            .request(SERVICE_HOST_RESPONSE, &operation, params)
            .await?;

        let items = response
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| QueryError::malformed(SERVICE_HOST_RESPONSE, "missing items"))?
            .clone();

        Ok(ResultPage {
            offset,
            page_size,
            total: self.result_count,
            items,
        })
    }

    /// Fetch every page in order: offsets `0, n, 2n, ...` strictly below
    /// `result_count`. Stops at the first failed fetch.
    pub async fn pages(
        &self,
        page_size: usize,
        sort_by: &str,
        sort_direction: SortDirection,
    ) -> Result<Vec<ResultPage>, QueryError> {
        if page_size == 0 {
            return Err(QueryError::ZeroPageSize);
        }
        let mut pages = Vec::new();
        let mut offset = 0;
        while offset < self.result_count {
            pages.push(
                self.get_page(offset, page_size, sort_by, sort_direction)
                    .await?,
            );
            offset += page_size;
        }
        Ok(pages)
    }
}
