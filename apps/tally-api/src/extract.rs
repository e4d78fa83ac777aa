//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

/// Header carrying the caller's company, resolved upstream.
pub const COMPANY_HEADER: &str = "x-company-id";

/// Company scope of a request, taken from the `x-company-id` header.
///
/// Every ticket, ledger row and catalog lookup is filtered by it; a
/// request without it never reaches the engine.
#[derive(Debug, Clone)]
pub struct CompanyId(pub String);

impl<S> FromRequestParts<S> for CompanyId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let company = parts
            .headers
            .get(COMPANY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                ApiError::bad_request(format!("Missing {} header", COMPANY_HEADER))
            })?;

        Ok(CompanyId(company.to_string()))
    }
}
