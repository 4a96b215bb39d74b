use anyhow::Result;
use hyper::StatusCode;
use shared::types::{ChartSeries, SessionClaims, StreamBatch, StreamFilter, StreamRecord, ValidationError};
use shared::types::catalog::parse_day;
use tracing::{debug, info};

use crate::AppState;
use crate::database::streams;
use crate::handlers::http::catalog::{parse_json_body, store_error_response};
use crate::handlers::http::utils::{deliver_error_json, deliver_success_json, query_param};
use crate::handlers::http::{HttpRequest, HttpResponse};

/// `POST {prefix}/api/streams`: one record or an array of records.
///
/// The whole batch is validated before anything is written.
pub async fn handle_record_streams(
    req: HttpRequest,
    state: AppState,
    claims: SessionClaims,
) -> Result<HttpResponse> {
    let batch: StreamBatch = match parse_json_body(&req) {
        Ok(batch) => batch,
        Err(response) => return response,
    };

    let records: Vec<StreamRecord> = match batch
        .into_vec()
        .into_iter()
        .map(|r| r.validate())
        .collect::<std::result::Result<_, _>>()
    {
        Ok(records) => records,
        Err(e) => return validation_failed(&e),
    };

    match streams::insert_streams(&state.db, &records).await {
        Ok(inserted) => {
            info!(
                "{} recorded {} stream row(s)",
                claims.username().unwrap_or("admin"),
                inserted
            );
            deliver_success_json(serde_json::json!({ "inserted": inserted }), StatusCode::CREATED)
        }
        Err(e) => store_error_response(e),
    }
}

/// `GET {prefix}/api/analytics?from=&to=&release_id=&platform=`
pub async fn handle_analytics(
    req: HttpRequest,
    state: AppState,
    _claims: SessionClaims,
) -> Result<HttpResponse> {
    let filter = match filter_from_query(&req) {
        Ok(filter) => filter,
        Err(e) => {
            return deliver_error_json("BAD_REQUEST", &e.to_string(), StatusCode::BAD_REQUEST);
        }
    };

    let records = match streams::query_streams(&state.db, &filter).await {
        Ok(records) => records,
        Err(e) => return store_error_response(e),
    };

    let series = ChartSeries::from_records(&records);
    debug!(
        "Analytics: {} day(s), {} platform(s), total {}",
        series.labels.len(),
        series.datasets.len(),
        series.total
    );
    deliver_success_json(series, StatusCode::OK)
}

fn filter_from_query(req: &HttpRequest) -> std::result::Result<StreamFilter, ValidationError> {
    let from = query_param(req, "from")
        .map(|v| parse_day("from", &v))
        .transpose()?;
    let to = query_param(req, "to")
        .map(|v| parse_day("to", &v))
        .transpose()?;

    Ok(StreamFilter {
        from,
        to,
        release_id: query_param(req, "release_id"),
        platform: query_param(req, "platform"),
    })
}

fn validation_failed(e: &ValidationError) -> Result<HttpResponse> {
    deliver_error_json(
        "VALIDATION_FAILED",
        &e.to_string(),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use hyper::Request;

    fn req(uri: &str) -> HttpRequest {
        Request::builder().uri(uri).body(Bytes::new()).unwrap()
    }

    #[test]
    fn query_becomes_filter() {
        let f = filter_from_query(&req(
            "/admin/api/analytics?from=2024-01-01&to=2024-01-31&platform=spotify",
        ))
        .unwrap();
        assert_eq!(f.from, chrono::NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(f.to, chrono::NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(f.platform.as_deref(), Some("spotify"));
        assert_eq!(f.release_id, None);
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(matches!(
            filter_from_query(&req("/admin/api/analytics?from=yesterday")),
            Err(ValidationError::InvalidDate { field: "from", .. })
        ));
    }
}
