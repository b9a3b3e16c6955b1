//! Deal-list activity and on-the-fly visitor endpoints.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use slaash_core::{DurationType, HourlySeries, Vertical};

use super::or_zero;
use crate::db::ActivityRepository;
use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DurationQuery {
    #[serde(rename = "durationType")]
    pub duration_type: Option<String>,
}

impl DurationQuery {
    /// The requested window length; missing and unknown values are a 400.
    fn parse(&self) -> Result<DurationType, AppError> {
        let raw = self
            .duration_type
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("durationType is required".to_string()))?;
        raw.parse()
            .map_err(|e: slaash_core::analytics::UnknownDuration| AppError::BadRequest(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct OtfQuery {
    #[serde(rename = "anonymousid")]
    pub anonymous_id: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Metric {
    pub value: i64,
    pub vertical: Vertical,
}

impl Metric {
    fn between(current: i64, previous: i64) -> Self {
        Self {
            value: current,
            vertical: Vertical::between(current, previous),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DealListActivity {
    pub gmv: Metric,
    pub products: Metric,
    pub users: Metric,
    pub discount_spends: Metric,
    pub gmv_data: HourlySeries,
    pub discounts_data: HourlySeries,
    pub products_data: HourlySeries,
    pub users_data: HourlySeries,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OtfVisitors {
    pub otf: HourlySeries,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OtfVerdict {
    pub anonymous_id: String,
    pub otf: bool,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET /api/deallist_activity?durationType=
#[instrument(skip(state, user, query), fields(store_id = %user.store_id))]
pub async fn deallist_activity(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<DurationQuery>,
) -> Result<Json<DealListActivity>, AppError> {
    let duration = query.parse()?;
    let window = duration.window(Utc::now());
    let activity = ActivityRepository::new(state.pool());
    let store_id = user.store_id;

    let money_now = or_zero(
        activity.checkout_totals(store_id, &window.current).await,
        "checkout_totals.current",
    );
    let money_before = or_zero(
        activity.checkout_totals(store_id, &window.previous).await,
        "checkout_totals.previous",
    );
    let visitors_now = or_zero(
        activity.visitor_totals(store_id, &window.current).await,
        "visitor_totals.current",
    );
    let visitors_before = or_zero(
        activity.visitor_totals(store_id, &window.previous).await,
        "visitor_totals.previous",
    );
    let checkouts = or_zero(
        activity.checkout_series(store_id, &window.current).await,
        "checkout_series",
    );
    let visitors = or_zero(
        activity.visitor_series(store_id, &window.current).await,
        "visitor_series",
    );

    Ok(Json(DealListActivity {
        gmv: Metric::between(money_now.gmv, money_before.gmv),
        products: Metric::between(visitors_now.products, visitors_before.products),
        users: Metric::between(visitors_now.users, visitors_before.users),
        discount_spends: Metric::between(money_now.discount, money_before.discount),
        gmv_data: HourlySeries::dense(&window.current, checkouts.gmv),
        discounts_data: HourlySeries::dense(&window.current, checkouts.discount),
        products_data: HourlySeries::dense(&window.current, visitors.products),
        users_data: HourlySeries::dense(&window.current, visitors.users),
    }))
}

/// GET /api/otf_visitors?durationType=
///
/// Hourly counts of visitors flagged as on-the-fly shoppers.
pub async fn otf_visitors(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<DurationQuery>,
) -> Result<Json<OtfVisitors>, AppError> {
    let duration = query.parse()?;
    let window = duration.window(Utc::now());

    let points = or_zero(
        ActivityRepository::new(state.pool())
            .otf_series(user.store_id, &window.current)
            .await,
        "otf_series",
    );

    Ok(Json(OtfVisitors {
        otf: HourlySeries::dense(&window.current, points),
    }))
}

/// GET /api/if_otf?anonymousid=
///
/// Scores one visitor from their clickstream and stores the verdict.
#[instrument(skip(state, user, query), fields(store_id = %user.store_id))]
pub async fn if_otf(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<OtfQuery>,
) -> Result<Json<OtfVerdict>, AppError> {
    let anonymous_id = query
        .anonymous_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("anonymousid is required".to_string()))?;

    let visits = state.clickstream().visit_table(&anonymous_id).await?;
    let otf = state.otf().score(&visits);

    let written = ActivityRepository::new(state.pool())
        .record_otf(user.store_id, &anonymous_id, otf)
        .await?;
    tracing::debug!(otf, rows = written, "otf verdict recorded");

    Ok(Json(OtfVerdict { anonymous_id, otf }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use slaash_core::analytics::TimeRange;

    use super::*;

    fn keys(series: &HourlySeries) -> Vec<String> {
        series.iter().map(|(k, _)| k.to_string()).collect()
    }

    fn query(value: Option<&str>) -> DurationQuery {
        DurationQuery {
            duration_type: value.map(str::to_string),
        }
    }

    #[test]
    fn test_duration_query_parses_known_values() {
        assert_eq!(query(Some("12hours")).parse().unwrap(), DurationType::TwelveHours);
        assert_eq!(query(Some("monthly")).parse().unwrap(), DurationType::Monthly);
    }

    #[test]
    fn test_duration_query_rejects_missing_and_unknown() {
        assert!(matches!(query(None).parse(), Err(AppError::BadRequest(_))));
        assert!(matches!(
            query(Some("yearly")).parse(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_metric_serializes_value_and_vertical() {
        let json = serde_json::to_value(Metric::between(150, 100)).unwrap();
        assert_eq!(json["Value"], 150);
        assert_eq!(json["Vertical"]["Positive"], true);
        assert_eq!(json["Vertical"]["ChangePercentage"], 50.0);
    }

    #[test]
    fn test_otf_series_is_dense_over_window() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let range = TimeRange {
            start,
            end: start + chrono::TimeDelta::hours(3),
        };
        let body = OtfVisitors {
            otf: HourlySeries::dense(&range, vec![(start, 4)]),
        };
        assert_eq!(
            keys(&body.otf),
            vec![
                "2026-03-01 10:00:00".to_string(),
                "2026-03-01 11:00:00".to_string(),
                "2026-03-01 12:00:00".to_string(),
            ]
        );
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["Otf"]["2026-03-01 10:00:00"], 4);
        assert_eq!(json["Otf"]["2026-03-01 12:00:00"], 0);
    }
}
