//! `/api/v1/charge-times` endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        engine::Engine,
        point::{PricePoint, PriceTable},
    },
    prelude::*,
    web::error::ApiError,
};

#[derive(Deserialize)]
pub struct DeviceQuery {
    pub id: String,
}

#[derive(Deserialize)]
pub struct ScheduleQuery {
    pub id: String,

    /// Window start, the current hour if omitted.
    pub from: Option<DateTime<FixedOffset>>,

    /// Window length in hours.
    pub timeframe: Option<i64>,

    /// Number of hours to select.
    pub hours: i64,
}

#[derive(Deserialize)]
pub struct CheapestQuery {
    pub hours: i64,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    #[serde(rename = "nPoints")]
    pub n_points: usize,
}

/// Run the engine call on the blocking pool, since it writes the schedule file.
async fn run_blocking<T: Send + 'static>(
    engine: Arc<Engine>,
    call: impl FnOnce(&Engine) -> Result<T, ApiError> + Send + 'static,
) -> Result<T, ApiError> {
    tokio::task::spawn_blocking(move || call(&engine))
        .await
        .map_err(|error| ApiError::Internal(error.into()))?
}

/// `GET ?id=`: the hours assigned to the device.
pub async fn get_charge_times(
    State(engine): State<Arc<Engine>>,
    query: Result<Query<DeviceQuery>, QueryRejection>,
) -> Result<Json<Vec<PricePoint>>, ApiError> {
    let Query(query) = query?;
    match engine.charging_hours(&query.id) {
        Some(hours) if !hours.is_empty() => Ok(Json(hours)),
        _ => Err(ApiError::NotFound(format!("no charge times found for device `{}`", query.id))),
    }
}

/// `POST /schedule`: select and assign the cheapest hours to the device.
#[instrument(skip_all)]
pub async fn schedule(
    State(engine): State<Arc<Engine>>,
    query: Result<Query<ScheduleQuery>, QueryRejection>,
) -> Result<Json<Vec<PricePoint>>, ApiError> {
    let Query(query) = query?;
    debug!(
        id = %query.id,
        from = ?query.from,
        timeframe = query.timeframe,
        hours = query.hours,
        "scheduling…"
    );
    if query.from.is_some() && query.timeframe.is_none() {
        return Err(ApiError::BadRequest("missing timeframe, `from` requires a timeframe".into()));
    }
    let hours = run_blocking(engine, move |engine| {
        let ScheduleQuery { id, from, timeframe, hours } = query;
        let selection = match timeframe {
            None => engine.schedule_from_now(&id, hours)?,
            Some(timeframe) => engine.schedule_windowed(
                &id,
                from.unwrap_or_else(|| Local::now().fixed_offset()),
                timeframe,
                hours,
            )?,
        };
        Ok(selection)
    })
    .await?;
    Ok(Json(hours))
}

/// `GET /devices`
pub async fn get_devices(State(engine): State<Arc<Engine>>) -> Json<Vec<String>> {
    Json(engine.devices())
}

/// `DELETE /devices/{id}`
pub async fn remove_device(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    run_blocking(engine, move |engine| Ok(engine.remove_device(&id)?)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /prices`
pub async fn get_prices(State(engine): State<Arc<Engine>>) -> Json<PriceTable> {
    Json(engine.prices().to_vec())
}

/// `GET /prices/cheapest?hours=`: the cheapest hours, not assigned to anything.
pub async fn get_cheapest_hours(
    State(engine): State<Arc<Engine>>,
    query: Result<Query<CheapestQuery>, QueryRejection>,
) -> Result<Json<Vec<PricePoint>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(engine.cheapest_hours(query.hours)))
}

/// `POST /prices/refresh`
pub async fn refresh_prices(
    State(engine): State<Arc<Engine>>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let n_points = engine.refresh_prices().await.map_err(ApiError::Upstream)?;
    Ok(Json(RefreshResponse { n_points }))
}

#[cfg(test)]
mod tests {
    use axum::response::IntoResponse;
    use tempfile::{TempDir, tempdir};

    use super::*;
    use crate::core::{
        source::testing::{FakeSource, at, four_hours, point},
        store::ScheduleStore,
    };

    async fn engine_in(dir: &TempDir) -> Result<Arc<Engine>> {
        let engine = Engine::builder()
            .source(Box::new(FakeSource::serving(four_hours())))
            .store(ScheduleStore::open(dir.path().join("chargingHours.json"))?)
            .build();
        engine.refresh_prices().await?;
        Ok(Arc::new(engine))
    }

    fn schedule_query(
        from: Option<DateTime<FixedOffset>>,
        timeframe: Option<i64>,
        hours: i64,
    ) -> Result<Query<ScheduleQuery>, QueryRejection> {
        Ok(Query(ScheduleQuery { id: "car".to_owned(), from, timeframe, hours }))
    }

    #[tokio::test]
    async fn test_schedule_window() -> Result {
        let dir = tempdir()?;
        let engine = engine_in(&dir).await?;
        let Json(hours) =
            schedule(State(engine.clone()), schedule_query(Some(at(11)), Some(1), 5)).await?;
        assert_eq!(hours, vec![point(0.10, 11), point(0.50, 12)]);

        let Json(hours) =
            get_charge_times(State(engine), Ok(Query(DeviceQuery { id: "car".to_owned() }))).await?;
        assert_eq!(hours, vec![point(0.10, 11), point(0.50, 12)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_from_without_timeframe_is_bad_request() -> Result {
        let dir = tempdir()?;
        let engine = engine_in(&dir).await?;
        let response = schedule(State(engine.clone()), schedule_query(Some(at(11)), None, 5))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(engine.devices().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_from_now_is_stored_even_if_empty() -> Result {
        let dir = tempdir()?;
        let engine = engine_in(&dir).await?;
        let Json(hours) = schedule(State(engine.clone()), schedule_query(None, None, 3)).await?;
        assert!(hours.is_empty());
        assert_eq!(engine.devices(), ["car"]);

        // An empty schedule is reported as not found, just like an unknown device:
        let response =
            get_charge_times(State(engine), Ok(Query(DeviceQuery { id: "car".to_owned() })))
                .await
                .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_device_is_not_found() -> Result {
        let dir = tempdir()?;
        let query = Query(DeviceQuery { id: "x".to_owned() });
        let response =
            get_charge_times(State(engine_in(&dir).await?), Ok(query)).await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_device() -> Result {
        let dir = tempdir()?;
        let engine = engine_in(&dir).await?;
        engine.schedule_unrestricted("car", 2)?;
        let status = remove_device(State(engine.clone()), Path("car".to_owned())).await?;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(engine.devices().is_empty());

        // Removing twice is fine:
        remove_device(State(engine), Path("car".to_owned())).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_prices() -> Result {
        let dir = tempdir()?;
        let engine = engine_in(&dir).await?;
        let Json(prices) = get_prices(State(engine.clone())).await;
        assert_eq!(prices, four_hours());
        let Json(cheapest) =
            get_cheapest_hours(State(engine), Ok(Query(CheapestQuery { hours: 2 }))).await?;
        assert_eq!(cheapest, vec![point(0.05, 13), point(0.10, 11)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_refresh_is_bad_gateway() -> Result {
        let dir = tempdir()?;
        let engine = Engine::builder()
            .source(Box::new(FakeSource::failing()))
            .store(ScheduleStore::open(dir.path().join("chargingHours.json"))?)
            .build();
        let response = refresh_prices(State(Arc::new(engine))).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        Ok(())
    }
}
