use std::sync::Arc;

use bon::Builder;
use chrono::{DateTime, FixedOffset, Local};

use crate::{
    core::{
        cache::PriceCache,
        point::{PricePoint, PriceTable},
        selector,
        source::PriceSource,
        store::{PersistError, ScheduleStore},
    },
    prelude::*,
};

/// Selects the cheapest hours for devices and keeps the selections.
#[derive(Builder)]
pub struct Engine {
    source: Box<dyn PriceSource>,
    store: ScheduleStore,

    #[builder(default)]
    cache: PriceCache,
}

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// The schedule is in effect, but it will not survive a restart.
    #[error("scheduled `{device_id}`, but failed to save the schedule")]
    NotPersisted {
        device_id: String,
        hours: Vec<PricePoint>,

        #[source]
        source: PersistError,
    },
}

impl Engine {
    /// Fetch the prices anew.
    pub async fn refresh_prices(&self) -> Result<usize> {
        self.cache.refresh(self.source.as_ref()).await
    }

    #[must_use]
    pub fn prices(&self) -> Arc<PriceTable> {
        self.cache.current()
    }

    /// Cheapest hours out of the entire table, without assigning them to any device.
    #[must_use]
    pub fn cheapest_hours(&self, n: i64) -> Vec<PricePoint> {
        selector::cheapest(&self.cache.current(), n)
    }

    pub fn schedule_unrestricted(
        &self,
        device_id: &str,
        n: i64,
    ) -> Result<Vec<PricePoint>, ScheduleError> {
        let hours = selector::cheapest(&self.cache.current(), n);
        self.assign(device_id, hours)
    }

    /// Schedule the device into the cheapest hours, starting with the current one.
    pub fn schedule_from_now(
        &self,
        device_id: &str,
        n: i64,
    ) -> Result<Vec<PricePoint>, ScheduleError> {
        self.schedule_since(device_id, Local::now().fixed_offset(), n)
    }

    fn schedule_since(
        &self,
        device_id: &str,
        now: DateTime<FixedOffset>,
        n: i64,
    ) -> Result<Vec<PricePoint>, ScheduleError> {
        let hours = selector::cheapest_since(&self.cache.current(), now, n);
        self.assign(device_id, hours)
    }

    pub fn schedule_windowed(
        &self,
        device_id: &str,
        from: DateTime<FixedOffset>,
        window_hours: i64,
        n: i64,
    ) -> Result<Vec<PricePoint>, ScheduleError> {
        let hours = selector::cheapest_within(&self.cache.current(), from, window_hours, n);
        self.assign(device_id, hours)
    }

    /// Hours currently assigned to the device, [`None`] for an unknown device.
    #[must_use]
    pub fn charging_hours(&self, device_id: &str) -> Option<Vec<PricePoint>> {
        self.store.get(device_id)
    }

    #[must_use]
    pub fn devices(&self) -> Vec<String> {
        self.store.device_ids()
    }

    pub fn remove_device(&self, device_id: &str) -> Result<(), PersistError> {
        self.store.remove(device_id)
    }

    #[instrument(skip_all, fields(device_id = device_id, n_hours = hours.len()))]
    fn assign(
        &self,
        device_id: &str,
        hours: Vec<PricePoint>,
    ) -> Result<Vec<PricePoint>, ScheduleError> {
        match self.store.put(device_id, hours.clone()) {
            Ok(()) => {
                info!("scheduled");
                Ok(hours)
            }
            Err(source) => {
                error!("failed to save the schedule: {source:#}");
                Err(ScheduleError::NotPersisted { device_id: device_id.to_owned(), hours, source })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::TimeDelta;
    use tempfile::{TempDir, tempdir};

    use super::*;
    use crate::core::source::testing::{FakeSource, at, four_hours, point};

    async fn engine_in(dir: &TempDir, source: FakeSource) -> Result<Engine> {
        let engine = Engine::builder()
            .source(Box::new(source))
            .store(ScheduleStore::open(dir.path().join("chargingHours.json"))?)
            .build();
        engine.refresh_prices().await?;
        Ok(engine)
    }

    #[tokio::test]
    async fn test_unrestricted_scenario() -> Result {
        let dir = tempdir()?;
        let engine = engine_in(&dir, FakeSource::serving(four_hours())).await?;

        let hours = engine.schedule_unrestricted("car", 2)?;
        assert_eq!(hours, vec![point(0.05, 13), point(0.10, 11)]);
        assert_eq!(engine.charging_hours("car"), Some(hours));
        assert!(engine.devices().contains(&"car".to_owned()));

        engine.remove_device("car")?;
        assert!(engine.charging_hours("car").is_none());
        assert!(engine.devices().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_windowed_scenario() -> Result {
        let dir = tempdir()?;
        let engine = engine_in(&dir, FakeSource::serving(four_hours())).await?;
        let hours = engine.schedule_windowed("car", at(11), 1, 5)?;
        assert_eq!(hours, vec![point(0.10, 11), point(0.50, 12)]);
        assert_eq!(engine.charging_hours("car"), Some(hours));
        Ok(())
    }

    #[tokio::test]
    async fn test_since_scenario() -> Result {
        let dir = tempdir()?;
        let engine = engine_in(&dir, FakeSource::serving(four_hours())).await?;
        let hours = engine.schedule_since("car", at(12) + TimeDelta::minutes(5), 1)?;
        assert_eq!(hours, vec![point(0.05, 13)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_from_now_skips_the_past() -> Result {
        let dir = tempdir()?;
        let engine = engine_in(&dir, FakeSource::serving(four_hours())).await?;
        // The fixture is in 2024, hence it is entirely in the past:
        let hours = engine.schedule_from_now("car", 4)?;
        assert!(hours.is_empty());
        assert_eq!(engine.charging_hours("car"), Some(vec![]));
        Ok(())
    }

    #[tokio::test]
    async fn test_rescheduling_overwrites() -> Result {
        let dir = tempdir()?;
        let engine = engine_in(&dir, FakeSource::serving(four_hours())).await?;
        engine.schedule_unrestricted("car", 4)?;
        engine.schedule_windowed("car", at(10), 0, 4)?;
        assert_eq!(engine.charging_hours("car"), Some(vec![point(0.30, 10)]));
        Ok(())
    }

    #[tokio::test]
    async fn test_schedule_survives_restart() -> Result {
        let dir = tempdir()?;
        engine_in(&dir, FakeSource::serving(four_hours())).await?.schedule_unrestricted("car", 3)?;
        let engine = engine_in(&dir, FakeSource::serving(vec![])).await?;
        assert_eq!(
            engine.charging_hours("car"),
            Some(vec![point(0.05, 13), point(0.10, 11), point(0.30, 10)]),
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_scheduling() -> Result {
        let dir = tempdir()?;
        let source = FakeSource::serving(four_hours());
        let engine = Engine::builder()
            .source(Box::new(FakeSource::failing()))
            .store(ScheduleStore::open(dir.path().join("chargingHours.json"))?)
            .build();
        engine.cache.refresh(&source).await?;

        assert!(engine.refresh_prices().await.is_err());
        assert_eq!(engine.schedule_unrestricted("car", 1)?, vec![point(0.05, 13)]);
        assert_eq!(*engine.prices(), four_hours());
        Ok(())
    }

    #[tokio::test]
    async fn test_cheapest_hours_do_not_touch_the_store() -> Result {
        let dir = tempdir()?;
        let engine = engine_in(&dir, FakeSource::serving(four_hours())).await?;
        assert_eq!(engine.cheapest_hours(1), vec![point(0.05, 13)]);
        assert!(engine.devices().is_empty());
        assert_eq!(*engine.prices(), four_hours());
        Ok(())
    }

    #[tokio::test]
    async fn test_not_persisted_still_schedules() -> Result {
        let dir = tempdir()?;
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory")?;
        let engine = Engine::builder()
            .source(Box::new(FakeSource::serving(four_hours())))
            .store(ScheduleStore::open(blocker.join("chargingHours.json"))?)
            .build();
        engine.refresh_prices().await?;

        let Err(ScheduleError::NotPersisted { device_id, hours, .. }) =
            engine.schedule_unrestricted("car", 1)
        else {
            panic!("the write should have failed");
        };
        assert_eq!(device_id, "car");
        assert_eq!(hours, vec![point(0.05, 13)]);
        assert_eq!(engine.charging_hours("car"), Some(hours));
        Ok(())
    }
}
