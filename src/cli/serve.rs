use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use chrono::{Local, NaiveTime};
use clap::Parser;
use tokio::{net::TcpListener, time::sleep};

use crate::{
    cli::{heartbeat::HeartbeatArgs, tibber::TibberArgs},
    core::{
        engine::Engine,
        refresh::{next_refresh_at, parse_time_of_day},
        store::ScheduleStore,
    },
    prelude::*,
    web,
};

#[derive(Parser)]
pub struct ServeArgs {
    #[clap(flatten)]
    tibber: TibberArgs,

    /// JSON file which keeps the device schedules across restarts.
    #[clap(long, env = "SCHEDULE_PATH", default_value = "chargingHours.json")]
    schedule_path: PathBuf,

    #[clap(long, env = "BIND_ADDRESS", default_value = "0.0.0.0:8080")]
    bind_address: SocketAddr,

    /// Local time of the daily price refresh, after the next day's prices get published.
    #[clap(
        long = "refresh-at",
        env = "PRICE_REFRESH_AT",
        default_value = "15:00",
        value_parser = parse_time_of_day,
    )]
    refresh_at: NaiveTime,

    #[clap(flatten)]
    heartbeat: HeartbeatArgs,
}

impl ServeArgs {
    pub async fn run(self) -> Result {
        let store = ScheduleStore::open(&self.schedule_path)
            .context("refusing to start without the saved schedules")?;
        let engine = Arc::new(
            Engine::builder().source(Box::new(self.tibber.new_client()?)).store(store).build(),
        );

        // Not fatal: the API stays usable, just with an empty price table until the next refresh.
        let _ = engine.refresh_prices().await;

        let refresher = tokio::spawn(refresh_daily(
            Arc::clone(&engine),
            self.refresh_at,
            self.heartbeat.clone(),
        ));
        let listener = TcpListener::bind(self.bind_address)
            .await
            .with_context(|| format!("failed to bind `{}`", self.bind_address))?;
        let result = web::serve(listener, engine).await;
        refresher.abort();
        result
    }
}

/// Refresh the prices every day at the specified local time.
async fn refresh_daily(engine: Arc<Engine>, at: NaiveTime, heartbeat: HeartbeatArgs) {
    loop {
        let now = Local::now();
        let next_at = next_refresh_at(&now, at);
        info!(%next_at, "scheduled the next price refresh");
        sleep((next_at - now).to_std().unwrap_or_default()).await;
        if engine.refresh_prices().await.is_ok() {
            heartbeat.send().await;
        }
    }
}
