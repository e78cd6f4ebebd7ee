//! [Tibber](https://developer.tibber.com) price information client.

use std::time::Duration;

use async_trait::async_trait;
use itertools::Itertools;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        point::{PricePoint, PriceTable},
        source::PriceSource,
    },
    prelude::*,
};

pub struct Api {
    client: Client,
    url: Url,
    access_token: String,
}

impl Api {
    pub fn new(url: Url, access_token: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url, access_token })
    }

    /// Get today's and, when already published, tomorrow's hourly prices.
    #[instrument(skip_all, fields(url = %self.url))]
    pub async fn get_price_info(&self) -> Result<PriceTable> {
        info!("fetching…");
        let prices = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.access_token)
            .json(&Request::PRICE_INFO)
            .send()
            .await
            .context("failed to call Tibber")?
            .error_for_status()
            .context("Tibber request failed")?
            .json::<Response>()
            .await
            .context("failed to deserialize the Tibber response")?
            .into_price_table()?;
        info!(n_points = prices.len(), "fetched");
        Ok(prices)
    }
}

#[async_trait]
impl PriceSource for Api {
    async fn fetch_prices(&self) -> Result<PriceTable> {
        self.get_price_info().await
    }
}

#[derive(Serialize)]
struct Request {
    query: &'static str,
}

impl Request {
    const PRICE_INFO: Self = Self {
        query: "{ viewer { homes { currentSubscription { priceInfo { today { total startsAt } tomorrow { total startsAt } } } } } }",
    };
}

#[derive(Deserialize)]
struct Response {
    data: Option<Data>,

    #[serde(default)]
    errors: Vec<GraphQlError>,
}

impl Response {
    /// Concatenate today's and tomorrow's prices of the first home.
    fn into_price_table(self) -> Result<PriceTable> {
        let Some(data) = self.data else {
            bail!("Tibber returned no data: {}", self.errors.iter().map(|error| &error.message).join("; "));
        };
        let home = data.viewer.homes.into_iter().next().context("there are no homes on the account")?;
        let Some(subscription) = home.current_subscription else {
            warn!("the home has no active subscription");
            return Ok(PriceTable::new());
        };
        let price_info = subscription.price_info;
        let mut prices = price_info.today.unwrap_or_default();
        prices.extend(price_info.tomorrow.unwrap_or_default());
        Ok(prices)
    }
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct Data {
    viewer: Viewer,
}

#[derive(Deserialize)]
struct Viewer {
    homes: Vec<Home>,
}

#[derive(Deserialize)]
struct Home {
    #[serde(rename = "currentSubscription")]
    current_subscription: Option<Subscription>,
}

#[derive(Deserialize)]
struct Subscription {
    #[serde(rename = "priceInfo")]
    price_info: PriceInfo,
}

#[derive(Deserialize)]
struct PriceInfo {
    today: Option<Vec<PricePoint>>,
    tomorrow: Option<Vec<PricePoint>>,
}
