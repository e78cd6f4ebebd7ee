use clap::Parser;
use reqwest::Url;

use crate::{api::tibber, prelude::*};

#[derive(Parser)]
pub struct TibberArgs {
    /// Tibber API personal access token.
    #[clap(long = "tibber-access-token", env = "TIBBER_ACCESS_TOKEN")]
    access_token: String,

    #[clap(
        long = "tibber-api-url",
        env = "TIBBER_API_URL",
        default_value = "https://api.tibber.com/v1-beta/gql"
    )]
    api_url: Url,

    /// Upstream request timeout, a timed out refresh keeps the old prices.
    #[clap(long = "tibber-timeout", env = "TIBBER_TIMEOUT", default_value = "10s")]
    timeout: humantime::Duration,
}

impl TibberArgs {
    pub fn new_client(&self) -> Result<tibber::Api> {
        tibber::Api::new(self.api_url.clone(), self.access_token.clone(), self.timeout.into())
    }
}
