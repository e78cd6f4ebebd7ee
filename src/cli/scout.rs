use clap::Parser;

use crate::{
    cli::tibber::TibberArgs,
    core::selector,
    prelude::*,
    tables::build_prices_table,
};

#[derive(Parser)]
pub struct ScoutArgs {
    #[clap(flatten)]
    tibber: TibberArgs,

    /// Number of the cheapest hours to highlight.
    #[clap(long, default_value = "4")]
    hours: i64,
}

impl ScoutArgs {
    #[instrument(skip_all)]
    pub async fn run(self) -> Result {
        let prices = self.tibber.new_client()?.get_price_info().await?;
        ensure!(!prices.is_empty(), "Tibber returned no prices");
        let cheapest = selector::cheapest(&prices, self.hours);
        println!("{}", build_prices_table(&prices, &cheapest));
        Ok(())
    }
}
