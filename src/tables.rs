use average::Mean;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{core::point::PricePoint, quantity::rate::KilowattHourRate};

/// Build the price table, highlighting the selected hours.
pub fn build_prices_table(prices: &[PricePoint], selected: &[PricePoint]) -> Table {
    let mean_rate = mean_rate(prices);

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table.set_header(vec!["Date", "Start", "Price", "Rank"]);
    for point in prices {
        let rank = selected.iter().position(|selected| selected == point);
        table.add_row(vec![
            Cell::new(point.starts_at.format("%b %d")).add_attribute(Attribute::Dim),
            Cell::new(point.starts_at.format("%H:%M")),
            Cell::new(point.total).set_alignment(CellAlignment::Right).fg(
                if point.total >= mean_rate { Color::Red } else { Color::Green },
            ),
            match rank {
                Some(rank) => Cell::new(rank + 1).add_attribute(Attribute::Bold).fg(Color::Green),
                None => Cell::new(""),
            },
        ]);
    }
    table
}

fn mean_rate(prices: &[PricePoint]) -> KilowattHourRate {
    let estimate: Mean = prices.iter().map(|point| point.total.0).collect();
    if estimate.is_empty() { KilowattHourRate::ZERO } else { estimate.mean().into() }
}
