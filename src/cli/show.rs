use super::ui;
use crate::core::rate::RateView;
use crate::query::RateQueryService;
use anyhow::Result;
use comfy_table::{Cell, Table};

/// Prints today's rates, or a single currency's rate, as a table.
pub async fn run(query: &RateQueryService, currency: Option<&str>) -> Result<()> {
    let views = match currency {
        Some(currency) => query.get_one(currency).await.into_iter().collect(),
        None => query.get_all_today().await,
    };

    if views.is_empty() {
        let message = match currency {
            Some(currency) => format!("No exchange rate recorded today for {currency}."),
            None => "No exchange rates recorded today.".to_string(),
        };
        println!("{}", ui::style_text(&message, ui::StyleType::Subtle));
        return Ok(());
    }

    println!(
        "\n{}",
        ui::style_text(
            &format!("Euro reference rates for {}", views[0].date),
            ui::StyleType::Title
        )
    );
    println!("{}", rates_table(&views));
    Ok(())
}

fn rates_table(views: &[RateView]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Rate"),
        ui::header_cell("Change"),
    ]);
    for view in views {
        table.add_row(vec![
            Cell::new(&view.currency),
            ui::number_cell(&view.rate),
            ui::change_cell(&view.change),
        ]);
    }
    table
}
