use super::ui;
use crate::core::{Currency, RateStore};
use anyhow::Result;
use comfy_table::{Cell, Table};

pub async fn run(store: &dyn RateStore) -> Result<()> {
    let currencies = store.list_currencies().await?;
    if currencies.is_empty() {
        println!("No currencies known yet. Run `mycurrency seed` to add the defaults.");
        return Ok(());
    }
    println!("{}", currencies_table(&currencies));
    Ok(())
}

fn currencies_table(currencies: &[Currency]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Name"),
        ui::header_cell("Symbol"),
    ]);
    for currency in currencies {
        table.add_row(vec![
            Cell::new(currency.code.as_str()),
            Cell::new(&currency.name),
            Cell::new(&currency.symbol),
        ]);
    }
    table
}
