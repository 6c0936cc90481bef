use super::{parse_amount, parse_date, ui};
use crate::conversion::{Conversion, CurrencyConverter};
use crate::core::{CurrencyCode, Envelope, RateError};
use anyhow::Result;
use chrono::Utc;
use comfy_table::{Cell, Table};

/// Arguments of the `convert` command, as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertArgs {
    pub source: String,
    pub amount: String,
    pub target: String,
    pub date: Option<String>,
    pub provider: Option<String>,
    pub json: bool,
}

async fn convert_args(
    converter: &CurrencyConverter,
    args: &ConvertArgs,
) -> Result<Conversion, RateError> {
    let source = CurrencyCode::parse(&args.source)?;
    let target = CurrencyCode::parse(&args.target)?;
    let amount = parse_amount(&args.amount)?;
    let date = parse_date(args.date.as_deref(), Utc::now().date_naive())?;
    converter
        .convert(&source, amount, &target, Some(date), args.provider.as_deref())
        .await
}

pub async fn run(converter: &CurrencyConverter, args: &ConvertArgs) -> Result<()> {
    let result = convert_args(converter, args).await;

    if args.json {
        ui::print_json(&Envelope::from_result(&result))?;
    } else if let Ok(conversion) = &result {
        println!("{}", conversion_table(conversion));
    }
    result.map(|_| ()).map_err(Into::into)
}

fn conversion_table(conversion: &Conversion) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Amount"),
        ui::header_cell("Converted"),
        ui::header_cell("Rate"),
        ui::header_cell("Date"),
        ui::header_cell("Provider"),
    ]);
    table.add_row(vec![
        Cell::new(format!("{} {}", conversion.amount, conversion.source)),
        Cell::new(format!("{} {}", conversion.converted_amount, conversion.target))
            .fg(comfy_table::Color::Green),
        ui::decimal_cell(conversion.rate),
        Cell::new(conversion.valuation_date.to_string()),
        Cell::new(&conversion.provider),
    ]);
    table
}
