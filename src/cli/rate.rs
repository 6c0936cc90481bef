use super::{parse_date, ui};
use crate::core::{CurrencyCode, Envelope, RateQuote, RateResult};
use crate::resolver::RateResolver;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use comfy_table::{Cell, Table};

/// Arguments of the `rate` command, as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateArgs {
    pub source: String,
    pub target: String,
    pub date: Option<String>,
    pub provider: Option<String>,
    pub json: bool,
}

async fn resolve_args(resolver: &RateResolver, args: &RateArgs, today: NaiveDate) -> RateResult {
    let source = CurrencyCode::parse(&args.source)?;
    let target = CurrencyCode::parse(&args.target)?;
    let date = parse_date(args.date.as_deref(), today)?;
    resolver
        .resolve(&source, &target, date, args.provider.as_deref())
        .await
}

pub async fn run(resolver: &RateResolver, args: &RateArgs) -> Result<()> {
    let result = resolve_args(resolver, args, Utc::now().date_naive()).await;

    if args.json {
        ui::print_json(&Envelope::from_result(&result))?;
    } else if let Ok(quote) = &result {
        println!("{}", quote_table(quote));
    }
    result.map(|_| ()).map_err(Into::into)
}

fn quote_table(quote: &RateQuote) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Pair"),
        ui::header_cell("Date"),
        ui::header_cell("Rate"),
        ui::header_cell("Provider"),
        ui::header_cell("Source"),
    ]);
    table.add_row(vec![
        Cell::new(quote.pair().to_string()),
        Cell::new(quote.valuation_date.to_string()),
        ui::highlight_cell(quote.rate),
        Cell::new(&quote.provider),
        ui::origin_cell(quote.origin),
    ]);
    table
}
