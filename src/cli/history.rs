use super::{parse_date, ui};
use crate::core::{CurrencyCode, Envelope, RateError, RateStore};
use crate::history::{HistoryRow, rates_history};
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use comfy_table::{Cell, Table};
use serde::Serialize;
use std::collections::BTreeSet;

/// Arguments of the `history` command, as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryArgs {
    pub source: String,
    pub from: String,
    pub to: String,
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryReport {
    pub source_currency: CurrencyCode,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub rates: Vec<HistoryRow>,
}

async fn history_args(
    store: &dyn RateStore,
    args: &HistoryArgs,
) -> Result<HistoryReport, RateError> {
    let today = Utc::now().date_naive();
    let source = CurrencyCode::parse(&args.source)?;
    let from = parse_date(Some(args.from.as_str()), today)?;
    let to = parse_date(Some(args.to.as_str()), today)?;
    let rates = rates_history(store, &source, from, to).await?;
    Ok(HistoryReport {
        source_currency: source,
        date_from: from,
        date_to: to,
        rates,
    })
}

pub async fn run(store: &dyn RateStore, args: &HistoryArgs) -> Result<()> {
    let result = history_args(store, args).await;

    if args.json {
        ui::print_json(&Envelope::from_result(&result))?;
    } else if let Ok(report) = &result {
        println!(
            "\nRates for {} from {} to {}",
            ui::style_text(report.source_currency.as_str(), ui::StyleType::Title),
            report.date_from,
            report.date_to
        );
        println!("{}", history_table(&report.rates));
    }
    result.map(|_| ()).map_err(Into::into)
}

/// One row per date, one column per target seen anywhere in the period.
fn history_table(rows: &[HistoryRow]) -> Table {
    let targets: BTreeSet<&CurrencyCode> = rows.iter().flat_map(|r| r.rates.keys()).collect();

    let mut table = ui::new_styled_table();
    let mut header = vec![ui::header_cell("Date")];
    header.extend(targets.iter().map(|t| ui::header_cell(t.as_str())));
    table.set_header(header);

    for row in rows {
        let mut cells = vec![Cell::new(row.date.to_string())];
        cells.extend(
            targets
                .iter()
                .map(|t| ui::format_optional_cell(row.rates.get(*t), |r| r.to_string())),
        );
        table.add_row(cells);
    }
    table
}
