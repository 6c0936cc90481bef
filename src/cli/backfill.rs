use super::{parse_codes, ui};
use crate::backfill::{BackfillReport, load_historical_rates, planned_steps};
use crate::core::config::BackfillConfig;
use crate::core::{CurrencyCode, RateStore};
use crate::resolver::RateResolver;
use anyhow::Result;
use chrono::Utc;
use comfy_table::{Cell, Table};

/// Arguments of the `backfill` command; anything left out comes from the
/// `backfill` section of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillArgs {
    pub days: Option<u32>,
    pub sources: Vec<String>,
    pub targets: Vec<String>,
}

pub async fn run(
    resolver: &RateResolver,
    store: &dyn RateStore,
    defaults: &BackfillConfig,
    args: &BackfillArgs,
) -> Result<()> {
    let days = args.days.unwrap_or(defaults.days);
    let sources = match parse_codes(&args.sources)? {
        codes if codes.is_empty() => defaults.sources.clone(),
        codes => codes,
    };
    let targets = match parse_codes(&args.targets)? {
        codes if codes.is_empty() => defaults.targets.clone(),
        codes => codes,
    };

    let pb = ui::new_progress_bar(planned_steps(days, &sources, &targets), true);
    pb.set_message("Loading rates...");
    let report = load_historical_rates(
        resolver,
        store,
        days,
        &sources,
        &targets,
        Utc::now().date_naive(),
        &|| pb.inc(1),
    )
    .await;
    pb.finish_and_clear();

    let report = report?;
    println!("{}", report_table(&report));
    if report.error_count > 0 {
        println!(
            "{}",
            ui::style_text(
                "Some rates could not be loaded, run with --verbose for details",
                ui::StyleType::Subtle
            )
        );
    }
    Ok(())
}

fn report_table(report: &BackfillReport) -> Table {
    let join = |codes: &[CurrencyCode]| {
        codes
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Backfill"), ui::header_cell("")]);
    table.add_row(vec![Cell::new("Days"), Cell::new(report.days_processed)]);
    table.add_row(vec![Cell::new("Sources"), Cell::new(join(&report.sources))]);
    table.add_row(vec![Cell::new("Targets"), Cell::new(join(&report.targets))]);
    table.add_row(vec![
        Cell::new("Succeeded"),
        Cell::new(report.success_count).fg(comfy_table::Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Failed"),
        Cell::new(report.error_count).fg(if report.error_count > 0 {
            comfy_table::Color::Red
        } else {
            comfy_table::Color::DarkGrey
        }),
    ]);
    table
}
