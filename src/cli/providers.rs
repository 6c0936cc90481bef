use super::ui;
use crate::registry::ProviderRegistry;
use comfy_table::{Cell, Color, Table};

pub fn run(registry: &ProviderRegistry) {
    println!("{}", providers_table(registry));

    let chain: Vec<String> = registry
        .active_providers_ordered()
        .into_iter()
        .map(|d| d.name)
        .collect();
    if chain.is_empty() {
        println!(
            "{}",
            ui::style_text("No active providers configured", ui::StyleType::Error)
        );
    } else {
        println!(
            "{} {}",
            ui::style_text("Fallback chain:", ui::StyleType::Label),
            chain.join(" -> ")
        );
    }
}

fn providers_table(registry: &ProviderRegistry) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Provider"),
        ui::header_cell("Active"),
        ui::header_cell("Priority"),
        ui::header_cell("Adapter"),
    ]);
    for config in registry.configured() {
        let (active, color) = if config.active {
            ("yes", Color::Green)
        } else {
            ("no", Color::DarkGrey)
        };
        let adapter = if registry.is_registered(&config.name) {
            Cell::new("built-in")
        } else {
            Cell::new("missing").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(&config.name),
            Cell::new(active).fg(color),
            Cell::new(config.priority),
            adapter,
        ]);
    }
    table
}
