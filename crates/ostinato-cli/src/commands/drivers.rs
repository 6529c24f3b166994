//! Driver listing command.

use clap::Args;
use ostinato_registry::{DriverCatalog, DriverCategory, DriverDescriptor};

#[derive(Args)]
pub struct DriversArgs {
    /// Only list drivers in this category (e.g. endpoint, rate-conversion)
    #[arg(long, value_parser = parse_category)]
    category: Option<DriverCategory>,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

fn parse_category(s: &str) -> Result<DriverCategory, String> {
    let key = |name: &str| {
        name.chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase()
    };
    let wanted = key(s);
    DriverCategory::ALL
        .into_iter()
        .find(|c| key(c.name()) == wanted)
        .ok_or_else(|| {
            let names: Vec<_> = DriverCategory::ALL.iter().map(|c| c.name()).collect();
            format!("unknown category '{s}' (expected one of: {})", names.join(", "))
        })
}

pub fn run(args: DriversArgs) -> anyhow::Result<()> {
    let catalog = DriverCatalog::new();
    let categories: Vec<DriverCategory> = match args.category {
        Some(category) => vec![category],
        None => DriverCategory::ALL.to_vec(),
    };

    if args.json {
        let drivers: Vec<serde_json::Value> = categories
            .iter()
            .flat_map(|&c| catalog.drivers_in_category(c))
            .map(to_json)
            .collect();
        println!("{}", serde_json::to_string_pretty(&drivers)?);
        return Ok(());
    }

    println!("Built-in Drivers");
    println!("================");
    for category in categories {
        let drivers = catalog.drivers_in_category(category);
        if drivers.is_empty() {
            continue;
        }
        println!();
        println!("{} - {}", category.name(), category.description());
        for d in drivers {
            println!(
                "  {:15} {:>3}  {}  {}",
                d.id, d.type_code.0, d.uuid, d.description
            );
        }
    }
    println!();
    println!("{} drivers", catalog.len());
    Ok(())
}

fn to_json(d: &DriverDescriptor) -> serde_json::Value {
    serde_json::json!({
        "id": d.id,
        "category": d.category.name(),
        "type": d.type_code.0,
        "uuid": d.uuid.to_string(),
        "description": d.description,
    })
}
