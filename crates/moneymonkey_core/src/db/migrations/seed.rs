//! Reference taxonomy inserted by the seed migration.
//!
//! The seed runs once per fresh schema. Re-running it against a populated
//! schema violates the unique name constraints by construction.

use crate::db::DbResult;
use rusqlite::Transaction;

/// Sectors in insertion order, each with its industries in insertion order.
pub const SECTOR_TAXONOMY: &[(&str, &[&str])] = &[
    (
        "Communication Services",
        &[
            "Diversified Telecommunication Services",
            "Entertainment",
            "Interactive Media & Services",
            "Media",
            "Wireless Telecommunication Services",
        ],
    ),
    (
        "Consumer Discretionary",
        &[
            "Auto Components",
            "Automobiles",
            "Distributors",
            "Diversified Consumer Services",
            "Hotels, Restaurants & Leisure",
            "Household Durables",
            "Internet & Direct Marketing Retail",
            "Leisure Products",
            "Multiline Retail",
            "Specialty Retail",
            "Textiles, Apparel & Luxury Goods",
        ],
    ),
    (
        "Consumer Staples",
        &[
            "Beverages",
            "Food & Staples Retailing",
            "Food Products",
            "Household Products",
            "Personal Products",
            "Tobacco",
        ],
    ),
    (
        "Energy",
        &["Energy Equipment & Services", "Oil, Gas & Consumable Fuels"],
    ),
    (
        "Financials",
        &[
            "Banks",
            "Capital Markets",
            "Consumer Finance",
            "Diversified Financial Services",
            "Insurance",
            "Mortgage Real Estate Investment Trusts (REITs)",
            "Thrifts & Mortgage Finance",
        ],
    ),
    (
        "Health Care",
        &[
            "Biotechnology",
            "Health Care Equipment & Supplies",
            "Health Care Providers & Services",
            "Health Care Technology",
            "Life Sciences Tools & Services",
            "Pharmaceuticals",
        ],
    ),
    (
        "Industrials",
        &[
            "Aerospace & Defense",
            "Air Freight & Logistics",
            "Airlines",
            "Building Products",
            "Commercial Services & Supplies",
            "Construction & Engineering",
            "Electrical Equipment",
            "Industrial Conglomerates",
            "Machinery",
            "Marine",
            "Professional Services",
            "Road & Rail",
            "Trading Companies & Distributors",
            "Transportation Infrastructure",
        ],
    ),
    (
        "Information Technology",
        &[
            "Communications Equipment",
            "Electronic Equipment, Instruments & Components",
            "IT Services",
            "Semiconductors & Semiconductor Equipment",
            "Software",
            "Technology Hardware, Storage & Peripherals",
        ],
    ),
    (
        "Materials",
        &[
            "Chemicals",
            "Construction Materials",
            "Containers & Packaging",
            "Metals & Mining",
            "Paper & Forest Products",
        ],
    ),
    (
        "Real Estate",
        &[
            "Equity Real Estate Investment Trusts (REITs)",
            "Real Estate Management & Development",
        ],
    ),
    (
        "Utilities",
        &[
            "Electric Utilities",
            "Gas Utilities",
            "Independent Power and Renewable Electricity Producers",
            "Multi-Utilities",
            "Water Utilities",
        ],
    ),
];

/// Canonical metric labels in insertion order.
pub const METRIC_NAMES: &[&str] = &[
    "PE Ratio",
    "EPS",
    "Debt to Equity",
    "Current Ratio",
    "Return on Equity",
    "Return on Assets",
];

pub(super) fn seed_reference_data(tx: &Transaction<'_>) -> DbResult<()> {
    let mut insert_sector = tx.prepare("INSERT INTO sectors (name) VALUES (?1);")?;
    let mut insert_industry =
        tx.prepare("INSERT INTO industries (name, sector_id) VALUES (?1, ?2);")?;
    for (sector, industries) in SECTOR_TAXONOMY {
        let sector_id = insert_sector.insert([sector])?;
        for industry in industries.iter() {
            insert_industry.execute(rusqlite::params![industry, sector_id])?;
        }
    }

    let mut insert_metric = tx.prepare("INSERT INTO metric_names (name) VALUES (?1);")?;
    for metric in METRIC_NAMES {
        insert_metric.execute([metric])?;
    }

    Ok(())
}
