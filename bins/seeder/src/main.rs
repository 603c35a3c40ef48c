//! Database seeder for development and testing.
//!
//! Seeds the month-mapping tables, a demo company configuration, a
//! period-end exchange rate, sample price-index values, and a handful
//! of source assets for local runs.
//!
//! Usage: cargo run --bin seeder

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, Set};
use uuid::Uuid;

use safeharbor_db::entities::{
    company_configs, exchange_rates, inpc_disposal_months, inpc_fiscal_months, price_indices,
    source_assets,
};

/// Demo company id (consistent for all seeds).
const DEMO_COMPANY_ID: i32 = 122;
/// Fiscal year the sample data covers.
const DEMO_FISCAL_YEAR: i32 = 2024;
/// Country id of the sample index series (Mexico).
const DEMO_COUNTRY_ID: i32 = 1;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = safeharbor_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding month-mapping tables...");
    seed_month_maps(&db).await;

    println!("Seeding demo company...");
    seed_demo_company(&db).await;

    println!("Seeding period-end exchange rate...");
    seed_exchange_rate(&db).await;

    println!("Seeding sample price indices...");
    seed_price_indices(&db).await;

    println!("Seeding sample source assets...");
    seed_source_assets(&db).await;

    println!("Seeding complete!");
}

/// Disposal map is the identity; fiscal map sends December to June
/// (the annual Safe Harbor convention).
async fn seed_month_maps(db: &DatabaseConnection) {
    let existing = inpc_disposal_months::Entity::find()
        .count(db)
        .await
        .expect("Failed to count disposal month map");
    if existing > 0 {
        println!("  month maps already seeded, skipping");
        return;
    }

    let disposal = (1..=12).map(|month| inpc_disposal_months::ActiveModel {
        month: Set(month),
        index_month: Set(month),
    });
    inpc_disposal_months::Entity::insert_many(disposal)
        .exec(db)
        .await
        .expect("Failed to seed disposal month map");

    let fiscal = inpc_fiscal_months::ActiveModel {
        month: Set(12),
        index_month: Set(6),
    };
    inpc_fiscal_months::Entity::insert(fiscal)
        .exec(db)
        .await
        .expect("Failed to seed fiscal month map");
}

async fn seed_demo_company(db: &DatabaseConnection) {
    let existing = company_configs::Entity::find_by_id(DEMO_COMPANY_ID)
        .one(db)
        .await
        .expect("Failed to query demo company");
    if existing.is_some() {
        println!("  demo company already seeded, skipping");
        return;
    }

    let now = chrono::Utc::now().into();
    let company = company_configs::ActiveModel {
        company_id: Set(DEMO_COMPANY_ID),
        name: Set("Demo Manufacturing SA de CV".to_string()),
        source_url: Set("postgres://localhost/safeharbor".to_string()),
        custom_query: Set(None),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };
    company_configs::Entity::insert(company)
        .exec(db)
        .await
        .expect("Failed to seed demo company");
}

async fn seed_exchange_rate(db: &DatabaseConnection) {
    let existing = exchange_rates::Entity::find_by_id(DEMO_FISCAL_YEAR)
        .one(db)
        .await
        .expect("Failed to query exchange rate");
    if existing.is_some() {
        println!("  exchange rate already seeded, skipping");
        return;
    }

    let rate = exchange_rates::ActiveModel {
        fiscal_year: Set(DEMO_FISCAL_YEAR),
        effective_date: Set(NaiveDate::from_ymd_opt(DEMO_FISCAL_YEAR, 6, 30)
            .expect("valid period-end date")),
        rate: Set(dec!(18.25)),
        created_at: Set(chrono::Utc::now().into()),
    };
    exchange_rates::Entity::insert(rate)
        .exec(db)
        .await
        .expect("Failed to seed exchange rate");
}

/// A flat sample series: 2020-2024, each month slightly above the last.
async fn seed_price_indices(db: &DatabaseConnection) {
    let existing = price_indices::Entity::find()
        .count(db)
        .await
        .expect("Failed to count price indices");
    if existing > 0 {
        println!("  price indices already seeded, skipping");
        return;
    }

    let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
    let mut values = Vec::new();
    let mut value = dec!(100.000);
    for year in 2020..=DEMO_FISCAL_YEAR {
        for month in 1..=12 {
            values.push(price_indices::ActiveModel {
                id: Set(Uuid::new_v4()),
                year: Set(year),
                month: Set(month),
                country_id: Set(DEMO_COUNTRY_ID),
                simulation_group: Set(None),
                value: Set(value),
                published_at: Set(now),
            });
            value += dec!(0.450);
        }
    }
    price_indices::Entity::insert_many(values)
        .exec(db)
        .await
        .expect("Failed to seed price indices");
}

async fn seed_source_assets(db: &DatabaseConnection) {
    let existing = source_assets::Entity::find()
        .count(db)
        .await
        .expect("Failed to count source assets");
    if existing > 0 {
        println!("  source assets already seeded, skipping");
        return;
    }

    let assets = vec![
        // Prior-year asset, in service all year.
        asset(1, 2021, 3, None, false, false, dec!(250000), dec!(10)),
        // Acquired within the fiscal year.
        asset(2, DEMO_FISCAL_YEAR, 4, None, false, false, dec!(80000), dec!(25)),
        // Disposed within the fiscal year.
        asset(
            3,
            2020,
            7,
            Some((DEMO_FISCAL_YEAR, 7)),
            false,
            false,
            dec!(120000),
            dec!(10),
        ),
        // Reexpressed basis, converted at the period-end rate.
        asset(4, 2022, 1, None, false, true, dec!(15000), dec!(30)),
        // Both costing flags set: dropped with a warning during staging.
        asset(5, 2022, 5, None, true, true, dec!(60000), dec!(10)),
    ];
    source_assets::Entity::insert_many(assets)
        .exec(db)
        .await
        .expect("Failed to seed source assets");
}

#[allow(clippy::too_many_arguments)]
fn asset(
    number: i64,
    acquired_year: i32,
    acquired_month: u32,
    disposed: Option<(i32, u32)>,
    fiscal_basis: bool,
    reexpressed_basis: bool,
    cost: rust_decimal::Decimal,
    annual_rate: rust_decimal::Decimal,
) -> source_assets::ActiveModel {
    let disposed_on = disposed
        .map(|(year, month)| NaiveDate::from_ymd_opt(year, month, 15).expect("valid disposal date"));
    source_assets::ActiveModel {
        id: Set(number),
        company_id: Set(DEMO_COMPANY_ID),
        asset_number: Set(number),
        asset_tag: Set(Some(format!("DEMO-{number:04}"))),
        asset_type_id: Set(1),
        asset_subtype_id: Set(None),
        asset_type_name: Set(Some("Maquinaria y equipo".to_string())),
        description: Set(Some(format!("Demo asset {number}"))),
        currency_id: Set(Some(1)),
        currency_name: Set(Some("MXN".to_string())),
        country_id: Set(DEMO_COUNTRY_ID),
        country_name: Set(Some("Mexico".to_string())),
        acquired_on: Set(NaiveDate::from_ymd_opt(acquired_year, acquired_month, 1)),
        disposed_on: Set(disposed_on),
        status: Set(if disposed_on.is_some() {
            "disposed".to_string()
        } else {
            "active".to_string()
        }),
        owned: Set(true),
        fiscal_basis: Set(fiscal_basis),
        reexpressed_basis: Set(reexpressed_basis),
        acquisition_cost: Set(Some(cost)),
        revalued_cost: Set(None),
        reexpressed_cost: Set(if reexpressed_basis { Some(cost) } else { None }),
        annual_rate: Set(Some(annual_rate)),
        prior_accumulated_depreciation: Set(Some(dec!(0))),
    }
}
