//! Coalesce seed-data generator.
//!
//! Writes two overlapping CSV exports — a CRM-style file and an ERP-style
//! file with different column names — where the shared customers carry
//! realistic variations (typos, formatting drift, missing fields). Useful
//! for demoing the matching engine end to end.

use anyhow::Context;
use clap::Parser;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "coalesce-seed")]
#[command(about = "Generate overlapping CRM/ERP CSV exports with planted duplicates")]
#[command(version)]
struct Cli {
    /// Directory the CSV files are written to
    #[arg(long, default_value = "./seed-data")]
    output_dir: PathBuf,

    /// RNG seed, for reproducible files
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Debug, Clone, Default)]
struct Customer {
    company_name: String,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    address_line1: String,
    city: String,
    state: String,
    postal_code: String,
    country: String,
    tax_id: String,
    website: String,
}

macro_rules! customer {
    ($company:expr, $first:expr, $last:expr, $email:expr, $phone:expr,
     $address:expr, $city:expr, $state:expr, $postal:expr, $country:expr,
     $tax:expr, $web:expr) => {
        Customer {
            company_name: $company.into(),
            first_name: $first.into(),
            last_name: $last.into(),
            email: $email.into(),
            phone: $phone.into(),
            address_line1: $address.into(),
            city: $city.into(),
            state: $state.into(),
            postal_code: $postal.into(),
            country: $country.into(),
            tax_id: $tax.into(),
            website: $web.into(),
        }
    };
}

/// Customers present in both exports (the planted duplicates).
fn base_customers() -> Vec<Customer> {
    vec![
        customer!(
            "Acme Corporation", "John", "Smith", "john.smith@acme.com", "+1-555-0101",
            "123 Main Street", "New York", "NY", "10001", "USA",
            "12-3456789", "https://www.acme.com"
        ),
        customer!(
            "TechVentures Inc", "Sarah", "Johnson", "s.johnson@techventures.io", "+1-555-0202",
            "456 Innovation Drive", "San Francisco", "CA", "94105", "USA",
            "98-7654321", "https://techventures.io"
        ),
        customer!(
            "Global Solutions BV", "Erik", "van der Berg", "erik@globalsolutions.nl",
            "+31-20-555-0303", "Keizersgracht 123", "Amsterdam", "North Holland", "1015 AA",
            "Netherlands", "NL123456789B01", "https://www.globalsolutions.nl"
        ),
        customer!(
            "DataFlow Systems", "Maria", "Garcia", "maria.garcia@dataflow.com", "+1-555-0404",
            "789 Tech Park Blvd", "Austin", "TX", "73301", "USA",
            "45-6789012", "https://dataflow.com"
        ),
        customer!(
            "Nordic Consulting AS", "Lars", "Andersen", "lars.andersen@nordic-consulting.no",
            "+47-22-555-0505", "Storgata 45", "Oslo", "Oslo", "0155", "Norway",
            "NO987654321MVA", "https://nordic-consulting.no"
        ),
        customer!(
            "Bright Industries Ltd", "James", "Wilson", "j.wilson@brightindustries.co.uk",
            "+44-20-555-0606", "10 Downing Lane", "London", "Greater London", "EC1A 1BB",
            "United Kingdom", "GB123456789", "https://www.brightindustries.co.uk"
        ),
    ]
}

fn unique_crm_customers() -> Vec<Customer> {
    vec![
        customer!(
            "Pacific Rim Trading", "Yuki", "Tanaka", "yuki@pacificrim.co.jp", "+81-3-555-0909",
            "1-2-3 Shibuya", "Tokyo", "Tokyo", "150-0002", "Japan",
            "JP1234567890", "https://pacificrim.co.jp"
        ),
        customer!(
            "Maple Leaf Services", "Claire", "Tremblay", "claire@mapleleaf.ca", "+1-416-555-1010",
            "200 Bay Street", "Toronto", "ON", "M5J 2J5", "Canada",
            "CA123456789", "https://mapleleaf.ca"
        ),
    ]
}

fn unique_erp_customers() -> Vec<Customer> {
    vec![
        customer!(
            "Outback Solutions Pty Ltd", "Jack", "Roberts", "jack@outbacksolutions.com.au",
            "+61-2-555-1111", "50 George Street", "Sydney", "NSW", "2000", "Australia",
            "AU12345678901", "https://outbacksolutions.com.au"
        ),
        customer!(
            "Sahara Logistics", "Ahmed", "Hassan", "ahmed@saharalogistics.ae", "+971-4-555-1212",
            "Sheikh Zayed Road, Tower 3", "Dubai", "Dubai", "12345", "UAE",
            "AE100123456", "https://saharalogistics.ae"
        ),
    ]
}

/// Slightly different rendition of a customer, as a second system would
/// hold it: formatting drift, a typo, a dropped field.
fn create_variation(customer: &Customer, rng: &mut StdRng) -> Customer {
    let mut varied = customer.clone();
    let mut kinds: Vec<u8> = (0..6).collect();
    kinds.shuffle(rng);
    for kind in kinds.into_iter().take(rng.gen_range(1..=3)) {
        match kind {
            0 => {
                varied.company_name = match rng.gen_range(0..3) {
                    0 => varied.company_name.to_uppercase(),
                    1 => format!("{} ", varied.company_name),
                    _ => varied
                        .company_name
                        .replace("Inc", "Incorporated")
                        .replace("Ltd", "Limited")
                        .replace("BV", "B.V."),
                };
            }
            1 => {
                varied.phone = varied.phone.replace('-', " ").replace('+', "00");
            }
            2 => {
                varied.address_line1 = varied
                    .address_line1
                    .replace("Street", "St.")
                    .replace("Drive", "Dr.")
                    .replace("Avenue", "Ave.");
            }
            3 => {
                // Drop one character from longer first names.
                if varied.first_name.len() > 3 {
                    let cut = rng.gen_range(1..varied.first_name.len() - 1);
                    varied.first_name.remove(cut);
                }
            }
            4 => {
                varied.website = varied
                    .website
                    .replace("https://www.", "http://")
                    .replace("https://", "");
            }
            _ => {
                match rng.gen_range(0..3) {
                    0 => varied.address_line1.clear(),
                    1 => varied.phone.clear(),
                    _ => varied.website.clear(),
                }
            }
        }
    }
    varied
}

fn write_export(
    path: &Path,
    headers: &[&str],
    customers: &[Customer],
) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    writer.write_record(headers)?;
    for c in customers {
        writer.write_record([
            &c.company_name,
            &c.first_name,
            &c.last_name,
            &c.email,
            &c.phone,
            &c.address_line1,
            &c.city,
            &c.state,
            &c.postal_code,
            &c.country,
            &c.tax_id,
            &c.website,
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coalesce_seed=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut rng = StdRng::seed_from_u64(cli.seed);

    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("create {}", cli.output_dir.display()))?;

    // CRM export: base customers plus CRM-only ones, tidy column names.
    let mut crm: Vec<Customer> = base_customers();
    crm.extend(unique_crm_customers());
    crm.shuffle(&mut rng);
    let crm_path = cli.output_dir.join("crm_export.csv");
    write_export(
        &crm_path,
        &[
            "Company", "First Name", "Last Name", "Email", "Phone", "Address", "City", "State",
            "Zip Code", "Country", "Tax ID", "Website",
        ],
        &crm,
    )?;

    // ERP export: varied renditions of the base customers plus ERP-only
    // ones, legacy column names.
    let mut erp: Vec<Customer> = base_customers()
        .iter()
        .map(|c| create_variation(c, &mut rng))
        .collect();
    erp.extend(unique_erp_customers());
    erp.shuffle(&mut rng);
    let erp_path = cli.output_dir.join("erp_export.csv");
    write_export(
        &erp_path,
        &[
            "organization", "givenname", "surname", "mail", "telephone", "street", "town",
            "province", "postcode", "nation", "vat_number", "url",
        ],
        &erp,
    )?;

    info!(
        crm = %crm_path.display(),
        erp = %erp_path.display(),
        crm_rows = crm.len(),
        erp_rows = erp.len(),
        "Seed data written"
    );
    Ok(())
}
