use clap::{Parser, Subcommand, ValueEnum};
use medtrack_core::auth::{Sha256Credentials, SignedTokenService};
use medtrack_core::seed::{DemoSeeder, DEMO_PASSWORD};
use medtrack_core::services::pharmacy::PharmacyService;
use medtrack_core::{DoctorDocument, PatientDocument, Store};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "medtrack")]
#[command(about = "MedTrack medication tracker CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum TemplateKind {
    Doctor,
    Patient,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a blank record document
    Template {
        /// Which document
        #[arg(value_enum)]
        kind: TemplateKind,
    },
    /// Seed the demo data into a scratch store and summarise it
    Demo,
    /// Show which demo pharmacies stock a medicine
    Availability {
        /// Medicine name, matched ignoring case
        medicine: String,
    },
    /// Generate a PKCS#8 PEM signing key for bearer tokens
    GenerateKey,
}

fn demo_store() -> Result<Arc<Store>, Box<dyn std::error::Error>> {
    let store = Arc::new(Store::new());
    DemoSeeder::new(store.clone(), Arc::new(Sha256Credentials)).run()?;
    Ok(store)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Template { kind }) => {
            let json = match kind {
                TemplateKind::Doctor => {
                    serde_json::to_string_pretty(&DoctorDocument::template(None, "", ""))?
                }
                TemplateKind::Patient => {
                    serde_json::to_string_pretty(&PatientDocument::template(0, "", "", None))?
                }
            };
            println!("{json}");
        }
        Some(Commands::Demo) => {
            let store = demo_store()?;
            let summary = store.read(|t| {
                vec![
                    ("hospitals", t.hospitals.len()),
                    ("users", t.users.len()),
                    ("patient records", t.patient_records.len()),
                    ("doctor profiles", t.doctor_profiles.len()),
                    ("pharmacies", t.pharmacies.len()),
                    ("inventory items", t.inventory.len()),
                    ("deliveries", t.deliveries.len()),
                    ("catalogue medicines", t.medicines.len()),
                ]
            })?;
            for (name, count) in summary {
                println!("{name}: {count}");
            }
            println!("All demo accounts use the password: {DEMO_PASSWORD}");
        }
        Some(Commands::Availability { medicine }) => {
            let store = demo_store()?;
            let tokens = Arc::new(SignedTokenService::generate(
                medtrack_core::CoreConfig::default().token_ttl(),
            ));
            let pharmacies = PharmacyService::new(store, Arc::new(Sha256Credentials), tokens);
            let found = pharmacies.availability(&medicine)?;
            if found.is_empty() {
                println!("No pharmacy stocks {medicine}.");
            } else {
                for item in found {
                    println!(
                        "{} ({}): {} {} x{}",
                        item.pharmacy_name,
                        item.pharmacy_location,
                        item.medicine_name,
                        item.dosage.unwrap_or_default(),
                        item.quantity
                    );
                }
            }
        }
        Some(Commands::GenerateKey) => match SignedTokenService::generate_pkcs8_pem() {
            Ok(pem) => print!("{pem}"),
            Err(e) => eprintln!("Error generating signing key: {}", e),
        },
        None => {
            println!("Use 'medtrack --help' for commands");
        }
    }

    Ok(())
}
