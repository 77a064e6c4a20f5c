use api_shared::ListSectionsRes;
use clap::{Parser, Subcommand};
use refiner_core::constants::DEFAULT_TCR_URL;
use refiner_core::{CoreConfig, RefinerService};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "refiner")]
#[command(about = "eCR message refiner CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Refine an eICR document and print the result
    Refine {
        /// Path to the eICR XML file
        file: PathBuf,
        /// Section LOINC codes to keep (comma-separated)
        #[arg(long)]
        sections: Option<String>,
        /// Condition codes whose related entries should be kept (comma-separated)
        #[arg(long)]
        conditions: Option<String>,
        /// Base address of the Reference Lookup Service
        #[arg(long, env = "TCR_URL", default_value = DEFAULT_TCR_URL)]
        tcr_url: String,
    },
    /// List the recognised section codes
    Sections,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Refine {
            file,
            sections,
            conditions,
            tcr_url,
        }) => {
            let message = std::fs::read(&file)?;
            let service = RefinerService::new(&CoreConfig::new(&tcr_url, None)?)?;

            let runtime = tokio::runtime::Runtime::new()?;
            match runtime.block_on(service.refine_ecr(
                &message,
                sections.as_deref(),
                conditions.as_deref(),
            )) {
                Ok(refined) => println!("{}", refined),
                Err(e) => {
                    eprintln!("Error refining {} ({}): {}", file.display(), e.kind(), e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Sections) => {
            for section in ListSectionsRes::all().sections {
                println!("{}  {}", section.code, section.display_name);
            }
        }
        None => {
            println!("Use 'refiner --help' for commands");
        }
    }

    Ok(())
}
