use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use resorg::{DiagnosticSink, Error, ResourceStore, StderrSink};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Accumulate resources into the store from files, directories, or other
    /// store databases.
    Add {
        /// The store database to update (created if missing)
        #[arg(long, default_value = "resources.db")]
        db: PathBuf,

        /// Resource files, directories, or store databases to add
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Remove every input's resources from the store.
    Subtract {
        /// The store database to update (must exist)
        #[arg(long, default_value = "resources.db")]
        db: PathBuf,

        /// Resource files, directories, or store databases to subtract
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Keep only resources also present in every input.
    Intersect {
        /// The store database to update (must exist)
        #[arg(long, default_value = "resources.db")]
        db: PathBuf,

        /// Resource files, directories, or store databases to intersect with
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Export the store as a zip archive of resx files, one base file plus
    /// one file per language.
    Export {
        /// The store database to export
        #[arg(long, default_value = "resources.db")]
        db: PathBuf,

        /// The archive to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Summarize the store, or list its invariant keys.
    View {
        /// The store database to inspect
        #[arg(long, default_value = "resources.db")]
        db: PathBuf,

        /// List every invariant key instead of the per-file summary
        #[arg(long)]
        keys: bool,
    },
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args.commands) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), Error> {
    let mut sink = StderrSink;
    match command {
        Commands::Add { db, inputs } => {
            let mut store = read_store_or_empty(&db, &mut sink)?;
            for input in &inputs {
                store = store.add(&ResourceStore::read_from(input, &mut sink)?);
            }
            store.save_atomic(&db, &mut sink)
        }
        Commands::Subtract { db, inputs } => {
            let mut store = ResourceStore::read_from(&db, &mut sink)?;
            for input in &inputs {
                store = store.subtract(&ResourceStore::read_from(input, &mut sink)?);
            }
            store.save_atomic(&db, &mut sink)
        }
        Commands::Intersect { db, inputs } => {
            let mut store = ResourceStore::read_from(&db, &mut sink)?;
            for input in &inputs {
                store = store.intersect(&ResourceStore::read_from(input, &mut sink)?);
            }
            store.save_atomic(&db, &mut sink)
        }
        Commands::Export { db, output } => {
            let store = ResourceStore::read_from(&db, &mut sink)?;
            store.export(&output)
        }
        Commands::View { db, keys } => {
            let store = ResourceStore::read_from(&db, &mut sink)?;
            print_view(&store, keys);
            Ok(())
        }
    }
}

// The add verb may start from a fresh store; everything else requires an
// existing database.
fn read_store_or_empty(
    path: &Path,
    sink: &mut dyn DiagnosticSink,
) -> Result<ResourceStore, Error> {
    if path.exists() {
        ResourceStore::read_from(path, sink)
    } else {
        Ok(ResourceStore::new())
    }
}

fn print_view(store: &ResourceStore, keys: bool) {
    if keys {
        for key in store.all_keys() {
            println!("{}", key);
        }
        return;
    }
    for file in store.files() {
        let languages: Vec<String> = file.languages().into_iter().collect();
        if languages.is_empty() {
            println!("{}: {} entries", file.relative_path, file.len());
        } else {
            println!(
                "{}: {} entries ({})",
                file.relative_path,
                file.len(),
                languages.join(", ")
            );
        }
    }
    println!(
        "{} files, {} distinct resources",
        store.len(),
        store.all_keys().len()
    );
}
