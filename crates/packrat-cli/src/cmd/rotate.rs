use std::path::Path;

use packrat_core::commands::rotate;
use packrat_core::config::PackratConfig;

pub(crate) fn run_rotate(
    config: &PackratConfig,
    dry_run: bool,
    list: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (stats, list_entries) = rotate::run(Path::new(&config.store_dir), dry_run)?;

    if list || dry_run {
        for entry in &list_entries {
            println!("{:<6} {}  [{}]", entry.action, entry.name, entry.bucket);
        }
        println!();
    }

    if dry_run {
        println!(
            "Dry run: would keep {} and delete {} archives",
            stats.kept, stats.deleted,
        );
    } else {
        println!("Deleted {} archives (kept {})", stats.deleted, stats.kept);
        for failure in &stats.failures {
            eprintln!("Warning: could not delete {}: {}", failure.name, failure.message);
        }
    }

    Ok(())
}
