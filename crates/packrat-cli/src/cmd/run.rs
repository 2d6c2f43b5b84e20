use packrat_core::commands::run;
use packrat_core::config::PackratConfig;
use packrat_core::notify::EmailNotifier;

pub(crate) fn run_pipeline(config: &PackratConfig) -> Result<(), Box<dyn std::error::Error>> {
    let notifier = EmailNotifier::new(config.email.clone());

    eprintln!("==> Starting backup run");
    let summary = run::run(config, &notifier)?;

    println!(
        "Archived {} sources to '{}'",
        summary.staged_sources,
        summary.archive.display()
    );
    if summary.source_failures > 0 {
        println!("{} sources could not be retrieved", summary.source_failures);
    }
    println!(
        "Rotation kept {} and deleted {} archives",
        summary.rotate.kept, summary.rotate.deleted
    );
    if !summary.rotate.failures.is_empty() {
        println!(
            "{} archives could not be deleted",
            summary.rotate.failures.len()
        );
    }

    Ok(())
}
