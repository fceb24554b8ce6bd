//! Inspection commands (features, check)

use anyhow::{Context, Result};
use bizcast_core::{
    AssistantConfig, DirectoryRecordStore, Error, InferencePipeline, RecordSource,
    TemporalAggregator, TimeWindow,
};
use chrono::Local;

use super::format_amount;

pub fn cmd_features(config: &AssistantConfig, window: TimeWindow) -> Result<()> {
    let aggregator = TemporalAggregator::new(DirectoryRecordStore::new(&config.records_dir));
    let now = Local::now().naive_local();

    println!();
    println!("🧮 Features for {}", window.label());
    println!("   Records: {}", config.records_dir.display());
    println!("   As of:   {}", now.format("%Y-%m-%d %H:%M"));
    println!("   ─────────────────────────────────────────────────────────────");

    let summary = match aggregator.summarize_at(window, now) {
        Ok(summary) => summary,
        Err(e @ Error::NoMatchingData { .. }) => {
            println!("   {}", e);
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to aggregate records"),
    };

    let f = &summary.features;
    println!(
        "   Mean income:   {} {}",
        config.currency_symbol,
        format_amount(f.mean_income, 2)
    );
    println!(
        "   Mean expense:  {} {}",
        config.currency_symbol,
        format_amount(f.mean_expense, 2)
    );
    println!(
        "   Mean hour:     {:.4} (≈{})",
        f.mean_normalized_hour,
        format_clock(f.mean_normalized_hour)
    );
    println!();
    println!("   Matched: {}", summary.matched);
    if summary.skipped > 0 || summary.skipped_files > 0 {
        println!(
            "   Skipped: {} malformed records, {} unreadable files",
            summary.skipped, summary.skipped_files
        );
    }

    Ok(())
}

/// Clock time for a fraction of a day, rounded to the minute
pub fn format_clock(day_fraction: f64) -> String {
    let minutes = (day_fraction.clamp(0.0, 1.0) * 1440.0).round() as u32;
    format!("{:02}:{:02}", (minutes / 60) % 24, minutes % 60)
}

pub fn cmd_check(config: &AssistantConfig) -> Result<()> {
    println!();
    println!("🔎 bizcast Check");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Model:         {}", config.model_path.display());
    println!("   Normalization: {}", config.normalization_path.display());

    let pipeline = InferencePipeline::load(&config.model_path, &config.normalization_path)
        .context("Failed to load model artifacts")?;
    let model = pipeline.model();
    println!(
        "   Version:       {}",
        model.version().unwrap_or("(unversioned)")
    );
    println!("   Topology:      {:?}", model.topology());
    if let Some(fingerprint) = model.fingerprint() {
        println!("   SHA-256:       {}", fingerprint);
    }
    let pinned = pipeline.normalization().model_sha256.is_some();
    println!(
        "   Pinned:        {}",
        if pinned { "yes" } else { "no (model_sha256 not set)" }
    );

    println!();
    println!("   Records:       {}", config.records_dir.display());
    let scan = DirectoryRecordStore::new(&config.records_dir)
        .scan()
        .context("Failed to read records")?;
    println!("   Valid:         {}", scan.valid().count());
    println!("   Malformed:     {}", scan.invalid_count());
    for path in &scan.skipped_files {
        println!("   ⚠️  Unreadable: {}", path.display());
    }

    println!();
    println!("✅ Ready");
    Ok(())
}
