//! Definition validation command

use anyhow::{Context, Result};
use arcade_ecs::ArcadeWorld;
use arcade_factory::{EntityFactory, FactoryConfig};

/// Validation outcome for one archetype
struct Report {
    archetype: String,
    /// Parse or resolution failure
    error: Option<String>,
    issues: Vec<String>,
    attached: usize,
}

impl Report {
    fn is_valid(&self) -> bool {
        self.error.is_none() && self.issues.is_empty()
    }
}

pub fn run(config: &FactoryConfig, format: &str) -> Result<()> {
    let mut factory: EntityFactory<ArcadeWorld> = EntityFactory::new(config);
    let names = factory
        .locator()
        .finder()
        .archetypes()
        .context("Failed to scan definitions directory")?;

    if names.is_empty() {
        println!("No definitions found in {}", config.definitions_dir.display());
        return Ok(());
    }

    // Every definition is spawned into a scratch world so field errors surface too
    let mut world = ArcadeWorld::new();
    let reports: Vec<Report> = names
        .into_iter()
        .map(|name| match factory.parse(&name) {
            Ok(definition) => {
                let spawned = factory.spawn_definition(&definition, &mut world);
                Report {
                    archetype: name,
                    error: None,
                    issues: spawned.issues.iter().map(|i| i.to_string()).collect(),
                    attached: spawned.attached.len(),
                }
            }
            Err(err) => Report {
                archetype: name,
                error: Some(err.to_string()),
                issues: Vec::new(),
                attached: 0,
            },
        })
        .collect();

    if format == "json" {
        print_reports_json(&reports)?;
    } else {
        print_reports_text(&reports);
    }

    if reports.iter().any(|r| !r.is_valid()) {
        std::process::exit(1);
    }

    Ok(())
}

fn print_reports_text(reports: &[Report]) {
    let failed = reports.iter().filter(|r| !r.is_valid()).count();

    for report in reports {
        if let Some(err) = &report.error {
            println!("  [FAIL] {}: {}", report.archetype, err);
        } else if report.issues.is_empty() {
            println!("  [ OK ] {} ({} components)", report.archetype, report.attached);
        } else {
            println!(
                "  [WARN] {} ({} components, {} skipped)",
                report.archetype,
                report.attached,
                report.issues.len()
            );
            for issue in &report.issues {
                println!("         {}", issue);
            }
        }
    }

    println!();
    if failed == 0 {
        println!("All {} definitions valid.", reports.len());
    } else {
        println!("{} of {} definitions have problems.", failed, reports.len());
    }
}

fn print_reports_json(reports: &[Report]) -> Result<()> {
    let entries: Vec<serde_json::Value> = reports
        .iter()
        .map(|r| {
            serde_json::json!({
                "archetype": r.archetype,
                "valid": r.is_valid(),
                "error": r.error,
                "attached": r.attached,
                "issues": r.issues,
            })
        })
        .collect();

    let output = serde_json::json!({
        "valid": reports.iter().all(|r| r.is_valid()),
        "definitions": entries,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
