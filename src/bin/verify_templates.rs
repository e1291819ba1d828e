use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use colored::*;

use gesture_cmd::classifier::GestureClassifier;
use gesture_cmd::config::AppConfig;
use gesture_cmd::templates::TemplateLibrary;

// Reports, per template, the error against every other template. Useful when
// picking a tolerance: the diagonal is zero and the nearest other gesture must
// stay above the tolerance.
fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(AppConfig::PATH));

    let config = AppConfig::load(&config_path)?;
    let templates = TemplateLibrary::load(
        &config.templates.data_path,
        &config.templates.names_path,
        config.classifier.landmark_count,
    )
    .context("Failed to load gesture templates")?;

    let classifier = GestureClassifier::from_config(&config.classifier);
    let nodes = classifier.node_subset();

    println!("Templates: {}  Tolerance: {}", templates.len(), classifier.tolerance());
    print!("{:<14}", "");
    for t in templates.iter() {
        print!("{:>12}", t.name);
    }
    println!();

    for a in templates.iter() {
        print!("{:<14}", a.name);
        for b in templates.iter() {
            let error = a.descriptor.error_against(&b.descriptor, nodes);
            let cell = format!("{:>12.2}", error);
            if std::ptr::eq(a, b) {
                print!("{}", cell.dimmed());
            } else if error < classifier.tolerance() {
                print!("{}", cell.red());
            } else {
                print!("{}", cell);
            }
        }
        println!();
    }

    let mismatches = templates.verify(&classifier);
    if !mismatches.is_empty() {
        for m in &mismatches {
            println!("{}", format!("#{} {:?} classified as {}", m.index, m.expected, m.got).red());
        }
        bail!("{} templates failed verification", mismatches.len());
    }

    println!("{}", "Every template classifies as itself.".green());
    Ok(())
}
