//! Amalgamation commands: build, order, deps

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::debug;

use super::output::Output;
use crate::domain::Amalgamator;
use crate::storage::{Artifact, BuildConfig, FsSource, Overrides};

/// Where the fragment list comes from
#[derive(Args, Debug, Clone, Default)]
pub struct FragmentArgs {
    /// Fragment paths in declaration order (overrides the manifest)
    pub fragments: Vec<String>,

    /// Directory fragment paths are relative to
    #[arg(long, short = 'b')]
    pub base_dir: Option<PathBuf>,

    /// Manifest to load instead of discovering amalgam.toml
    #[arg(long, short = 'c', env = "AMALGAM_CONFIG")]
    pub config: Option<PathBuf>,
}

impl FragmentArgs {
    fn resolve(&self, output: Option<PathBuf>) -> Result<BuildConfig> {
        let cwd = std::env::current_dir().context("Failed to determine current directory")?;
        let overrides = Overrides {
            fragment_paths: self.fragments.clone(),
            base_dir: self.base_dir.clone(),
            output,
        };

        let config = BuildConfig::load(self.config.as_deref(), overrides, &cwd)?;
        debug!(
            manifest = ?config.manifest,
            base_dir = %config.base_dir.display(),
            fragments = config.fragment_paths.len(),
            "resolved build configuration"
        );
        Ok(config)
    }
}

#[derive(Serialize)]
struct BuildSummary<'a> {
    output: String,
    order: &'a [String],
}

/// Rebuilds the output artifact
pub fn build(output: &Output, args: &FragmentArgs, out_path: Option<PathBuf>) -> Result<()> {
    let config = args.resolve(out_path)?;
    let source = FsSource::new();

    let amalgamation = Amalgamator::new(&source).run(&config.base_dir, &config.fragment_paths)?;

    let artifact = Artifact::new(&config.output);
    artifact.write(amalgamation.text())?;

    if output.is_json() {
        output.data(&BuildSummary {
            output: artifact.path().display().to_string(),
            order: amalgamation.order(),
        });
    } else {
        output.success(&format!(
            "All {} fragments have been concatenated into {}",
            amalgamation.order().len(),
            artifact.path().display()
        ));
    }

    Ok(())
}

/// Prints the resolved fragment order
pub fn order(output: &Output, args: &FragmentArgs) -> Result<()> {
    let config = args.resolve(None)?;
    let source = FsSource::new();

    let order = Amalgamator::new(&source).order(&config.base_dir, &config.fragment_paths)?;

    if output.is_json() {
        output.data(&order);
    } else {
        for (position, fragment) in order.iter().enumerate() {
            output.row(&[(position + 1).to_string().as_str(), fragment.as_str()]);
        }
    }

    Ok(())
}

/// Prints each fragment's local dependencies and external includes
pub fn deps(output: &Output, args: &FragmentArgs) -> Result<()> {
    let config = args.resolve(None)?;
    let source = FsSource::new();

    let reports = Amalgamator::new(&source).inspect(&config.base_dir, &config.fragment_paths)?;

    if output.is_json() {
        output.data(&reports);
        return Ok(());
    }

    for report in &reports {
        output.row(&[report.fragment.as_str()]);
        for dependency in &report.dependencies {
            output.row(&["", "local", dependency.as_str()]);
        }
        for external in &report.external {
            output.row(&["", "external", external.as_str()]);
        }
    }

    Ok(())
}
