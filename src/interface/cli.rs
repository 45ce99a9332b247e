//! Command-line interface

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;

use crate::application::{AuditOptions, AuditService};
use crate::config::Config;
use crate::domain::compliance::{CheckName, CompliancePolicy};
use crate::domain::report::ComplianceReport;
use crate::infrastructure::aws::{AwsClients, CloudTrailSource};
use crate::infrastructure::report::JsonReportWriter;
use crate::infrastructure::snapshot::SnapshotTrailSource;

/// Exit status when the audit ran but found non-compliant checks
pub const EXIT_NON_COMPLIANT: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "trail-audit", about = "Audit CloudTrail logging configuration for compliance")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, env = "TRAIL_AUDIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate every trail and write a JSON compliance report
    Audit(AuditArgs),

    /// Print the effective configuration as TOML
    ShowConfig,
}

#[derive(Args, Debug, Default)]
pub struct AuditArgs {
    /// Named AWS profile
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// AWS region
    #[arg(long)]
    pub region: Option<String>,

    /// Report filename (default: cloudtrail_compliance_report_<timestamp>.json)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Directory for the report
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Evaluate a saved JSON snapshot instead of calling AWS
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Account id to report for a snapshot without one
    #[arg(long, requires = "snapshot")]
    pub account_id: Option<String>,

    /// Run every known check
    #[arg(long, conflicts_with = "check")]
    pub all_checks: bool,

    /// Check to run (repeatable); replaces the configured list
    #[arg(long = "check", value_name = "NAME")]
    pub check: Vec<CheckName>,

    /// Abort on the first trail that cannot be fetched
    #[arg(long)]
    pub fail_fast: bool,
}

impl AuditArgs {
    /// Overlay command-line flags onto loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if self.profile.is_some() {
            config.aws.profile = self.profile.clone();
        }
        if self.region.is_some() {
            config.aws.region = self.region.clone();
        }
        if self.output.is_some() {
            config.report.filename = self.output.clone();
        }
        if self.output_dir.is_some() {
            config.report.output_dir = self.output_dir.clone();
        }
        if self.all_checks {
            config.audit.checks = CompliancePolicy::all().checks().collect();
        } else if !self.check.is_empty() {
            config.audit.checks = self.check.clone();
        }
        if self.fail_fast {
            config.audit.fail_fast = true;
        }
    }
}

pub async fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config =
        Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::ShowConfig => {
            print!("{}", config.to_toml().context("failed to render configuration")?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Audit(args) => {
            args.apply(&mut config);
            run_audit(&config, &args).await
        }
    }
}

async fn run_audit(config: &Config, args: &AuditArgs) -> anyhow::Result<ExitCode> {
    let options = AuditOptions {
        policy: config.policy(),
        fail_fast: config.audit.fail_fast,
    };

    let report = match &args.snapshot {
        Some(path) => {
            let source = SnapshotTrailSource::load(path).await?;
            let context = source.snapshot().context(args.account_id.as_deref())?;
            AuditService::new(&source, options).run(&context).await?
        }
        None => {
            let clients = AwsClients::connect(&config.aws_settings())
                .await
                .context("failed to connect to AWS")?;
            let source = CloudTrailSource::from_clients(&clients);
            AuditService::new(&source, options).run(&clients.context).await?
        }
    };

    let writer = JsonReportWriter::new().with_output_dir(config.report.output_dir.clone());
    let path = match writer.write(&report, config.report.filename.as_deref()).await {
        Ok(path) => path,
        Err(e) => {
            error!("Failed to write report, printing it instead: {}", e);
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Err(e.into());
        }
    };

    print!("{}", render_summary(&report, &path));

    if report.is_fully_compliant() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_NON_COMPLIANT))
    }
}

/// Human-readable summary printed after a run
pub fn render_summary(report: &ComplianceReport, path: &Path) -> String {
    let summary = &report.summary;
    let mut out = String::new();

    let _ = writeln!(out, "Account:          {}", report.account_id);
    let _ = writeln!(
        out,
        "Trails:           {} evaluated, {} skipped",
        summary.total_trails, summary.skipped_trails
    );

    for (trail_id, trail) in &report.trails {
        let _ = writeln!(out, "  {}", trail_id);
        for (name, check) in &trail.compliance_checks {
            let _ = writeln!(out, "    {:<22} {}", name.as_str(), check.status);
        }
    }
    for (trail_id, reason) in &report.skipped_trails {
        let _ = writeln!(out, "  {} (skipped: {})", trail_id, reason);
    }

    let _ = writeln!(out, "Compliant checks: {}", summary.compliant_checks);
    let _ = writeln!(out, "Non-compliant:    {}", summary.non_compliant_checks);
    let _ = writeln!(
        out,
        "Fully compliant:  {}",
        if summary.fully_compliant { "yes" } else { "no" }
    );
    let _ = writeln!(out, "Report:           {}", path.display());

    out
}
