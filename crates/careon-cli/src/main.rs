mod plot;
mod report;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use careon_lib::{
    chart::trend_figure,
    client::HttpPortalClient,
    config::PortalConfig,
    history::summarize,
    result::{normalize, RawAnalysis},
    IdentityField, Session, Slot, StagedFile, Workflow,
};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;

#[derive(Parser)]
#[command(
    name = "careon",
    version,
    about = "CareOn: neuro-cardiac diagnostic portal client"
)]
struct Cli {
    /// Portal config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the analysis service base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Logging verbosity (e.g., debug, info, warn)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct Credentials {
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    password: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account with the analysis service
    Register {
        #[arg(long, default_value = "")]
        full_name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        age: String,
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Upload diagnostic strips/scans and print the risk assessment
    Analyze {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        ecg: Option<PathBuf>,
        #[arg(long)]
        eeg: Option<PathBuf>,
        #[arg(long)]
        mri_baseline: Option<PathBuf>,
        #[arg(long)]
        mri_current: Option<PathBuf>,
        /// Print the normalized result as JSON instead of a report
        #[arg(long)]
        json: bool,
        /// Render the risk forecast to a PNG
        #[arg(long)]
        chart: Option<PathBuf>,
    },
    /// List previous analyses for the account
    History {
        #[command(flatten)]
        credentials: Credentials,
        /// Export the records as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Render the risk forecast of a saved analysis response to a PNG
    TrendPlot {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    match cli.command {
        Commands::TrendPlot { input, out } => cmd_trend_plot(&input, &out),
        Commands::Register {
            full_name,
            email,
            age,
            password,
        } => {
            let workflow = connect(cli.config.as_deref(), cli.base_url)?;
            let mut session = Session::new();
            session.set_field(IdentityField::FullName, &full_name)?;
            session.set_field(IdentityField::Email, &email)?;
            session.set_field(IdentityField::Age, &age)?;
            session.set_field(IdentityField::Password, &password)?;
            workflow.toggle_auth_mode(&mut session);
            let outcome = workflow.submit_registration(&mut session).await;
            report::print_notice(&session);
            outcome?;
            Ok(())
        }
        Commands::Analyze {
            credentials,
            ecg,
            eeg,
            mri_baseline,
            mri_current,
            json,
            chart,
        } => {
            let workflow = connect(cli.config.as_deref(), cli.base_url)?;
            let mut session = Session::new();
            sign_in(&workflow, &mut session, &credentials)?;
            for (slot, path) in [
                (Slot::EcgStrip, ecg),
                (Slot::EegStrip, eeg),
                (Slot::MriBaseline, mri_baseline),
                (Slot::MriCurrent, mri_current),
            ] {
                if let Some(path) = path {
                    session.stage_file(slot, StagedFile::from_path(&path)?);
                }
            }
            let outcome = workflow.submit_analysis(&mut session).await;
            report::print_notice(&session);
            outcome?;
            let result = session
                .result()
                .ok_or_else(|| anyhow!("analysis settled without a result"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(result)?);
            } else {
                report::print_result(result);
            }
            if let Some(out) = chart {
                match trend_figure(result.trend.as_ref()) {
                    Some(fig) => plot::draw_figure(&out, &fig)?,
                    None => info!("no trend in response, skipping {}", out.display()),
                }
            }
            Ok(())
        }
        Commands::History { credentials, csv } => {
            let workflow = connect(cli.config.as_deref(), cli.base_url)?;
            let mut session = Session::new();
            sign_in(&workflow, &mut session, &credentials)?;
            let outcome = workflow.open_history(&mut session).await;
            report::print_notice(&session);
            outcome?;
            let records = session.history().unwrap_or_default();
            let summaries = summarize(records);
            report::print_history(session.identity(), &summaries);
            if let Some(path) = csv {
                report::write_history_csv(&path, &summaries)?;
            }
            Ok(())
        }
    }
}

fn connect(config: Option<&Path>, base_url: Option<String>) -> Result<Workflow<HttpPortalClient>> {
    let mut config = PortalConfig::load(config)?;
    if let Some(url) = base_url {
        config = config.with_base_url(url);
    }
    info!("using analysis service at {}", config.base_url);
    Ok(Workflow::new(HttpPortalClient::new(&config)?))
}

fn sign_in(
    workflow: &Workflow<HttpPortalClient>,
    session: &mut Session,
    credentials: &Credentials,
) -> Result<()> {
    session.set_field(IdentityField::Email, &credentials.email)?;
    session.set_field(IdentityField::Password, &credentials.password)?;
    let outcome = workflow.submit_login(session);
    report::print_notice(session);
    outcome.context("sign-in failed")
}

fn cmd_trend_plot(input: &Path, out: &Path) -> Result<()> {
    let text =
        fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let raw: RawAnalysis =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", input.display()))?;
    let result = normalize(raw);
    match trend_figure(result.trend.as_ref()) {
        Some(fig) => {
            plot::draw_figure(out, &fig)?;
            println!("wrote {}", out.display());
        }
        None => println!("no trend data in {}; nothing to plot", input.display()),
    }
    Ok(())
}
