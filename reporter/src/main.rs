use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use common::config::Settings;
use directory::{FilterCriteria, LicenseStatus};
use reporter::{ReportSession, SearchOutcome};
use std::path::PathBuf;
use std::process;

const DEFAULT_CONFIG: &str = "config/reporter.toml";

fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .help("Sets a custom config file")
}

fn with_filters(command: Command) -> Command {
    command
        .arg(
            Arg::new("text")
                .long("text")
                .value_name("TEXT")
                .help("Case-insensitive match on name, UPN or email"),
        )
        .arg(
            Arg::new("license")
                .long("license")
                .value_name("STATUS")
                .help("Any, Licensed or Unlicensed"),
        )
        .arg(Arg::new("department").long("department").value_name("NAME"))
        .arg(Arg::new("job-title").long("job-title").value_name("TITLE"))
}

fn criteria_from(matches: &ArgMatches) -> anyhow::Result<FilterCriteria> {
    let license_status = match matches.get_one::<String>("license") {
        Some(value) => value.parse::<LicenseStatus>()?,
        None => LicenseStatus::Any,
    };

    Ok(FilterCriteria {
        text: matches.get_one::<String>("text").cloned(),
        license_status,
        department: matches.get_one::<String>("department").cloned(),
        job_title: matches.get_one::<String>("job-title").cloned(),
    })
}

fn load_settings(matches: &ArgMatches) -> anyhow::Result<Settings> {
    let config_path = matches
        .get_one::<String>("config")
        .map(|s| s.as_str())
        .unwrap_or(DEFAULT_CONFIG);
    let settings = Settings::new(config_path)
        .with_context(|| format!("loading configuration from {}", config_path))?;
    common::telemetry::init_tracing(&settings.logging);
    Ok(settings)
}

/// Refreshes the snapshot and applies the filters given on the command line.
async fn load_table(settings: &Settings, matches: &ArgMatches) -> anyhow::Result<ReportSession> {
    let criteria = criteria_from(matches)?;
    let mut session = ReportSession::from_settings(settings)?;
    let snapshot = session.refresh().await.context("fetching enabled users")?;
    println!("Fetched {} enabled users", snapshot.len());

    match session.search(criteria) {
        SearchOutcome::Matches(count) => println!("{} matching users", count),
        outcome @ SearchOutcome::EmptyResultSet => {
            println!("{}", outcome.message().unwrap_or_default())
        }
    }
    Ok(session)
}

async fn run(matches: ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("serve", serve_matches)) => {
            let settings = load_settings(serve_matches)?;
            reporter::run_report_server(&settings).await?;
        }
        Some(("facets", facet_matches)) => {
            let settings = load_settings(facet_matches)?;
            let mut session = ReportSession::from_settings(&settings)?;
            session.refresh().await.context("fetching enabled users")?;
            let facets = session.facets();
            println!("Departments: {}", facets.departments.values().join(", "));
            println!("Job titles: {}", facets.job_titles.values().join(", "));
        }
        Some(("export", export_matches)) => {
            let settings = load_settings(export_matches)?;
            let session = load_table(&settings, export_matches).await?;
            let output_dir = export_matches
                .get_one::<String>("output")
                .unwrap_or(&settings.report.output_dir);

            let artifact = session.export_csv()?;
            let path = artifact.write_to(&PathBuf::from(output_dir))?;
            println!("Report written to {}", path.display());
        }
        Some(("send", send_matches)) => {
            let settings = load_settings(send_matches)?;
            let session = load_table(&settings, send_matches).await?;
            let recipient = session
                .send_report(
                    send_matches.get_one::<String>("to").map(String::as_str),
                    send_matches.get_one::<String>("subject").map(String::as_str),
                )
                .await?;
            println!("Report sent successfully to {}", recipient);
        }
        _ => {
            anyhow::bail!("Please specify a valid subcommand. Use --help for usage information.");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let matches = Command::new("Directory Report Manager")
        .version("1.0")
        .about("Reports on enabled directory accounts")
        .subcommand(
            Command::new("serve")
                .about("Serve the report API")
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("facets")
                .about("List departments and job titles")
                .arg(config_arg()),
        )
        .subcommand(with_filters(
            Command::new("export")
                .about("Write the filtered report as CSV")
                .arg(config_arg())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("DIR")
                        .help("Directory to write the report into"),
                ),
        ))
        .subcommand(with_filters(
            Command::new("send")
                .about("Mail the filtered report as an HTML table")
                .arg(config_arg())
                .arg(
                    Arg::new("to")
                        .long("to")
                        .value_name("ADDRESS")
                        .help("Recipient; defaults to report.default_recipient"),
                )
                .arg(Arg::new("subject").long("subject").value_name("SUBJECT")),
        ))
        .get_matches();

    if let Err(e) = run(matches).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
