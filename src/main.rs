use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use bikeshare_insights::filter::FilterSpec;
use bikeshare_insights::insights::{DashboardView, Insights, Section};
use bikeshare_insights::loader::DatasetSources;
use bikeshare_insights::metrics::ShareBasis;
use bikeshare_insights::models::{weekday_name, Season, UserSeries, Weather, YearIndex};
use bikeshare_insights::report;

#[derive(Parser)]
#[command(name = "bikeshare-insights")]
#[command(about = "Usage summaries for the bike sharing datasets", long_about = None)]
struct Cli {
    #[command(flatten)]
    data: DataArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// Daily table (defaults to data/day.csv, then ../data/day.csv)
    #[arg(long, global = true)]
    day: Option<PathBuf>,
    /// Hourly table (defaults to data/hour.csv, then ../data/hour.csv)
    #[arg(long, global = true)]
    hour: Option<PathBuf>,
    /// Season code (1-4) or name
    #[arg(long, global = true)]
    season: Option<Season>,
    /// Dataset year: 0/1 or 2011/2012, repeatable
    #[arg(long = "year", global = true)]
    years: Vec<YearIndex>,
    /// Weather code (1-4) or name, repeatable
    #[arg(long = "weather", global = true)]
    weathers: Vec<Weather>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,
    /// Measure used for the peak/off-peak shares
    #[arg(long, value_enum, default_value_t = ShareArg::Mean, global = true)]
    share_basis: ShareArg,
}

impl DataArgs {
    fn filter(&self) -> FilterSpec {
        FilterSpec {
            season: self.season,
            years: self.years.iter().copied().collect::<BTreeSet<_>>(),
            weathers: self.weathers.iter().copied().collect::<BTreeSet<_>>(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Clone, Copy, ValueEnum)]
enum ShareArg {
    Mean,
    Total,
}

impl From<ShareArg> for ShareBasis {
    fn from(value: ShareArg) -> Self {
        match value {
            ShareArg::Mean => ShareBasis::MeanCount,
            ShareArg::Total => ShareBasis::TotalCount,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Casual and registered riders per month
    Monthly,
    /// Month-over-month growth of both rider series
    Growth,
    /// Mean rides per hour of day with commute peaks
    Hourly,
    /// Peak vs off-peak hour group characteristics
    Groups,
    /// Daily totals broken down by season, working day, weather and weekday
    Breakdown,
    /// Check the datasets for duplicates, gaps and inconsistent totals
    Assess,
    /// Write a markdown report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let sources = DatasetSources::with_overrides(cli.data.day.clone(), cli.data.hour.clone());
    let mut insights = Insights::new(sources).with_share_basis(cli.data.share_basis.into());
    let filter = cli.data.filter();
    let format = cli.data.format;

    match cli.command {
        Commands::Assess => {
            let assessment = insights
                .assessment()
                .context("failed to load datasets for assessment")?;
            match format {
                OutputFormat::Json => print_json(&assessment)?,
                OutputFormat::Text | OutputFormat::Markdown => {
                    println!(
                        "{} daily rows, {} hourly rows",
                        assessment.daily_rows, assessment.hourly_rows
                    );
                    if let (Some(first), Some(last)) =
                        (assessment.first_date, assessment.last_date)
                    {
                        println!("Span {first} to {last}");
                    }
                    println!("Duplicate dates: {}", assessment.duplicate_dates.len());
                    println!("Duplicate date/hour pairs: {}", assessment.duplicate_hours.len());
                    println!("Missing dates: {}", assessment.missing_dates.len());
                    println!("Days with fewer than 24 hourly rows: {}", assessment.incomplete_days);
                    println!(
                        "Days where hourly rides exceed the daily total: {}",
                        assessment.hourly_exceeds_daily.len()
                    );
                }
            }
        }
        Commands::Report { out } => {
            let view = insights.view(&filter).context("failed to build view")?;
            std::fs::write(&out, report::build_report(&view))
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        command => {
            let view = insights.view(&filter).context("failed to build view")?;
            match format {
                OutputFormat::Markdown => print!("{}", report::build_report(&view)),
                OutputFormat::Json => print_json(&command_json(&command, &view)?)?,
                OutputFormat::Text => print_text(&command, &view),
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn section_json<T, U: Serialize>(
    section: &Section<T>,
    project: impl Fn(&T) -> U,
) -> anyhow::Result<serde_json::Value> {
    Ok(match section.ready() {
        Some(value) => serde_json::to_value(project(value))?,
        None => json!("no_data"),
    })
}

fn command_json(command: &Commands, view: &DashboardView) -> anyhow::Result<serde_json::Value> {
    let body = match command {
        Commands::Monthly => section_json(&view.monthly, |m| {
            json!({ "totals": m.totals, "statistics": m.statistics })
        })?,
        Commands::Growth => section_json(&view.monthly, |m| {
            m.totals
                .iter()
                .map(|t| {
                    json!({
                        "month": t.month,
                        "casual": t.casual_growth,
                        "registered": t.registered_growth,
                    })
                })
                .collect::<Vec<_>>()
        })?,
        Commands::Hourly => section_json(&view.hourly, |h| {
            json!({
                "profile": h.profile,
                "morning_peak": h.morning_peak,
                "evening_peak": h.evening_peak,
            })
        })?,
        Commands::Groups => section_json(&view.hourly, |h| {
            json!({ "groups": h.groups, "shares": h.shares })
        })?,
        Commands::Breakdown => section_json(&view.monthly, |m| m.breakdown.clone())?,
        Commands::Assess | Commands::Report { .. } => serde_json::to_value(view)?,
    };
    Ok(json!({ "filter": view.filter, "result": body }))
}

fn print_text(command: &Commands, view: &DashboardView) {
    println!("Filter: {}", report::describe_filter(&view.filter));

    match command {
        Commands::Monthly | Commands::Growth | Commands::Breakdown => {
            let Some(monthly) = view.monthly.ready() else {
                println!("No daily records match this filter.");
                return;
            };
            match command {
                Commands::Monthly => {
                    for t in &monthly.totals {
                        println!(
                            "- month {:>2}: casual {}, registered {}",
                            t.month, t.casual, t.registered
                        );
                    }
                    for stats in &monthly.statistics {
                        println!(
                            "{} monthly mean {:.0}, highest month {} ({:.0}), lowest month {} ({:.0})",
                            stats.series.label(),
                            stats.monthly_mean,
                            stats.highest.month,
                            stats.highest.value,
                            stats.lowest.month,
                            stats.lowest.value
                        );
                    }
                }
                Commands::Growth => {
                    for t in &monthly.totals {
                        println!(
                            "- month {:>2}: casual {}, registered {}",
                            t.month,
                            report::format_growth(t.growth(UserSeries::Casual)),
                            report::format_growth(t.growth(UserSeries::Registered))
                        );
                    }
                }
                _ => {
                    let breakdown = &monthly.breakdown;
                    for entry in &breakdown.season_totals {
                        println!("- {} total {:.0}", entry.key, entry.value);
                    }
                    for entry in &breakdown.working_day_means {
                        let label = if entry.key { "working day" } else { "non-working day" };
                        println!("- {label} mean {:.1}", entry.value);
                    }
                    for entry in &breakdown.month_means {
                        println!("- month {:>2} mean {:.1}", entry.key, entry.value);
                    }
                    for entry in &breakdown.weather_means {
                        println!("- {} weather mean {:.1}", entry.key, entry.value);
                    }
                    for entry in &breakdown.weekday_means {
                        println!("- {} mean {:.1}", weekday_name(entry.key), entry.value);
                    }
                    if let Some(r) = breakdown.temperature_correlation {
                        println!("Temperature correlation {r:.3}");
                    }
                }
            }
        }
        Commands::Hourly | Commands::Groups => {
            let Some(hourly) = view.hourly.ready() else {
                println!("No hourly records match this filter.");
                return;
            };
            if matches!(command, Commands::Hourly) {
                for entry in &hourly.profile {
                    println!("- {:02}:00 mean {:.1}", entry.hour, entry.mean_total);
                }
                let peaks = [
                    ("Morning", &hourly.morning_peak),
                    ("Evening", &hourly.evening_peak),
                ];
                for (label, peak) in peaks {
                    match peak {
                        Some(peak) => {
                            println!("{label} peak {:02}:00 ({:.0})", peak.hour, peak.mean_total)
                        }
                        None => println!("{label} peak: no data"),
                    }
                }
            } else {
                for group in &hourly.groups {
                    println!(
                        "- {}: weather {:.2}, {:.1}°C, mostly {}, mean {:.0}, total {}",
                        group.group.label(),
                        group.mean_weather,
                        group.mean_temp_celsius,
                        weekday_name(group.modal_weekday),
                        group.mean_total,
                        group.total
                    );
                }
                for share in &hourly.shares {
                    println!("{} share {:.1}%", share.group.label(), share.percent);
                }
            }
        }
        Commands::Assess | Commands::Report { .. } => {}
    }
}
