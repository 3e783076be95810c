use std::fmt::Write;

use crate::filter::FilterSpec;
use crate::insights::{DashboardView, HourlyView, MonthlyView, EVENING_PEAK, MORNING_PEAK};
use crate::models::{weekday_name, Growth, HourProfile, UserSeries};

pub fn describe_filter(filter: &FilterSpec) -> String {
    if filter.is_unrestricted() {
        return "all records".to_string();
    }

    let mut parts = Vec::new();
    if let Some(season) = filter.season {
        parts.push(format!("season {season}"));
    }
    if !filter.years.is_empty() {
        let years: Vec<String> = filter.years.iter().map(|y| y.to_string()).collect();
        parts.push(format!("years {}", years.join("/")));
    }
    if !filter.weathers.is_empty() {
        let weathers: Vec<String> = filter.weathers.iter().map(|w| w.to_string()).collect();
        parts.push(format!("weather {}", weathers.join("/")));
    }
    parts.join(", ")
}

pub fn format_growth(growth: Growth) -> String {
    match growth {
        Growth::FirstMonth => "-".to_string(),
        Growth::NoBaseline => "no prior baseline".to_string(),
        Growth::Percent(value) => format!("{value:+.1}%"),
    }
}

fn format_peak(label: &str, peak: Option<&HourProfile>) -> String {
    match peak {
        Some(peak) => format!(
            "{label}: {:02}:00 averaging {:.0} rides",
            peak.hour, peak.mean_total
        ),
        None => format!("{label}: no data"),
    }
}

pub fn build_report(view: &DashboardView) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Bike Sharing Usage Report");
    let _ = writeln!(output, "Generated for {}", describe_filter(&view.filter));
    let _ = writeln!(output);

    match view.monthly.ready() {
        Some(monthly) => write_monthly(&mut output, monthly),
        None => {
            let _ = writeln!(output, "## Monthly Riders");
            let _ = writeln!(output, "No daily records match this filter.");
        }
    }

    let _ = writeln!(output);
    match view.hourly.ready() {
        Some(hourly) => write_hourly(&mut output, hourly),
        None => {
            let _ = writeln!(output, "## Hourly Pattern");
            let _ = writeln!(output, "No hourly records match this filter.");
        }
    }

    output
}

fn write_monthly(output: &mut String, monthly: &MonthlyView) {
    let _ = writeln!(output, "## Monthly Riders");
    let _ = writeln!(output, "| Month | Casual | Registered | Casual growth | Registered growth |");
    let _ = writeln!(output, "|---|---|---|---|---|");
    for aggregate in &monthly.totals {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} |",
            aggregate.month,
            aggregate.casual,
            aggregate.registered,
            format_growth(aggregate.casual_growth),
            format_growth(aggregate.registered_growth)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Series Highlights");
    for stats in &monthly.statistics {
        let name = match stats.series {
            UserSeries::Casual => "Casual",
            UserSeries::Registered => "Registered",
        };
        let _ = writeln!(
            output,
            "- {}: monthly mean {:.0}, highest month {} ({:.0}), lowest month {} ({:.0})",
            name,
            stats.monthly_mean,
            stats.highest.month,
            stats.highest.value,
            stats.lowest.month,
            stats.lowest.value
        );
        match stats.strongest_growth {
            Some(growth) => {
                let _ = writeln!(
                    output,
                    "  - strongest growth in month {} ({:+.1}%)",
                    growth.month, growth.value
                );
            }
            None => {
                let _ = writeln!(output, "  - no month-over-month growth available");
            }
        }
    }

    let breakdown = &monthly.breakdown;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Daily Breakdown");
    for entry in &breakdown.season_totals {
        let _ = writeln!(output, "- {} total: {:.0}", entry.key, entry.value);
    }
    for entry in &breakdown.working_day_means {
        let label = if entry.key { "working day" } else { "non-working day" };
        let _ = writeln!(output, "- {} mean: {:.1}", label, entry.value);
    }
    for entry in &breakdown.weather_means {
        let _ = writeln!(output, "- {} weather mean: {:.1}", entry.key, entry.value);
    }
    for entry in &breakdown.weekday_means {
        let _ = writeln!(output, "- {} mean: {:.1}", weekday_name(entry.key), entry.value);
    }
    if let Some(stats) = &breakdown.distribution {
        let _ = writeln!(
            output,
            "- daily rides: min {:.0}, median {:.0}, mean {:.1}, max {:.0}",
            stats.min, stats.median, stats.mean, stats.max
        );
    }
    if let Some(r) = breakdown.temperature_correlation {
        let _ = writeln!(output, "- temperature correlation: {r:.3}");
    }
}

fn write_hourly(output: &mut String, hourly: &HourlyView) {
    let _ = writeln!(output, "## Hourly Pattern");
    for entry in &hourly.profile {
        let _ = writeln!(output, "- {:02}:00 {:.1}", entry.hour, entry.mean_total);
    }
    let _ = writeln!(
        output,
        "- {}",
        format_peak(
            &format!("morning peak ({}-{})", MORNING_PEAK.start(), MORNING_PEAK.end()),
            hourly.morning_peak.as_ref()
        )
    );
    let _ = writeln!(
        output,
        "- {}",
        format_peak(
            &format!("evening peak ({}-{})", EVENING_PEAK.start(), EVENING_PEAK.end()),
            hourly.evening_peak.as_ref()
        )
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Hour Groups");
    let _ = writeln!(
        output,
        "| Group | Mean weather | Mean temperature | Most common day | Mean rides | Total rides \
         | Share |"
    );
    let _ = writeln!(output, "|---|---|---|---|---|---|---|");
    for group in &hourly.groups {
        let share = hourly
            .shares
            .iter()
            .find(|share| share.group == group.group)
            .map(|share| format!("{:.1}%", share.percent))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            output,
            "| {} | {:.2} | {:.1}°C | {} | {:.0} | {} | {} |",
            group.group.label(),
            group.mean_weather,
            group.mean_temp_celsius,
            weekday_name(group.modal_weekday),
            group.mean_total,
            group.total,
            share
        );
    }
}
