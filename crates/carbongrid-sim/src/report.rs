//! Plain-text report over a set of policy runs.

use std::fmt::Write;

use crate::metrics::RunMetrics;
use crate::policy::PolicyKind;

/// Render a comparison report across policy runs: one row per policy,
/// the carbon-aware reduction against the highest-carbon baseline, and
/// the carbon-aware per-region distribution.
pub fn render(runs: &[RunMetrics]) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:<16} {:>9} {:>7} {:>12} {:>12} {:>14} {:>12} {:>8}",
        "policy", "completed", "failed", "mean carbon", "mean latency", "mean turnaround", "throughput", "util"
    );
    for run in runs {
        let _ = writeln!(
            out,
            "{:<16} {:>9} {:>7} {:>12.2} {:>12} {:>14} {:>12.2} {:>7.1}%",
            run.policy.name(),
            run.completed,
            run.failed,
            run.mean_carbon,
            fmt_secs(run.mean_latency_secs),
            fmt_secs(run.mean_turnaround_secs),
            run.throughput_per_hour,
            run.mean_utilization_pct,
        );
    }

    let carbon_aware = runs.iter().find(|r| r.policy == PolicyKind::CarbonAware);
    let worst = runs.iter().find(|r| r.policy == PolicyKind::HighestCarbon);
    if let (Some(carbon_aware), Some(worst)) = (carbon_aware, worst) {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "carbon reduction vs highest-carbon: {:.2}% ({:.2} vs {:.2} g CO2eq/kWh)",
            carbon_aware.carbon_reduction_vs(worst),
            carbon_aware.mean_carbon,
            worst.mean_carbon,
        );
        let _ = writeln!(
            out,
            "p95 latency: {}   p95 turnaround: {}",
            fmt_secs(carbon_aware.p95_latency_secs),
            fmt_secs(carbon_aware.p95_turnaround_secs),
        );

        if !carbon_aware.units_by_region.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "carbon-aware placements by region:");
            for (region, count) in &carbon_aware.units_by_region {
                let total = carbon_aware.carbon_by_region.get(region).copied().unwrap_or_default();
                let _ = writeln!(
                    out,
                    "  {:<16} {:>5} units  {:>10.2} g CO2eq/kWh avg",
                    region,
                    count,
                    total / *count as f64,
                );
            }
        }
    }

    out
}

fn fmt_secs(secs: f64) -> String {
    if secs < 60.0 {
        format!("{secs:.1}s")
    } else if secs < 3600.0 {
        format!("{:.1}m", secs / 60.0)
    } else {
        format!("{:.1}h", secs / 3600.0)
    }
}
