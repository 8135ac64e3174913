use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use gridiron_edge::config;
use gridiron_edge::engine::{self, RunOptions};
use gridiron_edge::slate;
use gridiron_edge::store;

const USAGE: &str = "usage: gridiron_edge <slate.json> [--db <path>] [--top <n>]";
const DEFAULT_TOP: usize = 5;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let slate_path = parse_slate_arg(&args).context(USAGE)?;
    let top = parse_top_arg(&args).unwrap_or(DEFAULT_TOP);

    let cfg = config::load_config_from_env();
    let slate = slate::load_slate(&slate_path)?;
    let opts = RunOptions::from_env();

    let spreads = engine::run_spreads(&slate, &slate.spreads, &cfg, &opts);
    let totals = engine::run_totals(&slate, &slate.totals, &cfg, &opts);
    let props = engine::run_props(&slate, &slate.props, &cfg, &opts);

    println!("Week {} / {}", slate.week, slate.season);

    let spread_summary = spreads.summary();
    println!(
        "\nSpreads: {} evaluated, {} picks, {} skipped",
        spread_summary.evaluated, spread_summary.recommended, spread_summary.skipped
    );
    for pick in engine::best_spread_bets(&spreads.predictions, top) {
        println!(
            "  {:<28} {:<11} conf {:>3.0}%  edge {:>4.1}  {}",
            pick.recommended_bet.as_deref().unwrap_or("-"),
            pick.bet_token.as_str(),
            pick.confidence,
            pick.value_score,
            first_line(&pick.reasoning)
        );
    }

    let totals_summary = totals.summary();
    println!(
        "\nTotals: {} evaluated, {} picks, {} skipped",
        totals_summary.evaluated, totals_summary.recommended, totals_summary.skipped
    );
    for pick in engine::best_totals_bets(&totals.predictions, top) {
        println!(
            "  {} @ {}  {} {:.1}  model {:.1}  conf {:.0}%",
            pick.away_team,
            pick.home_team,
            pick.recommended_bet.map(|s| s.as_str()).unwrap_or("-"),
            pick.market_total,
            pick.predicted_total,
            pick.confidence
        );
    }

    let props_summary = props.summary();
    println!(
        "\nProps: {} evaluated, {} picks, {} skipped",
        props_summary.evaluated, props_summary.recommended, props_summary.skipped
    );
    for (kind, count) in &props_summary.skipped_by_kind {
        println!("  skipped {kind}: {count}");
    }
    for pick in engine::best_props(&props.predictions, top) {
        println!(
            "  {:<22} {:<5} {:<22} {:>6.1}  p={:.3} edge={:+.3} ev={:+.2}",
            pick.player_name,
            pick.side.as_str(),
            pick.market.key(),
            pick.line,
            pick.probability,
            pick.edge,
            pick.expected_value
        );
    }

    if let Some(db_path) = parse_db_path_arg(&args).or_else(store::db_path_from_env) {
        let mut conn = store::open_db(&db_path)?;
        store::save_spread_predictions(&mut conn, &spreads.predictions, slate.week, slate.season)?;
        store::save_totals_predictions(&mut conn, &totals.predictions, slate.week, slate.season)?;
        store::save_prop_recommendations(&mut conn, &props.predictions, slate.week, slate.season)?;
        println!("\nSaved to {}", db_path.display());
    }

    Ok(())
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

fn parse_slate_arg(args: &[String]) -> Option<PathBuf> {
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--db" || arg == "--top" {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        return Some(PathBuf::from(arg));
    }
    None
}

fn parse_flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed);
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim());
            }
        }
    }
    None
}

fn parse_db_path_arg(args: &[String]) -> Option<PathBuf> {
    parse_flag_value(args, "--db").map(PathBuf::from)
}

fn parse_top_arg(args: &[String]) -> Option<usize> {
    parse_flag_value(args, "--top").and_then(|v| v.parse::<usize>().ok())
}
