use std::path::Path;

use rusqlite::Connection;

use gridiron_edge::config::ModelConfig;
use gridiron_edge::engine::{self, RunOptions, StatsSource};
use gridiron_edge::props::{PropMarket, PropSide};
use gridiron_edge::slate::{self, Slate};
use gridiron_edge::stats::DefenseGroup;
use gridiron_edge::store;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/slate.json");

fn fixture() -> Slate {
    slate::load_slate(Path::new(FIXTURE)).expect("fixture slate loads")
}

#[test]
fn slate_lookups_accept_names_and_abbreviations() {
    let slate = fixture();
    assert_eq!(slate.week, 11);
    assert_eq!(slate.season, 2025);
    assert_eq!(slate.team_stats("BUF").map(|t| t.wins), Some(7));
    assert_eq!(slate.team_stats("kansas city chiefs").map(|t| t.wins), Some(6));
    assert!(slate.team_stats("Expansion Club").is_none());
    assert!(slate.player("  josh arm ").is_some());
    assert!(slate.defense("MIA", DefenseGroup::VsQb).is_some());
    assert!(slate.defense("Miami Dolphins", DefenseGroup::VsTe).is_none());
}

#[test]
fn spread_run_skips_unknown_club_and_flags_rivals() {
    let slate = fixture();
    let cfg = ModelConfig::default();
    let run = engine::run_spreads(&slate, &slate.spreads, &cfg, &RunOptions::default());

    assert_eq!(run.predictions.len(), 2);
    assert_eq!(run.skipped.len(), 1);
    assert_eq!(run.skipped[0].0, "2025-w11-exp-kan");
    assert_eq!(run.skipped[0].1.kind(), "missing_team_stats");

    let ids: Vec<&str> = run.predictions.iter().map(|p| p.game_id.as_str()).collect();
    assert_eq!(ids, ["2025-w11-mia-buf", "2025-w11-lvr-kan"]);
    assert!(run.predictions.iter().all(|p| p.division_game));

    let buf = &run.predictions[0];
    assert_eq!(buf.predicted_winner, "Buffalo Bills");
    assert_eq!(buf.market_spread, -9.5);
    assert!((buf.value_score - (buf.predicted_margin - 9.5).abs()).abs() < 1e-9);
    assert!(buf.reasoning.contains("Buffalo Bills Injuries:"));
    for pred in &run.predictions {
        assert_eq!(pred.is_recommended(), pred.verdict.is_recommend());
        assert!((0.0..=100.0).contains(&pred.confidence));
    }
}

#[test]
fn totals_run_keeps_first_book_per_game() {
    let slate = fixture();
    let cfg = ModelConfig::default();
    let run = engine::run_totals(&slate, &slate.totals, &cfg, &RunOptions::default());

    assert_eq!(run.predictions.len(), 2);
    assert!(run.skipped.is_empty());
    let first = &run.predictions[0];
    assert_eq!(first.game_id, "2025-w11-mia-buf");
    assert_eq!(first.bookmaker, "draftkings");
    assert_eq!(first.market_total, 48.5);
    for pred in &run.predictions {
        assert!((pred.value_score - (pred.predicted_total - pred.market_total).abs()).abs() < 1e-9);
        assert_eq!(pred.recommended_bet.is_some(), pred.verdict.is_recommend());
    }
}

#[test]
fn prop_run_reports_every_skip_kind() {
    let slate = fixture();
    let cfg = ModelConfig::default();
    let run = engine::run_props(&slate, &slate.props, &cfg, &RunOptions::default());
    let summary = run.summary();

    assert_eq!(summary.evaluated, 3);
    assert_eq!(summary.skipped, 5);
    for kind in [
        "unknown_market",
        "missing_player",
        "ineligible_market",
        "player_not_in_game",
        "missing_line",
    ] {
        assert_eq!(summary.skipped_by_kind.get(kind), Some(&1), "{kind}");
    }
    assert!(!summary.skipped_by_kind.contains_key("missing_team_stats"));

    let markets: Vec<PropMarket> = run.predictions.iter().map(|r| r.market).collect();
    assert_eq!(
        markets,
        [PropMarket::PassYds, PropMarket::AnytimeTd, PropMarket::ReceptionYds]
    );
}

#[test]
fn prop_run_applies_matchups_and_default_td_line() {
    let slate = fixture();
    let cfg = ModelConfig::default();
    let run = engine::run_props(&slate, &slate.props, &cfg, &RunOptions::sequential());

    let qb = &run.predictions[0];
    assert_eq!(qb.opponent, "Miami Dolphins");
    // 270/game against a defense allowing 240 where the league allows 220
    let expected = 270.0 * (1.0 + (240.0 / 220.0 - 1.0) * 0.6);
    assert!((qb.model_mean - expected).abs() < 1e-9);
    assert_eq!(qb.side, PropSide::Over);
    assert!(qb.expected_value > 0.0);

    let td = &run.predictions[1];
    assert_eq!(td.line, 0.5);
    assert_eq!(td.opponent, "Buffalo Bills");
    assert_eq!(td.under_odds, None);
    assert_eq!(td.side, PropSide::Over);
    assert!((td.implied_probability - 0.4).abs() < 1e-12);

    let wr = &run.predictions[2];
    assert!(wr.model_mean > 80.0);
    assert_eq!(wr.side, PropSide::Over);

    let best = engine::best_props(&run.predictions, 10);
    assert_eq!(best.len(), 3);
    assert!(best.windows(2).all(|w| w[0].edge >= w[1].edge));
}

#[test]
fn parallel_and_sequential_runs_agree() {
    let slate = fixture();
    let cfg = ModelConfig::default();
    let par = RunOptions {
        parallel: true,
        threads: 4,
    };
    let seq = RunOptions::sequential();

    let a = engine::run_spreads(&slate, &slate.spreads, &cfg, &par);
    let b = engine::run_spreads(&slate, &slate.spreads, &cfg, &seq);
    assert_eq!(
        serde_json::to_string(&a.predictions).expect("serialize"),
        serde_json::to_string(&b.predictions).expect("serialize")
    );
    assert_eq!(a.skipped, b.skipped);

    let a = engine::run_props(&slate, &slate.props, &cfg, &par);
    let b = engine::run_props(&slate, &slate.props, &cfg, &seq);
    assert_eq!(
        serde_json::to_string(&a.predictions).expect("serialize"),
        serde_json::to_string(&b.predictions).expect("serialize")
    );
    assert_eq!(a.skipped, b.skipped);
}

#[test]
fn stored_week_reloads_recommended_rows() {
    let slate = fixture();
    let cfg = ModelConfig::default();
    let opts = RunOptions::sequential();
    let spreads = engine::run_spreads(&slate, &slate.spreads, &cfg, &opts);
    let totals = engine::run_totals(&slate, &slate.totals, &cfg, &opts);
    let props = engine::run_props(&slate, &slate.props, &cfg, &opts);

    let mut conn = Connection::open_in_memory().expect("open db");
    store::init_schema(&conn).expect("schema");
    let saved =
        store::save_spread_predictions(&mut conn, &spreads.predictions, slate.week, slate.season)
            .expect("save spreads");
    assert_eq!(saved, 2);
    store::save_totals_predictions(&mut conn, &totals.predictions, slate.week, slate.season)
        .expect("save totals");
    store::save_prop_recommendations(&mut conn, &props.predictions, slate.week, slate.season)
        .expect("save props");

    // saving twice upserts in place
    store::save_spread_predictions(&mut conn, &spreads.predictions, slate.week, slate.season)
        .expect("resave spreads");
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM spread_predictions", [], |r| r.get(0))
        .expect("count");
    assert_eq!(rows, 2);

    let best = store::load_best_spread_bets(&conn, slate.week, slate.season, 10).expect("load");
    assert_eq!(best.len(), spreads.picks().count());
    assert!(best.windows(2).all(|w| w[0].confidence >= w[1].confidence));

    let best_totals =
        store::load_best_totals_bets(&conn, slate.week, slate.season, 10).expect("load totals");
    assert_eq!(best_totals.len(), totals.picks().count());

    let other_week = store::load_best_spread_bets(&conn, slate.week + 1, slate.season, 10)
        .expect("load other week");
    assert!(other_week.is_empty());
}

#[test]
fn halfback_rows_are_read_as_running_backs() {
    let raw = r#"{
        "week": 3,
        "season": 2025,
        "players": [
            {
                "player_name": "Feature Back", "team": "MIA", "position": "HB", "games_played": 4,
                "stats": { "table": "rushing", "rushing_yards": 320, "rushing_attempts": 70 }
            }
        ],
        "props": [
            {
                "event_id": "ev-hb", "home_team": "Buffalo Bills", "away_team": "Miami Dolphins",
                "player_name": "Feature Back", "market": "player_rush_yds", "bookmaker": "draftkings",
                "line": 70.5, "over_odds": -110, "under_odds": -110
            }
        ]
    }"#;
    let slate = Slate::from_json(raw).expect("inline slate parses");
    let run = engine::run_props(&slate, &slate.props, &ModelConfig::default(), &RunOptions::sequential());

    assert!(run.skipped.is_empty(), "{:?}", run.skipped);
    assert_eq!(run.predictions.len(), 1);
    let rec = &run.predictions[0];
    assert_eq!(rec.position, gridiron_edge::stats::Position::Rb);
    assert_eq!(rec.market, PropMarket::RushYds);
    assert_eq!(rec.model_mean, 80.0);
}
