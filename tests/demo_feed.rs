use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use nfl_picks_terminal::api::PicksBackend;
use nfl_picks_terminal::demo_feed::{DemoBackend, demo_slate};
use nfl_picks_terminal::provider::{run_command, spawn_provider};
use nfl_picks_terminal::state::{Delta, ProviderCommand};

#[test]
fn slate_has_sixteen_distinct_games() {
    let slate = demo_slate(2025, 10);
    assert_eq!(slate.len(), 16);
    let mut teams: Vec<&str> = slate
        .iter()
        .flat_map(|r| [r.home_team.as_str(), r.away_team.as_str()])
        .collect();
    teams.sort();
    teams.dedup();
    assert_eq!(teams.len(), 32);
    for row in &slate {
        let pick = row.pick.as_deref().expect("pick");
        assert!(pick == row.home_team || pick == row.away_team);
    }
}

#[test]
fn snapshot_upserts_into_history() {
    let backend = DemoBackend::new(2025, 10);
    assert!(backend.history(2025, 10, 100).expect("history").is_empty());

    let receipt = backend
        .snapshot(2025, 10)
        .expect("snapshot")
        .expect("receipt");
    assert_eq!(receipt.saved, Some(16));
    assert_eq!(backend.history(2025, 10, 100).expect("history").len(), 16);

    // Same week again overwrites rather than duplicating.
    backend.snapshot(2025, 10).expect("snapshot");
    assert_eq!(backend.history(2025, 10, 100).expect("history").len(), 16);
    assert_eq!(backend.history(2025, 10, 5).expect("history").len(), 5);
    assert!(backend.history(2025, 11, 100).expect("history").is_empty());
}

fn next_result(rx: &mpsc::Receiver<Delta>, logs: &mut Vec<String>) -> Delta {
    loop {
        match rx
            .recv_timeout(Duration::from_secs(5))
            .expect("provider should answer")
        {
            Delta::Log(line) => logs.push(line),
            other => return other,
        }
    }
}

#[test]
fn provider_round_trip_through_channels() {
    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(Arc::new(DemoBackend::new(2025, 10)), tx, cmd_rx);
    let mut logs = Vec::new();

    cmd_tx
        .send(ProviderCommand::FetchPredictions {
            season: 2025,
            week: 4,
        })
        .expect("send");
    match next_result(&rx, &mut logs) {
        Delta::SetPredictions { season, week, rows } => {
            assert_eq!((season, week), (2025, 4));
            assert_eq!(rows.len(), 16);
        }
        other => panic!("unexpected delta: {other:?}"),
    }

    cmd_tx.send(ProviderCommand::FetchHealth).expect("send");
    let delta = next_result(&rx, &mut logs);
    assert!(matches!(delta, Delta::SetHealth(ref h) if h.ok));
}

#[test]
fn each_command_reports_a_console_line() {
    let backend = DemoBackend::new(2025, 10);
    let (tx, rx) = mpsc::channel();
    run_command(
        &backend,
        ProviderCommand::TriggerSnapshot {
            season: 2025,
            week: 10,
        },
        &tx,
    );
    drop(tx);
    let deltas: Vec<Delta> = rx.iter().collect();
    assert_eq!(deltas.len(), 2);
    assert!(matches!(deltas[0], Delta::SnapshotSaved(Some(_))));
    match &deltas[1] {
        Delta::Log(line) => {
            assert!(line.starts_with("[INFO] Snapshot (2025 wk10) done in"));
        }
        other => panic!("unexpected delta: {other:?}"),
    }
}

#[test]
fn demo_margin_uses_backend_fallback_coefficients() {
    let slate = demo_slate(2025, 10);
    let mut checked = 0;
    for row in &slate {
        let (Some(margin), Some(k), Some(net)) = (row.pred_margin, row.k_pair, row.net_epa_per_play)
        else {
            continue;
        };
        assert!((margin - (1.3 + k * net)).abs() < 1e-9);
        checked += 1;
    }
    assert!(checked > 0);
}
