use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::Instant;

use crate::api::{PicksBackend, error_message};
use crate::export;
use crate::state::{Delta, ProviderCommand};

/// Runs commands against `backend` until the command channel closes.
///
/// Each command gets its own short-lived worker, so a slow history fetch
/// never holds up a predictions fetch. Results arrive in completion order;
/// the UI applies whatever lands last.
pub fn spawn_provider<B>(backend: Arc<B>, tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>)
where
    B: PicksBackend + 'static,
{
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            let backend = backend.clone();
            let tx = tx.clone();
            thread::spawn(move || run_command(backend.as_ref(), cmd, &tx));
        }
    });
}

pub fn run_command<B: PicksBackend + ?Sized>(backend: &B, cmd: ProviderCommand, tx: &Sender<Delta>) {
    let label = command_label(&cmd);
    let started = Instant::now();
    let delta = match cmd {
        ProviderCommand::FetchPredictions { season, week } => {
            match backend.predictions(season, week) {
                Ok(rows) => Delta::SetPredictions { season, week, rows },
                Err(err) => Delta::PredictionsFailed(error_message(&err)),
            }
        }
        ProviderCommand::FetchHistory {
            season,
            week,
            limit,
        } => match backend.history(season, week, limit) {
            Ok(rows) => Delta::SetHistory { season, week, rows },
            Err(err) => Delta::HistoryFailed(error_message(&err)),
        },
        ProviderCommand::TriggerSnapshot { season, week } => {
            match backend.snapshot(season, week) {
                Ok(receipt) => Delta::SnapshotSaved(receipt),
                Err(err) => Delta::SnapshotFailed(error_message(&err)),
            }
        }
        ProviderCommand::FetchHealth => match backend.health() {
            Ok(health) => Delta::SetHealth(health),
            Err(err) => Delta::HealthFailed(error_message(&err)),
        },
        ProviderCommand::Export(job) => match export::write_export(&job) {
            Ok(rows) => Delta::ExportFinished {
                path: job.path.display().to_string(),
                rows,
            },
            Err(err) => Delta::ExportFailed(error_message(&err)),
        },
    };
    let _ = tx.send(delta);
    let _ = tx.send(Delta::Log(format!(
        "[INFO] {label} done in {} ms",
        started.elapsed().as_millis()
    )));
}

fn command_label(cmd: &ProviderCommand) -> String {
    match cmd {
        ProviderCommand::FetchPredictions { season, week } => {
            format!("Predictions fetch ({season} wk{week})")
        }
        ProviderCommand::FetchHistory { season, week, .. } => {
            format!("History fetch ({season} wk{week})")
        }
        ProviderCommand::TriggerSnapshot { season, week } => {
            format!("Snapshot ({season} wk{week})")
        }
        ProviderCommand::FetchHealth => "Health check".to_string(),
        ProviderCommand::Export(job) => format!("Export to {}", job.path.display()),
    }
}
