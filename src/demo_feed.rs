use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::api::PicksBackend;
use crate::rows::{Health, HealthDefaults, HistoryRow, PredictionRow, SnapshotReceipt};

const TEAMS: [&str; 32] = [
    "ARI", "ATL", "BAL", "BUF", "CAR", "CHI", "CIN", "CLE", "DAL", "DEN", "DET", "GB", "HOU",
    "IND", "JAX", "KC", "LA", "LAC", "LV", "MIA", "MIN", "NE", "NO", "NYG", "NYJ", "PHI", "PIT",
    "SEA", "SF", "TB", "TEN", "WAS",
];

const HOME_FIELD_POINTS: f64 = 1.3;
const POINTS_PER_EPA_PLAY: f64 = 1.0;
const MARGIN_SIGMA: f64 = 13.5;
const DEFAULT_K_PAIR: f64 = 62.0;

/// Offline stand-in for the prediction service.
///
/// Predictions are seeded from `(season, week)` so refetching a week shows
/// the same slate. Snapshots upsert into an in-memory history keyed by
/// `(season, week, game_id)`.
pub struct DemoBackend {
    defaults: HealthDefaults,
    history: Mutex<DemoHistory>,
}

#[derive(Default)]
struct DemoHistory {
    next_id: i64,
    rows: Vec<HistoryRow>,
    predicted: HashSet<(i32, u32)>,
}

impl DemoBackend {
    pub fn new(season: i32, week: u32) -> Self {
        Self {
            defaults: HealthDefaults {
                season: Some(season),
                week: Some(week),
            },
            history: Mutex::new(DemoHistory {
                next_id: 1,
                ..DemoHistory::default()
            }),
        }
    }

    fn lock_history(&self) -> Result<std::sync::MutexGuard<'_, DemoHistory>> {
        self.history
            .lock()
            .map_err(|_| anyhow!("demo history lock poisoned"))
    }
}

impl PicksBackend for DemoBackend {
    fn predictions(&self, season: i32, week: u32) -> Result<Vec<PredictionRow>> {
        self.lock_history()?.predicted.insert((season, week));
        Ok(demo_slate(season, week))
    }

    fn history(&self, season: i32, week: u32, limit: u32) -> Result<Vec<HistoryRow>> {
        let history = self.lock_history()?;
        let mut rows: Vec<HistoryRow> = history
            .rows
            .iter()
            .filter(|r| r.season == Some(season) && r.prediction.week == Some(week))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    fn snapshot(&self, season: i32, week: u32) -> Result<Option<SnapshotReceipt>> {
        let slate = demo_slate(season, week);
        let created_at = Utc::now()
            .naive_utc()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string();

        let mut guard = self.lock_history()?;
        let history = &mut *guard;
        for prediction in &slate {
            let existing = history.rows.iter_mut().find(|r| {
                r.season == Some(season)
                    && r.prediction.week == Some(week)
                    && r.prediction.game_id == prediction.game_id
            });
            match existing {
                Some(row) => {
                    row.prediction = prediction.clone();
                    row.created_at = Some(created_at.clone());
                }
                None => {
                    let id = history.next_id;
                    history.next_id += 1;
                    history.rows.push(HistoryRow {
                        id: Some(id),
                        season: Some(season),
                        created_at: Some(created_at.clone()),
                        prediction: prediction.clone(),
                    });
                }
            }
        }

        Ok(Some(SnapshotReceipt {
            ok: true,
            saved: Some(slate.len()),
            season: Some(season),
            week: Some(week),
        }))
    }

    fn health(&self) -> Result<Health> {
        let cache_size = self.lock_history()?.predicted.len() as u64;
        Ok(Health {
            ok: true,
            cache_size: Some(cache_size),
            cache_ttl: Some(900),
            defaults: Some(self.defaults.clone()),
        })
    }
}

pub fn demo_slate(season: i32, week: u32) -> Vec<PredictionRow> {
    let seed = (season as u64) * 100 + u64::from(week);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut teams: Vec<&str> = TEAMS.to_vec();
    // Fisher-Yates so each week pairs different opponents.
    for i in (1..teams.len()).rev() {
        let j = rng.gen_range(0..=i);
        teams.swap(i, j);
    }

    let mut rows: Vec<PredictionRow> = teams
        .chunks(2)
        .map(|pair| demo_game(&mut rng, season, week, pair[0], pair[1]))
        .collect();
    rows.sort_by(|a, b| {
        let pa = a.pick_prob.unwrap_or(0.0);
        let pb = b.pick_prob.unwrap_or(0.0);
        pb.total_cmp(&pa)
    });
    rows
}

fn demo_game(rng: &mut StdRng, season: i32, week: u32, away: &str, home: &str) -> PredictionRow {
    let mut epa = || (rng.gen_range(-0.20..0.20_f64) * 1000.0).round() / 1000.0;
    let home_off = epa();
    let away_def = epa();
    let away_off = epa();
    let home_def = epa();

    let home_off_vs_away_def = home_off - away_def;
    let away_off_vs_home_def = away_off - home_def;
    let net = home_off_vs_away_def - away_off_vs_home_def;

    let k_pair = if rng.gen_bool(0.1) {
        None
    } else {
        Some((rng.gen_range(56.0..68.0_f64) * 100.0).round() / 100.0)
    };
    let margin = HOME_FIELD_POINTS + POINTS_PER_EPA_PLAY * k_pair.unwrap_or(DEFAULT_K_PAIR) * net;
    let home_win_prob = normal_cdf(margin / MARGIN_SIGMA);
    let (pick, pick_prob) = if home_win_prob >= 0.5 {
        (home, home_win_prob)
    } else {
        (away, 1.0 - home_win_prob)
    };

    PredictionRow {
        game_id: format!("{season}_{week:02}_{away}_{home}"),
        week: Some(week),
        away_team: away.to_string(),
        home_team: home.to_string(),
        pred_margin: Some(margin),
        home_win_prob: Some(home_win_prob),
        pick: Some(pick.to_string()),
        pick_prob: Some(pick_prob),
        home_off_epa: maybe(rng, home_off),
        away_def_epa_allowed: maybe(rng, away_def),
        home_off_vs_away_def: Some(home_off_vs_away_def),
        away_off_epa: maybe(rng, away_off),
        home_def_epa_allowed: maybe(rng, home_def),
        away_off_vs_home_def: Some(away_off_vs_home_def),
        net_epa_per_play: if rng.gen_bool(0.05) { None } else { Some(net) },
        k_pair,
    }
}

// Thin samples early in the season leave some splits unrated.
fn maybe(rng: &mut StdRng, v: f64) -> Option<f64> {
    if rng.gen_bool(0.08) { None } else { Some(v) }
}

// Abramowitz & Stegun 7.1.26, max abs error ~1.5e-7.
fn normal_cdf(z: f64) -> f64 {
    let x = z / std::f64::consts::SQRT_2;
    let t = 1.0 / (1.0 + 0.327_591_1 * x.abs());
    let poly = t
        * (0.254_829_592
            + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    let erf = 1.0 - poly * (-x * x).exp();
    let erf = if x >= 0.0 { erf } else { -erf };
    0.5 * (1.0 + erf)
}
