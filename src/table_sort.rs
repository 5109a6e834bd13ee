use std::cmp::Ordering;

use crate::rows::{HistoryRow, PredictionRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Season,
    CreatedAt,
    GameId,
    Week,
    AwayTeam,
    HomeTeam,
    PredMargin,
    HomeWinProb,
    Pick,
    PickProb,
    HomeOffEpa,
    AwayDefEpaAllowed,
    HomeOffVsAwayDef,
    AwayOffEpa,
    HomeDefEpaAllowed,
    AwayOffVsHomeDef,
    NetEpaPerPlay,
    KPair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// A cell value as seen by the comparator. Absent cells are `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortValue<'a> {
    Num(f64),
    Text(&'a str),
}

pub trait SortableRow {
    fn sort_value(&self, column: Column) -> Option<SortValue<'_>>;
    fn pick_prob(&self) -> Option<f64>;
    /// Identity that survives re-sorting and refetching.
    fn row_key(&self) -> String;
}

impl SortableRow for PredictionRow {
    fn sort_value(&self, column: Column) -> Option<SortValue<'_>> {
        let num = |v: Option<f64>| v.map(SortValue::Num);
        match column {
            Column::GameId => Some(SortValue::Text(&self.game_id)),
            Column::Week => self.week.map(|w| SortValue::Num(f64::from(w))),
            Column::AwayTeam => Some(SortValue::Text(&self.away_team)),
            Column::HomeTeam => Some(SortValue::Text(&self.home_team)),
            Column::PredMargin => num(self.pred_margin),
            Column::HomeWinProb => num(self.home_win_prob),
            Column::Pick => self.pick.as_deref().map(SortValue::Text),
            Column::PickProb => num(self.pick_prob),
            Column::HomeOffEpa => num(self.home_off_epa),
            Column::AwayDefEpaAllowed => num(self.away_def_epa_allowed),
            Column::HomeOffVsAwayDef => num(self.home_off_vs_away_def),
            Column::AwayOffEpa => num(self.away_off_epa),
            Column::HomeDefEpaAllowed => num(self.home_def_epa_allowed),
            Column::AwayOffVsHomeDef => num(self.away_off_vs_home_def),
            Column::NetEpaPerPlay => num(self.net_epa_per_play),
            Column::KPair => num(self.k_pair),
            Column::Id | Column::Season | Column::CreatedAt => None,
        }
    }

    fn pick_prob(&self) -> Option<f64> {
        self.pick_prob
    }

    fn row_key(&self) -> String {
        self.game_id.clone()
    }
}

impl SortableRow for HistoryRow {
    fn sort_value(&self, column: Column) -> Option<SortValue<'_>> {
        match column {
            Column::Id => self.id.map(|id| SortValue::Num(id as f64)),
            Column::Season => self.season.map(|s| SortValue::Num(f64::from(s))),
            // ISO-8601 strings order chronologically as text.
            Column::CreatedAt => self.created_at.as_deref().map(SortValue::Text),
            other => self.prediction.sort_value(other),
        }
    }

    fn pick_prob(&self) -> Option<f64> {
        self.prediction.pick_prob
    }

    fn row_key(&self) -> String {
        match self.id {
            Some(id) => id.to_string(),
            None => self.prediction.game_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSort {
    pub column: Column,
    pub direction: SortDirection,
}

impl Default for TableSort {
    fn default() -> Self {
        Self {
            column: Column::PickProb,
            direction: SortDirection::Descending,
        }
    }
}

impl TableSort {
    pub fn new(column: Column, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    /// Same column flips the direction; a new column starts descending.
    pub fn select(&mut self, column: Column) {
        if self.column == column {
            self.direction = self.direction.flipped();
        } else {
            self.column = column;
            self.direction = SortDirection::Descending;
        }
    }

    pub fn compare<R: SortableRow>(&self, a: &R, b: &R) -> Ordering {
        let primary = compare_values(a.sort_value(self.column), b.sort_value(self.column));
        let primary = match self.direction {
            SortDirection::Ascending => primary,
            SortDirection::Descending => primary.reverse(),
        };
        primary.then_with(|| tie_break(a, b))
    }

    /// Ordered references into `rows`; the slice itself is left untouched.
    pub fn sorted<'a, R: SortableRow>(&self, rows: &'a [R]) -> Vec<&'a R> {
        let mut view: Vec<&R> = rows.iter().collect();
        view.sort_by(|a, b| self.compare(*a, *b));
        view
    }
}

// Pick probability, highest first regardless of the primary direction.
fn tie_break<R: SortableRow>(a: &R, b: &R) -> Ordering {
    let a = a.pick_prob().unwrap_or(0.0);
    let b = b.pick_prob().unwrap_or(0.0);
    cmp_num(b, a)
}

// -0.0 and 0.0 are the same value here.
fn cmp_num(a: f64, b: f64) -> Ordering {
    let a = if a == 0.0 { 0.0 } else { a };
    let b = if b == 0.0 { 0.0 } else { b };
    a.total_cmp(&b)
}

// Absent ranks as negative infinity.
fn compare_values(a: Option<SortValue<'_>>, b: Option<SortValue<'_>>) -> Ordering {
    match (a, b) {
        (Some(SortValue::Num(a)), Some(SortValue::Num(b))) => cmp_num(a, b),
        (Some(SortValue::Num(a)), None) => cmp_num(a, f64::NEG_INFINITY),
        (None, Some(SortValue::Num(b))) => cmp_num(f64::NEG_INFINITY, b),
        (Some(SortValue::Text(a)), Some(SortValue::Text(b))) => a.cmp(b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
        // A column never mixes kinds; numbers rank below text if it ever does.
        (Some(SortValue::Num(_)), Some(SortValue::Text(_))) => Ordering::Less,
        (Some(SortValue::Text(_)), Some(SortValue::Num(_))) => Ordering::Greater,
    }
}

pub fn column_label(column: Column) -> &'static str {
    match column {
        Column::Id => "ID",
        Column::Season => "Season",
        Column::CreatedAt => "Saved",
        Column::GameId => "Game",
        Column::Week => "Wk",
        Column::AwayTeam => "Away",
        Column::HomeTeam => "Home",
        Column::PredMargin => "Margin",
        Column::HomeWinProb => "Home Win",
        Column::Pick => "Pick",
        Column::PickProb => "Pick %",
        Column::HomeOffEpa => "H Off",
        Column::AwayDefEpaAllowed => "A Def",
        Column::HomeOffVsAwayDef => "H Off-A Def",
        Column::AwayOffEpa => "A Off",
        Column::HomeDefEpaAllowed => "H Def",
        Column::AwayOffVsHomeDef => "A Off-H Def",
        Column::NetEpaPerPlay => "Net EPA",
        Column::KPair => "K pair",
    }
}

pub fn direction_arrow(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Ascending => "▲",
        SortDirection::Descending => "▼",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_infinity_value_ties_with_missing() {
        assert_eq!(
            compare_values(Some(SortValue::Num(f64::NEG_INFINITY)), None),
            Ordering::Equal
        );
        assert_eq!(
            compare_values(None, Some(SortValue::Num(-1.0e300))),
            Ordering::Less
        );
    }

    #[test]
    fn signed_zeros_compare_equal() {
        assert_eq!(
            compare_values(Some(SortValue::Num(-0.0)), Some(SortValue::Num(0.0))),
            Ordering::Equal
        );
    }

    #[test]
    fn missing_text_ranks_lowest() {
        assert_eq!(
            compare_values(None, Some(SortValue::Text(""))),
            Ordering::Less
        );
    }
}
