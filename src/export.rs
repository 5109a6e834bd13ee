use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::format::{history_cell, prediction_cell};
use crate::rows::{HistoryRow, PredictionRow};
use crate::state::{AppState, Screen};
use crate::table_sort::{Column, column_label};

/// A frozen copy of what the active page shows, ready to write off-thread.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportJob {
    pub path: PathBuf,
    pub sheet: String,
    pub rows: Vec<Vec<String>>,
}

impl ExportJob {
    /// Data rows, excluding the header.
    pub fn record_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }
}

pub fn export_file_name(screen: Screen, season: i32, week: u32) -> String {
    let page = match screen {
        Screen::Predictions => "predictions",
        Screen::History => "history",
    };
    format!("picks_{page}_{season}_w{week}.xlsx")
}

pub fn build_export_job(state: &AppState, dir: &Path) -> ExportJob {
    let path = dir.join(export_file_name(state.screen, state.season, state.week));
    match state.screen {
        Screen::Predictions => ExportJob {
            path,
            sheet: "Predictions".to_string(),
            rows: prediction_table(&state.predictions.sorted_rows(), state.predictions.columns),
        },
        Screen::History => ExportJob {
            path,
            sheet: "History".to_string(),
            rows: history_table(&state.history.sorted_rows(), state.history.columns),
        },
    }
}

fn prediction_table(rows: &[&PredictionRow], columns: &[Column]) -> Vec<Vec<String>> {
    let mut out = vec![columns.iter().map(|c| column_label(*c).to_string()).collect()];
    for row in rows {
        out.push(columns.iter().map(|c| prediction_cell(row, *c)).collect());
    }
    out
}

fn history_table(rows: &[&HistoryRow], columns: &[Column]) -> Vec<Vec<String>> {
    let mut out = vec![columns.iter().map(|c| column_label(*c).to_string()).collect()];
    for row in rows {
        out.push(columns.iter().map(|c| history_cell(row, *c)).collect());
    }
    out
}

pub fn write_export(job: &ExportJob) -> Result<usize> {
    if let Some(dir) = job.path.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed creating {}", dir.display()))?;
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(&job.sheet)?;
        write_rows(sheet, &job.rows)?;
    }
    workbook
        .save(&job.path)
        .with_context(|| format!("failed writing workbook to {}", job.path.display()))?;
    Ok(job.record_count())
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
