use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::SheetSyncConfig;

/// One well-formed spreadsheet row.
///
/// Column layout: row id, date, day of week (ignored), time, title, slots,
/// price.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub row_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub title: String,
    pub slots: i32,
    pub price: f64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SyncSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Pulls training rows from the Google Sheets values API and upserts them
/// into the catalog, keyed by the spreadsheet row id.
pub struct SheetSyncService {
    db: PgPool,
    http: Client,
    config: SheetSyncConfig,
}

impl SheetSyncService {
    pub fn new(db: PgPool, config: SheetSyncConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { db, http, config })
    }

    pub async fn sync(&self) -> Result<SyncSummary> {
        let (rows, skipped) = self.fetch_rows().await?;

        if rows.is_empty() {
            warn!("No usable rows retrieved from sheet {}", self.config.sheet_id);
            return Ok(SyncSummary {
                skipped,
                ..SyncSummary::default()
            });
        }

        let mut summary = self.upsert_rows(&rows).await?;
        summary.skipped = skipped;

        info!(
            "Sheet sync completed: {} created, {} updated, {} skipped",
            summary.created, summary.updated, summary.skipped
        );

        Ok(summary)
    }

    /// Fetch and parse the configured range. Returns the usable rows and
    /// the number of rows skipped as malformed.
    pub async fn fetch_rows(&self) -> Result<(Vec<SheetRow>, usize)> {
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}?key={}",
            self.config.base_url, self.config.sheet_id, self.config.range, self.config.api_key
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("Failed to reach the sheets API")?;

        if !response.status().is_success() {
            anyhow::bail!("Sheets API returned {}", response.status());
        }

        let body = response
            .json::<ValuesResponse>()
            .await
            .context("Failed to parse sheets API response")?;

        let mut rows = Vec::with_capacity(body.values.len());
        let mut skipped = 0;

        for cells in &body.values {
            match parse_row(cells) {
                Some(row) => rows.push(row),
                None => skipped += 1,
            }
        }

        Ok((rows, skipped))
    }

    async fn upsert_rows(&self, rows: &[SheetRow]) -> Result<SyncSummary> {
        let row_ids: Vec<String> = rows.iter().map(|row| row.row_id.clone()).collect();

        let existing: HashSet<String> =
            sqlx::query_scalar::<_, String>("SELECT sheet_row_id FROM trainings WHERE sheet_row_id = ANY($1)")
                .bind(&row_ids)
                .fetch_all(&self.db)
                .await?
                .into_iter()
                .collect();

        let mut summary = SyncSummary::default();

        for row in rows {
            // New rows start with every seat free; existing rows keep their
            // counter, clamped to the (possibly reduced) capacity.
            let query = "INSERT INTO trainings \
                    (sheet_row_id, date, time, title, slots, slots_available, price) \
                 VALUES ($1, $2, $3, $4, $5, $5, $6) \
                 ON CONFLICT (sheet_row_id) DO UPDATE SET \
                    date = EXCLUDED.date, \
                    time = EXCLUDED.time, \
                    title = EXCLUDED.title, \
                    slots = EXCLUDED.slots, \
                    slots_available = LEAST(trainings.slots_available, EXCLUDED.slots), \
                    price = EXCLUDED.price, \
                    updated_at = $7";

            sqlx::query(query)
                .bind(&row.row_id)
                .bind(row.date)
                .bind(row.time)
                .bind(&row.title)
                .bind(row.slots)
                .bind(row.price)
                .bind(Utc::now())
                .execute(&self.db)
                .await
                .with_context(|| format!("Failed to upsert sheet row {}", row.row_id))?;

            if existing.contains(&row.row_id) {
                summary.updated += 1;
            } else {
                summary.created += 1;
            }
        }

        Ok(summary)
    }
}

/// Parse one raw sheet row, logging and rejecting malformed input so a bad
/// row never aborts the whole sync.
pub fn parse_row(cells: &[String]) -> Option<SheetRow> {
    if cells.len() < 7 {
        warn!("Skipping incomplete sheet row: {:?}", cells);
        return None;
    }

    let date = match parse_date(&cells[1]) {
        Some(date) => date,
        None => {
            warn!("Skipping sheet row with invalid date '{}'", cells[1]);
            return None;
        }
    };

    let time = match parse_time(&cells[3]) {
        Some(time) => time,
        None => {
            warn!("Skipping sheet row with invalid time '{}'", cells[3]);
            return None;
        }
    };

    let slots = match cells[5].trim().parse::<i32>() {
        Ok(slots) if slots >= 0 => slots,
        _ => {
            warn!("Skipping sheet row with invalid slot count '{}'", cells[5]);
            return None;
        }
    };

    let price = match cells[6].trim().replace(',', ".").parse::<f64>() {
        Ok(price) if price >= 0.0 => price,
        _ => {
            warn!("Skipping sheet row with invalid price '{}'", cells[6]);
            return None;
        }
    };

    Some(SheetRow {
        row_id: cells[0].trim().to_string(),
        date,
        time,
        title: cells[4].trim().to_string(),
        slots,
        price,
    })
}

/// Dates arrive either as `dd.mm.yy` or ISO `YYYY-mm-dd`.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%d.%m.%y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// Times arrive either as `HH:MM` or `HH.MM`.
fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H.%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_well_formed_row() {
        let row = parse_row(&cells(&[
            "7", "14.03.25", "Friday", "18:30", "Yoga Class", "12", "450.00",
        ]))
        .unwrap();

        assert_eq!(row.row_id, "7");
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        assert_eq!(row.time, NaiveTime::from_hms_opt(18, 30, 0).unwrap());
        assert_eq!(row.title, "Yoga Class");
        assert_eq!(row.slots, 12);
        assert_eq!(row.price, 450.0);
    }

    #[test]
    fn test_parse_alternate_formats() {
        let row = parse_row(&cells(&[
            "8", "2025-03-14", "Friday", "18.30", "Pilates", "8", "300,50",
        ]))
        .unwrap();

        assert_eq!(row.date, NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        assert_eq!(row.time, NaiveTime::from_hms_opt(18, 30, 0).unwrap());
        assert_eq!(row.price, 300.5);
    }

    #[test]
    fn test_short_row_is_skipped() {
        assert!(parse_row(&cells(&["7", "14.03.25", "Friday", "18:30"])).is_none());
    }

    #[test]
    fn test_invalid_date_is_skipped() {
        assert!(parse_row(&cells(&[
            "7", "not-a-date", "Friday", "18:30", "Yoga", "12", "450",
        ]))
        .is_none());
    }

    #[test]
    fn test_invalid_time_is_skipped() {
        assert!(parse_row(&cells(&[
            "7", "14.03.25", "Friday", "25:99", "Yoga", "12", "450",
        ]))
        .is_none());
    }

    #[test]
    fn test_invalid_slots_and_price_are_skipped() {
        assert!(parse_row(&cells(&[
            "7", "14.03.25", "Friday", "18:30", "Yoga", "lots", "450",
        ]))
        .is_none());
        assert!(parse_row(&cells(&[
            "7", "14.03.25", "Friday", "18:30", "Yoga", "12", "free",
        ]))
        .is_none());
        assert!(parse_row(&cells(&[
            "7", "14.03.25", "Friday", "18:30", "Yoga", "-3", "450",
        ]))
        .is_none());
    }
}
