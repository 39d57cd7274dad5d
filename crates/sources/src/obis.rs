//! OBIS v3 occurrence API client.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use seascape_common::{RawOccurrence, SeascapeResult};

use crate::fetch::FetchSession;
use crate::source::{OccurrenceQuery, OccurrenceSource};

pub const DEFAULT_OBIS_URL: &str = "https://api.obis.org/v3";

/// Records requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 5000;

#[derive(Debug, Deserialize)]
struct ObisPage {
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    results: Vec<ObisRecord>,
}

#[derive(Debug, Deserialize)]
struct ObisRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "scientificName", default)]
    scientific_name: Option<String>,
    #[serde(rename = "decimalLongitude", default)]
    decimal_longitude: Option<f64>,
    #[serde(rename = "decimalLatitude", default)]
    decimal_latitude: Option<f64>,
    /// Darwin Core leaves this as free text; OBIS returns strings or numbers.
    #[serde(rename = "individualCount", default)]
    individual_count: Option<serde_json::Value>,
    #[serde(default)]
    date_year: Option<i32>,
}

impl ObisRecord {
    fn into_raw(self) -> RawOccurrence {
        RawOccurrence {
            species: self
                .scientific_name
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "unidentified".to_string()),
            longitude: self.decimal_longitude,
            latitude: self.decimal_latitude,
            individual_count: self.individual_count.as_ref().and_then(parse_count),
            year: self.date_year,
        }
    }
}

fn parse_count(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
            .and_then(|v| u32::try_from(v).ok()),
        serde_json::Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

pub struct ObisClient<'a> {
    session: &'a FetchSession,
    base_url: String,
    page_size: usize,
}

impl<'a> ObisClient<'a> {
    pub fn new(session: &'a FetchSession, base_url: impl Into<String>) -> Self {
        Self {
            session,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn params(&self, query: &OccurrenceQuery, size: usize, after: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("geometry", query.geometry_wkt.clone()),
            ("size", size.to_string()),
        ];
        if let Some(year) = query.year {
            params.push(("startdate", year.start_date().to_string()));
            params.push(("enddate", year.end_date().to_string()));
        }
        if let Some(name) = &query.scientific_name {
            params.push(("scientificname", name.clone()));
        }
        if let Some(after) = after {
            params.push(("after", after.to_string()));
        }
        params
    }
}

#[async_trait]
impl OccurrenceSource for ObisClient<'_> {
    #[instrument(skip(self, query), fields(year = ?query.year.map(|y| y.year())))]
    async fn fetch_occurrences(&self, query: &OccurrenceQuery) -> SeascapeResult<Vec<RawOccurrence>> {
        let url = format!("{}/occurrence", self.base_url);
        let mut out: Vec<RawOccurrence> = Vec::new();
        let mut after: Option<String> = None;

        while out.len() < query.max_records {
            let size = self.page_size.min(query.max_records - out.len());
            let params = self.params(query, size, after.as_deref());
            let page: ObisPage = self.session.get_json(&url, &params).await?;

            let received = page.results.len();
            debug!(received, total = ?page.total, "Received occurrence page");

            after = page.results.last().and_then(|r| r.id.clone());
            out.extend(page.results.into_iter().map(ObisRecord::into_raw));

            let exhausted = page.total.is_some_and(|t| out.len() as u64 >= t);
            if received < size || after.is_none() || exhausted {
                break;
            }
        }

        info!(records = out.len(), "Fetched occurrences");
        Ok(out)
    }
}
