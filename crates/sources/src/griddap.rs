//! ERDDAP griddap client.
//!
//! Requests look like
//! `{base}/griddap/{dataset}.csv?{var}[(time)][(south):stride:(north)][(west):stride:(east)]`
//! and return CSV with one header row and one units row.

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use seascape_common::{GridCell, RemoteError, SeascapeResult};

use crate::fetch::FetchSession;
use crate::source::{BathymetrySource, GridQuery};

/// Default public ERDDAP for ETOPO bathymetry.
pub const DEFAULT_ERDDAP_URL: &str = "https://coastwatch.pfeg.noaa.gov/erddap";

/// Message ERDDAP puts in the 404 page when a valid request selects no data.
const NO_MATCHING_RESULTS: &str = "Your query produced no matching results";

/// Griddap dataset and variable holding bathymetry.
#[derive(Debug, Clone)]
pub struct BathymetryDataset {
    pub griddap_id: String,
    pub variable: String,
}

impl Default for BathymetryDataset {
    fn default() -> Self {
        Self {
            griddap_id: "etopo180".to_string(),
            variable: "altitude".to_string(),
        }
    }
}

/// Client for one ERDDAP server.
pub struct GriddapClient<'a> {
    session: &'a FetchSession,
    base_url: String,
    bathymetry: BathymetryDataset,
}

impl<'a> GriddapClient<'a> {
    pub fn new(session: &'a FetchSession, base_url: impl Into<String>) -> Self {
        Self {
            session,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bathymetry: BathymetryDataset::default(),
        }
    }

    pub fn with_bathymetry_dataset(mut self, dataset: BathymetryDataset) -> Self {
        self.bathymetry = dataset;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the full request URL for one variable over the query extent.
    pub fn request_url(
        &self,
        griddap_id: &str,
        variable: &str,
        time_constraint: Option<&str>,
        query: &GridQuery,
    ) -> String {
        let b = &query.bounds;
        let time = time_constraint.map(|t| format!("[{t}]")).unwrap_or_default();
        format!(
            "{}/griddap/{}.csv?{}{}[({}):{}:({})][({}):{}:({})]",
            self.base_url,
            griddap_id,
            variable,
            time,
            b.south(),
            query.stride,
            b.north(),
            b.west(),
            query.stride,
            b.east(),
        )
    }

    /// Download the raw CSV body. `Ok(None)` means the server found no data
    /// in the requested box; any other 404, such as an unknown dataset, is an
    /// error.
    #[instrument(skip(self, query), fields(dataset = %griddap_id, variable = %variable))]
    pub async fn fetch_csv(
        &self,
        griddap_id: &str,
        variable: &str,
        time_constraint: Option<&str>,
        query: &GridQuery,
    ) -> Result<Option<String>, RemoteError> {
        let url = self.request_url(griddap_id, variable, time_constraint, query);
        match self.session.get_text(&url, &[]).await {
            Ok(body) => Ok(Some(body)),
            Err(RemoteError::Http { status: 404, body, .. }) if body.contains(NO_MATCHING_RESULTS) => {
                debug!("No matching griddap results");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl BathymetrySource for GriddapClient<'_> {
    async fn fetch_bathymetry(&self, query: &GridQuery) -> SeascapeResult<Vec<GridCell>> {
        let BathymetryDataset {
            griddap_id,
            variable,
        } = &self.bathymetry;

        let Some(body) = self.fetch_csv(griddap_id, variable, None, query).await? else {
            return Ok(Vec::new());
        };
        let cells = parse_griddap_csv(&body, variable, &self.base_url)?;
        info!(cells = cells.len(), dataset = %griddap_id, "Fetched bathymetry grid");
        Ok(cells)
    }
}

/// Parse a griddap CSV body into cells.
///
/// Rows with unparsable coordinates are kept with NaN coordinates so the
/// loader can count and drop them; unparsable or NaN values become `None`.
pub fn parse_griddap_csv(body: &str, variable: &str, url: &str) -> Result<Vec<GridCell>, RemoteError> {
    let malformed = |message: String| RemoteError::MalformedPayload {
        url: url.to_string(),
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| malformed(format!("unreadable CSV header: {e}")))?
        .clone();

    let names: Vec<&str> = headers.iter().collect();
    let column = |name: &str| names.iter().position(|h| h.eq_ignore_ascii_case(name));
    let lat_idx = column("latitude").ok_or_else(|| malformed("missing latitude column".into()))?;
    let lon_idx = column("longitude").ok_or_else(|| malformed("missing longitude column".into()))?;
    let value_idx = column(variable)
        .or_else(|| {
            (0..names.len()).rev().find(|&i| {
                i != lat_idx && i != lon_idx && !names[i].eq_ignore_ascii_case("time")
            })
        })
        .ok_or_else(|| malformed(format!("missing {variable} column")))?;

    let mut cells = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| malformed(format!("row {row}: {e}")))?;
        let lat = parse_f64(record.get(lat_idx));
        let lon = parse_f64(record.get(lon_idx));

        // The first row after the header carries units, not data
        if row == 0 && lat.is_none() && lon.is_none() {
            continue;
        }

        cells.push(GridCell::new(
            lon.unwrap_or(f64::NAN),
            lat.unwrap_or(f64::NAN),
            parse_f64(record.get(value_idx)),
        ));
    }

    Ok(cells)
}

fn parse_f64(field: Option<&str>) -> Option<f64> {
    field
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
