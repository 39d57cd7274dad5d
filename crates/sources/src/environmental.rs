//! Environmental layers served by griddap, cached on disk.

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use seascape_common::{GridCell, SeascapeResult};

use crate::cache::LayerCache;
use crate::catalog::LayerDescriptor;
use crate::griddap::{parse_griddap_csv, GriddapClient};
use crate::source::{EnvironmentalSource, GridQuery};

/// Default ERDDAP for Bio-ORACLE layers.
pub const DEFAULT_BIO_ORACLE_URL: &str = "https://erddap.bio-oracle.org/erddap";

pub struct GriddapEnvironmentalSource<'a> {
    client: GriddapClient<'a>,
    cache: LayerCache,
}

impl<'a> GriddapEnvironmentalSource<'a> {
    pub fn new(client: GriddapClient<'a>, cache: LayerCache) -> Self {
        Self { client, cache }
    }
}

#[async_trait]
impl EnvironmentalSource for GriddapEnvironmentalSource<'_> {
    #[instrument(skip(self, query), fields(layer = %layer.code))]
    async fn fetch_layer(
        &self,
        layer: &LayerDescriptor,
        query: &GridQuery,
    ) -> SeascapeResult<Vec<GridCell>> {
        let body = match self.cache.load(&layer.code, query).await? {
            Some(body) => body,
            None => {
                let fetched = self
                    .client
                    .fetch_csv(
                        &layer.griddap_id,
                        &layer.variable,
                        layer.time_constraint.as_deref(),
                        query,
                    )
                    .await?;
                let Some(body) = fetched else {
                    warn!("Layer has no data in the requested extent");
                    return Ok(Vec::new());
                };
                self.cache.store(&layer.code, query, &body).await?;
                body
            }
        };

        let cells = parse_griddap_csv(&body, &layer.variable, self.client.base_url())?;
        info!(cells = cells.len(), "Loaded environmental layer");
        Ok(cells)
    }
}
