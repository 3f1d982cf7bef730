//! HTTP-backed resolver for the cellphonetrackers.org cell search endpoint.

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use towermap_shared::{
    IRAN_MCC, LookupSettings, Operator, ResolvedLocation, Result, TowerMapError, TowerRecord,
};

use crate::extract::{AnchorTextExtractor, CoordinateExtractor};
use crate::{Lookup, TowerResolver};

/// User-Agent string for lookup requests.
const USER_AGENT: &str = concat!("towermap/", env!("CARGO_PKG_VERSION"));

/// Resolves towers by querying the cell search service, one GET per tower.
pub struct HttpResolver<E = AnchorTextExtractor> {
    client: Client,
    base_url: Url,
    extractor: E,
}

impl HttpResolver<AnchorTextExtractor> {
    /// Create a resolver using the default anchor-text extraction strategy.
    pub fn new(settings: &LookupSettings) -> Result<Self> {
        Self::with_extractor(settings, AnchorTextExtractor)
    }
}

impl<E: CoordinateExtractor> HttpResolver<E> {
    /// Create a resolver with a custom extraction strategy.
    pub fn with_extractor(settings: &LookupSettings, extractor: E) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| TowerMapError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            extractor,
        })
    }

    /// The request URL for one tower.
    pub fn lookup_url(&self, operator: Operator, record: TowerRecord) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("mcc", &IRAN_MCC.to_string())
            .append_pair("mnc", &operator.mnc().to_string())
            .append_pair("lac", &record.lac.to_string())
            .append_pair("cid", &record.cid.to_string());
        url
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| TowerMapError::Lookup(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TowerMapError::Lookup(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| TowerMapError::Lookup(format!("{url}: failed to read body: {e}")))
    }
}

impl<E: CoordinateExtractor> TowerResolver for HttpResolver<E> {
    #[instrument(skip_all, fields(operator = %operator, lac = record.lac, cid = record.cid))]
    async fn resolve(&self, operator: Operator, record: TowerRecord) -> Result<Lookup> {
        let url = self.lookup_url(operator, record);
        debug!(%url, "querying cell search");

        let body = self.fetch(&url).await?;

        match self.extractor.extract(&body) {
            Some(coords) => {
                debug!(
                    lat = %coords.latitude,
                    lon = %coords.longitude,
                    extractor = self.extractor.name(),
                    "tower located"
                );
                Ok(Lookup::Found(ResolvedLocation {
                    record,
                    operator,
                    latitude: coords.latitude,
                    longitude: coords.longitude,
                }))
            }
            None => {
                debug!(body_len = body.len(), "no coordinates in response");
                Ok(Lookup::NotFound)
            }
        }
    }
}
