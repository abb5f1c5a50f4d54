use reqwest::Client;
use serde::Deserialize;
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;

/// Lookup result for the caller's own public IP, as reported by ip-api.com.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GeoRecord {
    pub status: String,
    pub country: String,
    pub country_code: String,
    pub region: String,
    pub region_name: String,
    pub city: String,
    pub zip: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    pub timezone: String,
    pub isp: String,
    pub org: String,
    #[serde(rename = "as")]
    pub as_number: String,
    pub query: String,
}

impl GeoRecord {
    /// Field value by its JSON name, in the form it is rendered into mail.
    pub fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        let value = match name {
            "status" => Cow::Borrowed(self.status.as_str()),
            "country" => Cow::Borrowed(self.country.as_str()),
            "countryCode" => Cow::Borrowed(self.country_code.as_str()),
            "region" => Cow::Borrowed(self.region.as_str()),
            "regionName" => Cow::Borrowed(self.region_name.as_str()),
            "city" => Cow::Borrowed(self.city.as_str()),
            "zip" => Cow::Borrowed(self.zip.as_str()),
            "lat" => Cow::Owned(self.latitude.to_string()),
            "lon" => Cow::Owned(self.longitude.to_string()),
            "timezone" => Cow::Borrowed(self.timezone.as_str()),
            "isp" => Cow::Borrowed(self.isp.as_str()),
            "org" => Cow::Borrowed(self.org.as_str()),
            "as" => Cow::Borrowed(self.as_number.as_str()),
            "query" => Cow::Borrowed(self.query.as_str()),
            _ => return None,
        };
        Some(value)
    }
}

#[derive(Debug, Error)]
pub enum GeolocationError {
    #[error("error requesting geolocation: {0}")]
    Network(#[from] reqwest::Error),

    #[error("error decoding geolocation response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Clone, Debug)]
pub struct GeolocationClient {
    http_client: Client,
    url: String,
}

impl GeolocationClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, GeolocationError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            url: url.to_string(),
        })
    }

    #[tracing::instrument(name = "fetching geolocation", skip(self), fields(url = %self.url))]
    pub async fn fetch(&self) -> Result<GeoRecord, GeolocationError> {
        let body = self
            .http_client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let record = serde_json::from_str::<GeoRecord>(&body)?;
        tracing::debug!(query = %record.query, status = %record.status, "geolocation received");
        Ok(record)
    }
}
