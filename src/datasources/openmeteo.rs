use crate::config::WeatherConfig;
use crate::error::{Result, VineOpsError};
use crate::models::DailyObservation;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct OpenMeteoClient {
    client: reqwest::Client,
    config: WeatherConfig,
}

// Open-Meteo archive API response structures. Every daily array is aligned
// index-by-index with `time`; days the archive has not ingested yet come
// back as nulls.
#[derive(Debug, Deserialize)]
struct OmArchiveResponse {
    #[serde(default)]
    daily: OmDaily,
}

#[derive(Debug, Default, Deserialize)]
struct OmDaily {
    #[serde(default)]
    time: Vec<NaiveDate>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    sunshine_duration: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

impl OpenMeteoClient {
    pub fn new(config: WeatherConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Fetch daily observations for one location over an inclusive date range.
    pub async fn fetch_daily_range(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyObservation>> {
        let mut url = format!(
            "{}/archive?latitude={}&longitude={}&start_date={}&end_date={}\
             &daily=temperature_2m_max,temperature_2m_min,sunshine_duration,precipitation_sum\
             &timezone=auto",
            self.config.base_url, latitude, longitude, start, end
        );
        if let Some(api_key) = &self.config.api_key {
            url.push_str(&format!("&apikey={}", api_key));
        }

        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| VineOpsError::DataSourceUnavailable(format!("Open-Meteo: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VineOpsError::DataSourceUnavailable(format!(
                "Open-Meteo returned {}: {}",
                status, body
            )));
        }

        let om_response: OmArchiveResponse = response.json().await.map_err(|e| {
            VineOpsError::DataSourceUnavailable(format!(
                "Failed to parse Open-Meteo response: {}",
                e
            ))
        })?;

        Ok(convert_response(om_response))
    }

    /// Test connection to the Open-Meteo archive API with a single-day probe.
    pub async fn test_connection(&self, latitude: f64, longitude: f64) -> Result<bool> {
        let probe = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        let url = format!(
            "{}/archive?latitude={}&longitude={}&start_date={}&end_date={}&daily=temperature_2m_max&timezone=auto",
            self.config.base_url, latitude, longitude, probe, probe
        );

        let response = self.client.get(&url).timeout(REQUEST_TIMEOUT).send().await?;
        Ok(response.status().is_success())
    }
}

fn convert_response(response: OmArchiveResponse) -> Vec<DailyObservation> {
    let daily = response.daily;
    let mut observations = Vec::with_capacity(daily.time.len());

    for (idx, day) in daily.time.iter().enumerate() {
        let mut observation = DailyObservation::new(*day);
        observation.temp_max_c = value_at(&daily.temperature_2m_max, idx);
        observation.temp_min_c = value_at(&daily.temperature_2m_min, idx);
        observation.sunshine_hours = value_at(&daily.sunshine_duration, idx).map(|s| s / 3600.0);
        observation.precipitation_mm = value_at(&daily.precipitation_sum, idx);

        // Days with no fields at all are not yet in the archive; skip them
        // so the cache never stores placeholder rows.
        if observation.is_empty() {
            continue;
        }
        observations.push(observation);
    }

    observations
}

fn value_at(values: &[Option<f64>], idx: usize) -> Option<f64> {
    values.get(idx).copied().flatten()
}
