use crate::config::Config;
use crate::error::MapsError;

/// Validates configuration objects for consistency and correctness
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates an upstream endpoint URL
    pub fn validate_endpoint_url(name: &str, url: &str) -> Result<(), MapsError> {
        if url.is_empty() {
            return Err(MapsError::Validation(format!("{} cannot be empty", name)));
        }

        let parsed = reqwest::Url::parse(url)
            .map_err(|e| MapsError::Validation(format!("{} is not a valid URL: {}", name, e)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(MapsError::Validation(format!(
                "{} must start with 'http://' or 'https://'",
                name
            )));
        }

        Ok(())
    }

    /// Validates upstream rate limit parameters
    pub fn validate_rate_limit(rate_per_second: u32, burst: u32) -> Result<(), MapsError> {
        if rate_per_second == 0 {
            return Err(MapsError::Validation(
                "Rate limit per second must be greater than 0".to_string(),
            ));
        }

        if burst == 0 {
            return Err(MapsError::Validation(
                "Rate limit burst must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates fan-out limits
    pub fn validate_fan_out(
        batch_max_items: usize,
        batch_concurrency: usize,
        nearby_max_results: usize,
    ) -> Result<(), MapsError> {
        if batch_max_items == 0 {
            return Err(MapsError::Validation(
                "Batch size limit must be greater than 0".to_string(),
            ));
        }

        if batch_concurrency == 0 {
            return Err(MapsError::Validation(
                "Batch concurrency must be greater than 0".to_string(),
            ));
        }

        if nearby_max_results == 0 {
            return Err(MapsError::Validation(
                "Nearby result limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn validate_timeout(timeout_secs: u64) -> Result<(), MapsError> {
        if timeout_secs == 0 {
            return Err(MapsError::Validation(
                "Request timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Validates the whole service configuration.
    ///
    /// A missing API key is not an error here: the service still starts and
    /// reports itself degraded.
    pub fn validate(config: &Config) -> Result<(), MapsError> {
        Self::validate_endpoint_url("GOOGLE_MAPS_GEOCODING_URL", &config.geocoding_url)?;
        Self::validate_endpoint_url("GOOGLE_MAPS_PLACES_URL", &config.places_url)?;
        Self::validate_endpoint_url("GOOGLE_MAPS_DIRECTIONS_URL", &config.directions_url)?;
        Self::validate_endpoint_url("GOOGLE_MAPS_DISTANCE_MATRIX_URL", &config.distance_matrix_url)?;
        Self::validate_rate_limit(config.rate_limit_per_second, config.rate_limit_burst)?;
        Self::validate_fan_out(
            config.batch_max_items,
            config.batch_concurrency,
            config.nearby_max_results,
        )?;
        Self::validate_timeout(config.request_timeout_secs)?;

        Ok(())
    }
}
