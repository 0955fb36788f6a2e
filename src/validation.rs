use crate::error::MapsError;
use crate::models::{
    BatchGeocodeRequest, DistanceMatrixRequest, NearbySearchQuery, PlacesSearchRequest,
    ReverseGeocodeRequest,
};
use validator::Validate;

/// Request validation utilities
pub struct RequestValidator;

impl RequestValidator {
    /// Runs the declarative field rules of a request body
    pub fn validate<T: Validate>(req: &T) -> Result<(), MapsError> {
        req.validate()?;
        Ok(())
    }

    /// Parses a `"lat,lng"` location string
    pub fn parse_location(location: &str) -> Result<(f64, f64), MapsError> {
        let (lat, lng) = location.split_once(',').ok_or_else(|| {
            MapsError::Validation("Location must be in 'lat,lng' format".to_string())
        })?;

        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| MapsError::Validation(format!("Invalid latitude '{}'", lat.trim())))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|_| MapsError::Validation(format!("Invalid longitude '{}'", lng.trim())))?;

        Self::check_coordinates(lat, lng)?;
        Ok((lat, lng))
    }

    /// Rejects non-finite or out-of-range coordinates.
    ///
    /// Range rules alone let `NaN` through, and a `NaN` would otherwise
    /// share a cache key with coordinate 0.
    pub fn check_coordinates(lat: f64, lng: f64) -> Result<(), MapsError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(MapsError::Validation(
                "Coordinates must be finite numbers".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(MapsError::Validation(
                "Latitude must be between -90 and 90".to_string(),
            ));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(MapsError::Validation(
                "Longitude must be between -180 and 180".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_reverse_geocode(req: &ReverseGeocodeRequest) -> Result<(), MapsError> {
        Self::check_coordinates(req.latitude, req.longitude)?;
        Self::validate(req)
    }

    pub fn validate_nearby(query: &NearbySearchQuery) -> Result<(), MapsError> {
        Self::check_coordinates(query.latitude, query.longitude)?;
        Self::validate(query)
    }

    /// Field rules plus a non-blank check on every origin and destination
    pub fn validate_distance_matrix(req: &DistanceMatrixRequest) -> Result<(), MapsError> {
        Self::validate(req)?;

        let blank = |places: &[String]| places.iter().position(|p| p.trim().is_empty());
        if let Some(index) = blank(&req.origins) {
            return Err(MapsError::Validation(format!("Origin at index {} is empty", index)));
        }
        if let Some(index) = blank(&req.destinations) {
            return Err(MapsError::Validation(format!(
                "Destination at index {} is empty",
                index
            )));
        }

        Ok(())
    }

    /// Validates a place search: field rules, a parseable location, and at
    /// least a query or a location to search by
    pub fn validate_places_search(req: &PlacesSearchRequest) -> Result<(), MapsError> {
        Self::validate(req)?;

        if let Some(location) = req.location.as_deref().filter(|l| !l.is_empty()) {
            Self::parse_location(location)?;
        }

        let has_query = req.query.as_deref().is_some_and(|q| !q.trim().is_empty());
        let has_location = req.location.as_deref().is_some_and(|l| !l.trim().is_empty());
        if !has_query && !has_location {
            return Err(MapsError::Validation(
                "Either 'query' or 'location' is required".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates a batch geocode body; the size cap is enforced by the service
    pub fn validate_batch(req: &BatchGeocodeRequest) -> Result<(), MapsError> {
        Self::validate(req)?;

        if let Some(index) = req
            .addresses
            .iter()
            .position(|a| a.trim().is_empty() || a.chars().count() > 500)
        {
            return Err(MapsError::Validation(format!(
                "Address at index {} must be between 1 and 500 characters",
                index
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_location() {
        let (lat, lng) = RequestValidator::parse_location("25.0339639, 121.5644722").unwrap();
        assert_eq!(lat, 25.0339639);
        assert_eq!(lng, 121.5644722);
    }

    #[test]
    fn test_parse_location_rejects_bad_input() {
        assert!(RequestValidator::parse_location("25.03").is_err());
        assert!(RequestValidator::parse_location("north,121").is_err());
        assert!(RequestValidator::parse_location("95,121").is_err());
        assert!(RequestValidator::parse_location("25,190").is_err());
    }

    #[test]
    fn test_non_finite_coordinates_are_rejected() {
        assert!(RequestValidator::check_coordinates(f64::NAN, 121.5).is_err());
        assert!(RequestValidator::check_coordinates(25.0, f64::NAN).is_err());
        assert!(RequestValidator::check_coordinates(f64::INFINITY, 0.0).is_err());
        assert!(RequestValidator::parse_location("NaN,121.5").is_err());
        assert!(RequestValidator::check_coordinates(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_nearby_query_with_nan_latitude() {
        let query = NearbySearchQuery {
            latitude: f64::NAN,
            longitude: 121.5,
            radius: None,
            keyword: None,
        };
        let err = RequestValidator::validate_nearby(&query).unwrap_err();
        assert!(matches!(err, MapsError::Validation(_)));
    }

    #[test]
    fn test_distance_matrix_rejects_blank_destination() {
        let req = DistanceMatrixRequest {
            origins: vec!["台北車站".into()],
            destinations: vec!["台北101".into(), " ".into()],
            ..Default::default()
        };
        let err = RequestValidator::validate_distance_matrix(&req).unwrap_err();
        assert!(err.to_string().contains("Destination at index 1"));

        let req = DistanceMatrixRequest {
            origins: (0..26).map(|i| format!("origin {}", i)).collect(),
            destinations: vec!["台北101".into()],
            ..Default::default()
        };
        assert!(RequestValidator::validate_distance_matrix(&req).is_err());
    }

    #[test]
    fn test_places_search_needs_query_or_location() {
        let req = PlacesSearchRequest {
            query: None,
            location: None,
            radius: Some(1000),
            place_type: None,
            language: None,
            region: None,
        };
        assert!(RequestValidator::validate_places_search(&req).is_err());

        let req = PlacesSearchRequest {
            query: Some("諮商中心".into()),
            ..req
        };
        assert!(RequestValidator::validate_places_search(&req).is_ok());
    }

    #[test]
    fn test_batch_rejects_blank_address() {
        let req = BatchGeocodeRequest {
            addresses: vec!["台北101".into(), "  ".into()],
            language: None,
            region: None,
        };
        let err = RequestValidator::validate_batch(&req).unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }

    #[test]
    fn test_batch_rejects_empty_list() {
        let req = BatchGeocodeRequest {
            addresses: vec![],
            language: None,
            region: None,
        };
        assert!(RequestValidator::validate_batch(&req).is_err());
    }
}
