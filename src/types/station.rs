//! Defines the EPA monitoring station type and its geographical coordinate.

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use aq_collector::LatLon;
///
/// let bronx = LatLon(40.813, -73.913);
/// assert_eq!(bronx.0, 40.813); // Latitude
/// assert_eq!(bronx.1, -73.913); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

/// A single EPA AQS monitoring station.
///
/// The identifier has the form `SS-CCC-NNNN` (state FIPS code, county code,
/// site number), which is how AQS addresses a site.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// The AQS site identifier (e.g., "36-005-0112").
    pub id: String,
    /// Human readable station name.
    pub name: String,
    /// Where the monitor is located.
    pub location: LatLon,
}

impl Station {
    pub fn new(id: &str, name: &str, location: LatLon) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            location,
        }
    }
}
