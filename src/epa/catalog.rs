use crate::types::station::{LatLon, Station};
use std::collections::BTreeMap;

/// A fixed set of EPA monitoring stations, keyed by AQS site id.
#[derive(Debug, Clone)]
pub struct StationCatalog {
    stations: BTreeMap<String, Station>,
}

impl StationCatalog {
    pub fn new(stations: impl IntoIterator<Item = Station>) -> Self {
        Self {
            stations: stations.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    /// The main EPA monitoring stations in New York City.
    pub fn nyc() -> Self {
        Self::new([
            Station::new("36-005-0112", "IS 52 - Bronx", LatLon(40.813, -73.913)),
            Station::new("36-081-0124", "PS 19 - Queens", LatLon(40.743, -73.891)),
            Station::new("36-047-0010", "PS 274 - Brooklyn", LatLon(40.621, -73.912)),
            Station::new("36-061-0014", "CCNY - Manhattan", LatLon(40.819, -73.949)),
        ])
    }

    pub fn get(&self, id: &str) -> Option<&Station> {
        self.stations.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.stations.contains_key(id)
    }

    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.get(id).map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nyc_catalog() {
        let catalog = StationCatalog::nyc();
        assert_eq!(catalog.len(), 4);
        assert!(catalog.contains("36-081-0124"));
        assert!(!catalog.contains("36-081-9999"));
        assert_eq!(catalog.name_of("36-061-0014"), Some("CCNY - Manhattan"));
        assert_eq!(
            catalog.get("36-005-0112").map(|s| s.location),
            Some(LatLon(40.813, -73.913))
        );
        let ids: Vec<&str> = catalog.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            ["36-005-0112", "36-047-0010", "36-061-0014", "36-081-0124"]
        );
    }
}
