//! Defines the pollutant codes that can be requested from the OpenAQ measurements endpoint.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A pollutant code as used by the OpenAQ API.
///
/// The wire representation is the lowercase code (`pm25`, `o3`, ...). It is also
/// used as the column name of the pivoted measurement table.
///
/// # Examples
///
/// ```
/// use aq_collector::Parameter;
///
/// assert_eq!("pm25".parse::<Parameter>(), Ok(Parameter::Pm25));
/// assert_eq!(Parameter::No2.to_string(), "no2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    /// Fine particulate matter (diameter <= 2.5 µm).
    Pm25,
    /// Coarse particulate matter (diameter <= 10 µm).
    Pm10,
    /// Ozone.
    O3,
    /// Nitrogen dioxide.
    No2,
    /// Sulfur dioxide.
    So2,
    /// Carbon monoxide.
    Co,
}

impl Parameter {
    /// The six canonical pollutants, in the order they are fetched by default.
    pub const ALL: [Parameter; 6] = [
        Parameter::Pm25,
        Parameter::Pm10,
        Parameter::O3,
        Parameter::No2,
        Parameter::So2,
        Parameter::Co,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::Pm25 => "pm25",
            Parameter::Pm10 => "pm10",
            Parameter::O3 => "o3",
            Parameter::No2 => "no2",
            Parameter::So2 => "so2",
            Parameter::Co => "co",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a supported parameter. Use one of pm25, pm10, o3, no2, so2, co.")]
pub struct UnknownParameter(pub String);

impl FromStr for Parameter {
    type Err = UnknownParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_lowercase();
        Parameter::ALL
            .into_iter()
            .find(|p| p.as_str() == code)
            .ok_or_else(|| UnknownParameter(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("PM10".parse::<Parameter>(), Ok(Parameter::Pm10));
        assert_eq!(" co ".parse::<Parameter>(), Ok(Parameter::Co));
    }

    #[test]
    fn test_parse_unknown() {
        let err = "bc".parse::<Parameter>().unwrap_err();
        assert_eq!(err, UnknownParameter("bc".to_string()));
    }

    #[test]
    fn test_unknown_parameter_message() {
        let err = "bc".parse::<Parameter>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "'bc' is not a supported parameter. Use one of pm25, pm10, o3, no2, so2, co."
        );
    }

    #[test]
    fn test_deserializes_wire_codes() {
        let parsed: Vec<Parameter> = serde_json::from_str("[\"o3\", \"pm25\"]").unwrap();
        assert_eq!(parsed, vec![Parameter::O3, Parameter::Pm25]);
    }
}
