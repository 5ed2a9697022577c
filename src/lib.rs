pub mod cli;
mod collector;
mod config;
mod epa;
mod error;
mod http;
mod openaq;
mod output;
mod types;

pub use collector::*;
pub use config::*;
pub use error::CollectorError;
pub use output::{slugify, write_csv, CSV_DATETIME_FORMAT};

pub use epa::catalog::StationCatalog;
pub use epa::fetcher::*;

pub use http::error::FetchError;
pub use http::transport::{ApiRequest, ApiResponse, HttpTransport};

pub use openaq::key_preview;
pub use openaq::locations::LocationDirectory;
pub use openaq::measurements::*;
pub use openaq::reshape::{MeasurementTable, KEY_COLUMNS};

pub use types::epa_record::{DailyDataResponse, EpaRecord};
pub use types::location::*;
pub use types::measurement::*;
pub use types::parameter::{Parameter, UnknownParameter};
pub use types::station::{LatLon, Station};
pub use types::window::CollectionWindow;
