pub mod catalog;
pub mod fetcher;
