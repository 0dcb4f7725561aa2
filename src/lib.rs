pub mod analysis;
pub mod config;
pub mod db;
pub mod enrich;
pub mod monitoring;
pub mod net;
pub mod paths;
pub mod processing;
pub mod prototype;
pub mod scrape;
pub mod table;
