use log::info;

mod ioutil;
mod context;
mod error;
mod progress;
mod statistics;
mod aggregate;
pub mod api;
mod cache;
mod config;
mod regions;
mod join;
pub mod render;
pub mod export;

pub use ioutil::{magic_open, magic_write, strip_bom};
pub use context::*;
pub use error::*;
pub use progress::*;
pub use statistics::*;
pub use aggregate::*;
pub use cache::*;
pub use config::*;
pub use regions::*;
pub use join::*;


/// Statistics client configured from `config`.
pub fn config_client(config: &Config) -> Result<api::Client> {
	api::Client::new(config.api.url.clone(), config.timeout())
}


/// Fetch the raw statistics table for `config`, through the on-disk cache
/// unless it is disabled. `refresh` forces a new request.
pub fn fetch_table<S: ProgressSink + ?Sized>(
		config: &Config,
		refresh: bool,
		progress: &mut S,
		) -> Result<RawTable>
{
	let client = config_client(config)?;
	let query = config.query();
	let body = match config.cache() {
		Some(cache) => cache.fetch_with(&client, &query, refresh)?,
		None => {
			info!("fetching table {} from statistics service", query.table);
			api::StatisticsSource::fetch_raw(&client, &query)?
		},
	};
	RawTable::from_reader(strip_bom(&body[..]), progress)
}


/// Read a raw statistics table previously saved to disk (optionally
/// gzipped).
pub fn load_table<P: AsRef<std::path::Path>, S: ProgressSink + ?Sized>(path: P, progress: &mut S) -> Result<RawTable> {
	let mut r = magic_open(path)?;
	let mut buf = Vec::new();
	std::io::Read::read_to_end(&mut r, &mut buf)?;
	RawTable::from_reader(strip_bom(&buf[..]), progress)
}
