use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;

use serde::Deserialize;

use super::api::{Query, COUNTY_CODES, DEFAULT_API_URL, DEFAULT_TABLE};
use super::cache::FetchCache;
use super::context::{Sex, Year};
use super::error::{Error, Result};
use super::regions::{RegionReference, DEFAULT_CODE_FIELD, DEFAULT_NAME_FIELD};


#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
	pub url: String,
	pub table: String,
	pub first_year: Year,
	pub last_year: Year,
	pub regions: Vec<String>,
	pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self{
			url: DEFAULT_API_URL.into(),
			table: DEFAULT_TABLE.into(),
			first_year: 2014,
			last_year: 2023,
			regions: COUNTY_CODES.iter().map(|c| (*c).into()).collect(),
			timeout_secs: None,
		}
	}
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RegionsConfig {
	pub path: PathBuf,
	pub name_field: String,
	pub code_field: String,
}

impl Default for RegionsConfig {
	fn default() -> Self {
		Self{
			path: "maakonnad.geojson".into(),
			name_field: DEFAULT_NAME_FIELD.into(),
			code_field: DEFAULT_CODE_FIELD.into(),
		}
	}
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
	pub enabled: bool,
	pub dir: PathBuf,
}

impl Default for CacheConfig {
	fn default() -> Self {
		Self{enabled: true, dir: ".vitals-cache".into()}
	}
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
	pub width: f64,
}

impl Default for RenderConfig {
	fn default() -> Self {
		Self{width: 800.0}
	}
}


#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub api: ApiConfig,
	pub regions: RegionsConfig,
	pub cache: CacheConfig,
	pub render: RenderConfig,
}

impl Config {
	pub fn from_toml(s: &str) -> Result<Self> {
		let config: Config = toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
		config.validate()?;
		Ok(config)
	}

	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		debug!("reading config from {:?}", path);
		let content = fs::read_to_string(path)?;
		Self::from_toml(&content)
	}

	/// Defaults, overridden by the file at `path` if given, then by the
	/// environment.
	pub fn resolve<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
		let mut config = match path {
			Some(p) => Self::load(p)?,
			None => Self::default(),
		};
		config.apply_env(|k| env::var(k).ok());
		config.validate()?;
		Ok(config)
	}

	pub fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, var: F) {
		if let Some(url) = var("VITALS_API_URL") {
			self.api.url = url;
		}
		if let Some(dir) = var("VITALS_CACHE_DIR") {
			self.cache.dir = dir.into();
		}
	}

	pub fn validate(&self) -> Result<()> {
		if self.api.first_year > self.api.last_year {
			return Err(Error::Config(format!(
				"first_year {} is after last_year {}", self.api.first_year, self.api.last_year,
			)))
		}
		if self.api.regions.is_empty() {
			return Err(Error::Config("no region codes configured".into()))
		}
		if !(self.render.width > 0.0) {
			return Err(Error::Config("render width must be positive".into()))
		}
		Ok(())
	}

	pub fn query(&self) -> Query {
		Query{
			table: self.api.table.as_str().into(),
			years: (self.api.first_year..=self.api.last_year).collect(),
			regions: self.api.regions.iter().map(|r| r.as_str().into()).collect(),
			sexes: vec![Sex::Male, Sex::Female],
		}
	}

	pub fn timeout(&self) -> Option<Duration> {
		self.api.timeout_secs.map(Duration::from_secs)
	}

	pub fn cache(&self) -> Option<FetchCache> {
		if !self.cache.enabled {
			return None
		}
		Some(FetchCache::new(self.cache.dir.clone(), &self.api.url))
	}

	pub fn load_regions(&self) -> Result<RegionReference> {
		RegionReference::load(&self.regions.path, &self.regions.name_field, &self.regions.code_field)
	}
}
