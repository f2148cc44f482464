use std::time::Duration;

use log::{debug, trace};

use bytes::Bytes;

use reqwest;

use serde::Serialize;

use smartstring::alias::{String as SmartString};

use super::context::{RegionCode, Sex, Year};
use super::error::{Error, Result};
use super::progress::ProgressSink;
use super::statistics::RawTable;


pub static DEFAULT_API_URL: &'static str = "https://andmed.stat.ee/api/v1/et/stat";
pub static DEFAULT_TABLE: &'static str = "RV032";

/// County codes as used by the statistics database.
pub static COUNTY_CODES: [&'static str; 14] = [
	"39", "44", "49", "51", "57", "59", "65", "67", "70", "74", "78", "82", "84", "86",
];


/// Selection sent to the statistics database.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
	pub table: SmartString,
	pub years: Vec<Year>,
	pub regions: Vec<RegionCode>,
	pub sexes: Vec<Sex>,
}

impl Default for Query {
	fn default() -> Self {
		Self{
			table: DEFAULT_TABLE.into(),
			years: (2014..=2023).collect(),
			regions: COUNTY_CODES.iter().map(|c| (*c).into()).collect(),
			sexes: vec![Sex::Male, Sex::Female],
		}
	}
}

#[derive(Debug, Serialize)]
struct Filter {
	filter: &'static str,
	values: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Selection {
	code: &'static str,
	selection: Filter,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
	format: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Payload {
	query: Vec<Selection>,
	response: ResponseFormat,
}

fn item_selection(code: &'static str, values: Vec<String>) -> Selection {
	Selection{
		code,
		selection: Filter{filter: "item", values},
	}
}

impl Query {
	pub fn payload(&self) -> Payload {
		Payload{
			query: vec![
				item_selection("Aasta", self.years.iter().map(|y| y.to_string()).collect()),
				item_selection("Maakond", self.regions.iter().map(|r| r.to_string()).collect()),
				item_selection("Sugu", self.sexes.iter().map(|s| s.code().to_string()).collect()),
			],
			response: ResponseFormat{format: "csv"},
		}
	}
}


/// Anything that can answer a query with the raw CSV body.
pub trait StatisticsSource {
	fn fetch_raw(&self, query: &Query) -> Result<Bytes>;

	fn fetch<S: ProgressSink + ?Sized>(&self, query: &Query, progress: &mut S) -> Result<RawTable> where Self: Sized {
		let body = self.fetch_raw(query)?;
		RawTable::from_reader(super::ioutil::strip_bom(&body[..]), progress)
	}
}


pub struct Client {
	client: reqwest::blocking::Client,
	api_url: String,
}

impl Client {
	pub fn new(api_url: String, timeout: Option<Duration>) -> Result<Self> {
		let mut builder = reqwest::blocking::Client::builder();
		if let Some(timeout) = timeout {
			builder = builder.timeout(timeout);
		}
		Ok(Self{
			client: builder.build()?,
			api_url: api_url.trim_end_matches('/').into(),
		})
	}

	pub fn table_url(&self, table: &str) -> String {
		format!("{}/{}", self.api_url, table)
	}
}

impl StatisticsSource for Client {
	fn fetch_raw(&self, query: &Query) -> Result<Bytes> {
		let url = self.table_url(&query.table);
		debug!("requesting {} ({} years, {} regions)", url, query.years.len(), query.regions.len());
		let req = self.client.post(url)
			.header(reqwest::header::CONTENT_TYPE, "application/json")
			.json(&query.payload());
		let resp = req.send()?;
		match resp.status() {
			reqwest::StatusCode::OK => (),
			other => return Err(Error::Status(other.as_u16())),
		}
		let body = resp.bytes()?;
		trace!("received {} bytes", body.len());
		Ok(body)
	}
}
