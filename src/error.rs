use std::fmt;
use std::io;

use smartstring::alias::{String as SmartString};


#[derive(Debug)]
pub enum Error {
	Request(reqwest::Error),
	Status(u16),
	Io(io::Error),
	Csv(csv::Error),
	MissingColumn(SmartString),
	InvalidValue{column: SmartString, value: String},
	Geometry(String),
	Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Request(e) => fmt::Display::fmt(e, f),
			Self::Status(code) => write!(f, "statistics request failed with status {}", code),
			Self::Io(e) => fmt::Display::fmt(e, f),
			Self::Csv(e) => fmt::Display::fmt(e, f),
			Self::MissingColumn(name) => write!(f, "column '{}' missing from data", name),
			Self::InvalidValue{column, value} => write!(f, "invalid value {:?} in column '{}'", value, column),
			Self::Geometry(msg) => write!(f, "invalid region reference: {}", msg),
			Self::Config(msg) => write!(f, "invalid configuration: {}", msg),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Request(e) => Some(e),
			Self::Io(e) => Some(e),
			Self::Csv(e) => Some(e),
			_ => None,
		}
	}
}

impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		Self::Request(err)
	}
}

impl From<io::Error> for Error {
	fn from(err: io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<csv::Error> for Error {
	fn from(err: csv::Error) -> Self {
		Self::Csv(err)
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_column_names_the_column() {
		let e = Error::MissingColumn("Mehed Surmad".into());
		assert_eq!(e.to_string(), "column 'Mehed Surmad' missing from data");
	}

	#[test]
	fn status_mentions_code() {
		assert_eq!(Error::Status(503).to_string(), "statistics request failed with status 503");
	}
}
