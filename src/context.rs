use std::fmt;
use std::str::FromStr;

use enum_map::Enum;

use smartstring::alias::{String as SmartString};

pub type Year = u16;
pub type RegionCode = SmartString;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sex {
	Male,
	Female,
}

impl Sex {
	pub fn label(&self) -> &'static str {
		match self {
			Self::Male => "Mehed",
			Self::Female => "Naised",
		}
	}

	/// Code of the sex dimension in the statistics database.
	pub fn code(&self) -> &'static str {
		match self {
			Self::Male => "2",
			Self::Female => "3",
		}
	}
}

impl fmt::Display for Sex {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.label())
	}
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SexGrouping {
	Male,
	Female,
	Combined,
}

static MALE_ONLY: [Sex; 1] = [Sex::Male];
static FEMALE_ONLY: [Sex; 1] = [Sex::Female];
static BOTH: [Sex; 2] = [Sex::Male, Sex::Female];

impl SexGrouping {
	pub const ALL: [SexGrouping; 3] = [Self::Male, Self::Female, Self::Combined];

	pub fn label(&self) -> &'static str {
		match self {
			Self::Male => Sex::Male.label(),
			Self::Female => Sex::Female.label(),
			Self::Combined => "Kokku",
		}
	}

	/// The sexes whose columns are summed for this grouping.
	pub fn sexes(&self) -> &'static [Sex] {
		match self {
			Self::Male => &MALE_ONLY[..],
			Self::Female => &FEMALE_ONLY[..],
			Self::Combined => &BOTH[..],
		}
	}
}

impl fmt::Display for SexGrouping {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.label())
	}
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
pub enum Indicator {
	Births,
	Deaths,
	NaturalChange,
}

impl Indicator {
	pub const ALL: [Indicator; 3] = [Self::Births, Self::Deaths, Self::NaturalChange];

	pub fn label(&self) -> &'static str {
		match self {
			Self::Births => "Elussünnid",
			Self::Deaths => "Surmad",
			Self::NaturalChange => "Loomulik iive",
		}
	}
}

impl fmt::Display for Indicator {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.label())
	}
}


/// Name of the raw table column holding `indicator` for `sex`, e.g.
/// `Mehed Elussünnid`.
pub fn column_name(sex: Sex, indicator: Indicator) -> SmartString {
	let mut s = SmartString::new();
	s.push_str(sex.label());
	s.push(' ');
	s.push_str(indicator.label());
	s
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSelectorError {
	kind: &'static str,
	value: String,
}

impl fmt::Display for ParseSelectorError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		write!(f, "unknown {}: {:?}", self.kind, self.value)
	}
}

impl std::error::Error for ParseSelectorError {}

fn normalize(s: &str) -> String {
	s.trim().to_lowercase().replace(|c: char| c == '_' || c == '-', " ")
}

impl FromStr for SexGrouping {
	type Err = ParseSelectorError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match normalize(s).as_str() {
			"male" | "m" | "mehed" => Ok(Self::Male),
			"female" | "f" | "naised" => Ok(Self::Female),
			"combined" | "total" | "both" | "kokku" => Ok(Self::Combined),
			_ => Err(ParseSelectorError{kind: "sex grouping", value: s.into()}),
		}
	}
}

impl FromStr for Indicator {
	type Err = ParseSelectorError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match normalize(s).as_str() {
			"births" | "elussünnid" => Ok(Self::Births),
			"deaths" | "surmad" => Ok(Self::Deaths),
			"natural change" | "loomulik iive" => Ok(Self::NaturalChange),
			_ => Err(ParseSelectorError{kind: "indicator", value: s.into()}),
		}
	}
}
