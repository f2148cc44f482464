use std::collections::BTreeSet;
use std::io;

use log::debug;

use smartstring::alias::{String as SmartString};

use super::context::Year;
use super::error::{Error, Result};
use super::ioutil::strip_bom;
use super::progress::{CountMeter, ProgressSink};


pub static YEAR_COLUMN: &'static str = "Aasta";
pub static REGION_COLUMN: &'static str = "Maakond";


/// Decode one cell; the statistics database marks unavailable figures with
/// dots or a dash.
pub fn parse_value(column: &str, s: &str) -> Result<Option<i64>> {
	let s = s.trim();
	match s {
		"" | "." | ".." | "..." | "-" => return Ok(None),
		_ => (),
	}
	match s.parse::<i64>() {
		Ok(v) => Ok(Some(v)),
		Err(_) => match s.parse::<f64>() {
			// whole numbers occasionally arrive as "12.0"
			Ok(v) if v.fract() == 0.0 && v.abs() < 9.0e15 => Ok(Some(v as i64)),
			_ => Err(Error::InvalidValue{column: column.into(), value: s.into()}),
		},
	}
}


#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
	pub year: Year,
	pub region: SmartString,
	/// One entry per value column, aligned with `RawTable::columns`.
	pub values: Vec<Option<i64>>,
}


/// The statistics table as returned by the database: one row per year and
/// region, value columns labelled by sex and indicator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
	columns: Vec<SmartString>,
	rows: Vec<RawRow>,
}

impl RawTable {
	pub fn new(columns: Vec<SmartString>) -> Self {
		Self{columns, rows: Vec::new()}
	}

	pub fn push(&mut self, row: RawRow) {
		assert_eq!(row.values.len(), self.columns.len());
		self.rows.push(row);
	}

	pub fn from_bytes(data: &[u8]) -> Result<Self> {
		Self::from_reader(strip_bom(data), &mut super::progress::NullSink)
	}

	pub fn from_reader<R: io::Read, S: ProgressSink + ?Sized>(r: R, s: &mut S) -> Result<Self> {
		let mut r = csv::ReaderBuilder::new()
			.flexible(false)
			.from_reader(r);
		let headers = r.headers()?.clone();
		let mut year_idx = None;
		let mut region_idx = None;
		let mut value_idx = Vec::with_capacity(headers.len());
		let mut columns = Vec::with_capacity(headers.len());
		for (i, h) in headers.iter().enumerate() {
			// the header of the first column may still carry a byte order
			// mark if the caller did not strip it
			let h = h.trim_start_matches('\u{feff}').trim();
			if h == YEAR_COLUMN {
				year_idx = Some(i);
			} else if h == REGION_COLUMN {
				region_idx = Some(i);
			} else {
				value_idx.push(i);
				columns.push(SmartString::from(h));
			}
		}
		let year_idx = year_idx.ok_or_else(|| Error::MissingColumn(YEAR_COLUMN.into()))?;
		let region_idx = region_idx.ok_or_else(|| Error::MissingColumn(REGION_COLUMN.into()))?;

		let mut table = Self::new(columns);
		let mut pm = CountMeter::new(s);
		let mut n = 0;
		for (i, row) in r.records().enumerate() {
			let rec = row?;
			let year_s = rec.get(year_idx).unwrap_or("").trim();
			let year = year_s.parse::<Year>().map_err(|_| Error::InvalidValue{
				column: YEAR_COLUMN.into(),
				value: year_s.into(),
			})?;
			let region = rec.get(region_idx).unwrap_or("").trim();
			let mut values = Vec::with_capacity(value_idx.len());
			for (col, idx) in table.columns.iter().zip(value_idx.iter()) {
				values.push(parse_value(col, rec.get(*idx).unwrap_or(""))?);
			}
			table.rows.push(RawRow{year, region: region.into(), values});
			if i % 100 == 99 {
				pm.update(i+1);
			}
			n = i + 1;
		}
		pm.finish(n);
		debug!("loaded {} rows with {} value columns", table.rows.len(), table.columns.len());
		Ok(table)
	}

	/// Value column labels, without the year and region columns.
	pub fn columns(&self) -> &[SmartString] {
		&self.columns
	}

	pub fn rows(&self) -> &[RawRow] {
		&self.rows
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn column_index(&self, name: &str) -> Result<usize> {
		self.columns.iter()
			.position(|c| c.as_str() == name)
			.ok_or_else(|| Error::MissingColumn(name.into()))
	}

	/// Distinct years present, ascending.
	pub fn years(&self) -> Vec<Year> {
		let years: BTreeSet<Year> = self.rows.iter().map(|r| r.year).collect();
		years.into_iter().collect()
	}

	pub fn rows_for_year(&self, year: Year) -> impl Iterator<Item = &RawRow> {
		self.rows.iter().filter(move |r| r.year == year)
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	static SAMPLE: &'static str = "\u{feff}Aasta,Maakond,Mehed Elussünnid,Naised Elussünnid\n2020,Harju maakond,1000,950\n2021,Harju maakond,..,900\n2020,Tartu maakond,400,380\n";

	#[test]
	fn parses_bom_prefixed_csv() {
		let t = RawTable::from_bytes(SAMPLE.as_bytes()).unwrap();
		assert_eq!(t.columns().len(), 2);
		assert_eq!(t.columns()[0].as_str(), "Mehed Elussünnid");
		assert_eq!(t.rows().len(), 3);
		assert_eq!(t.rows()[0].region.as_str(), "Harju maakond");
		assert_eq!(t.rows()[0].values, vec![Some(1000), Some(950)]);
		assert_eq!(t.rows()[1].values, vec![None, Some(900)]);
	}

	#[test]
	fn bom_is_tolerated_even_when_not_stripped() {
		let t = RawTable::from_reader(SAMPLE.as_bytes(), &mut crate::NullSink).unwrap();
		assert_eq!(t.years(), vec![2020, 2021]);
	}

	#[test]
	fn years_are_sorted_and_unique() {
		let t = RawTable::from_bytes(b"Aasta,Maakond,x\n2022,A,1\n2020,A,1\n2022,B,1\n").unwrap();
		assert_eq!(t.years(), vec![2020, 2022]);
	}

	#[test]
	fn missing_region_column_is_reported() {
		match RawTable::from_bytes(b"Aasta,Piirkond,x\n2020,A,1\n") {
			Err(Error::MissingColumn(c)) => assert_eq!(c.as_str(), "Maakond"),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn garbage_values_are_rejected() {
		match RawTable::from_bytes(b"Aasta,Maakond,x\n2020,A,abc\n") {
			Err(Error::InvalidValue{column, value}) => {
				assert_eq!(column.as_str(), "x");
				assert_eq!(value, "abc");
			},
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn parse_value_handles_markers_and_signs() {
		assert_eq!(parse_value("x", "..").unwrap(), None);
		assert_eq!(parse_value("x", " -12 ").unwrap(), Some(-12));
		assert_eq!(parse_value("x", "7.0").unwrap(), Some(7));
		assert!(parse_value("x", "7.5").is_err());
	}

	#[test]
	fn unknown_column_lookup_fails() {
		let t = RawTable::from_bytes(SAMPLE.as_bytes()).unwrap();
		assert_eq!(t.column_index("Naised Elussünnid").unwrap(), 1);
		assert!(matches!(t.column_index("Naised Surmad"), Err(Error::MissingColumn(_))));
	}
}
