use std::io;

use enum_map::EnumMap;

use super::aggregate::{IndicatorRow, IndicatorTable};
use super::context::{Indicator, SexGrouping, Year};
use super::error::{Error, Result};
use super::statistics::{parse_value, REGION_COLUMN};


pub static SEQUENCE_COLUMN: &'static str = "Nr";
pub static CODE_COLUMN: &'static str = "Kood";


#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
	/// Prefix each row with its 1-based position.
	pub numbered: bool,
	/// Include the region code from the reference file.
	pub with_code: bool,
}


/// Download name for a table, e.g. `mehed_loomulik_iive_2020.csv`.
pub fn export_file_name(grouping: SexGrouping, year: Year) -> String {
	format!("{}_loomulik_iive_{}.csv", grouping.label().to_lowercase(), year)
}

fn header(options: ExportOptions) -> Vec<&'static str> {
	let mut result = Vec::with_capacity(6);
	if options.numbered {
		result.push(SEQUENCE_COLUMN);
	}
	result.push(REGION_COLUMN);
	if options.with_code {
		result.push(CODE_COLUMN);
	}
	for indicator in Indicator::ALL.iter() {
		result.push(indicator.label());
	}
	result
}

pub fn write_csv<W: io::Write>(table: &IndicatorTable, w: W, options: ExportOptions) -> Result<()> {
	let mut w = csv::Writer::from_writer(w);
	w.write_record(header(options))?;
	let mut record: Vec<String> = Vec::with_capacity(6);
	for (i, row) in table.rows.iter().enumerate() {
		record.clear();
		if options.numbered {
			record.push((i + 1).to_string());
		}
		record.push(row.region.to_string());
		if options.with_code {
			record.push(row.code.as_ref().map(|c| c.to_string()).unwrap_or_default());
		}
		for indicator in Indicator::ALL.iter() {
			record.push(row.values[*indicator].map(|v| v.to_string()).unwrap_or_default());
		}
		w.write_record(&record)?;
	}
	w.flush()?;
	Ok(())
}

/// Parse an exported table back. The sequence column, if present, is
/// ignored; the code column is optional.
pub fn read_csv<R: io::Read>(r: R, year: Year, grouping: SexGrouping) -> Result<IndicatorTable> {
	let mut r = csv::Reader::from_reader(r);
	let headers = r.headers()?.clone();
	let find = |name: &str| headers.iter().position(|h| h.trim() == name);
	let region_idx = find(REGION_COLUMN).ok_or_else(|| Error::MissingColumn(REGION_COLUMN.into()))?;
	let code_idx = find(CODE_COLUMN);
	let mut value_idx: EnumMap<Indicator, usize> = EnumMap::default();
	for indicator in Indicator::ALL.iter() {
		value_idx[*indicator] = find(indicator.label())
			.ok_or_else(|| Error::MissingColumn(indicator.label().into()))?;
	}

	let mut rows = Vec::new();
	for row in r.records() {
		let rec = row?;
		let mut values: EnumMap<Indicator, Option<i64>> = EnumMap::default();
		for indicator in Indicator::ALL.iter() {
			values[*indicator] = parse_value(indicator.label(), rec.get(value_idx[*indicator]).unwrap_or(""))?;
		}
		let code = code_idx
			.and_then(|idx| rec.get(idx))
			.map(|c| c.trim())
			.filter(|c| !c.is_empty())
			.map(|c| c.into());
		rows.push(IndicatorRow{
			region: rec.get(region_idx).unwrap_or("").trim().into(),
			code,
			values,
		});
	}
	Ok(IndicatorTable{year, grouping, rows})
}
