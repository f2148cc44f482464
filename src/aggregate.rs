use enum_map::EnumMap;

use log::{debug, warn};

use smartstring::alias::{String as SmartString};

use super::context::{column_name, Indicator, RegionCode, SexGrouping, Year};
use super::error::Result;
use super::statistics::{RawRow, RawTable};


/// Per-region value of one indicator for one year and sex grouping, in the
/// order the regions appear in the raw table.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
	pub year: Year,
	pub grouping: SexGrouping,
	pub indicator: Indicator,
	pub values: Vec<(SmartString, Option<i64>)>,
}

impl Aggregate {
	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// `None` if the region is absent; `Some(None)` if present but missing.
	pub fn get(&self, region: &str) -> Option<Option<i64>> {
		self.values.iter()
			.find(|(r, _)| r.as_str() == region)
			.map(|(_, v)| *v)
	}

	pub fn regions(&self) -> impl Iterator<Item = &str> {
		self.values.iter().map(|(r, _)| r.as_str())
	}
}


/// Column indices that make up `indicator` under `grouping`.
fn select_columns(table: &RawTable, grouping: SexGrouping, indicator: Indicator) -> Result<Vec<usize>> {
	let mut result = Vec::with_capacity(2);
	for sex in grouping.sexes() {
		result.push(table.column_index(&column_name(*sex, indicator))?);
	}
	Ok(result)
}

fn sum_columns(row: &RawRow, columns: &[usize]) -> Option<i64> {
	let mut accum: i64 = 0;
	for idx in columns {
		let v = row.values[*idx]?;
		accum = match accum.checked_add(v) {
			Some(v) => v,
			None => {
				warn!("sum for {} overflows, treating as missing", row.region);
				return None
			},
		};
	}
	Some(accum)
}


/// Select `indicator` for `year` from the raw table, summing the male and
/// female columns for the combined grouping.
///
/// Fails with `Error::MissingColumn` if a required column is absent from the
/// table, even if no row matches `year`. A year with no rows yields an empty
/// aggregate.
pub fn aggregate(
		table: &RawTable,
		year: Year,
		grouping: SexGrouping,
		indicator: Indicator,
		) -> Result<Aggregate>
{
	let columns = select_columns(table, grouping, indicator)?;
	let values: Vec<_> = table.rows_for_year(year)
		.map(|row| (row.region.clone(), sum_columns(row, &columns[..])))
		.collect();
	debug!("aggregated {} {} for {}: {} regions", grouping, indicator, year, values.len());
	Ok(Aggregate{year, grouping, indicator, values})
}


#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
	pub region: SmartString,
	pub code: Option<RegionCode>,
	pub values: EnumMap<Indicator, Option<i64>>,
}

/// All three indicators for one year and sex grouping; the tabular view.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorTable {
	pub year: Year,
	pub grouping: SexGrouping,
	pub rows: Vec<IndicatorRow>,
}

impl IndicatorTable {
	pub fn get(&self, region: &str) -> Option<&IndicatorRow> {
		self.rows.iter().find(|r| r.region.as_str() == region)
	}

	/// Fill in region codes from `lookup`; regions it does not know keep no
	/// code.
	pub fn assign_codes<F: Fn(&str) -> Option<RegionCode>>(&mut self, lookup: F) {
		for row in self.rows.iter_mut() {
			row.code = lookup(&row.region);
		}
	}
}

pub fn indicator_table(table: &RawTable, year: Year, grouping: SexGrouping) -> Result<IndicatorTable> {
	let mut columns: EnumMap<Indicator, Vec<usize>> = EnumMap::default();
	for indicator in Indicator::ALL.iter() {
		columns[*indicator] = select_columns(table, grouping, *indicator)?;
	}
	let mut rows = Vec::new();
	for row in table.rows_for_year(year) {
		let mut values: EnumMap<Indicator, Option<i64>> = EnumMap::default();
		for indicator in Indicator::ALL.iter() {
			values[*indicator] = sum_columns(row, &columns[*indicator][..]);
		}
		rows.push(IndicatorRow{
			region: row.region.clone(),
			code: None,
			values,
		});
	}
	Ok(IndicatorTable{year, grouping, rows})
}
