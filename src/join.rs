use std::collections::{HashMap, VecDeque};

use log::debug;

use smartstring::alias::{String as SmartString};

use geo::MultiPolygon;

use super::aggregate::Aggregate;
use super::context::RegionCode;
use super::regions::RegionReference;


#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRegion {
	pub name: SmartString,
	pub code: Option<RegionCode>,
	pub geometry: Option<MultiPolygon<f64>>,
	pub value: Option<i64>,
}

/// Aggregate reconciled with the region reference.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Joined {
	pub regions: Vec<JoinedRegion>,
}

impl Joined {
	pub fn get(&self, name: &str) -> Option<&JoinedRegion> {
		self.regions.iter().find(|r| r.name.as_str() == name)
	}

	/// Smallest and largest present value, if any.
	pub fn value_range(&self) -> Option<(i64, i64)> {
		let mut values = self.regions.iter().filter_map(|r| r.value);
		let first = values.next()?;
		Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
	}
}


/// Join `aggregate` onto `reference` by region name.
///
/// Every reference region appears, in reference order, with the aggregate
/// value or `None` if the aggregate lacks it. Aggregate rows not consumed
/// by a reference region follow in aggregate order, without code or
/// geometry. Rows pair up one to one, so a name repeated in the aggregate
/// matches one reference region and the extra rows are kept unmatched.
pub fn join(reference: &RegionReference, aggregate: &Aggregate) -> Joined {
	let mut by_name: HashMap<&str, VecDeque<usize>> = HashMap::new();
	for (i, (name, _)) in aggregate.values.iter().enumerate() {
		by_name.entry(name.trim()).or_default().push_back(i);
	}
	let mut used = vec![false; aggregate.values.len()];
	let mut regions = Vec::with_capacity(reference.len() + aggregate.len());
	for region in reference.iter() {
		let value = match by_name.get_mut(region.name.trim()).and_then(|rows| rows.pop_front()) {
			Some(i) => {
				used[i] = true;
				aggregate.values[i].1
			},
			None => None,
		};
		regions.push(JoinedRegion{
			name: region.name.clone(),
			code: Some(region.code.clone()),
			geometry: region.geometry.clone(),
			value,
		});
	}

	let mut unmatched = 0;
	for ((name, value), used) in aggregate.values.iter().zip(used) {
		if used {
			continue
		}
		unmatched += 1;
		regions.push(JoinedRegion{
			name: name.clone(),
			code: None,
			geometry: None,
			value: *value,
		});
	}
	debug!("joined {} regions, {} without reference entry", regions.len(), unmatched);
	Joined{regions}
}
