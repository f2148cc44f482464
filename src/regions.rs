use std::convert::TryInto;
use std::io;
use std::path::Path;

use log::{debug, warn};

use smartstring::alias::{String as SmartString};

use geo::MultiPolygon;
use geojson::GeoJson;

use super::context::RegionCode;
use super::error::{Error, Result};
use super::ioutil::magic_open;


pub static DEFAULT_NAME_FIELD: &'static str = "MNIMI";
pub static DEFAULT_CODE_FIELD: &'static str = "MKOOD";


#[derive(Debug, Clone)]
pub struct Region {
	pub name: SmartString,
	pub code: RegionCode,
	/// `None` for features without polygonal geometry.
	pub geometry: Option<MultiPolygon<f64>>,
}


/// Counties as read from the geographic reference file, in file order.
#[derive(Debug, Clone, Default)]
pub struct RegionReference {
	regions: Vec<Region>,
}

fn property_string(props: Option<&geojson::JsonObject>, field: &str) -> Result<SmartString> {
	match props.and_then(|p| p.get(field)) {
		Some(serde_json::Value::String(s)) => Ok(s.trim().into()),
		Some(serde_json::Value::Number(n)) => Ok(n.to_string().into()),
		_ => Err(Error::MissingColumn(field.into())),
	}
}

fn to_multipolygon(geometry: Option<geojson::Geometry>) -> Result<Option<MultiPolygon<f64>>> {
	let geometry = match geometry {
		Some(g) => g,
		None => return Ok(None),
	};
	let geometry: geo::Geometry<f64> = geometry.value.try_into()
		.map_err(|e| Error::Geometry(format!("{:?}", e)))?;
	match geometry {
		geo::Geometry::MultiPolygon(mp) => Ok(Some(mp)),
		geo::Geometry::Polygon(p) => Ok(Some(MultiPolygon::new(vec![p]))),
		_ => Ok(None),
	}
}

impl RegionReference {
	pub fn new(regions: Vec<Region>) -> Self {
		Self{regions}
	}

	pub fn from_reader<R: io::Read>(r: R, name_field: &str, code_field: &str) -> Result<Self> {
		let geojson = GeoJson::from_reader(r)
			.map_err(|e| Error::Geometry(e.to_string()))?;
		let collection = match geojson {
			GeoJson::FeatureCollection(fc) => fc,
			_ => return Err(Error::Geometry("expected a FeatureCollection".into())),
		};

		let mut regions = Vec::with_capacity(collection.features.len());
		for feature in collection.features {
			let name = property_string(feature.properties.as_ref(), name_field)?;
			let code = property_string(feature.properties.as_ref(), code_field)?;
			let geometry = to_multipolygon(feature.geometry)?;
			if geometry.is_none() {
				warn!("region {} has no polygonal geometry", name);
			}
			regions.push(Region{name, code, geometry});
		}
		debug!("loaded {} regions", regions.len());
		Ok(Self{regions})
	}

	pub fn load<P: AsRef<Path>>(path: P, name_field: &str, code_field: &str) -> Result<Self> {
		let r = magic_open(path)?;
		Self::from_reader(io::BufReader::new(r), name_field, code_field)
	}

	pub fn len(&self) -> usize {
		self.regions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.regions.is_empty()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Region> {
		self.regions.iter()
	}

	pub fn get(&self, name: &str) -> Option<&Region> {
		let name = name.trim();
		self.regions.iter().find(|r| r.name.as_str() == name)
	}

	pub fn code_for(&self, name: &str) -> Option<RegionCode> {
		self.get(name).map(|r| r.code.clone())
	}
}
