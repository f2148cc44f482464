use std::io;

use geo::{BoundingRect, LineString, MultiPolygon};

use super::context::{Indicator, SexGrouping, Year};
use super::join::Joined;


static MISSING_FILL: &'static str = "#e0e0e0";
static EDGE_COLOR: &'static str = "#cccccc";
static EDGE_WIDTH: f64 = 0.8;
static TITLE_HEIGHT: f64 = 40.0;
static LEGEND_HEIGHT: f64 = 60.0;
static MARGIN: f64 = 10.0;

// matplotlib's viridis, sampled at tenths
static VIRIDIS: [(u8, u8, u8); 11] = [
	(0x44, 0x01, 0x54),
	(0x48, 0x24, 0x75),
	(0x41, 0x44, 0x87),
	(0x35, 0x5f, 0x8d),
	(0x2a, 0x78, 0x8e),
	(0x21, 0x91, 0x8c),
	(0x22, 0xa8, 0x84),
	(0x44, 0xbf, 0x70),
	(0x7a, 0xd1, 0x51),
	(0xbd, 0xdf, 0x26),
	(0xfd, 0xe7, 0x25),
];


#[derive(Debug, Clone)]
pub struct RenderOptions {
	/// Width of the whole image in pixels; the height follows from the map
	/// extent.
	pub width: f64,
	pub legend: bool,
}

impl Default for RenderOptions {
	fn default() -> Self {
		Self{width: 800.0, legend: true}
	}
}


pub fn default_title(grouping: SexGrouping, indicator: Indicator, year: Year) -> String {
	format!("{} {} maakondade kaupa ({})", grouping, indicator, year)
}

/// Colour for `t` in [0, 1], clamped.
pub fn viridis(t: f64) -> (u8, u8, u8) {
	let t = if t.is_nan() { 0.0 } else { t.max(0.0).min(1.0) };
	let pos = t * (VIRIDIS.len() - 1) as f64;
	let i = (pos.floor() as usize).min(VIRIDIS.len() - 2);
	let frac = pos - i as f64;
	let (a, b) = (VIRIDIS[i], VIRIDIS[i + 1]);
	let lerp = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
	(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

fn hex((r, g, b): (u8, u8, u8)) -> String {
	format!("#{:02x}{:02x}{:02x}", r, g, b)
}

fn escape(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	for c in s.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			_ => out.push(c),
		}
	}
	out
}


/// Maps lon/lat onto image pixels: equirectangular, with longitudes shrunk
/// by the cosine of the central latitude.
#[derive(Debug, Clone, Copy)]
struct Projection {
	min_x: f64,
	max_y: f64,
	kx: f64,
	scale: f64,
	offset_x: f64,
	offset_y: f64,
}

impl Projection {
	fn fit<'a, I: Iterator<Item = &'a MultiPolygon<f64>>>(geometries: I, width: f64, offset_y: f64) -> Option<(Self, f64)> {
		let mut bounds: Option<(f64, f64, f64, f64)> = None;
		for mp in geometries {
			let rect = match mp.bounding_rect() {
				Some(r) => r,
				None => continue,
			};
			bounds = Some(match bounds {
				None => (rect.min().x, rect.min().y, rect.max().x, rect.max().y),
				Some((x0, y0, x1, y1)) => (
					x0.min(rect.min().x),
					y0.min(rect.min().y),
					x1.max(rect.max().x),
					y1.max(rect.max().y),
				),
			});
		}
		let (min_x, min_y, max_x, max_y) = bounds?;
		let kx = ((min_y + max_y) / 2.0).to_radians().cos();
		let span_x = ((max_x - min_x) * kx).max(f64::EPSILON);
		let scale = (width - 2.0 * MARGIN) / span_x;
		let height = (max_y - min_y) * scale;
		Some((Self{min_x, max_y, kx, scale, offset_x: MARGIN, offset_y}, height))
	}

	fn project(&self, x: f64, y: f64) -> (f64, f64) {
		(
			self.offset_x + (x - self.min_x) * self.kx * self.scale,
			self.offset_y + (self.max_y - y) * self.scale,
		)
	}
}

fn write_ring(path: &mut String, proj: &Projection, ring: &LineString<f64>) {
	for (i, c) in ring.coords().enumerate() {
		let (x, y) = proj.project(c.x, c.y);
		path.push_str(if i == 0 { "M" } else { "L" });
		path.push_str(&format!("{:.1} {:.1}", x, y));
	}
	path.push('Z');
}

fn svg_path(proj: &Projection, mp: &MultiPolygon<f64>) -> String {
	let mut path = String::new();
	for poly in mp.0.iter() {
		write_ring(&mut path, proj, poly.exterior());
		for ring in poly.interiors() {
			write_ring(&mut path, proj, ring);
		}
	}
	path
}


/// Draw the joined regions as a choropleth SVG. Regions without geometry are
/// left out; regions without a value are drawn grey.
pub fn write_svg<W: io::Write>(w: &mut W, joined: &Joined, title: &str, options: &RenderOptions) -> io::Result<()> {
	let (proj, map_height) = Projection::fit(
		joined.regions.iter().filter_map(|r| r.geometry.as_ref()),
		options.width,
		TITLE_HEIGHT,
	).unwrap_or((
		Projection{min_x: 0.0, max_y: 0.0, kx: 1.0, scale: 1.0, offset_x: MARGIN, offset_y: TITLE_HEIGHT},
		0.0,
	));
	let range = joined.value_range();
	let legend_height = if options.legend && range.is_some() { LEGEND_HEIGHT } else { 0.0 };
	let height = TITLE_HEIGHT + map_height + legend_height + MARGIN;

	write!(
		w,
		"<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{:.0}\" height=\"{:.0}\" viewBox=\"0 0 {:.0} {:.0}\">\n",
		options.width, height, options.width, height,
	)?;
	write!(
		w,
		"<text x=\"{:.1}\" y=\"26\" text-anchor=\"middle\" font-family=\"sans-serif\" font-size=\"18\">{}</text>\n",
		options.width / 2.0, escape(title),
	)?;

	for region in joined.regions.iter() {
		let mp = match region.geometry.as_ref() {
			Some(mp) => mp,
			None => continue,
		};
		let fill = match (region.value, range) {
			(Some(v), Some((lo, hi))) => {
				let t = if hi == lo { 0.5 } else { (v as f64 - lo as f64) / (hi as f64 - lo as f64) };
				hex(viridis(t))
			},
			_ => MISSING_FILL.into(),
		};
		let label = match region.value {
			Some(v) => format!("{}: {}", region.name, v),
			None => format!("{}: –", region.name),
		};
		write!(
			w,
			"<path d=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\" fill-rule=\"evenodd\"><title>{}</title></path>\n",
			svg_path(&proj, mp), fill, EDGE_COLOR, EDGE_WIDTH, escape(&label),
		)?;
	}

	if let (true, Some((lo, hi))) = (options.legend, range) {
		let y = TITLE_HEIGHT + map_height + 15.0;
		let bar_width = options.width - 2.0 * MARGIN;
		w.write_all(b"<defs><linearGradient id=\"scale\">")?;
		for (i, c) in VIRIDIS.iter().enumerate() {
			write!(w, "<stop offset=\"{}%\" stop-color=\"{}\"/>", i * 10, hex(*c))?;
		}
		w.write_all(b"</linearGradient></defs>\n")?;
		write!(
			w,
			"<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"15\" fill=\"url(#scale)\"/>\n",
			MARGIN, y, bar_width,
		)?;
		write!(
			w,
			"<text x=\"{:.1}\" y=\"{:.1}\" font-family=\"sans-serif\" font-size=\"12\">{}</text>\n",
			MARGIN, y + 32.0, lo,
		)?;
		write!(
			w,
			"<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-family=\"sans-serif\" font-size=\"12\">{}</text>\n",
			MARGIN + bar_width, y + 32.0, hi,
		)?;
	}

	w.write_all(b"</svg>\n")?;
	Ok(())
}

pub fn render_svg(joined: &Joined, title: &str, options: &RenderOptions) -> String {
	let mut buf = Vec::new();
	// writing into a Vec cannot fail
	let _ = write_svg(&mut buf, joined, title, options);
	String::from_utf8_lossy(&buf).into_owned()
}


#[cfg(test)]
mod tests {
	use super::*;
	use crate::join::JoinedRegion;
	use geo::polygon;

	fn square(x: f64, y: f64) -> MultiPolygon<f64> {
		MultiPolygon::new(vec![polygon![
			(x: x, y: y),
			(x: x + 1.0, y: y),
			(x: x + 1.0, y: y + 1.0),
			(x: x, y: y + 1.0),
			(x: x, y: y),
		]])
	}

	fn region(name: &str, value: Option<i64>, geometry: Option<MultiPolygon<f64>>) -> JoinedRegion {
		JoinedRegion{name: name.into(), code: None, geometry, value}
	}

	fn render(joined: &Joined) -> String {
		render_svg(joined, "Kokku Elussünnid maakondade kaupa (2020)", &RenderOptions::default())
	}

	#[test]
	fn viridis_endpoints() {
		assert_eq!(viridis(0.0), (0x44, 0x01, 0x54));
		assert_eq!(viridis(1.0), (0xfd, 0xe7, 0x25));
		assert_eq!(viridis(7.0), viridis(1.0));
		assert_eq!(viridis(-1.0), viridis(0.0));
	}

	#[test]
	fn extremes_get_scale_endpoints_and_missing_is_grey() {
		let joined = Joined{regions: vec![
			region("Harju", Some(1950), Some(square(24.0, 59.0))),
			region("Tartu", Some(780), Some(square(26.0, 58.0))),
			region("Hiiu", None, Some(square(22.0, 58.5))),
			region("Nowhere", Some(5), None),
		]};
		let svg = render(&joined);
		assert!(svg.starts_with("<svg "));
		assert!(svg.trim_end().ends_with("</svg>"));
		assert_eq!(svg.matches("<path ").count(), 3);
		let harju = svg.lines().find(|l| l.contains("<title>Harju: 1950</title>")).unwrap();
		assert!(harju.contains("fill=\"#fde725\" stroke="));
		assert!(svg.contains(&format!("fill=\"{}\"", MISSING_FILL)));
		assert!(svg.contains("url(#scale)"));
		assert!(svg.contains("maakondade kaupa (2020)"));
	}

	#[test]
	fn values_spanning_the_whole_range_are_coloured() {
		let joined = Joined{regions: vec![
			region("Low", Some(i64::MIN), Some(square(24.0, 59.0))),
			region("High", Some(i64::MAX), Some(square(26.0, 58.0))),
		]};
		let svg = render(&joined);
		let low = svg.lines().find(|l| l.contains("<title>Low: ")).unwrap();
		let high = svg.lines().find(|l| l.contains("<title>High: ")).unwrap();
		assert!(low.contains("fill=\"#440154\""));
		assert!(high.contains("fill=\"#fde725\""));
	}

	#[test]
	fn titles_are_escaped() {
		let mut buf = Vec::new();
		write_svg(&mut buf, &Joined::default(), "a < b & c", &RenderOptions::default()).unwrap();
		let svg = String::from_utf8(buf).unwrap();
		assert!(svg.contains("a &lt; b &amp; c"));
		assert!(!svg.contains("url(#scale)"));
	}

	#[test]
	fn projection_keeps_points_inside_canvas() {
		let shapes = vec![square(21.7, 57.5), square(27.2, 59.5)];
		let (proj, height) = Projection::fit(shapes.iter(), 800.0, TITLE_HEIGHT).unwrap();
		let (x0, y0) = proj.project(21.7, 60.5);
		let (x1, y1) = proj.project(28.2, 57.5);
		assert!((x0 - MARGIN).abs() < 1e-9);
		assert!((x1 - (800.0 - MARGIN)).abs() < 1e-9);
		assert!((y0 - TITLE_HEIGHT).abs() < 1e-9);
		assert!((y1 - (TITLE_HEIGHT + height)).abs() < 1e-9);
	}

	#[test]
	fn default_title_uses_labels() {
		assert_eq!(
			default_title(SexGrouping::Male, Indicator::NaturalChange, 2019),
			"Mehed Loomulik iive maakondade kaupa (2019)",
		);
	}
}
