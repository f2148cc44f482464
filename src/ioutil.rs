use std::io;
use std::io::{Read, Write};
use std::fs;
use std::path::Path;

use flate2;


fn is_gzip(path: &Path) -> bool {
	matches!(path.extension(), Some(x) if x == "gz")
}

/// Open `path` for reading, decompressing on the fly if it ends in `.gz`.
pub fn magic_open<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn Read>> {
	let path = path.as_ref();
	if is_gzip(path) {
		Ok(Box::new(flate2::read::GzDecoder::new(fs::File::open(path)?)))
	} else {
		Ok(Box::new(fs::File::open(path)?))
	}
}

/// Write `data` to `path`, compressing it if the name ends in `.gz`.
///
/// The data is written to a sibling temporary file first and renamed into
/// place, so readers never observe a partial file.
pub fn magic_write<P: AsRef<Path>>(path: P, data: &[u8]) -> io::Result<()> {
	let path = path.as_ref();
	let mut tmp_name = path.as_os_str().to_owned();
	tmp_name.push(".tmp");
	let tmp = Path::new(&tmp_name);
	{
		let f = fs::File::create(tmp)?;
		if is_gzip(path) {
			let mut w = flate2::write::GzEncoder::new(f, flate2::Compression::default());
			w.write_all(data)?;
			w.finish()?.sync_all()?;
		} else {
			let mut w = io::BufWriter::new(f);
			w.write_all(data)?;
			w.flush()?;
		}
	}
	fs::rename(tmp, path)
}

/// Strip a leading UTF-8 byte order mark.
pub fn strip_bom(data: &[u8]) -> &[u8] {
	data.strip_prefix(&b"\xef\xbb\xbf"[..]).unwrap_or(data)
}
