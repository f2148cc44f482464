use std::fs;
use std::io;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, info};

use bytes::Bytes;

use super::api::{Query, StatisticsSource};
use super::error::Result;
use super::ioutil::{magic_open, magic_write};
use super::statistics::RawTable;


/// 64-bit FNV-1a; stable across builds, unlike `DefaultHasher`.
fn fnv1a(data: &[u8]) -> u64 {
	let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
	for b in data {
		hash ^= *b as u64;
		hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
	}
	hash
}


/// Memoizes statistics responses on disk, keyed by the query. Entries never
/// expire; pass `refresh` to `fetch_with` to replace one.
pub struct FetchCache {
	dir: PathBuf,
	scope: String,
}

impl FetchCache {
	/// `scope` separates entries of different endpoints sharing a directory.
	pub fn new<P: Into<PathBuf>>(dir: P, scope: &str) -> Self {
		Self{dir: dir.into(), scope: scope.into()}
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	pub fn key(&self, query: &Query) -> String {
		let mut material = self.scope.clone().into_bytes();
		material.push(b'\n');
		// serializing our own payload type cannot fail
		material.extend(serde_json::to_vec(&query.payload()).unwrap_or_default());
		format!("{}-{:016x}", query.table, fnv1a(&material))
	}

	pub fn path(&self, query: &Query) -> PathBuf {
		self.dir.join(format!("{}.csv.gz", self.key(query)))
	}

	pub fn get(&self, query: &Query) -> Result<Option<Bytes>> {
		let path = self.path(query);
		let mut r = match magic_open(&path) {
			Ok(r) => r,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
			Err(other) => return Err(other.into()),
		};
		let mut buf = Vec::new();
		r.read_to_end(&mut buf)?;
		debug!("cache hit {:?} ({} bytes)", path, buf.len());
		Ok(Some(Bytes::from(buf)))
	}

	pub fn put(&self, query: &Query, body: &[u8]) -> Result<()> {
		fs::create_dir_all(&self.dir)?;
		let path = self.path(query);
		magic_write(&path, body)?;
		debug!("cached {} bytes in {:?}", body.len(), path);
		Ok(())
	}

	/// Return the cached body for `query`, fetching and storing it on a miss
	/// or when `refresh` is set. Failed fetches, and bodies that do not parse
	/// as a statistics table, leave the cache untouched.
	pub fn fetch_with<S: StatisticsSource + ?Sized>(&self, source: &S, query: &Query, refresh: bool) -> Result<Bytes> {
		if !refresh {
			if let Some(body) = self.get(query)? {
				return Ok(body)
			}
		}
		info!("fetching table {} from statistics service", query.table);
		let body = source.fetch_raw(query)?;
		RawTable::from_bytes(&body[..])?;
		self.put(query, &body[..])?;
		Ok(body)
	}
}


#[cfg(test)]
mod tests {
	use super::*;
	use std::cell::Cell;
	use crate::error::Error;

	struct CountingSource {
		calls: Cell<usize>,
		status: Option<u16>,
		body: &'static [u8],
	}

	impl CountingSource {
		fn ok() -> Self {
			Self{calls: Cell::new(0), status: None, body: b"Aasta,Maakond,Mehed Surmad\n2020,Harju maakond,900\n"}
		}
	}

	impl StatisticsSource for CountingSource {
		fn fetch_raw(&self, _query: &Query) -> Result<Bytes> {
			self.calls.set(self.calls.get() + 1);
			match self.status {
				Some(code) => Err(Error::Status(code)),
				None => Ok(Bytes::from_static(self.body)),
			}
		}
	}

	#[test]
	fn fnv1a_known_vectors() {
		assert_eq!(fnv1a(b""), 0xcbf29ce484222325);
		assert_eq!(fnv1a(b"a"), 0xaf63dc4c8601ec8c);
	}

	#[test]
	fn key_depends_on_query_and_scope() {
		let cache = FetchCache::new("/tmp/unused", "https://a");
		let other_scope = FetchCache::new("/tmp/unused", "https://b");
		let q = Query::default();
		let mut q2 = Query::default();
		q2.years.pop();
		assert_eq!(cache.key(&q), cache.key(&q.clone()));
		assert_ne!(cache.key(&q), cache.key(&q2));
		assert_ne!(cache.key(&q), other_scope.key(&q));
		assert!(cache.key(&q).starts_with("RV032-"));
	}

	#[test]
	fn second_fetch_is_served_from_disk() {
		let dir = tempfile::tempdir().unwrap();
		let cache = FetchCache::new(dir.path(), "test");
		let src = CountingSource::ok();
		let q = Query::default();
		let a = cache.fetch_with(&src, &q, false).unwrap();
		let b = cache.fetch_with(&src, &q, false).unwrap();
		assert_eq!(a, b);
		assert_eq!(src.calls.get(), 1);
		cache.fetch_with(&src, &q, true).unwrap();
		assert_eq!(src.calls.get(), 2);
	}

	#[test]
	fn failed_fetch_is_not_cached() {
		let dir = tempfile::tempdir().unwrap();
		let cache = FetchCache::new(dir.path(), "test");
		let src = CountingSource{status: Some(500), ..CountingSource::ok()};
		let q = Query::default();
		assert!(matches!(cache.fetch_with(&src, &q, false), Err(Error::Status(500))));
		assert!(cache.get(&q).unwrap().is_none());
		assert!(!cache.path(&q).exists());
	}

	#[test]
	fn unparseable_body_is_not_cached() {
		let dir = tempfile::tempdir().unwrap();
		let cache = FetchCache::new(dir.path(), "test");
		let src = CountingSource{body: b"<html>maintenance</html>\n", ..CountingSource::ok()};
		let q = Query::default();
		assert!(matches!(cache.fetch_with(&src, &q, false), Err(Error::MissingColumn(_))));
		assert!(cache.fetch_with(&src, &q, false).is_err());
		assert_eq!(src.calls.get(), 2);
		assert!(!cache.path(&q).exists());
	}
}
