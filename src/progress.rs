use std::io;
use std::io::Write;
use std::time;


pub trait ProgressSink {
	fn update(&mut self, inow: usize);
	fn finish(&mut self, inow: Option<usize>);
}


/// Rate meter drawn on stderr, rewriting the same line.
pub struct ProgressMeter {
	t0: time::Instant,
	tprev: time::Instant,
	iprev: usize,
	n: Option<usize>,
}

impl ProgressMeter {
	pub fn start(n: Option<usize>) -> Self {
		let now = time::Instant::now();
		match n {
			Some(_) => eprint!("{:6.0}% [{:6.2}/s]\r", 0.0, 0),
			None => eprint!("{:12} [{:6.2}/s]\r", 0, 0),
		}
		let _ = io::stderr().flush();
		Self{
			t0: now,
			tprev: now,
			iprev: 0,
			n,
		}
	}
}

impl ProgressSink for ProgressMeter {
	fn update(&mut self, inow: usize) {
		let now = time::Instant::now();
		let dt = (now - self.tprev).as_secs_f64();
		let rate = inow.saturating_sub(self.iprev) as f64 / dt;
		match self.n {
			Some(n) => {
				let done = (inow as f64) / (n as f64);
				eprint!("{:6.0}% [{:6.2}/s]\r", done * 100.0, rate);
			},
			None => {
				eprint!("{:12} [{:6.2}/s]\r", inow, rate);
			},
		}
		let _ = io::stderr().flush();
		self.iprev = inow;
		self.tprev = now;
	}

	fn finish(&mut self, inow: Option<usize>) {
		let (inow, tnow) = match inow.or(self.n) {
			Some(inow) => (inow, time::Instant::now()),
			None => (self.iprev, self.tprev),
		};
		let dt = (tnow - self.t0).as_secs_f64();
		let rate = inow as f64 / dt;
		match self.n {
			Some(_) => {
				eprintln!("{:6.0}% [{:6.2}/s]", 100.0, rate);
			},
			None => {
				eprintln!("{:12} [{:6.2}/s]", inow, rate);
			},
		}
	}
}


/// Swallows all progress reports.
pub struct NullSink;

impl ProgressSink for NullSink {
	fn update(&mut self, _inow: usize) {}
	fn finish(&mut self, _inow: Option<usize>) {}
}


/// Counts items of unknown total through a borrowed sink.
pub struct CountMeter<'s, S: ProgressSink + ?Sized> {
	sink: &'s mut S,
	n: usize,
}

impl<'s, S: ProgressSink + ?Sized> CountMeter<'s, S> {
	pub fn new(sink: &'s mut S) -> Self {
		Self{sink, n: 0}
	}

	pub fn update(&mut self, inow: usize) {
		self.n = inow;
		self.sink.update(inow);
	}

	pub fn finish(self, n: usize) {
		self.sink.finish(Some(n.max(self.n)));
	}
}


/// Progress on stderr when it is a terminal, nothing otherwise.
pub fn default_output() -> Box<dyn ProgressSink> {
	if isatty::stderr_isatty() {
		Box::new(ProgressMeter::start(None))
	} else {
		Box::new(NullSink)
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	struct Recorder {
		updates: Vec<usize>,
		finished: Option<Option<usize>>,
	}

	impl ProgressSink for Recorder {
		fn update(&mut self, inow: usize) {
			self.updates.push(inow);
		}

		fn finish(&mut self, inow: Option<usize>) {
			self.finished = Some(inow);
		}
	}

	#[test]
	fn count_meter_forwards_to_sink() {
		let mut rec = Recorder{updates: Vec::new(), finished: None};
		{
			let mut pm = CountMeter::new(&mut rec);
			pm.update(100);
			pm.update(200);
			pm.finish(250);
		}
		assert_eq!(rec.updates, vec![100, 200]);
		assert_eq!(rec.finished, Some(Some(250)));
	}
}
