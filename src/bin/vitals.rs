use std::fs::File;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use log::{debug, info};

use tracing_subscriber::EnvFilter;

use vitals::{Config, Indicator, RawTable, SexGrouping, Year};
use vitals::export::{export_file_name, write_csv, ExportOptions};
use vitals::render::{default_title, write_svg, RenderOptions};


/// County-level births, deaths and natural change in Estonia.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
	/// Configuration file (TOML); defaults are used when absent
	#[arg(short, long, value_name = "FILE", env = "VITALS_CONFIG")]
	config: Option<PathBuf>,

	/// Read the raw statistics CSV from this file instead of fetching it
	#[arg(short, long, value_name = "FILE", global = true)]
	input: Option<PathBuf>,

	/// Bypass the fetch cache and request fresh data
	#[arg(long, global = true)]
	refresh: bool,

	/// Log more detail (repeat for trace output)
	#[arg(short, long, action = clap::ArgAction::Count, global = true)]
	verbose: u8,

	#[command(subcommand)]
	command: Commands,
}

#[derive(clap::Args, Debug)]
struct Selection {
	/// Year to show
	#[arg(short, long)]
	year: Year,

	/// male / female / combined (or Mehed / Naised / Kokku)
	#[arg(short, long, default_value = "combined")]
	sex: SexGrouping,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Fetch the statistics table and write it as CSV
	Fetch {
		/// Output file; stdout if omitted, gzipped if it ends in .gz
		#[arg(short, long, value_name = "FILE")]
		out: Option<PathBuf>,
	},
	/// List the years present in the data
	Years,
	/// Print the indicator table for one year and sex grouping
	Table {
		#[command(flatten)]
		selection: Selection,
	},
	/// Write the indicator table as a CSV download
	Export {
		#[command(flatten)]
		selection: Selection,

		/// Directory to write into
		#[arg(short, long, value_name = "DIR", default_value = ".")]
		dir: PathBuf,

		/// Include the region code column
		#[arg(long)]
		with_code: bool,

		/// Include a row sequence number column
		#[arg(long)]
		numbered: bool,
	},
	/// Draw a choropleth of one indicator as SVG
	Map {
		#[command(flatten)]
		selection: Selection,

		/// births / deaths / natural_change (or the Estonian labels)
		#[arg(long, default_value = "natural_change")]
		indicator: Indicator,

		/// Output file; defaults to <sex>_<indicator>_<year>.svg
		#[arg(short, long, value_name = "FILE")]
		out: Option<PathBuf>,
	},
}


fn init_logging(verbose: u8) {
	let default = match verbose {
		0 => "warn,vitals=info",
		1 => "info,vitals=debug",
		_ => "debug,vitals=trace",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.init();
}

fn load_raw(cli: &Cli, config: &Config) -> vitals::Result<RawTable> {
	let mut progress = vitals::default_output();
	match &cli.input {
		Some(path) => {
			info!("reading statistics from {:?}", path);
			vitals::load_table(path, &mut *progress)
		},
		None => vitals::fetch_table(config, cli.refresh, &mut *progress),
	}
}

fn ensure_year(table: &RawTable, year: Year) -> Result<(), String> {
	let years = table.years();
	if years.contains(&year) {
		return Ok(())
	}
	let listed: Vec<String> = years.iter().map(|y| y.to_string()).collect();
	Err(format!("year {} not in data (available: {})", year, listed.join(", ")))
}

fn fetch(cli: &Cli, config: &Config, out: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
	let table = load_raw(cli, config)?;
	let mut buf = Vec::new();
	{
		let mut w = csv::Writer::from_writer(&mut buf);
		let mut header: Vec<&str> = vec![vitals::YEAR_COLUMN, vitals::REGION_COLUMN];
		header.extend(table.columns().iter().map(|c| c.as_str()));
		w.write_record(&header)?;
		for row in table.rows() {
			let mut record = vec![row.year.to_string(), row.region.to_string()];
			record.extend(row.values.iter().map(|v| v.map(|v| v.to_string()).unwrap_or_default()));
			w.write_record(&record)?;
		}
		w.flush()?;
	}
	match out {
		Some(path) => {
			vitals::magic_write(path, &buf[..])?;
			info!("wrote {} rows to {:?}", table.rows().len(), path);
		},
		None => io::stdout().write_all(&buf[..])?,
	}
	Ok(())
}

fn table(cli: &Cli, config: &Config, selection: &Selection) -> Result<(), Box<dyn std::error::Error>> {
	let raw = load_raw(cli, config)?;
	ensure_year(&raw, selection.year)?;
	let table = vitals::indicator_table(&raw, selection.year, selection.sex)?;
	println!("{} näitajad maakondade kaupa ({})", selection.sex, selection.year);
	let width = table.rows.iter().map(|r| r.region.chars().count()).max().unwrap_or(0).max(7);
	print!("{:width$}", "Maakond", width = width);
	for indicator in Indicator::ALL.iter() {
		print!("  {:>13}", indicator.label());
	}
	println!();
	for row in table.rows.iter() {
		print!("{:width$}", row.region.as_str(), width = width);
		for indicator in Indicator::ALL.iter() {
			match row.values[*indicator] {
				Some(v) => print!("  {:>13}", v),
				None => print!("  {:>13}", "-"),
			}
		}
		println!();
	}
	Ok(())
}

fn export(
		cli: &Cli,
		config: &Config,
		selection: &Selection,
		dir: &Path,
		options: ExportOptions,
		) -> Result<(), Box<dyn std::error::Error>>
{
	let raw = load_raw(cli, config)?;
	ensure_year(&raw, selection.year)?;
	let mut table = vitals::indicator_table(&raw, selection.year, selection.sex)?;
	if options.with_code {
		let regions = config.load_regions()?;
		table.assign_codes(|name| regions.code_for(name));
	}
	let path = dir.join(export_file_name(selection.sex, selection.year));
	let f = File::create(&path)?;
	write_csv(&table, io::BufWriter::new(f), options)?;
	println!("{}", path.display());
	Ok(())
}

fn map(
		cli: &Cli,
		config: &Config,
		selection: &Selection,
		indicator: Indicator,
		out: Option<&Path>,
		) -> Result<(), Box<dyn std::error::Error>>
{
	let raw = load_raw(cli, config)?;
	ensure_year(&raw, selection.year)?;
	let agg = vitals::aggregate(&raw, selection.year, selection.sex, indicator)?;
	let regions = config.load_regions()?;
	let joined = vitals::join(&regions, &agg);
	debug!("value range {:?}", joined.value_range());

	let path = match out {
		Some(p) => p.to_path_buf(),
		None => PathBuf::from(format!(
			"{}_{}_{}.svg",
			selection.sex.label().to_lowercase(),
			indicator.label().to_lowercase().replace(' ', "_"),
			selection.year,
		)),
	};
	let options = RenderOptions{width: config.render.width, ..RenderOptions::default()};
	let mut w = io::BufWriter::new(File::create(&path)?);
	write_svg(&mut w, &joined, &default_title(selection.sex, indicator, selection.year), &options)?;
	w.flush()?;
	println!("{}", path.display());
	Ok(())
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
	let config = Config::resolve(cli.config.as_ref())?;
	match &cli.command {
		Commands::Fetch{out} => fetch(cli, &config, out.as_deref()),
		Commands::Years => {
			let raw = load_raw(cli, &config)?;
			for year in raw.years() {
				println!("{}", year);
			}
			Ok(())
		},
		Commands::Table{selection} => table(cli, &config, selection),
		Commands::Export{selection, dir, with_code, numbered} => export(
			cli,
			&config,
			selection,
			dir,
			ExportOptions{numbered: *numbered, with_code: *with_code},
		),
		Commands::Map{selection, indicator, out} => map(cli, &config, selection, *indicator, out.as_deref()),
	}
}

fn main() {
	let cli = Cli::parse();
	init_logging(cli.verbose);
	if let Err(e) = run(&cli) {
		eprintln!("error: {}", e);
		std::process::exit(1);
	}
}
