extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
extern crate mandelbrot;
extern crate num;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use failure::Error;
use mandelbrot::render::as_secs;
use mandelbrot::{render_to_file, RenderConfig};
use num::Complex;
use std::path::PathBuf;
use std::str::FromStr;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_number<T: FromStr>(s: &str, err: &str) -> Result<(), String> {
    match T::from_str(s) {
        Ok(_) => Ok(()),
        Err(_) => Err(err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const CENTER: &str = "center";
const ZOOM: &str = "zoom";
const THREADS: &str = "threads";
const ITERATIONS: &str = "iterations";
const CHUNK: &str = "chunk";
const SEQUENTIAL: &str = "sequential";
const BALANCE: &str = "balance";

fn args<'a>(max_threads: &'a str) -> ArgMatches<'a> {
    let cpus = num_cpus::get();

    App::new("mandelbrot")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Mandelbrot set renderer, writes a binary PPM")
        .arg(
            Arg::with_name(OUTPUT)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .default_value("MandelbrotSet.ppm")
                .help("Output file"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("5000x5000")
                .validator(|s| validate_pair::<usize>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image, WIDTHxHEIGHT"),
        )
        .arg(
            Arg::with_name(CENTER)
                .long(CENTER)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-0.5,0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse viewport center"))
                .help("Center of the viewport on the complex plane, RE,IM"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("2")
                .validator(|s| validate_number::<f64>(&s, "Could not parse zoom radius"))
                .help("Distance from the center to the edges of the viewport"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("1000")
                .validator(|s| validate_number::<usize>(&s, "Could not parse iteration count"))
                .help("Iterations before a point is presumed to be in the set"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value(max_threads)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        cpus,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", cpus),
                    )
                })
                .help("Number of threads to use in solver"),
        )
        .arg(
            Arg::with_name(CHUNK)
                .long(CHUNK)
                .takes_value(true)
                .default_value("10")
                .validator(|s| validate_number::<usize>(&s, "Could not parse chunk size"))
                .help("Pixels handed to a thread at a time"),
        )
        .arg(
            Arg::with_name(SEQUENTIAL)
                .long(SEQUENTIAL)
                .help("Render on a single thread, pixel by pixel"),
        )
        .arg(
            Arg::with_name(BALANCE)
                .long(BALANCE)
                .help("Report how busy each thread was"),
        )
        .get_matches()
}

// Every value has a default and passed its validator, so a miss here
// is a bug in `args`.
fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, Error> {
    matches
        .value_of(name)
        .and_then(|s| T::from_str(s).ok())
        .ok_or_else(|| format_err!("Could not parse {}", name))
}

fn config(matches: &ArgMatches) -> Result<RenderConfig, Error> {
    let size = matches
        .value_of(SIZE)
        .and_then(|s| parse_pair::<usize>(s, 'x'))
        .ok_or_else(|| format_err!("Error parsing image dimensions"))?;
    let center = matches
        .value_of(CENTER)
        .and_then(parse_complex)
        .ok_or_else(|| format_err!("Error parsing viewport center"))?;
    Ok(RenderConfig {
        width: size.0,
        height: size.1,
        max_iterations: value(matches, ITERATIONS)?,
        center,
        zoom: value(matches, ZOOM)?,
        threads: value(matches, THREADS)?,
        chunk_size: value(matches, CHUNK)?,
        output: PathBuf::from(matches.value_of(OUTPUT).unwrap_or("MandelbrotSet.ppm")),
    })
}

fn run() -> Result<(), Error> {
    let max_threads = num_cpus::get().to_string();
    let matches = args(&max_threads);
    let config = config(&matches)?;
    let sequential = matches.is_present(SEQUENTIAL);
    let balance = matches.is_present(BALANCE);
    if balance && sequential {
        warn!("--balance has nothing to report with --sequential");
    }
    let summary = render_to_file(&config, sequential)?;

    if let (true, Some(stats)) = (balance, summary.stats.as_ref()) {
        for (worker, load) in stats.workers.iter().enumerate() {
            println!(
                "#{} : {:.6}s, {} chunks, {} pixels",
                worker,
                as_secs(load.busy),
                load.chunks,
                load.pixels
            );
        }
        println!("imbalance: {:.3}", stats.imbalance());
    }
    println!("rendered in {:.6}s", as_secs(summary.elapsed));
    info!("{} bytes written", summary.bytes);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(e) = run() {
        eprintln!("Render failure: {}", e);
        for cause in e.iter_causes() {
            eprintln!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
