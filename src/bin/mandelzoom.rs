use clap::{App, AppSettings, Arg, ArgMatches};
use failure::{format_err, Error};
use log::info;
use mandelzoom::{EngineConfig, Frame, FrameSink, ZoomConfig, ZoomDriver};
use num::Complex;
use std::path::PathBuf;
use std::str::FromStr;

fn validate_range<T: FromStr + PartialOrd>(
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

/// Fractions are open at zero; `include_one` decides the upper end.
fn validate_fraction(s: &str, include_one: bool, err: &str) -> Result<(), String> {
    match f64::from_str(s) {
        Ok(f) if f > 0.0 && (f < 1.0 || (include_one && f == 1.0)) => Ok(()),
        _ => Err(err.to_string()),
    }
}

const WORKERS: &str = "workers";
const ZOOM: &str = "zoom";
const PRECISION: &str = "precision";
const MINDIV: &str = "mindiv";
const MAXITER: &str = "maxiter";
const COLORS: &str = "colors";
const SIZE: &str = "size";
const FRAMES: &str = "frames";
const OUTPUT: &str = "output";
const X: &str = "x";
const Y: &str = "y";

fn args<'a>() -> ArgMatches<'a> {
    let max_workers = 8 * num_cpus::get();

    App::new("mandelzoom")
        .version("0.1.0")
        .about("Zooms into the Mandelbrot set, one frame at a time")
        .setting(AppSettings::AllowNegativeNumbers)
        .arg(
            Arg::with_name(WORKERS)
                .long(WORKERS)
                .short("w")
                .takes_value(true)
                .default_value("8")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_workers,
                        "Could not parse worker count",
                        &format!("Worker count must be between 1 and {}", max_workers),
                    )
                })
                .help("Number of threads per frame"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .default_value("0.9")
                .validator(|s| validate_fraction(&s, false, "Zoom must be between 0 and 1"))
                .help("Zoom amount per frame (range from 0 to 1)"),
        )
        .arg(
            Arg::with_name(PRECISION)
                .long(PRECISION)
                .short("p")
                .takes_value(true)
                .default_value("0.01")
                .validator(|s| validate_fraction(&s, true, "Precision must be in (0, 1]"))
                .help("Precision of Mandelbrot set computation (range from 0 to 1)"),
        )
        .arg(
            Arg::with_name(MINDIV)
                .long(MINDIV)
                .short("m")
                .takes_value(true)
                .default_value("0.05")
                .validator(|s| validate_fraction(&s, true, "Mindiv must be in (0, 1]"))
                .help("Minimal share of divergent points found before a frame may stop early"),
        )
        .arg(
            Arg::with_name(MAXITER)
                .long(MAXITER)
                .short("i")
                .takes_value(true)
                .default_value("-1")
                .validator(|s| {
                    i64::from_str(&s)
                        .map(|_| ())
                        .map_err(|_| "Could not parse iteration cap".to_string())
                })
                .help("Maximum number of iterations per frame; negative means unbounded"),
        )
        .arg(
            Arg::with_name(COLORS)
                .long(COLORS)
                .short("c")
                .takes_value(true)
                .default_value("200")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        100_000,
                        "Could not parse color count",
                        "Color count must be between 1 and 100000",
                    )
                })
                .help("Number of colors used to graph the Mandelbrot set"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("700")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        16_384,
                        "Could not parse image size",
                        "Image size must be between 1 and 16384",
                    )
                })
                .help("Width and height of each frame in pixels"),
        )
        .arg(
            Arg::with_name(FRAMES)
                .long(FRAMES)
                .short("n")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        std::usize::MAX,
                        "Could not parse frame count",
                        "Frame count must be positive",
                    )
                })
                .help("Stop after this many frames (default: never)"),
        )
        .arg(
            Arg::with_name(OUTPUT)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Directory to write numbered PNG frames into"),
        )
        .arg(
            Arg::with_name(X)
                .index(1)
                .requires(Y)
                .validator(|s| {
                    validate_range(
                        &s,
                        std::f64::MIN,
                        std::f64::MAX,
                        "Could not parse x",
                        "x must be finite",
                    )
                })
                .help("Real part of the zoom center"),
        )
        .arg(
            Arg::with_name(Y)
                .index(2)
                .validator(|s| {
                    validate_range(
                        &s,
                        std::f64::MIN,
                        std::f64::MAX,
                        "Could not parse y",
                        "y must be finite",
                    )
                })
                .help("Imaginary part of the zoom center"),
        )
        .get_matches()
}

fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, Error> {
    let raw = matches
        .value_of(name)
        .ok_or_else(|| format_err!("missing value for {}", name))?;
    T::from_str(raw).map_err(|_| format_err!("could not parse {} from {:?}", name, raw))
}

fn config(matches: &ArgMatches) -> Result<ZoomConfig, Error> {
    let defaults = ZoomConfig::default();
    let center = if matches.is_present(X) {
        Complex::new(value(matches, X)?, value(matches, Y)?)
    } else {
        defaults.center
    };

    let maxiter: i64 = value(matches, MAXITER)?;
    let max_iterations = if maxiter < 0 {
        None
    } else {
        Some(maxiter as usize)
    };

    Ok(ZoomConfig {
        center,
        initial_size: defaults.initial_size,
        zoom: value(matches, ZOOM)?,
        dimension: value(matches, SIZE)?,
        colors: value(matches, COLORS)?,
        workers: value(matches, WORKERS)?,
        engine: EngineConfig::new(
            value(matches, PRECISION)?,
            value(matches, MINDIV)?,
            max_iterations,
        )?,
    })
}

/// Writes every frame it is given into a directory as a numbered PNG.
struct PngSink {
    directory: PathBuf,
    written: usize,
}

impl FrameSink for PngSink {
    fn present(&mut self, frame: Frame) -> Result<(), Error> {
        self.written += 1;
        let path = self.directory.join(format!("frame-{:05}.png", self.written));
        frame.into_image().save(&path)?;
        info!("wrote {}", path.display());
        Ok(())
    }
}

/// Drops frames on the floor after noting them.
struct LogSink;

impl FrameSink for LogSink {
    fn present(&mut self, frame: Frame) -> Result<(), Error> {
        info!("frame ready, {0}x{0}", frame.dimension());
        Ok(())
    }
}

fn zoom<S: FrameSink>(
    driver: &mut ZoomDriver,
    sink: &mut S,
    frames: Option<usize>,
) -> Result<(), Error> {
    match frames {
        Some(count) => {
            for frame in driver.by_ref().take(count) {
                sink.present(frame?)?;
            }
            Ok(())
        }
        None => driver.run(sink),
    }
}

fn run() -> Result<(), Error> {
    let matches = args();
    let config = config(&matches)?;
    let frames = match matches.value_of(FRAMES) {
        Some(_) => Some(value(&matches, FRAMES)?),
        None => None,
    };

    println!("Point: {:.10} {:.10}", config.center.re, config.center.im);

    let mut driver = ZoomDriver::new(config)?;
    match matches.value_of(OUTPUT) {
        Some(directory) => {
            let directory = PathBuf::from(directory);
            std::fs::create_dir_all(&directory)?;
            let mut sink = PngSink {
                directory,
                written: 0,
            };
            zoom(&mut driver, &mut sink, frames)
        }
        None => zoom(&mut driver, &mut LogSink, frames),
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
