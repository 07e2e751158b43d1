// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
extern crate failure;
extern crate image;
extern crate itertools;
extern crate num;
extern crate num_cpus;
extern crate rand;

use automata::elementary;
use automata::fractal::DEFAULT_JULIA_SEED;
use automata::life::{seed_gradient, seed_random};
use automata::{
    preset, presets, upsample, AutomataError, Boundary, Color, FractalEvaluator, FractalKind,
    FractalParams, GradientRule, Neighborhood, Palette, PixelBuffer, Rule, RowRule, RuleEngine,
    SeedRow, Smoothing, Viewport,
};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use image::ColorType;
use itertools::Itertools;
use log::{debug, info};
use num::Complex;
use rand::rngs::StdRng;
use rand::SeedableRng;
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

fn parse_list<T: FromStr>(s: &str) -> Option<Vec<T>> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| T::from_str(p).ok())
        .collect()
}

fn parse_size(s: &str) -> Option<(usize, usize)> {
    match parse_pair::<usize>(s, 'x') {
        Some((w, h)) if w > 0 && h > 0 => Some((w, h)),
        _ => None,
    }
}

fn parse_window(s: &str) -> Option<(f64, f64, f64, f64)> {
    match parse_list::<f64>(s) {
        Some(ref v) if v.len() == 4 => Some((v[0], v[1], v[2], v[3])),
        _ => None,
    }
}

fn parse_zoom(s: &str) -> Option<(usize, usize, f64)> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return None;
    }
    match (
        usize::from_str(parts[0]),
        usize::from_str(parts[1]),
        f64::from_str(parts[2]),
    ) {
        (Ok(x), Ok(y), Ok(f)) => Some((x, y, f)),
        _ => None,
    }
}

fn parse_colors(s: &str) -> Option<Vec<Color>> {
    s.split(',').map(|c| Color::from_hex(c.trim()).ok()).collect()
}

fn validate_with<T>(s: &str, parse: fn(&str) -> Option<T>, err: &str) -> Result<(), String> {
    match parse(s) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

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

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const WINDOW: &str = "window";
const KIND: &str = "kind";
const SEED: &str = "seed";
const SMOOTH: &str = "smooth";
const ITERATIONS: &str = "iterations";
const THREADS: &str = "threads";
const STEPS: &str = "steps";
const COLORS: &str = "colors";
const MIN_DISTANCE: &str = "min-distance";
const PAN: &str = "pan";
const ZOOM: &str = "zoom";
const PRESET: &str = "preset";
const BIRTH: &str = "birth";
const SURVIVE: &str = "survive";
const NEIGHBORHOOD: &str = "neighborhood";
const CLAMP: &str = "clamp";
const GENERATIONS: &str = "generations";
const DENSITY: &str = "density";
const RNG_SEED: &str = "rng-seed";
const SCALE: &str = "scale";
const RULE: &str = "rule";
const RANDOM: &str = "random";

fn output_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name(OUTPUT)
        .required(true)
        .long(OUTPUT)
        .short("o")
        .takes_value(true)
        .help("Output PNG file")
}

fn size_arg<'a, 'b>(default: &'a str) -> Arg<'a, 'b> {
    Arg::with_name(SIZE)
        .long(SIZE)
        .short("s")
        .takes_value(true)
        .default_value(default)
        .validator(|s| validate_with(&s, parse_size, "Could not parse grid size"))
        .help("Grid size, WIDTHxHEIGHT")
}

fn threads_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name(THREADS)
        .long(THREADS)
        .short("t")
        .takes_value(true)
        .validator(|s| {
            validate_range(
                &s,
                1,
                1024,
                "Could not parse thread count",
                "Thread count must be between 1 and 1024",
            )
        })
        .help("Number of worker threads (default: one per CPU)")
}

fn neighborhood_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name(NEIGHBORHOOD)
        .long(NEIGHBORHOOD)
        .short("n")
        .takes_value(true)
        .default_value("moore1")
        .validator(|s| {
            Neighborhood::from_str(&s)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .help("moore1, moore2, vonneumann1, vonneumann2 or weighted")
}

fn clamp_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name(CLAMP)
        .long(CLAMP)
        .help("Treat cells beyond the edge as dead instead of wrapping")
}

fn rng_seed_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name(RNG_SEED)
        .long(RNG_SEED)
        .takes_value(true)
        .validator(|s| {
            u64::from_str(&s)
                .map(|_| ())
                .map_err(|_| "Could not parse random seed".to_string())
        })
        .help("Seed for the random initial state")
}

fn scale_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name(SCALE)
        .long(SCALE)
        .takes_value(true)
        .default_value("4")
        .validator(|s| {
            validate_range(
                &s,
                1,
                64,
                "Could not parse scale",
                "Scale must be between 1 and 64",
            )
        })
        .help("Pixels per cell in the output image")
}

fn generations_arg<'a, 'b>(default: &'a str) -> Arg<'a, 'b> {
    Arg::with_name(GENERATIONS)
        .long(GENERATIONS)
        .short("g")
        .takes_value(true)
        .default_value(default)
        .validator(|s| {
            usize::from_str(&s)
                .map(|_| ())
                .map_err(|_| "Could not parse generation count".to_string())
        })
        .help("Number of generations to run")
}

fn fractal_command<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("fractal")
        .about("Render a Mandelbrot or Julia set")
        .arg(output_arg())
        .arg(size_arg("1000x500"))
        .arg(
            Arg::with_name(WINDOW)
                .long(WINDOW)
                .short("w")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2,2,-1,1")
                .validator(|s| validate_with(&s, parse_window, "Could not parse window"))
                .help("Complex-plane window, xmin,xmax,ymin,ymax"),
        )
        .arg(
            Arg::with_name(KIND)
                .long(KIND)
                .short("k")
                .takes_value(true)
                .possible_values(&["mandelbrot", "julia"])
                .default_value("mandelbrot")
                .help("Which set to render"),
        )
        .arg(
            Arg::with_name(SEED)
                .long(SEED)
                .takes_value(true)
                .allow_hyphen_values(true)
                .validator(|s| {
                    validate_with(&s, |s| parse_pair::<f64>(s, ','), "Could not parse Julia seed")
                })
                .help("Julia seed, re,im"),
        )
        .arg(
            Arg::with_name(SMOOTH)
                .long(SMOOTH)
                .takes_value(true)
                .possible_values(&["none", "linear", "logarithmic", "distance"])
                .default_value("logarithmic")
                .help("How escape counts are smoothed"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("1000")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Iteration cap"),
        )
        .arg(threads_arg())
        .arg(
            Arg::with_name(STEPS)
                .long(STEPS)
                .takes_value(true)
                .default_value("100")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        100_000,
                        "Could not parse palette steps",
                        "Palette steps must be between 1 and 100000",
                    )
                })
                .help("Length of the palette ramp"),
        )
        .arg(
            Arg::with_name(COLORS)
                .long(COLORS)
                .takes_value(true)
                .default_value("000000,ffffff")
                .validator(|s| validate_with(&s, parse_colors, "Could not parse colors"))
                .help("Two to four palette keyframes, RRGGBB,..."),
        )
        .arg(
            Arg::with_name(MIN_DISTANCE)
                .long(MIN_DISTANCE)
                .takes_value(true)
                .default_value("0.01")
                .validator(|s| {
                    f64::from_str(&s)
                        .map(|_| ())
                        .map_err(|_| "Could not parse minimum distance".to_string())
                })
                .help("Boundary threshold for distance smoothing"),
        )
        .arg(
            Arg::with_name(PAN)
                .long(PAN)
                .takes_value(true)
                .allow_hyphen_values(true)
                .validator(|s| {
                    validate_with(&s, |s| parse_pair::<i64>(s, ','), "Could not parse pan")
                })
                .help("Pan by dx,dy pixels after the first render"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .long(ZOOM)
                .takes_value(true)
                .validator(|s| validate_with(&s, parse_zoom, "Could not parse zoom"))
                .help("Zoom by factor around pixel x,y,factor after the first render"),
        )
}

fn life_command<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("life")
        .about("Run a birth/survive automaton")
        .arg(output_arg())
        .arg(size_arg("160x120"))
        .arg(
            Arg::with_name(PRESET)
                .long(PRESET)
                .short("p")
                .takes_value(true)
                .validator(|s| preset(&s).map(|_| ()).map_err(|e| e.to_string()))
                .help("A named preset; overrides --birth, --survive and --neighborhood"),
        )
        .arg(
            Arg::with_name(BIRTH)
                .long(BIRTH)
                .short("b")
                .takes_value(true)
                .default_value("3")
                .validator(|s| validate_with(&s, parse_list::<u32>, "Could not parse birth counts"))
                .help("Neighbor counts that bring a dead cell to life"),
        )
        .arg(
            Arg::with_name(SURVIVE)
                .long(SURVIVE)
                .short("u")
                .takes_value(true)
                .default_value("2,3")
                .validator(|s| {
                    validate_with(&s, parse_list::<u32>, "Could not parse survival counts")
                })
                .help("Neighbor counts that keep a live cell alive"),
        )
        .arg(neighborhood_arg())
        .arg(clamp_arg())
        .arg(generations_arg("100"))
        .arg(
            Arg::with_name(DENSITY)
                .long(DENSITY)
                .short("d")
                .takes_value(true)
                .default_value("0.3")
                .validator(|s| match f64::from_str(&s) {
                    Ok(d) if d >= 0.0 && d <= 1.0 => Ok(()),
                    Ok(_) => Err("Density must be between 0 and 1".to_string()),
                    Err(_) => Err("Could not parse density".to_string()),
                })
                .help("Fraction of cells alive at the start"),
        )
        .arg(rng_seed_arg())
        .arg(scale_arg())
        .arg(threads_arg())
}

fn gradient_command<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("gradient")
        .about("Run a gradient (summed intensity) automaton")
        .arg(output_arg())
        .arg(size_arg("160x120"))
        .arg(
            Arg::with_name(BIRTH)
                .long(BIRTH)
                .short("b")
                .takes_value(true)
                .default_value("510,765")
                .validator(|s| {
                    validate_with(&s, |s| parse_pair::<u32>(s, ','), "Could not parse birth range")
                })
                .help("Intensity range LO,HI that brings a dead cell to life"),
        )
        .arg(
            Arg::with_name(SURVIVE)
                .long(SURVIVE)
                .short("u")
                .takes_value(true)
                .default_value("255,765")
                .validator(|s| {
                    validate_with(
                        &s,
                        |s| parse_pair::<u32>(s, ','),
                        "Could not parse survival range",
                    )
                })
                .help("Intensity range LO,HI that keeps a live cell alive"),
        )
        .arg(neighborhood_arg())
        .arg(clamp_arg())
        .arg(generations_arg("50"))
        .arg(rng_seed_arg())
        .arg(scale_arg())
}

fn elementary_command<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("elementary")
        .about("Run an elementary one-dimensional automaton")
        .arg(output_arg())
        .arg(size_arg("201x100"))
        .arg(
            Arg::with_name(RULE)
                .long(RULE)
                .short("r")
                .takes_value(true)
                .default_value("30")
                .validator(|s| {
                    u8::from_str(&s)
                        .map(|_| ())
                        .map_err(|_| "Rule must be between 0 and 255".to_string())
                })
                .help("Wolfram rule number"),
        )
        .arg(
            Arg::with_name(RANDOM)
                .long(RANDOM)
                .help("Seed the first row randomly instead of with a single cell"),
        )
        .arg(clamp_arg())
        .arg(rng_seed_arg())
        .arg(scale_arg())
}

fn args<'a>() -> ArgMatches<'a> {
    App::new("automata")
        .version("0.1.0")
        .about("Cellular automata and escape-time fractal renderer")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(fractal_command())
        .subcommand(life_command())
        .subcommand(gradient_command())
        .subcommand(elementary_command())
        .subcommand(SubCommand::with_name("presets").about("List the named automaton presets"))
        .get_matches()
}

type CliResult<T> = Result<T, failure::Error>;

// Values have all passed their validators by now; a failure here means
// a validator and its parser disagree.
fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> CliResult<T> {
    matches
        .value_of(name)
        .and_then(|s| T::from_str(s).ok())
        .ok_or_else(|| AutomataError::invalid(format!("could not read --{}", name)).into())
}

fn parsed<T>(matches: &ArgMatches, name: &str, parse: fn(&str) -> Option<T>) -> CliResult<T> {
    matches
        .value_of(name)
        .and_then(parse)
        .ok_or_else(|| AutomataError::invalid(format!("could not read --{}", name)).into())
}

fn threads(matches: &ArgMatches) -> CliResult<usize> {
    match matches.value_of(THREADS) {
        Some(_) => value(matches, THREADS),
        None => Ok(num_cpus::get()),
    }
}

fn rng(matches: &ArgMatches) -> CliResult<StdRng> {
    match matches.value_of(RNG_SEED) {
        Some(_) => Ok(StdRng::seed_from_u64(value(matches, RNG_SEED)?)),
        None => Ok(StdRng::from_entropy()),
    }
}

fn write_image(outfile: &str, buffer: &PixelBuffer) -> CliResult<()> {
    image::save_buffer(
        outfile,
        buffer.as_bytes(),
        buffer.width() as u32,
        buffer.height() as u32,
        ColorType::RGBA(8),
    )?;
    info!("wrote {}x{} image to {}", buffer.width(), buffer.height(), outfile);
    Ok(())
}

fn write_scaled(matches: &ArgMatches, buffer: &PixelBuffer) -> CliResult<()> {
    let scaled = upsample(buffer, value(matches, SCALE)?)?;
    write_image(matches.value_of(OUTPUT).unwrap_or_default(), &scaled)
}

fn run_fractal(matches: &ArgMatches) -> CliResult<()> {
    let (width, height) = parsed(matches, SIZE, parse_size)?;
    let (xmin, xmax, ymin, ymax) = parsed(matches, WINDOW, parse_window)?;
    let viewport = Viewport::new(width, height, (xmin, xmax), (ymin, ymax))?;

    let kind = match FractalKind::from_str(matches.value_of(KIND).unwrap_or("mandelbrot"))? {
        FractalKind::Julia { .. } => {
            let seed = match matches.value_of(SEED) {
                Some(s) => match parse_pair::<f64>(s, ',') {
                    Some((re, im)) => Complex::new(re, im),
                    None => return Err(AutomataError::invalid("could not read --seed").into()),
                },
                None => DEFAULT_JULIA_SEED,
            };
            FractalKind::Julia { seed }
        }
        kind => kind,
    };

    let params = FractalParams {
        kind,
        smoothing: Smoothing::from_str(matches.value_of(SMOOTH).unwrap_or("logarithmic"))?,
        max_iter: value(matches, ITERATIONS)?,
        palette: Palette::new(parsed(matches, COLORS, parse_colors)?, value(matches, STEPS)?)?,
        min_distance: value(matches, MIN_DISTANCE)?,
        ..FractalParams::default()
    };
    let workers = threads(matches)?;

    let mut buffer = PixelBuffer::new(width, height);
    let mut evaluator = FractalEvaluator::new(viewport, params);
    let painted = evaluator.render(&mut buffer, workers)?;
    debug!("first render painted {} pixels", painted);

    if matches.value_of(ZOOM).is_some() {
        let (x, y, factor) = parsed(matches, ZOOM, parse_zoom)?;
        evaluator.zoom_toward(&mut buffer, x, y, factor)?;
        let painted = evaluator.render(&mut buffer, workers)?;
        debug!("zoomed render painted {} pixels", painted);
    }
    if matches.value_of(PAN).is_some() {
        let (dx, dy) = parsed(matches, PAN, |s| parse_pair::<i64>(s, ','))?;
        evaluator.pan(&mut buffer, dx, dy)?;
        let painted = evaluator.render(&mut buffer, workers)?;
        debug!("panned render painted {} pixels", painted);
    }

    write_image(matches.value_of(OUTPUT).unwrap_or_default(), &buffer)
}

fn boundary(matches: &ArgMatches) -> Boundary {
    Boundary::from_wrap(!matches.is_present(CLAMP))
}

fn run_life(matches: &ArgMatches) -> CliResult<()> {
    let (width, height) = parsed(matches, SIZE, parse_size)?;
    let (neighborhood, rule) = match matches.value_of(PRESET) {
        Some(name) => {
            let p = preset(name)?;
            (p.neighborhood, p.rule)
        }
        None => (
            value::<Neighborhood>(matches, NEIGHBORHOOD)?,
            Rule::new(
                &parsed(matches, BIRTH, parse_list::<u32>)?,
                &parsed(matches, SURVIVE, parse_list::<u32>)?,
            ),
        ),
    };
    rule.validate(neighborhood)?;

    let engine = RuleEngine::new(neighborhood, boundary(matches));
    let workers = threads(matches)?;
    let generations: usize = value(matches, GENERATIONS)?;
    let mut buffer = PixelBuffer::new(width, height);
    seed_random(&mut buffer, value(matches, DENSITY)?, &mut rng(matches)?)?;
    for _ in 0..generations {
        if workers > 1 {
            engine.step_threaded(&mut buffer, &rule, workers)?;
        } else {
            engine.step(&mut buffer, &rule)?;
        }
    }
    debug!("ran {} generations on {}", generations, neighborhood);
    write_scaled(matches, &buffer)
}

fn run_gradient(matches: &ArgMatches) -> CliResult<()> {
    let (width, height) = parsed(matches, SIZE, parse_size)?;
    let neighborhood = value::<Neighborhood>(matches, NEIGHBORHOOD)?;
    let rule = GradientRule::new(
        parsed(matches, BIRTH, |s| parse_pair::<u32>(s, ','))?,
        parsed(matches, SURVIVE, |s| parse_pair::<u32>(s, ','))?,
    )?;
    let (lo, hi) = GradientRule::valid_range(neighborhood);
    if rule.birth().1 < lo || rule.birth().0 > hi {
        log::warn!(
            "birth range {:?} lies outside the {} range {}..{}",
            rule.birth(),
            neighborhood,
            lo,
            hi
        );
    }

    let engine = RuleEngine::new(neighborhood, boundary(matches));
    let mut rng = rng(matches)?;
    let mut buffer = PixelBuffer::new(width, height);
    seed_gradient(&mut buffer, &mut rng)?;
    for _ in 0..value::<usize>(matches, GENERATIONS)? {
        engine.step_gradient(&mut buffer, &rule, &mut rng)?;
    }
    write_scaled(matches, &buffer)
}

fn run_elementary(matches: &ArgMatches) -> CliResult<()> {
    let (width, height) = parsed(matches, SIZE, parse_size)?;
    let seed = if matches.is_present(RANDOM) {
        SeedRow::Random
    } else {
        SeedRow::Center
    };
    let mut buffer = PixelBuffer::new(width, height);
    elementary::generate(
        &mut buffer,
        RowRule(value(matches, RULE)?),
        boundary(matches),
        seed,
        &mut rng(matches)?,
    )?;
    write_scaled(matches, &buffer)
}

fn list_presets() -> CliResult<()> {
    for p in presets() {
        println!(
            "{} ({}): B{}/S{}",
            p.name,
            p.neighborhood,
            p.rule.birth().iter().join(","),
            p.rule.survive().iter().join(",")
        );
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let matches = args();
    let result = match matches.subcommand() {
        ("fractal", Some(m)) => run_fractal(m),
        ("life", Some(m)) => run_life(m),
        ("gradient", Some(m)) => run_gradient(m),
        ("elementary", Some(m)) => run_elementary(m),
        ("presets", _) => list_presets(),
        _ => Ok(()),
    };
    if let Err(e) = result {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
