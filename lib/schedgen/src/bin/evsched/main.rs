use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use json;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use structopt::StructOpt;
use tracing::*;

use instances::io::read_activities;
use schedgen::data::group_name;
use schedgen::rng::SocSampler;
use schedgen::sched::{Params, Schedule, SolveError, Solver};
use schedgen::{init_logging, Map};

mod common;
use common::{clap_range_validator, output_report, OutputOptions, RunReport};

/// Thin host driver: load one person's activity pool (or a directory of
/// pools), solve day by day with SoC carry-over, write schedule CSVs
/// and a JSON run report.
#[derive(Debug, StructOpt)]
struct ClArgs {
    /// Activity pool CSV, or a directory of pool CSVs (one per person).
    #[structopt(parse(from_os_str))]
    activities: PathBuf,
    /// Directory the schedule CSVs are written into.
    #[structopt(long, short = "d", default_value = "output", parse(from_os_str))]
    outdir: PathBuf,
    /// Fixed starting SoC; sampled per person when omitted.
    #[structopt(long)]
    soc: Option<f64>,
    /// Overnight floor applied to the carried-over SoC.
    #[structopt(long = "min-soc", default_value = "0.1", validator = clap_range_validator(Some(0.0), Some(1.0)))]
    min_soc: f64,
    #[structopt(long, default_value = "1", validator = clap_range_validator(Some(1), None))]
    days: u32,
    #[structopt(long, default_value = "0")]
    seed: u64,
    #[structopt(long, short = "c", default_value = "1", validator = clap_range_validator(Some(1), None))]
    cpus: usize,
    #[structopt(flatten)]
    output: OutputOptions,
}

#[derive(Debug, Serialize)]
struct ScheduleRow<'a> {
    person: &'a str,
    day: u32,
    act_id: u16,
    group: &'static str,
    start_time: i32,
    duration: i32,
    soc_start: f64,
    soc_end: f64,
    charge_mode: String,
    charge_duration: i32,
    charge_cost: f64,
    utility: f64,
}

struct DayResult {
    day: u32,
    utility: f64,
    final_soc: f64,
    charge_cost: f64,
    dssr_iterations: u32,
    elementary: bool,
    solve_seconds: f64,
    relaxations: u32,
}

struct PersonRun {
    person: String,
    days: Vec<DayResult>,
}

struct RunSummary {
    runs: Vec<PersonRun>,
}

impl RunSummary {
    fn aggregate(&self) -> Map<&'static str, f64> {
        let mut agg: Map<&'static str, f64> = Map::default();
        let mut add = |k, v| *agg.entry(k).or_insert(0.0) += v;
        for run in &self.runs {
            for day in &run.days {
                add("solves", 1.0);
                add("dssr_iterations", day.dssr_iterations as f64);
                add("soc_relaxations", day.relaxations as f64);
                add("charge_cost", day.charge_cost);
                add("solve_seconds", day.solve_seconds);
            }
        }
        agg
    }
}

fn day_to_json(d: &DayResult) -> json::JsonValue {
    json::object! {
        day: d.day,
        utility: d.utility,
        final_soc: d.final_soc,
        charge_cost: d.charge_cost,
        dssr_iterations: d.dssr_iterations,
        elementary: d.elementary,
        solve_seconds: d.solve_seconds,
        soc_relaxations: d.relaxations,
    }
}

impl RunReport for RunSummary {
    fn write_json(&self, mut buf: impl std::io::Write) -> Result<()> {
        let root: json::JsonValue = self
            .runs
            .iter()
            .map(|run| {
                json::object! {
                    person: run.person.as_str(),
                    days: run.days.iter().map(day_to_json).collect::<Vec<_>>(),
                }
            })
            .collect::<Vec<_>>()
            .into();
        root.write_pretty(&mut buf, 2)?;
        Ok(())
    }

    fn write_json_summary(&self, mut buf: impl std::io::Write) -> Result<()> {
        let mut root = json::JsonValue::new_object();
        for (k, v) in self.aggregate() {
            root[k] = v.into();
        }
        root.write_pretty(&mut buf, 2)?;
        Ok(())
    }
}

/// Solve one day, stepping the starting SoC up towards full if the pool
/// is infeasible at the requested level.
fn solve_with_relaxation(
    params: &Params,
    pool: &[instances::Activity],
    mut soc: f64,
) -> Result<(Schedule, u32)> {
    let mut solver = Solver::new(params, pool)?;
    let mut relaxations = 0u32;
    loop {
        match solver.solve(soc) {
            Ok(sched) => return Ok((sched, relaxations)),
            Err(SolveError::Infeasible) if soc < 1.0 => {
                soc = (soc + 0.1).min(1.0);
                relaxations += 1;
                warn!(soc, "infeasible, retrying with a higher starting SoC");
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn write_schedule_csv(
    path: &Path,
    person: &str,
    day: u32,
    sched: &Schedule,
) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {:?}", path))?;
    for e in &sched.entries {
        w.serialize(ScheduleRow {
            person,
            day,
            act_id: e.act_id,
            group: group_name(e.group),
            start_time: e.start_time,
            duration: e.duration,
            soc_start: e.soc_start,
            soc_end: e.soc_end,
            charge_mode: e.charge_mode.to_string(),
            charge_duration: e.charge_duration,
            charge_cost: e.charge_cost,
            utility: e.utility,
        })?;
    }
    w.flush()?;
    Ok(())
}

fn run_person(
    params: &Params,
    args: &ClArgs,
    person: &str,
    pool_path: &Path,
) -> Result<PersonRun> {
    let span = info_span!("person", person);
    let _g = span.enter();

    let pool = read_activities(pool_path)?;
    let mut sampler = SocSampler::seeded(args.seed.wrapping_add(person_hash(person)));
    let mut soc = match args.soc {
        Some(s) => s,
        None => sampler.initial_soc(),
    };

    let mut days = Vec::with_capacity(args.days as usize);
    for day in 0..args.days {
        let (sched, relaxations) = solve_with_relaxation(params, &pool, soc)?;
        let csv_path = args.outdir.join(format!("{}_day{}.csv", person, day));
        write_schedule_csv(&csv_path, person, day, &sched)?;
        info!(day, utility = sched.utility, final_soc = sched.final_soc, "day solved");
        // tomorrow starts on what is left, with an overnight floor
        soc = sched.final_soc.max(args.min_soc);
        days.push(DayResult {
            day,
            utility: sched.utility,
            final_soc: sched.final_soc,
            charge_cost: sched.total_charge_cost(),
            dssr_iterations: sched.dssr_iterations,
            elementary: sched.elementary,
            solve_seconds: sched.solve_seconds,
            relaxations,
        });
    }
    Ok(PersonRun { person: person.to_string(), days })
}

/// Stable hash so each person gets an independent but reproducible RNG
/// stream from one run seed.
fn person_hash(s: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut h = fnv::FnvHasher::default();
    s.hash(&mut h);
    h.finish()
}

fn person_pools(path: &Path) -> Result<Vec<(String, PathBuf)>> {
    if path.is_dir() {
        let mut pools = Vec::new();
        for entry in fs::read_dir(path)? {
            let p = entry?.path();
            if p.extension().and_then(|e| e.to_str()) == Some("csv") {
                let stem = p.file_stem().unwrap().to_string_lossy().into_owned();
                pools.push((stem, p));
            }
        }
        pools.sort();
        if pools.is_empty() {
            bail!("no activity pool CSVs found in {:?}", path);
        }
        Ok(pools)
    } else {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "person".to_string());
        Ok(vec![(stem, path.to_path_buf())])
    }
}

fn main() -> Result<()> {
    let args: ClArgs = StructOpt::from_args();
    let _g = init_logging(args.output.log.clone());
    debug!(?args);
    ThreadPoolBuilder::new()
        .num_threads(args.cpus)
        .build_global()
        .expect("Failed to construct thread pool");

    fs::create_dir_all(&args.outdir)
        .with_context(|| format!("failed to create output directory {:?}", args.outdir))?;
    let params = Params::default();
    let pools = person_pools(&args.activities)?;

    let runs: Result<Vec<PersonRun>> = pools
        .par_iter()
        .map(|(person, path)| run_person(&params, &args, person, path))
        .collect();

    output_report(&args.output, RunSummary { runs: runs? })?;
    Ok(())
}
