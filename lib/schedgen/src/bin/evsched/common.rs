use std::fmt::Display;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use anyhow::Result;
use structopt::StructOpt;

pub const REPORT_FORMAT_STRINGS: [&str; 2] = ["json", "summary"];

/// How much of the run report to emit: the full per-person day records,
/// or aggregate counters only.
#[derive(Debug, Copy, Clone)]
pub enum ReportFormat {
    Json,
    Summary,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s {
            "json" => Ok(Self::Json),
            "summary" => Ok(Self::Summary),
            _ => Err(format!("invalid string: {}", s)),
        };
    }
}

impl Default for ReportFormat {
    fn default() -> Self { ReportFormat::Summary }
}

#[derive(Clone, Debug, StructOpt)]
pub struct OutputOptions {
    #[structopt(long="format", short="f", parse(try_from_str), default_value="summary", possible_values=&REPORT_FORMAT_STRINGS)]
    pub fmt: ReportFormat,
    /// Report destination; stdout when omitted.
    #[structopt(long="output", short="o")]
    pub file: Option<PathBuf>,
    #[structopt(long)]
    pub log: Option<PathBuf>,
}

pub fn clap_range_validator<T>(minval: Option<T>, maxval: Option<T>) -> impl Fn(String) -> Result<(), String>
    where
        T: FromStr + PartialOrd + Display + Copy,
        T::Err: Display
{
    return move |val| {
        let x: T = val.parse().map_err(|e: T::Err| e.to_string())?;
        if let Some(y) = minval {
            if x < y { return Err(format!("must be greater than {}", y)); }
        }
        if let Some(y) = maxval {
            if x > y { return Err(format!("must be less than {}", y)); }
        }
        return Ok(());
    };
}

/// A finished run that can report itself as JSON.
pub trait RunReport {
    fn write_json(&self, buf: impl io::Write) -> Result<()>;
    fn write_json_summary(&self, buf: impl io::Write) -> Result<()>;
}

pub fn output_report(options: &OutputOptions, report: impl RunReport) -> Result<()> {
    let write = |buf: Box<dyn io::Write>| -> Result<()> {
        match options.fmt {
            ReportFormat::Json => report.write_json(buf),
            ReportFormat::Summary => report.write_json_summary(buf),
        }
    };
    match options.file.as_ref() {
        Some(path) => write(Box::new(io::BufWriter::new(std::fs::File::create(path)?))),
        None => write(Box::new(io::stdout())),
    }
}
