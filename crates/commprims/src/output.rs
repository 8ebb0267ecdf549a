use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use commprims_frame::{HexBytes, RawFrame};
use serde::Serialize;

const FRAME_SCHEMA_ID: &str = "https://schemas.3leaps.dev/commprims/cli/v1/frame.schema.json";
const EXCHANGE_SCHEMA_ID: &str =
    "https://schemas.3leaps.dev/commprims/cli/v1/exchange-report.schema.json";

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    schema_id: &'a str,
    index: u64,
    header: u8,
    kind: u8,
    payload_size: usize,
    payload: String,
    trailer: u8,
}

impl<'a> FrameOutput<'a> {
    fn new(index: u64, frame: &RawFrame) -> Self {
        Self {
            schema_id: FRAME_SCHEMA_ID,
            index,
            header: frame.header(),
            kind: frame.kind(),
            payload_size: frame.payload().len(),
            payload: HexBytes(frame.payload()).to_string(),
            trailer: frame.trailer(),
        }
    }
}

pub fn print_frame(index: u64, frame: &RawFrame, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&FrameOutput::new(index, frame)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "KIND", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    index.to_string(),
                    format!("0x{:02X}", frame.kind()),
                    frame.payload().len().to_string(),
                    HexBytes(frame.payload()).to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "#{index} kind=0x{:02X} size={} frame={}",
                frame.kind(),
                frame.payload().len(),
                HexBytes(frame.as_bytes())
            );
        }
        OutputFormat::Raw => print_raw(frame.as_bytes()),
    }
}

/// Result of one `exchange` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeReport {
    pub pushed: u32,
    pub samples: Vec<Option<u32>>,
    pub last: Option<u32>,
    pub monotonic: bool,
}

impl ExchangeReport {
    pub fn hits(&self) -> usize {
        self.samples.iter().filter(|s| s.is_some()).count()
    }
}

#[derive(Serialize)]
struct ExchangeOutput<'a> {
    schema_id: &'a str,
    #[serde(flatten)]
    report: &'a ExchangeReport,
    hits: usize,
}

pub fn print_exchange(report: &ExchangeReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&ExchangeOutput {
            schema_id: EXCHANGE_SCHEMA_ID,
            report,
            hits: report.hits(),
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SAMPLE", "VALUE"]);
            for (i, sample) in report.samples.iter().enumerate() {
                table.add_row(vec![i.to_string(), sample_text(*sample)]);
            }
            println!("{table}");
            println!(
                "pushed={} hits={} last={} monotonic={}",
                report.pushed,
                report.hits(),
                sample_text(report.last),
                report.monotonic
            );
        }
        OutputFormat::Pretty => {
            let values: Vec<String> = report.samples.iter().map(|s| sample_text(*s)).collect();
            println!(
                "pushed={} samples=[{}] last={} monotonic={}",
                report.pushed,
                values.join(", "),
                sample_text(report.last),
                report.monotonic
            );
        }
        OutputFormat::Raw => {
            let mut out = String::new();
            for value in report.samples.iter().flatten() {
                out.push_str(&value.to_string());
                out.push('\n');
            }
            print_raw(out.as_bytes());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout().lock();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn sample_text(sample: Option<u32>) -> String {
    sample.map_or_else(|| "-".to_string(), |v| v.to_string())
}
