//! vigil - scripted chart sessions
//!
//! Reads a session document (chart settings, data rows and a list of control
//! events), drives a chart through it and prints the final frame, detail view
//! and diagnostics as JSON.

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

use vigil_core::{
    Chart, ChartSettings, ControlEvent, DetailView, RecordingAdapter, RenderFrame, VigilError,
};
use vigil_data::{DataSchema, Dataset, Diagnostic};

#[derive(Parser, Debug)]
#[command(name = "vigil", version, about = "Drive a safety chart from a session file")]
struct Args {
    /// Session JSON file; reads stdin when omitted
    session: Option<PathBuf>,

    /// Include every frame drawn, not just the last
    #[arg(long)]
    all_frames: bool,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,
}

/// Input document
#[derive(Debug, Deserialize)]
struct Session {
    #[serde(default)]
    settings: ChartSettings,
    data: serde_json::Value,
    #[serde(default)]
    events: Vec<ControlEvent>,
}

/// Output document
#[derive(Debug, Serialize)]
struct Report {
    /// Column types of the input rows
    schema: DataSchema,
    frame: RenderFrame,
    detail: DetailView,
    diagnostics: Vec<Diagnostic>,
    /// Events the chart rejected, with the reason
    rejected: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frames: Option<Vec<RenderFrame>>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let input = match &args.session {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let report = run(&input, args.all_frames)?;
    let json = if args.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{}", json);
    Ok(())
}

fn run(input: &str, all_frames: bool) -> Result<Report, VigilError> {
    let session: Session = serde_json::from_str(input)?;
    let dataset = Dataset::from_json_value(session.data)?;
    tracing::info!("loaded {} records", dataset.len());
    let schema = DataSchema::infer(dataset.records(), &session.settings.missing_values);

    let mut chart = Chart::new(&dataset, &session.settings, RecordingAdapter::new())?;

    let mut rejected = Vec::new();
    for event in session.events {
        let label = format!("{:?}", event);
        if let Err(e) = chart.handle(event) {
            tracing::warn!("rejected {}: {}", label, e);
            rejected.push(format!("{}: {}", label, e));
        }
    }

    let diagnostics = chart.take_diagnostics();
    let frame = chart.frame().clone();
    let detail = chart.detail().clone();
    let frames = all_frames.then(|| chart.into_adapter().frames);

    Ok(Report {
        schema,
        frame,
        detail,
        diagnostics,
        rejected,
        frames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION: &str = r#"{
        "settings": {"chart": "histogram", "histogram_bins": 4},
        "data": [
            {"USUBJID": "01", "TEST": "ALT", "STRESN": 10, "VISIT": "Screening"},
            {"USUBJID": "02", "TEST": "ALT", "STRESN": 20, "VISIT": "Screening"},
            {"USUBJID": "03", "TEST": "ALT", "STRESN": "NA", "VISIT": "Screening"}
        ],
        "events": [
            {"event": "select", "criterion": {"type": "bin", "index": 0}},
            {"event": "set_measure", "measure": "AST"}
        ]
    }"#;

    #[test]
    fn test_run_session() {
        let report = run(SESSION, true).unwrap();
        assert_eq!(report.frame.bars.len(), 4);
        assert_eq!(report.frame.population.shown, 2);
        assert_eq!(report.frame.population.total, 3);
        assert_eq!(report.detail.table.as_ref().map(|t| t.len()), Some(1));
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.frames.map(|f| f.len()), Some(2));
        assert!(report.schema.column("STRESN").map_or(false, |c| c.dtype.is_numeric()));
    }

    #[test]
    fn test_data_must_be_rows() {
        let err = run(r#"{"data": {"USUBJID": "01"}}"#, false).unwrap_err();
        assert!(matches!(err, VigilError::Data(_)));
    }
}
