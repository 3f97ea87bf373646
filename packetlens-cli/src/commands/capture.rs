//! `packetlens capture` command handler
//!
//! Replays a JSONL packet trace through a capture session, streams per-packet
//! progress lines, renders the final report and exports the CSV dataset.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use chrono::{DateTime, Local};
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, info};

use packetlens_capture::{
    CaptureSession, ExportView, RawPacket, ReplaySource, SessionConfig, Snapshot, SnapshotExporter,
};
use packetlens_core::config::PacketlensConfig;
use packetlens_core::error::{ConfigError, PacketlensError};
use packetlens_core::types::PacketRecord;

use crate::cli::{CaptureArgs, Profile};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `capture` command.
pub async fn execute(
    args: CaptureArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = load_config(config_path).await?;
    let session_config = resolve_session_config(&config, &args);
    let csv_path = resolve_csv_path(&config, &args);

    let packets = read_trace(&args.input).await?;
    info!(
        trace = %args.input.display(),
        packets = packets.len(),
        max_packets = session_config.max_packets,
        "replaying packet trace"
    );

    let top_sources = session_config.top_sources;
    let builder = CaptureSession::builder(session_config);
    let (mut session, progress_rx) = if args.quiet || !writer.is_text() {
        builder.build()?
    } else {
        builder.with_progress().build()?
    };

    // Ctrl+C requests a manual stop at the next packet boundary.
    let cancel = session.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let runner = tokio::spawn(async move {
        let snapshot = session.run(ReplaySource::new(packets)).await;
        (snapshot, session.progress_dropped())
    });

    if let Some(mut rx) = progress_rx {
        while let Some(progress) = rx.recv().await {
            print_progress_line(&progress.record, progress.total_count);
        }
    }

    let (snapshot, progress_dropped) = runner
        .await
        .map_err(|e| CliError::Command(format!("capture task failed: {}", e)))?;

    let csv_path = if args.no_csv {
        None
    } else {
        write_csv(&snapshot, &csv_path).await?;
        Some(csv_path.display().to_string())
    };

    let view = SnapshotExporter::new(top_sources).export(&snapshot);
    let report = CaptureReport {
        view,
        csv_path,
        progress_dropped,
    };
    writer.render(&report)?;

    Ok(())
}

/// Load configuration, falling back to defaults when the file is absent.
///
/// An explicit `-c` pointing at a missing file behaves the same way; the
/// `config validate` command exists to surface that case.
async fn load_config(config_path: &Path) -> Result<PacketlensConfig, CliError> {
    match PacketlensConfig::load(config_path).await {
        Ok(config) => Ok(config),
        Err(PacketlensError::Config(ConfigError::FileNotFound { path })) => {
            debug!(path, "config file not found, using defaults");
            let mut config = PacketlensConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
        Err(e) => Err(e.into()),
    }
}

/// Merge configured limits, the selected profile and explicit CLI overrides.
fn resolve_session_config(config: &PacketlensConfig, args: &CaptureArgs) -> SessionConfig {
    let mut session_config = match args.profile {
        Some(Profile::Simple) => SessionConfig::simple(),
        Some(Profile::Advanced) => SessionConfig::advanced(),
        Some(Profile::Visual) => SessionConfig::visual(),
        None => SessionConfig::from_core(&config.capture),
    };
    // Derived-stat parameters always come from the config file.
    session_config.histogram_bins = config.capture.histogram_bins;
    session_config.top_sources = config.capture.top_sources;
    session_config.progress_channel_capacity = config.capture.progress_channel_capacity;

    if let Some(max_packets) = args.max_packets {
        session_config.max_packets = max_packets;
    }
    if let Some(secs) = args.max_duration_secs {
        session_config.max_duration = std::time::Duration::from_secs(secs);
    }
    session_config
}

fn resolve_csv_path(config: &PacketlensConfig, args: &CaptureArgs) -> PathBuf {
    args.csv
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.export.csv_path))
}

/// Read a JSONL trace: one packet descriptor per line, blank lines ignored.
async fn read_trace(path: &Path) -> Result<Vec<RawPacket>, CliError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        CliError::Trace(format!("cannot read {}: {}", path.display(), e))
    })?;

    let mut packets = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let packet: RawPacket = serde_json::from_str(line).map_err(|e| {
            CliError::Trace(format!(
                "invalid packet descriptor on line {}: {}",
                index + 1,
                e
            ))
        })?;
        packets.push(packet);
    }
    Ok(packets)
}

fn print_progress_line(record: &PacketRecord, total_count: u64) {
    let time: DateTime<Local> = record.captured_at.into();
    println!(
        "[{:>3}] {} | {} -> {} | {} | {} bytes",
        total_count,
        time.format("%H:%M:%S"),
        record.src_label(),
        record.dst_label(),
        record.protocol,
        record.size_bytes,
    );
}

/// Write the per-packet dataset as CSV.
///
/// Column layout is fixed: `timestamp,src_ip,dst_ip,protocol,size`.
/// Timestamps are epoch seconds with microsecond precision; missing
/// addresses are written as `Unknown`.
async fn write_csv(snapshot: &Snapshot, path: &Path) -> Result<(), CliError> {
    let mut out = String::from("timestamp,src_ip,dst_ip,protocol,size\n");
    for record in &snapshot.records {
        let epoch = record
            .captured_at
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        out.push_str(&format!(
            "{:.6},{},{},{},{}\n",
            epoch,
            record.src_label(),
            record.dst_label(),
            record.protocol,
            record.size_bytes,
        ));
    }

    tokio::fs::write(path, out).await?;
    info!(path = %path.display(), rows = snapshot.records.len(), "csv dataset written");
    Ok(())
}

/// Final capture report payload.
#[derive(Serialize)]
pub struct CaptureReport {
    /// Derived report view of the session snapshot.
    #[serde(flatten)]
    pub view: ExportView,
    /// CSV output path, when the export ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<String>,
    /// Progress notifications dropped because the channel was full.
    pub progress_dropped: u64,
}

impl Render for CaptureReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let view = &self.view;

        writeln!(w)?;
        writeln!(w, "{}", "=== Capture Report ===".bold())?;
        writeln!(w, "Session:      {}", view.session_id)?;
        if let Some(reason) = view.reason {
            writeln!(w, "Stop reason:  {}", reason)?;
        }
        if let Some(failure) = &view.failure {
            writeln!(w, "Failure:      {}", failure.red())?;
        }
        if let Some(duration) = view.duration_secs {
            writeln!(w, "Duration:     {:.1} s", duration)?;
        }
        writeln!(
            w,
            "Packets:      {} ({} bytes)",
            view.total_count, view.total_bytes
        )?;

        if !view.protocols.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", "Protocol Distribution:".bold())?;
            for share in &view.protocols {
                writeln!(
                    w,
                    "  {:<8} {:>5} ({:>5.1}%)",
                    share.protocol, share.count, share.percent
                )?;
            }
        }

        if !view.top_sources.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", "Top Sources:".bold())?;
            for talker in &view.top_sources {
                writeln!(w, "  {:<39} {:>5}", talker.address, talker.count)?;
            }
        }

        if !view.histogram.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", "Size Distribution (bytes):".bold())?;
            for bucket in &view.histogram {
                writeln!(
                    w,
                    "  {:>6} - {:>6} | {:<30} {}",
                    bucket.lower,
                    bucket.upper,
                    "#".repeat(bucket.count.min(30) as usize),
                    bucket.count
                )?;
            }
        }

        if !view.time_series.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", "Packets per Second:".bold())?;
            for point in &view.time_series {
                writeln!(w, "  {:>4}s: {}", point.second, point.count)?;
            }
        }

        if let Some(csv_path) = &self.csv_path {
            writeln!(w)?;
            writeln!(w, "CSV dataset: {}", csv_path)?;
        }
        if self.progress_dropped > 0 {
            writeln!(
                w,
                "({} progress notifications dropped)",
                self.progress_dropped
            )?;
        }

        Ok(())
    }
}
