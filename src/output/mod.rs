//! Console event reporting
//!
//! One reporter instance narrates the whole session: probes out, pongs in,
//! timeouts, export results, and the shutdown summary. Color is controlled
//! globally through the `colored` override so `--no-color` and dumb
//! terminals get plain text everywhere.

use crate::error::AppError;
use crate::models::MeasurementEntry;
use crate::probe::SessionStats;
use colored::Colorize;
use std::fmt::Write as _;
use std::path::Path;

/// Console reporter for session events
pub struct Reporter {
    verbose: bool,
    debug: bool,
}

impl Reporter {
    /// Create a reporter and apply the global color setting
    pub fn new(enable_color: bool, verbose: bool, debug: bool) -> Self {
        colored::control::set_override(enable_color);
        Self { verbose, debug }
    }

    pub fn startup(&self, display_name: &str, destination: &str, local_hex: &str) {
        println!("{} {}", "Display name:".bold(), display_name);
        println!("{} {}", "Local address:".bold(), local_hex);
        if !destination.is_empty() {
            println!("{} {}", "Destination:".bold(), destination);
        }
    }

    pub fn waiting_for_path(&self) {
        println!("{}", "Waiting for destination path...".yellow());
    }

    pub fn path_established(&self) {
        println!("{}", "Path established".green());
    }

    pub fn starting(&self, interval_secs: u64) {
        println!("Starting range test (ping every {}s), Ctrl+C to stop", interval_secs);
    }

    pub fn probe_sent(&self, sequence: u64) {
        println!("{} Ping #{}", "→".cyan(), sequence);
    }

    pub fn probe_deferred(&self) {
        if self.verbose {
            println!("{}", "  Destination unresolved, probe deferred".yellow());
        }
    }

    pub fn send_failed(&self, sequence: u64, error: &AppError) {
        println!("{} Send failed for #{}: {}", "✗".red(), sequence, error);
    }

    pub fn pong(&self, entry: &MeasurementEntry, stats: &SessionStats) {
        let mut line = format!("{} Pong #{} RTT:{:.0}ms", "✓".green(), entry.sequence, entry.rtt_ms());

        if let Some(link) = &entry.link {
            if let Some(rssi) = link.rssi {
                let _ = write!(line, " RSSI:{}dBm", rssi);
            }
            if let Some(snr) = link.snr {
                let _ = write!(line, " SNR:{:.1}dB", snr);
            }
        }

        match &entry.gps {
            Some(gps) => {
                let _ = write!(line, " GPS:{:.6},{:.6}", gps.latitude, gps.longitude);
            }
            None => line.push_str(" (no GPS)"),
        }

        let _ = write!(line, " [{}]", stats.summary());
        println!("{}", line);
    }

    pub fn pong_discarded(&self, sequence: u64, rtt_ms: f64, stats: &SessionStats) {
        println!(
            "{} Pong #{} RTT:{:.0}ms (no GPS - not logged) [{}]",
            "✓".green(),
            sequence,
            rtt_ms,
            stats.summary()
        );
    }

    pub fn timeout(&self, sequence: u64) {
        println!("{} Timeout #{}", "✗".red(), sequence);
    }

    pub fn announced(&self) {
        if self.verbose {
            println!("{}", "[announced]".dimmed());
        }
    }

    pub fn announce_failed(&self, error: &AppError) {
        if self.debug {
            println!("{} Announce failed: {}", "!".yellow(), error);
        }
    }

    pub fn export_written(&self, path: &Path) {
        if self.verbose {
            println!("  {} {}", "✓".green(), path.display());
        }
    }

    pub fn export_failed(&self, error: &AppError) {
        println!("{} Export failed: {}", "✗".red(), error);
    }

    pub fn downloads_copied(&self, paths: &[std::path::PathBuf]) {
        if paths.is_empty() {
            return;
        }
        println!("Copied to downloads:");
        for path in paths {
            println!("  {} {}", "✓".green(), path.display());
        }
    }

    pub fn summary(&self, stats: &SessionStats, entries: usize, export_dir: &Path) {
        println!();
        println!("{} {}", "Done:".bold(), stats.summary());
        if stats.lost() > 0 {
            println!("  Lost: {}", stats.lost());
        }
        if stats.send_failures() > 0 {
            println!("  Send failures: {}", stats.send_failures());
        }
        println!("  Logged entries: {}", entries);
        println!("  Exports in: {}/", export_dir.display());
    }

    pub fn debug_line(&self, message: &str) {
        if self.debug {
            println!("{} {}", "[debug]".dimmed(), message);
        }
    }
}
