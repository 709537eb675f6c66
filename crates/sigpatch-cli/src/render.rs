//! Human-readable report output.

use std::path::Path;

use owo_colors::OwoColorize;
use sigpatch::{BackupOutcome, Direction, PatchReport, ScanReport, SiteState};

pub fn patch_report(path: &Path, report: &PatchReport) {
    match &report.backup {
        Some(BackupOutcome::Created(backup)) => {
            println!("{} Created backup at {}", "[OK]".green(), backup.display())
        }
        Some(BackupOutcome::Existing(backup)) => {
            println!("[INFO] Keeping existing backup {}", backup.display())
        }
        None => {}
    }

    for signature in &report.signatures {
        let count = signature.count();
        let status = if count > 0 {
            format!("{:>3}", count).green().to_string()
        } else {
            format!("{:>3}", count).yellow().to_string()
        };
        let offsets: Vec<String> = signature
            .occurrences
            .iter()
            .map(|o| format!("0x{:X}", o.start))
            .collect();
        println!("  {} {} {}", status, signature.name, offsets.join(", ").dimmed());

        for skipped in &signature.skipped {
            println!(
                "      {} 0x{:X}: {}",
                "skipped".yellow(),
                skipped.occurrence.start,
                skipped.reason
            );
        }
    }

    let verb = match report.direction {
        Direction::Patch => "Patched",
        Direction::Restore => "Restored",
    };

    if report.is_noop() {
        let message = match report.direction {
            Direction::Patch => "No signatures found; file may already be patched or unsupported",
            Direction::Restore => "No patched signatures found; nothing to restore",
        };
        println!("{} {}", "[WARN]".yellow(), message);
    } else if report.written {
        println!(
            "{} {} {} occurrence(s) in {}",
            "[OK]".green(),
            verb,
            report.total(),
            path.display()
        );
    } else {
        println!(
            "[DRY RUN] {} occurrence(s) would be {} in {}",
            report.total(),
            verb.to_lowercase(),
            path.display()
        );
    }
}

pub fn scan_report(path: &Path, report: &ScanReport) {
    println!("{}", path.display());
    for signature in &report.signatures {
        let state = signature.state();
        let label = format!("{:<9}", state.to_string());
        let label = match state {
            SiteState::Patched => label.green().to_string(),
            SiteState::Unpatched => label.cyan().to_string(),
            SiteState::Partial => label.yellow().to_string(),
            SiteState::Missing => label.red().to_string(),
        };
        println!(
            "  {} {} (unpatched: {}, patched: {})",
            label,
            signature.name,
            signature.unpatched.len(),
            signature.patched.len()
        );
    }

    if report.is_fully_patched() {
        println!("{} All signatures are patched", "[OK]".green());
    }
}
