//! Output formatting utilities

use crate::utils::format_bytes;
use colored::*;
use fanout_types::{DiscoveryReport, FanoutError, Result, RunReport};
use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| FanoutError::serialization(format!("JSON serialization failed: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// Print error with formatting
pub fn print_error(error: &FanoutError) {
    eprintln!("{} {}", "Error:".red().bold(), error);
}

/// Print warning with formatting
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "Warning:".yellow().bold(), message);
}

/// Create a table header
pub fn table_header(columns: &[(&str, usize)]) -> String {
    columns
        .iter()
        .map(|(name, width)| format!("{:<width$}", name, width = *width).bold().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn print_discovery(report: &DiscoveryReport, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(report);
    }

    println!(
        "{} {} root device(s), {} usable device(s)",
        "Devices:".bold(),
        report.root_count().to_string().cyan(),
        report.leaf_count().to_string().cyan()
    );
    for root in &report.roots {
        println!();
        println!(
            "{} {} ({}, {} CUs, {})",
            root.root.id.to_string().bold(),
            root.root.name,
            root.root.kind,
            root.root.compute_units,
            format_bytes(root.root.global_memory_bytes)
        );
        match &root.fallback {
            Some(reason) => println!("  {} {}", "not partitioned:".yellow(), reason),
            None if root.leaves.len() > 1 => {
                println!("  {} sub-device(s)", root.leaves.len().to_string().cyan())
            }
            None => {}
        }
        if root.leaves.len() > 1 || root.leaves.iter().any(|l| l.id != root.root.id) {
            for leaf in &root.leaves {
                println!(
                    "    {:<8} {} CUs, max work-group {}, {}",
                    leaf.id.to_string(),
                    leaf.compute_units,
                    leaf.max_work_group_size,
                    format_bytes(leaf.global_memory_bytes)
                );
            }
        }
    }
    Ok(())
}

pub fn print_report(report: &RunReport, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(report);
    }

    println!("{} {} ({})", "Run".bold(), report.run_id, report.workload.cyan());
    println!(
        "  started {}, problem size {}, {} iteration(s) on {} context(s)",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.problem_size,
        report.iterations,
        report.assignments.len()
    );

    println!();
    println!(
        "{}",
        table_header(&[("CONTEXT", 8), ("DEVICE", 8), ("RANGE", 24), ("NAME", 0)])
    );
    for a in &report.assignments {
        println!(
            "{:<8} {:<8} {:<24} {}",
            a.context.to_string(),
            a.device.to_string(),
            format!("[{}, {})", a.partition.start, a.partition.end),
            a.device_name
        );
    }
    if report.partition_imbalance > 0 {
        println!(
            "  {} last partition carries {} extra element(s)",
            "note:".yellow(),
            report.partition_imbalance
        );
    }

    println!();
    println!("  compute       {:>10.3} ms", report.compute_ms);
    println!("  verification  {:>10.3} ms", report.verification_ms);

    if !report.kernel_stats.is_empty() {
        println!();
        println!("{}", "Kernel execution summary:".bold());
        for s in &report.kernel_stats {
            println!(
                "  {:<16} count {:<4} avg {:>10.2} us  min {:>10.2} us  max {:>10.2} us",
                s.kernel, s.count, s.avg_us, s.min_us, s.max_us
            );
        }

        println!();
        if report.overlaps.is_empty() {
            println!("{}", "No overlapping kernels.".dimmed());
        } else {
            println!("{}", "Overlapping kernels:".bold());
            for o in &report.overlaps {
                println!(
                    "  {} ({}, {}) overlaps {} ({}, {}) for {:.2} us ({:.2}% / {:.2}%)",
                    o.first_kernel,
                    o.first_context,
                    o.first,
                    o.second_kernel,
                    o.second_context,
                    o.second,
                    o.overlap_us,
                    o.first_percent,
                    o.second_percent
                );
            }
        }
    }

    if !report.memory.is_empty() {
        println!();
        println!("{}", "Device memory:".bold());
        for m in &report.memory {
            println!(
                "  {:<8} peak {:>10}  in use {:>10}  failed allocations {}",
                m.device.to_string(),
                format_bytes(m.peak_bytes),
                format_bytes(m.used_bytes),
                m.failed_allocations
            );
        }
    }

    println!();
    let v = &report.verification;
    if v.passed {
        println!(
            "{} {} of {} checked values match ({})",
            "PASSED".green().bold(),
            v.checked,
            v.checked,
            v.policy
        );
    } else {
        println!(
            "{} {} of {} checked values differ ({:.2}%, {})",
            "FAILED".red().bold(),
            v.mismatch_count,
            v.checked,
            v.mismatch_rate,
            v.policy
        );
        for m in &v.first_mismatches {
            println!(
                "  index {}: expected {}, got {}",
                m.index, m.expected, m.actual
            );
        }
    }
    Ok(())
}
