//! Command execution.

use crate::demos::{DemoKind, RunReport};
use crate::Commands;
use bytefsm_core::{EngineConfig, ErrorCode};
use colored::Colorize;
use std::io::Read;

/// Executes a command and returns the formatted output.
pub fn execute(
    config: &EngineConfig,
    cmd: Commands,
    json: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Repl { .. } => unreachable!(),

        Commands::List => {
            let mut output = String::new();
            for demo in DemoKind::ALL {
                output.push_str(&format!(
                    "  {:<12} {}\n",
                    demo.name().cyan(),
                    demo.description()
                ));
            }
            Ok(output.trim_end().to_string())
        }

        Commands::Describe { demo } => Ok(demo.build(config)?.describe()),

        Commands::Run { demo, input } => {
            let input = match input {
                Some(input) => input.into_bytes(),
                None => {
                    let mut buf = Vec::new();
                    std::io::stdin().read_to_end(&mut buf)?;
                    strip_newline(&mut buf);
                    buf
                }
            };

            let report = demo.build(config)?.run(&input);
            if json {
                format_json(&report)
            } else {
                Ok(format_report(&report))
            }
        }
    }
}

fn strip_newline(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
}

/// Formats a run report for the terminal.
pub fn format_report(report: &RunReport) -> String {
    let mut output = String::new();
    if !report.output.is_empty() {
        output.push_str(&report.output);
        if !report.output.ends_with('\n') {
            output.push('\n');
        }
    }

    let verdict = if report.accepted {
        "ACCEPTED".green().bold()
    } else {
        "REJECTED".red().bold()
    };
    output.push_str(&format!(
        "{} {} (state: {}, consumed: {})",
        verdict,
        report.machine.cyan(),
        report.final_state.as_deref().unwrap_or("-").yellow(),
        report.cursor
    ));

    if report.code != ErrorCode::Success {
        output.push_str(&format!("\n  code: {:?}", report.code));
    }
    if let Some(error) = &report.error {
        output.push_str(&format!("\n  error: {}", error.red()));
    }
    if let Some(stats) = &report.stats {
        output.push_str(&format!("\n  ones: {}, zeros: {}", stats.ones, stats.zeros));
    }
    if report.output_truncated {
        output.push_str(&format!("\n  {}", "output truncated".yellow()));
    }
    output
}

/// Formats a report as JSON.
pub fn format_json(report: &RunReport) -> Result<String, Box<dyn std::error::Error>> {
    Ok(serde_json::to_string_pretty(report)?)
}
