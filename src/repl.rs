//! Interactive REPL.

use crate::commands::{format_json, format_report};
use crate::demos::{Demo, DemoKind};
use bytefsm_core::EngineConfig;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};

const HELP_TEXT: &str = r#"
Available commands:
  help                 Show this help
  list                 List the bundled demos
  use <demo>           Switch to another demo
  describe             Print the current demo's states and transitions
  run <input>          Run the current demo over <input>
  <input>              Same as run

  quit, exit           Exit the REPL
"#;

pub fn run(
    config: &EngineConfig,
    demo: DemoKind,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "bytefsm REPL".bold().cyan());

    let mut session = Session {
        config,
        demo: demo.build(config)?,
        json,
    };

    let rl_config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(rl_config)?;

    let history_path = std::env::var("HOME")
        .map(|h| std::path::PathBuf::from(h).join(".bytefsm_history"))
        .unwrap_or_else(|_| ".bytefsm_history".into());
    let _ = rl.load_history(&history_path);

    println!("Type 'help' for available commands.\n");

    loop {
        let prompt = format!("{} ", format!("{}>", session.demo.kind().name()).cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match session.execute(line) {
                    Ok(Some(output)) => println!("{}\n", output),
                    Ok(None) => break,
                    Err(e) => println!("{}: {}\n", "Error".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);
    Ok(())
}

struct Session<'a> {
    config: &'a EngineConfig,
    demo: Demo,
    json: bool,
}

impl Session<'_> {
    /// Returns `None` when the session should end.
    fn execute(&mut self, line: &str) -> Result<Option<String>, Box<dyn std::error::Error>> {
        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };

        match cmd.to_lowercase().as_str() {
            "help" | "?" => Ok(Some(HELP_TEXT.to_string())),

            "quit" | "exit" | "q" => Ok(None),

            "list" | "ls" => {
                let mut output = String::new();
                for demo in DemoKind::ALL {
                    let marker = if demo == self.demo.kind() { "*" } else { " " };
                    output.push_str(&format!("{} {}\n", marker, demo.name().cyan()));
                }
                Ok(Some(output.trim_end().to_string()))
            }

            "use" => {
                let Some(kind) = DemoKind::parse(rest) else {
                    return Ok(Some(format!(
                        "Usage: use <{}>",
                        DemoKind::ALL.map(|d| d.name()).join("|")
                    )));
                };
                self.demo = kind.build(self.config)?;
                Ok(Some(format!("{} {}", "Using".green(), kind.name().cyan())))
            }

            "describe" => Ok(Some(self.demo.describe())),

            "run" => self.run(rest.as_bytes()).map(Some),

            _ => self.run(line.as_bytes()).map(Some),
        }
    }

    fn run(&mut self, input: &[u8]) -> Result<String, Box<dyn std::error::Error>> {
        let report = self.demo.run(input);
        if self.json {
            format_json(&report)
        } else {
            Ok(format_report(&report))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(config: &EngineConfig) -> Session<'_> {
        Session {
            config,
            demo: DemoKind::Alternator.build(config).unwrap(),
            json: false,
        }
    }

    #[test]
    fn test_switch_demo() {
        let config = EngineConfig::default();
        let mut session = session(&config);

        session.execute("use email").unwrap();
        assert_eq!(session.demo.kind(), DemoKind::Email);

        let usage = session.execute("use nothing").unwrap().unwrap();
        assert!(usage.starts_with("Usage: use <bit-counter|alternator|email>"));
        assert_eq!(session.demo.kind(), DemoKind::Email);
    }

    #[test]
    fn test_bare_line_is_input() {
        colored::control::set_override(false);
        let config = EngineConfig::default();
        let mut session = session(&config);

        let output = session.execute("0101").unwrap().unwrap();
        assert!(output.contains("ACCEPTED"));

        let output = session.execute("run 0011").unwrap().unwrap();
        assert!(output.contains("REJECTED"));
    }

    #[test]
    fn test_quit() {
        let config = EngineConfig::default();
        let mut session = session(&config);
        assert!(session.execute("quit").unwrap().is_none());
    }
}
