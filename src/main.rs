use anyhow::{anyhow, bail, Result};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use regimefx::catalog::{RegimeCatalog, RegimeId};
use regimefx::config::{parse_flag, EngineConfig};
use regimefx::logging::{log, obj, v_num, v_str, Domain, Level};
use regimefx::path::{describe_path, resolve_path};
use regimefx::session::SessionHandle;

/// Line commands read from stdin.
#[derive(Debug, Clone, PartialEq)]
enum CliCommand {
    Select(RegimeId),
    Pause,
    Resume,
    Toggle,
    ReducedMotion(bool),
    Path(RegimeId, RegimeId),
    Classify(u8),
    Layout,
    Quit,
}

impl FromStr for CliCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = match parts.as_slice() {
            ["select", key] => CliCommand::Select(key.parse()?),
            ["pause"] => CliCommand::Pause,
            ["resume"] => CliCommand::Resume,
            ["toggle"] => CliCommand::Toggle,
            ["reduced", flag] => CliCommand::ReducedMotion(parse_flag(flag)),
            ["path", from, to] => CliCommand::Path(from.parse()?, to.parse()?),
            ["classify", value] => CliCommand::Classify(
                value
                    .parse::<u8>()
                    .ok()
                    .filter(|v| *v <= 100)
                    .ok_or_else(|| anyhow!("sentiment must be 0-100, got {}", value))?,
            ),
            ["layout"] => CliCommand::Layout,
            ["quit"] | ["exit"] => CliCommand::Quit,
            [] => bail!("empty command"),
            _ => return Err(anyhow!("unrecognized command: {}", line.trim())),
        };
        Ok(cmd)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = EngineConfig::from_env();
    let catalog = Arc::new(RegimeCatalog::builtin()?);
    log(
        Level::Info,
        Domain::Catalog,
        "catalog_loaded",
        obj(&[
            ("regimes", json!(catalog.regimes().len())),
            ("fingerprint", v_str(&catalog.fingerprint()?)),
        ]),
    );

    let session = SessionHandle::spawn(Arc::clone(&catalog), &cfg);

    let mut snapshots = session.subscribe();
    let watcher = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snap = snapshots.borrow_and_update().clone();
            if let Ok(Value::Object(fields)) = serde_json::to_value(&snap) {
                log(Level::Info, Domain::System, "snapshot", fields);
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let cmd = match line.parse::<CliCommand>() {
            Ok(cmd) => cmd,
            Err(err) => {
                eprintln!("[cli] {}", err);
                continue;
            }
        };

        match cmd {
            CliCommand::Select(target) => {
                let outcome = session.select(target).await?;
                eprintln!("[cli] select {} -> {:?}", target, outcome);
            }
            CliCommand::Pause => {
                session.pause().await?;
            }
            CliCommand::Resume => {
                session.resume().await?;
            }
            CliCommand::Toggle => {
                session.toggle().await?;
            }
            CliCommand::ReducedMotion(on) => {
                session.set_reduced_motion(on).await?;
            }
            CliCommand::Path(from, to) => {
                let path: Vec<&str> = resolve_path(from, to).iter().map(|id| id.key()).collect();
                eprintln!("[cli] {} ({})", path.join(" -> "), describe_path(from, to));
            }
            CliCommand::Classify(value) => match catalog.classify(value) {
                Some(regime) => eprintln!("[cli] {} -> {} ({})", value, regime.id, regime.label),
                None => eprintln!("[cli] {} matches no regime", value),
            },
            CliCommand::Layout => {
                for (id, point) in RegimeId::ALL.iter().zip(cfg.layout().positions()) {
                    log(
                        Level::Info,
                        Domain::System,
                        "layout",
                        obj(&[
                            ("regime", v_str(id.key())),
                            ("x", v_num(point.x)),
                            ("y", v_num(point.y)),
                        ]),
                    );
                }
            }
            CliCommand::Quit => break,
        }
    }

    session.shutdown().await?;
    watcher.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("select eg".parse::<CliCommand>().unwrap(), CliCommand::Select(RegimeId::ExtremeGreed));
        assert_eq!("reduced on".parse::<CliCommand>().unwrap(), CliCommand::ReducedMotion(true));
        assert_eq!(
            "path ef g".parse::<CliCommand>().unwrap(),
            CliCommand::Path(RegimeId::ExtremeFear, RegimeId::Greed)
        );
        assert_eq!("classify 62".parse::<CliCommand>().unwrap(), CliCommand::Classify(62));
        assert!("classify 101".parse::<CliCommand>().is_err());
        assert_eq!(" quit ".parse::<CliCommand>().unwrap(), CliCommand::Quit);
        assert!("select zz".parse::<CliCommand>().is_err());
        assert!("dance".parse::<CliCommand>().is_err());
    }
}
