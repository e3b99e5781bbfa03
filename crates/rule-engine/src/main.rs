//! 规则引擎命令行工具
//!
//! 从文件加载规则 JSON，执行结构校验或针对条件记录评估。
//! 结果以 JSON 输出到 stdout，日志输出到 stderr。

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rule_engine::{Criteria, RuleEngine, ValidationResult};
use rules_shared::config::AppConfig;
use rules_shared::observability;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

/// 规则引擎命令行工具
#[derive(Parser, Debug)]
#[command(name = "rule-engine")]
#[command(version, about = "JSON 规则校验与评估工具")]
#[command(propagate_version = true)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)，覆盖配置文件
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 校验规则结构，规则无效时退出码为 1
    Validate {
        /// 规则 JSON 文件
        #[arg(short, long)]
        rule: PathBuf,
    },

    /// 针对条件记录评估规则
    Evaluate {
        /// 规则 JSON 文件
        #[arg(short, long)]
        rule: PathBuf,

        /// 条件记录 JSON 文件
        #[arg(short, long, conflicts_with = "data", required_unless_present = "data")]
        criteria: Option<PathBuf>,

        /// 内联的条件记录 JSON
        #[arg(short, long)]
        data: Option<String>,

        /// 输出完整的评估结果（含追踪）
        #[arg(long)]
        trace: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = AppConfig::load("rule-engine").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    let mut obs_config = config.observability.clone();
    if let Some(level) = &cli.log_level {
        obs_config = obs_config.with_log_level(level);
    }
    observability::init(&obs_config)?;

    match cli.command {
        Commands::Validate { rule } => {
            let engine = RuleEngine::new(&config.engine);
            let raw = read_json(&rule)?;
            let validation = engine.validate(&raw);
            print_json(&validation)?;
            Ok(exit_code(&validation))
        }
        Commands::Evaluate {
            rule,
            criteria,
            data,
            trace,
        } => {
            let mut engine_config = config.engine.clone();
            engine_config.trace_enabled |= trace;
            let engine = RuleEngine::new(&engine_config);

            let raw = read_json(&rule)?;
            let validation = engine.validate(&raw);
            if !validation.is_valid {
                warn!(rule = %rule.display(), "Refusing to evaluate an invalid rule");
                print_json(&validation)?;
                return Ok(exit_code(&validation));
            }

            let criteria = match (criteria, data) {
                (Some(path), _) => read_json(&path)?,
                (None, Some(inline)) => {
                    serde_json::from_str(&inline).context("Failed to parse --data as JSON")?
                }
                (None, None) => anyhow::bail!("either --criteria or --data is required"),
            };
            let criteria = Criteria::from_value(criteria)?;

            let compiled = engine.compile(&raw)?;
            let result = engine.evaluate_compiled(&compiled, &criteria)?;
            info!(
                matched = result.matched,
                matched_condition = ?result.matched_condition,
                "Evaluation complete"
            );

            if trace {
                print_json(&result)?;
            } else {
                print_json(&result.value)?;
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_code(validation: &ValidationResult) -> ExitCode {
    if validation.is_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
