//! Argument parsing and dispatch for the `rex_cli` binary.
//!
//! Every command prints one pretty JSON document on stdout.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rex_config::{Config, ConfigError};
use rex_core::{CoreError, DeletionRequest, ExpenseEdit, ExpenseLifecycle, StoreError};
use rex_domain::{ExpenseOwner, MonthError, NewRecurringExpense, YearMonth};
use rex_storage_json::JsonExpenseStore;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::{config, utils::build_info};

pub const USAGE: &str = "\
Usage: rex_cli [--store <path>] <command> [args]

Commands:
  create <employee|organization> <owner-id> <category> <value> <YYYY-MM> [YYYY-MM]
         [--currency <code>] [--split]
  list
  chain <chain-id>
  delete <id> <ALL|FUTURE|CURRENT> <YYYY-MM>
  classify <id> <YYYY-MM-DD>
  edit <id> <YYYY-MM> [--value <amount>] [--category <name>] [--currency <code>]
  totals <YYYY-MM> <YYYY-MM>
  share <id> <employees>
  version";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("invalid argument `{value}` for {name}")]
    InvalidArgument { name: &'static str, value: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Month(#[from] MonthError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create {
        owner: ExpenseOwner,
        category: String,
        value: f64,
        start: YearMonth,
        end: Option<YearMonth>,
        currency: Option<String>,
        split: bool,
    },
    List,
    Chain(Uuid),
    Delete {
        id: Uuid,
        mode: String,
        year: i32,
        month: u32,
    },
    Classify {
        id: Uuid,
        new_start: NaiveDate,
    },
    Edit {
        id: Uuid,
        effective: YearMonth,
        value: Option<f64>,
        category: Option<String>,
        currency: Option<String>,
    },
    Totals {
        from: YearMonth,
        to: YearMonth,
    },
    Share {
        id: Uuid,
        employees: u32,
    },
    Version,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub store: Option<PathBuf>,
    pub command: Command,
}

/// Parses process arguments, without the program name.
pub fn parse_args<I>(args: I) -> Result<Invocation, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut store = None;
    let mut positional = Vec::new();
    let mut options: Vec<(String, Option<String>)> = Vec::new();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--store" => {
                let path = iter
                    .next()
                    .ok_or_else(|| CliError::Usage("--store needs a path".into()))?;
                store = Some(PathBuf::from(path));
            }
            "--split" => options.push((arg, None)),
            flag if flag.starts_with("--") => {
                let value = iter
                    .next()
                    .ok_or_else(|| CliError::Usage(format!("{flag} needs a value")))?;
                options.push((arg, Some(value)));
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let name = positional
        .next()
        .ok_or_else(|| CliError::Usage("missing command".into()))?;
    let mut next = |what: &'static str| {
        positional
            .next()
            .ok_or_else(|| CliError::Usage(format!("{name}: missing {what}")))
    };

    let command = match name.as_str() {
        "create" => {
            let kind = next("owner kind")?;
            let owner_id = parse_uuid("owner-id", &next("owner id")?)?;
            let owner = match kind.to_ascii_lowercase().as_str() {
                "employee" => ExpenseOwner::Employee(owner_id),
                "organization" => ExpenseOwner::Organization(owner_id),
                _ => {
                    return Err(CliError::InvalidArgument {
                        name: "owner kind",
                        value: kind,
                    })
                }
            };
            let category = next("category")?;
            let value = parse_amount(&next("value")?)?;
            let start = next("start month")?.parse()?;
            let end = next("end month")
                .ok()
                .map(|raw| raw.parse())
                .transpose()?;
            Command::Create {
                owner,
                category,
                value,
                start,
                end,
                currency: option_value(&options, "--currency"),
                split: options.iter().any(|(flag, _)| flag == "--split"),
            }
        }
        "list" => Command::List,
        "chain" => Command::Chain(parse_uuid("chain-id", &next("chain id")?)?),
        "delete" => {
            let id = parse_uuid("id", &next("record id")?)?;
            let mode = next("deletion mode")?;
            let (year, month) = split_month(&next("month")?)?;
            Command::Delete {
                id,
                mode,
                year,
                month,
            }
        }
        "classify" => {
            let id = parse_uuid("id", &next("record id")?)?;
            let raw = next("new start date")?;
            let new_start = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                CliError::InvalidArgument {
                    name: "new start date",
                    value: raw,
                }
            })?;
            Command::Classify { id, new_start }
        }
        "edit" => {
            let id = parse_uuid("id", &next("record id")?)?;
            let effective = next("effective month")?.parse()?;
            let value = option_value(&options, "--value")
                .map(|raw| parse_amount(&raw))
                .transpose()?;
            Command::Edit {
                id,
                effective,
                value,
                category: option_value(&options, "--category"),
                currency: option_value(&options, "--currency"),
            }
        }
        "totals" => Command::Totals {
            from: next("first month")?.parse()?,
            to: next("last month")?.parse()?,
        },
        "share" => {
            let id = parse_uuid("id", &next("record id")?)?;
            let raw = next("employee count")?;
            let employees = raw.parse().map_err(|_| CliError::InvalidArgument {
                name: "employees",
                value: raw,
            })?;
            Command::Share { id, employees }
        }
        "version" => Command::Version,
        other => return Err(CliError::Usage(format!("unknown command `{other}`"))),
    };

    Ok(Invocation { store, command })
}

/// Runs `invocation` against the store selected by `--store` or `config`.
pub fn execute(
    invocation: Invocation,
    config: &Config,
    data_dir: &Path,
) -> Result<Value, CliError> {
    let store_path = invocation
        .store
        .unwrap_or_else(|| config.resolve_store_path(data_dir));
    let open_engine = || -> Result<ExpenseLifecycle, CliError> {
        let store = JsonExpenseStore::open(&store_path)?;
        Ok(ExpenseLifecycle::new(Box::new(store))
            .with_conflict_detection(config.conflict_detection))
    };

    let output = match invocation.command {
        Command::Create {
            owner,
            category,
            value,
            start,
            end,
            currency,
            split,
        } => {
            let currency = currency.unwrap_or_else(|| config.default_currency.clone());
            let mut draft = NewRecurringExpense::new(owner, category, value, currency, start);
            draft.end = end;
            if split {
                draft = draft.split();
            }
            serde_json::to_value(open_engine()?.create(draft)?)?
        }
        Command::List => serde_json::to_value(open_engine()?.list()?)?,
        Command::Chain(chain_id) => {
            let engine = open_engine()?;
            let records = engine.chain(chain_id)?;
            let warnings = engine.chain_warnings(chain_id)?;
            json!({ "records": records, "warnings": warnings })
        }
        Command::Delete {
            id,
            mode,
            year,
            month,
        } => {
            let request = DeletionRequest::parse(&mode, year, month)?;
            serde_json::to_value(open_engine()?.delete_by_mode(id, request)?)?
        }
        Command::Classify { id, new_start } => {
            serde_json::to_value(open_engine()?.classify_start_date_shift(id, new_start)?)?
        }
        Command::Edit {
            id,
            effective,
            value,
            category,
            currency,
        } => {
            let mut edit = ExpenseEdit::effective_from(effective.first_day());
            edit.value = value;
            edit.category_name = category;
            edit.currency = currency;
            serde_json::to_value(open_engine()?.edit(id, edit)?)?
        }
        Command::Totals { from, to } => {
            serde_json::to_value(open_engine()?.monthly_totals(None, from, to)?)?
        }
        Command::Share { id, employees } => {
            serde_json::to_value(open_engine()?.split_share(id, employees)?)?
        }
        Command::Version => serde_json::to_value(build_info::current())?,
    };
    Ok(output)
}

/// Loads configuration, initializes tracing and runs one command.
pub fn run_cli<I>(args: I) -> Result<Value, CliError>
where
    I: IntoIterator<Item = String>,
{
    let data_dir = config::app_data_dir();
    let config = config::load_config()?;
    crate::init_with_filter(config.log_filter.as_deref());

    let invocation = parse_args(args)?;
    tracing::debug!(?invocation, "dispatching command");
    execute(invocation, &config, &data_dir)
}

fn option_value(options: &[(String, Option<String>)], flag: &str) -> Option<String> {
    options
        .iter()
        .rev()
        .find(|(name, _)| name == flag)
        .and_then(|(_, value)| value.clone())
}

fn parse_uuid(name: &'static str, raw: &str) -> Result<Uuid, CliError> {
    Uuid::parse_str(raw).map_err(|_| CliError::InvalidArgument {
        name,
        value: raw.to_string(),
    })
}

fn parse_amount(raw: &str) -> Result<f64, CliError> {
    raw.parse().map_err(|_| CliError::InvalidArgument {
        name: "value",
        value: raw.to_string(),
    })
}

/// Splits `YYYY-MM` without range checks; the deletion path validates months.
fn split_month(raw: &str) -> Result<(i32, u32), CliError> {
    let invalid = || CliError::InvalidArgument {
        name: "month",
        value: raw.to_string(),
    };
    let (year, month) = raw.split_once('-').ok_or_else(invalid)?;
    Ok((
        year.parse().map_err(|_| invalid())?,
        month.parse().map_err(|_| invalid())?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn parses_create_with_flags() {
        let owner = Uuid::new_v4();
        let invocation = parse_args(args(&format!(
            "--store /tmp/x.json create organization {owner} Rent 1200 2024-01 2024-12 --split --currency eur"
        )))
        .expect("parse");

        assert_eq!(invocation.store, Some(PathBuf::from("/tmp/x.json")));
        let Command::Create {
            owner: parsed,
            end,
            currency,
            split,
            ..
        } = invocation.command
        else {
            panic!("expected create");
        };
        assert_eq!(parsed, ExpenseOwner::Organization(owner));
        assert_eq!(end, Some(YearMonth::new(2024, 12).unwrap()));
        assert_eq!(currency.as_deref(), Some("eur"));
        assert!(split);
    }

    #[test]
    fn delete_keeps_out_of_range_month_for_validation() {
        let id = Uuid::new_v4();
        let invocation = parse_args(args(&format!("delete {id} ALL 2024-13"))).expect("parse");
        assert_eq!(
            invocation.command,
            Command::Delete {
                id,
                mode: "ALL".into(),
                year: 2024,
                month: 13,
            }
        );
    }

    #[test]
    fn rejects_unknown_command_and_missing_args() {
        assert!(matches!(
            parse_args(args("launch")),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            parse_args(args("classify")),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            parse_args(args("chain not-a-uuid")),
            Err(CliError::InvalidArgument { name: "chain-id", .. })
        ));
    }

    #[test]
    fn execute_uses_configured_store_and_currency() {
        let dir = tempdir().expect("tempdir");
        let config = Config {
            default_currency: "EUR".into(),
            ..Config::default()
        };
        let owner = Uuid::new_v4();

        let created = execute(
            parse_args(args(&format!("create employee {owner} Phone 30 2024-02"))).unwrap(),
            &config,
            dir.path(),
        )
        .expect("create");
        assert_eq!(created["currency"], "EUR");
        assert!(dir.path().join("expenses.json").exists());

        let listed = execute(parse_args(args("list")).unwrap(), &config, dir.path()).expect("list");
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn execute_reports_invalid_month_from_core() {
        let dir = tempdir().expect("tempdir");
        let id = Uuid::new_v4();
        let err = execute(
            parse_args(args(&format!("delete {id} CURRENT 2024-13"))).unwrap(),
            &Config::default(),
            dir.path(),
        )
        .expect_err("invalid month");
        assert!(matches!(
            err,
            CliError::Core(CoreError::InvalidMonth { month: 13, .. })
        ));
    }

    #[test]
    fn share_splits_a_flagged_organization_expense() {
        let dir = tempdir().expect("tempdir");
        let config = Config::default();
        let org = Uuid::new_v4();

        let created = execute(
            parse_args(args(&format!(
                "create organization {org} Office 900 2024-01 --split"
            )))
            .unwrap(),
            &config,
            dir.path(),
        )
        .expect("create");
        let id = created["id"].as_str().expect("id").to_string();

        let share = execute(
            parse_args(args(&format!("share {id} 4"))).unwrap(),
            &config,
            dir.path(),
        )
        .expect("share");
        assert_eq!(share["share"], 225.0);
        assert_eq!(share["employees"], 4);

        assert!(matches!(
            parse_args(args(&format!("share {id} many"))),
            Err(CliError::InvalidArgument { name: "employees", .. })
        ));
    }
}
