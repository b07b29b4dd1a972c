use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Companies,
    Jobs,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Companies(GlobalArgs, CompaniesCommand),
    Jobs(GlobalArgs, JobsCommand),
}

/// Options accepted by every command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub database: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompaniesCommand {
    /// Query-string style filter pairs, in the order given.
    List(Vec<(String, String)>),
    Get(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobsCommand {
    List(Vec<(String, String)>),
    Get(String),
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "companies" => parse_companies(it.map(|s| s.as_str())),
        "jobs" => parse_jobs(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

/// Shared token loop: global flags, `--help`, the subcommand, one positional
/// key, and entity filter flags mapped to their query-string names.
struct Parsed<'a> {
    global: GlobalArgs,
    help: bool,
    subcmd: Option<&'a str>,
    key: Option<&'a str>,
    filters: Vec<(String, String)>,
}

fn parse_common<'a>(
    mut it: impl Iterator<Item = &'a str>,
    value_flags: &[(&str, &str)],
    switch_flags: &[(&str, &str)],
) -> anyhow::Result<Parsed<'a>> {
    let mut parsed = Parsed {
        global: GlobalArgs::default(),
        help: false,
        subcmd: None,
        key: None,
        filters: Vec::new(),
    };

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => parsed.help = true,
            "list" | "get" if parsed.subcmd.is_none() => parsed.subcmd = Some(token),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                parsed.global.config = Some(PathBuf::from(v));
            }
            _ if token.starts_with("--config=") => {
                parsed.global.config = Some(PathBuf::from(token.trim_start_matches("--config=")));
            }
            "--database" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--database requires a value");
                };
                parsed.global.database = Some(v.to_string());
            }
            _ if token.starts_with("--database=") => {
                parsed.global.database = Some(token.trim_start_matches("--database=").to_string());
            }
            other if other.starts_with("--") => {
                let (flag, inline) = match other.split_once('=') {
                    Some((flag, v)) => (flag, Some(v)),
                    None => (other, None),
                };
                if let Some((_, key)) = value_flags.iter().find(|(f, _)| *f == flag) {
                    let value = match inline {
                        Some(v) => v,
                        None => {
                            let Some(v) = it.next() else {
                                anyhow::bail!("{flag} requires a value");
                            };
                            v
                        }
                    };
                    parsed.filters.push((key.to_string(), value.to_string()));
                } else if let Some((_, key)) = switch_flags.iter().find(|(f, _)| *f == flag) {
                    parsed
                        .filters
                        .push((key.to_string(), inline.unwrap_or("true").to_string()));
                } else {
                    anyhow::bail!("unknown argument: {other}");
                }
            }
            other if other.starts_with('-') => anyhow::bail!("unknown argument: {other}"),
            other if parsed.subcmd.is_some() && parsed.key.is_none() => parsed.key = Some(other),
            other => anyhow::bail!("unexpected argument: {other}"),
        }
    }

    Ok(parsed)
}

fn parse_companies<'a>(it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let parsed = parse_common(
        it,
        &[
            ("--name", "name"),
            ("--min-employees", "minEmployees"),
            ("--max-employees", "maxEmployees"),
        ],
        &[],
    )?;
    let Some(subcmd) = parsed.subcmd.filter(|_| !parsed.help) else {
        return Ok(Command::Help(HelpTopic::Companies));
    };

    let cmd = match (subcmd, parsed.key) {
        ("list", None) => CompaniesCommand::List(parsed.filters),
        ("list", Some(extra)) => anyhow::bail!("unexpected argument: {extra}"),
        ("get", Some(handle)) if parsed.filters.is_empty() => {
            CompaniesCommand::Get(handle.to_string())
        }
        ("get", Some(_)) => anyhow::bail!("filters only apply to `companies list`"),
        ("get", None) => anyhow::bail!("missing <HANDLE>"),
        (other, _) => anyhow::bail!("unknown subcommand: {other}"),
    };
    Ok(Command::Companies(parsed.global, cmd))
}

fn parse_jobs<'a>(it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let parsed = parse_common(
        it,
        &[("--title", "title"), ("--min-salary", "minSalary")],
        &[("--has-equity", "hasEquity")],
    )?;
    let Some(subcmd) = parsed.subcmd.filter(|_| !parsed.help) else {
        return Ok(Command::Help(HelpTopic::Jobs));
    };

    let cmd = match (subcmd, parsed.key) {
        ("list", None) => JobsCommand::List(parsed.filters),
        ("list", Some(extra)) => anyhow::bail!("unexpected argument: {extra}"),
        ("get", Some(title)) if parsed.filters.is_empty() => {
            JobsCommand::Get(title.to_string())
        }
        ("get", Some(_)) => anyhow::bail!("filters only apply to `jobs list`"),
        ("get", None) => anyhow::bail!("missing <TITLE>"),
        (other, _) => anyhow::bail!("unknown subcommand: {other}"),
    };
    Ok(Command::Jobs(parsed.global, cmd))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
jobly - read-only client for the jobly database

USAGE:
  jobly <COMMAND> [OPTIONS]

COMMANDS:
  companies     List companies or show one with its jobs
  jobs          List jobs or show one

GLOBAL OPTIONS:
  --config <FILE>       Config file (default: jobly.toml if present, else environment)
  --database <URL>      Override the database URL
  -h, --help            Print help

Run `jobly <command> --help` for more."
            );
        }
        HelpTopic::Companies => {
            println!(
                "\
USAGE:
  jobly companies list [OPTIONS]
  jobly companies get <HANDLE> [OPTIONS]

LIST OPTIONS:
  --name <TEXT>             Case-insensitive substring of the name
  --min-employees <N>       At least N employees
  --max-employees <N>       At most N employees"
            );
        }
        HelpTopic::Jobs => {
            println!(
                "\
USAGE:
  jobly jobs list [OPTIONS]
  jobly jobs get <TITLE> [OPTIONS]

LIST OPTIONS:
  --title <TEXT>            Case-insensitive substring of the title
  --min-salary <N>          Salary of at least N
  --has-equity[=BOOL]       Only jobs with equity when true"
            );
        }
    }
}
