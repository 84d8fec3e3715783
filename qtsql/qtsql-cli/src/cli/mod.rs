mod request;

use std::env;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

use anstream::{eprintln, println};
use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use clap_verbosity_flag::LogLevel;
use clio::Output;
use is_terminal::IsTerminal;
use itertools::Itertools;
use serde::Serialize;
use strum::IntoEnumIterator;

use qtsql::debug;
use qtsql::metadata::{MappingStore, Scope};
use qtsql::{ErrorMessages, Options};

use self::request::QueryRequest;

/// Entrypoint called by [`crate::main`]
pub fn main() -> color_eyre::eyre::Result<()> {
    let mut cli = Cli::parse();

    // redirect all log messages into the [debug::DebugLog]
    static LOGGER: debug::MessageLogger = debug::MessageLogger;
    log::set_logger(&LOGGER).map(|()| log::set_max_level(cli.verbose.log_level_filter()))?;

    color_eyre::install()?;
    cli.color.write_global();

    if let Err(error) = cli.command.run() {
        eprintln!("{error}");
        // Copied from
        // https://doc.rust-lang.org/src/std/backtrace.rs.html#1-504, since it's private
        fn backtrace_enabled() -> bool {
            match env::var("RUST_LIB_BACKTRACE") {
                Ok(s) => s != "0",
                Err(_) => match env::var("RUST_BACKTRACE") {
                    Ok(s) => s != "0",
                    Err(_) => false,
                },
            }
        }
        if backtrace_enabled() {
            eprintln!("{:#}", error.backtrace());
        }

        exit(1)
    }

    Ok(())
}

#[derive(Parser, Debug, Clone)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    #[command(flatten)]
    color: colorchoice_clap::Color,

    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity<LoggingHelp>,
}

#[derive(Subcommand, Debug, Clone)]
#[command(name = "qtsql", about, version)]
enum Command {
    /// Lex into Lexer Representation
    Lex {
        #[command(flatten)]
        io_args: IoArgs,
        #[arg(value_enum, long, default_value = "yaml")]
        format: Format,
    },

    /// Parse into fragments
    Parse {
        #[command(flatten)]
        io_args: IoArgs,
        #[arg(value_enum, long, default_value = "yaml")]
        format: Format,
    },

    /// Build query text from a query request
    ///
    /// The request is a YAML document with `source` and, optionally,
    /// `table_section`, `projection`, `parameters`, `where`, `orderings` and
    /// `take`. With `--schema`, the query is compiled too.
    Build {
        #[command(flatten)]
        io_args: IoArgs,

        #[command(flatten)]
        compile_args: CompileArgs,

        #[arg(value_enum, long, default_value = "yaml")]
        format: Format,
    },

    /// Parse, resolve property paths & compile to SQL
    Compile {
        #[command(flatten)]
        io_args: IoArgs,

        #[command(flatten)]
        compile_args: CompileArgs,

        /// File path into which to write the debug log to.
        #[arg(long, env = "QTSQL_DEBUG_LOG")]
        debug_log: Option<PathBuf>,
    },

    /// Show the scopes of mapped tables, with their query name prefixes
    #[command(name = "list-scopes")]
    ListScopes,

    /// Print a shell completion for supported shells
    #[command(name = "shell-completion")]
    ShellCompletion {
        #[arg(value_enum)]
        shell: clap_complete_command::Shell,
    },
}

#[derive(clap::Args, Default, Debug, Clone)]
pub struct IoArgs {
    #[arg(value_parser, default_value = "-", value_hint(ValueHint::FilePath))]
    input: clio::ClioPath,

    #[arg(value_parser, default_value = "-", value_hint(ValueHint::FilePath))]
    output: Output,
}

#[derive(clap::Args, Default, Debug, Clone)]
pub struct CompileArgs {
    /// Table metadata, as YAML or JSON
    #[arg(long, env = "QTSQL_SCHEMA", value_hint(ValueHint::FilePath))]
    schema: Option<PathBuf>,

    /// Emit formatted SQL, split into lines
    #[arg(long = "pretty")]
    pretty: bool,

    /// Table mapping enumeration orders to value names
    #[arg(long)]
    enum_mappings_table: Option<String>,
}

#[derive(Copy, Clone, Debug, Default)]
struct LoggingHelp;

impl LogLevel for LoggingHelp {
    /// By default, this will only report errors.
    fn default() -> Option<log::Level> {
        Some(log::Level::Error)
    }
    fn verbose_help() -> Option<&'static str> {
        Some("Increase logging verbosity")
    }

    fn verbose_long_help() -> Option<&'static str> {
        Some(
            r#"More `v`s, More verbose logging:
-v shows warnings
-vv shows info
-vvv shows debug
-vvvv shows trace"#,
        )
    }

    fn quiet_help() -> Option<&'static str> {
        Some("Silences logging output")
    }

    fn quiet_long_help() -> Option<&'static str> {
        Some("Silences logging output")
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn write<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(match self {
            Format::Json => serde_json::to_string_pretty(value)?.into_bytes(),
            Format::Yaml => serde_yaml::to_string(value)?.into_bytes(),
        })
    }
}

impl CompileArgs {
    fn options(&self) -> Options {
        let options = Options::default().with_format(self.pretty);
        match &self.enum_mappings_table {
            Some(table) => options.with_enum_mappings_table(table.as_str()),
            None => options,
        }
    }

    fn load_schema(&self) -> Result<Option<MappingStore>> {
        let Some(path) = &self.schema else {
            return Ok(None);
        };
        let text = fs::read_to_string(path)
            .map_err(|e| anyhow!("cannot read schema `{}`: {e}", path.display()))?;

        let store = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => MappingStore::from_json(&text),
            _ => MappingStore::from_yaml(&text),
        }
        .map_err(ErrorMessages::from)?;

        log::info!("loaded {} tables from {}", store.len(), path.display());
        Ok(Some(store))
    }
}

impl Command {
    /// Entrypoint called by [`main`]
    pub fn run(&mut self) -> Result<()> {
        match self {
            Command::ListScopes => {
                println!("{}", list_scopes());
                Ok(())
            }
            Command::ShellCompletion { shell } => {
                shell.generate(&mut Cli::command(), &mut std::io::stdout());
                Ok(())
            }
            _ => self.run_io_command(),
        }
    }

    fn run_io_command(&mut self) -> Result<()> {
        let source = self.read_input()?;

        self.execute(&source)
            .and_then(|buf| Ok(self.write_output(&buf)?))
    }

    fn execute(&self, source: &str) -> Result<Vec<u8>> {
        Ok(match self {
            Command::Lex { format, .. } => {
                let tokens = qtsql::query_to_tokens(source)?;
                format.write(&tokens)?
            }
            Command::Parse { format, .. } => {
                let pr = qtsql::query_to_pr(source)?;
                format.write(&pr)?
            }
            Command::Build {
                compile_args,
                format,
                ..
            } => {
                let request: QueryRequest = serde_yaml::from_str(source)?;
                let built = request.build().map_err(ErrorMessages::from)?;

                match compile_args.load_schema()? {
                    Some(store) => {
                        let compiled = built.compile(&store, &compile_args.options())?;
                        format.write(&compiled)?
                    }
                    None => format.write(&built)?,
                }
            }
            Command::Compile {
                compile_args,
                debug_log,
                ..
            } => {
                let Some(store) = compile_args.load_schema()? else {
                    return Err(anyhow!(
                        "`compile` needs table metadata; pass `--schema` or set `QTSQL_SCHEMA`"
                    ));
                };

                if debug_log.is_some() {
                    debug::log_start();
                }

                let res = qtsql::compile(source, &store, &compile_args.options());

                if let Some(path) = debug_log {
                    write_log(path)?;
                }

                let mut sql = res?;
                if !sql.ends_with('\n') {
                    sql.push('\n');
                }
                sql.into_bytes()
            }
            _ => unreachable!("Other commands shouldn't reach `execute`"),
        })
    }

    fn io_args(&mut self) -> &mut IoArgs {
        use Command::*;
        match self {
            Lex { io_args, .. }
            | Parse { io_args, .. }
            | Build { io_args, .. }
            | Compile { io_args, .. } => io_args,
            _ => unreachable!(),
        }
    }

    fn read_input(&mut self) -> Result<String> {
        let input = &self.io_args().input;

        // Don't wait without a prompt when running `qtsql compile`, it's
        // confusing whether it's waiting for input or not.
        if input.path() == Path::new("-") && std::io::stdin().is_terminal() {
            #[cfg(unix)]
            eprintln!("Enter a query, then press ctrl-d to compile:\n");
            #[cfg(windows)]
            eprintln!("Enter a query, then press ctrl-z to compile:\n");
        }

        let mut source = String::new();
        input.clone().open()?.read_to_string(&mut source)?;
        Ok(source)
    }

    fn write_output(&mut self, data: &[u8]) -> std::io::Result<()> {
        let mut output = self.io_args().output.clone();
        output.write_all(data)
    }
}

fn list_scopes() -> String {
    Scope::iter()
        .map(|scope| match scope.native_prefix() {
            Some(prefix) => format!("{scope} ({prefix})"),
            None => scope.to_string(),
        })
        .join("\n")
}

pub fn write_log(path: &Path) -> Result<()> {
    let Some(debug_log) = debug::log_finish() else {
        return Err(anyhow!(
            "debug log was started, but it cannot be found after compilation"
        ));
    };
    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let file = BufWriter::new(File::create(path)?);
            serde_json::to_writer(file, &debug_log)?;
        }
        _ => {
            return Err(anyhow!("unknown debug log format for file {path:?}"));
        }
    }
    Ok(())
}
