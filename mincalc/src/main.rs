//! Command-line interface for mincalc.
//!
//! Runs statements interactively (`repl`, the default) or from a file
//! (`run`), and prints the generated grammar tables (`grammar`).

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser as ClapParser, Subcommand};
use mincalc::{Config, Session, grammar, repl};
use std::io::{self, BufReader};

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Command (defaults to `repl`)
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    limits: Limits,
}

/// Store capacities.
#[derive(ClapArgs, Debug)]
struct Limits {
    /// Symbol-table slots
    #[arg(long, global = true, default_value_t = Config::DEFAULT_VAR_SLOTS)]
    var_slots: usize,

    /// Bytes of function-definition text
    #[arg(long, global = true, default_value_t = Config::DEFAULT_FUNDEF_BYTES)]
    fundef_bytes: usize,

    /// AST nodes per statement. Deeply nested calls recurse on the native
    /// stack, so very large values can overflow it before the arena fills
    #[arg(long, global = true, default_value_t = Config::DEFAULT_TREE_NODES)]
    tree_nodes: usize,

    /// Parser stack entries
    #[arg(long, global = true, default_value_t = Config::DEFAULT_PARSER_STACK)]
    parser_stack: usize,
}

impl From<&Limits> for Config {
    fn from(l: &Limits) -> Self {
        Config {
            var_slots: l.var_slots,
            fundef_bytes: l.fundef_bytes,
            tree_nodes: l.tree_nodes,
            parser_stack: l.parser_stack,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reads statements from standard input
    Repl,
    /// Executes the statements of a file, one per line
    Run {
        /// Input file with mincalc statements
        #[arg(short, long)]
        input: smartstring::alias::String,
    },
    /// Prints productions, LR(0) states, FIRST and FOLLOW sets
    Grammar,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let mut session = Session::with_config(Config::from(&args.limits));
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.command.unwrap_or(Commands::Repl) {
        Commands::Repl => {
            repl::run(&mut session, io::stdin().lock(), &mut out, true)?;
        }
        Commands::Run { input: path } => {
            let file = std::fs::File::open(path.as_str()).with_context(|| format!("can't open {:?}", path))?;
            repl::run(&mut session, BufReader::new(file), &mut out, false)?;
        }
        Commands::Grammar => {
            grammar::write_report(&mut out)?;
        }
    }
    log::debug!("{:?}", session.parser_stats());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn capacities_default_to_config() {
        let args = Args::try_parse_from(["mincalc"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(Config::from(&args.limits), Config::default());

        let args = Args::try_parse_from(["mincalc", "run", "--input", "f.mc", "--tree-nodes", "64"]).unwrap();
        assert_eq!(Config::from(&args.limits).tree_nodes, 64);
        assert!(matches!(args.command, Some(Commands::Run { input }) if input.as_str() == "f.mc"));
    }

    #[test]
    fn tree_nodes_help_mentions_native_stack() {
        let cmd = Args::command();
        let arg = cmd
            .get_arguments()
            .find(|a| a.get_id() == "tree_nodes")
            .unwrap();
        assert!(arg.get_help().unwrap().to_string().contains("native stack"));
    }
}
