use clap::{Args, Parser, Subcommand, ValueEnum};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GLYPHPAD_GIT_HASH"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "glyphpad")]
#[command(
    version,
    long_version = LONG_VERSION,
    about = "Draw symbols on your touchpad to trigger shell commands"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Teach a new symbol and bind a command to it
    Add {
        /// How many times the symbol is drawn while training (at least 5)
        training_size: usize,
        /// Name of the symbol
        symbol: String,
        /// Program to run when the symbol is recognised
        command: String,
        /// Arguments passed to the program
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        arguments: Vec<String>,
    },

    /// Retrain existing symbols
    Repeat {
        /// Only retrain this symbol
        #[arg(short = 's', long = "symbol", value_name = "SYMBOL")]
        symbol: Option<String>,
        /// Rebuild templates from the stored draws instead of drawing again
        #[arg(long)]
        offline: bool,
    },

    /// Listen for symbols and run their commands
    Run {
        /// Symbol set: the 32 or 64 builtin symbols, or your own
        #[arg(value_enum, default_value_t = RunMode::User)]
        mode: RunMode,
    },

    /// Show stored symbols and their commands
    List,

    /// Remove symbols
    Delete(SymbolSelection),

    /// Change the command bound to a symbol
    Modify {
        symbol: String,
        command: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        arguments: Vec<String>,
    },

    /// Make symbols recognisable again
    Activate(SymbolSelection),

    /// Keep symbols stored but stop recognising them
    Deactivate(SymbolSelection),
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SymbolSelection {
    /// Apply to every stored symbol
    #[arg(short, long)]
    pub all: bool,

    /// Apply to the named symbols
    #[arg(short = 's', long = "select", value_name = "SYMBOL", num_args = 1..)]
    pub select: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    #[value(name = "32")]
    Builtin32,
    #[value(name = "64")]
    Builtin64,
    User,
}
