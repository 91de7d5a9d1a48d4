use std::{fs, path::PathBuf};

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "Update reference library items from NASA ADS", long_about = None)]
pub struct Cli {
    /// Config file (defaults to ~/.config/adsbib/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Library file (defaults to the path in the config file)
    #[arg(long, global = true, value_name = "FILE")]
    pub library: Option<PathBuf>,

    /// Log more; repeat for debug output
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Update the metadata of the selected item from NASA ADS
    Update {
        #[arg(value_name = "KEY")]
        selection: Vec<String>,
    },
    /// Attach the publisher PDF of the selected item
    Pdf {
        #[arg(value_name = "KEY")]
        selection: Vec<String>,
    },
    /// Add the entries of BibTeX/BibLaTeX files to the library
    Import {
        #[arg(value_name = "FILE", required = true, value_parser = existing_file)]
        from: Vec<PathBuf>,
    },
    /// List the items in the library
    List,
    /// Print one item as JSON
    Show {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Set the NASA ADS API key
    Key,
}

/// Accept only paths that exist, canonicalised.
fn existing_file(s: &str) -> Result<PathBuf, String> {
    let path = fs::canonicalize(s).map_err(|e| format!("{s}: {e}"))?;
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("{s}: not a file"))
    }
}
