//! Thread command implementation.

use crate::cli::ThreadArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use std::fs;
use std::path::Path;
use tasklift_domain::{EmailThread, TracingSink};
use tasklift_parsers::email::reconstruct_thread;

/// Execute the thread command.
pub fn execute_thread(args: ThreadArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let max_depth = args.max_depth.unwrap_or(config.extractor.max_email_depth);
    let thread = load_thread(&args.file, max_depth)?;

    if !thread.metadata.threading_complete {
        eprintln!("{}", formatter.warning("Some messages reply to ids outside this file"));
    }
    println!("{}", formatter.format_thread(&thread)?);
    Ok(())
}

fn load_thread(path: &Path, max_depth: usize) -> Result<EmailThread> {
    let bytes = fs::read(path)?;
    Ok(reconstruct_thread(&bytes, max_depth, &TracingSink)?)
}
