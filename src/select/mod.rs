// src/select/mod.rs
use std::io::{self, BufRead, Write};
use tracing::{debug, warn};

use crate::error::{ImportError, ImportResult};
use crate::fetch::recent::SourceFile;

/// Turn one operator entry into a zero-based index into a list of `len` files.
/// Entries are 1-based, as printed.
pub fn parse_choice(input: &str, len: usize) -> ImportResult<usize> {
    let trimmed = input.trim();
    let n: usize = trimmed.parse().map_err(|_| ImportError::SelectionInput {
        input: trimmed.to_string(),
        reason: "not a number".into(),
    })?;
    if n == 0 || n > len {
        return Err(ImportError::SelectionInput {
            input: trimmed.to_string(),
            reason: format!("expected a number from 1 to {}", len),
        });
    }
    Ok(n - 1)
}

/// Show `files` and let the operator pick up to `max_selections` of them,
/// one number per line. An empty line (or end of input) stops early; a bad
/// entry is reported and asked again.
pub fn prompt_for_selection<R: BufRead, W: Write>(
    files: &[SourceFile],
    max_selections: usize,
    input: &mut R,
    out: &mut W,
) -> io::Result<Vec<SourceFile>> {
    writeln!(
        out,
        "Select up to {} files to import (enter the number):",
        max_selections
    )?;
    for (i, file) in files.iter().enumerate() {
        writeln!(
            out,
            "{}: {} (Last modified: {})",
            i + 1,
            file.name(),
            file.modified.format("%Y-%m-%d %H:%M:%S")
        )?;
    }

    let mut selected = Vec::new();
    let mut line = String::new();
    while selected.len() < max_selections {
        write!(
            out,
            "Enter the number of the file to import (or press enter to stop): "
        )?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 || line.trim().is_empty() {
            break;
        }

        match parse_choice(&line, files.len()) {
            Ok(idx) => {
                let file = files[idx].clone();
                debug!(file = %file.name(), "selected");
                writeln!(out, "Selected: {}", file.name())?;
                selected.push(file);
            }
            Err(e) => {
                warn!("{}", e);
                writeln!(out, "Invalid choice. Please enter a valid number.")?;
            }
        }
    }
    Ok(selected)
}
