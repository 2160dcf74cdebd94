//! Fingerprint command

use std::path::Path;

use anyhow::{bail, Result};
use evidence_lib::{fingerprint, Fingerprint};

use crate::ui;

pub fn run(file: &Path, expect: Option<&str>) -> Result<()> {
    let actual = fingerprint(&super::read_input(file)?);

    match expect {
        None => println!("{actual}  {}", file.display()),
        Some(expected) => {
            let expected: Fingerprint = expected.parse()?;
            if expected != actual {
                bail!("fingerprint mismatch: expected {expected}, got {actual}");
            }
            ui::success(&format!("{} matches {expected}", file.display()));
        }
    }
    Ok(())
}
