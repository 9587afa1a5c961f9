//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

use std::process::ExitCode;

fn main() -> ExitCode {
    match rigsmith::cli::run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", rigsmith::cli::failure_line(&err));
            ExitCode::FAILURE
        }
    }
}
