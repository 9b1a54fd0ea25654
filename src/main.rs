// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use secure_file_store::logging::init_logging;
use secure_file_store::shell::{Outcome, Shell, HELP};
use secure_file_store::{SecureFileStore, VaultConfig};

fn run() -> io::Result<()> {
    let config = VaultConfig::from_env();
    init_logging(config.log_format);

    let mut store = match SecureFileStore::new(&config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, data_dir = %config.data_dir.display(), "Failed to open file store");
            return Err(io::Error::other(e));
        }
    };
    let mut shell = Shell::new(&mut store);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    writeln!(stdout, "Secure File Store. Type 'help' for commands.\n{HELP}")?;

    let mut lines = stdin.lock().lines();
    loop {
        write!(stdout, "{}", shell.prompt())?;
        stdout.flush()?;

        // EOF ends the session like `exit`
        let Some(line) = lines.next().transpose()? else {
            writeln!(stdout)?;
            break;
        };

        match shell.execute(&line) {
            Outcome::Exit => {
                writeln!(stdout, "{}", Outcome::Exit)?;
                break;
            }
            Outcome::Output(text) if text.is_empty() => {}
            Outcome::Output(text) => writeln!(stdout, "{text}")?,
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sfm: {e}");
            ExitCode::FAILURE
        }
    }
}
