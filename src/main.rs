#![allow(clippy::cargo_common_metadata)]
use anyhow::Result;
use argtree::{cli, setup_logging};
use std::io::{self, Write};

fn main() -> Result<()> {
    // Build the command tree
    let app = cli::build_app()?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let stderr = io::stderr();
    let (mut input, mut out, mut err) = (stdin.lock(), stdout.lock(), stderr.lock());

    // Resolve first so the debug flag can drive logging
    let status = match app.parse(std::env::args().skip(1)) {
        Ok(parsed) => {
            setup_logging(parsed.global_accessor().flag("debug"))?;
            app.run_parsed(&parsed, &mut input, &mut out, &mut err)
        }
        Err(error) => app.handle_error(&error, &mut err),
    };

    out.flush()?;
    err.flush()?;
    std::process::exit(status)
}
