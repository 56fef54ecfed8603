use std::io::Write;

use crate::error::CliError;
use crate::metadata::Envelope;

pub fn render(envelope: &Envelope, pretty: bool) -> Result<(), CliError> {
    let encoded = if pretty {
        serde_json::to_string_pretty(envelope)?
    } else {
        serde_json::to_string(envelope)?
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{encoded}")?;
    Ok(())
}
