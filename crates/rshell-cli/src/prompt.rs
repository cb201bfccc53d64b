//! Launch confirmation prompt

use std::io::{self, BufRead, Write};

use tokio_util::sync::CancellationToken;

/// Interpret a yes/no answer; `None` for anything else
pub fn parse_answer(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Ask `question` until a yes/no answer is given.
///
/// End of input counts as "no".
pub fn confirm<R: BufRead, W: Write>(question: &str, input: &mut R, output: &mut W) -> io::Result<bool> {
    let mut line = String::new();
    loop {
        write!(output, "{} [y/n] ", question)?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(false);
        }
        if let Some(answer) = parse_answer(&line) {
            return Ok(answer);
        }
    }
}

/// [`confirm`] on the process's stdin, prompting on stderr
pub fn confirm_stdin(question: &str) -> io::Result<bool> {
    let stdin = io::stdin();
    confirm(question, &mut stdin.lock(), &mut io::stderr())
}

/// Run a blocking prompt, giving up as soon as `cancel` fires.
///
/// Returns `None` when cancelled. The abandoned prompt thread is left to
/// the runtime's background shutdown.
pub async fn confirm_unless_cancelled<F>(
    ask: F,
    cancel: &CancellationToken,
) -> io::Result<Option<bool>>
where
    F: FnOnce() -> io::Result<bool> + Send + 'static,
{
    let answer = tokio::task::spawn_blocking(ask);
    tokio::select! {
        biased;

        _ = cancel.cancelled() => Ok(None),
        joined = answer => {
            let answer = joined.map_err(|e| io::Error::new(io::ErrorKind::Other, e))??;
            Ok(Some(answer))
        }
    }
}
