pub mod allocation;
pub mod process;
pub mod reconcile;
pub mod status;

use serde::de::DeserializeOwned;

use crate::input;

/// `--input` file first, then piped stdin.
pub(crate) fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return input::file::read_json(path);
    }
    match input::stdin::read_stdin()? {
        Some(value) => Ok(value),
        None => Err(format!("--input file (or JSON on stdin) is required for {what}").into()),
    }
}
