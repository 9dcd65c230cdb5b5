pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Resolve a command's input from `--input`, then piped stdin. `None` means
/// neither was given and the command should build its input from flags.
pub fn from_file_or_stdin<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    match path {
        Some(p) => file::read_json(p).map(Some),
        None => stdin::read_stdin(),
    }
}
