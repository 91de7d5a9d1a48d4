use std::io::{BufRead, ErrorKind, Write};
use std::path::PathBuf;

use dialoguer::Input;

use crate::config::Config;
use crate::error::{Error, Result};

/// Where the ADS API key comes from.
pub trait CredentialSource {
    /// The stored key, if one is set and non-empty.
    fn get(&self) -> Option<String>;

    /// Ask the user for a key and persist the answer.
    ///
    /// Returns `Ok(None)` when the user cancelled; the stored value is then left alone.
    fn prompt_and_store(&mut self) -> anyhow::Result<Option<String>>;
}

/// Return the stored key, prompting exactly once if none is set.
pub fn ensure_credential(source: &mut dyn CredentialSource) -> Result<String> {
    if let Some(key) = source.get() {
        return Ok(key);
    }

    tracing::debug!("no ADS API key stored, prompting");
    source.prompt_and_store()?;
    source.get().ok_or(Error::MissingCredential)
}

const PROMPT: &str = "Please enter your NASA ADS API key";

/// Credentials kept in the `[ads]` table of the config file.
///
/// On a terminal the prompt is an editable line pre-filled with the stored key; otherwise one
/// line is read from `input`.
pub struct ConfigCredentials<R> {
    path: PathBuf,
    config: Config,
    input: R,
    terminal: bool,
}

impl<R: BufRead> ConfigCredentials<R> {
    pub fn new(path: PathBuf, config: Config, input: R) -> Self {
        Self {
            path,
            config,
            input,
            terminal: false,
        }
    }

    pub fn on_terminal(mut self, terminal: bool) -> Self {
        self.terminal = terminal;
        self
    }

    /// One line from `input`; `None` at EOF.
    fn read_answer(&mut self, current: Option<&str>) -> anyhow::Result<Option<String>> {
        let mut stderr = std::io::stderr().lock();
        match current {
            Some(key) => write!(stderr, "{PROMPT} [{}]: ", mask(key))?,
            None => write!(stderr, "{PROMPT}: ")?,
        }
        stderr.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(stderr)?;
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// Interactive prompt with the stored key as editable initial text; `None` when cancelled.
fn ask_terminal(current: Option<&str>) -> anyhow::Result<Option<String>> {
    let answer = Input::<String>::new()
        .with_prompt(PROMPT)
        .with_initial_text(current.unwrap_or_default())
        .allow_empty(true)
        .interact_text();
    match answer {
        Ok(line) => Ok(Some(line)),
        Err(dialoguer::Error::IO(e))
            if matches!(e.kind(), ErrorKind::UnexpectedEof | ErrorKind::Interrupted) =>
        {
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

impl<R: BufRead> CredentialSource for ConfigCredentials<R> {
    fn get(&self) -> Option<String> {
        self.config
            .ads
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
    }

    fn prompt_and_store(&mut self) -> anyhow::Result<Option<String>> {
        let current = self.get();
        let line = if self.terminal {
            ask_terminal(current.as_deref())?
        } else {
            self.read_answer(current.as_deref())?
        };
        let Some(line) = line else {
            return Ok(None);
        };

        // An empty answer keeps the stored key; with none stored there is nothing to save.
        let answer = match line.trim() {
            "" => match current {
                Some(key) => key,
                None => return Ok(None),
            },
            key => key.to_string(),
        };

        self.config.ads.api_key = Some(answer.clone());
        self.config.save_to(&self.path)?;
        tracing::info!(path = %self.path.display(), "stored ADS API key");
        Ok(Some(answer))
    }
}

/// Show only the first few characters of a key.
fn mask(key: &str) -> String {
    let head: String = key.chars().take(4).collect();
    format!("{head}…")
}
