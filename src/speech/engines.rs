//! Speech engine implementations.

use anyhow::{anyhow, Context, Result};
use std::process::Command;
use std::sync::{Arc, Mutex};

use super::SpeechEngine;

/// Logs utterances instead of synthesizing audio.
///
/// Used by the demo binary and anywhere no audio device is wired up; the
/// `ANNOUNCE:` prefix keeps spoken output greppable in logs.
pub struct ConsoleEngine;

impl SpeechEngine for ConsoleEngine {
    fn name(&self) -> &'static str {
        "console"
    }

    fn render(&mut self, text: &str) -> Result<()> {
        log::info!("ANNOUNCE: {}", text);
        Ok(())
    }
}

/// Renders speech by invoking an external synthesizer binary per utterance.
///
/// Defaults to `espeak-ng`; the process is waited on, so the worker blocks
/// for the duration of audible output exactly as the queue contract expects.
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn espeak() -> Self {
        Self::new("espeak-ng", vec!["-s".to_string(), "155".to_string()])
    }
}

impl SpeechEngine for CommandEngine {
    fn name(&self) -> &'static str {
        "command"
    }

    fn render(&mut self, text: &str) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .status()
            .with_context(|| format!("spawn speech synthesizer '{}'", self.program))?;
        if !status.success() {
            return Err(anyhow!(
                "speech synthesizer '{}' exited with {}",
                self.program,
                status
            ));
        }
        Ok(())
    }
}

/// Records utterances for assertions in tests.
pub struct RecordingEngine {
    recorded: Arc<Mutex<Vec<String>>>,
}

impl RecordingEngine {
    /// Returns the engine and a shared handle to everything it renders.
    pub fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
        let recorded = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                recorded: recorded.clone(),
            },
            recorded,
        )
    }
}

impl SpeechEngine for RecordingEngine {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn render(&mut self, text: &str) -> Result<()> {
        self.recorded.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
