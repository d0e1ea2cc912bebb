use anyhow::Result;

use crate::camera::Frame;
use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;

/// Scripted detector for tests and the demo binary.
///
/// Plays back a fixed sequence of per-frame detection lists, then keeps
/// repeating the final entry. An empty script yields empty frames forever.
pub struct StubDetector {
    script: Vec<Vec<Detection>>,
    cursor: usize,
}

impl StubDetector {
    pub fn new(script: Vec<Vec<Detection>>) -> Self {
        Self { script, cursor: 0 }
    }

    /// A detector that never detects anything.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl DetectorBackend for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        if self.script.is_empty() {
            return Ok(Vec::new());
        }
        let index = self.cursor.min(self.script.len() - 1);
        self.cursor += 1;
        Ok(self.script[index].clone())
    }
}
