use std::sync::Mutex;

use anyhow::Result;
use mcp_deploy::prompt::Prompter;

/// Gives the same answer to every prompt and remembers the questions
pub struct ScriptedPrompter {
    answer: bool,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            prompts: Mutex::default(),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        self.prompts.lock().unwrap().push(prompt.to_owned());
        Ok(self.answer)
    }
}
