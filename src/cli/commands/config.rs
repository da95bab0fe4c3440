use anyhow::Result;

use crate::config::ApprovalConfig;

pub struct ConfigCommand {
    config: ApprovalConfig,
}

impl ConfigCommand {
    pub fn new(config: ApprovalConfig) -> Self {
        Self { config }
    }

    pub fn render(&self) -> Result<String> {
        Ok(toml::to_string_pretty(&self.config)?)
    }

    pub fn execute(&self) -> Result<()> {
        print!("{}", self.render()?);
        Ok(())
    }
}
