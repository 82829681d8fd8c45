//! CLI configuration

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Debug logging
    pub verbose: bool,
    /// Indented JSON output
    pub pretty: bool,
}
