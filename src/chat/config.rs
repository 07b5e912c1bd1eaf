//! Configuration types for the chat application.
//!
//! Settings come from four layers, highest precedence first: command-line
//! arguments (parsed with `arrrg`), the `DOCCHAT_BASE_URL` environment
//! variable, an optional YAML config file, and built-in defaults.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::Deserialize;

use crate::chat::conversation::DEFAULT_GREETING;
use crate::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::error::{Error, Result};
use crate::picker::DEFAULT_EXTENSIONS;

/// Environment variable that overrides the default service address.
pub const BASE_URL_ENV: &str = "DOCCHAT_BASE_URL";

/// Command-line arguments for the docchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the document service.
    #[arrrg(optional, "Service base URL (default: http://localhost:8000/)", "URL")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 120)", "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Path to a YAML config file.
    #[arrrg(optional, "YAML config file", "FILE")]
    pub config: Option<String>,

    /// Greeting shown at the top of the transcript.
    #[arrrg(optional, "Greeting shown when the chat starts", "TEXT")]
    pub greeting: Option<String>,

    /// Write diagnostics to this file instead of stderr.
    #[arrrg(optional, "Write diagnostics (RUST_LOG) to FILE", "FILE")]
    pub log_file: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Contents of a YAML config file. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Base URL of the document service.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Greeting shown at the top of the transcript.
    #[serde(default)]
    pub greeting: Option<String>,
    /// Extensions the file picker offers.
    #[serde(default)]
    pub accepted_extensions: Option<Vec<String>>,
    /// Disable ANSI colors and styles.
    #[serde(default)]
    pub no_color: Option<bool>,
    /// Write diagnostics to this file.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl ConfigFile {
    /// Reads and parses a YAML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| {
            Error::io(format!("failed to open config file {}", path.display()), err)
        })?;
        Ok(serde_yaml::from_reader(BufReader::new(file))?)
    }
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// every configuration layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Base URL of the document service.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Greeting shown at the top of the transcript.
    pub greeting: String,

    /// Extensions the file picker offers.
    pub accepted_extensions: Vec<String>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Where diagnostics go; stderr when unset.
    pub log_file: Option<PathBuf>,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Base URL: http://localhost:8000/
    /// - Timeout: 120 seconds
    /// - Extensions: .pdf, .docx
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            greeting: DEFAULT_GREETING.to_string(),
            accepted_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            use_color: true,
            log_file: None,
        }
    }

    /// Resolves the configuration from arguments and the process environment.
    pub fn from_args(args: ChatArgs) -> Result<Self> {
        Self::resolve(args, std::env::var(BASE_URL_ENV).ok())
    }

    /// Resolves the configuration from arguments and an explicit value for
    /// the base URL environment variable.
    pub fn resolve(args: ChatArgs, env_base_url: Option<String>) -> Result<Self> {
        let file = match &args.config {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        let mut config = Self::new().with_file(file);
        if let Some(base_url) = env_base_url.filter(|url| !url.trim().is_empty()) {
            config.base_url = base_url;
        }
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    fn with_file(mut self, file: ConfigFile) -> Self {
        if let Some(base_url) = file.base_url {
            self.base_url = base_url;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(greeting) = file.greeting {
            self.greeting = greeting;
        }
        if let Some(extensions) = file.accepted_extensions {
            self.accepted_extensions = extensions;
        }
        if let Some(no_color) = file.no_color {
            self.use_color = !no_color;
        }
        if file.log_file.is_some() {
            self.log_file = file.log_file;
        }
        self
    }

    fn apply_args(&mut self, args: ChatArgs) {
        if let Some(base_url) = args.base_url {
            self.base_url = base_url;
        }
        if let Some(secs) = args.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(greeting) = args.greeting {
            self.greeting = greeting;
        }
        if let Some(log_file) = args.log_file {
            self.log_file = Some(PathBuf::from(log_file));
        }
        if args.no_color {
            self.use_color = false;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::validation(
                "timeout must be at least one second",
                Some("timeout_secs".to_string()),
            ));
        }
        if self.accepted_extensions.is_empty() {
            return Err(Error::validation(
                "at least one file extension must be accepted",
                Some("accepted_extensions".to_string()),
            ));
        }
        Ok(())
    }

    /// Sets the service base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the greeting.
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Sets the extensions the file picker offers.
    pub fn with_accepted_extensions(mut self, extensions: Vec<String>) -> Self {
        self.accepted_extensions = extensions;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the diagnostics file.
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}
