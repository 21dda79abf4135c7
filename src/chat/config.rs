//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg`, an optional YAML
//! configuration file, and the resolved [`ChatConfig`].  Values are applied
//! in order: defaults, then the file, then command-line flags.

use std::fs;
use std::path::Path;
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Default service named in production-readiness requests.
pub const DEFAULT_SERVICE: &str = "web-app";

/// Command-line arguments for the architect-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the chat backend.
    #[arrrg(optional, "Backend base URL (default: $ARCHITECT_CHAT_URL or http://localhost:8000/)", "URL")]
    pub base_url: Option<String>,

    /// Ask for single replies instead of streams.
    #[arrrg(flag, "Disable streaming replies")]
    pub no_stream: bool,

    /// Timeout for non-streaming requests.
    #[arrrg(optional, "Timeout in seconds for non-streaming requests (default: 60)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// Service named in production-readiness requests.
    #[arrrg(optional, "Service for /readiness (default: web-app)", "SERVICE")]
    pub service: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// YAML configuration file.
    #[arrrg(optional, "YAML configuration file", "PATH")]
    pub config: Option<String>,
}

/// The contents of a YAML configuration file.
///
/// Every key is optional; missing keys keep their defaults.
///
/// ```yaml
/// base_url: http://localhost:8000/
/// stream: true
/// timeout_secs: 30
/// service: payments
/// color: false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfigFile {
    /// Backend URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Whether replies are streamed.
    #[serde(default)]
    pub stream: Option<bool>,
    /// Timeout for non-streaming requests, in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Service named in readiness requests.
    #[serde(default)]
    pub service: Option<String>,
    /// Whether output is colored.
    #[serde(default)]
    pub color: Option<bool>,
}

impl ChatConfigFile {
    /// Parse a configuration file from YAML text.
    pub fn parse(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path)
            .map_err(|err| Error::io(format!("could not read {}", path.display()), err))?;
        Self::parse(&yaml)
    }
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// the configuration file and command-line arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Backend base URL; `None` uses the environment or the built-in default.
    pub base_url: Option<String>,

    /// Whether replies are streamed.
    pub stream: bool,

    /// Timeout for non-streaming requests; `None` uses the client default.
    pub timeout: Option<Duration>,

    /// Service named in production-readiness requests.
    pub service: String,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Base URL: from the environment, else `http://localhost:8000/`
    /// - Streaming: enabled
    /// - Service: `web-app`
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            base_url: None,
            stream: true,
            timeout: None,
            service: DEFAULT_SERVICE.to_string(),
            use_color: true,
        }
    }

    /// Resolve the configuration from command-line arguments.
    ///
    /// Reads the file named by `--config`, if any.
    pub fn load(args: ChatArgs) -> Result<Self> {
        let mut config = Self::new();
        if let Some(path) = &args.config {
            config = config.with_file(ChatConfigFile::load(path)?);
        }
        Ok(config.with_args(args))
    }

    /// Overlay the values present in a configuration file.
    pub fn with_file(mut self, file: ChatConfigFile) -> Self {
        if let Some(base_url) = file.base_url {
            self.base_url = Some(base_url);
        }
        if let Some(stream) = file.stream {
            self.stream = stream;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(service) = file.service {
            self.service = service;
        }
        if let Some(color) = file.color {
            self.use_color = color;
        }
        self
    }

    /// Overlay the values given on the command line.
    pub fn with_args(mut self, args: ChatArgs) -> Self {
        if let Some(base_url) = args.base_url {
            self.base_url = Some(base_url);
        }
        if args.no_stream {
            self.stream = false;
        }
        if let Some(secs) = args.timeout_secs {
            self.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(service) = args.service {
            self.service = service;
        }
        if args.no_color {
            self.use_color = false;
        }
        self
    }

    /// Sets the backend base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets whether replies are streamed.
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Sets the timeout for non-streaming requests.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the service named in readiness requests.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        ChatConfig::new().with_args(args)
    }
}
