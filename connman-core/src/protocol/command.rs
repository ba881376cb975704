//! Client command lines with secret-aware arguments.

use std::fmt;
use std::process::Command;

use secrecy::{ExposeSecret, SecretString};

/// One command-line argument
#[derive(Debug)]
pub enum LaunchArg {
    /// Ordinary argument
    Plain(String),
    /// Argument embedding a password; shown redacted
    Secret {
        /// Text before the password, such as `/p:`
        prefix: String,
        /// The password
        value: SecretString,
    },
}

impl LaunchArg {
    fn expose(&self) -> String {
        match self {
            Self::Plain(s) => s.clone(),
            Self::Secret { prefix, value } => format!("{prefix}{}", value.expose_secret()),
        }
    }
}

impl fmt::Display for LaunchArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(s) => f.write_str(s),
            Self::Secret { prefix, .. } => write!(f, "{prefix}********"),
        }
    }
}

/// A client program invocation
#[derive(Debug)]
pub struct LaunchCommand {
    /// Program name, looked up on `PATH`
    pub program: String,
    /// Arguments in order
    pub args: Vec<LaunchArg>,
    /// Extra environment variables, such as `SSHPASS`
    pub env: Vec<(String, SecretString)>,
}

impl LaunchCommand {
    /// Creates a command without arguments
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Appends a plain argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(LaunchArg::Plain(arg.into()));
        self
    }

    /// Appends an argument that embeds a password
    #[must_use]
    pub fn secret_arg(mut self, prefix: impl Into<String>, value: SecretString) -> Self {
        self.args.push(LaunchArg::Secret {
            prefix: prefix.into(),
            value,
        });
        self
    }

    /// Adds a secret environment variable
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: SecretString) -> Self {
        self.env.push((key.into(), value));
        self
    }

    /// Returns the arguments as plain strings
    #[must_use]
    pub fn plain_args(&self) -> Vec<String> {
        self.args.iter().map(ToString::to_string).collect()
    }

    /// Builds the process to spawn, with secrets filled in
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(self.args.iter().map(LaunchArg::expose));
        for (key, value) in &self.env {
            command.env(key, value.expose_secret());
        }
        command
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
