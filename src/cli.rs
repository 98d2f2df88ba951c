//! CLI argument definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::explain::{
    InferenceConfig, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS,
};

/// Python code analysis dashboard
#[derive(Parser, Debug)]
#[command(name = "codesight")]
#[command(about = "Analyze Python sources: functions, complexity, maintainability and AI explanations")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a file and print the dashboard
    Analyze {
        /// Path to the Python file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text", value_enum)]
        format: OutputFormat,

        /// Print the parsed AST to stderr (for debugging)
        #[arg(long)]
        print_ast: bool,

        /// Ask the inference service to explain every function
        #[arg(long)]
        explain_all: bool,

        /// Ask the inference service for improvement suggestions
        #[arg(long)]
        improvements: bool,

        #[command(flatten)]
        inference: InferenceArgs,
    },

    /// Explain one function
    Explain {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Function name, plain (`parse`) or dotted (`Parser.parse`)
        #[arg(long = "function")]
        function: String,

        #[command(flatten)]
        inference: InferenceArgs,
    },

    /// Ask a question about one function
    Ask {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(long = "function")]
        function: String,

        #[arg(short, long)]
        question: String,

        #[command(flatten)]
        inference: InferenceArgs,
    },

    /// Suggest improvements for a whole file
    Improve {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        inference: InferenceArgs,
    },

    /// Run the web dashboard
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(short, long, default_value_t = 8501)]
        port: u16,

        #[command(flatten)]
        inference: InferenceArgs,
    },
}

/// Inference endpoint settings
#[derive(Args, Debug, Clone)]
pub struct InferenceArgs {
    /// API token for the inference endpoint
    #[arg(long, env = "HUGGINGFACE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model identifier
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub inference_url: String,

    /// Maximum tokens per reply
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,
}

impl InferenceArgs {
    pub fn config(&self) -> InferenceConfig {
        InferenceConfig {
            api_key: self.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: self.model.clone(),
            base_url: self.inference_url.clone(),
            max_tokens: self.max_tokens,
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

/// Output format options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Sectioned plain-text report
    #[default]
    Text,
    /// JSON - the rendered view
    Json,
    /// TOON (Token-Oriented Object Notation) - token-efficient format
    Toon,
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default log filter for the chosen verbosity
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "codesight=debug"
        } else {
            "codesight=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_defaults() {
        let cli = Cli::try_parse_from(["codesight", "analyze", "a.py"]).unwrap();
        match cli.command {
            Command::Analyze {
                ref file,
                format,
                print_ast,
                ref inference,
                ..
            } => {
                assert_eq!(*file, PathBuf::from("a.py"));
                assert_eq!(format, OutputFormat::Text);
                assert!(!print_ast);
                assert_eq!(inference.max_tokens, DEFAULT_MAX_TOKENS);
                assert_eq!(inference.model, DEFAULT_MODEL);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.log_filter(), "codesight=info");
    }

    #[test]
    fn test_global_verbose_after_subcommand() {
        let cli = Cli::try_parse_from(["codesight", "improve", "a.py", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.log_filter(), "codesight=debug");
    }

    #[test]
    fn test_ask_requires_question() {
        assert!(Cli::try_parse_from(["codesight", "ask", "a.py", "--function", "f"]).is_err());
        let cli = Cli::try_parse_from([
            "codesight", "ask", "a.py", "--function", "f", "--question", "why?",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Ask { ref question, .. } if question == "why?"));
    }

    #[test]
    fn test_blank_api_key_is_none() {
        let cli = Cli::try_parse_from([
            "codesight", "explain", "a.py", "--function", "f", "--api-key", " ",
        ])
        .unwrap();
        let Command::Explain { inference, .. } = cli.command else {
            panic!("expected explain");
        };
        assert!(inference.config().api_key.is_none());
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["codesight", "serve", "--port", "9000"]).unwrap();
        let Command::Serve { host, port, .. } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(host, "127.0.0.1");
        assert_eq!(port, 9000);
    }
}
