//! Command-line interface for Triproute

use clap::{Parser, Subcommand};

/// Multi-model orchestration for a travel-planning assistant
#[derive(Parser)]
#[command(name = "triproute")]
#[command(version)]
#[command(about = "Multi-model orchestration for a travel-planning assistant")]
#[command(
    long_about = "Triproute decides which LLM backends answer a request: one model chosen \
    by query class (router), a cheap model with escalation on low confidence (cascade), \
    or several models merged by a synthesis call (ensemble)."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Answer one query and print the call ledger summary
    Ask {
        /// The query to answer
        query: String,

        /// router, cascade, ensemble, direct or auto
        #[arg(short, long, default_value = "auto")]
        strategy: String,

        /// Print the full pattern result as JSON instead of the answer text
        #[arg(long)]
        json: bool,
    },

    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# Triproute Configuration
#
# Model roles, orchestration tuning, pricing and call-ledger settings.

[server]
# 0.0.0.0 for all interfaces, 127.0.0.1 for localhost only
host = "0.0.0.0"
port = 8000

# Per-call model timeout, (0, 300]. Endpoints may override with timeout_seconds.
request_timeout_seconds = 60

# ---------------------------------------------------------------------------
# MODEL ROLES
# ---------------------------------------------------------------------------
#
#   fast     - router target for simple/general queries, ensemble slot
#   strong   - router target for technical/complex queries, cascade fallback,
#              ensemble slot and default synthesis model
#   cheap    - cascade first attempt
#   creative - optional; ensemble slot for creative queries and cascade
#              ultimate fallback
#
# Any OpenAI-compatible /chat/completions endpoint works. `name` is the
# logical name used in logs, metrics and pricing; it must be unique.

[models.fast]
name = "gemini_25_flash"
model = "gemini-2.5-flash"
base_url = "https://generativelanguage.googleapis.com/v1beta/openai"
max_tokens = 4096
temperature = 0.7
api_key_env = "GOOGLE_API_KEY"

[models.strong]
name = "gemini_25_pro"
model = "gemini-2.5-pro"
base_url = "https://generativelanguage.googleapis.com/v1beta/openai"
max_tokens = 8192
temperature = 0.7
api_key_env = "GOOGLE_API_KEY"
timeout_seconds = 120

[models.cheap]
name = "gemini_20_flash"
model = "gemini-2.0-flash"
base_url = "https://generativelanguage.googleapis.com/v1beta/openai"
max_tokens = 4096
temperature = 0.7
api_key_env = "GOOGLE_API_KEY"

[models.creative]
name = "openai_creative"
model = "gpt-4o"
base_url = "https://api.openai.com/v1"
max_tokens = 4096
temperature = 0.9
api_key_env = "OPENAI_API_KEY"

# ---------------------------------------------------------------------------
# ORCHESTRATION
# ---------------------------------------------------------------------------

[orchestration]
# Role whose model merges ensemble answers: fast, strong, cheap or creative
synthesis_model = "strong"

# Try the creative model when the cascade's strong model also fails
creative_ultimate_fallback = true

# ---------------------------------------------------------------------------
# PRICING (Optional)
# ---------------------------------------------------------------------------
#
# USD per million tokens, keyed by logical model name. Entries override or
# extend the built-in table. Unknown models cost 0.

# [pricing.gemini_25_pro]
# input_per_mtok = 1.25
# output_per_mtok = 5.0

# ---------------------------------------------------------------------------
# CALL LEDGER
# ---------------------------------------------------------------------------

[ledger]
# Append every call record as one JSON line
# record_file = "logs/calls.jsonl"

# Write a summary snapshot after `triproute ask` and on server shutdown
# snapshot_dir = "logs"

# ---------------------------------------------------------------------------
# OBSERVABILITY
# ---------------------------------------------------------------------------

[observability]
# "trace", "debug", "info", "warn", "error"; RUST_LOG overrides
log_level = "info"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn default_config_path() {
        let cli = Cli::parse_from(["triproute"]);
        assert_eq!(cli.config, "config.toml");
        assert!(cli.command.is_none());
    }

    #[test]
    fn custom_config_path_after_subcommand() {
        let cli = Cli::parse_from(["triproute", "serve", "--config", "custom.toml"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Some(Command::Serve)));
    }

    #[test]
    fn ask_subcommand_defaults() {
        let cli = Cli::parse_from(["triproute", "ask", "Best beaches in Crete?"]);
        assert!(matches!(
            cli.command,
            Some(Command::Ask { ref query, ref strategy, json: false })
                if query == "Best beaches in Crete?" && strategy == "auto"
        ));
    }

    #[test]
    fn ask_subcommand_with_strategy() {
        let cli = Cli::parse_from(["triproute", "ask", "-s", "ensemble", "--json", "Plan Rome"]);
        assert!(matches!(
            cli.command,
            Some(Command::Ask { ref strategy, json: true, .. }) if strategy == "ensemble"
        ));
    }

    #[test]
    fn config_subcommand_with_output() {
        let cli = Cli::parse_from(["triproute", "config", "-o", "my-config.toml"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config { output: Some(ref path) }) if path == "my-config.toml"
        ));
    }

    #[test]
    fn template_is_a_valid_config() {
        let config: Config = generate_config_template()
            .parse()
            .expect("template should parse and validate");
        assert_eq!(config.server.port, 8000);
        assert!(config.models.creative.is_some());
        assert!(config.ledger.record_file.is_none());
    }

    #[test]
    fn template_has_all_sections() {
        let template = generate_config_template();
        for section in [
            "[server]",
            "[models.fast]",
            "[models.strong]",
            "[models.cheap]",
            "[models.creative]",
            "[orchestration]",
            "[ledger]",
            "[observability]",
        ] {
            assert!(template.contains(section), "missing {section}");
        }
    }
}
