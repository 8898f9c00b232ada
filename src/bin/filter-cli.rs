use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use request_filter::config::{loader::parse_config, AppConfig, ConfigError};
use request_filter::filter::{evaluate, Decision, RequestContext};

#[derive(Parser)]
#[command(name = "filter-cli")]
#[command(about = "Offline tooling for request filter configurations", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "request-filter.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every filter rule and report the ones that fail
    Validate,
    /// Evaluate a synthetic request against the configured filter
    Check {
        /// Client IP address
        #[arg(long, default_value = "")]
        ip: String,
        /// User-Agent header value
        #[arg(long, default_value = "")]
        user_agent: String,
        /// Mark the request as XHR
        #[arg(long)]
        xhr: bool,
        /// Mark the request as arriving over plain TCP
        #[arg(long)]
        insecure: bool,
        /// Request path (matched against skip_paths)
        #[arg(long, default_value = "/")]
        path: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let content = match std::fs::read_to_string(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Validate => validate(&content),
        Commands::Check {
            ip,
            user_agent,
            xhr,
            insecure,
            path,
        } => {
            let ctx = RequestContext {
                source_address: ip,
                client_agent: user_agent,
                is_xhr: xhr,
                is_secure: !insecure,
                path,
            };
            check(&content, &ctx)
        }
    }
}

fn validate(content: &str) -> ExitCode {
    match config_errors(content) {
        Ok(()) => {
            println!("configuration is valid");
            ExitCode::SUCCESS
        }
        Err(errors) => {
            for e in errors {
                eprintln!("error: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}

/// Every problem that stops the config from loading, one message each.
fn config_errors(content: &str) -> Result<(), Vec<String>> {
    match parse_config(content) {
        Ok(_) => Ok(()),
        Err(ConfigError::Validation(errors)) => {
            Err(errors.iter().map(ToString::to_string).collect())
        }
        Err(e) => Err(vec![e.to_string()]),
    }
}

fn check(content: &str, ctx: &RequestContext) -> ExitCode {
    match check_decision(content, ctx) {
        Ok(decision) => {
            println!("{}", decision);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn check_decision(content: &str, ctx: &RequestContext) -> Result<Value, toml::de::Error> {
    // Parsed without validation so malformed rules surface as a 400 decision.
    let config: AppConfig = toml::from_str(content)?;
    Ok(decision_json(&evaluate(&config.filter.to_filter_config(), ctx)))
}

fn decision_json(decision: &Decision) -> Value {
    match decision {
        Decision::Continue => json!({ "decision": "continue" }),
        Decision::Reject(rejection) => json!({
            "decision": "reject",
            "status": rejection.status.code(),
            "reason": rejection.reason.as_str(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(agent: &str) -> RequestContext {
        RequestContext {
            source_address: "127.0.0.1".into(),
            client_agent: agent.into(),
            is_secure: true,
            path: "/".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_check_malformed_rule_reports_bad_request() {
        let config = r#"
            [filter]
            user_agent_filters = ["*"]
        "#;
        let decision = check_decision(config, &ctx("curl/8.0")).unwrap();
        assert_eq!(
            decision,
            json!({
                "decision": "reject",
                "status": 400,
                "reason": "cannot compile malformed filter string",
            })
        );
    }

    #[test]
    fn test_check_continue() {
        let config = r#"
            [filter]
            user_agent_filters = ["PostmanRuntime.*"]
        "#;
        let decision = check_decision(config, &ctx("curl/8.0")).unwrap();
        assert_eq!(decision, json!({ "decision": "continue" }));

        let decision = check_decision(config, &ctx("PostmanRuntime/7.26.8")).unwrap();
        assert_eq!(decision["decision"], "reject");
        assert_eq!(decision["status"], 403);
        assert_eq!(decision["reason"], "request user agent filtered");
    }

    #[test]
    fn test_check_syntax_error() {
        assert!(check_decision("[filter\n", &ctx("")).is_err());
    }

    #[test]
    fn test_validate_fails_on_malformed_rule() {
        let errors = config_errors(
            r#"
            [filter]
            ip_filters = ["*"]
            "#,
        )
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("ip_filters"));


        let valid = r#"
            [filter]
            ip_filters = ['^10\.']
            user_agent_filters = []
        "#;
        assert_eq!(config_errors(valid), Ok(()));
    }
}
