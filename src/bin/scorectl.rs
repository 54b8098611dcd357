use arrrg::CommandLine;
use arrrg_derive::CommandLine;
use serde_json::{Map, Value};

use scoring::{admin_token_now, cli_utils, http_utils, user_token};

#[derive(CommandLine, Default, PartialEq, Eq)]
struct Options {
    #[arrrg(optional, "Base URL of the scoring API server")]
    base_url: String,
    #[arrrg(optional, "Account name sent in the envelope")]
    account: String,
    #[arrrg(optional, "Login sent in the envelope")]
    login: String,
}

const USAGE: &str = r#"Usage: scorectl [options] <method> [arguments-json]

Options:
  --base-url <url>     Base URL of the scoring API server (default: http://localhost:8080)
  --account <name>     Account name sent in the envelope (default: empty)
  --login <name>       Login sent in the envelope (default: empty; "admin"
                       switches to the hour-bucketed administrative token)

Methods:
  online_score <arguments-json>       Compute a score, e.g.
      scorectl --login h&f online_score '{"phone": "79175002040", "email": "a@b.c"}'
  clients_interests <arguments-json>  Look up interests, e.g.
      scorectl --login h&f clients_interests '{"client_ids": [1, 2, 3]}'

The authentication token is derived locally from the account and login the
same way the server derives it."#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (options, free) = Options::from_command_line_relaxed("USAGE: scorectl <method> [args]");

    if free.is_empty() {
        cli_utils::exit_with_usage_error("No method specified", USAGE);
    }
    if free[0] == "help" {
        println!("{}", USAGE);
        return Ok(());
    }
    if free.len() > 2 {
        cli_utils::exit_with_usage_error("Too many arguments", USAGE);
    }

    let method = free[0].as_str();
    let arguments: Value = match free.get(1) {
        Some(raw) => serde_json::from_str(raw)
            .unwrap_or_else(|e| cli_utils::exit_with_error(&format!("Invalid arguments JSON: {}", e))),
        None => Value::Object(Map::new()),
    };
    if !arguments.is_object() {
        cli_utils::exit_with_usage_error("Arguments must be a JSON object", USAGE);
    }

    let base_url = if options.base_url.is_empty() {
        "http://localhost:8080".to_string()
    } else {
        options.base_url
    };

    let token = if options.login == scoring::ADMIN_LOGIN {
        admin_token_now()
    } else {
        user_token(&options.account, &options.login)
    };

    let mut envelope = Map::new();
    envelope.insert("account".to_string(), Value::from(options.account));
    envelope.insert("login".to_string(), Value::from(options.login));
    envelope.insert("token".to_string(), Value::from(token));
    envelope.insert("method".to_string(), Value::from(method));
    envelope.insert("arguments".to_string(), arguments);

    let client = http_utils::ScoringClient::new(base_url);
    match client.call(&envelope).await {
        Ok(response) => {
            cli_utils::print_json_or_exit(&response, "method response");
            if response.code != 200 {
                std::process::exit(2);
            }
        }
        Err(e) => cli_utils::exit_with_error(&format!("Request failed: {}", e)),
    }

    Ok(())
}
