//! Resolve a URL against a redirector configuration without starting a server.
//!
//! Exit status: 0 when a rule matched, 1 when none did, 2 on configuration or
//! argument errors.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use url::Url;

use redirector::config::load_config;
use redirector::redirect::{resolve, RequestContext, RuleSet};

#[derive(Parser)]
#[command(name = "redirect-check")]
#[command(about = "Show which redirect a URL would receive", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Treat the request as secure regardless of the URL scheme.
    #[arg(long)]
    secure: bool,

    /// Full request URL, e.g. http://example.com/old/page?x=1
    url: Url,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    let rules = match RuleSet::from_config(&config.redirect.rules) {
        Ok(rules) => rules,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    let context = match context_from_url(&cli.url, cli.secure) {
        Some(context) => context,
        None => {
            eprintln!("Error: URL has no host: {}", cli.url);
            return ExitCode::from(2);
        }
    };

    match resolve(&context, &rules) {
        Ok(decision) => match serde_json::to_string_pretty(&decision) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(2)
            }
        },
        Err(e) => {
            println!("no redirect rule matched: {}", e.uri);
            ExitCode::from(1)
        }
    }
}

fn context_from_url(url: &Url, force_secure: bool) -> Option<RequestContext> {
    let host = url.host_str()?.to_ascii_lowercase();
    let secure = force_secure || url.scheme() == "https";
    let scheme = if secure { "https" } else { "http" };

    let http_host = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.clone(),
    };
    let request_uri = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };

    Some(RequestContext::new(
        format!("{scheme}://{http_host}{request_uri}"),
        url.path(),
        secure,
        host,
        request_uri,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_from_url() {
        let url = Url::parse("http://Example.com:8080/old/page?x=1").unwrap();
        let ctx = context_from_url(&url, false).unwrap();

        assert_eq!(ctx.uri, "http://example.com:8080/old/page?x=1");
        assert_eq!(ctx.host, "example.com");
        assert_eq!(ctx.path, "/old/page");
        assert_eq!(ctx.request_uri, "/old/page?x=1");
        assert!(!ctx.secure);
    }

    #[test]
    fn test_secure_from_scheme_or_flag() {
        let url = Url::parse("https://example.com/").unwrap();
        assert!(context_from_url(&url, false).unwrap().secure);

        let url = Url::parse("http://example.com/").unwrap();
        let ctx = context_from_url(&url, true).unwrap();
        assert!(ctx.secure);
        assert_eq!(ctx.uri, "https://example.com/");
    }

    #[test]
    fn test_url_without_host() {
        let url = Url::parse("mailto:someone@example.com").unwrap();
        assert!(context_from_url(&url, false).is_none());
    }
}
