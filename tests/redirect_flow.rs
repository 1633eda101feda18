//! End-to-end tests: real listener, real HTTP client.

use std::time::Duration;

use redirector::config::parse_config;
use reqwest::header::LOCATION;
use reqwest::StatusCode;

mod common;

const CONFIG: &str = r#"
[[redirect.rules]]
pattern = '/.*some-matching-path\/something-else/'
redirect = "domain.com/the-redirect/extra"

[[redirect.rules]]
pattern = "/.*some-matching-path/"
redirect = "domain.com/the-redirect"

[[redirect.rules]]
pattern = "/.*old-blog/"
redirect = "/blog"
forwarding = true
status = 307

[[redirect.rules]]
pattern = "/.*always-secure/"
redirect = "secure.domain.com/"
protocol = "https://"
"#;

#[tokio::test]
async fn test_first_matching_rule_redirects() {
    let server = common::start_server(parse_config(CONFIG).unwrap()).await;
    let client = common::client();

    let res = client
        .get(server.url("/some-matching-path/something-else"))
        .send()
        .await
        .expect("redirector unreachable");
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers()[LOCATION], "http://domain.com/the-redirect/extra");

    let res = client
        .get(server.url("/some-matching-path/"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()[LOCATION], "http://domain.com/the-redirect");

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_relative_target_with_forwarding() {
    let server = common::start_server(parse_config(CONFIG).unwrap()).await;

    let res = common::client()
        .get(server.url("/old-blog/2019/post?ref=feed"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    // Host comes from the request, without its port.
    assert_eq!(
        res.headers()[LOCATION],
        "http://127.0.0.1/blog/old-blog/2019/post?ref=feed"
    );

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_protocol_override() {
    let server = common::start_server(parse_config(CONFIG).unwrap()).await;

    let res = common::client()
        .get(server.url("/always-secure"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.headers()[LOCATION], "https://secure.domain.com/");

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_unmatched_request_keeps_not_found() {
    let server = common::start_server(parse_config(CONFIG).unwrap()).await;

    let res = common::client()
        .get(server.url("/nothing-here"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.headers().get(LOCATION).is_none());
    assert_eq!(res.text().await.unwrap(), "Not Found");

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_health_route_is_not_redirected() {
    let config = parse_config(
        r#"
        [[redirect.rules]]
        pattern = "healthz"
        redirect = "/elsewhere"
        "#,
    )
    .unwrap();
    let server = common::start_server(config).await;

    let res = common::client().get(server.url("/healthz")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "ok");

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_keyed_rules_and_forwarded_proto() {
    let config = parse_config(
        r#"
        [redirect]
        trust_forwarded_headers = true

        [redirect.rules."/.*docs/"]
        redirect = "docs.domain.com/"
        method = 302
        "#,
    )
    .unwrap();
    let server = common::start_server(config).await;
    let client = common::client();

    let res = client.get(server.url("/docs/intro")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()[LOCATION], "http://docs.domain.com/");

    let res = client
        .get(server.url("/docs/intro"))
        .header("X-Forwarded-Proto", "https")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()[LOCATION], "https://docs.domain.com/");

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_reload_swaps_rules() {
    let server = common::start_server(parse_config(CONFIG).unwrap()).await;
    let client = common::client();

    let res = client.get(server.url("/moved")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let reloaded = parse_config(
        r#"
        [[redirect.rules]]
        pattern = "/.*moved/"
        redirect = "new.domain.com/"
        "#,
    )
    .unwrap();
    server.config_updates.send(reloaded).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let res = client.get(server.url("/moved")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers()[LOCATION], "http://new.domain.com/");

    // Old rules are gone entirely.
    let res = client.get(server.url("/some-matching-path/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    server.shutdown.trigger();
}
