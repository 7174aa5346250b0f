//! Manual submission CLI, for operators and local testing.
//!
//! Usage:
//!   submit <title> [--key <external-key>] [--platforms fb,yt,ig]
//!          [--callback <url>] [--api <base-url>]
//!
//! Signs the request with WEBHOOK_SECRET when set, matching what the CMS
//! webhook sends.

use anyhow::{bail, Context, Result};

use socialforge_api::auth::sign;

struct Args {
    title: String,
    external_key: Option<String>,
    platforms: Option<Vec<String>>,
    callback_url: Option<String>,
    api_base: String,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let Some(title) = args.next() else {
        bail!("usage: submit <title> [--key K] [--platforms fb,yt,ig] [--callback URL] [--api URL]");
    };

    let mut parsed = Args {
        title,
        external_key: None,
        platforms: None,
        callback_url: None,
        api_base: "http://localhost:8080".to_string(),
    };

    while let Some(flag) = args.next() {
        let value = args
            .next()
            .with_context(|| format!("{flag} needs a value"))?;
        match flag.as_str() {
            "--key" => parsed.external_key = Some(value),
            "--platforms" => {
                parsed.platforms = Some(value.split(',').map(str::to_string).collect())
            }
            "--callback" => parsed.callback_url = Some(value),
            "--api" => parsed.api_base = value,
            other => bail!("unknown flag: {other}"),
        }
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;

    let body = serde_json::to_vec(&serde_json::json!({
        "title": args.title,
        "external_key": args.external_key,
        "platforms": args.platforms,
        "callback_url": args.callback_url,
    }))?;

    let url = format!(
        "{}/webhook/create-profiles",
        args.api_base.trim_end_matches('/')
    );
    let mut request = reqwest::Client::new()
        .post(&url)
        .header("Content-Type", "application/json")
        .body(body.clone());
    if let Ok(secret) = std::env::var("WEBHOOK_SECRET") {
        request = request.header(
            "X-Hub-Signature-256",
            format!("sha256={}", sign(&secret, &body)),
        );
    }

    let response = request.send().await.context("request failed")?;
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    println!("{status}\n{text}");

    if !status.is_success() {
        bail!("submission rejected");
    }
    Ok(())
}
