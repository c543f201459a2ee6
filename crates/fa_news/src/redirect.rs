use std::time::Duration;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use fa_core::{Error, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::fetcher::BROWSER_USER_AGENT;

pub const GOOGLE_NEWS_HOST: &str = "news.google.com";
const GOOGLE_NEWS_BASE: &str = "https://news.google.com";
const BATCH_EXECUTE_PATH: &str = "/_/DotsSplashUi/data/batchexecute";

/// Leading bytes of a decoded article id.
const ID_FRAME_PREFIX: [u8; 3] = [0x08, 0x13, 0x22];

/// Article ids are URL-safe base64 with or without padding.
const ARTICLE_ID: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Debug, Clone, PartialEq, Eq)]
struct DecodingParams {
    signature: String,
    timestamp: String,
}

/// Turns Google News redirect links into the publisher's URL.
///
/// Resolution is best effort: any failure is logged and the input is
/// returned unchanged.
#[derive(Debug, Clone)]
pub struct RedirectResolver {
    client: Client,
    base_url: String,
}

impl RedirectResolver {
    pub fn new() -> Result<Self> {
        Self::with_base_url(GOOGLE_NEWS_BASE)
    }

    /// `base_url` replaces `https://news.google.com` for the online lookups.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn is_aggregator_url(url: &str) -> bool {
        article_id(url).is_some()
    }

    pub async fn resolve(&self, url: &str) -> String {
        let Some(id) = article_id(url) else {
            return url.to_string();
        };

        info!("🔗 Decoding Google News URL: {}", url);
        match self.decode(&id).await {
            Ok(decoded) if !decoded.is_empty() => {
                info!("🔗 Decoded URL: {}", decoded);
                decoded
            }
            Ok(_) => {
                warn!("⚠️ Google News decode returned an empty URL, keeping {}", url);
                url.to_string()
            }
            Err(e) => {
                warn!("⚠️ Failed to decode Google News URL {}: {}", url, e);
                url.to_string()
            }
        }
    }

    async fn decode(&self, id: &str) -> Result<String> {
        if let Some(url) = decode_offline(id) {
            debug!("Decoded article id without a network round trip");
            return Ok(url);
        }
        let params = self.decoding_params(id).await?;
        self.batch_execute(id, &params).await
    }

    async fn decoding_params(&self, id: &str) -> Result<DecodingParams> {
        let mut last_error = None;
        for prefix in ["articles", "rss/articles"] {
            let url = format!("{}/{}/{}", self.base_url, prefix, id);
            let page = match self.client.get(&url).send().await.and_then(|r| r.error_for_status()) {
                Ok(response) => response.text().await?,
                Err(e) => {
                    debug!("Decoding params not available at {}: {}", url, e);
                    last_error = Some(Error::from(e));
                    continue;
                }
            };
            match parse_decoding_params(&page) {
                Some(params) => return Ok(params),
                None => {
                    last_error = Some(Error::Decode(format!("no signature found at {}", url)));
                }
            }
        }
        Err(last_error.unwrap_or_else(|| Error::Decode("no decoding params".to_string())))
    }

    async fn batch_execute(&self, id: &str, params: &DecodingParams) -> Result<String> {
        let request = format!(
            r#"["garturlreq",[["X","X",["X","X"],null,null,1,1,"US:en",null,1,null,null,null,null,null,0,1],"X","X",1,[1,1,1],1,1,null,0,0,null,0],"{}",{},"{}"]"#,
            id, params.timestamp, params.signature
        );
        let envelope = json!([[["Fbv4je", request]]]);

        let body = self
            .client
            .post(format!("{}{}", self.base_url, BATCH_EXECUTE_PATH))
            .form(&[("f.req", envelope.to_string())])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_batch_execute(&body)
    }
}

/// The article id of a Google News `/articles/<id>` or `/read/<id>` link.
pub fn article_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if parsed.host_str()? != GOOGLE_NEWS_HOST {
        return None;
    }
    let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [.., kind, id] if matches!(*kind, "articles" | "read") => Some(id.to_string()),
        _ => None,
    }
}

/// Legacy ids embed the publisher URL directly in a length-prefixed frame.
pub fn decode_offline(id: &str) -> Option<String> {
    let bytes = ARTICLE_ID.decode(id).ok()?;
    let frame = bytes.strip_prefix(&ID_FRAME_PREFIX[..])?;
    let (len, rest) = read_varint(frame)?;
    let url = std::str::from_utf8(rest.get(..len)?).ok()?;
    if url.starts_with("http://") || url.starts_with("https://") {
        Some(url.to_string())
    } else {
        None
    }
}

fn read_varint(bytes: &[u8]) -> Option<(usize, &[u8])> {
    let mut value = 0usize;
    for (i, byte) in bytes.iter().enumerate().take(4) {
        value |= ((byte & 0x7f) as usize) << (7 * i);
        if byte & 0x80 == 0 {
            return Some((value, &bytes[i + 1..]));
        }
    }
    None
}

fn parse_decoding_params(page: &str) -> Option<DecodingParams> {
    let document = Html::parse_document(page);
    let selector = Selector::parse("c-wiz > div[jscontroller]").ok()?;
    let node = document.select(&selector).next()?;
    Some(DecodingParams {
        signature: node.value().attr("data-n-a-sg")?.to_string(),
        timestamp: node.value().attr("data-n-a-ts")?.to_string(),
    })
}

fn parse_batch_execute(body: &str) -> Result<String> {
    let malformed = || Error::Decode("unexpected batchexecute response".to_string());
    let chunk = body.split("\n\n").nth(1).ok_or_else(malformed)?;
    let outer: Value = serde_json::from_str(chunk).map_err(|_| malformed())?;
    let inner = outer
        .get(0)
        .and_then(|entry| entry.get(2))
        .and_then(Value::as_str)
        .ok_or_else(malformed)?;
    let inner: Value = serde_json::from_str(inner).map_err(|_| malformed())?;
    inner
        .get(1)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, Method::POST, MockServer};

    fn encode_id(payload: &[u8]) -> String {
        let mut frame = ID_FRAME_PREFIX.to_vec();
        frame.push(payload.len() as u8);
        frame.extend_from_slice(payload);
        frame.extend_from_slice(&[0xd2, 0x01, 0x00]);
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(frame)
    }

    const SIGNATURE_PAGE: &str = r#"<html><body>
        <c-wiz><div jscontroller="aLI87" data-n-a-sg="sig-123" data-n-a-ts="1717000000"></div></c-wiz>
    </body></html>"#;

    const BATCH_RESPONSE: &str = r#")]}'

[["wrb.fr","Fbv4je","[\"garturlres\",\"https://example.com/markets/story\",1]",null,null,null,"generic"],["di",10],["af.httprm",10,"-1",5]]

25
[["e",4,null,null,129]]"#;

    #[test]
    fn test_article_id_patterns() {
        assert_eq!(
            article_id("https://news.google.com/rss/articles/CBMiabc?oc=5").as_deref(),
            Some("CBMiabc")
        );
        assert_eq!(article_id("https://news.google.com/articles/CBMixyz").as_deref(), Some("CBMixyz"));
        assert_eq!(article_id("https://news.google.com/read/CBMi123").as_deref(), Some("CBMi123"));
        assert_eq!(article_id("https://news.google.com/topstories"), None);
        assert_eq!(article_id("https://finance.yahoo.com/articles/abc"), None);
        assert_eq!(article_id("not a url"), None);
        assert!(RedirectResolver::is_aggregator_url("https://news.google.com/rss/articles/CBMiabc"));
    }

    #[test]
    fn test_decode_offline_legacy_id() {
        let id = encode_id(b"https://www.reuters.com/markets/us/stocks-rally");
        assert_eq!(
            decode_offline(&id).as_deref(),
            Some("https://www.reuters.com/markets/us/stocks-rally")
        );
        let padded = base64::engine::general_purpose::URL_SAFE.encode(
            base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(&id).unwrap(),
        );
        assert_eq!(decode_offline(&padded), decode_offline(&id));
    }

    #[test]
    fn test_decode_offline_rejects_new_style_and_garbage() {
        assert_eq!(decode_offline(&encode_id(b"AU_yqLNa_gHw4-TyTZ5Xrot2")), None);
        assert_eq!(decode_offline("!!!not-base64!!!"), None);
        assert_eq!(decode_offline(""), None);
    }

    #[test]
    fn test_read_varint_two_bytes() {
        let (len, rest) = read_varint(&[0xac, 0x02, b'x']).unwrap();
        assert_eq!(len, 300);
        assert_eq!(rest, b"x");
        assert!(read_varint(&[0x80, 0x80, 0x80, 0x80, 0x01]).is_none());
    }

    #[test]
    fn test_parse_batch_execute() {
        assert_eq!(
            parse_batch_execute(BATCH_RESPONSE).unwrap(),
            "https://example.com/markets/story"
        );
        assert!(parse_batch_execute("garbage").is_err());
    }

    #[tokio::test]
    async fn test_resolve_passes_through_non_aggregator_urls() {
        let resolver = RedirectResolver::with_base_url("http://127.0.0.1:9").unwrap();
        let url = "https://finance.yahoo.com/news/nvidia-earnings.html";
        assert_eq!(resolver.resolve(url).await, url);
    }

    #[tokio::test]
    async fn test_resolve_legacy_id_offline() {
        let resolver = RedirectResolver::with_base_url("http://127.0.0.1:9").unwrap();
        let id = encode_id(b"https://money.udn.com/money/story/5612/123");
        let url = format!("https://news.google.com/rss/articles/{}?oc=5", id);
        assert_eq!(resolver.resolve(&url).await, "https://money.udn.com/money/story/5612/123");
    }

    #[tokio::test]
    async fn test_resolve_new_style_id_online() {
        let server = MockServer::start();
        let id = encode_id(b"AU_yqLNa_gHw4-TyTZ5Xrot2");
        let page = server.mock(|when, then| {
            when.method(GET).path(format!("/articles/{}", id));
            then.status(200).body(SIGNATURE_PAGE);
        });
        let batch = server.mock(|when, then| {
            when.method(POST)
                .path(BATCH_EXECUTE_PATH)
                .body_includes("f.req=")
                .body_includes("sig-123");
            then.status(200).body(BATCH_RESPONSE);
        });

        let resolver = RedirectResolver::with_base_url(server.base_url()).unwrap();
        let url = format!("https://news.google.com/rss/articles/{}?oc=5", id);
        let resolved = resolver.resolve(&url).await;

        page.assert();
        batch.assert();
        assert_eq!(resolved, "https://example.com/markets/story");
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_input_on_failure() {
        let server = MockServer::start();
        let id = encode_id(b"AU_yqLbroken");
        server.mock(|when, then| {
            when.method(GET).path(format!("/articles/{}", id));
            then.status(500);
        });
        server.mock(|when, then| {
            when.method(GET).path(format!("/rss/articles/{}", id));
            then.status(200).body("<html><body>no signature here</body></html>");
        });

        let resolver = RedirectResolver::with_base_url(server.base_url()).unwrap();
        let url = format!("https://news.google.com/rss/articles/{}", id);
        let resolved = resolver.resolve(&url).await;
        assert_eq!(resolved, url);
        assert!(!resolved.is_empty());
    }
}
