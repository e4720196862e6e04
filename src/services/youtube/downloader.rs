//! Scrapes comments through YouTube's public watch page and InnerTube API.
//!
//! The watch page embeds two JSON blobs: `ytcfg` (API key and client
//! context) and `ytInitialData` (the page model, including the comment
//! sort menu). Picking a sort entry yields a continuation endpoint; each
//! POST to that endpoint returns a batch of comments plus more
//! continuations for further pages and reply threads.

use std::collections::VecDeque;
use std::sync::LazyLock;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{CommentSource, FetchError, RawComment};

const DEFAULT_BASE_URL: &str = "https://www.youtube.com";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/79.0.3945.130 Safari/537.36";

/// Index of "Top comments" in the sort menu.
const SORT_BY_POPULAR: usize = 0;

const COMMENT_SECTION_TARGETS: &[&str] = &[
    "comments-section",
    "engagement-panel-comments-section",
    "shorts-engagement-panel-comments-section",
];

static YT_CFG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ytcfg\.set\s*\(\s*(\{.+?\})\s*\)\s*;").unwrap());

static YT_INITIAL_DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:window\s*\[\s*["']ytInitialData["']\s*\]|ytInitialData)\s*=\s*(\{.+?\})\s*;\s*(?:var\s+meta|</script|\n)"#,
    )
    .unwrap()
});

/// Tuning for [`YoutubeCommentDownloader`].
#[derive(Debug, Clone)]
pub struct DownloaderOptions {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    /// Attempts per API call before giving up.
    pub retries: u32,
    /// Pause between failed API attempts.
    pub retry_delay: Duration,
    /// Pause between consecutive pages.
    pub page_delay: Duration,
    /// Interface language (`hl`) requested from the API.
    pub language: Option<String>,
}

impl Default for DownloaderOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(60),
            retries: 5,
            retry_delay: Duration::from_secs(20),
            page_delay: Duration::from_millis(100),
            language: None,
        }
    }
}

/// Comment source backed by the YouTube web client protocol.
pub struct YoutubeCommentDownloader {
    client: Client,
    options: DownloaderOptions,
}

impl YoutubeCommentDownloader {
    pub fn new(options: DownloaderOptions) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(&options.user_agent)
            .timeout(options.timeout)
            .cookie_store(true)
            .build()?;
        Ok(Self { client, options })
    }

    /// Load the watch page and resolve the continuation for popular-first order.
    async fn open(&self, video_id: &str) -> Result<Option<(Value, Value)>, FetchError> {
        let url = format!("{}/watch?v={}", self.options.base_url, video_id);
        let response = self.client.get(&url).send().await?;

        if response.url().as_str().contains("consent") {
            return Err(FetchError::Layout(
                "redirected to the cookie consent page".to_string(),
            ));
        }
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let html = response.text().await?;

        let Some(mut ytcfg) = capture_json(&YT_CFG_RE, &html)? else {
            return Err(FetchError::Layout("ytcfg not found".to_string()));
        };
        if let Some(language) = &self.options.language {
            if let Some(client) = ytcfg
                .pointer_mut("/INNERTUBE_CONTEXT/client")
                .and_then(Value::as_object_mut)
            {
                client.insert("hl".to_string(), Value::String(language.clone()));
            }
        }

        let data = capture_json(&YT_INITIAL_DATA_RE, &html)?.unwrap_or(Value::Null);

        let has_comments = search_dict(&data, "itemSectionRenderer")
            .next()
            .map(|section| search_dict(section, "continuationItemRenderer").next().is_some())
            .unwrap_or(false);
        if !has_comments {
            debug!(video_id, "No comment section, comments may be disabled");
            return Ok(None);
        }

        let mut sort_menu = sort_menu_items(&data);
        if sort_menu.is_empty() {
            // Some layouts only expose the sort menu after one round trip.
            let section = search_dict(&data, "sectionListRenderer")
                .next()
                .cloned()
                .unwrap_or(Value::Null);
            if let Some(endpoint) = search_dict(&section, "continuationEndpoint").next() {
                let retry = self.ajax(endpoint, &ytcfg).await?.unwrap_or(Value::Null);
                sort_menu = sort_menu_items(&retry);
            };
        }

        let endpoint = sort_menu
            .get(SORT_BY_POPULAR)
            .and_then(|item| item.get("serviceEndpoint"))
            .cloned()
            .ok_or_else(|| FetchError::Layout("failed to set sorting".to_string()))?;

        Ok(Some((ytcfg, endpoint)))
    }

    /// POST a continuation to the InnerTube API.
    ///
    /// `Ok(None)` means the server refused the continuation (403/413),
    /// which ends pagination.
    async fn ajax(&self, endpoint: &Value, ytcfg: &Value) -> Result<Option<Value>, FetchError> {
        let api_url = endpoint
            .pointer("/commandMetadata/webCommandMetadata/apiUrl")
            .and_then(Value::as_str)
            .ok_or_else(|| FetchError::Layout("continuation without apiUrl".to_string()))?;
        let token = endpoint
            .pointer("/continuationCommand/token")
            .and_then(Value::as_str)
            .ok_or_else(|| FetchError::Layout("continuation without token".to_string()))?;
        let key = ytcfg
            .get("INNERTUBE_API_KEY")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let url = format!("{}{}", self.options.base_url, api_url);
        let body = json!({
            "context": ytcfg.get("INNERTUBE_CONTEXT").cloned().unwrap_or(Value::Null),
            "continuation": token,
        });

        let mut last_status = StatusCode::OK;
        for attempt in 1..=self.options.retries.max(1) {
            let response = self
                .client
                .post(&url)
                .query(&[("key", key)])
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::OK {
                return Ok(Some(response.json().await?));
            }
            if status == StatusCode::FORBIDDEN || status == StatusCode::PAYLOAD_TOO_LARGE {
                return Ok(None);
            }

            warn!(
                "InnerTube request failed with {} (attempt {}/{})",
                status, attempt, self.options.retries
            );
            last_status = status;
            tokio::time::sleep(self.options.retry_delay).await;
        }

        Err(FetchError::Status(last_status.as_u16()))
    }
}

impl CommentSource for YoutubeCommentDownloader {
    fn fetch<'a>(&'a self, video_id: &'a str) -> BoxStream<'a, Result<RawComment, FetchError>> {
        let state = PageState {
            downloader: self,
            video_id,
            started: false,
            pages: 0,
            ytcfg: Value::Null,
            continuations: Vec::new(),
            buffer: VecDeque::new(),
        };

        stream::try_unfold(state, |mut state| async move {
            loop {
                if let Some(comment) = state.buffer.pop_front() {
                    return Ok(Some((comment, state)));
                }
                if !state.advance().await? {
                    return Ok(None);
                }
            }
        })
        .boxed()
    }
}

/// Pagination state carried between polls of the comment stream.
struct PageState<'a> {
    downloader: &'a YoutubeCommentDownloader,
    video_id: &'a str,
    started: bool,
    pages: usize,
    ytcfg: Value,
    /// Stack of pending continuation endpoints; the last one is next.
    continuations: Vec<Value>,
    buffer: VecDeque<RawComment>,
}

impl PageState<'_> {
    /// Fetch the next page into the buffer. Returns `false` once exhausted.
    async fn advance(&mut self) -> Result<bool, FetchError> {
        if !self.started {
            self.started = true;
            match self.downloader.open(self.video_id).await? {
                Some((ytcfg, endpoint)) => {
                    self.ytcfg = ytcfg;
                    self.continuations.push(endpoint);
                }
                None => return Ok(false),
            }
        }

        let Some(endpoint) = self.continuations.pop() else {
            return Ok(false);
        };

        if self.pages > 0 {
            tokio::time::sleep(self.downloader.options.page_delay).await;
        }
        self.pages += 1;

        let Some(response) = self.downloader.ajax(&endpoint, &self.ytcfg).await? else {
            self.continuations.clear();
            return Ok(false);
        };

        let comments = parse_page(&response, &mut self.continuations)?;
        debug!(
            video_id = self.video_id,
            page = self.pages,
            comments = comments.len(),
            pending = self.continuations.len(),
            "Fetched comment page"
        );
        self.buffer.extend(comments);
        Ok(true)
    }
}

/// Extract the comments on one API response page.
///
/// New continuations are pushed onto `continuations`: comment-section
/// pages go to the bottom of the stack, reply threads to the top so they
/// are followed before the next top-level page.
fn parse_page(response: &Value, continuations: &mut Vec<Value>) -> Result<Vec<RawComment>, FetchError> {
    if let Some(error) = search_dict(response, "externalErrorMessage").next() {
        let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
        return Err(FetchError::Server(message));
    }

    let actions: Vec<&Value> = search_dict(response, "reloadContinuationItemsCommand")
        .chain(search_dict(response, "appendContinuationItemsAction"))
        .collect();

    for action in actions {
        let target = action.get("targetId").and_then(Value::as_str).unwrap_or_default();
        let items = action
            .get("continuationItems")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for item in items {
            if COMMENT_SECTION_TARGETS.contains(&target) {
                let endpoints: Vec<Value> = search_dict(item, "continuationEndpoint").cloned().collect();
                continuations.splice(0..0, endpoints);
            }
            if target.starts_with("comment-replies-item") && item.get("continuationItemRenderer").is_some() {
                if let Some(command) = search_dict(item, "buttonRenderer")
                    .next()
                    .and_then(|button| button.get("command"))
                {
                    continuations.push(command.clone());
                }
            }
        }
    }

    let payloads: Vec<&Value> = search_dict(response, "commentEntityPayload").collect();
    let mut comments = Vec::with_capacity(payloads.len());

    for payload in payloads.into_iter().rev() {
        let properties = payload.get("properties").unwrap_or(&Value::Null);
        let Some(cid) = properties.get("commentId").and_then(Value::as_str) else {
            continue;
        };

        let text_at = |pointer: &str| {
            payload
                .pointer(pointer)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let votes = text_at("/toolbar/likeCountNotliked").trim().to_string();

        comments.push(RawComment {
            cid: cid.to_string(),
            text: text_at("/properties/content/content"),
            votes: if votes.is_empty() { "0".to_string() } else { votes },
            replies: text_at("/toolbar/replyCount"),
            time: text_at("/properties/publishedTime"),
            reply: cid.contains('.'),
        });
    }

    Ok(comments)
}

fn sort_menu_items(data: &Value) -> Vec<Value> {
    search_dict(data, "sortFilterSubMenuRenderer")
        .next()
        .and_then(|menu| menu.get("subMenuItems"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn capture_json(pattern: &Regex, html: &str) -> Result<Option<Value>, FetchError> {
    match pattern.captures(html).and_then(|caps| caps.get(1)) {
        Some(m) => Ok(Some(serde_json::from_str(m.as_str())?)),
        None => Ok(None),
    }
}

/// Depth-first search for every value stored under `key`, at any depth.
///
/// Matches are not descended into. Traversal uses an explicit stack, so
/// later siblings are visited before earlier ones.
fn search_dict<'v>(root: &'v Value, key: &'v str) -> impl Iterator<Item = &'v Value> + 'v {
    let mut stack = vec![root];
    std::iter::from_fn(move || {
        while let Some(current) = stack.pop() {
            match current {
                Value::Object(map) => {
                    let mut found = None;
                    for (k, v) in map {
                        if k == key {
                            found = Some(v);
                        } else {
                            stack.push(v);
                        }
                    }
                    if found.is_some() {
                        return found;
                    }
                }
                Value::Array(items) => stack.extend(items.iter()),
                _ => {}
            }
        }
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment_payload(cid: &str, text: &str, likes: &str, replies: &str) -> Value {
        json!({
            "commentEntityPayload": {
                "properties": {
                    "commentId": cid,
                    "content": { "content": text },
                    "publishedTime": "2 days ago",
                    "toolbarStateKey": format!("state-{}", cid),
                },
                "toolbar": {
                    "likeCountNotliked": likes,
                    "replyCount": replies,
                }
            }
        })
    }

    #[test]
    fn test_search_dict_finds_nested_keys() {
        let data = json!({
            "a": { "target": 1 },
            "b": [ { "c": { "target": 2 } }, { "target": { "target": 3 } } ],
        });
        let mut found: Vec<i64> = search_dict(&data, "target")
            .filter_map(Value::as_i64)
            .collect();
        found.sort();
        // The object under the third match is not descended into.
        assert_eq!(found, vec![1, 2]);
        assert_eq!(search_dict(&data, "target").count(), 3);
    }

    #[test]
    fn test_parse_page_extracts_comments_in_page_order() {
        let response = json!({
            "frameworkUpdates": {
                "entityBatchUpdate": {
                    "mutations": [
                        { "payload": comment_payload("UgxA", "first", "12", "3") },
                        { "payload": comment_payload("UgxA.r1", "a reply", "", "") },
                    ]
                }
            }
        });

        let mut continuations = Vec::new();
        let comments = parse_page(&response, &mut continuations).unwrap();

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].cid, "UgxA");
        assert_eq!(comments[0].text, "first");
        assert_eq!(comments[0].votes, "12");
        assert_eq!(comments[0].replies, "3");
        assert_eq!(comments[0].time, "2 days ago");
        assert!(!comments[0].reply);

        assert_eq!(comments[1].cid, "UgxA.r1");
        assert_eq!(comments[1].votes, "0");
        assert!(comments[1].reply);
        assert!(continuations.is_empty());
    }

    #[test]
    fn test_parse_page_collects_continuations() {
        let response = json!({
            "onResponseReceivedEndpoints": [
                {
                    "reloadContinuationItemsCommand": {
                        "targetId": "comments-section",
                        "continuationItems": [
                            { "continuationItemRenderer": {
                                "continuationEndpoint": { "continuationCommand": { "token": "next-page" } }
                            } }
                        ]
                    }
                },
                {
                    "appendContinuationItemsAction": {
                        "targetId": "comment-replies-item-UgxA",
                        "continuationItems": [
                            { "continuationItemRenderer": {
                                "button": { "buttonRenderer": {
                                    "command": { "continuationCommand": { "token": "more-replies" } }
                                } }
                            } }
                        ]
                    }
                }
            ]
        });

        let mut continuations = vec![json!({ "continuationCommand": { "token": "existing" } })];
        parse_page(&response, &mut continuations).unwrap();

        let tokens: Vec<&str> = continuations
            .iter()
            .filter_map(|c| c.pointer("/continuationCommand/token").and_then(Value::as_str))
            .collect();
        assert_eq!(tokens, vec!["next-page", "existing", "more-replies"]);
    }

    #[test]
    fn test_parse_page_surfaces_server_errors() {
        let response = json!({ "error": { "externalErrorMessage": "Quota exceeded" } });
        let err = parse_page(&response, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, FetchError::Server(ref m) if m == "Quota exceeded"));
    }

    #[test]
    fn test_extracts_page_config() {
        let html = r#"<script>ytcfg.set({"INNERTUBE_API_KEY":"k","INNERTUBE_CONTEXT":{"client":{"hl":"en"}}});</script>
<script>var ytInitialData = {"contents":{"itemSectionRenderer":{}}};</script>"#;

        let cfg = capture_json(&YT_CFG_RE, html).unwrap().unwrap();
        assert_eq!(cfg["INNERTUBE_API_KEY"], "k");

        let data = capture_json(&YT_INITIAL_DATA_RE, html).unwrap().unwrap();
        assert!(data.pointer("/contents/itemSectionRenderer").is_some());
    }

    #[test]
    fn test_sort_menu_lookup() {
        let data = json!({
            "header": { "sortFilterSubMenuRenderer": { "subMenuItems": [
                { "title": "Top comments", "serviceEndpoint": { "continuationCommand": { "token": "top" } } },
                { "title": "Newest first", "serviceEndpoint": { "continuationCommand": { "token": "new" } } },
            ] } }
        });
        let items = sort_menu_items(&data);
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[SORT_BY_POPULAR].pointer("/serviceEndpoint/continuationCommand/token"),
            Some(&json!("top"))
        );
    }
}
