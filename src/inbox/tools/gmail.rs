// SPDX-License-Identifier: MIT

//! Gmail REST tools: fetch unread mail, reply in thread, apply labels
//!
//! Authentication is a bearer access token from configuration. Obtaining
//! and refreshing that token happens outside this crate.

use crate::adk::tool::Tool;
use crate::adk::BoxError;
use crate::inbox::config::GmailConfig;
use async_trait::async_trait;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use once_cell::sync::Lazy;
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Gmail emits URL-safe base64 with or without padding
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const DEFAULT_FETCH_LIMIT: u32 = 20;

// --- Gmail client helper ---

#[derive(Clone)]
pub struct GmailClient {
    client: Client,
    base_url: String,
    user_id: String,
    access_token: String,
}

impl GmailClient {
    pub fn new(config: &GmailConfig) -> Result<Self, BoxError> {
        let access_token = config
            .access_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or("GMAIL_ACCESS_TOKEN must be set")?;

        log::info!(
            "Gmail client: base_url={}, user_id={}",
            config.api_base,
            config.user_id
        );

        Ok(Self {
            client: Client::new(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
            user_id: config.user_id.clone(),
            access_token,
        })
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value, BoxError> {
        let url = format!("{}/users/{}/{}", self.base_url, self.user_id, path);

        let mut req = self
            .client
            .request(method, &url)
            .bearer_auth(&self.access_token)
            .header("Accept", "application/json")
            .query(query);

        if let Some(b) = body {
            req = req.json(&b);
        }

        let resp = req.send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await?;
            return Err(format!("Gmail API error ({}): {}", status, text).into());
        }

        Ok(resp.json().await?)
    }
}

// --- Message helpers ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSummary {
    pub id: String,
    pub thread_id: Option<String>,
    pub subject: String,
    pub sender: String,
    pub snippet: String,
    pub body: String,
}

/// Header value by name, case-insensitive
fn extract_header<'a>(headers: &'a Value, name: &str) -> Option<&'a str> {
    headers.as_array()?.iter().find_map(|h| {
        let header_name = h.get("name")?.as_str()?;
        if header_name.eq_ignore_ascii_case(name) {
            h.get("value")?.as_str()
        } else {
            None
        }
    })
}

fn decode_data(data: &str) -> Option<String> {
    URL_SAFE_LENIENT
        .decode(data.as_bytes())
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

/// Plain-text body: the first `text/plain` part of a multipart payload, or
/// the body of a single-part payload
fn decode_body(payload: &Value) -> String {
    let data = match payload.get("parts").and_then(Value::as_array) {
        Some(parts) => parts
            .iter()
            .filter(|p| p.get("mimeType").and_then(Value::as_str) == Some("text/plain"))
            .find_map(|p| p.pointer("/body/data").and_then(Value::as_str)),
        None => payload.pointer("/body/data").and_then(Value::as_str),
    };
    data.and_then(decode_data).unwrap_or_default()
}

fn parse_message(message: &Value) -> EmailSummary {
    let payload = message.get("payload").cloned().unwrap_or(Value::Null);
    let headers = payload.get("headers").cloned().unwrap_or(Value::Null);
    let text = |v: Option<&Value>| v.and_then(Value::as_str).unwrap_or_default().to_string();

    EmailSummary {
        id: text(message.get("id")),
        thread_id: message
            .get("threadId")
            .and_then(Value::as_str)
            .map(str::to_string),
        subject: extract_header(&headers, "Subject").unwrap_or_default().to_string(),
        sender: extract_header(&headers, "From").unwrap_or_default().to_string(),
        snippet: text(message.get("snippet")),
        body: decode_body(&payload),
    }
}

fn reply_subject(subject: &str) -> String {
    if subject.to_lowercase().starts_with("re:") {
        subject.to_string()
    } else {
        format!("Re: {}", subject)
    }
}

/// Plain-text RFC 822 reply, URL-safe base64 encoded for the `raw` field
fn build_reply_raw(to: &str, subject: &str, in_reply_to: &str, text: &str) -> String {
    let message = format!(
        "To: {}\r\nSubject: {}\r\nIn-Reply-To: {}\r\nReferences: {}\r\n\
         MIME-Version: 1.0\r\nContent-Type: text/plain; charset=\"utf-8\"\r\n\r\n{}",
        to, subject, in_reply_to, in_reply_to, text
    );
    URL_SAFE_LENIENT.encode(message.as_bytes())
}

// --- Fetch Unread Emails Tool ---

static FETCH_UNREAD_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "limit": {
                "type": "integer",
                "description": "Maximum number of emails to fetch (default 20)"
            }
        }
    })
});

#[derive(Debug, Default, Deserialize)]
pub struct FetchUnreadArgs {
    #[serde(default)]
    pub limit: Option<u32>,
}

pub struct FetchUnreadEmailsTool {
    client: GmailClient,
}

#[async_trait]
impl Tool for FetchUnreadEmailsTool {
    fn name(&self) -> &str {
        "fetch_unread_emails"
    }

    fn description(&self) -> &str {
        "Fetches unread emails from the Gmail inbox. Returns id, thread_id, subject, sender, snippet and plain-text body for each."
    }

    fn schema(&self) -> &Value {
        &FETCH_UNREAD_SCHEMA
    }

    async fn execute(&self, input: Value) -> Result<Value, BoxError> {
        let args: FetchUnreadArgs = if input.is_null() {
            FetchUnreadArgs::default()
        } else {
            serde_json::from_value(input)?
        };
        let limit = args.limit.unwrap_or(DEFAULT_FETCH_LIMIT).max(1);

        let listing = self
            .client
            .request(
                Method::GET,
                "messages",
                &[
                    ("labelIds", "INBOX".to_string()),
                    ("q", "is:unread".to_string()),
                    ("maxResults", limit.to_string()),
                ],
                None,
            )
            .await?;

        let ids: Vec<&str> = listing
            .get("messages")
            .and_then(Value::as_array)
            .map(|msgs| msgs.iter().filter_map(|m| m.get("id")?.as_str()).collect())
            .unwrap_or_default();

        let mut emails = Vec::with_capacity(ids.len());
        for id in ids {
            let message = self
                .client
                .request(
                    Method::GET,
                    &format!("messages/{}", id),
                    &[("format", "full".to_string())],
                    None,
                )
                .await?;
            emails.push(parse_message(&message));
        }

        log::info!("Fetched {} unread emails", emails.len());
        Ok(json!({ "emails": emails }))
    }
}

// --- Send Reply Tool ---

static SEND_REPLY_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "email_id": {
                "type": "string",
                "description": "Gmail message ID of the email to reply to"
            },
            "reply_text": {
                "type": "string",
                "description": "Plain-text content of the reply"
            }
        },
        "required": ["email_id", "reply_text"]
    })
});

#[derive(Debug, Deserialize)]
pub struct SendReplyArgs {
    pub email_id: String,
    pub reply_text: String,
}

pub struct SendReplyTool {
    client: GmailClient,
}

#[async_trait]
impl Tool for SendReplyTool {
    fn name(&self) -> &str {
        "send_reply"
    }

    fn description(&self) -> &str {
        "Sends a plain-text reply to a specific email, in the same thread, addressed to its original sender."
    }

    fn schema(&self) -> &Value {
        &SEND_REPLY_SCHEMA
    }

    async fn execute(&self, input: Value) -> Result<Value, BoxError> {
        let args: SendReplyArgs = serde_json::from_value(input)?;

        let original = self
            .client
            .request(
                Method::GET,
                &format!("messages/{}", args.email_id),
                &[
                    ("format", "metadata".to_string()),
                    ("metadataHeaders", "Subject".to_string()),
                    ("metadataHeaders", "From".to_string()),
                    ("metadataHeaders", "To".to_string()),
                ],
                None,
            )
            .await?;

        let headers = original.pointer("/payload/headers").cloned().unwrap_or(Value::Null);
        let subject = reply_subject(extract_header(&headers, "Subject").unwrap_or_default());
        let to = extract_header(&headers, "From").unwrap_or_default();
        let message_id = original
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or(args.email_id.as_str());

        let raw = build_reply_raw(to, &subject, message_id, &args.reply_text);
        let sent = self
            .client
            .request(
                Method::POST,
                "messages/send",
                &[],
                Some(json!({ "raw": raw, "threadId": original.get("threadId") })),
            )
            .await?;

        log::info!("Reply sent to {} for email {}", to, args.email_id);
        Ok(json!({
            "status": "sent",
            "id": sent.get("id"),
            "thread_id": sent.get("threadId"),
        }))
    }
}

// --- Apply Label Tool ---

static APPLY_LABEL_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "email_id": {
                "type": "string",
                "description": "Gmail message ID of the email"
            },
            "label": {
                "type": "string",
                "description": "Label name to apply (e.g. Client, Billing, Personal, Spam)"
            }
        },
        "required": ["email_id", "label"]
    })
});

#[derive(Debug, Deserialize)]
pub struct ApplyLabelArgs {
    pub email_id: String,
    pub label: String,
}

pub struct ApplyLabelTool {
    client: GmailClient,
}

impl ApplyLabelTool {
    /// Id of the label named `name`, created if it does not exist yet
    async fn ensure_label(&self, name: &str) -> Result<String, BoxError> {
        let listing = self.client.request(Method::GET, "labels", &[], None).await?;
        let existing = listing
            .get("labels")
            .and_then(Value::as_array)
            .and_then(|labels| {
                labels
                    .iter()
                    .find(|l| l.get("name").and_then(Value::as_str) == Some(name))
            })
            .and_then(|l| l.get("id").and_then(Value::as_str));

        if let Some(id) = existing {
            return Ok(id.to_string());
        }

        log::info!("Creating Gmail label {}", name);
        let created = self
            .client
            .request(
                Method::POST,
                "labels",
                &[],
                Some(json!({
                    "name": name,
                    "labelListVisibility": "labelShow",
                    "messageListVisibility": "show",
                })),
            )
            .await?;
        created
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| "Missing id in created label".into())
    }
}

#[async_trait]
impl Tool for ApplyLabelTool {
    fn name(&self) -> &str {
        "apply_label"
    }

    fn description(&self) -> &str {
        "Applies a label to a specific email, creating the label first if it does not exist."
    }

    fn schema(&self) -> &Value {
        &APPLY_LABEL_SCHEMA
    }

    async fn execute(&self, input: Value) -> Result<Value, BoxError> {
        let args: ApplyLabelArgs = serde_json::from_value(input)?;
        let label_id = self.ensure_label(&args.label).await?;

        let updated = self
            .client
            .request(
                Method::POST,
                &format!("messages/{}/modify", args.email_id),
                &[],
                Some(json!({ "addLabelIds": [label_id], "removeLabelIds": [] })),
            )
            .await?;

        Ok(json!({
            "status": "labeled",
            "email_id": args.email_id,
            "label": args.label,
            "label_ids": updated.get("labelIds"),
        }))
    }
}

/// The three mailbox tools, sharing one client
pub fn create_tools(config: &GmailConfig) -> Result<Vec<Arc<dyn Tool>>, BoxError> {
    let client = GmailClient::new(config)?;
    Ok(vec![
        Arc::new(FetchUnreadEmailsTool {
            client: client.clone(),
        }),
        Arc::new(SendReplyTool {
            client: client.clone(),
        }),
        Arc::new(ApplyLabelTool { client }),
    ])
}
