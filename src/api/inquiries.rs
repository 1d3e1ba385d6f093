//! Inquiry inbox and thread endpoints

use crate::error::Result;
use crate::http::{ApiClient, ApiRequest};
use crate::models::{
    Inquiry, InquiryStatus, InquiryThread, Message, MessageFrom, TimelineEvent, TimelineKind,
};
use log::debug;
use serde_json::{json, Value};

/// Inbox filters; unset fields are not sent
#[derive(Debug, Clone, Default)]
pub struct InquiryFilter {
    pub search: Option<String>,
    pub status: Option<InquiryStatus>,
}

#[derive(Clone)]
pub struct InquiriesApi {
    client: ApiClient,
}

impl InquiriesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &InquiryFilter) -> Result<Vec<Inquiry>> {
        let mut request = ApiRequest::get("/inquiries");
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            request = request.query("search", search);
        }
        if let Some(status) = filter.status {
            request = request.query("status", status.as_str());
        }
        let inquiries: Option<Vec<Inquiry>> = self.client.fetch(request).await?;
        Ok(inquiries.unwrap_or_default())
    }

    pub async fn get(&self, id: &str) -> Result<Inquiry> {
        self.client
            .fetch(ApiRequest::get(format!("/inquiries/{}", id)))
            .await
    }

    pub async fn messages(&self, id: &str) -> Result<Vec<Message>> {
        let messages: Option<Vec<Message>> = self
            .client
            .fetch(ApiRequest::get(messages_path(id)))
            .await?;
        Ok(messages.unwrap_or_default())
    }

    /// Post a buyer message to the thread
    pub async fn send_message(&self, id: &str, text: &str) -> Result<Message> {
        let text = text.trim();
        let request =
            ApiRequest::post(messages_path(id)).json(&json!({ "from": "buyer", "text": text }))?;
        self.client.fetch(request).await
    }

    pub async fn timeline(&self, id: &str) -> Result<Vec<TimelineEvent>> {
        let events: Option<Vec<TimelineEvent>> = self
            .client
            .fetch(ApiRequest::get(timeline_path(id)))
            .await?;
        Ok(events.unwrap_or_default())
    }

    pub async fn add_timeline(
        &self,
        id: &str,
        kind: TimelineKind,
        title: &str,
        meta: Option<Value>,
    ) -> Result<TimelineEvent> {
        let request = ApiRequest::post(timeline_path(id))
            .json(&json!({ "kind": kind, "title": title, "meta": meta }))?;
        self.client.fetch(request).await
    }

    /// Header, messages and timeline of an inquiry.
    ///
    /// Messages and timeline are optional on the backend. When either call
    /// fails the thread is synthesized from the inquiry header instead. An
    /// expired session is never papered over.
    pub async fn thread(&self, id: &str) -> Result<InquiryThread> {
        let inquiry = self.get(id).await?;
        let (messages, timeline) =
            futures_util::future::join(self.messages(id), self.timeline(id)).await;

        let messages = match messages {
            Ok(messages) => messages,
            Err(err) if err.is_session_expired() => return Err(err),
            Err(err) => {
                debug!("Messages unavailable for inquiry {}: {}", id, err);
                fallback_messages(&inquiry)
            }
        };
        let timeline = match timeline {
            Ok(timeline) => timeline,
            Err(err) if err.is_session_expired() => return Err(err),
            Err(err) => {
                debug!("Timeline unavailable for inquiry {}: {}", id, err);
                fallback_timeline(&inquiry)
            }
        };

        Ok(InquiryThread {
            inquiry,
            messages,
            timeline,
        })
    }
}

fn messages_path(id: &str) -> String {
    format!("/inquiries/{}/messages", id)
}

fn timeline_path(id: &str) -> String {
    format!("/inquiries/{}/timeline", id)
}

fn fallback_messages(inquiry: &Inquiry) -> Vec<Message> {
    inquiry
        .initial_message
        .iter()
        .map(|text| Message {
            id: "initial".to_string(),
            from: MessageFrom::Buyer,
            text: text.clone(),
            at: inquiry.created_at.clone(),
        })
        .collect()
}

fn fallback_timeline(inquiry: &Inquiry) -> Vec<TimelineEvent> {
    let status = inquiry.status.map(|s| s.as_str()).unwrap_or("unknown");
    vec![
        TimelineEvent {
            id: "t-open".to_string(),
            kind: TimelineKind::Status,
            title: "Inquiry opened".to_string(),
            at: inquiry.created_at.clone(),
            meta: None,
        },
        TimelineEvent {
            id: "t-status".to_string(),
            kind: TimelineKind::Status,
            title: format!("Status: {}", status),
            at: inquiry.updated_at.clone().or_else(|| inquiry.created_at.clone()),
            meta: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::{fallback_messages, fallback_timeline};
    use crate::models::{Inquiry, InquiryStatus, MessageFrom, PropertyRef};

    fn inquiry() -> Inquiry {
        Inquiry {
            id: "q1".to_string(),
            property: PropertyRef::Id("p1".to_string()),
            inquirer_name: Some("Ada".to_string()),
            inquirer_email: None,
            initial_message: Some("Still available?".to_string()),
            status: Some(InquiryStatus::Assigned),
            assigned_to: None,
            created_at: Some("2024-01-01T00:00:00Z".to_string()),
            updated_at: None,
        }
    }

    #[test]
    fn fallback_thread_starts_with_initial_message() {
        let messages = fallback_messages(&inquiry());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].from, MessageFrom::Buyer);
        assert_eq!(messages[0].text, "Still available?");
    }

    #[test]
    fn fallback_timeline_reports_status() {
        let timeline = fallback_timeline(&inquiry());
        assert_eq!(timeline[1].title, "Status: assigned");
        assert_eq!(timeline[1].at.as_deref(), Some("2024-01-01T00:00:00Z"));
    }
}
