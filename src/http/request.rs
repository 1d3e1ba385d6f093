//! HTTP request handling
//!
//! `ApiRequest` describes a call independently of reqwest so that it can be
//! rebuilt and replayed after a token refresh.

use crate::config::Config;
use crate::error::{EstateError, Result};
use crate::http::auth::Auth;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use serde::Serialize;

/// Request payload, kept in a replayable form
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    File {
        field: String,
        file_name: String,
        bytes: Vec<u8>,
        mime: Option<String>,
    },
}

/// A call against the marketplace API
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Attach the bearer token and take part in the refresh protocol
    pub authenticated: bool,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            authenticated: true,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Never send a token and never refresh
    pub fn public(mut self) -> Self {
        self.authenticated = false;
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn query_pairs<I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.query.extend(pairs);
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn file(
        mut self,
        field: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        mime: Option<String>,
    ) -> Self {
        self.body = RequestBody::File {
            field: field.into(),
            file_name: file_name.into(),
            bytes,
            mime,
        };
        self
    }

    /// Whether this request is already a replay after a refresh
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }

    /// Build a reqwest request, attaching `token` when the request is authenticated
    pub(crate) fn build(
        &self,
        client: &Client,
        config: &Config,
        token: Option<&str>,
    ) -> Result<reqwest::Request> {
        let url = config.endpoint(&self.path);
        let mut builder = client.request(self.method.clone(), &url);

        if !self.query.is_empty() {
            builder = builder.query(&self.query);
        }

        builder = match &self.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::File {
                field,
                file_name,
                bytes,
                mime,
            } => {
                let mut part = Part::bytes(bytes.clone()).file_name(file_name.clone());
                if let Some(mime) = mime {
                    part = part.mime_str(mime).map_err(EstateError::Http)?;
                }
                builder.multipart(Form::new().part(field.clone(), part))
            }
        };

        if self.authenticated {
            if let Some(token) = token {
                builder = builder.header(AUTHORIZATION, Auth::bearer_token(token));
            }
        }

        builder.build().map_err(EstateError::Http)
    }
}
