//! HTTP over the browser Fetch API
//!
//! Request building and response inspection are plain Rust and work on
//! every target; only `HttpRequest::send` needs a browser.

use crate::error::ClientResult;
#[cfg(target_arch = "wasm32")]
use crate::error::ClientError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen_futures::JsFuture;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// True for any 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get body as UTF-8 string
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.clone())
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// HTTP request builder
#[derive(Debug, Clone)]
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub struct HttpRequest {
    url: String,
    method: HttpMethod,
    headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
    include_credentials: bool,
}

impl HttpRequest {
    /// Create a new GET request
    pub fn get(url: &str) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Create a new POST request
    pub fn post(url: &str) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn new(method: HttpMethod, url: &str) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: HashMap::new(),
            body: None,
            include_credentials: false,
        }
    }

    /// Add a header
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Serialize `value` as the JSON body
    pub fn json<T: Serialize>(mut self, value: &T) -> ClientResult<Self> {
        let body = serde_json::to_vec(value)?;
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        self.body = Some(body);
        Ok(self)
    }

    /// Send cookies even on cross-origin requests
    pub fn include_credentials(mut self) -> Self {
        self.include_credentials = true;
        self
    }

    /// Execute the request
    #[cfg(target_arch = "wasm32")]
    pub async fn send(self) -> ClientResult<HttpResponse> {
        let window = web_sys::window().ok_or_else(|| ClientError::Unavailable("window".into()))?;

        let opts = web_sys::RequestInit::new();
        opts.set_method(self.method.as_str());
        opts.set_mode(web_sys::RequestMode::Cors);
        if self.include_credentials {
            opts.set_credentials(web_sys::RequestCredentials::Include);
        }

        if let Some(body) = &self.body {
            let uint8_array = js_sys::Uint8Array::from(body.as_slice());
            opts.set_body(&uint8_array);
        }

        let request = web_sys::Request::new_with_str_and_init(&self.url, &opts)
            .map_err(|e| ClientError::Transport(format!("Failed to create request: {:?}", e)))?;

        let headers = request.headers();
        for (name, value) in &self.headers {
            headers
                .set(name, value)
                .map_err(|e| ClientError::Transport(format!("Failed to set header: {:?}", e)))?;
        }

        // Rejects only when the request never completed
        let resp_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| ClientError::Transport(format!("Fetch failed: {:?}", e)))?;

        let resp: web_sys::Response = resp_value
            .dyn_into()
            .map_err(|_| ClientError::Transport("Failed to cast response".into()))?;

        let status = resp.status();
        let status_text = resp.status_text();

        let array_buffer = JsFuture::from(
            resp.array_buffer()
                .map_err(|e| ClientError::Transport(format!("Failed to get body: {:?}", e)))?,
        )
        .await
        .map_err(|e| ClientError::Transport(format!("Failed to read body: {:?}", e)))?;

        let body = js_sys::Uint8Array::new(&array_buffer).to_vec();

        Ok(HttpResponse {
            status,
            status_text,
            body,
        })
    }
}
