//! In-memory transport that records every URL and replays queued responses
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use alphav_etl::client::AlphaVantage;
use alphav_etl::request::HttpResponse;
use alphav_etl::{Error, Request, Result};

pub const KEY: &str = "test-key";
pub const BASE: &str = "https://www.alphavantage.co/query";

#[derive(Debug, Default)]
struct State {
    responses: VecDeque<HttpResponse>,
    urls: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MockClient {
    state: Arc<Mutex<State>>,
}

impl MockClient {
    /// Queue a response; responses are served in order
    pub fn respond(&self, status: u16, body: impl Into<String>) -> &Self {
        self.state.lock().unwrap().responses.push_back(HttpResponse::new(status, body));
        self
    }

    pub fn ok_json(&self, body: serde_json::Value) -> &Self {
        self.respond(200, body.to_string())
    }

    pub fn urls(&self) -> Vec<String> {
        self.state.lock().unwrap().urls.clone()
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().urls.len()
    }
}

impl Request for MockClient {
    type Response = HttpResponse;

    fn new() -> Self {
        Self::default()
    }

    async fn get(&self, url: &str) -> Result<Self::Response> {
        let mut state = self.state.lock().unwrap();
        state.urls.push(url.to_string());
        state
            .responses
            .pop_front()
            .ok_or_else(|| Error::Transport("connection refused".to_string()))
    }
}

/// A client sharing its transport with the returned mock
pub fn client() -> (AlphaVantage<MockClient>, MockClient) {
    let mock = MockClient::default();
    let client = AlphaVantage::<MockClient>::new(KEY).with_client(mock.clone());
    (client, mock)
}

/// Query parameters of a recorded URL, decoded
pub fn params(url: &str) -> Vec<(String, String)> {
    let query = url.split_once('?').map(|(_, q)| q).unwrap_or("");
    serde_urlencoded::from_str(query).unwrap()
}
