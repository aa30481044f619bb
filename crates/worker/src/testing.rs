//! Scripted network for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sitecache_client::Network;
use sitecache_core::{Error, Request, Response};
use url::Url;

pub const ORIGIN: &str = "http://localhost:8080";

pub fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

pub fn get(path: &str) -> Request {
    Request::get(url(path))
}

#[derive(Clone)]
enum Reply {
    Respond(Response),
    Fail,
}

/// Network double: URLs without a scripted reply fail as if offline.
#[derive(Default)]
pub struct MockNetwork {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
    total: AtomicUsize,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, target: &str, status: u16, body: &'static str) {
        let key = Self::key(target);
        self.replies.lock().unwrap().insert(key, Reply::Respond(Response::new(status, body)));
    }

    pub fn fail(&self, target: &str) {
        let key = Self::key(target);
        self.replies.lock().unwrap().insert(key, Reply::Fail);
    }

    /// Total number of fetches performed.
    pub fn calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Number of fetches for one path or URL.
    pub fn calls_to(&self, target: &str) -> usize {
        let key = Self::key(target);
        self.calls.lock().unwrap().iter().filter(|u| **u == key).count()
    }

    fn key(target: &str) -> String {
        match Url::parse(target) {
            Ok(absolute) => absolute.to_string(),
            Err(_) => url(target).to_string(),
        }
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let key = request.url.to_string();
        self.total.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(key.clone());

        let reply = self.replies.lock().unwrap().get(&key).cloned();
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail) | None => Err(Error::Network(format!("offline: {key}"))),
        }
    }
}
