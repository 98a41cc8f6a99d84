use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use reqwest::blocking::Client;

use super::{RequestFn, ResponseCallback};
use crate::config::HttpConfig;
use crate::overlay::FeatureCollection;

/// Responses keyed by url. Caller-owned; entries are never evicted.
#[derive(Debug, Clone, Default)]
pub struct ResponseCache {
    entries: Arc<Mutex<HashMap<String, FeatureCollection>>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<FeatureCollection> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }

    pub fn insert(&self, url: impl Into<String>, collection: FeatureCollection) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.into(), collection);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    headers: Vec<(String, String)>,
    cache: Option<ResponseCache>,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            headers: config.headers.clone(),
            cache: config.cache.then(ResponseCache::new),
        })
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }
}

impl RequestFn for HttpFetcher {
    fn request(&self, url: &str, callback: ResponseCallback) {
        if let Some(hit) = self.cache.as_ref().and_then(|cache| cache.get(url)) {
            tracing::debug!(ticket = callback.ticket(), "serving reachability response from cache");
            callback.respond(Some(hit));
            return;
        }

        let client = self.client.clone();
        let headers = self.headers.clone();
        let cache = self.cache.clone();
        let url = url.to_string();
        std::thread::spawn(move || {
            let data = fetch_collection(&client, &url, &headers);
            if let (Some(cache), Some(collection)) = (cache.as_ref(), data.as_ref()) {
                cache.insert(url.as_str(), collection.clone());
            }
            callback.respond(data);
        });
    }
}

fn fetch_collection(
    client: &Client,
    url: &str,
    headers: &[(String, String)],
) -> Option<FeatureCollection> {
    let mut builder = client.get(url);
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let response = match builder.send() {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(%err, "reachability request failed");
            return None;
        }
    };
    if !response.status().is_success() {
        tracing::warn!(status = %response.status(), "reachability service returned an error status");
        return None;
    }
    match response.json::<FeatureCollection>() {
        Ok(collection) => Some(collection),
        Err(err) => {
            tracing::warn!(%err, "failed to parse reachability response");
            None
        }
    }
}
