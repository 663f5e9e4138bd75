//! Debounced directory lookup
//!
//! Every keystroke bumps a generation counter. A lookup fires once the text
//! has been stable for the debounce window, and its results are only applied
//! if no newer query arrived meanwhile. Superseded requests are not aborted,
//! their results are dropped.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::AdminResult;
use crate::models::{normalize_email, DirectoryUser};
use crate::store::DirectorySearch;

/// One directory round trip, with the result cleanup every caller wants
#[derive(Clone)]
pub struct DirectoryLookup {
    directory: Arc<dyn DirectorySearch>,
    page_size: usize,
}

impl DirectoryLookup {
    pub fn new(directory: Arc<dyn DirectorySearch>, page_size: usize) -> Self {
        Self {
            directory,
            page_size,
        }
    }

    /// Whitespace-only text returns nothing without calling the directory.
    /// Entries without an email are dropped and emails lower-cased.
    pub async fn search(&self, text: &str) -> AdminResult<Vec<DirectoryUser>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let hits = self.directory.search(text, self.page_size).await?;
        let mut seen = HashSet::new();
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                let email = normalize_email(&hit.email);
                if email.is_empty() || !seen.insert(email.clone()) {
                    return None;
                }
                let name = if hit.name.trim().is_empty() {
                    email.clone()
                } else {
                    hit.name
                };
                Some(DirectoryUser { name, email })
            })
            .collect())
    }
}

/// What a suggestion box shows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionState {
    pub query: String,
    pub results: Vec<DirectoryUser>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Debounced, last-write-wins suggestions for one input
pub struct UserAutocomplete {
    lookup: DirectoryLookup,
    debounce: Duration,
    generation: Arc<AtomicU64>,
    state: Arc<watch::Sender<SuggestionState>>,
}

impl UserAutocomplete {
    pub fn new(lookup: DirectoryLookup, debounce: Duration) -> Self {
        let (tx, _rx) = watch::channel(SuggestionState::default());
        Self {
            lookup,
            debounce,
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SuggestionState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> SuggestionState {
        self.state.borrow().clone()
    }

    /// Record new input text. Returns the scheduled lookup, if one was needed.
    pub fn set_query(&self, text: &str) -> Option<JoinHandle<()>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if text.trim().is_empty() {
            self.state.send_modify(|state| {
                state.query = text.to_string();
                state.results.clear();
                state.loading = false;
                state.error = None;
            });
            return None;
        }

        self.state.send_modify(|state| state.query = text.to_string());

        let lookup = self.lookup.clone();
        let latest = self.generation.clone();
        let state = self.state.clone();
        let debounce = self.debounce;
        let query = text.trim().to_string();

        Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if latest.load(Ordering::SeqCst) != generation {
                // Replaced before the timer fired
                return;
            }

            state.send_modify(|s| s.loading = true);
            let result = lookup.search(&query).await;

            if latest.load(Ordering::SeqCst) != generation {
                tracing::debug!(query = %query, "Dropping stale directory results");
                return;
            }
            state.send_modify(|s| {
                s.loading = false;
                match result {
                    Ok(results) => {
                        s.results = results;
                        s.error = None;
                    }
                    Err(err) => {
                        tracing::error!(query = %query, error = %err, "Directory lookup failed");
                        s.results.clear();
                        s.error = Some(err.user_message());
                    }
                }
            });
        }))
    }

    /// Drop the suggestions but keep the text
    pub fn clear_results(&self) {
        self.state.send_modify(|state| state.results.clear());
    }

    /// Back to an empty input; in-flight lookups become stale
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(SuggestionState::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StaticDirectory;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// Directory where shorter queries answer more slowly
    struct SlowDirectory {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DirectorySearch for SlowDirectory {
        async fn search(&self, text: &str, _limit: usize) -> AdminResult<Vec<DirectoryUser>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = if text.len() == 1 { 2_000 } else { 100 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(vec![DirectoryUser::new(format!("Result {}", text), &format!("{}@acme.com", text))])
        }
    }

    fn autocomplete(directory: Arc<dyn DirectorySearch>) -> UserAutocomplete {
        UserAutocomplete::new(DirectoryLookup::new(directory, 25), Duration::from_millis(350))
    }

    #[tokio::test]
    async fn test_blank_query_short_circuits() {
        let directory = Arc::new(SlowDirectory {
            calls: AtomicUsize::new(0),
        });
        let lookup = DirectoryLookup::new(directory.clone(), 25);
        assert!(lookup.search("   ").await.unwrap().is_empty());
        assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_results_drop_missing_emails_and_lowercase() {
        let directory = Arc::new(StaticDirectory::new([
            DirectoryUser {
                name: "Ana".to_string(),
                email: "Ana@ACME.com".to_string(),
            },
            DirectoryUser {
                name: "Anonymous".to_string(),
                email: String::new(),
            },
        ]));
        let hits = DirectoryLookup::new(directory, 25).search("an").await.unwrap();
        assert_eq!(hits, vec![DirectoryUser::new("Ana", "ana@acme.com")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_within_debounce_sends_one_request() {
        let directory = Arc::new(SlowDirectory {
            calls: AtomicUsize::new(0),
        });
        let ac = autocomplete(directory.clone());

        let first = ac.set_query("a").unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = ac.set_query("ab").unwrap();

        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(directory.calls.load(Ordering::SeqCst), 1);
        assert_eq!(ac.current().results[0].email, "ab@acme.com");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_stale_response_is_ignored() {
        let directory = Arc::new(SlowDirectory {
            calls: AtomicUsize::new(0),
        });
        let ac = autocomplete(directory.clone());

        // "a" fires and takes two seconds to answer
        let first = ac.set_query("a").unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        // "ab" fires later but answers first
        let second = ac.set_query("ab").unwrap();

        second.await.unwrap();
        assert_eq!(ac.current().results[0].email, "ab@acme.com");

        first.await.unwrap();
        assert_eq!(directory.calls.load(Ordering::SeqCst), 2);
        let state = ac.current();
        assert_eq!(state.results.len(), 1);
        assert_eq!(state.results[0].email, "ab@acme.com");
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_clearing_the_input_clears_results() {
        let ac = autocomplete(Arc::new(StaticDirectory::default()));
        assert!(ac.set_query("   ").is_none());
        assert!(ac.current().results.is_empty());
    }
}
