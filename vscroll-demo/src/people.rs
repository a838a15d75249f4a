//! The demo dataset.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use vscroll::prelude::*;

const PEOPLE_JSON: &str = include_str!("../people.json");

/// Simulated latency of the page service.
const FETCH_LATENCY: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Person {
    pub id: u32,
    pub name: String,
    pub age: u32,
    pub email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to parse people: {0}")]
    Parse(#[from] serde_json::Error),
}

pub fn load() -> Result<Vec<Person>, LoadError> {
    Ok(serde_json::from_str(PEOPLE_JSON)?)
}

/// Serves pages out of `people` after a short delay.
pub struct PeopleService {
    people: Arc<Vec<Person>>,
}

impl PeopleService {
    pub fn new(people: Vec<Person>) -> Self {
        Self {
            people: Arc::new(people),
        }
    }
}

#[async_trait::async_trait]
impl PageFetcher<Person> for PeopleService {
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<Person>, FetchError> {
        tokio::time::sleep(FETCH_LATENCY).await;
        let start = request.offset();
        if start >= self.people.len() {
            return Err(FetchError::new(format!("{} is out of bounds", request)));
        }
        let end = (start + request.page_size()).min(self.people.len());
        Ok(self.people[start..end].to_vec())
    }
}
