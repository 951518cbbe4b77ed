use crate::mapper::Resource;
use log::warn;
use serde::{Deserialize, Deserializer};

/// The `pagination` block of a list response.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub total: u64,
    pub count: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub total_pages: u64,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Links {
    #[serde(default, deserialize_with = "non_empty")]
    pub next: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub prev: Option<String>,
}

fn non_empty<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let s: Option<String> = Option::deserialize(d)?;
    Ok(s.filter(|s| !s.is_empty()))
}

/// One page of mapped resources. Link URLs are informational; fetching them is up to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    items: Vec<Resource>,
    total: u64,
    per_page: u64,
    current_page: u64,
    total_pages: u64,
    next_url: Option<String>,
    prev_url: Option<String>,
}

impl Page {
    pub(crate) fn new(items: Vec<Resource>, pagination: Pagination) -> Self {
        if pagination.count != items.len() as u64 {
            warn!(
                "pagination count {} does not match {} items on page {}",
                pagination.count,
                items.len(),
                pagination.current_page
            );
        }
        Self {
            items,
            total: pagination.total,
            per_page: pagination.per_page,
            current_page: pagination.current_page,
            total_pages: pagination.total_pages,
            next_url: pagination.links.next,
            prev_url: pagination.links.prev,
        }
    }

    pub fn items(&self) -> &[Resource] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Resource> {
        self.items
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Always the number of items actually on this page.
    pub fn count(&self) -> u64 {
        self.items.len() as u64
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    pub fn next_url(&self) -> Option<&str> {
        self.next_url.as_deref()
    }

    pub fn prev_url(&self) -> Option<&str> {
        self.prev_url.as_deref()
    }

    pub fn has_next(&self) -> bool {
        self.next_url.is_some()
    }
}

impl IntoIterator for Page {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Page {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
