use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{Article, Severity};

/// Filter inputs. Each part is vacuous when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub severities: BTreeSet<Severity>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.source.is_empty() && self.severities.is_empty()
    }

    pub fn matches(&self, article: &Article) -> bool {
        self.matches_search(article) && self.matches_source(article) && self.matches_severity(article)
    }

    fn matches_search(&self, article: &Article) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        article.title.to_lowercase().contains(&needle)
            || article
                .summary
                .as_deref()
                .is_some_and(|summary| summary.to_lowercase().contains(&needle))
    }

    fn matches_source(&self, article: &Article) -> bool {
        self.source.is_empty() || article.source == self.source
    }

    fn matches_severity(&self, article: &Article) -> bool {
        self.severities.is_empty() || self.severities.contains(&article.severity)
    }
}

/// Stable filter: keeps the input order.
pub fn filter<'a>(articles: &'a [Article], criteria: &FilterCriteria) -> Vec<&'a Article> {
    articles.iter().filter(|a| criteria.matches(a)).collect()
}

/// Parses a comma-separated severity list such as `critical,high`. Unknown
/// names are ignored.
pub fn parse_severity_list(value: &str) -> BTreeSet<Severity> {
    value
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .filter_map(|part| part.parse().ok())
        .collect()
}
