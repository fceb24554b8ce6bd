//! Entity extraction from free-text questions
//!
//! Each axis (time window, target metric) is classified by an ordered table of
//! phrase rules. The question is lowercased and the first rule whose phrase is
//! a substring wins; when nothing matches the axis falls back to its default.
//! Both classifications are total.

use crate::models::{TargetMetric, TimeWindow};

/// Ordered phrase → value rules with a fallback
#[derive(Debug, Clone)]
pub struct KeywordTable<T> {
    rules: Vec<(String, T)>,
    fallback: T,
}

impl<T: Copy> KeywordTable<T> {
    pub fn new(fallback: T) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// Append a rule. Rules are evaluated in insertion order.
    pub fn with_rule(mut self, phrase: &str, value: T) -> Self {
        self.push(phrase, value);
        self
    }

    pub fn push(&mut self, phrase: &str, value: T) {
        let phrase = phrase.trim().to_lowercase();
        if !phrase.is_empty() {
            self.rules.push((phrase, value));
        }
    }

    /// First matching rule's value, or the fallback.
    ///
    /// `text` must already be lowercased.
    pub fn classify(&self, text: &str) -> T {
        self.rules
            .iter()
            .find(|(phrase, _)| text.contains(phrase.as_str()))
            .map(|(_, value)| *value)
            .unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> T {
        self.fallback
    }

    pub fn rules(&self) -> &[(String, T)] {
        &self.rules
    }
}

/// Built-in time window rules
pub fn default_time_table() -> KeywordTable<TimeWindow> {
    KeywordTable::new(TimeWindow::All)
        .with_rule("today", TimeWindow::Today)
        .with_rule("now", TimeWindow::Today)
        .with_rule("yesterday", TimeWindow::Yesterday)
        .with_rule("this week", TimeWindow::ThisWeek)
        .with_rule("this month", TimeWindow::ThisMonth)
        .with_rule("this year", TimeWindow::ThisYear)
}

/// Built-in target metric rules
pub fn default_metric_table() -> KeywordTable<TargetMetric> {
    KeywordTable::new(TargetMetric::Profit)
        .with_rule("capital", TargetMetric::Capital)
        .with_rule("loss", TargetMetric::Loss)
        .with_rule("deficit", TargetMetric::Loss)
        .with_rule("profit", TargetMetric::Profit)
        .with_rule("gain", TargetMetric::Profit)
        .with_rule("earnings", TargetMetric::Profit)
}

/// Maps question text to a (TimeWindow, TargetMetric) pair
#[derive(Debug, Clone)]
pub struct EntityExtractor {
    time: KeywordTable<TimeWindow>,
    metric: KeywordTable<TargetMetric>,
}

impl EntityExtractor {
    pub fn new() -> Self {
        Self {
            time: default_time_table(),
            metric: default_metric_table(),
        }
    }

    /// Append extra phrases after the built-in rules
    pub fn with_extra_phrases<'a, I, J>(mut self, time: I, metric: J) -> Self
    where
        I: IntoIterator<Item = (&'a str, TimeWindow)>,
        J: IntoIterator<Item = (&'a str, TargetMetric)>,
    {
        for (phrase, window) in time {
            self.time.push(phrase, window);
        }
        for (phrase, target) in metric {
            self.metric.push(phrase, target);
        }
        self
    }

    pub fn extract(&self, text: &str) -> (TimeWindow, TargetMetric) {
        let text = text.to_lowercase();
        (self.time.classify(&text), self.metric.classify(&text))
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}
