use std::collections::HashSet;

/// Lifecycle statuses handled when no override is configured.
pub const DEFAULT_WHITELIST: [&str; 13] = [
    "create",
    "destroy",
    "die",
    "exec_create",
    "exec_start",
    "export",
    "kill",
    "oom",
    "pause",
    "restart",
    "start",
    "stop",
    "unpause",
];

/// The closed set of lifecycle statuses the monitor reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    statuses: HashSet<String>,
}

impl EventFilter {
    /// Creates a filter handling exactly `statuses`, or [`DEFAULT_WHITELIST`] if the list
    /// is empty. Blank entries are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// # use creo_stats::monitor::EventFilter;
    /// let filter = EventFilter::new(["start", " die "]);
    /// assert!(filter.handles("die"));
    /// assert!(!filter.handles("stop"));
    ///
    /// let filter = EventFilter::new(Vec::<String>::new());
    /// assert!(filter.handles("stop"));
    /// ```
    pub fn new<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let statuses: HashSet<String> = statuses
            .into_iter()
            .map(|s| s.as_ref().trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
        if statuses.is_empty() {
            return Self::default();
        }

        Self { statuses }
    }

    pub fn handles(&self, status: &str) -> bool {
        self.statuses.contains(status)
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            statuses: DEFAULT_WHITELIST.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

/// Returns the counter name reported for a lifecycle status.
///
/// Only the first character is upper-cased: `exec_create` becomes `Container.Exec_create`.
pub fn notification_name(status: &str) -> String {
    let mut chars = status.chars();
    match chars.next() {
        Some(first) => format!("Container.{}{}", first.to_uppercase(), chars.as_str()),
        None => "Container.".to_owned(),
    }
}
