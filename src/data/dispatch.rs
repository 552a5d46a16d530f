use super::filter::Selection;

/// Channels a selection change can be announced on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionTopic {
    /// Leaders picked in the scatterplot, for the lexis chart.
    LexisLeaders,
    /// Leaders picked in the lexis chart, for the scatterplot.
    ScatterLeaders,
    /// Legend categories of the timeline.
    Categories,
}

type Callback<K> = Box<dyn FnMut(&Selection<K>)>;

/// Typed callback registry for selection changes.
///
/// Publishing hands the new selection to every callback registered on that
/// topic, synchronously and in registration order.
pub struct SelectionBus<K = String> {
    subscribers: Vec<(SelectionTopic, Callback<K>)>,
}

impl<K> Default for SelectionBus<K> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<K> std::fmt::Debug for SelectionBus<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<K> SelectionBus<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, topic: SelectionTopic, callback: F)
    where
        F: FnMut(&Selection<K>) + 'static,
    {
        self.subscribers.push((topic, Box::new(callback)));
    }

    /// Deliver `selection` to the topic's subscribers; returns how many ran.
    pub fn publish(&mut self, topic: SelectionTopic, selection: &Selection<K>) -> usize {
        let mut notified = 0;
        for (_, callback) in self.subscribers.iter_mut().filter(|(t, _)| *t == topic) {
            callback(selection);
            notified += 1;
        }
        log::trace!("published {topic:?} to {notified} subscribers");
        notified
    }

    pub fn subscriber_count(&self, topic: SelectionTopic) -> usize {
        self.subscribers.iter().filter(|(t, _)| *t == topic).count()
    }
}
