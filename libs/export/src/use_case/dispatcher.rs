//! Routes host events to the use cases subscribed to them

use super::{HostEvent, UseCase};
use tracing::debug;

#[derive(Debug, Default)]
pub struct Dispatcher {
    use_cases: Vec<Box<dyn UseCase>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, use_case: Box<dyn UseCase>) {
        debug!(
            use_case = use_case.format_name(),
            triggers = ?use_case.triggers(),
            "Registered use case"
        );
        self.use_cases.push(use_case);
    }

    pub fn use_cases(&self) -> &[Box<dyn UseCase>] {
        &self.use_cases
    }

    pub fn len(&self) -> usize {
        self.use_cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.use_cases.is_empty()
    }

    /// Hand `event` to every subscribed use case, in registration order.
    ///
    /// Returns the number of use cases that handled it.
    pub async fn dispatch(&mut self, event: &HostEvent) -> usize {
        let trigger = event.trigger();
        let mut handled = 0;

        for use_case in self
            .use_cases
            .iter_mut()
            .filter(|use_case| use_case.triggers().contains(&trigger))
        {
            use_case.handle(event).await;
            handled += 1;
        }

        debug!(trigger = %trigger, handled, "Dispatched event");
        handled
    }

    /// Close every stream connection
    pub async fn shutdown(&self) {
        for use_case in &self.use_cases {
            use_case.stream().disconnect().await;
        }
    }
}

impl FromIterator<Box<dyn UseCase>> for Dispatcher {
    fn from_iter<I: IntoIterator<Item = Box<dyn UseCase>>>(iter: I) -> Self {
        let mut dispatcher = Self::new();
        for use_case in iter {
            dispatcher.register(use_case);
        }
        dispatcher
    }
}
