use std::sync::{Arc, Mutex};

use techcast::Notifier;

#[derive(Clone, Default)]
pub struct MockNotifier {
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl Notifier for MockNotifier {
    async fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
