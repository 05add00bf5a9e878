pub mod commands;
pub mod dispatcher;
pub mod formatter;
pub mod subscriptions;
pub mod telegram;

pub use dispatcher::AlertDispatcher;
pub use formatter::MessageFormatter;
pub use subscriptions::SubscriptionManager;
pub use telegram::{Notifier, TelegramClient};
