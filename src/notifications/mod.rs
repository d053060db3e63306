pub mod gatekeeper;
pub mod line_notifier;
pub mod message_composer;
pub mod notification_manager;
pub mod notifier;
pub mod telegram_notifier;

pub use gatekeeper::{AlertState, AlertStateEntry, Gatekeeper};
pub use line_notifier::LineNotifier;
pub use message_composer::{ComposedAlert, MessageComposer};
pub use notification_manager::NotificationManager;
pub use notifier::Notifier;
pub use telegram_notifier::TelegramNotifier;
