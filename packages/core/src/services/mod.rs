pub mod export;
pub mod mailer;
pub mod mock;
pub mod portal;
pub mod sheets;
pub mod webhook;
