//! Notification rendering and dispatch.
//!
//! Messages are Telegram MarkdownV2: every interpolated field goes through
//! [`escape_markdown_v2`] so reference data containing reserved punctuation
//! cannot break the parse mode.

pub mod recipients;
pub mod telegram;

use async_trait::async_trait;
use chrono_tz::Tz;
use thiserror::Error;

use crate::database::models::{Order, ReferenceRecord};
use crate::lifecycle::to_display_zone;

pub use recipients::{resolve_recipients, ChannelKey};
pub use telegram::TelegramNotifier;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Telegram API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}

/// Outbound messaging seam. Fire-and-forget text delivery to a chat id.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotifyError>;
}

/// Which SLA notice to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Hard threshold crossed, order moved to overdue.
    Escalate,
    /// Soft threshold crossed, one-time heads-up.
    Warn,
}

/// Characters reserved by Telegram MarkdownV2.
const MARKDOWN_V2_RESERVED: &str = r"\_*[]()~`>#+-=|{}.!";

/// Prefix every reserved character with a backslash.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if MARKDOWN_V2_RESERVED.contains(ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Build the notification body for an order.
///
/// Absent tid/lokasi render as neutral placeholders rather than failing;
/// the event time is `created_at` converted to the canonical display zone.
pub fn render(order: &Order, reference: &ReferenceRecord, kind: NoticeKind, tz: Tz) -> String {
    let tid = escape_markdown_v2(reference.tid.as_deref().unwrap_or("unknown"));
    let lokasi = escape_markdown_v2(reference.lokasi.as_deref().unwrap_or("tidak diketahui"));
    let pengelola = escape_markdown_v2(reference.pengelola.as_deref().unwrap_or(""));
    let kanca_supervisi = escape_markdown_v2(reference.kc_supervisi.as_deref().unwrap_or(""));

    let local = to_display_zone(order.created_at, tz);
    let waktu = escape_markdown_v2(&local.format("%H:%M:%S").to_string());
    let tanggal = escape_markdown_v2(&local.format("%d-%m-%Y").to_string());

    match kind {
        NoticeKind::Escalate => format!(
            "*SLA (OUT FLM)*\n\n\
             *Kendala dengan TID:* _{tid}_ di _{lokasi}_ telah *MELEWATI* SLA (OUT FLM)\\.\n\
             *Pengelola:* _{pengelola}_\n\
             *Kanca Supervisi:* _{kanca_supervisi}_\n\
             *Waktu Kejadian:* {waktu} \\| {tanggal}\n\n\
             *TINDAKAN:* Mohon _*SEGERA*_ ditindaklanjuti\\!"
        ),
        NoticeKind::Warn => format!(
            "*SLA (IN FLM)*\n\n\
             *Kendala dengan TID:* _{tid}_ di _{lokasi}_ sudah melebihi 1 jam\\.\n\
             *Pengelola:* _{pengelola}_\n\
             *Kanca Supervisi:* _{kanca_supervisi}_\n\
             *Waktu Kejadian:* {waktu} \\| {tanggal}\n\n\
             *TINDAKAN:* Mohon ditindaklanjuti sebelum melewati SLA\\!"
        ),
    }
}
