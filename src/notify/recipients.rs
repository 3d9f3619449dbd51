use crate::config::SlaConfig;
use crate::database::models::ReferenceRecord;

/// Fixed set of secondary notification channels, one per managing party.
///
/// Replaces a string-keyed lookup: unknown pengelola names simply resolve
/// to no extra channel, never to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKey {
    BgBandung,
    BgCirebon,
    BgTasikmalaya,
    BgSukabumi,
    KejarBandung,
}

impl ChannelKey {
    pub const ALL: [ChannelKey; 5] = [
        ChannelKey::BgBandung,
        ChannelKey::BgCirebon,
        ChannelKey::BgTasikmalaya,
        ChannelKey::BgSukabumi,
        ChannelKey::KejarBandung,
    ];

    /// Suffix of the TELEGRAM_GROUP_ID_* env var carrying this channel's chat id.
    pub fn env_suffix(self) -> &'static str {
        match self {
            ChannelKey::BgBandung => "BGBANDUNG",
            ChannelKey::BgCirebon => "BGCIREBON",
            ChannelKey::BgTasikmalaya => "BGTASIKMALAYA",
            ChannelKey::BgSukabumi => "BGSUKABUMI",
            ChannelKey::KejarBandung => "KEJARBANDUNG",
        }
    }

    /// Map a managing-party name to its channel, normalizing case and
    /// interior whitespace before the comparison.
    pub fn from_pengelola(name: &str) -> Option<Self> {
        let normalized = name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();

        match normalized.as_str() {
            "SENTRALISASI CRO BG BANDUNG" => Some(ChannelKey::BgBandung),
            "SENTRALISASI CRO BG CIREBON" => Some(ChannelKey::BgCirebon),
            "SENTRALISASI CRO BG TASIKMALAYA" => Some(ChannelKey::BgTasikmalaya),
            "SENTRALISASI CRO BG SUKABUMI" => Some(ChannelKey::BgSukabumi),
            "SENTRALISASI CRO KEJAR BANDUNG" => Some(ChannelKey::KejarBandung),
            _ => None,
        }
    }
}

/// Resolve the chat ids a notification for this reference goes to.
///
/// Always the primary broadcast group; additionally the managing party's own
/// group when the pengelola maps to a key with a configured chat id.
pub fn resolve_recipients(reference: &ReferenceRecord, config: &SlaConfig) -> Vec<String> {
    let mut recipients = vec![config.primary_chat_id.clone()];

    if let Some(name) = reference.pengelola.as_deref() {
        if let Some(key) = ChannelKey::from_pengelola(name) {
            if let Some(chat_id) = config.chat_id_for(key) {
                recipients.push(chat_id.to_string());
            }
        }
    }

    recipients
}
