//! Threshold alerts and Telegram delivery

use async_trait::async_trait;
use std::fmt;
use std::time::{Duration, Instant};
use teloxide::prelude::*;
use teloxide::types::Recipient;
use tracing::{debug, info, instrument};

use crate::config::models::TelegramConfig;
use crate::core::error::AppError;
use crate::core::ports::AlertSink;
use crate::core::result::AppResult;

/// An alert raised by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// The watched asset fell by at least the shock threshold between ticks
    MarketShock { symbol: String, change_percent: f64 },
    /// The published risk score reached the alert threshold
    HighRisk { score: f64 },
}

impl Alert {
    /// Metric label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MarketShock { .. } => "market_shock",
            Self::HighRisk { .. } => "high_risk",
        }
    }

    /// Text delivered to the chat
    pub fn message(&self) -> String {
        match self {
            Self::MarketShock {
                symbol,
                change_percent,
            } => format!("⚠️ MARKET SHOCK\n{} dropped {:.2}%", symbol, change_percent),
            Self::HighRisk { score } => format!("⚠️ HIGH RISK\nScore: {:.2}", score),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Cooldown shared by every alert kind
#[derive(Debug, Clone)]
pub struct AlertGate {
    cooldown: Duration,
    last_sent: Option<Instant>,
}

impl AlertGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_sent: None,
        }
    }

    /// Whether an alert may be sent at `now`
    ///
    /// True before the first alert, then only once strictly more than the
    /// cooldown has passed since the last one.
    pub fn allow(&self, now: Instant) -> bool {
        match self.last_sent {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.cooldown,
        }
    }

    /// Remember that an alert went out at `now`
    pub fn record(&mut self, now: Instant) {
        self.last_sent = Some(now);
    }
}

/// Telegram bot notifier
///
/// Without a bot token and chat id every send is a no-op.
#[derive(Clone)]
pub struct TelegramNotifier {
    target: Option<(Bot, Recipient)>,
}

impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Numeric ids address chats directly, anything else is a channel username
pub fn parse_recipient(chat_id: &str) -> Recipient {
    let chat_id = chat_id.trim();
    match chat_id.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) if chat_id.starts_with('@') => Recipient::ChannelUsername(chat_id.to_string()),
        Err(_) => Recipient::ChannelUsername(format!("@{}", chat_id)),
    }
}

impl TelegramNotifier {
    /// Create a notifier from configuration
    pub fn new(config: &TelegramConfig) -> AppResult<Self> {
        if !config.is_enabled() {
            info!("📵 Telegram alerts disabled (no bot token or chat id)");
            return Ok(Self::disabled());
        }

        let mut bot = Bot::new(config.bot_token.trim());
        if let Some(api_url) = &config.api_url {
            let url = url::Url::parse(api_url).map_err(|e| {
                AppError::config(format!("Invalid Telegram API URL '{}': {}", api_url, e))
            })?;
            bot = bot.set_api_url(url);
        }

        info!("📨 Telegram alerts enabled");
        Ok(Self {
            target: Some((bot, parse_recipient(&config.chat_id))),
        })
    }

    /// A notifier that drops every alert
    pub fn disabled() -> Self {
        Self { target: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }
}

#[async_trait]
impl AlertSink for TelegramNotifier {
    #[instrument(skip(self), fields(kind = alert.kind()))]
    async fn send(&self, alert: &Alert) -> AppResult<()> {
        let Some((bot, recipient)) = &self.target else {
            debug!("Telegram disabled, dropping alert: {}", alert.kind());
            return Ok(());
        };

        bot.send_message(recipient.clone(), alert.message())
            .await
            .map_err(|e| AppError::alert(format!("Telegram send failed: {}", e)))?;

        info!("📨 Alert sent: {}", alert.kind());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_alert_messages() {
        let shock = Alert::MarketShock {
            symbol: "SOL".to_string(),
            change_percent: -6.456,
        };
        assert_eq!(shock.message(), "⚠️ MARKET SHOCK\nSOL dropped -6.46%");

        let risk = Alert::HighRisk { score: 31.0 };
        assert_eq!(risk.message(), "⚠️ HIGH RISK\nScore: 31.00");
        assert_eq!(risk.kind(), "high_risk");
    }

    #[test]
    fn test_gate_cooldown_is_strict() {
        let start = Instant::now();
        let mut gate = AlertGate::new(Duration::from_secs(300));

        assert!(gate.allow(start));
        gate.record(start);

        assert!(!gate.allow(start + Duration::from_secs(10)));
        assert!(!gate.allow(start + Duration::from_secs(300)));
        assert!(gate.allow(start + Duration::from_secs(301)));
    }

    #[test]
    fn test_parse_recipient() {
        assert_eq!(parse_recipient("-100123"), Recipient::Id(ChatId(-100123)));
        assert_eq!(
            parse_recipient("@sentra_alerts"),
            Recipient::ChannelUsername("@sentra_alerts".to_string())
        );
        assert_eq!(
            parse_recipient("sentra_alerts"),
            Recipient::ChannelUsername("@sentra_alerts".to_string())
        );
    }

    #[tokio::test]
    async fn test_disabled_notifier_is_noop() {
        let notifier = TelegramNotifier::new(&TelegramConfig::default()).unwrap();
        assert!(!notifier.is_enabled());
        notifier.send(&Alert::HighRisk { score: 99.0 }).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_posts_to_bot_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"(?i)^/botTEST:TOKEN/sendmessage$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": {
                    "message_id": 1,
                    "date": 1700000000,
                    "chat": { "id": 42, "type": "private", "first_name": "ops" },
                    "text": "⚠️ HIGH RISK\nScore: 30.00"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = TelegramConfig {
            bot_token: "TEST:TOKEN".to_string(),
            chat_id: "42".to_string(),
            api_url: Some(server.uri()),
        };
        let notifier = TelegramNotifier::new(&config).unwrap();
        notifier.send(&Alert::HighRisk { score: 30.0 }).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_failure_maps_to_alert_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let config = TelegramConfig {
            bot_token: "TEST:TOKEN".to_string(),
            chat_id: "42".to_string(),
            api_url: Some(server.uri()),
        };
        let result = TelegramNotifier::new(&config)
            .unwrap()
            .send(&Alert::HighRisk { score: 30.0 })
            .await;
        assert!(matches!(result, Err(AppError::Alert { .. })));
    }
}
