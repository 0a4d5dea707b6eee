//! Command routing.
//!
//! Inbound text is classified into a command or plain text, then routed through
//! a name-to-handler table built once at startup and read-only afterwards.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::{
        port::MessagingPort,
        types::{Command, IncomingUpdate, Sender, TextMessage},
    },
    responder::format_report,
    Result,
};

pub const START_MESSAGE: &str = "ECHO NULL online.\n\
Use /scan to request a circuitry scan.\n\
Add an optional target, e.g., /scan project launch.\n\
All scans are reports only; tokens stay in environment variables.";

pub const REDIRECT_MESSAGE: &str =
    "Send /scan to run a circuitry scan. Include a focus after the command to anchor the read.";

/// A command handler turns the command's argument string into reply text.
pub type CommandHandler = fn(&str) -> String;

fn start(_args: &str) -> String {
    START_MESSAGE.to_string()
}

fn scan(args: &str) -> String {
    format_report(&normalize_target(args))
}

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn normalize_target(args: &str) -> String {
    args.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A command as Telegram marks it: `/name`, optionally `@addressee`, then arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lowercased, without the leading `/`.
    pub name: String,
    /// Bot username after `@`, if the command was addressed explicitly.
    pub addressee: Option<String>,
    pub args: String,
}

fn is_command_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse `/cmd@botname rest...`, or `None` when the text does not open with a command.
///
/// A command needs at least one `[A-Za-z0-9_]` right after the slash, so `/`,
/// `/ hello` and `/@x` are plain text.
pub fn parse_command(text: &str) -> Option<ParsedCommand> {
    let body = text.strip_prefix('/')?;
    if !body.chars().next().is_some_and(is_command_char) {
        return None;
    }

    let mut parts = body.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim().to_string();

    let (name, addressee) = match first.split_once('@') {
        Some((name, to)) => (name, Some(to.to_string())),
        None => (first, None),
    };

    Some(ParsedCommand {
        name: name.to_lowercase(),
        addressee,
        args,
    })
}

/// Build the transport-neutral update for one inbound text message.
///
/// Returns `None` for commands addressed to a bot other than `bot_username`.
/// Without a known username every addressee is accepted.
pub fn classify(
    chat_id: ChatId,
    sender: Sender,
    text: &str,
    bot_username: Option<&str>,
) -> Option<IncomingUpdate> {
    let Some(parsed) = parse_command(text) else {
        return Some(IncomingUpdate::Text(TextMessage {
            chat_id,
            user_id: sender.user_id,
            username: sender.username,
            text: text.to_string(),
        }));
    };

    if let (Some(to), Some(me)) = (parsed.addressee.as_deref(), bot_username) {
        if !to.eq_ignore_ascii_case(me.trim_start_matches('@')) {
            return None;
        }
    }

    Some(IncomingUpdate::Command(Command {
        chat_id,
        user_id: sender.user_id,
        username: sender.username,
        name: parsed.name,
        args: parsed.args,
    }))
}

/// Cut `text` to at most `max_chars` characters.
pub fn fit_to_limit(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub struct Dispatcher {
    commands: HashMap<&'static str, CommandHandler>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let mut commands: HashMap<&'static str, CommandHandler> = HashMap::new();
        commands.insert("start", start);
        commands.insert("scan", scan);
        Self { commands }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Reply text for an update, or `None` when the command is not registered.
    pub fn reply_for(&self, update: &IncomingUpdate) -> Option<String> {
        match update {
            IncomingUpdate::Command(cmd) => {
                let handler = self.commands.get(cmd.name.as_str())?;
                Some(handler(&cmd.args))
            }
            IncomingUpdate::Text(_) => Some(REDIRECT_MESSAGE.to_string()),
        }
    }

    /// Route one update and send at most one reply through `messenger`.
    ///
    /// Replies longer than the messenger allows are cut to its limit.
    pub async fn handle(
        &self,
        messenger: &dyn MessagingPort,
        update: &IncomingUpdate,
    ) -> Result<Option<MessageRef>> {
        let chat_id = update.chat_id();

        let Some(reply) = self.reply_for(update) else {
            if let IncomingUpdate::Command(cmd) = update {
                debug!(
                    chat_id = chat_id.0,
                    user_id = ?cmd.user_id.map(|u| u.0),
                    command = %cmd.name,
                    "ignoring unknown command"
                );
            }
            return Ok(None);
        };

        match update {
            IncomingUpdate::Command(cmd) => debug!(
                chat_id = chat_id.0,
                user_id = ?cmd.user_id.map(|u| u.0),
                username = cmd.username.as_deref().unwrap_or("unknown"),
                command = %cmd.name,
                "dispatching command"
            ),
            IncomingUpdate::Text(msg) => debug!(
                chat_id = chat_id.0,
                user_id = ?msg.user_id.map(|u| u.0),
                username = msg.username.as_deref().unwrap_or("unknown"),
                "redirecting plain text"
            ),
        }

        let limit = messenger.capabilities().max_message_len;
        let sent = messenger
            .send_text(chat_id, fit_to_limit(&reply, limit))
            .await?;
        Ok(Some(sent))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        domain::{MessageId, UserId},
        errors::Error,
        messaging::types::MessagingCapabilities,
    };

    const BOT: &str = "EchoNullBot";

    struct RecordingMessenger {
        max_message_len: usize,
        sent: Mutex<Vec<(ChatId, String)>>,
    }

    impl Default for RecordingMessenger {
        fn default() -> Self {
            Self::with_limit(4096)
        }
    }

    impl RecordingMessenger {
        fn with_limit(max_message_len: usize) -> Self {
            Self {
                max_message_len,
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<(ChatId, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessagingPort for RecordingMessenger {
        fn capabilities(&self) -> MessagingCapabilities {
            MessagingCapabilities {
                max_message_len: self.max_message_len,
            }
        }

        async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
            let mut sent = self.sent.lock().unwrap();
            sent.push((chat_id, text.to_string()));
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(sent.len() as i32),
            })
        }
    }

    struct FailingMessenger;

    #[async_trait]
    impl MessagingPort for FailingMessenger {
        fn capabilities(&self) -> MessagingCapabilities {
            MessagingCapabilities {
                max_message_len: 4096,
            }
        }

        async fn send_text(&self, _chat_id: ChatId, _text: &str) -> Result<MessageRef> {
            Err(Error::External("telegram error: network down".to_string()))
        }
    }

    fn sender() -> Sender {
        Sender {
            user_id: Some(UserId(7)),
            username: Some("tester".to_string()),
        }
    }

    fn update(text: &str) -> IncomingUpdate {
        classify(ChatId(42), sender(), text, Some(BOT)).unwrap()
    }

    fn first_pattern_line(report: &str) -> String {
        report.lines().nth(2).unwrap().to_string()
    }

    #[test]
    fn parses_command_with_bot_suffix() {
        assert_eq!(
            parse_command("/SCAN@EchoNullBot  project launch "),
            Some(ParsedCommand {
                name: "scan".to_string(),
                addressee: Some("EchoNullBot".to_string()),
                args: "project launch".to_string(),
            })
        );
        assert_eq!(
            parse_command("/start"),
            Some(ParsedCommand {
                name: "start".to_string(),
                addressee: None,
                args: String::new(),
            })
        );
    }

    #[test]
    fn slash_without_command_name_is_plain_text() {
        for text in ["/", "/ hello", "/@x", "//scan", " /scan"] {
            assert_eq!(parse_command(text), None, "input {text:?}");
            assert!(
                matches!(update(text), IncomingUpdate::Text(ref t) if t.text == text),
                "input {text:?}"
            );
        }
    }

    #[test]
    fn classifies_commands_and_text() {
        match update("/scan x") {
            IncomingUpdate::Command(cmd) => {
                assert_eq!(cmd.name, "scan");
                assert_eq!(cmd.args, "x");
                assert_eq!(cmd.user_id, Some(UserId(7)));
                assert_eq!(cmd.username.as_deref(), Some("tester"));
            }
            other => panic!("expected command, got {other:?}"),
        }
        assert!(matches!(update("hello"), IncomingUpdate::Text(t) if t.text == "hello"));
    }

    #[test]
    fn commands_for_other_bots_are_dropped() {
        assert_eq!(
            classify(ChatId(42), sender(), "/start@SomeOtherBot", Some(BOT)),
            None
        );
        assert!(classify(ChatId(42), sender(), "/start@echonullbot", Some(BOT)).is_some());
        assert!(
            classify(ChatId(42), sender(), "/start@EchoNullBot", Some("@EchoNullBot")).is_some()
        );
        // Unknown own username: accept whatever addressee was given.
        assert!(classify(ChatId(42), sender(), "/start@SomeOtherBot", None).is_some());
    }

    #[test]
    fn start_replies_with_onboarding_text() {
        let d = Dispatcher::new();
        assert_eq!(
            d.reply_for(&update("/start")).as_deref(),
            Some(START_MESSAGE)
        );
        // Arguments and repeated calls make no difference.
        assert_eq!(
            d.reply_for(&update("/start again please")).as_deref(),
            Some(START_MESSAGE)
        );
        assert_eq!(
            d.reply_for(&update("/start@EchoNullBot")).as_deref(),
            Some(START_MESSAGE)
        );
    }

    #[test]
    fn plain_text_gets_redirect() {
        let d = Dispatcher::new();
        for text in ["hello", "/", "/ hello"] {
            assert_eq!(
                d.reply_for(&update(text)).as_deref(),
                Some(REDIRECT_MESSAGE),
                "input {text:?}"
            );
        }
    }

    #[test]
    fn scan_without_target_uses_default_anchor() {
        let d = Dispatcher::new();
        let report = d.reply_for(&update("/scan")).unwrap();
        assert_eq!(report.lines().count(), 7);
        assert_eq!(
            first_pattern_line(&report),
            "- Anchor nodes steady; subtle pull toward overextension."
        );
    }

    #[test]
    fn scan_target_is_normalized() {
        let d = Dispatcher::new();
        for text in [
            "/scan project launch",
            "/scan   project \t  launch  ",
            "/Scan@EchoNullBot project launch",
        ] {
            let report = d.reply_for(&update(text)).unwrap();
            assert_eq!(
                first_pattern_line(&report),
                "- Anchor nodes steady around project launch; subtle pull toward overextension.",
                "input {text:?}"
            );
        }
    }

    #[test]
    fn unknown_command_has_no_reply() {
        let d = Dispatcher::new();
        assert!(!d.is_registered("help"));
        assert_eq!(d.reply_for(&update("/help")), None);
        assert_eq!(d.reply_for(&update("/scan,now")), None);
    }

    #[test]
    fn fit_to_limit_counts_chars() {
        assert_eq!(fit_to_limit("abc", 5), "abc");
        assert_eq!(fit_to_limit("abc", 3), "abc");
        assert_eq!(fit_to_limit("äöüß", 2), "äö");
        assert_eq!(fit_to_limit("abc", 0), "");
    }

    #[tokio::test]
    async fn handle_sends_exactly_one_reply_per_update() {
        let d = Dispatcher::new();
        let messenger = RecordingMessenger::default();

        for text in ["/start", "/scan", "/scan project launch", "hello", "/"] {
            let sent = d.handle(&messenger, &update(text)).await.unwrap();
            assert!(sent.is_some(), "input {text:?}");
        }

        let sent = messenger.sent();
        assert_eq!(sent.len(), 5);
        assert!(sent.iter().all(|(chat, _)| *chat == ChatId(42)));
        assert_eq!(sent[0].1, START_MESSAGE);
        assert!(sent[1].1.starts_with("Signal read ("));
        assert!(sent[2].1.contains("around project launch;"));
        assert_eq!(sent[3].1, REDIRECT_MESSAGE);
        assert_eq!(sent[4].1, REDIRECT_MESSAGE);
    }

    #[tokio::test]
    async fn handle_cuts_reply_to_messenger_limit() {
        let d = Dispatcher::new();
        let messenger = RecordingMessenger::with_limit(4096);
        let target = "x".repeat(5000);

        d.handle(&messenger, &update(&format!("/scan {target}")))
            .await
            .unwrap();

        let sent = messenger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.chars().count(), 4096);
        assert!(sent[0].1.starts_with("Signal read ("));
    }

    #[tokio::test]
    async fn handle_skips_unknown_commands() {
        let d = Dispatcher::new();
        let messenger = RecordingMessenger::default();

        let sent = d.handle(&messenger, &update("/unknown arg")).await.unwrap();
        assert_eq!(sent, None);
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn handle_propagates_send_failure() {
        let d = Dispatcher::new();
        let err = d.handle(&FailingMessenger, &update("hello")).await.unwrap_err();
        assert!(matches!(err, Error::External(_)));
    }
}
