//! Line-oriented command protocol.
//!
//! One request per line: `<user_key> <command> [args...]`. Every request
//! produces one JSON response; the chat layer turns those into prose.

use serde::Serialize;
use serde_json::Value;
use tavern_domain::{DomainError, UserKey};

use crate::app::App;
use crate::entities::SheetError;
use crate::infrastructure::rate_limit::RateDecision;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Roll { expression: String },
    Coin { amount: i64, denomination: String },
    Balance,
    Hp { delta: i64 },
    TempHp { amount: i64 },
    HitDice { count: i64 },
    ShortRest,
    LongRest,
    Get { path: String },
    Set { path: String, value: String },
    Delete { path: String },
    Import { raw: String },
    Export,
    /// A conversational mention; only the mention limiter applies.
    Mention,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Roll { .. } => "roll",
            Self::Coin { .. } => "coin",
            Self::Balance => "balance",
            Self::Hp { .. } => "hp",
            Self::TempHp { .. } => "temphp",
            Self::HitDice { .. } => "hd",
            Self::ShortRest => "sr",
            Self::LongRest => "lr",
            Self::Get { .. } => "get",
            Self::Set { .. } => "set",
            Self::Delete { .. } => "del",
            Self::Import { .. } => "import",
            Self::Export => "export",
            Self::Mention => "mention",
        }
    }
}

/// A parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub user: UserKey,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandParseError {
    #[error("Empty line")]
    Empty,
    #[error("Missing command after user key")]
    MissingCommand,
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("{command} needs <{argument}>")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("Not a whole number for <{argument}>: '{value}'")]
    InvalidNumber {
        argument: &'static str,
        value: String,
    },
    #[error(transparent)]
    InvalidUserKey(#[from] DomainError),
}

/// Split off the first whitespace-delimited word.
fn next_word(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    Some(match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (input, ""),
    })
}

fn required<'a>(
    rest: &'a str,
    command: &'static str,
    argument: &'static str,
) -> Result<(&'a str, &'a str), CommandParseError> {
    next_word(rest).ok_or(CommandParseError::MissingArgument { command, argument })
}

/// Everything left on the line, which must be non-empty.
fn remainder(
    rest: &str,
    command: &'static str,
    argument: &'static str,
) -> Result<String, CommandParseError> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Err(CommandParseError::MissingArgument { command, argument });
    }
    Ok(rest.to_string())
}

fn number(value: &str, argument: &'static str) -> Result<i64, CommandParseError> {
    value.parse().map_err(|_| CommandParseError::InvalidNumber {
        argument,
        value: value.to_string(),
    })
}

pub fn parse_line(line: &str) -> Result<CommandLine, CommandParseError> {
    let (user, rest) = next_word(line).ok_or(CommandParseError::Empty)?;
    let user = UserKey::new(user)?;
    let (name, rest) = next_word(rest).ok_or(CommandParseError::MissingCommand)?;

    let command = match name.to_ascii_lowercase().as_str() {
        "roll" | "r" => Command::Roll {
            expression: remainder(rest, "roll", "expression")?,
        },
        "coin" => {
            let (amount, rest) = required(rest, "coin", "amount")?;
            let (denomination, _) = required(rest, "coin", "denomination")?;
            Command::Coin {
                amount: number(amount, "amount")?,
                denomination: denomination.to_string(),
            }
        }
        "balance" => Command::Balance,
        "hp" => {
            let (delta, _) = required(rest, "hp", "delta")?;
            Command::Hp {
                delta: number(delta, "delta")?,
            }
        }
        "temphp" => {
            let (amount, _) = required(rest, "temphp", "amount")?;
            Command::TempHp {
                amount: number(amount, "amount")?,
            }
        }
        "hd" => {
            let (count, _) = required(rest, "hd", "count")?;
            Command::HitDice {
                count: number(count, "count")?,
            }
        }
        "sr" => Command::ShortRest,
        "lr" => Command::LongRest,
        "get" => Command::Get {
            path: required(rest, "get", "path")?.0.to_string(),
        },
        "set" => {
            let (path, rest) = required(rest, "set", "path")?;
            Command::Set {
                path: path.to_string(),
                value: remainder(rest, "set", "value")?,
            }
        }
        "del" => Command::Delete {
            path: required(rest, "del", "path")?.0.to_string(),
        },
        "import" => Command::Import {
            raw: remainder(rest, "import", "json")?,
        },
        "export" => Command::Export,
        "mention" => Command::Mention,
        other => return Err(CommandParseError::UnknownCommand(other.to_string())),
    };

    Ok(CommandLine { user, command })
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<f64>,
}

/// One JSON line of output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub seq: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<&'static str>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    fn success(seq: u64, line: &CommandLine, result: Value) -> Self {
        Self {
            seq,
            user: Some(line.user.to_string()),
            command: Some(line.command.name()),
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    fn failure(seq: u64, line: Option<&CommandLine>, error: ErrorBody) -> Self {
        Self {
            seq,
            user: line.map(|l| l.user.to_string()),
            command: line.map(|l| l.command.name()),
            ok: false,
            result: None,
            error: Some(error),
        }
    }

    /// Response for a line that did not parse.
    pub fn bad_command(seq: u64, error: &CommandParseError) -> Self {
        Self::failure(
            seq,
            None,
            ErrorBody {
                kind: "bad_command",
                message: error.to_string(),
                retry_after_secs: None,
            },
        )
    }
}

fn to_value<T: Serialize>(result: Result<T, SheetError>) -> Result<Value, SheetError> {
    result.and_then(|value| {
        serde_json::to_value(value).map_err(|e| SheetError::Storage(e.to_string()))
    })
}

/// Run one parsed request against the app.
pub async fn execute(app: &App, seq: u64, line: &CommandLine) -> Response {
    let limiter = match line.command {
        Command::Mention => &app.rate_limits.mentions,
        _ => &app.rate_limits.commands,
    };
    if let RateDecision::RateLimited { retry_after } = limiter.check(&line.user) {
        return Response::failure(
            seq,
            Some(line),
            ErrorBody {
                kind: "rate_limited",
                message: "Too many requests".to_string(),
                retry_after_secs: Some(retry_after.as_secs_f64()),
            },
        );
    }

    let key = &line.user;
    let uc = &app.use_cases;
    let outcome = match &line.command {
        Command::Roll { expression } => to_value(uc.dice.evaluate(expression)),
        Command::Coin {
            amount,
            denomination,
        } => to_value(uc.ledger.apply_transaction(key, *amount, denomination).await),
        Command::Balance => to_value(uc.ledger.get_balance(key).await),
        Command::Hp { delta } => to_value(uc.vitality.apply_hp_delta(key, *delta).await),
        Command::TempHp { amount } => to_value(uc.vitality.set_temporary_hp(key, *amount).await),
        Command::HitDice { count } => to_value(uc.vitality.spend_hit_dice(key, *count).await),
        Command::ShortRest => to_value(uc.vitality.short_rest_available(key).await),
        Command::LongRest => to_value(uc.vitality.long_rest(key).await),
        Command::Get { path } => to_value(uc.attributes.get(key, path).await),
        Command::Set { path, value } => to_value(uc.attributes.set(key, path, value).await),
        Command::Delete { path } => to_value(uc.attributes.delete(key, path).await),
        Command::Import { raw } => to_value(uc.transfer.import_raw(key, raw).await),
        Command::Export => uc
            .transfer
            .export_raw(key)
            .await
            .map(|document| serde_json::json!({ "document": document })),
        Command::Mention => to_value(Ok(RateDecision::Allowed)),
    };

    match outcome {
        Ok(result) => Response::success(seq, line, result),
        Err(e) => {
            tracing::debug!(
                user_key = %key,
                command = line.command.name(),
                kind = %e.kind(),
                "Command failed"
            );
            Response::failure(
                seq,
                Some(line),
                ErrorBody {
                    kind: e.kind().as_str(),
                    message: e.to_string(),
                    retry_after_secs: None,
                },
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{FixedClock, SeededRandom};
    use crate::infrastructure::config::{EngineConfig, RateLimitConfig};
    use crate::infrastructure::file_store::FileDocumentStore;
    use chrono::TimeZone;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn app_in(dir: &TempDir, command_limit: u32) -> App {
        let config = EngineConfig {
            characters_dir: dir.path().to_path_buf(),
            command_rate_limit: RateLimitConfig::new(command_limit, 60),
            ..EngineConfig::default()
        };
        App::with_ports(
            config.clone(),
            Arc::new(FileDocumentStore::new(config.characters_dir)),
            Arc::new(SeededRandom::new(9)),
            Arc::new(FixedClock(
                chrono::Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            )),
        )
    }

    async fn run(app: &App, line: &str) -> Response {
        let parsed = parse_line(line).unwrap();
        execute(app, 0, &parsed).await
    }

    #[test]
    fn parses_commands() {
        let line = parse_line("42 coin -5 GP").unwrap();
        assert_eq!(line.user, UserKey::from(42_u64));
        assert_eq!(
            line.command,
            Command::Coin {
                amount: -5,
                denomination: "GP".into()
            }
        );

        assert_eq!(
            parse_line("7 set notes.backstory Raised by wolves").unwrap().command,
            Command::Set {
                path: "notes.backstory".into(),
                value: "Raised by wolves".into()
            }
        );
        assert_eq!(
            parse_line("7 roll 2d6 + 3").unwrap().command,
            Command::Roll {
                expression: "2d6 + 3".into()
            }
        );
        assert_eq!(parse_line("7 LR").unwrap().command, Command::LongRest);
    }

    #[test]
    fn rejects_bad_lines() {
        assert_eq!(parse_line("   "), Err(CommandParseError::Empty));
        assert_eq!(parse_line("42"), Err(CommandParseError::MissingCommand));
        assert!(matches!(
            parse_line("42 dance"),
            Err(CommandParseError::UnknownCommand(_))
        ));
        assert!(matches!(
            parse_line("42 coin 5"),
            Err(CommandParseError::MissingArgument {
                argument: "denomination",
                ..
            })
        ));
        assert!(matches!(
            parse_line("42 hp lots"),
            Err(CommandParseError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_line("../etc coin 1 gp"),
            Err(CommandParseError::InvalidUserKey(_))
        ));
    }

    #[tokio::test]
    async fn coin_then_balance() {
        let dir = TempDir::new().unwrap();
        let app = app_in(&dir, 10);

        let response = run(&app, "5 coin 12 sp").await;
        assert!(response.ok);
        assert_eq!(response.command, Some("coin"));

        let response = run(&app, "5 balance").await;
        assert_eq!(
            response.result,
            Some(serde_json::json!({"gp": 1, "sp": 2, "cp": 0}))
        );
    }

    #[tokio::test]
    async fn errors_report_kind() {
        let dir = TempDir::new().unwrap();
        let app = app_in(&dir, 10);

        let response = run(&app, "5 hp -3").await;
        assert!(!response.ok);
        assert_eq!(response.error.map(|e| e.kind), Some("not_found"));

        let response = run(&app, "5 roll banana").await;
        assert_eq!(response.error.map(|e| e.kind), Some("invalid_expression"));

        let response = run(&app, "5 coin 3 pp").await;
        assert_eq!(response.error.map(|e| e.kind), Some("unknown_denomination"));

        let response = run(&app, "5 get skills..stealth").await;
        assert_eq!(response.error.map(|e| e.kind), Some("invalid_path"));

        assert!(run(&app, "5 coin 1 gp").await.ok);
        assert!(run(&app, "5 set hit_points.current lots").await.ok);
        assert!(run(&app, "5 set hit_points.max 9").await.ok);
        let response = run(&app, "5 hp 2").await;
        assert_eq!(response.error.map(|e| e.kind), Some("malformed_field"));
    }

    #[tokio::test]
    async fn rate_limited_after_budget() {
        let dir = TempDir::new().unwrap();
        let app = app_in(&dir, 1);

        assert!(run(&app, "5 roll d20").await.ok);
        let response = run(&app, "5 roll d20").await;
        let error = response.error.unwrap();
        assert_eq!(error.kind, "rate_limited");
        assert_eq!(error.retry_after_secs, Some(60.0));

        // Mentions have their own budget
        assert!(run(&app, "5 mention").await.ok);
    }

    #[tokio::test]
    async fn import_export_round_trip() {
        let dir = TempDir::new().unwrap();
        let app = app_in(&dir, 10);

        let response = run(
            &app,
            r#"8 import {"hit_points": {"current": 2, "max": 9}, "hit_dice": {"total": 2, "spent": 2, "die_type": "d6"}}"#,
        )
        .await;
        assert!(response.ok, "{response:?}");

        let response = run(&app, "8 lr").await;
        assert_eq!(
            response.result,
            Some(serde_json::json!({
                "current": 9,
                "temporary": 0,
                "dice_recovered": 1,
                "spent": 1
            }))
        );

        let response = run(&app, "8 export").await;
        let document = response.result.unwrap()["document"]
            .as_str()
            .unwrap()
            .to_string();
        let exported: Value = serde_json::from_str(&document).unwrap();
        assert_eq!(exported["hit_points"]["current"], 9);
        assert_eq!(exported["hit_dice"]["spent"], 1);
    }

    #[test]
    fn bad_command_response_shape() {
        let response = Response::bad_command(3, &CommandParseError::Empty);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "seq": 3,
                "ok": false,
                "error": {"kind": "bad_command", "message": "Empty line"}
            })
        );
    }
}
