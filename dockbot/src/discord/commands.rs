//! Slash command definitions and option parsing.

use std::str::FromStr;

use serde_json::{Value, json};
use thiserror::Error;

use super::types::{CommandData, CommandOption};
use crate::command::{Command, ContainerAction, DEFAULT_CONTEXT, ImageAction, UnknownAction};

const OPTION_SUB_COMMAND: u8 = 1;
const OPTION_STRING: u8 = 3;
const OPTION_BOOLEAN: u8 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("missing option: {0}")]
    MissingOption(&'static str),

    #[error("invalid option {name}: {reason}")]
    InvalidOption { name: &'static str, reason: String },
}

/// The full command set, in the shape of a bulk-overwrite request.
pub fn definitions() -> Value {
    let context = json!({
        "type": OPTION_STRING,
        "name": "context",
        "description": "Docker context",
        "required": false
    });

    json!([
        {
            "type": 1,
            "name": "docker",
            "description": "Manage Docker containers",
            "options": [
                {
                    "type": OPTION_SUB_COMMAND,
                    "name": "execute",
                    "description": "Execute Docker container management commands.",
                    "options": [
                        {
                            "type": OPTION_STRING,
                            "name": "action",
                            "description": "Container action",
                            "required": true,
                            "choices": choices(ContainerAction::ALL.iter().map(|a| a.as_str()))
                        },
                        {
                            "type": OPTION_STRING,
                            "name": "container_name",
                            "description": "Container name",
                            "required": true,
                            "autocomplete": true
                        },
                        context
                    ]
                },
                {
                    "type": OPTION_SUB_COMMAND,
                    "name": "images",
                    "description": "Manage Docker images.",
                    "options": [
                        {
                            "type": OPTION_STRING,
                            "name": "action",
                            "description": "Image action",
                            "required": true,
                            "choices": choices(ImageAction::ALL.iter().map(|a| a.as_str()))
                        },
                        {
                            "type": OPTION_STRING,
                            "name": "image_name",
                            "description": "Image name",
                            "required": false
                        },
                        context
                    ]
                },
                {
                    "type": OPTION_SUB_COMMAND,
                    "name": "prune",
                    "description": "Prune Docker images.",
                    "options": [
                        {
                            "type": OPTION_BOOLEAN,
                            "name": "all",
                            "description": "Prune all images",
                            "required": true
                        },
                        context
                    ]
                }
            ]
        },
        {
            "type": 1,
            "name": "list",
            "description": "List All Docker Containers",
            "options": [context]
        },
        { "type": 1, "name": "ping", "description": "Ping the bot." },
        { "type": 1, "name": "uptime", "description": "Get system uptime." }
    ])
}

fn choices<'a>(names: impl Iterator<Item = &'a str>) -> Value {
    names
        .map(|name| json!({ "name": name, "value": name }))
        .collect()
}

/// Turn a slash command invocation into a [`Command`].
pub fn parse(data: &CommandData) -> Result<Command, ParseError> {
    match data.name.as_str() {
        "docker" => {
            let sub = data
                .options
                .first()
                .ok_or(ParseError::MissingOption("subcommand"))?;
            parse_docker(sub)
        }
        "list" => Ok(Command::List {
            context: context(&data.options),
        }),
        "ping" => Ok(Command::Ping),
        "uptime" => Ok(Command::Uptime),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

fn parse_docker(sub: &CommandOption) -> Result<Command, ParseError> {
    let options = &sub.options;
    match sub.name.as_str() {
        "execute" => Ok(Command::Container {
            action: action(options)?,
            name: required_str(options, "container_name")?.to_string(),
            context: context(options),
        }),
        "images" => Ok(Command::Image {
            action: action(options)?,
            name: str_option(options, "image_name").map(String::from),
            context: context(options),
        }),
        "prune" => Ok(Command::Prune {
            all: find(options, "all")
                .and_then(|o| o.value.as_ref())
                .and_then(Value::as_bool)
                .ok_or(ParseError::MissingOption("all"))?,
            context: context(options),
        }),
        other => Err(ParseError::UnknownCommand(format!("docker {}", other))),
    }
}

/// Autocomplete request for the `container_name` option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutocompleteQuery {
    pub context: String,
    pub prefix: String,
}

pub fn parse_autocomplete(data: &CommandData) -> Option<AutocompleteQuery> {
    if data.name != "docker" {
        return None;
    }
    let sub = data.options.first().filter(|sub| sub.name == "execute")?;
    let focused = sub
        .options
        .iter()
        .find(|o| o.focused)
        .filter(|o| o.name == "container_name")?;

    Some(AutocompleteQuery {
        context: context(&sub.options),
        prefix: focused
            .value
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

fn action<A: FromStr<Err = UnknownAction>>(options: &[CommandOption]) -> Result<A, ParseError> {
    required_str(options, "action")?
        .parse()
        .map_err(|e: UnknownAction| ParseError::InvalidOption {
            name: "action",
            reason: e.to_string(),
        })
}

fn find<'a>(options: &'a [CommandOption], name: &str) -> Option<&'a CommandOption> {
    options.iter().find(|o| o.name == name)
}

fn str_option<'a>(options: &'a [CommandOption], name: &str) -> Option<&'a str> {
    find(options, name)
        .and_then(|o| o.value.as_ref())
        .and_then(Value::as_str)
}

fn required_str<'a>(options: &'a [CommandOption], name: &'static str) -> Result<&'a str, ParseError> {
    str_option(options, name).ok_or(ParseError::MissingOption(name))
}

fn context(options: &[CommandOption]) -> String {
    str_option(options, "context")
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CONTEXT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(value: Value) -> CommandData {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn parses_execute() {
        let command = parse(&data(json!({
            "name": "docker",
            "options": [{
                "name": "execute",
                "type": 1,
                "options": [
                    { "name": "action", "type": 3, "value": "start" },
                    { "name": "container_name", "type": 3, "value": "web" },
                    { "name": "context", "type": 3, "value": "prod" }
                ]
            }]
        })))
        .unwrap();

        assert_eq!(
            command,
            Command::Container {
                action: ContainerAction::Start,
                name: "web".to_string(),
                context: "prod".to_string(),
            }
        );
    }

    #[test]
    fn context_defaults() {
        let command = parse(&data(json!({ "name": "list" }))).unwrap();
        assert_eq!(
            command,
            Command::List {
                context: "default".to_string()
            }
        );
    }

    #[test]
    fn image_name_is_optional() {
        let command = parse(&data(json!({
            "name": "docker",
            "options": [{
                "name": "images",
                "options": [{ "name": "action", "value": "pull" }]
            }]
        })))
        .unwrap();
        assert_eq!(
            command,
            Command::Image {
                action: ImageAction::Pull,
                name: None,
                context: "default".to_string(),
            }
        );
    }

    #[test]
    fn prune_requires_all() {
        let err = parse(&data(json!({
            "name": "docker",
            "options": [{ "name": "prune", "options": [] }]
        })))
        .unwrap_err();
        assert_eq!(err, ParseError::MissingOption("all"));
    }

    #[test]
    fn rejects_unknown_action() {
        let err = parse(&data(json!({
            "name": "docker",
            "options": [{
                "name": "execute",
                "options": [
                    { "name": "action", "value": "kill" },
                    { "name": "container_name", "value": "web" }
                ]
            }]
        })))
        .unwrap_err();
        assert!(matches!(err, ParseError::InvalidOption { name: "action", .. }));
    }

    #[test]
    fn autocomplete_query() {
        let query = parse_autocomplete(&data(json!({
            "name": "docker",
            "options": [{
                "name": "execute",
                "options": [
                    { "name": "action", "value": "stop" },
                    { "name": "container_name", "value": "we", "focused": true },
                    { "name": "context", "value": "edge" }
                ]
            }]
        })))
        .unwrap();
        assert_eq!(
            query,
            AutocompleteQuery {
                context: "edge".to_string(),
                prefix: "we".to_string(),
            }
        );
    }

    #[test]
    fn definitions_cover_every_command() {
        let defs = definitions();
        let names: Vec<&str> = defs
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["docker", "list", "ping", "uptime"]);
        assert_eq!(defs[0]["options"][0]["options"][0]["choices"][5]["value"], "delete");
    }
}
