//! Command parsing.
//!
//! Turns raw message text into a command name plus typed args and flags.
//!
//! - Prefixes are tried in the order given; the first match wins.
//! - Double quotes group words into one token.
//! - `--name`, `--name=value` and `-x` select declared flags. Flag-like
//!   tokens that match nothing are kept as literal positional text.
//! - Boolean flags take no value; other flags consume the next token.
//! - Surplus positional tokens are joined onto the last declared argument.

use std::collections::HashMap;

use crate::application::plugin::{ArgSpec, ArgType, Command, FlagSpec, FlagValue};

/// Args and flags parsed for one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedParams {
    pub args: HashMap<String, String>,
    pub flags: HashMap<String, FlagValue>,
}

pub struct CommandParser;

impl CommandParser {
    /// The first prefix `content` starts with.
    pub fn matched_prefix<'a>(content: &str, prefixes: &'a [String]) -> Option<&'a str> {
        prefixes
            .iter()
            .map(String::as_str)
            .filter(|prefix| !prefix.is_empty())
            .find(|prefix| content.starts_with(prefix))
    }

    /// Prefix followed by at least one non-space character.
    pub fn is_command(content: &str, prefixes: &[String]) -> bool {
        Self::command_name(content, prefixes).is_some()
    }

    /// Lowercased command token after the prefix.
    pub fn command_name(content: &str, prefixes: &[String]) -> Option<String> {
        let prefix = Self::matched_prefix(content, prefixes)?;
        content[prefix.len()..]
            .split_whitespace()
            .next()
            .map(str::to_lowercase)
    }

    /// Everything after the command token.
    pub fn params_string(content: &str, prefixes: &[String]) -> Option<String> {
        let prefix = Self::matched_prefix(content, prefixes)?;
        let rest = content[prefix.len()..].trim_start();
        let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        if name_end == 0 {
            return None;
        }
        Some(rest[name_end..].trim().to_string())
    }

    /// Split on whitespace, keeping double-quoted runs together.
    pub fn tokenize(input: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut quoted = false;

        for ch in input.chars() {
            match ch {
                '"' => {
                    in_quotes = !in_quotes;
                    quoted = true;
                }
                c if c.is_whitespace() && !in_quotes => {
                    if !current.is_empty() || quoted {
                        tokens.push(std::mem::take(&mut current));
                    }
                    quoted = false;
                }
                c => current.push(c),
            }
        }

        if !current.is_empty() || quoted {
            tokens.push(current);
        }

        tokens
    }

    /// Assign tokens to the command's declared args and flags.
    pub fn process_params(command: &Command, params: &str) -> ParsedParams {
        let mut positional = Vec::new();
        let mut flags = HashMap::new();
        let mut tokens = Self::tokenize(params).into_iter();

        while let Some(token) = tokens.next() {
            let Some((spec, inline)) = Self::match_flag(command, &token) else {
                positional.push(token);
                continue;
            };

            match spec.flag_type {
                ArgType::Boolean => {
                    let value = inline.map_or(true, |raw| parse_bool(&raw).unwrap_or(true));
                    flags.insert(spec.name.clone(), FlagValue::Bool(value));
                }
                ArgType::String => {
                    if let Some(value) = inline.or_else(|| tokens.next()) {
                        flags.insert(spec.name.clone(), FlagValue::Text(value));
                    }
                }
                ArgType::Integer => {
                    if let Some(value) = inline.or_else(|| tokens.next()).and_then(|raw| raw.parse().ok()) {
                        flags.insert(spec.name.clone(), FlagValue::Int(value));
                    }
                }
            }
        }

        let mut args = HashMap::new();
        let last = command.args.len().saturating_sub(1);
        for (index, spec) in command.args.iter().enumerate() {
            let raw = if index == last && positional.len() > index {
                Some(positional[index..].join(" "))
            } else {
                positional.get(index).cloned()
            };

            if let Some(value) = raw.and_then(|raw| coerce_arg(spec, raw)) {
                args.insert(spec.name.clone(), value);
            }
        }

        for spec in &command.args {
            if let Some(default) = &spec.default {
                args.entry(spec.name.clone()).or_insert_with(|| default.clone());
            }
        }
        for spec in &command.flags {
            if let Some(default) = &spec.default {
                flags.entry(spec.name.clone()).or_insert_with(|| default.clone());
            }
        }

        ParsedParams { args, flags }
    }

    fn match_flag<'a>(command: &'a Command, token: &str) -> Option<(&'a FlagSpec, Option<String>)> {
        if let Some(long) = token.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (long, None),
            };
            if name.is_empty() {
                return None;
            }
            return command.flag(name).map(|spec| (spec, inline));
        }

        let mut chars = token.strip_prefix('-')?.chars();
        match (chars.next(), chars.next()) {
            (Some(alias), None) => command.flag_by_alias(alias).map(|spec| (spec, None)),
            _ => None,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Typed args stay strings; values that do not fit the type are dropped.
fn coerce_arg(spec: &ArgSpec, raw: String) -> Option<String> {
    match spec.arg_type {
        ArgType::String => Some(raw),
        ArgType::Integer => raw.parse::<i64>().ok().map(|value| value.to_string()),
        ArgType::Boolean => parse_bool(&raw).map(|value| value.to_string()),
    }
}
