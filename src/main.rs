use anyhow::{bail, Context};
use ferrumkv::{Dispatcher, RespValue, StoreConfig};
use std::io::{self, BufRead, Write};
use tracing::info;

fn main() -> anyhow::Result<()> {
    // Initialize logging (RUST_LOG, defaulting to info)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    // Optional JSON config path as the first argument
    let config = match std::env::args().nth(1) {
        Some(path) => StoreConfig::load(&path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => StoreConfig::default(),
    };

    info!("FerrumKV starting...");
    let dispatcher = Dispatcher::with_config(config);

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        let parts = match tokenize(&line) {
            Ok(parts) if parts.is_empty() => continue,
            Ok(parts) => parts,
            Err(e) => {
                writeln!(stdout, "(error) ERR {}", e)?;
                continue;
            }
        };
        if parts[0].eq_ignore_ascii_case("QUIT") || parts[0].eq_ignore_ascii_case("EXIT") {
            break;
        }

        let reply = dispatcher.call(parts);
        writeln!(stdout, "{}", render(&reply, 0))?;
        stdout.flush()?;
    }

    info!("FerrumKV stopped");
    Ok(())
}

/// Split a command line on whitespace; double quotes group a token and
/// accept `\"`, `\\`, `\n`, `\t` escapes.
fn tokenize(line: &str) -> anyhow::Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut token = String::new();
        if c == '"' {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some('\\') => match chars.next() {
                        Some('n') => token.push('\n'),
                        Some('t') => token.push('\t'),
                        Some(other) => token.push(other),
                        None => bail!("unbalanced quotes"),
                    },
                    Some(other) => token.push(other),
                    None => bail!("unbalanced quotes"),
                }
            }
            if chars.peek().map_or(false, |next| !next.is_whitespace()) {
                bail!("closing quote must be followed by a space");
            }
        } else {
            while let Some(&next) = chars.peek() {
                if next.is_whitespace() {
                    break;
                }
                token.push(next);
                chars.next();
            }
        }
        tokens.push(token);
    }

    Ok(tokens)
}

/// Format a reply the way interactive clients usually print them
fn render(value: &RespValue, indent: usize) -> String {
    match value {
        RespValue::SimpleString(s) => s.clone(),
        RespValue::Error(e) => format!("(error) {}", e),
        RespValue::Integer(i) => format!("(integer) {}", i),
        RespValue::BulkString(b) => format!("{:?}", String::from_utf8_lossy(b)),
        RespValue::Null => "(nil)".to_string(),
        RespValue::Array(items) if items.is_empty() => "(empty array)".to_string(),
        RespValue::Array(items) => {
            let width = items.len().to_string().len();
            items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let prefix = format!("{:>width$}) ", i + 1, width = width);
                    let pad = if i == 0 { String::new() } else { " ".repeat(indent) };
                    format!("{}{}{}", pad, prefix, render(item, indent + prefix.len()))
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_quotes() {
        let tokens = tokenize(r#"SET greeting "hello world"  "#).unwrap();
        assert_eq!(tokens, vec!["SET", "greeting", "hello world"]);

        let tokens = tokenize(r#"SET k "say \"hi\"""#).unwrap();
        assert_eq!(tokens[2], "say \"hi\"");

        assert!(tokenize(r#"SET k "open"#).is_err());
        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn test_render() {
        assert_eq!(render(&RespValue::integer(3), 0), "(integer) 3");
        assert_eq!(render(&RespValue::null(), 0), "(nil)");
        assert_eq!(render(&RespValue::bulk_string("v"), 0), "\"v\"");
        assert_eq!(
            render(&RespValue::bulk_array(["a", "b"]), 0),
            "1) \"a\"\n2) \"b\""
        );
        let nested = RespValue::array(vec![
            RespValue::bulk_string("0"),
            RespValue::bulk_array(["k"]),
        ]);
        assert_eq!(render(&nested, 0), "1) \"0\"\n2) 1) \"k\"");
    }
}
