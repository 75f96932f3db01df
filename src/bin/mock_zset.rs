//! Mock sorted-set server and client for integration testing
//!
//! `mock_zset serve [--port N]` listens on 127.0.0.1 and keeps sorted sets
//! in memory. `mock_zset [--port N] <cmd> <args...>` sends one request and
//! prints the typed reply the way the real client does:
//! `(nil)`, `(int) 1`, `(double) 1.1`, `(str) n1`, `(arr) len=2` ... `(arr) end`.
//!
//! Requests and replies are single lines of JSON.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::process::ExitCode;

const DEFAULT_PORT: u16 = 1234;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
enum Reply {
    Nil,
    Err(String),
    Str(String),
    Int(i64),
    Double(f64),
    Arr(Vec<Reply>),
}

impl Reply {
    fn render(&self, out: &mut String) {
        match self {
            Reply::Nil => out.push_str("(nil)\n"),
            Reply::Err(msg) => out.push_str(&format!("(err) {msg}\n")),
            Reply::Str(s) => out.push_str(&format!("(str) {s}\n")),
            Reply::Int(n) => out.push_str(&format!("(int) {n}\n")),
            Reply::Double(d) => out.push_str(&format!("(double) {d}\n")),
            Reply::Arr(items) => {
                out.push_str(&format!("(arr) len={}\n", items.len()));
                for item in items {
                    item.render(out);
                }
                out.push_str("(arr) end\n");
            }
        }
    }
}

/// Score with a total order so it can key a BTreeSet
#[derive(Debug, Clone, Copy)]
struct Score(f64);

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Score {}
impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Default)]
struct ZSet {
    by_name: HashMap<String, f64>,
    ordered: BTreeSet<(Score, String)>,
}

impl ZSet {
    /// Returns true when the member is new
    fn add(&mut self, name: &str, score: f64) -> bool {
        let previous = self.by_name.insert(name.to_string(), score);
        if let Some(old) = previous {
            self.ordered.remove(&(Score(old), name.to_string()));
        }
        self.ordered.insert((Score(score), name.to_string()));
        previous.is_none()
    }

    fn remove(&mut self, name: &str) -> bool {
        match self.by_name.remove(name) {
            Some(score) => self.ordered.remove(&(Score(score), name.to_string())),
            None => false,
        }
    }

    /// Pairs at or after (score, name), skipping `offset` pairs, at most `limit` elements
    fn query(&self, score: f64, name: &str, offset: usize, limit: usize) -> Vec<Reply> {
        let mut out = Vec::new();
        for (Score(s), member) in self
            .ordered
            .range((Score(score), name.to_string())..)
            .skip(offset)
        {
            if out.len() >= limit {
                break;
            }
            out.push(Reply::Str(member.clone()));
            out.push(Reply::Double(*s));
        }
        out
    }
}

#[derive(Default)]
struct State {
    sets: HashMap<String, ZSet>,
}

impl State {
    fn handle(&mut self, args: &[String]) -> Reply {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match args.as_slice() {
            ["zadd", key, score, name] => match score.parse::<f64>() {
                Ok(score) => {
                    let added = self.sets.entry(key.to_string()).or_default().add(name, score);
                    Reply::Int(i64::from(added))
                }
                Err(_) => Reply::Err("expect fp number".to_string()),
            },
            ["zrem", key, name] => {
                let removed = self
                    .sets
                    .get_mut(*key)
                    .map(|set| set.remove(name))
                    .unwrap_or(false);
                Reply::Int(i64::from(removed))
            }
            ["zscore", key, name] => self
                .sets
                .get(*key)
                .and_then(|set| set.by_name.get(*name))
                .map(|score| Reply::Double(*score))
                .unwrap_or(Reply::Nil),
            ["zquery", key, score, name, offset, limit] => {
                let (Ok(score), Ok(offset), Ok(limit)) = (
                    score.parse::<f64>(),
                    offset.parse::<usize>(),
                    limit.parse::<usize>(),
                ) else {
                    return Reply::Err("expect numeric arguments".to_string());
                };
                match self.sets.get(*key) {
                    Some(set) => Reply::Arr(set.query(score, name, offset, limit)),
                    None => Reply::Arr(Vec::new()),
                }
            }
            _ => Reply::Err("unknown command".to_string()),
        }
    }
}

fn serve(port: u16) -> std::io::Result<()> {
    let listener = TcpListener::bind(("127.0.0.1", port))?;
    eprintln!("mock_zset listening on 127.0.0.1:{port}");
    let mut state = State::default();

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(_) => continue,
        };
        if let Err(e) = handle_connection(&mut state, stream) {
            eprintln!("connection error: {e}");
        }
    }
    Ok(())
}

fn handle_connection(state: &mut State, stream: TcpStream) -> std::io::Result<()> {
    let mut writer = stream.try_clone()?;
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let line = line?;
        let reply = match serde_json::from_str::<Vec<String>>(&line) {
            Ok(args) => state.handle(&args),
            Err(e) => Reply::Err(format!("bad request: {e}")),
        };
        let json = serde_json::to_string(&reply).map_err(std::io::Error::other)?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}

fn request(port: u16, args: &[String]) -> std::io::Result<Reply> {
    let stream = TcpStream::connect(("127.0.0.1", port))?;
    let mut writer = stream.try_clone()?;
    let json = serde_json::to_string(args).map_err(std::io::Error::other)?;
    writeln!(writer, "{json}")?;

    let mut line = String::new();
    BufReader::new(stream).read_line(&mut line)?;
    serde_json::from_str(&line).map_err(std::io::Error::other)
}

fn main() -> ExitCode {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let mut port = std::env::var("MOCK_ZSET_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let mut serve_mode = false;

    // Leading options only; everything after is passed through verbatim
    loop {
        match args.first().map(String::as_str) {
            Some("--port") if args.len() > 1 => {
                match args[1].parse() {
                    Ok(p) => port = p,
                    Err(_) => {
                        eprintln!("invalid port: {}", args[1]);
                        return ExitCode::from(2);
                    }
                }
                args.drain(..2);
            }
            Some("serve") => {
                serve_mode = true;
                args.remove(0);
            }
            _ => break,
        }
    }

    if serve_mode {
        return match serve(port) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("server error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    if args.is_empty() {
        eprintln!("usage: mock_zset [--port N] serve | <cmd> <args...>");
        return ExitCode::from(2);
    }

    match request(port, &args) {
        Ok(reply) => {
            let mut out = String::new();
            reply.render(&mut out);
            print!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("request failed: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split(' ').map(|s| s.trim_matches('"').to_string()).collect()
    }

    fn render(reply: &Reply) -> String {
        let mut out = String::new();
        reply.render(&mut out);
        out
    }

    #[test]
    fn test_sorted_set_scenario() {
        let mut state = State::default();
        assert_eq!(state.handle(&args("zscore asdf n1")), Reply::Nil);
        assert_eq!(state.handle(&args("zadd zset 1 n1")), Reply::Int(1));
        assert_eq!(state.handle(&args("zadd zset 2 n2")), Reply::Int(1));
        assert_eq!(state.handle(&args("zadd zset 1.1 n1")), Reply::Int(0));
        assert_eq!(state.handle(&args("zscore zset n1")), Reply::Double(1.1));

        assert_eq!(
            render(&state.handle(&args(r#"zquery zset 1 "" 0 10"#))),
            "(arr) len=4\n(str) n1\n(double) 1.1\n(str) n2\n(double) 2\n(arr) end\n"
        );
        assert_eq!(
            render(&state.handle(&args(r#"zquery zset 1.1 "" 1 10"#))),
            "(arr) len=2\n(str) n2\n(double) 2\n(arr) end\n"
        );
        assert_eq!(
            render(&state.handle(&args(r#"zquery zset 1.1 "" 2 10"#))),
            "(arr) len=0\n(arr) end\n"
        );

        assert_eq!(state.handle(&args("zrem zset adsf")), Reply::Int(0));
        assert_eq!(state.handle(&args("zrem zset n1")), Reply::Int(1));
        assert_eq!(
            render(&state.handle(&args(r#"zquery zset 1 "" 0 10"#))),
            "(arr) len=2\n(str) n2\n(double) 2\n(arr) end\n"
        );
    }

    #[test]
    fn test_limit_counts_elements() {
        let mut state = State::default();
        state.handle(&args("zadd z 1 a"));
        state.handle(&args("zadd z 2 b"));
        assert_eq!(
            render(&state.handle(&args(r#"zquery z 0 "" 0 2"#))),
            "(arr) len=2\n(str) a\n(double) 1\n(arr) end\n"
        );
    }

    #[test]
    fn test_bad_arguments() {
        let mut state = State::default();
        assert!(matches!(state.handle(&args("zadd z x a")), Reply::Err(_)));
        assert!(matches!(state.handle(&args("get k")), Reply::Err(_)));
    }
}
