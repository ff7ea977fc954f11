//! Go Text Protocol (GTP) client side.
//!
//! A [`Transport`] moves raw command lines and parsed responses; the
//! [`GtpClient`] on top of it numbers commands, matches responses to them
//! and offers blocking and non-blocking submission. Responses always come
//! back in the order the commands were written, so an engine that omits
//! the id is matched by order.

use std::collections::{BTreeMap, VecDeque};

use crate::error::EngineError;

/// One parsed GTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub id: Option<u32>,
    pub success: bool,
    pub text: String,
}

impl Response {
    pub fn success(id: Option<u32>, text: impl Into<String>) -> Self {
        Self {
            id,
            success: true,
            text: text.into(),
        }
    }

    pub fn failure(id: Option<u32>, text: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            text: text.into(),
        }
    }

    /// Parses a raw response block such as `"=12 D4"` or `"? illegal move"`.
    pub fn parse(raw: &str) -> Result<Self, EngineError> {
        let raw = raw.trim_end();
        let success = match raw.chars().next() {
            Some('=') => true,
            Some('?') => false,
            _ => return Err(EngineError::Malformed(raw.to_string())),
        };
        let (id, text) = parse_id(&raw[1..]);
        Ok(Self {
            id,
            success,
            text: text.to_string(),
        })
    }

    /// Wire form, terminated by the empty line GTP requires.
    pub fn to_wire(&self) -> String {
        let prefix = if self.success { '=' } else { '?' };
        let id_str = self.id.map(|i| i.to_string()).unwrap_or_default();
        format!("{prefix}{id_str} {}\n\n", self.text)
    }
}

/// Parse an optional numeric command id from the beginning of the line.
pub fn parse_id(line: &str) -> (Option<u32>, &str) {
    let end = line
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    if end > 0 {
        if let Ok(id) = line[..end].parse::<u32>() {
            return (Some(id), line[end..].trim());
        }
    }
    (None, line.trim())
}

/// Carries GTP lines to an engine and parsed responses back.
pub trait Transport {
    /// Writes one command line.
    fn send(&mut self, line: &str) -> Result<(), EngineError>;

    /// Blocks until the next response is available.
    fn recv(&mut self) -> Result<Response, EngineError>;

    /// Returns the next response if one has already arrived.
    fn try_recv(&mut self) -> Result<Option<Response>, EngineError>;
}

pub struct GtpClient<T> {
    transport: T,
    next_id: u32,
    in_flight: VecDeque<(u32, String)>,
    ready: BTreeMap<u32, Response>,
}

impl<T: Transport> GtpClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_id: 1,
            in_flight: VecDeque::new(),
            ready: BTreeMap::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Commands written but not yet answered.
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Sends `command` and blocks until it is answered. A failure status
    /// becomes [`EngineError::Rejected`].
    pub fn submit(&mut self, command: &str) -> Result<String, EngineError> {
        let id = self.submit_async(command)?;
        let response = self.wait(id)?;
        check(command, response)
    }

    /// Sends `command` without waiting. Returns the id to poll for.
    pub fn submit_async(&mut self, command: &str) -> Result<u32, EngineError> {
        let id = self.next_id;
        self.next_id += 1;
        log::debug!("gtp> {id} {command}");
        self.transport.send(&format!("{id} {command}"))?;
        self.in_flight.push_back((id, command.to_string()));
        Ok(id)
    }

    /// Non-blocking: the response for `id` if it has arrived.
    pub fn poll(&mut self, id: u32) -> Result<Option<Response>, EngineError> {
        while let Some(response) = self.transport.try_recv()? {
            self.accept(response)?;
        }
        Ok(self.ready.remove(&id))
    }

    /// Blocks until the response for `id` has arrived, leaving it queued
    /// for [`GtpClient::poll`].
    pub fn wait_ready(&mut self, id: u32) -> Result<(), EngineError> {
        while !self.ready.contains_key(&id) {
            if !self.in_flight.iter().any(|(i, _)| *i == id) {
                return Err(EngineError::Malformed(format!("no command with id {id} in flight")));
            }
            let response = self.transport.recv()?;
            self.accept(response)?;
        }
        Ok(())
    }

    /// Blocks until the response for `id` has arrived and takes it.
    pub fn wait(&mut self, id: u32) -> Result<Response, EngineError> {
        self.wait_ready(id)?;
        self.ready
            .remove(&id)
            .ok_or_else(|| EngineError::Malformed(format!("response {id} vanished")))
    }

    fn accept(&mut self, response: Response) -> Result<(), EngineError> {
        let id = match response.id {
            Some(id) => id,
            None => match self.in_flight.front() {
                Some((id, _)) => *id,
                None => return Err(EngineError::Malformed(format!("unexpected response '{}'", response.text))),
            },
        };
        let Some(pos) = self.in_flight.iter().position(|(i, _)| *i == id) else {
            return Err(EngineError::Malformed(format!("response for unknown id {id}")));
        };
        if let Some((_, command)) = self.in_flight.remove(pos) {
            let prefix = if response.success { '=' } else { '?' };
            log::debug!("gtp< {prefix}{id} {} [{command}]", response.text);
        }
        self.ready.insert(id, response);
        Ok(())
    }
}

/// Turns a failure response into [`EngineError::Rejected`], logging it.
pub fn check(command: &str, response: Response) -> Result<String, EngineError> {
    if response.success {
        Ok(response.text)
    } else {
        log::error!("engine rejected command '{command}': {}", response.text);
        Err(EngineError::Rejected {
            command: command.to_string(),
            reason: response.text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Answers every command with its own text, optionally without ids.
    #[derive(Default)]
    struct Echo {
        outbox: VecDeque<Response>,
        drop_ids: bool,
        sent: Vec<String>,
    }

    impl Transport for Echo {
        fn send(&mut self, line: &str) -> Result<(), EngineError> {
            self.sent.push(line.to_string());
            let (id, text) = parse_id(line);
            let id = if self.drop_ids { None } else { id };
            let response = if text.starts_with("bad") {
                Response::failure(id, "nope")
            } else {
                Response::success(id, text)
            };
            self.outbox.push_back(response);
            Ok(())
        }

        fn recv(&mut self) -> Result<Response, EngineError> {
            self.outbox.pop_front().ok_or(EngineError::Disconnected)
        }

        fn try_recv(&mut self) -> Result<Option<Response>, EngineError> {
            Ok(self.outbox.pop_front())
        }
    }

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = parse_id("123 name");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = parse_id("name");
        assert_eq!(id, None);
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_response() {
        assert_eq!(Response::parse("=7 D4\n\n").unwrap(), Response::success(Some(7), "D4"));
        assert_eq!(Response::parse("? illegal move").unwrap(), Response::failure(None, "illegal move"));
        assert_eq!(Response::parse("= \n").unwrap(), Response::success(None, ""));
        assert!(Response::parse("garbage").is_err());
    }

    #[test]
    fn test_wire_format_roundtrip() {
        let r = Response::failure(Some(3), "unknown command");
        assert_eq!(r.to_wire(), "?3 unknown command\n\n");
        assert_eq!(Response::parse(&r.to_wire()).unwrap(), r);
    }

    #[test]
    fn test_submit_numbers_commands() {
        let mut client = GtpClient::new(Echo::default());
        assert_eq!(client.submit("name").unwrap(), "name");
        assert_eq!(client.submit("version").unwrap(), "version");
        assert_eq!(client.transport().sent, vec!["1 name", "2 version"]);
        assert_eq!(client.pending(), 0);
    }

    #[test]
    fn test_rejection_carries_command_and_reason() {
        let mut client = GtpClient::new(Echo::default());
        match client.submit("bad command") {
            Err(EngineError::Rejected { command, reason }) => {
                assert_eq!(command, "bad command");
                assert_eq!(reason, "nope");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_async_then_sync_keeps_order() {
        let mut client = GtpClient::new(Echo {
            drop_ids: true,
            ..Echo::default()
        });
        let first = client.submit_async("genmove b").unwrap();
        assert_eq!(client.submit("komi 6.5").unwrap(), "komi 6.5");
        let response = client.poll(first).unwrap().unwrap();
        assert_eq!(response.text, "genmove b");
        assert!(client.poll(first).unwrap().is_none());
    }

    #[test]
    fn test_wait_for_unknown_id_fails() {
        let mut client = GtpClient::new(Echo::default());
        assert!(matches!(client.wait(42), Err(EngineError::Malformed(_))));
    }
}
