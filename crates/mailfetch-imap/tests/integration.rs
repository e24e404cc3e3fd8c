//! Integration tests for the response tokenizer.
//!
//! These tests drive the parser through small-buffered, trickling readers to
//! mimic a socket that delivers data a few bytes at a time.

#![allow(clippy::unwrap_used, clippy::redundant_clone)]

use std::io::{self, BufReader, Read};

use bytes::Bytes;
use proptest::prelude::*;

use mailfetch_imap::{
    CollectingHandler, Error, LiteralAction, LiteralError, Response, ResponseList, ResponseParser,
    Token,
};

/// Reader that hands out at most `chunk` bytes per call.
struct Trickle {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl Trickle {
    fn new(data: &[u8], chunk: usize) -> Self {
        Self {
            data: data.to_vec(),
            pos: 0,
            chunk,
        }
    }
}

impl Read for Trickle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let end = (self.pos + self.chunk.min(buf.len())).min(self.data.len());
        let n = end - self.pos;
        buf[..n].copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(n)
    }
}

fn trickling_parser(data: &[u8]) -> ResponseParser<BufReader<Trickle>> {
    ResponseParser::new(BufReader::with_capacity(4, Trickle::new(data, 3)))
}

#[test]
fn test_fetch_exchange_over_small_buffer() {
    let input = b"* 12 FETCH (UID 4827 RFC822.SIZE 44827 FLAGS (\\Seen \\Answered) \
INTERNALDATE \"17-Jul-1996 02:44:25 -0700\")\r\nA0007 OK FETCH completed\r\n";
    let mut parser = trickling_parser(input);
    let mut handler = CollectingHandler::new();

    let responses = parser.read_status_response("A0007", &mut handler).unwrap();

    assert_eq!(responses.len(), 2);
    let fetch = &handler.responses[0];
    assert_eq!(fetch.get_number(0).unwrap(), 12);
    let items = fetch.get_list(2).unwrap();
    assert_eq!(items.get_keyed_number("UID").unwrap(), Some(4827));
    assert_eq!(items.get_keyed_number("RFC822.SIZE").unwrap(), Some(44827));
    assert_eq!(items.get_keyed_list("FLAGS").unwrap().len(), 2);
    let date = items.get_keyed_date("INTERNALDATE").unwrap().unwrap();
    assert_eq!(date.to_rfc3339(), "1996-07-17T02:44:25-07:00");
}

#[test]
fn test_streaming_literal_to_sink() {
    let body = "Subject: hi\r\n\r\n".repeat(50);
    let input = format!(
        "* 1 FETCH (BODY[] {{{}}}\r\n{body} UID 3)\r\nA1 OK\r\n",
        body.len()
    );
    let mut parser = trickling_parser(input.as_bytes());

    let mut sink = Vec::new();
    let mut handler = |_: &Response, literal: &mut dyn Read| -> Result<LiteralAction, LiteralError> {
        let n = io::copy(literal, &mut sink)?;
        Ok(LiteralAction::Substitute(Token::atom(format!("stored:{n}"))))
    };

    let response = parser.read_response_with(&mut handler).unwrap();
    let items = response.get_list(2).unwrap();
    assert_eq!(items.get_string(2).unwrap(), format!("stored:{}", body.len()));
    assert_eq!(items.get_keyed_string("UID"), Some("3"));
    assert_eq!(sink, body.as_bytes());

    assert_eq!(parser.read_response().unwrap().tag(), Some("A1"));
}

#[test]
fn test_handler_sees_preceding_tokens() {
    let input = b"* 7 FETCH {4}\r\nabcd\r\n";
    let mut parser = trickling_parser(input);
    let mut seen = Vec::new();
    let mut handler = |response: &Response, _: &mut dyn Read| -> Result<LiteralAction, LiteralError> {
        seen.push(response.to_string());
        Ok(LiteralAction::Buffer)
    };

    let response = parser.read_response_with(&mut handler).unwrap();
    assert_eq!(response.get_literal(2).unwrap(), &Bytes::from_static(b"abcd"));
    assert_eq!(seen, vec!["* 7 FETCH".to_string()]);
}

#[test]
fn test_handler_failure_keeps_stream_in_sync() {
    let input = b"* 1 FETCH (BODY[] {6}\r\nfoobar)\r\n* 2 FETCH (BODY[] {3}\r\nbaz)\r\nA9 OK\r\n";
    let mut parser = trickling_parser(input);
    let mut calls = 0;
    let mut handler = |_: &Response, literal: &mut dyn Read| -> Result<LiteralAction, LiteralError> {
        calls += 1;
        let mut first = [0u8; 1];
        literal.read_exact(&mut first)?;
        Err(LiteralError::handler(format!("rejected {}", char::from(first[0]))))
    };

    let err = parser.read_response_with(&mut handler).unwrap_err();
    assert!(matches!(err, Error::LiteralHandler { ref source, .. } if source.to_string() == "rejected f"));

    let second = parser.read_response().unwrap();
    assert_eq!(second.get_number(0).unwrap(), 2);
    assert_eq!(
        second.get_list(2).unwrap().get_literal(2).unwrap().as_ref(),
        b"baz"
    );
    assert_eq!(calls, 1);
}

#[test]
fn test_truncated_literal_is_io_error() {
    let mut parser = trickling_parser(b"* {10}\r\nshort");
    let err = parser.read_response().unwrap_err();
    assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
}

fn arb_token() -> impl Strategy<Value = Token> {
    let leaf = prop_oneof![
        "[A-Za-z0-9.\\\\-]{1,8}".prop_map(Token::Atom),
        "[ -~]{0,10}".prop_map(Token::Quoted),
        "[ -~\r\n]{0,16}".prop_map(|s| Token::Literal(Bytes::from(s))),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4)
                .prop_map(|tokens| Token::List(ResponseList::from(tokens))),
            prop::collection::vec(inner, 0..4)
                .prop_map(|tokens| Token::Sequence(ResponseList::from(tokens))),
        ]
    })
}

/// Serializes `tokens` with separators cycled from `gaps`, nested lists included.
fn spaced(tokens: &[Token], gaps: &[String], next: &mut usize) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            out.push_str(&gaps[*next % gaps.len()]);
            *next += 1;
        }
        match token {
            Token::List(list) => {
                out.push('(');
                out.push_str(&spaced(list.as_slice(), gaps, next));
                out.push(')');
            }
            Token::Sequence(list) => {
                out.push('[');
                out.push_str(&spaced(list.as_slice(), gaps, next));
                out.push(']');
            }
            other => out.push_str(&other.to_string()),
        }
    }
    out
}

proptest! {
    #[test]
    fn prop_whitespace_runs_between_tokens(
        tokens in prop::collection::vec(arb_token(), 1..6),
        gaps in prop::collection::vec("[ \t]{1,3}", 1..8),
        trailing in "[ \t]{0,3}",
    ) {
        let list = ResponseList::from(tokens);
        let wire = format!("* {}{trailing}\r\n", spaced(list.as_slice(), &gaps, &mut 0));

        let mut parser = ResponseParser::new(BufReader::with_capacity(3, wire.as_bytes()));
        let response = parser.read_response().unwrap();

        prop_assert!(response.is_completed());
        prop_assert_eq!(parser.position(), wire.len() as u64);
        prop_assert_eq!(response.into_list(), list);
    }

    #[test]
    fn prop_untagged_round_trip(tokens in prop::collection::vec(arb_token(), 0..6)) {
        let list = ResponseList::from(tokens);
        let wire = format!("* {list}\r\n");

        let response = ResponseParser::new(wire.as_bytes()).read_response().unwrap();

        prop_assert!(response.tag().is_none());
        prop_assert!(response.is_completed());
        prop_assert_eq!(response.into_list(), list);
    }

    #[test]
    fn prop_tagged_round_trip(
        tag in "[A-Z][0-9]{1,4}",
        tokens in prop::collection::vec(arb_token(), 1..6),
    ) {
        let list = ResponseList::from(tokens);
        let wire = format!("{tag} {list}\r\n");

        let mut parser = ResponseParser::new(BufReader::with_capacity(2, wire.as_bytes()));
        let response = parser.read_response().unwrap();

        prop_assert_eq!(response.tag(), Some(tag.as_str()));
        prop_assert_eq!(response.to_string(), format!("{tag} {list}"));
        prop_assert_eq!(parser.position(), wire.len() as u64);
    }
}
