//! GDB/MI output records.
//!
//! Parses one line of gdb's machine-interface output into a record, a
//! stream record, the `(gdb)` prompt, or anything else (inferior output).

use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiValue {
    Const(String),
    Tuple(Vec<(String, MiValue)>),
    List(Vec<MiValue>),
}

impl MiValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MiValue::Const(s) => Some(s),
            _ => None,
        }
    }

    /// Field lookup on a tuple.
    pub fn get(&self, key: &str) -> Option<&MiValue> {
        match self {
            MiValue::Tuple(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// `^done`, `^running`, `^error`, `^exit`, ...
    Result,
    /// `*stopped`, `*running`
    Exec,
    /// `+download`
    Status,
    /// `=thread-created`, `=library-loaded`, ...
    Notify,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiRecord {
    pub token: Option<u64>,
    pub kind: RecordKind,
    pub class: String,
    pub results: Vec<(String, MiValue)>,
}

impl MiRecord {
    pub fn get(&self, key: &str) -> Option<&MiValue> {
        self.results.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(MiValue::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiLine {
    Record(MiRecord),
    /// `~` console, `@` target, `&` log stream text.
    Stream { channel: char, text: String },
    Prompt,
    /// Not MI: usually output of the inferior sharing gdb's stdout.
    Other(String),
}

pub fn parse_line(line: &str) -> MiLine {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim_end() == "(gdb)" {
        return MiLine::Prompt;
    }
    parse_record(line).unwrap_or_else(|| MiLine::Other(line.to_string()))
}

fn parse_record(line: &str) -> Option<MiLine> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    let token = if digits > 0 {
        Some(line[..digits].parse().ok()?)
    } else {
        None
    };
    let rest = &line[digits..];
    let mut chars = rest.chars();
    let sigil = chars.next()?;

    if token.is_none() && matches!(sigil, '~' | '@' | '&') {
        let mut p = Parser::new(chars.as_str());
        let text = p.c_string()?;
        return p.at_end().then_some(MiLine::Stream { channel: sigil, text });
    }

    let kind = match sigil {
        '^' => RecordKind::Result,
        '*' => RecordKind::Exec,
        '+' => RecordKind::Status,
        '=' => RecordKind::Notify,
        _ => return None,
    };

    let body = chars.as_str();
    let (class, tail) = match body.find(',') {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };
    if class.is_empty() || !class.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return None;
    }

    let results = match tail {
        Some(tail) => {
            let mut p = Parser::new(tail);
            let results = p.results_until(None)?;
            if !p.at_end() {
                return None;
            }
            results
        }
        None => Vec::new(),
    };

    Some(MiLine::Record(MiRecord {
        token,
        kind,
        class: class.to_string(),
        results,
    }))
}

struct Parser<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    fn at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn eat(&mut self, expected: char) -> Option<()> {
        match self.chars.next() {
            Some((_, c)) if c == expected => Some(()),
            _ => None,
        }
    }

    /// `result ("," result)*`, stopping before `close` (or at end of input).
    fn results_until(&mut self, close: Option<char>) -> Option<Vec<(String, MiValue)>> {
        let mut out = Vec::new();
        if self.peek() == close {
            return Some(out);
        }
        loop {
            out.push(self.result()?);
            match self.peek() {
                Some(',') => {
                    self.chars.next();
                }
                c if c == close => return Some(out),
                _ => return None,
            }
        }
    }

    fn result(&mut self) -> Option<(String, MiValue)> {
        let start = self.chars.peek()?.0;
        let mut end = start;
        while let Some(&(idx, c)) = self.chars.peek() {
            if c == '=' {
                break;
            }
            if !(c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                return None;
            }
            end = idx + c.len_utf8();
            self.chars.next();
        }
        if end == start {
            return None;
        }
        let name = self.src[start..end].to_string();
        self.eat('=')?;
        Some((name, self.value()?))
    }

    fn value(&mut self) -> Option<MiValue> {
        match self.peek()? {
            '"' => self.c_string().map(MiValue::Const),
            '{' => {
                self.chars.next();
                let fields = self.results_until(Some('}'))?;
                self.eat('}')?;
                Some(MiValue::Tuple(fields))
            }
            '[' => {
                self.chars.next();
                let items = self.list_items()?;
                self.eat(']')?;
                Some(MiValue::List(items))
            }
            _ => None,
        }
    }

    /// List elements are either all values or all `name=value` results;
    /// results are kept as single-field tuples.
    fn list_items(&mut self) -> Option<Vec<MiValue>> {
        let mut items = Vec::new();
        if self.peek() == Some(']') {
            return Some(items);
        }
        loop {
            let item = match self.peek()? {
                '"' | '{' | '[' => self.value()?,
                _ => {
                    let (name, value) = self.result()?;
                    MiValue::Tuple(vec![(name, value)])
                }
            };
            items.push(item);
            match self.peek()? {
                ',' => {
                    self.chars.next();
                }
                ']' => return Some(items),
                _ => return None,
            }
        }
    }

    fn c_string(&mut self) -> Option<String> {
        self.eat('"')?;
        let mut out = String::new();
        loop {
            let (_, c) = self.chars.next()?;
            match c {
                '"' => return Some(out),
                '\\' => {
                    let (_, esc) = self.chars.next()?;
                    match esc {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '\\' => out.push('\\'),
                        '"' => out.push('"'),
                        '0'..='7' => {
                            let mut code = esc.to_digit(8)?;
                            for _ in 0..2 {
                                match self.peek() {
                                    Some(d @ '0'..='7') => {
                                        code = code * 8 + d.to_digit(8)?;
                                        self.chars.next();
                                    }
                                    _ => break,
                                }
                            }
                            out.push(char::from_u32(code)?);
                        }
                        other => out.push(other),
                    }
                }
                c => out.push(c),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: &str) -> MiRecord {
        match parse_line(line) {
            MiLine::Record(r) => r,
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn test_prompt_and_plain_output() {
        assert_eq!(parse_line("(gdb) "), MiLine::Prompt);
        assert_eq!(parse_line("Hello, world!"), MiLine::Other("Hello, world!".to_string()));
        assert_eq!(parse_line("42 is the answer"), MiLine::Other("42 is the answer".to_string()));
    }

    #[test]
    fn test_result_with_token() {
        let r = record("12^done");
        assert_eq!(r.token, Some(12));
        assert_eq!(r.kind, RecordKind::Result);
        assert_eq!(r.class, "done");
        assert!(r.results.is_empty());
    }

    #[test]
    fn test_error_message_unescaped() {
        let r = record(r#"3^error,msg="No symbol \"foo\" in current context.""#);
        assert_eq!(r.class, "error");
        assert_eq!(r.get_str("msg"), Some("No symbol \"foo\" in current context."));
    }

    #[test]
    fn test_stack_info_frame() {
        let r = record(
            r#"7^done,frame={level="0",addr="0x0000555555555149",func="main",file="gol.c",fullname="/home/u/gol.c",line="10",arch="i386:x86-64"}"#,
        );
        let frame = r.get("frame").unwrap();
        assert_eq!(frame.get("file").and_then(MiValue::as_str), Some("gol.c"));
        assert_eq!(frame.get("line").and_then(MiValue::as_str), Some("10"));
    }

    #[test]
    fn test_stopped_with_args_list() {
        let r = record(
            r#"*stopped,reason="end-stepping-range",frame={addr="0x1",func="f",args=[{name="n",value="3"}],file="a.c",line="4"},thread-id="1",stopped-threads="all""#,
        );
        assert_eq!(r.kind, RecordKind::Exec);
        assert_eq!(r.class, "stopped");
        assert_eq!(r.get_str("reason"), Some("end-stepping-range"));
        let args = r.get("frame").and_then(|f| f.get("args")).unwrap();
        assert!(matches!(args, MiValue::List(items) if items.len() == 1));
    }

    #[test]
    fn test_exited_and_result_list() {
        let r = record(r#"*stopped,reason="exited",exit-code="01""#);
        assert_eq!(r.get_str("exit-code"), Some("01"));
        let r = record(r#"^done,stack=[frame={level="0"},frame={level="1"}]"#);
        assert!(matches!(r.get("stack"), Some(MiValue::List(items)) if items.len() == 2));
    }

    #[test]
    fn test_stream_records() {
        assert_eq!(
            parse_line(r#"~"Temporary breakpoint 1, main () at gol.c:10\n""#),
            MiLine::Stream {
                channel: '~',
                text: "Temporary breakpoint 1, main () at gol.c:10\n".to_string()
            }
        );
        assert_eq!(
            parse_line(r#"&"\101\tb""#),
            MiLine::Stream { channel: '&', text: "A\tb".to_string() }
        );
    }

    #[test]
    fn test_malformed_is_other() {
        assert!(matches!(parse_line("^done,frame={level="), MiLine::Other(_)));
        assert!(matches!(parse_line("*"), MiLine::Other(_)));
        assert!(matches!(parse_line("=hello world"), MiLine::Other(_)));
    }
}
