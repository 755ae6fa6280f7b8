//! Python source formatting.
//!
//! Every generated file passes through a [`SourceFormatter`] before it is
//! returned, so a file that the formatter rejects is never written.

use std::io::Write;
use std::process::{Command, Stdio};

use apitk_core::config::FormatterKind;

use crate::error::GenerateError;

pub trait SourceFormatter {
    /// Format `source`; `path` is only used for diagnostics.
    fn format(&self, path: &str, source: &str) -> Result<String, GenerateError>;
}

pub fn formatter_for(kind: FormatterKind) -> Box<dyn SourceFormatter> {
    match kind {
        FormatterKind::Builtin => Box::new(CanonicalFormatter),
        FormatterKind::Ruff => Box::new(RuffFormatter::default()),
    }
}

/// Pure-Rust formatter for the subset of Python the templates produce.
///
/// Normalizes line endings, trailing whitespace and blank lines between
/// statements, and rejects sources with unbalanced brackets, unterminated
/// strings or inconsistent indentation. Formatting is idempotent.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalFormatter;

impl SourceFormatter for CanonicalFormatter {
    fn format(&self, path: &str, source: &str) -> Result<String, GenerateError> {
        let source = source.replace("\r\n", "\n").replace('\r', "\n");
        canonicalize(&source).map_err(|(line, message)| format_error(path, &source, line, message))
    }
}

/// Delegates to `ruff format`, reading the source from stdin.
#[derive(Debug, Clone)]
pub struct RuffFormatter {
    pub program: String,
}

impl Default for RuffFormatter {
    fn default() -> Self {
        Self {
            program: "ruff".to_string(),
        }
    }
}

impl SourceFormatter for RuffFormatter {
    fn format(&self, path: &str, source: &str) -> Result<String, GenerateError> {
        let unavailable = |source| GenerateError::FormatterUnavailable {
            command: self.program.clone(),
            source,
        };
        let mut child = Command::new(&self.program)
            .args(["format", "--stdin-filename", path, "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(unavailable)?;

        // Feed stdin from another thread so a full stdout pipe cannot block us.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = source.to_string();
            std::thread::spawn(move || stdin.write_all(input.as_bytes()))
        });
        let output = child.wait_with_output().map_err(unavailable)?;
        if let Some(writer) = writer {
            match writer.join() {
                Ok(result) => result.map_err(unavailable)?,
                Err(_) => log::warn!("{} stdin writer panicked", self.program),
            }
        }

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let line = reported_line(&stderr, path).unwrap_or(1);
        Err(format_error(path, source, line, stderr))
    }
}

/// Line number in a `path:line:column: message` diagnostic.
fn reported_line(stderr: &str, path: &str) -> Option<usize> {
    let (_, rest) = stderr.split_once(&format!("{path}:"))?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn format_error(path: &str, source: &str, line: usize, message: String) -> GenerateError {
    let excerpt = excerpt(source, line);
    log::error!("cannot format {path}: line {line}: {message}\n{excerpt}");
    GenerateError::Format {
        path: path.to_string(),
        line,
        message,
        excerpt,
    }
}

/// Up to three lines either side of `line` (1-based), numbered.
pub fn excerpt(source: &str, line: usize) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let first = line.saturating_sub(3).max(1);
    let last = (line + 3).min(lines.len());
    (first..=last)
        .map(|n| {
            let marker = if n == line { '>' } else { ' ' };
            format!("{marker}{n:>5} | {}", lines[n - 1])
        })
        .collect::<Vec<_>>()
        .join("\n")
}

type Failure = (usize, String);

#[derive(Debug, Clone, Copy)]
struct OpenString {
    quote: char,
    triple: bool,
    line: usize,
}

/// Lexical facts about one physical line.
#[derive(Debug)]
struct LineInfo<'a> {
    text: &'a str,
    /// Inside brackets, a string, or after a backslash continuation.
    continued: bool,
    ends_in_string: bool,
    last_code: Option<char>,
    has_code: bool,
}

fn scan(source: &str) -> Result<Vec<LineInfo<'_>>, Failure> {
    let mut string: Option<OpenString> = None;
    let mut brackets: Vec<(char, usize)> = Vec::new();
    let mut backslash = false;
    let mut infos = Vec::new();

    for (index, text) in source.split('\n').enumerate() {
        let number = index + 1;
        let continued = string.is_some() || !brackets.is_empty() || backslash;
        backslash = false;
        let chars: Vec<char> = text.chars().collect();
        let mut last_code = None;
        let mut has_code = false;
        let mut escaped_eol = false;
        let mut j = 0;

        while j < chars.len() {
            let c = chars[j];
            if let Some(open) = string {
                if c == '\\' {
                    escaped_eol = j + 1 == chars.len();
                    j += 2;
                    continue;
                }
                if c == open.quote && (!open.triple || closes_triple(&chars, j, c)) {
                    j += if open.triple { 3 } else { 1 };
                    string = None;
                    last_code = Some(c);
                    continue;
                }
                j += 1;
                continue;
            }
            match c {
                '#' => break,
                '\'' | '"' => {
                    let triple = closes_triple(&chars, j, c);
                    string = Some(OpenString {
                        quote: c,
                        triple,
                        line: number,
                    });
                    has_code = true;
                    last_code = Some(c);
                    j += if triple { 3 } else { 1 };
                    continue;
                }
                '(' | '[' | '{' => brackets.push((c, number)),
                ')' | ']' | '}' => match brackets.pop() {
                    Some((open, _)) if matching(open) == c => {}
                    Some((open, line)) => {
                        return Err((number, format!("`{c}` does not match `{open}` on line {line}")));
                    }
                    None => return Err((number, format!("unmatched `{c}`"))),
                },
                '\\' if j + 1 == chars.len() => backslash = true,
                _ => {}
            }
            if !c.is_whitespace() && !(c == '\\' && backslash) {
                last_code = Some(c);
                has_code = true;
            }
            j += 1;
        }

        if let Some(open) = string
            && !open.triple
            && !escaped_eol
        {
            return Err((open.line, "unterminated string literal".to_string()));
        }
        infos.push(LineInfo {
            text,
            continued,
            ends_in_string: string.is_some(),
            last_code,
            has_code,
        });
    }

    if let Some(open) = string {
        return Err((open.line, "unterminated triple-quoted string".to_string()));
    }
    if let Some((open, line)) = brackets.pop() {
        return Err((line, format!("`{open}` is never closed")));
    }
    Ok(infos)
}

fn closes_triple(chars: &[char], at: usize, quote: char) -> bool {
    chars.len() >= at + 3 && chars[at + 1] == quote && chars[at + 2] == quote
}

fn matching(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// One logical line and the blank lines that preceded it.
struct Logical {
    start: usize,
    end: usize,
    number: usize,
    indent: usize,
    blanks_before: usize,
    opener: bool,
    comment: bool,
    definition: bool,
    decorator: bool,
}

fn logical_lines(infos: &[LineInfo<'_>]) -> Result<Vec<Logical>, Failure> {
    let mut out = Vec::new();
    let mut blanks = 0;
    let mut i = 0;
    while i < infos.len() {
        let info = &infos[i];
        if info.text.trim().is_empty() {
            blanks += 1;
            i += 1;
            continue;
        }
        let start = i;
        let mut last_code = info.last_code;
        let mut has_code = info.has_code;
        i += 1;
        while i < infos.len() && infos[i].continued {
            last_code = infos[i].last_code.or(last_code);
            has_code |= infos[i].has_code;
            i += 1;
        }

        let leading: &str = &info.text[..info.text.len() - info.text.trim_start().len()];
        let body = info.text.trim_start();
        if has_code && leading.contains('\t') {
            return Err((start + 1, "tab in indentation".to_string()));
        }
        out.push(Logical {
            start,
            end: i,
            number: start + 1,
            indent: leading.chars().count(),
            blanks_before: blanks,
            opener: last_code == Some(':'),
            comment: !has_code,
            definition: ["def ", "async def ", "class "]
                .iter()
                .any(|kw| body.starts_with(kw)),
            decorator: body.starts_with('@'),
        });
        blanks = 0;
    }
    Ok(out)
}

fn check_indentation(lines: &[Logical], total_lines: usize) -> Result<(), Failure> {
    let mut stack = vec![0usize];
    let mut expect_block = false;
    for line in lines.iter().filter(|l| !l.comment) {
        if line.indent % 4 != 0 {
            return Err((line.number, "indentation is not a multiple of four".to_string()));
        }
        let top = stack.last().copied().unwrap_or(0);
        if expect_block {
            if line.indent <= top {
                return Err((line.number, "expected an indented block".to_string()));
            }
            stack.push(line.indent);
        } else if line.indent > top {
            return Err((line.number, "unexpected indent".to_string()));
        } else {
            while stack.last().is_some_and(|&t| t > line.indent) {
                stack.pop();
            }
            if stack.last() != Some(&line.indent) {
                return Err((line.number, "unindent does not match any outer level".to_string()));
            }
        }
        expect_block = line.opener;
    }
    if expect_block {
        return Err((total_lines.max(1), "expected an indented block".to_string()));
    }
    Ok(())
}

fn blank_lines(line: &Logical, prev: Option<&Logical>, top_level_definition: bool) -> usize {
    let Some(prev) = prev else { return 0 };
    if prev.opener || prev.decorator {
        return 0;
    }
    let structural = line.definition || line.decorator;
    let cap = if line.indent == 0 { 2 } else { 1 };
    if prev.comment {
        return line.blanks_before.min(cap);
    }
    if line.indent == 0 && (structural || (prev.indent > 0 && top_level_definition)) {
        return 2;
    }
    if structural {
        return 1;
    }
    line.blanks_before.min(cap)
}

fn canonicalize(source: &str) -> Result<String, Failure> {
    let infos = scan(source)?;
    let lines = logical_lines(&infos)?;
    check_indentation(&lines, infos.len())?;

    let mut out = String::with_capacity(source.len());
    let mut prev: Option<&Logical> = None;
    let mut top_level_definition = false;
    for line in &lines {
        for _ in 0..blank_lines(line, prev, top_level_definition) {
            out.push('\n');
        }
        for info in &infos[line.start..line.end] {
            if info.ends_in_string {
                out.push_str(info.text);
            } else {
                out.push_str(info.text.trim_end());
            }
            out.push('\n');
        }
        if line.indent == 0 && !line.comment {
            top_level_definition = line.definition || line.decorator;
        }
        prev = Some(line);
    }
    Ok(out)
}
