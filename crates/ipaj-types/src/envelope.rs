/// Chat message envelope carrying an optional extracted document alongside the
/// user's question.
///
/// On the wire the envelope is a single string:
///
/// ```text
/// DOCUMENT PARA ANÁLISE: """<context>""" PERGUNTA JURÍDICA: <question>
/// ```
///
/// A message without context is sent as the bare question. Inside the context,
/// the third quote of any `"""` run goes out as `\"`, and a backslash run
/// that directly follows two quotes is doubled when a quote or the end of the
/// block comes next. Everything else, including lone quotes and Windows paths,
/// is sent byte-for-byte.
use std::iter::repeat_n;

use serde::{Deserialize, Serialize};

pub const CONTEXT_OPEN: &str = "DOCUMENT PARA ANÁLISE: \"\"\"";
pub const CONTEXT_CLOSE: &str = "\"\"\" PERGUNTA JURÍDICA: ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEnvelope {
    pub context: Option<String>,
    pub question: String,
}

impl DocumentEnvelope {
    pub fn question(question: impl Into<String>) -> Self {
        Self { context: None, question: question.into() }
    }

    pub fn with_context(context: impl Into<String>, question: impl Into<String>) -> Self {
        Self { context: Some(context.into()), question: question.into() }
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    pub fn encode(&self) -> String {
        match &self.context {
            None => self.question.clone(),
            Some(context) => {
                let mut out = String::with_capacity(
                    CONTEXT_OPEN.len() + context.len() + CONTEXT_CLOSE.len() + self.question.len(),
                );
                out.push_str(CONTEXT_OPEN);
                escape_context(context, &mut out);
                out.push_str(CONTEXT_CLOSE);
                out.push_str(&self.question);
                out
            }
        }
    }

    /// Parse a wire message. Anything that is not a well-formed envelope is
    /// treated as a plain question.
    pub fn decode(message: &str) -> Self {
        match decode_context(message) {
            Some((context, question)) => Self::with_context(context, question),
            None => Self::question(message),
        }
    }

    /// Prompt text handed to the completion model.
    pub fn render_for_model(&self) -> String {
        match &self.context {
            None => self.question.clone(),
            Some(context) => format!(
                "DOCUMENT PARA ANÁLISE:\n\"\"\"\n{}\n\"\"\"\n\nPERGUNTA JURÍDICA: {}",
                context.trim(),
                self.question
            ),
        }
    }
}

fn escape_context(context: &str, out: &mut String) {
    let chars: Vec<char> = context.chars().collect();
    // Raw quotes at the end of `out`
    let mut quotes = 0;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '"' if quotes == 2 => {
                out.push_str("\\\"");
                quotes = 0;
            }
            '"' => {
                out.push('"');
                quotes += 1;
            }
            '\\' => {
                let start = i;
                while chars.get(i + 1) == Some(&'\\') {
                    i += 1;
                }
                let run = i - start + 1;
                let quote_next = chars.get(i + 1).is_none_or(|&c| c == '"');
                let width = if quotes == 2 && quote_next { run * 2 } else { run };
                out.extend(repeat_n('\\', width));
                quotes = 0;
            }
            ch => {
                out.push(ch);
                quotes = 0;
            }
        }
        i += 1;
    }
}

fn decode_context(message: &str) -> Option<(String, String)> {
    let mut rest = message.strip_prefix(CONTEXT_OPEN)?;
    let mut context = String::new();
    let mut quotes = 0;

    loop {
        let ch = rest.chars().next()?;
        match ch {
            '"' => {
                if let Some(question) = rest.strip_prefix(CONTEXT_CLOSE) {
                    return Some((context, question.to_string()));
                }
                context.push('"');
                quotes += 1;
                rest = &rest[1..];
            }
            '\\' => {
                let after = rest.trim_start_matches('\\');
                let run = rest.len() - after.len();
                if quotes == 2 && after.starts_with('"') {
                    context.extend(repeat_n('\\', run / 2));
                    if run % 2 == 1 {
                        context.push('"');
                        rest = &after[1..];
                    } else {
                        rest = after;
                    }
                } else {
                    context.extend(repeat_n('\\', run));
                    rest = after;
                }
                quotes = 0;
            }
            _ => {
                context.push(ch);
                quotes = 0;
                rest = &rest[ch.len_utf8()..];
            }
        }
    }
}
