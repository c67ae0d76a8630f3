//! Instruction template sent to the model for each message.
//!
//! Slot values are substituted verbatim: no escaping, and a value that itself
//! contains slot markers is never expanded a second time.

/// Bump when the template text changes so output drift can be traced to it.
pub const TEMPLATE_VERSION: &str = "triage-v1";

const TRIAGE_TEMPLATE_TEXT: &str = r#"ROLE: You are an email triage assistant. Output VALID JSON only.

INPUT
Subject: {subject}
From: {sender}
Body:
<<<BODY>>>
{body}
<<<END>>>

TASK
- Summarize in 2–4 sentences.
- Set priority = high|medium|low (consider deadlines, VIPs, money, interviews).
- Provide 1–3 concise reasons.
- Suggest 0–2 actions chosen from:
  - { "type":"label", "label":"EA/Summary" }
  - { "type":"label", "label":"EA/Priority/High" }
  - { "type":"label", "label":"EA/Priority/Med" }
  - { "type":"label", "label":"EA/Priority/Low" }
  - { "type":"label", "label":"EA/Action/Follow-Up" }
  - { "type":"reply_draft", "title":"...", "body":"..." }

OUTPUT (JSON ONLY; no markdown, no code fences)
{"summary":"","priority":"","reasons":[],"suggested_actions":[]}"#;

pub const TRIAGE_TEMPLATE: PromptTemplate = PromptTemplate::new(TRIAGE_TEMPLATE_TEXT);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Subject,
    Sender,
    Body,
}

impl Slot {
    const ALL: [Slot; 3] = [Slot::Subject, Slot::Sender, Slot::Body];

    fn marker(self) -> &'static str {
        match self {
            Slot::Subject => "{subject}",
            Slot::Sender => "{sender}",
            Slot::Body => "{body}",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PromptFields<'a> {
    pub subject: &'a str,
    pub sender: &'a str,
    pub body: &'a str,
}

impl PromptFields<'_> {
    fn value(&self, slot: Slot) -> &str {
        match slot {
            Slot::Subject => self.subject,
            Slot::Sender => self.sender,
            Slot::Body => self.body,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    text: &'static str,
}

impl PromptTemplate {
    pub const fn new(text: &'static str) -> Self {
        Self { text }
    }

    pub fn text(&self) -> &'static str {
        self.text
    }

    pub fn render(&self, fields: &PromptFields<'_>) -> String {
        let extra = fields.subject.len() + fields.sender.len() + fields.body.len();
        let mut out = String::with_capacity(self.text.len() + extra);
        let mut rest = self.text;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];

            match Slot::ALL.iter().find(|slot| tail.starts_with(slot.marker())) {
                Some(slot) => {
                    out.push_str(fields.value(*slot));
                    rest = &tail[slot.marker().len()..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }

        out.push_str(rest);
        out
    }
}

pub fn build_prompt(subject: &str, sender: &str, body: &str) -> String {
    TRIAGE_TEMPLATE.render(&PromptFields {
        subject,
        sender,
        body,
    })
}
