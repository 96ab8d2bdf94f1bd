//! LLM prompts for verification and evidence extraction.
//!
//! Templates use `{placeholder}` substitution. Wording is not a contract;
//! the structured output shapes are.

use crate::types::{
    evidence::{IcoTriple, ScoredRecord},
    step::StepType,
    verdict::ChainVerdict,
};

/// System prompt for understanding a user message.
pub const UNDERSTAND_SYSTEM: &str = "You read a user's message in the context of an ongoing chat \
and describe the underlying intent and objective. Leave the rephrasing empty unless it helps.";

/// User prompt for understanding a user message.
pub const UNDERSTAND_PROMPT: &str = r#"Conversational history till now:
{chat}

New message by the user:
{message}"#;

/// System prompt for chain-of-thought generation.
pub const GENERATE_SYSTEM: &str = "Answer the question. Think step by step and write your \
reasoning as short declarative sentences, each ending with a period, before giving the answer.";

/// User prompt for chain-of-thought generation.
pub const GENERATE_PROMPT: &str = r#"Question:
{question}
{feedback}"#;

/// System prompt for step classification.
pub const STEP_VERIFICATION_SYSTEM: &str = "You verify one step of a chain of thought. Judge \
whether the current step is necessary for reaching the answer and is logically and factually \
valid given the previous step.";

/// User prompt for step classification.
pub const STEP_VERIFICATION_PROMPT: &str = r#"Objective: {objective}
Question: {question}
Previous step: {previous_step}
Current step: {current_step}

step_annotation must be one of the following values: {labels}"#;

/// System prompt for the conversational reply.
pub const CONVERSATIONAL_SYSTEM: &str =
    "Respond to the user in a conversational style, based on the given rationale.";

/// User prompt for the conversational reply.
pub const CONVERSATIONAL_PROMPT: &str = r#"Raw message from user: {raw_message}

Structured message:
{structured_message}

Rationale behind the conversational response:
{rationale}"#;

/// System prompt for ICO extraction.
pub const ICO_SYSTEM: &str =
    "Extract ICO (Intervention, Comparator, Outcome) from medical texts.";

/// System prompt for reference extraction.
pub const REFERENCES_SYSTEM: &str =
    "Extract the references cited in the given article. Return each reference as plain text.";

/// Evidence extractor role.
pub const EVIDENCE_EXTRACTOR_SYSTEM: &str = r#"You are a Document Evidence Extractor. Find the document evidence text that matches each of the given Intervention, Comparator, and Outcome.
Always answer in this format, followed by the word TERMINATE on its own line:
- Original evidences, comma-separated: [list of unchanged original evidences from the document]"#;

/// Evidence suggester role.
pub const EVIDENCE_SUGGESTER_SYSTEM: &str = r#"You are an Additional Info Suggester. Find additional information in the document that supports the evidences extracted for Intervention, Comparator, Outcome:
- outcome descriptions and data, statistical analyses, mechanisms of action, comparative efficacy and safety, discussion and critique;
- direct quotations about effectiveness or drawbacks of the intervention versus the comparator, with emphasis on the outcome.
End your response with the word TERMINATE on its own line."#;

/// Evidence aggregator role.
pub const EVIDENCE_AGGREGATOR_SYSTEM: &str = r#"You are an Aggregator. Aggregate the full original evidence and the full additional information for Intervention, Comparator, Outcome.
Answer in this format, ending with the word TERMINATE on its own line:
- [LIST OF ORIGINAL EVIDENCES]
- [LIST OF ADDITIONAL INFORMATION]"#;

/// Word the evidence roles use to mark the end of their turn.
pub const TERMINATION_WORD: &str = "TERMINATE";

/// System prompt for outcome verification.
pub const OUTCOME_SYSTEM: &str = "Verify the evidence regarding the outcome based on the ICO and \
related article content. Conclude: significant increase, significant decrease, or no \
significant difference.";

pub fn format_understand_prompt(chat: &[String], message: &str) -> String {
    let chat_text = if chat.is_empty() {
        "(empty)".to_string()
    } else {
        chat.join("\n")
    };

    UNDERSTAND_PROMPT
        .replace("{chat}", &chat_text)
        .replace("{message}", message)
}

pub fn format_generate_prompt(question: &str, feedback: Option<&str>) -> String {
    let feedback_section = match feedback {
        Some(f) if !f.is_empty() => format!("\nA previous attempt was rejected:\n{}", f),
        _ => String::new(),
    };

    GENERATE_PROMPT
        .replace("{question}", question)
        .replace("{feedback}", &feedback_section)
}

pub fn format_step_verification_prompt(
    objective: &str,
    question: &str,
    previous_step: &str,
    current_step: &str,
) -> String {
    STEP_VERIFICATION_PROMPT
        .replace("{objective}", objective)
        .replace("{question}", question)
        .replace("{previous_step}", previous_step)
        .replace("{current_step}", current_step)
        .replace("{labels}", &StepType::allowed_values())
}

pub fn format_conversational_prompt(
    raw_message: &str,
    structured_message: &str,
    rationale: &str,
) -> String {
    CONVERSATIONAL_PROMPT
        .replace("{raw_message}", raw_message)
        .replace("{structured_message}", structured_message)
        .replace("{rationale}", rationale)
}

/// Describe why a rationale was rejected, for the next generation attempt.
pub fn format_retry_feedback(verdict: &ChainVerdict) -> String {
    let mut lines: Vec<String> = verdict
        .retries
        .iter()
        .map(|signal| {
            let text = verdict
                .steps
                .iter()
                .find(|s| s.index == signal.step_index)
                .map(|s| s.text.as_str())
                .unwrap_or("");
            format!("- step {} ({}): {}", signal.step_index + 1, signal.raw_label, text)
        })
        .collect();

    if let Some(first) = verdict.retries.first() {
        lines.push(first.reason.clone());
    }

    lines.join("\n")
}

pub fn format_evidence_task(document: &str, ico: &IcoTriple) -> String {
    format!(
        "Find matching document evidence sentences from the clinical trial document for each of Intervention, Comparator, Outcome.\nClinical trial document: {}\nICO details: {}",
        document, ico
    )
}

pub fn format_suggester_task(document: &str, extracted: &str) -> String {
    format!(
        "Find additional document information from the clinical trial document which supports the evidence sentences extracted so far for Intervention, Comparator, Outcome.\nClinical trial document: {}\nEvidence so far:\n{}",
        document, extracted
    )
}

pub fn format_aggregator_task(extracted: &str, suggested: &str) -> String {
    format!(
        "Aggregate the document evidence sentences and additional information collected for each of Intervention, Comparator, Outcome.\nEvidence:\n{}\nAdditional information:\n{}",
        extracted, suggested
    )
}

pub fn format_outcome_prompt(ico: &IcoTriple, related: &[ScoredRecord]) -> String {
    let articles = related
        .iter()
        .map(|r| {
            let comparisons = r
                .record
                .comparisons
                .iter()
                .map(|c| format!("compared with {}: {}", c.comparator, c.outcome))
                .collect::<Vec<_>>()
                .join("\n");
            let refs = r
                .record
                .references
                .iter()
                .map(|reference| reference.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "[similarity {:.3}] Intervention: {}\n{}\n{}",
                r.score, r.record.ico.intervention, comparisons, refs
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n");

    format!("ICO data: {}\n\nArticle content:\n{}", ico.embedding_text(), articles)
}

/// Drop a trailing termination line from a role's reply.
pub fn strip_termination(content: &str) -> String {
    let mut lines: Vec<&str> = content.trim_end().lines().collect();
    if lines.last().is_some_and(|l| l.contains(TERMINATION_WORD)) {
        lines.pop();
    }
    lines.join("\n")
}
