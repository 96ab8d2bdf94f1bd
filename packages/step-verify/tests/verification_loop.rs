//! Integration tests for the verification loop.
//!
//! These tests drive the public API end to end:
//! 1. Segment a rationale into steps
//! 2. Classify each step with a scripted classifier
//! 3. Collect retry signals
//! 4. Backtrack and answer through the conversational wrapper

use step_verify::{
    rationale_to_steps, split_segments, Answer, Backtracker, ChainVerifier, LabelPolicy, MockAI,
    ScriptedClassifier, ScriptedGenerator, StepType, VerificationStatus, VerifiedQa, VerifyConfig,
    VerifyError,
};

const VALID: StepType = StepType::NecessaryEssentialAndValid;

#[test]
fn test_abbreviation_does_not_split() {
    let steps = rationale_to_steps("Dr. Smith arrived. He left soon.");

    let texts: Vec<_> = steps.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["Dr. Smith arrived.", "He left soon."]);
}

#[test]
fn test_segments_reconstruct_original() {
    let text = "Aspirin thins blood.  It lowers clot risk?\nSo strokes fall. Done";
    let rebuilt: String = split_segments(text)
        .iter()
        .map(|s| format!("{}{}", s.text, s.separator.unwrap_or("")))
        .collect();

    assert_eq!(rebuilt, text);
}

#[test]
fn test_empty_rationale_has_no_steps() {
    assert!(rationale_to_steps("").is_empty());
    assert!(rationale_to_steps("   \n").is_empty());
}

#[tokio::test]
async fn test_previous_step_is_literal_preceding_text() {
    let classifier = ScriptedClassifier::new(vec![VALID, StepType::Unnecessary, VALID]);
    let verifier = ChainVerifier::new(classifier);
    let steps = rationale_to_steps("First fact. Second fact. Third fact.");

    let verdict = verifier.verify("objective", "question", &steps).await.unwrap();

    let requests = verifier.classifier().requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].previous_step, "");
    assert_eq!(requests[1].previous_step, "First fact.");
    assert_eq!(requests[2].previous_step, "Second fact.");
    assert_eq!(requests[2].current_step, "Third fact.");

    assert_eq!(verdict.retries.len(), 1);
    assert_eq!(verdict.retries[0].step_index, 1);
    assert_eq!(verdict.steps.len(), 3);
}

#[tokio::test]
async fn test_all_valid_emits_no_retries() {
    let verifier = ChainVerifier::new(ScriptedClassifier::new(vec![VALID, VALID, VALID]));
    let steps = rationale_to_steps("A is true. B follows. C holds.");

    let verdict = verifier.verify("o", "q", &steps).await.unwrap();

    assert!(verdict.passed());
    assert!(verdict.retries.is_empty());
}

#[tokio::test]
async fn test_unknown_label_policy() {
    let steps = rationale_to_steps("One. Two.");

    let strict = ChainVerifier::new(ScriptedClassifier::raw(vec!["valid-ish".into()]));
    let err = strict.verify("o", "q", &steps).await.unwrap_err();
    assert!(matches!(
        err,
        VerifyError::ContractViolation { step_index: 0, .. }
    ));

    let lenient = ChainVerifier::new(ScriptedClassifier::raw(vec!["valid-ish".into()]))
        .with_label_policy(LabelPolicy::TreatAsInvalid);
    let verdict = lenient.verify("o", "q", &steps).await.unwrap();
    assert_eq!(verdict.failed_indices(), vec![0]);
    assert_eq!(verdict.retries[0].label, None);
    assert_eq!(verdict.retries[0].raw_label, "valid-ish");
}

#[tokio::test]
async fn test_question_answered_after_backtracking() {
    let generator = ScriptedGenerator::new(vec![
        Answer::new("No.", "Statins raise LDL. So no."),
        Answer::new("Yes.", "Statins lower LDL. Lower LDL reduces events. So yes."),
    ]);
    let classifier = ScriptedClassifier::always(VALID)
        .with_label_for("Statins raise LDL.", StepType::NotBackedByPriorFacts);

    let backtracker = Backtracker::new(generator, classifier, VerifyConfig::default()).unwrap();
    let ai = MockAI::new();
    let qa = VerifiedQa::new(ai.clone(), ai, backtracker);

    let outcome = qa.ask("Do statins help?").await.unwrap();

    assert_eq!(outcome.verified.status, VerificationStatus::Verified);
    assert_eq!(outcome.verified.attempts, 2);
    assert_eq!(outcome.verified.answer.answer, "Yes.");
    assert_eq!(outcome.reply, "You asked \"Do statins help?\". Yes.");

    let feedback = qa.backtracker().generator().requests()[1]
        .feedback
        .clone()
        .unwrap();
    assert!(feedback.contains("not_backed_by_prior_facts"));
}
