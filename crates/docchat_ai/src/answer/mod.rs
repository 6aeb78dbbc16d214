use docchat_core::error::AppError;

use crate::llm::Llm;
use crate::retrieve::RetrievedChunk;

mod prompts;

/// One retrieval-then-generation round-trip: stuff the retrieved passages
/// into a prompt and ask the model once.
pub fn generate_answer(
    llm: &dyn Llm,
    model: &str,
    question: &str,
    context: &[RetrievedChunk],
) -> Result<String, AppError> {
    if context.is_empty() {
        return Err(AppError::new(
            "AI_ANSWER_FAILED",
            "No context passages were retrieved for the question",
        ));
    }

    let blocks = build_context_blocks(context);
    let prompt = prompts::document_qa_prompt(question, &blocks);
    llm.generate(model, &prompt)
}

fn build_context_blocks(context: &[RetrievedChunk]) -> String {
    let mut blocks: Vec<String> = Vec::new();
    for c in context {
        blocks.push(format!(
            "[{} #{}]\n{}",
            c.filename, c.ordinal, c.text
        ));
    }
    blocks.join("\n\n---\n\n")
}
