pub fn document_qa_prompt(question: &str, context_blocks: &str) -> String {
    // Keep the contract explicit:
    // - Answer ONLY from the context provided.
    // - If the context does not contain the answer, say so.
    format!(
        r#"You are answering a question about documents a user has uploaded.

Rules (non-negotiable):
1) Use ONLY the context passages provided below. Do not invent facts.
2) If the context does not contain enough information to answer, reply that the uploaded documents do not cover the question.
3) Keep the answer concise and direct.

Question:
{question}

Context passages:
{context_blocks}

Output:
- Return plain text only.
"#
    )
}
