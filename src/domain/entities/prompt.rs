use serde::Deserialize;

/// Prompt templates for the condense and answer steps.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    /// Placeholders: `{chat_history}`, `{question}`.
    pub condense_question: String,
    pub qa_system: String,
    /// Placeholders: `{context_str}`, `{query_str}`.
    pub text_qa: String,
    pub empty_response: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            condense_question: "Given a conversation (between Human and Assistant) and a follow \
                up message from Human, rewrite the message to be a standalone question that \
                captures all relevant context from the conversation.\n\n\
                <Chat History>\n{chat_history}\n\n\
                <Follow Up Message>\n{question}\n\n\
                <Standalone question>\n"
                .to_string(),
            qa_system: "You are an expert Q&A system that is trusted around the world.\n\
                Always answer the query using the provided context information, and not prior \
                knowledge.\nSome rules to follow:\n\
                1. Never directly reference the given context in your answer.\n\
                2. Avoid statements like 'Based on the context, ...' or 'The context information \
                ...' or anything along those lines."
                .to_string(),
            text_qa: "Context information is below.\n\
                ---------------------\n{context_str}\n---------------------\n\
                Given the context information and not prior knowledge, answer the query.\n\
                Query: {query_str}\nAnswer: "
                .to_string(),
            empty_response: "Empty Response".to_string(),
        }
    }
}

impl PromptTemplates {
    pub fn render_condense(&self, chat_history: &str, question: &str) -> String {
        self.condense_question
            .replace("{chat_history}", chat_history)
            .replace("{question}", question)
    }

    pub fn render_text_qa(&self, context: &str, query: &str) -> String {
        self.text_qa
            .replace("{context_str}", context)
            .replace("{query_str}", query)
    }
}
