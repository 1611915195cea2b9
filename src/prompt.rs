//! Prompt construction for the three generation tasks.
//!
//! Each task has a fixed instruction template (persona, refusal
//! policy, formatting policy, a fixed fallback phrase for missing
//! context) filled with the assembled context and the user's query.
//! The refusal policy is a content contract enforced by the language
//! model, not here; this module never inspects topic relevance.

use std::str::FromStr;

use crate::error::PipelineError;

/// The closed set of generation tasks. Each selects both a template
/// and, downstream, a target model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    Explain,
    Quiz,
    Summary,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explain => "explain",
            Self::Quiz => "quiz",
            Self::Summary => "summary",
        }
    }
}

impl FromStr for TaskType {
    type Err = PipelineError;

    /// Case-insensitive parse, rejecting anything outside the closed
    /// set at the boundary.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "explain" => Ok(Self::Explain),
            "quiz" => Ok(Self::Quiz),
            "summary" => Ok(Self::Summary),
            other => Err(PipelineError::UnsupportedTask(format!(
                "Invalid task type '{}'. Valid options are: explain, quiz, summary",
                other
            ))),
        }
    }
}

/// Render the instruction template for `task` with the given context
/// and query. Pure: identical inputs produce identical prompts.
pub fn build_prompt(context: &str, query: &str, task: TaskType) -> String {
    match task {
        TaskType::Explain => explanation_prompt(context, query),
        TaskType::Quiz => quiz_prompt(context, query),
        TaskType::Summary => summary_prompt(context, query),
    }
}

fn explanation_prompt(context: &str, question: &str) -> String {
    format!(
        concat!(
            "You are FinEduGuide, a specialized AI assistant expert for banking and financial education ",
            "that helps users by answering their questions based on the provided context.\n",
            "Use the following pieces of context to answer the question at the end.\n",
            "Analyze the question. If it is NOT related to banking, finance, economics, or the provided ",
            "context, you MUST refuse to answer with a refusal message like 'I am FinEduGuide, designed ",
            "to assist only with financial education topics. I cannot answer questions regarding...'\n",
            "If you don't know the answer, respond like 'I could not find relevant information to answer ",
            "your question based on my knowledge base...', don't try to make up an answer.\n",
            "Always respond politely and format your answer clearly.\n\n",
            "Context:\n{context}\n\n",
            "Question: {question}\n",
            "Answer:"
        ),
        context = context,
        question = question
    )
}

fn quiz_prompt(context: &str, topic: &str) -> String {
    format!(
        concat!(
            "You are FinEduGuide, a specialized AI assistant expert for banking and financial education ",
            "that helps users by generating quizzes based on the provided context.\n\n",
            "Use the following pieces of context to generate quiz questions.\n",
            "Analyze the topic. If it is NOT related to banking, finance, economics, or the provided ",
            "context, you MUST refuse to answer.\n",
            "Generate multiple-choice questions with 4 options (A, B, C, D) and clearly indicate the ",
            "correct answer for each question.\n",
            "Format each question as:\n",
            "Q1. [Question text]\n",
            "A) [Option A]\n",
            "B) [Option B]\n",
            "C) [Option C]\n",
            "D) [Option D]\n",
            "Correct Answer: [Letter]\n\n",
            "If you don't have enough context, respond like: 'I could not find relevant information to ",
            "create quiz based on my knowledge base...'\n",
            "Always respond politely and format your quiz clearly.\n\n",
            "Context:\n{context}\n\n",
            "Topic: {topic}\n\n",
            "Generate the quiz questions below:"
        ),
        context = context,
        topic = topic
    )
}

fn summary_prompt(context: &str, topic: &str) -> String {
    format!(
        concat!(
            "You are FinEduGuide, a specialized AI assistant expert for banking and financial education ",
            "that helps users by summarizing content based on the provided context.\n",
            "Use the following pieces of context to generate a concise summary.\n",
            "Analyze the question. If it is NOT related to banking, finance, economics, or the provided ",
            "context, you MUST refuse to answer.\n",
            "Provide a clear and concise summary of the key points.\n",
            "If you don't know the answer, just respond like: 'I could not find relevant information to ",
            "create a summary based on my knowledge base...', don't try to make up an answer.\n",
            "Always respond politely and format your summary clearly.\n\n",
            "Context:\n{context}\n\n",
            "Topic: {topic}\n",
            "Summary:"
        ),
        context = context,
        topic = topic
    )
}
