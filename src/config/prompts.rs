//! Prompt templates for Laer.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub qa: QaPrompts,
    pub quiz: QuizPrompts,
    pub grading: GradingPrompts,
    pub notes: NotesPrompts,
}

/// Prompts for grounded question answering and topic extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaPrompts {
    pub answer: String,
    pub topic: String,
}

impl Default for QaPrompts {
    fn default() -> Self {
        Self {
            answer: r#"You are an AI teaching assistant helping a student understand a YouTube video lecture.

Context from the video:
{{context}}

Student's question: {{question}}

Provide a clear, helpful answer based on the video content. If the context doesn't contain enough information to answer the question, say so politely and suggest what the student might look for in the video.

NOTE:
- The answer should be in natural language like that of a human tutor, and can be said in conversations.
- If the student asks about a topic totally unrelated to the video, respond with something witty and short that steers them back to the material.
- If the student asks about a topic related to the video but the answer is not found in the context, respond with a sentence implying this is out of scope, e.g. "The video does not cover this topic in detail, but you might want to explore it from other resources or an advanced video later."
- Keep the answer concise and to the point.

Answer:"#
                .to_string(),

            topic: r#"Extract the main topic or concept being discussed in this Q&A exchange.
Respond with just the topic name (2-4 words maximum).

Question: {{question}}
Answer: {{answer}}

Topic:"#
                .to_string(),
        }
    }
}

/// Prompts for quiz generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizPrompts {
    /// Used when the session has no recorded doubts.
    pub general: String,
    /// Used when doubts exist and weak topics should be prioritized.
    pub personalized: String,
}

impl Default for QuizPrompts {
    fn default() -> Self {
        Self {
            general: r#"Generate a quiz based on the following video lecture content.

Video content context:
<VideoContentContext>
{{context}}
</VideoContentContext>

Generate {{num_questions}} Multiple Choice Questions (MCQ) that cover the key concepts and main topics of the video.

Requirements:
- All questions must be Multiple Choice Questions (MCQ).
- Do NOT generate Short Answer questions.
- Cover a diverse range of topics from the provided text.
- Provide 4 options (A, B, C, D) for each question.

Return ONLY a valid JSON object with this exact structure:
{
    "questions": [
        {
            "question_id": "unique_id",
            "question_text": "question here",
            "question_type": "mcq",
            "options": ["A", "B", "C", "D"],
            "correct_answer": "correct option text",
            "topic": "topic name"
        }
    ]
}

Generate the quiz now:"#
                .to_string(),

            personalized: r#"Generate a personalized quiz for a student who has been learning from a video lecture.

Video content context:
<VideoContentContext>
{{context}}
</VideoContentContext>

The student asked these questions during the video (Weak Areas), ONLY AND ONLY IF THEY ARE RELEVANT TO THE VIDEO CONTENT:
<WeakTopics>
{{weak_topics}}
</WeakTopics>

Generate {{num_questions}} Multiple Choice Questions (MCQ).
1. Prioritize questions that test the concepts related to the student's doubts (Weak Areas).
2. Fill the remaining questions with other key concepts from the video context.

Requirements:
- All questions must be Multiple Choice Questions (MCQ).
- Do NOT generate Short Answer questions.
- Prioritize weak topics with at least 50% of questions from these areas.
- Cover a diverse range of topics from the provided text.
- Provide 4 options (A, B, C, D) for each question.

Return ONLY a valid JSON object with this exact structure:
{
    "questions": [
        {
            "question_id": "unique_id",
            "question_text": "question here",
            "question_type": "mcq",
            "options": ["A", "B", "C", "D"],
            "correct_answer": "correct option text",
            "topic": "topic name"
        }
    ]
}

Generate the quiz now:"#
                .to_string(),
        }
    }
}

/// Prompts for short-answer grading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingPrompts {
    pub short_answer: String,
}

impl Default for GradingPrompts {
    fn default() -> Self {
        Self {
            short_answer: r#"Evaluate this student's answer:

Question: {{question}}
Expected Answer: {{expected}}
Student's Answer: {{submitted}}

Determine if the student's answer demonstrates understanding of the concept.
Respond with a JSON object:
{
    "is_correct": true/false,
    "explanation": "brief feedback for the student"
}"#
            .to_string(),
        }
    }
}

/// Prompts for study note generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesPrompts {
    pub notes: String,
    /// Section appended to the notes prompt only when doubts exist.
    pub weak_areas: String,
}

impl Default for NotesPrompts {
    fn default() -> Self {
        Self {
            notes: r#"You are an expert AI tutor creating study notes for a student.

Based on the provided Video Transcript, create a set of high-quality study notes.

The notes must follow this exact Markdown structure:

# Study Notes

## 1. Executive Summary
(A concise 3-5 sentence summary of the entire video)

## 2. Key Concepts & Summary
(A detailed, point-wise summary of the video content. Break down complex topics into bullet points.)
{{weak_areas}}

---
**Video Transcript:**
{{transcript}}

**Constraint:** Return ONLY the raw Markdown content. Do not wrap it in markdown code blocks. Do not include any conversational text like "Here are your notes"."#
                .to_string(),

            weak_areas: r#"
## 3. Weak Areas Review
(Review the video content to address the following student doubts:
{{doubts}}
IMPORTANT: Only address doubts that are actually relevant to the provided video transcript. If a doubt is unrelated to the video, ignore it. If no doubts are relevant, omit this entire section.)
"#
            .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default templates, with optional overrides from a custom directory.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let qa_path = custom_path.join("qa.toml");
            if qa_path.exists() {
                let content = std::fs::read_to_string(&qa_path)?;
                prompts.qa = toml::from_str(&content)?;
            }

            let quiz_path = custom_path.join("quiz.toml");
            if quiz_path.exists() {
                let content = std::fs::read_to_string(&quiz_path)?;
                prompts.quiz = toml::from_str(&content)?;
            }

            let grading_path = custom_path.join("grading.toml");
            if grading_path.exists() {
                let content = std::fs::read_to_string(&grading_path)?;
                prompts.grading = toml::from_str(&content)?;
            }

            let notes_path = custom_path.join("notes.toml");
            if notes_path.exists() {
                let content = std::fs::read_to_string(&notes_path)?;
                prompts.notes = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }
}
