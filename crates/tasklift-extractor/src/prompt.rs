//! Prompt construction for the four model calls of a run

use tasklift_domain::{CandidateTask, ExtractionContext};

/// Builds prompts for one run's context
pub struct PromptBuilder<'a> {
    context: &'a ExtractionContext,
}

impl<'a> PromptBuilder<'a> {
    /// Create a builder over a run context
    pub fn new(context: &'a ExtractionContext) -> Self {
        Self { context }
    }

    /// Lenient first-pass instruction for one chunk
    pub fn candidates(&self, chunk: &str) -> String {
        let mut prompt = String::new();

        prompt.push_str(CANDIDATE_INSTRUCTIONS);
        prompt.push_str("\n\n");

        prompt.push_str("CONTEXT:\n");
        self.push_context(&mut prompt);
        self.push_source(&mut prompt);
        prompt.push('\n');

        prompt.push_str("EXAMPLES:");
        prompt.push_str(FEW_SHOT_EXAMPLES);
        prompt.push_str("\n\n");

        prompt.push_str("TEXT TO ANALYZE:\n\"\"\"\n");
        prompt.push_str(chunk);
        prompt.push_str("\n\"\"\"\n\n");

        prompt.push_str(CANDIDATE_OUTPUT_FORMAT);
        prompt
    }

    /// Strict second-pass instruction over every surviving candidate
    pub fn validation(&self, candidates: &[CandidateTask]) -> Result<String, serde_json::Error> {
        let mut prompt = String::new();

        prompt.push_str(VALIDATION_INSTRUCTIONS);
        prompt.push_str("\n\n");

        prompt.push_str("CANDIDATES:\n");
        prompt.push_str(&serde_json::to_string_pretty(candidates)?);
        prompt.push_str("\n\n");

        prompt.push_str("CONTEXT:\n");
        self.push_context(&mut prompt);
        prompt.push('\n');

        prompt.push_str(VALIDATION_OUTPUT_FORMAT);
        Ok(prompt)
    }

    /// Stakeholder summary instruction; `task_titles` may be empty
    pub fn summary(&self, text: &str, task_titles: &[String]) -> String {
        let mut prompt = String::new();

        prompt.push_str(SUMMARY_INSTRUCTIONS);
        prompt.push_str("\n\n");

        prompt.push_str("TEXT:\n\"\"\"\n");
        prompt.push_str(text);
        prompt.push_str("\n\"\"\"\n\n");

        if !task_titles.is_empty() {
            prompt.push_str("EXTRACTED TASKS (for context):\n");
            for title in task_titles {
                prompt.push_str(&format!("- {}\n", title));
            }
            prompt.push('\n');
        }

        prompt.push_str(SUMMARY_OUTPUT_FORMAT);
        prompt
    }

    /// Meeting minutes instruction
    pub fn minutes(&self, text: &str) -> String {
        let mut prompt = String::new();

        prompt.push_str(MINUTES_INSTRUCTIONS);
        prompt.push_str("\n\n");

        prompt.push_str("TEXT:\n");
        prompt.push_str(text);
        prompt.push_str("\n\n");

        prompt.push_str(MINUTES_OUTPUT_FORMAT);
        prompt
    }

    fn push_context(&self, prompt: &mut String) {
        prompt.push_str(&format!(
            "- Reference time: {}\n",
            self.context.reference_time.to_rfc3339()
        ));
        prompt.push_str(&format!("- Timezone: {}\n", self.context.timezone));
    }

    fn push_source(&self, prompt: &mut String) {
        prompt.push_str(&format!("- Source type: {}\n", self.context.input_type));
        if let Some(name) = &self.context.source_name {
            prompt.push_str(&format!("- Source: {}\n", name));
        }

        let Some(metadata) = &self.context.document_metadata else {
            return;
        };
        if let Some(subject) = &metadata.subject {
            prompt.push_str(&format!("- Subject: {}\n", subject));
        }
        if let Some(thread) = &metadata.thread {
            prompt.push_str(&format!(
                "- Email thread: {} messages between {}\n",
                thread.message_count,
                thread.participants.join(", ")
            ));
        }
    }
}

/// System preamble for candidate extraction and validation
pub const SYSTEM_PROMPT: &str = r#"You are an expert task extraction assistant. Your job is to analyze text and extract actionable tasks with perfect traceability.

CRITICAL RULES:
1. ALWAYS respond with a valid JSON object of the form {"tasks": [...]}
2. Every task MUST include a sourceQuote - the exact text from the input that describes the task
3. NEVER make up or infer information not explicitly stated
4. If owner or due date is not mentioned, use null
5. Be conservative - better to miss a vague task than create a false positive

TASK STRUCTURE:
{
  "title": "Clear, actionable summary",
  "description": "Optional details or null",
  "owner": "Person's name as written or null",
  "dueDate": "Due date as written or null",
  "priority": "P0/P1/P2/P3 if mentioned or null",
  "status": "NEW",
  "sourceQuote": "REQUIRED: Exact text from input",
  "confidence": 0.0 to 1.0
}

RESPOND WITH A JSON OBJECT: {"tasks": [task1, task2, ...]}
If no tasks found, respond with: {"tasks": []}"#;

/// System preamble for the stakeholder summary
pub const SUMMARY_PREAMBLE: &str =
    "You are an expert at analyzing meeting notes and emails to extract key insights.";

/// System preamble for meeting minutes
pub const MINUTES_PREAMBLE: &str = "You are an expert at extracting meeting information from notes and emails. Return valid JSON only.";

const CANDIDATE_INSTRUCTIONS: &str = "Extract ALL potential tasks from the following text. Be lenient - include anything that might be a task.";

const FEW_SHOT_EXAMPLES: &str = r#"
EXAMPLE 1:
Input: "Rayan, please finalize the dashboard by next Friday."
Output:
[{
  "title": "Finalize dashboard",
  "description": null,
  "owner": "Rayan",
  "dueDate": "next Friday",
  "priority": null,
  "status": "NEW",
  "sourceQuote": "Rayan, please finalize the dashboard by next Friday.",
  "confidence": 0.9
}]

EXAMPLE 2:
Input: "We should consider migrating to the cloud sometime."
Output:
[{
  "title": "Consider cloud migration",
  "description": null,
  "owner": null,
  "dueDate": null,
  "priority": null,
  "status": "NEW",
  "sourceQuote": "We should consider migrating to the cloud sometime.",
  "confidence": 0.3
}]

EXAMPLE 3:
Input: "Alex to confirm data source access by Feb 10. This is critical for the launch."
Output:
[{
  "title": "Confirm data source access",
  "description": "Critical for the launch",
  "owner": "Alex",
  "dueDate": "Feb 10",
  "priority": "P0",
  "status": "NEW",
  "sourceQuote": "Alex to confirm data source access by Feb 10. This is critical for the launch.",
  "confidence": 0.95
}]"#;

const CANDIDATE_OUTPUT_FORMAT: &str = r#"IMPORTANT OUTPUT FORMAT:
You MUST respond with ONLY a JSON object in this exact format:
{
  "tasks": [
    {
      "title": "Task title",
      "description": "Details or null",
      "owner": "Name or null",
      "dueDate": "Date string or null",
      "priority": null,
      "status": "NEW",
      "sourceQuote": "Exact quote from text above",
      "confidence": 0.9
    }
  ]
}

If no tasks found, respond with: {"tasks": []}
Do NOT include any text before or after the JSON.

Extract tasks now:"#;

const VALIDATION_INSTRUCTIONS: &str = r#"Review and validate these candidate tasks. Apply strict rules:

VALIDATION RULES:
1. REJECT any task without a sourceQuote
2. REJECT vague tasks ("look into", "consider", "maybe")
3. Keep owner null if not explicitly mentioned
4. Keep dueDate null if not explicitly mentioned
5. Calculate confidence based on:
   - Has clear owner: +0.3
   - Has clear due date: +0.3
   - Has specific action verb: +0.2
   - Source quote is detailed: +0.2"#;

const VALIDATION_OUTPUT_FORMAT: &str = r#"IMPORTANT: Wrap your response in a JSON object with a "tasks" property containing an array.
Example: {"tasks": [task1, task2, task3]}

If no tasks are valid, respond with: {"tasks": []}"#;

const SUMMARY_INSTRUCTIONS: &str = r#"Analyze the following content and extract a stakeholder summary.

EXTRACT:
1. Decisions: Key decisions that were made
2. Risks: Identified risks, blockers, or concerns
3. Asks: Questions or requests for input/clarification
4. Key Points: Other important information"#;

const SUMMARY_OUTPUT_FORMAT: &str = r#"RESPOND WITH JSON:
{
  "decisions": ["decision 1", "decision 2"],
  "risks": ["risk 1", "risk 2"],
  "asks": ["ask 1", "ask 2"],
  "keyPoints": ["point 1", "point 2"]
}

If no items for a category, use empty array. Be concise."#;

const MINUTES_INSTRUCTIONS: &str = r#"Extract meeting information from the following text. Identify:

1. Meeting title/subject (if mentioned)
2. Meeting date/time (if mentioned)
3. Participants/attendees
4. Agenda items or topics discussed
5. Key discussion notes
6. Next steps or follow-up actions"#;

const MINUTES_OUTPUT_FORMAT: &str = r#"Respond with a JSON object in this exact format:
{
  "title": "Meeting title or subject",
  "date": "ISO date string or null",
  "participants": ["Name1", "Name2"],
  "agenda": ["Topic 1", "Topic 2"],
  "notes": "General meeting notes and discussion summary",
  "nextSteps": ["Next step 1", "Next step 2"]
}

If information is not available, use null for strings or empty arrays for lists.
Do NOT include any text before or after the JSON.

Extract meeting minutes now:"#;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tasklift_llm::is_degenerate;
    use tasklift_domain::{DocumentMetadata, InputType, ThreadMetadata};

    fn context() -> ExtractionContext {
        let reference = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        ExtractionContext::new(reference, "Europe/Berlin", InputType::Text)
            .with_source_name("standup.md")
    }

    #[test]
    fn test_candidate_prompt_contents() {
        let ctx = context();
        let prompt = PromptBuilder::new(&ctx).candidates("Alex to send the deck.");

        assert!(prompt.starts_with("Extract ALL potential tasks"));
        assert!(prompt.contains("- Reference time: 2024-01-01T09:00:00+00:00"));
        assert!(prompt.contains("- Timezone: Europe/Berlin"));
        assert!(prompt.contains("- Source: standup.md"));
        assert!(prompt.contains("EXAMPLE 3:"));
        assert!(prompt.contains("\"\"\"\nAlex to send the deck.\n\"\"\""));
        assert!(prompt.ends_with("Extract tasks now:"));
    }

    #[test]
    fn test_candidate_prompt_mentions_thread() {
        let mut ctx = context();
        ctx.document_metadata = Some(DocumentMetadata {
            subject: Some("Launch plan".to_string()),
            thread: Some(ThreadMetadata {
                message_count: 3,
                participants: vec!["Alex".to_string(), "Bo".to_string()],
                threading_complete: true,
                is_single_message: false,
            }),
            ..Default::default()
        });

        let prompt = PromptBuilder::new(&ctx).candidates("text");
        assert!(prompt.contains("- Subject: Launch plan"));
        assert!(prompt.contains("- Email thread: 3 messages between Alex, Bo"));
    }

    #[test]
    fn test_validation_prompt_embeds_camel_case_candidates() {
        let ctx = context();
        let candidate = CandidateTask {
            title: Some("Send deck".to_string()),
            source_quote: Some("Alex to send the deck.".to_string()),
            ..Default::default()
        };
        let prompt = PromptBuilder::new(&ctx).validation(&[candidate]).unwrap();

        assert!(prompt.starts_with("Review and validate these candidate tasks"));
        assert!(prompt.contains("\"sourceQuote\": \"Alex to send the deck.\""));
        assert!(!prompt.contains("Source type"));
    }

    #[test]
    fn test_summary_prompt_task_titles() {
        let ctx = context();
        let builder = PromptBuilder::new(&ctx);

        let with = builder.summary("notes", &["Send deck".to_string()]);
        assert!(with.contains("extract a stakeholder summary"));
        assert!(with.contains("EXTRACTED TASKS (for context):\n- Send deck\n"));

        let without = builder.summary("notes", &[]);
        assert!(!without.contains("EXTRACTED TASKS"));
    }

    #[test]
    fn test_minutes_prompt() {
        let ctx = context();
        let prompt = PromptBuilder::new(&ctx).minutes("Weekly sync notes");
        assert!(prompt.starts_with("Extract meeting information"));
        assert!(prompt.contains("TEXT:\nWeekly sync notes\n"));
    }

    #[test]
    fn test_empty_answer_is_not_degenerate() {
        assert!(!SYSTEM_PROMPT.contains("respond with: []"));
        let empty_answers: Vec<&str> = SYSTEM_PROMPT
            .lines()
            .chain(CANDIDATE_OUTPUT_FORMAT.lines())
            .chain(VALIDATION_OUTPUT_FORMAT.lines())
            .filter_map(|line| line.strip_prefix("If no tasks"))
            .filter_map(|line| line.split("respond with: ").nth(1))
            .collect();
        assert_eq!(empty_answers.len(), 3);
        for answer in empty_answers {
            assert_eq!(answer, r#"{"tasks": []}"#);
            assert!(!is_degenerate(answer));
        }
    }
}
