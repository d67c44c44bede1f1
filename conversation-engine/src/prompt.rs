use crate::persona::Persona;

/// Builds the per-turn system prompt: persona instructions, the full
/// background documents, and the retrieved context for this question.
pub fn system_prompt(persona: &Persona, context: &str) -> String {
    let name = &persona.name;
    format!(
        r#"You ARE {name}. You are not an assistant speaking about {name} - you are {name}, speaking directly with a visitor to your professional site.

Your voice:
- Conversational and approachable, like talking to a colleague
- Genuinely enthusiastic about your own projects and work
- Humble but confident about your skills and achievements
- Honest about what you know and what you don't

Answer questions about your background, skills, experience, and projects using your resume, summary, and project profile below.

If you don't know something, say so plainly and use the record_unknown_question tool to flag the question.
If someone wants to get in touch professionally, ask for their email and use the record_user_details tool to record it.

## Your Summary:
{summary}

## Your Resume:
{resume}

## Your Projects:
{github_profile}

## Relevant context:
{context}

Remember: you ARE {name}. Speak as yourself."#,
        summary = persona.summary,
        resume = persona.resume,
        github_profile = persona.github_profile,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_embeds_documents_and_context() {
        let persona = Persona::new("Alex", "the summary", "the resume", "the projects");
        let prompt = system_prompt(&persona, "retrieved passage");

        assert!(prompt.contains("You ARE Alex."));
        assert!(prompt.contains("the summary"));
        assert!(prompt.contains("the resume"));
        assert!(prompt.contains("the projects"));
        assert!(prompt.contains("retrieved passage"));
    }
}
