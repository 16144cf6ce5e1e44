//! Prompt construction for the stress assessment.
//!
//! The prompt embeds the original raw CSV verbatim (not the parsed
//! model) so the generation service sees exactly what the caller sent.
//! The "JSON only" instruction is a compatibility surface: the response
//! validator is the enforcement point, not this template.

/// Build the stress analysis prompt for a raw dataset.
///
/// Deterministic, pure function of the input text.
pub fn build_prompt(raw_csv: &str) -> String {
    format!(
        "You are a mental health expert analyzing student stress levels.\n\n\
         CRITICAL: You must respond with ONLY valid JSON in the exact format \
         specified below. Do not include any other text, explanations, or \
         formatting.\n\n\
         Task: Analyze the following data to determine if there are signs of stress:\n\
         {raw_csv}\n\n\
         Analysis Guidelines:\n\
         - Focus on stress_level, sleep_hours, mood_score, and mental_health_status indicators\n\
         - stress_level > 40 indicates elevated stress\n\
         - sleep_hours < 6 indicates insufficient sleep\n\
         - mood_score < 2.0 indicates poor mood\n\
         - mental_health_status concerns indicate mental health issues\n\n\
         IMPORTANT: Write concisely. Avoid phrases like \"After analyzing\", \
         \"it is evident\", \"based on the data\", \"the analysis reveals\". \
         State facts directly.\n\n\
         Return ONLY this JSON structure:\n\
         {{\n\
             \"stress_score\": <number between 0 and 100, where 0 is no stress and 100 is extreme stress>,\n\
             \"reason\": \"<Your assessment in 500 words or less, analyzing the key \
         indicators: stress levels, sleep patterns, mood scores, and mental health \
         status. Include specific data points and explain why they indicate stress \
         or lack thereof.>\"\n\
         }}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_is_deterministic() {
        let csv = "timestamp,stress_level\n2025-07-27T10:00:00Z,75";
        assert_eq!(build_prompt(csv), build_prompt(csv));
    }

    #[test]
    fn test_prompt_embeds_dataset_verbatim() {
        let csv = "timestamp,stress_level\n2025-07-27T10:00:00Z,75";
        let prompt = build_prompt(csv);
        assert!(prompt.contains(csv));
    }

    #[test]
    fn test_prompt_carries_rubric_and_contract() {
        let prompt = build_prompt("data");

        assert!(prompt.contains("stress_level > 40"));
        assert!(prompt.contains("sleep_hours < 6"));
        assert!(prompt.contains("mood_score < 2.0"));
        assert!(prompt.contains("mental_health_status"));
        assert!(prompt.contains("ONLY valid JSON"));
        assert!(prompt.contains("\"stress_score\""));
        assert!(prompt.contains("\"reason\""));
        assert!(prompt.contains("After analyzing"));
    }
}
