// All LLM prompt constants for the job-post analysis.
// Section order here is the order the analyzer runs them in.

use serde::Serialize;

/// System instruction sent with every analysis completion.
pub const ANALYSIS_SYSTEM: &str =
    "You are a professional freelancer analyzing job posts and writing proposals.";

/// Separator between a section template and the pasted job post.
pub const JOB_POST_SEPARATOR: &str = "\n\nJob Post:\n";

pub const JOB_ANALYSIS_PROMPT: &str = "\
Analyze the key requirements, responsibilities, and scope of this job post.
Focus on technical requirements, experience needed, and project scope.
Format the response in clear sections with bullet points.";

pub const CLIENT_CHARACTERISTICS_PROMPT: &str = "\
Analyze the client preferences, company culture, and project characteristics from this job post.
Focus on work environment, values, and expectations.
Format the response with clear headings and bullet points.";

pub const APPROACH_PROMPT: &str = "\
Suggest a detailed approach and methodology for this project based on the job post.
Include specific steps, best practices, and timeline estimates.
Format as a numbered list with sub-points.";

pub const SOLUTION_PROMPT: &str = "\
Recommend specific technical solutions, tools, and technologies for this project.
Include justification for each recommendation.
Format with clear categories and bullet points.";

pub const QUESTIONS_PROMPT: &str = "\
What are the key questions to ask and points to address in the proposal?
Format as a numbered list of questions with brief explanations.";

pub const PROPOSAL_PROMPT: &str = "\
Write a concise, professional proposal (max 150 words) for this job post.
Start with an attention-grabbing first sentence.
First paragraph about client and problem.
Second paragraph about solution and approach.
Include trust-building elements and competitive advantages.
Make a recommendation for extra value.
End with a call to action.
Format with clear paragraphs and professional tone.";

/// Soft length contract for the proposal section. Not enforced.
pub const PROPOSAL_MAX_WORDS: usize = 150;

/// One of the six generated report sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisSection {
    JobAnalysis,
    ClientCharacteristics,
    ApproachAnalysis,
    SolutionAnalysis,
    QuestionsAnalysis,
    Proposal,
}

impl AnalysisSection {
    pub const ALL: [AnalysisSection; 6] = [
        AnalysisSection::JobAnalysis,
        AnalysisSection::ClientCharacteristics,
        AnalysisSection::ApproachAnalysis,
        AnalysisSection::SolutionAnalysis,
        AnalysisSection::QuestionsAnalysis,
        AnalysisSection::Proposal,
    ];

    /// Report key, stable across releases.
    pub fn key(&self) -> &'static str {
        match self {
            AnalysisSection::JobAnalysis => "jobAnalysis",
            AnalysisSection::ClientCharacteristics => "clientCharacteristics",
            AnalysisSection::ApproachAnalysis => "approachAnalysis",
            AnalysisSection::SolutionAnalysis => "solutionAnalysis",
            AnalysisSection::QuestionsAnalysis => "questionsAnalysis",
            AnalysisSection::Proposal => "proposal",
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            AnalysisSection::JobAnalysis => JOB_ANALYSIS_PROMPT,
            AnalysisSection::ClientCharacteristics => CLIENT_CHARACTERISTICS_PROMPT,
            AnalysisSection::ApproachAnalysis => APPROACH_PROMPT,
            AnalysisSection::SolutionAnalysis => SOLUTION_PROMPT,
            AnalysisSection::QuestionsAnalysis => QUESTIONS_PROMPT,
            AnalysisSection::Proposal => PROPOSAL_PROMPT,
        }
    }

    /// User message for this section: template, separator, then the raw post.
    pub fn user_prompt(&self, job_post: &str) -> String {
        format!("{}{JOB_POST_SEPARATOR}{job_post}", self.template())
    }
}

/// Serializes the prompt bank as a JSON object of section key → template.
pub fn prompt_bank() -> String {
    let bank: serde_json::Map<String, serde_json::Value> = AnalysisSection::ALL
        .iter()
        .map(|s| (s.key().to_string(), serde_json::Value::from(s.template())))
        .collect();
    serde_json::Value::Object(bank).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_keys_are_stable() {
        let keys: Vec<_> = AnalysisSection::ALL.iter().map(|s| s.key()).collect();
        assert_eq!(
            keys,
            vec![
                "jobAnalysis",
                "clientCharacteristics",
                "approachAnalysis",
                "solutionAnalysis",
                "questionsAnalysis",
                "proposal"
            ]
        );
    }

    #[test]
    fn test_serde_name_matches_key() {
        for section in AnalysisSection::ALL {
            let json = serde_json::to_string(&section).unwrap();
            assert_eq!(json, format!("\"{}\"", section.key()));
        }
    }

    #[test]
    fn test_user_prompt_appends_job_post() {
        let prompt = AnalysisSection::Proposal.user_prompt("Build me a scraper");
        assert!(prompt.starts_with(PROPOSAL_PROMPT));
        assert!(prompt.ends_with("\n\nJob Post:\nBuild me a scraper"));
    }

    #[test]
    fn test_prompt_bank_contains_every_template() {
        let bank: serde_json::Value = serde_json::from_str(&prompt_bank()).unwrap();
        for section in AnalysisSection::ALL {
            assert_eq!(bank[section.key()], section.template());
        }
        assert!(bank.get("prompt").is_none());
    }

    #[test]
    fn test_proposal_prompt_states_word_limit() {
        assert!(PROPOSAL_PROMPT.contains(&format!("max {PROPOSAL_MAX_WORDS} words")));
    }
}
